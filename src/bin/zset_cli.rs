use tinyzset::client::client::{Client, Tokens};
use tinyzset::client::config::Config;
use tinyzset::cmd::command::RedisCommand;
use tinyzset::cmd::conn::ConnCmd;
use tinyzset::parser::frame::Frame;
use tinyzset::Result;

use clap::Parser;
use std::io::{BufRead, Write};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "zset-cli", version, about = "Interactive client for zset-server")]
struct Cli {
    /// Path to a toml or json config file
    #[arg(short, long)]
    config: Option<String>,
    /// Overrides the configured host
    #[arg(long)]
    host: Option<String>,
    /// Overrides the configured port
    #[arg(short, long)]
    port: Option<u16>,
}

async fn run_client(cli: Cli) -> Result<()> {
    let mut config = Config::new(cli.config.as_deref());
    if let Some(host) = cli.host {
        config.server_ip = host;
    }
    if let Some(port) = cli.port {
        config.server_port = port;
    }
    let addr = config.addr();
    info!("<{}>", addr);

    let mut client = Client::connect(addr.clone()).await?;
    let mut db_idx = 0;
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        eprint!("tinyzset {}[{}]> ", addr, db_idx);
        std::io::stderr().flush()?;
        let Some(line) = lines.next() else {
            return Ok(());
        };
        let line = line?;
        let tokens = Tokens::from(&line);
        if tokens.is_empty() {
            continue;
        }
        if matches!(tokens.get_cmd(0).map(|s| s.to_lowercase()).as_deref(), Some("quit" | "exit")) {
            return Ok(());
        }
        let cmd = match tokens.to_command() {
            Ok(cmd) => cmd,
            Err(e) => {
                println!("{}, please input command again.", e);
                continue;
            }
        };
        let next_idx = match &cmd {
            RedisCommand::Connection(ConnCmd::Select { index }) => *index,
            _ => db_idx,
        };
        match client.execute(&cmd.into_frame()).await {
            Ok(frame) => {
                if !matches!(frame, Frame::Error(_)) {
                    db_idx = next_idx;
                }
                println!("{}", frame);
            }
            Err(e) => {
                println!("error: {}", e);
                return Err(e);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt::try_init();
    run_client(Cli::parse()).await
}
