use clap::Parser;
use tinyzset::config::ServerConfig;
use tinyzset::server::server;

use tokio::{net::TcpListener, signal};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "zset-server", version, about = "Scored sorted set server")]
struct Cli {
    /// Path to a toml or json config file
    #[arg(short, long)]
    config: Option<String>,
    /// Overrides the configured port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> tinyzset::Result<()> {
    let _ = tracing_subscriber::fmt::try_init();
    let cli = Cli::parse();
    let mut config = ServerConfig::new(cli.config.as_deref());
    if let Some(port) = cli.port {
        config.port = port;
    }

    let listener = TcpListener::bind(&config.addr()).await?;
    print_logo(&config);
    info!(addr = %config.addr(), "zset server start");
    server::run(listener, signal::ctrl_c(), &config).await;
    Ok(())
}

fn print_logo(config: &ServerConfig) {
    let version = env!("CARGO_PKG_VERSION");
    let pid = std::process::id();

    let logo = format!(
        r#"
   _   _                             _
  | |_(_)_ __  _   _ _______  ___| |_      tinyzset {}
  | __| | '_ \| | | |_  / __|/ _ \ __|     Port: {}
  | |_| | | | | |_| |/ /\__ \  __/ |_      Databases: {}
   \__|_|_| |_|\__, /___|___/\___|\__|     PID: {}
               |___/
"#,
        version, config.port, config.db_num, pid
    );

    println!("{}", logo)
}
