use tinyzset::client::client::{Client, Tokens};
use tinyzset::Result;

use clap::Parser;
use hdrhistogram::Histogram;
use rand::Rng;
use std::sync::Arc;
use tokio::time::Instant;

#[derive(Parser, Debug, Clone)]
#[command(name = "zset-benchmark", about = "Load generator for zset-server")]
struct BenchmarkConfig {
    #[arg(short, long, default_value = "127.0.0.1")]
    ip: String,
    #[arg(short, long, default_value_t = tinyzset::DEFAULT_PORT)]
    port: u16,
    #[arg(short, long, default_value_t = 50)]
    clients: u32,
    #[arg(short, long, default_value_t = 100000)]
    requests: u32,
    /// Number of distinct members the commands pick from
    #[arg(short, long, default_value_t = 10000)]
    members: u32,
    #[arg(short, long, num_args = 1..)]
    tests: Vec<String>,
}

const TESTS: [&str; 6] = ["ping", "zadd", "zincrby", "zscore", "zrank", "zrange"];
const KEY: &str = "bench:zset";

fn test_is_selected(tests: &[String], name: &str) -> bool {
    tests.is_empty() || tests.iter().any(|t| t.eq_ignore_ascii_case(name))
}

fn gen_command(cmd_type: &str, members: u32) -> String {
    let mut rng = rand::rng();
    let member = rng.random_range(0..members.max(1));
    let score = rng.random_range(0..1_000_000);
    match cmd_type {
        "zadd" => format!("zadd {} {} member:{}", KEY, score, member),
        "zincrby" => format!("zincrby {} 1 member:{}", KEY, member),
        "zscore" => format!("zscore {} member:{}", KEY, member),
        "zrank" => format!("zrank {} member:{}", KEY, member),
        "zrange" => format!("zrange {} 0 9 withscores", KEY),
        _ => "ping".to_string(),
    }
}

async fn benchmark(cmd: &str, config: Arc<BenchmarkConfig>) -> Result<()> {
    println!("====== {} ======", cmd.to_uppercase());
    let addr = format!("{}:{}", config.ip, config.port);
    let per_client = (config.requests / config.clients.max(1)).max(1);

    let st = Instant::now();
    let mut handles = Vec::with_capacity(config.clients as usize);
    for _ in 0..config.clients {
        let mut client = Client::connect(addr.clone()).await?;
        let cmd = cmd.to_string();
        let members = config.members;
        handles.push(tokio::spawn(async move {
            let mut hist = Histogram::<u64>::new_with_bounds(1, 60_000_000, 3)?;
            let mut errors = 0u64;
            for _ in 0..per_client {
                let frame = Tokens::from(&gen_command(&cmd, members)).to_command()?.into_frame();
                let start = Instant::now();
                if client.execute(&frame).await.is_err() {
                    errors += 1;
                    continue;
                }
                hist.saturating_record(start.elapsed().as_micros() as u64);
            }
            Ok::<_, tinyzset::Error>((hist, errors))
        }));
    }

    let mut hist = Histogram::<u64>::new_with_bounds(1, 60_000_000, 3)?;
    let mut errors = 0;
    for handle in handles {
        let (h, e) = handle.await??;
        hist.add(h)?;
        errors += e;
    }
    let elapsed = st.elapsed().as_secs_f64();
    let total = hist.len();

    println!(" {} requests completed in {:.3} seconds", total, elapsed);
    println!(" {} parallel clients, {} errors", config.clients, errors);
    println!(" Summary:");
    println!("     throughput: {:.2} requests per second", total as f64 / elapsed);
    println!("     latency (usec):");
    println!("         avg      min      p50      p95      p99      max");
    println!(
        "         {:<8.1} {:<8} {:<8} {:<8} {:<8} {:<8}",
        hist.mean(),
        hist.min(),
        hist.value_at_quantile(0.5),
        hist.value_at_quantile(0.95),
        hist.value_at_quantile(0.99),
        hist.max()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Arc::new(BenchmarkConfig::parse());
    for test in TESTS {
        if test_is_selected(&config.tests, test) {
            benchmark(test, config.clone()).await?;
        }
    }
    Ok(())
}
