use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use mall_web::probe::{DEFAULT_HEALTH_PATH, Prober, Scheme};

/// Probe deployed hosts over HTTPS (and optionally HTTP).
#[derive(Debug, Parser)]
#[command(name = "site-probe")]
struct Args {
    /// Hostnames to probe, e.g. `mall.example.com`.
    #[arg(required = true)]
    hosts: Vec<String>,

    /// Health endpoint path.
    #[arg(long, default_value = DEFAULT_HEALTH_PATH)]
    path: String,

    /// Also probe plain `http://`.
    #[arg(long)]
    insecure_http: bool,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    let prober = Prober::new(&args.path, Duration::from_secs(args.timeout))?;

    let mut schemes = vec![Scheme::Https];
    if args.insecure_http {
        schemes.push(Scheme::Http);
    }

    let mut failed = 0usize;
    for host in &args.hosts {
        for scheme in &schemes {
            for result in prober.probe_host(host, *scheme).await {
                if !result.ok() {
                    failed += 1;
                }
                println!("{result}");
            }
        }
    }

    if failed > 0 {
        eprintln!("{failed} probe(s) failed");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
