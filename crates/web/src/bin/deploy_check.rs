use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use mall_web::deploy;

/// Verify a checkout has everything a deployment needs.
#[derive(Debug, Parser)]
#[command(name = "deploy-check")]
struct Args {
    /// Project root to inspect.
    #[arg(long, default_value = ".")]
    root: PathBuf,
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let report = deploy::check(&args.root);
    println!("{report}");

    if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
