use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

mod app;

#[derive(Parser)]
#[command(name = "riskline")]
#[command(about = "Overlays line-anchored security findings onto a file as it is edited")]
#[command(version)]
struct Cli {
    /// File to highlight
    file: PathBuf,

    /// JSON export of risk findings for this repository
    #[arg(short, long)]
    risks: PathBuf,

    /// Base branch to diff against (overrides configuration)
    #[arg(short, long)]
    base_branch: Option<String>,

    /// Run a single highlight pass and exit instead of watching
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    app::run(cli.file, cli.risks, cli.base_branch, cli.once).await
}
