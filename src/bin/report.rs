use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

use lumi_storefront::report;

#[derive(Parser)]
#[command(name = "lumi-storefront-report")]
#[command(version = "0.1.0")]
#[command(about = "Re-render a storefront test report from its JSON run", long_about = None)]
struct Cli {
    /// Path to the run JSON written next to the HTML report
    results: PathBuf,

    /// Output format (html, json, junit)
    #[arg(short, long, default_value = "html")]
    format: String,

    /// Output file path
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    println!(
        "{} Generating {} report from: {}",
        "📊".blue(),
        cli.format.cyan(),
        cli.results.display()
    );
    report::generate_report(&cli.results, &cli.format, cli.output.as_deref()).await
}
