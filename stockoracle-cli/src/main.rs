//! StockOracle CLI — download a year of hourly prices for the S&P 500.
//!
//! Commands:
//! - `download` — fetch every constituent's price history and write it as JSON
//! - `constituents` — list the seed file, grouped by sector

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use stockoracle_core::data::{
    download_constituents, load_constituents, DownloadSummary, GoogleFinanceProvider,
    StdoutProgress, ThreadPause,
};
use stockoracle_core::domain::{Company, TimePoint};
use stockoracle_core::OracleConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "stockoracle",
    about = "StockOracle CLI — hourly price history for every S&P 500 constituent"
)]
struct Cli {
    /// TOML config file. Defaults are used for anything it leaves out.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Constituent CSV, overriding the config's `seed_path`.
    #[arg(long, global = true)]
    seed: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download price history for every constituent, one symbol at a time.
    Download {
        /// Where to write the aggregate JSON.
        #[arg(long, default_value = "prices.json")]
        output: PathBuf,

        /// Only fetch these symbols (must appear in the seed file).
        #[arg(long, num_args = 1..)]
        only: Vec<String>,
    },
    /// List the constituents read from the seed file.
    Constituents,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.seed)?;

    match cli.command {
        Commands::Download { output, only } => run_download(&config, &output, &only),
        Commands::Constituents => run_constituents(&config),
    }
}

fn load_config(path: Option<&Path>, seed: Option<PathBuf>) -> Result<OracleConfig> {
    let mut config = match path {
        Some(path) => OracleConfig::from_file(path)?,
        None => OracleConfig::default(),
    };
    if let Some(seed) = seed {
        config.seed_path = seed;
    }
    Ok(config)
}

fn load_companies(config: &OracleConfig) -> Result<Vec<Company>> {
    load_constituents(&config.seed_path).with_context(|| {
        format!(
            "cannot start without the constituent list at {}",
            config.seed_path.display()
        )
    })
}

fn run_download(config: &OracleConfig, output: &Path, only: &[String]) -> Result<()> {
    let mut companies = load_companies(config)?;

    if !only.is_empty() {
        let wanted: Vec<String> = only.iter().map(|s| s.to_uppercase()).collect();
        companies.retain(|c| wanted.contains(&c.symbol));
        if companies.is_empty() {
            bail!("none of {} are in {}", wanted.join(", "), config.seed_path.display());
        }
    }

    println!(
        "Downloading {} historical data for {} companies.",
        config.period,
        companies.len()
    );

    let provider = GoogleFinanceProvider::new(config)?;
    let progress = StdoutProgress::new();
    let summary = download_constituents(&provider, &companies, &ThreadPause, &progress)?;

    print_summary(&summary);

    let json = serde_json::to_string_pretty(&summary.output)?;
    std::fs::write(output, json)
        .with_context(|| format!("write prices to {}", output.display()))?;
    println!("Prices saved to: {}", output.display());

    Ok(())
}

fn print_summary(summary: &DownloadSummary) {
    let output = &summary.output;
    println!(
        "{} symbols, {} time points, {} retries, final backoff {}ms",
        output.len(),
        output.point_count(),
        summary.retries(),
        summary.final_backoff.as_millis()
    );

    if let Some((first, last)) = output.time_range() {
        println!("Range: {} → {}", format_time(&first), format_time(&last));
    }
}

fn format_time(point: &TimePoint) -> String {
    point
        .datetime()
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| point.unix_time.to_string())
}

fn run_constituents(config: &OracleConfig) -> Result<()> {
    let companies = load_companies(config)?;

    let mut by_sector: BTreeMap<&str, Vec<&Company>> = BTreeMap::new();
    for company in &companies {
        by_sector.entry(company.sector.as_str()).or_default().push(company);
    }

    for (sector, members) in &by_sector {
        println!("{sector} ({})", members.len());
        for company in members {
            println!("  {:<8} {}", company.symbol, company.name);
        }
    }
    println!("\n{} constituents in {} sectors", companies.len(), by_sector.len());

    Ok(())
}
