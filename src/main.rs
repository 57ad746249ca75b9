use anyhow::Context;
use clap::Parser;
use matchdep::report::profile;
use matchdep::{ProfileConfig, Table};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Build column-match similarity indexes for a table
#[derive(Parser, Debug)]
#[command(name = "matchdep")]
#[command(about = "Similarity index builder for matching-dependency discovery", long_about = None)]
struct Args {
    /// Path to the JSON table (named, typed columns of raw cells)
    #[arg(short, long)]
    table: PathBuf,

    /// Path to the JSON profiling config
    #[arg(short, long)]
    config: PathBuf,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the configured minimum decision boundary
    #[arg(long)]
    min_boundary: Option<f64>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting matchdep v{}", env!("CARGO_PKG_VERSION"));

    let mut config = ProfileConfig::from_path(&args.config)
        .with_context(|| format!("loading config {:?}", args.config))?;
    if let Some(boundary) = args.min_boundary {
        config.min_boundary = boundary;
        config.validate()?;
    }
    let table = Table::from_path(&args.table)
        .with_context(|| format!("loading table {:?}", args.table))?;

    info!("Table: {} columns", table.columns.len());
    info!("Pairs: {}, minimum boundary: {}", config.pairs.len(), config.min_boundary);

    let report = profile(&table, &config);
    for pair in report.indexes.iter().filter(|p| p.error.is_some()) {
        warn!("{} ~ {}: {}", pair.left, pair.right, pair.error.as_deref().unwrap_or_default());
    }

    let json = serde_json::to_string_pretty(&report)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing report {:?}", path))?;
            info!("Report written to {:?}", path);
        }
        None => println!("{}", json),
    }

    Ok(())
}
