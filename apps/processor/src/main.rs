//! Odds Arbitrage Processor
//!
//! Decodes batches of bookmaker quotes, detects two-way arbitrage across
//! bookmakers and records the results.

mod config;
mod error;
mod pipeline;

use chrono::Utc;
use clap::{Parser, Subcommand};
use config::AppConfig;
use error::ProcessorError;
use odds_core::Sport;
use odds_engine::{ArbitrageDetector, BatchEvaluator};
use odds_feeds::FileSource;
use pipeline::{archive_quotes, collect_quotes, Pipeline, ProcessingSummary};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Odds arbitrage processor CLI
#[derive(Parser, Debug)]
#[command(name = "odds-arb")]
#[command(about = "Detect two-way arbitrage across bookmaker odds", long_about = None)]
struct Args {
    /// Configuration file path (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long)]
    log_level: Option<String>,

    /// Worker threads for batch evaluation
    #[arg(short, long)]
    workers: Option<usize>,

    /// Valid quotes a game needs before it can be flagged
    #[arg(long)]
    min_valid_quotes: Option<usize>,

    /// Hours stored quotes and opportunities stay visible
    #[arg(long)]
    ttl_hours: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process a stream batch of encoded quote records
    Process {
        /// File holding the batch envelope
        #[arg(long)]
        records: PathBuf,
    },
    /// Flatten a saved provider payload and process it
    Ingest {
        /// File holding the provider events
        #[arg(long)]
        events: PathBuf,

        /// Sport key to ingest; repeatable. Defaults to the configured sports
        #[arg(long)]
        sport: Vec<String>,

        /// Also write the flattened records here
        #[arg(long)]
        archive: Option<PathBuf>,
    },
}

impl Args {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(workers) = self.workers {
            config.detector.workers = workers;
        }
        if let Some(min) = self.min_valid_quotes {
            config.detector.min_valid_quotes = min;
        }
        if let Some(hours) = self.ttl_hours {
            config.store.ttl_hours = hours;
        }
        if let Command::Ingest { sport, .. } = &self.command {
            if !sport.is_empty() {
                config.source.sports = sport.clone();
            }
        }
    }
}

/// `RUST_LOG` wins; otherwise `level`. Logs go to stderr, stdout carries the
/// summary.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

fn build_pipeline(config: &AppConfig) -> Pipeline {
    let detector = ArbitrageDetector::new((&config.detector).into());
    let evaluator = BatchEvaluator::new(detector, config.detector.workers);
    Pipeline::new(evaluator, Arc::new(config.store.build()))
}

async fn read_input(path: &Path) -> Result<String, ProcessorError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ProcessorError::Io {
            path: path.to_path_buf(),
            source,
        })
}

async fn run(args: &Args, config: &AppConfig) -> Result<ProcessingSummary, ProcessorError> {
    let pipeline = build_pipeline(config);

    match &args.command {
        Command::Process { records } => {
            let json = read_input(records).await?;
            pipeline.process_records(&json, Utc::now()).await
        }
        Command::Ingest {
            events, archive, ..
        } => {
            let sports: Vec<Sport> = config.source.sports();
            let source = FileSource::new(events).with_sports(sports.clone());
            let quotes = collect_quotes(&source, &sports).await;
            if let Some(path) = archive {
                archive_quotes(path, &quotes).await?;
            }
            pipeline.process_quotes(quotes, Utc::now()).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let mut config = match AppConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_logging("info");
            error!("{}", ProcessorError::from(e));
            return ExitCode::FAILURE;
        }
    };
    args.apply(&mut config);

    init_logging(&config.log_level);

    if let Err(e) = config.validate() {
        error!("{}", ProcessorError::from(e));
        return ExitCode::FAILURE;
    }

    info!("Odds arbitrage processor starting...");
    info!("  Min valid quotes: {}", config.detector.min_valid_quotes);
    info!("  Workers: {}", config.detector.workers);
    info!("  Store TTL: {}h", config.store.ttl_hours);

    let summary = match run(&args, &config).await {
        Ok(summary) => summary,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&summary) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to encode summary: {}", e);
            ExitCode::FAILURE
        }
    }
}
