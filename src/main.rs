use anyhow::{Context, Result};
use car_listing_tracker::{
    count_events_by_type, get_events_for_listing, insert_events, open_event_log, Config, Dataset,
    ObservationFile, Pipeline,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "car-listing-tracker")]
#[command(about = "Track used-car listings: normalize observations and record republications")]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Dataset CSV (overrides config)
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    /// SQLite event log (overrides config)
    #[arg(long, global = true)]
    event_log: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply one or more observation files to the dataset
    Ingest {
        /// Observation JSON files, applied in order
        #[arg(required = true)]
        observations: Vec<PathBuf>,

        /// Day the observations were made (YYYY-MM-DD)
        #[arg(long)]
        reference_date: Option<NaiveDate>,

        /// Start from an empty dataset and leave the dataset file untouched
        #[arg(long)]
        fresh: bool,

        /// Extra category labels (JSON)
        #[arg(long)]
        vocabulary: Option<PathBuf>,
    },

    /// Print dataset statistics
    Summary,

    /// Show the stored record and audit trail of one listing
    History { url: String },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dataset) = cli.dataset {
        config.dataset_path = dataset;
    }
    if let Some(event_log) = cli.event_log {
        config.event_log = Some(event_log);
    }

    match cli.command {
        Commands::Ingest {
            observations,
            reference_date,
            fresh,
            vocabulary,
        } => {
            if reference_date.is_some() {
                config.reference_date = reference_date;
            }
            if fresh {
                config.import_existing = false;
            }
            if vocabulary.is_some() {
                config.vocabulary = vocabulary;
            }
            run_ingest(&config, &observations)
        }
        Commands::Summary => run_summary(&config),
        Commands::History { url } => run_history(&config, &url),
    }
}

fn run_ingest(config: &Config, observations: &[PathBuf]) -> Result<()> {
    println!("🚗 Ingesting {} observation file(s)", observations.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut dataset = Dataset::open_or_create(&config.dataset_path, config.import_existing)?;
    println!("✓ Dataset: {} listings", dataset.len());

    let pipeline = Pipeline::new(config.listing_builder()?, config.reference_date_or_today());
    println!("✓ Reference date: {}", pipeline.reference_date());

    let mut events = Vec::new();
    for path in observations {
        println!("\n📂 {}", path.display());
        let observation = ObservationFile::from_file(path)?;
        let summary = pipeline
            .process_batch(&mut dataset, &observation, &observation)
            .with_context(|| format!("Failed to ingest {}", path.display()))?;
        println!("✓ {}", summary.summary());
        events.extend(summary.events);
    }

    match config.save_target() {
        Some(path) => {
            println!("\n💾 Saving dataset...");
            dataset.save_csv(path)?;
            println!("✓ {} listings in {}", dataset.len(), path.display());
        }
        None => {
            tracing::warn!(path = %config.dataset_path.display(), "fresh run, dataset not saved");
            println!("\n⚠️  Fresh run: {} listings not saved", dataset.len());
        }
    }

    if let Some(log_path) = &config.event_log {
        let mut conn = open_event_log(log_path)?;
        let written = insert_events(&mut conn, &events)?;
        println!("✓ Logged {} events to {}", written, log_path.display());
    }

    Ok(())
}

fn run_summary(config: &Config) -> Result<()> {
    let dataset = Dataset::load_csv(&config.dataset_path)?;

    println!("📊 {}", config.dataset_path.display());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Listings:     {}", dataset.len());

    let republished = dataset
        .iter()
        .filter(|r| !r.publication_history.is_empty())
        .count();
    println!("Republished:  {}", republished);

    let mut by_manufacturer: BTreeMap<&str, usize> = BTreeMap::new();
    for record in dataset.iter() {
        *by_manufacturer.entry(record.manufacturer.as_str()).or_insert(0) += 1;
    }
    println!("\nBy manufacturer:");
    for (manufacturer, count) in &by_manufacturer {
        println!("  {:<20} {}", manufacturer, count);
    }

    if let Some(log_path) = &config.event_log {
        let conn = open_event_log(log_path)?;
        println!("\nEvents:");
        for (event_type, count) in count_events_by_type(&conn)? {
            println!("  {:<20} {}", event_type, count);
        }
    }

    Ok(())
}

fn run_history(config: &Config, url: &str) -> Result<()> {
    let dataset = Dataset::load_csv(&config.dataset_path)?;

    match dataset.lookup(url) {
        Some(record) => {
            println!("🚗 {}", record.summary());
            println!("   Publication history: {}", record.publication_history);
            println!("   Price history:       {}", record.price_history);
        }
        None => println!("❌ {} is not in the dataset", url),
    }

    if let Some(log_path) = &config.event_log {
        let conn = open_event_log(log_path)?;
        let events = get_events_for_listing(&conn, url)?;
        println!("\n📜 {} events", events.len());
        for event in events {
            println!(
                "  {} {:<20} {}",
                event.timestamp.format("%Y-%m-%d %H:%M:%S"),
                event.event_type,
                event.data
            );
        }
    }

    Ok(())
}
