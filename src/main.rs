use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{info, warn};

use atlas_importer::config::Config;
use atlas_importer::constants;
use atlas_importer::error::ImporterError;
use atlas_importer::importer::Importer;
use atlas_importer::logging;
use atlas_importer::parser;
use atlas_importer::remote::HttpSiteStore;
use atlas_importer::types::YearRange;
use atlas_importer::validator;

#[derive(Parser)]
#[command(name = "atlas_importer")]
#[command(about = "Legacy land-cover data importer for the GreenAtlas site registry")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a legacy batch export and report advisory warnings, no writes
    Validate {
        /// Path to the batch export (JSON array of flat records)
        #[arg(long)]
        file: String,
    },
    /// Run the full import against the configured site registry
    Import {
        /// Path to the batch export (JSON array of flat records)
        #[arg(long)]
        file: String,
        /// Override the registry base URL from config/environment
        #[arg(long)]
        store_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { file } => run_validate(&file)?,
        Commands::Import { file, store_url } => run_import(&file, store_url).await?,
    }

    Ok(())
}

fn load_year_range(config: &Config) -> anyhow::Result<YearRange> {
    Ok(config.import.year_range()?)
}

fn run_validate(file: &str) -> anyhow::Result<()> {
    let config = Config::load_or_default()?;
    let years = load_year_range(&config)?;

    println!("🔍 Validating legacy batch {file}...");
    let records = parser::read_batch_file(file)?;
    println!("✅ Parsed {} legacy records", records.len());

    let warnings = validator::validate_batch(&records, &years);
    if warnings.is_empty() {
        println!("✅ No structural problems found");
    } else {
        println!("\n⚠️  {} advisory warnings:", warnings.len());
        for warning in &warnings {
            println!("   - {warning}");
        }
    }
    Ok(())
}

async fn run_import(file: &str, store_url: Option<String>) -> anyhow::Result<()> {
    let config = Config::load_or_default()?;
    let years = load_year_range(&config)?;

    let base_url = store_url
        .or_else(|| std::env::var(constants::STORE_URL_ENV).ok())
        .unwrap_or_else(|| config.store.base_url.clone());
    if base_url.trim().is_empty() {
        return Err(ImporterError::Config(format!(
            "no registry base URL configured; pass --store-url, set {}, or add [store].base_url to {}",
            constants::STORE_URL_ENV,
            constants::CONFIG_PATH
        ))
        .into());
    }

    println!("🔄 Reading legacy batch from {file}...");
    let records = parser::read_batch_file(file)?;
    println!("✅ Parsed {} legacy records", records.len());

    let warnings = validator::validate_batch(&records, &years);
    if !warnings.is_empty() {
        warn!("{} rows failed pre-import validation", warnings.len());
        println!("\n⚠️  {} rows look structurally weak (still attempted):", warnings.len());
        for warning in &warnings {
            println!("   - {warning}");
        }
    }

    let store = Arc::new(HttpSiteStore::new(&base_url, config.store.timeout_seconds)?);
    let importer = Importer::new(store, years).with_progress(Box::new(
        |current, total, label| {
            println!("   [{current}/{total}] {label}");
        },
    ));

    println!("\n🚀 Importing against {base_url}...");
    let result = importer.run(&records).await?;
    info!("Import run finished");

    println!("\n📊 Import results:");
    println!("   Created: {}", result.created);
    println!("   Updated: {}", result.updated);
    println!("   Skipped: {}", result.skipped);
    println!("   Errors: {}", result.errors.len());

    if !result.errors.is_empty() {
        println!("\n⚠️  Errors encountered:");
        for error in &result.errors {
            println!("   - {error}");
        }
    }
    if !result.unmatched_locations.is_empty() {
        println!("\n⚠️  Unmatched locations (create or rename these sites, then re-run):");
        for location in &result.unmatched_locations {
            println!("   - {location}");
        }
    }
    if result.success {
        println!("\n✅ Import completed without errors");
    }

    Ok(())
}
