//! Command-line front end for the arrow matching engine.
//!
//! # Usage
//!
//! ```bash
//! # Required spine for a 50 lb compound shooting a 28" arrow
//! arrow-match calculate --draw-weight 50 --arrow-length 28 --bow-type compound
//!
//! # Full recommendation for a request file
//! arrow-match recommend --request request.json
//!
//! # Look up a flight problem
//! arrow-match diagnose "nock left"
//! ```
//!
//! Results are printed to stdout as JSON; logs go to stderr.

use anyhow::{Context, Result};
use arrow_match::config::Settings;
use arrow_match::models::{BowType, MatchRequest};
use arrow_match::services::{
    CalculationConfigProvider, InMemoryCatalog, InMemoryConfigStore, ParameterCache,
};
use arrow_match::{ArrowMatchingEngine, SpineCalculationService};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Arrow spine calculator and recommender
#[derive(Parser)]
#[command(name = "arrow-match")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to config/default.toml + config/local.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the required spine for a bow setup
    Calculate {
        /// Draw weight in pounds
        #[arg(long)]
        draw_weight: f64,

        /// Arrow length in inches
        #[arg(long)]
        arrow_length: f64,

        /// Point weight in grains
        #[arg(long, default_value_t = 125.0)]
        point_weight: f64,

        /// compound, recurve, traditional, barebow or longbow
        #[arg(long, default_value = "compound")]
        bow_type: String,

        /// Shooting style tag (e.g. "olympic", "barebow")
        #[arg(long)]
        style: Option<String>,

        /// Shaft material (e.g. "carbon", "wood")
        #[arg(long)]
        material: Option<String>,
    },

    /// Calculate spine and rank catalog arrows for a match request
    Recommend {
        /// Match request JSON file
        #[arg(short, long)]
        request: PathBuf,

        /// Override the request's result count
        #[arg(short = 'n', long)]
        max_results: Option<usize>,
    },

    /// Explain a flight problem symptom
    Diagnose {
        /// Symptom, e.g. "nock left" or "porpoising"
        symptom: String,
    },
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .context("Failed to load configuration")?;

    init_logging(&settings);

    let provider = Arc::new(build_provider(&settings));

    match cli.command {
        Commands::Calculate {
            draw_weight,
            arrow_length,
            point_weight,
            bow_type,
            style,
            material,
        } => {
            let bow_type: BowType = bow_type.parse()?;
            let result = SpineCalculationService::new(provider).calculate(
                draw_weight,
                arrow_length,
                point_weight,
                bow_type,
                style.as_deref(),
                material.as_deref(),
            )?;
            print_json(&result)?;
        }
        Commands::Recommend {
            request,
            max_results,
        } => {
            let json = std::fs::read_to_string(&request)
                .with_context(|| format!("Failed to read request {}", request.display()))?;
            let value: serde_json::Value =
                serde_json::from_str(&json).context("Invalid match request")?;
            // The configured default only applies when the file leaves it out
            let configured_limit = match value.get("max_results") {
                Some(_) => None,
                None => settings.matching.default_limit,
            };
            let mut request: MatchRequest =
                serde_json::from_value(value).context("Invalid match request")?;
            if let Some(max_results) = max_results.or(configured_limit) {
                request.max_results = max_results;
            }

            let catalog = InMemoryCatalog::load(&settings.catalog.path)
                .with_context(|| format!("Failed to load catalog {}", settings.catalog.path))?;

            let mut engine = ArrowMatchingEngine::new(Arc::new(catalog), provider)
                .with_weights(settings.scoring_weights());
            if let Some(search_limit) = settings.matching.search_limit {
                engine = engine.with_search_limit(search_limit);
            }
            if let Some(max_limit) = settings.matching.max_limit {
                engine = engine.with_max_limit(max_limit);
            }

            let report = engine.recommend(&request)?;
            info!("{}", report.summary);
            print_json(&report)?;
        }
        Commands::Diagnose { symptom } => match provider.diagnose(&symptom) {
            Some(diagnosis) => print_json(&diagnosis)?,
            None => anyhow::bail!("No diagnosis known for '{}'", symptom),
        },
    }

    Ok(())
}

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "json" {
        subscriber.json().init();
    } else {
        subscriber.pretty().init();
    }
}

/// A parameter file that fails to load leaves the store empty, so every
/// lookup is served from built-in defaults and reported as such.
fn build_provider(settings: &Settings) -> CalculationConfigProvider {
    let store = match &settings.parameters.path {
        Some(path) => InMemoryConfigStore::load(path).unwrap_or_else(|e| {
            warn!("Failed to load calculation parameters from {}: {}", path, e);
            InMemoryConfigStore::new()
        }),
        None => InMemoryConfigStore::with_defaults(),
    };

    let cache = ParameterCache::new(
        settings.parameters.cache_capacity.unwrap_or(256),
        settings.parameters.cache_ttl_secs.unwrap_or(300),
    );

    CalculationConfigProvider::new(Arc::new(store), cache)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
