use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::models::ScoringWeights;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub catalog: CatalogSettings,
    pub parameters: ParameterSettings,
    pub matching: MatchingSettings,
    pub scoring: ScoringSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSettings {
    /// JSON array of arrow products
    #[serde(default = "default_catalog_path")]
    pub path: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

fn default_catalog_path() -> String { "data/catalog.json".to_string() }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParameterSettings {
    /// Calculation parameter TOML; built-in tables when unset
    pub path: Option<String>,
    pub cache_ttl_secs: Option<u64>,
    pub cache_capacity: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchingSettings {
    pub search_limit: Option<usize>,
    pub default_limit: Option<usize>,
    pub max_limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_spine_accuracy_weight")]
    pub spine_accuracy: f64,
    #[serde(default = "default_availability_weight")]
    pub availability: f64,
    #[serde(default = "default_manufacturer_weight")]
    pub manufacturer: f64,
    #[serde(default = "default_diameter_weight")]
    pub diameter: f64,
    #[serde(default = "default_foc_weight")]
    pub foc: f64,
    #[serde(default = "default_mass_weight")]
    pub mass: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            spine_accuracy: default_spine_accuracy_weight(),
            availability: default_availability_weight(),
            manufacturer: default_manufacturer_weight(),
            diameter: default_diameter_weight(),
            foc: default_foc_weight(),
            mass: default_mass_weight(),
        }
    }
}

impl From<&WeightsConfig> for ScoringWeights {
    fn from(config: &WeightsConfig) -> Self {
        ScoringWeights {
            spine_accuracy: config.spine_accuracy,
            availability: config.availability,
            manufacturer: config.manufacturer,
            diameter: config.diameter,
            foc: config.foc,
            mass: config.mass,
        }
    }
}

fn default_spine_accuracy_weight() -> f64 { 0.40 }
fn default_availability_weight() -> f64 { 0.20 }
fn default_manufacturer_weight() -> f64 { 0.10 }
fn default_diameter_weight() -> f64 { 0.15 }
fn default_foc_weight() -> f64 { 0.15 }
fn default_mass_weight() -> f64 { 0.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "pretty".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with ARROW__)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., ARROW__MATCHING__SEARCH_LIMIT -> matching.search_limit
            .add_source(
                Environment::with_prefix("ARROW")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("ARROW")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn scoring_weights(&self) -> ScoringWeights {
        ScoringWeights::from(&self.scoring.weights)
    }
}

/// Short aliases for the two file paths, checked after the layered sources
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(path) = env::var("ARROW_CATALOG") {
        builder = builder.set_override("catalog.path", path)?;
    }
    if let Ok(path) = env::var("ARROW_PARAMETERS") {
        builder = builder.set_override("parameters.path", path)?;
    }

    builder.build()
}
