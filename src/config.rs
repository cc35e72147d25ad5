use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::models::FacilityCategory;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub appwrite: AppwriteSettings,
    #[serde(default)]
    pub collection: CollectionSettings,
    pub reference: ReferenceSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub digest: DigestSettings,
    #[serde(default)]
    pub geocoder: GeocoderSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppwriteSettings {
    pub endpoint: String,
    pub api_key: String,
    pub project_id: String,
    pub database_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSettings {
    #[serde(default = "default_heroes_collection")]
    pub heroes: String,
    /// Overrides of the collection id per facility category
    #[serde(default)]
    pub facilities: HashMap<FacilityCategory, String>,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            heroes: default_heroes_collection(),
            facilities: HashMap::new(),
        }
    }
}

fn default_heroes_collection() -> String { "heroes".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceSettings {
    /// JSON snapshot mapping postal code to `[lat, lon]`
    pub coordinates_path: String,
    /// JSON snapshot mapping postal code to region hierarchy code
    pub regions_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_near_km")]
    pub near_km: u32,
    #[serde(default = "default_far_km")]
    pub far_km: u32,
    #[serde(default = "default_categories")]
    pub categories: Vec<FacilityCategory>,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            near_km: default_near_km(),
            far_km: default_far_km(),
            categories: default_categories(),
        }
    }
}

fn default_near_km() -> u32 { 5 }
fn default_far_km() -> u32 { 15 }
fn default_categories() -> Vec<FacilityCategory> { vec![FacilityCategory::Plasma] }

#[derive(Debug, Clone, Deserialize)]
pub struct DigestSettings {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for DigestSettings {
    fn default() -> Self {
        Self { concurrency: default_concurrency() }
    }
}

fn default_concurrency() -> usize { 8 }

#[derive(Debug, Clone, Deserialize)]
pub struct GeocoderSettings {
    #[serde(default = "default_geocoder_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            endpoint: default_geocoder_endpoint(),
            api_key: String::new(),
            country: default_country(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_geocoder_endpoint() -> String { "https://eu1.locationiq.com/v1/search.php".to_string() }
fn default_country() -> String { "Germany".to_string() }
fn default_max_attempts() -> u32 { 10 }
fn default_retry_delay_ms() -> u64 { 500 }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { ttl_secs: default_ttl_secs() }
    }
}

fn default_ttl_secs() -> u64 { 300 }

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
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with HERO__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., HERO__SERVER__PORT -> server.port
            .add_source(env_source())
            .build()?;

        apply_secret_overrides(settings, env_secret)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::load_from_with(path, env_secret)
    }

    fn load_from_with<P, F>(path: P, secret: F) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?;

        apply_secret_overrides(settings, secret)?.try_deserialize()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("HERO")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

fn env_secret(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Apply secrets exported under their conventional names
///
/// `APPWRITE_API_KEY` and `LOCATIONIQ_API_KEY` win over file values.
fn apply_secret_overrides<F>(settings: Config, secret: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder().add_source(settings);

    if let Some(key) = secret("APPWRITE_API_KEY") {
        builder = builder.set_override("appwrite.api_key", key)?;
    }
    if let Some(key) = secret("LOCATIONIQ_API_KEY") {
        builder = builder.set_override("geocoder.api_key", key)?;
    }

    builder.build()
}
