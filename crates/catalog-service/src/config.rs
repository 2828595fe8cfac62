// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Service configuration module
//!
//! Configuration is layered with the `config` crate, later sources overriding
//! earlier ones:
//!
//! 1. Default values
//! 2. `catalog.json`
//! 3. `catalog.{environment}.json`
//! 4. Environment variables prefixed with `CATALOG_`, nested keys separated by
//!    `__` (for example `CATALOG_INDEXER__ENDPOINT`)

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Result, ensure};
use config::{Config, ConfigError, Environment as ConfigEnv, File};
use nft_catalog::{CatalogSettings, DistributionRequest};
use serde::{Deserialize, Deserializer, Serialize, de};
use shared_types::{SerieId, UserId};
use url::Url;

use crate::error::{ServiceError, ServiceResult};

/// Base name of the configuration files
pub const CONFIG_FILE_STEM: &str = "catalog";

/// A validated timeout duration in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeoutSeconds(Duration);

impl TimeoutSeconds {
    /// Create a new `TimeoutSeconds`, ensuring the value is within valid bounds
    ///
    /// # Errors
    ///
    /// Returns an error if timeout is 0 or greater than 300 seconds
    pub fn new(seconds: u64) -> Result<Self> {
        ensure!(seconds != 0, "timeout must be greater than 0");
        ensure!(seconds <= 300, "timeout cannot exceed 300");
        Ok(Self(Duration::from_secs(seconds)))
    }

    /// Get the timeout value
    pub fn value(&self) -> Duration {
        self.0
    }

    /// Get the timeout in whole seconds
    pub fn as_secs(&self) -> u64 {
        self.0.as_secs()
    }
}

impl<'de> Deserialize<'de> for TimeoutSeconds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Self::new(seconds).map_err(|e| de::Error::custom(e.to_string()))
    }
}

/// Environment types for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production environment
    Production,
    /// Development environment
    Development,
    /// Testing environment
    Testing,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Development => write!(f, "development"),
            Environment::Testing => write!(f, "testing"),
        }
    }
}

/// Indexer connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerSettings {
    /// GraphQL endpoint
    pub endpoint: Url,
    /// Per-attempt request timeout (1-300 s)
    pub timeout_seconds: TimeoutSeconds,
    /// Health probe timeout (1-300 s)
    pub health_check_timeout_seconds: TimeoutSeconds,
    /// Retries after the first attempt on transient failures
    pub max_retries: u32,
}

/// Local store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// JSON snapshot holding documents, categories and candidates
    pub snapshot_path: PathBuf,
}

/// Category cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCacheSettings {
    /// Entry lifetime in seconds
    pub ttl_seconds: u64,
    /// Capacity before least recently used entries are evicted
    pub max_entries: usize,
}

impl CategoryCacheSettings {
    /// Entry lifetime
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// A draw to run at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawSettings {
    /// Serie to distribute
    pub serie_id: SerieId,
    /// Number of ranked users taking part
    pub users_number: usize,
    /// Users that may not win
    #[serde(default)]
    pub excluded_users: Vec<UserId>,
}

impl DrawSettings {
    /// Request handed to the distribution engine
    pub fn to_request(&self) -> DistributionRequest {
        DistributionRequest {
            serie_id: self.serie_id.clone(),
            users_number: self.users_number,
            excluded_users: self.excluded_users.clone(),
        }
    }
}

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Environment type
    pub environment: Environment,
    /// Indexer connection
    pub indexer: IndexerSettings,
    /// Local store
    pub store: StoreSettings,
    /// Category cache
    pub category_cache: CategoryCacheSettings,
    /// Catalog behaviour
    #[serde(default)]
    pub catalog: CatalogSettings,
    /// Draw to run, if any
    #[serde(default)]
    pub draw: Option<DrawSettings>,
}

impl ServiceConfig {
    /// Load configuration from the working directory and the environment
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Config` if configuration is invalid or cannot be loaded.
    pub fn from_env() -> ServiceResult<Self> {
        Self::load_from(Path::new("."), None).map_err(|e| ServiceError::Config {
            message: format!("failed to load configuration: {e}"),
        })
    }

    /// Load configuration files from `dir`
    ///
    /// `environment` selects the environment-specific file; when `None` it is
    /// read from the `ENVIRONMENT` variable, defaulting to `development`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or is invalid.
    pub fn load_from(dir: &Path, environment: Option<&str>) -> Result<Self, ConfigError> {
        let environment = environment.map_or_else(
            || std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            str::to_string,
        );
        let environment = environment.to_lowercase();

        let config = Config::builder()
            // Start with default values
            .set_default("environment", "development")?
            .set_default("indexer.timeout_seconds", 20)?
            .set_default("indexer.health_check_timeout_seconds", 5)?
            .set_default("indexer.max_retries", 3)?
            .set_default("store.snapshot_path", "catalog-snapshot.json")?
            .set_default("category_cache.ttl_seconds", 300)?
            .set_default("category_cache.max_entries", 1000)?
            .add_source(File::from(dir.join(format!("{CONFIG_FILE_STEM}.json"))).required(false))
            .add_source(
                File::from(dir.join(format!("{CONFIG_FILE_STEM}.{environment}.json")))
                    .required(false),
            )
            .add_source(
                ConfigEnv::with_prefix("CATALOG")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("draw.excluded_users")
                    .try_parsing(true),
            )
            .set_override("environment", environment)?
            .build()?;

        let service_config: Self = config.try_deserialize()?;
        service_config.validate()?;
        Ok(service_config)
    }

    /// Check ranges the types alone do not enforce
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` naming the offending setting
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.category_cache.max_entries == 0 {
            return Err(ConfigError::Message(
                "category_cache.max_entries must be at least 1".to_string(),
            ));
        }
        if self.category_cache.ttl_seconds == 0 {
            return Err(ConfigError::Message(
                "category_cache.ttl_seconds must be at least 1".to_string(),
            ));
        }
        if let Some(draw) = &self.draw
            && draw.users_number == 0
        {
            return Err(ConfigError::Message(
                "draw.users_number must be at least 1".to_string(),
            ));
        }
        self.catalog
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid catalog settings: {e}")))
    }
}
