// src/config.rs

//! Application configuration structures.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Archive download settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Counter store endpoints, one per family
    #[serde(default)]
    pub stores: StoresConfig,

    /// Category graph source settings
    #[serde(default)]
    pub graph: GraphConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return defaults if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.base_url.trim().is_empty() {
            return Err(AppError::config("fetch.base_url is empty"));
        }
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::config("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::config("fetch.timeout_secs must be > 0"));
        }
        if self.stores.plays.url.trim().is_empty() {
            return Err(AppError::config("stores.plays.url is empty"));
        }
        if self.stores.images.url.trim().is_empty() {
            return Err(AppError::config("stores.images.url is empty"));
        }
        if self.graph.database_url.trim().is_empty() {
            return Err(AppError::config("graph.database_url is empty"));
        }
        if self.graph.max_concurrent == 0 {
            return Err(AppError::config("graph.max_concurrent must be > 0"));
        }
        Ok(())
    }
}

/// Archive download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Base URL of the mediacounts dumps
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// First day the logs exist; backfills start here
    #[serde(default = "defaults::backfill_start")]
    pub backfill_start: NaiveDate,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            backfill_start: defaults::backfill_start(),
        }
    }
}

/// Counter store endpoints, one per family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoresConfig {
    /// Playable-media and YouTube counters
    #[serde(default = "defaults::plays_store")]
    pub plays: StoreConfig,

    /// Static-image cohort counters
    #[serde(default = "defaults::images_store")]
    pub images: StoreConfig,
}

impl Default for StoresConfig {
    fn default() -> Self {
        Self {
            plays: defaults::plays_store(),
            images: defaults::images_store(),
        }
    }
}

/// One counter store endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend variant, chosen at construction time
    pub backend: Backend,

    /// Connection URL
    pub url: String,
}

/// Counter store backend variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// RESP endpoint (the primary store, or SSDB's compatible listener)
    Redis,
    /// In-process store for development and tests
    Memory,
}

/// Category graph source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Connection URL of the wiki replica database
    #[serde(default = "defaults::database_url")]
    pub database_url: String,

    /// Maximum concurrent graph queries per walk level
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            database_url: defaults::database_url(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

mod defaults {
    use chrono::NaiveDate;

    use super::{Backend, StoreConfig};

    pub fn base_url() -> String {
        "https://dumps.wikimedia.org/other/mediacounts".into()
    }
    pub fn user_agent() -> String {
        "mediatally/0.1 (playcount ingestion)".into()
    }
    pub fn timeout() -> u64 {
        600
    }
    pub fn backfill_start() -> NaiveDate {
        // The daily mediacounts logs begin on 1 January 2015
        NaiveDate::from_ymd_opt(2015, 1, 1).expect("valid epoch")
    }

    pub fn plays_store() -> StoreConfig {
        StoreConfig {
            backend: Backend::Redis,
            url: "redis://127.0.0.1:6379".into(),
        }
    }
    pub fn images_store() -> StoreConfig {
        StoreConfig {
            backend: Backend::Redis,
            url: "redis://127.0.0.1:8888".into(),
        }
    }

    pub fn database_url() -> String {
        "mysql://commonswiki.labsdb:3306/commonswiki_p".into()
    }
    pub fn max_concurrent() -> usize {
        4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.fetch.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.graph.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [stores.images]
            backend = "memory"
            url = "memory://"

            [fetch]
            backfill_start = "2016-06-01"
            "#,
        )
        .unwrap();

        assert_eq!(config.stores.images.backend, Backend::Memory);
        assert_eq!(config.stores.plays.backend, Backend::Redis);
        assert_eq!(
            config.fetch.backfill_start,
            NaiveDate::from_ymd_opt(2016, 6, 1).unwrap()
        );
        assert_eq!(config.fetch.base_url, defaults::base_url());
    }
}
