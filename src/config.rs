use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::Deserialize;

use crate::app::DEFAULT_TASK_INTERVAL;
use crate::catalog::Catalog;
use crate::error::KimQueryError;
use crate::fetch::{DEFAULT_RETRIES, DEFAULT_RETRY_INTERVAL, RetryPolicy};
use crate::openkim::DEFAULT_API_URL;
use crate::store::CacheStore;

pub const CONFIG_FILE: &str = "kimquery.json";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub cache_file: Option<String>,
    #[serde(default)]
    pub catalog_file: Option<String>,
    #[serde(default)]
    pub retries: Option<u32>,
    #[serde(default)]
    pub retry_interval_secs: Option<u64>,
    #[serde(default)]
    pub task_interval_secs: Option<u64>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api_url: String,
    pub cache_file: Option<Utf8PathBuf>,
    pub catalog: Catalog,
    pub retry: RetryPolicy,
    pub task_interval: Duration,
    pub timeout: Duration,
}

impl ResolvedConfig {
    /// Cache location: `explicit` first, then the configured file, then the
    /// per-user default. The home directory is only consulted last.
    pub fn cache_path(
        &self,
        explicit: Option<Utf8PathBuf>,
    ) -> Result<Utf8PathBuf, KimQueryError> {
        match explicit.or_else(|| self.cache_file.clone()) {
            Some(path) => Ok(path),
            None => CacheStore::default_path(),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads `path`, or `kimquery.json` from the working directory when no
    /// path is given. Only the implicit file may be absent.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, KimQueryError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| KimQueryError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| KimQueryError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, KimQueryError> {
        let catalog = match config.catalog_file {
            Some(file) => Catalog::load(&Utf8PathBuf::from(file))?,
            None => Catalog::builtin(),
        };

        Ok(ResolvedConfig {
            api_url: config
                .api_url
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            cache_file: config.cache_file.map(Utf8PathBuf::from),
            catalog,
            retry: RetryPolicy {
                retries: config.retries.unwrap_or(DEFAULT_RETRIES),
                interval: config
                    .retry_interval_secs
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_RETRY_INTERVAL),
            },
            task_interval: config
                .task_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TASK_INTERVAL),
            timeout: config
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_values_override_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"cache_file": "data/cache.json", "retries": 1, "task_interval_secs": 0}"#,
        )
        .unwrap();
        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.api_url, DEFAULT_API_URL);
        assert_eq!(resolved.cache_path(None).unwrap(), "data/cache.json");
        assert_eq!(resolved.retry.retries, 1);
        assert_eq!(resolved.retry.interval, DEFAULT_RETRY_INTERVAL);
        assert_eq!(resolved.task_interval, Duration::ZERO);
    }

    #[test]
    fn explicit_cache_path_wins_over_config() {
        let config: Config = serde_json::from_str(r#"{"cache_file": "data/cache.json"}"#).unwrap();
        let resolved = ConfigLoader::resolve_config(config).unwrap();
        let path = resolved
            .cache_path(Some(Utf8PathBuf::from("elsewhere/cache.json")))
            .unwrap();
        assert_eq!(path, "elsewhere/cache.json");
    }
}
