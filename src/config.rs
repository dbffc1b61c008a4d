use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::matcher::{DEFAULT_MAX_RESULTS, DEFAULT_THRESHOLD};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub offers_only: bool,
    pub ttl_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://sofia-supermarkets-api-proxy.stefan-bratanov.workers.dev".to_string(),
            offers_only: true,
            ttl_secs: 6 * 60 * 60,
            request_timeout_secs: 20,
            user_agent: "PromoMatcher/0.1".to_string(),
        }
    }
}

impl CatalogConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    pub threshold: f64,
    pub max_results: usize,
    pub estimate_max_age_secs: u64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_results: DEFAULT_MAX_RESULTS,
            estimate_max_age_secs: 24 * 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: String,
    pub level: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: "logs/promo-matcher.log".to_string(),
            level: Some("info".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub matcher: MatcherConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let explicit_path = std::env::var("CONFIG_FILE").ok();
        let config = if let Some(path) = explicit_path {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(anyhow!("config file {:?} not found", path));
            }
            Self::load_from_file(&path)?
        } else {
            let path = locate_default_config();
            if let Some(path) = path {
                Self::load_from_file(&path)?
            } else {
                AppConfig::default()
            }
        };

        Self::apply_env_overrides(config)?.validated()
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        Self::from_yaml(&contents).with_context(|| format!("failed to parse config file {:?}", path))
    }

    fn from_yaml(contents: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    fn apply_env_overrides(mut config: AppConfig) -> anyhow::Result<AppConfig> {
        if let Ok(bind) = std::env::var("SERVER_BIND") {
            config.server.bind = bind;
        }

        if let Ok(base_url) = std::env::var("CATALOG_BASE_URL") {
            config.catalog.base_url = base_url;
        }

        if let Some(offers_only) = parse_optional_env("CATALOG_OFFERS_ONLY")? {
            config.catalog.offers_only = offers_only;
        }

        if let Some(ttl) = parse_optional_env("CATALOG_TTL_SECS")? {
            config.catalog.ttl_secs = ttl;
        }

        if let Some(timeout) = parse_optional_env("CATALOG_TIMEOUT_SECS")? {
            config.catalog.request_timeout_secs = timeout;
        }

        if let Some(threshold) = parse_optional_env("MATCH_THRESHOLD")? {
            config.matcher.threshold = threshold;
        }

        if let Some(max_results) = parse_optional_env("MATCH_MAX_RESULTS")? {
            config.matcher.max_results = max_results;
        }

        if let Ok(log_file) = std::env::var("LOG_FILE_PATH") {
            config.logging.file = log_file;
        }

        if let Ok(log_level) = std::env::var("LOG_LEVEL") {
            config.logging.level = Some(log_level);
        }

        Ok(config)
    }

    fn validated(self) -> anyhow::Result<Self> {
        url::Url::parse(self.catalog.base_url.trim()).with_context(|| {
            format!(
                "invalid catalog base url {:?}; set CATALOG_BASE_URL or catalog.base_url",
                self.catalog.base_url
            )
        })?;

        if !(0.0..=1.0).contains(&self.matcher.threshold) {
            return Err(anyhow!(
                "matcher threshold must be within 0..=1, got {}",
                self.matcher.threshold
            ));
        }

        if self.matcher.max_results == 0 {
            return Err(anyhow!("matcher max_results must be at least 1"));
        }

        Ok(self)
    }
}

fn parse_optional_env<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => Ok(Some(
            v.trim()
                .parse::<T>()
                .with_context(|| format!("{key} must be a valid value"))?,
        )),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn locate_default_config() -> Option<PathBuf> {
    let candidates = [
        PathBuf::from("config/config.yaml"),
        PathBuf::from("../config/config.yaml"),
    ];

    candidates.into_iter().find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_matcher_constants() {
        let config = AppConfig::default().validated().expect("defaults are valid");
        assert_eq!(config.matcher.threshold, 0.55);
        assert_eq!(config.matcher.max_results, 10);
        assert_eq!(config.catalog.ttl(), Duration::from_secs(21_600));
        assert!(config.catalog.offers_only);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml(
            "catalog:\n  base_url: http://localhost:9000\n  ttl_secs: 60\nmatcher:\n  threshold: 0.7\n",
        )
        .expect("parse");

        assert_eq!(config.catalog.base_url, "http://localhost:9000");
        assert_eq!(config.catalog.ttl_secs, 60);
        assert_eq!(config.catalog.request_timeout_secs, 20);
        assert_eq!(config.matcher.threshold, 0.7);
        assert_eq!(config.matcher.max_results, 10);
        assert_eq!(config.server.bind, "127.0.0.1:8080");
    }

    #[test]
    fn rejects_invalid_values() {
        let mut config = AppConfig::default();
        config.matcher.threshold = 1.5;
        assert!(config.validated().is_err());

        let mut config = AppConfig::default();
        config.matcher.max_results = 0;
        assert!(config.validated().is_err());

        let mut config = AppConfig::default();
        config.catalog.base_url = "::not a url::".to_string();
        assert!(config.validated().is_err());
    }
}
