use std::env;
use std::time::Duration;

use url::Url;

use crate::cache::DEFAULT_TTL;

pub const DEFAULT_QUERY_API_BASE: &str = "https://node-api.flipsidecrypto.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub query_api_base: Url,
    pub http_bind_addr: String,
    pub cache_ttl: Duration,
    pub http_timeout: Duration,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("QUERY_API_BASE is not a valid url: {0}")]
    InvalidQueryApiBase(#[from] url::ParseError),
    #[error("{name} must be a whole number of seconds, got {value:?}")]
    InvalidSeconds { name: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let query_api_base = Url::parse(
            &lookup("QUERY_API_BASE").unwrap_or_else(|| DEFAULT_QUERY_API_BASE.to_string()),
        )?;
        let http_bind_addr =
            lookup("HTTP_BIND").unwrap_or_else(|| "127.0.0.1:8080".to_string());
        let cache_ttl = seconds(&lookup, "CACHE_TTL_SECS")?.unwrap_or(DEFAULT_TTL);
        let http_timeout =
            seconds(&lookup, "HTTP_TIMEOUT_SECS")?.unwrap_or(Duration::from_secs(30));

        Ok(Self {
            query_api_base,
            http_bind_addr,
            cache_ttl,
            http_timeout,
        })
    }
}

fn seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidSeconds { name, value: raw })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_point_at_flipside_with_ten_minute_cache() {
        let config = config(&[]).unwrap();
        assert_eq!(config.query_api_base.as_str(), "https://node-api.flipsidecrypto.com/");
        assert_eq!(config.http_bind_addr, "127.0.0.1:8080");
        assert_eq!(config.cache_ttl, Duration::from_secs(600));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn overrides_are_read() {
        let config = config(&[
            ("QUERY_API_BASE", "http://localhost:9999/mirror/"),
            ("HTTP_BIND", "0.0.0.0:3000"),
            ("CACHE_TTL_SECS", " 60 "),
        ])
        .unwrap();
        assert_eq!(config.query_api_base.path(), "/mirror/");
        assert_eq!(config.http_bind_addr, "0.0.0.0:3000");
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = config(&[("HTTP_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "HTTP_TIMEOUT_SECS must be a whole number of seconds, got \"soon\""
        );
        assert!(matches!(
            config(&[("QUERY_API_BASE", "not a url")]),
            Err(ConfigError::InvalidQueryApiBase(_))
        ));
    }
}
