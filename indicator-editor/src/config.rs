//! Gateway configuration.

use crate::error::{EditorError, Result};

/// Environment variable holding the API base URL.
pub const API_BASE_ENV: &str = "API_BASE";

/// Environment variable holding the request timeout in seconds.
pub const REQUEST_TIMEOUT_ENV: &str = "REQUEST_TIMEOUT_SECS";

/// Base URL used when nothing is configured.
pub const DEFAULT_API_BASE: &str = "http://localhost:8080/api";

/// Configuration for the indicator values API client
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// Base URL for every endpoint, without trailing slash
    pub api_base: String,
    /// Request timeout in seconds (default: 30)
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl GatewayConfig {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: normalize_base(api_base.into()),
            ..Default::default()
        }
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Resolve from the process environment.
    ///
    /// Call once at start-up; absent variables fall back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base) = lookup(API_BASE_ENV).filter(|v| !v.trim().is_empty()) {
            config.api_base = normalize_base(base);
        }

        if let Some(raw) = lookup(REQUEST_TIMEOUT_ENV) {
            config.request_timeout_secs = raw.trim().parse().map_err(|_| {
                EditorError::Config(format!("{} must be a number of seconds, got {:?}", REQUEST_TIMEOUT_ENV, raw))
            })?;
        }

        Ok(config)
    }

    /// Join a path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }
}

fn normalize_base(base: String) -> String {
    base.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = GatewayConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, GatewayConfig::default());
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_env_overrides() {
        let config = GatewayConfig::from_lookup(lookup(&[
            (API_BASE_ENV, "https://dash.example.org/api/"),
            (REQUEST_TIMEOUT_ENV, "5"),
        ]))
        .unwrap();
        assert_eq!(config.api_base, "https://dash.example.org/api");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(
            config.endpoint("/data-types"),
            "https://dash.example.org/api/data-types"
        );
    }

    #[test]
    fn test_blank_base_uses_default() {
        let config = GatewayConfig::from_lookup(lookup(&[(API_BASE_ENV, "  ")])).unwrap();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_bad_timeout() {
        let err = GatewayConfig::from_lookup(lookup(&[(REQUEST_TIMEOUT_ENV, "soon")])).unwrap_err();
        assert!(matches!(err, EditorError::Config(_)));
    }
}
