//! Client configuration.
//!
//! A [`ClientConfig`] is the input to [`DmawClient::from_config`](crate::DmawClient::from_config).
//! It can be built in code, parsed from JSON, or read from the environment.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::DmawError;

/// Environment variable holding the base URL.
pub const BASE_URL_ENV: &str = "DMAW_BASE_URL";

/// Environment variable holding extra headers as a JSON object.
pub const HEADERS_ENV: &str = "DMAW_HEADERS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Prefix for every request path. A trailing slash is ignored.
    pub base_url: String,

    /// Headers added to every request after `accept` and `content-type`,
    /// which cannot be overridden.
    #[serde(default)]
    pub headers: IndexMap<String, String>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            headers: IndexMap::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn from_json(raw: &str) -> Result<Self, DmawError> {
        serde_json::from_str(raw).map_err(|e| DmawError::ConfigError(e.to_string()))
    }

    /// Read `DMAW_BASE_URL` (required) and `DMAW_HEADERS` (optional).
    pub fn from_env() -> Result<Self, DmawError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DmawError> {
        let base_url = lookup(BASE_URL_ENV)
            .ok_or_else(|| DmawError::ConfigError(format!("{BASE_URL_ENV} is not set")))?;
        let headers = match lookup(HEADERS_ENV) {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| DmawError::ConfigError(format!("{HEADERS_ENV}: {e}")))?,
            None => IndexMap::new(),
        };
        Ok(Self { base_url, headers })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn from_json_defaults_headers() {
        let config = ClientConfig::from_json(r#"{"base_url":"http://api.test"}"#).unwrap();
        assert_eq!(config, ClientConfig::new("http://api.test"));
    }

    #[test]
    fn from_json_keeps_header_order() {
        let config = ClientConfig::from_json(
            r#"{"base_url":"http://api.test","headers":{"x-b":"2","x-a":"1"}}"#,
        )
        .unwrap();
        let names: Vec<_> = config.headers.keys().map(String::as_str).collect();
        assert_eq!(names, ["x-b", "x-a"]);
    }

    #[test]
    fn from_json_rejects_missing_base_url() {
        let err = ClientConfig::from_json(r#"{"headers":{}}"#).unwrap_err();
        assert!(matches!(err, DmawError::ConfigError(_)));
    }

    #[test]
    fn from_env_reads_both_variables() {
        let config = ClientConfig::from_lookup(lookup(&[
            (BASE_URL_ENV, "http://env.test/"),
            (HEADERS_ENV, r#"{"authorization":"Bearer t"}"#),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://env.test/");
        assert_eq!(config.headers["authorization"], "Bearer t");
    }

    #[test]
    fn from_env_requires_base_url() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains(BASE_URL_ENV));
    }

    #[test]
    fn from_env_rejects_bad_headers() {
        let err = ClientConfig::from_lookup(lookup(&[
            (BASE_URL_ENV, "http://env.test"),
            (HEADERS_ENV, "not json"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(HEADERS_ENV));
    }
}
