//! Client settings loaded from configuration files.
//!
//! ```toml
//! endpoint = "https://api.example.com/graphql"
//! timeout_secs = 20
//!
//! [headers]
//! "X-Client" = "plexus-web"
//! ```
//!
//! The `PLEXUS_GRAPHQL_ENDPOINT` environment variable overrides `endpoint`
//! when [`ClientSettings::with_env_overrides`] is applied.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};
use crate::graphql::GraphQLClientBuilder;

/// Environment variable overriding the configured endpoint.
pub const ENDPOINT_ENV: &str = "PLEXUS_GRAPHQL_ENDPOINT";

/// Serializable client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientSettings {
    /// GraphQL endpoint URL.
    pub endpoint: String,
    /// Request timeout in seconds. No timeout when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Headers added to every request.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

impl ClientSettings {
    /// Settings for an endpoint with no timeout and no extra headers.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_secs: None,
            headers: HashMap::new(),
        }
    }

    /// Parse settings from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let settings: Self = toml::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read and parse a TOML settings file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            ClientError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&source)
    }

    /// Apply environment overrides.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|v| !v.trim().is_empty()) {
            self.endpoint = endpoint;
        }
        self.validate()?;
        Ok(self)
    }

    /// The configured timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Check that the endpoint is an absolute http(s) URL.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.endpoint)?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ClientError::InvalidConfig(format!(
                "unsupported endpoint scheme '{other}'"
            ))),
        }
    }

    /// A client builder preloaded with these settings.
    pub fn into_builder(self) -> GraphQLClientBuilder {
        let timeout = self.timeout();
        let mut builder = GraphQLClientBuilder::new(self.endpoint).headers(self.headers);
        if let Some(timeout) = timeout {
            builder = builder.request_timeout(timeout);
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_toml_str() {
        let settings = ClientSettings::from_toml_str(
            r#"
            endpoint = "https://api.example.com/graphql"
            timeout_secs = 20

            [headers]
            "X-Client" = "plexus-web"
            "#,
        )
        .unwrap();

        assert_eq!(settings.endpoint, "https://api.example.com/graphql");
        assert_eq!(settings.timeout(), Some(Duration::from_secs(20)));
        assert_eq!(settings.headers.get("X-Client").map(String::as_str), Some("plexus-web"));
    }

    #[test]
    fn test_minimal_settings() {
        let settings = ClientSettings::from_toml_str(r#"endpoint = "http://localhost:4000/graphql""#)
            .unwrap();
        assert_eq!(settings, ClientSettings::new("http://localhost:4000/graphql"));
        assert_eq!(settings.timeout(), None);
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        assert!(matches!(
            ClientSettings::from_toml_str(r#"endpoint = "not a url""#),
            Err(ClientError::InvalidConfig(_))
        ));
        assert!(matches!(
            ClientSettings::from_toml_str(r#"endpoint = "ftp://example.com/graphql""#),
            Err(ClientError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_fields() {
        assert!(ClientSettings::from_toml_str(
            r#"
            endpoint = "https://api.example.com/graphql"
            retries = 3
            "#
        )
        .is_err());
    }

    #[test]
    fn test_env_override() {
        let settings = ClientSettings::new("https://api.example.com/graphql")
            .with_overrides(|name| {
                (name == ENDPOINT_ENV).then(|| "http://staging.example.com/graphql".to_string())
            })
            .unwrap();
        assert_eq!(settings.endpoint, "http://staging.example.com/graphql");

        let untouched = ClientSettings::new("https://api.example.com/graphql")
            .with_overrides(|_| Some("   ".to_string()))
            .unwrap();
        assert_eq!(untouched.endpoint, "https://api.example.com/graphql");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"endpoint = "https://api.example.com/graphql""#).unwrap();

        let settings = ClientSettings::from_file(file.path()).unwrap();
        assert_eq!(settings.endpoint, "https://api.example.com/graphql");

        assert!(ClientSettings::from_file("/definitely/not/here.toml").is_err());
    }

    #[test]
    fn test_into_builder() {
        let client = ClientSettings::new("https://api.example.com/graphql")
            .into_builder()
            .build()
            .unwrap();
        assert_eq!(client.url(), "https://api.example.com/graphql");
    }
}
