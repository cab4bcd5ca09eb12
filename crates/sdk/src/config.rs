//! Configuration types for the identity storage SDK.

use crate::error::{StorageError, StorageResult};
use std::time::Duration;
use url::Url;

/// Configuration for the identity storage client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `{api_url}{api_base_path}/`, the root all claim routes are joined onto.
    pub base_url: Url,
    /// Request timeout.
    pub timeout: Duration,
    /// How long an idle pooled connection is kept.
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections kept per host.
    pub pool_max_idle_per_host: usize,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl ClientConfig {
    /// Create a configuration from the store's URL and API base path
    /// (e.g. `http://localhost:5005` and `/api/v1`).
    pub fn new(api_url: &str, api_base_path: &str) -> StorageResult<Self> {
        Ok(Self {
            base_url: base_url(api_url, api_base_path)?,
            timeout: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(15 * 60),
            pool_max_idle_per_host: 25,
            user_agent: format!("identity-storage-sdk/{}", env!("CARGO_PKG_VERSION")),
        })
    }
}

/// Normalise the base so that relative joins append instead of replacing the
/// last path segment.
fn base_url(api_url: &str, api_base_path: &str) -> StorageResult<Url> {
    let api_url = api_url.trim();
    if api_url.is_empty() {
        return Err(StorageError::Config("api_url is required".to_string()));
    }

    let mut url = Url::parse(api_url)?;
    if url.cannot_be_a_base() {
        return Err(StorageError::Config(format!(
            "api_url cannot be used as a base: {api_url}"
        )));
    }

    let mut path = url.path().trim_end_matches('/').to_string();
    let base_path = api_base_path.trim().trim_matches('/');
    if !base_path.is_empty() {
        path.push('/');
        path.push_str(base_path);
    }
    path.push('/');
    url.set_path(&path);

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_joins_base_path() {
        let config = ClientConfig::new("http://localhost:5005", "/api/v1").unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:5005/api/v1/");
    }

    #[test]
    fn test_base_url_without_leading_slash() {
        let config = ClientConfig::new("http://localhost", "api").unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost/api/");
    }

    #[test]
    fn test_base_url_without_base_path() {
        let config = ClientConfig::new("http://localhost:5005/", "").unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:5005/");
    }

    #[test]
    fn test_empty_api_url_rejected() {
        let err = ClientConfig::new("", "/api").unwrap_err();
        assert!(matches!(err, StorageError::Config(_)));
    }

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::new("http://localhost", "api").unwrap();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.pool_idle_timeout, Duration::from_secs(900));
        assert_eq!(config.pool_max_idle_per_host, 25);
    }
}
