//! HTTP transport layer for the identity storage SDK.

use crate::config::ClientConfig;
use crate::error::{StorageError, StorageResult};
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// HTTP transport for making API requests.
///
/// Every call yields `Ok(None)` when the store answers with an empty or
/// `null` body. Requests are sent once; failures are never retried.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: Arc<ClientConfig>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration.
    pub fn new(config: Arc<ClientConfig>) -> StorageResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// Build a URL for the given path, relative to the configured base.
    fn build_url(&self, path: &str) -> StorageResult<url::Url> {
        self.config
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(StorageError::InvalidUrl)
    }

    async fn execute(&self, request_builder: RequestBuilder) -> StorageResult<Response> {
        let response = request_builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "Identity store request failed");
        Err(StorageError::from_response(status.as_u16(), &body))
    }

    async fn read_optional<T: DeserializeOwned>(response: Response) -> StorageResult<Option<T>> {
        let body = response.text().await?;
        let body = body.trim();
        if body.is_empty() {
            return Ok(None);
        }
        // `null` deserializes to None here as well
        Ok(serde_json::from_str(body)?)
    }

    /// Execute a GET request.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> StorageResult<Option<T>> {
        let url = self.build_url(path)?;
        debug!(url = %url, "GET request");

        let response = self.execute(self.client.get(url)).await?;
        Self::read_optional(response).await
    }

    /// Execute a GET request, treating 404 as an absent resource.
    pub async fn get_or_none<T: DeserializeOwned>(&self, path: &str) -> StorageResult<Option<T>> {
        match self.get(path).await {
            Err(StorageError::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                debug!(path, "Resource not found");
                Ok(None)
            }
            other => other,
        }
    }

    /// Execute a GET request with query parameters.
    pub async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> StorageResult<Option<T>> {
        let url = self.build_url(path)?;
        debug!(url = %url, "GET request with query");

        let response = self.execute(self.client.get(url).query(query)).await?;
        Self::read_optional(response).await
    }

    /// Execute a POST request.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> StorageResult<Option<T>> {
        let url = self.build_url(path)?;
        debug!(url = %url, "POST request");

        let response = self.execute(self.client.post(url).json(body)).await?;
        Self::read_optional(response).await
    }

    /// Execute a PATCH request.
    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> StorageResult<Option<T>> {
        let url = self.build_url(path)?;
        debug!(url = %url, "PATCH request");

        let response = self.execute(self.client.patch(url).json(body)).await?;
        Self::read_optional(response).await
    }

    /// Execute a DELETE request.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> StorageResult<Option<T>> {
        let url = self.build_url(path)?;
        debug!(url = %url, "DELETE request");

        let response = self.execute(self.client.delete(url)).await?;
        Self::read_optional(response).await
    }
}
