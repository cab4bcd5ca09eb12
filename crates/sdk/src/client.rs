//! Main client for the identity storage SDK.

use crate::api::ClaimsApi;
use crate::config::ClientConfig;
use crate::error::{StorageError, StorageResult};
use crate::transport::HttpTransport;
use anyhow::Context;
use identity_mcp_core::client::ClaimClient;
use identity_mcp_core::types::{Claim, ClaimId, ClaimsInfo, ClaimsQuery};
use std::sync::Arc;
use std::time::Duration;

/// Client for the identity-storage REST API.
#[derive(Clone)]
pub struct IdentityStorageClient {
    config: Arc<ClientConfig>,
    pub(crate) http: HttpTransport,
}

impl IdentityStorageClient {
    /// Create a new client builder.
    pub fn builder() -> IdentityStorageClientBuilder {
        IdentityStorageClientBuilder::new()
    }

    /// Create a client from configuration.
    pub fn from_config(config: ClientConfig) -> StorageResult<Self> {
        let config = Arc::new(config);
        let http = HttpTransport::new(config.clone())?;

        Ok(Self { config, http })
    }

    /// Base URL every route is resolved against.
    pub fn base_url(&self) -> &url::Url {
        &self.config.base_url
    }

    /// Get the claims API.
    pub fn claims(&self) -> ClaimsApi<'_> {
        ClaimsApi::new(self)
    }
}

#[async_trait::async_trait]
impl ClaimClient for IdentityStorageClient {
    async fn claims_info(&self) -> anyhow::Result<Option<ClaimsInfo>> {
        self.claims()
            .info()
            .await
            .context("failed to load claims info")
    }

    async fn load_claims(&self, query: &ClaimsQuery) -> anyhow::Result<Option<Vec<Claim>>> {
        self.claims()
            .list(query)
            .await
            .context("failed to load claims")
    }

    async fn load_claim(&self, id: &ClaimId) -> anyhow::Result<Option<Claim>> {
        self.claims()
            .get(id)
            .await
            .with_context(|| format!("failed to load claim {id}"))
    }

    async fn create_claim(&self, claim: &Claim) -> anyhow::Result<Option<Claim>> {
        self.claims()
            .create(claim)
            .await
            .context("failed to create claim")
    }

    async fn update_claim(&self, id: &ClaimId, claim: &Claim) -> anyhow::Result<Option<Claim>> {
        self.claims()
            .update(id, claim)
            .await
            .with_context(|| format!("failed to update claim {id}"))
    }

    async fn delete_claim(&self, id: &ClaimId) -> anyhow::Result<Option<Claim>> {
        self.claims()
            .delete(id)
            .await
            .with_context(|| format!("failed to delete claim {id}"))
    }
}

/// Builder for creating an IdentityStorageClient.
pub struct IdentityStorageClientBuilder {
    api_url: Option<String>,
    api_base_path: String,
    timeout: Option<Duration>,
}

impl IdentityStorageClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            api_url: None,
            api_base_path: String::new(),
            timeout: None,
        }
    }

    /// Set the URL of the identity store, e.g. `http://localhost:5005`.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Set the API base path, e.g. `/api/v1`.
    pub fn api_base_path(mut self, path: impl Into<String>) -> Self {
        self.api_base_path = path.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> StorageResult<IdentityStorageClient> {
        let api_url = self
            .api_url
            .ok_or_else(|| StorageError::Config("api_url is required".to_string()))?;

        let mut config = ClientConfig::new(&api_url, &self.api_base_path)?;
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }

        IdentityStorageClient::from_config(config)
    }
}

impl Default for IdentityStorageClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
