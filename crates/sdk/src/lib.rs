//! # Identity Storage SDK
//!
//! Client for the identity-storage REST API that owns claim records.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use identity_storage_sdk::{IdentityStorageClient, StorageResult};
//! use identity_mcp_core::ClaimsQuery;
//!
//! #[tokio::main]
//! async fn main() -> StorageResult<()> {
//!     let client = IdentityStorageClient::builder()
//!         .api_url("http://localhost:5005")
//!         .api_base_path("/api/v1")
//!         .build()?;
//!
//!     let claims = client.claims().list(&ClaimsQuery::default()).await?;
//!     println!("Found {} claims", claims.map(|c| c.len()).unwrap_or(0));
//!
//!     Ok(())
//! }
//! ```
//!
//! [`IdentityStorageClient`] also implements [`identity_mcp_core::ClaimClient`],
//! which is how the MCP tools reach the store.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use api::{ClaimDto, ClaimsApi, ClaimsInfoDto};
pub use client::{IdentityStorageClient, IdentityStorageClientBuilder};
pub use config::ClientConfig;
pub use error::{StorageError, StorageResult};
