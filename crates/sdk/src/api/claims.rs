//! Claims API endpoints.

use crate::client::IdentityStorageClient;
use crate::error::StorageResult;
use identity_mcp_core::types::{Claim, ClaimId, ClaimsInfo, ClaimsQuery};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Claims API of the identity store.
pub struct ClaimsApi<'a> {
    client: &'a IdentityStorageClient,
}

impl<'a> ClaimsApi<'a> {
    pub(crate) fn new(client: &'a IdentityStorageClient) -> Self {
        Self { client }
    }

    /// List one page of claims.
    pub async fn list(&self, query: &ClaimsQuery) -> StorageResult<Option<Vec<Claim>>> {
        let claims: Option<Vec<ClaimDto>> =
            self.client.http.get_with_query("claims", query).await?;
        Ok(claims.map(|claims| claims.into_iter().map(Claim::from).collect()))
    }

    /// Get summary information about all claims.
    pub async fn info(&self) -> StorageResult<Option<ClaimsInfo>> {
        let info: Option<ClaimsInfoDto> = self.client.http.get("claims/info").await?;
        Ok(info.map(ClaimsInfo::from))
    }

    /// Get a specific claim. A 404 from the store yields `None`.
    pub async fn get(&self, claim_id: &ClaimId) -> StorageResult<Option<Claim>> {
        let claim: Option<ClaimDto> = self
            .client
            .http
            .get_or_none(&format!("claims/{}", claim_id))
            .await?;
        Ok(claim.map(Claim::from))
    }

    /// Create a claim; the store assigns the id.
    pub async fn create(&self, claim: &Claim) -> StorageResult<Option<Claim>> {
        let created: Option<ClaimDto> = self
            .client
            .http
            .post("claims", &ClaimDto::from(claim))
            .await?;
        Ok(created.map(Claim::from))
    }

    /// Update a claim.
    pub async fn update(&self, claim_id: &ClaimId, claim: &Claim) -> StorageResult<Option<Claim>> {
        let mut body = ClaimDto::from(claim);
        body.id = Some(claim_id.0);

        let updated: Option<ClaimDto> = self
            .client
            .http
            .patch(&format!("claims/{}", claim_id), &body)
            .await?;
        Ok(updated.map(Claim::from))
    }

    /// Delete a claim, returning the removed record.
    pub async fn delete(&self, claim_id: &ClaimId) -> StorageResult<Option<Claim>> {
        let deleted: Option<ClaimDto> = self
            .client
            .http
            .delete(&format!("claims/{}", claim_id))
            .await?;
        Ok(deleted.map(Claim::from))
    }
}

/// Claim as exchanged with the identity store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(rename = "type", default)]
    pub claim_type: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub value_type: String,
    #[serde(default)]
    pub display_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&Claim> for ClaimDto {
    fn from(claim: &Claim) -> Self {
        Self {
            id: claim.id.map(|id| id.0),
            claim_type: claim.claim_type.clone(),
            value: claim.value.clone(),
            value_type: claim.value_type.clone(),
            display_text: claim.display_text.clone(),
            properties: claim.properties.clone(),
            description: claim.description.clone(),
        }
    }
}

impl From<ClaimDto> for Claim {
    fn from(dto: ClaimDto) -> Self {
        Self {
            id: dto.id.map(ClaimId),
            claim_type: dto.claim_type,
            value: dto.value,
            value_type: dto.value_type,
            display_text: dto.display_text,
            properties: dto.properties,
            description: dto.description,
        }
    }
}

/// Summary information as reported by the identity store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimsInfoDto {
    #[serde(default)]
    pub total_count: u64,
}

impl From<ClaimsInfoDto> for ClaimsInfo {
    fn from(dto: ClaimsInfoDto) -> Self {
        Self {
            total_count: dto.total_count,
        }
    }
}
