use crate::types::{Claim, ClaimId, ClaimsInfo, ClaimsQuery};
use anyhow::Result;

/// Access to the identity store that owns the claims.
///
/// Every method returns `Ok(None)` when the store answered without a payload
/// (an empty or `null` body, or a 404 on reads). Transport and status failures
/// are errors.
#[async_trait::async_trait]
pub trait ClaimClient: Send + Sync {
    /// Summary information about all claims
    async fn claims_info(&self) -> Result<Option<ClaimsInfo>>;

    /// One page of claims
    async fn load_claims(&self, query: &ClaimsQuery) -> Result<Option<Vec<Claim>>>;

    async fn load_claim(&self, id: &ClaimId) -> Result<Option<Claim>>;

    /// Create a claim; the store assigns its id
    async fn create_claim(&self, claim: &Claim) -> Result<Option<Claim>>;

    async fn update_claim(&self, id: &ClaimId, claim: &Claim) -> Result<Option<Claim>>;

    /// Delete a claim, returning the removed record
    async fn delete_claim(&self, id: &ClaimId) -> Result<Option<Claim>>;
}
