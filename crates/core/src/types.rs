use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Largest page the upstream store is asked for.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Identifier of a claim, assigned by the identity store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimId(pub Uuid);

impl ClaimId {
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for ClaimId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ClaimId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An identity attribute record (e.g. an email address or a role)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    /// `None` until the identity store has created the claim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ClaimId>,
    #[serde(rename = "type")]
    pub claim_type: String,
    pub value: String,
    pub value_type: String,
    pub display_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Paging window for listing claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimsQuery {
    pub skipped: u32,
    pub number_of: u32,
}

impl ClaimsQuery {
    /// Build a query from raw caller input. Negative skips become zero and
    /// the page size is clamped to `0..=MAX_PAGE_SIZE`.
    pub fn clamped(skipped: i64, number_of: i64) -> Self {
        Self {
            skipped: skipped.clamp(0, u32::MAX as i64) as u32,
            number_of: number_of.clamp(0, MAX_PAGE_SIZE as i64) as u32,
        }
    }
}

impl Default for ClaimsQuery {
    fn default() -> Self {
        Self {
            skipped: 0,
            number_of: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Summary information reported by the identity store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimsInfo {
    pub total_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_clamps_page_size() {
        assert_eq!(ClaimsQuery::clamped(0, 500).number_of, MAX_PAGE_SIZE);
        assert_eq!(ClaimsQuery::clamped(0, -3).number_of, 0);
        assert_eq!(ClaimsQuery::clamped(0, 25).number_of, 25);
    }

    #[test]
    fn test_query_clamps_negative_skip() {
        let query = ClaimsQuery::clamped(-10, 10);
        assert_eq!(query.skipped, 0);
        assert_eq!(query.number_of, 10);
    }

    #[test]
    fn test_query_defaults() {
        let query = ClaimsQuery::default();
        assert_eq!(query.skipped, 0);
        assert_eq!(query.number_of, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_claim_serializes_type_field() {
        let claim = Claim {
            claim_type: "email".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&claim).unwrap();
        assert_eq!(json["type"], "email");
        assert!(json.get("id").is_none());
    }
}
