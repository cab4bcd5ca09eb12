//! Tool-facing data transfer objects and their mapping to domain records.
//!
//! Incoming DTOs are what MCP clients send as tool arguments, outgoing DTOs
//! are what the tools hand back inside the result envelope. Conversions are
//! plain `From` impls so every tool maps the same way.

use crate::types::{Claim, ClaimId, ClaimsInfo, ClaimsQuery, DEFAULT_PAGE_SIZE};
use chrono::{DateTime, FixedOffset, Local, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Seconds between 0001-01-01T00:00:00Z and the Unix epoch.
const EPOCH_OFFSET_SECS: i64 = 62_135_596_800;

/// Treat an explicit `null` like a missing field.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Paging parameters for `identity-get_claims`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClaimsQueryIncomingDto {
    pub skipped: i64,
    pub number_of: i64,
    pub with_claims_info: bool,
}

impl Default for ClaimsQueryIncomingDto {
    fn default() -> Self {
        Self {
            skipped: 0,
            number_of: DEFAULT_PAGE_SIZE as i64,
            with_claims_info: false,
        }
    }
}

impl From<&ClaimsQueryIncomingDto> for ClaimsQuery {
    fn from(dto: &ClaimsQueryIncomingDto) -> Self {
        ClaimsQuery::clamped(dto.skipped, dto.number_of)
    }
}

/// Data for a new claim. The identity store assigns the id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimCreateDto {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub claim_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<ClaimCreateDto> for Claim {
    fn from(dto: ClaimCreateDto) -> Self {
        Self {
            id: None,
            claim_type: dto.claim_type,
            value: dto.value,
            value_type: dto.value_type,
            display_text: dto.display_text,
            properties: dto.properties,
            description: dto.description,
        }
    }
}

/// Replacement data for an existing claim
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimUpdateDto {
    /// Must match the `claimId` argument of the update call
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: Uuid,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub claim_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<ClaimUpdateDto> for Claim {
    fn from(dto: ClaimUpdateDto) -> Self {
        Self {
            id: Some(ClaimId(dto.id)),
            claim_type: dto.claim_type,
            value: dto.value,
            value_type: dto.value_type,
            display_text: dto.display_text,
            properties: dto.properties,
            description: dto.description,
        }
    }
}

/// A claim as returned to MCP clients
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimOutgoingDto {
    pub id: Uuid,
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

impl From<Claim> for ClaimOutgoingDto {
    fn from(claim: Claim) -> Self {
        Self {
            id: claim.id.map(|id| id.0).unwrap_or_default(),
            claim_type: claim.claim_type,
            value: claim.value,
            value_type: claim.value_type,
            display_text: claim.display_text,
            properties: claim.properties,
            description: claim.description,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsInfoOutgoingDto {
    pub count: u64,
}

impl From<ClaimsInfo> for ClaimsInfoOutgoingDto {
    fn from(info: ClaimsInfo) -> Self {
        Self {
            count: info.total_count,
        }
    }
}

/// A page of claims, optionally with summary information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsOutgoingDto {
    pub claims: Vec<ClaimOutgoingDto>,
    #[serde(rename = "claimsinfo")]
    pub claims_info: Option<ClaimsInfoOutgoingDto>,
}

/// Version and clock information returned by `general-get_app_version`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppVersionDto {
    pub app_version: String,
    pub app_now: DateTime<FixedOffset>,
    pub app_now_utc: DateTime<Utc>,
    /// 100-nanosecond ticks since 0001-01-01T00:00:00Z
    pub app_utc_ticks: i64,
}

impl AppVersionDto {
    pub fn now(version: impl Into<String>) -> Self {
        Self::at(version, Local::now().fixed_offset())
    }

    pub fn at(version: impl Into<String>, now: DateTime<FixedOffset>) -> Self {
        let utc = now.with_timezone(&Utc);
        Self {
            app_version: version.into(),
            app_now: now,
            app_now_utc: utc,
            app_utc_ticks: utc_ticks(&utc),
        }
    }
}

fn utc_ticks(at: &DateTime<Utc>) -> i64 {
    (at.timestamp() + EPOCH_OFFSET_SECS) * 10_000_000 + i64::from(at.timestamp_subsec_nanos() / 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_null_required_fields_decode_as_blank() {
        let dto: ClaimCreateDto =
            serde_json::from_str(r#"{"type":null,"value":"a","valueType":null}"#).unwrap();
        assert_eq!(dto.claim_type, "");
        assert_eq!(dto.value, "a");
        assert_eq!(dto.value_type, "");

        let dto: ClaimUpdateDto = serde_json::from_str(r#"{"id":null}"#).unwrap();
        assert!(dto.id.is_nil());
    }

    #[test]
    fn test_query_dto_defaults_when_fields_missing() {
        let dto: ClaimsQueryIncomingDto = serde_json::from_str("{}").unwrap();
        assert_eq!(dto, ClaimsQueryIncomingDto::default());
        assert_eq!(ClaimsQuery::from(&dto).number_of, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_query_dto_maps_clamped() {
        let dto: ClaimsQueryIncomingDto =
            serde_json::from_str(r#"{"skipped": -1, "numberOf": 1000, "withClaimsInfo": true}"#)
                .unwrap();
        let query = ClaimsQuery::from(&dto);
        assert_eq!(query.skipped, 0);
        assert_eq!(query.number_of, 100);
        assert!(dto.with_claims_info);
    }

    #[test]
    fn test_create_dto_maps_without_id() {
        let dto: ClaimCreateDto = serde_json::from_str(
            r#"{"type": "email", "value": "a@b.c", "valueType": "string", "displayText": "Email"}"#,
        )
        .unwrap();
        let claim = Claim::from(dto);
        assert!(claim.id.is_none());
        assert_eq!(claim.claim_type, "email");
        assert_eq!(claim.display_text, "Email");
    }

    #[test]
    fn test_update_dto_maps_id() {
        let id = Uuid::new_v4();
        let dto = ClaimUpdateDto {
            id,
            claim_type: "role".to_string(),
            ..Default::default()
        };
        let claim = Claim::from(dto);
        assert_eq!(claim.id, Some(ClaimId(id)));
    }

    #[test]
    fn test_outgoing_dto_from_claim_without_id_uses_nil() {
        let dto = ClaimOutgoingDto::from(Claim::default());
        assert!(dto.id.is_nil());
    }

    #[test]
    fn test_claims_outgoing_uses_lowercase_info_key() {
        let dto = ClaimsOutgoingDto {
            claims: vec![],
            claims_info: Some(ClaimsInfo { total_count: 7 }.into()),
        };
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["claimsinfo"]["count"], 7);
    }

    #[test]
    fn test_app_version_ticks() {
        let epoch = Utc.timestamp_opt(0, 0).unwrap().fixed_offset();
        let dto = AppVersionDto::at("1.2.3", epoch);
        assert_eq!(dto.app_version, "1.2.3");
        assert_eq!(dto.app_utc_ticks, 621_355_968_000_000_000);
    }
}
