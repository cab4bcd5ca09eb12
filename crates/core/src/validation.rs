//! Input validation for tool arguments.

use crate::dto::{ClaimCreateDto, ClaimUpdateDto, ClaimsQueryIncomingDto};
use crate::types::ClaimId;
use std::collections::HashMap;
use uuid::Uuid;

pub const MAX_DESCRIPTION_LENGTH: usize = 500;
pub const MAX_PROPERTIES: usize = 50;
pub const MAX_PROPERTY_KEY_LENGTH: usize = 100;
pub const MAX_PROPERTY_VALUE_LENGTH: usize = 500;

pub const CLAIM_ID_EMPTY: &str = "The claimId path parameter cannot be empty.";
pub const CLAIM_ID_INVALID: &str = "The claimId path parameter must be a valid GUID.";
pub const CLAIM_ID_NIL: &str = "The claimId path parameter cannot be an empty GUID.";
pub const CLAIM_ID_MISMATCH: &str =
    "The claimId path parameter must match the Id field in the request body.";

/// Every rule a value violated, in the order the rules were checked
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("validation failed: {}", .0.join("; "))]
pub struct ValidationErrors(pub Vec<String>);

impl ValidationErrors {
    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_messages(self) -> Vec<String> {
        self.0
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Types that can check their own invariants before being sent upstream
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Parse a claim id argument, rejecting blank, malformed and nil ids.
pub fn parse_claim_id(raw: &str) -> Result<ClaimId, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CLAIM_ID_EMPTY.to_string());
    }

    let id = Uuid::parse_str(raw).map_err(|_| CLAIM_ID_INVALID.to_string())?;
    if id.is_nil() {
        return Err(CLAIM_ID_NIL.to_string());
    }

    Ok(ClaimId(id))
}

/// Check that the id in the body of an update targets the same claim as the
/// `claimId` argument.
pub fn ensure_ids_match(path_id: &ClaimId, body_id: &Uuid) -> Result<(), String> {
    if path_id.as_uuid() == body_id {
        Ok(())
    } else {
        Err(CLAIM_ID_MISMATCH.to_string())
    }
}

fn require(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(format!("{field} is required."));
    }
}

fn check_description(errors: &mut ValidationErrors, description: Option<&str>) {
    if let Some(description) = description {
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            errors.push(format!(
                "Description cannot exceed {MAX_DESCRIPTION_LENGTH} characters."
            ));
        }
    }
}

/// Properties are free-form but bounded; the first offending entry is reported.
fn check_properties(errors: &mut ValidationErrors, properties: Option<&HashMap<String, String>>) {
    let Some(properties) = properties else {
        return;
    };

    if properties.len() > MAX_PROPERTIES {
        errors.push(format!("Properties cannot exceed {MAX_PROPERTIES} items."));
        return;
    }

    for (key, value) in properties {
        if key.trim().is_empty() {
            errors.push("Property keys cannot be empty.");
            return;
        }
        if key.chars().count() > MAX_PROPERTY_KEY_LENGTH {
            errors.push(format!(
                "Property keys cannot exceed {MAX_PROPERTY_KEY_LENGTH} characters."
            ));
            return;
        }
        if value.chars().count() > MAX_PROPERTY_VALUE_LENGTH {
            errors.push(format!(
                "Property values cannot exceed {MAX_PROPERTY_VALUE_LENGTH} characters."
            ));
            return;
        }
    }
}

impl Validate for ClaimCreateDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        require(&mut errors, "Type", &self.claim_type);
        require(&mut errors, "Value", &self.value);
        require(&mut errors, "ValueType", &self.value_type);
        require(&mut errors, "DisplayText", &self.display_text);
        check_properties(&mut errors, self.properties.as_ref());
        check_description(&mut errors, self.description.as_deref());
        errors.into_result()
    }
}

impl Validate for ClaimUpdateDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.id.is_nil() {
            errors.push("Id is required.");
        }
        require(&mut errors, "Type", &self.claim_type);
        require(&mut errors, "Value", &self.value);
        require(&mut errors, "ValueType", &self.value_type);
        require(&mut errors, "DisplayText", &self.display_text);
        check_properties(&mut errors, self.properties.as_ref());
        check_description(&mut errors, self.description.as_deref());
        errors.into_result()
    }
}

impl Validate for ClaimsQueryIncomingDto {
    // Out-of-range paging is clamped when mapping to `ClaimsQuery`.
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_create() -> ClaimCreateDto {
        ClaimCreateDto {
            claim_type: "email".to_string(),
            value: "test@example.com".to_string(),
            value_type: "string".to_string(),
            display_text: "Email".to_string(),
            properties: None,
            description: None,
        }
    }

    #[test]
    fn test_parse_claim_id_accepts_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_claim_id(&id.to_string()).unwrap(), ClaimId(id));
    }

    #[test]
    fn test_parse_claim_id_rejects_bad_input() {
        let cases = [
            ("", "cannot be empty"),
            ("   ", "cannot be empty"),
            ("not-a-guid", "must be a valid GUID"),
            ("12345", "must be a valid GUID"),
            ("00000000-0000-0000-0000-000000000000", "cannot be an empty GUID"),
        ];

        for (input, fragment) in cases {
            let err = parse_claim_id(input).unwrap_err();
            assert!(err.contains(fragment), "{input:?} -> {err}");
        }
    }

    #[test]
    fn test_ids_must_match() {
        let id = Uuid::new_v4();
        assert!(ensure_ids_match(&ClaimId(id), &id).is_ok());
        let err = ensure_ids_match(&ClaimId(id), &Uuid::new_v4()).unwrap_err();
        assert!(err.contains("must match the Id field"));
    }

    #[test]
    fn test_create_dto_valid() {
        assert!(valid_create().validate().is_ok());
    }

    #[test]
    fn test_create_dto_collects_all_missing_fields() {
        let errors = ClaimCreateDto::default().validate().unwrap_err();
        assert_eq!(
            errors.into_messages(),
            vec![
                "Type is required.",
                "Value is required.",
                "ValueType is required.",
                "DisplayText is required.",
            ]
        );
    }

    #[test]
    fn test_description_length_limit() {
        let mut dto = valid_create();
        dto.description = Some("x".repeat(MAX_DESCRIPTION_LENGTH));
        assert!(dto.validate().is_ok());

        dto.description = Some("x".repeat(MAX_DESCRIPTION_LENGTH + 1));
        let errors = dto.validate().unwrap_err();
        assert!(errors.0[0].contains("cannot exceed 500"));
    }

    #[test]
    fn test_properties_limits() {
        let mut dto = valid_create();

        dto.properties = Some(
            (0..=MAX_PROPERTIES)
                .map(|i| (format!("k{i}"), "v".to_string()))
                .collect(),
        );
        assert!(dto.validate().unwrap_err().0[0].contains("cannot exceed 50 items"));

        dto.properties = Some(HashMap::from([(" ".to_string(), "v".to_string())]));
        assert_eq!(dto.validate().unwrap_err().0, vec!["Property keys cannot be empty."]);

        dto.properties = Some(HashMap::from([("k".repeat(101), "v".to_string())]));
        assert!(dto.validate().unwrap_err().0[0].contains("keys cannot exceed 100"));

        dto.properties = Some(HashMap::from([("k".to_string(), "v".repeat(501))]));
        assert!(dto.validate().unwrap_err().0[0].contains("values cannot exceed 500"));
    }

    #[test]
    fn test_update_dto_requires_id() {
        let dto = ClaimUpdateDto {
            claim_type: "email".to_string(),
            value: "a".to_string(),
            value_type: "string".to_string(),
            display_text: "Email".to_string(),
            ..Default::default()
        };
        assert_eq!(dto.validate().unwrap_err().0, vec!["Id is required."]);
    }
}
