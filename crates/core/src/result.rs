//! Result envelope returned by every tool.
//!
//! A tool never fails at the protocol level because of bad input or an
//! unavailable identity store. Instead it returns a [`ToolResult`] whose
//! failure side carries a status tag and at least one message. On the wire the
//! envelope is flattened to `{"isSuccess", "value", "error"}`.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

const UNKNOWN_VALIDATION_ERROR: &str = "Unknown validation error.";
const UNKNOWN_WARNING: &str = "Unknown warning message.";
const UNKNOWN_ERROR: &str = "Unknown error.";

/// Failure category of a tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolStatus {
    #[serde(rename = "Validation Failed")]
    ValidationFailed,
    #[serde(rename = "Warning")]
    Warning,
    #[serde(rename = "Error")]
    Error,
}

impl ToolStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolStatus::ValidationFailed => "Validation Failed",
            ToolStatus::Warning => "Warning",
            ToolStatus::Error => "Error",
        }
    }
}

impl std::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure side of the envelope. `errors` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolError {
    pub status: ToolStatus,
    pub errors: Vec<String>,
}

impl ToolError {
    fn new<I, S>(status: ToolStatus, errors: I, fallback: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut errors: Vec<String> = errors
            .into_iter()
            .map(Into::into)
            .filter(|e| !e.trim().is_empty())
            .collect();
        if errors.is_empty() {
            errors.push(fallback.to_string());
        }
        Self { status, errors }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolResult<T> {
    Success(T),
    Failure(ToolError),
}

impl<T> ToolResult<T> {
    pub fn success(value: T) -> Self {
        Self::Success(value)
    }

    pub fn validation_failed<I, S>(errors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Failure(ToolError::new(
            ToolStatus::ValidationFailed,
            errors,
            UNKNOWN_VALIDATION_ERROR,
        ))
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::Failure(ToolError::new(
            ToolStatus::Warning,
            [message.into()],
            UNKNOWN_WARNING,
        ))
    }

    pub fn failure<I, S>(errors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Failure(ToolError::new(ToolStatus::Error, errors, UNKNOWN_ERROR))
    }

    /// Wrap an upstream error, keeping its whole cause chain in one message.
    pub fn from_error(err: &anyhow::Error) -> Self {
        Self::failure([format!("{err:#}")])
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ToolError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(error) => Some(error),
        }
    }

    pub fn status(&self) -> Option<ToolStatus> {
        self.error().map(|e| e.status)
    }
}

impl<T: Serialize> Serialize for ToolResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ToolResult", 3)?;
        state.serialize_field("isSuccess", &self.is_success())?;
        state.serialize_field("value", &self.value())?;
        state.serialize_field("error", &self.error())?;
        state.end()
    }
}
