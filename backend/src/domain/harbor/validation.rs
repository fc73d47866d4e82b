//! Field validation for decoded harbor drafts.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::HarborDraft;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Wire name of the offending field.
    pub field: String,
    /// Human-readable reason.
    pub error: String,
}

impl FieldViolation {
    fn required(field: &str) -> Self {
        Self {
            field: field.to_owned(),
            error: format!("{field} is a required field"),
        }
    }
}

/// Non-empty, ordered set of field violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldViolation>);

impl ValidationErrors {
    /// Violations in field-declaration order.
    pub fn violations(&self) -> &[FieldViolation] {
        &self.0
    }

    /// Serialize the violations as a JSON array string.
    ///
    /// # Errors
    ///
    /// Propagates the serializer error; callers degrade to a generic message.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reasons: Vec<&str> = self.0.iter().map(|v| v.error.as_str()).collect();
        write!(f, "harbor validation failed: {}", reasons.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

fn is_blank(value: Option<&String>) -> bool {
    value.is_none_or(String::is_empty)
}

/// Check the required fields of a draft.
///
/// # Errors
///
/// Returns every violation found, not just the first.
pub fn validate(draft: &HarborDraft) -> Result<(), ValidationErrors> {
    let mut violations = Vec::new();

    for (field, value) in [
        ("name", draft.name.as_ref()),
        ("city", draft.city.as_ref()),
        ("country", draft.country.as_ref()),
    ] {
        if is_blank(value) {
            violations.push(FieldViolation::required(field));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(violations))
    }
}
