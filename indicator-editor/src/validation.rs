//! Value validation engine.
//!
//! Decides whether a typed edit is acceptable for an indicator's data type
//! and the column it was entered under. Rules run in a fixed order and the
//! first failing rule wins:
//!
//! 1. required
//! 2. numeric (finite)
//! 3. integer data type
//! 4. year dimension (integer within 1900..=2100)
//! 5. integer -> decimal narrowing warning
//!
//! The integer rule matches the data type code ignoring surrounding
//! whitespace and ASCII case, so a grid whose code could not be
//! canonicalised against reference data ("INTEGER") still gets it.

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::error::EditorError;
use crate::types::{INTEGER_CODE, VALUE_COLUMN};

pub const MSG_REQUIRED: &str = "Value is required";
pub const MSG_NOT_A_NUMBER: &str = "Must be a number";
pub const MSG_NOT_AN_INTEGER: &str = "Must be an integer";
pub const MSG_INVALID_YEAR: &str = "Year must be a valid integer (1900-2100)";
pub const WARN_INTEGER_TO_DECIMAL: &str = "Changing from integer to decimal";

/// Inclusive range accepted for year-typed columns.
pub const YEAR_RANGE: std::ops::RangeInclusive<f64> = 1900.0..=2100.0;

/// Semantic hint about the column an edit was entered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionHint {
    /// Calendar years
    Time,
}

impl DimensionHint {
    /// Derive the hint from a grid column name.
    ///
    /// The value column never carries a hint.
    pub fn for_column(column: &str) -> Option<Self> {
        if column == VALUE_COLUMN {
            return None;
        }
        match column.trim().to_ascii_lowercase().as_str() {
            "time" | "year" | "period" => Some(DimensionHint::Time),
            _ => None,
        }
    }

    pub fn parse(hint: &str) -> Option<Self> {
        match hint.trim().to_ascii_lowercase().as_str() {
            "time" => Some(DimensionHint::Time),
            _ => None,
        }
    }
}

/// Outcome of a single validation check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            error: None,
            warning: None,
        }
    }

    pub fn valid_with_warning(warning: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            error: None,
            warning: Some(warning.into()),
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(error.into()),
            warning: None,
        }
    }

    /// Convert into a `Result`, keeping any warning on success.
    pub fn into_result(self) -> Result<Option<String>, EditorError> {
        if self.is_valid {
            Ok(self.warning)
        } else {
            Err(EditorError::ValidationFailure(
                self.error.unwrap_or_else(|| "invalid value".to_string()),
            ))
        }
    }
}

fn is_integer(n: f64) -> bool {
    n.fract() == 0.0
}

/// Parse trimmed text as a finite number.
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Validate a proposed edit.
///
/// `old_value` is the committed value of the row (absent for empty rows).
pub fn validate_edit(
    old_value: Option<f64>,
    new_value_text: &str,
    data_type_code: &str,
    hint: Option<DimensionHint>,
) -> ValidationResult {
    let text = new_value_text.trim();
    if text.is_empty() {
        return ValidationResult::invalid(MSG_REQUIRED);
    }

    let Some(number) = parse_number(text) else {
        return ValidationResult::invalid(MSG_NOT_A_NUMBER);
    };

    if data_type_code.trim().eq_ignore_ascii_case(INTEGER_CODE) && !is_integer(number) {
        return ValidationResult::invalid(MSG_NOT_AN_INTEGER);
    }

    if hint == Some(DimensionHint::Time) && (!is_integer(number) || !YEAR_RANGE.contains(&number)) {
        return ValidationResult::invalid(MSG_INVALID_YEAR);
    }

    match old_value {
        Some(old) if is_integer(old) && !is_integer(number) => {
            ValidationResult::valid_with_warning(WARN_INTEGER_TO_DECIMAL)
        }
        _ => ValidationResult::valid(),
    }
}
