//! Wire and domain types shared by the gateway, the cache and edit sessions.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Name of the editable value column in a grid.
pub const VALUE_COLUMN: &str = "value";

/// Data type code that restricts edits to whole numbers.
pub const INTEGER_CODE: &str = "integer";

/// Data type code for free decimal values.
pub const DECIMAL_CODE: &str = "decimal";

/// One observation of an indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct IndicatorValueRow {
    /// Opaque, unique fact identifier
    pub fact_id: String,
    /// Dimension name -> dimension value
    #[serde(default)]
    pub dimensions: BTreeMap<String, String>,
    /// Recorded value, absent for empty rows
    #[serde(default)]
    pub value: Option<f64>,
    /// True iff no value has been recorded yet
    #[serde(default)]
    pub is_empty: bool,
}

impl IndicatorValueRow {
    /// Create a row holding a value.
    pub fn with_value(fact_id: impl Into<String>, value: f64) -> Self {
        Self {
            fact_id: fact_id.into(),
            dimensions: BTreeMap::new(),
            value: Some(value),
            is_empty: false,
        }
    }

    /// Create a row with no recorded value.
    pub fn empty(fact_id: impl Into<String>) -> Self {
        Self {
            fact_id: fact_id.into(),
            dimensions: BTreeMap::new(),
            value: None,
            is_empty: true,
        }
    }

    /// Attach a dimension value.
    pub fn with_dimension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions.insert(name.into(), value.into());
        self
    }

    /// Record a committed value.
    pub(crate) fn set_value(&mut self, value: f64) {
        self.value = Some(value);
        self.is_empty = false;
    }
}

/// Fetch result for one indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct IndicatorValueGrid {
    pub rows: Vec<IndicatorValueRow>,
    /// Ordered dimension columns present across all rows
    #[serde(default)]
    pub dimension_columns: Vec<String>,
    pub indicator_name: String,
    /// Data type code, e.g. "integer" or "decimal"
    #[serde(rename = "dataType")]
    pub data_type_code: String,
}

impl IndicatorValueGrid {
    pub fn new(indicator_name: impl Into<String>, data_type_code: impl Into<String>) -> Self {
        Self {
            rows: Vec::new(),
            dimension_columns: Vec::new(),
            indicator_name: indicator_name.into(),
            data_type_code: data_type_code.into(),
        }
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dimension_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_row(mut self, row: IndicatorValueRow) -> Self {
        self.rows.push(row);
        self
    }

    pub fn row(&self, fact_id: &str) -> Option<&IndicatorValueRow> {
        self.rows.iter().find(|r| r.fact_id == fact_id)
    }

    pub(crate) fn row_mut(&mut self, fact_id: &str) -> Option<&mut IndicatorValueRow> {
        self.rows.iter_mut().find(|r| r.fact_id == fact_id)
    }

    /// Check structural invariants: unique fact ids and dimension keys
    /// drawn from the declared columns.
    pub fn check(&self) -> Result<(), String> {
        let columns: HashSet<&str> = self.dimension_columns.iter().map(String::as_str).collect();
        let mut seen = HashSet::with_capacity(self.rows.len());

        for row in &self.rows {
            if !seen.insert(row.fact_id.as_str()) {
                return Err(format!("duplicate fact id {}", row.fact_id));
            }
            if let Some(key) = row.dimensions.keys().find(|k| !columns.contains(k.as_str())) {
                return Err(format!(
                    "fact {} has undeclared dimension {}",
                    row.fact_id, key
                ));
            }
        }

        Ok(())
    }

    /// Force `is_empty` to agree with `value`. Returns how many rows changed.
    pub(crate) fn normalize(&mut self) -> usize {
        let mut fixed = 0;
        for row in &mut self.rows {
            let empty = row.value.is_none();
            if row.is_empty != empty {
                row.is_empty = empty;
                fixed += 1;
            }
        }
        fixed
    }
}

/// One entry of a batch update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ValueUpdate {
    pub fact_id: String,
    pub new_value: f64,
}

/// A staged change to one fact.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEdit {
    pub fact_id: String,
    /// Committed value before editing; absent for empty rows
    pub old_value: Option<f64>,
    /// Raw text as typed
    pub new_value_text: String,
    /// Parsed, validated value
    pub new_value: f64,
    /// Edit fills a previously empty row
    pub is_new: bool,
}

impl PendingEdit {
    pub fn to_update(&self) -> ValueUpdate {
        ValueUpdate {
            fact_id: self.fact_id.clone(),
            new_value: self.new_value,
        }
    }
}

/// Data type reference record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct DataType {
    pub id: String,
    pub code: String,
    pub name: String,
}

/// Unit reference record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Unit {
    pub id: String,
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

/// Units keyed by group name.
pub type UnitGroups = BTreeMap<String, Vec<Unit>>;
