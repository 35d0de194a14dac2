//! Core trait for the indicator values API.

use async_trait::async_trait;

use crate::types::{DataType, IndicatorValueGrid, UnitGroups, ValueUpdate};

/// Error types for gateway calls.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    /// Transport failure or unexpected status
    #[error("Network error: {0}")]
    Network(String),

    /// Resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Server rejected the submitted updates
    #[error("Rejected by server: {0}")]
    Validation(String),

    /// Success response with an unreadable body
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Parse(err.to_string())
        } else {
            GatewayError::Network(err.to_string())
        }
    }
}

/// Access to indicator values and their reference data.
///
/// The only suspending operations of the editing pipeline live here.
#[async_trait]
pub trait IndicatorGateway: Send + Sync {
    /// Fetch the value grid of one indicator.
    async fn fetch_values(&self, indicator_id: &str) -> Result<IndicatorValueGrid, GatewayError>;

    /// Submit a batch of committed edits. All-or-nothing.
    async fn submit_updates(
        &self,
        indicator_id: &str,
        updates: &[ValueUpdate],
    ) -> Result<(), GatewayError>;

    /// Fetch the data type reference collection.
    async fn fetch_data_types(&self) -> Result<Vec<DataType>, GatewayError>;

    /// Fetch units grouped by category.
    async fn fetch_units(&self) -> Result<UnitGroups, GatewayError>;
}
