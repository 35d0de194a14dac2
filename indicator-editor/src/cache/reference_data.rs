//! Typed access to reference collections through the shared cache.

use std::sync::Arc;

use super::reference::{ReferenceCache, ReferenceCollection, ReferenceKey};
use crate::error::{EditorError, Result};
use crate::gateway::IndicatorGateway;
use crate::types::{DataType, UnitGroups};

/// Gateway plus shared cache.
///
/// Cheap to clone; every clone shares the same cache.
#[derive(Clone)]
pub struct ReferenceData {
    gateway: Arc<dyn IndicatorGateway>,
    cache: Arc<ReferenceCache>,
}

impl ReferenceData {
    pub fn new(gateway: Arc<dyn IndicatorGateway>, cache: Arc<ReferenceCache>) -> Self {
        Self { gateway, cache }
    }

    pub fn cache(&self) -> &Arc<ReferenceCache> {
        &self.cache
    }

    /// All data types, fetched on first use.
    pub async fn data_types(&self) -> Result<Vec<DataType>> {
        let gateway = Arc::clone(&self.gateway);
        let collection = self
            .cache
            .get(ReferenceKey::DataTypes, || async move {
                gateway
                    .fetch_data_types()
                    .await
                    .map(ReferenceCollection::DataTypes)
            })
            .await?;

        match collection.as_ref() {
            ReferenceCollection::DataTypes(types) => Ok(types.clone()),
            other => Err(mismatch(ReferenceKey::DataTypes, other)),
        }
    }

    /// All units by group, fetched on first use.
    pub async fn units(&self) -> Result<UnitGroups> {
        let gateway = Arc::clone(&self.gateway);
        let collection = self
            .cache
            .get(ReferenceKey::Units, || async move {
                gateway.fetch_units().await.map(ReferenceCollection::Units)
            })
            .await?;

        match collection.as_ref() {
            ReferenceCollection::Units(groups) => Ok(groups.clone()),
            other => Err(mismatch(ReferenceKey::Units, other)),
        }
    }

    /// Data type whose code matches, ignoring ASCII case.
    pub async fn data_type_by_code(&self, code: &str) -> Result<Option<DataType>> {
        let code = code.trim();
        Ok(self
            .data_types()
            .await?
            .into_iter()
            .find(|t| t.code.eq_ignore_ascii_case(code)))
    }

    /// Id of the data type with exactly this code, loading data types if needed.
    pub async fn data_type_id(&self, code: &str) -> Result<Option<String>> {
        self.data_types().await?;
        Ok(self.cache.lookup_id_by_code(ReferenceKey::DataTypes, code))
    }

    pub fn invalidate(&self, key: Option<ReferenceKey>) {
        self.cache.invalidate(key);
    }
}

fn mismatch(key: ReferenceKey, found: &ReferenceCollection) -> EditorError {
    EditorError::Config(format!(
        "cache entry {} holds {} records of another collection",
        key,
        found.len()
    ))
}
