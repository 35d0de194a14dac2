//! In-memory gateway for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::traits::*;
use crate::types::{DataType, IndicatorValueGrid, UnitGroups, ValueUpdate};

/// Mock gateway for testing.
///
/// Holds grids and reference collections in memory, applies submitted
/// batches to its own copy, counts calls, and can be scripted to fail.
#[derive(Default)]
pub struct MockGateway {
    grids: Mutex<HashMap<String, IndicatorValueGrid>>,
    data_types: Vec<DataType>,
    units: UnitGroups,
    fetch_failure: Mutex<Option<GatewayError>>,
    submit_failure: Mutex<Option<GatewayError>>,
    reference_failure: Mutex<Option<GatewayError>>,
    submit_delay: Option<Duration>,
    submitted: Mutex<Vec<(String, Vec<ValueUpdate>)>>,
    fetch_calls: AtomicU32,
    submit_calls: AtomicU32,
    reference_calls: AtomicU32,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `grid` for `indicator_id`.
    pub fn with_grid(self, indicator_id: impl Into<String>, grid: IndicatorValueGrid) -> Self {
        if let Ok(mut grids) = self.grids.lock() {
            grids.insert(indicator_id.into(), grid);
        }
        self
    }

    pub fn with_data_types(mut self, data_types: Vec<DataType>) -> Self {
        self.data_types = data_types;
        self
    }

    pub fn with_units(mut self, units: UnitGroups) -> Self {
        self.units = units;
        self
    }

    /// Delay every submit, to keep a commit in flight.
    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = Some(delay);
        self
    }

    /// Fail the next `fetch_values` call.
    pub fn fail_next_fetch(&self, err: GatewayError) {
        set(&self.fetch_failure, Some(err));
    }

    /// Fail the next `submit_updates` call.
    pub fn fail_next_submit(&self, err: GatewayError) {
        set(&self.submit_failure, Some(err));
    }

    /// Fail the next reference collection fetch.
    pub fn fail_next_reference(&self, err: GatewayError) {
        set(&self.reference_failure, Some(err));
    }

    pub fn fetch_calls(&self) -> u32 {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> u32 {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn reference_calls(&self) -> u32 {
        self.reference_calls.load(Ordering::SeqCst)
    }

    /// Batches accepted so far, in order.
    pub fn submitted(&self) -> Vec<(String, Vec<ValueUpdate>)> {
        self.submitted.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Current server-side copy of a grid.
    pub fn grid(&self, indicator_id: &str) -> Option<IndicatorValueGrid> {
        self.grids.lock().ok().and_then(|g| g.get(indicator_id).cloned())
    }
}

fn set(slot: &Mutex<Option<GatewayError>>, value: Option<GatewayError>) {
    if let Ok(mut guard) = slot.lock() {
        *guard = value;
    }
}

fn take(slot: &Mutex<Option<GatewayError>>) -> Option<GatewayError> {
    slot.lock().ok().and_then(|mut guard| guard.take())
}

#[async_trait]
impl IndicatorGateway for MockGateway {
    async fn fetch_values(&self, indicator_id: &str) -> Result<IndicatorValueGrid, GatewayError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = take(&self.fetch_failure) {
            return Err(err);
        }

        self.grid(indicator_id)
            .ok_or_else(|| GatewayError::NotFound(format!("indicator {}", indicator_id)))
    }

    async fn submit_updates(
        &self,
        indicator_id: &str,
        updates: &[ValueUpdate],
    ) -> Result<(), GatewayError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.submit_delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = take(&self.submit_failure) {
            return Err(err);
        }

        let mut grids = self
            .grids
            .lock()
            .map_err(|_| GatewayError::Network("mock state poisoned".into()))?;
        let grid = grids
            .get_mut(indicator_id)
            .ok_or_else(|| GatewayError::NotFound(format!("indicator {}", indicator_id)))?;

        if let Some(missing) = updates.iter().find(|u| grid.row(&u.fact_id).is_none()) {
            return Err(GatewayError::Validation(format!("unknown fact {}", missing.fact_id)));
        }
        for update in updates {
            if let Some(row) = grid.row_mut(&update.fact_id) {
                row.set_value(update.new_value);
            }
        }
        drop(grids);

        if let Ok(mut submitted) = self.submitted.lock() {
            submitted.push((indicator_id.to_string(), updates.to_vec()));
        }
        Ok(())
    }

    async fn fetch_data_types(&self) -> Result<Vec<DataType>, GatewayError> {
        self.reference_calls.fetch_add(1, Ordering::SeqCst);
        match take(&self.reference_failure) {
            Some(err) => Err(err),
            None => Ok(self.data_types.clone()),
        }
    }

    async fn fetch_units(&self) -> Result<UnitGroups, GatewayError> {
        self.reference_calls.fetch_add(1, Ordering::SeqCst);
        match take(&self.reference_failure) {
            Some(err) => Err(err),
            None => Ok(self.units.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IndicatorValueRow;

    fn gateway() -> MockGateway {
        MockGateway::new().with_grid(
            "pop",
            IndicatorValueGrid::new("Population", "integer")
                .with_row(IndicatorValueRow::empty("f1")),
        )
    }

    #[tokio::test]
    async fn test_mock_applies_batch() {
        let gateway = gateway();
        let updates = vec![ValueUpdate {
            fact_id: "f1".into(),
            new_value: 7.0,
        }];

        gateway.submit_updates("pop", &updates).await.unwrap();

        let row = gateway.grid("pop").unwrap().rows[0].clone();
        assert_eq!(row.value, Some(7.0));
        assert!(!row.is_empty);
        assert_eq!(gateway.submitted().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_scripted_failure_is_one_shot() {
        let gateway = gateway();
        gateway.fail_next_fetch(GatewayError::Network("down".into()));

        assert!(gateway.fetch_values("pop").await.is_err());
        assert!(gateway.fetch_values("pop").await.is_ok());
        assert_eq!(gateway.fetch_calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_unknown_fact_rejects_whole_batch() {
        let gateway = gateway();
        let updates = vec![
            ValueUpdate { fact_id: "f1".into(), new_value: 1.0 },
            ValueUpdate { fact_id: "nope".into(), new_value: 2.0 },
        ];

        let err = gateway.submit_updates("pop", &updates).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
        assert_eq!(gateway.grid("pop").unwrap().rows[0].value, None);
    }
}
