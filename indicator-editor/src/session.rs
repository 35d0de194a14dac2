//! Edit session tracker.
//!
//! Holds the grid snapshot of one indicator plus the user's pending,
//! unsaved edits, and drives them to the gateway as a single batch.
//!
//! ```text
//!            stage (valid)              begin_commit
//!   Clean ─────────────────▶ Dirty ─────────────────▶ Saving
//!     ▲  ◀───────────────────  │  ◀──── failure ───────  │
//!     │   discard / restage    │                         │
//!     │   to original value    │                         │
//!     └──────────────────────────────── success ─────────┘
//! ```
//!
//! The session is independent of any UI binding: a view observes
//! [`EditSession::state`] and drives the operations.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::ReferenceData;
use crate::error::{EditorError, Result};
use crate::gateway::{GatewayError, IndicatorGateway};
use crate::types::{DataType, IndicatorValueGrid, PendingEdit, ValueUpdate, VALUE_COLUMN};
use crate::validation::{parse_number, validate_edit, DimensionHint, ValidationResult};

/// Lifecycle state of an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No pending edits
    Clean,
    /// At least one pending edit
    Dirty,
    /// Batch submit in flight
    Saving,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Clean => "Clean",
            SessionState::Dirty => "Dirty",
            SessionState::Saving => "Saving",
        };
        f.write_str(name)
    }
}

/// An in-flight batch, handed out by [`EditSession::begin_commit`].
///
/// Each ticket belongs to exactly one commit attempt and is consumed by
/// [`EditSession::finish_commit`].
#[derive(Debug, PartialEq)]
pub struct CommitTicket {
    session_id: Uuid,
    attempt_id: Uuid,
    indicator_id: String,
    updates: Vec<ValueUpdate>,
}

impl CommitTicket {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub fn indicator_id(&self) -> &str {
        &self.indicator_id
    }

    /// One update per fact, in grid row order.
    pub fn updates(&self) -> &[ValueUpdate] {
        &self.updates
    }
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitSummary {
    /// Facts updated
    pub updated: usize,
    /// Of which were previously empty
    pub new_rows: usize,
}

/// Editing state for one indicator grid.
#[derive(Debug)]
pub struct EditSession {
    session_id: Uuid,
    indicator_id: String,
    grid: Option<IndicatorValueGrid>,
    data_type: Option<DataType>,
    pending: HashMap<String, PendingEdit>,
    state: SessionState,
    /// Commit attempt in flight; set only while `Saving`
    attempt: Option<Uuid>,
    loaded_at: Option<DateTime<Utc>>,
    last_commit_at: Option<DateTime<Utc>>,
}

/// Returns the session to `Dirty` if a commit is abandoned mid-flight.
struct SavingGuard<'a> {
    session: &'a mut EditSession,
}

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        if self.session.state == SessionState::Saving {
            warn!(
                session_id = %self.session.session_id,
                pending = self.session.pending.len(),
                "Commit abandoned in flight, keeping pending edits"
            );
            self.session.state = SessionState::Dirty;
            self.session.attempt = None;
        }
    }
}

impl EditSession {
    /// Create an empty session for one indicator.
    pub fn new(indicator_id: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            indicator_id: indicator_id.into(),
            grid: None,
            data_type: None,
            pending: HashMap::new(),
            state: SessionState::Clean,
            attempt: None,
            loaded_at: None,
            last_commit_at: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn indicator_id(&self) -> &str {
        &self.indicator_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == SessionState::Dirty
    }

    pub fn grid(&self) -> Option<&IndicatorValueGrid> {
        self.grid.as_ref()
    }

    /// Data type record resolved from reference data, if any.
    pub fn data_type(&self) -> Option<&DataType> {
        self.data_type.as_ref()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn last_commit_at(&self) -> Option<DateTime<Utc>> {
        self.last_commit_at
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn pending(&self, fact_id: &str) -> Option<&PendingEdit> {
        self.pending.get(fact_id)
    }

    /// Pending edits in grid row order.
    pub fn pending_edits(&self) -> Vec<&PendingEdit> {
        match &self.grid {
            Some(grid) => grid
                .rows
                .iter()
                .filter_map(|row| self.pending.get(&row.fact_id))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Value to display for a fact: the staged value, else the committed one.
    pub fn effective_value(&self, fact_id: &str) -> Option<f64> {
        if let Some(edit) = self.pending.get(fact_id) {
            return Some(edit.new_value);
        }
        self.grid.as_ref()?.row(fact_id)?.value
    }

    fn ensure_not_saving(&self, operation: &'static str) -> Result<()> {
        if self.state == SessionState::Saving {
            return Err(EditorError::InvalidState {
                operation,
                state: self.state.to_string(),
            });
        }
        Ok(())
    }

    /// Replace the snapshot and drop every pending edit.
    pub fn load_grid(&mut self, mut grid: IndicatorValueGrid) -> Result<()> {
        self.ensure_not_saving("load a grid")?;
        grid.check().map_err(EditorError::InvalidGrid)?;

        let fixed = grid.normalize();
        if fixed > 0 {
            warn!(indicator_id = %self.indicator_id, rows = fixed, "Corrected empty flags in grid");
        }

        let keep_data_type = self
            .data_type
            .as_ref()
            .is_some_and(|dt| dt.code.eq_ignore_ascii_case(&grid.data_type_code));
        if !keep_data_type {
            self.data_type = None;
        }

        info!(
            indicator_id = %self.indicator_id,
            rows = grid.rows.len(),
            discarded = self.pending.len(),
            "Grid loaded"
        );

        self.grid = Some(grid);
        self.pending.clear();
        self.state = SessionState::Clean;
        self.loaded_at = Some(Utc::now());
        Ok(())
    }

    /// Fetch the grid and load it, resolving its data type through
    /// reference data.
    ///
    /// A failed fetch leaves the current snapshot untouched.
    pub async fn open(
        &mut self,
        gateway: &dyn IndicatorGateway,
        reference: &ReferenceData,
    ) -> Result<()> {
        self.ensure_not_saving("open")?;
        let mut grid = gateway.fetch_values(&self.indicator_id).await?;

        let data_type = match reference.data_type_by_code(&grid.data_type_code).await {
            Ok(Some(dt)) => {
                grid.data_type_code = dt.code.clone();
                Some(dt)
            }
            Ok(None) => {
                warn!(code = %grid.data_type_code, "Unknown data type code, validating verbatim");
                None
            }
            Err(e) => {
                warn!(error = %e, "Data types unavailable, validating verbatim");
                None
            }
        };

        self.load_grid(grid)?;
        self.data_type = data_type;
        Ok(())
    }

    /// Refetch the grid, discarding pending edits.
    pub async fn reload(&mut self, gateway: &dyn IndicatorGateway) -> Result<()> {
        self.ensure_not_saving("reload")?;
        let grid = gateway.fetch_values(&self.indicator_id).await?;
        self.load_grid(grid)
    }

    /// Validate and stage an edit of `fact_id` made under grid `column`.
    ///
    /// The staged change is always the fact's numeric value; dimension
    /// cells are never edited. `column` only selects the validation hint,
    /// so an edit made under a year column is range-checked as a year.
    ///
    /// An invalid verdict is returned as-is and changes nothing. Staging the
    /// committed value again removes the fact's pending edit.
    pub fn stage_edit(
        &mut self,
        fact_id: &str,
        column: &str,
        new_value_text: &str,
    ) -> Result<ValidationResult> {
        self.ensure_not_saving("stage an edit")?;

        let grid = self.grid.as_ref().ok_or_else(|| EditorError::InvalidState {
            operation: "stage an edit",
            state: "not loaded".to_string(),
        })?;

        let row = grid
            .row(fact_id)
            .ok_or_else(|| EditorError::UnknownFact(fact_id.to_string()))?;

        if column != VALUE_COLUMN && !grid.dimension_columns.iter().any(|c| c == column) {
            return Err(EditorError::UnknownColumn(column.to_string()));
        }

        let hint = DimensionHint::for_column(column);
        let verdict = validate_edit(row.value, new_value_text, &grid.data_type_code, hint);
        if !verdict.is_valid {
            debug!(fact_id = %fact_id, error = ?verdict.error, "Edit rejected");
            return Ok(verdict);
        }

        let Some(new_value) = parse_number(new_value_text) else {
            return Ok(verdict);
        };

        if row.value == Some(new_value) {
            if self.pending.remove(fact_id).is_some() {
                debug!(fact_id = %fact_id, "Edit reverted to committed value");
            }
            if self.pending.is_empty() {
                self.state = SessionState::Clean;
            }
            return Ok(verdict);
        }

        let edit = PendingEdit {
            fact_id: fact_id.to_string(),
            old_value: row.value,
            new_value_text: new_value_text.trim().to_string(),
            new_value,
            is_new: row.is_empty,
        };
        debug!(fact_id = %fact_id, value = new_value, is_new = edit.is_new, "Edit staged");

        self.pending.insert(fact_id.to_string(), edit);
        self.state = SessionState::Dirty;
        Ok(verdict)
    }

    /// Stage an edit of the value column.
    pub fn stage_value(&mut self, fact_id: &str, new_value_text: &str) -> Result<ValidationResult> {
        self.stage_edit(fact_id, VALUE_COLUMN, new_value_text)
    }

    /// Drop the pending edit of one fact. Returns whether one existed.
    pub fn unstage(&mut self, fact_id: &str) -> Result<bool> {
        self.ensure_not_saving("unstage an edit")?;
        let removed = self.pending.remove(fact_id).is_some();
        if self.pending.is_empty() {
            self.state = SessionState::Clean;
        }
        Ok(removed)
    }

    /// Drop every pending edit.
    pub fn discard(&mut self) -> Result<()> {
        self.ensure_not_saving("discard")?;
        if !self.pending.is_empty() {
            info!(indicator_id = %self.indicator_id, pending = self.pending.len(), "Pending edits discarded");
        }
        self.pending.clear();
        self.state = SessionState::Clean;
        Ok(())
    }

    /// Enter `Saving` and hand out the batch to submit.
    ///
    /// Only allowed while `Dirty`.
    pub fn begin_commit(&mut self) -> Result<CommitTicket> {
        if self.state != SessionState::Dirty {
            return Err(EditorError::InvalidState {
                operation: "commit",
                state: self.state.to_string(),
            });
        }

        let updates: Vec<ValueUpdate> = self
            .pending_edits()
            .into_iter()
            .map(PendingEdit::to_update)
            .collect();

        let attempt_id = Uuid::new_v4();
        self.state = SessionState::Saving;
        self.attempt = Some(attempt_id);
        Ok(CommitTicket {
            session_id: self.session_id,
            attempt_id,
            indicator_id: self.indicator_id.clone(),
            updates,
        })
    }

    /// Apply the gateway outcome of a batch.
    ///
    /// Returns `Ok(None)` and changes nothing when the ticket belongs to
    /// another session or to any attempt other than the one in flight
    /// (including an earlier, failed or abandoned attempt). On failure the
    /// session returns to `Dirty` with every pending edit kept.
    pub fn finish_commit(
        &mut self,
        ticket: CommitTicket,
        outcome: std::result::Result<(), GatewayError>,
    ) -> Result<Option<CommitSummary>> {
        let current = self.state == SessionState::Saving
            && ticket.session_id == self.session_id
            && self.attempt == Some(ticket.attempt_id);
        if !current {
            debug!(
                ticket_session = %ticket.session_id,
                ticket_attempt = %ticket.attempt_id,
                "Ignoring stale commit result"
            );
            return Ok(None);
        }
        self.attempt = None;

        if let Err(err) = outcome {
            warn!(
                indicator_id = %self.indicator_id,
                pending = self.pending.len(),
                error = %err,
                "Commit failed, pending edits kept"
            );
            self.state = SessionState::Dirty;
            return Err(err.into());
        }

        let mut summary = CommitSummary { updated: 0, new_rows: 0 };
        if let Some(grid) = self.grid.as_mut() {
            for update in &ticket.updates {
                if let Some(row) = grid.row_mut(&update.fact_id) {
                    row.set_value(update.new_value);
                    summary.updated += 1;
                }
                if self.pending.get(&update.fact_id).is_some_and(|e| e.is_new) {
                    summary.new_rows += 1;
                }
            }
        }

        self.pending.clear();
        self.state = SessionState::Clean;
        self.last_commit_at = Some(Utc::now());

        info!(
            indicator_id = %self.indicator_id,
            updated = summary.updated,
            new_rows = summary.new_rows,
            "Commit succeeded"
        );
        Ok(Some(summary))
    }

    /// Submit every pending edit as one batch.
    ///
    /// Rejected unless `Dirty`; the gateway is not called in that case.
    /// Dropping the returned future mid-flight returns the session to
    /// `Dirty`.
    pub async fn commit(&mut self, gateway: &dyn IndicatorGateway) -> Result<CommitSummary> {
        let ticket = self.begin_commit()?;
        info!(
            indicator_id = %self.indicator_id,
            updates = ticket.updates.len(),
            "Submitting pending edits"
        );

        let mut guard = SavingGuard { session: self };
        let outcome = gateway
            .submit_updates(&ticket.indicator_id, &ticket.updates)
            .await;

        guard
            .session
            .finish_commit(ticket, outcome)?
            .ok_or_else(|| EditorError::InvalidState {
                operation: "finish commit",
                state: guard.session.state.to_string(),
            })
    }
}
