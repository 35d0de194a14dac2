//! Indicator Editor - value editing pipeline for the indicator dashboard
//!
//! Provides everything behind the dashboard's value grid:
//! - Validation of typed edits against data type and column rules
//! - A shared cache of reference data (data types, units)
//! - Edit sessions tracking pending edits and committing them as a batch
//! - A trait-based gateway to the indicator values API
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              EditSession                 │
//! │   Clean ─▶ Dirty ─▶ Saving ─▶ Clean      │
//! └──────┬───────────────┬───────────────────┘
//!        │               │
//!        ▼               ▼
//! ┌─────────────┐  ┌──────────────┐   ┌────────────────┐
//! │ validate_   │  │ ReferenceData│──▶│ ReferenceCache │
//! │ edit        │  └──────┬───────┘   └────────────────┘
//! └─────────────┘         ▼
//!                ┌──────────────────┐
//!                │ IndicatorGateway │ (HttpGateway / MockGateway)
//!                └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use indicator_editor::{EditSession, GatewayConfig, HttpGateway, ReferenceCache, ReferenceData};
//!
//! # async fn example() -> indicator_editor::Result<()> {
//! let gateway = Arc::new(HttpGateway::new(GatewayConfig::from_env()?)?);
//! let reference = ReferenceData::new(gateway.clone(), Arc::new(ReferenceCache::new()));
//!
//! let mut session = EditSession::new("42");
//! session.open(gateway.as_ref(), &reference).await?;
//!
//! let verdict = session.stage_value("fact-1", "17")?;
//! if verdict.is_valid && session.is_dirty() {
//!     session.commit(gateway.as_ref()).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod session;
pub mod types;
pub mod validation;

// Re-export main types for convenience
pub use cache::{ReferenceCache, ReferenceCollection, ReferenceData, ReferenceKey};
pub use config::GatewayConfig;
pub use error::{EditorError, Result};
pub use gateway::{GatewayError, HttpGateway, IndicatorGateway, MockGateway};
pub use session::{CommitSummary, CommitTicket, EditSession, SessionState};
pub use types::*;
pub use validation::{validate_edit, DimensionHint, ValidationResult};
