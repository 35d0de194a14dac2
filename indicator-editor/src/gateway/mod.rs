//! Indicator values gateway.
//!
//! The HTTP collaborator the pipeline consumes:
//! - `HttpGateway` talks to the indicator values API
//! - `MockGateway` is an in-memory stand-in for tests and offline runs

pub mod http;
pub mod mock;
pub mod traits;

pub use http::HttpGateway;
pub use mock::MockGateway;
pub use traits::{GatewayError, IndicatorGateway};
