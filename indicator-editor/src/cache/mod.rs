//! Reference data caching.
//!
//! `ReferenceCache` holds fetched lookup collections (data types, units);
//! `ReferenceData` pairs it with a gateway for typed, lazily-loaded reads.

mod reference;
mod reference_data;

pub use reference::{CacheStats, ReferenceCache, ReferenceCollection, ReferenceKey};
pub use reference_data::ReferenceData;
