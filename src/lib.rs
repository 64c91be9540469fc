// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod aggregate;
pub mod api;
pub mod config;
pub mod error;
pub mod feed;
pub mod fetch;
pub mod metrics;
pub mod normalize;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::aggregate;
pub use crate::api::router;
pub use crate::config::{AppConfig, SourceKind, SourceSpec};
pub use crate::fetch::{Fetch, HttpFetcher};
pub use crate::normalize::{NormalizedGroup, NormalizedItem, MAX_GROUP_ITEMS};
