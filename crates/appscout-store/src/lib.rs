//! App-store HTTP client: keyword search, per-country lookup, and the
//! customer-review feed.
//!
//! The wire types in [`types`] and [`reviews`] mirror the store's JSON
//! responses; conversion into domain types from `appscout-core` happens at
//! the edges via `into_metadata` / `into_record`.

pub mod client;
pub mod error;
pub(crate) mod retry;
pub mod reviews;
pub mod types;

pub use client::StoreClient;
pub use error::StoreError;
pub use reviews::ReviewEntry;
pub use types::{SearchEnvelope, SearchResult};
