//! Campaign synchronization module
//!
//! This module mirrors the crowdfunding contract's campaigns into an in-memory, immutable
//! snapshot. It is composed of:
//!
//! - `types`: `Campaign`, `CampaignCollection`, tuple decoding and `RefreshError`.
//! - `fetch_tracker`: checks that a refresh delivered exactly the indices `1..=N`.
//! - `repository`: the refresh algorithm and snapshot publishing.

/// Coverage validation for refresh rounds
pub mod fetch_tracker;
/// Refresh and publish
pub mod repository;
/// Campaign data and error types
pub mod types;

pub use fetch_tracker::{FetchStats, FetchTracker};
pub use repository::CampaignRepository;
pub use types::*;
