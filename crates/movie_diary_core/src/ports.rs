//! crates/movie_diary_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core depends on.
//! These traits form the boundary of the hexagonal architecture: the catalog
//! API, the document store and the page layout are all reached through them,
//! so the core never knows which concrete client is behind a call.

use async_trait::async_trait;

use crate::anchor::ElementBox;
use crate::domain::{Activity, OnboardingRecord, ReviewRecord, TitleDetails, TrendingEntry};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., HTTP, decoding).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Read-only film/TV metadata source, used to backfill display fields.
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn get_movie_details(&self, movie_id: u64) -> PortResult<TitleDetails>;

    async fn get_tv_details(&self, tv_id: u64) -> PortResult<TitleDetails>;
}

/// The remote document store holding social records and per-user settings.
#[async_trait]
pub trait PersistenceService: Send + Sync {
    // --- Social Records (newest first, as ordered by the store) ---
    async fn get_global_recent_reviews(&self, limit: usize) -> PortResult<Vec<ReviewRecord>>;

    async fn get_recent_activities(&self, limit: usize) -> PortResult<Vec<Activity>>;

    /// Trending titles, already aggregated and ranked by the store.
    async fn get_unified_trending(&self, limit: usize) -> PortResult<Vec<TrendingEntry>>;

    // --- Onboarding Record ---
    /// Returns `Ok(None)` when the user has no record yet.
    async fn read_onboarding_record(&self, user_id: &str) -> PortResult<Option<OnboardingRecord>>;

    async fn write_onboarding_record(
        &self,
        user_id: &str,
        record: &OnboardingRecord,
    ) -> PortResult<()>;
}

/// Resolves element selectors to their on-screen boxes.
pub trait LayoutService: Send + Sync {
    /// `None` when no element currently matches the selector.
    fn bounding_box(&self, selector: &str) -> Option<ElementBox>;
}
