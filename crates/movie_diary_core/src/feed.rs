//! crates/movie_diary_core/src/feed.rs
//!
//! Turns raw social records from the document store into display-ready lists:
//! landing-page review previews, the activity feed, and the trending grid.
//!
//! Every entry point swallows upstream failures. Callers always get a list
//! back (possibly empty, or the caller's fallback) and the failure is logged.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use futures::future::join_all;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::{
    Activity, ActivityFilter, MediaType, ReviewRecord, ReviewSignal, TrendingEntry,
};
use crate::ports::{CatalogService, PersistenceService};

/// Longest review excerpt shown on a preview card, in characters.
pub const EXCERPT_CHARS: usize = 120;

/// How many previews to show and how many raw reviews to pull to get there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewPreviewRequest {
    pub count: usize,
    pub oversample: usize,
}

impl Default for ReviewPreviewRequest {
    fn default() -> Self {
        Self {
            count: 5,
            oversample: 30,
        }
    }
}

//=========================================================================================
// Pure Helpers
//=========================================================================================

/// Keeps the first item for each key, preserving input order.
pub fn dedup_by_key<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect()
}

/// Applies the feed type filter. `All` returns the input untouched.
pub fn filter_activities(activities: Vec<Activity>, filter: ActivityFilter) -> Vec<Activity> {
    match filter {
        ActivityFilter::All => activities,
        ActivityFilter::Only(_) => activities
            .into_iter()
            .filter(|activity| filter.matches(activity))
            .collect(),
    }
}

/// Formats a timestamp as `yyyy.MM.dd` in the given offset.
pub fn format_display_date(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format("%Y.%m.%d").to_string()
}

fn excerpt(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.chars().count() <= EXCERPT_CHARS {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(EXCERPT_CHARS).collect();
    cut.push('…');
    cut
}

//=========================================================================================
// The Aggregator
//=========================================================================================

#[derive(Clone)]
pub struct FeedAggregator {
    store: Arc<dyn PersistenceService>,
    catalog: Arc<dyn CatalogService>,
    display_offset: FixedOffset,
}

impl FeedAggregator {
    pub fn new(store: Arc<dyn PersistenceService>, catalog: Arc<dyn CatalogService>) -> Self {
        Self {
            store,
            catalog,
            display_offset: Utc.fix(),
        }
    }

    /// Sets the offset used when formatting display dates.
    pub fn with_display_offset(mut self, offset: FixedOffset) -> Self {
        self.display_offset = offset;
        self
    }

    /// Latest reviews for the landing page, one per title.
    ///
    /// Falls back to `fallback` (truncated to `count`) when the store fails or
    /// has no reviews at all.
    pub async fn recent_review_signals(
        &self,
        request: ReviewPreviewRequest,
        fallback: &[ReviewSignal],
    ) -> Vec<ReviewSignal> {
        let limit = request.oversample.max(request.count);
        let records = match self.store.get_global_recent_reviews(limit).await {
            Ok(records) if !records.is_empty() => records,
            Ok(_) => {
                info!("No reviews yet; serving fallback previews.");
                return fallback.iter().take(request.count).cloned().collect();
            }
            Err(e) => {
                error!("Failed to fetch recent reviews: {}", e);
                return fallback.iter().take(request.count).cloned().collect();
            }
        };

        let mut unique = dedup_by_key(records, |record| record.movie_id);
        unique.truncate(request.count);

        let signals = unique.into_iter().map(|record| self.to_signal(record));
        join_all(signals.map(|signal| self.enrich(signal))).await
    }

    fn to_signal(&self, record: ReviewRecord) -> ReviewSignal {
        ReviewSignal {
            id: record.id,
            movie_id: record.movie_id,
            media_type: record.media_type,
            title: record.movie_title,
            poster_url: record.poster_url,
            rating: record.rating,
            excerpt: excerpt(&record.content),
            author: record.user_name,
            date: format_display_date(record.created_at, self.display_offset),
        }
    }

    /// Fills in whichever of title and poster are missing. Never overwrites.
    async fn enrich(&self, mut signal: ReviewSignal) -> ReviewSignal {
        if !signal.needs_enrichment() {
            return signal;
        }
        let details = match signal.media_type {
            MediaType::Movie => self.catalog.get_movie_details(signal.movie_id).await,
            MediaType::Tv => self.catalog.get_tv_details(signal.movie_id).await,
        };
        match details {
            Ok(details) => {
                debug!("Backfilled display fields for {}.", signal.key());
                if signal.title.is_none() {
                    signal.title = Some(details.title);
                }
                if signal.poster_url.is_none() {
                    signal.poster_url = details.poster_url;
                }
            }
            Err(e) => warn!("Could not backfill {}: {}", signal.key(), e),
        }
        signal
    }

    /// The social feed, in store order, optionally narrowed to one activity type.
    pub async fn activity_feed(&self, page_size: usize, filter: ActivityFilter) -> Vec<Activity> {
        match self.store.get_recent_activities(page_size).await {
            Ok(activities) => filter_activities(activities, filter),
            Err(e) => {
                error!("Failed to fetch activities: {}", e);
                Vec::new()
            }
        }
    }

    /// The trending grid in the store's ranking. Repeated keys keep their first rank.
    pub async fn trending(&self, count: usize) -> Vec<TrendingEntry> {
        match self.store.get_unified_trending(count).await {
            Ok(entries) => dedup_by_key(entries, TrendingEntry::key),
            Err(e) => {
                error!("Failed to fetch trending titles: {}", e);
                Vec::new()
            }
        }
    }
}
