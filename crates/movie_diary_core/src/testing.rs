//! In-memory port fakes shared by the unit tests.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

use crate::domain::{
    Activity, MediaType, OnboardingRecord, ReviewRecord, TitleDetails, TrendingEntry,
};
use crate::ports::{CatalogService, PersistenceService, PortError, PortResult};

#[derive(Default)]
pub struct FakeStore {
    pub reviews: Vec<ReviewRecord>,
    pub activities: Vec<Activity>,
    pub trending: Vec<TrendingEntry>,
    pub fail_reads: bool,
    pub fail_onboarding_read: bool,
    pub fail_onboarding_write: bool,
    pub onboarding: Mutex<HashMap<String, OnboardingRecord>>,
    pub writes: Mutex<Vec<(String, OnboardingRecord)>>,
    pub review_limits: Mutex<Vec<usize>>,
}

impl FakeStore {
    pub fn with_record(self, user_id: &str, record: OnboardingRecord) -> Self {
        self.onboarding
            .lock()
            .unwrap()
            .insert(user_id.to_string(), record);
        self
    }

    pub fn writes(&self) -> Vec<(String, OnboardingRecord)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl PersistenceService for FakeStore {
    async fn get_global_recent_reviews(&self, limit: usize) -> PortResult<Vec<ReviewRecord>> {
        self.review_limits.lock().unwrap().push(limit);
        if self.fail_reads {
            return Err(PortError::Unexpected("store offline".to_string()));
        }
        Ok(self.reviews.iter().take(limit).cloned().collect())
    }

    async fn get_recent_activities(&self, limit: usize) -> PortResult<Vec<Activity>> {
        if self.fail_reads {
            return Err(PortError::Unexpected("store offline".to_string()));
        }
        Ok(self.activities.iter().take(limit).cloned().collect())
    }

    async fn get_unified_trending(&self, limit: usize) -> PortResult<Vec<TrendingEntry>> {
        if self.fail_reads {
            return Err(PortError::Unexpected("store offline".to_string()));
        }
        Ok(self.trending.iter().take(limit).cloned().collect())
    }

    async fn read_onboarding_record(&self, user_id: &str) -> PortResult<Option<OnboardingRecord>> {
        if self.fail_onboarding_read {
            return Err(PortError::Unexpected("permission denied".to_string()));
        }
        Ok(self.onboarding.lock().unwrap().get(user_id).cloned())
    }

    async fn write_onboarding_record(
        &self,
        user_id: &str,
        record: &OnboardingRecord,
    ) -> PortResult<()> {
        self.writes
            .lock()
            .unwrap()
            .push((user_id.to_string(), record.clone()));
        if self.fail_onboarding_write {
            return Err(PortError::Unexpected("quota exceeded".to_string()));
        }
        self.onboarding
            .lock()
            .unwrap()
            .insert(user_id.to_string(), record.clone());
        Ok(())
    }
}

/// Store whose onboarding read for `gated_user` blocks until `release` is notified.
/// `entered` is notified once that read has started.
pub struct GatedStore {
    pub inner: FakeStore,
    pub gated_user: String,
    pub entered: Notify,
    pub release: Notify,
}

impl GatedStore {
    pub fn new(inner: FakeStore, gated_user: &str) -> Self {
        Self {
            inner,
            gated_user: gated_user.to_string(),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl PersistenceService for GatedStore {
    async fn get_global_recent_reviews(&self, limit: usize) -> PortResult<Vec<ReviewRecord>> {
        self.inner.get_global_recent_reviews(limit).await
    }

    async fn get_recent_activities(&self, limit: usize) -> PortResult<Vec<Activity>> {
        self.inner.get_recent_activities(limit).await
    }

    async fn get_unified_trending(&self, limit: usize) -> PortResult<Vec<TrendingEntry>> {
        self.inner.get_unified_trending(limit).await
    }

    async fn read_onboarding_record(&self, user_id: &str) -> PortResult<Option<OnboardingRecord>> {
        if user_id == self.gated_user {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.read_onboarding_record(user_id).await
    }

    async fn write_onboarding_record(
        &self,
        user_id: &str,
        record: &OnboardingRecord,
    ) -> PortResult<()> {
        self.inner.write_onboarding_record(user_id, record).await
    }
}

/// Catalog fake that counts calls and fails for the ids in `failing`.
/// Ids in `delays` answer only after sleeping; `finished` records answer order.
#[derive(Default)]
pub struct FakeCatalog {
    pub movie_calls: AtomicUsize,
    pub tv_calls: AtomicUsize,
    pub failing: Vec<u64>,
    pub delays: HashMap<u64, Duration>,
    pub finished: Mutex<Vec<u64>>,
}

impl FakeCatalog {
    pub fn calls(&self) -> usize {
        self.movie_calls.load(Ordering::SeqCst) + self.tv_calls.load(Ordering::SeqCst)
    }

    async fn details(&self, id: u64, prefix: &str) -> PortResult<TitleDetails> {
        if let Some(delay) = self.delays.get(&id) {
            tokio::time::sleep(*delay).await;
        }
        self.finished.lock().unwrap().push(id);
        if self.failing.contains(&id) {
            return Err(PortError::NotFound(format!("{prefix} {id}")));
        }
        Ok(TitleDetails {
            title: format!("{prefix} {id}"),
            poster_url: Some(format!("https://img.test/{prefix}/{id}.jpg")),
            ..Default::default()
        })
    }
}

#[async_trait]
impl CatalogService for FakeCatalog {
    async fn get_movie_details(&self, movie_id: u64) -> PortResult<TitleDetails> {
        self.movie_calls.fetch_add(1, Ordering::SeqCst);
        self.details(movie_id, "movie").await
    }

    async fn get_tv_details(&self, tv_id: u64) -> PortResult<TitleDetails> {
        self.tv_calls.fetch_add(1, Ordering::SeqCst);
        self.details(tv_id, "tv").await
    }
}

pub fn review(id: &str, movie_id: u64) -> ReviewRecord {
    ReviewRecord {
        id: id.to_string(),
        movie_id,
        media_type: MediaType::Movie,
        movie_title: Some(format!("Title {movie_id}")),
        poster_url: Some(format!("https://posters.test/{movie_id}.jpg")),
        rating: Some(4.0),
        content: format!("review {id}"),
        user_name: "jisoo".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap(),
    }
}
