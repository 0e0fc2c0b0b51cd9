//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-user tour registry.

use crate::config::Config;
use movie_diary_core::domain::OnboardingStep;
use movie_diary_core::feed::FeedAggregator;
use movie_diary_core::onboarding::OnboardingEngine;
use movie_diary_core::ports::{CatalogService, PersistenceService};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::info;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub feed: FeedAggregator,
    pub tours: Arc<TourRegistry>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn PersistenceService>,
        catalog: Arc<dyn CatalogService>,
        steps: Vec<OnboardingStep>,
    ) -> Self {
        let feed = FeedAggregator::new(store.clone(), catalog)
            .with_display_offset(config.display_offset());
        let tours = Arc::new(TourRegistry::new(
            store,
            steps,
            config.onboarding_auto_start,
            config.onboarding_idle_timeout,
        ));
        Self {
            config,
            feed,
            tours,
        }
    }
}

//=========================================================================================
// TourRegistry (One Onboarding Engine per Signed-in User)
//=========================================================================================

struct TourSession {
    engine: OnboardingEngine,
    last_seen: Instant,
}

pub struct TourRegistry {
    store: Arc<dyn PersistenceService>,
    steps: Vec<OnboardingStep>,
    auto_start_delay: Duration,
    idle_timeout: Duration,
    sessions: Mutex<HashMap<String, TourSession>>,
}

impl TourRegistry {
    pub fn new(
        store: Arc<dyn PersistenceService>,
        steps: Vec<OnboardingStep>,
        auto_start_delay: Duration,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            store,
            steps,
            auto_start_delay,
            idle_timeout,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the user's engine, creating and loading it on first use.
    ///
    /// Sessions untouched for longer than the idle timeout are signed out and
    /// dropped on the way.
    pub async fn engine_for(&self, user_id: &str) -> OnboardingEngine {
        let now = Instant::now();
        let (engine, expired) = {
            let mut sessions = self.sessions.lock().await;
            let expired = self.evict_idle(&mut sessions, user_id, now);
            let session = sessions
                .entry(user_id.to_string())
                .or_insert_with(|| {
                    info!("Creating onboarding session for user {}.", user_id);
                    TourSession {
                        engine: OnboardingEngine::new(self.steps.clone(), self.store.clone())
                            .with_auto_start_delay(self.auto_start_delay),
                        last_seen: now,
                    }
                });
            session.last_seen = now;
            (session.engine.clone(), expired)
        };

        for stale in expired {
            stale.sign_out().await;
        }
        // Only the first call per user actually reads the persisted record.
        engine.load_for_user(user_id).await;
        engine
    }

    fn evict_idle(
        &self,
        sessions: &mut HashMap<String, TourSession>,
        keep: &str,
        now: Instant,
    ) -> Vec<OnboardingEngine> {
        let idle: Vec<String> = sessions
            .iter()
            .filter(|(user_id, session)| {
                user_id.as_str() != keep
                    && now.duration_since(session.last_seen) >= self.idle_timeout
            })
            .map(|(user_id, _)| user_id.clone())
            .collect();
        if !idle.is_empty() {
            info!("Evicting {} idle onboarding session(s).", idle.len());
        }
        idle.iter()
            .filter_map(|user_id| sessions.remove(user_id))
            .map(|session| session.engine)
            .collect()
    }

    /// Drops the user's engine. Returns `false` if there was none.
    pub async fn sign_out(&self, user_id: &str) -> bool {
        let removed = self.sessions.lock().await.remove(user_id);
        match removed {
            Some(session) => {
                session.engine.sign_out().await;
                info!("Ended onboarding session for user {}.", user_id);
                true
            }
            None => false,
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
