//! crates/movie_diary_core/src/onboarding.rs
//!
//! The guided-tour engine: a linear walk over a fixed list of steps, with the
//! terminal outcome (finished or skipped) persisted per user.
//!
//! The engine is a cheap, cloneable handle. All clones share one tour, so the
//! presentation layer can hand it to every component that drives the tour.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::anchor::{place, Placement};
use crate::domain::{OnboardingRecord, OnboardingStep};
use crate::ports::{LayoutService, PersistenceService};

/// Delay between confirming a first-time user and opening the tour.
pub const DEFAULT_AUTO_START_DELAY: Duration = Duration::from_millis(1000);

//=========================================================================================
// Tour State
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "index", rename_all = "snake_case")]
pub enum TourState {
    Inactive,
    Active(usize),
    Completed,
    Skipped,
}

/// What the presentation layer needs to render the tour.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourSnapshot {
    pub is_active: bool,
    pub current_index: usize,
    pub has_completed: bool,
    pub state: TourState,
    pub total_steps: usize,
    pub step: Option<OnboardingStep>,
}

struct TourInner {
    user_id: Option<String>,
    state: TourState,
    has_completed: bool,
    /// Bumped on every user change; async results tagged with an older value are dropped.
    generation: u64,
    auto_started: bool,
    auto_start_timer: Option<CancellationToken>,
    /// Set once the current user's record has been read and applied.
    loaded: Arc<OnceCell<()>>,
}

impl TourInner {
    fn new() -> Self {
        Self {
            user_id: None,
            state: TourState::Inactive,
            has_completed: false,
            generation: 0,
            auto_started: false,
            auto_start_timer: None,
            loaded: Arc::new(OnceCell::new()),
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.auto_start_timer.take() {
            timer.cancel();
        }
    }

    fn reset_for(&mut self, user_id: Option<String>) {
        self.cancel_timer();
        self.generation += 1;
        self.user_id = user_id;
        self.state = TourState::Inactive;
        self.has_completed = false;
        self.auto_started = false;
        self.loaded = Arc::new(OnceCell::new());
    }

    /// Moves to a terminal state and returns the record to persist, if a user is signed in.
    fn finish(&mut self, skipped: bool) -> Option<(String, OnboardingRecord)> {
        self.cancel_timer();
        self.has_completed = true;
        let now = Utc::now();
        let record = if skipped {
            self.state = TourState::Skipped;
            OnboardingRecord::skipped(now)
        } else {
            self.state = TourState::Completed;
            OnboardingRecord::finished(now)
        };
        self.user_id.clone().map(|user_id| (user_id, record))
    }
}

//=========================================================================================
// The Engine
//=========================================================================================

#[derive(Clone)]
pub struct OnboardingEngine {
    steps: Arc<[OnboardingStep]>,
    store: Arc<dyn PersistenceService>,
    auto_start_delay: Duration,
    inner: Arc<Mutex<TourInner>>,
}

impl OnboardingEngine {
    pub fn new(steps: Vec<OnboardingStep>, store: Arc<dyn PersistenceService>) -> Self {
        Self {
            steps: steps.into(),
            store,
            auto_start_delay: DEFAULT_AUTO_START_DELAY,
            inner: Arc::new(Mutex::new(TourInner::new())),
        }
    }

    pub fn with_auto_start_delay(mut self, delay: Duration) -> Self {
        self.auto_start_delay = delay;
        self
    }

    pub fn steps(&self) -> &[OnboardingStep] {
        &self.steps
    }

    //-------------------------------------------------------------------------------------
    // Session lifecycle
    //-------------------------------------------------------------------------------------

    /// Binds the tour to `user_id` and reads their persisted record.
    ///
    /// Calling again for the same user does not read again; a caller that
    /// arrives while the first read is in flight waits for it. When no terminal
    /// record exists (or it cannot be read), the tour opens by itself once
    /// `auto_start_delay` has elapsed.
    pub async fn load_for_user(&self, user_id: &str) {
        let (generation, loaded) = {
            let mut inner = self.inner.lock().await;
            if inner.user_id.as_deref() != Some(user_id) {
                inner.reset_for(Some(user_id.to_string()));
            }
            (inner.generation, inner.loaded.clone())
        };
        loaded
            .get_or_init(|| self.apply_persisted(user_id, generation))
            .await;
    }

    async fn apply_persisted(&self, user_id: &str, generation: u64) {
        let persisted = match self.store.read_onboarding_record(user_id).await {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    "Failed to read onboarding record for user {}: {}. Assuming tour not completed.",
                    user_id, e
                );
                None
            }
        };

        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            debug!("Discarding onboarding record for {}: user changed mid-read.", user_id);
            return;
        }

        match persisted {
            Some(record) if record.completed => {
                inner.has_completed = true;
                if inner.state == TourState::Inactive {
                    inner.state = if record.skipped {
                        TourState::Skipped
                    } else {
                        TourState::Completed
                    };
                }
                info!(
                    "Onboarding already {} for user {}.",
                    if record.skipped { "skipped" } else { "completed" },
                    user_id
                );
            }
            _ => self.schedule_auto_start(&mut inner),
        }
    }

    /// Forgets the current user, cancelling any pending auto-start.
    pub async fn sign_out(&self) {
        let mut inner = self.inner.lock().await;
        inner.reset_for(None);
    }

    fn schedule_auto_start(&self, inner: &mut TourInner) {
        if inner.auto_started || inner.state != TourState::Inactive || self.steps.is_empty() {
            return;
        }
        inner.cancel_timer();
        let timer = CancellationToken::new();
        inner.auto_start_timer = Some(timer.clone());

        let generation = inner.generation;
        let delay = self.auto_start_delay;
        let engine = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = timer.cancelled() => {}
                _ = tokio::time::sleep(delay) => engine.auto_start(generation).await,
            }
        });
    }

    async fn auto_start(&self, generation: u64) {
        let mut inner = self.inner.lock().await;
        if inner.generation != generation
            || inner.auto_started
            || inner.has_completed
            || inner.state != TourState::Inactive
        {
            return;
        }
        inner.auto_started = true;
        inner.auto_start_timer = None;
        inner.state = TourState::Active(0);
        info!(
            "Starting onboarding tour automatically for user {}.",
            inner.user_id.as_deref().unwrap_or("<anonymous>")
        );
    }

    //-------------------------------------------------------------------------------------
    // Transitions
    //-------------------------------------------------------------------------------------

    /// Opens the tour at the first step. Always allowed, even after a terminal outcome.
    pub async fn start(&self) -> TourSnapshot {
        let mut inner = self.inner.lock().await;
        if !self.steps.is_empty() {
            inner.cancel_timer();
            inner.auto_started = true;
            inner.state = TourState::Active(0);
        }
        self.snapshot_of(&inner)
    }

    /// Advances one step; advancing past the last step finishes the tour.
    pub async fn next(&self) -> TourSnapshot {
        let pending = {
            let mut inner = self.inner.lock().await;
            match inner.state {
                TourState::Active(i) if i + 1 < self.steps.len() => {
                    inner.state = TourState::Active(i + 1);
                    None
                }
                TourState::Active(_) => inner.finish(false),
                _ => None,
            }
        };
        self.persist(pending).await;
        self.snapshot().await
    }

    /// Goes back one step. No-op on the first step.
    pub async fn prev(&self) -> TourSnapshot {
        let mut inner = self.inner.lock().await;
        if let TourState::Active(i) = inner.state {
            if i > 0 {
                inner.state = TourState::Active(i - 1);
            }
        }
        self.snapshot_of(&inner)
    }

    /// Jumps to step `index` while the tour is open. Out-of-range indices are ignored.
    pub async fn go_to(&self, index: usize) -> TourSnapshot {
        let mut inner = self.inner.lock().await;
        if matches!(inner.state, TourState::Active(_)) && index < self.steps.len() {
            inner.state = TourState::Active(index);
        }
        self.snapshot_of(&inner)
    }

    /// Ends the tour from any step and records it as skipped.
    pub async fn skip(&self) -> TourSnapshot {
        self.close(true).await
    }

    /// Ends the tour from any step and records it as finished.
    pub async fn complete(&self) -> TourSnapshot {
        self.close(false).await
    }

    async fn close(&self, skipped: bool) -> TourSnapshot {
        let pending = {
            let mut inner = self.inner.lock().await;
            match inner.state {
                TourState::Active(_) => inner.finish(skipped),
                _ => None,
            }
        };
        self.persist(pending).await;
        self.snapshot().await
    }

    /// Writes the terminal record. Failures only cost persistence across reloads.
    async fn persist(&self, pending: Option<(String, OnboardingRecord)>) {
        let Some((user_id, record)) = pending else {
            return;
        };
        match self.store.write_onboarding_record(&user_id, &record).await {
            Ok(()) => info!(
                "Saved onboarding record for user {} (skipped: {}).",
                user_id, record.skipped
            ),
            Err(e) => warn!("Failed to save onboarding record for user {}: {}", user_id, e),
        }
    }

    //-------------------------------------------------------------------------------------
    // Reads
    //-------------------------------------------------------------------------------------

    pub async fn snapshot(&self) -> TourSnapshot {
        let inner = self.inner.lock().await;
        self.snapshot_of(&inner)
    }

    fn snapshot_of(&self, inner: &TourInner) -> TourSnapshot {
        let (is_active, current_index) = match inner.state {
            TourState::Active(i) => (true, i),
            _ => (false, 0),
        };
        TourSnapshot {
            is_active,
            current_index,
            has_completed: inner.has_completed,
            state: inner.state,
            total_steps: self.steps.len(),
            step: is_active
                .then(|| self.steps.get(current_index).cloned())
                .flatten(),
        }
    }

    /// Where to show the tooltip for the current step. `Centered` when the
    /// tour is closed, the step has no target, or the target is not on the page.
    pub async fn placement(&self, layout: &dyn LayoutService) -> Placement {
        let step = match self.snapshot().await.step {
            Some(step) => step,
            None => return Placement::Centered,
        };
        place(step.target.as_deref(), step.position, |selector| {
            layout.bounding_box(selector)
        })
    }
}
