//! crates/movie_diary_core/src/panel.rs
//!
//! Loading state for one list on screen (review previews, feed, trending).
//! A panel distinguishes "still loading" from "loaded, nothing to show",
//! and refuses to apply results after it has been torn down.

use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "items", rename_all = "snake_case")]
pub enum PanelState<T> {
    Loading,
    /// Loaded, and there is nothing to show ("no data yet").
    Empty,
    Ready(Vec<T>),
}

impl<T> PanelState<T> {
    fn from_items(items: Vec<T>) -> Self {
        if items.is_empty() {
            PanelState::Empty
        } else {
            PanelState::Ready(items)
        }
    }
}

/// Clears the loading flag when dropped, unless a newer refresh owns it.
struct LoadingGuard {
    loading: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    owner: u64,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        if self.generation.load(Ordering::SeqCst) == self.owner {
            self.loading.store(false, Ordering::SeqCst);
        }
    }
}

pub struct Panel<T> {
    state: Mutex<PanelState<T>>,
    loading: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    teardown: CancellationToken,
}

impl<T> Default for Panel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Panel<T> {
    /// A freshly mounted panel is loading until its first refresh settles.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PanelState::Loading),
            loading: Arc::new(AtomicBool::new(true)),
            generation: Arc::new(AtomicU64::new(0)),
            teardown: CancellationToken::new(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn is_torn_down(&self) -> bool {
        self.teardown.is_cancelled()
    }

    /// Stops the panel. In-flight refreshes finish without touching its state.
    pub fn teardown(&self) {
        self.teardown.cancel();
    }

    /// Runs `load` and stores its result.
    ///
    /// Returns `false` when the result was discarded: the panel was torn down
    /// while loading, or a newer refresh started in the meantime. The loading
    /// flag is cleared on every exit path.
    pub async fn refresh<F>(&self, load: F) -> bool
    where
        F: Future<Output = Vec<T>>,
    {
        let owner = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.loading.store(true, Ordering::SeqCst);
        let _guard = LoadingGuard {
            loading: self.loading.clone(),
            generation: self.generation.clone(),
            owner,
        };

        let items = tokio::select! {
            _ = self.teardown.cancelled() => {
                debug!("Panel torn down mid-load; dropping request.");
                return false;
            }
            items = load => items,
        };

        if self.is_torn_down() || self.generation.load(Ordering::SeqCst) != owner {
            debug!("Discarding stale panel result.");
            return false;
        }
        *self.state.lock().await = PanelState::from_items(items);
        true
    }
}

impl<T: Clone> Panel<T> {
    pub async fn state(&self) -> PanelState<T> {
        self.state.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn starts_loading_then_settles() {
        let panel = Panel::new();
        assert!(panel.is_loading());
        assert_eq!(panel.state().await, PanelState::Loading);

        assert!(panel.refresh(async { vec![1, 2, 3] }).await);
        assert!(!panel.is_loading());
        assert_eq!(panel.state().await, PanelState::Ready(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn empty_result_is_distinct_from_loading() {
        let panel: Panel<u32> = Panel::new();
        panel.refresh(async { Vec::new() }).await;
        assert!(!panel.is_loading());
        assert_eq!(panel.state().await, PanelState::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_mid_load_discards_result_and_clears_flag() {
        let panel = Arc::new(Panel::new());
        let background = panel.clone();
        let task = tokio::spawn(async move {
            background
                .refresh(async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    vec!["late"]
                })
                .await
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        panel.teardown();
        assert!(!task.await.unwrap());
        assert!(!panel.is_loading());
        assert_eq!(panel.state().await, PanelState::Loading);
    }

    #[tokio::test(start_paused = true)]
    async fn older_refresh_cannot_overwrite_newer_one() {
        let panel = Arc::new(Panel::new());
        let slow = panel.clone();
        let first = tokio::spawn(async move {
            slow.refresh(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                vec!["old"]
            })
            .await
        });
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(panel.refresh(async { vec!["new"] }).await);
        assert!(!first.await.unwrap());
        assert_eq!(panel.state().await, PanelState::Ready(vec!["new"]));
        assert!(!panel.is_loading());
    }
}
