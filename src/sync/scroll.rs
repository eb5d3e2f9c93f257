//! Debounced scroll capture.
//!
//! Every scroll notification re-arms a single timer; only when scrolling has been quiet
//! for the configured delay is the offset written into the active entry's state.

use crate::sync::synchronizer::{SyncCore, lock};

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

/// Owner of the one outstanding scroll-save timer
pub(crate) struct ScrollTimer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl ScrollTimer {
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Cancel any pending timer and arm a new one that runs `task` after the delay.
    ///
    /// Without a tokio runtime there is nothing to sleep on, so `task` runs immediately.
    pub(crate) fn arm(&self, task: impl FnOnce() + Send + 'static) {
        let mut pending = lock(&self.pending);
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        match Handle::try_current() {
            Ok(runtime) => {
                let delay = self.delay;
                *pending = Some(runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    task();
                }));
            }
            Err(_) => {
                drop(pending);
                debug!("No async runtime available, saving scroll position immediately");
                task();
            }
        }
    }

    pub(crate) fn cancel(&self) {
        if let Some(previous) = lock(&self.pending).take() {
            previous.abort();
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        lock(&self.pending)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl SyncCore {
    pub(crate) fn on_scroll(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        self.scroll_timer.arm(move || {
            // A timer that outlived teardown must not touch the stack.
            if let Some(core) = weak.upgrade() {
                if core.is_mounted() {
                    core.save_scroll_position();
                }
            }
        });
    }

    /// Write the current scroll offset into the active entry, unless it is already there.
    pub(crate) fn save_scroll_position(&self) {
        let mut state = self.history.state().unwrap_or_default();
        let scroll = self.viewport.scroll_position();

        if state.scroll == Some(scroll) {
            debug!("Scroll position {:?} already stored, skipping write", scroll);
            self.record(|s| s.scroll_saves_skipped += 1);
            return;
        }

        state.scroll = Some(scroll);
        self.replace(state, None, None);
        self.record(|s| s.scroll_saves += 1);
    }
}

