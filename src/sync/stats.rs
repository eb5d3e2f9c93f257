//! Session statistics for the history synchronizer.
//!
//! `SyncStats` counts what the synchronizer did to the native stack and to the
//! application during one mount. The summary line is logged at unmount.

use chrono::{DateTime, Utc};

/// Counters for one synchronizer session
#[derive(Debug, Clone)]
pub struct SyncStats {
    /// When the session was mounted
    pub mounted_at: DateTime<Utc>,
    /// Entries pushed onto the native stack
    pub pushes: usize,
    /// Entries replaced in place
    pub replaces: usize,
    /// Navigations dispatched to the application
    pub dispatches: usize,
    /// Popstate events dropped as page-load noise
    pub suppressed_popstates: usize,
    /// Back/forward navigations the user refused to leave for
    pub denied_navigations: usize,
    /// Scroll offsets written into entry state
    pub scroll_saves: usize,
    /// Scroll saves skipped because the stored offset already matched
    pub scroll_saves_skipped: usize,
    /// Push or replace calls the history rejected
    pub failed_mutations: usize,
}

impl SyncStats {
    pub fn new() -> Self {
        Self {
            mounted_at: Utc::now(),
            pushes: 0,
            replaces: 0,
            dispatches: 0,
            suppressed_popstates: 0,
            denied_navigations: 0,
            scroll_saves: 0,
            scroll_saves_skipped: 0,
            failed_mutations: 0,
        }
    }

    /// Total writes that reached the native stack.
    pub fn mutations(&self) -> usize {
        self.pushes + self.replaces
    }

    /// One-line summary for logging.
    pub fn summary(&self) -> String {
        let elapsed = Utc::now().signed_duration_since(self.mounted_at);
        format!(
            "mounted {}s, {} pushes, {} replaces, {} dispatches, {} suppressed popstates, {} denied, {} scroll saves ({} skipped), {} failed mutations",
            elapsed.num_seconds(),
            self.pushes,
            self.replaces,
            self.dispatches,
            self.suppressed_popstates,
            self.denied_navigations,
            self.scroll_saves,
            self.scroll_saves_skipped,
            self.failed_mutations
        )
    }
}

impl Default for SyncStats {
    fn default() -> Self {
        Self::new()
    }
}
