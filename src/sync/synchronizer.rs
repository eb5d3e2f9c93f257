//! History synchronizer and its mount/unmount lifecycle.
//!
//! This module defines the `HistorySynchronizer`, which keeps the application's current
//! route and the native history stack in agreement for the lifetime of one mount. It
//! wires together the capabilities the host provides (history handle, viewport,
//! action dispatcher) and owns the session state shared by both directions of sync.
//!
//! The synchronizer is responsible for:
//! - Seeding the initial entry's state so the page-load popstate heuristic can work
//! - Recovering routes the server never rendered (`check_route_on_page_load`)
//! - Subscribing to history changes and replaying any change buffered before mount
//! - Subscribing to scroll notifications for debounced scroll capture
//! - Running the outbound sync after every application-state update
//! - Releasing every subscription and the pending scroll timer at unmount
//!
//! The inbound handler lives in `popstate`, the outbound sync in `outbound`, and scroll
//! capture in `scroll`; all of them operate on the shared `SyncCore`.

use crate::history::{
    HistoryCreator, HistoryEntryState, ListenerId, NativeHistory, PopstateEvent,
};
use crate::host::Viewport;
use crate::navigation::{Action, ActionDispatcher, NavigatePayload, RouteSnapshot};
use crate::sync::{
    config::SyncConfig, early_buffer::EarlyEventBuffer, scroll::ScrollTimer, stats::SyncStats,
    types::HistorySyncError,
};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::{debug, error, info};

/// State shared between the synchronizer handle and its host callbacks.
///
/// Locks are only ever held for a field read or write, never across a call into a
/// capability, so a dispatch that synchronously feeds a state update back in is safe.
pub(crate) struct SyncCore {
    pub(crate) config: SyncConfig,
    pub(crate) history: Arc<dyn NativeHistory>,
    pub(crate) viewport: Arc<dyn Viewport>,
    pub(crate) dispatcher: Arc<dyn ActionDispatcher>,
    pub(crate) ignore_page_load_popstate: bool,
    pub(crate) route: Mutex<RouteSnapshot>,
    pub(crate) scroll_timer: ScrollTimer,
    pub(crate) stats: Mutex<SyncStats>,
    pub(crate) mounted: AtomicBool,
}

impl SyncCore {
    pub(crate) fn route(&self) -> RouteSnapshot {
        lock(&self.route).clone()
    }

    pub(crate) fn record(&self, update: impl FnOnce(&mut SyncStats)) {
        update(&mut lock(&self.stats));
    }

    pub(crate) fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    /// Push an entry, logging and counting a rejected write instead of failing.
    pub(crate) fn push(&self, state: HistoryEntryState, title: Option<&str>, url: &str) {
        match self.history.push_state(state, title, url) {
            Ok(()) => {
                debug!("Pushed history entry {}", url);
                self.record(|s| s.pushes += 1);
            }
            Err(e) => {
                error!("Failed to push history entry {}: {}", url, e);
                self.record(|s| s.failed_mutations += 1);
            }
        }
    }

    /// Replace the active entry, logging and counting a rejected write instead of failing.
    pub(crate) fn replace(&self, state: HistoryEntryState, title: Option<&str>, url: Option<&str>) {
        match self.history.replace_state(state, title, url) {
            Ok(()) => {
                debug!("Replaced history entry {}", url.unwrap_or("(current)"));
                self.record(|s| s.replaces += 1);
            }
            Err(e) => {
                error!("Failed to replace history entry: {}", e);
                self.record(|s| s.failed_mutations += 1);
            }
        }
    }

    pub(crate) fn dispatch(&self, payload: NavigatePayload) {
        info!(
            "Dispatching {} navigation to {}",
            payload.nav_type.as_str(),
            payload.url
        );
        self.record(|s| s.dispatches += 1);
        self.dispatcher.execute_action(Action::Navigate, payload);
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Builder for mounting a `HistorySynchronizer`.
pub struct HistorySynchronizerBuilder {
    config: SyncConfig,
    history_creator: Option<HistoryCreator>,
    viewport: Option<Arc<dyn Viewport>>,
    dispatcher: Option<Arc<dyn ActionDispatcher>>,
    route: RouteSnapshot,
    early_buffer: Option<Arc<EarlyEventBuffer>>,
}

impl HistorySynchronizerBuilder {
    pub fn new() -> Self {
        Self {
            config: SyncConfig::default(),
            history_creator: None,
            viewport: None,
            dispatcher: None,
            route: RouteSnapshot::default(),
            early_buffer: None,
        }
    }

    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Factory invoked once at mount to produce the history handle.
    pub fn with_history_creator(
        mut self,
        creator: impl FnOnce() -> Arc<dyn NativeHistory> + Send + 'static,
    ) -> Self {
        self.history_creator = Some(Box::new(creator));
        self
    }

    /// Use an existing history handle.
    pub fn with_history(self, history: Arc<dyn NativeHistory>) -> Self {
        self.with_history_creator(move || history)
    }

    pub fn with_viewport(mut self, viewport: Arc<dyn Viewport>) -> Self {
        self.viewport = Some(viewport);
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn ActionDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// The application's route at mount time.
    pub fn with_route(mut self, route: RouteSnapshot) -> Self {
        self.route = route;
        self
    }

    /// Drain this buffer at mount instead of the process-wide one.
    pub fn with_early_buffer(mut self, buffer: Arc<EarlyEventBuffer>) -> Self {
        self.early_buffer = Some(buffer);
        self
    }

    /// Mount the synchronizer and start listening to the host.
    pub fn mount(self) -> Result<HistorySynchronizer, HistorySyncError> {
        self.config.validate()?;
        let creator = self
            .history_creator
            .ok_or(HistorySyncError::MissingCapability("history"))?;
        let viewport = self
            .viewport
            .ok_or(HistorySyncError::MissingCapability("viewport"))?;
        let dispatcher = self
            .dispatcher
            .ok_or(HistorySyncError::MissingCapability("dispatcher"))?;
        let early_buffer = self.early_buffer.unwrap_or_else(EarlyEventBuffer::global);

        let history = creator();
        let ignore_page_load_popstate = self.config.ignore_popstate_on_page_load.resolve();
        let scroll_timer = ScrollTimer::new(self.config.scroll_save_delay);

        let core = Arc::new(SyncCore {
            config: self.config,
            history,
            viewport,
            dispatcher,
            ignore_page_load_popstate,
            route: Mutex::new(self.route),
            scroll_timer,
            stats: Mutex::new(SyncStats::new()),
            mounted: AtomicBool::new(true),
        });

        info!(
            "Mounting history synchronizer at {} (ignore page-load popstate: {})",
            core.history.url(),
            ignore_page_load_popstate
        );

        // Seed a non-null state so a later null-state event can be told apart.
        if ignore_page_load_popstate && core.history.state().is_none() {
            debug!("Seeding empty state on initial history entry");
            core.replace(HistoryEntryState::default(), None, None);
        }

        if core.config.check_route_on_page_load {
            let url_from_history = core.history.url();
            let route = core.route();
            if route.route_url() != Some(url_from_history.as_str()) {
                info!(
                    "History URL {} differs from route URL {:?}, recovering route",
                    url_from_history,
                    route.route_url()
                );
                core.dispatch(NavigatePayload::pageload(url_from_history));
            }
        }

        let weak = Arc::downgrade(&core);
        let history_listener = core.history.subscribe(Arc::new(move |event: &PopstateEvent| {
            if let Some(core) = weak.upgrade() {
                core.handle_history_change(event);
            }
        }));

        if let Some(event) = early_buffer.drain() {
            info!("Replaying history change captured before mount");
            core.handle_history_change(&event);
        }

        let scroll_listener = if core.config.save_scroll_in_state {
            let weak: Weak<SyncCore> = Arc::downgrade(&core);
            Some(core.viewport.subscribe_scroll(Arc::new(move || {
                if let Some(core) = weak.upgrade() {
                    core.on_scroll();
                }
            })))
        } else {
            None
        };

        Ok(HistorySynchronizer {
            core,
            history_listener: Some(history_listener),
            scroll_listener,
        })
    }
}

impl Default for HistorySynchronizerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps the application route and the native history stack in sync for one mount.
///
/// Dropping a mounted synchronizer tears it down the same way `unmount` does.
pub struct HistorySynchronizer {
    core: Arc<SyncCore>,
    history_listener: Option<ListenerId>,
    scroll_listener: Option<ListenerId>,
}

impl HistorySynchronizer {
    pub fn builder() -> HistorySynchronizerBuilder {
        HistorySynchronizerBuilder::new()
    }

    /// Feed the application's state after an update.
    ///
    /// The outbound sync runs when the snapshot carries a navigation descriptor that
    /// differs from the previous one. Descriptors are compared by value, so re-issuing an
    /// identical descriptor (for example retrying a click whose push failed) writes nothing.
    pub fn on_state_update(&self, snapshot: RouteSnapshot) {
        let navigate = {
            let mut route = lock(&self.core.route);
            let is_new = snapshot.current_navigate.is_some()
                && snapshot.current_navigate != route.current_navigate;
            *route = snapshot;
            if is_new {
                route.current_navigate.clone()
            } else {
                None
            }
        };

        if let Some(navigate) = navigate {
            self.core.sync_navigation(&navigate);
        }
    }

    /// Handle a native history change, exactly as the history subscription does.
    pub fn handle_history_change(&self, event: &PopstateEvent) {
        self.core.handle_history_change(event);
    }

    /// Persist the current scroll offset into the active entry right away.
    pub fn save_scroll_position(&self) {
        self.core.save_scroll_position();
    }

    pub fn ignores_page_load_popstate(&self) -> bool {
        self.core.ignore_page_load_popstate
    }

    pub fn has_pending_scroll_save(&self) -> bool {
        self.core.scroll_timer.is_pending()
    }

    pub fn history(&self) -> Arc<dyn NativeHistory> {
        self.core.history.clone()
    }

    pub fn stats(&self) -> SyncStats {
        lock(&self.core.stats).clone()
    }

    /// Stop listening to the host and cancel any pending scroll save.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if !self.core.mounted.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(id) = self.history_listener.take() {
            self.core.history.unsubscribe(id);
        }
        if let Some(id) = self.scroll_listener.take() {
            self.core.viewport.unsubscribe_scroll(id);
        }
        self.core.scroll_timer.cancel();
        info!("History synchronizer unmounted: {}", self.stats().summary());
    }
}

impl Drop for HistorySynchronizer {
    fn drop(&mut self) {
        self.teardown();
    }
}
