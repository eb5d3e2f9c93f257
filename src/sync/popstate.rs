//! Inbound handling of native history changes.
//!
//! A change the application did not initiate (back/forward) goes through three steps:
//! page-load popstate suppression, unload confirmation, and then either a compensating
//! push (confirmation denied) or a popstate navigation dispatched to the application.

use crate::history::{HistoryEntryState, PopstateEvent};
use crate::navigation::NavigatePayload;
use crate::sync::synchronizer::SyncCore;

use tracing::{debug, info, warn};

impl SyncCore {
    /// Best-effort detection of the popstate some browsers fire on initial page load.
    ///
    /// The event carries no state while the stack reports one, which only happens when
    /// the event does not correspond to a real traversal.
    pub(crate) fn is_page_load_popstate(&self, event: &PopstateEvent) -> bool {
        event.state.is_none() && self.history.state().is_some()
    }

    /// Text returned by the page's unload hook; a failing hook counts as no text.
    fn unload_confirmation_text(&self) -> Option<String> {
        let hook = self.viewport.unload_hook()?;
        match hook() {
            Ok(text) if !text.is_empty() => Some(text),
            Ok(_) => None,
            Err(e) => {
                warn!("Unload hook failed, treating as no confirmation text: {}", e);
                None
            }
        }
    }

    fn confirm_leave(&self) -> bool {
        match self.unload_confirmation_text() {
            Some(text) => self.viewport.confirm(&text),
            None => true,
        }
    }

    pub(crate) fn handle_history_change(&self, event: &PopstateEvent) {
        if self.ignore_page_load_popstate && self.is_page_load_popstate(event) {
            debug!("Ignoring page-load popstate");
            self.record(|s| s.suppressed_popstates += 1);
            return;
        }

        let url = self.history.url();
        let route = self.route();
        let current_url = route.route_url().map(str::to_string);

        if !self.confirm_leave() {
            // The browser already moved; put the page being kept back on top.
            let navigate = route.current_navigate.unwrap_or_default();
            let mut state = HistoryEntryState::new(navigate.params.clone(), navigate.query.clone());
            if self.config.save_scroll_in_state {
                state.scroll = Some(self.viewport.scroll_position());
            }
            match current_url {
                Some(current_url) => {
                    info!(
                        "Navigation to {} denied, restoring {}",
                        url, current_url
                    );
                    self.push(state, navigate.page_title(), &current_url);
                }
                None => warn!("Navigation to {} denied but no current route to restore", url),
            }
            self.record(|s| s.denied_navigations += 1);
            return;
        }

        if current_url.as_deref() == Some(url.as_str()) {
            debug!("History change to current route {}, nothing to do", url);
            return;
        }

        self.viewport.set_unload_hook(None);
        let (params, query) = match &event.state {
            Some(state) => (Some(state.params.clone()), Some(state.query.clone())),
            None => (None, None),
        };
        self.dispatch(NavigatePayload::popstate(url, params, query));
    }
}
