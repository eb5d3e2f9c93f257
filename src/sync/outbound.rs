use crate::history::{HistoryEntryState, ScrollPosition};
use crate::navigation::{NavigationDescriptor, NavigationType};
use crate::sync::synchronizer::SyncCore;

use tracing::debug;

impl SyncCore {
	/// Mirror a new application navigation onto the native stack.
	pub(crate) fn sync_navigation(&self, navigate: &NavigationDescriptor) {
		if navigate.nav_type.mutates_history() {
			self.write_entry(navigate);
		} else if navigate.nav_type == NavigationType::Popstate {
			self.restore_scroll();
		} else {
			debug!(
				"{} navigation to {} needs no history write",
				navigate.nav_type.as_str(),
				navigate.url
			);
		}
	}

	fn write_entry(&self, navigate: &NavigationDescriptor) {
		if navigate.url == self.history.url() {
			debug!("History already at {}, skipping {}", navigate.url, navigate.nav_type.as_str());
			return;
		}

		let mut state = HistoryEntryState::new(navigate.params.clone(), navigate.query.clone());
		if navigate.preserve_scroll_position {
			if self.config.save_scroll_in_state {
				state.scroll = Some(self.viewport.scroll_position());
			}
		} else {
			if self.config.enable_scroll {
				self.viewport.scroll_to(0.0, 0.0);
			}
			if self.config.save_scroll_in_state {
				state.scroll = Some(ScrollPosition::ORIGIN);
			}
		}

		let title = navigate.page_title();
		if navigate.nav_type == NavigationType::Replacestate {
			self.replace(state, title, Some(&navigate.url));
		} else {
			self.push(state, title, &navigate.url);
		}
	}

	/// Move the viewport to the offset stored in the entry a traversal landed on.
	fn restore_scroll(&self) {
		if !self.config.enable_scroll {
			return;
		}
		let scroll = self
			.history
			.state()
			.and_then(|state| state.scroll)
			.unwrap_or_default();
		debug!("Restoring scroll position {:?}", scroll);
		self.viewport.scroll_to(scroll.x, scroll.y);
	}
}
