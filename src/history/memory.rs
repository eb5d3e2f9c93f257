//! In-memory native history.
//!
//! `MemoryHistory` behaves like a browser's session history: pushing truncates any
//! forward entries, traversal moves a cursor and notifies listeners with the state of
//! the entry that became active, and every mutation is recorded so callers can assert
//! on exactly what was written.

use crate::history::handle::{HistoryError, HistoryListener, ListenerId, NativeHistory};
use crate::history::types::{HistoryEntryState, PopstateEvent};

use std::sync::Mutex;
use tracing::debug;

/// A single entry of the stack
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
	pub url: String,
	pub state: Option<HistoryEntryState>,
	pub title: Option<String>,
}

/// A recorded mutation
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryCall {
	Push {
		state: HistoryEntryState,
		title: Option<String>,
		url: String,
	},
	Replace {
		state: HistoryEntryState,
		title: Option<String>,
		url: Option<String>,
	},
}

impl HistoryCall {
	pub fn is_push(&self) -> bool {
		matches!(self, HistoryCall::Push { .. })
	}
}

struct Inner {
	entries: Vec<HistoryEntry>,
	index: usize,
	document_title: Option<String>,
	calls: Vec<HistoryCall>,
	listeners: Vec<(ListenerId, HistoryListener)>,
	supports_push_state: bool,
	fail_next: Option<HistoryError>,
}

pub struct MemoryHistory {
	inner: Mutex<Inner>,
}

impl MemoryHistory {
	/// Start a session whose first entry is `url` with no state, as a freshly loaded page.
	pub fn new(url: impl Into<String>) -> Self {
		Self::with_initial_state(url, None)
	}

	pub fn with_initial_state(url: impl Into<String>, state: Option<HistoryEntryState>) -> Self {
		Self {
			inner: Mutex::new(Inner {
				entries: vec![HistoryEntry {
					url: url.into(),
					state,
					title: None,
				}],
				index: 0,
				document_title: None,
				calls: Vec::new(),
				listeners: Vec::new(),
				supports_push_state: true,
				fail_next: None,
			}),
		}
	}

	/// Report no push support, like a legacy browser.
	pub fn without_push_support(self) -> Self {
		self.lock().supports_push_state = false;
		self
	}

	/// Make the next push or replace fail with `error`.
	pub fn fail_next_mutation(&self, error: HistoryError) {
		self.lock().fail_next = Some(error);
	}

	pub fn calls(&self) -> Vec<HistoryCall> {
		self.lock().calls.clone()
	}

	pub fn push_count(&self) -> usize {
		self.lock().calls.iter().filter(|c| c.is_push()).count()
	}

	pub fn replace_count(&self) -> usize {
		self.lock().calls.iter().filter(|c| !c.is_push()).count()
	}

	pub fn entries(&self) -> Vec<HistoryEntry> {
		self.lock().entries.clone()
	}

	pub fn index(&self) -> usize {
		self.lock().index
	}

	pub fn document_title(&self) -> Option<String> {
		self.lock().document_title.clone()
	}

	pub fn listener_count(&self) -> usize {
		self.lock().listeners.len()
	}

	pub fn back(&self) -> bool {
		self.go(-1)
	}

	pub fn forward(&self) -> bool {
		self.go(1)
	}

	/// Move the cursor by `delta` and notify listeners. Out-of-range moves do nothing.
	pub fn go(&self, delta: isize) -> bool {
		let (event, listeners) = {
			let mut inner = self.lock();
			let Some(target) = inner.index.checked_add_signed(delta) else {
				return false;
			};
			if delta == 0 || target >= inner.entries.len() {
				return false;
			}
			inner.index = target;
			debug!("Memory history moved to entry {} ({})", target, inner.entries[target].url);
			let event = PopstateEvent::new(inner.entries[target].state.clone());
			(event, Self::snapshot_listeners(&inner))
		};
		Self::notify(&listeners, &event);
		true
	}

	/// Deliver a raw notification without moving the cursor.
	///
	/// Used to reproduce the popstate some browsers fire right after page load.
	pub fn emit_popstate(&self, state: Option<HistoryEntryState>) {
		let listeners = Self::snapshot_listeners(&self.lock());
		Self::notify(&listeners, &PopstateEvent::new(state));
	}

	fn snapshot_listeners(inner: &Inner) -> Vec<HistoryListener> {
		inner.listeners.iter().map(|(_, l)| l.clone()).collect()
	}

	fn notify(listeners: &[HistoryListener], event: &PopstateEvent) {
		for listener in listeners {
			listener(event);
		}
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
		self.inner.lock().unwrap_or_else(|e| e.into_inner())
	}
}

impl NativeHistory for MemoryHistory {
	fn url(&self) -> String {
		let inner = self.lock();
		inner.entries[inner.index].url.clone()
	}

	fn state(&self) -> Option<HistoryEntryState> {
		let inner = self.lock();
		inner.entries[inner.index].state.clone()
	}

	fn push_state(
		&self,
		state: HistoryEntryState,
		title: Option<&str>,
		url: &str,
	) -> Result<(), HistoryError> {
		let mut inner = self.lock();
		if !inner.supports_push_state {
			return Err(HistoryError::Unsupported("pushState".to_string()));
		}
		if let Some(error) = inner.fail_next.take() {
			return Err(error);
		}

		let next = inner.index + 1;
		inner.entries.truncate(next);
		inner.entries.push(HistoryEntry {
			url: url.to_string(),
			state: Some(state.clone()),
			title: title.map(str::to_string),
		});
		inner.index = next;
		if let Some(title) = title {
			inner.document_title = Some(title.to_string());
		}
		inner.calls.push(HistoryCall::Push {
			state,
			title: title.map(str::to_string),
			url: url.to_string(),
		});
		Ok(())
	}

	fn replace_state(
		&self,
		state: HistoryEntryState,
		title: Option<&str>,
		url: Option<&str>,
	) -> Result<(), HistoryError> {
		let mut inner = self.lock();
		if let Some(error) = inner.fail_next.take() {
			return Err(error);
		}

		let index = inner.index;
		let entry = &mut inner.entries[index];
		entry.state = Some(state.clone());
		if let Some(url) = url {
			entry.url = url.to_string();
		}
		if let Some(title) = title {
			entry.title = Some(title.to_string());
			inner.document_title = Some(title.to_string());
		}
		inner.calls.push(HistoryCall::Replace {
			state,
			title: title.map(str::to_string),
			url: url.map(str::to_string),
		});
		Ok(())
	}

	fn subscribe(&self, listener: HistoryListener) -> ListenerId {
		let id = ListenerId::next();
		self.lock().listeners.push((id, listener));
		id
	}

	fn unsubscribe(&self, id: ListenerId) {
		self.lock().listeners.retain(|(listener_id, _)| *listener_id != id);
	}

	fn supports_push_state(&self) -> bool {
		self.lock().supports_push_state
	}
}
