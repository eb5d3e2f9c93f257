use crate::history::types::{HistoryEntryState, PopstateEvent};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Errors a native history implementation may raise while mutating the stack
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HistoryError {
	#[error("Security error: {0}")]
	SecurityError(String),

	#[error("State object too large: {0} bytes")]
	StateTooLarge(usize),

	#[error("Operation not supported: {0}")]
	Unsupported(String),
}

/// Callback invoked for every native history change notification.
pub type HistoryListener = Arc<dyn Fn(&PopstateEvent) + Send + Sync>;

/// Opaque handle returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
	/// Allocate a process-unique id.
	pub fn next() -> Self {
		static NEXT: AtomicU64 = AtomicU64::new(1);
		Self(NEXT.fetch_add(1, Ordering::Relaxed))
	}
}

/// The host's back/forward stack and its per-entry state storage.
///
/// Implementations must deliver notifications without holding internal locks, since a
/// listener may call straight back into the handle.
pub trait NativeHistory: Send + Sync {
	/// URL of the active entry (path, query and fragment).
	fn url(&self) -> String;

	/// State of the active entry, absent if none was ever written.
	fn state(&self) -> Option<HistoryEntryState>;

	/// Append a new entry after the active one.
	fn push_state(
		&self,
		state: HistoryEntryState,
		title: Option<&str>,
		url: &str,
	) -> Result<(), HistoryError>;

	/// Overwrite the active entry. Missing title or url keep the current ones.
	fn replace_state(
		&self,
		state: HistoryEntryState,
		title: Option<&str>,
		url: Option<&str>,
	) -> Result<(), HistoryError>;

	fn subscribe(&self, listener: HistoryListener) -> ListenerId;

	fn unsubscribe(&self, id: ListenerId);

	/// Whether push-based history mutation is available at all.
	fn supports_push_state(&self) -> bool {
		true
	}
}

/// Factory producing the history handle at mount time.
pub type HistoryCreator = Box<dyn FnOnce() -> Arc<dyn NativeHistory> + Send>;
