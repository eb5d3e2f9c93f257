use crate::history::{ListenerId, ScrollPosition};
use crate::host::viewport::{ScrollListener, UnloadHook, Viewport};

use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
	scroll: ScrollPosition,
	scroll_to_calls: Vec<ScrollPosition>,
	prompts: Vec<String>,
	confirm_answers: VecDeque<bool>,
	unload_hook: Option<UnloadHook>,
	scroll_listeners: Vec<(ListenerId, ScrollListener)>,
}

/// In-memory host window.
///
/// `scroll_to` moves the offset silently; `user_scroll` moves it and notifies scroll
/// listeners the way a user gesture would. Confirmation prompts answer from a scripted
/// queue and grant by default.
#[derive(Default)]
pub struct MemoryViewport {
	inner: Mutex<Inner>,
}

impl MemoryViewport {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn user_scroll(&self, x: f64, y: f64) {
		let listeners: Vec<ScrollListener> = {
			let mut inner = self.lock();
			inner.scroll = ScrollPosition::new(x, y);
			inner.scroll_listeners.iter().map(|(_, l)| l.clone()).collect()
		};
		for listener in listeners {
			listener();
		}
	}

	/// Queue the answer for the next confirmation prompt.
	pub fn answer_next_confirm(&self, leave: bool) {
		self.lock().confirm_answers.push_back(leave);
	}

	pub fn prompts(&self) -> Vec<String> {
		self.lock().prompts.clone()
	}

	pub fn scroll_to_calls(&self) -> Vec<ScrollPosition> {
		self.lock().scroll_to_calls.clone()
	}

	pub fn has_unload_hook(&self) -> bool {
		self.lock().unload_hook.is_some()
	}

	pub fn scroll_listener_count(&self) -> usize {
		self.lock().scroll_listeners.len()
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
		self.inner.lock().unwrap_or_else(|e| e.into_inner())
	}
}

impl Viewport for MemoryViewport {
	fn scroll_position(&self) -> ScrollPosition {
		self.lock().scroll
	}

	fn scroll_to(&self, x: f64, y: f64) {
		let mut inner = self.lock();
		inner.scroll = ScrollPosition::new(x, y);
		inner.scroll_to_calls.push(ScrollPosition::new(x, y));
	}

	fn confirm(&self, message: &str) -> bool {
		let mut inner = self.lock();
		inner.prompts.push(message.to_string());
		inner.confirm_answers.pop_front().unwrap_or(true)
	}

	fn unload_hook(&self) -> Option<UnloadHook> {
		self.lock().unload_hook.clone()
	}

	fn set_unload_hook(&self, hook: Option<UnloadHook>) {
		self.lock().unload_hook = hook;
	}

	fn subscribe_scroll(&self, listener: ScrollListener) -> ListenerId {
		let id = ListenerId::next();
		self.lock().scroll_listeners.push((id, listener));
		id
	}

	fn unsubscribe_scroll(&self, id: ListenerId) {
		self.lock().scroll_listeners.retain(|(listener_id, _)| *listener_id != id);
	}
}
