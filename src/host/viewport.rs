use crate::history::{ListenerId, ScrollPosition};

use std::sync::Arc;

/// Error raised by a page's unload hook
pub type UnloadHookError = Box<dyn std::error::Error + Send + Sync>;

/// Page-level "before unload" callback.
///
/// Returns the text to show in a leave-page confirmation; empty text means no
/// confirmation is needed.
pub type UnloadHook = Arc<dyn Fn() -> Result<String, UnloadHookError> + Send + Sync>;

/// Callback invoked on every scroll notification.
pub type ScrollListener = Arc<dyn Fn() + Send + Sync>;

/// The host window as seen by the synchronizer: scroll offsets, a confirmation prompt,
/// and the unload hook slot.
pub trait Viewport: Send + Sync {
	fn scroll_position(&self) -> ScrollPosition;

	fn scroll_to(&self, x: f64, y: f64);

	/// Ask the user to confirm leaving the page. `true` means leave.
	fn confirm(&self, message: &str) -> bool;

	fn unload_hook(&self) -> Option<UnloadHook>;

	fn set_unload_hook(&self, hook: Option<UnloadHook>);

	fn subscribe_scroll(&self, listener: ScrollListener) -> ListenerId;

	fn unsubscribe_scroll(&self, id: ListenerId);
}
