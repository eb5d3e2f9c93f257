//! Keeps a single-page application's current route in sync with the host's native
//! history stack.
//!
//! Application navigations become pushes or replaces on the stack; back/forward
//! traversals become navigation actions dispatched into the application. Scroll offsets
//! are captured into entry state (debounced) and restored after traversal, and a page's
//! unload hook can veto leaving the current route.
//!
//! The host is reached only through capabilities: [`history::NativeHistory`],
//! [`host::Viewport`] and [`navigation::ActionDispatcher`]. In-memory implementations of
//! the first two ship with the crate.

/// Native history capability and entry state
pub mod history;
/// Host window capability
pub mod host;
/// Navigation descriptors and action dispatch
pub mod navigation;
/// The synchronization state machine
pub mod sync;

pub use sync::{HistorySyncError, HistorySynchronizer, SyncConfig};
