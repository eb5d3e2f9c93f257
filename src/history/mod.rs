//! Native history integration
//!
//! This module describes the host's back/forward stack as a capability (`NativeHistory`),
//! the state payload stored per entry, and an in-memory implementation used by tests and
//! the demo binary.

/// Capability trait and error types for the native history stack
mod handle;
/// In-memory history stack
mod memory;
/// Entry state and event types
mod types;

pub use handle::*;
pub use memory::{HistoryCall, HistoryEntry, MemoryHistory};
pub use types::*;
