//! History Synchronization Module
//!
//! This module holds the state machine that keeps an application's current route and
//! the native history stack in agreement. It is composed of several submodules:
//!
//! - `synchronizer`: The entry point. Mounts against the host capabilities and owns the session state.
//! - `popstate`: Inbound handling of back/forward changes, including page-load popstate suppression and unload confirmation.
//! - `outbound`: Pushes or replaces entries after application navigations and restores scroll after traversals.
//! - `scroll`: Debounced capture of the scroll offset into the active entry.
//! - `early_buffer`: Captures the latest history change that happens before mount.
//! - `stats`: Per-session counters.
//! - `config`: Recognised options and their defaults.

/// Synchronizer options
pub mod config;
/// Latest-wins buffer for changes seen before mount
pub mod early_buffer;
/// Outbound navigation sync
mod outbound;
/// Inbound history change handling
mod popstate;
/// Debounced scroll capture
mod scroll;
/// Per-session counters
pub mod stats;
/// Mount/unmount lifecycle and shared session state
pub mod synchronizer;
/// Error types
pub mod types;

pub use config::{IgnorePopstate, SyncConfig};
pub use early_buffer::EarlyEventBuffer;
pub use stats::SyncStats;
pub use synchronizer::{HistorySynchronizer, HistorySynchronizerBuilder};
pub use types::HistorySyncError;

#[cfg(test)]
mod tests;
