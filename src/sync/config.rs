//! Synchronizer configuration.
//!
//! Options map one to one onto the recognised keys of a JSON configuration object
//! (`checkRouteOnPageLoad`, `enableScroll`, `saveScrollInState`,
//! `ignorePopstateOnPageLoad`, `scrollSaveDelay`). Every key is optional.

use crate::sync::types::HistorySyncError;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound accepted for the scroll-save debounce
pub const MAX_SCROLL_SAVE_DELAY: Duration = Duration::from_secs(10);

/// Whether to drop the popstate some browsers fire on initial page load.
///
/// Resolved once at mount; the predicate is never consulted again for that session.
#[derive(Clone)]
pub enum IgnorePopstate {
	Always(bool),
	When(Arc<dyn Fn() -> bool + Send + Sync>),
}

impl IgnorePopstate {
	pub fn when(predicate: impl Fn() -> bool + Send + Sync + 'static) -> Self {
		IgnorePopstate::When(Arc::new(predicate))
	}

	pub fn resolve(&self) -> bool {
		match self {
			IgnorePopstate::Always(value) => *value,
			IgnorePopstate::When(predicate) => predicate(),
		}
	}
}

impl Default for IgnorePopstate {
	fn default() -> Self {
		IgnorePopstate::Always(false)
	}
}

impl fmt::Debug for IgnorePopstate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			IgnorePopstate::Always(value) => f.debug_tuple("Always").field(value).finish(),
			IgnorePopstate::When(_) => f.write_str("When(<predicate>)"),
		}
	}
}

impl Serialize for IgnorePopstate {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			IgnorePopstate::Always(value) => serializer.serialize_bool(*value),
			IgnorePopstate::When(_) => Err(serde::ser::Error::custom(
				"a predicate cannot be serialized",
			)),
		}
	}
}

impl<'de> Deserialize<'de> for IgnorePopstate {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		bool::deserialize(deserializer).map(IgnorePopstate::Always)
	}
}

/// Configuration for the history synchronizer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
	/// Dispatch a pageload navigation at mount when the history URL differs from the route URL
	pub check_route_on_page_load: bool,
	/// Restore or reset the viewport scroll on navigation
	pub enable_scroll: bool,
	/// Persist scroll offsets inside history entry state
	pub save_scroll_in_state: bool,
	/// Suppress the spurious popstate fired on page load
	pub ignore_popstate_on_page_load: IgnorePopstate,
	/// Debounce applied to scroll capture
	#[serde(with = "humantime_serde")]
	pub scroll_save_delay: Duration,
}

impl Default for SyncConfig {
	fn default() -> Self {
		Self {
			check_route_on_page_load: false,
			enable_scroll: true,
			save_scroll_in_state: true,
			ignore_popstate_on_page_load: IgnorePopstate::default(),
			scroll_save_delay: Duration::from_millis(150),
		}
	}
}

impl SyncConfig {
	/// Parse and validate a JSON configuration object.
	pub fn from_json_str(json: &str) -> Result<Self, HistorySyncError> {
		let config: SyncConfig = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), HistorySyncError> {
		if self.scroll_save_delay > MAX_SCROLL_SAVE_DELAY {
			return Err(HistorySyncError::Config(format!(
				"scrollSaveDelay {:?} exceeds the maximum of {:?}",
				self.scroll_save_delay, MAX_SCROLL_SAVE_DELAY
			)));
		}
		Ok(())
	}
}
