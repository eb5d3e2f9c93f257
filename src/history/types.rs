//! Types stored in, and emitted by, the native history stack

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Route params or query values. Key order carries no meaning.
pub type Params = BTreeMap<String, serde_json::Value>;

/// Reserved params key holding the document title of an entry.
pub const PAGE_TITLE_KEY: &str = "pageTitle";

/// A viewport scroll offset.
///
/// Either component may be missing from a stored entry; a missing component reads as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollPosition {
	#[serde(default)]
	pub x: f64,
	#[serde(default)]
	pub y: f64,
}

impl ScrollPosition {
	pub const ORIGIN: ScrollPosition = ScrollPosition { x: 0.0, y: 0.0 };

	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// The payload carried by every history entry the synchronizer creates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntryState {
	#[serde(default)]
	pub query: Params,
	#[serde(default)]
	pub params: Params,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scroll: Option<ScrollPosition>,
}

impl HistoryEntryState {
	pub fn new(params: Params, query: Params) -> Self {
		Self {
			query,
			params,
			scroll: None,
		}
	}

	pub fn with_scroll(mut self, scroll: ScrollPosition) -> Self {
		self.scroll = Some(scroll);
		self
	}

	/// Title stored under the reserved `pageTitle` param, if it is a string.
	pub fn page_title(&self) -> Option<&str> {
		page_title(&self.params)
	}
}

/// Resolve the display title from a params map.
pub fn page_title(params: &Params) -> Option<&str> {
	params.get(PAGE_TITLE_KEY).and_then(|v| v.as_str())
}

/// A change notification from the native history stack.
///
/// `state` is whatever the browser attached to the event, which is absent for the first
/// entry of a session and for the spurious popstate some browsers fire on page load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopstateEvent {
	pub state: Option<HistoryEntryState>,
}

impl PopstateEvent {
	pub fn new(state: Option<HistoryEntryState>) -> Self {
		Self { state }
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_missing_scroll_component_reads_as_zero() {
		let state: HistoryEntryState =
			serde_json::from_value(json!({"params": {"id": 1}, "scroll": {"y": 40}}))
				.expect("Failed to deserialize entry state");
		assert_eq!(state.scroll, Some(ScrollPosition::new(0.0, 40.0)));
		assert!(state.query.is_empty());
		assert_eq!(state.params.get("id"), Some(&json!(1)));
	}

	#[test]
	fn test_page_title_only_accepts_strings() {
		let mut params = Params::new();
		params.insert(PAGE_TITLE_KEY.to_string(), json!(42));
		assert_eq!(page_title(&params), None);

		params.insert(PAGE_TITLE_KEY.to_string(), json!("Inbox"));
		let state = HistoryEntryState::new(params, Params::new());
		assert_eq!(state.page_title(), Some("Inbox"));
	}

	#[test]
	fn test_scroll_omitted_when_absent() {
		let value = serde_json::to_value(HistoryEntryState::default())
			.expect("Failed to serialize entry state");
		assert_eq!(value, json!({"query": {}, "params": {}}));
	}
}
