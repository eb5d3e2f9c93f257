//! Navigation types exchanged with the application

use crate::history::{Params, page_title};

use serde::{Deserialize, Serialize};

/// How a navigation came about
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationType {
	/// A link click inside the application
	Click,
	/// Route recovered from the URL at mount time
	Pageload,
	/// Navigation that overwrites the active entry
	Replacestate,
	/// Back/forward traversal of the native stack
	Popstate,
	/// Programmatic navigation without a more specific type
	#[default]
	Default,
}

impl NavigationType {
	/// Types that write to the native stack when synced outbound
	pub fn mutates_history(&self) -> bool {
		matches!(
			self,
			NavigationType::Click | NavigationType::Default | NavigationType::Replacestate
		)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			NavigationType::Click => "click",
			NavigationType::Pageload => "pageload",
			NavigationType::Replacestate => "replacestate",
			NavigationType::Popstate => "popstate",
			NavigationType::Default => "default",
		}
	}
}

/// The application's description of its latest navigation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationDescriptor {
	#[serde(rename = "type", default)]
	pub nav_type: NavigationType,
	pub url: String,
	#[serde(default)]
	pub params: Params,
	#[serde(default)]
	pub query: Params,
	#[serde(default)]
	pub preserve_scroll_position: bool,
}

impl NavigationDescriptor {
	pub fn new(nav_type: NavigationType, url: impl Into<String>) -> Self {
		Self {
			nav_type,
			url: url.into(),
			..Default::default()
		}
	}

	pub fn with_params(mut self, params: Params) -> Self {
		self.params = params;
		self
	}

	pub fn with_query(mut self, query: Params) -> Self {
		self.query = query;
		self
	}

	pub fn preserving_scroll(mut self) -> Self {
		self.preserve_scroll_position = true;
		self
	}

	pub fn page_title(&self) -> Option<&str> {
		page_title(&self.params)
	}
}

/// The route the application currently renders
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentRoute {
	pub url: String,
}

/// What the application hands the synchronizer after each state update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteSnapshot {
	pub current_route: Option<CurrentRoute>,
	pub current_navigate: Option<NavigationDescriptor>,
}

impl RouteSnapshot {
	pub fn new(route_url: impl Into<String>) -> Self {
		Self {
			current_route: Some(CurrentRoute {
				url: route_url.into(),
			}),
			current_navigate: None,
		}
	}

	pub fn with_navigate(mut self, navigate: NavigationDescriptor) -> Self {
		self.current_navigate = Some(navigate);
		self
	}

	pub fn route_url(&self) -> Option<&str> {
		self.current_route.as_ref().map(|r| r.url.as_str())
	}
}

/// Payload of a navigation requested by the synchronizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigatePayload {
	#[serde(rename = "type")]
	pub nav_type: NavigationType,
	pub url: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub params: Option<Params>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub query: Option<Params>,
}

impl NavigatePayload {
	pub fn pageload(url: impl Into<String>) -> Self {
		Self {
			nav_type: NavigationType::Pageload,
			url: url.into(),
			params: None,
			query: None,
		}
	}

	pub fn popstate(url: impl Into<String>, params: Option<Params>, query: Option<Params>) -> Self {
		Self {
			nav_type: NavigationType::Popstate,
			url: url.into(),
			params,
			query,
		}
	}
}

/// Actions the synchronizer can ask the application to execute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
	Navigate,
}

impl Action {
	pub fn name(&self) -> &'static str {
		match self {
			Action::Navigate => "navigate",
		}
	}
}

/// The application's action executor. Fire-and-forget from the synchronizer's side.
pub trait ActionDispatcher: Send + Sync {
	fn execute_action(&self, action: Action, payload: NavigatePayload);
}

impl<F> ActionDispatcher for F
where
	F: Fn(Action, NavigatePayload) + Send + Sync,
{
	fn execute_action(&self, action: Action, payload: NavigatePayload) {
		self(action, payload)
	}
}
