use crate::history::HistoryError;

/// Errors returned to callers of the synchronizer.
///
/// Event handlers never return these; failures inside a handler are logged and counted.
#[derive(Debug, thiserror::Error)]
pub enum HistorySyncError {
	#[error("Missing capability: {0}")]
	MissingCapability(&'static str),

	#[error("Configuration error: {0}")]
	Config(String),

	#[error("History error: {0}")]
	History(#[from] HistoryError),
}

impl From<serde_json::Error> for HistorySyncError {
	fn from(e: serde_json::Error) -> Self {
		HistorySyncError::Config(format!("Failed to parse configuration: {}", e))
	}
}
