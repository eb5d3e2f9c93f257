//! Buffer for history changes that happen before a synchronizer is mounted.
//!
//! The buffering listener is installed when the host environment becomes available and
//! keeps only the most recent event. The first synchronizer to mount removes the
//! listener and replays whatever was captured.

use crate::history::{ListenerId, NativeHistory, PopstateEvent};

use std::sync::{Arc, Mutex, OnceLock};
use tracing::debug;

#[derive(Default)]
struct Slot {
	source: Option<(Arc<dyn NativeHistory>, ListenerId)>,
	event: Option<PopstateEvent>,
}

/// Single-slot, latest-wins event buffer
#[derive(Default)]
pub struct EarlyEventBuffer {
	slot: Arc<Mutex<Slot>>,
}

impl EarlyEventBuffer {
	pub fn new() -> Self {
		Self::default()
	}

	/// The process-wide buffer used when a synchronizer is not given its own.
	pub fn global() -> Arc<EarlyEventBuffer> {
		static GLOBAL: OnceLock<Arc<EarlyEventBuffer>> = OnceLock::new();
		GLOBAL.get_or_init(|| Arc::new(EarlyEventBuffer::new())).clone()
	}

	/// Start capturing change events from `history`.
	///
	/// Does nothing when the host lacks push support or a listener is already installed.
	/// Returns whether a listener is now installed.
	pub fn install(&self, history: Arc<dyn NativeHistory>) -> bool {
		if !history.supports_push_state() {
			debug!("Push state unsupported, early event buffer not installed");
			return false;
		}

		let mut slot = self.lock();
		if slot.source.is_some() {
			return true;
		}

		let sink = Arc::downgrade(&self.slot);
		let id = history.subscribe(Arc::new(move |event: &PopstateEvent| {
			if let Some(slot) = sink.upgrade() {
				let mut slot = slot.lock().unwrap_or_else(|e| e.into_inner());
				if slot.event.is_some() {
					debug!("Early history event superseded by a newer one");
				}
				slot.event = Some(event.clone());
			}
		}));
		slot.source = Some((history, id));
		true
	}

	pub fn is_installed(&self) -> bool {
		self.lock().source.is_some()
	}

	/// Remove the buffering listener and hand out the captured event, if any.
	///
	/// After this call the buffer is empty; a second drain returns `None`.
	pub fn drain(&self) -> Option<PopstateEvent> {
		let (source, event) = {
			let mut slot = self.lock();
			(slot.source.take(), slot.event.take())
		};
		if let Some((history, id)) = source {
			history.unsubscribe(id);
		}
		event
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, Slot> {
		self.slot.lock().unwrap_or_else(|e| e.into_inner())
	}
}
