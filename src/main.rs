use history_sync::history::{MemoryHistory, NativeHistory, Params};
use history_sync::host::{MemoryViewport, UnloadHook, UnloadHookError, Viewport};
use history_sync::navigation::{
	Action, NavigatePayload, NavigationDescriptor, NavigationType, RouteSnapshot,
};
use history_sync::sync::EarlyEventBuffer;
use history_sync::{HistorySyncError, HistorySynchronizer, SyncConfig};

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::from_default_env()
				.add_directive(tracing::Level::INFO.into()),
		)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.init();

	let config = match load_config(std::env::args().nth(1)) {
		Ok(config) => config,
		Err(e) => {
			error!("Failed to load configuration: {}", e);
			return;
		}
	};

	info!("Starting scripted navigation session");

	let history = Arc::new(MemoryHistory::new("/inbox"));
	let viewport = Arc::new(MemoryViewport::new());
	let pending: Arc<Mutex<Vec<NavigatePayload>>> = Arc::new(Mutex::new(Vec::new()));

	// Environment startup: capture anything that happens before the synchronizer exists.
	EarlyEventBuffer::global().install(history.clone());

	let sink = pending.clone();
	let sync = HistorySynchronizer::builder()
		.with_config(config)
		.with_history(history.clone())
		.with_viewport(viewport.clone())
		.with_dispatcher(Arc::new(move |action: Action, payload: NavigatePayload| {
			info!("Application received {} action: {:?}", action.name(), payload);
			sink.lock().unwrap_or_else(|e| e.into_inner()).push(payload);
		}))
		.with_route(RouteSnapshot::new("/inbox"))
		.mount();

	let sync = match sync {
		Ok(sync) => sync,
		Err(e) => {
			error!("Failed to mount history synchronizer: {}", e);
			return;
		}
	};

	let mut title = Params::new();
	title.insert("pageTitle".to_string(), serde_json::json!("Message 42"));
	sync.on_state_update(
		RouteSnapshot::new("/inbox/42").with_navigate(
			NavigationDescriptor::new(NavigationType::Click, "/inbox/42").with_params(title),
		),
	);
	info!("Navigated to {} ({:?})", history.url(), history.document_title());

	viewport.user_scroll(0.0, 640.0);
	tokio::time::sleep(Duration::from_millis(200)).await;
	info!("Stored scroll for {}: {:?}", history.url(), history.state().and_then(|s| s.scroll));

	history.back();
	apply_navigations(&sync, &pending);
	info!("Back at {}, viewport at {:?}", history.url(), viewport.scroll_position());

	let hook: UnloadHook =
		Arc::new(|| -> Result<String, UnloadHookError> { Ok("Discard draft?".to_string()) });
	viewport.set_unload_hook(Some(hook));
	viewport.answer_next_confirm(false);
	history.forward();
	apply_navigations(&sync, &pending);
	info!("After refused navigation the address bar shows {}", history.url());

	sync.unmount();
}

fn load_config(path: Option<String>) -> Result<SyncConfig, HistorySyncError> {
	match path {
		Some(path) => {
			let json = std::fs::read_to_string(&path).map_err(|e| {
				HistorySyncError::Config(format!("Failed to read {}: {}", path, e))
			})?;
			SyncConfig::from_json_str(&json)
		}
		None => Ok(SyncConfig::default()),
	}
}

/// Play the application's side: every dispatched navigation becomes the new route.
fn apply_navigations(sync: &HistorySynchronizer, pending: &Mutex<Vec<NavigatePayload>>) {
	let payloads: Vec<NavigatePayload> =
		std::mem::take(&mut *pending.lock().unwrap_or_else(|e| e.into_inner()));
	for payload in payloads {
		let navigate = NavigationDescriptor::new(payload.nav_type, payload.url.clone())
			.with_params(payload.params.unwrap_or_default())
			.with_query(payload.query.unwrap_or_default());
		sync.on_state_update(RouteSnapshot::new(payload.url).with_navigate(navigate));
	}
}
