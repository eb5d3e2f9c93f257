use crate::history::{
    HistoryCall, HistoryEntryState, HistoryError, MemoryHistory, NativeHistory, Params,
    PopstateEvent, ScrollPosition,
};
use crate::host::{MemoryViewport, UnloadHook, UnloadHookError, Viewport};
use crate::navigation::{
    Action, NavigatePayload, NavigationDescriptor, NavigationType, RouteSnapshot,
};
use crate::sync::{EarlyEventBuffer, HistorySyncError, HistorySynchronizer, IgnorePopstate, SyncConfig};

use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct Harness {
    history: Arc<MemoryHistory>,
    viewport: Arc<MemoryViewport>,
    dispatched: Arc<Mutex<Vec<NavigatePayload>>>,
    buffer: Arc<EarlyEventBuffer>,
}

impl Harness {
    fn new(history: MemoryHistory) -> Self {
        Self {
            history: Arc::new(history),
            viewport: Arc::new(MemoryViewport::new()),
            dispatched: Arc::new(Mutex::new(Vec::new())),
            buffer: Arc::new(EarlyEventBuffer::new()),
        }
    }

    fn at(url: &str) -> Self {
        Self::new(MemoryHistory::new(url))
    }

    fn mount(&self, config: SyncConfig, route: RouteSnapshot) -> HistorySynchronizer {
        let sink = self.dispatched.clone();
        HistorySynchronizer::builder()
            .with_config(config)
            .with_history(self.history.clone())
            .with_viewport(self.viewport.clone())
            .with_dispatcher(Arc::new(move |action: Action, payload: NavigatePayload| {
                assert_eq!(action, Action::Navigate);
                sink.lock().unwrap().push(payload);
            }))
            .with_route(route)
            .with_early_buffer(self.buffer.clone())
            .mount()
            .expect("Failed to mount synchronizer")
    }

    fn dispatched(&self) -> Vec<NavigatePayload> {
        self.dispatched.lock().unwrap().clone()
    }

    fn set_unload_text(&self, text: &str) {
        let text = text.to_string();
        let hook: UnloadHook = Arc::new(move || -> Result<String, UnloadHookError> { Ok(text.clone()) });
        self.viewport.set_unload_hook(Some(hook));
    }
}

fn params(value: serde_json::Value) -> Params {
    serde_json::from_value(value).expect("Failed to build params")
}

fn click(url: &str) -> RouteSnapshot {
    RouteSnapshot::new(url).with_navigate(NavigationDescriptor::new(NavigationType::Click, url))
}

fn ignoring_page_load_popstate() -> SyncConfig {
    SyncConfig {
        ignore_popstate_on_page_load: IgnorePopstate::Always(true),
        ..SyncConfig::default()
    }
}

#[test]
fn test_click_pushes_entry_and_resets_scroll() {
    let harness = Harness::at("/a");
    let sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/a"));
    harness.viewport.scroll_to(0.0, 480.0);

    sync.on_state_update(click("/b"));

    let calls = harness.history.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0],
        HistoryCall::Push {
            state: HistoryEntryState::default().with_scroll(ScrollPosition::ORIGIN),
            title: None,
            url: "/b".to_string(),
        }
    );
    assert_eq!(harness.viewport.scroll_position(), ScrollPosition::ORIGIN);
    assert!(harness.dispatched().is_empty());
}

#[test]
fn test_sync_to_current_url_is_a_no_op() {
    let harness = Harness::at("/a");
    let sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/a"));

    for nav_type in [
        NavigationType::Click,
        NavigationType::Default,
        NavigationType::Replacestate,
    ] {
        sync.on_state_update(
            RouteSnapshot::new("/a").with_navigate(NavigationDescriptor::new(nav_type, "/a")),
        );
    }

    assert!(harness.history.calls().is_empty());
    assert!(harness.viewport.scroll_to_calls().is_empty());
    assert!(harness.dispatched().is_empty());
}

#[test]
fn test_replacestate_replaces_with_page_title() {
    let harness = Harness::at("/a");
    let sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/a"));

    let navigate = NavigationDescriptor::new(NavigationType::Replacestate, "/a?tab=2")
        .with_params(params(json!({"pageTitle": "Settings"})))
        .with_query(params(json!({"tab": "2"})));
    sync.on_state_update(RouteSnapshot::new("/a?tab=2").with_navigate(navigate));

    assert_eq!(harness.history.push_count(), 0);
    assert_eq!(harness.history.entries().len(), 1);
    assert_eq!(harness.history.url(), "/a?tab=2");
    assert_eq!(harness.history.document_title(), Some("Settings".to_string()));
    let state = harness.history.state().expect("Entry should carry state");
    assert_eq!(state.query.get("tab"), Some(&json!("2")));
    assert_eq!(state.page_title(), Some("Settings"));
}

#[test]
fn test_preserve_scroll_records_offset_without_moving() {
    let harness = Harness::at("/a");
    let sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/a"));
    harness.viewport.scroll_to(0.0, 300.0);

    sync.on_state_update(
        RouteSnapshot::new("/b").with_navigate(
            NavigationDescriptor::new(NavigationType::Default, "/b").preserving_scroll(),
        ),
    );

    assert_eq!(harness.viewport.scroll_to_calls().len(), 1);
    assert_eq!(harness.viewport.scroll_position(), ScrollPosition::new(0.0, 300.0));
    let state = harness.history.state().expect("Entry should carry state");
    assert_eq!(state.scroll, Some(ScrollPosition::new(0.0, 300.0)));
}

#[test]
fn test_scroll_disabled_still_records_origin() {
    let harness = Harness::at("/a");
    let config = SyncConfig {
        enable_scroll: false,
        ..SyncConfig::default()
    };
    let sync = harness.mount(config, RouteSnapshot::new("/a"));
    harness.viewport.scroll_to(0.0, 90.0);

    sync.on_state_update(click("/b"));
    assert_eq!(harness.viewport.scroll_position(), ScrollPosition::new(0.0, 90.0));
    assert_eq!(
        harness.history.state().and_then(|s| s.scroll),
        Some(ScrollPosition::ORIGIN)
    );

    sync.on_state_update(
        RouteSnapshot::new("/b")
            .with_navigate(NavigationDescriptor::new(NavigationType::Popstate, "/b")),
    );
    assert_eq!(harness.viewport.scroll_to_calls().len(), 1);
}

#[test]
fn test_scroll_not_stored_when_persistence_disabled() {
    let harness = Harness::at("/a");
    let config = SyncConfig {
        save_scroll_in_state: false,
        ..SyncConfig::default()
    };
    let sync = harness.mount(config, RouteSnapshot::new("/a"));
    assert_eq!(harness.viewport.scroll_listener_count(), 0);

    sync.on_state_update(click("/b"));
    assert_eq!(harness.history.state().and_then(|s| s.scroll), None);
    assert_eq!(harness.viewport.scroll_position(), ScrollPosition::ORIGIN);
}

#[test]
fn test_popstate_sync_restores_origin_after_push() {
    let harness = Harness::at("/a");
    let sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/a"));

    sync.on_state_update(click("/b"));
    harness.viewport.scroll_to(0.0, 120.0);
    sync.on_state_update(
        RouteSnapshot::new("/b")
            .with_navigate(NavigationDescriptor::new(NavigationType::Popstate, "/b")),
    );

    assert_eq!(harness.viewport.scroll_position(), ScrollPosition::ORIGIN);
}

#[test]
fn test_back_restores_saved_scroll() {
    let harness = Harness::at("/a");
    let sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/a"));

    harness.viewport.scroll_to(0.0, 250.0);
    sync.save_scroll_position();
    sync.on_state_update(click("/b"));

    assert!(harness.history.back());
    assert_eq!(
        harness.dispatched(),
        vec![NavigatePayload::popstate(
            "/a",
            Some(Params::new()),
            Some(Params::new())
        )]
    );

    sync.on_state_update(
        RouteSnapshot::new("/a")
            .with_navigate(NavigationDescriptor::new(NavigationType::Popstate, "/a")),
    );
    assert_eq!(harness.viewport.scroll_position(), ScrollPosition::new(0.0, 250.0));
}

#[test]
fn test_popstate_restore_defaults_to_origin_without_stored_scroll() {
    let harness = Harness::at("/a");
    let sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/a"));
    harness.viewport.scroll_to(10.0, 10.0);

    sync.on_state_update(
        RouteSnapshot::new("/a")
            .with_navigate(NavigationDescriptor::new(NavigationType::Popstate, "/a")),
    );
    assert_eq!(harness.viewport.scroll_position(), ScrollPosition::ORIGIN);
}

#[test]
fn test_repeated_descriptor_syncs_once() {
    let harness = Harness::at("/a");
    let sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/a"));

    sync.on_state_update(click("/b"));
    sync.on_state_update(click("/b"));
    sync.on_state_update(RouteSnapshot::new("/b"));

    assert_eq!(harness.history.push_count(), 1);
}

#[test]
fn test_pageload_descriptor_writes_nothing() {
    let harness = Harness::at("/a");
    let sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/a"));

    sync.on_state_update(
        RouteSnapshot::new("/b")
            .with_navigate(NavigationDescriptor::new(NavigationType::Pageload, "/b")),
    );
    assert!(harness.history.calls().is_empty());
}

#[test]
fn test_popstate_dispatches_state_params() {
    let state = HistoryEntryState::new(params(json!({"id": 1})), Params::new());
    let history = MemoryHistory::new("/item/0");
    history.push_state(state.clone(), None, "/item/1").unwrap();
    history.back();
    let harness = Harness::new(history);
    let _sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/item/0"));

    harness.history.forward();

    assert_eq!(
        harness.dispatched(),
        vec![NavigatePayload::popstate(
            "/item/1",
            Some(params(json!({"id": 1}))),
            Some(Params::new())
        )]
    );
    let payload = serde_json::to_value(&harness.dispatched()[0]).unwrap();
    assert_eq!(
        payload,
        json!({"type": "popstate", "url": "/item/1", "params": {"id": 1}, "query": {}})
    );
}

#[test]
fn test_popstate_without_state_dispatches_without_params() {
    let harness = Harness::at("/a");
    let sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/elsewhere"));

    sync.handle_history_change(&PopstateEvent::new(None));

    assert_eq!(
        harness.dispatched(),
        vec![NavigatePayload::popstate("/a", None, None)]
    );
}

#[test]
fn test_popstate_to_current_route_is_ignored() {
    let harness = Harness::at("/a");
    let _sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/a"));

    harness.history.emit_popstate(Some(HistoryEntryState::default()));
    assert!(harness.dispatched().is_empty());
}

#[test]
fn test_page_load_popstate_is_suppressed() {
    let harness = Harness::at("/a");
    let sync = harness.mount(ignoring_page_load_popstate(), RouteSnapshot::new("/other"));

    // Mount seeded the first entry, so the stack now reports a state.
    assert_eq!(harness.history.state(), Some(HistoryEntryState::default()));
    assert_eq!(harness.history.replace_count(), 1);

    harness.history.emit_popstate(None);
    assert!(harness.dispatched().is_empty());
    assert_eq!(sync.stats().suppressed_popstates, 1);

    harness.history.emit_popstate(Some(HistoryEntryState::default()));
    assert_eq!(harness.dispatched().len(), 1);
}

#[test]
fn test_seed_skipped_when_state_present_or_not_ignoring() {
    let seeded = HistoryEntryState::new(params(json!({"id": 7})), Params::new());
    let harness = Harness::new(MemoryHistory::with_initial_state("/a", Some(seeded.clone())));
    let _sync = harness.mount(ignoring_page_load_popstate(), RouteSnapshot::new("/a"));
    assert!(harness.history.calls().is_empty());
    assert_eq!(harness.history.state(), Some(seeded));

    let harness = Harness::at("/a");
    let sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/a"));
    assert!(!sync.ignores_page_load_popstate());
    assert!(harness.history.calls().is_empty());
    assert_eq!(harness.history.state(), None);
}

#[test]
fn test_ignore_predicate_resolved_once() {
    let evaluations = Arc::new(AtomicUsize::new(0));
    let counter = evaluations.clone();
    let config = SyncConfig {
        ignore_popstate_on_page_load: IgnorePopstate::when(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        }),
        ..SyncConfig::default()
    };
    let harness = Harness::at("/a");
    let sync = harness.mount(config, RouteSnapshot::new("/a"));

    harness.history.emit_popstate(None);
    harness.history.emit_popstate(None);

    assert!(sync.ignores_page_load_popstate());
    assert_eq!(evaluations.load(Ordering::SeqCst), 1);
    assert_eq!(sync.stats().suppressed_popstates, 2);
}

#[test]
fn test_denied_navigation_pushes_current_route_back() {
    let harness = Harness::at("/a");
    let sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/a"));
    let navigate = NavigationDescriptor::new(NavigationType::Click, "/b")
        .with_params(params(json!({"pageTitle": "Draft"})));
    sync.on_state_update(RouteSnapshot::new("/b").with_navigate(navigate));

    harness.set_unload_text("You have unsaved changes");
    harness.viewport.answer_next_confirm(false);
    harness.viewport.scroll_to(0.0, 64.0);
    harness.history.back();

    assert!(harness.dispatched().is_empty());
    assert_eq!(harness.viewport.prompts(), vec!["You have unsaved changes"]);
    assert_eq!(
        harness.history.calls().last(),
        Some(&HistoryCall::Push {
            state: HistoryEntryState::new(params(json!({"pageTitle": "Draft"})), Params::new())
                .with_scroll(ScrollPosition::new(0.0, 64.0)),
            title: Some("Draft".to_string()),
            url: "/b".to_string(),
        })
    );
    assert_eq!(harness.history.url(), "/b");
    assert!(harness.viewport.has_unload_hook());
    assert_eq!(sync.stats().denied_navigations, 1);
}

#[test]
fn test_denied_navigation_omits_scroll_when_persistence_disabled() {
    let harness = Harness::at("/a");
    let config = SyncConfig {
        save_scroll_in_state: false,
        ..SyncConfig::default()
    };
    let sync = harness.mount(config, RouteSnapshot::new("/a"));
    sync.on_state_update(click("/b"));

    harness.set_unload_text("You have unsaved changes");
    harness.viewport.answer_next_confirm(false);
    harness.viewport.scroll_to(0.0, 64.0);
    harness.history.back();

    assert!(harness.dispatched().is_empty());
    match harness.history.calls().last() {
        Some(HistoryCall::Push { state, url, .. }) => {
            assert_eq!(url, "/b");
            assert_eq!(state.scroll, None);
        }
        other => panic!("Expected a compensating push, got {:?}", other),
    }
    assert_eq!(harness.history.state().and_then(|s| s.scroll), None);
}

#[test]
fn test_identical_descriptor_is_not_synced_twice() {
    let harness = Harness::at("/a");
    let sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/a"));
    harness
        .history
        .fail_next_mutation(HistoryError::SecurityError("cross-origin url".to_string()));

    sync.on_state_update(click("/b"));
    sync.on_state_update(click("/b"));

    assert_eq!(harness.history.url(), "/a");
    assert_eq!(sync.stats().failed_mutations, 1);
}

#[test]
fn test_granted_navigation_clears_unload_hook() {
    let harness = Harness::at("/a");
    let sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/a"));
    sync.on_state_update(click("/b"));

    harness.set_unload_text("Leave?");
    harness.viewport.answer_next_confirm(true);
    harness.history.back();

    assert_eq!(harness.dispatched().len(), 1);
    assert_eq!(harness.dispatched()[0].url, "/a");
    assert!(!harness.viewport.has_unload_hook());
}

#[test]
fn test_failing_unload_hook_counts_as_no_text() {
    let harness = Harness::at("/a");
    let _sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/b"));
    let hook: UnloadHook =
        Arc::new(|| -> Result<String, UnloadHookError> { Err("hook exploded".into()) });
    harness.viewport.set_unload_hook(Some(hook));

    harness.history.emit_popstate(Some(HistoryEntryState::default()));

    assert!(harness.viewport.prompts().is_empty());
    assert_eq!(harness.dispatched().len(), 1);
}

#[test]
fn test_empty_unload_text_skips_prompt() {
    let harness = Harness::at("/a");
    let _sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/b"));
    harness.set_unload_text("");
    harness.viewport.answer_next_confirm(false);

    harness.history.emit_popstate(Some(HistoryEntryState::default()));

    assert!(harness.viewport.prompts().is_empty());
    assert_eq!(harness.dispatched().len(), 1);
}

#[test]
fn test_check_route_on_page_load() {
    let config = SyncConfig {
        check_route_on_page_load: true,
        ..SyncConfig::default()
    };

    let harness = Harness::at("/docs#install");
    let _sync = harness.mount(config.clone(), RouteSnapshot::new("/docs"));
    assert_eq!(
        harness.dispatched(),
        vec![NavigatePayload::pageload("/docs#install")]
    );

    let harness = Harness::at("/docs");
    let _sync = harness.mount(config, RouteSnapshot::new("/docs"));
    assert!(harness.dispatched().is_empty());

    let harness = Harness::at("/docs#install");
    let _sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/docs"));
    assert!(harness.dispatched().is_empty());
}

#[test]
fn test_early_event_replayed_at_mount() {
    let harness = Harness::at("/a");
    harness.buffer.install(harness.history.clone());
    harness
        .history
        .emit_popstate(Some(HistoryEntryState::new(params(json!({"n": 1})), Params::new())));
    harness
        .history
        .emit_popstate(Some(HistoryEntryState::new(params(json!({"n": 2})), Params::new())));

    let _sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/loading"));

    assert_eq!(
        harness.dispatched(),
        vec![NavigatePayload::popstate(
            "/a",
            Some(params(json!({"n": 2}))),
            Some(Params::new())
        )]
    );
    assert!(!harness.buffer.is_installed());
    assert_eq!(harness.history.listener_count(), 1);
}

#[test]
fn test_unmount_releases_listeners() {
    let harness = Harness::at("/a");
    let sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/b"));
    assert_eq!(harness.history.listener_count(), 1);
    assert_eq!(harness.viewport.scroll_listener_count(), 1);

    sync.unmount();

    assert_eq!(harness.history.listener_count(), 0);
    assert_eq!(harness.viewport.scroll_listener_count(), 0);
    harness.history.emit_popstate(None);
    assert!(harness.dispatched().is_empty());
}

#[test]
fn test_rejected_push_is_counted_not_raised() {
    let harness = Harness::at("/a");
    let sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/a"));
    harness
        .history
        .fail_next_mutation(HistoryError::SecurityError("cross-origin url".to_string()));

    sync.on_state_update(click("https://evil.example/b"));

    let stats = sync.stats();
    assert_eq!(stats.failed_mutations, 1);
    assert_eq!(stats.pushes, 0);
    assert_eq!(harness.history.url(), "/a");
}

#[test]
fn test_mount_requires_capabilities() {
    let result = HistorySynchronizer::builder()
        .with_history(Arc::new(MemoryHistory::new("/")))
        .with_early_buffer(Arc::new(EarlyEventBuffer::new()))
        .mount();
    assert!(matches!(
        result,
        Err(HistorySyncError::MissingCapability("viewport"))
    ));
}

#[test]
fn test_identical_scroll_saves_write_once() {
    let harness = Harness::at("/a");
    let sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/a"));
    harness.viewport.scroll_to(0.0, 42.0);

    sync.save_scroll_position();
    sync.save_scroll_position();

    assert_eq!(harness.history.replace_count(), 1);
    assert_eq!(
        harness.history.state().and_then(|s| s.scroll),
        Some(ScrollPosition::new(0.0, 42.0))
    );
    let stats = sync.stats();
    assert_eq!(stats.scroll_saves, 1);
    assert_eq!(stats.scroll_saves_skipped, 1);
}

#[test]
fn test_scroll_save_keeps_other_state() {
    let state = HistoryEntryState::new(params(json!({"id": 3})), params(json!({"q": "x"})));
    let harness = Harness::new(MemoryHistory::with_initial_state("/a", Some(state)));
    let sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/a"));
    harness.viewport.scroll_to(5.0, 6.0);

    sync.save_scroll_position();

    let stored = harness.history.state().expect("Entry should carry state");
    assert_eq!(stored.params.get("id"), Some(&json!(3)));
    assert_eq!(stored.query.get("q"), Some(&json!("x")));
    assert_eq!(stored.scroll, Some(ScrollPosition::new(5.0, 6.0)));
    assert_eq!(harness.history.url(), "/a");
}

#[test]
fn test_scroll_without_runtime_saves_immediately() {
    let harness = Harness::at("/a");
    let sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/a"));

    harness.viewport.user_scroll(0.0, 77.0);

    assert!(!sync.has_pending_scroll_save());
    assert_eq!(
        harness.history.state().and_then(|s| s.scroll),
        Some(ScrollPosition::new(0.0, 77.0))
    );
}

#[tokio::test(start_paused = true)]
async fn test_scroll_burst_collapses_to_one_write() {
    let harness = Harness::at("/a");
    let sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/a"));

    for y in [10.0, 20.0, 30.0, 40.0] {
        harness.viewport.user_scroll(0.0, y);
        tokio::time::advance(Duration::from_millis(50)).await;
    }
    assert!(sync.has_pending_scroll_save());
    assert_eq!(harness.history.replace_count(), 0);

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(harness.history.replace_count(), 1);
    assert_eq!(
        harness.history.state().and_then(|s| s.scroll),
        Some(ScrollPosition::new(0.0, 40.0))
    );
    assert!(!sync.has_pending_scroll_save());
}

#[tokio::test(start_paused = true)]
async fn test_unmount_cancels_pending_scroll_save() {
    let harness = Harness::at("/a");
    let sync = harness.mount(SyncConfig::default(), RouteSnapshot::new("/a"));

    harness.viewport.user_scroll(0.0, 500.0);
    assert!(sync.has_pending_scroll_save());
    sync.unmount();

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(harness.history.calls().is_empty());
}
