//! Full-stack webview tests: panel handles, document rendering, and the
//! message bridge working against one runtime.

use std::sync::{Arc, Mutex};

use ext_backend::{FileStateStore, LocalBackend, MemoryStateStore, SettingsStore, StateKey, StateStore};
use ext_compat::{CompatApi, EnvApi, HostServices, ViewColumn, WebviewOptions};
use ext_manifest::SharedContributionIndex;
use ext_runtime::{ExtensionRuntime, HostEvent};
use ext_test_utils::{ExtensionFixture, ManifestBuilder};
use ext_webview::{Delivery, WebviewBridge};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn services(fixture: &ExtensionFixture) -> HostServices {
    ext_test_utils::logging::init();
    HostServices {
        runtime: Arc::new(ExtensionRuntime::with_storage_root(fixture.storage_root())),
        backend: Arc::new(LocalBackend::new(fixture.root())),
        settings: Arc::new(SettingsStore::in_memory()),
        contributions: Arc::new(SharedContributionIndex::new()),
        env: Arc::new(EnvApi::new()),
        workspace_folders: vec![fixture.root().to_path_buf()],
    }
}

async fn activated_api(fixture: &ExtensionFixture, services: &HostServices) -> CompatApi {
    let builder = ManifestBuilder::new("acme", "dashboard");
    let dir = fixture.install(&builder);
    assert!(services.runtime.activate_extension(&builder.id(), &dir).await);
    CompatApi::build(&builder.id(), &dir, services)
}

fn scripted() -> WebviewOptions {
    WebviewOptions {
        enable_scripts: true,
        ..WebviewOptions::default()
    }
}

#[tokio::test]
async fn dashboard_round_trip_from_activation_to_reload() {
    let fixture = ExtensionFixture::new();
    let services = services(&fixture);
    let api = activated_api(&fixture, &services).await;
    let bridge = WebviewBridge::new(
        Arc::clone(&services.runtime),
        Arc::new(MemoryStateStore::new()),
    );

    let handle = api.window.create_webview_panel(
        "dashboard",
        "Dashboard",
        ViewColumn::One,
        scripted(),
    );
    handle.set_html("<h1>Build status</h1>");

    let inbox: Arc<Mutex<Vec<Value>>> = Arc::default();
    let sink = Arc::clone(&inbox);
    handle.on_did_receive_message(move |message| {
        sink.lock().unwrap().push(message.clone());
    });

    // The hosting UI mounts the surface and renders the document.
    let token = bridge.mount(handle.id()).unwrap();
    let document = bridge.render_document(handle.id()).unwrap();
    assert!(document.contains("<h1>Build status</h1>"));
    assert!(document.contains("Content-Security-Policy"));
    assert!(document.contains("script-src 'unsafe-inline'"));
    assert!(document.contains("acquireVsCodeApi"));
    assert!(document.contains("var state = null"));

    // Page code posts toward the host.
    let outcome = bridge.deliver(
        handle.id(),
        &token,
        &json!({"source": "webview", "payload": {"command": "refresh"}}),
    );
    assert_eq!(outcome, Delivery::Forwarded);
    assert_eq!(*inbox.lock().unwrap(), vec![json!({"command": "refresh"})]);

    // Page code saves view state; it never reaches the extension.
    let outcome = bridge.deliver(
        handle.id(),
        &token,
        &json!({"source": "webview-state", "payload": {"tab": "failures"}}),
    );
    assert_eq!(outcome, Delivery::StateSaved);
    assert_eq!(inbox.lock().unwrap().len(), 1);

    // A rebuilt panel with the same view type renders the saved state.
    handle.dispose();
    assert!(!bridge.is_mounted(handle.id()));
    let reopened = api.window.create_webview_panel(
        "dashboard",
        "Dashboard",
        ViewColumn::One,
        scripted(),
    );
    reopened.set_html("<h1>Build status</h1>");
    let document = bridge.render_document(reopened.id()).unwrap();
    assert!(document.contains(r#"var state = {"tab":"failures"}"#));
}

#[tokio::test]
async fn outbound_messages_require_a_mounted_surface() {
    let fixture = ExtensionFixture::new();
    let services = services(&fixture);
    let api = activated_api(&fixture, &services).await;
    let bridge = WebviewBridge::new(
        Arc::clone(&services.runtime),
        Arc::new(MemoryStateStore::new()),
    );
    let handle = api.window.create_webview_panel(
        "dashboard",
        "Dashboard",
        ViewColumn::One,
        scripted(),
    );

    let posted: Arc<Mutex<Vec<Value>>> = Arc::default();
    let sink = Arc::clone(&posted);
    services.runtime.subscribe(move |event| {
        if let HostEvent::WebviewMessage { message, .. } = event {
            sink.lock().unwrap().push(message.clone());
        }
    });

    // No surface yet: the message is dropped, not queued.
    assert!(!handle.post_message(json!({"tick": 1})).await);
    assert!(posted.lock().unwrap().is_empty());

    bridge.mount(handle.id()).unwrap();
    assert!(handle.post_message(json!({"tick": 2})).await);
    assert_eq!(*posted.lock().unwrap(), vec![json!({"tick": 2})]);

    bridge.unmount(handle.id());
    assert!(!handle.post_message(json!({"tick": 3})).await);
    assert_eq!(posted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn stale_tokens_cannot_speak_for_a_remounted_surface() {
    let fixture = ExtensionFixture::new();
    let services = services(&fixture);
    let api = activated_api(&fixture, &services).await;
    let bridge = WebviewBridge::new(
        Arc::clone(&services.runtime),
        Arc::new(MemoryStateStore::new()),
    );
    let handle = api.window.create_webview_panel(
        "dashboard",
        "Dashboard",
        ViewColumn::One,
        scripted(),
    );
    let inbox: Arc<Mutex<Vec<Value>>> = Arc::default();
    let sink = Arc::clone(&inbox);
    handle.on_did_receive_message(move |message| {
        sink.lock().unwrap().push(message.clone());
    });

    let stale = bridge.mount(handle.id()).unwrap();
    let fresh = bridge.mount(handle.id()).unwrap();

    assert_eq!(
        bridge.deliver(handle.id(), &stale, &json!({"x": 1})),
        Delivery::Rejected
    );
    assert!(inbox.lock().unwrap().is_empty());
    assert_eq!(
        bridge.deliver(handle.id(), &fresh, &json!({"x": 1})),
        Delivery::Forwarded
    );
    assert_eq!(inbox.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn deactivation_disposes_panels_and_revokes_mounts() {
    let fixture = ExtensionFixture::new();
    let services = services(&fixture);
    let api = activated_api(&fixture, &services).await;
    let bridge = WebviewBridge::new(
        Arc::clone(&services.runtime),
        Arc::new(MemoryStateStore::new()),
    );
    let handle = api.window.create_webview_panel(
        "dashboard",
        "Dashboard",
        ViewColumn::One,
        scripted(),
    );
    let token = bridge.mount(handle.id()).unwrap();

    let disposed: Arc<Mutex<bool>> = Arc::default();
    let flag = Arc::clone(&disposed);
    handle.on_did_dispose(move || {
        *flag.lock().unwrap() = true;
    });

    services.runtime.deactivate_extension("acme.dashboard").await;

    assert!(handle.is_disposed());
    assert!(*disposed.lock().unwrap());
    assert!(!bridge.is_mounted(handle.id()));
    assert_eq!(
        bridge.deliver(handle.id(), &token, &json!({"x": 1})),
        Delivery::Rejected
    );
}

#[tokio::test]
async fn script_free_panels_render_without_script_src() {
    let fixture = ExtensionFixture::new();
    let services = services(&fixture);
    let api = activated_api(&fixture, &services).await;
    let bridge = WebviewBridge::new(
        Arc::clone(&services.runtime),
        Arc::new(MemoryStateStore::new()),
    );

    let handle = api.window.create_webview_panel(
        "help",
        "Help",
        ViewColumn::Two,
        WebviewOptions::default(),
    );
    handle.set_html("<p>Read the manual.</p>");

    let document = bridge.render_document(handle.id()).unwrap();
    assert!(document.contains("default-src 'none'"));
    assert!(!document.contains("script-src"));
    assert!(document.contains("<p>Read the manual.</p>"));
}

#[tokio::test]
async fn state_survives_a_full_host_restart() {
    let fixture = ExtensionFixture::new();
    let state_path = fixture.root().join("storage/webview-state.json");

    {
        let services = services(&fixture);
        let api = activated_api(&fixture, &services).await;
        let bridge = WebviewBridge::new(
            Arc::clone(&services.runtime),
            Arc::new(FileStateStore::load(&state_path)),
        );
        let handle = api.window.create_webview_panel(
            "dashboard",
            "Dashboard",
            ViewColumn::One,
            scripted(),
        );
        let token = bridge.mount(handle.id()).unwrap();
        bridge.deliver(
            handle.id(),
            &token,
            &json!({"source": "webview-state", "payload": {"zoom": 1.5}}),
        );
    }

    // Fresh services simulate a new host process over the same disk.
    let services = services(&fixture);
    let api = activated_api(&fixture, &services).await;
    let store = Arc::new(FileStateStore::load(&state_path));
    assert_eq!(
        store.get(&StateKey::new("acme.dashboard", "dashboard")),
        Some(json!({"zoom": 1.5}))
    );
    let bridge = WebviewBridge::new(Arc::clone(&services.runtime), store);
    let handle = api.window.create_webview_panel(
        "dashboard",
        "Dashboard",
        ViewColumn::One,
        scripted(),
    );
    handle.set_html("<h1>back</h1>");
    let document = bridge.render_document(handle.id()).unwrap();
    assert!(document.contains(r#"var state = {"zoom":1.5}"#));
}
