//! End-to-end activation lifecycle tests.
//!
//! These exercise the complete flow: manifest loading with localization,
//! entry point execution against the compatibility API, storage creation,
//! and the release of every registration on deactivation or rollback.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ext_backend::{LocalBackend, SettingsStore};
use ext_compat::{CompatApi, HostServices};
use ext_manifest::SharedContributionIndex;
use ext_runtime::{ExtensionContext, ExtensionEntryPoint, ExtensionRuntime, command_fn};
use ext_test_utils::{ExtensionFixture, ManifestBuilder};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn services(fixture: &ExtensionFixture) -> HostServices {
    ext_test_utils::logging::init();
    HostServices {
        runtime: Arc::new(ExtensionRuntime::with_storage_root(fixture.storage_root())),
        backend: Arc::new(LocalBackend::new(fixture.root())),
        settings: Arc::new(SettingsStore::in_memory()),
        contributions: Arc::new(SharedContributionIndex::new()),
        env: Arc::new(ext_compat::EnvApi::new()),
        workspace_folders: vec![fixture.root().to_path_buf()],
    }
}

fn collect_events(runtime: &ExtensionRuntime) -> Arc<Mutex<Vec<String>>> {
    let log: Arc<Mutex<Vec<String>>> = Arc::default();
    let sink = Arc::clone(&log);
    runtime.subscribe(move |event| {
        sink.lock().unwrap().push(event.name().to_string());
    });
    log
}

/// Entry point that wires a command and a panel through the compat API,
/// the way a scripted extension's `activate` would.
struct DemoEntry {
    services: HostServices,
    fail: bool,
}

#[async_trait]
impl ExtensionEntryPoint for DemoEntry {
    async fn activate(&self, context: Arc<ExtensionContext>) -> ext_runtime::Result<Value> {
        if self.fail {
            return Err(ext_runtime::Error::callback("activate exploded"));
        }
        let api = CompatApi::build(
            context.extension_id(),
            context.extension_path(),
            &self.services,
        );
        let registration = api.commands.register_command(
            "demo.hello",
            command_fn(|_args| Ok(json!("hello"))),
        );
        context.push_subscription(registration);
        Ok(json!({"ready": true}))
    }
}

#[tokio::test]
async fn activation_creates_record_storage_and_event() {
    let fixture = ExtensionFixture::new();
    let dir = fixture.install_with_nls(
        &ManifestBuilder::new("acme", "demo").display_name("%ext.title%"),
        &json!({"ext.title": "Demo Extension"}),
    );
    let services = services(&fixture);
    let events = collect_events(&services.runtime);

    assert!(services.runtime.activate_extension("acme.demo", &dir).await);
    assert!(services.runtime.is_extension_active("acme.demo"));

    let record = services.runtime.active_extension("acme.demo").unwrap();
    assert_eq!(record.manifest().display_label(), "Demo Extension");
    assert!(record.context().storage_path().is_dir());
    assert!(record.context().global_storage_path().is_dir());

    assert_eq!(*events.lock().unwrap(), vec!["extension-activated"]);

    // Activating again is a no-op that still reports success.
    assert!(services.runtime.activate_extension("acme.demo", &dir).await);
    assert_eq!(events.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_manifest_fails_activation_without_side_effects() {
    let fixture = ExtensionFixture::new();
    let dir = fixture.install_json("acme.broken", "{ not json at all");
    let services = services(&fixture);
    let events = collect_events(&services.runtime);

    assert!(!services.runtime.activate_extension("acme.broken", &dir).await);
    assert!(!services.runtime.is_extension_active("acme.broken"));
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_required_manifest_fields_fail_activation() {
    let fixture = ExtensionFixture::new();
    let dir = fixture.install_json("acme.anonymous", r#"{"version": "1.0.0"}"#);
    let services = services(&fixture);

    assert!(
        !services
            .runtime
            .activate_extension("acme.anonymous", &dir)
            .await
    );
}

#[tokio::test]
async fn entry_point_exports_become_visible() {
    let fixture = ExtensionFixture::new();
    let dir = fixture.install(&ManifestBuilder::new("acme", "demo").main("./out/extension.js"));
    let services = services(&fixture);
    services.runtime.register_entry_point(
        "acme.demo",
        Arc::new(DemoEntry {
            services: services.clone(),
            fail: false,
        }),
    );

    assert!(services.runtime.activate_extension("acme.demo", &dir).await);
    assert_eq!(
        services.runtime.extension_exports("acme.demo"),
        Some(json!({"ready": true}))
    );
    assert_eq!(
        services
            .runtime
            .execute_command("demo.hello", &[])
            .await
            .unwrap(),
        Some(json!("hello"))
    );
}

#[tokio::test]
async fn failing_entry_point_rolls_activation_back() {
    let fixture = ExtensionFixture::new();
    let dir = fixture.install(&ManifestBuilder::new("acme", "demo").main("./out/extension.js"));
    let services = services(&fixture);
    let events = collect_events(&services.runtime);
    services.runtime.register_entry_point(
        "acme.demo",
        Arc::new(DemoEntry {
            services: services.clone(),
            fail: true,
        }),
    );

    assert!(!services.runtime.activate_extension("acme.demo", &dir).await);
    assert!(!services.runtime.is_extension_active("acme.demo"));
    // A rollback is not a deactivation: neither event may surface.
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn deactivation_releases_every_registration() {
    let fixture = ExtensionFixture::new();
    let dir = fixture.install(&ManifestBuilder::new("acme", "demo").main("./out/extension.js"));
    let services = services(&fixture);
    services.runtime.register_entry_point(
        "acme.demo",
        Arc::new(DemoEntry {
            services: services.clone(),
            fail: false,
        }),
    );
    assert!(services.runtime.activate_extension("acme.demo", &dir).await);

    let panel = services.runtime.create_webview_panel(
        "acme.demo",
        "dashboard",
        "Dashboard",
        Default::default(),
    );
    let events = collect_events(&services.runtime);

    services.runtime.deactivate_extension("acme.demo").await;

    assert!(!services.runtime.is_extension_active("acme.demo"));
    assert!(panel.is_disposed());
    assert_eq!(
        services.runtime.execute_command("demo.hello", &[]).await.unwrap(),
        None
    );
    assert_eq!(
        *events.lock().unwrap(),
        vec!["webview-disposed", "extension-deactivated"]
    );

    // The extension can come back up afterwards.
    assert!(services.runtime.activate_extension("acme.demo", &dir).await);
    assert_eq!(
        services
            .runtime
            .execute_command("demo.hello", &[])
            .await
            .unwrap(),
        Some(json!("hello"))
    );
}

#[tokio::test]
async fn scanned_contributions_feed_the_shared_index() {
    let fixture = ExtensionFixture::new();
    fixture.install(
        &ManifestBuilder::new("acme", "markdown")
            .contribute(
                "commands",
                json!([{"command": "markdown.preview", "title": "Open Preview"}]),
            )
            .contribute(
                "configuration",
                json!({
                    "title": "Markdown",
                    "properties": {
                        "markdown.previewTheme": {"type": "string", "default": "github"}
                    }
                }),
            ),
    );
    fixture.install(&ManifestBuilder::new("acme", "themes").contribute(
        "themes",
        json!([{"label": "Night", "uiTheme": "vs-dark", "path": "./themes/night.json"}]),
    ));
    fixture.write_file(
        "extensions/acme.themes/themes/night.json",
        r##"{"colors": {"editor.background": "#1e1e2e"}}"##,
    );

    let installed = ext_manifest::scan_extensions_dir(&fixture.extensions_dir()).unwrap();
    assert_eq!(installed.len(), 2);

    let index = SharedContributionIndex::new();
    index.rebuild(&installed);
    let snapshot = index.snapshot();
    assert_eq!(
        snapshot.configuration_default("markdown.previewTheme"),
        Some(&json!("github"))
    );
    assert!(
        snapshot
            .commands()
            .iter()
            .any(|indexed| indexed.contribution.command == "markdown.preview")
    );
    assert_eq!(snapshot.themes().len(), 1);
}
