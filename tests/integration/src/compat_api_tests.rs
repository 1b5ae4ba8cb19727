//! Tests for the compatibility API surface handed to extensions.
//!
//! Each test builds a small host (runtime, backend, settings, contribution
//! index) and drives it exclusively through [`CompatApi`], the way extension
//! code would.

use std::sync::{Arc, Mutex};

use ext_backend::{LocalBackend, SettingsStore};
use ext_compat::{
    CompatApi, ConfigurationTarget, EnvApi, HostServices, StatusBarAlignment, Uri, ViewColumn,
};
use ext_manifest::SharedContributionIndex;
use ext_runtime::{ExtensionRuntime, HostEvent, MessageSeverity, command_fn};
use ext_test_utils::{ExtensionFixture, ManifestBuilder};
use pretty_assertions::assert_eq;
use serde_json::json;

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

async fn activated_api(
    fixture: &ExtensionFixture,
    services: &HostServices,
    publisher: &str,
    name: &str,
) -> CompatApi {
    let builder = ManifestBuilder::new(publisher, name);
    let dir = fixture.install(&builder);
    assert!(services.runtime.activate_extension(&builder.id(), &dir).await);
    CompatApi::build(&builder.id(), &dir, services)
}

fn collect_events(runtime: &ExtensionRuntime) -> Arc<Mutex<Vec<HostEvent>>> {
    let log: Arc<Mutex<Vec<HostEvent>>> = Arc::default();
    let sink = Arc::clone(&log);
    runtime.subscribe(move |event| {
        sink.lock().unwrap().push(event.clone());
    });
    log
}

#[tokio::test]
async fn commands_shadow_across_extensions_and_unshadow_on_deactivate() {
    let fixture = ExtensionFixture::new();
    let services = services(&fixture);
    let first = activated_api(&fixture, &services, "acme", "alpha").await;
    let second = activated_api(&fixture, &services, "acme", "beta").await;

    first
        .commands
        .register_command("fmt.run", command_fn(|_| Ok(json!("alpha"))));
    second
        .commands
        .register_command("fmt.run", command_fn(|_| Ok(json!("beta"))));

    // Newest registration wins while both are alive.
    assert_eq!(
        first.commands.execute_command("fmt.run", &[]).await.unwrap(),
        Some(json!("beta"))
    );

    // Dropping the shadowing extension restores the earlier handler.
    services.runtime.deactivate_extension("acme.beta").await;
    assert_eq!(
        first.commands.execute_command("fmt.run", &[]).await.unwrap(),
        Some(json!("alpha"))
    );

    services.runtime.deactivate_extension("acme.alpha").await;
    assert_eq!(
        first.commands.execute_command("fmt.run", &[]).await.unwrap(),
        None
    );
}

#[tokio::test]
async fn missing_commands_resolve_to_none_but_handler_errors_propagate() {
    let fixture = ExtensionFixture::new();
    let services = services(&fixture);
    let api = activated_api(&fixture, &services, "acme", "demo").await;

    assert_eq!(
        api.commands.execute_command("no.such.command", &[]).await.unwrap(),
        None
    );

    api.commands.register_command(
        "demo.fail",
        command_fn(|_| Err(ext_runtime::Error::callback("broken handler"))),
    );
    let error = api
        .commands
        .execute_command("demo.fail", &[])
        .await
        .unwrap_err();
    assert!(error.to_string().contains("broken handler"));
}

#[tokio::test]
async fn command_arguments_reach_the_handler() {
    let fixture = ExtensionFixture::new();
    let services = services(&fixture);
    let api = activated_api(&fixture, &services, "acme", "demo").await;

    api.commands.register_command(
        "math.sum",
        command_fn(|args| {
            let total: i64 = args.iter().filter_map(|v| v.as_i64()).sum();
            Ok(json!(total))
        }),
    );
    assert_eq!(
        api.commands
            .execute_command("math.sum", &[json!(2), json!(3), json!(4)])
            .await
            .unwrap(),
        Some(json!(9))
    );
    assert!(api.commands.get_commands().contains(&"math.sum".to_string()));
}

#[tokio::test]
async fn configuration_prefers_stored_values_over_contributed_defaults() {
    let fixture = ExtensionFixture::new();
    fixture.install(&ManifestBuilder::new("acme", "markdown").contribute(
        "configuration",
        json!({
            "title": "Markdown",
            "properties": {
                "markdown.previewTheme": {"type": "string", "default": "github"}
            }
        }),
    ));
    let services = services(&fixture);
    let installed = ext_manifest::scan_extensions_dir(&fixture.extensions_dir()).unwrap();
    services.contributions.rebuild(&installed);
    let api = activated_api(&fixture, &services, "acme", "markdown2").await;

    let config = api.workspace.get_configuration(Some("markdown"));
    assert_eq!(config.get("previewTheme"), Some(json!("github")));

    config
        .update("previewTheme", Some(json!("solarized")), ConfigurationTarget::Global)
        .await
        .unwrap();
    assert_eq!(config.get("previewTheme"), Some(json!("solarized")));

    // Removing the stored value falls back to the contributed default.
    config
        .update("previewTheme", None, ConfigurationTarget::Global)
        .await
        .unwrap();
    assert_eq!(config.get("previewTheme"), Some(json!("github")));
    assert_eq!(config.get("unknownKey"), None);
}

#[tokio::test]
async fn workspace_fs_round_trips_through_uris() {
    let fixture = ExtensionFixture::new();
    let services = services(&fixture);
    let api = activated_api(&fixture, &services, "acme", "demo").await;

    let uri = Uri::file(fixture.root().join("notes/todo.md"));
    api.workspace
        .fs()
        .write_file(&uri, b"- write tests\n")
        .await
        .unwrap();
    let content = api.workspace.fs().read_file(&uri).await.unwrap();
    assert_eq!(content, b"- write tests\n");

    let listing = api
        .workspace
        .fs()
        .read_directory(&Uri::file(fixture.root().join("notes")))
        .await
        .unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].0, "todo.md");

    let folders = api.workspace.workspace_folders();
    assert_eq!(folders.len(), 1);
    assert_eq!(folders[0].index, 0);
}

#[tokio::test]
async fn window_surfaces_emit_host_events() {
    let fixture = ExtensionFixture::new();
    let services = services(&fixture);
    let api = activated_api(&fixture, &services, "acme", "demo").await;
    let events = collect_events(&services.runtime);

    let answer = api
        .window
        .show_information_message("saved", &["Undo".to_string()])
        .await;
    assert_eq!(answer, None);

    let item = api.window.create_status_bar_item(StatusBarAlignment::Left, Some(10));
    item.set_text("$(sync) indexing");
    item.show();
    item.hide();

    api.window.set_status_bar_message("done", Some(2000));

    let channel = api.window.create_output_channel("Demo Log");
    channel.append_line("started");
    channel.show();
    assert_eq!(channel.content(), "started\n");

    let log = events.lock().unwrap();
    assert!(matches!(
        &log[0],
        HostEvent::ShowMessage { severity: MessageSeverity::Info, message, .. } if message == "saved"
    ));
    assert!(matches!(
        &log[1],
        HostEvent::StatusbarShow { text, priority: Some(10), .. } if text == "$(sync) indexing"
    ));
    assert!(matches!(&log[2], HostEvent::StatusbarHide { .. }));
    assert!(matches!(
        &log[3],
        HostEvent::StatusbarMessage { timeout_ms: Some(2000), .. }
    ));
    assert!(matches!(
        &log[4],
        HostEvent::ShowOutputChannel { name } if name == "Demo Log"
    ));
}

#[tokio::test]
async fn quick_pick_and_input_box_resolve_without_an_answer() {
    let fixture = ExtensionFixture::new();
    let services = services(&fixture);
    let api = activated_api(&fixture, &services, "acme", "demo").await;
    let events = collect_events(&services.runtime);

    let picked = api
        .window
        .show_quick_pick(&["one".to_string(), "two".to_string()], Some("Pick"))
        .await;
    assert_eq!(picked, None);

    let typed = api
        .window
        .show_input_box(ext_compat::InputBoxOptions {
            prompt: Some("Name?".to_string()),
            ..Default::default()
        })
        .await;
    assert_eq!(typed, None);

    let log = events.lock().unwrap();
    assert!(matches!(
        &log[0],
        HostEvent::ShowQuickPick { items, .. } if items.len() == 2
    ));
    assert!(matches!(
        &log[1],
        HostEvent::ShowInputBox { prompt: Some(prompt), .. } if prompt == "Name?"
    ));
}

#[tokio::test]
async fn extensions_namespace_reflects_active_records() {
    let fixture = ExtensionFixture::new();
    let services = services(&fixture);
    let api = activated_api(&fixture, &services, "acme", "demo").await;

    let info = api.extensions.get_extension("acme.demo").unwrap();
    assert_eq!(info.id, "acme.demo");
    assert_eq!(info.version, "1.0.0");
    assert_eq!(info.exports, json!(null));
    assert_eq!(api.extensions.all().len(), 1);
    assert!(api.extensions.get_extension("acme.ghost").is_none());
}

#[tokio::test]
async fn env_exposes_clipboard_identity_and_external_opens() {
    let fixture = ExtensionFixture::new();
    let services = services(&fixture);
    let api = activated_api(&fixture, &services, "acme", "demo").await;

    api.env.clipboard().write_text("copied").await;
    assert_eq!(api.env.clipboard().read_text().await, "copied");

    assert_eq!(api.env.machine_id().len(), 32);
    assert!(api.env.session_id().starts_with("session-"));
    assert_eq!(api.env.app_name(), "extension-host");

    let uri = Uri::parse("https://example.com/docs").unwrap();
    assert!(api.env.open_external(&uri).await);
    assert_eq!(api.env.opened_external(), vec!["https://example.com/docs"]);
}

#[tokio::test]
async fn stub_namespaces_absorb_registrations() {
    let fixture = ExtensionFixture::new();
    let services = services(&fixture);
    let api = activated_api(&fixture, &services, "acme", "demo").await;

    let registration = api.languages.register("hover-provider");
    assert!(!registration.is_disposed());
    registration.dispose();
    assert!(api.languages.get("definitions").is_none());
}

#[tokio::test]
async fn tree_views_register_through_the_window_namespace() {
    use async_trait::async_trait;
    use ext_compat::{TreeDataProvider, TreeItem};

    struct Fruits;

    #[async_trait]
    impl TreeDataProvider for Fruits {
        async fn children(
            &self,
            parent: Option<&TreeItem>,
        ) -> ext_runtime::Result<Vec<TreeItem>> {
            Ok(match parent {
                None => vec![TreeItem::new("citrus")],
                Some(item) if item.label == "citrus" => {
                    vec![TreeItem::new("lemon"), TreeItem::new("lime")]
                }
                Some(_) => Vec::new(),
            })
        }
    }

    let fixture = ExtensionFixture::new();
    let services = services(&fixture);
    let api = activated_api(&fixture, &services, "acme", "demo").await;

    let view = api.window.create_tree_view("fruitExplorer", Arc::new(Fruits));
    assert_eq!(view.view_id(), "fruitExplorer");

    let roots = services
        .runtime
        .tree_view_children("fruitExplorer", None)
        .await
        .unwrap();
    assert_eq!(roots.len(), 1);
    let children = services
        .runtime
        .tree_view_children("fruitExplorer", Some(&roots[0]))
        .await
        .unwrap();
    assert_eq!(children[0].label, "lemon");

    view.dispose();
    assert!(services.runtime.tree_data_provider("fruitExplorer").is_none());
}

#[tokio::test]
async fn webview_panels_open_through_the_window_namespace() {
    let fixture = ExtensionFixture::new();
    let services = services(&fixture);
    let api = activated_api(&fixture, &services, "acme", "demo").await;
    let events = collect_events(&services.runtime);

    let handle = api.window.create_webview_panel(
        "dashboard",
        "Dashboard",
        ViewColumn::One,
        Default::default(),
    );
    handle.set_html("<h1>hi</h1>");
    assert_eq!(handle.html(), "<h1>hi</h1>");

    let received: Arc<Mutex<Vec<serde_json::Value>>> = Arc::default();
    let sink = Arc::clone(&received);
    handle.on_did_receive_message(move |message| {
        sink.lock().unwrap().push(message.clone());
    });
    services
        .runtime
        .send_message_to_webview(handle.id(), &json!({"from": "surface"}));
    assert_eq!(*received.lock().unwrap(), vec![json!({"from": "surface"})]);

    handle.dispose();
    assert!(handle.is_disposed());

    let names: Vec<&str> = events
        .lock()
        .unwrap()
        .iter()
        .map(|event| event.name())
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        vec!["webview-created", "webview-html-changed", "webview-disposed"]
    );
}
