//! Extension lifecycle and host state.
//!
//! [`ExtensionRuntime`] owns every process-wide table: active extensions,
//! the command registry, live webview panels, tree view registrations, and
//! output channels. All mutation goes through its methods so the matching
//! [`HostEvent`]s fire and the tables stay consistent with each other.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use chrono::Utc;
use serde_json::Value;

use ext_manifest::{ExtensionManifest, MANIFEST_FILENAME, NLS_FILENAME};

use crate::commands::{CommandHandler, CommandRegistry};
use crate::context::ExtensionContext;
use crate::disposable::Disposable;
use crate::entry::ExtensionEntryPoint;
use crate::error::{Error, Result};
use crate::events::{EventBus, HostEvent, MessageSeverity, StatusBarAlignment, SubscriptionId};
use crate::output::OutputChannel;
use crate::panels::{WebviewOptions, WebviewPanel};
use crate::tree::{RegisteredTreeView, TreeDataProvider, TreeItem};

/// Book-keeping for one activated extension.
pub struct ActiveExtension {
    id: String,
    manifest: ExtensionManifest,
    context: Arc<ExtensionContext>,
    exports: Mutex<Value>,
    panels: Mutex<Vec<String>>,
    commands: Mutex<Vec<String>>,
    tree_views: Mutex<Vec<String>>,
}

impl ActiveExtension {
    fn new(id: &str, manifest: ExtensionManifest, context: Arc<ExtensionContext>) -> Self {
        Self {
            id: id.to_string(),
            manifest,
            context,
            exports: Mutex::new(Value::Null),
            panels: Mutex::new(Vec::new()),
            commands: Mutex::new(Vec::new()),
            tree_views: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn manifest(&self) -> &ExtensionManifest {
        &self.manifest
    }

    pub fn context(&self) -> &Arc<ExtensionContext> {
        &self.context
    }

    /// The value returned by the extension's entry point, `Null` for
    /// passive extensions.
    pub fn exports(&self) -> Value {
        self.exports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn panel_ids(&self) -> Vec<String> {
        self.panels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn command_ids(&self) -> Vec<String> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn tree_view_ids(&self) -> Vec<String> {
        self.tree_views
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_exports(&self, exports: Value) {
        *self.exports.lock().unwrap_or_else(PoisonError::into_inner) = exports;
    }

    fn record_panel(&self, panel_id: &str) {
        self.panels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(panel_id.to_string());
    }

    fn forget_panel(&self, panel_id: &str) {
        self.panels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|id| id != panel_id);
    }

    fn record_command(&self, command_id: &str) {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command_id.to_string());
    }

    fn forget_command(&self, command_id: &str) {
        let mut commands = self.commands.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(position) = commands.iter().position(|id| id == command_id) {
            commands.remove(position);
        }
    }

    fn record_tree_view(&self, view_id: &str) {
        self.tree_views
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(view_id.to_string());
    }

    fn forget_tree_view(&self, view_id: &str) {
        self.tree_views
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|id| id != view_id);
    }
}

impl std::fmt::Debug for ActiveExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveExtension")
            .field("id", &self.id)
            .field("panels", &self.panel_ids())
            .field("commands", &self.command_ids())
            .finish()
    }
}

/// The extension host runtime.
pub struct ExtensionRuntime {
    events: EventBus,
    commands: Arc<CommandRegistry>,
    active: Mutex<HashMap<String, Arc<ActiveExtension>>>,
    panels: Mutex<HashMap<String, Arc<WebviewPanel>>>,
    tree_views: Arc<Mutex<HashMap<String, RegisteredTreeView>>>,
    output_channels: Mutex<HashMap<String, Arc<OutputChannel>>>,
    entry_points: Mutex<HashMap<String, Arc<dyn ExtensionEntryPoint>>>,
    storage_root: PathBuf,
    next_tree_token: AtomicU64,
}

impl ExtensionRuntime {
    /// Runtime storing extension state under `~/.extension-host`.
    pub fn new() -> Self {
        let storage_root = dirs::home_dir()
            .map(|home| home.join(".extension-host"))
            .unwrap_or_else(|| PathBuf::from(".extension-host"));
        Self::with_storage_root(storage_root)
    }

    /// Runtime with an explicit storage root, used by tests and embedders.
    pub fn with_storage_root(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            events: EventBus::new(),
            commands: Arc::new(CommandRegistry::new()),
            active: Mutex::new(HashMap::new()),
            panels: Mutex::new(HashMap::new()),
            tree_views: Arc::new(Mutex::new(HashMap::new())),
            output_channels: Mutex::new(HashMap::new()),
            entry_points: Mutex::new(HashMap::new()),
            storage_root: storage_root.into(),
            next_tree_token: AtomicU64::new(1),
        }
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    // ----- events -------------------------------------------------------

    /// Subscribe to all host events.
    pub fn subscribe(&self, subscriber: impl Fn(&HostEvent) + Send + Sync + 'static) -> SubscriptionId {
        self.events.subscribe(subscriber)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    fn emit(&self, event: HostEvent) {
        self.events.emit(&event);
    }

    // ----- lifecycle ----------------------------------------------------

    /// Register a native entry point to run when `extension_id` activates.
    pub fn register_entry_point(&self, extension_id: &str, entry: Arc<dyn ExtensionEntryPoint>) {
        let previous = self
            .entry_points
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(extension_id.to_string(), entry);
        if previous.is_some() {
            tracing::warn!(extension = %extension_id, "replacing registered entry point");
        }
    }

    /// Activate the extension rooted at `directory`.
    ///
    /// Returns `true` when the extension ends up active, including when it
    /// already was. Every failure is caught, logged, and rolled back to a
    /// `false` return with no record left behind.
    pub async fn activate_extension(&self, extension_id: &str, directory: &Path) -> bool {
        if self.is_extension_active(extension_id) {
            tracing::debug!(extension = %extension_id, "extension already active");
            return true;
        }

        let manifest = match self.read_manifest(directory).await {
            Ok(manifest) => manifest,
            Err(e) => {
                tracing::warn!(
                    extension = %extension_id,
                    error = %e,
                    "activation failed: manifest unreadable"
                );
                return false;
            }
        };
        if manifest.id() != extension_id {
            tracing::warn!(
                extension = %extension_id,
                manifest_id = %manifest.id(),
                "manifest identity differs from requested extension id"
            );
        }

        let context = match ExtensionContext::create(extension_id, directory, &self.storage_root) {
            Ok(context) => Arc::new(context),
            Err(e) => {
                tracing::warn!(
                    extension = %extension_id,
                    error = %e,
                    "activation failed: storage unavailable"
                );
                return false;
            }
        };

        let has_entry_point = manifest.entry_point().is_some();
        let record = Arc::new(ActiveExtension::new(extension_id, manifest, Arc::clone(&context)));
        {
            let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            if active.contains_key(extension_id) {
                return true;
            }
            active.insert(extension_id.to_string(), Arc::clone(&record));
        }

        if has_entry_point {
            let entry = self
                .entry_points
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(extension_id)
                .cloned();
            match entry {
                Some(entry) => match entry.activate(Arc::clone(&context)).await {
                    Ok(exports) => record.set_exports(exports),
                    Err(e) => {
                        tracing::warn!(
                            extension = %extension_id,
                            error = %e,
                            "entry point failed; rolling activation back"
                        );
                        self.teardown(extension_id, true).await;
                        return false;
                    }
                },
                None => {
                    tracing::debug!(
                        extension = %extension_id,
                        "entry point declared but none registered in-process; activating without execution"
                    );
                }
            }
        }

        tracing::info!(extension = %extension_id, "extension activated");
        self.emit(HostEvent::ExtensionActivated {
            extension_id: extension_id.to_string(),
        });
        true
    }

    /// Deactivate an extension, releasing everything it registered.
    /// Safe to call for an extension that is not active.
    pub async fn deactivate_extension(&self, extension_id: &str) {
        self.teardown(extension_id, false).await;
    }

    async fn teardown(&self, extension_id: &str, rollback: bool) {
        let record = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(extension_id);
        let Some(record) = record else {
            tracing::debug!(extension = %extension_id, "deactivate requested for inactive extension");
            return;
        };

        if !rollback {
            let entry = self
                .entry_points
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(extension_id)
                .cloned();
            if let Some(entry) = entry {
                if let Err(e) = entry.deactivate().await {
                    tracing::warn!(
                        extension = %extension_id,
                        error = %e,
                        "deactivate callback failed"
                    );
                }
            }
        }

        record.context().dispose_subscriptions();

        for panel_id in record.panel_ids() {
            self.dispose_webview_panel(&panel_id);
        }

        let dropped = self.commands.remove_owner(extension_id);
        if !dropped.is_empty() {
            tracing::debug!(
                extension = %extension_id,
                commands = dropped.len(),
                "dropped remaining command registrations"
            );
        }

        self.tree_views
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, view| view.extension_id() != extension_id);

        if !rollback {
            tracing::info!(extension = %extension_id, "extension deactivated");
            self.emit(HostEvent::ExtensionDeactivated {
                extension_id: extension_id.to_string(),
            });
        }
    }

    async fn read_manifest(&self, directory: &Path) -> Result<ExtensionManifest> {
        let manifest_path = directory.join(MANIFEST_FILENAME);
        let raw = tokio::fs::read_to_string(&manifest_path)
            .await
            .map_err(|e| Error::io(&manifest_path, e))?;
        let nls_path = directory.join(NLS_FILENAME);
        let nls = match tokio::fs::read_to_string(&nls_path).await {
            Ok(raw_nls) => Some(raw_nls),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(Error::io(&nls_path, e)),
        };
        Ok(ExtensionManifest::from_json_localized(&raw, nls.as_deref())?)
    }

    // ----- queries ------------------------------------------------------

    pub fn is_extension_active(&self, extension_id: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(extension_id)
    }

    /// Ids of all active extensions, sorted.
    pub fn active_extensions(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn active_extension(&self, extension_id: &str) -> Option<Arc<ActiveExtension>> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(extension_id)
            .cloned()
    }

    /// The exports of an active extension, `None` when not active.
    pub fn extension_exports(&self, extension_id: &str) -> Option<Value> {
        self.active_extension(extension_id)
            .map(|record| record.exports())
    }

    // ----- commands -----------------------------------------------------

    /// Register a command on behalf of an extension.
    ///
    /// The returned disposable removes exactly this registration; it is also
    /// recorded in the extension's subscriptions so deactivation cleans it up.
    pub fn register_command(
        &self,
        extension_id: &str,
        command_id: &str,
        handler: Arc<dyn CommandHandler>,
    ) -> Disposable {
        let token = self.commands.register(command_id, Some(extension_id), handler);
        let record = self.active_extension(extension_id);

        let disposable = {
            let registry = Arc::clone(&self.commands);
            let command_id = command_id.to_string();
            let weak = record.as_ref().map(Arc::downgrade);
            Disposable::new(move || {
                registry.remove(&command_id, token);
                if let Some(record) = weak.as_ref().and_then(Weak::upgrade) {
                    record.forget_command(&command_id);
                }
            })
        };

        match record {
            Some(record) => {
                record.record_command(command_id);
                record.context().push_subscription(disposable.clone());
            }
            None => {
                tracing::debug!(
                    command = %command_id,
                    extension = %extension_id,
                    "command registered outside an active extension"
                );
            }
        }
        disposable
    }

    /// Execute a registered command.
    ///
    /// A missing command resolves to `Ok(None)` with a warning; handler
    /// failures propagate to the caller unchanged.
    pub async fn execute_command(&self, command_id: &str, args: &[Value]) -> Result<Option<Value>> {
        let Some(handler) = self.commands.resolve(command_id) else {
            tracing::warn!(command = %command_id, "command not found");
            return Ok(None);
        };
        match handler.invoke(args).await {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(command = %command_id, error = %e, "command handler failed");
                Err(e)
            }
        }
    }

    /// All registered command ids, sorted.
    pub fn registered_commands(&self) -> Vec<String> {
        self.commands.command_ids()
    }

    // ----- webview panels -----------------------------------------------

    /// Create a webview panel owned by `extension_id`.
    pub fn create_webview_panel(
        &self,
        extension_id: &str,
        view_type: &str,
        title: &str,
        options: WebviewOptions,
    ) -> Arc<WebviewPanel> {
        let panel = {
            let mut panels = self.panels.lock().unwrap_or_else(PoisonError::into_inner);
            let id = Self::allocate_panel_id(&panels, extension_id, view_type);
            let panel = Arc::new(WebviewPanel::new(
                id.clone(),
                extension_id.to_string(),
                view_type.to_string(),
                title.to_string(),
                options,
            ));
            panels.insert(id, Arc::clone(&panel));
            panel
        };

        match self.active_extension(extension_id) {
            Some(record) => record.record_panel(panel.id()),
            None => {
                tracing::debug!(
                    panel = %panel.id(),
                    extension = %extension_id,
                    "webview panel created outside an active extension"
                );
            }
        }

        tracing::info!(
            panel = %panel.id(),
            extension = %extension_id,
            view_type = %view_type,
            "webview panel created"
        );
        self.emit(HostEvent::WebviewCreated {
            panel_id: panel.id().to_string(),
            extension_id: extension_id.to_string(),
            view_type: view_type.to_string(),
            title: title.to_string(),
        });
        panel
    }

    fn allocate_panel_id(
        panels: &HashMap<String, Arc<WebviewPanel>>,
        extension_id: &str,
        view_type: &str,
    ) -> String {
        let base = format!("{extension_id}.{view_type}-{}", Utc::now().timestamp_millis());
        if !panels.contains_key(&base) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}-{n}");
            if !panels.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn webview_panel(&self, panel_id: &str) -> Option<Arc<WebviewPanel>> {
        self.panels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(panel_id)
            .cloned()
    }

    /// Live panels owned by an extension, in creation order.
    pub fn webview_panels_for_extension(&self, extension_id: &str) -> Vec<Arc<WebviewPanel>> {
        let Some(record) = self.active_extension(extension_id) else {
            return Vec::new();
        };
        let panels = self.panels.lock().unwrap_or_else(PoisonError::into_inner);
        record
            .panel_ids()
            .iter()
            .filter_map(|id| panels.get(id).cloned())
            .collect()
    }

    /// Replace a panel's HTML, emitting `webview-html-changed` once.
    pub fn set_webview_html(&self, panel_id: &str, html: &str) -> bool {
        let Some(panel) = self.webview_panel(panel_id) else {
            tracing::debug!(panel = %panel_id, "html update for unknown panel");
            return false;
        };
        if !panel.set_html(html) {
            return false;
        }
        self.emit(HostEvent::WebviewHtmlChanged {
            panel_id: panel_id.to_string(),
            html: html.to_string(),
        });
        true
    }

    pub fn set_webview_title(&self, panel_id: &str, title: &str) -> bool {
        self.webview_panel(panel_id)
            .map(|panel| panel.set_title(title))
            .unwrap_or(false)
    }

    /// Record UI-driven visibility changes on a panel.
    pub fn set_webview_view_state(&self, panel_id: &str, visible: bool, active: bool) -> bool {
        self.webview_panel(panel_id)
            .map(|panel| panel.set_view_state(visible, active))
            .unwrap_or(false)
    }

    /// Mark whether a rendered surface is mounted for the panel.
    pub fn set_webview_mounted(&self, panel_id: &str, mounted: bool) -> bool {
        self.webview_panel(panel_id)
            .map(|panel| panel.set_mounted(mounted))
            .unwrap_or(false)
    }

    /// Post a message from an extension toward its rendered surface.
    ///
    /// Resolves `false` when the panel is unknown, disposed, or has no
    /// mounted surface; the message is dropped rather than queued.
    pub async fn post_message_to_webview(&self, panel_id: &str, message: Value) -> bool {
        let Some(panel) = self.webview_panel(panel_id) else {
            tracing::debug!(panel = %panel_id, "message for unknown panel dropped");
            return false;
        };
        if panel.is_disposed() || !panel.is_mounted() {
            tracing::debug!(panel = %panel_id, "message for unmounted panel dropped");
            return false;
        }
        self.emit(HostEvent::WebviewMessage {
            panel_id: panel_id.to_string(),
            message,
        });
        true
    }

    /// Deliver a message from the rendered surface to the panel's handlers,
    /// in registration order. Unknown panels are a silent no-op.
    pub fn send_message_to_webview(&self, panel_id: &str, message: &Value) {
        let Some(panel) = self.webview_panel(panel_id) else {
            tracing::debug!(panel = %panel_id, "inbound message for unknown panel dropped");
            return;
        };
        for handler in panel.handlers_snapshot() {
            handler(message);
        }
    }

    /// Dispose a panel: remove it from every index, fire its dispose
    /// callbacks exactly once, emit `webview-disposed`.
    pub fn dispose_webview_panel(&self, panel_id: &str) -> bool {
        let panel = self
            .panels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(panel_id);
        let Some(panel) = panel else {
            return false;
        };

        panel.mark_disposed();
        if let Some(record) = self.active_extension(panel.extension_id()) {
            record.forget_panel(panel_id);
        }
        panel.clear_message_handlers();
        for listener in panel.take_dispose_listeners() {
            listener();
        }

        tracing::info!(panel = %panel_id, "webview panel disposed");
        self.emit(HostEvent::WebviewDisposed {
            panel_id: panel_id.to_string(),
            extension_id: panel.extension_id().to_string(),
        });
        true
    }

    // ----- tree views ---------------------------------------------------

    /// Register a tree data provider for a view id.
    ///
    /// Registering over a live view id replaces the previous provider with a
    /// warning. The disposable removes the registration only while it is
    /// still the current one.
    pub fn register_tree_data_provider(
        &self,
        extension_id: &str,
        view_id: &str,
        provider: Arc<dyn TreeDataProvider>,
    ) -> Disposable {
        let token = self.next_tree_token.fetch_add(1, Ordering::Relaxed);
        let view = RegisteredTreeView::new(
            token,
            view_id.to_string(),
            extension_id.to_string(),
            provider,
        );
        {
            let mut views = self.tree_views.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = views.insert(view_id.to_string(), view) {
                tracing::warn!(
                    view = %view_id,
                    previous_owner = %previous.extension_id(),
                    "replacing tree data provider"
                );
            }
        }

        let record = self.active_extension(extension_id);
        let disposable = {
            let views = Arc::clone(&self.tree_views);
            let view_id = view_id.to_string();
            let weak = record.as_ref().map(Arc::downgrade);
            Disposable::new(move || {
                {
                    let mut views = views.lock().unwrap_or_else(PoisonError::into_inner);
                    if views.get(&view_id).is_some_and(|v| v.token == token) {
                        views.remove(&view_id);
                    }
                }
                if let Some(record) = weak.as_ref().and_then(Weak::upgrade) {
                    record.forget_tree_view(&view_id);
                }
            })
        };

        match record {
            Some(record) => {
                record.record_tree_view(view_id);
                record.context().push_subscription(disposable.clone());
            }
            None => {
                tracing::debug!(
                    view = %view_id,
                    extension = %extension_id,
                    "tree view registered outside an active extension"
                );
            }
        }
        disposable
    }

    pub fn tree_data_provider(&self, view_id: &str) -> Option<Arc<dyn TreeDataProvider>> {
        self.tree_views
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(view_id)
            .map(RegisteredTreeView::provider)
    }

    /// Registered tree view ids, sorted.
    pub fn registered_tree_views(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .tree_views
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Enumerate children for a registered tree view.
    ///
    /// An unregistered view id yields an empty list; provider failures
    /// propagate after being logged.
    pub async fn tree_view_children(
        &self,
        view_id: &str,
        parent: Option<&TreeItem>,
    ) -> Result<Vec<TreeItem>> {
        let provider = self.tree_data_provider(view_id);
        let Some(provider) = provider else {
            tracing::warn!(view = %view_id, "tree view not registered");
            return Ok(Vec::new());
        };
        provider.children(parent).await.map_err(|e| {
            tracing::warn!(view = %view_id, error = %e, "tree data provider failed");
            e
        })
    }

    // ----- output channels ----------------------------------------------

    /// Get or create the output channel with the given name.
    pub fn output_channel(&self, name: &str) -> Arc<OutputChannel> {
        let mut channels = self
            .output_channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            channels
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(OutputChannel::new(name))),
        )
    }

    /// Ask the UI to reveal an output channel.
    pub fn show_output_channel(&self, name: &str) {
        let _ = self.output_channel(name);
        self.emit(HostEvent::ShowOutputChannel {
            name: name.to_string(),
        });
    }

    /// Names of all output channels, sorted.
    pub fn output_channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .output_channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    // ----- UI requests --------------------------------------------------

    /// Ask the UI to show a message box.
    pub fn show_message(&self, severity: MessageSeverity, message: &str, items: &[String]) {
        self.emit(HostEvent::ShowMessage {
            severity,
            message: message.to_string(),
            items: items.to_vec(),
        });
    }

    /// Ask the UI to show an input box.
    pub fn show_input_box(
        &self,
        prompt: Option<String>,
        placeholder: Option<String>,
        value: Option<String>,
    ) {
        self.emit(HostEvent::ShowInputBox {
            prompt,
            placeholder,
            value,
        });
    }

    /// Ask the UI to show a quick pick list.
    pub fn show_quick_pick(&self, items: Vec<String>, placeholder: Option<String>) {
        self.emit(HostEvent::ShowQuickPick { items, placeholder });
    }

    /// Ask the UI to show a status bar item.
    pub fn show_status_bar_item(
        &self,
        item_id: &str,
        text: &str,
        tooltip: Option<String>,
        alignment: StatusBarAlignment,
        priority: Option<i32>,
    ) {
        self.emit(HostEvent::StatusbarShow {
            item_id: item_id.to_string(),
            text: text.to_string(),
            tooltip,
            alignment,
            priority,
        });
    }

    /// Ask the UI to hide a status bar item.
    pub fn hide_status_bar_item(&self, item_id: &str) {
        self.emit(HostEvent::StatusbarHide {
            item_id: item_id.to_string(),
        });
    }

    /// Ask the UI to show a transient status bar message.
    pub fn set_status_bar_message(&self, text: &str, timeout_ms: Option<u64>) {
        self.emit(HostEvent::StatusbarMessage {
            text: text.to_string(),
            timeout_ms,
        });
    }
}

impl Default for ExtensionRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::command_fn;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::AtomicU32;
    use tempfile::TempDir;

    fn write_extension(root: &Path, publisher: &str, name: &str, entry: bool) -> PathBuf {
        let dir = root.join(format!("{publisher}.{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let mut manifest = json!({
            "name": name,
            "publisher": publisher,
            "version": "1.0.0",
        });
        if entry {
            manifest["main"] = json!("./dist/extension.js");
        }
        std::fs::write(
            dir.join(MANIFEST_FILENAME),
            serde_json::to_string_pretty(&manifest).unwrap(),
        )
        .unwrap();
        dir
    }

    fn runtime(temp: &TempDir) -> ExtensionRuntime {
        ExtensionRuntime::with_storage_root(temp.path().join("storage"))
    }

    struct RecordingEntry {
        activations: AtomicU32,
        deactivations: AtomicU32,
        fail: bool,
    }

    impl RecordingEntry {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                activations: AtomicU32::new(0),
                deactivations: AtomicU32::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl ExtensionEntryPoint for RecordingEntry {
        async fn activate(&self, context: Arc<ExtensionContext>) -> Result<Value> {
            self.activations.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::callback("activation exploded"));
            }
            Ok(json!({ "from": context.extension_id() }))
        }

        async fn deactivate(&self) -> Result<()> {
            self.deactivations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn collect_events(runtime: &ExtensionRuntime) -> Arc<StdMutex<Vec<HostEvent>>> {
        let events = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        runtime.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
        events
    }

    #[tokio::test]
    async fn activation_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let runtime = runtime(&temp);
        let dir = write_extension(temp.path(), "acme", "demo", false);
        let events = collect_events(&runtime);

        assert!(runtime.activate_extension("acme.demo", &dir).await);
        assert!(runtime.activate_extension("acme.demo", &dir).await);

        assert_eq!(runtime.active_extensions(), vec!["acme.demo".to_string()]);
        // A passive extension registers nothing.
        assert!(runtime.registered_commands().is_empty());
        let activated = events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, HostEvent::ExtensionActivated { .. }))
            .count();
        assert_eq!(activated, 1);
    }

    #[tokio::test]
    async fn activation_fails_without_manifest() {
        let temp = TempDir::new().unwrap();
        let runtime = runtime(&temp);
        let events = collect_events(&runtime);

        let activated = runtime
            .activate_extension("ghost.ext", &temp.path().join("ghost.ext"))
            .await;

        assert!(!activated);
        assert!(!runtime.is_extension_active("ghost.ext"));
        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn entry_point_runs_and_provides_exports() {
        let temp = TempDir::new().unwrap();
        let runtime = runtime(&temp);
        let dir = write_extension(temp.path(), "acme", "demo", true);
        let entry = RecordingEntry::new(false);
        runtime.register_entry_point("acme.demo", Arc::clone(&entry) as Arc<dyn ExtensionEntryPoint>);

        assert!(runtime.activate_extension("acme.demo", &dir).await);
        assert_eq!(entry.activations.load(Ordering::SeqCst), 1);
        assert_eq!(
            runtime.extension_exports("acme.demo"),
            Some(json!({ "from": "acme.demo" }))
        );

        runtime.deactivate_extension("acme.demo").await;
        assert_eq!(entry.deactivations.load(Ordering::SeqCst), 1);
        assert!(!runtime.is_extension_active("acme.demo"));
    }

    #[tokio::test]
    async fn failing_entry_point_rolls_back() {
        let temp = TempDir::new().unwrap();
        let runtime = runtime(&temp);
        let dir = write_extension(temp.path(), "acme", "demo", true);
        runtime.register_entry_point(
            "acme.demo",
            RecordingEntry::new(true) as Arc<dyn ExtensionEntryPoint>,
        );
        let events = collect_events(&runtime);

        assert!(!runtime.activate_extension("acme.demo", &dir).await);
        assert!(!runtime.is_extension_active("acme.demo"));
        assert!(
            !events
                .lock()
                .unwrap()
                .iter()
                .any(|e| matches!(e, HostEvent::ExtensionActivated { .. }))
        );
    }

    #[tokio::test]
    async fn declared_entry_without_registration_activates_passively() {
        let temp = TempDir::new().unwrap();
        let runtime = runtime(&temp);
        let dir = write_extension(temp.path(), "acme", "demo", true);

        assert!(runtime.activate_extension("acme.demo", &dir).await);
        assert_eq!(runtime.extension_exports("acme.demo"), Some(Value::Null));
    }

    #[tokio::test]
    async fn deactivate_inactive_extension_is_noop() {
        let temp = TempDir::new().unwrap();
        let runtime = runtime(&temp);
        let events = collect_events(&runtime);

        runtime.deactivate_extension("never.activated").await;

        assert!(events.lock().unwrap().is_empty());
        assert!(runtime.active_extensions().is_empty());
    }

    #[tokio::test]
    async fn execute_missing_command_resolves_none() {
        let temp = TempDir::new().unwrap();
        let runtime = runtime(&temp);

        let result = runtime.execute_command("missing.command", &[]).await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn registered_command_receives_args_once() {
        let temp = TempDir::new().unwrap();
        let runtime = runtime(&temp);
        let dir = write_extension(temp.path(), "acme", "demo", false);
        assert!(runtime.activate_extension("acme.demo", &dir).await);

        let calls = Arc::new(StdMutex::new(Vec::new()));
        let seen = Arc::clone(&calls);
        runtime.register_command(
            "acme.demo",
            "demo.add",
            command_fn(move |args| {
                seen.lock().unwrap().push(args.to_vec());
                let sum: i64 = args.iter().filter_map(Value::as_i64).sum();
                Ok(json!(sum))
            }),
        );

        let result = runtime
            .execute_command("demo.add", &[json!(1), json!(2)])
            .await
            .unwrap();

        assert_eq!(result, Some(json!(3)));
        assert_eq!(*calls.lock().unwrap(), vec![vec![json!(1), json!(2)]]);
        assert_eq!(runtime.registered_commands(), vec!["demo.add".to_string()]);
    }

    #[tokio::test]
    async fn command_errors_propagate_to_caller() {
        let temp = TempDir::new().unwrap();
        let runtime = runtime(&temp);
        let dir = write_extension(temp.path(), "acme", "demo", false);
        assert!(runtime.activate_extension("acme.demo", &dir).await);

        runtime.register_command(
            "acme.demo",
            "demo.fail",
            command_fn(|_| Err(Error::callback("boom"))),
        );

        let error = runtime.execute_command("demo.fail", &[]).await.unwrap_err();
        assert!(matches!(error, Error::Callback { .. }));
        assert_eq!(runtime.registered_commands(), vec!["demo.fail".to_string()]);
    }

    #[tokio::test]
    async fn deactivation_unshadows_earlier_command() {
        let temp = TempDir::new().unwrap();
        let runtime = runtime(&temp);
        let first_dir = write_extension(temp.path(), "first", "ext", false);
        let second_dir = write_extension(temp.path(), "second", "ext", false);
        assert!(runtime.activate_extension("first.ext", &first_dir).await);
        assert!(runtime.activate_extension("second.ext", &second_dir).await);

        runtime.register_command("first.ext", "shared.cmd", command_fn(|_| Ok(json!("first"))));
        runtime.register_command("second.ext", "shared.cmd", command_fn(|_| Ok(json!("second"))));

        let before = runtime.execute_command("shared.cmd", &[]).await.unwrap();
        assert_eq!(before, Some(json!("second")));

        runtime.deactivate_extension("second.ext").await;
        let after = runtime.execute_command("shared.cmd", &[]).await.unwrap();
        assert_eq!(after, Some(json!("first")));
    }

    #[tokio::test]
    async fn panel_lifecycle_updates_indexes_and_events() {
        let temp = TempDir::new().unwrap();
        let runtime = runtime(&temp);
        let dir = write_extension(temp.path(), "acme", "demo", false);
        assert!(runtime.activate_extension("acme.demo", &dir).await);
        let events = collect_events(&runtime);

        let panel = runtime.create_webview_panel(
            "acme.demo",
            "dashboard",
            "Dashboard",
            WebviewOptions::default(),
        );
        let panel_id = panel.id().to_string();
        assert!(panel_id.starts_with("acme.demo.dashboard-"));
        assert_eq!(runtime.webview_panels_for_extension("acme.demo").len(), 1);

        let disposed_calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&disposed_calls);
        panel.on_dispose(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(runtime.dispose_webview_panel(&panel_id));
        assert!(!runtime.dispose_webview_panel(&panel_id));
        assert_eq!(disposed_calls.load(Ordering::SeqCst), 1);
        assert!(runtime.webview_panel(&panel_id).is_none());
        assert!(runtime.webview_panels_for_extension("acme.demo").is_empty());

        let events = events.lock().unwrap();
        assert!(events.iter().any(|e| matches!(
            e,
            HostEvent::WebviewCreated { panel_id: id, .. } if *id == panel_id
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            HostEvent::WebviewDisposed { panel_id: id, .. } if *id == panel_id
        )));
    }

    #[tokio::test]
    async fn set_html_emits_exactly_one_event() {
        let temp = TempDir::new().unwrap();
        let runtime = runtime(&temp);
        let dir = write_extension(temp.path(), "acme", "demo", false);
        assert!(runtime.activate_extension("acme.demo", &dir).await);
        let events = collect_events(&runtime);

        let panel = runtime.create_webview_panel(
            "acme.demo",
            "dashboard",
            "Dashboard",
            WebviewOptions::default(),
        );
        assert!(runtime.set_webview_html(panel.id(), "<p>hi</p>"));
        assert_eq!(panel.html(), "<p>hi</p>");

        let changed: Vec<(String, String)> = events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                HostEvent::WebviewHtmlChanged { panel_id, html } => {
                    Some((panel_id.clone(), html.clone()))
                }
                _ => None,
            })
            .collect();
        assert_eq!(changed, vec![(panel.id().to_string(), "<p>hi</p>".to_string())]);
    }

    #[tokio::test]
    async fn post_message_requires_mounted_surface() {
        let temp = TempDir::new().unwrap();
        let runtime = runtime(&temp);
        let dir = write_extension(temp.path(), "acme", "demo", false);
        assert!(runtime.activate_extension("acme.demo", &dir).await);
        let events = collect_events(&runtime);

        let panel = runtime.create_webview_panel(
            "acme.demo",
            "dashboard",
            "Dashboard",
            WebviewOptions::default(),
        );

        assert!(!runtime.post_message_to_webview(panel.id(), json!({"n": 1})).await);
        assert!(runtime.set_webview_mounted(panel.id(), true));
        assert!(runtime.post_message_to_webview(panel.id(), json!({"n": 2})).await);
        assert!(!runtime.post_message_to_webview("missing.panel", json!({})).await);

        let messages: Vec<Value> = events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                HostEvent::WebviewMessage { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(messages, vec![json!({"n": 2})]);
    }

    #[tokio::test]
    async fn inbound_messages_reach_handlers_in_order() {
        let temp = TempDir::new().unwrap();
        let runtime = runtime(&temp);
        let dir = write_extension(temp.path(), "acme", "demo", false);
        assert!(runtime.activate_extension("acme.demo", &dir).await);

        let panel = runtime.create_webview_panel(
            "acme.demo",
            "dashboard",
            "Dashboard",
            WebviewOptions::default(),
        );
        let received = Arc::new(StdMutex::new(Vec::new()));
        for tag in ["first", "second"] {
            let sink = Arc::clone(&received);
            panel.add_message_handler(move |message| {
                sink.lock().unwrap().push((tag, message.clone()));
            });
        }

        runtime.send_message_to_webview(panel.id(), &json!("ping"));
        runtime.send_message_to_webview("missing.panel", &json!("dropped"));

        assert_eq!(
            *received.lock().unwrap(),
            vec![("first", json!("ping")), ("second", json!("ping"))]
        );
    }

    #[tokio::test]
    async fn deactivation_disposes_owned_panels() {
        let temp = TempDir::new().unwrap();
        let runtime = runtime(&temp);
        let dir = write_extension(temp.path(), "acme", "demo", false);
        assert!(runtime.activate_extension("acme.demo", &dir).await);
        let dashboard = runtime.create_webview_panel(
            "acme.demo",
            "dashboard",
            "Dashboard",
            WebviewOptions::default(),
        );
        let preview = runtime.create_webview_panel(
            "acme.demo",
            "preview",
            "Preview",
            WebviewOptions::default(),
        );
        let dispose_calls = Arc::new(AtomicU32::new(0));
        for panel in [&dashboard, &preview] {
            let counter = Arc::clone(&dispose_calls);
            panel.on_dispose(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        let events = collect_events(&runtime);

        runtime.deactivate_extension("acme.demo").await;

        assert_eq!(dispose_calls.load(Ordering::SeqCst), 2);
        assert!(dashboard.is_disposed());
        assert!(preview.is_disposed());
        assert!(runtime.webview_panel(dashboard.id()).is_none());
        assert!(runtime.webview_panels_for_extension("acme.demo").is_empty());
        let events = events.lock().unwrap();
        let disposed = events
            .iter()
            .filter(|e| matches!(e, HostEvent::WebviewDisposed { .. }))
            .count();
        assert_eq!(disposed, 2);
        assert!(events.iter().any(|e| matches!(
            e,
            HostEvent::ExtensionDeactivated { extension_id } if extension_id == "acme.demo"
        )));
    }

    struct StaticTree(Vec<TreeItem>);

    #[async_trait]
    impl TreeDataProvider for StaticTree {
        async fn children(&self, parent: Option<&TreeItem>) -> Result<Vec<TreeItem>> {
            match parent {
                None => Ok(self.0.clone()),
                Some(_) => Ok(Vec::new()),
            }
        }
    }

    #[tokio::test]
    async fn tree_views_register_query_and_dispose() {
        let temp = TempDir::new().unwrap();
        let runtime = runtime(&temp);
        let dir = write_extension(temp.path(), "acme", "demo", false);
        assert!(runtime.activate_extension("acme.demo", &dir).await);

        let disposable = runtime.register_tree_data_provider(
            "acme.demo",
            "acme.todoList",
            Arc::new(StaticTree(vec![TreeItem::new("todo")])),
        );

        let roots = runtime.tree_view_children("acme.todoList", None).await.unwrap();
        assert_eq!(roots, vec![TreeItem::new("todo")]);
        assert_eq!(runtime.registered_tree_views(), vec!["acme.todoList".to_string()]);

        let missing = runtime.tree_view_children("not.registered", None).await.unwrap();
        assert!(missing.is_empty());

        disposable.dispose();
        assert!(runtime.tree_data_provider("acme.todoList").is_none());
    }

    #[tokio::test]
    async fn stale_tree_disposable_leaves_replacement_alone() {
        let temp = TempDir::new().unwrap();
        let runtime = runtime(&temp);
        let dir = write_extension(temp.path(), "acme", "demo", false);
        assert!(runtime.activate_extension("acme.demo", &dir).await);

        let first = runtime.register_tree_data_provider(
            "acme.demo",
            "acme.todoList",
            Arc::new(StaticTree(vec![TreeItem::new("old")])),
        );
        let _second = runtime.register_tree_data_provider(
            "acme.demo",
            "acme.todoList",
            Arc::new(StaticTree(vec![TreeItem::new("new")])),
        );

        first.dispose();

        let roots = runtime.tree_view_children("acme.todoList", None).await.unwrap();
        assert_eq!(roots, vec![TreeItem::new("new")]);
    }

    #[tokio::test]
    async fn output_channels_are_shared_by_name() {
        let temp = TempDir::new().unwrap();
        let runtime = runtime(&temp);
        let events = collect_events(&runtime);

        let channel = runtime.output_channel("Build");
        channel.append_line("start");
        runtime.output_channel("Build").append_line("finish");

        assert_eq!(runtime.output_channel("Build").content(), "start\nfinish\n");
        assert_eq!(runtime.output_channel_names(), vec!["Build".to_string()]);

        runtime.show_output_channel("Build");
        assert!(events.lock().unwrap().iter().any(|e| matches!(
            e,
            HostEvent::ShowOutputChannel { name } if name == "Build"
        )));
    }
}
