//! The `window` namespace: webview panels, message boxes, pickers, output
//! channels, status bar items, and tree views.
//!
//! Interactive calls (message boxes, input box, quick pick) emit the
//! corresponding host event for the UI to render and resolve immediately;
//! the host has no synchronous answer channel, so the resolved selection is
//! always `None`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use ext_runtime::{
    Disposable, ExtensionRuntime, MessageSeverity, OutputChannel, StatusBarAlignment,
    TreeDataProvider, WebviewOptions, WebviewPanel,
};

use crate::enums::ViewColumn;

static STATUS_BAR_SEQ: AtomicU64 = AtomicU64::new(1);

/// Options accepted by [`WindowApi::show_input_box`].
#[derive(Debug, Clone, Default)]
pub struct InputBoxOptions {
    pub prompt: Option<String>,
    pub placeholder: Option<String>,
    pub value: Option<String>,
}

/// Live handle over a webview panel, routing mutation through the runtime.
#[derive(Clone)]
pub struct WebviewPanelHandle {
    runtime: Arc<ExtensionRuntime>,
    panel: Arc<WebviewPanel>,
}

impl WebviewPanelHandle {
    pub(crate) fn new(runtime: Arc<ExtensionRuntime>, panel: Arc<WebviewPanel>) -> Self {
        Self { runtime, panel }
    }

    pub fn id(&self) -> &str {
        self.panel.id()
    }

    pub fn view_type(&self) -> &str {
        self.panel.view_type()
    }

    pub fn title(&self) -> String {
        self.panel.title()
    }

    pub fn set_title(&self, title: &str) {
        self.runtime.set_webview_title(self.panel.id(), title);
    }

    pub fn html(&self) -> String {
        self.panel.html()
    }

    /// Replace the rendered HTML; emits `webview-html-changed` once.
    pub fn set_html(&self, html: &str) {
        self.runtime.set_webview_html(self.panel.id(), html);
    }

    /// Post a message to the rendered surface. Resolves `false` when no
    /// surface is mounted or the panel is disposed.
    pub async fn post_message(&self, message: Value) -> bool {
        self.runtime
            .post_message_to_webview(self.panel.id(), message)
            .await
    }

    /// Register a handler for messages sent by the rendered surface.
    pub fn on_did_receive_message(
        &self,
        handler: impl Fn(&Value) + Send + Sync + 'static,
    ) -> Disposable {
        let token = self.panel.add_message_handler(handler);
        let panel = Arc::clone(&self.panel);
        Disposable::new(move || {
            panel.remove_message_handler(token);
        })
    }

    /// Register a callback fired exactly once on disposal.
    pub fn on_did_dispose(&self, listener: impl FnOnce() + Send + 'static) {
        self.panel.on_dispose(listener);
    }

    pub fn visible(&self) -> bool {
        self.panel.is_visible()
    }

    pub fn active(&self) -> bool {
        self.panel.is_active()
    }

    pub fn is_disposed(&self) -> bool {
        self.panel.is_disposed()
    }

    pub fn dispose(&self) {
        self.runtime.dispose_webview_panel(self.panel.id());
    }

    /// The underlying panel record.
    pub fn panel(&self) -> &Arc<WebviewPanel> {
        &self.panel
    }
}

/// Handle over a named output channel.
#[derive(Clone)]
pub struct OutputChannelHandle {
    runtime: Arc<ExtensionRuntime>,
    channel: Arc<OutputChannel>,
}

impl OutputChannelHandle {
    pub fn name(&self) -> &str {
        self.channel.name()
    }

    pub fn append(&self, text: &str) {
        self.channel.append(text);
    }

    pub fn append_line(&self, text: &str) {
        self.channel.append_line(text);
    }

    pub fn clear(&self) {
        self.channel.clear();
    }

    pub fn content(&self) -> String {
        self.channel.content()
    }

    /// Ask the UI to reveal this channel.
    pub fn show(&self) {
        self.runtime.show_output_channel(self.channel.name());
    }

    /// Clears the buffer; the channel name stays known to the host.
    pub fn dispose(&self) {
        self.channel.clear();
    }
}

struct StatusBarItemState {
    text: String,
    tooltip: Option<String>,
}

/// A status bar item controlled by the extension.
pub struct StatusBarItem {
    runtime: Arc<ExtensionRuntime>,
    item_id: String,
    alignment: StatusBarAlignment,
    priority: Option<i32>,
    state: Mutex<StatusBarItemState>,
}

impl StatusBarItem {
    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn alignment(&self) -> StatusBarAlignment {
        self.alignment
    }

    pub fn text(&self) -> String {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .text
            .clone()
    }

    pub fn set_text(&self, text: &str) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .text = text.to_string();
    }

    pub fn set_tooltip(&self, tooltip: Option<String>) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tooltip = tooltip;
    }

    /// Emit the item's current state for the UI to display.
    pub fn show(&self) {
        let (text, tooltip) = {
            let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            (state.text.clone(), state.tooltip.clone())
        };
        self.runtime
            .show_status_bar_item(&self.item_id, &text, tooltip, self.alignment, self.priority);
    }

    pub fn hide(&self) {
        self.runtime.hide_status_bar_item(&self.item_id);
    }

    pub fn dispose(&self) {
        self.hide();
    }
}

/// Handle over a registered tree view.
pub struct TreeView {
    view_id: String,
    registration: Disposable,
}

impl TreeView {
    pub fn view_id(&self) -> &str {
        &self.view_id
    }

    pub fn dispose(&self) {
        self.registration.dispose();
    }
}

/// The `window` capability group bound to one extension.
pub struct WindowApi {
    runtime: Arc<ExtensionRuntime>,
    extension_id: String,
}

impl WindowApi {
    pub(crate) fn new(runtime: Arc<ExtensionRuntime>, extension_id: &str) -> Self {
        Self {
            runtime,
            extension_id: extension_id.to_string(),
        }
    }

    /// Create a webview panel owned by this extension.
    ///
    /// The column is accepted for signature compatibility; panel placement
    /// is decided by the hosting UI.
    pub fn create_webview_panel(
        &self,
        view_type: &str,
        title: &str,
        _column: ViewColumn,
        options: WebviewOptions,
    ) -> WebviewPanelHandle {
        let panel =
            self.runtime
                .create_webview_panel(&self.extension_id, view_type, title, options);
        WebviewPanelHandle::new(Arc::clone(&self.runtime), panel)
    }

    pub async fn show_information_message(
        &self,
        message: &str,
        items: &[String],
    ) -> Option<String> {
        self.runtime
            .show_message(MessageSeverity::Info, message, items);
        None
    }

    pub async fn show_warning_message(&self, message: &str, items: &[String]) -> Option<String> {
        self.runtime
            .show_message(MessageSeverity::Warning, message, items);
        None
    }

    pub async fn show_error_message(&self, message: &str, items: &[String]) -> Option<String> {
        self.runtime
            .show_message(MessageSeverity::Error, message, items);
        None
    }

    pub async fn show_quick_pick(
        &self,
        items: &[String],
        placeholder: Option<&str>,
    ) -> Option<String> {
        self.runtime
            .show_quick_pick(items.to_vec(), placeholder.map(str::to_string));
        None
    }

    pub async fn show_input_box(&self, options: InputBoxOptions) -> Option<String> {
        self.runtime
            .show_input_box(options.prompt, options.placeholder, options.value);
        None
    }

    /// Get or create a named output channel.
    pub fn create_output_channel(&self, name: &str) -> OutputChannelHandle {
        OutputChannelHandle {
            runtime: Arc::clone(&self.runtime),
            channel: self.runtime.output_channel(name),
        }
    }

    /// Create a status bar item; nothing is shown until `show` is called.
    pub fn create_status_bar_item(
        &self,
        alignment: StatusBarAlignment,
        priority: Option<i32>,
    ) -> StatusBarItem {
        let sequence = STATUS_BAR_SEQ.fetch_add(1, Ordering::Relaxed);
        StatusBarItem {
            runtime: Arc::clone(&self.runtime),
            item_id: format!("{}.statusbar-{sequence}", self.extension_id),
            alignment,
            priority,
            state: Mutex::new(StatusBarItemState {
                text: String::new(),
                tooltip: None,
            }),
        }
    }

    /// Emit a transient status bar message.
    pub fn set_status_bar_message(&self, text: &str, timeout_ms: Option<u64>) {
        self.runtime.set_status_bar_message(text, timeout_ms);
    }

    /// Register a tree data provider for a contributed view id.
    pub fn register_tree_data_provider(
        &self,
        view_id: &str,
        provider: Arc<dyn TreeDataProvider>,
    ) -> Disposable {
        self.runtime
            .register_tree_data_provider(&self.extension_id, view_id, provider)
    }

    /// Register a provider and return a handle to the resulting view.
    pub fn create_tree_view(
        &self,
        view_id: &str,
        provider: Arc<dyn TreeDataProvider>,
    ) -> TreeView {
        let registration = self.register_tree_data_provider(view_id, provider);
        TreeView {
            view_id: view_id.to_string(),
            registration,
        }
    }
}
