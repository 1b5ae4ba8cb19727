//! Webview panel records.
//!
//! A panel is created through [`crate::ExtensionRuntime::create_webview_panel`]
//! and mutated through the runtime so the matching events fire; the record
//! itself only exposes its state and the handler lists.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Creation options carried by a panel for the bridge to honor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebviewOptions {
    pub enable_scripts: bool,
    pub retain_context_when_hidden: bool,
    pub local_resource_roots: Vec<PathBuf>,
}

/// Callback invoked with messages sent from the rendered surface.
pub type MessageHandler = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Debug)]
struct PanelState {
    title: String,
    html: String,
    visible: bool,
    active: bool,
    mounted: bool,
    disposed: bool,
}

/// A live webview panel owned by an extension.
pub struct WebviewPanel {
    id: String,
    extension_id: String,
    view_type: String,
    created_at: DateTime<Utc>,
    options: WebviewOptions,
    state: Mutex<PanelState>,
    handlers: Mutex<Vec<(u64, MessageHandler)>>,
    next_handler_token: AtomicU64,
    dispose_listeners: Mutex<Vec<Box<dyn FnOnce() + Send>>>,
}

impl WebviewPanel {
    pub(crate) fn new(
        id: String,
        extension_id: String,
        view_type: String,
        title: String,
        options: WebviewOptions,
    ) -> Self {
        Self {
            id,
            extension_id,
            view_type,
            created_at: Utc::now(),
            options,
            state: Mutex::new(PanelState {
                title,
                html: String::new(),
                visible: true,
                active: true,
                mounted: false,
                disposed: false,
            }),
            handlers: Mutex::new(Vec::new()),
            next_handler_token: AtomicU64::new(1),
            dispose_listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn extension_id(&self) -> &str {
        &self.extension_id
    }

    pub fn view_type(&self) -> &str {
        &self.view_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn options(&self) -> &WebviewOptions {
        &self.options
    }

    pub fn title(&self) -> String {
        self.state().title.clone()
    }

    pub fn html(&self) -> String {
        self.state().html.clone()
    }

    pub fn is_visible(&self) -> bool {
        self.state().visible
    }

    pub fn is_active(&self) -> bool {
        self.state().active
    }

    /// Whether a rendered surface is currently mounted for this panel.
    pub fn is_mounted(&self) -> bool {
        self.state().mounted
    }

    pub fn is_disposed(&self) -> bool {
        self.state().disposed
    }

    /// Register a handler for messages arriving from the rendered surface.
    /// Returns a token accepted by [`Self::remove_message_handler`].
    pub fn add_message_handler(&self, handler: impl Fn(&Value) + Send + Sync + 'static) -> u64 {
        let token = self.next_handler_token.fetch_add(1, Ordering::Relaxed);
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((token, Arc::new(handler)));
        token
    }

    pub fn remove_message_handler(&self, token: u64) -> bool {
        let mut handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        let before = handlers.len();
        handlers.retain(|(t, _)| *t != token);
        handlers.len() != before
    }

    pub fn message_handler_count(&self) -> usize {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Register a callback fired exactly once when the panel is disposed.
    /// On an already-disposed panel the callback runs immediately.
    pub fn on_dispose(&self, listener: impl FnOnce() + Send + 'static) {
        let disposed = self.state().disposed;
        if disposed {
            listener();
            return;
        }
        self.dispose_listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(listener));
    }

    fn state(&self) -> std::sync::MutexGuard<'_, PanelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_title(&self, title: &str) -> bool {
        let mut state = self.state();
        if state.disposed {
            return false;
        }
        state.title = title.to_string();
        true
    }

    pub(crate) fn set_html(&self, html: &str) -> bool {
        let mut state = self.state();
        if state.disposed {
            return false;
        }
        state.html = html.to_string();
        true
    }

    pub(crate) fn set_view_state(&self, visible: bool, active: bool) -> bool {
        let mut state = self.state();
        if state.disposed {
            return false;
        }
        state.visible = visible;
        state.active = active;
        true
    }

    pub(crate) fn set_mounted(&self, mounted: bool) -> bool {
        let mut state = self.state();
        if state.disposed {
            return false;
        }
        state.mounted = mounted;
        true
    }

    /// Flip into the disposed state. Returns `false` if already disposed.
    pub(crate) fn mark_disposed(&self) -> bool {
        let mut state = self.state();
        if state.disposed {
            return false;
        }
        state.disposed = true;
        state.visible = false;
        state.active = false;
        state.mounted = false;
        true
    }

    pub(crate) fn handlers_snapshot(&self) -> Vec<MessageHandler> {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect()
    }

    pub(crate) fn clear_message_handlers(&self) {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub(crate) fn take_dispose_listeners(&self) -> Vec<Box<dyn FnOnce() + Send>> {
        self.dispose_listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }
}

impl std::fmt::Debug for WebviewPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("WebviewPanel")
            .field("id", &self.id)
            .field("extension_id", &self.extension_id)
            .field("view_type", &self.view_type)
            .field("title", &state.title)
            .field("visible", &state.visible)
            .field("disposed", &state.disposed)
            .finish()
    }
}
