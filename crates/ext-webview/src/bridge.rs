//! Bidirectional message bridge between the host runtime and rendered
//! webview surfaces.
//!
//! The hosting UI mounts a surface for a panel and receives an opaque token;
//! every message delivered on behalf of that surface must carry the token, so
//! a stale or foreign surface cannot speak for a panel it no longer owns.
//! `setState` traffic is absorbed into the state store instead of reaching
//! the extension's message handlers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use ext_backend::{StateKey, StateStore};
use ext_runtime::{ExtensionRuntime, HostEvent, SubscriptionId};
use serde_json::Value;

use crate::document::{
    self, MESSAGE_PAYLOAD_FIELD, MESSAGE_SOURCE_FIELD, MESSAGE_SOURCE_POST, MESSAGE_SOURCE_STATE,
};

/// Outcome of delivering a surface-originated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The message reached the panel's registered handlers.
    Forwarded,
    /// The message was a state update and was absorbed into the state store.
    StateSaved,
    /// The token did not match the panel's mounted surface; dropped.
    Rejected,
}

/// Connects rendered surfaces to the runtime's panels and the state store.
pub struct WebviewBridge {
    runtime: Arc<ExtensionRuntime>,
    store: Arc<dyn StateStore>,
    mounts: Arc<Mutex<HashMap<String, String>>>,
    seq: AtomicU64,
    purge_subscription: SubscriptionId,
}

impl WebviewBridge {
    /// Build a bridge over a runtime, persisting webview state in `store`.
    pub fn new(runtime: Arc<ExtensionRuntime>, store: Arc<dyn StateStore>) -> Self {
        let mounts: Arc<Mutex<HashMap<String, String>>> = Arc::default();
        let purge = Arc::clone(&mounts);
        let purge_subscription = runtime.subscribe(move |event| {
            if let HostEvent::WebviewDisposed { panel_id, .. } = event {
                purge
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(panel_id);
            }
        });
        Self {
            runtime,
            store,
            mounts,
            seq: AtomicU64::new(1),
            purge_subscription,
        }
    }

    /// Mount a rendered surface for a panel and mint its message token.
    ///
    /// Mounting again replaces the previous token, revoking the old surface.
    /// Unknown or disposed panels cannot be mounted.
    pub fn mount(&self, panel_id: &str) -> Option<String> {
        let panel = self.runtime.webview_panel(panel_id)?;
        if panel.is_disposed() {
            return None;
        }
        let token = format!(
            "wv-{}-{}",
            Utc::now().timestamp_millis(),
            self.seq.fetch_add(1, Ordering::Relaxed)
        );
        self.mounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(panel_id.to_string(), token.clone());
        self.runtime.set_webview_mounted(panel_id, true);
        tracing::debug!(panel = %panel_id, "webview surface mounted");
        Some(token)
    }

    /// Unmount a panel's surface, revoking its token.
    pub fn unmount(&self, panel_id: &str) -> bool {
        let removed = self
            .mounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(panel_id)
            .is_some();
        if removed {
            self.runtime.set_webview_mounted(panel_id, false);
            tracing::debug!(panel = %panel_id, "webview surface unmounted");
        }
        removed
    }

    pub fn is_mounted(&self, panel_id: &str) -> bool {
        self.mounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(panel_id)
    }

    /// Render a panel's HTML into a sandbox-ready document with its saved
    /// state embedded.
    pub fn render_document(&self, panel_id: &str) -> Option<String> {
        let panel = self.runtime.webview_panel(panel_id)?;
        let key = StateKey::new(panel.extension_id(), panel.view_type());
        let state = self.store.get(&key);
        Some(document::build_document(&panel, state.as_ref()))
    }

    /// Deliver a message that a rendered surface posted toward the host.
    ///
    /// `source_token` must match the token minted when the surface was
    /// mounted. State updates are persisted and absorbed; everything else is
    /// forwarded to the panel's message handlers in registration order.
    pub fn deliver(&self, panel_id: &str, source_token: &str, message: &Value) -> Delivery {
        let authorized = self
            .mounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(panel_id)
            .is_some_and(|token| token == source_token);
        if !authorized {
            tracing::warn!(panel = %panel_id, "message from unrecognized webview surface dropped");
            return Delivery::Rejected;
        }
        let Some(panel) = self.runtime.webview_panel(panel_id) else {
            return Delivery::Rejected;
        };

        match envelope(message) {
            Some((MESSAGE_SOURCE_STATE, payload)) => {
                let key = StateKey::new(panel.extension_id(), panel.view_type());
                if let Err(error) = self.store.set(&key, payload.clone()) {
                    tracing::warn!(panel = %panel_id, %error, "failed to persist webview state");
                }
                Delivery::StateSaved
            }
            Some((MESSAGE_SOURCE_POST, payload)) => {
                self.runtime.send_message_to_webview(panel_id, payload);
                Delivery::Forwarded
            }
            _ => {
                self.runtime.send_message_to_webview(panel_id, message);
                Delivery::Forwarded
            }
        }
    }

    /// Post a host-side message toward a panel's rendered surface.
    ///
    /// Resolves `false` when the panel is unknown, disposed, or unmounted.
    pub async fn post_to_panel(&self, panel_id: &str, message: Value) -> bool {
        self.runtime.post_message_to_webview(panel_id, message).await
    }
}

impl Drop for WebviewBridge {
    fn drop(&mut self) {
        self.runtime.unsubscribe(self.purge_subscription);
    }
}

/// Split a bridge envelope into its source and payload, when shaped as one.
fn envelope(message: &Value) -> Option<(&str, &Value)> {
    let object = message.as_object()?;
    let source = object.get(MESSAGE_SOURCE_FIELD)?.as_str()?;
    let payload = object.get(MESSAGE_PAYLOAD_FIELD)?;
    Some((source, payload))
}
