//! Host event bus.
//!
//! Every observable runtime occurrence is a [`HostEvent`] variant dispatched
//! through a single [`EventBus`]. UI layers subscribe once and match on the
//! variants they care about instead of juggling per-event channel names.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

/// Severity of a user-facing message request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSeverity {
    Info,
    Warning,
    Error,
}

/// Side of the status bar an item is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusBarAlignment {
    Left,
    Right,
}

impl StatusBarAlignment {
    /// Numeric value used by the compatibility API surface.
    pub const fn value(self) -> i32 {
        match self {
            Self::Left => 1,
            Self::Right => 2,
        }
    }
}

/// An event emitted by the runtime for UI consumption.
///
/// Serializes with an `event` tag carrying the wire name (also available via
/// [`HostEvent::name`]) and camelCase payload fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum HostEvent {
    ExtensionActivated {
        extension_id: String,
    },
    ExtensionDeactivated {
        extension_id: String,
    },
    WebviewCreated {
        panel_id: String,
        extension_id: String,
        view_type: String,
        title: String,
    },
    WebviewHtmlChanged {
        panel_id: String,
        html: String,
    },
    WebviewDisposed {
        panel_id: String,
        extension_id: String,
    },
    /// A message posted by an extension toward a rendered webview surface.
    WebviewMessage {
        panel_id: String,
        message: serde_json::Value,
    },
    ShowMessage {
        severity: MessageSeverity,
        message: String,
        items: Vec<String>,
    },
    ShowInputBox {
        prompt: Option<String>,
        placeholder: Option<String>,
        value: Option<String>,
    },
    ShowQuickPick {
        items: Vec<String>,
        placeholder: Option<String>,
    },
    StatusbarShow {
        item_id: String,
        text: String,
        tooltip: Option<String>,
        alignment: StatusBarAlignment,
        priority: Option<i32>,
    },
    StatusbarHide {
        item_id: String,
    },
    StatusbarMessage {
        text: String,
        timeout_ms: Option<u64>,
    },
    ShowOutputChannel {
        name: String,
    },
}

impl HostEvent {
    /// Wire name of the event, matching the serialized `event` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ExtensionActivated { .. } => "extension-activated",
            Self::ExtensionDeactivated { .. } => "extension-deactivated",
            Self::WebviewCreated { .. } => "webview-created",
            Self::WebviewHtmlChanged { .. } => "webview-html-changed",
            Self::WebviewDisposed { .. } => "webview-disposed",
            Self::WebviewMessage { .. } => "webview-message",
            Self::ShowMessage { .. } => "show-message",
            Self::ShowInputBox { .. } => "show-input-box",
            Self::ShowQuickPick { .. } => "show-quick-pick",
            Self::StatusbarShow { .. } => "statusbar-show",
            Self::StatusbarHide { .. } => "statusbar-hide",
            Self::StatusbarMessage { .. } => "statusbar-message",
            Self::ShowOutputChannel { .. } => "show-output-channel",
        }
    }
}

/// Callback invoked for every emitted event.
pub type EventSubscriber = Arc<dyn Fn(&HostEvent) + Send + Sync>;

/// Identifier returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Synchronous publish/subscribe dispatcher.
///
/// Delivery happens on the emitting thread, in subscription order. The
/// subscriber list is snapshotted at emit time, so a subscriber added during
/// delivery is not invoked for that same emission, and one removed during
/// delivery still receives it.
pub struct EventBus {
    subscribers: Mutex<Vec<(SubscriptionId, EventSubscriber)>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a subscriber for all events.
    pub fn subscribe(&self, subscriber: impl Fn(&HostEvent) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(subscriber)));
        id
    }

    /// Remove a subscriber. Returns `false` if the id was already removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        subscribers.len() != before
    }

    /// Deliver `event` to every current subscriber.
    pub fn emit(&self, event: &HostEvent) {
        let snapshot: Vec<EventSubscriber> = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, subscriber)| Arc::clone(subscriber))
            .collect();
        tracing::trace!(event = event.name(), subscribers = snapshot.len(), "emitting host event");
        for subscriber in snapshot {
            subscriber(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
