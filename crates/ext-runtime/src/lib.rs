//! Extension runtime for the host.
//!
//! Owns the lifecycle of activated extension packages and every process-wide
//! registry they populate: commands, webview panels, tree views, and output
//! channels. UI layers drive it through [`ExtensionRuntime`] and observe it
//! through the [`HostEvent`] bus; the compatibility API layer routes
//! extension-facing calls into it.

pub mod commands;
pub mod context;
pub mod disposable;
pub mod entry;
pub mod error;
pub mod events;
pub mod output;
pub mod panels;
pub mod runtime;
pub mod tree;

pub use commands::{CommandHandler, CommandRegistry, command_fn};
pub use context::{ExtensionContext, Memento};
pub use disposable::Disposable;
pub use entry::ExtensionEntryPoint;
pub use error::{Error, Result};
pub use events::{EventBus, EventSubscriber, HostEvent, MessageSeverity, StatusBarAlignment, SubscriptionId};
pub use output::OutputChannel;
pub use panels::{MessageHandler, WebviewOptions, WebviewPanel};
pub use runtime::{ActiveExtension, ExtensionRuntime};
pub use tree::{RegisteredTreeView, TreeDataProvider, TreeItem, TreeItemCollapsibleState};
