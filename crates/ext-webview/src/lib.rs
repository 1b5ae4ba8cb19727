//! Webview rendering and message plumbing.
//!
//! Extensions author panel HTML through the runtime; this crate turns that
//! HTML into a sandbox-ready document (content security policy, bridge
//! bootstrap script, persisted state) and brokers the message traffic between
//! the host and the rendered surface. The hosting UI is expected to load the
//! rendered document into an isolated frame and feed surface-originated
//! messages back through [`WebviewBridge::deliver`].

pub mod bridge;
pub mod document;

pub use bridge::{Delivery, WebviewBridge};
pub use document::{build_document, content_security_policy};
