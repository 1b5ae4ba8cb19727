//! In-process extension entry points.
//!
//! Extension packages declare a `main`/`browser` script the original editor
//! would execute. This host does not embed a script engine; instead, an
//! embedding application may register a native [`ExtensionEntryPoint`] for an
//! extension id. Activation runs it when present and otherwise records the
//! extension as activated without execution.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::ExtensionContext;
use crate::error::Result;

/// Native stand-in for an extension's activation script.
#[async_trait]
pub trait ExtensionEntryPoint: Send + Sync {
    /// Runs during activation, after the extension's record is registered.
    /// The returned value becomes the extension's `exports`.
    async fn activate(&self, context: Arc<ExtensionContext>) -> Result<Value>;

    /// Runs at the start of deactivation.
    async fn deactivate(&self) -> Result<()> {
        Ok(())
    }
}
