//! The per-extension API object graph.
//!
//! [`CompatApi::build`] assembles the namespaces an extension sees. The
//! builder holds no state of its own: every registration closes over the
//! shared [`HostServices`] and the binding extension id, so all effects land
//! in the runtime's tables under that id.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use ext_backend::{HostBackend, SettingsStore};
use ext_manifest::SharedContributionIndex;
use ext_runtime::{CommandHandler, Disposable, ExtensionRuntime};

use crate::env::EnvApi;
use crate::error::Result;
use crate::extensions::ExtensionsApi;
use crate::stubs::StubNamespace;
use crate::window::WindowApi;
use crate::workspace::WorkspaceApi;

/// Shared host components the API surface is built over.
#[derive(Clone)]
pub struct HostServices {
    pub runtime: Arc<ExtensionRuntime>,
    pub backend: Arc<dyn HostBackend>,
    pub settings: Arc<SettingsStore>,
    pub contributions: Arc<SharedContributionIndex>,
    pub env: Arc<EnvApi>,
    pub workspace_folders: Vec<PathBuf>,
}

/// The `commands` capability group bound to one extension.
pub struct CommandsApi {
    runtime: Arc<ExtensionRuntime>,
    extension_id: String,
}

impl CommandsApi {
    pub(crate) fn new(runtime: Arc<ExtensionRuntime>, extension_id: &str) -> Self {
        Self {
            runtime,
            extension_id: extension_id.to_string(),
        }
    }

    /// Register a command owned by this extension.
    pub fn register_command(
        &self,
        command_id: &str,
        handler: Arc<dyn CommandHandler>,
    ) -> Disposable {
        self.runtime
            .register_command(&self.extension_id, command_id, handler)
    }

    /// Execute any registered command. Missing commands resolve to `None`.
    pub async fn execute_command(
        &self,
        command_id: &str,
        args: &[Value],
    ) -> Result<Option<Value>> {
        Ok(self.runtime.execute_command(command_id, args).await?)
    }

    /// All registered command ids, sorted.
    pub fn get_commands(&self) -> Vec<String> {
        self.runtime.registered_commands()
    }
}

/// The API object graph handed to one extension activation.
pub struct CompatApi {
    extension_id: String,
    extension_path: PathBuf,
    pub commands: CommandsApi,
    pub window: WindowApi,
    pub workspace: WorkspaceApi,
    pub env: Arc<EnvApi>,
    pub extensions: ExtensionsApi,
    pub languages: StubNamespace,
    pub debug: StubNamespace,
    pub tasks: StubNamespace,
    pub authentication: StubNamespace,
    pub scm: StubNamespace,
    pub tests: StubNamespace,
    pub comments: StubNamespace,
    pub notebooks: StubNamespace,
}

impl CompatApi {
    /// Build the API surface for one extension.
    pub fn build(extension_id: &str, extension_path: &Path, services: &HostServices) -> Self {
        Self {
            extension_id: extension_id.to_string(),
            extension_path: extension_path.to_path_buf(),
            commands: CommandsApi::new(Arc::clone(&services.runtime), extension_id),
            window: WindowApi::new(Arc::clone(&services.runtime), extension_id),
            workspace: WorkspaceApi::new(
                Arc::clone(&services.backend),
                Arc::clone(&services.settings),
                Arc::clone(&services.contributions),
                &services.workspace_folders,
            ),
            env: Arc::clone(&services.env),
            extensions: ExtensionsApi::new(Arc::clone(&services.runtime)),
            languages: StubNamespace::new("languages"),
            debug: StubNamespace::new("debug"),
            tasks: StubNamespace::new("tasks"),
            authentication: StubNamespace::new("authentication"),
            scm: StubNamespace::new("scm"),
            tests: StubNamespace::new("tests"),
            comments: StubNamespace::new("comments"),
            notebooks: StubNamespace::new("notebooks"),
        }
    }

    /// The extension id this API is bound to.
    pub fn extension_id(&self) -> &str {
        &self.extension_id
    }

    /// The extension's install directory.
    pub fn extension_path(&self) -> &Path {
        &self.extension_path
    }
}
