//! Editor-compatible API surface for extension code.
//!
//! [`CompatApi::build`] produces, for one extension id and install path, an
//! object graph that mirrors the editor extension API shape closely enough
//! for ported extension logic to run against the host runtime: `commands`,
//! `window`, `workspace`, `env`, `extensions`, plus inert stubs for the
//! namespaces the host does not implement. The builder itself is stateless;
//! everything routes into [`ext_runtime::ExtensionRuntime`] and the host
//! backend services.

pub mod api;
pub mod cancellation;
pub mod emitter;
pub mod enums;
pub mod env;
pub mod error;
pub mod extensions;
pub mod stubs;
pub mod uri;
pub mod window;
pub mod workspace;

pub use api::{CommandsApi, CompatApi, HostServices};
pub use cancellation::{CancellationToken, CancellationTokenSource};
pub use emitter::EventEmitter;
pub use enums::{ConfigurationTarget, DiagnosticSeverity, EndOfLine, FileType, ViewColumn};
pub use env::{ClipboardApi, EnvApi};
pub use error::{Error, Result};
pub use extensions::{ExtensionInfo, ExtensionsApi};
pub use stubs::StubNamespace;
pub use uri::Uri;
pub use window::{
    InputBoxOptions, OutputChannelHandle, StatusBarItem, TreeView, WebviewPanelHandle, WindowApi,
};
pub use workspace::{ConfigurationAccessor, FsApi, WorkspaceApi, WorkspaceFolder};

pub use ext_runtime::{
    Disposable, StatusBarAlignment, TreeDataProvider, TreeItem, TreeItemCollapsibleState,
    WebviewOptions,
};
