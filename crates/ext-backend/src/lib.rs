//! Host backend boundary for the extension host.
//!
//! The extension core reaches the host application only through the types in
//! this crate: the [`HostBackend`] invocation trait for file, git, and
//! terminal operations, the [`SettingsStore`] for persisted extension
//! settings, and the [`StateStore`] for per-panel webview state.

pub mod backend;
pub mod checksum;
pub mod error;
pub mod local;
pub mod settings;
pub mod state;

pub use backend::{
    DirectoryEntry, FileReadResult, FileWriteResult, GitChange, GitStatusResult, HostBackend,
    SearchMatch, SearchResult, TerminalResult, WriteOptions,
};
pub use checksum::content_checksum;
pub use error::{Error, Result};
pub use local::LocalBackend;
pub use settings::{SETTINGS_FILENAME, SettingsStore};
pub use state::{FileStateStore, MemoryStateStore, StateKey, StateStore};
