//! The `env` namespace: clipboard, external URLs, host identifiers.

use std::sync::{Arc, Mutex, PoisonError};

use sha2::{Digest, Sha256};

use crate::uri::Uri;

/// In-process clipboard buffer.
///
/// The host UI owns the real system clipboard; extension code sees a
/// process-local buffer with the editor API's async shape.
#[derive(Clone, Default)]
pub struct ClipboardApi {
    buffer: Arc<Mutex<String>>,
}

impl ClipboardApi {
    pub async fn write_text(&self, text: &str) {
        *self.buffer.lock().unwrap_or_else(PoisonError::into_inner) = text.to_string();
    }

    pub async fn read_text(&self) -> String {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// The `env` capability group.
pub struct EnvApi {
    clipboard: ClipboardApi,
    machine_id: String,
    session_id: String,
    opened: Arc<Mutex<Vec<String>>>,
}

impl EnvApi {
    pub fn new() -> Self {
        Self {
            clipboard: ClipboardApi::default(),
            machine_id: derive_machine_id(),
            session_id: format!(
                "session-{}-{}",
                std::process::id(),
                chrono::Utc::now().timestamp_millis()
            ),
            opened: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn clipboard(&self) -> &ClipboardApi {
        &self.clipboard
    }

    pub fn app_name(&self) -> &'static str {
        "extension-host"
    }

    /// Stable per machine: derived from the OS name and home directory.
    pub fn machine_id(&self) -> &str {
        &self.machine_id
    }

    /// Unique per process.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Record a request to open a URL outside the host.
    ///
    /// The actual opening is up to the hosting UI; the request is recorded
    /// and reported as accepted.
    pub async fn open_external(&self, uri: &Uri) -> bool {
        let target = uri.to_string();
        tracing::info!(url = %target, "external open requested");
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(target);
        true
    }

    /// URLs passed to [`Self::open_external`], oldest first.
    pub fn opened_external(&self) -> Vec<String> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for EnvApi {
    fn default() -> Self {
        Self::new()
    }
}

fn derive_machine_id() -> String {
    let mut hasher = Sha256::new();
    hasher.update(std::env::consts::OS.as_bytes());
    if let Some(home) = dirs::home_dir() {
        hasher.update(home.to_string_lossy().as_bytes());
    }
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..32].to_string()
}
