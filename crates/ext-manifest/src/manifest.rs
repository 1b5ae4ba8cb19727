//! Extension manifest parsing for `package.json` files.
//!
//! An extension manifest declares identity, entry points, and contribution
//! points for an installable extension package. The canonical filename is
//! [`MANIFEST_FILENAME`](crate::MANIFEST_FILENAME) (`package.json`), read from
//! the root of the extension directory. Display strings may be localized
//! through a sibling `package.nls.json` bundle using `%key%` placeholders.
//!
//! # Example JSON
//!
//! ```json
//! {
//!   "name": "markdown-tools",
//!   "publisher": "acme",
//!   "version": "1.2.0",
//!   "displayName": "%ext.displayName%",
//!   "description": "Markdown helpers",
//!   "main": "./out/extension.js",
//!   "engines": { "vscode": "^1.85.0" },
//!   "contributes": {
//!     "commands": [
//!       { "command": "markdown.preview", "title": "Open Preview" }
//!     ]
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::NLS_FILENAME;
use crate::contributions::ManifestContributions;
use crate::error::{Error, Result};

/// Complete extension manifest loaded from `package.json`.
///
/// Immutable once parsed; localization is applied during loading, before the
/// manifest is handed to any consumer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionManifest {
    /// Package name (e.g., "markdown-tools").
    pub name: String,
    /// Publisher identifier (e.g., "acme").
    pub publisher: String,
    /// Version string, kept opaque.
    pub version: String,
    /// Human-readable name shown in UI; falls back to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Short description of the extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Icon path relative to the extension directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Script entry point for desktop hosts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    /// Script entry point for browser hosts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,
    /// Engine compatibility ranges (e.g., `"vscode": "^1.85.0"`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub engines: BTreeMap<String, String>,
    /// Marketplace categories.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    /// Declared activation events.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activation_events: Vec<String>,
    /// Declared contribution points.
    #[serde(default)]
    pub contributes: ManifestContributions,
}

impl ExtensionManifest {
    /// Parse an extension manifest from a JSON string.
    ///
    /// Line and block comments are tolerated, matching the relaxed JSON
    /// accepted by mainstream editors for `package.json` files.
    pub fn from_json(content: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(&strip_json_comments(content))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Parse a manifest and apply an optional `package.nls.json` bundle.
    ///
    /// An unreadable bundle is logged and ignored; it never fails the parse.
    pub fn from_json_localized(content: &str, nls: Option<&str>) -> Result<Self> {
        let mut manifest = Self::from_json(content)?;
        if let Some(nls) = nls {
            match parse_nls_bundle(nls) {
                Ok(bundle) => manifest.localize(&bundle),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring unreadable localization bundle");
                }
            }
        }
        Ok(manifest)
    }

    /// Read and parse an extension manifest from a file path.
    ///
    /// A sibling `package.nls.json` is applied automatically when present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ManifestNotFound`] if the file does not exist.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ManifestNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let nls = path
            .parent()
            .map(|dir| dir.join(NLS_FILENAME))
            .filter(|p| p.exists())
            .and_then(|p| std::fs::read_to_string(&p).ok());
        Self::from_json_localized(&content, nls.as_deref())
    }

    /// The extension identity, `publisher.name`.
    pub fn id(&self) -> String {
        format!("{}.{}", self.publisher, self.name)
    }

    /// The label used for display and sorting: `displayName` or `name`.
    pub fn display_label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// The declared script entry point, preferring `main` over `browser`.
    pub fn entry_point(&self) -> Option<&str> {
        self.main.as_deref().or(self.browser.as_deref())
    }

    /// Replace `%key%` placeholders in display strings from an nls bundle.
    ///
    /// Placeholders with no matching key pass through unchanged.
    pub fn localize(&mut self, bundle: &BTreeMap<String, String>) {
        if let Some(ref display_name) = self.display_name {
            self.display_name = Some(resolve_placeholder(display_name, bundle));
        }
        if let Some(ref description) = self.description {
            self.description = Some(resolve_placeholder(description, bundle));
        }
    }

    /// Validate the manifest fields.
    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::InvalidManifest {
                reason: "name must not be empty".to_string(),
            });
        }
        if self.publisher.is_empty() {
            return Err(Error::InvalidManifest {
                reason: "publisher must not be empty".to_string(),
            });
        }
        if self.version.is_empty() {
            return Err(Error::InvalidManifest {
                reason: "version must not be empty".to_string(),
            });
        }

        for (field, value) in [("name", &self.name), ("publisher", &self.publisher)] {
            if !value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                return Err(Error::InvalidId {
                    id: format!("{}.{}", self.publisher, self.name),
                    reason: format!(
                        "{field} must contain only alphanumeric characters, hyphens, or underscores"
                    ),
                });
            }
        }

        Ok(())
    }
}

/// Parse a `package.nls.json` bundle into a key/value map.
///
/// Values may be plain strings or `{ "message": "...", "comment": [...] }`
/// objects; anything else is skipped.
pub fn parse_nls_bundle(content: &str) -> Result<BTreeMap<String, String>> {
    let raw: BTreeMap<String, serde_json::Value> =
        serde_json::from_str(&strip_json_comments(content))?;

    let mut bundle = BTreeMap::new();
    for (key, value) in raw {
        match value {
            serde_json::Value::String(s) => {
                bundle.insert(key, s);
            }
            serde_json::Value::Object(map) => {
                if let Some(serde_json::Value::String(message)) = map.get("message") {
                    bundle.insert(key, message.clone());
                }
            }
            _ => {}
        }
    }
    Ok(bundle)
}

/// Resolve a single `%key%` placeholder against an nls bundle.
fn resolve_placeholder(value: &str, bundle: &BTreeMap<String, String>) -> String {
    if value.len() > 2 && value.starts_with('%') && value.ends_with('%') {
        let key = &value[1..value.len() - 1];
        if let Some(resolved) = bundle.get(key) {
            return resolved.clone();
        }
    }
    value.to_string()
}

/// Remove `//` and `/* */` comments from JSON text, leaving string
/// contents untouched.
fn strip_json_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' => match chars.peek() {
                Some('/') => {
                    while let Some(&next) = chars.peek() {
                        if next == '\n' {
                            break;
                        }
                        chars.next();
                    }
                }
                Some('*') => {
                    chars.next();
                    let mut prev = '\0';
                    for next in chars.by_ref() {
                        if prev == '*' && next == '/' {
                            break;
                        }
                        prev = next;
                    }
                }
                _ => out.push(c),
            },
            _ => out.push(c),
        }
    }

    out
}
