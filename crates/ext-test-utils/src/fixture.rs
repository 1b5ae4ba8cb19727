//! [`ExtensionFixture`] builder for extension-host test scenarios.
//!
//! Extracted from early drafts of `tests/integration` to enable reuse across
//! all crates in the workspace.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;

use crate::manifest::ManifestBuilder;

/// A temporary host layout with an extensions directory and a storage root,
/// plus helper methods for installing extension packages.
///
/// # Example
///
/// ```rust
/// use ext_test_utils::fixture::ExtensionFixture;
/// use ext_test_utils::manifest::ManifestBuilder;
///
/// let fixture = ExtensionFixture::new();
/// let dir = fixture.install(&ManifestBuilder::new("acme", "demo"));
/// assert!(dir.join("package.json").exists());
/// ```
pub struct ExtensionFixture {
    temp_dir: TempDir,
}

impl Default for ExtensionFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionFixture {
    /// Create the layout: `extensions/` and `storage/` under a temp root.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("ExtensionFixture: failed to create temp dir");
        fs::create_dir_all(temp_dir.path().join("extensions")).unwrap();
        fs::create_dir_all(temp_dir.path().join("storage")).unwrap();
        Self { temp_dir }
    }

    /// Return the root path of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Directory that installed extension packages land in.
    pub fn extensions_dir(&self) -> PathBuf {
        self.root().join("extensions")
    }

    /// Storage root suitable for `ExtensionRuntime::with_storage_root`.
    pub fn storage_root(&self) -> PathBuf {
        self.root().join("storage")
    }

    /// Install an extension package: write its `package.json` under
    /// `extensions/{publisher}.{name}/` and return that directory.
    pub fn install(&self, manifest: &ManifestBuilder) -> PathBuf {
        self.install_json(&manifest.id(), &manifest.to_json())
    }

    /// Install an extension package together with a `package.nls.json`
    /// localization bundle.
    pub fn install_with_nls(&self, manifest: &ManifestBuilder, nls: &Value) -> PathBuf {
        let dir = self.install(manifest);
        fs::write(
            dir.join("package.nls.json"),
            serde_json::to_string_pretty(nls).unwrap(),
        )
        .unwrap();
        dir
    }

    /// Install raw manifest text under `extensions/{dir_name}/package.json`.
    ///
    /// Useful for malformed-manifest scenarios that `ManifestBuilder` refuses
    /// to produce.
    pub fn install_json(&self, dir_name: &str, content: &str) -> PathBuf {
        let dir = self.extensions_dir().join(dir_name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("package.json"), content).unwrap();
        dir
    }

    /// Write a file at `path` relative to the fixture root, creating parent
    /// directories as needed. Returns the absolute path.
    pub fn write_file(&self, path: &str, content: &str) -> PathBuf {
        let full_path = self.root().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full_path, content).unwrap();
        full_path
    }

    /// Assert that `path` (relative to the fixture root) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that the file at `path` (relative to root) contains `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, path: &str, content: &str) {
        let full_path = self.root().join(path);
        let file_content = fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()));
        assert!(
            file_content.contains(content),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            full_path.display(),
            content,
            file_content
        );
    }
}
