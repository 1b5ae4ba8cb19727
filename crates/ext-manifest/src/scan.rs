//! Discovery of installed extensions on disk.
//!
//! An extensions directory contains one subdirectory per installed package,
//! each with a `package.json` at its root. Unreadable packages are skipped,
//! never aborting the scan.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::MANIFEST_FILENAME;
use crate::error::Result;
use crate::manifest::ExtensionManifest;

const DATA_DIR_NAME: &str = ".extension-host";
const VSCODE_EXTENSIONS_DIR: &str = ".vscode/extensions";

/// An extension package found on disk, with its parsed manifest.
#[derive(Debug, Clone)]
pub struct InstalledExtension {
    /// Extension identity, `publisher.name`.
    pub id: String,
    /// Absolute path to the extension directory.
    pub directory: PathBuf,
    /// Parsed, localized manifest with resolved contribution paths.
    pub manifest: ExtensionManifest,
}

impl InstalledExtension {
    /// Load a single extension from its directory.
    ///
    /// Applies localization, resolves contribution paths, and makes the icon
    /// path absolute (clearing it when the file is missing).
    pub fn load(directory: &Path) -> Result<Self> {
        let mut manifest = ExtensionManifest::from_path(&directory.join(MANIFEST_FILENAME))?;
        manifest.contributes.resolve_paths(directory);

        if let Some(icon) = manifest.icon.take() {
            let resolved = directory.join(icon.trim_start_matches("./"));
            if resolved.exists() {
                manifest.icon = Some(resolved.to_string_lossy().into_owned());
            } else {
                tracing::debug!(
                    extension = %manifest.id(),
                    path = %resolved.display(),
                    "icon file missing"
                );
            }
        }

        Ok(Self {
            id: manifest.id(),
            directory: directory.to_path_buf(),
            manifest,
        })
    }
}

/// Scan one extensions directory.
///
/// Subdirectories are visited in name order; entries without a readable
/// manifest are skipped with a logged warning. A missing directory yields an
/// empty list. The result is sorted by display label, case-insensitively.
pub fn scan_extensions_dir(dir: &Path) -> Result<Vec<InstalledExtension>> {
    let mut installed = Vec::new();
    collect_from_dir(dir, &mut installed, &mut HashSet::new())?;
    sort_by_label(&mut installed);
    Ok(installed)
}

/// Scan several extensions directories in precedence order.
///
/// When the same extension id appears more than once, the first occurrence
/// wins (earlier directory, then subdirectory name order). Directories that
/// cannot be read are skipped with a logged warning.
pub fn scan_extensions_dirs(dirs: &[PathBuf]) -> Vec<InstalledExtension> {
    let mut installed = Vec::new();
    let mut seen = HashSet::new();
    for dir in dirs {
        if let Err(e) = collect_from_dir(dir, &mut installed, &mut seen) {
            tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable extensions directory");
        }
    }
    sort_by_label(&mut installed);
    installed
}

/// The default directories searched for installed extensions: the host's own
/// data directory followed by the `.vscode` compatibility location.
pub fn default_extensions_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(home) = dirs::home_dir() {
        dirs.push(home.join(DATA_DIR_NAME).join("extensions"));
        dirs.push(home.join(VSCODE_EXTENSIONS_DIR));
    }
    dirs
}

fn collect_from_dir(
    dir: &Path,
    installed: &mut Vec<InstalledExtension>,
    seen: &mut HashSet<String>,
) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }

    let mut subdirs: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    subdirs.sort();

    for path in subdirs {
        match InstalledExtension::load(&path) {
            Ok(extension) => {
                if seen.insert(extension.id.clone()) {
                    installed.push(extension);
                } else {
                    tracing::debug!(
                        extension = %extension.id,
                        path = %path.display(),
                        "duplicate extension id, keeping first occurrence"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "skipping extension with unreadable manifest"
                );
            }
        }
    }
    Ok(())
}

fn sort_by_label(installed: &mut [InstalledExtension]) {
    installed.sort_by_key(|extension| extension.manifest.display_label().to_lowercase());
}
