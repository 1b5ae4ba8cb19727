//! Extension manifest parsing and contribution indexing.
//!
//! This crate models the declarative side of the extension system: reading
//! `package.json` manifests from installed extension packages, resolving
//! localized display strings and contribution file paths, and aggregating all
//! declared contributions into a single queryable [`ContributionIndex`].

pub mod contributions;
pub mod error;
pub mod index;
pub mod manifest;
pub mod scan;

/// The canonical filename for extension manifests.
///
/// Every installed extension places a file with this name at the root of its
/// package directory.
pub const MANIFEST_FILENAME: &str = "package.json";

/// The sidecar localization bundle consulted for `%key%` placeholders.
pub const NLS_FILENAME: &str = "package.nls.json";

pub use contributions::{
    CommandContribution, ConfigurationBlock, ConfigurationProperty, GrammarContribution,
    IconSpec, IconThemeContribution, LanguageContribution, ManifestContributions,
    MenuContribution, SnippetContribution, ThemeContribution, ViewContainerContribution,
    ViewContribution, ViewsContainers,
};
pub use error::{Error, Result};
pub use index::{
    ContainerLocation, ContributionIndex, Indexed, IndexedContainer, IndexedMenuItem,
    IndexedView, SharedContributionIndex,
};
pub use manifest::ExtensionManifest;
pub use scan::{
    InstalledExtension, default_extensions_dirs, scan_extensions_dir, scan_extensions_dirs,
};
