//! Aggregated contribution index across installed extensions.
//!
//! The index flattens every manifest's `contributes` block into one queryable
//! structure per kind. Entries are deduplicated by a kind-specific identity
//! key, keeping the first occurrence and preserving insertion order so UI
//! listings stay stable across rebuilds.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use crate::contributions::{
    CommandContribution, ConfigurationBlock, GrammarContribution, IconThemeContribution,
    LanguageContribution, MenuContribution, SnippetContribution, ThemeContribution,
    ViewContainerContribution, ViewContribution,
};
use crate::scan::InstalledExtension;

/// A contribution together with the extension that declared it.
#[derive(Debug, Clone)]
pub struct Indexed<T> {
    pub extension_id: String,
    pub contribution: T,
}

/// Where a view container is anchored in the host shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerLocation {
    ActivityBar,
    Panel,
}

/// A view container with its anchor location.
#[derive(Debug, Clone)]
pub struct IndexedContainer {
    pub extension_id: String,
    pub location: ContainerLocation,
    pub container: ViewContainerContribution,
}

/// A view with the container it belongs to.
#[derive(Debug, Clone)]
pub struct IndexedView {
    pub extension_id: String,
    pub container_id: String,
    pub view: ViewContribution,
}

/// A menu entry with its menu location.
#[derive(Debug, Clone)]
pub struct IndexedMenuItem {
    pub extension_id: String,
    pub location: String,
    pub item: MenuContribution,
}

/// Immutable aggregated view over all installed manifests.
///
/// Queries are pure reads; a fresh index is built in full and then swapped in
/// through [`SharedContributionIndex::rebuild`], so readers never observe a
/// partially built state.
#[derive(Debug, Clone, Default)]
pub struct ContributionIndex {
    commands: Vec<Indexed<CommandContribution>>,
    containers: Vec<IndexedContainer>,
    views: Vec<IndexedView>,
    menus: Vec<IndexedMenuItem>,
    themes: Vec<Indexed<ThemeContribution>>,
    icon_themes: Vec<Indexed<IconThemeContribution>>,
    grammars: Vec<Indexed<GrammarContribution>>,
    languages: Vec<Indexed<LanguageContribution>>,
    snippets: Vec<Indexed<SnippetContribution>>,
    configurations: Vec<Indexed<ConfigurationBlock>>,
}

impl ContributionIndex {
    /// Build a fresh index over the given installed set.
    ///
    /// Building twice over the same set yields the same index.
    pub fn build(installed: &[InstalledExtension]) -> Self {
        let mut index = Self::default();
        let mut seen_commands = HashSet::new();
        let mut seen_containers = HashSet::new();
        let mut seen_views = HashSet::new();
        let mut seen_menus = HashSet::new();
        let mut seen_themes = HashSet::new();
        let mut seen_icon_themes = HashSet::new();
        let mut seen_grammars = HashSet::new();
        let mut seen_languages = HashSet::new();
        let mut seen_snippets = HashSet::new();
        let mut seen_configurations = HashSet::new();

        for extension in installed {
            let contributes = &extension.manifest.contributes;

            for command in &contributes.commands {
                if seen_commands.insert(command.command.clone()) {
                    index.commands.push(Indexed {
                        extension_id: extension.id.clone(),
                        contribution: command.clone(),
                    });
                } else {
                    tracing::debug!(
                        command = %command.command,
                        extension = %extension.id,
                        "duplicate command contribution ignored"
                    );
                }
            }

            let container_groups = [
                (ContainerLocation::ActivityBar, &contributes.views_containers.activitybar),
                (ContainerLocation::Panel, &contributes.views_containers.panel),
            ];
            for (location, containers) in container_groups {
                for container in containers {
                    if seen_containers.insert(container.id.clone()) {
                        index.containers.push(IndexedContainer {
                            extension_id: extension.id.clone(),
                            location,
                            container: container.clone(),
                        });
                    } else {
                        tracing::debug!(
                            container = %container.id,
                            extension = %extension.id,
                            "duplicate view container ignored"
                        );
                    }
                }
            }

            for (container_id, views) in &contributes.views {
                for view in views {
                    if seen_views.insert(view.id.clone()) {
                        index.views.push(IndexedView {
                            extension_id: extension.id.clone(),
                            container_id: container_id.clone(),
                            view: view.clone(),
                        });
                    }
                }
            }

            for (location, items) in &contributes.menus {
                for item in items {
                    let target = item
                        .command
                        .clone()
                        .or_else(|| item.submenu.clone())
                        .unwrap_or_default();
                    if seen_menus.insert((location.clone(), target)) {
                        index.menus.push(IndexedMenuItem {
                            extension_id: extension.id.clone(),
                            location: location.clone(),
                            item: item.clone(),
                        });
                    }
                }
            }

            for theme in &contributes.themes {
                if seen_themes.insert(theme.identity().to_string()) {
                    index.themes.push(Indexed {
                        extension_id: extension.id.clone(),
                        contribution: theme.clone(),
                    });
                }
            }

            for icon_theme in &contributes.icon_themes {
                if seen_icon_themes.insert(icon_theme.id.clone()) {
                    index.icon_themes.push(Indexed {
                        extension_id: extension.id.clone(),
                        contribution: icon_theme.clone(),
                    });
                }
            }

            for grammar in &contributes.grammars {
                if seen_grammars.insert(grammar.scope_name.clone()) {
                    index.grammars.push(Indexed {
                        extension_id: extension.id.clone(),
                        contribution: grammar.clone(),
                    });
                }
            }

            for language in &contributes.languages {
                if seen_languages.insert(language.id.clone()) {
                    index.languages.push(Indexed {
                        extension_id: extension.id.clone(),
                        contribution: language.clone(),
                    });
                }
            }

            for snippet in &contributes.snippets {
                if seen_snippets.insert((snippet.language.clone(), snippet.path.clone())) {
                    index.snippets.push(Indexed {
                        extension_id: extension.id.clone(),
                        contribution: snippet.clone(),
                    });
                }
            }

            for block in &contributes.configuration {
                let title = block.title.clone().unwrap_or_default();
                if seen_configurations.insert((extension.id.clone(), title)) {
                    index.configurations.push(Indexed {
                        extension_id: extension.id.clone(),
                        contribution: block.clone(),
                    });
                }
            }
        }

        index
    }

    pub fn commands(&self) -> &[Indexed<CommandContribution>] {
        &self.commands
    }

    /// Look up a contributed command by its id.
    pub fn command(&self, command_id: &str) -> Option<&Indexed<CommandContribution>> {
        self.commands
            .iter()
            .find(|entry| entry.contribution.command == command_id)
    }

    pub fn containers(&self) -> &[IndexedContainer] {
        &self.containers
    }

    pub fn container(&self, container_id: &str) -> Option<&IndexedContainer> {
        self.containers
            .iter()
            .find(|entry| entry.container.id == container_id)
    }

    pub fn views(&self) -> &[IndexedView] {
        &self.views
    }

    /// Views registered under a container, in declaration order.
    pub fn views_for_container(&self, container_id: &str) -> Vec<&IndexedView> {
        self.views
            .iter()
            .filter(|entry| entry.container_id == container_id)
            .collect()
    }

    pub fn menus(&self) -> &[IndexedMenuItem] {
        &self.menus
    }

    pub fn menu_items(&self, location: &str) -> Vec<&IndexedMenuItem> {
        self.menus
            .iter()
            .filter(|entry| entry.location == location)
            .collect()
    }

    pub fn themes(&self) -> &[Indexed<ThemeContribution>] {
        &self.themes
    }

    pub fn icon_themes(&self) -> &[Indexed<IconThemeContribution>] {
        &self.icon_themes
    }

    pub fn grammars(&self) -> &[Indexed<GrammarContribution>] {
        &self.grammars
    }

    pub fn languages(&self) -> &[Indexed<LanguageContribution>] {
        &self.languages
    }

    pub fn snippets(&self) -> &[Indexed<SnippetContribution>] {
        &self.snippets
    }

    pub fn configurations(&self) -> &[Indexed<ConfigurationBlock>] {
        &self.configurations
    }

    /// The declared default for a configuration key, searched across all
    /// indexed configuration blocks.
    pub fn configuration_default(&self, key: &str) -> Option<&serde_json::Value> {
        self.configurations
            .iter()
            .find_map(|entry| entry.contribution.properties.get(key))
            .and_then(|property| property.default.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
            && self.containers.is_empty()
            && self.views.is_empty()
            && self.menus.is_empty()
            && self.themes.is_empty()
            && self.icon_themes.is_empty()
            && self.grammars.is_empty()
            && self.languages.is_empty()
            && self.snippets.is_empty()
            && self.configurations.is_empty()
    }
}

/// Shared handle over the index supporting atomic rebuilds.
///
/// Readers take an [`Arc`] snapshot and keep reading it even while a rebuild
/// is in flight; the swap replaces the whole index in one store.
#[derive(Debug, Clone, Default)]
pub struct SharedContributionIndex {
    inner: Arc<RwLock<Arc<ContributionIndex>>>,
}

impl SharedContributionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh index over `installed` and swap it in.
    pub fn rebuild(&self, installed: &[InstalledExtension]) {
        let fresh = Arc::new(ContributionIndex::build(installed));
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = fresh;
    }

    /// The current index snapshot.
    pub fn snapshot(&self) -> Arc<ContributionIndex> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
