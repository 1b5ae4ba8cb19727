//! Contribution point declarations from the manifest `contributes` block.
//!
//! Each kind mirrors the shape used by mainstream editor extensions:
//! commands, view containers, views, menus, themes, icon themes, grammars,
//! languages, snippets, and configuration schemas. Path-bearing entries are
//! declared relative to the extension directory and resolved during loading.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

/// All contribution points declared by a single manifest.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestContributions {
    /// Command palette entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandContribution>,
    /// View containers grouped by location (`activitybar`, `panel`).
    #[serde(default, skip_serializing_if = "ViewsContainers::is_empty")]
    pub views_containers: ViewsContainers,
    /// Views grouped by the container id they belong to.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub views: BTreeMap<String, Vec<ViewContribution>>,
    /// Menu entries grouped by menu location.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub menus: BTreeMap<String, Vec<MenuContribution>>,
    /// Color themes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub themes: Vec<ThemeContribution>,
    /// Icon themes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub icon_themes: Vec<IconThemeContribution>,
    /// TextMate grammars.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grammars: Vec<GrammarContribution>,
    /// Language declarations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<LanguageContribution>,
    /// Snippet files per language.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub snippets: Vec<SnippetContribution>,
    /// Configuration schema blocks. A manifest may declare a single object
    /// or an array of blocks; both forms parse to the same representation.
    #[serde(
        default,
        deserialize_with = "deserialize_configuration",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub configuration: Vec<ConfigurationBlock>,
}

/// An icon reference: a single path or light/dark variants.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum IconSpec {
    /// One icon path for all themes.
    Path(String),
    /// Separate paths for light and dark UI themes.
    Themed { light: String, dark: String },
}

/// A contributed command.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandContribution {
    /// Globally scoped command identifier.
    pub command: String,
    /// Palette title.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<IconSpec>,
}

/// View containers keyed by host location.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ViewsContainers {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activitybar: Vec<ViewContainerContribution>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub panel: Vec<ViewContainerContribution>,
}

impl ViewsContainers {
    pub fn is_empty(&self) -> bool {
        self.activitybar.is_empty() && self.panel.is_empty()
    }
}

/// A contributed view container.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ViewContainerContribution {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<IconSpec>,
}

/// A contributed view inside a container.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ViewContribution {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
}

/// A contributed menu entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MenuContribution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submenu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// A contributed color theme.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeContribution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_theme: Option<String>,
    /// Theme file path, relative until resolved.
    pub path: String,
}

impl ThemeContribution {
    /// The identity key for deduplication: `id` when declared, else `label`.
    pub fn identity(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.label)
    }
}

/// A contributed icon theme.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IconThemeContribution {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub path: String,
}

/// A contributed TextMate grammar.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarContribution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub scope_name: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub embedded_languages: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inject_to: Vec<String>,
}

/// A contributed language declaration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LanguageContribution {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filenames: Vec<String>,
    /// Path to a language configuration file, relative until resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<String>,
}

/// A contributed snippet file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnippetContribution {
    pub language: String,
    pub path: String,
}

/// One configuration schema block.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConfigurationBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, ConfigurationProperty>,
}

/// Schema for a single configuration property.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationProperty {
    /// JSON schema type: a string or an array of strings.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub prop_type: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown_description: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_descriptions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl ManifestContributions {
    /// Whether no contribution of any kind is declared.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
            && self.views_containers.is_empty()
            && self.views.is_empty()
            && self.menus.is_empty()
            && self.themes.is_empty()
            && self.icon_themes.is_empty()
            && self.grammars.is_empty()
            && self.languages.is_empty()
            && self.snippets.is_empty()
            && self.configuration.is_empty()
    }

    /// Resolve path-bearing entries against the extension directory and drop
    /// entries whose backing file does not exist.
    ///
    /// Language entries are kept even when their configuration file is
    /// missing; only the dangling configuration reference is cleared.
    pub fn resolve_paths(&mut self, extension_dir: &Path) {
        self.themes.retain_mut(|theme| {
            let identity = theme.identity().to_string();
            resolve_entry(extension_dir, &mut theme.path, "theme", &identity)
        });
        self.icon_themes.retain_mut(|icon_theme| {
            let id = icon_theme.id.clone();
            resolve_entry(extension_dir, &mut icon_theme.path, "icon theme", &id)
        });
        self.grammars.retain_mut(|grammar| {
            let scope = grammar.scope_name.clone();
            resolve_entry(extension_dir, &mut grammar.path, "grammar", &scope)
        });
        self.snippets.retain_mut(|snippet| {
            let language = snippet.language.clone();
            resolve_entry(extension_dir, &mut snippet.path, "snippet", &language)
        });
        for language in &mut self.languages {
            if let Some(mut config_path) = language.configuration.take() {
                if resolve_entry(
                    extension_dir,
                    &mut config_path,
                    "language configuration",
                    &language.id,
                ) {
                    language.configuration = Some(config_path);
                }
            }
        }
    }
}

/// Join a declared path to the extension directory. Returns false and logs
/// when the resolved file is missing.
fn resolve_entry(extension_dir: &Path, path: &mut String, kind: &str, identity: &str) -> bool {
    let relative = path.trim_start_matches("./");
    let resolved = extension_dir.join(relative);
    if resolved.exists() {
        *path = resolved.to_string_lossy().into_owned();
        true
    } else {
        tracing::debug!(
            kind = kind,
            identity = identity,
            path = %resolved.display(),
            "dropping contribution with missing file"
        );
        false
    }
}

fn deserialize_configuration<'de, D>(deserializer: D) -> Result<Vec<ConfigurationBlock>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(serde::de::Error::custom))
            .collect(),
        serde_json::Value::Object(_) => {
            let block = serde_json::from_value(value).map_err(serde::de::Error::custom)?;
            Ok(vec![block])
        }
        serde_json::Value::Null => Ok(Vec::new()),
        _ => Err(serde::de::Error::custom(
            "configuration must be an object or an array",
        )),
    }
}
