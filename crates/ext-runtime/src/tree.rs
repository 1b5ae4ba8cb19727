//! Tree view registrations and item values.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;

/// Expansion state of a tree item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeItemCollapsibleState {
    #[default]
    None,
    Collapsed,
    Expanded,
}

impl TreeItemCollapsibleState {
    /// Numeric value used by the compatibility API surface.
    pub const fn value(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Collapsed => 1,
            Self::Expanded => 2,
        }
    }
}

/// A node rendered in a tree view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeItem {
    pub label: String,
    /// Stable identity across refreshes; providers may omit it.
    pub id: Option<String>,
    pub description: Option<String>,
    pub tooltip: Option<String>,
    pub collapsible_state: TreeItemCollapsibleState,
    /// Icon identifier interpreted by the rendering UI.
    pub icon: Option<String>,
    /// Command id executed when the item is selected.
    pub command: Option<String>,
    pub context_value: Option<String>,
}

impl TreeItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn with_collapsible_state(mut self, state: TreeItemCollapsibleState) -> Self {
        self.collapsible_state = state;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }
}

/// Supplies the nodes of a tree view.
#[async_trait]
pub trait TreeDataProvider: Send + Sync {
    /// Children of `parent`, or the root items when `parent` is `None`.
    async fn children(&self, parent: Option<&TreeItem>) -> Result<Vec<TreeItem>>;
}

/// A tree view id bound to its provider and owning extension.
#[derive(Clone)]
pub struct RegisteredTreeView {
    pub(crate) token: u64,
    view_id: String,
    extension_id: String,
    provider: Arc<dyn TreeDataProvider>,
}

impl RegisteredTreeView {
    pub(crate) fn new(
        token: u64,
        view_id: String,
        extension_id: String,
        provider: Arc<dyn TreeDataProvider>,
    ) -> Self {
        Self {
            token,
            view_id,
            extension_id,
            provider,
        }
    }

    pub fn view_id(&self) -> &str {
        &self.view_id
    }

    pub fn extension_id(&self) -> &str {
        &self.extension_id
    }

    pub fn provider(&self) -> Arc<dyn TreeDataProvider> {
        Arc::clone(&self.provider)
    }
}

impl std::fmt::Debug for RegisteredTreeView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTreeView")
            .field("view_id", &self.view_id)
            .field("extension_id", &self.extension_id)
            .finish()
    }
}
