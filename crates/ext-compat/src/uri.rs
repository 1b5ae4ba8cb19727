//! URI value type mirroring the editor API's `Uri` shape.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A parsed URI split into its five components.
///
/// Only the decomposition extension code relies on is implemented; no
/// percent-decoding or normalization beyond slash handling is performed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Uri {
    pub scheme: String,
    pub authority: String,
    pub path: String,
    pub query: String,
    pub fragment: String,
}

impl Uri {
    /// Parse a URI string of the form
    /// `scheme:[//authority]path[?query][#fragment]`.
    pub fn parse(value: &str) -> Result<Self> {
        let colon = value
            .find(':')
            .ok_or_else(|| Error::InvalidUri(value.to_string()))?;
        let scheme = &value[..colon];
        let valid_scheme = scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !valid_scheme {
            return Err(Error::InvalidUri(value.to_string()));
        }

        let mut rest = &value[colon + 1..];
        let mut authority = "";
        if let Some(stripped) = rest.strip_prefix("//") {
            let end = stripped.find(['/', '?', '#']).unwrap_or(stripped.len());
            authority = &stripped[..end];
            rest = &stripped[end..];
        }
        let (rest, fragment) = match rest.split_once('#') {
            Some((before, fragment)) => (before, fragment),
            None => (rest, ""),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, query),
            None => (rest, ""),
        };

        Ok(Self {
            scheme: scheme.to_string(),
            authority: authority.to_string(),
            path: path.to_string(),
            query: query.to_string(),
            fragment: fragment.to_string(),
        })
    }

    /// Build a `file:` URI from a filesystem path.
    pub fn file(path: impl AsRef<Path>) -> Self {
        let mut uri_path = path.as_ref().to_string_lossy().replace('\\', "/");
        if !uri_path.starts_with('/') {
            uri_path.insert(0, '/');
        }
        Self {
            scheme: "file".to_string(),
            authority: String::new(),
            path: uri_path,
            query: String::new(),
            fragment: String::new(),
        }
    }

    /// Append path segments, normalizing duplicate slashes.
    pub fn join_path(&self, segments: &[&str]) -> Self {
        let mut path = self.path.trim_end_matches('/').to_string();
        for segment in segments {
            for part in segment.split('/').filter(|p| !p.is_empty()) {
                path.push('/');
                path.push_str(part);
            }
        }
        Self {
            path,
            ..self.clone()
        }
    }

    /// The filesystem path this URI addresses.
    pub fn fs_path(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.scheme)?;
        if !self.authority.is_empty() || self.scheme == "file" {
            write!(f, "//{}", self.authority)?;
        }
        write!(f, "{}", self.path)?;
        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }
        if !self.fragment.is_empty() {
            write!(f, "#{}", self.fragment)?;
        }
        Ok(())
    }
}
