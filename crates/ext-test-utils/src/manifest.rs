//! [`ManifestBuilder`] for composing `package.json` documents in tests.

use serde_json::{Map, Value, json};

/// Fluent builder for extension manifest JSON.
///
/// Produces the minimal valid manifest by default; every other field is
/// opt-in so tests state exactly what they rely on.
///
/// # Example
///
/// ```rust
/// use ext_test_utils::manifest::ManifestBuilder;
/// use serde_json::json;
///
/// let manifest = ManifestBuilder::new("acme", "markdown-tools")
///     .display_name("Markdown Tools")
///     .main("./out/extension.js")
///     .contribute("commands", json!([
///         { "command": "markdown.preview", "title": "Open Preview" }
///     ]))
///     .build();
/// assert_eq!(manifest["publisher"], "acme");
/// ```
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    publisher: String,
    name: String,
    version: String,
    fields: Map<String, Value>,
    activation_events: Vec<String>,
    contributes: Map<String, Value>,
}

impl ManifestBuilder {
    /// Start a manifest for `publisher.name` at version `1.0.0`.
    pub fn new(publisher: &str, name: &str) -> Self {
        Self {
            publisher: publisher.to_string(),
            name: name.to_string(),
            version: "1.0.0".to_string(),
            fields: Map::new(),
            activation_events: Vec::new(),
            contributes: Map::new(),
        }
    }

    /// The `publisher.name` identity this manifest will parse to.
    pub fn id(&self) -> String {
        format!("{}.{}", self.publisher, self.name)
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn display_name(mut self, display_name: &str) -> Self {
        self.fields
            .insert("displayName".to_string(), json!(display_name));
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.fields
            .insert("description".to_string(), json!(description));
        self
    }

    pub fn main(mut self, main: &str) -> Self {
        self.fields.insert("main".to_string(), json!(main));
        self
    }

    pub fn browser(mut self, browser: &str) -> Self {
        self.fields.insert("browser".to_string(), json!(browser));
        self
    }

    pub fn engine(mut self, name: &str, range: &str) -> Self {
        self.fields
            .entry("engines".to_string())
            .or_insert_with(|| json!({}))
            .as_object_mut()
            .unwrap()
            .insert(name.to_string(), json!(range));
        self
    }

    pub fn activation_event(mut self, event: &str) -> Self {
        self.activation_events.push(event.to_string());
        self
    }

    /// Set a contribution point, e.g. `contribute("commands", json!([...]))`.
    pub fn contribute(mut self, point: &str, value: Value) -> Self {
        self.contributes.insert(point.to_string(), value);
        self
    }

    /// Set an arbitrary top-level field, overriding anything built in.
    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    /// Assemble the manifest as a JSON value.
    pub fn build(&self) -> Value {
        let mut manifest = Map::new();
        manifest.insert("name".to_string(), json!(self.name));
        manifest.insert("publisher".to_string(), json!(self.publisher));
        manifest.insert("version".to_string(), json!(self.version));
        for (key, value) in &self.fields {
            manifest.insert(key.clone(), value.clone());
        }
        if !self.activation_events.is_empty() {
            manifest.insert(
                "activationEvents".to_string(),
                json!(self.activation_events),
            );
        }
        if !self.contributes.is_empty() {
            manifest.insert("contributes".to_string(), Value::Object(self.contributes.clone()));
        }
        Value::Object(manifest)
    }

    /// Assemble the manifest as pretty-printed JSON text.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.build()).unwrap()
    }
}
