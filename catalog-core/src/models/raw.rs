use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level registry dump.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawManifest {
    #[serde(rename = "Baseline", default)]
    pub baseline: String,
    #[serde(rename = "Size", default)]
    pub size: usize,
    /// Entries stay untyped so one malformed entry cannot fail the whole file.
    #[serde(rename = "Source", default)]
    pub source: Vec<Value>,
}

/// One package as it appears in the registry dump.
///
/// `description`, `dependencies` and `features` take several shapes in the wild
/// and are kept as raw JSON until [`crate::normalize::ManifestNormalizer`] probes them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawManifestEntry {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Version", default)]
    pub version: Option<String>,
    #[serde(rename = "Description", default)]
    pub description: Value,
    #[serde(rename = "homepage", default)]
    pub homepage: Option<String>,
    #[serde(rename = "License", default)]
    pub license: Option<String>,
    #[serde(rename = "Supports", default)]
    pub supports: Option<String>,
    #[serde(rename = "Stars", default)]
    pub stars: Option<u64>,
    #[serde(rename = "LastModified", default)]
    pub last_modified: Option<String>,
    #[serde(rename = "Dependencies", default)]
    pub dependencies: Value,
    #[serde(rename = "Features", default)]
    pub features: Value,
}

/// Description given either as one string or as a list of lines.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawDescription {
    Text(String),
    Lines(Vec<String>),
}

impl RawDescription {
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Lines(lines) => lines.join(", "),
        }
    }
}

/// Object form of a dependency: `{"name": "zlib", "platform": "!windows", "host": true}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDependencySpec {
    pub name: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub host: Option<bool>,
}

/// A single element of a dependency list.
#[derive(Debug, Clone)]
pub enum RawDependency {
    Name(String),
    Spec(RawDependencySpec),
}

impl RawDependency {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Spec(spec) => &spec.name,
        }
    }
}

/// One entry of the `Features` map.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFeature {
    #[serde(default)]
    pub description: Value,
    #[serde(default)]
    pub dependencies: Value,
}
