use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub versions: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "gitURL")]
    pub git_url: String,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub supports: String,
    #[serde(default)]
    pub stars: u64,
    #[serde(default)]
    pub last_modified: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cmake_target: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub features: BTreeMap<String, Feature>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_features: Vec<String>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Kind of row stored in `feature_dependencies`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeatureLinkKind {
    /// The feature needs another package.
    Dependency,
    /// The feature enables a sibling feature of the same package.
    Feature,
}

impl FeatureLinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dependency => "dependency",
            Self::Feature => "feature",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "dependency" => Some(Self::Dependency),
            "feature" => Some(Self::Feature),
            _ => None,
        }
    }
}
