//! Manifest normalization.
//!
//! Turns one loosely-typed [`RawManifestEntry`] into one canonical [`Package`].
//! Every polymorphic field is decoded by probing its JSON shape:
//!
//! - dependencies: plain string, `{name, platform?, host?}` object, or a mix of both
//! - description: string, or list of strings joined with `", "`
//! - features: map of feature objects; any other shape counts as no features
//!
//! A shape that cannot be decoded drops the package, never the run.

mod cmake;

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::models::{
    Feature, Package, RawDependency, RawDependencySpec, RawDescription, RawFeature,
    RawManifestEntry,
};

pub use cmake::cmake_target;

/// Build-system helper ports that vcpkg manifests list as dependencies.
pub const BOOTSTRAP_DEPENDENCIES: &[&str] = &["vcpkg-cmake", "vcpkg-cmake-config", "vcpkg-msbuild"];

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("manifest entry is not a package object: {0}")]
    Entry(#[source] serde_json::Error),

    #[error("manifest entry has an empty name")]
    MissingName,

    #[error("package '{package}': description is neither a string nor a list of strings")]
    Description {
        package: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("package '{package}': description of feature '{feature}' is neither a string nor a list of strings")]
    FeatureDescription {
        package: String,
        feature: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("package '{package}': dependency object without a string `name`")]
    DependencyName {
        package: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("package '{package}': dependencies must be a list, found {found}")]
    DependencyList { package: String, found: &'static str },
}

/// Whether bootstrap helper ports survive normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BootstrapPolicy {
    /// Drop `vcpkg-cmake`, `vcpkg-cmake-config` and `vcpkg-msbuild`.
    #[default]
    Filter,
    /// Pass every dependency through unchanged.
    Keep,
}

impl BootstrapPolicy {
    pub fn keeps(&self, dependency: &str) -> bool {
        match self {
            Self::Filter => !BOOTSTRAP_DEPENDENCIES.contains(&dependency),
            Self::Keep => true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestNormalizer {
    bootstrap: BootstrapPolicy,
}

impl ManifestNormalizer {
    pub fn new(bootstrap: BootstrapPolicy) -> Self {
        Self { bootstrap }
    }

    /// Decode a raw JSON entry from the manifest `Source` list and normalize it.
    pub fn normalize_value(&self, value: Value) -> Result<Package, NormalizeError> {
        let raw: RawManifestEntry = serde_json::from_value(value).map_err(NormalizeError::Entry)?;
        self.normalize(raw)
    }

    pub fn normalize(&self, raw: RawManifestEntry) -> Result<Package, NormalizeError> {
        if raw.name.is_empty() {
            return Err(NormalizeError::MissingName);
        }
        let name = raw.name;

        let description = description(raw.description).map_err(|source| {
            NormalizeError::Description {
                package: name.clone(),
                source,
            }
        })?;

        let dependencies = dependency_list(&name, raw.dependencies)?
            .into_iter()
            .filter(|dep| self.bootstrap.keeps(dep.name()))
            .map(|dep| dep.name().to_string())
            .collect();

        let features = self.features(&name, raw.features)?;

        Ok(Package {
            cmake_target: cmake_target(&name),
            version: raw.version.unwrap_or_default(),
            versions: Vec::new(),
            description,
            git_url: raw.homepage.unwrap_or_default(),
            license: raw.license.unwrap_or_default(),
            supports: raw.supports.unwrap_or_default(),
            stars: raw.stars.unwrap_or_default(),
            last_modified: raw.last_modified.unwrap_or_default(),
            dependencies,
            features,
            name,
        })
    }

    fn features(
        &self,
        package: &str,
        value: Value,
    ) -> Result<BTreeMap<String, Feature>, NormalizeError> {
        let entries = match value {
            Value::Null => return Ok(BTreeMap::new()),
            Value::Object(entries) => entries,
            other => {
                warn!(
                    package,
                    found = json_kind(&other),
                    "Features is not a map, treating package as having no features"
                );
                return Ok(BTreeMap::new());
            }
        };

        let mut features = BTreeMap::new();
        for (feature_name, value) in entries {
            let raw = match value {
                value @ Value::Object(_) => match serde_json::from_value::<RawFeature>(value) {
                    Ok(raw) => raw,
                    Err(e) => {
                        warn!(package, feature = %feature_name, "Skipping undecodable feature: {}", e);
                        continue;
                    }
                },
                other => {
                    warn!(
                        package,
                        feature = %feature_name,
                        found = json_kind(&other),
                        "Skipping feature that is not an object"
                    );
                    continue;
                }
            };

            let description = description(raw.description).map_err(|source| {
                NormalizeError::FeatureDescription {
                    package: package.to_string(),
                    feature: feature_name.clone(),
                    source,
                }
            })?;

            let mut feature = Feature {
                description,
                ..Default::default()
            };
            for dep in dependency_list(package, raw.dependencies)? {
                match dep {
                    // `{"name": "<self>", "features": [..]}` means this feature turns on
                    // more of its own package.
                    RawDependency::Spec(spec) if spec.name == package => {
                        feature.required_features.push(feature_name.clone());
                    }
                    dep if self.bootstrap.keeps(dep.name()) => {
                        feature.dependencies.push(dep.name().to_string());
                    }
                    _ => {}
                }
            }

            features.insert(feature_name, feature);
        }

        Ok(features)
    }
}

/// String first, then list of strings; absent means empty.
fn description(value: Value) -> Result<String, serde_json::Error> {
    if value.is_null() {
        return Ok(String::new());
    }
    serde_json::from_value::<RawDescription>(value).map(RawDescription::into_text)
}

fn dependency_list(package: &str, value: Value) -> Result<Vec<RawDependency>, NormalizeError> {
    let items = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        other => {
            return Err(NormalizeError::DependencyList {
                package: package.to_string(),
                found: json_kind(&other),
            })
        }
    };

    let mut dependencies = Vec::with_capacity(items.len());
    for item in items {
        let found = json_kind(&item);
        match probe_dependency(item) {
            Ok(Some(dep)) => dependencies.push(dep),
            Ok(None) => warn!(package, found, "Skipping dependency of unsupported shape"),
            Err(source) => {
                return Err(NormalizeError::DependencyName {
                    package: package.to_string(),
                    source,
                })
            }
        }
    }
    Ok(dependencies)
}

/// `Ok(None)` for shapes that are neither a name nor a dependency object.
fn probe_dependency(value: Value) -> Result<Option<RawDependency>, serde_json::Error> {
    match value {
        Value::String(name) => Ok(Some(RawDependency::Name(name))),
        value @ Value::Object(_) => {
            serde_json::from_value::<RawDependencySpec>(value).map(|spec| Some(RawDependency::Spec(spec)))
        }
        _ => Ok(None),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
