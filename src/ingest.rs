//! Bulk ingestion of a registry dump.
//!
//! Entries are normalized with bounded parallelism (version lookups are one
//! `git ls-remote` each) and come out in manifest order. Entries that fail to
//! decode are logged and dropped without stopping the run.

use std::fs;
use std::path::Path;

use anyhow::Context;
use catalog_core::models::{Package, RawManifest};
use catalog_core::{Catalog, ManifestNormalizer, RemoteVersionResolver, StoreError};
use futures::stream::{self, StreamExt};
use serde::Serialize;

pub const DEFAULT_CONCURRENCY: usize = 8;

pub fn read_manifest(path: &Path) -> anyhow::Result<RawManifest> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let manifest: RawManifest = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse manifest {}", path.display()))?;

    if manifest.size != manifest.source.len() {
        tracing::warn!(
            declared = manifest.size,
            actual = manifest.source.len(),
            "Manifest Size does not match number of Source entries"
        );
    }
    tracing::info!(
        baseline = %manifest.baseline,
        entries = manifest.source.len(),
        "Loaded manifest {}",
        path.display()
    );

    Ok(manifest)
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Normalized {
    pub packages: Vec<Package>,
    /// Manifest entries that could not be decoded.
    pub dropped: usize,
}

/// Normalize every entry, resolving remote versions when a resolver is given.
pub async fn normalize_manifest(
    manifest: RawManifest,
    normalizer: ManifestNormalizer,
    resolver: Option<RemoteVersionResolver>,
    concurrency: usize,
) -> Normalized {
    let results: Vec<Option<Package>> = stream::iter(manifest.source.into_iter().enumerate())
        .map(|(index, entry)| {
            let resolver = resolver.clone();
            async move {
                let mut package = match normalizer.normalize_value(entry) {
                    Ok(package) => package,
                    Err(e) => {
                        tracing::warn!(index, "Dropping manifest entry: {}", e);
                        return None;
                    }
                };
                if let Some(resolver) = resolver {
                    resolver.resolve(&package.git_url).await.apply_to(&mut package);
                }
                Some(package)
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let total = results.len();
    let packages: Vec<Package> = results.into_iter().flatten().collect();
    Normalized {
        dropped: total - packages.len(),
        packages,
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    pub stored: usize,
    pub duplicates: usize,
    /// Packages whose own row could not be represented in the store.
    pub rejected: usize,
    /// Child rows (dependencies, features, feature links) that failed to persist.
    pub failed_rows: usize,
}

/// Insert packages through the catalog. Existing names and unstorable rows are
/// skipped; any other store error aborts the run.
pub async fn store_packages(catalog: &Catalog, packages: &[Package]) -> anyhow::Result<StoreSummary> {
    let mut summary = StoreSummary::default();
    for package in packages {
        match catalog.create(package).await {
            Ok(report) => {
                summary.stored += 1;
                summary.failed_rows += report.failures.len();
            }
            Err(StoreError::Duplicate(name)) => {
                tracing::warn!(package = %name, "Package already in catalog, skipping");
                summary.duplicates += 1;
            }
            Err(e @ StoreError::StarsOutOfRange { .. }) => {
                tracing::warn!(package = %package.name, "Skipping package: {}", e);
                summary.rejected += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to store package {}", package.name))
            }
        }
    }
    Ok(summary)
}

/// Write the canonical package list as JSON to `path`, or stdout when `None`.
pub fn write_packages(path: Option<&Path>, packages: &[Package]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(packages)?;
    match path {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}
