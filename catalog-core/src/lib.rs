//! Core library for the package catalog.
//!
//! This crate provides the domain models, the manifest normalizer, the remote
//! version resolver, the relational store and the cache-aside layer,
//! independent of any transport layer (HTTP, CLI, etc.).
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use catalog_core::cache::{CatalogCache, MemoryBackend};
//! use catalog_core::{Catalog, Database};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let db = Database::open("./data.sql")?;
//! db.migrate()?;
//!
//! let cache = CatalogCache::new(Arc::new(MemoryBackend::new()), Duration::from_secs(600));
//! let catalog = Catalog::new(db, cache);
//! let packages = catalog.list().await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod catalog;
pub mod config;
pub mod db;
pub mod models;
pub mod normalize;
pub mod versions;

// Re-export commonly used types at crate root
pub use catalog::Catalog;
pub use db::{Database, InsertReport, StoreError};
pub use normalize::{BootstrapPolicy, ManifestNormalizer, NormalizeError};
pub use versions::{RemoteVersionResolver, ResolvedVersions};
