//! Catalog service: the store behind the cache-aside discipline.
//!
//! Reads of the full list go through the cache; single-package reads go
//! straight to the store. Every mutation invalidates the cached list whether
//! or not it succeeded, since a failed insert may still have written rows.

use crate::cache::CatalogCache;
use crate::db::{Database, InsertReport, StoreError};
use crate::models::Package;

#[derive(Clone)]
pub struct Catalog {
    db: Database,
    cache: CatalogCache,
}

impl Catalog {
    pub fn new(db: Database, cache: CatalogCache) -> Self {
        Self { db, cache }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn list(&self) -> Result<Vec<Package>, StoreError> {
        if let Some(packages) = self.cache.get().await {
            return Ok(packages);
        }

        let packages = self.db.list_packages()?;
        self.cache.put(&packages).await;
        Ok(packages)
    }

    pub fn get(&self, name: &str) -> Result<Option<Package>, StoreError> {
        self.db.get_package(name)
    }

    pub async fn create(&self, package: &Package) -> Result<InsertReport, StoreError> {
        let result = self.db.insert_package(package);
        self.cache.invalidate().await;
        result
    }

    pub async fn delete(&self, name: &str) -> Result<bool, StoreError> {
        let result = self.db.delete_package(name);
        self.cache.invalidate().await;
        result
    }
}
