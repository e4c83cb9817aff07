use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use serde::Serialize;

use super::{Database, StoreError};
use crate::models::{Feature, FeatureLinkKind, Package};

const PACKAGE_COLUMNS: &str = "name, version, versions, description, git_url, license, supports, stars, last_modified, cmake_target";

/// Which child table a failed row belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowTable {
    Dependency,
    Feature,
    FeatureDependency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    pub table: RowTable,
    /// Dependency name, feature name, or `feature/dependency`.
    pub key: String,
    pub error: String,
}

/// Rows of a package insert that could not be written.
///
/// The package row itself is always present when a report is returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InsertReport {
    pub failures: Vec<RowFailure>,
}

impl InsertReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, package: &str, table: RowTable, key: String, error: String) {
        tracing::warn!(package, ?table, key = %key, "Failed to insert row: {}", error);
        self.failures.push(RowFailure { table, key, error });
    }
}

impl Database {
    /// Insert a package and, best effort, its child rows.
    ///
    /// Only a failure on the package row is an error; child row failures are
    /// collected in the returned report while their siblings still persist.
    pub fn insert_package(&self, package: &Package) -> Result<InsertReport, StoreError> {
        self.with_connection(|conn| {
            insert_package_row(conn, package)?;

            let mut report = InsertReport::default();
            let name = package.name.as_str();

            for dep in &package.dependencies {
                if let Err(e) = conn.execute(
                    "INSERT INTO dependencies (package_name, dependency_name) VALUES (?1, ?2)",
                    params![name, dep],
                ) {
                    report.record(name, RowTable::Dependency, dep.clone(), e.to_string());
                }
            }

            let mut stored_features = Vec::with_capacity(package.features.len());
            for (feature_name, feature) in &package.features {
                match conn.execute(
                    "INSERT INTO features (package_name, feature_name, description) VALUES (?1, ?2, ?3)",
                    params![name, feature_name, feature.description],
                ) {
                    Ok(_) => stored_features.push((feature_name, feature)),
                    Err(e) => {
                        let error = e.to_string();
                        report.record(name, RowTable::Feature, feature_name.clone(), error.clone());
                        // Links of a missing feature cannot satisfy the foreign key.
                        for link in feature_links(feature) {
                            report.record(
                                name,
                                RowTable::FeatureDependency,
                                format!("{}/{}", feature_name, link.0),
                                format!("feature not stored: {}", error),
                            );
                        }
                    }
                }
            }

            for (feature_name, feature) in stored_features {
                for (dependency, kind) in feature_links(feature) {
                    if let Err(e) = conn.execute(
                        "INSERT INTO feature_dependencies (package_name, feature_name, dependency_name, kind)
                         VALUES (?1, ?2, ?3, ?4)",
                        params![name, feature_name, dependency, kind.as_str()],
                    ) {
                        report.record(
                            name,
                            RowTable::FeatureDependency,
                            format!("{}/{}", feature_name, dependency),
                            e.to_string(),
                        );
                    }
                }
            }

            Ok(report)
        })
    }

    /// Delete a package and, through the cascade, everything it owns.
    /// Returns whether the package existed.
    pub fn delete_package(&self, name: &str) -> Result<bool, StoreError> {
        self.with_connection(|conn| {
            let deleted = conn.execute("DELETE FROM packages WHERE name = ?1", params![name])?;
            Ok(deleted > 0)
        })
    }

    pub fn get_package(&self, name: &str) -> Result<Option<Package>, StoreError> {
        self.with_connection(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {} FROM packages WHERE name = ?1", PACKAGE_COLUMNS),
                    params![name],
                    package_from_row,
                )
                .optional()?;

            match row {
                Some(row) => Ok(Some(assemble(conn, row)?)),
                None => Ok(None),
            }
        })
    }

    /// All packages ordered by name, each with its dependencies and features.
    pub fn list_packages(&self) -> Result<Vec<Package>, StoreError> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM packages ORDER BY name",
                PACKAGE_COLUMNS
            ))?;
            let rows = stmt
                .query_map([], package_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            rows.into_iter().map(|row| assemble(conn, row)).collect()
        })
    }
}

fn insert_package_row(conn: &Connection, package: &Package) -> Result<(), StoreError> {
    let versions = serde_json::to_string(&package.versions)?;
    let stars = i64::try_from(package.stars).map_err(|_| StoreError::StarsOutOfRange {
        name: package.name.clone(),
        stars: package.stars,
    })?;

    let result = conn.execute(
        &format!(
            "INSERT INTO packages ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            PACKAGE_COLUMNS
        ),
        params![
            package.name,
            package.version,
            versions,
            package.description,
            package.git_url,
            package.license,
            package.supports,
            stars,
            package.last_modified,
            package.cmake_target,
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == ErrorCode::ConstraintViolation
                && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            Err(StoreError::Duplicate(package.name.clone()))
        }
        Err(e) => Err(e.into()),
    }
}

fn feature_links(feature: &Feature) -> impl Iterator<Item = (&String, FeatureLinkKind)> {
    feature
        .dependencies
        .iter()
        .map(|dep| (dep, FeatureLinkKind::Dependency))
        .chain(
            feature
                .required_features
                .iter()
                .map(|required| (required, FeatureLinkKind::Feature)),
        )
}

/// A package row before its child collections are loaded.
struct PackageRow {
    package: Package,
    versions: String,
}

fn package_from_row(row: &Row) -> rusqlite::Result<PackageRow> {
    let stars: i64 = row.get(7)?;
    Ok(PackageRow {
        package: Package {
            name: row.get(0)?,
            version: row.get(1)?,
            versions: Vec::new(),
            description: row.get(3)?,
            git_url: row.get(4)?,
            license: row.get(5)?,
            supports: row.get(6)?,
            stars: u64::try_from(stars).unwrap_or_default(),
            last_modified: row.get(8)?,
            cmake_target: row.get(9)?,
            dependencies: Vec::new(),
            features: Default::default(),
        },
        versions: row.get(2)?,
    })
}

fn assemble(conn: &Connection, row: PackageRow) -> Result<Package, StoreError> {
    let mut package = row.package;
    package.versions = serde_json::from_str(&row.versions)?;
    package.dependencies = package_dependencies(conn, &package.name)?;

    for (feature_name, description) in package_features(conn, &package.name)? {
        let mut feature = Feature {
            description,
            ..Default::default()
        };
        for (dependency, kind) in feature_dependencies(conn, &package.name, &feature_name)? {
            match kind {
                FeatureLinkKind::Dependency => feature.dependencies.push(dependency),
                FeatureLinkKind::Feature => feature.required_features.push(dependency),
            }
        }
        package.features.insert(feature_name, feature);
    }

    Ok(package)
}

fn package_dependencies(conn: &Connection, package: &str) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare_cached(
        "SELECT dependency_name FROM dependencies WHERE package_name = ?1 ORDER BY id",
    )?;
    let deps = stmt
        .query_map(params![package], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(deps)
}

fn package_features(conn: &Connection, package: &str) -> Result<Vec<(String, String)>, StoreError> {
    let mut stmt = conn.prepare_cached(
        "SELECT feature_name, description FROM features WHERE package_name = ?1 ORDER BY feature_name",
    )?;
    let features = stmt
        .query_map(params![package], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<(String, String)>, _>>()?;
    Ok(features)
}

fn feature_dependencies(
    conn: &Connection,
    package: &str,
    feature: &str,
) -> Result<Vec<(String, FeatureLinkKind)>, StoreError> {
    let mut stmt = conn.prepare_cached(
        "SELECT dependency_name, kind FROM feature_dependencies
         WHERE package_name = ?1 AND feature_name = ?2 ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![package, feature], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows
        .into_iter()
        .map(|(dependency, kind)| {
            let kind = FeatureLinkKind::from_str(&kind).unwrap_or(FeatureLinkKind::Dependency);
            (dependency, kind)
        })
        .collect())
}
