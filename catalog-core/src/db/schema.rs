pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS packages (
    name TEXT PRIMARY KEY,
    version TEXT NOT NULL DEFAULT '',
    versions JSON NOT NULL DEFAULT '[]',
    description TEXT NOT NULL DEFAULT '',
    git_url TEXT NOT NULL DEFAULT '',
    license TEXT NOT NULL DEFAULT '',
    supports TEXT NOT NULL DEFAULT '',
    stars INTEGER NOT NULL DEFAULT 0 CHECK (stars >= 0),
    last_modified TEXT NOT NULL DEFAULT '',
    cmake_target TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS dependencies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    package_name TEXT NOT NULL REFERENCES packages(name) ON DELETE CASCADE,
    dependency_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS features (
    package_name TEXT NOT NULL REFERENCES packages(name) ON DELETE CASCADE,
    feature_name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (package_name, feature_name)
);

CREATE TABLE IF NOT EXISTS feature_dependencies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    package_name TEXT NOT NULL REFERENCES packages(name) ON DELETE CASCADE,
    feature_name TEXT NOT NULL,
    dependency_name TEXT NOT NULL,
    kind TEXT NOT NULL DEFAULT 'dependency' CHECK (kind IN ('dependency', 'feature')),
    FOREIGN KEY (package_name, feature_name)
        REFERENCES features(package_name, feature_name) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_dependencies_package ON dependencies(package_name);
CREATE INDEX IF NOT EXISTS idx_features_package ON features(package_name);
CREATE INDEX IF NOT EXISTS idx_feature_dependencies_feature
    ON feature_dependencies(package_name, feature_name);
"#;
