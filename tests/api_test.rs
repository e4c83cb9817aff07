use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use catalog_core::cache::{CatalogCache, MemoryBackend, DEFAULT_TTL};
use catalog_core::models::Package;
use catalog_core::{Catalog, Database};
use serde_json::json;
use vcpkg_catalog::api::create_router;

fn setup_server() -> TestServer {
    let db = Database::open_memory().expect("Failed to create test database");
    db.migrate().expect("Failed to migrate test database");
    let catalog = Catalog::new(db, CatalogCache::new(Arc::new(MemoryBackend::new()), DEFAULT_TTL));
    TestServer::new(create_router(catalog)).expect("Failed to start test server")
}

fn zlib() -> serde_json::Value {
    json!({
        "name": "zlib",
        "version": "1.3.1",
        "versions": ["v1.3", "v1.3.1"],
        "description": "A compression library",
        "gitURL": "https://github.com/madler/zlib",
        "license": "Zlib",
        "stars": 5400,
        "cmake_target": "ZLIB::ZLIB",
        "dependencies": [],
        "features": {
            "minizip": { "description": "Zip archive support", "dependencies": ["bzip2"] }
        }
    })
}

#[tokio::test]
async fn list_starts_empty() {
    let server = setup_server();

    let response = server.get("/packages").await;

    response.assert_status(StatusCode::OK);
    assert!(response.json::<Vec<Package>>().is_empty());
}

#[tokio::test]
async fn create_then_get() {
    let server = setup_server();

    server
        .post("/packages/create")
        .json(&zlib())
        .await
        .assert_status(StatusCode::CREATED);

    let response = server.get("/package").add_query_param("name", "zlib").await;
    response.assert_status(StatusCode::OK);

    let pkg: Package = response.json();
    assert_eq!(pkg.name, "zlib");
    assert_eq!(pkg.git_url, "https://github.com/madler/zlib");
    assert_eq!(pkg.versions, vec!["v1.3", "v1.3.1"]);
    assert_eq!(pkg.features["minizip"].dependencies, vec!["bzip2"]);
    assert!(!pkg.last_modified.is_empty());
}

#[tokio::test]
async fn get_requires_name() {
    let server = setup_server();

    server.get("/package").await.assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/package")
        .add_query_param("name", "")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_unknown_is_not_found() {
    let server = setup_server();

    server
        .get("/package")
        .add_query_param("name", "nope")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let server = setup_server();

    server
        .post("/packages/create")
        .json(&json!({ "version": "1.0" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .post("/packages/create")
        .json(&json!({ "name": "" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .post("/packages/create")
        .text("not json")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn out_of_range_stars_is_bad_request() {
    let server = setup_server();
    let mut body = zlib();
    body["stars"] = json!(u64::MAX);

    server
        .post("/packages/create")
        .json(&body)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .get("/package")
        .add_query_param("name", "zlib")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_create_conflicts() {
    let server = setup_server();

    server
        .post("/packages/create")
        .json(&zlib())
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/packages/create")
        .json(&zlib())
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn delete_requires_name() {
    let server = setup_server();

    server
        .delete("/packages/delete")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_unknown_is_ok() {
    let server = setup_server();

    server
        .delete("/packages/delete")
        .add_query_param("name", "nope")
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn list_after_create_and_delete_never_shows_deleted_package() {
    let server = setup_server();

    server
        .post("/packages/create")
        .json(&zlib())
        .await
        .assert_status(StatusCode::CREATED);

    // Populate the cache.
    let listed: Vec<Package> = server.get("/packages").await.json();
    assert_eq!(listed.len(), 1);

    server
        .post("/packages/delete")
        .add_query_param("name", "zlib")
        .await
        .assert_status(StatusCode::OK);

    let listed: Vec<Package> = server.get("/packages").await.json();
    assert!(listed.is_empty());

    server
        .get("/package")
        .add_query_param("name", "zlib")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
