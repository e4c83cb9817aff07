//! HTTP API and ingestion pipeline for the package catalog.
//!
//! The domain lives in [`catalog_core`]; this crate wires it to axum and to
//! the manifest files produced by registry dumps.

pub mod api;
pub mod ingest;
