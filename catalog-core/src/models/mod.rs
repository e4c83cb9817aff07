//! Domain models for the package catalog.
//!
//! # Core Concepts
//!
//! - [`Package`]: Canonical package entity shared by the store, the cache and the API.
//!   Owns its dependency names and a map of [`Feature`]s keyed by feature name.
//! - [`Feature`]: Optional capability of a package with its own dependencies and
//!   the sibling features it pulls in.
//! - [`RawManifest`] / [`RawManifestEntry`]: Loosely-typed registry dump as read from disk.
//!   Polymorphic fields stay as JSON values until the normalizer probes their shape.

mod package;
mod raw;

pub use package::*;
pub use raw::*;
