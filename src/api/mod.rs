use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use catalog_core::models::Package;
use catalog_core::{Catalog, StoreError};
use serde::Deserialize;
use thiserror::Error;
use tower_http::trace::TraceLayer;

pub fn create_router(catalog: Catalog) -> Router {
    Router::new()
        .route("/packages", get(list_packages))
        .route("/packages/create", post(create_package))
        .route(
            "/packages/delete",
            delete(delete_package).post(delete_package),
        )
        .route("/package", get(get_package))
        .layer(TraceLayer::new_for_http())
        .with_state(catalog)
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing package name")]
    MissingName,

    #[error("Package not found")]
    NotFound,

    #[error("Invalid request payload: {0}")]
    InvalidPayload(String),

    #[error("Package '{0}' already exists")]
    Conflict(String),

    #[error("Error querying database")]
    Store(#[source] StoreError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(name) => Self::Conflict(name),
            err @ StoreError::StarsOutOfRange { .. } => Self::InvalidPayload(err.to_string()),
            other => Self::Store(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::MissingName | Self::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Store(e) => {
                tracing::error!("Store error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: Option<String>,
}

impl NameQuery {
    fn require(self) -> Result<String, ApiError> {
        self.name
            .filter(|name| !name.is_empty())
            .ok_or(ApiError::MissingName)
    }
}

async fn list_packages(State(catalog): State<Catalog>) -> Result<Json<Vec<Package>>, ApiError> {
    let packages = catalog.list().await?;
    Ok(Json(packages))
}

async fn get_package(
    State(catalog): State<Catalog>,
    Query(query): Query<NameQuery>,
) -> Result<Json<Package>, ApiError> {
    let name = query.require()?;
    let package = catalog.get(&name)?.ok_or(ApiError::NotFound)?;
    Ok(Json(package))
}

async fn create_package(
    State(catalog): State<Catalog>,
    payload: Result<Json<Package>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(mut package) = payload.map_err(|e| ApiError::InvalidPayload(e.body_text()))?;
    if package.name.is_empty() {
        return Err(ApiError::InvalidPayload("package name is required".into()));
    }

    package.last_modified = chrono::Utc::now().to_rfc3339();

    let report = catalog.create(&package).await?;
    if !report.is_complete() {
        tracing::warn!(
            package = %package.name,
            failed_rows = report.failures.len(),
            "Package created with missing rows"
        );
    }

    Ok(StatusCode::CREATED)
}

async fn delete_package(
    State(catalog): State<Catalog>,
    Query(query): Query<NameQuery>,
) -> Result<StatusCode, ApiError> {
    let name = query.require()?;
    if !catalog.delete(&name).await? {
        tracing::debug!(package = %name, "Delete of unknown package");
    }
    Ok(StatusCode::OK)
}
