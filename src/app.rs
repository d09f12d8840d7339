//! HTTP API

use crate::app_state::SharedAppState;
use crate::comparison::{Comparison, DatasetSource};
use crate::error::DatasetError;
use crate::metrics;
use crate::models;
use crate::validated_query::ValidatedQuery;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::Uri,
    routing::get,
    Json, Router,
};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;
use tracing::{event, Level};

/// The service type served by the application.
///
/// Trailing slashes are removed from request paths before routing.
pub type Service = NormalizePath<Router>;

/// Routes and their descriptions, as listed by the API root.
const ENDPOINTS: [(&str, &str); 7] = [
    ("/api/health", "Health check"),
    ("/api/datasets", "List available datasets"),
    ("/api/datasets/{id}", "Get a dataset"),
    (
        "/api/datasets/{id}/filter",
        "Get a dataset filtered by startYear, endYear and energyTypes",
    ),
    ("/api/datasets/{id}/summary", "Get summary statistics for a dataset"),
    (
        "/api/compare",
        "Compare several datasets: ids, startYear, endYear and energyTypes",
    ),
    ("/metrics", "Prometheus metrics"),
];

/// Returns a [axum::Router] for the API.
///
/// # Arguments
///
/// * `state`: Shared application state
pub fn router(state: SharedAppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/api/datasets", get(list_datasets))
        .route("/api/datasets/:id", get(get_dataset))
        .route("/api/datasets/:id/filter", get(filter_dataset))
        .route("/api/datasets/:id/summary", get(summarize_dataset))
        .route("/api/compare", get(compare))
        .route("/metrics", get(metrics::metrics_handler))
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .on_request(metrics::request_counter)
                .on_response(metrics::record_response_metrics),
        )
        .with_state(state)
}

/// Returns a [Service] for the API.
///
/// # Arguments
///
/// * `state`: Shared application state
pub fn service(state: SharedAppState) -> Service {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

/// API description
async fn root() -> Json<models::RootResponse> {
    Json(models::RootResponse {
        message: "Energy dataset comparison API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: ENDPOINTS
            .iter()
            .map(|(route, description)| (*route, description.to_string()))
            .collect(),
    })
}

/// Liveness check
async fn health() -> Json<models::HealthResponse> {
    Json(models::HealthResponse {
        status: "healthy".to_string(),
        timestamp: OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// List available datasets
async fn list_datasets(State(state): State<SharedAppState>) -> Json<models::DatasetList> {
    Json(state.query_service.dataset_list())
}

/// Get a whole dataset
async fn get_dataset(
    State(state): State<SharedAppState>,
    Path(id): Path<String>,
) -> Result<Json<models::DatasetResponse>, DatasetError> {
    state.query_service.dataset_response(&id).map(Json)
}

/// Get a filtered dataset
async fn filter_dataset(
    State(state): State<SharedAppState>,
    Path(id): Path<String>,
    ValidatedQuery(params): ValidatedQuery<models::FilterParams>,
) -> Result<Json<models::FilteredDatasetResponse>, DatasetError> {
    state.query_service.filtered_response(&id, &params).map(Json)
}

/// Get summary statistics, optionally of a filtered dataset
async fn summarize_dataset(
    State(state): State<SharedAppState>,
    Path(id): Path<String>,
    ValidatedQuery(params): ValidatedQuery<models::FilterParams>,
) -> Result<Json<models::SummaryResponse>, DatasetError> {
    state.query_service.summary_response(&id, &params).map(Json)
}

/// Compare several datasets under one filter
///
/// Per-dataset failures are reported in the response body; the request itself succeeds.
async fn compare(
    State(state): State<SharedAppState>,
    ValidatedQuery(params): ValidatedQuery<models::CompareParams>,
) -> Json<models::ComparisonResponse> {
    let ids = params.ids();
    event!(Level::DEBUG, ids = ?ids, "comparing datasets");
    let source: Arc<dyn DatasetSource> = state.query_service.clone();
    let comparison = Comparison::start(
        source,
        ids,
        params.filter.to_filter_spec(),
        state.args.comparison_timeout(),
    );
    let status = comparison.settled().await.status();
    Json(models::ComparisonResponse::new(status, params.filter.echo()))
}

/// Fallback for unknown routes
async fn not_found(uri: Uri) -> DatasetError {
    DatasetError::EndpointNotFound {
        path: uri.path().to_string(),
    }
}
