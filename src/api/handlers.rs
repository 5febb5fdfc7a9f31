use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::api::ApiState;
use crate::catalog::{ListQuery, Product, ProductPage};
use crate::http::response::ApiError;
use crate::security::csrf::CsrfToken;

pub const MAX_SEARCH_RESULTS: usize = 10;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct CsrfTokenResponse {
    pub token: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Serialize)]
pub struct SearchResults {
    pub query: String,
    pub results: Vec<Product>,
}

#[derive(Deserialize)]
pub struct CompareRequest {
    pub ids: Vec<String>,
}

#[derive(Serialize)]
pub struct CompareResponse {
    pub products: Vec<Product>,
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Hands the double-submit token to script clients, which cannot read the
/// HttpOnly cookie themselves.
pub async fn csrf_token(token: Option<Extension<CsrfToken>>) -> Json<CsrfTokenResponse> {
    Json(CsrfTokenResponse {
        token: token.map(|Extension(CsrfToken(token))| token),
    })
}

pub async fn list_products(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> Json<ProductPage> {
    Json(state.catalog.list(&query))
}

pub async fn get_product(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    state
        .catalog
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("unknown product: {id}")))
}

pub async fn search(
    State(state): State<ApiState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResults>, ApiError> {
    let q = query.q.trim();
    if q.is_empty() {
        return Err(ApiError::BadRequest("search query must not be empty".into()));
    }

    let results = state.catalog.search(q, MAX_SEARCH_RESULTS);
    tracing::debug!(query = %q, hits = results.len(), "Catalog search");
    Ok(Json(SearchResults {
        query: q.to_string(),
        results,
    }))
}

pub async fn compare(
    State(state): State<ApiState>,
    Json(request): Json<CompareRequest>,
) -> Result<Json<CompareResponse>, ApiError> {
    let products = state.catalog.compare(&request.ids)?;
    Ok(Json(CompareResponse { products }))
}
