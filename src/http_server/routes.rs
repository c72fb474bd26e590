//! REST routes over the store
//!
//! Every handler authorizes first, in the same order as the operations it
//! performs; payload parsing and schema validation happen at this boundary
//! so the store only ever sees typed resources.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};

use crate::schema::{parse_resource, Resource, Value, ID_FIELD};
use crate::store::{Store, StoreError};

use super::middleware::{basic_auth, AuthUser};

/// Shared state for all API handlers.
pub struct AppState {
    pub store: Arc<Store>,
}

/// Builds the `/api` router with the basic-auth layer applied.
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/{resource}", get(list_records).post(create_record))
        .route(
            "/api/{resource}/{id}",
            get(read_record).put(update_record).delete(delete_record),
        )
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            basic_auth,
        ))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(default)]
    sort_by: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ErrorResponse {
    error: String,
}

/// JSON error body shared with the middleware.
pub(super) fn error_body(message: String) -> Json<ErrorResponse> {
    Json(ErrorResponse { error: message })
}

/// Handler-level error carrying the response status.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let status = match &err {
            StoreError::NotFound => StatusCode::NOT_FOUND,
            StoreError::Unauthenticated => StatusCode::UNAUTHORIZED,
            StoreError::Unauthorized => StatusCode::FORBIDDEN,
            StoreError::Validation(_) => StatusCode::BAD_REQUEST,
            StoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, error_body(self.message)).into_response()
    }
}

async fn list_records(
    State(state): State<Arc<AppState>>,
    Path(resource): Path<String>,
    Query(params): Query<ListParams>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Vec<Resource>>, ApiError> {
    state
        .store
        .authorize(&resource, "", "read", user.as_ref())?;

    let resources = state.store.list(&resource, &params.sort_by)?;
    Ok(Json(resources))
}

async fn read_record(
    State(state): State<Arc<AppState>>,
    Path((resource, id)): Path<(String, String)>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Resource>, ApiError> {
    state
        .store
        .authorize(&resource, &id, "read", user.as_ref())?;

    let record = state.store.read_one(&resource, &id)?;
    Ok(Json(record))
}

async fn create_record(
    State(state): State<Arc<AppState>>,
    Path(resource): Path<String>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    body: Result<Json<Resource>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .store
        .authorize(&resource, "", "create", user.as_ref())?;

    let Json(raw) = body.map_err(|e| ApiError::bad_request(format!("Invalid JSON payload: {e}")))?;

    let schema = state
        .store
        .schema(&resource)
        .ok_or_else(|| ApiError::bad_request(format!("No schema found for resource {resource}")))?;

    let parsed = parse_resource(schema, &raw)
        .map_err(|e| ApiError::bad_request(format!("Bad Request: {e}")))?;

    let id = state.store.create(&resource, parsed)?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "_id": id }))))
}

async fn update_record(
    State(state): State<Arc<AppState>>,
    Path((resource, id)): Path<(String, String)>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    body: Result<Json<Resource>, JsonRejection>,
) -> Result<Json<Resource>, ApiError> {
    state
        .store
        .authorize(&resource, &id, "update", user.as_ref())?;

    let Json(raw) = body.map_err(|e| ApiError::bad_request(format!("Invalid JSON payload: {e}")))?;

    let schema = state
        .store
        .schema(&resource)
        .ok_or_else(|| ApiError::bad_request(format!("No schema found for resource {resource}")))?;

    // The codec skips reserved fields, so the caller can neither forge the
    // version nor rename the record; the path id wins.
    let mut parsed = parse_resource(schema, &raw)
        .map_err(|e| ApiError::bad_request(format!("Bad Request: {e}")))?;
    parsed.insert(ID_FIELD.to_string(), Value::Text(id));

    state.store.update(&resource, parsed.clone())?;

    Ok(Json(parsed))
}

async fn delete_record(
    State(state): State<Arc<AppState>>,
    Path((resource, id)): Path<(String, String)>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .authorize(&resource, &id, "delete", user.as_ref())?;

    state.store.delete(&resource, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaError;

    #[test]
    fn test_store_errors_map_to_status_codes() {
        let cases = [
            (StoreError::NotFound, StatusCode::NOT_FOUND),
            (StoreError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (StoreError::Unauthorized, StatusCode::FORBIDDEN),
            (
                StoreError::Validation(SchemaError::NotANumber {
                    field: "year".into(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                StoreError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status, expected);
        }
    }
}
