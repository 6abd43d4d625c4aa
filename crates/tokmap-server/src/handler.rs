use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, PathRejection};
use axum::extract::{Path, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tokmap_types::Kind;
use tracing::debug;

use crate::error::ApiError;
use crate::router::AppState;

/// Body of `POST /api/get-id`.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetIdRequest {
    pub slug: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetIdResponse {
    pub uuid: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetSlugResponse {
    pub slug: String,
    #[serde(rename = "type")]
    pub kind: Kind,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub bindings: usize,
}

/// Issue (or return) the token for a slug.
///
/// The body is read as raw bytes so that clients which omit or mislabel
/// `Content-Type` are still served.
pub async fn get_id(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<GetIdResponse>, ApiError> {
    let body = body.map_err(|e| {
        debug!(error = %e, "unreadable request body");
        ApiError::InvalidRequest
    })?;
    let request: GetIdRequest = serde_json::from_slice(&body).map_err(|e| {
        debug!(error = %e, "malformed get-id body");
        ApiError::InvalidRequest
    })?;

    let resolver = state.resolver;
    let issued = if resolver.is_durable() {
        tokio::task::spawn_blocking(move || resolver.issue(&request.kind, &request.slug))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "issue task failed");
                ApiError::Internal
            })??
    } else {
        resolver.issue(&request.kind, &request.slug)?
    };
    Ok(Json(GetIdResponse {
        uuid: issued.binding.token.to_string(),
    }))
}

/// Resolve a token back to its slug and kind.
///
/// Everything after the prefix is the token, slashes included. A path that
/// does not decode to UTF-8 cannot name an issued token, so it is a miss.
pub async fn get_slug(
    State(state): State<AppState>,
    token: Result<Path<String>, PathRejection>,
) -> Result<Json<GetSlugResponse>, ApiError> {
    let Path(token) = token.map_err(|e| {
        debug!(error = %e, "undecodable token path");
        ApiError::NotFound
    })?;
    let key = state.resolver.resolve(&token)?.ok_or(ApiError::NotFound)?;
    Ok(Json(GetSlugResponse {
        slug: key.slug.into(),
        kind: key.kind,
    }))
}

/// `GET /api/get-slug/` with nothing after the slash.
pub async fn get_slug_empty() -> ApiError {
    ApiError::NotFound
}

pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    Ok(Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        bindings: state.resolver.len()?,
    }))
}

pub async fn endpoint_not_found() -> ApiError {
    ApiError::EndpointNotFound
}
