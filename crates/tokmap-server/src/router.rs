use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{middleware, Router};
use tokmap_store::IdentifierResolver;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::cors;
use crate::error::ServerResult;
use crate::handler;

/// HTTP endpoint paths.
pub mod endpoints {
    pub const GET_ID: &str = "/api/get-id";
    pub const GET_SLUG: &str = "/api/get-slug/*token";
    pub const GET_SLUG_EMPTY: &str = "/api/get-slug/";
    pub const HEALTH: &str = "/api/health";
}

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub resolver: IdentifierResolver,
}

/// Build the axum router with all tokmap endpoints.
///
/// A known path hit with the wrong method answers `Endpoint not found`
/// rather than 405, matching unmatched paths.
pub fn build_router(resolver: IdentifierResolver, config: &ServerConfig) -> ServerResult<Router> {
    let [content_type, allow_origin, allow_methods, allow_headers] =
        cors::response_headers(config.allow_origin_header()?);

    let router = Router::new()
        .route(
            endpoints::GET_ID,
            post(handler::get_id).fallback(handler::endpoint_not_found),
        )
        .route(
            endpoints::GET_SLUG,
            get(handler::get_slug).fallback(handler::endpoint_not_found),
        )
        .route(
            endpoints::GET_SLUG_EMPTY,
            get(handler::get_slug_empty).fallback(handler::endpoint_not_found),
        )
        .route(
            endpoints::HEALTH,
            get(handler::health).fallback(handler::endpoint_not_found),
        )
        .fallback(handler::endpoint_not_found)
        .layer(middleware::from_fn(cors::preflight))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(content_type)
        .layer(allow_origin)
        .layer(allow_methods)
        .layer(allow_headers)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { resolver });

    Ok(router)
}
