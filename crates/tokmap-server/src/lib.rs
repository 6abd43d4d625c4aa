//! HTTP server for tokmap.
//!
//! Exposes the identifier resolution service to the reader front end:
//! `POST /api/get-id` turns a `(type, slug)` pair into an opaque token and
//! `GET /api/get-slug/{uuid}` turns it back.

pub mod config;
pub mod cors;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ApiError, ServerError, ServerResult};
pub use router::{build_router, AppState};
pub use server::{open_resolver, TokmapServer};
