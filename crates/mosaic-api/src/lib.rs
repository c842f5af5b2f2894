//! Axum HTTP API server for face mosaic processing.
//!
//! This crate provides:
//! - The `/api/mosaic` upload endpoint
//! - Startup model acquisition and detector construction
//! - CORS, request-ID, and request-logging middleware

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
