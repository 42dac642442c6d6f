//! HTTP application wiring (Axum router + engine wiring).
//!
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use stockledger_engine::ConsistencyEngine;
use stockledger_store::InMemoryStore;

pub mod dto;
pub mod errors;
pub mod routes;

/// Engine handle shared across handlers.
pub type Engine = Arc<ConsistencyEngine<InMemoryStore>>;

/// Build the full HTTP router (public entrypoint used by `main.rs` and
/// the black-box tests).
pub fn build_app() -> Router {
    let engine: Engine = Arc::new(ConsistencyEngine::new(InMemoryStore::new()));
    build_app_with(engine)
}

/// Build the router around an existing engine.
pub fn build_app_with(engine: Engine) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(Extension(engine))
}
