// # slotlog-http
//
// axum router exposing the slot ledger.
//
// Handlers are thin: they extract the caller's key, decode the body and
// hand off to `SlotLedger`. Core errors become plain-text responses via
// `AppError`.

pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use extract::ClientAddress;
pub use state::AppState;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the application router
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()` so
/// peer addresses are available when no proxy header is present.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::confirmed_page))
        .route("/visits", get(routes::visits_page))
        .route("/api/slot-request", post(routes::slot_request))
        .route("/api/slot-confirm", post(routes::slot_confirm))
        .route("/log", post(routes::log_request))
        .route("/visit", post(routes::log_visit))
        .route("/health", get(routes::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
