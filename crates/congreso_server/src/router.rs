//! Router construction for the congreso server.

use std::sync::Arc;

use axum::{
    middleware as axum_mw,
    routing::{delete, get, post},
    Extension, Router,
};
use congreso_core::service::RegistrationService;
use congreso_core::session::SessionGate;

use crate::handlers;
use crate::middleware::session::session_auth;

/// Build the full axum router with all routes and middleware.
pub fn build_router(service: Arc<RegistrationService>, gate: Arc<SessionGate>) -> Router {
    // Dashboard routes behind a checked-in session
    let protected = Router::new()
        .route("/dashboard", get(handlers::dashboard::dashboard))
        .route("/dashboard/registrations", get(handlers::registrations::list))
        .route("/dashboard/session", delete(handlers::session::check_out))
        .layer(axum_mw::from_fn(session_auth));

    // Form and check-in routes (no auth)
    let public = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/catalog/districts", get(handlers::catalog::list_districts))
        .route(
            "/catalog/districts/:district/sectors",
            get(handlers::catalog::list_sectors),
        )
        .route(
            "/catalog/districts/:district/sectors/:sector/churches",
            get(handlers::catalog::list_churches),
        )
        .route("/registrations", post(handlers::registrations::submit))
        .route("/session", post(handlers::session::check_in));

    public
        .merge(protected)
        .layer(Extension(gate))
        .layer(Extension(service))
}
