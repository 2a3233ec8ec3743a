//! Bearer-token check against the in-process session gate.

use std::sync::Arc;

use axum::extract::Request;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use congreso_core::error::CongresoError;
use congreso_core::session::SessionGate;

use crate::error::AppError;

/// Verified session token, available to handlers behind [`session_auth`].
#[derive(Clone, Debug)]
pub struct SessionBearer(pub String);

fn bearer(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub async fn session_auth(mut req: Request, next: Next) -> Response {
    let Some(gate) = req.extensions().get::<Arc<SessionGate>>().cloned() else {
        return AppError(CongresoError::Unauthorized("session gate not configured".into()))
            .into_response();
    };
    let Some(token) = bearer(&req).map(str::to_string) else {
        return AppError(CongresoError::Unauthorized("missing bearer token".into()))
            .into_response();
    };
    if let Err(e) = gate.verify(&token).await {
        return AppError(e).into_response();
    }
    req.extensions_mut().insert(SessionBearer(token));
    next.run(req).await
}
