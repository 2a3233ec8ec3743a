//! POST   /session — exchange the passphrase for a session token
//! DELETE /dashboard/session — end the current session

use std::sync::Arc;

use axum::http::StatusCode;
use axum::{Extension, Json};
use congreso_core::session::{SessionGate, SessionToken};
use serde::Deserialize;

use crate::error::AppError;
use crate::middleware::session::SessionBearer;

#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    pub passphrase: String,
}

pub async fn check_in(
    Extension(gate): Extension<Arc<SessionGate>>,
    Json(req): Json<CheckInRequest>,
) -> Result<Json<SessionToken>, AppError> {
    Ok(Json(gate.check_in(&req.passphrase).await?))
}

pub async fn check_out(
    Extension(gate): Extension<Arc<SessionGate>>,
    Extension(SessionBearer(token)): Extension<SessionBearer>,
) -> StatusCode {
    gate.check_out(&token).await;
    StatusCode::NO_CONTENT
}
