//! POST /registrations — submit a registration (public)
//! GET  /dashboard/registrations — full list, newest first (session required)

use std::sync::Arc;

use axum::http::StatusCode;
use axum::{Extension, Json};
use congreso_core::service::RegistrationService;
use congreso_core::types::{Registration, RegistrationForm};

use crate::error::AppError;

pub async fn submit(
    Extension(service): Extension<Arc<RegistrationService>>,
    Json(form): Json<RegistrationForm>,
) -> Result<(StatusCode, Json<Registration>), AppError> {
    let registration = service.register(&form).await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

pub async fn list(
    Extension(service): Extension<Arc<RegistrationService>>,
) -> Result<Json<Vec<Registration>>, AppError> {
    Ok(Json(service.list_registrations().await?))
}
