use std::sync::Arc;

use axum::{Extension, Json};
use congreso_core::service::{Dashboard, RegistrationService};

use crate::error::AppError;

/// GET /dashboard — aggregates plus the recent list, recomputed per call.
pub async fn dashboard(
    Extension(service): Extension<Arc<RegistrationService>>,
) -> Result<Json<Dashboard>, AppError> {
    Ok(Json(service.dashboard().await?))
}
