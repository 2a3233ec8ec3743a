//! Catalog browsing for the submission form.
//!
//! GET /catalog/districts
//! GET /catalog/districts/:district/sectors
//! GET /catalog/districts/:district/sectors/:sector/churches
//!
//! Unknown districts or sectors answer with an empty list.

use std::sync::Arc;

use axum::extract::Path;
use axum::{Extension, Json};
use congreso_core::service::RegistrationService;
use congreso_core::types::Sector;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DistrictInfo {
    pub name: String,
    pub expandable: bool,
}

pub async fn list_districts(
    Extension(service): Extension<Arc<RegistrationService>>,
) -> Json<Vec<DistrictInfo>> {
    let catalog = service.catalog();
    let districts = catalog
        .list_districts()
        .into_iter()
        .map(|name| DistrictInfo {
            name: name.to_string(),
            expandable: catalog.is_expandable(name),
        })
        .collect();
    Json(districts)
}

pub async fn list_sectors(
    Extension(service): Extension<Arc<RegistrationService>>,
    Path(district): Path<String>,
) -> Json<Vec<Sector>> {
    let catalog = service.catalog();
    // Collapsed districts have no sector step.
    if !catalog.is_expandable(&district) {
        return Json(Vec::new());
    }
    Json(catalog.list_sectors(&district))
}

pub async fn list_churches(
    Extension(service): Extension<Arc<RegistrationService>>,
    Path((district, sector)): Path<(String, String)>,
) -> Json<Vec<String>> {
    let Ok(sector) = sector.parse::<Sector>() else {
        return Json(Vec::new());
    };
    let churches = service
        .catalog()
        .list_churches(&district, sector)
        .into_iter()
        .map(str::to_string)
        .collect();
    Json(churches)
}
