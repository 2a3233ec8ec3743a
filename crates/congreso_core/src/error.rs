use thiserror::Error;

use crate::types::DedupKey;

#[derive(Debug, Error)]
pub enum CongresoError {
    #[error("invalid submission: {0}")]
    Validation(String),

    #[error("duplicate registration: {0}")]
    DuplicateKey(DedupKey),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("store failure: {0}")]
    StoreFailure(#[source] anyhow::Error),

    #[error("catalog: {0}")]
    Catalog(#[from] CatalogError),
}

impl CongresoError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::DuplicateKey(_) => 409,
            Self::StoreFailure(_) => 503,
            Self::Catalog(_) => 500,
        }
    }

    /// Stable machine-readable kind for API bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::DuplicateKey(_) => "duplicate",
            Self::Unauthorized(_) => "unauthorized",
            Self::StoreFailure(_) => "store_failure",
            Self::Catalog(_) => "catalog",
        }
    }
}

/// Outcome of a failed store round-trip.
///
/// `Conflict` is only raised for a violated (name, district, church) uniqueness
/// constraint; everything else is `Backend`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("uniqueness conflict on {0}")]
    Conflict(DedupKey),

    #[error("backend: {0}")]
    Backend(#[from] anyhow::Error),
}

impl From<StoreError> for CongresoError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(key) => CongresoError::DuplicateKey(key),
            StoreError::Backend(e) => CongresoError::StoreFailure(e),
        }
    }
}

/// Static location catalog failed to load. Never raised by lookups.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("parse: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("expandable district {0:?} is not listed")]
    MissingExpandable(String),

    #[error("expandable district {0:?} lists no sectors")]
    EmptyExpandable(String),

    #[error("collapsed district {0:?} must not list sectors")]
    CollapsedWithSectors(String),

    #[error("district {0:?} is listed twice")]
    DuplicateDistrict(String),

    #[error("district name must not be empty")]
    EmptyDistrictName,

    #[error("church {church:?} is listed again under {district:?}")]
    DuplicateChurch { district: String, church: String },
}
