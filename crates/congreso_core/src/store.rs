//! Storage port for registrations.
//! Implemented by `congreso_postgres` and by [`crate::memory::MemoryRegistrationStore`];
//! core logic depends only on this trait.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{DedupKey, NewRegistration, Registration};

pub type Result<T> = std::result::Result<T, StoreError>;

/// Ordered retrieval of registrations and insertion with conflict reporting.
///
/// Implementations must enforce uniqueness of (name, district, church) at
/// insertion time and report a violation as [`StoreError::Conflict`], distinct
/// from every other failure. The pre-insert check done by
/// [`crate::dedup::DeduplicationGuard`] is best-effort only.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Insert a validated registration. The store assigns `id` and `created_at`.
    async fn insert(&self, record: &NewRegistration) -> Result<Registration>;

    /// Every registration, `created_at` descending.
    async fn list_all(&self) -> Result<Vec<Registration>>;

    /// Registrations matching the key exactly (case-sensitive).
    async fn find_by_key(&self, key: &DedupKey) -> Result<Vec<Registration>>;
}
