//! RegistrationService — submission and dashboard entry points.
//!
//! Takes the store via `Arc<dyn RegistrationStore>` so the same flow runs
//! against Postgres or the in-memory store.

use std::sync::Arc;

use chrono::{FixedOffset, Offset, Utc};
use tracing::{debug, info, warn};

use crate::aggregate::{aggregate, AggregateSnapshot};
use crate::catalog::LocationCatalog;
use crate::clock::{Clock, SystemClock};
use crate::dedup::DeduplicationGuard;
use crate::error::CongresoError;
use crate::selection::validate_form;
use crate::store::RegistrationStore;
use crate::types::{Registration, RegistrationForm};

pub type Result<T> = std::result::Result<T, CongresoError>;

pub struct RegistrationService {
    catalog: Arc<LocationCatalog>,
    store: Arc<dyn RegistrationStore>,
    guard: DeduplicationGuard,
    clock: Arc<dyn Clock>,
    utc_offset: FixedOffset,
}

impl RegistrationService {
    pub fn new(catalog: Arc<LocationCatalog>, store: Arc<dyn RegistrationStore>) -> Self {
        Self {
            guard: DeduplicationGuard::new(Arc::clone(&store)),
            catalog,
            store,
            clock: Arc::new(SystemClock),
            utc_offset: Utc.fix(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Time zone in which "today" is measured on the dashboard.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    pub fn catalog(&self) -> &Arc<LocationCatalog> {
        &self.catalog
    }

    /// Validate, pre-check for duplicates, insert.
    ///
    /// A uniqueness conflict from the store surfaces as `DuplicateKey`, the
    /// same as a pre-check rejection.
    pub async fn register(&self, form: &RegistrationForm) -> Result<Registration> {
        let record = validate_form(&self.catalog, form).inspect_err(|e| {
            debug!(district = %form.district, error = %e, "submission rejected");
        })?;
        let key = record.dedup_key();

        self.guard.check_and_reserve(&key).await?.into_result()?;

        match self.store.insert(&record).await {
            Ok(registration) => {
                info!(
                    id = %registration.id,
                    district = %registration.district,
                    church = %registration.church,
                    "registration stored"
                );
                Ok(registration)
            }
            Err(e) => {
                let err = CongresoError::from(e);
                match &err {
                    CongresoError::DuplicateKey(k) => {
                        info!(district = %k.district, church = %k.church, "duplicate registration rejected by store")
                    }
                    other => warn!(error = %other, "registration insert failed"),
                }
                Err(err)
            }
        }
    }

    pub async fn list_registrations(&self) -> Result<Vec<Registration>> {
        Ok(self.store.list_all().await?)
    }

    /// One full read, aggregated against the current instant.
    pub async fn dashboard(&self) -> Result<Dashboard> {
        let registrations = self.list_registrations().await?;
        let reference = self.clock.now().with_timezone(&self.utc_offset);
        let snapshot = aggregate(&registrations, reference);
        debug!(total = snapshot.total, "dashboard aggregated");
        Ok(Dashboard {
            snapshot,
            recent: registrations,
        })
    }
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct Dashboard {
    #[serde(flatten)]
    pub snapshot: AggregateSnapshot,
    /// Newest first.
    pub recent: Vec<Registration>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{group_by, Dimension};
    use crate::clock::FixedClock;
    use crate::error::StoreError;
    use crate::memory::MemoryRegistrationStore;
    use crate::types::{DedupKey, NewRegistration, Sector};
    use async_trait::async_trait;
    use chrono::TimeZone;

    const YAML: &str = r#"
expandable_district: Noroeste
districts:
  - name: Noroeste
    sectors:
      - sector: 1
        churches: [Betel, Emanuel]
  - name: Sur
"#;

    fn catalog() -> Arc<LocationCatalog> {
        Arc::new(LocationCatalog::from_yaml_str(YAML).unwrap())
    }

    fn form(name: &str) -> RegistrationForm {
        RegistrationForm {
            name: name.into(),
            district: "Noroeste".into(),
            sector: Some(Sector::Numbered(1)),
            church: Some("Betel".into()),
        }
    }

    #[tokio::test]
    async fn register_then_duplicate() {
        let service = RegistrationService::new(catalog(), Arc::new(MemoryRegistrationStore::new()));
        let reg = service.register(&form(" Juan Pérez ")).await.unwrap();
        assert_eq!(reg.name, "Juan Pérez");

        let err = service.register(&form("Juan Pérez")).await.unwrap_err();
        assert!(matches!(err, CongresoError::DuplicateKey(k) if k.church == "Betel"));
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_store() {
        let store = Arc::new(MemoryRegistrationStore::new());
        let service = RegistrationService::new(catalog(), store.clone());
        let err = service.register(&form("J")).await.unwrap_err();
        assert!(matches!(err, CongresoError::Validation(_)));
        assert!(store.is_empty().await);
    }

    /// Store whose lookups see nothing, as when a concurrent insert lands
    /// between the pre-check and our insert.
    struct RacingStore {
        inner: MemoryRegistrationStore,
    }

    #[async_trait]
    impl RegistrationStore for RacingStore {
        async fn insert(&self, record: &NewRegistration) -> crate::store::Result<Registration> {
            self.inner.insert(record).await
        }
        async fn list_all(&self) -> crate::store::Result<Vec<Registration>> {
            self.inner.list_all().await
        }
        async fn find_by_key(&self, _key: &DedupKey) -> crate::store::Result<Vec<Registration>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn store_conflict_surfaces_as_duplicate() {
        let store = Arc::new(RacingStore {
            inner: MemoryRegistrationStore::new(),
        });
        let service = RegistrationService::new(catalog(), store);
        service.register(&form("Ana López")).await.unwrap();
        let err = service.register(&form("Ana López")).await.unwrap_err();
        assert_eq!(err.kind(), "duplicate");
    }

    struct DownStore;

    #[async_trait]
    impl RegistrationStore for DownStore {
        async fn insert(&self, _: &NewRegistration) -> crate::store::Result<Registration> {
            Err(StoreError::Backend(anyhow::anyhow!("connection refused")))
        }
        async fn list_all(&self) -> crate::store::Result<Vec<Registration>> {
            Err(StoreError::Backend(anyhow::anyhow!("connection refused")))
        }
        async fn find_by_key(&self, _: &DedupKey) -> crate::store::Result<Vec<Registration>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn backend_failure_is_store_failure() {
        let service = RegistrationService::new(catalog(), Arc::new(DownStore));
        let err = service.register(&form("Ana López")).await.unwrap_err();
        assert!(matches!(err, CongresoError::StoreFailure(_)));
        assert!(matches!(
            service.dashboard().await,
            Err(CongresoError::StoreFailure(_))
        ));
    }

    #[tokio::test]
    async fn five_registrations_one_church() {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 3, 15, 18, 0, 0).unwrap(),
        ));
        let store = Arc::new(MemoryRegistrationStore::with_clock(clock.clone()));
        let service = RegistrationService::new(catalog(), store).with_clock(clock);
        for name in ["Ana", "Luis", "Marta", "Pedro", "Rosa"] {
            service
                .register(&RegistrationForm {
                    name: name.into(),
                    district: "Sur".into(),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        let dash = service.dashboard().await.unwrap();
        assert_eq!(dash.snapshot.total, 5);
        assert_eq!(dash.snapshot.unique_churches, 1);
        assert_eq!(dash.snapshot.buckets.today, 5);
        assert_eq!(group_by(&dash.recent, Dimension::Church)[0].count(), 5);
        assert_eq!(dash.snapshot.top_church.unwrap().value, "Sur");
    }
}
