//! In-process registration store.
//!
//! Used when no database is configured and in tests. The uniqueness check
//! and the append happen under one write lock, so concurrent inserts of the
//! same key cannot both succeed.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::StoreError;
use crate::store::{RegistrationStore, Result};
use crate::types::{DedupKey, NewRegistration, Registration};

pub struct MemoryRegistrationStore {
    // Insertion order; reads reverse it.
    rows: RwLock<Vec<Registration>>,
    clock: Arc<dyn Clock>,
}

impl MemoryRegistrationStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            clock,
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

impl Default for MemoryRegistrationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistrationStore for MemoryRegistrationStore {
    async fn insert(&self, record: &NewRegistration) -> Result<Registration> {
        let key = record.dedup_key();
        let mut rows = self.rows.write().await;
        if rows.iter().any(|r| key.matches(r)) {
            return Err(StoreError::Conflict(key));
        }
        // created_at never goes backwards in insertion order.
        let now = self.clock.now();
        let created_at = match rows.last() {
            Some(last) if last.created_at > now => last.created_at,
            _ => now,
        };
        let registration = Registration {
            id: Uuid::new_v4(),
            name: record.name.clone(),
            district: record.district.clone(),
            sector: record.sector,
            church: record.church.clone(),
            created_at,
        };
        rows.push(registration.clone());
        Ok(registration)
    }

    async fn list_all(&self) -> Result<Vec<Registration>> {
        let rows = self.rows.read().await;
        let mut out: Vec<Registration> = rows.iter().rev().cloned().collect();
        // Reversed insertion order is already newest first; the stable sort
        // only matters if a clock stepped backwards.
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn find_by_key(&self, key: &DedupKey) -> Result<Vec<Registration>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().filter(|r| key.matches(r)).cloned().collect())
    }
}
