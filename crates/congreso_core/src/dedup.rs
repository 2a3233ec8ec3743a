//! Pre-insert duplicate check on the (name, district, church) key.
//!
//! The check and the later insert are separate round-trips. Two identical
//! submissions racing each other can both pass here; the store's uniqueness
//! constraint is what actually rejects the second one.

use std::sync::Arc;

use serde::Serialize;

use crate::error::CongresoError;
use crate::store::RegistrationStore;
use crate::types::{DedupKey, Registration};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "key", rename_all = "snake_case")]
pub enum GuardOutcome {
    Accepted,
    Rejected(DedupKey),
}

impl GuardOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GuardOutcome::Accepted)
    }

    /// `Rejected` becomes [`CongresoError::DuplicateKey`].
    pub fn into_result(self) -> Result<(), CongresoError> {
        match self {
            GuardOutcome::Accepted => Ok(()),
            GuardOutcome::Rejected(key) => Err(CongresoError::DuplicateKey(key)),
        }
    }
}

/// Check `key` against an already-fetched registration set.
pub fn check_against(registrations: &[Registration], key: &DedupKey) -> GuardOutcome {
    if registrations.iter().any(|r| key.matches(r)) {
        GuardOutcome::Rejected(key.clone())
    } else {
        GuardOutcome::Accepted
    }
}

pub struct DeduplicationGuard {
    store: Arc<dyn RegistrationStore>,
}

impl DeduplicationGuard {
    pub fn new(store: Arc<dyn RegistrationStore>) -> Self {
        Self { store }
    }

    /// Filtered lookup for `key`. No normalisation: name, district and
    /// church must match byte for byte.
    pub async fn check_and_reserve(&self, key: &DedupKey) -> Result<GuardOutcome, CongresoError> {
        let existing = self.store.find_by_key(key).await?;
        let outcome = check_against(&existing, key);
        if let GuardOutcome::Rejected(ref k) = outcome {
            tracing::info!(district = %k.district, church = %k.church, "duplicate registration rejected by pre-check");
        }
        Ok(outcome)
    }
}
