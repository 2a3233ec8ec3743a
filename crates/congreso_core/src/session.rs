//! Dashboard check-in.
//!
//! A shared passphrase buys a short-lived session token. Sessions live in
//! the gate instance owned by the server process; ending the process or
//! calling [`SessionGate::check_out`] ends them.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::CongresoError;

pub const DEFAULT_SESSION_TTL_SECS: i64 = 8 * 3600;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct SessionGate {
    passphrase_digest: [u8; 32],
    ttl: Duration,
    clock: Arc<dyn Clock>,
    sessions: RwLock<HashMap<String, DateTime<Utc>>>,
}

fn digest(input: &str) -> [u8; 32] {
    Sha256::digest(input.as_bytes()).into()
}

impl SessionGate {
    pub fn new(passphrase: &str, ttl: Duration) -> Self {
        Self::with_clock(passphrase, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(passphrase: &str, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            passphrase_digest: digest(passphrase),
            ttl,
            clock,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn check_in(&self, passphrase: &str) -> Result<SessionToken, CongresoError> {
        let offered = digest(passphrase);
        let matches: bool = offered.ct_eq(&self.passphrase_digest).into();
        if !matches {
            tracing::warn!("dashboard check-in refused");
            return Err(CongresoError::Unauthorized("incorrect passphrase".into()));
        }

        let now = self.clock.now();
        let expires_at = now + self.ttl;
        let token = hex::encode(Sha256::digest(Uuid::new_v4().as_bytes()));

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, exp| *exp > now);
        sessions.insert(token.clone(), expires_at);
        tracing::info!(active = sessions.len(), %expires_at, "dashboard session opened");

        Ok(SessionToken { token, expires_at })
    }

    pub async fn verify(&self, token: &str) -> Result<(), CongresoError> {
        let now = self.clock.now();
        let expired = {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                None => return Err(CongresoError::Unauthorized("unknown session".into())),
                Some(exp) => *exp <= now,
            }
        };
        if expired {
            self.sessions.write().await.remove(token);
            return Err(CongresoError::Unauthorized("session expired".into()));
        }
        Ok(())
    }

    /// Returns whether a session was actually open.
    pub async fn check_out(&self, token: &str) -> bool {
        let removed = self.sessions.write().await.remove(token).is_some();
        if removed {
            tracing::info!("dashboard session closed");
        }
        removed
    }

    pub async fn active_sessions(&self) -> usize {
        let now = self.clock.now();
        self.sessions
            .read()
            .await
            .values()
            .filter(|exp| **exp > now)
            .count()
    }
}
