//! Server configuration from environment variables.
//!
//!   CONGRESO_PASSPHRASE         — dashboard passphrase (required)
//!   CONGRESO_DATABASE_URL       — Postgres connection string (in-memory store when unset)
//!   CONGRESO_BIND_ADDR          — listen address (default: 0.0.0.0:4200)
//!   CONGRESO_CATALOG_PATH       — YAML catalog replacing the built-in one
//!   CONGRESO_UTC_OFFSET_MINUTES — organiser time zone for "today" (default: 0)
//!   CONGRESO_SESSION_TTL_SECS   — dashboard session lifetime (default: 28800)
//!   CONGRESO_DB_MAX_CONNECTIONS — pool size (default: 10)

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, FixedOffset};
use congreso_core::session::DEFAULT_SESSION_TTL_SECS;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub passphrase: String,
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub catalog_path: Option<PathBuf>,
    pub utc_offset: FixedOffset,
    pub session_ttl: Duration,
    pub db_max_connections: u32,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let passphrase = get("CONGRESO_PASSPHRASE")
            .ok_or_else(|| anyhow!("CONGRESO_PASSPHRASE must be set"))?;

        let offset_minutes: i32 = parse_or(get("CONGRESO_UTC_OFFSET_MINUTES"), 0)
            .context("CONGRESO_UTC_OFFSET_MINUTES")?;
        let utc_offset = FixedOffset::east_opt(offset_minutes * 60)
            .ok_or_else(|| anyhow!("CONGRESO_UTC_OFFSET_MINUTES out of range: {offset_minutes}"))?;

        let ttl_secs: i64 = parse_or(get("CONGRESO_SESSION_TTL_SECS"), DEFAULT_SESSION_TTL_SECS)
            .context("CONGRESO_SESSION_TTL_SECS")?;
        if ttl_secs <= 0 {
            return Err(anyhow!("CONGRESO_SESSION_TTL_SECS must be positive"));
        }

        Ok(Self {
            passphrase,
            database_url: get("CONGRESO_DATABASE_URL"),
            bind_addr: get("CONGRESO_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:4200".into()),
            catalog_path: get("CONGRESO_CATALOG_PATH").map(PathBuf::from),
            utc_offset,
            session_ttl: Duration::seconds(ttl_secs),
            db_max_connections: parse_or(get("CONGRESO_DB_MAX_CONNECTIONS"), 10)
                .context("CONGRESO_DB_MAX_CONNECTIONS")?,
        })
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid value {v:?}: {e}")),
    }
}
