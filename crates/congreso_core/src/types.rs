use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Sector ───────────────────────────────────────────────────

/// Wire label of the out-of-area sentinel sector.
pub const FOREIGN_SECTOR_LABEL: &str = "Foráneo";

/// Mid-level grouping under the expandable district.
///
/// Numbered sectors order before the sentinel, so `Foreign` always lists last.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "SectorRepr", into = "SectorRepr")]
pub enum Sector {
    Numbered(u8),
    Foreign,
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sector::Numbered(n) => write!(f, "{n}"),
            Sector::Foreign => f.write_str(FOREIGN_SECTOR_LABEL),
        }
    }
}

impl FromStr for Sector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == FOREIGN_SECTOR_LABEL {
            return Ok(Sector::Foreign);
        }
        match s.parse::<u8>() {
            Ok(0) => Err("sector numbers start at 1".to_string()),
            Ok(n) => Ok(Sector::Numbered(n)),
            Err(_) => Err(format!("unrecognised sector: {s:?}")),
        }
    }
}

/// Untyped wire shape: an integer or a string.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SectorRepr {
    Number(u64),
    Text(String),
}

impl TryFrom<SectorRepr> for Sector {
    type Error = String;

    fn try_from(repr: SectorRepr) -> Result<Self, Self::Error> {
        match repr {
            SectorRepr::Number(0) => Err("sector numbers start at 1".to_string()),
            SectorRepr::Number(n) => u8::try_from(n)
                .map(Sector::Numbered)
                .map_err(|_| format!("sector number out of range: {n}")),
            SectorRepr::Text(s) => s.parse(),
        }
    }
}

impl From<Sector> for SectorRepr {
    fn from(sector: Sector) -> Self {
        match sector {
            Sector::Numbered(n) => SectorRepr::Number(u64::from(n)),
            Sector::Foreign => SectorRepr::Text(FOREIGN_SECTOR_LABEL.to_string()),
        }
    }
}

// ─── Registrations ────────────────────────────────────────────

/// A stored registration. `id` and `created_at` are assigned by the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: Uuid,
    pub name: String,
    pub district: String,
    pub sector: Sector,
    pub church: String,
    pub created_at: DateTime<Utc>,
}

impl Registration {
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            name: self.name.clone(),
            district: self.district.clone(),
            church: self.church.clone(),
        }
    }
}

/// Validated insertion payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRegistration {
    pub name: String,
    pub district: String,
    pub sector: Sector,
    pub church: String,
}

impl NewRegistration {
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            name: self.name.clone(),
            district: self.district.clone(),
            church: self.church.clone(),
        }
    }
}

/// The (name, district, church) triple that must be unique among registrations.
/// Matching is exact and case-sensitive.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DedupKey {
    pub name: String,
    pub district: String,
    pub church: String,
}

impl DedupKey {
    pub fn matches(&self, registration: &Registration) -> bool {
        registration.name == self.name
            && registration.district == self.district
            && registration.church == self.church
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" @ {} ({})", self.name, self.church, self.district)
    }
}

/// Raw submission payload from the form collaborator. Nothing here is trusted.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RegistrationForm {
    pub name: String,
    pub district: String,
    #[serde(default)]
    pub sector: Option<Sector>,
    #[serde(default)]
    pub church: Option<String>,
}
