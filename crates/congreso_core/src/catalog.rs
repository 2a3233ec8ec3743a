//! Static location hierarchy: district → sector → church.
//!
//! Loaded once at process start from YAML configuration. One district is
//! expandable and exposes sectors and churches; every other district is
//! collapsed and contributes a single `(district, Foráneo, district)` row.
//! Lookups are total: unknown keys yield empty results, never errors.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::CatalogError;
use crate::types::Sector;

const BUILTIN_CATALOG: &str = include_str!("catalog.yaml");

/// One row of the flattened catalog table.
#[derive(Clone, Debug, PartialEq, Eq)]
struct LocationNode {
    district: String,
    sector: Sector,
    church: String,
}

#[derive(Clone, Debug)]
pub struct LocationCatalog {
    nodes: Vec<LocationNode>,
    expandable: String,
}

// ─── YAML shape ───────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    expandable_district: String,
    districts: Vec<DistrictEntry>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DistrictEntry {
    name: String,
    #[serde(default)]
    sectors: Vec<SectorEntry>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SectorEntry {
    sector: Sector,
    churches: Vec<String>,
}

impl LocationCatalog {
    /// The catalog compiled into the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;
        Self::from_file(file)
    }

    fn from_file(file: CatalogFile) -> Result<Self, CatalogError> {
        let expandable = file.expandable_district;
        let mut nodes = Vec::new();
        let mut seen_districts = HashSet::new();
        let mut seen_churches = HashSet::new();

        for district in file.districts {
            if district.name.trim().is_empty() {
                return Err(CatalogError::EmptyDistrictName);
            }
            if !seen_districts.insert(district.name.clone()) {
                return Err(CatalogError::DuplicateDistrict(district.name));
            }

            if district.name == expandable {
                if district.sectors.is_empty() {
                    return Err(CatalogError::EmptyExpandable(district.name));
                }
                for entry in district.sectors {
                    for church in entry.churches {
                        if !seen_churches.insert(church.clone()) {
                            return Err(CatalogError::DuplicateChurch {
                                district: district.name.clone(),
                                church,
                            });
                        }
                        nodes.push(LocationNode {
                            district: district.name.clone(),
                            sector: entry.sector,
                            church,
                        });
                    }
                }
            } else {
                if !district.sectors.is_empty() {
                    return Err(CatalogError::CollapsedWithSectors(district.name));
                }
                if !seen_churches.insert(district.name.clone()) {
                    return Err(CatalogError::DuplicateChurch {
                        district: district.name.clone(),
                        church: district.name,
                    });
                }
                nodes.push(LocationNode {
                    district: district.name.clone(),
                    sector: Sector::Foreign,
                    church: district.name,
                });
            }
        }

        if !seen_districts.contains(&expandable) {
            return Err(CatalogError::MissingExpandable(expandable));
        }

        tracing::debug!(
            rows = nodes.len(),
            districts = seen_districts.len(),
            expandable = %expandable,
            "location catalog loaded"
        );
        Ok(Self { nodes, expandable })
    }

    /// District names in first-occurrence order, each once.
    pub fn list_districts(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.nodes
            .iter()
            .filter(|n| seen.insert(n.district.as_str()))
            .map(|n| n.district.as_str())
            .collect()
    }

    /// Distinct sectors under `district`, ascending (`Foráneo` last).
    pub fn list_sectors(&self, district: &str) -> Vec<Sector> {
        let mut sectors: Vec<Sector> = self
            .nodes
            .iter()
            .filter(|n| n.district == district)
            .map(|n| n.sector)
            .collect();
        sectors.sort();
        sectors.dedup();
        sectors
    }

    /// Churches under `(district, sector)` in table order.
    pub fn list_churches(&self, district: &str, sector: Sector) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|n| n.district == district && n.sector == sector)
            .map(|n| n.church.as_str())
            .collect()
    }

    pub fn is_expandable(&self, district: &str) -> bool {
        self.expandable == district
    }

    pub fn contains_district(&self, district: &str) -> bool {
        self.nodes.iter().any(|n| n.district == district)
    }

    pub fn contains(&self, district: &str, sector: Sector, church: &str) -> bool {
        self.nodes
            .iter()
            .any(|n| n.district == district && n.sector == sector && n.church == church)
    }

    pub fn expandable_district(&self) -> &str {
        &self.expandable
    }
}
