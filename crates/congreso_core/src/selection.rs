//! Cascading district → sector → church selection.
//!
//! An explicit state machine: every upstream change resets everything
//! downstream, whichever way the event arrives. Selecting a collapsed
//! district jumps straight to `Collapsed`, where sector is the sentinel and
//! the church is the district itself.

use std::sync::Arc;

use serde::Serialize;

use crate::catalog::LocationCatalog;
use crate::error::CongresoError;
use crate::types::{NewRegistration, RegistrationForm, Sector};

/// Minimum attendee name length, in characters, after trimming.
pub const MIN_NAME_CHARS: usize = 2;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SelectionState {
    Empty,
    /// Non-expandable district: sector and church are forced.
    Collapsed { district: String },
    DistrictChosen { district: String },
    SectorChosen { district: String, sector: Sector },
    Complete {
        district: String,
        sector: Sector,
        church: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionEvent {
    SelectDistrict(String),
    SelectSector(Sector),
    SelectChurch(String),
    Reset,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Applied,
    /// State left unchanged.
    Ignored(String),
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied)
    }
}

pub struct SelectionResolver {
    catalog: Arc<LocationCatalog>,
    state: SelectionState,
}

impl SelectionResolver {
    pub fn new(catalog: Arc<LocationCatalog>) -> Self {
        Self {
            catalog,
            state: SelectionState::Empty,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn district(&self) -> Option<&str> {
        match &self.state {
            SelectionState::Empty => None,
            SelectionState::Collapsed { district }
            | SelectionState::DistrictChosen { district }
            | SelectionState::SectorChosen { district, .. }
            | SelectionState::Complete { district, .. } => Some(district.as_str()),
        }
    }

    /// Sector as it would be submitted; the sentinel for collapsed districts.
    pub fn sector(&self) -> Option<Sector> {
        match &self.state {
            SelectionState::Collapsed { .. } => Some(Sector::Foreign),
            SelectionState::SectorChosen { sector, .. }
            | SelectionState::Complete { sector, .. } => Some(*sector),
            SelectionState::Empty | SelectionState::DistrictChosen { .. } => None,
        }
    }

    /// Church as it would be submitted; the district for collapsed districts.
    pub fn church(&self) -> Option<&str> {
        match &self.state {
            SelectionState::Collapsed { district } => Some(district.as_str()),
            SelectionState::Complete { church, .. } => Some(church.as_str()),
            _ => None,
        }
    }

    /// Options the form should offer for the next step.
    pub fn sector_options(&self) -> Vec<Sector> {
        match &self.state {
            SelectionState::DistrictChosen { district }
            | SelectionState::SectorChosen { district, .. }
            | SelectionState::Complete { district, .. } => self.catalog.list_sectors(district),
            SelectionState::Empty | SelectionState::Collapsed { .. } => Vec::new(),
        }
    }

    pub fn church_options(&self) -> Vec<&str> {
        match &self.state {
            SelectionState::SectorChosen { district, sector }
            | SelectionState::Complete {
                district, sector, ..
            } => self.catalog.list_churches(district, *sector),
            _ => Vec::new(),
        }
    }

    pub fn apply(&mut self, event: SelectionEvent) -> Transition {
        let next = match (event, &self.state) {
            (SelectionEvent::Reset, _) => SelectionState::Empty,

            (SelectionEvent::SelectDistrict(district), _) => {
                if !self.catalog.contains_district(&district) {
                    return Transition::Ignored(format!("unknown district {district:?}"));
                }
                if self.catalog.is_expandable(&district) {
                    SelectionState::DistrictChosen { district }
                } else {
                    SelectionState::Collapsed { district }
                }
            }

            (
                SelectionEvent::SelectSector(sector),
                SelectionState::DistrictChosen { district }
                | SelectionState::SectorChosen { district, .. }
                | SelectionState::Complete { district, .. },
            ) => {
                if !self.catalog.list_sectors(district).contains(&sector) {
                    return Transition::Ignored(format!("sector {sector} is not in {district}"));
                }
                SelectionState::SectorChosen {
                    district: district.clone(),
                    sector,
                }
            }
            (SelectionEvent::SelectSector(_), SelectionState::Collapsed { district }) => {
                return Transition::Ignored(format!("{district} has no sectors"));
            }
            (SelectionEvent::SelectSector(_), SelectionState::Empty) => {
                return Transition::Ignored("select a district first".to_string());
            }

            (
                SelectionEvent::SelectChurch(church),
                SelectionState::SectorChosen { district, sector }
                | SelectionState::Complete {
                    district, sector, ..
                },
            ) => {
                if !self.catalog.contains(district, *sector, &church) {
                    return Transition::Ignored(format!(
                        "church {church:?} is not in {district} sector {sector}"
                    ));
                }
                SelectionState::Complete {
                    district: district.clone(),
                    sector: *sector,
                    church,
                }
            }
            (SelectionEvent::SelectChurch(_), SelectionState::Collapsed { district }) => {
                return Transition::Ignored(format!("{district} is its own church"));
            }
            (SelectionEvent::SelectChurch(_), _) => {
                return Transition::Ignored("select a sector first".to_string());
            }
        };
        self.state = next;
        Transition::Applied
    }

    pub fn is_well_formed(&self, name: &str) -> bool {
        self.submission(name).is_ok()
    }

    /// Build the insertion payload, or explain what is still missing.
    pub fn submission(&self, name: &str) -> Result<NewRegistration, CongresoError> {
        let name = name.trim();
        if name.chars().count() < MIN_NAME_CHARS {
            return Err(CongresoError::Validation(format!(
                "name must have at least {MIN_NAME_CHARS} characters"
            )));
        }
        let (district, sector, church) = match &self.state {
            SelectionState::Empty => {
                return Err(CongresoError::Validation("district is required".into()))
            }
            SelectionState::DistrictChosen { .. } => {
                return Err(CongresoError::Validation("sector is required".into()))
            }
            SelectionState::SectorChosen { .. } => {
                return Err(CongresoError::Validation("church is required".into()))
            }
            SelectionState::Collapsed { district } => (district, Sector::Foreign, district),
            SelectionState::Complete {
                district,
                sector,
                church,
            } => (district, *sector, church),
        };
        Ok(NewRegistration {
            name: name.to_string(),
            district: district.clone(),
            sector,
            church: church.clone(),
        })
    }
}

/// Validate a raw form by replaying it through a fresh resolver.
///
/// Sector and church are only consulted for the expandable district.
pub fn validate_form(
    catalog: &Arc<LocationCatalog>,
    form: &RegistrationForm,
) -> Result<NewRegistration, CongresoError> {
    let mut resolver = SelectionResolver::new(Arc::clone(catalog));
    let district = form.district.trim();
    if district.is_empty() {
        return Err(CongresoError::Validation("district is required".into()));
    }
    if let Transition::Ignored(reason) =
        resolver.apply(SelectionEvent::SelectDistrict(district.to_string()))
    {
        return Err(CongresoError::Validation(reason));
    }
    if catalog.is_expandable(district) {
        if let Some(sector) = form.sector {
            if let Transition::Ignored(reason) = resolver.apply(SelectionEvent::SelectSector(sector))
            {
                return Err(CongresoError::Validation(reason));
            }
        }
        if let Some(church) = form.church.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            if let Transition::Ignored(reason) =
                resolver.apply(SelectionEvent::SelectChurch(church.to_string()))
            {
                return Err(CongresoError::Validation(reason));
            }
        }
    }
    resolver.submission(&form.name)
}
