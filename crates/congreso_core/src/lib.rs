//! congreso_core — registration engine for the district congress.
//!
//! Location catalog, cascading selection, duplicate guard and dashboard
//! aggregation. Storage is reached only through [`store::RegistrationStore`].

pub mod aggregate;
pub mod catalog;
pub mod clock;
pub mod dedup;
pub mod error;
pub mod memory;
pub mod selection;
pub mod service;
pub mod session;
pub mod store;
pub mod types;

pub use error::{CatalogError, CongresoError, StoreError};
pub use types::{DedupKey, NewRegistration, Registration, RegistrationForm, Sector};
