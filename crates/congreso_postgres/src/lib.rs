//! congreso_postgres — PostgreSQL adapter for the registration store port.

mod store;

pub use store::{PgRegistrationStore, DEDUP_CONSTRAINT};
