pub mod catalog;
pub mod dashboard;
pub mod health;
pub mod registrations;
pub mod session;
