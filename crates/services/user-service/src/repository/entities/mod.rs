//! Document mappings for persisted entities.

pub mod user;
