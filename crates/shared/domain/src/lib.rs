//! Domain layer - Core business entities and value objects.
//!
//! This crate contains the user record as it is persisted in the document
//! store, plus the physical field names other crates address it by.

pub mod constants;
pub mod user;

pub use constants::*;
pub use user::{generate_secret, User};
