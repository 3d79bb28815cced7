//! Domain-level constants.
//!
//! Physical field names of the user document. Query code addresses users
//! through these names only, never through string literals.

// =============================================================================
// Collection
// =============================================================================

/// Default collection holding user documents
pub const USER_COLLECTION: &str = "user";

// =============================================================================
// User fields
// =============================================================================

/// Primary key
pub const FIELD_ID: &str = "_id";

pub const FIELD_NAME: &str = "name";
pub const FIELD_PHONE: &str = "phone";
pub const FIELD_ID_CARD: &str = "id_card";
pub const FIELD_SEX: &str = "sex";
pub const FIELD_BIRTH_DATE: &str = "birth_date";

/// Opaque bearer token (never returned by listings)
pub const FIELD_TOKEN: &str = "token";

/// Credential value (never returned by listings)
pub const FIELD_PASSWORD: &str = "password";

/// Institutions the user belongs to (array of ids)
pub const FIELD_INSTITUTIONS: &str = "ref_institution_list";

pub const FIELD_DISABLE: &str = "disable";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_CREATE_TIME: &str = "create_time";
pub const FIELD_LAST_MOD_TIME: &str = "last_mod_time";

/// Fields stripped from list results
pub const SECRET_FIELDS: &[&str] = &[FIELD_TOKEN, FIELD_PASSWORD];

/// Storage format of `birth_date`; lexicographic order equals date order
pub const BIRTH_DATE_FORMAT: &str = "%Y-%m-%d";
