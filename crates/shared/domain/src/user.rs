//! User domain entity and related types.

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User document as stored in the `user` collection.
///
/// Every attribute except the identifier and the two timestamps falls back to
/// its zero value when missing from the stored document, so documents written
/// by older producers still decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub id_card: String,
    #[serde(default)]
    pub sex: i32,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    /// Bearer token; absent from list projections
    #[serde(default)]
    pub token: String,
    /// Credential; absent from list projections
    #[serde(default)]
    pub password: String,
    #[serde(rename = "ref_institution_list", default)]
    pub institutions: Vec<String>,
    #[serde(default)]
    pub disable: bool,
    #[serde(default)]
    pub status: i32,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub create_time: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub last_mod_time: DateTime<Utc>,
}

impl User {
    /// Create a user with the given id; timestamps are restamped on insert.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: String::new(),
            phone: String::new(),
            id_card: String::new(),
            sex: 0,
            birth_date: None,
            token: String::new(),
            password: String::new(),
            institutions: Vec::new(),
            disable: false,
            status: 0,
            create_time: now,
            last_mod_time: now,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn with_institution(mut self, institution: impl Into<String>) -> Self {
        self.institutions.push(institution.into());
        self
    }

    /// Stamp both timestamps for a fresh insert
    pub fn stamp_created(&mut self, now: DateTime<Utc>) {
        self.create_time = now;
        self.last_mod_time = now;
    }

    /// Stamp the modification timestamp
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_mod_time = now;
    }
}

/// Generate a fresh random value for a token or credential field.
pub fn generate_secret() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_user_round_trips_through_bson_with_physical_names() {
        let user = User::new("u1")
            .with_phone("555-0100")
            .with_institution("inst-1");

        let document = bson::to_document(&user).unwrap();
        assert_eq!(document.get_str("_id").unwrap(), "u1");
        assert_eq!(document.get_str("phone").unwrap(), "555-0100");
        assert!(document.get_array("ref_institution_list").is_ok());
        assert!(document.get_datetime("create_time").is_ok());

        let decoded: User = bson::from_document(document).unwrap();
        assert_eq!(decoded.id, "u1");
        assert_eq!(decoded.institutions, vec!["inst-1".to_string()]);
    }

    #[test]
    fn test_missing_secret_fields_decode_as_empty() {
        let now = bson::DateTime::now();
        let document = doc! {
            "_id": "u2",
            "name": "Ann",
            "create_time": now,
            "last_mod_time": now,
        };

        let user: User = bson::from_document(document).unwrap();
        assert_eq!(user.name, "Ann");
        assert!(user.token.is_empty());
        assert!(user.password.is_empty());
    }

    #[test]
    fn test_missing_timestamps_fail_to_decode() {
        let document = doc! { "_id": "u3" };
        assert!(bson::from_document::<User>(document).is_err());
    }

    #[test]
    fn test_generate_secret_is_unique() {
        let first = generate_secret();
        let second = generate_secret();

        assert!(!first.is_empty());
        assert_ne!(first, second);
    }

    #[test]
    fn test_stamp_and_touch() {
        let mut user = User::new("u4");
        let created = Utc::now();
        user.stamp_created(created);
        assert_eq!(user.create_time, user.last_mod_time);

        let later = created + chrono::Duration::seconds(1);
        user.touch(later);
        assert_eq!(user.create_time, created);
        assert_eq!(user.last_mod_time, later);
    }
}
