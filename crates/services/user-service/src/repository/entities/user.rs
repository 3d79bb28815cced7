//! User document mapping.

use bson::Document;

use common::{AppResult, FieldMapping, OptionKey, Projection};
use domain::{
    User, FIELD_BIRTH_DATE, FIELD_CREATE_TIME, FIELD_DISABLE, FIELD_ID, FIELD_ID_CARD,
    FIELD_INSTITUTIONS, FIELD_LAST_MOD_TIME, FIELD_NAME, FIELD_PHONE, FIELD_SEX, FIELD_STATUS,
    FIELD_TOKEN, SECRET_FIELDS,
};

/// Criteria the user listing understands, in clause order.
pub fn field_mapping() -> FieldMapping {
    FieldMapping::new()
        .map(OptionKey::InstitutionId, FIELD_INSTITUTIONS)
        .map(OptionKey::Name, FIELD_NAME)
        .map(OptionKey::Phone, FIELD_PHONE)
        .map(OptionKey::Guid, FIELD_ID)
        .map(OptionKey::IdCard, FIELD_ID_CARD)
        .map(OptionKey::Sex, FIELD_SEX)
        .map(OptionKey::BirthDate, FIELD_BIRTH_DATE)
        .map(OptionKey::Token, FIELD_TOKEN)
        .map(OptionKey::Disable, FIELD_DISABLE)
        .map(OptionKey::Status, FIELD_STATUS)
        .map(OptionKey::CreateTime, FIELD_CREATE_TIME)
        .map(OptionKey::LastModTime, FIELD_LAST_MOD_TIME)
}

/// Listings never return token or credential values.
pub fn listing_projection() -> Projection {
    Projection::excluding(SECRET_FIELDS.iter().copied())
}

/// Full document for insert.
pub fn to_document(user: &User) -> AppResult<Document> {
    Ok(bson::to_document(user)?)
}

/// Fields a full update may set: everything except the identifier, the
/// creation timestamp and the secrets, which have their own setters.
pub fn settable_fields(user: &User) -> AppResult<Document> {
    let mut document = to_document(user)?;
    document.remove(FIELD_ID);
    document.remove(FIELD_CREATE_TIME);
    for field in SECRET_FIELDS {
        document.remove(*field);
    }
    Ok(document)
}

pub fn from_document(document: Document) -> Result<User, bson::de::Error> {
    bson::from_document(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::FIELD_PASSWORD;

    #[test]
    fn test_mapping_covers_every_option_key() {
        let mapping = field_mapping();
        for key in OptionKey::ALL {
            assert!(mapping.field(key).is_some(), "unmapped key {}", key);
        }
    }

    #[test]
    fn test_settable_fields_exclude_identity_creation_and_secrets() {
        let mut user = User::new("u1").with_name("Ann");
        user.token = "tok".to_string();
        user.password = "pw".to_string();
        let fields = settable_fields(&user).unwrap();

        assert!(fields.get(FIELD_ID).is_none());
        assert!(fields.get(FIELD_CREATE_TIME).is_none());
        assert!(fields.get(FIELD_TOKEN).is_none());
        assert!(fields.get(FIELD_PASSWORD).is_none());
        assert!(fields.get(FIELD_LAST_MOD_TIME).is_some());
        assert_eq!(fields.get_str(FIELD_NAME).unwrap(), "Ann");
    }

    #[test]
    fn test_listing_projection_excludes_secrets() {
        let projection = listing_projection();
        assert_eq!(projection.excluded(), &["token".to_string(), "password".to_string()]);
    }
}
