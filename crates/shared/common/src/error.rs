//! Unified error handling for the data-access layer.
//!
//! Two layers of errors:
//! - [`StoreError`]: anything the backing document store reports
//! - [`AppError`]: what repository and service callers see

use thiserror::Error;

/// Failures reported by the backing document store.
///
/// Always surfaced to the caller unmodified; nothing in this workspace
/// retries a store call.
#[derive(Error, Debug)]
pub enum StoreError {
    #[cfg(feature = "database")]
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        StoreError::Backend(msg.into())
    }

    /// Check if this is a unique-key violation
    pub fn is_duplicate_key(&self) -> bool {
        match self {
            StoreError::DuplicateKey(_) => true,
            #[cfg(feature = "database")]
            StoreError::Mongo(e) => matches!(
                e.kind.as_ref(),
                mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(w))
                    if w.code == DUPLICATE_KEY_CODE
            ),
            _ => false,
        }
    }
}

/// Server error code for a unique index violation
#[cfg(feature = "database")]
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Resource not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to decode document: {0}")]
    Decode(#[from] bson::de::Error),

    #[error("Failed to encode document: {0}")]
    Encode(#[from] bson::ser::Error),
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound => "NOT_FOUND",
            AppError::Store(e) if e.is_duplicate_key() => "CONFLICT",
            AppError::Store(_) => "STORE_ERROR",
            AppError::Decode(_) => "DECODE_ERROR",
            AppError::Encode(_) => "ENCODE_ERROR",
        }
    }
}

#[cfg(feature = "database")]
impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::Store(StoreError::from(err))
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for store primitives
pub type StoreResult<T> = Result<T, StoreError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> AppResult<T> {
        self.ok_or(AppError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::NotFound.code(), "NOT_FOUND");
        assert_eq!(
            AppError::from(StoreError::DuplicateKey("u1".into())).code(),
            "CONFLICT"
        );
        assert_eq!(
            AppError::from(StoreError::backend("connection reset")).code(),
            "STORE_ERROR"
        );
    }

    #[test]
    fn test_store_error_is_transparent() {
        let err = AppError::from(StoreError::backend("timeout"));
        assert_eq!(err.to_string(), "Store backend error: timeout");
    }

    #[test]
    fn test_option_ext() {
        assert!(matches!(None::<u8>.ok_or_not_found(), Err(AppError::NotFound)));
        assert_eq!(Some(3).ok_or_not_found().unwrap(), 3);
    }
}
