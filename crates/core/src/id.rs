//! Client-supplied resource id validation
//!
//! Ids are Unicode strings with specific constraints, enforced before any id
//! reaches the chain store:
//! - must not be empty
//! - only ASCII alphanumerics, `-`, and `.`
//! - at most `MAX_ID_LENGTH` bytes
//! - at least one non-numeric character
//!
//! The last rule keeps client-assigned ids out of the server allocator's id
//! space: the allocator hands out purely numeric decimal ids, so accepting a
//! purely numeric id from a client could collide with a future allocation.

use thiserror::Error;

/// Maximum id length in bytes
pub const MAX_ID_LENGTH: usize = 64;

/// Validate a client-supplied resource id
///
/// # Examples
///
/// ```
/// use chronicle_core::id::validate_client_id;
///
/// // Valid ids
/// assert!(validate_client_id("abc123").is_ok());
/// assert!(validate_client_id("123abc").is_ok());
/// assert!(validate_client_id("a-b.c").is_ok());
///
/// // Invalid ids
/// assert!(validate_client_id("").is_err()); // empty
/// assert!(validate_client_id("123").is_err()); // purely numeric
/// assert!(validate_client_id("123:456").is_err()); // bad character
/// ```
pub fn validate_client_id(id: &str) -> Result<(), IdError> {
    if id.is_empty() {
        return Err(IdError::Empty);
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
    {
        return Err(IdError::InvalidCharacters(id.to_string()));
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(IdError::TooLong {
            actual: id.len(),
            max: MAX_ID_LENGTH,
        });
    }

    if id.chars().all(|c| c.is_ascii_digit()) {
        return Err(IdError::AllNumeric(id.to_string()));
    }

    Ok(())
}

/// Id validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    /// Id is empty (length 0)
    #[error("Id cannot be empty")]
    Empty,

    /// Id contains characters outside alphanumerics, '-', '.'
    #[error("Id [{0}] is not a valid resource id")]
    InvalidCharacters(String),

    /// Id exceeds maximum length
    #[error("Id too long: {actual} bytes exceeds maximum {max}")]
    TooLong {
        /// Actual id length in bytes
        actual: usize,
        /// Maximum allowed length
        max: usize,
    },

    /// Id is purely numeric; clients may only assign ids containing at
    /// least one non-numeric character
    #[error("Id [{0}] is purely numeric; clients may only assign ids which contain at least one non-numeric character")]
    AllNumeric(String),
}
