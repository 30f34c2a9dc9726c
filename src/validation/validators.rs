//! Validation rules for donation submissions.
//!
//! Written against the `validator` crate's error type so the rules compose
//! with derive-based validation elsewhere if the payload ever grows.

use std::borrow::Cow;
use validator::ValidationError;

/// Maximum donor name length in characters.
pub const MAX_DONOR_NAME_LEN: usize = 50;

/// Maximum message length in characters.
pub const MAX_MESSAGE_LEN: usize = 200;

/// Amount ceiling in smallest currency units.
pub const MAX_AMOUNT: i64 = 100_000_000;

/// Donor names are bounded and restricted to `[A-Za-z0-9 _-]`.
pub fn validate_donor_name(name: &str) -> Result<(), ValidationError> {
    if name.len() > MAX_DONOR_NAME_LEN {
        let mut err = ValidationError::new("donor_name");
        err.message = Some(Cow::Borrowed("must be 50 characters or less"));
        return Err(err);
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '_' || c == '-')
    {
        let mut err = ValidationError::new("donor_name");
        err.message = Some(Cow::Borrowed(
            "must contain only letters, digits, spaces, underscores, and hyphens",
        ));
        return Err(err);
    }

    Ok(())
}

/// Amounts are positive and capped at [`MAX_AMOUNT`].
pub fn validate_amount(amount: i64) -> Result<(), ValidationError> {
    if amount <= 0 {
        let mut err = ValidationError::new("amount");
        err.message = Some(Cow::Borrowed("must be a positive amount"));
        return Err(err);
    }

    if amount > MAX_AMOUNT {
        let mut err = ValidationError::new("amount");
        err.message = Some(Cow::Borrowed("exceeds the maximum accepted amount"));
        return Err(err);
    }

    Ok(())
}

/// Messages are optional upstream; when present they are bounded.
pub fn validate_message(message: &str) -> Result<(), ValidationError> {
    if message.chars().count() > MAX_MESSAGE_LEN {
        let mut err = ValidationError::new("message");
        err.message = Some(Cow::Borrowed("must be 200 characters or less"));
        return Err(err);
    }

    Ok(())
}
