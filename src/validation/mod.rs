//! Structural and semantic checks on submitted donation data.
//!
//! Parsing (structure) is serde's job; the functions here cover the
//! semantic rules. Validation is pure - trimming and any other
//! normalization happen at admission, after these checks pass.

pub mod validators;

use serde::Deserialize;
use validator::ValidationError;

pub use validators::{validate_amount, validate_donor_name, validate_message};

/// Inbound donation submission body.
#[derive(Debug, Clone, Deserialize)]
pub struct DonationPayload {
    pub donor_name: String,
    pub amount: i64,
    pub message: Option<String>,
}

impl DonationPayload {
    /// Apply the semantic validation rules. Pure, no side effects.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_donor_name(&self.donor_name)?;
        validate_amount(self.amount)?;
        if let Some(ref message) = self.message {
            validate_message(message)?;
        }
        Ok(())
    }
}
