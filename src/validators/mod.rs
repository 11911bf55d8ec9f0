pub mod email;
pub mod text;

pub use email::{normalize_email, validate_email};
pub use text::{validate_code, validate_label, validate_message};

use crate::PraxisError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmailEmpty,
    EmailTooLong,
    EmailInvalidFormat,
    LabelEmpty,
    LabelTooLong,
    CodeInvalid,
    MessageTooLong,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmailEmpty => write!(f, "Email cannot be empty"),
            Self::EmailTooLong => write!(f, "Email is too long (max 254 characters)"),
            Self::EmailInvalidFormat => write!(f, "Invalid email format"),
            Self::LabelEmpty => write!(f, "Value cannot be empty"),
            Self::LabelTooLong => write!(f, "Value is too long (max 150 characters)"),
            Self::CodeInvalid => {
                write!(f, "Code must be 1-32 characters of letters, digits, '-' or '_'")
            }
            Self::MessageTooLong => write!(f, "Message is too long (max 2000 characters)"),
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for PraxisError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}
