use super::ValidationError;

const MAX_LABEL_LEN: usize = 150;
const MAX_CODE_LEN: usize = 32;
const MAX_MESSAGE_LEN: usize = 2000;

/// Names and titles: establishment name, position title, department name.
pub fn validate_label(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::LabelEmpty);
    }

    if trimmed.chars().count() > MAX_LABEL_LEN {
        return Err(ValidationError::LabelTooLong);
    }

    Ok(())
}

/// Short identifiers such as department codes ("DIR", "MED").
pub fn validate_code(code: &str) -> Result<(), ValidationError> {
    let valid = !code.is_empty()
        && code.len() <= MAX_CODE_LEN
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(ValidationError::CodeInvalid)
    }
}

/// Free-text invitation message; empty is allowed.
pub fn validate_message(message: &str) -> Result<(), ValidationError> {
    if message.chars().count() > MAX_MESSAGE_LEN {
        return Err(ValidationError::MessageTooLong);
    }
    Ok(())
}
