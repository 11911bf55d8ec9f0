use serde::{Deserialize, Serialize};

use crate::context::WorkContext;
use crate::PraxisError;

// Request DTOs

#[derive(Debug, Deserialize)]
pub struct SwitchContextRequest {
    pub establishment_id: i64,
    #[serde(default)]
    pub department_id: Option<i64>,
}

// Response DTOs

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<PraxisError> for ErrorResponse {
    fn from(err: PraxisError) -> Self {
        Self {
            error: err.to_string(),
            code: err.code().to_owned(),
        }
    }
}

/// `context` is `null` while nothing is active.
#[derive(Debug, Serialize)]
pub struct CurrentContextResponse {
    pub context: Option<WorkContext>,
}
