use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::PraxisError;
use crate::api::ErrorResponse;

/// converts `PraxisError` into HTTP responses
#[derive(Debug)]
pub enum AppError {
    /// Missing bearer token, or one the identity provider does not know.
    Unauthenticated,
    Praxis(PraxisError),
}

impl From<PraxisError> for AppError {
    fn from(err: PraxisError) -> Self {
        Self::Praxis(err)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        let Self::Praxis(err) = self else {
            return StatusCode::UNAUTHORIZED;
        };

        match err {
            PraxisError::Validation(_) | PraxisError::InvalidToken | PraxisError::EmailMismatch => {
                StatusCode::BAD_REQUEST
            }
            PraxisError::NotAffiliated | PraxisError::Forbidden => StatusCode::FORBIDDEN,
            PraxisError::NotFound => StatusCode::NOT_FOUND,
            PraxisError::InvalidState(_) => StatusCode::CONFLICT,
            PraxisError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            PraxisError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            PraxisError::DatabaseError(_) | PraxisError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Unauthenticated => ErrorResponse {
                error: "missing or invalid authorization token".to_owned(),
                code: "UNAUTHENTICATED".to_owned(),
            },
            Self::Praxis(err) => ErrorResponse::from(err),
        };

        (status, Json(body)).into_response()
    }
}
