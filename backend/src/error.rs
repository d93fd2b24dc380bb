use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use poller::PollError;
use shared::api::ErrorResponse;
use thiserror::Error;

const AUTH_HINT: &str = "Not authenticated. Run the authorization flow to create token.json";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Fetch error: {0}")]
    Fetch(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            Self::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("unauthorized", msg),
            ),
            Self::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("invalid_interval", msg),
            ),
            Self::Fetch(msg) => {
                tracing::error!("Failed to fetch emails: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("fetch_failed", msg),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<PollError> for AppError {
    fn from(err: PollError) -> Self {
        match err {
            PollError::Unauthenticated => Self::Unauthorized(AUTH_HINT.to_string()),
            PollError::AuthExpired(reason) => {
                Self::Unauthorized(format!("Token expired or revoked ({}). {}", reason, AUTH_HINT))
            }
            PollError::Fetch(reason) => Self::Fetch(reason),
            PollError::InvalidArgument(msg) => Self::Validation(msg),
        }
    }
}

pub type ApiResult<T> = Result<T, AppError>;
