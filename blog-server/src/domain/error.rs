use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("post not found: {0}")]
    PostNotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        DomainError::Unauthorized(reason.into())
    }

    pub fn invalid_input(reason: impl Into<String>) -> Self {
        DomainError::InvalidInput(reason.into())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Internal(format!("io error: {err}"))
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DomainError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DomainError::PostNotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (message, details) = match self {
            DomainError::PostNotFound(slug) => {
                ("not found".to_string(), Some(json!({ "slug": slug })))
            }
            DomainError::Internal(reason) => {
                error!(reason = %reason, "request failed");
                ("internal server error".to_string(), None)
            }
            other => (other.to_string(), None),
        };
        let body = ErrorBody {
            error: message.as_str(),
            details,
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            DomainError::unauthorized("x").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            DomainError::invalid_input("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DomainError::PostNotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DomainError::from(std::io::Error::other("disk")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn reasons_are_surfaced_verbatim() {
        let err = DomainError::unauthorized("invalid credentials");
        assert_eq!(err.to_string(), "invalid credentials");
    }
}
