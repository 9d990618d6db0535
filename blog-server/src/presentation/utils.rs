use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpMessage, HttpRequest, web};
use futures_util::future::{Ready, ready};
use tracing::error;

use crate::application::auth_service::AuthService;
use crate::domain::error::DomainError;
use crate::presentation::middleware::RequestId;

/// Identity proven by a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub username: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = DomainError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, DomainError> {
    let Some(auth_service) = req.app_data::<web::Data<AuthService>>() else {
        error!("AuthService missing from app data");
        return Err(DomainError::Internal("auth service not configured".into()));
    };

    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| DomainError::unauthorized("missing authorization header"))?;
    let header = header
        .to_str()
        .map_err(|_| DomainError::unauthorized("invalid authorization header"))?;
    let token = bearer_token(header)
        .ok_or_else(|| DomainError::unauthorized("invalid authorization header"))?;

    let username = auth_service.verify(token)?;
    Ok(AuthenticatedUser { username })
}

/// Accepts exactly `<scheme> <token>` with a case-insensitive `bearer` scheme.
pub fn bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token)
}

pub fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|rid| rid.0.clone())
        .unwrap_or_else(|| "unknown".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("BEARER   abc  "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer a b"), None);
        assert_eq!(bearer_token(""), None);
    }
}
