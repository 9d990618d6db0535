use tracing::{instrument, warn};

use crate::domain::error::DomainError;
use crate::infrastructure::security::{JwtKeys, constant_time_eq};

/// The single operator allowed to write posts.
#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone)]
pub struct AuthService {
    admin: AdminCredentials,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(admin: AdminCredentials, keys: JwtKeys) -> Self {
        Self { admin, keys }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    #[instrument(skip(self, password))]
    pub fn login(&self, username: &str, password: &str) -> Result<String, DomainError> {
        let user_ok = constant_time_eq(username, &self.admin.username);
        let pass_ok = constant_time_eq(password, &self.admin.password);
        if !(user_ok & pass_ok) {
            warn!("rejected login attempt");
            return Err(DomainError::unauthorized("invalid credentials"));
        }

        self.keys
            .generate_token(username)
            .map_err(|err| DomainError::Internal(err.to_string()))
    }

    /// Returns the subject of a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Result<String, DomainError> {
        let claims = self
            .keys
            .verify_token(token)
            .map_err(|_| DomainError::unauthorized("invalid or expired token"))?;
        if claims.sub.is_empty() {
            return Err(DomainError::unauthorized("invalid token payload"));
        }
        Ok(claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::Algorithm;

    fn service() -> AuthService {
        AuthService::new(
            AdminCredentials {
                username: "admin".into(),
                password: "changeme".into(),
            },
            JwtKeys::new("secret", Algorithm::HS256, 60),
        )
    }

    #[test]
    fn login_issues_verifiable_token() {
        let service = service();
        let token = service.login("admin", "changeme").unwrap();
        assert_eq!(service.verify(&token).unwrap(), "admin");
    }

    #[test]
    fn login_rejects_bad_credentials() {
        let service = service();
        for (user, pass) in [("admin", "wrong"), ("root", "changeme"), ("", "")] {
            let err = service.login(user, pass).unwrap_err();
            assert!(matches!(err, DomainError::Unauthorized(_)));
        }
    }

    #[test]
    fn verify_rejects_expired_token() {
        let service = service();
        let token = service
            .keys()
            .generate_token_at("admin", Utc::now() - Duration::hours(2))
            .unwrap();
        let err = service.verify(&token).unwrap_err();
        assert_eq!(err.to_string(), "invalid or expired token");
    }

    #[test]
    fn verify_rejects_empty_subject() {
        let service = service();
        let token = service.keys().generate_token("").unwrap();
        let err = service.verify(&token).unwrap_err();
        assert_eq!(err.to_string(), "invalid token payload");
    }
}
