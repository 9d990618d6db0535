use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expiry is out of range")]
    ExpiryOutOfRange,
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl JwtKeys {
    /// A lifetime too large for [`Duration`] saturates; issuing then fails
    /// with [`TokenError::ExpiryOutOfRange`].
    pub fn new(secret: &str, algorithm: Algorithm, ttl_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            ttl: Duration::try_minutes(ttl_minutes).unwrap_or(Duration::MAX),
        }
    }

    /// Token lifetime in seconds.
    pub fn expires_in(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub fn generate_token(&self, subject: &str) -> Result<String, TokenError> {
        self.generate_token_at(subject, Utc::now())
    }

    /// Issues a token as if `now` were the current time.
    pub fn generate_token_at(
        &self,
        subject: &str,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or(TokenError::ExpiryOutOfRange)?;
        let claims = Claims {
            sub: subject.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };
        Ok(encode(
            &Header::new(self.algorithm),
            &claims,
            &self.encoding_key,
        )?)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

/// Compares two secrets in time independent of where they differ.
///
/// Both sides are hashed first so that length differences do not leak either.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let left = Sha256::digest(a.as_bytes());
    let right = Sha256::digest(b.as_bytes());
    left.iter()
        .zip(right.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
