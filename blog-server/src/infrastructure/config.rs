use std::path::PathBuf;

use jsonwebtoken::Algorithm;
use tracing::warn;

pub const DEFAULT_JWT_SECRET: &str = "change_this_secret";
const DEFAULT_UPLOAD_LIMIT: usize = 1024 * 1024;
/// Ten years.
pub const MAX_ACCESS_EXPIRE_MINUTES: i64 = 10 * 365 * 24 * 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub content_dir: PathBuf,
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub access_expire_minutes: i64,
    pub admin_user: String,
    pub admin_pass: String,
    /// Empty means any origin is allowed.
    pub cors_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    /// Reads the process environment. `.env` loading happens in
    /// [`super::bootstrap`].
    pub fn from_env() -> anyhow::Result<Self> {
        let host = env_or("HOST", "127.0.0.1");
        let port = env_or("PORT", "8080")
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PORT: {}", e))?;
        let content_dir = PathBuf::from(env_or("CONTENT_DIR", "./content"));

        let jwt_secret = env_or("JWT_SECRET", DEFAULT_JWT_SECRET);
        if jwt_secret == DEFAULT_JWT_SECRET {
            warn!("using default JWT secret, set JWT_SECRET for production use");
        }
        let jwt_algorithm = parse_algorithm(&env_or("JWT_ALGO", "HS256"))?;
        let access_expire_minutes =
            parse_token_lifetime(&env_or("ACCESS_EXPIRE_MINUTES", "60"))?;
        let max_upload_bytes = parse_positive(
            "MAX_UPLOAD_BYTES",
            &env_or("MAX_UPLOAD_BYTES", &DEFAULT_UPLOAD_LIMIT.to_string()),
        )?;

        Ok(Self {
            host,
            port,
            content_dir,
            jwt_secret,
            jwt_algorithm,
            access_expire_minutes,
            admin_user: env_or("ADMIN_USER", "admin"),
            admin_pass: env_or("ADMIN_PASS", "changeme"),
            cors_origins: parse_cors_origins(&env_or("CORS_ORIGINS", "*")),
            max_upload_bytes,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Only HMAC algorithms work with a shared secret.
pub fn parse_algorithm(raw: &str) -> anyhow::Result<Algorithm> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(anyhow::anyhow!(
            "unsupported JWT_ALGO {other:?}, expected HS256, HS384 or HS512"
        )),
    }
}

fn parse_positive<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
{
    let value: T = raw
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid {}: {}", key, e))?;
    if value <= T::default() {
        anyhow::bail!("{key} must be positive");
    }
    Ok(value)
}

pub fn parse_token_lifetime(raw: &str) -> anyhow::Result<i64> {
    let minutes: i64 = parse_positive("ACCESS_EXPIRE_MINUTES", raw)?;
    if minutes > MAX_ACCESS_EXPIRE_MINUTES {
        anyhow::bail!(
            "ACCESS_EXPIRE_MINUTES must be at most {MAX_ACCESS_EXPIRE_MINUTES}, got {minutes}"
        );
    }
    Ok(minutes)
}

/// `*` or an empty value allows any origin; anything else is a
/// comma-separated list.
pub fn parse_cors_origins(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "*" {
        return Vec::new();
    }
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "*")
        .collect()
}
