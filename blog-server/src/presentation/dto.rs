use crate::application::post_service::CreatedPost;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(rename = "token_type")]
    pub token_type: String, // "bearer"
    pub expires_in: i64,
}

// ======================= POSTS =======================

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default, deserialize_with = "deserialize_form_bool")]
    pub published: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WriteResponse {
    pub ok: bool,
    pub slug: String,
    pub path: String,
}

impl From<CreatedPost> for WriteResponse {
    fn from(created: CreatedPost) -> Self {
        Self {
            ok: true,
            slug: created.slug,
            path: created.path,
        }
    }
}

// ======================= Utils =======================

/// HTML forms send checkboxes as `on`, clients send `true`/`1`.
fn deserialize_form_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "invalid boolean value {other:?}"
        ))),
    }
}
