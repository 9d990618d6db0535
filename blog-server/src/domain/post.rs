use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// File extension every post file carries.
pub const POST_EXTENSION: &str = ".md";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub slug: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Builds a post from stored text, falling back to the slug when the
    /// content has no heading.
    pub fn from_content(slug: String, content: String, modified_at: DateTime<Utc>) -> Self {
        let title = title_or_slug(&content, &slug);
        Self {
            slug,
            title,
            content,
            created_at: modified_at,
        }
    }
}

impl From<Post> for PostSummary {
    fn from(post: Post) -> Self {
        Self {
            slug: post.slug,
            title: post.title,
            created_at: post.created_at,
        }
    }
}

/// Returns the text of the first Markdown heading, or an empty string.
///
/// A `# ` heading yields everything after the marker. Any other line that
/// starts with `#` yields its text with every leading `#` removed.
pub fn extract_title(content: &str) -> String {
    for line in content.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("# ") {
            return rest.trim().to_string();
        }
        if line.starts_with('#') {
            return line.trim_start_matches('#').trim().to_string();
        }
    }
    String::new()
}

fn title_or_slug(content: &str, slug: &str) -> String {
    let title = extract_title(content);
    if title.is_empty() {
        slug.to_string()
    } else {
        title
    }
}

/// Splits `name.md` into `name`, matching the extension case-insensitively.
pub fn post_file_stem(file_name: &str) -> Option<&str> {
    let split = file_name.len().checked_sub(POST_EXTENSION.len())?;
    let extension = file_name.get(split..)?;
    if extension.eq_ignore_ascii_case(POST_EXTENSION) {
        file_name.get(..split)
    } else {
        None
    }
}

pub fn has_post_extension(file_name: &str) -> bool {
    post_file_stem(file_name).is_some()
}
