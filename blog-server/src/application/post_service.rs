use std::path::Path;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use tracing::{info, instrument};

use crate::data::post_repository::PostRepository;
use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostSummary, has_post_extension};
use crate::domain::slug::{
    MAX_SLUG_BYTES, slugify, strip_heading_marker, timestamp_slug, truncate_slug,
};

/// Lines at least this long are treated as prose, not as a title.
const MAX_TITLE_LINE_CHARS: usize = 80;
const DEFAULT_UPLOAD_NAME: &str = "post.md";

/// Outcome of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPost {
    pub slug: String,
    pub path: String,
}

impl CreatedPost {
    fn new(slug: String) -> Self {
        let path = format!("/api/posts/{slug}");
        Self { slug, path }
    }
}

#[derive(Clone)]
pub struct PostService<R: PostRepository + 'static> {
    repo: Arc<R>,
}

impl<R> PostService<R>
where
    R: PostRepository + 'static,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn get_posts(&self) -> Result<Vec<PostSummary>, DomainError> {
        let posts = self
            .repo
            .list()
            .await?
            .into_iter()
            .map(|stored| {
                PostSummary::from(Post::from_content(
                    stored.slug,
                    stored.content,
                    stored.modified_at,
                ))
            })
            .collect();
        Ok(posts)
    }

    pub async fn get_post(&self, slug: &str) -> Result<Post, DomainError> {
        let safe = slugify(slug);
        if safe.is_empty() {
            return Err(DomainError::PostNotFound(slug.to_string()));
        }
        let stored = self
            .repo
            .read(&safe)
            .await?
            .ok_or_else(|| DomainError::PostNotFound(safe.clone()))?;
        Ok(Post::from_content(
            stored.slug,
            stored.content,
            stored.modified_at,
        ))
    }

    /// Stores an uploaded Markdown document verbatim.
    #[instrument(skip(self, payload), fields(bytes = payload.len()))]
    pub async fn upload_post(
        &self,
        filename: Option<&str>,
        payload: Vec<u8>,
    ) -> Result<CreatedPost, DomainError> {
        let filename = filename
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_UPLOAD_NAME);
        if !has_post_extension(filename) {
            return Err(DomainError::invalid_input("only .md files allowed"));
        }
        let content = String::from_utf8(payload)
            .map_err(|_| DomainError::invalid_input("file must be UTF-8 encoded markdown"))?;

        let candidate = upload_slug_candidate(&content, filename);
        let mut base = slugify(candidate);
        if base.is_empty() {
            base = timestamp_slug(Utc::now());
        }

        let slug = self.store_unique(&base, &content).await?;
        info!(slug = %slug, filename = %filename, "post uploaded");
        Ok(CreatedPost::new(slug))
    }

    /// Assembles a post from a title and a body. The published flag is
    /// accepted for compatibility and has no effect.
    #[instrument(skip(self, content))]
    pub async fn create_post(
        &self,
        title: &str,
        content: &str,
        published: bool,
    ) -> Result<CreatedPost, DomainError> {
        let now = Utc::now();
        let mut base = if title.is_empty() {
            slugify(&now.to_rfc3339_opts(SecondsFormat::Micros, true))
        } else {
            slugify(title)
        };
        if base.is_empty() {
            base = timestamp_slug(now);
        }

        let markdown = assemble_markdown(title, content);
        let slug = self.store_unique(&base, &markdown).await?;
        info!(slug = %slug, published, "post created");
        Ok(CreatedPost::new(slug))
    }

    /// Writes under `base`, or the first free `base-N` for N = 1, 2, ...
    /// Overlong bases are cut to [`MAX_SLUG_BYTES`] first.
    async fn store_unique(&self, base: &str, content: &str) -> Result<String, DomainError> {
        let base = truncate_slug(base, MAX_SLUG_BYTES);
        let mut slug = base.to_string();
        let mut suffix = 1u64;
        while !self.repo.write_if_absent(&slug, content).await? {
            slug = format!("{base}-{suffix}");
            suffix += 1;
        }
        Ok(slug)
    }
}

/// The first non-blank line names the post when it is a heading or short,
/// otherwise the file name does.
fn upload_slug_candidate<'a>(content: &'a str, filename: &'a str) -> &'a str {
    let first_line = content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty());

    match first_line {
        Some(line) if line.starts_with('#') || line.chars().count() < MAX_TITLE_LINE_CHARS => {
            strip_heading_marker(line)
        }
        _ => file_stem(filename),
    }
}

fn file_stem(filename: &str) -> &str {
    let name = Path::new(filename);
    match (name.extension(), filename.rfind('.')) {
        (Some(_), Some(dot)) => &filename[..dot],
        _ => filename,
    }
}

fn assemble_markdown(title: &str, content: &str) -> String {
    if content.trim_start().starts_with('#') {
        content.to_string()
    } else {
        format!("# {title}\n\n{content}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::post_repository::FsPostRepository;
    use tempfile::TempDir;

    fn service() -> (TempDir, PostService<FsPostRepository>) {
        let dir = TempDir::new().unwrap();
        let repo = Arc::new(FsPostRepository::new(dir.path()));
        (dir, PostService::new(repo))
    }

    #[tokio::test]
    async fn create_then_read_back() {
        let (_dir, service) = service();

        let created = service.create_post("Test", "Body text", false).await.unwrap();
        assert_eq!(created.slug, "test");
        assert_eq!(created.path, "/api/posts/test");

        let post = service.get_post(&created.slug).await.unwrap();
        assert!(post.content.starts_with("# Test\n\nBody text"));
        assert_eq!(post.title, "Test");
    }

    #[tokio::test]
    async fn create_keeps_existing_heading() {
        let (_dir, service) = service();

        let created = service
            .create_post("Ignored Title", "  # Own Heading\nbody", true)
            .await
            .unwrap();

        let post = service.get_post(&created.slug).await.unwrap();
        assert_eq!(post.content, "  # Own Heading\nbody");
        assert_eq!(post.title, "Own Heading");
        assert_eq!(created.slug, "ignored-title");
    }

    #[tokio::test]
    async fn identical_titles_get_numbered_suffixes() {
        let (_dir, service) = service();

        let first = service.create_post("Same", "one", false).await.unwrap();
        let second = service.create_post("Same", "two", false).await.unwrap();
        let third = service.create_post("Same", "three", false).await.unwrap();

        assert_eq!(first.slug, "same");
        assert_eq!(second.slug, "same-1");
        assert_eq!(third.slug, "same-2");
        assert!(
            service
                .get_post("same")
                .await
                .unwrap()
                .content
                .ends_with("one")
        );
        assert!(
            service
                .get_post("same-1")
                .await
                .unwrap()
                .content
                .ends_with("two")
        );
    }

    #[tokio::test]
    async fn concurrent_creates_never_share_a_slug() {
        let (_dir, service) = service();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .create_post("Race", &format!("body {i}"), false)
                        .await
                        .unwrap()
                        .slug
                })
            })
            .collect();

        let mut slugs = Vec::new();
        for handle in handles {
            slugs.push(handle.await.unwrap());
        }
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), 8);
        assert_eq!(service.get_posts().await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn overlong_titles_are_capped_and_still_collide_safely() {
        let (_dir, service) = service();
        let title = "a".repeat(300);

        let first = service.create_post(&title, "one", false).await.unwrap();
        let second = service.create_post(&title, "two", false).await.unwrap();

        assert_eq!(first.slug, "a".repeat(MAX_SLUG_BYTES));
        assert_eq!(second.slug, format!("{}-1", "a".repeat(MAX_SLUG_BYTES)));
        assert!(
            service
                .get_post(&second.slug)
                .await
                .unwrap()
                .content
                .ends_with("two")
        );
    }

    #[tokio::test]
    async fn unsluggable_title_falls_back_to_timestamp() {
        let (_dir, service) = service();

        let created = service.create_post("!!!", "body", false).await.unwrap();
        assert_eq!(created.slug.len(), 14);
        assert!(created.slug.chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn empty_title_uses_current_time() {
        let (_dir, service) = service();

        let created = service.create_post("", "body", false).await.unwrap();
        assert!(created.slug.starts_with(&Utc::now().format("%Y-").to_string()));
        assert!(!created.slug.contains(':'));
    }

    #[tokio::test]
    async fn upload_rejects_wrong_extension() {
        let (_dir, service) = service();
        let err = service
            .upload_post(Some("notes.txt"), b"# Notes".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn upload_rejects_non_utf8() {
        let (_dir, service) = service();
        let err = service
            .upload_post(Some("notes.md"), vec![0xff, 0xfe, 0xfd])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn upload_uses_heading_for_slug_and_stores_verbatim() {
        let (_dir, service) = service();
        let text = "\n\n## My Upload\n\nbody";

        let created = service
            .upload_post(Some("whatever.MD"), text.as_bytes().to_vec())
            .await
            .unwrap();

        assert_eq!(created.slug, "my-upload");
        assert_eq!(service.get_post("my-upload").await.unwrap().content, text);
    }

    #[tokio::test]
    async fn upload_with_long_first_line_uses_filename() {
        let (_dir, service) = service();
        let text = format!("{}\nmore", "word ".repeat(20));

        let created = service
            .upload_post(Some("Release Notes.md"), text.into_bytes())
            .await
            .unwrap();

        assert_eq!(created.slug, "release-notes");
    }

    #[tokio::test]
    async fn upload_without_filename_defaults_to_post() {
        let (_dir, service) = service();
        let text = "x".repeat(100);

        let created = service.upload_post(None, text.into_bytes()).await.unwrap();

        assert_eq!(created.slug, "post");
    }

    #[tokio::test]
    async fn get_sanitizes_traversal_attempts() {
        let (dir, service) = service();
        std::fs::write(dir.path().join("etc-passwd.md"), "# Inside").unwrap();

        let post = service.get_post("../../etc/passwd").await.unwrap();
        assert_eq!(post.slug, "etc-passwd");
        assert_eq!(post.title, "Inside");

        let err = service.get_post("../..").await.unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound(_)));
    }

    #[tokio::test]
    async fn listing_falls_back_to_slug_for_title() {
        let (dir, service) = service();
        std::fs::write(dir.path().join("plain.md"), "no heading here").unwrap();
        std::fs::write(dir.path().join("titled.md"), "# Titled").unwrap();

        let posts = service.get_posts().await.unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].slug, "titled");
        assert_eq!(posts[0].title, "Titled");
        assert_eq!(posts[1].title, "plain");
    }

    #[test]
    fn candidate_selection() {
        assert_eq!(upload_slug_candidate("# Title\nbody", "f.md"), "Title");
        assert_eq!(upload_slug_candidate("short line", "f.md"), "short line");
        assert_eq!(upload_slug_candidate("", "file.md"), "file");
        assert_eq!(upload_slug_candidate(" \n \n", "file.md"), "file");
        let long = format!("# {}", "x".repeat(200));
        assert_eq!(upload_slug_candidate(&long, "f.md"), "x".repeat(200));
    }

    #[test]
    fn file_stem_strips_last_extension() {
        assert_eq!(file_stem("notes.md"), "notes");
        assert_eq!(file_stem("archive.tar.md"), "archive.tar");
        assert_eq!(file_stem(".md"), ".md");
    }
}
