use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

use crate::domain::error::DomainError;
use crate::domain::post::{POST_EXTENSION, post_file_stem};

/// Raw post file as found on disk.
#[derive(Debug, Clone)]
pub struct StoredPost {
    pub slug: String,
    pub content: String,
    pub modified_at: DateTime<Utc>,
}

/// Keyed storage for post documents.
///
/// Slugs handed to the repository are already sanitized.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn exists(&self, slug: &str) -> Result<bool, DomainError>;
    async fn read(&self, slug: &str) -> Result<Option<StoredPost>, DomainError>;
    /// Creates the post only if no post with this slug exists yet.
    /// Returns `false` without touching the store when the slug is taken.
    async fn write_if_absent(&self, slug: &str, content: &str) -> Result<bool, DomainError>;
    /// All posts, sorted by file name descending.
    async fn list(&self) -> Result<Vec<StoredPost>, DomainError>;
}

#[derive(Clone)]
pub struct FsPostRepository {
    root: PathBuf,
}

impl FsPostRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the content directory when it does not exist yet.
    pub async fn ensure_dir(&self) -> Result<(), DomainError> {
        fs::create_dir_all(&self.root).await?;
        info!(content_dir = %self.root.display(), "content directory ready");
        Ok(())
    }

    fn path_for(&self, slug: &str) -> PathBuf {
        self.root.join(format!("{slug}{POST_EXTENSION}"))
    }
}

async fn modified_at(path: &Path) -> Result<DateTime<Utc>, DomainError> {
    let modified = fs::metadata(path).await?.modified()?;
    Ok(DateTime::<Utc>::from(modified))
}

#[async_trait]
impl PostRepository for FsPostRepository {
    async fn exists(&self, slug: &str) -> Result<bool, DomainError> {
        Ok(fs::try_exists(self.path_for(slug)).await?)
    }

    async fn read(&self, slug: &str) -> Result<Option<StoredPost>, DomainError> {
        let path = self.path_for(slug);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                error!("failed to read post {}: {}", slug, e);
                return Err(e.into());
            }
        };
        let content = String::from_utf8(bytes)
            .map_err(|_| DomainError::Internal(format!("post {slug} is not valid UTF-8")))?;

        Ok(Some(StoredPost {
            slug: slug.to_string(),
            content,
            modified_at: modified_at(&path).await?,
        }))
    }

    async fn write_if_absent(&self, slug: &str, content: &str) -> Result<bool, DomainError> {
        let path = self.path_for(slug);
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => {
                error!("failed to create post {}: {}", slug, e);
                return Err(e.into());
            }
        };

        let written = async {
            file.write_all(content.as_bytes()).await?;
            file.flush().await
        }
        .await;
        if let Err(e) = written {
            error!("failed to write post {}: {}", slug, e);
            let _ = fs::remove_file(&path).await;
            return Err(e.into());
        }

        info!(slug = %slug, bytes = content.len(), "post file written");
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<StoredPost>, DomainError> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            // Follows symlinks; dangling links are skipped.
            match fs::metadata(entry.path()).await {
                Ok(meta) if meta.is_file() => {}
                _ => continue,
            }
            match entry.file_name().into_string() {
                Ok(name) if post_file_stem(&name).is_some() => names.push(name),
                _ => continue,
            }
        }
        names.sort_unstable_by(|a, b| b.cmp(a));

        let mut posts = Vec::with_capacity(names.len());
        for name in names {
            let Some(slug) = post_file_stem(&name) else {
                continue;
            };
            let path = self.root.join(&name);
            let content = match fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) => {
                    warn!(file = %name, "skipping unreadable post: {}", e);
                    continue;
                }
            };
            posts.push(StoredPost {
                slug: slug.to_string(),
                content,
                modified_at: modified_at(&path).await?,
            });
        }

        Ok(posts)
    }
}
