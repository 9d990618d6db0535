use crate::application::post_service::PostService;
use crate::data::post_repository::FsPostRepository;
use crate::domain::error::DomainError;
use crate::presentation::dto::{CreatePostRequest, WriteResponse};
use crate::presentation::utils::{AuthenticatedUser, request_id};
use actix_multipart::{Multipart, MultipartError};
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use futures_util::TryStreamExt;
use tracing::info;

/// Largest accepted upload, in bytes.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimit(pub usize);

const FILE_FIELD: &str = "file";

#[get("/posts")]
async fn get_posts(
    req: HttpRequest,
    post: web::Data<PostService<FsPostRepository>>,
) -> Result<HttpResponse, DomainError> {
    let posts = post.get_posts().await?;

    info!(
        request_id = %request_id(&req),
        total = posts.len(),
        "posts retrieved"
    );

    Ok(HttpResponse::Ok().json(posts))
}

#[get("/posts/{slug}")]
async fn get_post(
    req: HttpRequest,
    post: web::Data<PostService<FsPostRepository>>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    let post = post.get_post(&path.into_inner()).await?;

    info!(
        request_id = %request_id(&req),
        slug = %post.slug,
        "post retrieved"
    );

    Ok(HttpResponse::Ok().json(post))
}

#[post("/posts")]
async fn create_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    post: web::Data<PostService<FsPostRepository>>,
    payload: web::Form<CreatePostRequest>,
) -> Result<HttpResponse, DomainError> {
    let created = post
        .create_post(&payload.title, &payload.content, payload.published)
        .await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        slug = %created.slug,
        "post created"
    );

    Ok(HttpResponse::Ok().json(WriteResponse::from(created)))
}

#[post("/upload")]
async fn upload_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    post: web::Data<PostService<FsPostRepository>>,
    limit: web::Data<UploadLimit>,
    payload: Multipart,
) -> Result<HttpResponse, DomainError> {
    let (filename, bytes) = read_file_field(payload, limit.0).await?;
    let created = post.upload_post(filename.as_deref(), bytes).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        slug = %created.slug,
        "post uploaded"
    );

    Ok(HttpResponse::Ok().json(WriteResponse::from(created)))
}

/// Pulls the first `file` field out of a multipart body.
async fn read_file_field(
    mut payload: Multipart,
    limit: usize,
) -> Result<(Option<String>, Vec<u8>), DomainError> {
    while let Some(mut field) = payload.try_next().await.map_err(invalid_multipart)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_owned);

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(invalid_multipart)? {
            if bytes.len() + chunk.len() > limit {
                return Err(DomainError::invalid_input("file exceeds upload limit"));
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok((filename, bytes));
    }

    Err(DomainError::invalid_input("missing file field"))
}

fn invalid_multipart(err: MultipartError) -> DomainError {
    DomainError::invalid_input(format!("invalid multipart payload: {err}"))
}
