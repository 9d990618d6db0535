use std::sync::Arc;

use crate::application::auth_service::{AdminCredentials, AuthService};
use crate::application::post_service::PostService;
use crate::data::post_repository::FsPostRepository;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::security::JwtKeys;
use crate::presentation::handlers;
use crate::presentation::handlers::post::UploadLimit;
use crate::presentation::middleware::{RequestIdMiddleware, TimingMiddleware};
use actix_cors::Cors;
use actix_web::middleware::DefaultHeaders;
use actix_web::{App, HttpServer, web};
use tracing::info;

/// Everything the HTTP layer needs, built once from [`AppConfig`].
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub post_service: PostService<FsPostRepository>,
    pub upload_limit: UploadLimit,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Self {
        let keys = JwtKeys::new(
            &config.jwt_secret,
            config.jwt_algorithm,
            config.access_expire_minutes,
        );
        let admin = AdminCredentials {
            username: config.admin_user.clone(),
            password: config.admin_pass.clone(),
        };
        let repo = Arc::new(FsPostRepository::new(config.content_dir.clone()));

        Self {
            auth_service: AuthService::new(admin, keys),
            post_service: PostService::new(repo),
            upload_limit: UploadLimit(config.max_upload_bytes),
        }
    }
}

/// Registers the `/api` routes and the shared state they depend on.
pub fn configure(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(state.post_service))
            .app_data(web::Data::new(state.auth_service))
            .app_data(web::Data::new(state.upload_limit))
            .app_data(web::FormConfig::default().limit(state.upload_limit.0))
            .service(
                web::scope("/api")
                    .service(handlers::health::health)
                    .service(handlers::auth::login)
                    .service(handlers::post::get_posts)
                    .service(handlers::post::get_post)
                    .service(handlers::post::create_post)
                    .service(handlers::post::upload_post),
            );
    }
}

pub async fn start_rest_server(config: AppConfig) -> anyhow::Result<()> {
    FsPostRepository::new(config.content_dir.clone())
        .ensure_dir()
        .await?;

    let state = AppState::from_config(&config);
    let bind_address = (config.host.clone(), config.port);

    info!(
        host = %bind_address.0,
        port = bind_address.1,
        content_dir = %config.content_dir.display(),
        "HTTP server starting"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("Referrer-Policy", "no-referrer"))
                    .add(("Permissions-Policy", "geolocation=()"))
                    .add(("Cross-Origin-Opener-Policy", "same-origin")),
            )
            .wrap(build_cors(&config.cors_origins))
            .configure(configure(state.clone()))
    })
    .bind(bind_address)?
    .run()
    .await?;

    Ok(())
}

pub fn build_cors(origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::AUTHORIZATION,
        ])
        .supports_credentials()
        .max_age(3600);

    if origins.is_empty() {
        return cors.allow_any_origin();
    }
    for origin in origins {
        cors = cors.allowed_origin(origin);
    }

    cors
}
