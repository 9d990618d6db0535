use crate::application::auth_service::AuthService;
use crate::domain::error::DomainError;
use crate::presentation::dto::{AuthResponse, LoginRequest};
use crate::presentation::utils::request_id;
use actix_web::{HttpRequest, HttpResponse, post, web};
use tracing::info;

#[post("/login")]
async fn login(
    req: HttpRequest,
    service: web::Data<AuthService>,
    payload: web::Form<LoginRequest>,
) -> Result<HttpResponse, DomainError> {
    let jwt = service.login(&payload.username, &payload.password)?;

    info!(
        request_id = %request_id(&req),
        username = %payload.username,
        "admin logged in"
    );

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: jwt,
        token_type: "bearer".to_string(),
        expires_in: service.keys().expires_in(),
    }))
}
