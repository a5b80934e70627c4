use actix_web::{HttpResponse, get, post, web};
use sea_orm::DatabaseConnection;
use validator::Validate;

use crate::errors::ServiceError;
use crate::middleware::AuthUser;
use crate::models::dto::{LoginRequest, RegisterRequest};
use crate::services::auth_service::AuthService;

/// POST /auth/register - Create a regular user account (PUBLIC)
#[post("/register")]
pub async fn register(
    body: web::Json<RegisterRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    body.validate()?;

    let result = AuthService::register(db.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(result))
}

/// POST /auth/login - Authenticate against either identity store (PUBLIC)
#[post("/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    body.validate()?;

    let result = AuthService::login(db.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// GET /auth/me - Resolve the bearer token back to its identity (PROTECTED)
#[get("/me")]
pub async fn me(auth_user: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "user": auth_user }))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(register)
            .service(login)
            .service(me),
    );
}
