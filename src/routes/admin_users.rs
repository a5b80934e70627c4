use actix_web::{HttpResponse, delete, get, patch, post, web};
use sea_orm::DatabaseConnection;
use validator::Validate;

use crate::errors::ServiceError;
use crate::middleware::AuthUser;
use crate::models::dto::{CreateAdminUserRequest, UpdateAdminUserRequest};
use crate::services::admin_users_service::AdminUsersService;

/// GET /admin/users - All back-office accounts (ADMIN)
#[get("")]
pub async fn list_admin_users(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    auth_user.require_admin()?;

    let admins = AdminUsersService::list(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(admins))
}

/// GET /admin/users/{id} (ADMIN)
#[get("/{user_id}")]
pub async fn get_admin_user(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    auth_user.require_admin()?;

    let admin = AdminUsersService::find_by_id(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(admin))
}

/// POST /admin/users - Create a back-office account (ADMIN)
#[post("")]
pub async fn create_admin_user(
    auth_user: AuthUser,
    body: web::Json<CreateAdminUserRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    auth_user.require_admin()?;
    body.validate()?;

    let admin = AdminUsersService::create(db.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(admin))
}

/// PATCH /admin/users/{id} (ADMIN)
#[patch("/{user_id}")]
pub async fn update_admin_user(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<UpdateAdminUserRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    auth_user.require_admin()?;
    body.validate()?;

    let admin =
        AdminUsersService::update(db.get_ref(), path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(admin))
}

/// DELETE /admin/users/{id} (ADMIN)
#[delete("/{user_id}")]
pub async fn delete_admin_user(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    auth_user.require_admin()?;

    AdminUsersService::delete(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Admin user deleted successfully"
    })))
}

pub fn admin_users_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin/users")
            .service(list_admin_users)
            .service(get_admin_user)
            .service(create_admin_user)
            .service(update_admin_user)
            .service(delete_admin_user),
    );
}
