use actix_web::{HttpResponse, delete, get, post, web};
use sea_orm::DatabaseConnection;
use validator::Validate;

use crate::errors::ServiceError;
use crate::middleware::AuthUser;
use crate::models::dto::AddFavoriteRequest;
use crate::services::favorites_service::FavoritesService;

/// POST /favorites - Bookmark a book (PROTECTED, regular users only)
#[post("")]
pub async fn add_favorite(
    auth_user: AuthUser,
    body: web::Json<AddFavoriteRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    body.validate()?;

    let favorite = FavoritesService::add(db.get_ref(), &auth_user, &body.book_id).await?;
    Ok(HttpResponse::Created().json(favorite))
}

/// DELETE /favorites/{book_id} - Remove a bookmark (PROTECTED, regular users only)
#[delete("/{book_id}")]
pub async fn remove_favorite(
    auth_user: AuthUser,
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    FavoritesService::remove(db.get_ref(), &auth_user, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Favorite removed successfully"
    })))
}

/// GET /favorites/check/{book_id} - Is this book bookmarked? (PROTECTED)
#[get("/check/{book_id}")]
pub async fn check_favorite(
    auth_user: AuthUser,
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    let favorited =
        FavoritesService::is_favorited(db.get_ref(), &auth_user, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "favorited": favorited })))
}

/// GET /favorites - The caller's bookmarks, newest first (PROTECTED)
#[get("")]
pub async fn list_favorites(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    let favorites = FavoritesService::list(db.get_ref(), &auth_user).await?;
    Ok(HttpResponse::Ok().json(favorites))
}

pub fn favorites_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/favorites")
            .service(add_favorite)
            .service(check_favorite)
            .service(remove_favorite)
            .service(list_favorites),
    );
}
