use actix_web::{HttpResponse, delete, get, patch, post, web};
use sea_orm::DatabaseConnection;
use validator::Validate;

use crate::errors::ServiceError;
use crate::middleware::AuthUser;
use crate::models::dto::{CreateGenreRequest, PaginationQuery, UpdateGenreRequest};
use crate::services::genres_service::GenresService;
use crate::utils::pagination;

/// GET /genre - List genres, paged (PUBLIC)
#[get("")]
pub async fn list_genres(
    query: web::Query<PaginationQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    let (page, limit) = pagination::normalize(query.page, query.limit);
    let (genres, pagination) = GenresService::find_all(db.get_ref(), page, limit).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "genres": genres,
        "pagination": pagination,
    })))
}

/// GET /genre/{id} - Genre detail with its books (PUBLIC)
#[get("/{genre_id}")]
pub async fn get_genre(
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    let genre = GenresService::find_by_id(db.get_ref(), &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(genre))
}

/// POST /genre - Create a genre (ADMIN)
#[post("")]
pub async fn create_genre(
    auth_user: AuthUser,
    body: web::Json<CreateGenreRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    auth_user.require_admin()?;
    body.validate()?;

    let genre = GenresService::create(db.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(genre))
}

/// PATCH /genre/{id} - Rename or re-describe a genre (ADMIN)
#[patch("/{genre_id}")]
pub async fn update_genre(
    auth_user: AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdateGenreRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    auth_user.require_admin()?;
    body.validate()?;

    let genre = GenresService::update(db.get_ref(), &path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(genre))
}

/// DELETE /genre/{id} - Delete a genre with no books (ADMIN)
#[delete("/{genre_id}")]
pub async fn delete_genre(
    auth_user: AuthUser,
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    auth_user.require_admin()?;

    GenresService::delete(db.get_ref(), &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Genre deleted successfully"
    })))
}

pub fn genre_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/genre")
            .service(list_genres)
            .service(get_genre)
            .service(create_genre)
            .service(update_genre)
            .service(delete_genre),
    );
}
