use actix_web::{HttpResponse, delete, get, patch, post, web};
use sea_orm::DatabaseConnection;
use validator::Validate;

use crate::errors::ServiceError;
use crate::middleware::AuthUser;
use crate::models::dto::{BookListQuery, CreateBookRequest, PaginationQuery, UpdateBookRequest};
use crate::services::books_service::BooksService;
use crate::utils::pagination;

/// GET /books - Browse the catalog with search/filter/sort (PUBLIC)
#[get("")]
pub async fn list_books(
    query: web::Query<BookListQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    let (books, pagination) = BooksService::find_all(db.get_ref(), query.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "books": books,
        "pagination": pagination,
    })))
}

/// GET /books/{id} - Single book with its genre (PUBLIC)
#[get("/{book_id}")]
pub async fn get_book(
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    let book = BooksService::find_by_id(db.get_ref(), &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(book))
}

/// GET /books/genre/{genre_id} - Books of one genre, paged (PUBLIC)
#[get("/genre/{genre_id}")]
pub async fn get_books_by_genre(
    path: web::Path<String>,
    query: web::Query<PaginationQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    let (page, limit) = pagination::normalize(query.page, query.limit);
    let (books, pagination) =
        BooksService::find_by_genre(db.get_ref(), &path.into_inner(), page, limit).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "books": books,
        "pagination": pagination,
    })))
}

/// POST /books - Add a catalog entry (ADMIN)
#[post("")]
pub async fn create_book(
    auth_user: AuthUser,
    body: web::Json<CreateBookRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    auth_user.require_admin()?;
    body.validate()?;

    let book = BooksService::create(db.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(book))
}

/// PATCH /books/{id} - Update a catalog entry (ADMIN)
#[patch("/{book_id}")]
pub async fn update_book(
    auth_user: AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdateBookRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    auth_user.require_admin()?;
    body.validate()?;

    let book = BooksService::update(db.get_ref(), &path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(book))
}

/// DELETE /books/{id} - Remove a book with no order history (ADMIN)
#[delete("/{book_id}")]
pub async fn delete_book(
    auth_user: AuthUser,
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    auth_user.require_admin()?;

    BooksService::delete(db.get_ref(), &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Book deleted successfully"
    })))
}

pub fn books_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/books")
            .service(list_books)
            .service(get_books_by_genre)
            .service(get_book)
            .service(create_book)
            .service(update_book)
            .service(delete_book),
    );
}
