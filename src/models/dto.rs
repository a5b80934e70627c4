// Request and response shapes for the API. Requests carry `validator`
// rules; responses flatten the SeaORM entity models where possible.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::DateTimeUtc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::admin_users::Role;
use super::{admin_users, books, genres, users};

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 2, message = "Username must be at least 2 characters"))]
    pub username: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email or username is required"))]
    pub email_or_username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// The resolved caller identity, shared by both stores. `role` is present
/// only for admin accounts, `created_at` only for regular users.
#[derive(Debug, Clone, Serialize)]
pub struct UserPublic {
    pub id: String,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTimeUtc>,
}

impl From<users::Model> for UserPublic {
    fn from(user: users::Model) -> Self {
        UserPublic {
            id: user.id.to_string(),
            email: user.email,
            username: user.username,
            role: None,
            created_at: Some(user.created_at),
        }
    }
}

impl From<admin_users::Model> for UserPublic {
    fn from(admin: admin_users::Model) -> Self {
        UserPublic {
            id: admin.id.to_string(),
            email: admin.email,
            username: admin.username,
            role: Some(admin.role),
            created_at: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserPublic,
    pub token: String,
}

// ---------------------------------------------------------------------------
// Genres
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGenreRequest {
    #[validate(length(min = 1, message = "Genre name is required"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateGenreRequest {
    #[validate(length(min = 1, message = "Genre name cannot be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenreDetail {
    #[serde(flatten)]
    pub genre: genres::Model,
    pub books: Vec<BookSummary>,
}

#[derive(Debug, Serialize)]
pub struct BookSummary {
    pub id: Uuid,
    pub title: String,
    pub writer: String,
    pub price: Decimal,
    pub stock_quantity: i32,
}

impl From<books::Model> for BookSummary {
    fn from(book: books::Model) -> Self {
        BookSummary {
            id: book.id,
            title: book.title,
            writer: book.writer,
            price: book.price,
            stock_quantity: book.stock_quantity,
        }
    }
}

// ---------------------------------------------------------------------------
// Books
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Writer is required"))]
    pub writer: String,
    #[validate(length(min = 1, message = "Publisher is required"))]
    pub publisher: String,
    pub publication_year: i32,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub condition: Option<String>,
    pub price: Decimal,
    pub stock_quantity: i32,
    #[validate(length(min = 1, message = "Genre ID is required"))]
    pub genre_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBookRequest {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Writer cannot be empty"))]
    pub writer: Option<String>,
    #[validate(length(min = 1, message = "Publisher cannot be empty"))]
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub condition: Option<String>,
    pub price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub genre_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BookListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub genre_id: Option<String>,
    pub condition: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BookDetail {
    #[serde(flatten)]
    pub book: books::Model,
    pub genre: Option<genres::Model>,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "At least one item is required"))]
    #[validate(nested)]
    pub items: Vec<OrderItemRequest>,
}

// Serialize is needed because the length rule on `CreateOrderRequest.items`
// embeds the offending value in the validation error params
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct OrderItemRequest {
    #[validate(length(min = 1, message = "Book ID is required"))]
    pub book_id: String,
    #[validate(range(min = 1, message = "Quantity must be a positive integer"))]
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct OrderUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct OrderItemDetail {
    pub id: Uuid,
    pub quantity: i32,
    pub book: Option<BookDetail>,
}

#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total: Decimal,
    pub created_at: DateTimeUtc,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<OrderUser>,
    pub items: Vec<OrderItemDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenrePopularity {
    pub genre_id: Uuid,
    pub genre_name: String,
    pub order_count: u64,
}

#[derive(Debug, Serialize)]
pub struct OrderStatistics {
    pub total_orders: u64,
    pub total_revenue: Decimal,
    pub average_order_value: Decimal,
    pub most_popular_genre: Option<GenrePopularity>,
    pub least_popular_genre: Option<GenrePopularity>,
}

// ---------------------------------------------------------------------------
// Favorites
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct AddFavoriteRequest {
    #[validate(length(min = 1, message = "Book ID is required"))]
    pub book_id: String,
}

#[derive(Debug, Serialize)]
pub struct FavoriteDetail {
    pub id: Uuid,
    pub created_at: DateTimeUtc,
    pub book: Option<BookDetail>,
}

// ---------------------------------------------------------------------------
// Admin accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAdminUserRequest {
    #[validate(length(min = 2, message = "Username must be at least 2 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAdminUserRequest {
    #[validate(length(min = 2, message = "Username must be at least 2 characters"))]
    pub username: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    pub role: Option<Role>,
}

// ---------------------------------------------------------------------------
// Shared query shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}
