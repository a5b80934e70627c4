use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::middleware::AuthUser;
use crate::models::dto::{BookDetail, FavoriteDetail};
use crate::models::{books, favorites, genres, users};

/// Favorites belong to the regular user store only. An admin identity gets
/// an explicit rejection on writes and empty results on reads.
fn require_regular_user(caller: &AuthUser) -> Result<Uuid, ServiceError> {
    caller.regular_user_id().ok_or_else(|| {
        ServiceError::Forbidden(
            "Favorites are only available for regular users, not admin accounts".to_string(),
        )
    })
}

pub struct FavoritesService;

impl FavoritesService {
    pub async fn add(
        db: &DatabaseConnection,
        caller: &AuthUser,
        book_id: &str,
    ) -> Result<FavoriteDetail, ServiceError> {
        let user_id = require_regular_user(caller)?;
        let book_id =
            Uuid::parse_str(book_id).map_err(|_| ServiceError::NotFound("Book".to_string()))?;

        users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;

        let (book, genre) = books::Entity::find_by_id(book_id)
            .find_also_related(genres::Entity)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Book".to_string()))?;

        // At most one favorite per (user, book)
        let existing = favorites::Entity::find()
            .filter(favorites::Column::UserId.eq(user_id))
            .filter(favorites::Column::BookId.eq(book_id))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "Book is already in favorites".to_string(),
            ));
        }

        let favorite = favorites::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            book_id: Set(book_id),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await?;

        Ok(FavoriteDetail {
            id: favorite.id,
            created_at: favorite.created_at,
            book: Some(BookDetail { book, genre }),
        })
    }

    pub async fn remove(
        db: &DatabaseConnection,
        caller: &AuthUser,
        book_id: &str,
    ) -> Result<(), ServiceError> {
        let user_id = require_regular_user(caller)?;
        let book_id =
            Uuid::parse_str(book_id).map_err(|_| ServiceError::NotFound("Book".to_string()))?;

        let favorite = favorites::Entity::find()
            .filter(favorites::Column::UserId.eq(user_id))
            .filter(favorites::Column::BookId.eq(book_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Favorite".to_string()))?;

        favorites::Entity::delete_by_id(favorite.id).exec(db).await?;
        Ok(())
    }

    pub async fn is_favorited(
        db: &DatabaseConnection,
        caller: &AuthUser,
        book_id: &str,
    ) -> Result<bool, ServiceError> {
        // Admin identities simply have no favorites
        let Some(user_id) = caller.regular_user_id() else {
            return Ok(false);
        };
        let Ok(book_id) = Uuid::parse_str(book_id) else {
            return Ok(false);
        };

        let favorite = favorites::Entity::find()
            .filter(favorites::Column::UserId.eq(user_id))
            .filter(favorites::Column::BookId.eq(book_id))
            .one(db)
            .await?;

        Ok(favorite.is_some())
    }

    pub async fn list(
        db: &DatabaseConnection,
        caller: &AuthUser,
    ) -> Result<Vec<FavoriteDetail>, ServiceError> {
        // Empty result, not an error, for admin identities
        let Some(user_id) = caller.regular_user_id() else {
            return Ok(Vec::new());
        };

        let favorites = favorites::Entity::find()
            .filter(favorites::Column::UserId.eq(user_id))
            .order_by_desc(favorites::Column::CreatedAt)
            .all(db)
            .await?;

        let book_ids: Vec<Uuid> = favorites.iter().map(|f| f.book_id).collect();
        let books: std::collections::HashMap<Uuid, (books::Model, Option<genres::Model>)> =
            books::Entity::find()
                .filter(books::Column::Id.is_in(book_ids))
                .find_also_related(genres::Entity)
                .all(db)
                .await?
                .into_iter()
                .map(|(book, genre)| (book.id, (book, genre)))
                .collect();

        Ok(favorites
            .into_iter()
            .map(|favorite| {
                let book = books.get(&favorite.book_id).map(|(book, genre)| BookDetail {
                    book: book.clone(),
                    genre: genre.clone(),
                });
                FavoriteDetail {
                    id: favorite.id,
                    created_at: favorite.created_at,
                    book,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn admin_caller() -> AuthUser {
        AuthUser {
            id: "7".to_string(),
            email: "backoffice@example.com".to_string(),
            username: "backoffice".to_string(),
            role: Some(crate::models::admin_users::Role::Admin),
        }
    }

    #[tokio::test]
    async fn test_admin_write_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = FavoritesService::add(&db, &admin_caller(), &Uuid::new_v4().to_string()).await;
        assert!(matches!(result, Err(ServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_admin_read_is_empty_not_an_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let favorites = FavoritesService::list(&db, &admin_caller()).await.unwrap();
        assert!(favorites.is_empty());

        let favorited =
            FavoritesService::is_favorited(&db, &admin_caller(), &Uuid::new_v4().to_string())
                .await
                .unwrap();
        assert!(!favorited);
    }

    #[tokio::test]
    async fn test_duplicate_favorite_is_conflict() {
        let user = users::Model {
            id: Uuid::new_v4(),
            email: "reader@example.com".to_string(),
            username: "reader".to_string(),
            password: "pbkdf2:sha256:260000$x$y".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let caller = AuthUser {
            id: user.id.to_string(),
            email: user.email.clone(),
            username: user.username.clone(),
            role: None,
        };

        let book = books::Model {
            id: Uuid::new_v4(),
            title: "Dune".to_string(),
            writer: "Frank Herbert".to_string(),
            publisher: "Chilton".to_string(),
            publication_year: 1965,
            description: None,
            cover_url: None,
            condition: None,
            price: rust_decimal::Decimal::new(150000, 2),
            stock_quantity: 4,
            genre_id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let genre = genres::Model {
            id: book.genre_id,
            name: "Science Fiction".to_string(),
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let existing = favorites::Model {
            id: Uuid::new_v4(),
            user_id: user.id,
            book_id: book.id,
            created_at: Utc::now(),
        };
        let book_id = book.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user]])
            .append_query_results([vec![(book, genre)]])
            .append_query_results([vec![existing]])
            .into_connection();

        let result = FavoritesService::add(&db, &caller, &book_id.to_string()).await;
        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }
}
