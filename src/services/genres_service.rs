use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::dto::{BookSummary, CreateGenreRequest, GenreDetail, UpdateGenreRequest};
use crate::models::{books, genres};
use crate::utils::pagination::{self, Pagination};

fn parse_genre_id(id: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(id).map_err(|_| ServiceError::NotFound("Genre".to_string()))
}

pub struct GenresService;

impl GenresService {
    pub async fn create(
        db: &DatabaseConnection,
        request: CreateGenreRequest,
    ) -> Result<genres::Model, ServiceError> {
        let existing = genres::Entity::find()
            .filter(genres::Column::Name.eq(&request.name))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "Genre with this name already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let genre = genres::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            description: Set(request.description),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        Ok(genre)
    }

    pub async fn find_all(
        db: &DatabaseConnection,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<genres::Model>, Pagination), ServiceError> {
        let total = genres::Entity::find().count(db).await?;

        let genres = genres::Entity::find()
            .order_by_desc(genres::Column::CreatedAt)
            .offset(pagination::skip(page, limit))
            .limit(limit)
            .all(db)
            .await?;

        Ok((genres, pagination::paginate(page, limit, total)))
    }

    /// Genre detail including a summary of its books.
    pub async fn find_by_id(db: &DatabaseConnection, id: &str) -> Result<GenreDetail, ServiceError> {
        let genre_id = parse_genre_id(id)?;

        let genre = genres::Entity::find_by_id(genre_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Genre".to_string()))?;

        let books = books::Entity::find()
            .filter(books::Column::GenreId.eq(genre_id))
            .all(db)
            .await?
            .into_iter()
            .map(BookSummary::from)
            .collect();

        Ok(GenreDetail { genre, books })
    }

    pub async fn update(
        db: &DatabaseConnection,
        id: &str,
        request: UpdateGenreRequest,
    ) -> Result<genres::Model, ServiceError> {
        let genre_id = parse_genre_id(id)?;

        if request.name.is_none() && request.description.is_none() {
            return Err(ServiceError::Validation(
                "Update data cannot be empty".to_string(),
            ));
        }

        let existing = genres::Entity::find_by_id(genre_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Genre".to_string()))?;

        // Renaming onto another genre's name is a conflict
        if let Some(ref name) = request.name {
            if *name != existing.name {
                let clash = genres::Entity::find()
                    .filter(genres::Column::Name.eq(name))
                    .one(db)
                    .await?;
                if clash.is_some() {
                    return Err(ServiceError::Conflict(
                        "Genre with this name already exists".to_string(),
                    ));
                }
            }
        }

        let mut active: genres::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(db).await?)
    }

    /// A genre can only be deleted once no book references it.
    pub async fn delete(db: &DatabaseConnection, id: &str) -> Result<(), ServiceError> {
        let genre_id = parse_genre_id(id)?;

        genres::Entity::find_by_id(genre_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Genre".to_string()))?;

        let referenced = books::Entity::find()
            .filter(books::Column::GenreId.eq(genre_id))
            .one(db)
            .await?;
        if referenced.is_some() {
            return Err(ServiceError::InvariantViolation(
                "Cannot delete genre with existing books".to_string(),
            ));
        }

        genres::Entity::delete_by_id(genre_id).exec(db).await?;
        Ok(())
    }
}
