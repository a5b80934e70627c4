use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, extension::postgres::PgExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::dto::{BookDetail, BookListQuery, CreateBookRequest, UpdateBookRequest};
use crate::models::{books, genres, order_items};
use crate::utils::pagination::{self, Pagination};

// Decimal(10,2) ceiling: 99,999,999.99
fn max_price() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

fn parse_book_id(id: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(id).map_err(|_| ServiceError::NotFound("Book".to_string()))
}

fn validate_price(price: Decimal) -> Result<(), ServiceError> {
    if price < Decimal::ZERO {
        return Err(ServiceError::Validation(
            "Price must be a non-negative number".to_string(),
        ));
    }
    if price > max_price() {
        return Err(ServiceError::Validation(
            "Price cannot exceed 99,999,999.99".to_string(),
        ));
    }
    if price.round_dp(2) != price {
        return Err(ServiceError::Validation(
            "Price can have at most 2 decimal places".to_string(),
        ));
    }
    Ok(())
}

fn validate_stock(stock_quantity: i32) -> Result<(), ServiceError> {
    if stock_quantity < 0 {
        return Err(ServiceError::Validation(
            "Stock quantity must be a non-negative integer".to_string(),
        ));
    }
    Ok(())
}

fn validate_publication_year(year: i32) -> Result<(), ServiceError> {
    if year <= 0 || year > Utc::now().year() {
        return Err(ServiceError::Validation(
            "Publication year must be a valid year".to_string(),
        ));
    }
    Ok(())
}

// Case-insensitive any-of match over title, writer and description
fn search_condition(search: &str) -> Condition {
    let pattern = format!("%{}%", search);
    Condition::any()
        .add(Expr::col((books::Entity, books::Column::Title)).ilike(pattern.clone()))
        .add(Expr::col((books::Entity, books::Column::Writer)).ilike(pattern.clone()))
        .add(Expr::col((books::Entity, books::Column::Description)).ilike(pattern))
}

pub struct BooksService;

impl BooksService {
    pub async fn create(
        db: &DatabaseConnection,
        request: CreateBookRequest,
    ) -> Result<BookDetail, ServiceError> {
        validate_price(request.price)?;
        validate_stock(request.stock_quantity)?;
        validate_publication_year(request.publication_year)?;

        // 1. The referenced genre must exist
        let genre_id = Uuid::parse_str(&request.genre_id)
            .map_err(|_| ServiceError::NotFound("Genre".to_string()))?;
        let genre = genres::Entity::find_by_id(genre_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Genre".to_string()))?;

        // 2. Titles are unique in practice
        let existing = books::Entity::find()
            .filter(books::Column::Title.eq(&request.title))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "Book with this title already exists".to_string(),
            ));
        }

        // 3. Create
        let now = Utc::now();
        let book = books::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(request.title),
            writer: Set(request.writer),
            publisher: Set(request.publisher),
            publication_year: Set(request.publication_year),
            description: Set(request.description),
            cover_url: Set(request.cover_url),
            condition: Set(request.condition),
            price: Set(request.price),
            stock_quantity: Set(request.stock_quantity),
            genre_id: Set(genre_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        Ok(BookDetail {
            book,
            genre: Some(genre),
        })
    }

    pub async fn find_all(
        db: &DatabaseConnection,
        query: BookListQuery,
    ) -> Result<(Vec<BookDetail>, Pagination), ServiceError> {
        let (page, limit) = pagination::normalize(query.page, query.limit);

        // Shared filter for the page query and the count
        let mut condition = Condition::all();

        if let Some(ref search) = query.search {
            condition = condition.add(search_condition(search));
        }
        if let Some(ref genre_id) = query.genre_id {
            let genre_id = Uuid::parse_str(genre_id)
                .map_err(|_| ServiceError::NotFound("Genre".to_string()))?;
            condition = condition.add(books::Column::GenreId.eq(genre_id));
        }
        if let Some(ref book_condition) = query.condition {
            condition = condition.add(books::Column::Condition.eq(book_condition));
        }

        let base = books::Entity::find().filter(condition);

        let total = base.clone().count(db).await?;

        let mut select = base.find_also_related(genres::Entity);
        select = match query.sort.as_deref() {
            Some("title") => select.order_by_asc(books::Column::Title),
            Some("publication_year") => select.order_by_desc(books::Column::PublicationYear),
            _ => select.order_by_desc(books::Column::CreatedAt),
        };

        let rows = select
            .offset(pagination::skip(page, limit))
            .limit(limit)
            .all(db)
            .await?;

        let books = rows
            .into_iter()
            .map(|(book, genre)| BookDetail { book, genre })
            .collect();

        Ok((books, pagination::paginate(page, limit, total)))
    }

    pub async fn find_by_id(db: &DatabaseConnection, id: &str) -> Result<BookDetail, ServiceError> {
        let book_id = parse_book_id(id)?;

        let (book, genre) = books::Entity::find_by_id(book_id)
            .find_also_related(genres::Entity)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Book".to_string()))?;

        Ok(BookDetail { book, genre })
    }

    pub async fn find_by_genre(
        db: &DatabaseConnection,
        genre_id: &str,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<BookDetail>, Pagination), ServiceError> {
        let genre_id = Uuid::parse_str(genre_id)
            .map_err(|_| ServiceError::NotFound("Genre".to_string()))?;

        let genre = genres::Entity::find_by_id(genre_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Genre".to_string()))?;

        let total = books::Entity::find()
            .filter(books::Column::GenreId.eq(genre_id))
            .count(db)
            .await?;

        let books = books::Entity::find()
            .filter(books::Column::GenreId.eq(genre_id))
            .order_by_desc(books::Column::CreatedAt)
            .offset(pagination::skip(page, limit))
            .limit(limit)
            .all(db)
            .await?
            .into_iter()
            .map(|book| BookDetail {
                book,
                genre: Some(genre.clone()),
            })
            .collect();

        Ok((books, pagination::paginate(page, limit, total)))
    }

    pub async fn update(
        db: &DatabaseConnection,
        id: &str,
        request: UpdateBookRequest,
    ) -> Result<BookDetail, ServiceError> {
        let book_id = parse_book_id(id)?;

        if let Some(price) = request.price {
            validate_price(price)?;
        }
        if let Some(stock_quantity) = request.stock_quantity {
            validate_stock(stock_quantity)?;
        }
        if let Some(year) = request.publication_year {
            validate_publication_year(year)?;
        }

        let existing = books::Entity::find_by_id(book_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Book".to_string()))?;

        // A new genre reference must exist before the book can move to it
        let new_genre_id = match request.genre_id {
            Some(ref raw) => {
                let genre_id = Uuid::parse_str(raw)
                    .map_err(|_| ServiceError::NotFound("Genre".to_string()))?;
                if genre_id != existing.genre_id {
                    genres::Entity::find_by_id(genre_id)
                        .one(db)
                        .await?
                        .ok_or_else(|| ServiceError::NotFound("Genre".to_string()))?;
                }
                Some(genre_id)
            }
            None => None,
        };

        let mut active: books::ActiveModel = existing.into();
        if let Some(title) = request.title {
            active.title = Set(title);
        }
        if let Some(writer) = request.writer {
            active.writer = Set(writer);
        }
        if let Some(publisher) = request.publisher {
            active.publisher = Set(publisher);
        }
        if let Some(year) = request.publication_year {
            active.publication_year = Set(year);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(cover_url) = request.cover_url {
            active.cover_url = Set(Some(cover_url));
        }
        if let Some(condition) = request.condition {
            active.condition = Set(Some(condition));
        }
        if let Some(price) = request.price {
            active.price = Set(price);
        }
        if let Some(stock_quantity) = request.stock_quantity {
            active.stock_quantity = Set(stock_quantity);
        }
        if let Some(genre_id) = new_genre_id {
            active.genre_id = Set(genre_id);
        }
        active.updated_at = Set(Utc::now());

        let book = active.update(db).await?;

        let genre = genres::Entity::find_by_id(book.genre_id).one(db).await?;
        Ok(BookDetail { book, genre })
    }

    /// A book can only be deleted once no order references it.
    pub async fn delete(db: &DatabaseConnection, id: &str) -> Result<(), ServiceError> {
        let book_id = parse_book_id(id)?;

        books::Entity::find_by_id(book_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Book".to_string()))?;

        let referenced = order_items::Entity::find()
            .filter(order_items::Column::BookId.eq(book_id))
            .one(db)
            .await?;
        if referenced.is_some() {
            return Err(ServiceError::InvariantViolation(
                "Cannot delete book with existing orders".to_string(),
            ));
        }

        books::Entity::delete_by_id(book_id).exec(db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_validation_bounds() {
        assert!(validate_price(Decimal::ZERO).is_ok());
        assert!(validate_price(Decimal::new(9999999999, 2)).is_ok()); // 99,999,999.99
        assert!(validate_price(Decimal::new(-1, 2)).is_err());
        assert!(validate_price(Decimal::new(10000000000, 2)).is_err()); // 100,000,000.00
        assert!(validate_price(Decimal::new(12345, 3)).is_err()); // 12.345 has 3 decimals
    }

    #[test]
    fn test_search_filter_is_case_insensitive() {
        use sea_orm::QueryTrait;

        let sql = books::Entity::find()
            .filter(search_condition("dune"))
            .build(sea_orm::DatabaseBackend::Postgres)
            .to_string();

        assert!(sql.contains("ILIKE"));
        assert!(sql.contains("%dune%"));
        assert!(!sql.contains(" LIKE "));
    }

    #[test]
    fn test_stock_validation() {
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(500).is_ok());
        assert!(validate_stock(-1).is_err());
    }

    #[test]
    fn test_publication_year_validation() {
        assert!(validate_publication_year(1965).is_ok());
        assert!(validate_publication_year(Utc::now().year()).is_ok());
        assert!(validate_publication_year(Utc::now().year() + 1).is_err());
        assert!(validate_publication_year(0).is_err());
    }

    #[tokio::test]
    async fn test_delete_book_with_order_items_is_refused() {
        let book_id = Uuid::new_v4();
        let book = books::Model {
            id: book_id,
            title: "Dune".to_string(),
            writer: "Frank Herbert".to_string(),
            publisher: "Chilton".to_string(),
            publication_year: 1965,
            description: None,
            cover_url: None,
            condition: None,
            price: Decimal::new(150000, 2),
            stock_quantity: 4,
            genre_id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let item = order_items::Model {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            book_id,
            quantity: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let db = sea_orm::MockDatabase::new(sea_orm::DatabaseBackend::Postgres)
            .append_query_results([vec![book]])
            .append_query_results([vec![item]])
            .into_connection();

        let result = BooksService::delete(&db, &book_id.to_string()).await;
        assert!(matches!(result, Err(ServiceError::InvariantViolation(_))));
    }
}
