use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::dto::{
    BookDetail, CreateOrderRequest, GenrePopularity, OrderDetail, OrderItemDetail, OrderStatistics,
    OrderUser,
};
use crate::models::{books, genres, order_items, orders, users};
use crate::utils::pagination::{self, Pagination};

pub struct OrdersService;

impl OrdersService {
    /// Convert a cart into a durable order.
    ///
    /// All reads and writes run inside one database transaction: stock is
    /// checked, the order and its items are inserted, and every book's
    /// stock is decremented, or none of it happens. Isolation is whatever
    /// the underlying engine defaults to; there is no app-level locking.
    pub async fn create(
        db: &DatabaseConnection,
        user_id: &str,
        request: CreateOrderRequest,
    ) -> Result<OrderDetail, ServiceError> {
        // 1. The order owner must be a regular user; admin ids are not
        //    valid order owners (their integer ids fail the UUID parse).
        let user_id =
            Uuid::parse_str(user_id).map_err(|_| ServiceError::NotFound("User".to_string()))?;

        users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;

        // 2. Aggregate quantities per book so a cart that repeats a book is
        //    checked against stock as one demand. Checked addition: a sum
        //    that wraps negative would slip past the stock check and turn
        //    the decrement into an increment.
        let mut requested: BTreeMap<Uuid, i32> = BTreeMap::new();
        for item in &request.items {
            let book_id = Uuid::parse_str(&item.book_id).map_err(|_| {
                ServiceError::Validation(format!("Invalid book ID: {}", item.book_id))
            })?;
            let entry = requested.entry(book_id).or_insert(0);
            *entry = entry.checked_add(item.quantity).ok_or_else(|| {
                ServiceError::Validation(format!(
                    "Total quantity for book {} is too large",
                    item.book_id
                ))
            })?;
        }

        let txn = db.begin().await?;

        // 3. Fetch every referenced book in one query; a smaller result set
        //    means at least one id is unknown and the whole order aborts.
        let book_ids: Vec<Uuid> = requested.keys().copied().collect();
        let fetched = books::Entity::find()
            .filter(books::Column::Id.is_in(book_ids))
            .all(&txn)
            .await?;

        if fetched.len() != requested.len() {
            return Err(ServiceError::NotFound("One or more books".to_string()));
        }

        let book_map: HashMap<Uuid, books::Model> =
            fetched.into_iter().map(|b| (b.id, b)).collect();

        // 4. Stock check before any mutation
        for (book_id, quantity) in &requested {
            let book = &book_map[book_id];
            if *quantity > book.stock_quantity {
                return Err(ServiceError::InsufficientStock(book.title.clone()));
            }
        }

        // 5. Total in fixed-point decimal, from current prices
        let total: Decimal = requested
            .iter()
            .map(|(book_id, quantity)| book_map[book_id].price * Decimal::from(*quantity))
            .sum();

        // 6. Order row + items
        let now = Utc::now();
        let order = orders::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            total: Set(total),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let item_rows: Vec<order_items::Model> = requested
            .iter()
            .map(|(book_id, quantity)| order_items::Model {
                id: Uuid::new_v4(),
                order_id: order.id,
                book_id: *book_id,
                quantity: *quantity,
                created_at: now,
                updated_at: now,
            })
            .collect();

        order_items::Entity::insert_many(item_rows.iter().cloned().map(|m| m.into_active_model()))
            .exec_without_returning(&txn)
            .await?;

        // 7. Atomic decrement per book, still inside the transaction
        for (book_id, quantity) in &requested {
            books::Entity::update_many()
                .col_expr(
                    books::Column::StockQuantity,
                    Expr::col(books::Column::StockQuantity).sub(*quantity),
                )
                .filter(books::Column::Id.eq(*book_id))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;

        // 8. Receipt with denormalized book and genre details
        let genre_ids: Vec<Uuid> = book_map.values().map(|b| b.genre_id).collect();
        let genre_map: HashMap<Uuid, genres::Model> = genres::Entity::find()
            .filter(genres::Column::Id.is_in(genre_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|g| (g.id, g))
            .collect();

        let items = item_rows
            .into_iter()
            .map(|item| {
                let book = book_map.get(&item.book_id).cloned();
                let genre = book
                    .as_ref()
                    .and_then(|b| genre_map.get(&b.genre_id).cloned());
                OrderItemDetail {
                    id: item.id,
                    quantity: item.quantity,
                    book: book.map(|book| BookDetail { book, genre }),
                }
            })
            .collect();

        Ok(OrderDetail {
            id: order.id,
            user_id: order.user_id,
            total: order.total,
            created_at: order.created_at,
            user: None,
            items,
        })
    }

    pub async fn find_all(
        db: &DatabaseConnection,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<OrderDetail>, Pagination), ServiceError> {
        let total = orders::Entity::find().count(db).await?;

        let orders = orders::Entity::find()
            .order_by_desc(orders::Column::CreatedAt)
            .offset(pagination::skip(page, limit))
            .limit(limit)
            .all(db)
            .await?;

        let details = Self::assemble(db, orders).await?;
        Ok((details, pagination::paginate(page, limit, total)))
    }

    pub async fn find_by_id(db: &DatabaseConnection, id: &str) -> Result<OrderDetail, ServiceError> {
        let order_id =
            Uuid::parse_str(id).map_err(|_| ServiceError::NotFound("Order".to_string()))?;

        let order = orders::Entity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order".to_string()))?;

        let mut details = Self::assemble(db, vec![order]).await?;
        Ok(details.remove(0))
    }

    /// Aggregate read over the whole order history. Popularity counts
    /// order-item rows per genre; ties are broken by genre id ascending, so
    /// the smallest id wins "least popular" and the largest wins "most
    /// popular" among equal counts.
    pub async fn get_statistics(db: &DatabaseConnection) -> Result<OrderStatistics, ServiceError> {
        let orders = orders::Entity::find().all(db).await?;

        let total_orders = orders.len() as u64;
        let total_revenue: Decimal = orders.iter().map(|o| o.total).sum();
        let average_order_value = if total_orders > 0 {
            (total_revenue / Decimal::from(total_orders)).round_dp(2)
        } else {
            Decimal::ZERO
        };

        let items = order_items::Entity::find().all(db).await?;

        let book_genres: HashMap<Uuid, genres::Model> = books::Entity::find()
            .find_also_related(genres::Entity)
            .all(db)
            .await?
            .into_iter()
            .filter_map(|(book, genre)| genre.map(|g| (book.id, g)))
            .collect();

        let mut counts: BTreeMap<Uuid, (String, u64)> = BTreeMap::new();
        for item in &items {
            if let Some(genre) = book_genres.get(&item.book_id) {
                let entry = counts.entry(genre.id).or_insert((genre.name.clone(), 0));
                entry.1 += 1;
            }
        }

        let mut popularity: Vec<GenrePopularity> = counts
            .into_iter()
            .map(|(genre_id, (genre_name, order_count))| GenrePopularity {
                genre_id,
                genre_name,
                order_count,
            })
            .collect();
        popularity.sort_by(|a, b| {
            a.order_count
                .cmp(&b.order_count)
                .then_with(|| a.genre_id.cmp(&b.genre_id))
        });

        Ok(OrderStatistics {
            total_orders,
            total_revenue,
            average_order_value,
            least_popular_genre: popularity.first().cloned(),
            most_popular_genre: popularity.last().cloned(),
        })
    }

    /// Attach owning user, items, books and genres to a batch of orders.
    async fn assemble(
        db: &DatabaseConnection,
        orders: Vec<orders::Model>,
    ) -> Result<Vec<OrderDetail>, ServiceError> {
        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let user_ids: Vec<Uuid> = orders.iter().map(|o| o.user_id).collect();

        let user_map: HashMap<Uuid, users::Model> = users::Entity::find()
            .filter(users::Column::Id.is_in(user_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let items = order_items::Entity::find()
            .filter(order_items::Column::OrderId.is_in(order_ids))
            .all(db)
            .await?;

        let book_ids: Vec<Uuid> = items.iter().map(|i| i.book_id).collect();
        let book_map: HashMap<Uuid, (books::Model, Option<genres::Model>)> = books::Entity::find()
            .filter(books::Column::Id.is_in(book_ids))
            .find_also_related(genres::Entity)
            .all(db)
            .await?
            .into_iter()
            .map(|(book, genre)| (book.id, (book, genre)))
            .collect();

        let mut items_by_order: HashMap<Uuid, Vec<order_items::Model>> = HashMap::new();
        for item in items {
            items_by_order.entry(item.order_id).or_default().push(item);
        }

        let details = orders
            .into_iter()
            .map(|order| {
                let user = user_map.get(&order.user_id).map(|u| OrderUser {
                    id: u.id,
                    username: u.username.clone(),
                    email: u.email.clone(),
                });

                let items = items_by_order
                    .remove(&order.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|item| {
                        let book = book_map.get(&item.book_id).map(|(book, genre)| BookDetail {
                            book: book.clone(),
                            genre: genre.clone(),
                        });
                        OrderItemDetail {
                            id: item.id,
                            quantity: item.quantity,
                            book,
                        }
                    })
                    .collect();

                OrderDetail {
                    id: order.id,
                    user_id: order.user_id,
                    total: order.total,
                    created_at: order.created_at,
                    user,
                    items,
                }
            })
            .collect();

        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dto::OrderItemRequest;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn user_row() -> users::Model {
        users::Model {
            id: Uuid::new_v4(),
            email: "reader@example.com".to_string(),
            username: "reader".to_string(),
            password: "pbkdf2:sha256:260000$x$y".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn book_row(title: &str, price: Decimal, stock: i32) -> books::Model {
        books::Model {
            id: Uuid::new_v4(),
            title: title.to_string(),
            writer: "Anonymous".to_string(),
            publisher: "Acme Press".to_string(),
            publication_year: 2001,
            description: None,
            cover_url: None,
            condition: None,
            price,
            stock_quantity: stock,
            genre_id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn genre_row(id: Uuid, name: &str) -> genres::Model {
        genres::Model {
            id,
            name: name.to_string(),
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn cart(book_id: Uuid, quantity: i32) -> CreateOrderRequest {
        CreateOrderRequest {
            items: vec![OrderItemRequest {
                book_id: book_id.to_string(),
                quantity,
            }],
        }
    }

    #[tokio::test]
    async fn test_place_order_exact_stock_and_total() {
        // Book with stock 5 at 10000.00: ordering 5 yields total 50000.00
        let user = user_row();
        let user_id = user.id;
        let book = book_row("Dune", Decimal::new(1000000, 2), 5);
        let book_id = book.id;
        let genre = genre_row(book.genre_id, "Science Fiction");

        let order_row = orders::Model {
            id: Uuid::new_v4(),
            user_id,
            total: Decimal::new(5000000, 2),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user]])
            .append_query_results([vec![book]])
            .append_query_results([vec![order_row]])
            .append_exec_results([
                // order items insert
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                // stock decrement
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .append_query_results([vec![genre]])
            .into_connection();

        let order = OrdersService::create(&db, &user_id.to_string(), cart(book_id, 5))
            .await
            .unwrap();

        assert_eq!(order.total, Decimal::new(5000000, 2));
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 5);
        let book = order.items[0].book.as_ref().unwrap();
        assert_eq!(book.book.title, "Dune");
        assert_eq!(book.genre.as_ref().unwrap().name, "Science Fiction");
    }

    #[tokio::test]
    async fn test_place_order_insufficient_stock_names_the_book() {
        let user = user_row();
        let user_id = user.id;
        let book = book_row("Dune", Decimal::new(1000000, 2), 0);
        let book_id = book.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user]])
            .append_query_results([vec![book]])
            .into_connection();

        let result = OrdersService::create(&db, &user_id.to_string(), cart(book_id, 1)).await;

        match result {
            Err(ServiceError::InsufficientStock(title)) => assert_eq!(title, "Dune"),
            other => panic!("expected InsufficientStock, got {:?}", other.map(|o| o.id)),
        }
    }

    #[tokio::test]
    async fn test_place_order_duplicate_cart_lines_are_aggregated() {
        // Two lines of 3 for a stock-5 book is a demand of 6 and must fail
        let user = user_row();
        let user_id = user.id;
        let book = book_row("Dune", Decimal::new(1000000, 2), 5);
        let book_id = book.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user]])
            .append_query_results([vec![book]])
            .into_connection();

        let request = CreateOrderRequest {
            items: vec![
                OrderItemRequest {
                    book_id: book_id.to_string(),
                    quantity: 3,
                },
                OrderItemRequest {
                    book_id: book_id.to_string(),
                    quantity: 3,
                },
            ],
        };

        let result = OrdersService::create(&db, &user_id.to_string(), request).await;
        assert!(matches!(result, Err(ServiceError::InsufficientStock(_))));
    }

    #[tokio::test]
    async fn test_place_order_quantity_overflow_is_rejected() {
        // Two lines whose sum exceeds i32::MAX must fail cleanly instead of
        // wrapping negative and corrupting the stock check
        let user = user_row();
        let user_id = user.id;
        let book_id = Uuid::new_v4();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user]])
            .into_connection();

        let request = CreateOrderRequest {
            items: vec![
                OrderItemRequest {
                    book_id: book_id.to_string(),
                    quantity: i32::MAX,
                },
                OrderItemRequest {
                    book_id: book_id.to_string(),
                    quantity: 1,
                },
            ],
        };

        let result = OrdersService::create(&db, &user_id.to_string(), request).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_place_order_unknown_book_aborts() {
        let user = user_row();
        let user_id = user.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user]])
            .append_query_results([Vec::<books::Model>::new()])
            .into_connection();

        let result = OrdersService::create(&db, &user_id.to_string(), cart(Uuid::new_v4(), 1)).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_admin_identity_cannot_own_orders() {
        // Integer ids never reach the database: the UUID parse fails first
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = OrdersService::create(&db, "3", cart(Uuid::new_v4(), 1)).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_statistics_counts_and_tie_break() {
        let genre_a = genre_row(Uuid::new_v4(), "Fantasy");
        let genre_b = genre_row(Uuid::new_v4(), "Horror");

        let mut book_a = book_row("A", Decimal::new(1000, 2), 5);
        book_a.genre_id = genre_a.id;
        let mut book_b = book_row("B", Decimal::new(2000, 2), 5);
        book_b.genre_id = genre_b.id;

        let order = orders::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            total: Decimal::new(3000, 2),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let item = |book_id| order_items::Model {
            id: Uuid::new_v4(),
            order_id: order.id,
            book_id,
            quantity: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![order.clone()]])
            .append_query_results([vec![item(book_a.id), item(book_b.id)]])
            .append_query_results([vec![
                (book_a.clone(), genre_a.clone()),
                (book_b.clone(), genre_b.clone()),
            ]])
            .into_connection();

        let stats = OrdersService::get_statistics(&db).await.unwrap();

        assert_eq!(stats.total_orders, 1);
        assert_eq!(stats.total_revenue, Decimal::new(3000, 2));
        assert_eq!(stats.average_order_value, Decimal::new(3000, 2));

        // One item per genre: the tie is broken by genre id, smallest first
        let (low, high) = if genre_a.id < genre_b.id {
            (genre_a.id, genre_b.id)
        } else {
            (genre_b.id, genre_a.id)
        };
        assert_eq!(stats.least_popular_genre.unwrap().genre_id, low);
        assert_eq!(stats.most_popular_genre.unwrap().genre_id, high);
    }

    #[tokio::test]
    async fn test_statistics_empty_history() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<orders::Model>::new()])
            .append_query_results([Vec::<order_items::Model>::new()])
            .append_query_results([Vec::<(books::Model, genres::Model)>::new()])
            .into_connection();

        let stats = OrdersService::get_statistics(&db).await.unwrap();

        assert_eq!(stats.total_orders, 0);
        assert_eq!(stats.total_revenue, Decimal::ZERO);
        assert_eq!(stats.average_order_value, Decimal::ZERO);
        assert!(stats.most_popular_genre.is_none());
        assert!(stats.least_popular_genre.is_none());
    }
}
