use actix_web::{HttpResponse, get, post, web};
use sea_orm::DatabaseConnection;
use validator::Validate;

use crate::errors::ServiceError;
use crate::middleware::AuthUser;
use crate::models::dto::{CreateOrderRequest, PaginationQuery};
use crate::services::orders_service::OrdersService;
use crate::utils::pagination;

/// POST /transactions - Place an order from the caller's cart (PROTECTED)
#[post("")]
pub async fn create_order(
    auth_user: AuthUser,
    body: web::Json<CreateOrderRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    body.validate()?;

    let order = OrdersService::create(db.get_ref(), &auth_user.id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(order))
}

/// GET /transactions - All orders, paged (ADMIN)
#[get("")]
pub async fn list_orders(
    auth_user: AuthUser,
    query: web::Query<PaginationQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    auth_user.require_admin()?;

    let (page, limit) = pagination::normalize(query.page, query.limit);
    let (orders, pagination) = OrdersService::find_all(db.get_ref(), page, limit).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "orders": orders,
        "pagination": pagination,
    })))
}

/// GET /transactions/statistics - Revenue and genre popularity (ADMIN)
#[get("/statistics")]
pub async fn get_statistics(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    auth_user.require_admin()?;

    let statistics = OrdersService::get_statistics(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(statistics))
}

/// GET /transactions/{id} - Single order with receipt details (ADMIN)
#[get("/{order_id}")]
pub async fn get_order(
    auth_user: AuthUser,
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ServiceError> {
    auth_user.require_admin()?;

    let order = OrdersService::find_by_id(db.get_ref(), &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

pub fn transaction_routes(cfg: &mut web::ServiceConfig) {
    // /statistics must register before the {order_id} catch-all
    cfg.service(
        web::scope("/transactions")
            .service(create_order)
            .service(list_orders)
            .service(get_statistics)
            .service(get_order),
    );
}
