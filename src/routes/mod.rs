pub mod admin_users;
pub mod auth;
pub mod books;
pub mod favorites;
pub mod genres;
pub mod health;
pub mod transactions;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health_check)
        .configure(auth::auth_routes)
        .configure(books::books_routes)
        .configure(genres::genre_routes)
        .configure(transactions::transaction_routes)
        .configure(favorites::favorites_routes)
        .configure(admin_users::admin_users_routes);
}
