pub mod admin_users_service;
pub mod auth_service;
pub mod books_service;
pub mod favorites_service;
pub mod genres_service;
pub mod orders_service;
