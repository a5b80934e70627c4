// ============================================================================
// MODELS
// ============================================================================
//
// One SeaORM entity module per PostgreSQL table, plus the request/response
// DTOs in `dto`.
//
// Modules:
//   - users        : customer accounts (UUID-keyed)
//   - admin_users  : back-office accounts (integer-keyed, role column)
//   - genres       : book categories
//   - books        : catalog entries (price, stock, genre reference)
//   - orders       : immutable checkout records
//   - order_items  : order line entries (book + quantity, no price snapshot)
//   - favorites    : (user, book) bookmarks, unique per pair
//   - health       : health check response shape
//   - dto          : request validation and API response shapes
//
// The two identity tables are intentionally disjoint; resolution between
// them happens in middleware::auth by id shape.
//
// ============================================================================

pub mod admin_users;
pub mod books;
pub mod dto;
pub mod favorites;
pub mod genres;
pub mod health;
pub mod order_items;
pub mod orders;
pub mod users;
