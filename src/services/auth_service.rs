use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::dto::{AuthResponse, LoginRequest, RegisterRequest, UserPublic};
use crate::models::{admin_users, users};
use crate::utils::{jwt, password};

pub struct AuthService;

impl AuthService {
    /// Create a regular user account and log it in.
    pub async fn register(
        db: &DatabaseConnection,
        request: RegisterRequest,
    ) -> Result<AuthResponse, ServiceError> {
        // 1. Unique email and username
        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(&request.email))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        let existing = users::Entity::find()
            .filter(users::Column::Username.eq(&request.username))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "User with this username already exists".to_string(),
            ));
        }

        // 2. Hash the password
        let password_hash =
            password::hash_password(&request.password).map_err(ServiceError::Internal)?;

        // 3. Create the user
        let now = Utc::now();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(request.email),
            username: Set(request.username),
            password: Set(password_hash),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        // 4. Issue the token
        let token =
            jwt::generate_token(&user.id.to_string(), &user.email).map_err(ServiceError::Internal)?;

        Ok(AuthResponse {
            user: UserPublic::from(user),
            token,
        })
    }

    /// Authenticate a credential pair against both identity stores.
    ///
    /// A handle containing `@` is matched against the email column, anything
    /// else against username. The regular user store is checked first; if it
    /// has no row or the password does not verify there, the admin store is
    /// tried. Every failure collapses into the same `InvalidCredentials` so
    /// a caller cannot probe which store knows a handle.
    pub async fn login(
        db: &DatabaseConnection,
        request: LoginRequest,
    ) -> Result<AuthResponse, ServiceError> {
        let handle = request.email_or_username.trim();
        let by_email = handle.contains('@');

        // 1. Regular user store
        let user = if by_email {
            users::Entity::find()
                .filter(users::Column::Email.eq(handle))
                .one(db)
                .await?
        } else {
            users::Entity::find()
                .filter(users::Column::Username.eq(handle))
                .one(db)
                .await?
        };

        if let Some(user) = user {
            if password::verify_password(&request.password, &user.password).unwrap_or(false) {
                let token = jwt::generate_token(&user.id.to_string(), &user.email)
                    .map_err(ServiceError::Internal)?;
                return Ok(AuthResponse {
                    user: UserPublic::from(user),
                    token,
                });
            }
            // fall through to the admin store rather than failing here
        }

        // 2. Admin store
        let admin = if by_email {
            admin_users::Entity::find()
                .filter(admin_users::Column::Email.eq(handle))
                .one(db)
                .await?
        } else {
            admin_users::Entity::find()
                .filter(admin_users::Column::Username.eq(handle))
                .one(db)
                .await?
        };

        if let Some(admin) = admin {
            if password::verify_password(&request.password, &admin.password).unwrap_or(false) {
                let token = jwt::generate_token(&admin.id.to_string(), &admin.email)
                    .map_err(ServiceError::Internal)?;
                return Ok(AuthResponse {
                    user: UserPublic::from(admin),
                    token,
                });
            }
        }

        // 3. Neither store produced a verified match
        Err(ServiceError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::admin_users::Role;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn user_row(email: &str, username: &str, password_hash: &str) -> users::Model {
        users::Model {
            id: Uuid::new_v4(),
            email: email.to_string(),
            username: username.to_string(),
            password: password_hash.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn admin_row(email: &str, username: &str, password_hash: &str) -> admin_users::Model {
        admin_users::Model {
            id: 3,
            username: username.to_string(),
            email: email.to_string(),
            password: password_hash.to_string(),
            role: Role::Admin,
        }
    }

    #[tokio::test]
    async fn test_login_regular_user_by_email() {
        let hash = password::hash_password("hunter22").unwrap();
        let row = user_row("reader@example.com", "reader", &hash);
        let expected_id = row.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row]])
            .into_connection();

        let result = AuthService::login(
            &db,
            LoginRequest {
                email_or_username: "reader@example.com".to_string(),
                password: "hunter22".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(result.user.id, expected_id.to_string());
        assert!(result.user.role.is_none());

        // the token must round-trip to the same identity id
        let claims = jwt::verify_token(&result.token).unwrap();
        assert_eq!(claims.sub, expected_id.to_string());
    }

    #[tokio::test]
    async fn test_login_falls_through_to_admin_store() {
        let hash = password::hash_password("backoffice-pw").unwrap();

        // users store misses, admin store hits
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .append_query_results([vec![admin_row("boss@example.com", "boss", &hash)]])
            .into_connection();

        let result = AuthService::login(
            &db,
            LoginRequest {
                email_or_username: "boss@example.com".to_string(),
                password: "backoffice-pw".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(result.user.id, "3");
        assert_eq!(result.user.role, Some(Role::Admin));

        let claims = jwt::verify_token(&result.token).unwrap();
        assert_eq!(claims.sub, "3");
    }

    #[tokio::test]
    async fn test_wrong_password_in_admin_only_store_is_generic() {
        let hash = password::hash_password("right-password").unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .append_query_results([vec![admin_row("admin@x.com", "admin", &hash)]])
            .into_connection();

        let result = AuthService::login(
            &db,
            LoginRequest {
                email_or_username: "admin@x.com".to_string(),
                password: "wrong".to_string(),
            },
        )
        .await;

        // same error shape as an unknown handle, no store enumeration
        assert!(matches!(result, Err(ServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_unknown_handle_in_both_stores_is_generic() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .append_query_results([Vec::<admin_users::Model>::new()])
            .into_connection();

        let result = AuthService::login(
            &db,
            LoginRequest {
                email_or_username: "ghost".to_string(),
                password: "whatever".to_string(),
            },
        )
        .await;

        assert!(matches!(result, Err(ServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let hash = password::hash_password("irrelevant").unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user_row("taken@example.com", "someone", &hash)]])
            .into_connection();

        let result = AuthService::register(
            &db,
            RegisterRequest {
                email: "taken@example.com".to_string(),
                password: "password1".to_string(),
                username: "newcomer".to_string(),
            },
        )
        .await;

        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }
}
