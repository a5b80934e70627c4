use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::errors::ServiceError;
use crate::models::admin_users;
use crate::models::dto::{CreateAdminUserRequest, UpdateAdminUserRequest};
use crate::utils::password;

/// Back-office account management. Every caller has already passed the
/// admin-role gate in the route layer.
pub struct AdminUsersService;

impl AdminUsersService {
    pub async fn list(db: &DatabaseConnection) -> Result<Vec<admin_users::Model>, ServiceError> {
        Ok(admin_users::Entity::find()
            .order_by_asc(admin_users::Column::Username)
            .all(db)
            .await?)
    }

    pub async fn find_by_id(
        db: &DatabaseConnection,
        id: i32,
    ) -> Result<admin_users::Model, ServiceError> {
        admin_users::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Admin user".to_string()))
    }

    pub async fn create(
        db: &DatabaseConnection,
        request: CreateAdminUserRequest,
    ) -> Result<admin_users::Model, ServiceError> {
        let clash = admin_users::Entity::find()
            .filter(
                admin_users::Column::Username
                    .eq(&request.username)
                    .or(admin_users::Column::Email.eq(&request.email)),
            )
            .one(db)
            .await?;
        if clash.is_some() {
            return Err(ServiceError::Conflict(
                "Admin user with this username or email already exists".to_string(),
            ));
        }

        let password_hash =
            password::hash_password(&request.password).map_err(ServiceError::Internal)?;

        let admin = admin_users::ActiveModel {
            username: Set(request.username),
            email: Set(request.email),
            password: Set(password_hash),
            role: Set(request.role),
            ..Default::default()
        }
        .insert(db)
        .await?;

        Ok(admin)
    }

    pub async fn update(
        db: &DatabaseConnection,
        id: i32,
        request: UpdateAdminUserRequest,
    ) -> Result<admin_users::Model, ServiceError> {
        let existing = Self::find_by_id(db, id).await?;

        let mut active: admin_users::ActiveModel = existing.into();
        if let Some(username) = request.username {
            active.username = Set(username);
        }
        if let Some(email) = request.email {
            active.email = Set(email);
        }
        if let Some(new_password) = request.password {
            let password_hash =
                password::hash_password(&new_password).map_err(ServiceError::Internal)?;
            active.password = Set(password_hash);
        }
        if let Some(role) = request.role {
            active.role = Set(role);
        }

        Ok(active.update(db).await?)
    }

    pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<(), ServiceError> {
        Self::find_by_id(db, id).await?;
        admin_users::Entity::delete_by_id(id).exec(db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::admin_users::Role;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_duplicate_username_or_email_is_conflict() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![admin_users::Model {
                id: 1,
                username: "boss".to_string(),
                email: "boss@example.com".to_string(),
                password: "pbkdf2:sha256:260000$x$y".to_string(),
                role: Role::Dewa,
            }]])
            .into_connection();

        let result = AdminUsersService::create(
            &db,
            CreateAdminUserRequest {
                username: "boss".to_string(),
                email: "other@example.com".to_string(),
                password: "password1".to_string(),
                role: Role::Admin,
            },
        )
        .await;

        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_find_missing_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<admin_users::Model>::new()])
            .into_connection();

        let result = AdminUsersService::find_by_id(&db, 42).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }
}
