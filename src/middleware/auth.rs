use actix_web::{Error, FromRequest, HttpRequest, dev::Payload, web};
use futures::future::LocalBoxFuture;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::admin_users::{self, Role};
use crate::models::users;
use crate::utils::jwt;

/// The authenticated caller, extracted from the bearer token on protected
/// routes. `id` is a UUID string for regular users and a stringified
/// integer for admin accounts; `role` is present only for the latter.
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.map(|r| r.is_admin_capable()).unwrap_or(false)
    }

    /// Authorization gate for admin-only endpoints.
    pub fn require_admin(&self) -> Result<(), ServiceError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "Only users with Admin, Presiden, or Dewa role can access this resource"
                    .to_string(),
            ))
        }
    }

    /// The caller's id as a UUID, when it belongs to the regular user store.
    pub fn regular_user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.id).ok()
    }
}

/// Map a token subject back to a live identity. The id shape picks the
/// store: canonical UUID means the `users` table, an integer means
/// `admin_users`. A missing row means the identity was deleted after the
/// token was issued; tokens are not proactively revoked, so this is the
/// only staleness check.
pub async fn resolve_identity(
    db: &DatabaseConnection,
    subject: &str,
) -> Result<AuthUser, ServiceError> {
    if let Ok(user_id) = Uuid::parse_str(subject) {
        let user = users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or(ServiceError::InvalidToken)?;

        return Ok(AuthUser {
            id: user.id.to_string(),
            email: user.email,
            username: user.username,
            role: None,
        });
    }

    let admin_id = subject
        .parse::<i32>()
        .map_err(|_| ServiceError::InvalidToken)?;

    let admin = admin_users::Entity::find_by_id(admin_id)
        .one(db)
        .await?
        .ok_or(ServiceError::InvalidToken)?;

    Ok(AuthUser {
        id: admin.id.to_string(),
        email: admin.email,
        username: admin.username,
        role: Some(admin.role),
    })
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let header = req.headers().get("Authorization")?.to_str().ok()?;
    header
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}

impl FromRequest for AuthUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let token = bearer_token(&req).ok_or(ServiceError::InvalidToken)?;

            let claims = jwt::verify_token(&token).map_err(|_| ServiceError::InvalidToken)?;

            let db = req
                .app_data::<web::Data<DatabaseConnection>>()
                .ok_or_else(|| {
                    ServiceError::Internal("Database connection not configured".to_string())
                })?;

            let identity = resolve_identity(db.get_ref(), &claims.sub).await?;
            Ok(identity)
        })
    }
}
