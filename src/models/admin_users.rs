use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Back-office accounts. Integer-keyed for legacy reasons, structurally
/// separate from the `users` table. Identity resolution disambiguates the
/// two stores by id shape (UUID vs integer).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admin_users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Role,
}

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Role {
    #[sea_orm(string_value = "User")]
    User,
    #[sea_orm(string_value = "Admin")]
    Admin,
    #[sea_orm(string_value = "Presiden")]
    Presiden,
    #[sea_orm(string_value = "Dewa")]
    Dewa,
}

impl Role {
    /// Admin, Presiden and Dewa are the standing definition of "admin-capable".
    pub fn is_admin_capable(&self) -> bool {
        matches!(self, Role::Admin | Role::Presiden | Role::Dewa)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
