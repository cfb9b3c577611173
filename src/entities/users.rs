use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role. Administrators are exempt from login limiting.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "student")]
    #[default]
    Student,
}

impl UserType {
    #[must_use]
    pub const fn is_attempt_limited(self) -> bool {
        matches!(self, Self::Student)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Student => "student",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique, nullable)]
    pub email: Option<String>,

    pub first_name: String,

    pub last_name: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub user_type: UserType,

    pub is_active: bool,

    /// Successful-credential logins since the last reset.
    pub login_count: i32,

    pub max_logins_allowed: i32,

    /// Set only by the login guard; cleared only by a reset.
    pub disabled_by_login_limit: bool,

    #[sea_orm(nullable)]
    pub last_login_attempt: Option<DateTimeUtc>,

    #[sea_orm(nullable)]
    pub last_login: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::reactivation_requests::Entity")]
    ReactivationRequests,
}

impl Related<super::reactivation_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReactivationRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
