use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A single-use password-reset code. Only the most recently created unused,
/// unexpired row for a user is considered valid at verification time; older
/// rows are implicitly superseded, never deleted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "otps")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    #[serde(skip_serializing)]
    pub otp_hash: String,
    #[sea_orm(column_type = "String(StringLen::N(30))")]
    pub purpose: String,
    pub used: bool,
    pub expires_at: DateTime,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
