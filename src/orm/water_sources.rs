//! SeaORM Entity for water_sources table

use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "water_sources")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Submitting user. NULL for imported records and after account removal.
    pub user_id: Option<i32>,
    pub name: String,
    pub source_type: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    pub accessibility: Option<String>,
    pub schedule: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    /// True for records imported from a third-party geodata source.
    pub is_external: bool,
    /// Stable identifier within the external dataset, e.g. "node/123".
    pub external_id: Option<String>,
    pub status: String,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    User,
    #[sea_orm(has_many = "super::reviews::Entity")]
    Reviews,
    #[sea_orm(has_many = "super::photos::Entity")]
    Photos,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::photos::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Photos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
