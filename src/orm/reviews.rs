//! SeaORM Entity for reviews table

use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub water_source_id: i32,
    /// Authoring user. NULL after account removal.
    pub user_id: Option<i32>,
    pub rating: i32,
    pub comment: String,
    pub status: String,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::water_sources::Entity",
        from = "Column::WaterSourceId",
        to = "super::water_sources::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    WaterSource,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    User,
    #[sea_orm(has_many = "super::photos::Entity")]
    Photos,
}

impl Related<super::water_sources::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WaterSource.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::photos::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Photos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
