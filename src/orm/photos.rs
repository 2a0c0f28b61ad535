//! SeaORM Entity for photos table

use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "photos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Uploading user. NULL after account removal.
    pub user_id: Option<i32>,
    /// Optional attachment targets. Both may be NULL; attaching to both a
    /// source and a review at once is structurally allowed.
    pub water_source_id: Option<i32>,
    pub review_id: Option<i32>,
    /// Content-hash derived filename within the storage backend.
    pub filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub status: String,
    pub created_at: chrono::NaiveDateTime,
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
    #[sea_orm(
        belongs_to = "super::water_sources::Entity",
        from = "Column::WaterSourceId",
        to = "super::water_sources::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    WaterSource,
    #[sea_orm(
        belongs_to = "super::reviews::Entity",
        from = "Column::ReviewId",
        to = "super::reviews::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Review,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::water_sources::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WaterSource.def()
    }
}

impl Related<super::reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
