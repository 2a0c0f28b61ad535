//! Photo entity access.
//!
//! Two read behaviors exist and must not be conflated: the by-source and
//! by-review listings are public attachment views and return approved
//! rows only, while the full listing (admin) and "my photos" (owner)
//! return rows regardless of status.

use crate::moderation::ModerationStatus;
use crate::orm::photos;
use chrono::Utc;
use sea_orm::{
    entity::*, query::*, ActiveValue::Set, DatabaseConnection, DbErr, QueryFilter, QueryOrder,
};
use std::fmt;

#[derive(Debug)]
pub enum PhotoError {
    NotFound,
    Db(DbErr),
}

impl fmt::Display for PhotoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoError::NotFound => write!(f, "Photo not found"),
            PhotoError::Db(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for PhotoError {}

impl From<DbErr> for PhotoError {
    fn from(e: DbErr) -> Self {
        PhotoError::Db(e)
    }
}

/// Records an uploaded photo in `pending` state. The file itself has
/// already been written to the storage backend.
pub async fn create(
    db: &DatabaseConnection,
    user_id: i32,
    water_source_id: Option<i32>,
    review_id: Option<i32>,
    filename: String,
    content_type: String,
    file_size: i64,
) -> Result<photos::Model, DbErr> {
    let photo = photos::ActiveModel {
        user_id: Set(Some(user_id)),
        water_source_id: Set(water_source_id),
        review_id: Set(review_id),
        filename: Set(filename),
        content_type: Set(content_type),
        file_size: Set(file_size),
        status: Set(ModerationStatus::Pending.as_str().to_owned()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };

    photo.insert(db).await
}

/// Admin listing: every photo regardless of status.
pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<photos::Model>, DbErr> {
    photos::Entity::find()
        .order_by_desc(photos::Column::CreatedAt)
        .all(db)
        .await
}

/// Owner listing: a user's own uploads, all statuses.
pub async fn find_for_user(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<photos::Model>, DbErr> {
    photos::Entity::find()
        .filter(photos::Column::UserId.eq(user_id))
        .order_by_desc(photos::Column::CreatedAt)
        .all(db)
        .await
}

/// Public attachment view: a source's approved photos.
pub async fn approved_for_source(
    db: &DatabaseConnection,
    source_id: i32,
) -> Result<Vec<photos::Model>, DbErr> {
    photos::Entity::find()
        .filter(photos::Column::WaterSourceId.eq(source_id))
        .filter(photos::Column::Status.eq(ModerationStatus::Approved.as_str()))
        .order_by_desc(photos::Column::CreatedAt)
        .all(db)
        .await
}

/// Public attachment view: a review's approved photos.
pub async fn approved_for_review(
    db: &DatabaseConnection,
    review_id: i32,
) -> Result<Vec<photos::Model>, DbErr> {
    photos::Entity::find()
        .filter(photos::Column::ReviewId.eq(review_id))
        .filter(photos::Column::Status.eq(ModerationStatus::Approved.as_str()))
        .order_by_desc(photos::Column::CreatedAt)
        .all(db)
        .await
}

/// Admin moderation queue.
pub async fn find_pending(db: &DatabaseConnection) -> Result<Vec<photos::Model>, DbErr> {
    photos::Entity::find()
        .filter(photos::Column::Status.eq(ModerationStatus::Pending.as_str()))
        .order_by_asc(photos::Column::CreatedAt)
        .all(db)
        .await
}

pub async fn find_by_id(db: &DatabaseConnection, id: i32) -> Result<Option<photos::Model>, DbErr> {
    photos::Entity::find_by_id(id).one(db).await
}

/// Removes the row. Callers decide whether the stored file goes too;
/// other rows may still reference the same content-hashed object.
pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<(), PhotoError> {
    let result = photos::Entity::delete_many()
        .filter(photos::Column::Id.eq(id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(PhotoError::NotFound);
    }
    Ok(())
}

/// True when another photo row still references the stored file.
pub async fn filename_in_use(db: &DatabaseConnection, filename: &str) -> Result<bool, DbErr> {
    let count = photos::Entity::find()
        .filter(photos::Column::Filename.eq(filename))
        .limit(1)
        .count(db)
        .await?;
    Ok(count > 0)
}
