//! Moderation status state machine.
//!
//! Water sources, reviews, and photos share one shape: records are created
//! `pending` and an admin moves them between `pending`, `approved`, and
//! `rejected`. The transition is a single unconditional "set status"
//! operation per entity; any status may be overwritten with any other
//! valid one. Reviews are the exception on input: once submitted they can
//! only be moderated forward, so `pending` is not an accepted target.
//!
//! Setting a status has no side effects beyond the row update. Approving
//! a water source does not touch its photos or reviews; each record is
//! moderated independently.

use crate::orm::{photos, reviews, water_sources};
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of moderation states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Pending => "pending",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Rejected => "rejected",
        }
    }

    /// Parses a wire value. Anything outside the closed set is None.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ModerationStatus::Pending),
            "approved" => Some(ModerationStatus::Approved),
            "rejected" => Some(ModerationStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures of the set-status operation.
#[derive(Debug)]
pub enum ModerationError {
    /// The target value is outside the accepted set for this entity.
    InvalidStatus(String),
    /// No record matched the identifier.
    NotFound,
    Db(DbErr),
}

impl fmt::Display for ModerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModerationError::InvalidStatus(value) => write!(f, "Invalid status value: {}", value),
            ModerationError::NotFound => write!(f, "Record not found"),
            ModerationError::Db(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for ModerationError {}

impl From<DbErr> for ModerationError {
    fn from(e: DbErr) -> Self {
        ModerationError::Db(e)
    }
}

/// Sets a water source's status to any value in the closed set.
///
/// All three entities report not-found when the identifier matches no
/// row; this is checked from the affected row count rather than a prior
/// read so the update stays a single statement.
pub async fn set_water_source_status(
    db: &DatabaseConnection,
    source_id: i32,
    target: &str,
) -> Result<ModerationStatus, ModerationError> {
    let status = ModerationStatus::parse(target)
        .ok_or_else(|| ModerationError::InvalidStatus(target.to_owned()))?;

    let result = water_sources::Entity::update_many()
        .col_expr(water_sources::Column::Status, Expr::value(status.as_str()))
        .col_expr(
            water_sources::Column::UpdatedAt,
            Expr::value(chrono::Utc::now().naive_utc()),
        )
        .filter(water_sources::Column::Id.eq(source_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(ModerationError::NotFound);
    }

    log::info!(
        "Water source {} status set to {}",
        source_id,
        status.as_str()
    );
    Ok(status)
}

/// Sets a review's status. Reviews can only be moderated forward out of
/// `pending`, so the accepted target set is `approved`/`rejected`.
pub async fn set_review_status(
    db: &DatabaseConnection,
    review_id: i32,
    target: &str,
) -> Result<ModerationStatus, ModerationError> {
    let status = ModerationStatus::parse(target)
        .filter(|s| *s != ModerationStatus::Pending)
        .ok_or_else(|| ModerationError::InvalidStatus(target.to_owned()))?;

    let result = reviews::Entity::update_many()
        .col_expr(reviews::Column::Status, Expr::value(status.as_str()))
        .filter(reviews::Column::Id.eq(review_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(ModerationError::NotFound);
    }

    log::info!("Review {} status set to {}", review_id, status.as_str());
    Ok(status)
}

/// Sets a photo's status to any value in the closed set.
pub async fn set_photo_status(
    db: &DatabaseConnection,
    photo_id: i32,
    target: &str,
) -> Result<ModerationStatus, ModerationError> {
    let status = ModerationStatus::parse(target)
        .ok_or_else(|| ModerationError::InvalidStatus(target.to_owned()))?;

    let result = photos::Entity::update_many()
        .col_expr(photos::Column::Status, Expr::value(status.as_str()))
        .filter(photos::Column::Id.eq(photo_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(ModerationError::NotFound);
    }

    log::info!("Photo {} status set to {}", photo_id, status.as_str());
    Ok(status)
}
