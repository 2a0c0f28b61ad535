//! Water source entity access.
//!
//! Creation runs the duplicate-location guard and the insert inside one
//! transaction, so two simultaneous submissions for the same spot cannot
//! both pass the check.

use crate::constants::COORDINATE_TOLERANCE_DEGREES;
use crate::geo::Coordinate;
use crate::moderation::ModerationStatus;
use crate::orm::water_sources;
use chrono::Utc;
use sea_orm::{
    entity::*, query::*, ActiveValue::Set, DatabaseConnection, DbErr, QueryFilter, QueryOrder,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Failures of water source operations.
#[derive(Debug)]
pub enum SourceError {
    /// Latitude or longitude outside the WGS84 value ranges.
    InvalidCoordinate,
    /// Another source already exists within the coordinate tolerance.
    DuplicateLocation,
    /// No record matched the identifier.
    NotFound,
    Db(DbErr),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::InvalidCoordinate => write!(f, "Invalid coordinate"),
            SourceError::DuplicateLocation => {
                write!(f, "A water source already exists at this location")
            }
            SourceError::NotFound => write!(f, "Water source not found"),
            SourceError::Db(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for SourceError {}

impl From<DbErr> for SourceError {
    fn from(e: DbErr) -> Self {
        SourceError::Db(e)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateWaterSource {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 64))]
    pub source_type: String,
    pub latitude: f64,
    pub longitude: f64,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 255))]
    pub accessibility: Option<String>,
    #[validate(length(max = 255))]
    pub schedule: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(length(max = 120))]
    pub city: Option<String>,
    #[validate(length(max = 120))]
    pub country: Option<String>,
}

/// Admin edit payload. Only the provided fields change.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateWaterSource {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub source_type: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 255))]
    pub accessibility: Option<String>,
    #[validate(length(max = 255))]
    pub schedule: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(length(max = 120))]
    pub city: Option<String>,
    #[validate(length(max = 120))]
    pub country: Option<String>,
}

/// Creates a water source.
///
/// The duplicate-location guard counts every existing row, whatever its
/// status; a rejected source still blocks a new submission on the same
/// spot. `external_id` is set only by the geodata import.
pub async fn create(
    db: &DatabaseConnection,
    user_id: Option<i32>,
    input: &CreateWaterSource,
    status: ModerationStatus,
    external_id: Option<String>,
) -> Result<water_sources::Model, SourceError> {
    let coordinate = Coordinate::new(input.latitude, input.longitude)
        .ok_or(SourceError::InvalidCoordinate)?;

    let txn = db.begin().await?;

    let nearby = water_sources::Entity::find()
        .filter(
            water_sources::Column::Latitude.gt(coordinate.latitude - COORDINATE_TOLERANCE_DEGREES),
        )
        .filter(
            water_sources::Column::Latitude.lt(coordinate.latitude + COORDINATE_TOLERANCE_DEGREES),
        )
        .filter(
            water_sources::Column::Longitude
                .gt(coordinate.longitude - COORDINATE_TOLERANCE_DEGREES),
        )
        .filter(
            water_sources::Column::Longitude
                .lt(coordinate.longitude + COORDINATE_TOLERANCE_DEGREES),
        )
        .one(&txn)
        .await?;

    if nearby.is_some() {
        // Dropping the transaction rolls it back.
        return Err(SourceError::DuplicateLocation);
    }

    let now = Utc::now().naive_utc();
    let source = water_sources::ActiveModel {
        user_id: Set(user_id),
        name: Set(input.name.clone()),
        source_type: Set(input.source_type.clone()),
        latitude: Set(coordinate.latitude),
        longitude: Set(coordinate.longitude),
        description: Set(input.description.clone()),
        accessibility: Set(input.accessibility.clone()),
        schedule: Set(input.schedule.clone()),
        address: Set(input.address.clone()),
        city: Set(input.city.clone()),
        country: Set(input.country.clone()),
        is_external: Set(external_id.is_some()),
        external_id: Set(external_id),
        status: Set(status.as_str().to_owned()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    Ok(source)
}

/// Public listing: approved sources only.
pub async fn find_approved(db: &DatabaseConnection) -> Result<Vec<water_sources::Model>, DbErr> {
    water_sources::Entity::find()
        .filter(water_sources::Column::Status.eq(ModerationStatus::Approved.as_str()))
        .order_by_desc(water_sources::Column::CreatedAt)
        .all(db)
        .await
}

/// Admin listing: every source regardless of status.
pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<water_sources::Model>, DbErr> {
    water_sources::Entity::find()
        .order_by_desc(water_sources::Column::CreatedAt)
        .all(db)
        .await
}

/// Admin moderation queue.
pub async fn find_pending(db: &DatabaseConnection) -> Result<Vec<water_sources::Model>, DbErr> {
    water_sources::Entity::find()
        .filter(water_sources::Column::Status.eq(ModerationStatus::Pending.as_str()))
        .order_by_asc(water_sources::Column::CreatedAt)
        .all(db)
        .await
}

pub async fn find_by_id(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Option<water_sources::Model>, DbErr> {
    water_sources::Entity::find_by_id(id).one(db).await
}

/// True when an imported record with this external id already exists.
pub async fn external_id_exists(
    db: &DatabaseConnection,
    external_id: &str,
) -> Result<bool, DbErr> {
    let count = water_sources::Entity::find()
        .filter(water_sources::Column::ExternalId.eq(external_id))
        .limit(1)
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Admin edit. The duplicate-location guard applies to creation only.
pub async fn update(
    db: &DatabaseConnection,
    id: i32,
    input: &UpdateWaterSource,
) -> Result<water_sources::Model, SourceError> {
    let source = find_by_id(db, id).await?.ok_or(SourceError::NotFound)?;

    // Coordinates are validated as the merged pair so a latitude-only
    // edit cannot produce an out-of-range point.
    let latitude = input.latitude.unwrap_or(source.latitude);
    let longitude = input.longitude.unwrap_or(source.longitude);
    let coordinate =
        Coordinate::new(latitude, longitude).ok_or(SourceError::InvalidCoordinate)?;

    let mut active: water_sources::ActiveModel = source.into();
    if let Some(name) = &input.name {
        active.name = Set(name.clone());
    }
    if let Some(source_type) = &input.source_type {
        active.source_type = Set(source_type.clone());
    }
    active.latitude = Set(coordinate.latitude);
    active.longitude = Set(coordinate.longitude);
    if input.description.is_some() {
        active.description = Set(input.description.clone());
    }
    if input.accessibility.is_some() {
        active.accessibility = Set(input.accessibility.clone());
    }
    if input.schedule.is_some() {
        active.schedule = Set(input.schedule.clone());
    }
    if input.address.is_some() {
        active.address = Set(input.address.clone());
    }
    if input.city.is_some() {
        active.city = Set(input.city.clone());
    }
    if input.country.is_some() {
        active.country = Set(input.country.clone());
    }
    active.updated_at = Set(Utc::now().naive_utc());

    Ok(active.update(db).await?)
}

/// Admin delete.
pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<(), SourceError> {
    let result = water_sources::Entity::delete_many()
        .filter(water_sources::Column::Id.eq(id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(SourceError::NotFound);
    }
    Ok(())
}

/// A source's detail view: its fields merged with the approved reviews
/// and the aggregate rating derived from them. Recomputed on every read.
#[derive(Debug, Serialize)]
pub struct SourceDetail {
    #[serde(flatten)]
    pub source: water_sources::Model,
    pub reviews: Vec<crate::orm::reviews::Model>,
    pub average_rating: Option<f64>,
    pub total_reviews: i64,
}

pub async fn detail(db: &DatabaseConnection, id: i32) -> Result<Option<SourceDetail>, DbErr> {
    let source = match find_by_id(db, id).await? {
        Some(source) => source,
        None => return Ok(None),
    };

    let reviews = crate::review::approved_for_source(db, id).await?;
    let ratings: Vec<i32> = reviews.iter().map(|r| r.rating).collect();
    let summary = crate::review::summarize(&ratings);

    Ok(Some(SourceDetail {
        source,
        reviews,
        average_rating: summary.average_rating,
        total_reviews: summary.total_reviews,
    }))
}
