//! Review entity access and the aggregate rating rule.
//!
//! Reviews start `pending` and are never edited in place; the only
//! mutation after creation is admin moderation. Only approved reviews
//! are publicly listed or counted toward a source's rating.

use crate::constants::{RATING_MAX, RATING_MIN};
use crate::moderation::ModerationStatus;
use crate::orm::{reviews, water_sources};
use chrono::Utc;
use sea_orm::{
    entity::*, query::*, ActiveValue::Set, DatabaseConnection, DbErr, QueryFilter, QueryOrder,
};
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub enum ReviewError {
    /// Rating outside the accepted 1..=5 range.
    InvalidRating,
    /// The reviewed water source does not exist.
    SourceNotFound,
    /// No review matched the identifier.
    NotFound,
    Db(DbErr),
}

impl fmt::Display for ReviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewError::InvalidRating => {
                write!(f, "Rating must be between {} and {}", RATING_MIN, RATING_MAX)
            }
            ReviewError::SourceNotFound => write!(f, "Water source not found"),
            ReviewError::NotFound => write!(f, "Review not found"),
            ReviewError::Db(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for ReviewError {}

impl From<DbErr> for ReviewError {
    fn from(e: DbErr) -> Self {
        ReviewError::Db(e)
    }
}

/// Creates a review in `pending` state.
pub async fn create(
    db: &DatabaseConnection,
    source_id: i32,
    user_id: i32,
    rating: i32,
    comment: String,
) -> Result<reviews::Model, ReviewError> {
    if !(RATING_MIN..=RATING_MAX).contains(&rating) {
        return Err(ReviewError::InvalidRating);
    }

    let source_exists = water_sources::Entity::find_by_id(source_id)
        .one(db)
        .await?
        .is_some();
    if !source_exists {
        return Err(ReviewError::SourceNotFound);
    }

    let review = reviews::ActiveModel {
        water_source_id: Set(source_id),
        user_id: Set(Some(user_id)),
        rating: Set(rating),
        comment: Set(comment),
        status: Set(ModerationStatus::Pending.as_str().to_owned()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };

    Ok(review.insert(db).await?)
}

/// Public listing: a source's approved reviews, newest first.
pub async fn approved_for_source(
    db: &DatabaseConnection,
    source_id: i32,
) -> Result<Vec<reviews::Model>, DbErr> {
    reviews::Entity::find()
        .filter(reviews::Column::WaterSourceId.eq(source_id))
        .filter(reviews::Column::Status.eq(ModerationStatus::Approved.as_str()))
        .order_by_desc(reviews::Column::CreatedAt)
        .all(db)
        .await
}

/// Admin moderation queue.
pub async fn find_pending(db: &DatabaseConnection) -> Result<Vec<reviews::Model>, DbErr> {
    reviews::Entity::find()
        .filter(reviews::Column::Status.eq(ModerationStatus::Pending.as_str()))
        .order_by_asc(reviews::Column::CreatedAt)
        .all(db)
        .await
}

pub async fn find_by_id(db: &DatabaseConnection, id: i32) -> Result<Option<reviews::Model>, DbErr> {
    reviews::Entity::find_by_id(id).one(db).await
}

/// Admin delete. The aggregate needs no correction since it is derived
/// on read.
pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<(), ReviewError> {
    let result = reviews::Entity::delete_many()
        .filter(reviews::Column::Id.eq(id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(ReviewError::NotFound);
    }
    Ok(())
}

/// Aggregate rating for a set of approved reviews.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingSummary {
    /// Mean rating rounded to two decimals; None with zero approved
    /// reviews rather than zero.
    pub average_rating: Option<f64>,
    pub total_reviews: i64,
}

/// Computes the aggregate: arithmetic mean rounded to 2 decimal places.
pub fn summarize(ratings: &[i32]) -> RatingSummary {
    if ratings.is_empty() {
        return RatingSummary {
            average_rating: None,
            total_reviews: 0,
        };
    }

    let sum: i64 = ratings.iter().map(|&r| r as i64).sum();
    let mean = sum as f64 / ratings.len() as f64;
    RatingSummary {
        average_rating: Some((mean * 100.0).round() / 100.0),
        total_reviews: ratings.len() as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_reviews_means_no_average() {
        let summary = summarize(&[]);
        assert_eq!(summary.average_rating, None);
        assert_eq!(summary.total_reviews, 0);
    }

    #[test]
    fn single_review_is_its_own_average() {
        let summary = summarize(&[5]);
        assert_eq!(summary.average_rating, Some(5.0));
        assert_eq!(summary.total_reviews, 1);
    }

    #[test]
    fn mean_of_two() {
        let summary = summarize(&[5, 3]);
        assert_eq!(summary.average_rating, Some(4.0));
        assert_eq!(summary.total_reviews, 2);
    }

    #[test]
    fn rounds_to_two_decimals() {
        // 5/3 = 1.666... -> 1.67
        assert_eq!(summarize(&[1, 2, 2]).average_rating, Some(1.67));
        // 10/3 = 3.333... -> 3.33
        assert_eq!(summarize(&[5, 4, 1]).average_rating, Some(3.33));
        assert_eq!(summarize(&[1, 1, 1, 2]).average_rating, Some(1.25));
    }
}
