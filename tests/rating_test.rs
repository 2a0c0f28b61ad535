/// Integration tests for the aggregate rating rule: only approved reviews
/// count, the mean is rounded to two decimals, and zero approved reviews
/// yield a null average rather than zero.
mod common;
use serial_test::serial;

use common::{database::*, fixtures::*};
use wellspring::moderation::{self, ModerationStatus};
use wellspring::water_source;

#[actix_rt::test]
#[serial]
async fn test_pending_reviews_do_not_count() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "reviewer", "password123")
        .await
        .expect("Failed to create user");
    let source = create_test_source(&db, Some(user.id), "Fountain", 40.0, -3.0, ModerationStatus::Approved)
        .await
        .expect("Failed to create source");

    let five = create_test_review(&db, source.id, user.id, 5, ModerationStatus::Pending)
        .await
        .expect("Failed to create review");
    create_test_review(&db, source.id, user.id, 3, ModerationStatus::Pending)
        .await
        .expect("Failed to create review");

    let detail = water_source::detail(&db, source.id)
        .await
        .expect("detail failed")
        .expect("source should exist");
    assert_eq!(detail.average_rating, None);
    assert_eq!(detail.total_reviews, 0);
    assert!(detail.reviews.is_empty());

    // Approve the rating=5 review only.
    moderation::set_review_status(&db, five.id, "approved")
        .await
        .expect("Failed to approve review");

    let detail = water_source::detail(&db, source.id)
        .await
        .expect("detail failed")
        .expect("source should exist");
    assert_eq!(detail.average_rating, Some(5.0));
    assert_eq!(detail.total_reviews, 1);
    assert_eq!(detail.reviews.len(), 1);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_average_updates_as_reviews_are_approved() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "reviewer", "password123")
        .await
        .expect("Failed to create user");
    let source = create_test_source(&db, Some(user.id), "Fountain", 40.0, -3.0, ModerationStatus::Approved)
        .await
        .expect("Failed to create source");

    let five = create_test_review(&db, source.id, user.id, 5, ModerationStatus::Pending)
        .await
        .expect("Failed to create review");
    let three = create_test_review(&db, source.id, user.id, 3, ModerationStatus::Pending)
        .await
        .expect("Failed to create review");

    moderation::set_review_status(&db, five.id, "approved")
        .await
        .expect("Failed to approve review");
    moderation::set_review_status(&db, three.id, "approved")
        .await
        .expect("Failed to approve review");

    let detail = water_source::detail(&db, source.id)
        .await
        .expect("detail failed")
        .expect("source should exist");
    assert_eq!(detail.average_rating, Some(4.0));
    assert_eq!(detail.total_reviews, 2);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_average_is_rounded_to_two_decimals() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "reviewer", "password123")
        .await
        .expect("Failed to create user");
    let source = create_test_source(&db, Some(user.id), "Fountain", 40.0, -3.0, ModerationStatus::Approved)
        .await
        .expect("Failed to create source");

    for rating in [5, 4, 1] {
        create_test_review(&db, source.id, user.id, rating, ModerationStatus::Approved)
            .await
            .expect("Failed to create review");
    }

    // 10 / 3 = 3.333... -> 3.33
    let detail = water_source::detail(&db, source.id)
        .await
        .expect("detail failed")
        .expect("source should exist");
    assert_eq!(detail.average_rating, Some(3.33));
    assert_eq!(detail.total_reviews, 3);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_rejected_and_foreign_reviews_are_excluded() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "reviewer", "password123")
        .await
        .expect("Failed to create user");
    let source = create_test_source(&db, Some(user.id), "Fountain", 40.0, -3.0, ModerationStatus::Approved)
        .await
        .expect("Failed to create source");
    let other = create_test_source(&db, Some(user.id), "Other fountain", 41.0, -3.0, ModerationStatus::Approved)
        .await
        .expect("Failed to create source");

    create_test_review(&db, source.id, user.id, 4, ModerationStatus::Approved)
        .await
        .expect("Failed to create review");
    create_test_review(&db, source.id, user.id, 1, ModerationStatus::Rejected)
        .await
        .expect("Failed to create review");
    create_test_review(&db, other.id, user.id, 1, ModerationStatus::Approved)
        .await
        .expect("Failed to create review");

    let detail = water_source::detail(&db, source.id)
        .await
        .expect("detail failed")
        .expect("source should exist");
    assert_eq!(detail.average_rating, Some(4.0));
    assert_eq!(detail.total_reviews, 1);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_review_creation_validates_rating_and_source() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "reviewer", "password123")
        .await
        .expect("Failed to create user");
    let source = create_test_source(&db, Some(user.id), "Fountain", 40.0, -3.0, ModerationStatus::Approved)
        .await
        .expect("Failed to create source");

    let result = wellspring::review::create(&db, source.id, user.id, 0, "Bad".to_string()).await;
    assert!(matches!(
        result,
        Err(wellspring::review::ReviewError::InvalidRating)
    ));

    let result = wellspring::review::create(&db, source.id, user.id, 6, "Bad".to_string()).await;
    assert!(matches!(
        result,
        Err(wellspring::review::ReviewError::InvalidRating)
    ));

    let result = wellspring::review::create(&db, 9999, user.id, 4, "Ghost".to_string()).await;
    assert!(matches!(
        result,
        Err(wellspring::review::ReviewError::SourceNotFound)
    ));

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
