/// Integration tests for the duplicate-location guard on water source
/// creation, and the approved/all listing split around moderation.
mod common;
use serial_test::serial;

use common::{database::*, fixtures::*};
use wellspring::moderation::{self, ModerationStatus};
use wellspring::water_source::{self, CreateWaterSource, SourceError};

fn input_at(name: &str, latitude: f64, longitude: f64) -> CreateWaterSource {
    CreateWaterSource {
        name: name.to_string(),
        source_type: "fountain".to_string(),
        latitude,
        longitude,
        description: None,
        accessibility: None,
        schedule: None,
        address: None,
        city: None,
        country: None,
    }
}

#[actix_rt::test]
#[serial]
async fn test_nearby_submission_is_rejected() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user_a = create_test_user(&db, "user_a", "password123")
        .await
        .expect("Failed to create user A");
    let user_b = create_test_user(&db, "user_b", "password123")
        .await
        .expect("Failed to create user B");

    let first = water_source::create(
        &db,
        Some(user_a.id),
        &input_at("First fountain", 40.000000, -3.000000),
        ModerationStatus::Pending,
        None,
    )
    .await
    .expect("First submission should succeed");
    assert_eq!(first.status, "pending");

    // Within the 1e-4 degree tolerance on both axes.
    let result = water_source::create(
        &db,
        Some(user_b.id),
        &input_at("Second fountain", 40.000005, -3.000005),
        ModerationStatus::Pending,
        None,
    )
    .await;
    assert!(matches!(result, Err(SourceError::DuplicateLocation)));

    // Outside the tolerance; succeeds.
    water_source::create(
        &db,
        Some(user_b.id),
        &input_at("Distant fountain", 40.01, -3.01),
        ModerationStatus::Pending,
        None,
    )
    .await
    .expect("Distant submission should succeed");

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_one_close_axis_is_not_a_duplicate() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "user_a", "password123")
        .await
        .expect("Failed to create user");

    water_source::create(
        &db,
        Some(user.id),
        &input_at("First", 40.0, -3.0),
        ModerationStatus::Pending,
        None,
    )
    .await
    .expect("First submission should succeed");

    // Same latitude, longitude well clear of the tolerance.
    water_source::create(
        &db,
        Some(user.id),
        &input_at("East", 40.0, -2.9),
        ModerationStatus::Pending,
        None,
    )
    .await
    .expect("Submission with one distant axis should succeed");

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_rejected_rows_still_block_nearby_submissions() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "user_a", "password123")
        .await
        .expect("Failed to create user");

    let source = water_source::create(
        &db,
        Some(user.id),
        &input_at("Doomed fountain", 41.0, 2.0),
        ModerationStatus::Pending,
        None,
    )
    .await
    .expect("Submission should succeed");

    moderation::set_water_source_status(&db, source.id, "rejected")
        .await
        .expect("Failed to reject source");

    // The guard counts rows of every status.
    let result = water_source::create(
        &db,
        Some(user.id),
        &input_at("Retry fountain", 41.00005, 2.00005),
        ModerationStatus::Pending,
        None,
    )
    .await;
    assert!(matches!(result, Err(SourceError::DuplicateLocation)));

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_out_of_range_coordinates_are_rejected() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "user_a", "password123")
        .await
        .expect("Failed to create user");

    let result = water_source::create(
        &db,
        Some(user.id),
        &input_at("Nowhere", 95.0, 0.0),
        ModerationStatus::Pending,
        None,
    )
    .await;
    assert!(matches!(result, Err(SourceError::InvalidCoordinate)));

    let result = water_source::create(
        &db,
        Some(user.id),
        &input_at("Nowhere", 0.0, -181.0),
        ModerationStatus::Pending,
        None,
    )
    .await;
    assert!(matches!(result, Err(SourceError::InvalidCoordinate)));

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_approval_controls_public_listing_membership() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "user_a", "password123")
        .await
        .expect("Failed to create user");

    let source = water_source::create(
        &db,
        Some(user.id),
        &input_at("Plaza fountain", 40.0, -3.0),
        ModerationStatus::Pending,
        None,
    )
    .await
    .expect("Submission should succeed");

    // Pending: visible in the admin listing, absent from the public one.
    let all = water_source::find_all(&db).await.expect("find_all failed");
    assert!(all.iter().any(|s| s.id == source.id));
    let approved = water_source::find_approved(&db)
        .await
        .expect("find_approved failed");
    assert!(!approved.iter().any(|s| s.id == source.id));

    moderation::set_water_source_status(&db, source.id, "approved")
        .await
        .expect("Failed to approve source");

    let approved = water_source::find_approved(&db)
        .await
        .expect("find_approved failed");
    assert!(approved.iter().any(|s| s.id == source.id));

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
