//! Test fixtures for creating test data
#![allow(dead_code)]
#![allow(clippy::needless_update)]

use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use chrono::Utc;
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};
use wellspring::moderation::ModerationStatus;
use wellspring::orm::{photos, reviews, users, water_sources};

/// Test user fixture
pub struct TestUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password: String, // Plain text password for testing
}

async fn insert_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
    role: users::Role,
) -> Result<TestUser, DbErr> {
    // Hash the password using the same argon2 instance that login uses
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = wellspring::session::get_argon2()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbErr::Custom(format!("Password hashing failed: {}", e)))?
        .to_string();

    let email = format!("{}@test.com", username);
    let now = Utc::now().naive_utc();

    let user = users::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email.clone()),
        password: Set(password_hash),
        role: Set(role),
        failed_login_attempts: Set(0),
        locked_until: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let user_model = user.insert(db).await?;

    Ok(TestUser {
        id: user_model.id,
        username: username.to_string(),
        email,
        password: password.to_string(),
    })
}

/// Create a test user with known credentials
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<TestUser, DbErr> {
    insert_user(db, username, password, users::Role::User).await
}

/// Create a test admin with known credentials
pub async fn create_admin_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<TestUser, DbErr> {
    insert_user(db, username, password, users::Role::Admin).await
}

/// Create a test water source at the given coordinate
pub async fn create_test_source(
    db: &DatabaseConnection,
    user_id: Option<i32>,
    name: &str,
    latitude: f64,
    longitude: f64,
    status: ModerationStatus,
) -> Result<water_sources::Model, DbErr> {
    let now = Utc::now().naive_utc();
    let source = water_sources::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.to_string()),
        source_type: Set("fountain".to_string()),
        latitude: Set(latitude),
        longitude: Set(longitude),
        description: Set(Some("Test water source".to_string())),
        is_external: Set(false),
        external_id: Set(None),
        status: Set(status.as_str().to_owned()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    source.insert(db).await
}

/// Create a test review
pub async fn create_test_review(
    db: &DatabaseConnection,
    source_id: i32,
    user_id: i32,
    rating: i32,
    status: ModerationStatus,
) -> Result<reviews::Model, DbErr> {
    let review = reviews::ActiveModel {
        water_source_id: Set(source_id),
        user_id: Set(Some(user_id)),
        rating: Set(rating),
        comment: Set("Test review".to_string()),
        status: Set(status.as_str().to_owned()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    review.insert(db).await
}

/// Create a test photo record (no actual file behind it)
pub async fn create_test_photo(
    db: &DatabaseConnection,
    user_id: i32,
    source_id: Option<i32>,
    review_id: Option<i32>,
    status: ModerationStatus,
) -> Result<photos::Model, DbErr> {
    let photo = photos::ActiveModel {
        user_id: Set(Some(user_id)),
        water_source_id: Set(source_id),
        review_id: Set(review_id),
        filename: Set(format!("{}.jpg", blake3::hash(b"test photo").to_hex())),
        content_type: Set("image/jpeg".to_string()),
        file_size: Set(1024),
        status: Set(status.as_str().to_owned()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    photo.insert(db).await
}
