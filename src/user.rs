use crate::orm::users;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr};
use serde::Serialize;

/// Base URL fragment for resource.
pub static RESOURCE_URL: &str = "users";

/// Public view of a user account. Never carries the password hash; this
/// is the shape handed to handlers and serialized into responses.
#[derive(Clone, Debug, Serialize)]
pub struct Profile {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: users::Role,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: chrono::NaiveDateTime,
}

impl From<users::Model> for Profile {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            bio: user.bio,
            avatar_url: user.avatar_url,
            created_at: user.created_at,
        }
    }
}

impl Profile {
    /// Returns the profile for a user id, or None when no account exists.
    pub async fn get_by_id(db: &DatabaseConnection, id: i32) -> Result<Option<Self>, DbErr> {
        Ok(users::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(Profile::from))
    }

    pub fn is_admin(&self) -> bool {
        self.role == users::Role::Admin
    }
}

/// Full account row by email, for credential checks.
pub async fn find_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(db)
        .await
}

/// True when the email is already registered. The uniqueness pre-check
/// run before every account insert.
pub async fn email_taken(db: &DatabaseConnection, email: &str) -> Result<bool, DbErr> {
    let count = users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .limit(1)
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Deletes an account. Rows owned by the user keep existing; their user
/// reference is nulled by the schema's SET NULL rules rather than
/// cascading deletes.
pub async fn delete_account(db: &DatabaseConnection, user_id: i32) -> Result<bool, DbErr> {
    let result = users::Entity::delete_many()
        .filter(users::Column::Id.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}
