//! Account self-service endpoints.

use crate::middleware::ClientCtx;
use crate::orm::users;
use crate::session::get_argon2;
use crate::user::Profile;
use actix_web::web::Data;
use actix_web::{delete, error, get, patch, post, web, Error, HttpResponse};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordVerifier, SaltString},
    PasswordHasher,
};
use chrono::Utc;
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_me)
        .service(update_me)
        .service(change_password)
        .service(delete_me);
}

#[derive(Serialize)]
struct AccountResponse {
    user: Profile,
}

#[get("/api/users/me")]
async fn view_me(client: ClientCtx) -> Result<HttpResponse, Error> {
    client.require_login()?;
    let user = client
        .get_user()
        .cloned()
        .ok_or_else(|| error::ErrorUnauthorized("Login required"))?;

    Ok(HttpResponse::Ok().json(AccountResponse { user }))
}

#[derive(Deserialize, Validate)]
struct UpdateProfileForm {
    #[validate(length(min = 3, max = 32))]
    username: Option<String>,
    #[validate(length(max = 1000))]
    bio: Option<String>,
    #[validate(length(max = 255))]
    avatar_url: Option<String>,
}

#[patch("/api/users/me")]
async fn update_me(
    client: ClientCtx,
    db: Data<DatabaseConnection>,
    form: web::Json<UpdateProfileForm>,
) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;

    form.validate()
        .map_err(|e| error::ErrorBadRequest(format!("Invalid profile data: {}", e)))?;

    let user = users::Entity::find_by_id(user_id)
        .one(db.get_ref())
        .await
        .map_err(super::db_error)?
        .ok_or_else(|| error::ErrorNotFound("User not found"))?;

    let mut active: users::ActiveModel = user.into();
    if let Some(username) = &form.username {
        active.username = Set(username.trim().to_owned());
    }
    if form.bio.is_some() {
        active.bio = Set(form.bio.clone());
    }
    if form.avatar_url.is_some() {
        active.avatar_url = Set(form.avatar_url.clone());
    }
    active.updated_at = Set(Utc::now().naive_utc());

    let user = active
        .update(db.get_ref())
        .await
        .map_err(super::db_error)?;

    Ok(HttpResponse::Ok().json(AccountResponse {
        user: Profile::from(user),
    }))
}

#[derive(Deserialize, Validate)]
struct ChangePasswordForm {
    current_password: String,
    #[validate(length(min = 8, max = 1000))]
    new_password: String,
}

#[post("/api/users/me/password")]
async fn change_password(
    client: ClientCtx,
    db: Data<DatabaseConnection>,
    form: web::Json<ChangePasswordForm>,
) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;

    form.validate()
        .map_err(|e| error::ErrorBadRequest(format!("Invalid password data: {}", e)))?;

    let user = users::Entity::find_by_id(user_id)
        .one(db.get_ref())
        .await
        .map_err(super::db_error)?
        .ok_or_else(|| error::ErrorNotFound("User not found"))?;

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|_| error::ErrorInternalServerError("Stored credentials are unreadable"))?;
    if get_argon2()
        .verify_password(form.current_password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(error::ErrorBadRequest("Current password is incorrect"));
    }

    let new_hash = get_argon2()
        .hash_password(
            form.new_password.as_bytes(),
            &SaltString::generate(&mut OsRng),
        )
        .map_err(|e| {
            log::error!("Failed to hash password: {}", e);
            error::ErrorInternalServerError("Failed to update password")
        })?
        .to_string();

    let mut active: users::ActiveModel = user.into();
    active.password = Set(new_hash);
    active.updated_at = Set(Utc::now().naive_utc());
    active
        .update(db.get_ref())
        .await
        .map_err(super::db_error)?;

    log::info!("Password changed for user_id={}", user_id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Password updated"
    })))
}

#[delete("/api/users/me")]
async fn delete_me(client: ClientCtx, db: Data<DatabaseConnection>) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;

    // Dependent sources, reviews, and photos stay; their user reference
    // is nulled by the schema rather than cascading.
    let deleted = crate::user::delete_account(db.get_ref(), user_id)
        .await
        .map_err(super::db_error)?;

    if !deleted {
        return Err(error::ErrorNotFound("User not found"));
    }

    log::info!("Account deleted: user_id={}", user_id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Account deleted"
    })))
}
