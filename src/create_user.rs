use crate::orm::users;
use crate::session::get_argon2;
use crate::user::Profile;
use actix_web::web::Data;
use actix_web::{error, post, web, Error, HttpRequest, HttpResponse};
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    PasswordHasher,
};
use chrono::Utc;
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 3, max = 32))]
    pub username: String,
    #[validate(length(min = 8, max = 1000))]
    pub password: String,
    #[validate(email)]
    pub email: String,
}

#[derive(Serialize)]
struct RegisterResponse {
    user: Profile,
}

/// Inserts a new account with the given password hash. The caller is
/// responsible for the email uniqueness pre-check.
pub async fn insert_new_user(
    db: &DatabaseConnection,
    name: &str,
    pass_hash: &str,
    email: &str,
) -> Result<users::Model, DbErr> {
    let now = Utc::now().naive_utc();

    let user = users::ActiveModel {
        username: Set(name.to_owned()),
        email: Set(email.to_owned()),
        password: Set(pass_hash.to_owned()),
        role: Set(users::Role::User),
        failed_login_attempts: Set(0),
        locked_until: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    user.insert(db).await
}

#[post("/api/users/register")]
pub async fn register(
    req: HttpRequest,
    db: Data<DatabaseConnection>,
    form: web::Json<RegisterForm>,
) -> Result<HttpResponse, Error> {
    // Rate limiting - prevent registration spam
    let ip = crate::ip::extract_client_ip(&req).unwrap_or_else(|| "unknown".to_string());
    if let Err(e) = crate::rate_limit::check_registration_rate_limit(&ip) {
        log::warn!("Rate limit exceeded for registration: ip={}", ip);
        return Err(error::ErrorTooManyRequests(format!(
            "Too many registration attempts. Please wait {} seconds.",
            e.retry_after_seconds
        )));
    }

    form.validate().map_err(|e| {
        log::debug!("User registration validation failed: {}", e);
        error::ErrorBadRequest(format!("Invalid registration data: {}", e))
    })?;

    let username = form.username.trim().to_owned();
    let email = form.email.trim().to_lowercase();

    // Email uniqueness is enforced before insert.
    if crate::user::email_taken(&db, &email)
        .await
        .map_err(crate::web::db_error)?
    {
        return Err(error::ErrorBadRequest("Email is already registered"));
    }

    let password_hash = get_argon2()
        .hash_password(form.password.as_bytes(), &SaltString::generate(&mut OsRng))
        .map_err(|e| {
            log::error!("Failed to hash password: {}", e);
            error::ErrorInternalServerError("Failed to create user")
        })?
        .to_string();

    let user = insert_new_user(&db, &username, &password_hash, &email)
        .await
        .map_err(|e| {
            log::error!("Failed to create user: {}", e);
            error::ErrorInternalServerError("Failed to create user")
        })?;

    log::info!("New user registered: {} (user_id: {})", username, user.id);

    Ok(HttpResponse::Created().json(RegisterResponse {
        user: Profile::from(user),
    }))
}
