//! Login endpoint issuing bearer tokens.

use crate::app_config;
use crate::orm::users;
use crate::session::{get_argon2, issue_token};
use crate::user::Profile;
use actix_web::web::Data;
use actix_web::{error, post, web, Error, HttpRequest, HttpResponse};
use argon2::password_hash::{PasswordHash, PasswordVerifier};
use chrono::Utc;
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};
use serde::{Deserialize, Serialize};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_login);
}

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
    user: Profile,
}

#[derive(Debug)]
pub enum LoginOutcome {
    Success(Box<users::Model>),
    BadCredentials,
    AccountLocked,
}

/// Checks credentials against the stored argon2id hash, tracking failed
/// attempts and locking the account past the configured threshold.
pub async fn authenticate(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<LoginOutcome, DbErr> {
    let auth = app_config::auth();

    let user = match crate::user::find_by_email(db, email).await? {
        Some(user) => user,
        None => return Ok(LoginOutcome::BadCredentials),
    };

    // Check if account is locked
    if let Some(locked_until) = user.locked_until {
        if locked_until > Utc::now().naive_utc() {
            return Ok(LoginOutcome::AccountLocked);
        } else {
            // Lock has expired, reset failed attempts
            let mut active_user: users::ActiveModel = user.clone().into();
            active_user.failed_login_attempts = Set(0);
            active_user.locked_until = Set(None);
            active_user.update(db).await?;
        }
    }

    let parsed_hash = match PasswordHash::new(&user.password) {
        Ok(hash) => hash,
        Err(e) => {
            log::error!("Stored password hash for user {} is invalid: {}", user.id, e);
            return Ok(LoginOutcome::BadCredentials);
        }
    };

    if get_argon2()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        // Increment failed login attempts
        let new_attempts = user.failed_login_attempts + 1;
        let mut active_user: users::ActiveModel = user.clone().into();
        active_user.failed_login_attempts = Set(new_attempts);

        // Lock account if max attempts reached
        if new_attempts >= auth.max_failed_logins {
            let lock_until =
                Utc::now().naive_utc() + chrono::Duration::minutes(auth.lockout_duration_minutes);
            active_user.locked_until = Set(Some(lock_until));
            log::warn!(
                "Account locked due to {} failed login attempts: user_id={}",
                new_attempts,
                user.id
            );
        }

        active_user.update(db).await?;
        return Ok(LoginOutcome::BadCredentials);
    }

    // Reset failed login attempts on successful login
    if user.failed_login_attempts > 0 || user.locked_until.is_some() {
        let mut active_user: users::ActiveModel = user.clone().into();
        active_user.failed_login_attempts = Set(0);
        active_user.locked_until = Set(None);
        let user = active_user.update(db).await?;
        return Ok(LoginOutcome::Success(Box::new(user)));
    }

    Ok(LoginOutcome::Success(Box::new(user)))
}

#[post("/api/auth/login")]
async fn post_login(
    req: HttpRequest,
    db: Data<DatabaseConnection>,
    form: web::Json<LoginForm>,
) -> Result<HttpResponse, Error> {
    let ip = crate::ip::extract_client_ip(&req).unwrap_or_else(|| "unknown".to_string());
    let email = form.email.trim().to_lowercase();

    if let Err(e) = crate::rate_limit::check_login_rate_limit(&ip, &email) {
        return Err(error::ErrorTooManyRequests(format!(
            "Too many login attempts. Please wait {} seconds.",
            e.retry_after_seconds
        )));
    }

    match authenticate(&db, &email, &form.password)
        .await
        .map_err(super::db_error)?
    {
        LoginOutcome::Success(user) => {
            let token = issue_token(
                user.id,
                user.role.as_str(),
                app_config::auth().token_ttl_hours,
            )
            .map_err(|e| {
                log::error!("Failed to sign token for user {}: {}", user.id, e);
                error::ErrorInternalServerError("Login failed")
            })?;

            log::info!("User logged in: {} (user_id: {})", user.username, user.id);

            Ok(HttpResponse::Ok().json(LoginResponse {
                token,
                user: Profile::from(*user),
            }))
        }
        LoginOutcome::BadCredentials => Err(error::ErrorUnauthorized("Invalid email or password")),
        LoginOutcome::AccountLocked => Err(error::ErrorForbidden(
            "Account temporarily locked. Try again later.",
        )),
    }
}
