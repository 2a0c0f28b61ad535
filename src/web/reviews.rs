//! Review endpoints: submission, public listing, and moderation.

use crate::app_config;
use crate::middleware::ClientCtx;
use crate::moderation::{self, ModerationStatus};
use crate::review::{self, ReviewError};
use actix_web::web::Data;
use actix_web::{delete, error, get, post, put, web, Error, HttpRequest, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // "/api/reviews/pending" must resolve before "/api/reviews/{id}".
    conf.service(create_review)
        .service(list_for_source)
        .service(list_pending)
        .service(moderate_review)
        .service(delete_review);
}

fn map_review_error(e: ReviewError) -> Error {
    match e {
        ReviewError::InvalidRating => error::ErrorBadRequest(e.to_string()),
        ReviewError::SourceNotFound | ReviewError::NotFound => error::ErrorNotFound(e.to_string()),
        ReviewError::Db(db_err) => {
            log::error!("Review operation failed: {}", db_err);
            error::ErrorInternalServerError("Internal server error")
        }
    }
}

#[derive(Deserialize)]
struct CreateReviewForm {
    rating: i32,
    #[serde(default)]
    comment: String,
}

#[post("/api/sources/{id}/reviews")]
async fn create_review(
    req: HttpRequest,
    client: ClientCtx,
    db: Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Json<CreateReviewForm>,
) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;

    let ip = crate::ip::extract_client_ip(&req).unwrap_or_else(|| "unknown".to_string());
    if let Err(e) = crate::rate_limit::check_submission_rate_limit(&ip) {
        return Err(error::ErrorTooManyRequests(format!(
            "Too many submissions. Please wait {} seconds.",
            e.retry_after_seconds
        )));
    }

    let max_comment = app_config::limits().max_comment_length as usize;
    if form.comment.len() > max_comment {
        return Err(error::ErrorBadRequest(format!(
            "Comment may not exceed {} characters",
            max_comment
        )));
    }

    let review = review::create(
        db.get_ref(),
        path.into_inner(),
        user_id,
        form.rating,
        form.comment.trim().to_owned(),
    )
    .await
    .map_err(map_review_error)?;

    Ok(HttpResponse::Created().json(review))
}

/// Public listing: approved reviews for a source.
#[get("/api/sources/{id}/reviews")]
async fn list_for_source(
    db: Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let reviews = review::approved_for_source(db.get_ref(), path.into_inner())
        .await
        .map_err(super::db_error)?;

    Ok(HttpResponse::Ok().json(reviews))
}

/// Admin moderation queue.
#[get("/api/reviews/pending")]
async fn list_pending(
    client: ClientCtx,
    db: Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    client.require_admin()?;

    let reviews = review::find_pending(db.get_ref())
        .await
        .map_err(super::db_error)?;

    Ok(HttpResponse::Ok().json(reviews))
}

#[derive(Deserialize)]
struct ModerateForm {
    status: String,
}

#[derive(Serialize)]
struct ModerateResponse {
    success: bool,
    message: String,
    status: ModerationStatus,
}

/// Admin moderation. Reviews can only move forward out of pending, so
/// the accepted targets are `approved` and `rejected`.
#[put("/api/reviews/{id}/moderate")]
async fn moderate_review(
    client: ClientCtx,
    db: Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Json<ModerateForm>,
) -> Result<HttpResponse, Error> {
    client.require_admin()?;

    let status = moderation::set_review_status(db.get_ref(), path.into_inner(), &form.status)
        .await
        .map_err(super::sources::map_moderation_error)?;

    Ok(HttpResponse::Ok().json(ModerateResponse {
        success: true,
        message: format!("Review {}", status),
        status,
    }))
}

#[delete("/api/reviews/{id}")]
async fn delete_review(
    client: ClientCtx,
    db: Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    client.require_admin()?;

    let review_id = path.into_inner();
    review::delete(db.get_ref(), review_id)
        .await
        .map_err(map_review_error)?;

    log::info!("Review {} deleted by admin", review_id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Review deleted"
    })))
}
