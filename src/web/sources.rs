//! Water source endpoints: public listings, submission, admin edit,
//! and moderation.

use crate::middleware::ClientCtx;
use crate::moderation::{self, ModerationError, ModerationStatus};
use crate::water_source::{self, CreateWaterSource, SourceError, UpdateWaterSource};
use actix_web::web::Data;
use actix_web::{delete, error, get, patch, post, put, web, Error, HttpRequest, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // "/api/sources/all" must resolve before "/api/sources/{id}".
    conf.service(list_sources)
        .service(list_all_sources)
        .service(view_source)
        .service(create_source)
        .service(update_source)
        .service(delete_source)
        .service(update_source_status);
}

fn map_source_error(e: SourceError) -> Error {
    match e {
        SourceError::InvalidCoordinate | SourceError::DuplicateLocation => {
            error::ErrorBadRequest(e.to_string())
        }
        SourceError::NotFound => error::ErrorNotFound(e.to_string()),
        SourceError::Db(db_err) => {
            log::error!("Water source operation failed: {}", db_err);
            error::ErrorInternalServerError("Internal server error")
        }
    }
}

/// Public listing of approved sources.
#[get("/api/sources")]
async fn list_sources(db: Data<DatabaseConnection>) -> Result<HttpResponse, Error> {
    let sources = water_source::find_approved(db.get_ref())
        .await
        .map_err(super::db_error)?;

    Ok(HttpResponse::Ok().json(sources))
}

/// Admin listing of every source regardless of status.
#[get("/api/sources/all")]
async fn list_all_sources(
    client: ClientCtx,
    db: Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    client.require_admin()?;

    let sources = water_source::find_all(db.get_ref())
        .await
        .map_err(super::db_error)?;

    Ok(HttpResponse::Ok().json(sources))
}

/// Detail view: the source's fields merged with its approved reviews and
/// the aggregate rating.
#[get("/api/sources/{id}")]
async fn view_source(
    db: Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let detail = water_source::detail(db.get_ref(), path.into_inner())
        .await
        .map_err(super::db_error)?
        .ok_or_else(|| error::ErrorNotFound("Water source not found"))?;

    Ok(HttpResponse::Ok().json(detail))
}

#[post("/api/sources")]
async fn create_source(
    req: HttpRequest,
    client: ClientCtx,
    db: Data<DatabaseConnection>,
    form: web::Json<CreateWaterSource>,
) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;

    let ip = crate::ip::extract_client_ip(&req).unwrap_or_else(|| "unknown".to_string());
    if let Err(e) = crate::rate_limit::check_submission_rate_limit(&ip) {
        return Err(error::ErrorTooManyRequests(format!(
            "Too many submissions. Please wait {} seconds.",
            e.retry_after_seconds
        )));
    }

    form.validate()
        .map_err(|e| error::ErrorBadRequest(format!("Invalid water source data: {}", e)))?;

    // User submissions always enter the moderation queue as pending.
    let source = water_source::create(
        db.get_ref(),
        Some(user_id),
        &form,
        ModerationStatus::Pending,
        None,
    )
    .await
    .map_err(map_source_error)?;

    Ok(HttpResponse::Created().json(source))
}

#[patch("/api/sources/{id}")]
async fn update_source(
    client: ClientCtx,
    db: Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Json<UpdateWaterSource>,
) -> Result<HttpResponse, Error> {
    client.require_admin()?;

    form.validate()
        .map_err(|e| error::ErrorBadRequest(format!("Invalid water source data: {}", e)))?;

    let source = water_source::update(db.get_ref(), path.into_inner(), &form)
        .await
        .map_err(map_source_error)?;

    Ok(HttpResponse::Ok().json(source))
}

#[delete("/api/sources/{id}")]
async fn delete_source(
    client: ClientCtx,
    db: Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    client.require_admin()?;

    let source_id = path.into_inner();
    water_source::delete(db.get_ref(), source_id)
        .await
        .map_err(map_source_error)?;

    log::info!("Water source {} deleted by admin", source_id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Water source deleted"
    })))
}

#[derive(Deserialize)]
struct StatusForm {
    status: String,
}

#[derive(Serialize)]
struct StatusResponse {
    success: bool,
    message: String,
    status: ModerationStatus,
}

/// Admin moderation: set the source's status to any value in the closed
/// set. Unknown identifiers report not-found.
#[put("/api/sources/{id}/status")]
async fn update_source_status(
    client: ClientCtx,
    db: Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Json<StatusForm>,
) -> Result<HttpResponse, Error> {
    client.require_admin()?;

    let status = moderation::set_water_source_status(db.get_ref(), path.into_inner(), &form.status)
        .await
        .map_err(map_moderation_error)?;

    Ok(HttpResponse::Ok().json(StatusResponse {
        success: true,
        message: format!("Status updated to {}", status),
        status,
    }))
}

pub(super) fn map_moderation_error(e: ModerationError) -> Error {
    match e {
        ModerationError::InvalidStatus(_) => error::ErrorBadRequest(e.to_string()),
        ModerationError::NotFound => error::ErrorNotFound(e.to_string()),
        ModerationError::Db(db_err) => {
            log::error!("Moderation operation failed: {}", db_err);
            error::ErrorInternalServerError("Internal server error")
        }
    }
}
