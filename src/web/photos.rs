//! Photo endpoints: multipart upload, the four listing views, moderation,
//! and owner-or-admin deletion.

use crate::filesystem;
use crate::middleware::ClientCtx;
use crate::moderation::{self, ModerationStatus};
use crate::orm::{photos, reviews, water_sources};
use crate::photo::{self, PhotoError};
use crate::storage::StorageBackend;
use actix_multipart::{Field, Multipart};
use actix_web::web::Data;
use actix_web::{delete, error, get, post, put, web, Error, HttpRequest, HttpResponse};
use futures_util::TryStreamExt;
use sea_orm::{entity::*, DatabaseConnection};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // "/api/photos/mine" must resolve before "/api/photos/{id}".
    conf.service(upload_photo)
        .service(list_all_photos)
        .service(list_my_photos)
        .service(list_for_source)
        .service(list_for_review)
        .service(update_photo_status)
        .service(delete_photo);
}

/// Photo row plus the URL it is served from.
#[derive(Serialize)]
struct PhotoResponse {
    #[serde(flatten)]
    photo: photos::Model,
    url: String,
}

impl From<photos::Model> for PhotoResponse {
    fn from(photo: photos::Model) -> Self {
        let url = filesystem::public_url(&photo.filename);
        Self { photo, url }
    }
}

fn to_responses(photos: Vec<photos::Model>) -> Vec<PhotoResponse> {
    photos.into_iter().map(PhotoResponse::from).collect()
}

fn map_photo_error(e: PhotoError) -> Error {
    match e {
        PhotoError::NotFound => error::ErrorNotFound(e.to_string()),
        PhotoError::Db(db_err) => {
            log::error!("Photo operation failed: {}", db_err);
            error::ErrorInternalServerError("Internal server error")
        }
    }
}

/// Reads a small text field (an id) from the multipart stream.
async fn read_text_field(field: &mut Field) -> Result<String, Error> {
    let mut data = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        if data.len() + chunk.len() > 64 {
            return Err(error::ErrorBadRequest("Field value too long"));
        }
        data.extend_from_slice(&chunk);
    }
    String::from_utf8(data).map_err(|_| error::ErrorBadRequest("Field value is not valid UTF-8"))
}

#[post("/api/photos")]
async fn upload_photo(
    req: HttpRequest,
    client: ClientCtx,
    db: Data<DatabaseConnection>,
    storage: Data<Arc<dyn StorageBackend>>,
    mut payload: Multipart,
) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;

    let ip = crate::ip::extract_client_ip(&req).unwrap_or_else(|| "unknown".to_string());
    if let Err(e) = crate::rate_limit::check_upload_rate_limit(&ip) {
        return Err(error::ErrorTooManyRequests(format!(
            "Too many uploads. Please wait {} seconds.",
            e.retry_after_seconds
        )));
    }

    let max_bytes = filesystem::max_upload_bytes();
    let mut file: Option<(Vec<u8>, mime::Mime)> = None;
    let mut water_source_id: Option<i32> = None;
    let mut review_id: Option<i32> = None;

    while let Some(mut field) = payload.try_next().await? {
        let name = field
            .content_disposition()
            .get_name()
            .unwrap_or_default()
            .to_owned();

        match name.as_str() {
            "file" => {
                let content_type = field
                    .content_type()
                    .cloned()
                    .unwrap_or(mime::APPLICATION_OCTET_STREAM);
                if !filesystem::is_allowed_image(&content_type) {
                    return Err(error::ErrorBadRequest(format!(
                        "Unsupported image type: {}",
                        content_type
                    )));
                }

                let mut data = Vec::new();
                while let Some(chunk) = field.try_next().await? {
                    if data.len() + chunk.len() > max_bytes {
                        return Err(error::ErrorPayloadTooLarge(format!(
                            "File exceeds the {} byte limit",
                            max_bytes
                        )));
                    }
                    data.extend_from_slice(&chunk);
                }
                file = Some((data, content_type));
            }
            "water_source_id" => {
                let value = read_text_field(&mut field).await?;
                water_source_id = Some(
                    value
                        .trim()
                        .parse()
                        .map_err(|_| error::ErrorBadRequest("Invalid water_source_id"))?,
                );
            }
            "review_id" => {
                let value = read_text_field(&mut field).await?;
                review_id = Some(
                    value
                        .trim()
                        .parse()
                        .map_err(|_| error::ErrorBadRequest("Invalid review_id"))?,
                );
            }
            // Unknown fields are drained and ignored.
            _ => while field.try_next().await?.is_some() {},
        }
    }

    let (data, content_type) =
        file.ok_or_else(|| error::ErrorBadRequest("Missing file field"))?;
    if data.is_empty() {
        return Err(error::ErrorBadRequest("Uploaded file is empty"));
    }

    // Attachment targets must exist before the file is stored.
    if let Some(source_id) = water_source_id {
        let exists = water_sources::Entity::find_by_id(source_id)
            .one(db.get_ref())
            .await
            .map_err(super::db_error)?
            .is_some();
        if !exists {
            return Err(error::ErrorNotFound("Water source not found"));
        }
    }
    if let Some(id) = review_id {
        let exists = reviews::Entity::find_by_id(id)
            .one(db.get_ref())
            .await
            .map_err(super::db_error)?
            .is_some();
        if !exists {
            return Err(error::ErrorNotFound("Review not found"));
        }
    }

    let filename = filesystem::hashed_filename(&data, &content_type);
    let file_size = data.len() as i64;

    storage.put_object(data, &filename).await.map_err(|e| {
        log::error!("Failed to store upload {}: {}", filename, e);
        error::ErrorInternalServerError("Failed to store file")
    })?;

    let photo = photo::create(
        db.get_ref(),
        user_id,
        water_source_id,
        review_id,
        filename,
        content_type.to_string(),
        file_size,
    )
    .await
    .map_err(super::db_error)?;

    Ok(HttpResponse::Created().json(PhotoResponse::from(photo)))
}

/// Admin listing: every photo regardless of status.
#[get("/api/photos")]
async fn list_all_photos(
    client: ClientCtx,
    db: Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    client.require_admin()?;

    let photos = photo::find_all(db.get_ref())
        .await
        .map_err(super::db_error)?;

    Ok(HttpResponse::Ok().json(to_responses(photos)))
}

/// Owner listing: the caller's own uploads, all statuses.
#[get("/api/photos/mine")]
async fn list_my_photos(
    client: ClientCtx,
    db: Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    let user_id = client.require_login()?;

    let photos = photo::find_for_user(db.get_ref(), user_id)
        .await
        .map_err(super::db_error)?;

    Ok(HttpResponse::Ok().json(to_responses(photos)))
}

/// Public attachment view: approved photos only.
#[get("/api/sources/{id}/photos")]
async fn list_for_source(
    db: Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let photos = photo::approved_for_source(db.get_ref(), path.into_inner())
        .await
        .map_err(super::db_error)?;

    Ok(HttpResponse::Ok().json(to_responses(photos)))
}

/// Public attachment view: approved photos only.
#[get("/api/reviews/{id}/photos")]
async fn list_for_review(
    db: Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let photos = photo::approved_for_review(db.get_ref(), path.into_inner())
        .await
        .map_err(super::db_error)?;

    Ok(HttpResponse::Ok().json(to_responses(photos)))
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

/// Admin moderation. Unknown identifiers report not-found, distinct from
/// an invalid status value.
#[put("/api/photos/{id}/status")]
async fn update_photo_status(
    client: ClientCtx,
    db: Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Json<StatusForm>,
) -> Result<HttpResponse, Error> {
    client.require_admin()?;

    let status = moderation::set_photo_status(db.get_ref(), path.into_inner(), &form.status)
        .await
        .map_err(super::sources::map_moderation_error)?;

    Ok(HttpResponse::Ok().json(StatusResponse {
        success: true,
        message: format!("Status updated to {}", status),
        status,
    }))
}

/// Deletion is allowed for the photo's owner and for admins.
#[delete("/api/photos/{id}")]
async fn delete_photo(
    client: ClientCtx,
    db: Data<DatabaseConnection>,
    storage: Data<Arc<dyn StorageBackend>>,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    client.require_login()?;

    let photo_id = path.into_inner();
    let photo = photo::find_by_id(db.get_ref(), photo_id)
        .await
        .map_err(super::db_error)?
        .ok_or_else(|| error::ErrorNotFound("Photo not found"))?;

    if !client.can_modify(photo.user_id) {
        return Err(error::ErrorForbidden(
            "You don't have permission to delete this photo",
        ));
    }

    photo::delete(db.get_ref(), photo_id)
        .await
        .map_err(map_photo_error)?;

    // The stored object is content-addressed, so it is only removed once
    // no other row references it. A failed removal just leaves an orphan.
    let orphaned = !photo::filename_in_use(db.get_ref(), &photo.filename)
        .await
        .map_err(super::db_error)?;
    if orphaned {
        if let Err(e) = storage.delete_object(&photo.filename).await {
            log::warn!("Failed to remove stored file {}: {}", photo.filename, e);
        }
    }

    log::info!("Photo {} deleted", photo_id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Photo deleted"
    })))
}
