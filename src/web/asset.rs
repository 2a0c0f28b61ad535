//! Serves stored photo files through the storage backend, streaming and
//! Range-aware.

use crate::storage::{StorageBackend, StorageError};
use actix_web::http::header;
use actix_web::web::Data;
use actix_web::{error, get, web, Error, HttpRequest, HttpResponse};
use std::sync::Arc;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_file);
}

#[get("/files/{filename}")]
async fn view_file(
    req: HttpRequest,
    storage: Data<Arc<dyn StorageBackend>>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let filename = path.into_inner();

    // Stored names are hash-derived; anything with path syntax is not ours.
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(error::ErrorBadRequest("Invalid filename"));
    }

    let range = req
        .headers()
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let object = storage
        .get_object(&filename, range)
        .await
        .map_err(|e| match e {
            StorageError::NotFound(_) => error::ErrorNotFound("File not found"),
            StorageError::InvalidRange(_) => {
                error::ErrorRangeNotSatisfiable("Range not satisfiable")
            }
            other => {
                log::error!("Storage read failed for {}: {}", filename, other);
                error::ErrorInternalServerError("Internal server error")
            }
        })?;

    let mut builder = if object.content_range.is_some() {
        HttpResponse::PartialContent()
    } else {
        HttpResponse::Ok()
    };

    if let Some(content_type) = &object.content_type {
        builder.insert_header((header::CONTENT_TYPE, content_type.clone()));
    }
    if let Some(e_tag) = &object.e_tag {
        builder.insert_header((header::ETAG, e_tag.clone()));
    }
    if let Some(content_range) = &object.content_range {
        builder.insert_header((header::CONTENT_RANGE, content_range.clone()));
    }
    if let Some(accept_ranges) = &object.accept_ranges {
        builder.insert_header((header::ACCEPT_RANGES, accept_ranges.clone()));
    }
    if let Some(last_modified) = &object.last_modified {
        builder.insert_header((header::LAST_MODIFIED, last_modified.clone()));
    }

    Ok(builder.streaming(object.body))
}
