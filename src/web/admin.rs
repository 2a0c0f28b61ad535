/// Administration endpoints
///
/// Moderation queues, site statistics, and the external geodata import.
use crate::middleware::ClientCtx;
use crate::moderation::ModerationStatus;
use crate::orm::{photos, reviews, users, water_sources};
use crate::overpass::{self, BoundingBox, ImportError};
use actix_web::web::Data;
use actix_web::{error, get, post, web, Error, HttpResponse};
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr};
use serde::Serialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_stats)
        .service(view_pending)
        .service(run_import);
}

#[derive(Serialize)]
struct StatusCounts {
    pending: usize,
    approved: usize,
    rejected: usize,
}

#[derive(Serialize)]
struct StatsResponse {
    users: usize,
    sources: StatusCounts,
    reviews: StatusCounts,
    photos: StatusCounts,
}

async fn source_counts(db: &DatabaseConnection) -> Result<StatusCounts, DbErr> {
    Ok(StatusCounts {
        pending: water_sources::Entity::find()
            .filter(water_sources::Column::Status.eq(ModerationStatus::Pending.as_str()))
            .count(db)
            .await?,
        approved: water_sources::Entity::find()
            .filter(water_sources::Column::Status.eq(ModerationStatus::Approved.as_str()))
            .count(db)
            .await?,
        rejected: water_sources::Entity::find()
            .filter(water_sources::Column::Status.eq(ModerationStatus::Rejected.as_str()))
            .count(db)
            .await?,
    })
}

async fn review_counts(db: &DatabaseConnection) -> Result<StatusCounts, DbErr> {
    Ok(StatusCounts {
        pending: reviews::Entity::find()
            .filter(reviews::Column::Status.eq(ModerationStatus::Pending.as_str()))
            .count(db)
            .await?,
        approved: reviews::Entity::find()
            .filter(reviews::Column::Status.eq(ModerationStatus::Approved.as_str()))
            .count(db)
            .await?,
        rejected: reviews::Entity::find()
            .filter(reviews::Column::Status.eq(ModerationStatus::Rejected.as_str()))
            .count(db)
            .await?,
    })
}

async fn photo_counts(db: &DatabaseConnection) -> Result<StatusCounts, DbErr> {
    Ok(StatusCounts {
        pending: photos::Entity::find()
            .filter(photos::Column::Status.eq(ModerationStatus::Pending.as_str()))
            .count(db)
            .await?,
        approved: photos::Entity::find()
            .filter(photos::Column::Status.eq(ModerationStatus::Approved.as_str()))
            .count(db)
            .await?,
        rejected: photos::Entity::find()
            .filter(photos::Column::Status.eq(ModerationStatus::Rejected.as_str()))
            .count(db)
            .await?,
    })
}

/// Site-wide counts per entity and status.
#[get("/api/admin/stats")]
async fn view_stats(client: ClientCtx, db: Data<DatabaseConnection>) -> Result<HttpResponse, Error> {
    client.require_admin()?;
    let db = db.get_ref();

    let users = users::Entity::find()
        .count(db)
        .await
        .map_err(super::db_error)?;
    let sources = source_counts(db)
        .await
        .map_err(super::db_error)?;
    let reviews = review_counts(db)
        .await
        .map_err(super::db_error)?;
    let photos = photo_counts(db)
        .await
        .map_err(super::db_error)?;

    Ok(HttpResponse::Ok().json(StatsResponse {
        users,
        sources,
        reviews,
        photos,
    }))
}

#[derive(Serialize)]
struct PendingResponse {
    sources: Vec<water_sources::Model>,
    reviews: Vec<reviews::Model>,
    photos: Vec<photos::Model>,
}

/// The moderation queues: everything currently pending, oldest first.
#[get("/api/admin/pending")]
async fn view_pending(
    client: ClientCtx,
    db: Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    client.require_admin()?;
    let db = db.get_ref();

    let sources = crate::water_source::find_pending(db)
        .await
        .map_err(super::db_error)?;
    let reviews = crate::review::find_pending(db)
        .await
        .map_err(super::db_error)?;
    let photos = crate::photo::find_pending(db)
        .await
        .map_err(super::db_error)?;

    Ok(HttpResponse::Ok().json(PendingResponse {
        sources,
        reviews,
        photos,
    }))
}

/// Imports public drinking-water nodes within a bounding box.
#[post("/api/admin/import")]
async fn run_import(
    client: ClientCtx,
    db: Data<DatabaseConnection>,
    form: web::Json<BoundingBox>,
) -> Result<HttpResponse, Error> {
    let admin_id = client.require_admin()?;

    let summary = overpass::import_drinking_water(db.get_ref(), &form)
        .await
        .map_err(|e| match e {
            ImportError::InvalidBoundingBox => error::ErrorBadRequest(e.to_string()),
            ImportError::Http(http_err) => {
                log::error!("Overpass import failed: {}", http_err);
                error::ErrorBadGateway("Geodata service is unavailable")
            }
            ImportError::Db(db_err) => {
                log::error!("Overpass import failed: {}", db_err);
                error::ErrorInternalServerError("Internal server error")
            }
        })?;

    log::info!(
        "Admin {} imported {} water sources",
        admin_id,
        summary.imported
    );

    Ok(HttpResponse::Ok().json(summary))
}
