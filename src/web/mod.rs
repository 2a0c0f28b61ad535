pub mod account;
pub mod admin;
pub mod asset;
pub mod login;
pub mod photos;
pub mod reviews;
pub mod sources;

/// Maps a database failure to a generic 500 response. The detail is
/// logged server-side only.
pub(crate) fn db_error(e: sea_orm::DbErr) -> actix_web::Error {
    log::error!("Database error: {}", e);
    actix_web::error::ErrorInternalServerError("Internal server error")
}

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Descending order. Order is important.
    // Route resolution will stop at the first match.
    account::configure(conf);
    admin::configure(conf);
    asset::configure(conf);
    login::configure(conf);
    photos::configure(conf);
    reviews::configure(conf);
    sources::configure(conf);

    conf.service(crate::create_user::register);
}
