use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use env_logger::Env;
use std::time::Duration;
use wellspring::middleware::ClientCtx;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_lib_mods();
    init_our_mods();

    let config = wellspring::app_config::get_config();

    let db = wellspring::db::connect(
        &std::env::var("DATABASE_URL").expect("DATABASE_URL must be set."),
    )
    .await
    .expect("Failed to open the database connection pool.");

    // Initialize rate limits from the loaded configuration
    wellspring::rate_limit::init_rate_limits(&config);

    let storage = wellspring::storage::build_backend(&config.storage)
        .expect("Storage backend failed to initialize.");

    // Spawn rate limiter cleanup task
    actix_web::rt::spawn(async {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(300)); // Every 5 minutes
        loop {
            interval.tick().await;
            wellspring::rate_limit::cleanup_old_entries_public();
            log::debug!("Rate limiter cleanup completed");
        }
    });

    let db_data = Data::new(db);
    let storage_data = Data::new(storage);
    let listen_addr = config.site.listen_addr.clone();

    HttpServer::new(move || {
        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        App::new()
            .app_data(db_data.clone())
            .app_data(storage_data.clone())
            // Security headers - applied to all responses
            .wrap(
                DefaultHeaders::new()
                    .add((header::X_FRAME_OPTIONS, "DENY"))
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add(("Referrer-Policy", "strict-origin-when-cross-origin")),
            )
            .wrap(ClientCtx::default())
            .wrap(Logger::new("%a %{User-Agent}i"))
            .configure(wellspring::web::configure)
    })
    .bind(&listen_addr)?
    .run()
    .await
}

/// Initialize third party crates we rely on but don't have control over.
pub fn init_lib_mods() {
    // This should be calls to crates without any transformative work applied.
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}

/// Initialize all local mods.
/// Panics
pub fn init_our_mods() {
    // This should be a list of simple function calls.
    // Each module should work mostly independent of others.
    // This way, we can unit test individual modules without loading the entire application.
    wellspring::app_config::init();
    wellspring::session::init();
}
