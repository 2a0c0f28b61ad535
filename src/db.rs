//! Database connectivity.
//!
//! The pool is created once at startup and handed to the HTTP server as
//! app data; entity-access functions receive it as an explicit argument
//! rather than reaching for process-wide state.

use anyhow::Context;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

/// Opens a connection pool against the given PostgreSQL URL.
pub async fn connect(url: &str) -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(url.to_owned());
    options
        .max_connections(20)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8 * 60));

    Database::connect(options)
        .await
        .context("failed to open database connection pool")
}
