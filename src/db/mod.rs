use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

pub mod entity;
pub mod schema;

/// Open a bounded connection pool against the given Postgres URL.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<DatabaseConnection> {
    let mut opts = ConnectOptions::new(database_url.to_owned());
    opts.max_connections(max_connections)
        .min_connections(1)
        .sqlx_logging(false);
    Database::connect(opts)
        .await
        .context("failed to connect to database")
}
