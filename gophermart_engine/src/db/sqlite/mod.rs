//! # SQLite backend
//!
//! The low-level queries live in [`ledger`] and [`users`] as plain functions that accept a `&mut SqliteConnection`.
//! Callers can pass a pooled connection, or a transaction when several statements need to be atomic, without any
//! other changes. [`SqliteDatabase`] composes them into the backend traits.
use std::{env, path::Path, str::FromStr};

use log::*;
use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError,
    Sqlite,
    SqlitePool,
};

pub mod ledger;
mod sqlite_impl;
pub mod users;

pub use sqlite_impl::SqliteDatabase;

const SQLITE_DB_URL: &str = "sqlite://data/gophermart.db";

pub fn db_url() -> String {
    let result = env::var("DATABASE_URI").unwrap_or_else(|_| {
        info!("🗃️ DATABASE_URI is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?.foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// Creates the database file (and its parent directory) if it does not exist yet.
pub async fn create_database_if_missing(url: &str) -> Result<(), SqlxError> {
    if Sqlite::database_exists(url).await? {
        return Ok(());
    }
    let path = url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(SqlxError::Io)?;
    }
    Sqlite::create_database(url).await?;
    info!("🗃️ Created SQLite database at {url}");
    Ok(())
}
