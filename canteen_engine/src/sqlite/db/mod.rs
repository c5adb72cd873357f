//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool,
//! or create an atomic transaction as the need arises and call through to the functions without any other changes.
//!
//! Anything that has to be race-free (stock debits, cart merges, status transitions) is written as a single
//! conditional statement, so that SQLite itself is the only synchronisation point.
//!
//! Queries are always read with `fetch_all`, even when at most one row can come back. Stopping after the first row
//! leaves the statement unfinished, which keeps SQLite's implicit transaction open on the pooled connection. For a
//! `RETURNING` write, that hides the write from every other connection. For a read, it pins a stale snapshot.
use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod cart;
pub mod orders;
pub mod products;

const SQLITE_DB_URL: &str = "sqlite://data/canteen.db";

pub fn db_url() -> String {
    let result = env::var("CANTEEN_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ CANTEEN_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

/// Creates a connection pool. `timeout` bounds both the wait for a free connection and the wait for SQLite's write
/// lock.
pub async fn new_pool(url: &str, max_connections: u32, timeout: Duration) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(timeout);
    let pool =
        SqlitePoolOptions::new().max_connections(max_connections).acquire_timeout(timeout).connect_with(options).await?;
    Ok(pool)
}
