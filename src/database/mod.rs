// ABOUTME: Database management over per-tenant SQLite pools
// ABOUTME: Handles connection setup and idempotent schema migration
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Database Management
//!
//! One [`Database`] wraps one connection pool. The administrative surface
//! uses a single default database; each tenant gets its own, connected from
//! the registry's connection string. Migrations are idempotent
//! (`CREATE TABLE IF NOT EXISTS`) so first-use initialization tolerates
//! at-least-once execution.

mod clients;
mod identity;

pub use identity::SortOrder;

use anyhow::Result;
use sqlx::{Pool, Sqlite, SqlitePool};

/// Database manager for one connection string
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open a new database connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub async fn connect(database_url: &str) -> Result<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:")
            && !database_url.contains("mode=")
            && !database_url.ends_with(":memory:")
        {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options).await?;

        Ok(Self { pool })
    }

    /// Get a reference to the pool for advanced operations
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run all schema migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any DDL statement fails.
    pub async fn migrate(&self) -> Result<()> {
        self.migrate_identity().await?;
        self.migrate_clients().await?;
        Ok(())
    }
}
