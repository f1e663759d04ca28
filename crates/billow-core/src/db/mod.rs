//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `accounts` - Linked account operations
//! - `transactions` - Transaction ingestion and queries
//! - `bills` - Bill creation, settlement, and status transitions

use chrono::{DateTime, NaiveDate, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::Result;

mod accounts;
mod bills;
mod transactions;

#[cfg(test)]
mod tests;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Parse a SQLite DATE string; malformed values fall back to the epoch date
pub(crate) fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_default()
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Create a new database connection pool at the given path
    pub fn new(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` because each pooled
    /// connection to `:memory:` would get its own private database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = format!(
            "{}/billow_test_{}_{}.db",
            std::env::temp_dir().display(),
            std::process::id(),
            id
        );

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new(&path)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Clear all synced data for a user (transactions and auto-detected bills)
    ///
    /// Manual bills are preserved. Links are cleared first so the circular
    /// transactions<->bills foreign keys never block the deletes.
    pub fn reset_user(&self, user_id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE transactions SET bill_id = NULL WHERE user_id = ?",
            rusqlite::params![user_id],
        )?;
        conn.execute(
            "DELETE FROM bills WHERE user_id = ? AND auto_detected = TRUE",
            rusqlite::params![user_id],
        )?;
        conn.execute(
            "UPDATE bills SET source_transaction_id = NULL WHERE user_id = ?",
            rusqlite::params![user_id],
        )?;
        conn.execute(
            "DELETE FROM transactions WHERE user_id = ?",
            rusqlite::params![user_id],
        )?;
        info!(user_id, "Cleared synced data for user");
        Ok(())
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- WAL mode: better concurrency, readers don't block writers
            PRAGMA journal_mode = WAL;

            -- Cache size: ~8MB (2000 pages * 4KB default page size)
            PRAGMA cache_size = 2000;

            -- Synchronous NORMAL: good balance of safety and performance
            PRAGMA synchronous = NORMAL;

            -- Store temp tables in memory
            PRAGMA temp_store = MEMORY;

            -- Linked accounts (one row per aggregator connection)
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                provider TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_accounts_user ON accounts(user_id);

            -- Bills (detected or user-created recurring obligations)
            CREATE TABLE IF NOT EXISTS bills (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                account_id INTEGER REFERENCES accounts(id),
                name TEXT NOT NULL,
                amount REAL NOT NULL,
                due_date DATE NOT NULL,
                next_due_date DATE NOT NULL,
                frequency TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT 'other',
                payment_status TEXT NOT NULL DEFAULT 'upcoming',
                auto_detected BOOLEAN NOT NULL DEFAULT FALSE,
                detection_confidence INTEGER NOT NULL DEFAULT 0,
                source_transaction_id INTEGER REFERENCES transactions(id),
                last_payment_date DATE,
                last_payment_amount REAL,
                reminder_enabled BOOLEAN NOT NULL DEFAULT TRUE,
                reminder_days_before INTEGER NOT NULL DEFAULT 3,
                priority TEXT NOT NULL DEFAULT 'medium',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_bills_user ON bills(user_id);
            CREATE INDEX IF NOT EXISTS idx_bills_status ON bills(payment_status);
            CREATE INDEX IF NOT EXISTS idx_bills_next_due ON bills(next_due_date);

            -- Transactions (synced from aggregators)
            -- amount is a non-negative magnitude; direction is transaction_type
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY,
                account_id INTEGER REFERENCES accounts(id),
                user_id INTEGER NOT NULL,
                external_id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                merchant_name TEXT,
                amount REAL NOT NULL CHECK (amount >= 0),
                transaction_type TEXT NOT NULL,
                date DATE NOT NULL,
                category TEXT,
                pending BOOLEAN NOT NULL DEFAULT FALSE,
                bill_id INTEGER REFERENCES bills(id),
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions(user_id, date);
            CREATE INDEX IF NOT EXISTS idx_transactions_bill ON transactions(bill_id);
            CREATE INDEX IF NOT EXISTS idx_transactions_type ON transactions(transaction_type);
            "#,
        )?;

        Ok(())
    }
}
