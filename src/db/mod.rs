//! Target store: a SQLite database shaped like the CMDB's item tables.

pub mod counters;
pub mod gateway;
pub mod items;
pub mod links;
pub mod stats;

pub use gateway::Gateway;

use crate::config::CmdbConfig;
use crate::error::{StorageError, StoreResult};
use chrono::{NaiveDateTime, SubsecRound};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Timestamp format used by every `*_time` column.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    settings: Arc<CmdbConfig>,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;

        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing and dry runs).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            settings: Arc::new(CmdbConfig::default()),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Use the given catalog ids instead of the defaults.
    pub fn with_settings(mut self, settings: CmdbConfig) -> Self {
        self.settings = Arc::new(settings);
        self
    }

    /// Catalog ids this handle writes with.
    pub fn settings(&self) -> &CmdbConfig {
        &self.settings
    }

    fn run_migrations(&self) -> StoreResult<()> {
        self.with_conn_mut(|conn| {
            embedded::migrations::runner().run(conn)?;
            Ok(())
        })
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T>,
    {
        let conn = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
        f(&conn)
    }

    /// Execute a function with mutable access to the connection (for savepoints).
    pub fn with_conn_mut<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T>,
    {
        let mut conn = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
        f(&mut conn)
    }

    /// Run `f` inside a transaction that is always rolled back.
    ///
    /// Writes made by `f` are visible to `f` itself and discarded afterwards,
    /// whether it succeeds or fails.
    pub fn with_rollback<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Database) -> Result<T, E>,
        E: From<StorageError>,
    {
        self.with_conn(|conn| Ok(conn.execute_batch("BEGIN")?))?;
        let result = f(self);
        self.with_conn(|conn| Ok(conn.execute_batch("ROLLBACK")?))?;
        result
    }
}

/// Current local time at second precision, as stored.
pub fn now_timestamp() -> NaiveDateTime {
    chrono::Local::now().naive_local().trunc_subsecs(0)
}

pub(crate) fn format_time(at: &NaiveDateTime) -> String {
    at.format(TIME_FORMAT).to_string()
}

pub(crate) fn parse_time(value: &str) -> StoreResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|_| StorageError::Corrupt(format!("timestamp '{}'", value)))
}
