//! Storage contract consumed by resources: lease a cursor, execute, fetch rows.
//!
//! A cursor is an owned value. Dropping it on any exit path (success, `?`, or a cancelled
//! request future) hands the underlying connection back to its pool.

mod postgres;

pub use postgres::{PgCursor, PgStorage};

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// One result row: column name -> value, in select order.
pub type Row = Map<String, Value>;

#[derive(Error, Debug)]
pub enum StorageError {
    /// Integrity violation (unique, foreign key, not null, check). Carries the database message.
    #[error("{0}")]
    Constraint(String),
    #[error("database: {0}")]
    Db(sqlx::Error),
    /// Result did not have the expected shape (e.g. no row from RETURNING).
    #[error("decode: {0}")]
    Decode(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if !matches!(db.kind(), sqlx::error::ErrorKind::Other) {
                return StorageError::Constraint(db.message().to_string());
            }
        }
        StorageError::Db(e)
    }
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Lease one cursor from the pool. May wait for a free connection.
    async fn acquire(&self) -> Result<Box<dyn Cursor>, StorageError>;
}

#[async_trait]
pub trait Cursor: Send {
    /// Run one statement with positional parameters (`$1`, `$2`, ...).
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<(), StorageError>;

    /// Next row of the last executed statement.
    async fn fetch_one(&mut self) -> Result<Option<Row>, StorageError>;

    /// All remaining rows of the last executed statement.
    async fn fetch_all(&mut self) -> Result<Vec<Row>, StorageError>;
}
