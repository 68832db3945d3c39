//! PostgreSQL storage on a sqlx pool.

use super::{Cursor, Row, Storage, StorageError};
use crate::sql::PgBindValue;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};
use std::collections::VecDeque;

#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        PgStorage { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn acquire(&self) -> Result<Box<dyn Cursor>, StorageError> {
        let conn = self.pool.acquire().await?;
        Ok(Box::new(PgCursor {
            conn,
            rows: VecDeque::new(),
        }))
    }
}

/// Cursor over one leased pool connection. Results are read completely inside `execute`,
/// so a dropped cursor never returns a connection with an unread result set.
pub struct PgCursor {
    conn: PoolConnection<Postgres>,
    rows: VecDeque<Row>,
}

#[async_trait]
impl Cursor for PgCursor {
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<(), StorageError> {
        tracing::debug!(sql = %sql, params = ?params, "query");
        self.rows.clear();
        let mut query = sqlx::query(sql);
        for p in params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let rows = query.fetch_all(&mut *self.conn).await?;
        self.rows = rows.iter().map(row_to_json).collect();
        Ok(())
    }

    async fn fetch_one(&mut self) -> Result<Option<Row>, StorageError> {
        Ok(self.rows.pop_front())
    }

    async fn fetch_all(&mut self) -> Result<Vec<Row>, StorageError> {
        Ok(self.rows.drain(..).collect())
    }
}

fn row_to_json(row: &sqlx::postgres::PgRow) -> Row {
    use sqlx::Column;
    use sqlx::Row as _;
    let mut map = Row::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    map
}

/// Decode one cell by trying the common PostgreSQL types in turn; anything unknown or NULL is `Null`.
fn cell_to_value(row: &sqlx::postgres::PgRow, name: &str) -> Value {
    use sqlx::Row as _;
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n as f64) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
        return j;
    }
    Value::Null
}
