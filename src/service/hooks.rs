//! Per-resource hooks: row serialization pipeline and write-path callbacks.

use crate::error::AppError;
use crate::service::Payload;
use crate::store::{Cursor, Row};
use async_trait::async_trait;
use serde_json::Value;

/// Injected at resource construction. Every method defaults to identity / no-op, so an
/// implementation overrides only what it needs.
///
/// Rows pass through `before_serialization`, `serialize` and `after_serialization` in that
/// order. Write hooks that receive the cursor run on the same connection as the statement.
#[async_trait]
pub trait ResourceHooks: Send + Sync {
    fn before_serialization(&self, row: Row) -> Row {
        row
    }

    fn serialize(&self, row: Row) -> Value {
        Value::Object(row)
    }

    fn after_serialization(&self, object: Value) -> Value {
        object
    }

    /// Transform (or reject) a validated create payload.
    async fn prepare_insert(&self, payload: Payload) -> Result<Payload, AppError> {
        Ok(payload)
    }

    /// Transform (or reject) a validated update payload.
    async fn prepare_update(&self, _id: &Value, payload: Payload) -> Result<Payload, AppError> {
        Ok(payload)
    }

    async fn before_insert(&self, _cursor: &mut dyn Cursor) -> Result<(), AppError> {
        Ok(())
    }

    async fn after_insert(&self, _cursor: &mut dyn Cursor, _id: &Value) -> Result<(), AppError> {
        Ok(())
    }

    async fn before_update(&self, _cursor: &mut dyn Cursor, _id: &Value) -> Result<(), AppError> {
        Ok(())
    }

    async fn after_update(&self, _cursor: &mut dyn Cursor, _id: &Value) -> Result<(), AppError> {
        Ok(())
    }
}

/// Identity serialization, no write hooks.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHooks;

impl ResourceHooks for NoHooks {}

/// Run a row through the three serialization stages.
pub fn serialize_row(hooks: &dyn ResourceHooks, row: Row) -> Value {
    let row = hooks.before_serialization(row);
    let object = hooks.serialize(row);
    hooks.after_serialization(object)
}
