//! Shared test doubles: an in-memory storage that scripts results and records statements.

#![allow(dead_code)]

use async_trait::async_trait;
use pg_resource::{Cursor, Resource, ResourceDefinition, Row, Settings, Storage, StorageError};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

enum Scripted {
    Rows(Vec<Row>),
    Error(StorageError),
    Pending,
}

#[derive(Default)]
struct Inner {
    statements: Vec<(String, Vec<Value>)>,
    script: VecDeque<Scripted>,
    acquired: usize,
    released: usize,
}

/// Each `execute` consumes the next scripted result (rows, an error, or a statement that never
/// completes); with nothing scripted the statement succeeds with no rows.
#[derive(Clone, Default)]
pub struct RecordingStorage {
    inner: Arc<Mutex<Inner>>,
}

pub fn row(v: Value) -> Row {
    match v {
        Value::Object(m) => m,
        other => panic!("row must be an object, got {}", other),
    }
}

impl RecordingStorage {
    pub fn new() -> Self {
        RecordingStorage::default()
    }

    pub fn push_rows(&self, rows: Vec<Value>) -> &Self {
        let rows = rows.into_iter().map(row).collect();
        self.inner.lock().unwrap().script.push_back(Scripted::Rows(rows));
        self
    }

    pub fn push_error(&self, e: StorageError) -> &Self {
        self.inner.lock().unwrap().script.push_back(Scripted::Error(e));
        self
    }

    /// The next statement hangs until its future is dropped.
    pub fn push_pending(&self) -> &Self {
        self.inner.lock().unwrap().script.push_back(Scripted::Pending);
        self
    }

    pub fn statements(&self) -> Vec<(String, Vec<Value>)> {
        self.inner.lock().unwrap().statements.clone()
    }

    pub fn acquired(&self) -> usize {
        self.inner.lock().unwrap().acquired
    }

    pub fn released(&self) -> usize {
        self.inner.lock().unwrap().released
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn acquire(&self) -> Result<Box<dyn Cursor>, StorageError> {
        self.inner.lock().unwrap().acquired += 1;
        Ok(Box::new(RecordingCursor {
            inner: self.inner.clone(),
            rows: VecDeque::new(),
        }))
    }
}

struct RecordingCursor {
    inner: Arc<Mutex<Inner>>,
    rows: VecDeque<Row>,
}

#[async_trait]
impl Cursor for RecordingCursor {
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<(), StorageError> {
        let next = {
            let mut inner = self.inner.lock().unwrap();
            inner.statements.push((sql.to_string(), params.to_vec()));
            inner.script.pop_front()
        };
        match next {
            Some(Scripted::Rows(rows)) => {
                self.rows = rows.into();
                Ok(())
            }
            Some(Scripted::Error(e)) => Err(e),
            Some(Scripted::Pending) => {
                std::future::pending::<()>().await;
                Ok(())
            }
            None => {
                self.rows.clear();
                Ok(())
            }
        }
    }

    async fn fetch_one(&mut self) -> Result<Option<Row>, StorageError> {
        Ok(self.rows.pop_front())
    }

    async fn fetch_all(&mut self) -> Result<Vec<Row>, StorageError> {
        Ok(self.rows.drain(..).collect())
    }
}

impl Drop for RecordingCursor {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.released += 1;
        }
    }
}

/// allowed = [name, email], required = [name], search = [name].
pub fn people() -> ResourceDefinition {
    ResourceDefinition::new("people")
        .allowed(&["name", "email"])
        .required(&["name"])
        .search(&["name"])
}

pub fn resource(def: ResourceDefinition, storage: &RecordingStorage) -> Resource {
    Resource::new(def, Arc::new(Settings::default()), Arc::new(storage.clone()))
}

/// `n` rows `{id, name}` starting at id `first`.
pub fn person_rows(first: i64, n: i64) -> Vec<Value> {
    (first..first + n)
        .map(|i| serde_json::json!({"id": i, "name": format!("person {}", i)}))
        .collect()
}
