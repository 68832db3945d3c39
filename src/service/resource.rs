//! A table exposed as a REST resource: list, retrieve, create, update.

use crate::config::{ResourceDefinition, Settings, TypeClass};
use crate::error::AppError;
use crate::pagination::{LinkBuilder, Window, RESERVED_PARAMS};
use crate::policy::FieldPolicy;
use crate::response::{Created, ListEnvelope, PageMeta};
use crate::service::hooks::{serialize_row, NoHooks, ResourceHooks};
use crate::service::validation::PayloadValidator;
use crate::sql::{self, build_filter, Conditions};
use crate::store::{Storage, StorageError};
use serde_json::Value;
use std::sync::Arc;

/// Inputs of a list call. Offset and limit fall back to the resource's window defaults.
#[derive(Clone, Debug, Default)]
pub struct ListRequest {
    pub conditions: Conditions,
    pub search: Option<String>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl ListRequest {
    pub fn new() -> Self {
        ListRequest::default()
    }

    pub fn conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn window(mut self, offset: i64, limit: i64) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }
}

#[derive(Clone)]
pub struct Resource {
    definition: Arc<ResourceDefinition>,
    policy: Arc<FieldPolicy>,
    settings: Arc<Settings>,
    storage: Arc<dyn Storage>,
    hooks: Arc<dyn ResourceHooks>,
}

/// Constraint violations on a write become `Conflict`; anything else stays a storage error.
fn conflict_on_constraint(e: StorageError) -> AppError {
    match e {
        StorageError::Constraint(message) => {
            tracing::warn!(error = %message, "write rejected by storage constraint");
            AppError::Conflict(message)
        }
        other => AppError::Storage(other),
    }
}

fn id_to_path(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Resource {
    pub fn new(definition: ResourceDefinition, settings: Arc<Settings>, storage: Arc<dyn Storage>) -> Self {
        let policy = FieldPolicy::from_definition(&definition);
        Resource {
            definition: Arc::new(definition),
            policy: Arc::new(policy),
            settings,
            storage,
            hooks: Arc::new(NoHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: impl ResourceHooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    pub fn definition(&self) -> &ResourceDefinition {
        &self.definition
    }

    pub fn policy(&self) -> &FieldPolicy {
        &self.policy
    }

    pub fn path_segment(&self) -> &str {
        &self.definition.path_segment
    }

    pub fn index_url(&self) -> String {
        self.settings.url(&self.definition.path_segment)
    }

    pub fn object_url(&self, id: &Value) -> String {
        format!("{}/{}", self.index_url(), urlencoding::encode(&id_to_path(id)))
    }

    /// Window for the given request values, using the resource's page size (or the
    /// process default) and its maximum page size.
    pub fn window(&self, offset: Option<i64>, limit: Option<i64>) -> Window {
        let default_limit = self.definition.page_size.unwrap_or(self.settings.page_limit);
        Window::resolve(offset, limit, default_limit, self.definition.max_page_size)
    }

    /// Coerce a raw (query-string) value by the column's configured type. Untyped columns stay strings.
    pub fn coerce(&self, field: &str, raw: &str) -> Result<Value, AppError> {
        let Some(pg_type) = self.definition.column_type(field) else {
            return Ok(Value::String(raw.to_string()));
        };
        let invalid = || AppError::BadRequest(format!("invalid value for '{}': {}", field, raw));
        Ok(match TypeClass::of(pg_type) {
            TypeClass::Integer => Value::Number(raw.parse::<i64>().map_err(|_| invalid())?.into()),
            TypeClass::Bool => {
                if raw.eq_ignore_ascii_case("true") {
                    Value::Bool(true)
                } else if raw.eq_ignore_ascii_case("false") {
                    Value::Bool(false)
                } else {
                    return Err(invalid());
                }
            }
            TypeClass::Uuid => {
                let u = uuid::Uuid::parse_str(raw).map_err(|_| invalid())?;
                Value::String(u.to_string())
            }
            TypeClass::Other => Value::String(raw.to_string()),
        })
    }

    /// Parse a path identifier by the id column type.
    pub fn parse_id(&self, raw: &str) -> Result<Value, AppError> {
        self.coerce(&self.definition.id_column, raw)
            .map_err(|_| AppError::BadRequest(format!("invalid id: {}", raw)))
    }

    pub async fn list(&self, request: ListRequest) -> Result<ListEnvelope, AppError> {
        let def = &self.definition;
        if let Some((field, _)) = request
            .conditions
            .iter()
            .find(|(field, _)| RESERVED_PARAMS.contains(field))
        {
            return Err(AppError::BadRequest(format!(
                "'{}' is reserved and cannot be a filter field",
                field
            )));
        }
        let window = self.window(request.offset, request.limit);
        let search = request.search.as_deref();
        let filter = build_filter(&request.conditions, search, &def.search_fields, |f| def.column_type(f));
        let count_q = sql::count(def, &filter);
        let list_q = sql::select_list(def, &filter);
        let list_sql = window.apply(&list_q.sql);

        let mut cursor = self.storage.acquire().await?;
        cursor.execute(&count_q.sql, &count_q.params).await?;
        let total = cursor
            .fetch_one()
            .await?
            .and_then(|row| row.get("count").and_then(Value::as_i64))
            .ok_or_else(|| StorageError::Decode("count query returned no count".into()))?;
        cursor.execute(&list_sql, &list_q.params).await?;
        let rows = cursor.fetch_all().await?;
        drop(cursor);

        let index: Vec<Value> = rows
            .into_iter()
            .map(|row| serialize_row(self.hooks.as_ref(), row))
            .collect();
        let index_url = self.index_url();
        let links = LinkBuilder::new(&index_url, &request.conditions, search);
        tracing::debug!(resource = %def.path_segment, total, length = index.len(), "listed");
        Ok(ListEnvelope {
            self_url: links.current(&window),
            data: PageMeta {
                offset: window.offset,
                limit: window.limit,
                next: links.next(&window, total),
                prev: links.prev(&window),
                count: total,
                length: index.len(),
            },
            index,
        })
    }

    pub async fn retrieve(&self, id: &str) -> Result<Value, AppError> {
        let id_value = self.parse_id(id)?;
        let q = sql::select_by_id(&self.definition, &id_value);
        let mut cursor = self.storage.acquire().await?;
        cursor.execute(&q.sql, &q.params).await?;
        let row = cursor
            .fetch_one()
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} '{}' not found", self.definition.path_segment, id)))?;
        Ok(serialize_row(self.hooks.as_ref(), row))
    }

    pub async fn create(&self, body: Value) -> Result<Created, AppError> {
        let def = &self.definition;
        let payload = PayloadValidator::payload_from_body(body)?;
        PayloadValidator::validate_create(&payload, &self.policy)?;
        let payload = self.hooks.prepare_insert(payload).await?;
        let q = sql::insert(def, &payload);

        let mut cursor = self.storage.acquire().await?;
        self.hooks.before_insert(cursor.as_mut()).await?;
        cursor
            .execute(&q.sql, &q.params)
            .await
            .map_err(conflict_on_constraint)?;
        let row = cursor
            .fetch_one()
            .await?
            .ok_or_else(|| StorageError::Decode("insert returned no row".into()))?;
        let id = row
            .get(&def.id_column)
            .cloned()
            .ok_or_else(|| StorageError::Decode(format!("insert did not return '{}'", def.id_column)))?;
        self.hooks.after_insert(cursor.as_mut(), &id).await?;
        drop(cursor);

        tracing::info!(resource = %def.path_segment, id = %id, "created");
        Ok(Created {
            location: self.object_url(&id),
            id,
        })
    }

    pub async fn update(&self, id: &str, body: Value) -> Result<(), AppError> {
        let def = &self.definition;
        let id_value = self.parse_id(id)?;
        let payload = PayloadValidator::payload_from_body(body)?;
        PayloadValidator::validate_update(&payload, &self.policy)?;
        let payload = self.hooks.prepare_update(&id_value, payload).await?;
        let q = sql::update(def, &id_value, &payload)
            .ok_or_else(|| AppError::Validation("No fields to update".into()))?;

        let mut cursor = self.storage.acquire().await?;
        self.hooks.before_update(cursor.as_mut(), &id_value).await?;
        cursor
            .execute(&q.sql, &q.params)
            .await
            .map_err(conflict_on_constraint)?;
        self.hooks.after_update(cursor.as_mut(), &id_value).await?;
        drop(cursor);

        tracing::info!(resource = %def.path_segment, id = %id, "updated");
        Ok(())
    }
}
