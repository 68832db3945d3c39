//! Load resource config from JSON and resolve it into definitions.

use crate::config::{validate, ResourceConfig, ResourceDefinition};
use crate::error::ConfigError;
use std::path::Path;

/// Parse a JSON array of resource configs.
pub fn parse(json: &str) -> Result<Vec<ResourceConfig>, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))
}

/// Read and parse a resources file.
pub async fn load_from_file(path: impl AsRef<Path>) -> Result<Vec<ResourceConfig>, ConfigError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    parse(&text)
}

/// Validate and build definitions, in config order.
pub fn resolve(configs: &[ResourceConfig]) -> Result<Vec<ResourceDefinition>, ConfigError> {
    validate(configs)?;
    Ok(configs.iter().map(resolve_one).collect())
}

fn resolve_one(c: &ResourceConfig) -> ResourceDefinition {
    ResourceDefinition {
        path_segment: c.path_segment.clone(),
        schema_name: c.schema.clone(),
        table_name: c.table.clone().unwrap_or_else(|| c.path_segment.clone()),
        id_column: c.id_column.clone(),
        id_type: c.id_type.clone(),
        order_by: c.order_by.clone().unwrap_or_else(|| c.id_column.clone()),
        allowed_fields: c.allowed_fields.clone(),
        required_fields: c.required_fields.clone(),
        search_fields: c.search_fields.clone(),
        columns: c.columns.clone(),
        column_types: c.column_types.clone(),
        page_size: c.page_size,
        max_page_size: c.max_page_size,
    }
}
