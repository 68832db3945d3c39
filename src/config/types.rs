//! Raw config types matching the resources JSON file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_id_column() -> String {
    "id".into()
}

fn default_id_type() -> String {
    "bigint".into()
}

/// One resource as declared in config. Unset table defaults to the path segment; unset order
/// column defaults to the id column.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub path_segment: String,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default = "default_id_column")]
    pub id_column: String,
    #[serde(default = "default_id_type")]
    pub id_type: String,
    #[serde(default)]
    pub order_by: Option<String>,
    #[serde(default)]
    pub allowed_fields: Vec<String>,
    #[serde(default)]
    pub required_fields: Vec<String>,
    #[serde(default)]
    pub search_fields: Vec<String>,
    /// Explicit select list; empty selects every column.
    #[serde(default)]
    pub columns: Vec<String>,
    /// PostgreSQL type per column, for placeholder casts and query-string coercion.
    #[serde(default)]
    pub column_types: HashMap<String, String>,
    #[serde(default)]
    pub page_size: Option<i64>,
    #[serde(default)]
    pub max_page_size: Option<i64>,
}
