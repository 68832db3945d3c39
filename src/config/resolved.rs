//! Resolved resource definition: config validated and flattened for runtime use.

use std::collections::HashMap;

/// How a column's configured PostgreSQL type coerces raw (query-string / path) values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeClass {
    Integer,
    Bool,
    Uuid,
    Other,
}

impl TypeClass {
    pub fn of(pg_type: &str) -> Self {
        let l = pg_type.to_lowercase();
        if l.contains("int") || l.contains("serial") {
            TypeClass::Integer
        } else if l.starts_with("bool") {
            TypeClass::Bool
        } else if l.contains("uuid") {
            TypeClass::Uuid
        } else {
            TypeClass::Other
        }
    }
}

/// Immutable per-resource configuration, shared for the process lifetime.
#[derive(Clone, Debug)]
pub struct ResourceDefinition {
    /// URL name of the resource (`/{path_segment}`).
    pub path_segment: String,
    pub schema_name: Option<String>,
    pub table_name: String,
    pub id_column: String,
    /// PostgreSQL type of the primary key; drives id parsing and the id placeholder cast.
    pub id_type: String,
    pub order_by: String,
    pub allowed_fields: Vec<String>,
    pub required_fields: Vec<String>,
    pub search_fields: Vec<String>,
    /// Explicit select list; empty selects `*`.
    pub columns: Vec<String>,
    pub column_types: HashMap<String, String>,
    pub page_size: Option<i64>,
    pub max_page_size: Option<i64>,
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl ResourceDefinition {
    /// Definition for `path_segment` backed by a table of the same name, keyed and ordered by `id`.
    pub fn new(path_segment: impl Into<String>) -> Self {
        let path_segment = path_segment.into();
        ResourceDefinition {
            table_name: path_segment.clone(),
            path_segment,
            schema_name: None,
            id_column: "id".into(),
            id_type: "bigint".into(),
            order_by: "id".into(),
            allowed_fields: Vec::new(),
            required_fields: Vec::new(),
            search_fields: Vec::new(),
            columns: Vec::new(),
            column_types: HashMap::new(),
            page_size: None,
            max_page_size: None,
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema_name = Some(schema.into());
        self
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table_name = table.into();
        self
    }

    pub fn id_column(mut self, column: impl Into<String>, pg_type: impl Into<String>) -> Self {
        self.id_column = column.into();
        self.id_type = pg_type.into();
        self
    }

    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by = column.into();
        self
    }

    pub fn allowed(mut self, fields: &[&str]) -> Self {
        self.allowed_fields = owned(fields);
        self
    }

    pub fn required(mut self, fields: &[&str]) -> Self {
        self.required_fields = owned(fields);
        self
    }

    pub fn search(mut self, fields: &[&str]) -> Self {
        self.search_fields = owned(fields);
        self
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = owned(columns);
        self
    }

    pub fn with_column_type(mut self, column: impl Into<String>, pg_type: impl Into<String>) -> Self {
        self.column_types.insert(column.into(), pg_type.into());
        self
    }

    pub fn page_size(mut self, size: i64) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn max_page_size(mut self, size: i64) -> Self {
        self.max_page_size = Some(size);
        self
    }

    /// Configured PostgreSQL type of a column. The id column falls back to `id_type`.
    pub fn column_type(&self, column: &str) -> Option<&str> {
        match self.column_types.get(column) {
            Some(t) => Some(t.as_str()),
            None if column == self.id_column => Some(self.id_type.as_str()),
            None => None,
        }
    }
}
