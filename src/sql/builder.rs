//! Builds parameterized COUNT, SELECT, INSERT and UPDATE statements from a resource definition.

use crate::config::ResourceDefinition;
use serde_json::{Map, Value};

/// SQL text together with its positional parameters. Placeholders are numbered as parameters
/// are pushed, so the two cannot drift apart.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    pub fn new() -> Self {
        QueryBuf::default()
    }

    /// Append a parameter and return its placeholder (`$n`, or `$n::type` when a cast is given).
    pub fn push_param(&mut self, v: Value, cast: Option<&str>) -> String {
        self.params.push(v);
        let n = self.params.len();
        match cast {
            Some(t) => format!("${}::{}", n, t),
            None => format!("${}", n),
        }
    }
}

/// Quote identifier for PostgreSQL.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Table reference, schema-qualified when the definition names a schema.
pub fn table_ref(def: &ResourceDefinition) -> String {
    match &def.schema_name {
        Some(schema) => format!("{}.{}", quoted(schema), quoted(&def.table_name)),
        None => quoted(&def.table_name),
    }
}

/// SELECT list: `*` unless columns are configured. Numeric and custom enum (schema.typename)
/// columns are read as text so they decode without loss.
fn select_column_list(def: &ResourceDefinition) -> String {
    if def.columns.is_empty() {
        return "*".into();
    }
    def.columns
        .iter()
        .map(|c| {
            let q = quoted(c);
            let pg_type = def.column_type(c).unwrap_or("");
            if pg_type.contains('.') || pg_type == "numeric" {
                format!("{}::text AS {}", q, q)
            } else {
                q
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_clauses(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// `SELECT count(1) AS count FROM t [WHERE ...]`, reusing the filter's parameters.
pub fn count(def: &ResourceDefinition, filter: &QueryBuf) -> QueryBuf {
    let head = format!("SELECT count(1) AS count FROM {}", table_ref(def));
    QueryBuf {
        sql: join_clauses(&[&head, &filter.sql]),
        params: filter.params.clone(),
    }
}

/// `SELECT cols FROM t [WHERE ...] ORDER BY order_col`. The pagination window is applied by the caller.
pub fn select_list(def: &ResourceDefinition, filter: &QueryBuf) -> QueryBuf {
    let head = format!("SELECT {} FROM {}", select_column_list(def), table_ref(def));
    let order = format!("ORDER BY {}", quoted(&def.order_by));
    QueryBuf {
        sql: join_clauses(&[&head, &filter.sql, &order]),
        params: filter.params.clone(),
    }
}

/// SELECT by primary key.
pub fn select_by_id(def: &ResourceDefinition, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(id.clone(), def.column_type(&def.id_column));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select_column_list(def),
        table_ref(def),
        quoted(&def.id_column),
        ph
    );
    q
}

/// INSERT listing the payload's fields in iteration order, returning the primary key.
pub fn insert(def: &ResourceDefinition, payload: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = table_ref(def);
    let returning = quoted(&def.id_column);
    if payload.is_empty() {
        q.sql = format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning);
        return q;
    }
    let mut cols = Vec::with_capacity(payload.len());
    let mut placeholders = Vec::with_capacity(payload.len());
    for (field, value) in payload {
        placeholders.push(q.push_param(value.clone(), def.column_type(field)));
        cols.push(quoted(field));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        table,
        cols.join(", "),
        placeholders.join(", "),
        returning
    );
    q
}

/// UPDATE by id over exactly the payload's fields, in iteration order; the id is the last parameter.
/// Returns None for an empty payload, which has nothing to SET.
pub fn update(def: &ResourceDefinition, id: &Value, payload: &Map<String, Value>) -> Option<QueryBuf> {
    if payload.is_empty() {
        return None;
    }
    let mut q = QueryBuf::new();
    let sets: Vec<String> = payload
        .iter()
        .map(|(field, value)| {
            let ph = q.push_param(value.clone(), def.column_type(field));
            format!("{} = {}", quoted(field), ph)
        })
        .collect();
    let id_ph = q.push_param(id.clone(), def.column_type(&def.id_column));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {}",
        table_ref(def),
        sets.join(", "),
        quoted(&def.id_column),
        id_ph
    );
    Some(q)
}
