//! WHERE-clause construction from equality conditions and a free-text search.

use super::builder::{quoted, QueryBuf};
use serde_json::Value;

/// Ordered field -> value equality filters. Re-inserting a field replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Conditions {
    entries: Vec<(String, Value)>,
}

impl Conditions {
    pub fn new() -> Self {
        Conditions::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        let field = field.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.entries.iter().find(|(f, _)| f == field).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(f, v)| (f.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Value)> for Conditions {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut c = Conditions::new();
        for (f, v) in iter {
            c.insert(f, v);
        }
        c
    }
}

/// Whitespace-separated keywords of a search term. Blank or absent terms yield none.
pub fn search_keywords(search: Option<&str>) -> Vec<&str> {
    search.map(|s| s.split_whitespace().collect()).unwrap_or_default()
}

/// Escape LIKE metacharacters so a keyword only matches literally.
pub fn escape_like(keyword: &str) -> String {
    let mut out = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Build `WHERE ...` (or an empty fragment) with its parameters.
///
/// Conditions become `"f" = $n` joined by AND, in insertion order. A search term with at least one
/// keyword, on a resource with search fields, adds one `"field"::text ILIKE $n` term per field and
/// keyword (fields outer, keywords inner), OR-ed together in parentheses and AND-ed with the
/// conditions. Condition parameters come first, then `%keyword%` patterns in term order.
/// `cast` gives the configured column type for a condition field, if any.
pub fn build_filter<'a, F>(
    conditions: &Conditions,
    search: Option<&str>,
    search_fields: &[String],
    cast: F,
) -> QueryBuf
where
    F: Fn(&str) -> Option<&'a str>,
{
    let mut q = QueryBuf::new();
    let mut clauses = Vec::new();

    if !conditions.is_empty() {
        let parts: Vec<String> = conditions
            .iter()
            .map(|(field, value)| {
                let ph = q.push_param(value.clone(), cast(field));
                format!("{} = {}", quoted(field), ph)
            })
            .collect();
        clauses.push(parts.join(" AND "));
    }

    let keywords = search_keywords(search);
    if !keywords.is_empty() && !search_fields.is_empty() {
        let mut terms = Vec::with_capacity(search_fields.len() * keywords.len());
        for field in search_fields {
            for kw in &keywords {
                let ph = q.push_param(Value::String(format!("%{}%", escape_like(kw))), None);
                terms.push(format!("{}::text ILIKE {}", quoted(field), ph));
            }
        }
        clauses.push(format!("({})", terms.join(" OR ")));
    }

    if !clauses.is_empty() {
        q.sql = format!("WHERE {}", clauses.join(" AND "));
    }
    q
}
