//! Offset/limit windows and filter-preserving navigation links.
//!
//! A limit of zero or less means "unlimited": no LIMIT clause, no next link, and a prev
//! link only when the window starts past row 0.
//! Links are rebuilt from the request alone (no server-side cursor state), so the same
//! inputs always give the same URL.

use crate::sql::Conditions;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub offset: i64,
    pub limit: i64,
}

impl Window {
    /// Negative offsets clamp to 0.
    pub fn new(offset: i64, limit: i64) -> Self {
        Window {
            offset: offset.max(0),
            limit,
        }
    }

    /// Window from optional request values. `max`, when set, caps the limit and replaces
    /// an unlimited request.
    pub fn resolve(offset: Option<i64>, limit: Option<i64>, default_limit: i64, max: Option<i64>) -> Self {
        let mut limit = limit.unwrap_or(default_limit);
        if let Some(max) = max {
            if limit <= 0 || limit > max {
                limit = max;
            }
        }
        Window::new(offset.unwrap_or(0), limit)
    }

    pub fn is_unlimited(&self) -> bool {
        self.limit <= 0
    }

    pub fn prev_offset(&self) -> i64 {
        if self.is_unlimited() {
            return 0;
        }
        (self.offset - self.limit).max(0)
    }

    pub fn next_offset(&self) -> i64 {
        if self.is_unlimited() {
            return 0;
        }
        self.offset.saturating_add(self.limit)
    }

    pub fn has_next(&self, total: i64) -> bool {
        let next = self.next_offset();
        next > self.offset && next < total
    }

    /// An unlimited window past the start links back to offset 0.
    pub fn has_prev(&self) -> bool {
        self.prev_offset() < self.offset
    }

    /// Append `LIMIT n` (when limited) and then `OFFSET n` (when past the start).
    pub fn apply(&self, sql: &str) -> String {
        let mut out = sql.to_string();
        if self.limit > 0 {
            out.push_str(&format!(" LIMIT {}", self.limit));
        }
        if self.offset > 0 {
            out.push_str(&format!(" OFFSET {}", self.offset));
        }
        out
    }
}

/// Query parameters that carry the window and search term, never a condition.
pub const RESERVED_PARAMS: [&str; 3] = ["search", "offset", "limit"];

/// `key=value`, or the bare key for a NULL condition.
fn link_pair(key: &str, value: &Value) -> String {
    let key = urlencoding::encode(key);
    match value {
        Value::Null => key.into_owned(),
        Value::String(s) => format!("{}={}", key, urlencoding::encode(s)),
        other => format!("{}={}", key, urlencoding::encode(&other.to_string())),
    }
}

/// Builds list URLs that carry the active conditions and search term.
pub struct LinkBuilder<'a> {
    index_url: &'a str,
    conditions: &'a Conditions,
    search: Option<&'a str>,
}

impl<'a> LinkBuilder<'a> {
    pub fn new(index_url: &'a str, conditions: &'a Conditions, search: Option<&'a str>) -> Self {
        LinkBuilder {
            index_url,
            conditions,
            search: search.filter(|s| !s.trim().is_empty()),
        }
    }

    /// `index?cond1=..&..&search=..&offset=..&limit=..`, every key and value percent-encoded.
    /// A NULL condition is written as its bare key.
    pub fn url(&self, offset: i64, limit: i64) -> String {
        let mut pairs: Vec<String> = self
            .conditions
            .iter()
            .map(|(k, v)| link_pair(k, v))
            .collect();
        if let Some(s) = self.search {
            pairs.push(link_pair("search", &Value::String(s.to_string())));
        }
        pairs.push(format!("offset={}", offset));
        pairs.push(format!("limit={}", limit));
        format!("{}?{}", self.index_url, pairs.join("&"))
    }

    pub fn current(&self, window: &Window) -> String {
        self.url(window.offset, window.limit)
    }

    pub fn next(&self, window: &Window, total: i64) -> Option<String> {
        window
            .has_next(total)
            .then(|| self.url(window.next_offset(), window.limit))
    }

    pub fn prev(&self, window: &Window) -> Option<String> {
        window
            .has_prev()
            .then(|| self.url(window.prev_offset(), window.limit))
    }
}
