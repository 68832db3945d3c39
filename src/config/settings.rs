//! Process-wide settings: default page size and the base URL for links.

use crate::error::ConfigError;
use serde_json::{Map, Value};

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Read once at startup and passed to every resource.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub page_limit: i64,
    /// Without trailing slash.
    pub base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            page_limit: DEFAULT_PAGE_LIMIT,
            base_url: DEFAULT_BASE_URL.into(),
        }
    }
}

impl Settings {
    pub fn new(page_limit: i64, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Settings {
            page_limit,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// From env `PAGE_LIMIT` and `BASE_URL`; unset or empty variables take the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(
            std::env::var("PAGE_LIMIT").ok().as_deref(),
            std::env::var("BASE_URL").ok().as_deref(),
        )
    }

    fn from_vars(page_limit: Option<&str>, base_url: Option<&str>) -> Result<Self, ConfigError> {
        let page_limit = match page_limit.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => s
                .parse()
                .map_err(|_| ConfigError::Load(format!("PAGE_LIMIT is not an integer: {}", s)))?,
            None => DEFAULT_PAGE_LIMIT,
        };
        let base_url = base_url
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_BASE_URL);
        Ok(Settings::new(page_limit, base_url))
    }

    /// Absolute URL of a resource path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Link object pointing at another resource, for use in serialize hooks:
    /// `{"type": "relation", "resource": "<base>/<resource>", ...extra}`.
    pub fn relation(&self, resource: &str, extra: Map<String, Value>) -> Value {
        let mut obj = Map::new();
        obj.insert("type".into(), Value::String("relation".into()));
        obj.insert("resource".into(), Value::String(self.url(resource)));
        for (k, v) in extra {
            obj.entry(k).or_insert(v);
        }
        Value::Object(obj)
    }
}
