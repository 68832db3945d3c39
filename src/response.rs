//! Response envelopes for the four resource operations.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

/// List response: `{ self, data: {...}, index: [...] }`.
#[derive(Clone, Debug, Serialize)]
pub struct ListEnvelope {
    #[serde(rename = "self")]
    pub self_url: String,
    pub data: PageMeta,
    pub index: Vec<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PageMeta {
    pub offset: i64,
    pub limit: i64,
    pub next: Option<String>,
    pub prev: Option<String>,
    /// Total rows matching the filters, across all pages.
    pub count: i64,
    /// Rows in this page.
    pub length: usize,
}

/// Result of a create: the new primary key and the object URL.
#[derive(Clone, Debug, PartialEq)]
pub struct Created {
    pub id: Value,
    pub location: String,
}

/// 201 with a `Location` header and an empty body.
impl IntoResponse for Created {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, [(header::LOCATION, self.location)]).into_response()
    }
}
