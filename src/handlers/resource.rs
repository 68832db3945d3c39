//! Resource handlers: list, create, read, update.

use crate::error::AppError;
use crate::pagination::RESERVED_PARAMS;
use crate::response::{Created, ListEnvelope};
use crate::service::{ListRequest, Resource};
use crate::sql::Conditions;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, RawQuery, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use std::borrow::Cow;

fn resource_by_path<'a>(state: &'a AppState, path_segment: &str) -> Result<&'a Resource, AppError> {
    state
        .resources
        .get(path_segment)
        .ok_or_else(|| AppError::NotFound(format!("unknown resource: {}", path_segment)))
}

fn parse_window_param(name: &str, v: &str) -> Result<i64, AppError> {
    v.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("{} must be an integer", name)))
}

fn decode_component(raw: &str) -> Result<String, AppError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(Cow::into_owned)
        .map_err(|_| AppError::BadRequest(format!("query is not valid UTF-8: {}", raw)))
}

/// Split a raw query string into pairs, keeping order. A bare key (`?manager_id`) has no
/// value, which is how list links write a NULL condition; `key=` has an empty one.
pub fn parse_query(raw: Option<&str>) -> Result<Vec<(String, Option<String>)>, AppError> {
    raw.unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| -> Result<(String, Option<String>), AppError> {
            Ok(match pair.split_once('=') {
                Some((k, v)) => (decode_component(k)?, Some(decode_component(v)?)),
                None => (decode_component(pair)?, None),
            })
        })
        .collect()
}

/// `offset`, `limit` and `search` are reserved; every other parameter is an equality condition,
/// NULL when the key has no value. Missing or empty `offset`/`limit`/`search` count as absent.
pub fn list_request_from_query(
    resource: &Resource,
    params: Vec<(String, Option<String>)>,
) -> Result<ListRequest, AppError> {
    let mut request = ListRequest::new();
    let mut conditions = Conditions::new();
    for (k, v) in params {
        let Some(v) = v else {
            if !RESERVED_PARAMS.contains(&k.as_str()) {
                conditions.insert(k, Value::Null);
            }
            continue;
        };
        match k.as_str() {
            "offset" | "limit" if v.trim().is_empty() => {}
            "offset" => request.offset = Some(parse_window_param("offset", &v)?),
            "limit" => request.limit = Some(parse_window_param("limit", &v)?),
            "search" => request.search = Some(v),
            _ => {
                let value = resource.coerce(&k, &v)?;
                conditions.insert(k, value);
            }
        }
    }
    request.conditions = conditions;
    Ok(request)
}

pub async fn list(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Json<ListEnvelope>, AppError> {
    let resource = resource_by_path(&state, &path_segment)?;
    let request = list_request_from_query(resource, parse_query(query.as_deref())?)?;
    Ok(Json(resource.list(request).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Created, AppError> {
    let Json(body) = body?;
    let resource = resource_by_path(&state, &path_segment)?;
    resource.create(body).await
}

pub async fn read(
    State(state): State<AppState>,
    Path((path_segment, id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let resource = resource_by_path(&state, &path_segment)?;
    Ok(Json(resource.retrieve(&id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path((path_segment, id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(body) = body?;
    let resource = resource_by_path(&state, &path_segment)?;
    resource.update(&id, body).await?;
    Ok(StatusCode::NO_CONTENT)
}
