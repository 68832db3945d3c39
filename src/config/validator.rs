//! Config validation: identifier syntax, unique path segments, page sizes.

use crate::config::ResourceConfig;
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("static regex"))
}

fn path_segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static regex"))
}

fn check_identifier(kind: &'static str, value: &str) -> Result<(), ConfigError> {
    if identifier_re().is_match(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier {
            kind,
            value: value.to_string(),
        })
    }
}

pub fn validate(configs: &[ResourceConfig]) -> Result<(), ConfigError> {
    let mut path_segments = HashSet::new();
    for r in configs {
        if !path_segment_re().is_match(&r.path_segment) {
            return Err(ConfigError::InvalidIdentifier {
                kind: "path segment",
                value: r.path_segment.clone(),
            });
        }
        if !path_segments.insert(r.path_segment.as_str()) {
            return Err(ConfigError::DuplicatePathSegment(r.path_segment.clone()));
        }
        if let Some(schema) = &r.schema {
            check_identifier("schema", schema)?;
        }
        check_identifier("table", r.table.as_deref().unwrap_or(&r.path_segment))?;
        check_identifier("id column", &r.id_column)?;
        if let Some(order_by) = &r.order_by {
            check_identifier("order column", order_by)?;
        }
        for f in r
            .allowed_fields
            .iter()
            .chain(&r.required_fields)
            .chain(&r.search_fields)
            .chain(&r.columns)
            .chain(r.column_types.keys())
        {
            check_identifier("field", f)?;
        }
        for (name, size) in [("page_size", r.page_size), ("max_page_size", r.max_page_size)] {
            if let Some(n) = size {
                if n <= 0 {
                    return Err(ConfigError::Validation(format!(
                        "{}: {} must be positive, got {}",
                        r.path_segment, name, n
                    )));
                }
            }
        }
        for f in &r.required_fields {
            if !r.allowed_fields.contains(f) {
                tracing::warn!(
                    resource = %r.path_segment,
                    field = %f,
                    "required field is not in allowed fields; create can never succeed"
                );
            }
        }
    }
    Ok(())
}
