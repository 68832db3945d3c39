//! Payload checks against a resource's field policy. All run before any statement.

use crate::error::AppError;
use crate::policy::FieldPolicy;
use serde_json::{Map, Value};

/// Decoded write body: field -> value, in request order.
pub type Payload = Map<String, Value>;

pub struct PayloadValidator;

impl PayloadValidator {
    pub fn payload_from_body(body: Value) -> Result<Payload, AppError> {
        match body {
            Value::Object(m) => Ok(m),
            _ => Err(AppError::BadRequest("body must be a JSON object".into())),
        }
    }

    /// Every key allowed (first offender reported), then every required field present.
    pub fn validate_create(payload: &Payload, policy: &FieldPolicy) -> Result<(), AppError> {
        Self::validate_allowed(payload, policy)?;
        for f in policy.required() {
            if !payload.contains_key(f) {
                return Err(AppError::Validation(format!("Field '{}' is required", f)));
            }
        }
        Ok(())
    }

    /// Partial updates: only the allowed check, plus at least one field to set.
    pub fn validate_update(payload: &Payload, policy: &FieldPolicy) -> Result<(), AppError> {
        Self::validate_allowed(payload, policy)?;
        if payload.is_empty() {
            return Err(AppError::Validation("No fields to update".into()));
        }
        Ok(())
    }

    fn validate_allowed(payload: &Payload, policy: &FieldPolicy) -> Result<(), AppError> {
        match payload.keys().find(|f| !policy.is_allowed(f)) {
            Some(f) => Err(AppError::Validation(format!("Field '{}' is not allowed", f))),
            None => Ok(()),
        }
    }
}
