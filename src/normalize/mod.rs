//! Response normalization
//!
//! Converts heterogeneous HTML, JSON, or XML payloads into one validated
//! [`NormalizedResult`]: every declared field extracted and checked, and
//! everything the shape does not cover preserved in the open `extra` map so
//! schema drift on the remote site degrades gracefully instead of failing.

pub mod dates;
pub mod html;
pub mod json;
pub mod shape;
pub mod xml;

pub use dates::{DateFormat, parse_date};
pub use shape::{FieldKind, FieldSource, FieldSpec, Shape};

use crate::{
    Result,
    types::{NormalizedResult, PayloadFormat},
};
use serde_json::Value;

/// Normalize a raw payload against a declared shape
///
/// The format is detected from the Content-Type when recognizable, falling
/// back to the caller-declared format otherwise.
pub fn normalize(
    body: &str,
    content_type: Option<&str>,
    declared: PayloadFormat,
    shape: &Shape,
) -> Result<NormalizedResult> {
    let format = content_type
        .and_then(PayloadFormat::from_content_type)
        .unwrap_or(declared);

    tracing::debug!(shape = %shape.name, ?format, "normalizing payload");

    match format {
        PayloadFormat::Json => json::normalize_json(body, shape),
        PayloadFormat::Xml => xml::normalize_xml(body, shape),
        PayloadFormat::Html => html::normalize_html(body, shape),
    }
}

/// Result of interpreting one raw field value
pub(crate) enum FieldOutcome {
    /// Interpreted value for the declared-field map
    Value(Value),
    /// Interpretation failed in a tolerated way; keep the raw string in extra
    Demote(String),
}

/// Interpret a string value (XML/HTML sources) according to the field kind
pub(crate) fn apply_kind_str(field: &shape::FieldSpec, raw: &str) -> Result<FieldOutcome> {
    match &field.kind {
        FieldKind::Verbatim => Ok(FieldOutcome::Value(Value::String(raw.to_string()))),
        FieldKind::Integer => match raw.trim().parse::<i64>() {
            Ok(n) => Ok(FieldOutcome::Value(Value::from(n))),
            Err(_) => coercion_failure(field, raw, "not an integer"),
        },
        FieldKind::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(FieldOutcome::Value(Value::Bool(true))),
            "false" | "0" => Ok(FieldOutcome::Value(Value::Bool(false))),
            _ => coercion_failure(field, raw, "not a boolean"),
        },
        FieldKind::Date(formats) => Ok(interpret_date(raw, formats)),
    }
}

/// Interpret a JSON value according to the field kind
pub(crate) fn apply_kind_json(field: &shape::FieldSpec, value: &Value) -> Result<FieldOutcome> {
    match &field.kind {
        FieldKind::Verbatim => Ok(FieldOutcome::Value(value.clone())),
        FieldKind::Integer => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => {
                Ok(FieldOutcome::Value(value.clone()))
            }
            Value::String(s) => apply_kind_str(field, s),
            _ => coercion_failure(field, &value.to_string(), "not an integer"),
        },
        FieldKind::Boolean => match value {
            Value::Bool(_) => Ok(FieldOutcome::Value(value.clone())),
            Value::String(s) => apply_kind_str(field, s),
            Value::Number(n) => {
                let raw = n.to_string();
                apply_kind_str(field, &raw)
            }
            _ => coercion_failure(field, &value.to_string(), "not a boolean"),
        },
        FieldKind::Date(formats) => {
            let raw = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                other => other.to_string(),
            };
            Ok(interpret_date(&raw, formats))
        }
    }
}

fn interpret_date(raw: &str, formats: &[DateFormat]) -> FieldOutcome {
    match parse_date(raw, formats) {
        Some(instant) => FieldOutcome::Value(Value::String(instant.to_rfc3339())),
        None => FieldOutcome::Demote(raw.to_string()),
    }
}

fn coercion_failure(field: &shape::FieldSpec, raw: &str, reason: &str) -> Result<FieldOutcome> {
    if field.required {
        Err(crate::Error::parse(
            &field.name,
            field.source.describe(),
            format!("{}: {:?}", reason, raw),
        ))
    } else {
        // Optional field with an uninterpretable value is drift, not failure
        Ok(FieldOutcome::Demote(raw.to_string()))
    }
}
