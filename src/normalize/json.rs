//! JSON payload normalization
//!
//! Declared fields are resolved by JSON pointer; top-level members not
//! consumed by any declared pointer are preserved in `extra`.

use crate::{
    Error, Result,
    normalize::{FieldOutcome, apply_kind_json, shape::{FieldSource, Shape}},
    types::NormalizedResult,
};
use serde_json::Value;
use std::collections::HashSet;

/// Normalize a JSON body against the declared shape
pub fn normalize_json(body: &str, shape: &Shape) -> Result<NormalizedResult> {
    let root: Value = serde_json::from_str(body)?;
    let mut result = NormalizedResult::new();
    let mut consumed: HashSet<String> = HashSet::new();

    for field in &shape.fields {
        let FieldSource::JsonPointer(pointer) = &field.source else {
            continue;
        };

        match root.pointer(pointer) {
            Some(value) => {
                if let Some(segment) = top_level_segment(pointer) {
                    consumed.insert(segment);
                }
                match apply_kind_json(field, value)? {
                    FieldOutcome::Value(value) => {
                        result.fields.insert(field.name.clone(), value);
                    }
                    FieldOutcome::Demote(raw) => {
                        result.extra.insert(field.name.clone(), Value::String(raw));
                    }
                }
            }
            None if field.required => {
                return Err(Error::parse(
                    &field.name,
                    pointer,
                    "required member missing from JSON payload",
                ));
            }
            None => {}
        }
    }

    if let Value::Object(map) = &root {
        for (key, value) in map {
            if !consumed.contains(key) {
                result.extra.insert(key.clone(), value.clone());
            }
        }
    }

    Ok(result)
}

/// First reference token of a pointer, unescaped per RFC 6901
fn top_level_segment(pointer: &str) -> Option<String> {
    let token = pointer.strip_prefix('/')?.split('/').next()?;
    Some(token.replace("~1", "/").replace("~0", "~"))
}
