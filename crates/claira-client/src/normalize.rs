//! Response-shape normalization.
//!
//! Listing endpoints are inconsistent about their envelope: some return a
//! bare array, some `{"deals": [...]}`, some `{"data": {"deals": [...]}}`,
//! and older versions vary between them. The normalizer extracts the actual
//! entity array without assuming a single canonical shape.

use serde_json::{Map, Value};

/// Extract the entity array from a listing payload.
///
/// Resolution order, first match wins:
///
/// 1. the payload itself is an array
/// 2. the payload carries one of `preferred_keys` with an array value
/// 3. `payload.data` is an object matching rule 2
/// 4. `payload.data` is itself an array
/// 5. the first array-valued property of the payload
/// 6. no array anywhere: `None`
///
/// Rule 5 is order-dependent when a payload has several array-valued
/// properties (here: serde_json's key order). That ambiguity is inherited
/// from the upstream API and deliberately not papered over.
pub fn extract_entities(payload: &Value, preferred_keys: &[&str]) -> Option<Vec<Value>> {
    if let Value::Array(items) = payload {
        return Some(items.clone());
    }

    let object = payload.as_object()?;

    if let Some(items) = preferred_array(object, preferred_keys) {
        return Some(items);
    }

    match object.get("data") {
        Some(Value::Object(inner)) => {
            if let Some(items) = preferred_array(inner, preferred_keys) {
                return Some(items);
            }
        }
        Some(Value::Array(items)) => return Some(items.clone()),
        _ => {}
    }

    object.values().find_map(|value| value.as_array().cloned())
}

fn preferred_array(object: &Map<String, Value>, preferred_keys: &[&str]) -> Option<Vec<Value>> {
    preferred_keys
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_array).cloned())
}
