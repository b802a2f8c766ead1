//! Merging preview data into statically built page data
//!
//! When the static data already has the preview's top-level key (same
//! content type), the two are deep merged. Otherwise every object anywhere
//! in the static tree whose `id` matches the previewed node gets the preview
//! `data` merged in, which covers documents reached through links.

use serde_json::{Map, Value};

use prismic_common::{Error, Result};

/// Merge `preview_data` (a `previewData` map) into `static_data`
pub fn merge_preview_data(static_data: Option<Value>, preview_data: Option<Value>) -> Result<Value> {
    match (static_data, preview_data) {
        (None, None) => Err(Error::InvalidInput(
            "Provide at least static data or preview data".to_string(),
        )),
        (Some(static_data), None) => Ok(static_data),
        (None, Some(preview_data)) => Ok(preview_data),
        (Some(static_data), Some(preview_data)) => Ok(merge_static_data(static_data, preview_data)),
    }
}

fn merge_static_data(mut static_data: Value, preview_data: Value) -> Value {
    let Some((key, preview_node)) = preview_data.as_object().and_then(|map| map.iter().next()) else {
        return static_data;
    };

    if static_data.get(key).is_some() {
        deep_merge(&mut static_data, preview_data);
        return static_data;
    }

    let Some(preview_id) = preview_node.get("id").cloned() else {
        return static_data;
    };
    let mut patch = Map::new();
    patch.insert("data".to_string(), preview_node.get("data").cloned().unwrap_or(Value::Null));

    replace_matching(&mut static_data, &preview_id, &patch);
    static_data
}

/// Merge `patch` into every object in `tree` whose `id` equals `id`
fn replace_matching(tree: &mut Value, id: &Value, patch: &Map<String, Value>) {
    match tree {
        Value::Object(map) => {
            for value in map.values_mut() {
                replace_matching(value, id, patch);
            }
            if map.get("id") == Some(id) {
                merge_maps(map, patch.clone());
            }
        }
        Value::Array(items) => {
            for item in items {
                replace_matching(item, id, patch);
            }
        }
        _ => {}
    }
}

/// Recursive merge: objects key by key, arrays index by index, anything else
/// replaced by `source`
pub fn deep_merge(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => merge_maps(target, source),
        (Value::Array(target), Value::Array(source)) => {
            for (i, value) in source.into_iter().enumerate() {
                match target.get_mut(i) {
                    Some(existing) => deep_merge(existing, value),
                    None => target.push(value),
                }
            }
        }
        (target, source) => *target = source,
    }
}

fn merge_maps(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        match target.get_mut(&key) {
            Some(existing) => deep_merge(existing, value),
            None => {
                target.insert(key, value);
            }
        }
    }
}
