use serde_json::{Map, Value};

use super::schema::Section;

/// Recursively merge `updates` into a copy of `original`.
///
/// Where both sides hold a mapping under the same key the mappings are
/// merged; any other update value (lists included) replaces the original
/// value wholesale. Keys missing from `updates` are kept and keys only in
/// `updates` are added. `original` is left untouched.
pub fn merge(original: &Value, updates: &Value) -> Value {
    let mut merged = original.clone();
    merge_into(&mut merged, updates);
    merged
}

/// Merge a partial section into a copy of `document`, leaving every other
/// section as it was.
///
/// A section missing from the document (or holding a non-mapping value)
/// starts out as an empty mapping.
pub fn merge_section(document: &Value, section: Section, partial: &Value) -> Value {
    let mut merged = document.clone();
    if !merged.is_object() {
        merged = Value::Object(Map::new());
    }
    if let Value::Object(root) = &mut merged {
        let current = root
            .entry(section.as_str())
            .or_insert_with(|| Value::Object(Map::new()));
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        merge_into(current, partial);
    }
    merged
}

fn merge_into(target: &mut Value, updates: &Value) {
    match (target, updates) {
        (Value::Object(target), Value::Object(updates)) => {
            for (key, value) in updates {
                let nested = matches!(
                    (target.get(key), value),
                    (Some(Value::Object(_)), Value::Object(_))
                );
                if nested {
                    if let Some(existing) = target.get_mut(key) {
                        merge_into(existing, value);
                    }
                } else {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
        (target, updates) => *target = updates.clone(),
    }
}
