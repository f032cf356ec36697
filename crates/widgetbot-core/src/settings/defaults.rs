use serde_json::{Map, Value};

use super::schema::{FieldKind, FieldSpec, Section, DOCUMENT};

/// Build a fresh settings document with every field at its default.
///
/// Optional fields are present as explicit `null`. Each call returns an
/// independently owned document.
pub fn default_settings() -> Value {
    Value::Object(defaults_for(DOCUMENT))
}

/// Default settings with `identity.name` set to the instance display name.
pub fn default_settings_named(name: &str) -> Value {
    let mut settings = default_settings();
    settings["identity"]["name"] = Value::String(name.to_string());
    settings
}

/// Default contents of one section.
pub fn default_section(section: Section) -> Value {
    Value::Object(defaults_for(section.fields()))
}

fn defaults_for(fields: &[FieldSpec]) -> Map<String, Value> {
    fields
        .iter()
        .map(|spec| (spec.name.to_string(), default_value(&spec.kind)))
        .collect()
}

fn default_value(kind: &FieldKind) -> Value {
    match *kind {
        FieldKind::Text { default } => Value::String(default.to_string()),
        FieldKind::OptionalText => Value::Null,
        FieldKind::Bool { default } => Value::Bool(default),
        FieldKind::Integer { default, .. } => Value::from(default),
        FieldKind::Choice { default, .. } => Value::String(default.to_string()),
        FieldKind::TextList { default } => Value::Array(
            default
                .iter()
                .map(|item| Value::String(item.to_string()))
                .collect(),
        ),
        FieldKind::Object { fields, .. } => Value::Object(defaults_for(fields)),
    }
}
