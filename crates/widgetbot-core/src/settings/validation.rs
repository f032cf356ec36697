//! Settings validation and schema lookup.
//!
//! Validation only looks at the values a payload supplies: every missing
//! field would take its (valid) default, so partial payloads are accepted
//! as long as what they carry conforms. Problems come back as
//! `"<top-level field or section>: <message>"` strings, one per violated
//! constraint, never as an `Err`.

use serde_json::{json, Map, Value};

use super::schema::{self, FieldKind, FieldSpec, Section, DOCUMENT};

const NOT_A_DICT: &str = "value is not a valid dict";
const NOT_A_STRING: &str = "str type expected";
const NOT_A_BOOL: &str = "value is not a valid boolean";
const NOT_AN_INTEGER: &str = "value is not a valid integer";
const NOT_A_LIST: &str = "value is not a valid list";
const NONE_NOT_ALLOWED: &str = "none is not an allowed value";

/// A constraint violation below a top-level field.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Violation {
    /// Dotted path inside the top-level field; empty for the field itself.
    path: String,
    message: String,
}

impl Violation {
    fn render(&self, top: &str) -> String {
        if self.path.is_empty() {
            format!("{top}: {}", self.message)
        } else {
            format!("{top}: {}: {}", self.path, self.message)
        }
    }
}

/// Validate a (possibly partial) settings document.
///
/// Unknown keys are ignored. Returns an empty list when the payload is valid.
pub fn validate_document(payload: &Value) -> Vec<String> {
    let Some(map) = payload.as_object() else {
        return vec![format!("__root__: {NOT_A_DICT}")];
    };

    let mut errors = Vec::new();
    for spec in DOCUMENT {
        if let Some(value) = map.get(spec.name) {
            let mut violations = Vec::new();
            check_value(&spec.kind, value, "", &mut violations);
            errors.extend(violations.iter().map(|v| v.render(spec.name)));
        }
    }
    errors
}

/// Validate a partial payload for one named section.
///
/// An unrecognized section name yields a single
/// `"Invalid settings section: <name>"` error.
pub fn validate_section(section_name: &str, payload: &Value) -> Vec<String> {
    let section: Section = match section_name.parse() {
        Ok(section) => section,
        Err(e) => return vec![e],
    };

    let mut violations = Vec::new();
    check_value(&section.spec().kind, payload, "", &mut violations);
    violations
        .iter()
        .map(|v| v.render(section.as_str()))
        .collect()
}

/// Schema for the whole document, or for one section.
///
/// Unknown section names give an empty schema rather than an error: the
/// lookup is used for optional UI introspection.
pub fn get_section_schema(section_name: Option<&str>) -> Value {
    match section_name {
        None => schema::document_schema(),
        Some(name) => match name.parse::<Section>() {
            Ok(section) => schema::section_schema(section),
            Err(_) => json!({}),
        },
    }
}

fn check_value(kind: &FieldKind, value: &Value, path: &str, out: &mut Vec<Violation>) {
    let mut fail = |message: String| {
        out.push(Violation {
            path: path.to_string(),
            message,
        })
    };

    match *kind {
        FieldKind::Text { .. } => match value {
            Value::String(_) => {}
            Value::Null => fail(NONE_NOT_ALLOWED.to_string()),
            _ => fail(NOT_A_STRING.to_string()),
        },
        FieldKind::OptionalText => {
            if !(value.is_string() || value.is_null()) {
                fail(NOT_A_STRING.to_string());
            }
        }
        FieldKind::Bool { .. } => match value {
            Value::Bool(_) => {}
            Value::Null => fail(NONE_NOT_ALLOWED.to_string()),
            _ => fail(NOT_A_BOOL.to_string()),
        },
        FieldKind::Integer { min, max, .. } => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => match n.as_i64() {
                Some(v) if v < min => {
                    fail(format!("ensure this value is greater than or equal to {min}"))
                }
                Some(v) if v > max => {
                    fail(format!("ensure this value is less than or equal to {max}"))
                }
                Some(_) => {}
                // Above i64::MAX
                None => fail(format!("ensure this value is less than or equal to {max}")),
            },
            Value::Null => fail(NONE_NOT_ALLOWED.to_string()),
            _ => fail(NOT_AN_INTEGER.to_string()),
        },
        FieldKind::Choice { options, .. } => match value {
            Value::String(s) if options.contains(&s.as_str()) => {}
            Value::Null => fail(NONE_NOT_ALLOWED.to_string()),
            _ => fail(format!("unexpected value; permitted: {}", permitted(options))),
        },
        FieldKind::TextList { .. } => match value {
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    if !item.is_string() {
                        out.push(Violation {
                            path: join(path, &index.to_string()),
                            message: NOT_A_STRING.to_string(),
                        });
                    }
                }
            }
            Value::Null => fail(NONE_NOT_ALLOWED.to_string()),
            _ => fail(NOT_A_LIST.to_string()),
        },
        FieldKind::Object { fields, .. } => match value {
            Value::Object(map) => check_fields(fields, map, path, out),
            Value::Null => fail(NONE_NOT_ALLOWED.to_string()),
            _ => fail(NOT_A_DICT.to_string()),
        },
    }
}

fn check_fields(
    fields: &[FieldSpec],
    map: &Map<String, Value>,
    path: &str,
    out: &mut Vec<Violation>,
) {
    for spec in fields {
        if let Some(value) = map.get(spec.name) {
            check_value(&spec.kind, value, &join(path, spec.name), out);
        }
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn permitted(options: &[&str]) -> String {
    options
        .iter()
        .map(|o| format!("'{o}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::defaults::default_settings;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_document(&default_settings()).is_empty());
        for section in Section::ALL {
            let errors = validate_section(section.as_str(), &default_settings()[section.as_str()]);
            assert!(errors.is_empty(), "{section}: {errors:?}");
        }
    }

    #[test]
    fn test_validate_settings() {
        let valid = json!({
            "identity": { "name": "Test Bot", "primary_color": "#FF5500" },
            "behavior": { "tone": "friendly" }
        });
        assert!(validate_document(&valid).is_empty());

        let invalid = json!({
            "identity": { "name": "Test Bot" },
            "behavior": { "tone": "angry" }
        });
        let errors = validate_document(&invalid);
        assert_eq!(
            errors,
            vec![
                "behavior: tone: unexpected value; permitted: 'professional', 'friendly', 'technical', 'casual'"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_depth_out_of_range() {
        let errors = validate_document(&json!({ "knowledge": { "crawling": { "depth": 9 } } }));
        assert_eq!(
            errors,
            vec!["knowledge: crawling.depth: ensure this value is less than or equal to 5".to_string()]
        );

        let errors = validate_document(&json!({ "knowledge": { "crawling": { "depth": 0 } } }));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("greater than or equal to 1"));
    }

    #[test]
    fn test_retention_bounds() {
        assert!(validate_section("compliance", &json!({ "data_retention_days": 365 })).is_empty());
        assert!(validate_section("compliance", &json!({ "data_retention_days": 1 })).is_empty());
        let errors = validate_section("compliance", &json!({ "data_retention_days": 366 }));
        assert_eq!(
            errors,
            vec!["compliance: data_retention_days: ensure this value is less than or equal to 365".to_string()]
        );
    }

    #[test]
    fn test_type_errors_are_not_coerced() {
        let payload = json!({
            "knowledge": { "crawling": { "depth": "3", "enabled": "yes" } },
            "compliance": { "data_retention_days": 30.5 },
            "identity": { "name": 7 }
        });
        let errors = validate_document(&payload);
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(errors.contains(&"identity: name: str type expected".to_string()));
        assert!(errors.contains(&"knowledge: crawling.enabled: value is not a valid boolean".to_string()));
        assert!(errors.contains(&"knowledge: crawling.depth: value is not a valid integer".to_string()));
        assert!(errors.contains(&"compliance: data_retention_days: value is not a valid integer".to_string()));
    }

    #[test]
    fn test_all_errors_reported_at_once() {
        let payload = json!({
            "behavior": { "tone": "angry", "proactivity_level": "extreme" },
            "appearance": { "theme": "neon" }
        });
        assert_eq!(validate_document(&payload).len(), 3);
    }

    #[test]
    fn test_nulls() {
        assert!(validate_section("identity", &json!({ "logo_url": null })).is_empty());
        assert_eq!(
            validate_section("identity", &json!({ "name": null })),
            vec!["identity: name: none is not an allowed value".to_string()]
        );
    }

    #[test]
    fn test_list_items_must_be_strings() {
        let errors = validate_section(
            "integration",
            &json!({ "deployment": { "excluded_paths": ["/ok", 3] } }),
        );
        assert_eq!(
            errors,
            vec!["integration: deployment.excluded_paths.1: str type expected".to_string()]
        );
        let errors = validate_section("interaction", &json!({ "protected_selectors": "#nav" }));
        assert_eq!(
            errors,
            vec!["interaction: protected_selectors: value is not a valid list".to_string()]
        );
    }

    #[test]
    fn test_section_must_be_mapping() {
        assert_eq!(
            validate_document(&json!({ "identity": "Bot" })),
            vec!["identity: value is not a valid dict".to_string()]
        );
        assert_eq!(
            validate_section("behavior", &json!(["tone"])),
            vec!["behavior: value is not a valid dict".to_string()]
        );
        assert_eq!(
            validate_document(&json!("settings")),
            vec!["__root__: value is not a valid dict".to_string()]
        );
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let payload = json!({
            "experimental": { "anything": [1, 2, 3] },
            "behavior": { "mood": 42 }
        });
        assert!(validate_document(&payload).is_empty());
    }

    #[test]
    fn test_version_is_checked() {
        assert_eq!(
            validate_document(&json!({ "version": 2 })),
            vec!["version: str type expected".to_string()]
        );
    }

    #[test]
    fn test_unknown_section() {
        assert_eq!(
            validate_section("bogus", &json!({})),
            vec!["Invalid settings section: bogus".to_string()]
        );
        assert_eq!(
            validate_section("version", &json!("1.0")),
            vec!["Invalid settings section: version".to_string()]
        );
    }

    #[test]
    fn test_get_section_schema() {
        assert_eq!(get_section_schema(Some("bogus")), json!({}));

        let full = get_section_schema(None);
        assert_eq!(full["title"], "InstanceSettings");
        assert_eq!(full["properties"].as_object().unwrap().len(), 8);

        let appearance = get_section_schema(Some("appearance"));
        assert_eq!(appearance["properties"]["theme"]["default"], "light");
        assert_eq!(appearance, full["properties"]["appearance"]);
    }
}
