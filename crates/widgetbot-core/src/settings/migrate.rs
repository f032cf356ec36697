use serde_json::Value;

use super::defaults::default_settings_named;
use super::schema::Section;

/// Rebuild a settings document written before the sectioned schema existed.
///
/// Starts from the defaults (with `identity.name` taken from the instance
/// name) and copies over, section by section, every legacy key that the
/// current schema still knows. Unknown sections and keys are dropped.
pub fn migrate_legacy(legacy: &Value, instance_name: &str) -> Value {
    let mut migrated = default_settings_named(instance_name);
    let Some(legacy) = legacy.as_object() else {
        return migrated;
    };
    let Some(target) = migrated.as_object_mut() else {
        return default_settings_named(instance_name);
    };

    for section in Section::ALL {
        let Some(old) = legacy.get(section.as_str()).and_then(Value::as_object) else {
            continue;
        };
        let Some(new) = target
            .get_mut(section.as_str())
            .and_then(Value::as_object_mut)
        else {
            continue;
        };
        for (key, value) in old {
            if new.contains_key(key) {
                new.insert(key.clone(), value.clone());
            }
        }
    }
    migrated
}
