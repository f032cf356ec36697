use base64::Engine;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::settings::{default_settings, default_settings_named, merge};

/// An embeddable chat widget owned by a site operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub api_key: String,
    pub name: String,
    pub website_url: String,
    #[serde(default = "default_settings")]
    pub settings: Value,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// Request body for creating an instance.
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceCreate {
    pub name: String,
    pub website_url: String,
    #[serde(default)]
    pub settings: Option<Value>,
}

/// Request body for updating an instance. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstanceUpdate {
    pub name: Option<String>,
    pub website_url: Option<String>,
    pub settings: Option<Value>,
    pub is_active: Option<bool>,
}

impl Instance {
    /// Create a new instance with default settings.
    ///
    /// `identity.name` is seeded from the display name unless the supplied
    /// partial settings set it. Supplied settings must already be validated.
    pub fn new(owner_id: Option<&str>, data: InstanceCreate) -> Self {
        let defaults = default_settings_named(&data.name);
        let settings = match &data.settings {
            Some(partial) => merge(&defaults, partial),
            None => defaults,
        };
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.map(|s| s.to_string()),
            api_key: generate_api_key(),
            name: data.name,
            website_url: data.website_url,
            settings,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an update; settings are merged field by field.
    pub fn apply(&mut self, update: InstanceUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(url) = update.website_url {
            self.website_url = url;
        }
        if let Some(active) = update.is_active {
            self.is_active = active;
        }
        if let Some(partial) = update.settings {
            self.settings = merge(&self.settings, &partial);
        }
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Generate a widget API key: `sk_` followed by 32 random bytes, url-safe base64.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!(
        "sk_{}",
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create(name: &str, settings: Option<Value>) -> InstanceCreate {
        InstanceCreate {
            name: name.to_string(),
            website_url: "https://example.com".to_string(),
            settings,
        }
    }

    #[test]
    fn test_generate_api_key() {
        let key = generate_api_key();
        assert!(key.starts_with("sk_"));
        assert_eq!(key.len(), 3 + 43);
        assert!(key[3..]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(key, generate_api_key());
    }

    #[test]
    fn test_new_instance_seeds_identity_name() {
        let instance = Instance::new(Some("user-1"), create("Help Desk", None));
        assert_eq!(instance.settings["identity"]["name"], "Help Desk");
        assert_eq!(instance.settings["behavior"]["tone"], "friendly");
        assert_eq!(instance.owner_id.as_deref(), Some("user-1"));
        assert!(instance.is_active);
        assert_eq!(instance.created_at, instance.updated_at);
    }

    #[test]
    fn test_new_instance_merges_supplied_settings() {
        let settings = json!({
            "identity": { "name": "Custom" },
            "appearance": { "theme": "dark" }
        });
        let instance = Instance::new(None, create("Help Desk", Some(settings)));
        assert_eq!(instance.settings["identity"]["name"], "Custom");
        assert_eq!(instance.settings["appearance"]["theme"], "dark");
        assert_eq!(instance.settings["appearance"]["size"], "medium");
    }

    #[test]
    fn test_apply_update() {
        let mut instance = Instance::new(None, create("Bot", None));
        instance.apply(InstanceUpdate {
            name: Some("Renamed".to_string()),
            is_active: Some(false),
            settings: Some(json!({ "behavior": { "language": "de" } })),
            ..Default::default()
        });
        assert_eq!(instance.name, "Renamed");
        assert!(!instance.is_active);
        assert_eq!(instance.settings["behavior"]["language"], "de");
        assert_eq!(instance.settings["behavior"]["tone"], "friendly");
        assert_eq!(instance.website_url, "https://example.com");
    }

    #[test]
    fn test_record_without_settings_loads_defaults() {
        let json = r#"{
            "id": "abc",
            "api_key": "sk_test",
            "name": "Old Bot",
            "website_url": "https://example.com",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }"#;
        let mut instance: Instance = serde_json::from_str(json).unwrap();
        assert_eq!(instance.settings, default_settings());
        assert!(instance.is_active);

        instance.apply(InstanceUpdate {
            settings: Some(json!({ "appearance": { "theme": "dark" } })),
            ..Default::default()
        });
        assert_eq!(instance.settings["appearance"]["theme"], "dark");
        assert_eq!(instance.settings["compliance"]["data_retention_days"], 90);
    }

    #[test]
    fn test_instance_serde_roundtrip() {
        let instance = Instance::new(Some("owner"), create("Bot", None));
        let json = serde_json::to_string(&instance).unwrap();
        let parsed: Instance = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, instance);
    }
}
