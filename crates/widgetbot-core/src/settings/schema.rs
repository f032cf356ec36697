//! Static description of the instance settings document.
//!
//! Every field of the document is declared once here, with its type,
//! constraints and default. Default generation, validation and schema
//! introspection all walk this table.

use serde_json::{json, Map, Value};

/// Current settings document version.
pub const SETTINGS_VERSION: &str = "1.0";

/// Shape, constraints and default of a settings field.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Text {
        default: &'static str,
    },
    /// String that may be `null`; defaults to `null`.
    OptionalText,
    Bool {
        default: bool,
    },
    /// Integer within the inclusive range `min..=max`.
    Integer {
        default: i64,
        min: i64,
        max: i64,
    },
    /// String restricted to one of `options`.
    Choice {
        options: &'static [&'static str],
        default: &'static str,
    },
    TextList {
        default: &'static [&'static str],
    },
    Object {
        title: &'static str,
        description: &'static str,
        fields: &'static [FieldSpec],
    },
}

/// A named field of a settings record.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn text(name: &'static str, default: &'static str) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Text { default } }
}

const fn optional(name: &'static str) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::OptionalText }
}

const fn flag(name: &'static str, default: bool) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Bool { default } }
}

const fn integer(name: &'static str, default: i64, min: i64, max: i64) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Integer { default, min, max } }
}

const fn choice(
    name: &'static str,
    options: &'static [&'static str],
    default: &'static str,
) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Choice { options, default } }
}

const fn list(name: &'static str, default: &'static [&'static str]) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::TextList { default } }
}

const fn object(
    name: &'static str,
    title: &'static str,
    description: &'static str,
    fields: &'static [FieldSpec],
) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Object { title, description, fields } }
}

// ====== Sections ======

const IDENTITY: &[FieldSpec] = &[
    text("name", "AI Assistant"),
    text(
        "description",
        "Your AI assistant to help with website navigation and tasks.",
    ),
    optional("logo_url"),
    text("primary_color", "#3B82F6"),
    optional("secondary_color"),
    optional("accent_color"),
];

const CRAWLING: &[FieldSpec] = &[
    flag("enabled", true),
    integer("depth", 2, 1, 5),
    list("include_patterns", &[]),
    list("exclude_patterns", &["*/admin*", "*/login*"]),
    choice("frequency", &["daily", "weekly", "monthly", "manual"], "weekly"),
    flag("require_authentication", false),
];

const MANUAL_SOURCES: &[FieldSpec] = &[
    flag("enable_document_upload", true),
    flag("enable_faq_builder", true),
    flag("enable_knowledge_snippets", true),
];

const LEARNING: &[FieldSpec] = &[
    flag("enable_learning_from_interactions", true),
    flag("require_admin_review", true),
    flag("feedback_collection", true),
];

const KNOWLEDGE: &[FieldSpec] = &[
    object(
        "crawling",
        "WebsiteCrawlingSettings",
        "Settings for website crawling functionality.",
        CRAWLING,
    ),
    object(
        "manual_sources",
        "ManualKnowledgeSettings",
        "Settings for manual knowledge sources.",
        MANUAL_SOURCES,
    ),
    object(
        "learning",
        "LearningSettings",
        "Settings for agent learning capabilities.",
        LEARNING,
    ),
];

const BEHAVIOR: &[FieldSpec] = &[
    choice(
        "tone",
        &["professional", "friendly", "technical", "casual"],
        "friendly",
    ),
    choice("response_length", &["concise", "balanced", "detailed"], "balanced"),
    text("language", "en"),
    text(
        "greeting",
        "Hello! I'm your AI assistant. How can I help you today?",
    ),
    text(
        "fallback_message",
        "I'm not sure I understand. Could you please rephrase your question or request?",
    ),
    choice("proactivity_level", &["low", "medium", "high"], "medium"),
];

const ELEMENT_PERMISSIONS: &[FieldSpec] = &[
    flag("buttons", true),
    flag("forms", true),
    flag("links", true),
    flag("inputs", true),
    flag("file_uploads", false),
];

const INTERACTION: &[FieldSpec] = &[
    choice(
        "global_permission_level",
        &["read-only", "guided", "full"],
        "guided",
    ),
    object(
        "element_permissions",
        "ElementPermissionSettings",
        "Permission settings for DOM element interactions.",
        ELEMENT_PERMISSIONS,
    ),
    list("protected_selectors", &[]),
    flag("require_confirmation", true),
    text("highlight_color", "#3B82F6"),
    flag("highlight_animation", true),
    choice("interaction_speed", &["slow", "medium", "fast"], "medium"),
];

const APPEARANCE: &[FieldSpec] = &[
    choice(
        "position",
        &["bottom-right", "bottom-left", "top-right", "top-left"],
        "bottom-right",
    ),
    choice("size", &["small", "medium", "large"], "medium"),
    choice("theme", &["light", "dark", "auto"], "light"),
    flag("show_branding", true),
    optional("custom_css"),
    optional("bubble_icon_url"),
    choice("mobile_position", &["bottom", "top"], "bottom"),
];

const DEPLOYMENT: &[FieldSpec] = &[
    choice(
        "initialization",
        &["immediate", "delayed", "on-scroll", "on-exit-intent"],
        "delayed",
    ),
    list("excluded_paths", &[]),
    list("included_paths", &[]),
    flag("show_on_mobile", true),
];

const INTEGRATION: &[FieldSpec] = &[
    optional("crm_webhook_url"),
    flag("analytics_enabled", true),
    flag("enable_ticketing", false),
    flag("email_notifications", false),
    object(
        "deployment",
        "DeploymentSettings",
        "Widget deployment and integration settings.",
        DEPLOYMENT,
    ),
];

const COMPLIANCE: &[FieldSpec] = &[
    integer("data_retention_days", 90, 1, 365),
    flag("detect_pii", true),
    flag("mask_pii", true),
    flag("gdpr_compliance", true),
    flag("ccpa_compliance", true),
    flag("require_consent", true),
];

/// Root fields of the settings document, in document order.
pub const DOCUMENT: &[FieldSpec] = &[
    text("version", SETTINGS_VERSION),
    object(
        "identity",
        "IdentitySettings",
        "Identity and branding settings for an instance.",
        IDENTITY,
    ),
    object(
        "knowledge",
        "KnowledgeSettings",
        "Knowledge acquisition and management settings.",
        KNOWLEDGE,
    ),
    object(
        "behavior",
        "BehaviorSettings",
        "Agent behavior and communication settings.",
        BEHAVIOR,
    ),
    object(
        "interaction",
        "InteractionSettings",
        "Website interaction capabilities settings.",
        INTERACTION,
    ),
    object(
        "appearance",
        "AppearanceSettings",
        "Chat widget appearance settings.",
        APPEARANCE,
    ),
    object(
        "integration",
        "IntegrationSettings",
        "External integrations configuration.",
        INTEGRATION,
    ),
    object(
        "compliance",
        "ComplianceSettings",
        "Data handling and compliance settings.",
        COMPLIANCE,
    ),
];

/// One of the seven top-level settings sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Identity,
    Knowledge,
    Behavior,
    Interaction,
    Appearance,
    Integration,
    Compliance,
}

impl Section {
    pub const ALL: [Section; 7] = [
        Section::Identity,
        Section::Knowledge,
        Section::Behavior,
        Section::Interaction,
        Section::Appearance,
        Section::Integration,
        Section::Compliance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Identity => "identity",
            Section::Knowledge => "knowledge",
            Section::Behavior => "behavior",
            Section::Interaction => "interaction",
            Section::Appearance => "appearance",
            Section::Integration => "integration",
            Section::Compliance => "compliance",
        }
    }

    /// Root field describing this section.
    pub fn spec(&self) -> &'static FieldSpec {
        let spec = match self {
            Section::Identity => &DOCUMENT[1],
            Section::Knowledge => &DOCUMENT[2],
            Section::Behavior => &DOCUMENT[3],
            Section::Interaction => &DOCUMENT[4],
            Section::Appearance => &DOCUMENT[5],
            Section::Integration => &DOCUMENT[6],
            Section::Compliance => &DOCUMENT[7],
        };
        debug_assert_eq!(spec.name, self.as_str());
        spec
    }

    /// Fields of this section.
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            Section::Identity => IDENTITY,
            Section::Knowledge => KNOWLEDGE,
            Section::Behavior => BEHAVIOR,
            Section::Interaction => INTERACTION,
            Section::Appearance => APPEARANCE,
            Section::Integration => INTEGRATION,
            Section::Compliance => COMPLIANCE,
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| format!("Invalid settings section: {s}"))
    }
}

// ====== Introspection ======

/// Schema description of the whole settings document.
pub fn document_schema() -> Value {
    json!({
        "title": "InstanceSettings",
        "description": "Complete settings structure for an AI Agent instance.",
        "type": "object",
        "properties": properties(DOCUMENT),
    })
}

/// Schema description of a single section.
pub fn section_schema(section: Section) -> Value {
    field_schema(section.spec())
}

fn properties(fields: &[FieldSpec]) -> Value {
    let map: Map<String, Value> = fields
        .iter()
        .map(|spec| (spec.name.to_string(), field_schema(spec)))
        .collect();
    Value::Object(map)
}

fn field_schema(spec: &FieldSpec) -> Value {
    match spec.kind {
        FieldKind::Text { default } => json!({
            "title": title_case(spec.name),
            "type": "string",
            "default": default,
        }),
        FieldKind::OptionalText => json!({
            "title": title_case(spec.name),
            "type": ["string", "null"],
            "default": null,
        }),
        FieldKind::Bool { default } => json!({
            "title": title_case(spec.name),
            "type": "boolean",
            "default": default,
        }),
        FieldKind::Integer { default, min, max } => json!({
            "title": title_case(spec.name),
            "type": "integer",
            "minimum": min,
            "maximum": max,
            "default": default,
        }),
        FieldKind::Choice { options, default } => json!({
            "title": title_case(spec.name),
            "type": "string",
            "enum": options,
            "default": default,
        }),
        FieldKind::TextList { default } => json!({
            "title": title_case(spec.name),
            "type": "array",
            "items": { "type": "string" },
            "default": default,
        }),
        FieldKind::Object { title, description, fields } => json!({
            "title": title,
            "description": description,
            "type": "object",
            "properties": properties(fields),
        }),
    }
}

/// `primary_color` -> `Primary Color`
fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
