//! Instance settings engine: schema, defaults, merge and validation.

pub mod schema;
pub mod defaults;
pub mod merge;
pub mod validation;
pub mod migrate;

pub use defaults::{default_section, default_settings, default_settings_named};
pub use merge::{merge, merge_section};
pub use migrate::migrate_legacy;
pub use schema::{Section, SETTINGS_VERSION};
pub use validation::{get_section_schema, validate_document, validate_section};
