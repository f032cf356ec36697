/// Core error types for widgetbot.
///
/// Settings validation failures are not errors: they are reported as lists
/// of field messages by [`crate::settings::validation`].
#[derive(Debug, thiserror::Error)]
pub enum WidgetbotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl WidgetbotError {
    /// True when the error means the requested instance does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, WidgetbotError::Store(StoreError::NotFound(_)))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Instance not found: {0}")]
    NotFound(String),

    #[error("Failed to read instance: {0}")]
    Read(String),

    #[error("Failed to write instance: {0}")]
    Write(String),

    #[error("Failed to serialize instance: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WidgetbotError>;
