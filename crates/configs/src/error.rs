use thiserror::Error;

/// Errors raised while loading or interpreting settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid duration '{value}': {reason}")]
    InvalidDuration { value: String, reason: String },
}
