use crate::error::ConfigError;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;
