use thiserror::Error;

/// Result type for chunker operations
pub type Result<T> = std::result::Result<T, ChunkerError>;

/// Errors that can occur while configuring or running the pipeline
#[derive(Error, Debug)]
pub enum ChunkerError {
    /// Invalid configuration values
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configured regex failed to compile
    #[error("Invalid pattern for {scope}: {pattern} ({reason})")]
    InvalidPattern {
        scope: String,
        pattern: String,
        reason: String,
    },

    /// Configuration bytes were neither valid JSON nor valid TOML
    #[error("Config parse error: {0}")]
    ConfigParse(String),

    /// No part produced any text
    #[error("Empty content provided")]
    EmptyInput,
}

impl ChunkerError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an invalid pattern error from a regex failure
    pub fn invalid_pattern(
        scope: impl Into<String>,
        pattern: impl Into<String>,
        err: &regex::Error,
    ) -> Self {
        Self::InvalidPattern {
            scope: scope.into(),
            pattern: pattern.into(),
            reason: err.to_string(),
        }
    }

    /// Create a config parse error
    pub fn config_parse(msg: impl Into<String>) -> Self {
        Self::ConfigParse(msg.into())
    }
}

/// Compile a configured pattern, tagging failures with where it came from.
pub(crate) fn compile_pattern(scope: &str, pattern: &str) -> Result<regex::Regex> {
    regex::Regex::new(pattern).map_err(|err| ChunkerError::invalid_pattern(scope, pattern, &err))
}
