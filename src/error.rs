//! Error types for stage option resolution and encoding.

/// Errors raised while resolving or encoding stage container options.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// The run command only accepts a single-element entrypoint
    #[error("`Entrypoint` value `{entrypoint:?}` isn't supported in run command (only string)")]
    UnsupportedEntrypointArity { entrypoint: Vec<String> },

    /// The daemon version could not be reported or parsed
    #[error("container options preparing failed: {0}")]
    CapabilityQueryFailed(String),

    /// Options violate construction invariants
    #[error("invalid container options: {0}")]
    MergeInputInvalid(String),

    /// Build configuration could not be parsed or serialized
    #[error("configuration error: {0}")]
    Config(String),

    /// A referenced dimg does not exist in the configuration
    #[error("dimg not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for stage operations.
pub type Result<T> = std::result::Result<T, StageError>;

impl From<toml::de::Error> for StageError {
    fn from(err: toml::de::Error) -> Self {
        StageError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for StageError {
    fn from(err: toml::ser::Error) -> Self {
        StageError::Config(err.to_string())
    }
}
