use thiserror::Error;

// Fatal errors raised while setting up or binding a form. These indicate a
// programming error in the field declarations, not bad input data, so they
// propagate to the caller instead of landing in the report.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid field path `{path}`: {reason}")]
    Path { path: String, reason: String },

    #[error("unknown {kind} `{name}`")]
    UnknownOperation { kind: &'static str, name: String },

    // A sanitizer or validator primitive rejected its own arguments.
    #[error("operation `{name}` failed: {reason}")]
    Operation { name: String, reason: String },
}

// Type alias for results that use `ConfigError` as the error type.
pub type Result<T> = std::result::Result<T, ConfigError>;
