use std::fmt;

/// Failures outside the engine: config, feed parsing, window bounds, IO.
/// `reconcile` itself never returns one.
#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty name, missing input path, no window).
    ConfigValidation(String),
    /// A window bound that is not a `YYYY-MM-DD` date.
    DateParse { field: String, value: String },
    /// A feed that is not the expected JSON shape.
    Json { source_name: String, message: String },
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::DateParse { field, value } => {
                write!(f, "{field}: cannot parse date '{value}' (expected YYYY-MM-DD)")
            }
            Self::Json { source_name, message } => {
                write!(f, "{source_name}: invalid JSON: {message}")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
