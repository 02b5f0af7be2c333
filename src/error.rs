//! Error types for the scout engine.
//!
//! Chain, provider and source failures arrive as [`SearchError`] and keep
//! their stable codes. Configuration and file errors are added here.

use scout_search::SearchError;

/// Top-level error type for the research engine.
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    /// A provider chain or source failed.
    #[error(transparent)]
    Chain(#[from] SearchError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML.
    #[error("TOML error: {0}")]
    Toml(String),
}

impl ScoutError {
    /// Stable error code, shared with [`SearchError::code`] for chain errors.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Chain(inner) => inner.code(),
            Self::Config(_) => scout_search::error::error_codes::CONFIG_INVALID,
            Self::Io(_) => "IO_ERROR",
            Self::Toml(_) => "TOML_INVALID",
        }
    }
}

impl From<toml::de::Error> for ScoutError {
    fn from(err: toml::de::Error) -> Self {
        Self::Toml(err.to_string())
    }
}

impl From<toml::ser::Error> for ScoutError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Toml(err.to_string())
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ScoutError>;
