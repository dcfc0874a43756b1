//! Error types for the analyzer.

use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AnalyzerError {
    #[error("{message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Provider answered with a non-2xx status; `message` is its raw body.
    #[error("{message}")]
    ProviderHttp { status: u16, message: String },

    /// Provider flagged an error in its body; `message` is its own text.
    #[error("{message}")]
    ProviderReported { message: String },

    #[error("Malformed provider response: {message}")]
    MalformedBody { message: String },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl AnalyzerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// HTTP status the caller sees for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            _ => 500,
        }
    }

    /// Short machine-readable label used in the journal.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Config { .. } => "configuration",
            Self::Transport { .. } => "transport",
            Self::ProviderHttp { .. } => "provider_http",
            Self::ProviderReported { .. } => "provider_reported",
            Self::MalformedBody { .. } => "malformed_body",
            Self::Toml(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
