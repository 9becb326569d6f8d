//! Error types for tonetwist.

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToneTwistError {
    // Request validation errors (caller's fault)
    #[error("{message}")]
    Validation { message: String },

    #[error("Audio duration is too long. Please use audio shorter than {max_secs} seconds.")]
    DurationExceeded { max_secs: u64 },

    // Audio conversion errors
    #[error("Audio conversion failed: {message}")]
    Conversion { message: String },

    // Provider errors
    #[error("{provider} API error ({status}): {message}")]
    Upstream {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("{provider} returned no usable result")]
    EmptyResult { provider: &'static str },

    #[error("Failed to reach {provider}: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },

    // Stream collection errors
    #[error("Stream collection timed out after {}ms", timeout.as_millis())]
    Timeout { timeout: Duration },

    #[error("Stream error: {message}")]
    Stream { message: String },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Configuration error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ToneTwistError>;

impl ToneTwistError {
    /// Shorthand for a request validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// HTTP-style status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            Self::Validation { .. } | Self::DurationExceeded { .. } => 400,
            Self::Upstream { status, .. } if (400..600).contains(status) => *status,
            Self::Upstream { .. } | Self::Transport { .. } => 502,
            Self::Timeout { .. } => 504,
            Self::Conversion { .. }
            | Self::EmptyResult { .. }
            | Self::Stream { .. }
            | Self::Config { .. }
            | Self::ConfigParse(_)
            | Self::Io(_)
            | Self::Other(_) => 500,
        }
    }

    /// Human-readable message that is safe to show to the caller.
    ///
    /// Raw provider bodies, paths and process output stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message } => message.clone(),
            Self::DurationExceeded { .. } => self.to_string(),
            Self::Conversion { .. } => "Failed to convert audio format.".to_string(),
            Self::Upstream {
                provider, message, ..
            } => format!("{provider} API Error: {message}"),
            Self::EmptyResult { provider } => format!("Failed to get a result from {provider}."),
            Self::Transport { provider, .. } => format!("Could not reach {provider}."),
            Self::Timeout { .. } => "Audio synthesis timed out. The request may be too long or \
                                    the service is experiencing delays."
                .to_string(),
            Self::Stream { .. } => "Failed to read the synthesized audio stream.".to_string(),
            Self::Config { message } => format!("Configuration error: {message}"),
            Self::ConfigParse(_) | Self::Io(_) | Self::Other(_) => {
                "An unexpected server error occurred.".to_string()
            }
        }
    }
}

/// Pipeline stage an error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Stage {
    Transcription,
    Enhancement,
    Synthesis,
}

impl Stage {
    /// Label used in user-facing messages and log fields.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Transcription => "Transcription",
            Stage::Enhancement => "Enhancement",
            Stage::Synthesis => "Synthesis",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An error tagged with the pipeline stage that produced it.
#[derive(Error, Debug)]
#[error("{stage} failed: {}", error.user_message())]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub error: ToneTwistError,
}

impl StageError {
    pub fn new(stage: Stage, error: ToneTwistError) -> Self {
        Self { stage, error }
    }

    /// HTTP-style status code of the underlying error.
    pub fn status(&self) -> u16 {
        self.error.status()
    }

    /// Structured `{ message, httpStatus }` form handed to the outer layer.
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            status: self.status(),
        }
    }
}

/// Error payload returned by every boundary operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip)]
    pub status: u16,
}
