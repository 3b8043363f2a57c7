//! Error types for the GWEN client.

use thiserror::Error;

/// Generic message used when a non-success response carries no `error` field.
pub const GENERIC_BACKEND_ERROR: &str = "Request failed";

/// A shared error type for the entire GWEN client.
///
/// The first four variants mirror the failure taxonomy of the session:
/// transport, backend, protocol and application errors. The remaining
/// variants cover local concerns (configuration, IO, lookups).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GwenError {
    /// The request could not be sent or the response could not be received.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// A stream line could not be decoded as a frame.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The backend sent an explicit error frame.
    #[error("{0}")]
    Application(String),

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },
}

impl GwenError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a Backend error, falling back to a generic message when the
    /// payload carried none.
    pub fn backend(status: u16, message: Option<String>) -> Self {
        Self::Backend {
            status,
            message: message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| GENERIC_BACKEND_ERROR.to_string()),
        }
    }

    /// Creates a Protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Creates an Application error
    pub fn application(message: impl Into<String>) -> Self {
        Self::Application(message.into())
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns the text shown to the user for this error.
    ///
    /// Backend and application errors surface the server's own message;
    /// everything else uses the full display form.
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend { message, .. } => message.clone(),
            Self::Application(message) => message.clone(),
            other => other.to_string(),
        }
    }

    /// Like [`user_message`](Self::user_message), but replaces anything that
    /// is not a specific server-provided message with `fallback`.
    pub fn user_message_or(&self, fallback: &str) -> String {
        match self {
            Self::Backend { message, .. } if message != GENERIC_BACKEND_ERROR => message.clone(),
            Self::Application(message) => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for GwenError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for GwenError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for GwenError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, GwenError>`.
pub type Result<T> = std::result::Result<T, GwenError>;
