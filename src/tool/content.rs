//! The protocol-facing outcome of a single tool invocation.

use serde_json::Value;

use crate::tool::error::ErrorKind;

/// Content produced by one invocation of a tool.
///
/// Exactly one variant describes each outcome. Wrapped functions may also
/// return an `InvocationResult` directly, in which case it is passed through
/// untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationResult {
    /// Plain text.
    Text(String),
    /// Binary image data with its mime type.
    Image {
        /// Raw image bytes.
        data: Vec<u8>,
        /// Mime type such as `image/png`.
        mime_type: String,
    },
    /// A JSON value for clients that understand structured results.
    Structured(Value),
    /// A recoverable failure reported back to the caller.
    Error {
        /// Human-readable message.
        message: String,
        /// What went wrong.
        kind: ErrorKind,
    },
}

impl InvocationResult {
    /// Creates a text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Creates an error result.
    #[must_use]
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            kind,
        }
    }

    /// Returns `true` for the error variant.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Returns the error kind, if this is an error.
    #[must_use]
    pub const fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Error { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Returns the text of a text result or the message of an error result.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) | Self::Error { message: text, .. } => Some(text.as_str()),
            _ => None,
        }
    }
}
