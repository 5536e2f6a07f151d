//! Error types for the function-to-tool layer.
//!
//! Registration-time failures are [`SignatureError`]s and are returned to the
//! caller. Invocation-time failures never leave the adapter; they are reported
//! as [`ErrorKind`]-tagged error content instead.

use std::fmt;

use thiserror::Error;

/// Errors raised while inspecting a callable at registration time.
///
/// Each error aborts only the registration of the offending callable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// The callable carries no parameter list and cannot be described.
    #[error("callable '{name}' is opaque: no parameter descriptor was supplied")]
    Opaque {
        /// Name of the callable.
        name: String,
    },

    /// The callable (or the registration override) has an empty name.
    #[error("tool name must not be empty")]
    EmptyName,

    /// A parameter name is empty or contains characters outside `[A-Za-z0-9_]`.
    #[error("invalid parameter name '{parameter}' in '{function}'")]
    InvalidParameterName {
        /// Name of the callable.
        function: String,
        /// The rejected parameter name.
        parameter: String,
    },

    /// Two parameters share the same name.
    #[error("duplicate parameter '{parameter}' in '{function}'")]
    DuplicateParameter {
        /// Name of the callable.
        function: String,
        /// The repeated parameter name.
        parameter: String,
    },

    /// A default value could not be converted to JSON.
    #[error("default for parameter '{parameter}' in '{function}' is not serialisable: {message}")]
    InvalidDefault {
        /// Name of the callable.
        function: String,
        /// Parameter whose default failed.
        parameter: String,
        /// Serialiser message.
        message: String,
    },

    /// A default value does not match the parameter's declared type.
    #[error(
        "default for parameter '{parameter}' in '{function}' is {actual}, expected {expected}"
    )]
    DefaultTypeMismatch {
        /// Name of the callable.
        function: String,
        /// Parameter whose default is wrong.
        parameter: String,
        /// Declared type tag.
        expected: String,
        /// Kind of the supplied default.
        actual: String,
    },
}

/// Classification of an invocation-time failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required argument was not supplied.
    MissingArgument,
    /// An argument's JSON type does not match the declared type.
    TypeMismatch,
    /// The wrapped function returned an error or panicked.
    ExecutionError,
}

impl ErrorKind {
    /// Returns the stable name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingArgument => "MissingArgument",
            Self::TypeMismatch => "TypeMismatch",
            Self::ExecutionError => "ExecutionError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a wrapped function extracts an argument it cannot decode.
///
/// The adapter recognises this error when it comes back from a callable and
/// reports it as [`ErrorKind::TypeMismatch`] rather than an execution failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    /// The argument is not present at all.
    #[error("missing argument '{name}'")]
    Missing {
        /// Parameter name.
        name: String,
    },

    /// The argument is present but could not be decoded into the target type.
    #[error("argument '{name}' has the wrong type: {message}")]
    Invalid {
        /// Parameter name.
        name: String,
        /// Decoder message.
        message: String,
    },
}
