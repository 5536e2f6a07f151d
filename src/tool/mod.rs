//! Function-to-tool adaptation.
//!
//! This module turns ordinary functions into tools a protocol server can
//! advertise and call:
//!
//! ```text
//!   Callable ──▶ inspect() ──▶ ToolDescriptor ──▶ ToolAdapter::invoke()
//!                (signature)                         │
//!                                                    ▼
//!                               function ──▶ normalize() ──▶ InvocationResult
//! ```
//!
//! - [`signature`] — callables, parameter descriptors and inspection
//! - [`normalize`] — return value to content conversion
//! - [`adapter`] — tool descriptors and the invocation wrapper
//!
//! Registration-time problems surface as [`SignatureError`]. Invocation-time
//! problems never escape [`ToolAdapter::invoke`]; they come back as
//! [`InvocationResult::Error`] tagged with an [`ErrorKind`].

pub mod adapter;
pub mod args;
pub mod content;
pub mod error;
mod macros;
pub mod normalize;
pub mod signature;
pub mod value;

pub use adapter::{ToolAdapter, ToolDescriptor};
pub use args::{Arguments, Declared, TypeTag};
pub use content::InvocationResult;
pub use error::{ArgumentError, ErrorKind, SignatureError};
pub use normalize::{canonical_float, canonical_json, normalize};
pub use signature::{inspect, Callable, Handler, ParamSpec, ParameterDescriptor, Signature};
pub use value::{BoxError, Image, IntoOutcome, ReturnValue};
