//! Values returned by wrapped functions, before normalisation.
//!
//! Rust functions return concrete types, so the shapes a tool may produce are
//! collected into [`ReturnValue`]. The [`IntoOutcome`] trait converts common
//! return types into it, which lets ordinary functions be wrapped without any
//! protocol awareness.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::tool::content::InvocationResult;

/// Boxed error type returned by wrapped functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What a wrapped function handed back.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnValue {
    /// Already protocol-native content; passed through unchanged.
    Content(InvocationResult),
    /// An image to be sent as binary content.
    Image(Image),
    /// Any integer.
    Integer(i128),
    /// A floating-point number.
    Float(f64),
    /// Text.
    String(String),
    /// A boolean.
    Boolean(bool),
    /// A JSON array.
    Sequence(Vec<Value>),
    /// A JSON object.
    Mapping(Map<String, Value>),
    /// No value.
    None,
    /// Something only known through its `Display` form.
    Display(String),
}

impl ReturnValue {
    /// Wraps a value that has no better representation than its `Display` output.
    #[must_use]
    pub fn display(value: impl fmt::Display) -> Self {
        Self::Display(value.to_string())
    }

    /// Classifies an arbitrary JSON value.
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::None,
            Value::Bool(b) => Self::Boolean(b),
            Value::Number(n) => n
                .as_i64()
                .map(i128::from)
                .or_else(|| n.as_u64().map(i128::from))
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Integer),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Sequence(items),
            Value::Object(map) => Self::Mapping(map),
        }
    }

    /// Serialises any value and classifies the result.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be represented as JSON.
    pub fn serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, BoxError> {
        Ok(Self::from_json(serde_json::to_value(value)?))
    }
}

/// An image returned by a tool.
///
/// The mime type is worked out when the image is normalised: an explicit
/// format wins, then the source file extension, then the leading bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    data: Vec<u8>,
    format: Option<String>,
    path: Option<PathBuf>,
}

impl Image {
    /// Creates an image from raw bytes.
    #[must_use]
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            format: None,
            path: None,
        }
    }

    /// Reads an image from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        Ok(Self {
            data,
            format: None,
            path: Some(path.to_path_buf()),
        })
    }

    /// Sets an explicit format such as `png` or `jpeg`.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Returns the raw image bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the explicit format, if one was set.
    #[must_use]
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// Returns the file the image was read from, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Consumes the image, returning its bytes.
    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Converts a function's return value into a [`ReturnValue`].
///
/// `Result<T, E>` maps `Err` to a failure, which the adapter reports as an
/// execution error.
pub trait IntoOutcome {
    /// Performs the conversion.
    ///
    /// # Errors
    ///
    /// Returns the function's own error, or a serialisation error for values
    /// that cannot be represented as JSON.
    fn into_outcome(self) -> Result<ReturnValue, BoxError>;
}

impl IntoOutcome for ReturnValue {
    fn into_outcome(self) -> Result<ReturnValue, BoxError> {
        Ok(self)
    }
}

impl IntoOutcome for InvocationResult {
    fn into_outcome(self) -> Result<ReturnValue, BoxError> {
        Ok(ReturnValue::Content(self))
    }
}

impl IntoOutcome for Image {
    fn into_outcome(self) -> Result<ReturnValue, BoxError> {
        Ok(ReturnValue::Image(self))
    }
}

macro_rules! integer_outcome {
    ($($ty:ty),+ $(,)?) => {
        $(impl IntoOutcome for $ty {
            fn into_outcome(self) -> Result<ReturnValue, BoxError> {
                Ok(ReturnValue::Integer(i128::from(self)))
            }
        })+
    };
}

integer_outcome!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

impl IntoOutcome for isize {
    fn into_outcome(self) -> Result<ReturnValue, BoxError> {
        Ok(ReturnValue::Integer(i128::try_from(self)?))
    }
}

impl IntoOutcome for usize {
    fn into_outcome(self) -> Result<ReturnValue, BoxError> {
        Ok(ReturnValue::Integer(i128::try_from(self)?))
    }
}

impl IntoOutcome for f32 {
    fn into_outcome(self) -> Result<ReturnValue, BoxError> {
        // Widening adds digits (0.1 -> 0.10000000149011612); go through the
        // f32's own shortest text instead.
        if !self.is_finite() {
            return Ok(ReturnValue::Float(f64::from(self)));
        }
        Ok(ReturnValue::Float(self.to_string().parse::<f64>()?))
    }
}

impl IntoOutcome for f64 {
    fn into_outcome(self) -> Result<ReturnValue, BoxError> {
        Ok(ReturnValue::Float(self))
    }
}

impl IntoOutcome for bool {
    fn into_outcome(self) -> Result<ReturnValue, BoxError> {
        Ok(ReturnValue::Boolean(self))
    }
}

impl IntoOutcome for String {
    fn into_outcome(self) -> Result<ReturnValue, BoxError> {
        Ok(ReturnValue::String(self))
    }
}

impl IntoOutcome for &str {
    fn into_outcome(self) -> Result<ReturnValue, BoxError> {
        Ok(ReturnValue::String(self.to_string()))
    }
}

impl IntoOutcome for char {
    fn into_outcome(self) -> Result<ReturnValue, BoxError> {
        Ok(ReturnValue::String(self.to_string()))
    }
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<ReturnValue, BoxError> {
        Ok(ReturnValue::None)
    }
}

impl IntoOutcome for Value {
    fn into_outcome(self) -> Result<ReturnValue, BoxError> {
        Ok(ReturnValue::from_json(self))
    }
}

impl IntoOutcome for Map<String, Value> {
    fn into_outcome(self) -> Result<ReturnValue, BoxError> {
        Ok(ReturnValue::Mapping(self))
    }
}

impl<T: Serialize> IntoOutcome for Vec<T> {
    fn into_outcome(self) -> Result<ReturnValue, BoxError> {
        ReturnValue::serialize(&self)
    }
}

impl<K, V, S> IntoOutcome for HashMap<K, V, S>
where
    K: Serialize + Eq + Hash,
    V: Serialize,
    S: BuildHasher,
{
    fn into_outcome(self) -> Result<ReturnValue, BoxError> {
        ReturnValue::serialize(&self)
    }
}

impl<K: Serialize + Ord, V: Serialize> IntoOutcome for BTreeMap<K, V> {
    fn into_outcome(self) -> Result<ReturnValue, BoxError> {
        ReturnValue::serialize(&self)
    }
}

impl<K: Serialize, V: Serialize, S> IntoOutcome for IndexMap<K, V, S> {
    fn into_outcome(self) -> Result<ReturnValue, BoxError> {
        ReturnValue::serialize(&self)
    }
}

impl<T: IntoOutcome> IntoOutcome for Option<T> {
    fn into_outcome(self) -> Result<ReturnValue, BoxError> {
        self.map_or(Ok(ReturnValue::None), IntoOutcome::into_outcome)
    }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoOutcome,
    E: Into<BoxError>,
{
    fn into_outcome(self) -> Result<ReturnValue, BoxError> {
        match self {
            Ok(value) => value.into_outcome(),
            Err(error) => Err(error.into()),
        }
    }
}
