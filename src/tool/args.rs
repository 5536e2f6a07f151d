//! Declared parameter types and the argument map handed to wrapped functions.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::tool::error::ArgumentError;

/// The declared type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    /// Whole numbers.
    Integer,
    /// Any JSON number.
    Float,
    /// UTF-8 text.
    String,
    /// `true` or `false`.
    Boolean,
    /// JSON arrays.
    Sequence,
    /// JSON objects.
    Mapping,
    /// No declared type; any value is accepted.
    #[default]
    Unknown,
}

impl TypeTag {
    /// Returns the lowercase name of this tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Sequence => "sequence",
            Self::Mapping => "mapping",
            Self::Unknown => "unknown",
        }
    }

    /// Returns the JSON Schema `type` keyword for this tag.
    ///
    /// `Unknown` has no schema type.
    #[must_use]
    pub const fn json_schema_type(self) -> Option<&'static str> {
        match self {
            Self::Integer => Some("integer"),
            Self::Float => Some("number"),
            Self::String => Some("string"),
            Self::Boolean => Some("boolean"),
            Self::Sequence => Some("array"),
            Self::Mapping => Some("object"),
            Self::Unknown => None,
        }
    }

    /// Checks whether a non-null JSON value satisfies this tag without coercion.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Float => value.is_number(),
            Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
            Self::Sequence => value.is_array(),
            Self::Mapping => value.is_object(),
            Self::Unknown => true,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes the kind of a JSON value for diagnostics.
#[must_use]
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// Maps a Rust parameter type to its [`TypeTag`].
///
/// Used by [`tool_fn!`](crate::tool_fn) to derive parameter descriptors from
/// the types written in a function signature.
pub trait Declared {
    /// The tag for this type.
    const TAG: TypeTag;
}

macro_rules! declare {
    ($tag:ident => $($ty:ty),+ $(,)?) => {
        $(impl Declared for $ty {
            const TAG: TypeTag = TypeTag::$tag;
        })+
    };
}

declare!(Integer => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
declare!(Float => f32, f64);
declare!(String => String, char);
declare!(Boolean => bool);
declare!(Mapping => Map<String, Value>);
declare!(Unknown => Value);

impl<T> Declared for Vec<T> {
    const TAG: TypeTag = TypeTag::Sequence;
}

impl<T> Declared for VecDeque<T> {
    const TAG: TypeTag = TypeTag::Sequence;
}

impl<V, S> Declared for HashMap<String, V, S> {
    const TAG: TypeTag = TypeTag::Mapping;
}

impl<V> Declared for BTreeMap<String, V> {
    const TAG: TypeTag = TypeTag::Mapping;
}

impl<V, S> Declared for IndexMap<String, V, S> {
    const TAG: TypeTag = TypeTag::Mapping;
}

impl<T: Declared> Declared for Option<T> {
    const TAG: TypeTag = T::TAG;
}

/// Validated arguments passed to a wrapped function.
///
/// By the time a function sees this map, every required parameter is present
/// and every omitted optional parameter has been filled with its default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Map<String, Value>,
}

impl Arguments {
    /// Creates an empty argument map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an argument value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Returns the raw JSON value of an argument.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Decodes an argument into `T`.
    ///
    /// A missing argument decodes as `null`, so `Option<T>` targets yield
    /// `None` rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::Missing`] when the argument is absent and `T`
    /// cannot be built from `null`, or [`ArgumentError::Invalid`] when the value
    /// does not decode into `T`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, ArgumentError> {
        match self.values.get(name) {
            Some(value) => T::deserialize(value).map_err(|e| ArgumentError::Invalid {
                name: name.to_string(),
                message: e.to_string(),
            }),
            None => T::deserialize(&Value::Null).map_err(|_| ArgumentError::Missing {
                name: name.to_string(),
            }),
        }
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over argument names and values.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Consumes the arguments, returning the underlying JSON object.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }
}

impl From<Map<String, Value>> for Arguments {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

impl FromIterator<(String, Value)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Arguments {
        match value {
            Value::Object(map) => Arguments::from(map),
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn integer_tag_rejects_strings_and_fractions() {
        assert!(TypeTag::Integer.accepts(&json!(5)));
        assert!(TypeTag::Integer.accepts(&json!(u64::MAX)));
        assert!(!TypeTag::Integer.accepts(&json!("5")));
        assert!(!TypeTag::Integer.accepts(&json!(5.5)));
    }

    #[test]
    fn float_tag_accepts_integers() {
        assert!(TypeTag::Float.accepts(&json!(2)));
        assert!(TypeTag::Float.accepts(&json!(2.5)));
        assert!(!TypeTag::Float.accepts(&json!(true)));
    }

    #[test]
    fn unknown_tag_accepts_everything() {
        for value in [json!(1), json!("x"), json!([1]), json!({"a": 1}), json!(false)] {
            assert!(TypeTag::Unknown.accepts(&value));
        }
    }

    #[test]
    fn declared_tags_follow_rust_types() {
        assert_eq!(<i32 as Declared>::TAG, TypeTag::Integer);
        assert_eq!(<f64 as Declared>::TAG, TypeTag::Float);
        assert_eq!(<String as Declared>::TAG, TypeTag::String);
        assert_eq!(<bool as Declared>::TAG, TypeTag::Boolean);
        assert_eq!(<Vec<String> as Declared>::TAG, TypeTag::Sequence);
        assert_eq!(<HashMap<String, i64> as Declared>::TAG, TypeTag::Mapping);
        assert_eq!(<Option<u8> as Declared>::TAG, TypeTag::Integer);
        assert_eq!(<Value as Declared>::TAG, TypeTag::Unknown);
    }

    #[test]
    fn schema_types() {
        assert_eq!(TypeTag::Float.json_schema_type(), Some("number"));
        assert_eq!(TypeTag::Mapping.json_schema_type(), Some("object"));
        assert_eq!(TypeTag::Unknown.json_schema_type(), None);
    }

    #[test]
    fn get_decodes_present_values() {
        let arguments = args(json!({"a": 2, "names": ["x", "y"]}));
        assert_eq!(arguments.get::<i64>("a"), Ok(2));
        assert_eq!(
            arguments.get::<Vec<String>>("names"),
            Ok(vec!["x".to_string(), "y".to_string()])
        );
    }

    #[test]
    fn get_missing_optional_is_none() {
        let arguments = Arguments::new();
        assert_eq!(arguments.get::<Option<i64>>("limit"), Ok(None));
    }

    #[test]
    fn get_missing_required_errors() {
        let arguments = Arguments::new();
        let err = arguments.get::<i64>("b").unwrap_err();
        assert_eq!(
            err,
            ArgumentError::Missing {
                name: "b".to_string()
            }
        );
    }

    #[test]
    fn get_wrong_type_errors() {
        let arguments = args(json!({"a": "five"}));
        let err = arguments.get::<i64>("a").unwrap_err();
        assert!(matches!(err, ArgumentError::Invalid { ref name, .. } if name == "a"));
    }

    #[test]
    fn value_kinds() {
        assert_eq!(value_kind(&json!(null)), "null");
        assert_eq!(value_kind(&json!(1)), "integer");
        assert_eq!(value_kind(&json!(1.5)), "float");
        assert_eq!(value_kind(&json!({})), "mapping");
    }
}
