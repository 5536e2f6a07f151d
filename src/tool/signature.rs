//! Callables and their parameter descriptors.
//!
//! A [`Callable`] pairs a function with the metadata a dynamic language would
//! read from the function itself: its name, documentation and an ordered list
//! of parameters. [`inspect`] validates that metadata and turns it into the
//! [`Signature`] used to build a tool.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::tool::args::{value_kind, Arguments, Declared, TypeTag};
use crate::tool::error::SignatureError;
use crate::tool::value::{BoxError, IntoOutcome, ReturnValue};

/// The type-erased function behind a [`Callable`].
pub type Handler = dyn Fn(&Arguments) -> Result<ReturnValue, BoxError> + Send + Sync;

/// A parameter as supplied by the caller, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    name: String,
    type_tag: TypeTag,
    default: Option<Result<Value, String>>,
}

impl ParamSpec {
    /// Creates an untyped parameter.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::typed(name, TypeTag::Unknown)
    }

    /// Creates a parameter with an explicit type tag.
    #[must_use]
    pub fn typed(name: impl Into<String>, type_tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            type_tag,
            default: None,
        }
    }

    /// Creates a parameter whose tag is derived from the Rust type `T`.
    #[must_use]
    pub fn declared<T: Declared + ?Sized>(name: impl Into<String>) -> Self {
        Self::typed(name, T::TAG)
    }

    /// Makes the parameter optional with the given default.
    #[must_use]
    pub fn with_default<T: Serialize>(mut self, default: T) -> Self {
        self.default = Some(serde_json::to_value(default).map_err(|e| e.to_string()));
        self
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A function together with the metadata needed to expose it as a tool.
///
/// Cloning is cheap; the function itself is shared.
#[derive(Clone)]
pub struct Callable {
    name: String,
    doc: String,
    params: Option<Vec<ParamSpec>>,
    handler: Arc<Handler>,
}

impl Callable {
    /// Wraps a function that takes validated arguments.
    ///
    /// The parameter list starts empty; add parameters with [`Callable::param`].
    pub fn new<F, R>(name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&Arguments) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        Self {
            name: name.into(),
            doc: String::new(),
            params: Some(Vec::new()),
            handler: Arc::new(move |args: &Arguments| function(args).into_outcome()),
        }
    }

    /// Wraps a function without any parameter descriptor.
    ///
    /// Such a callable can still be called directly, but [`inspect`] rejects
    /// it until parameters are supplied.
    pub fn opaque<F, R>(name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&Arguments) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        let mut callable = Self::new(name, function);
        callable.params = None;
        callable
    }

    /// Sets the documentation string.
    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.get_or_insert_with(Vec::new).push(spec);
        self
    }

    /// Returns the callable's own name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Calls the function directly, bypassing argument validation.
    ///
    /// # Errors
    ///
    /// Returns whatever error the function produces.
    pub fn call(&self, args: &Arguments) -> Result<ReturnValue, BoxError> {
        (self.handler)(args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("doc", &self.doc)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A validated parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDescriptor {
    /// Parameter name, unique within its function.
    pub name: String,
    /// Declared type.
    pub type_tag: TypeTag,
    /// Value used when the caller omits the argument.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// `true` iff there is no default.
    pub required: bool,
}

impl ParameterDescriptor {
    /// Checks whether an argument value is acceptable for this parameter.
    ///
    /// `null` is only accepted for untyped parameters and for parameters whose
    /// default is itself `null`.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            return self.type_tag == TypeTag::Unknown || self.default == Some(Value::Null);
        }
        self.type_tag.accepts(value)
    }
}

/// The inspected shape of a callable.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    /// Parameters in declaration order.
    pub parameters: Vec<ParameterDescriptor>,
    /// Normalised documentation; empty when absent.
    pub doc: String,
}

/// Extracts the parameter list and documentation of a callable.
///
/// # Errors
///
/// Returns a [`SignatureError`] if the callable has no descriptor, an empty
/// name, or a malformed parameter list.
pub fn inspect(callable: &Callable) -> Result<Signature, SignatureError> {
    if callable.name.is_empty() {
        return Err(SignatureError::EmptyName);
    }

    let specs = callable
        .params
        .as_ref()
        .ok_or_else(|| SignatureError::Opaque {
            name: callable.name.clone(),
        })?;

    let mut seen = HashSet::new();
    let mut parameters = Vec::with_capacity(specs.len());

    for spec in specs {
        if !is_valid_parameter_name(&spec.name) {
            return Err(SignatureError::InvalidParameterName {
                function: callable.name.clone(),
                parameter: spec.name.clone(),
            });
        }
        if !seen.insert(spec.name.as_str()) {
            return Err(SignatureError::DuplicateParameter {
                function: callable.name.clone(),
                parameter: spec.name.clone(),
            });
        }

        let default = match &spec.default {
            None => None,
            Some(Err(message)) => {
                return Err(SignatureError::InvalidDefault {
                    function: callable.name.clone(),
                    parameter: spec.name.clone(),
                    message: message.clone(),
                });
            }
            Some(Ok(value)) => {
                if !value.is_null() && !spec.type_tag.accepts(value) {
                    return Err(SignatureError::DefaultTypeMismatch {
                        function: callable.name.clone(),
                        parameter: spec.name.clone(),
                        expected: spec.type_tag.to_string(),
                        actual: value_kind(value).to_string(),
                    });
                }
                Some(value.clone())
            }
        };

        parameters.push(ParameterDescriptor {
            name: spec.name.clone(),
            type_tag: spec.type_tag,
            required: default.is_none(),
            default,
        });
    }

    Ok(Signature {
        parameters,
        doc: normalise_doc(&callable.doc),
    })
}

fn is_valid_parameter_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Joins doc lines, strips the common indentation and trims blank edges.
fn normalise_doc(doc: &str) -> String {
    let lines: Vec<&str> = doc.lines().map(str::trim_end).collect();

    let indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let dedented: Vec<&str> = lines
        .iter()
        .map(|line| line.get(indent..).unwrap_or(""))
        .collect();

    dedented.join("\n").trim_matches('\n').to_string()
}
