//! Tool descriptors and the invocation wrapper around a callable.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::tool::args::{value_kind, Arguments};
use crate::tool::content::InvocationResult;
use crate::tool::error::{ArgumentError, ErrorKind, SignatureError};
use crate::tool::normalize::normalize;
use crate::tool::signature::{inspect, Callable, ParameterDescriptor};

/// Everything needed to advertise and invoke one tool.
///
/// Immutable once built. Cloning shares the underlying callable.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    parameters: Vec<ParameterDescriptor>,
    callable: Callable,
}

impl ToolDescriptor {
    /// Inspects a callable and applies the naming and description policy.
    ///
    /// The tool name is `name` if given, otherwise the callable's own name.
    /// The description is `description` if given, otherwise the callable's
    /// documentation, otherwise `Function <name>`.
    ///
    /// # Errors
    ///
    /// Returns a [`SignatureError`] if the callable cannot be inspected or the
    /// resulting name is empty.
    pub fn from_callable(
        callable: Callable,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Self, SignatureError> {
        let signature = inspect(&callable)?;

        let name = name.unwrap_or_else(|| callable.name().to_string());
        if name.is_empty() {
            return Err(SignatureError::EmptyName);
        }

        let description = description
            .filter(|d| !d.trim().is_empty())
            .or_else(|| Some(signature.doc).filter(|d| !d.is_empty()))
            .unwrap_or_else(|| format!("Function {name}"));

        Ok(Self {
            name,
            description,
            parameters: signature.parameters,
            callable,
        })
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tool description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    /// Returns the wrapped callable.
    #[must_use]
    pub const fn callable(&self) -> &Callable {
        &self.callable
    }

    /// Builds the JSON Schema describing the tool's arguments.
    #[must_use]
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            let mut property = Map::new();
            if let Some(schema_type) = param.type_tag.json_schema_type() {
                property.insert("type".to_string(), json!(schema_type));
            }
            if let Some(default) = &param.default {
                property.insert("default".to_string(), default.clone());
            }
            properties.insert(param.name.clone(), Value::Object(property));

            if param.required {
                required.push(json!(param.name));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Invokes a callable on behalf of the protocol server.
///
/// Failures never escape: missing or mistyped arguments, errors returned by
/// the function and panics inside it all come back as error content.
#[derive(Debug, Clone)]
pub struct ToolAdapter {
    descriptor: ToolDescriptor,
}

impl ToolAdapter {
    /// Wraps a descriptor.
    #[must_use]
    pub const fn new(descriptor: ToolDescriptor) -> Self {
        Self { descriptor }
    }

    /// Returns the wrapped descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    /// Validates `arguments`, calls the function and normalises its result.
    #[must_use]
    pub fn invoke(&self, arguments: &Map<String, Value>) -> InvocationResult {
        let prepared = match self.prepare(arguments) {
            Ok(prepared) => prepared,
            Err(rejection) => {
                debug!(
                    tool = %self.descriptor.name,
                    kind = ?rejection.error_kind(),
                    "Rejected tool arguments"
                );
                return rejection;
            }
        };

        let callable = &self.descriptor.callable;
        match panic::catch_unwind(AssertUnwindSafe(|| callable.call(&prepared))) {
            Ok(Ok(value)) => normalize(value),
            Ok(Err(error)) => {
                if let Some(argument_error) = error.downcast_ref::<ArgumentError>() {
                    return InvocationResult::error(
                        ErrorKind::TypeMismatch,
                        argument_error.to_string(),
                    );
                }
                let message = self.non_empty(error.to_string());
                debug!(tool = %self.descriptor.name, error = %message, "Tool returned an error");
                InvocationResult::error(ErrorKind::ExecutionError, message)
            }
            Err(payload) => {
                let message = self.non_empty(panic_message(payload.as_ref()));
                warn!(tool = %self.descriptor.name, panic = %message, "Tool panicked");
                InvocationResult::error(ErrorKind::ExecutionError, message)
            }
        }
    }

    /// Checks presence and types, then fills in defaults.
    fn prepare(&self, arguments: &Map<String, Value>) -> Result<Arguments, InvocationResult> {
        let missing: Vec<&str> = self
            .descriptor
            .parameters
            .iter()
            .filter(|p| p.required && !arguments.contains_key(&p.name))
            .map(|p| p.name.as_str())
            .collect();

        if !missing.is_empty() {
            let plural = if missing.len() == 1 { "" } else { "s" };
            return Err(InvocationResult::error(
                ErrorKind::MissingArgument,
                format!("Missing required argument{plural}: {}", missing.join(", ")),
            ));
        }

        let mut prepared = Arguments::new();
        for param in &self.descriptor.parameters {
            match arguments.get(&param.name) {
                Some(value) => {
                    if !param.accepts(value) {
                        return Err(InvocationResult::error(
                            ErrorKind::TypeMismatch,
                            format!(
                                "Argument '{}' expected {}, got {}",
                                param.name,
                                param.type_tag,
                                value_kind(value)
                            ),
                        ));
                    }
                    prepared.insert(param.name.clone(), value.clone());
                }
                None => {
                    if let Some(default) = &param.default {
                        prepared.insert(param.name.clone(), default.clone());
                    }
                }
            }
        }

        for name in arguments.keys() {
            if !self.descriptor.parameters.iter().any(|p| &p.name == name) {
                debug!(tool = %self.descriptor.name, argument = %name, "Ignoring undeclared argument");
            }
        }

        Ok(prepared)
    }

    fn non_empty(&self, message: String) -> String {
        if message.trim().is_empty() {
            format!("tool '{}' failed", self.descriptor.name)
        } else {
            message
        }
    }
}

/// Extracts the message carried by a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::args::TypeTag;
    use crate::tool::signature::ParamSpec;
    use crate::tool::value::{BoxError, ReturnValue};

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn greet() -> ToolAdapter {
        let callable = Callable::new("greet", |args: &Arguments| -> Result<String, BoxError> {
            let name: String = args.get("name")?;
            let greeting: String = args.get("greeting")?;
            let times: u32 = args.get("times")?;
            Ok(vec![format!("{greeting}, {name}!"); times as usize].join(" "))
        })
        .doc("Greets someone.")
        .param(ParamSpec::declared::<String>("name"))
        .param(ParamSpec::declared::<String>("greeting").with_default("Hello"))
        .param(ParamSpec::declared::<u32>("times").with_default(1));

        ToolAdapter::new(ToolDescriptor::from_callable(callable, None, None).unwrap())
    }

    #[test]
    fn description_policy() {
        let adapter = greet();
        assert_eq!(adapter.descriptor().name(), "greet");
        assert_eq!(adapter.descriptor().description(), "Greets someone.");

        let undocumented = Callable::new("noop", |_: &Arguments| ());
        let descriptor = ToolDescriptor::from_callable(undocumented.clone(), None, None).unwrap();
        assert_eq!(descriptor.description(), "Function noop");

        let descriptor = ToolDescriptor::from_callable(
            undocumented,
            Some("renamed".to_string()),
            Some("Does nothing.".to_string()),
        )
        .unwrap();
        assert_eq!(descriptor.name(), "renamed");
        assert_eq!(descriptor.description(), "Does nothing.");
    }

    #[test]
    fn empty_override_name_is_rejected() {
        let callable = Callable::new("noop", |_: &Arguments| ());
        let err = ToolDescriptor::from_callable(callable, Some(String::new()), None).unwrap_err();
        assert_eq!(err, SignatureError::EmptyName);
    }

    #[test]
    fn schema_lists_properties_in_order() {
        let schema = greet().descriptor().input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["name"]["type"], "string");
        assert_eq!(schema["properties"]["greeting"]["default"], "Hello");
        assert_eq!(schema["properties"]["times"]["type"], "integer");
        assert_eq!(schema["required"], json!(["name"]));
    }

    #[test]
    fn schema_omits_type_for_unknown() {
        let callable = Callable::new("echo", |args: &Arguments| args.raw("x").cloned())
            .param(ParamSpec::typed("x", TypeTag::Unknown));
        let descriptor = ToolDescriptor::from_callable(callable, None, None).unwrap();
        let schema = descriptor.input_schema();
        assert_eq!(schema["properties"]["x"], json!({}));
    }

    #[test]
    fn defaults_fill_omitted_arguments() {
        let result = greet().invoke(&object(json!({"name": "Ada"})));
        assert_eq!(result, InvocationResult::text("Hello, Ada!"));

        let result = greet().invoke(&object(json!({"name": "Ada", "times": 2})));
        assert_eq!(result, InvocationResult::text("Hello, Ada! Hello, Ada!"));
    }

    #[test]
    fn missing_argument_is_reported() {
        let result = greet().invoke(&Map::new());
        assert_eq!(result.error_kind(), Some(ErrorKind::MissingArgument));
        assert!(result.as_text().unwrap().contains("name"));
    }

    #[test]
    fn type_mismatch_is_reported_without_coercion() {
        let result = greet().invoke(&object(json!({"name": "Ada", "times": "2"})));
        assert_eq!(result.error_kind(), Some(ErrorKind::TypeMismatch));
        let message = result.as_text().unwrap();
        assert!(message.contains("times"));
        assert!(message.contains("integer"));
        assert!(message.contains("string"));
    }

    #[test]
    fn null_is_a_type_mismatch_for_typed_parameters() {
        let result = greet().invoke(&object(json!({"name": null})));
        assert_eq!(result.error_kind(), Some(ErrorKind::TypeMismatch));
    }

    #[test]
    fn undeclared_arguments_are_ignored() {
        let result = greet().invoke(&object(json!({"name": "Ada", "extra": 1})));
        assert_eq!(result, InvocationResult::text("Hello, Ada!"));
    }

    #[test]
    fn function_error_becomes_execution_error() {
        let callable = Callable::new("fail", |_: &Arguments| -> Result<(), BoxError> {
            Err("disk on fire".into())
        });
        let adapter = ToolAdapter::new(ToolDescriptor::from_callable(callable, None, None).unwrap());
        let result = adapter.invoke(&Map::new());
        assert_eq!(
            result,
            InvocationResult::error(ErrorKind::ExecutionError, "disk on fire")
        );
    }

    #[test]
    fn empty_error_message_gets_a_fallback() {
        let callable = Callable::new("quiet", |_: &Arguments| -> Result<(), BoxError> {
            Err(String::new().into())
        });
        let adapter = ToolAdapter::new(ToolDescriptor::from_callable(callable, None, None).unwrap());
        let result = adapter.invoke(&Map::new());
        assert_eq!(result.as_text(), Some("tool 'quiet' failed"));
    }

    #[test]
    fn panic_becomes_execution_error() {
        let callable = Callable::new("explode", |_: &Arguments| -> ReturnValue {
            panic!("kaboom");
        });
        let adapter = ToolAdapter::new(ToolDescriptor::from_callable(callable, None, None).unwrap());
        let result = adapter.invoke(&Map::new());
        assert_eq!(result.error_kind(), Some(ErrorKind::ExecutionError));
        assert_eq!(result.as_text(), Some("kaboom"));
    }

    #[test]
    fn extraction_failure_inside_function_is_type_mismatch() {
        let callable = Callable::new("sum", |args: &Arguments| -> Result<i64, BoxError> {
            let values: Vec<i64> = args.get("values")?;
            Ok(values.iter().sum())
        })
        .param(ParamSpec::declared::<Vec<i64>>("values"));
        let adapter = ToolAdapter::new(ToolDescriptor::from_callable(callable, None, None).unwrap());

        let ok = adapter.invoke(&object(json!({"values": [1, 2, 3]})));
        assert_eq!(ok, InvocationResult::text("6"));

        let bad = adapter.invoke(&object(json!({"values": [1, "two"]})));
        assert_eq!(bad.error_kind(), Some(ErrorKind::TypeMismatch));
    }
}
