//! Descriptor generation from ordinary function signatures.

/// Builds a [`Callable`](crate::tool::Callable) for an existing function.
///
/// The parameter list is restated next to the function name; the compiler
/// checks it against the real function, so the descriptor cannot drift from
/// the signature. Parameter types supply the declared type tags, `= expr`
/// marks a parameter optional with that default, and doc comments become the
/// tool description. The function stays independently callable.
///
/// ```
/// use fnmcp::tool_fn;
///
/// fn greet(name: String, greeting: String) -> String {
///     format!("{greeting}, {name}!")
/// }
///
/// let callable = tool_fn!(
///     /// Greets someone.
///     greet(name: String, greeting: String = "Hello")
/// );
/// assert_eq!(callable.name(), "greet");
/// assert_eq!(greet("Ada".into(), "Hi".into()), "Hi, Ada!");
/// ```
#[macro_export]
macro_rules! tool_fn {
    (
        $(#[doc = $doc:literal])*
        $func:ident ( $( $arg:ident : $ty:ty $(= $default:expr)? ),* $(,)? )
    ) => {
        $crate::tool::Callable::new(
            ::std::stringify!($func),
            |args: &$crate::tool::Arguments|
                -> ::std::result::Result<$crate::tool::ReturnValue, $crate::tool::BoxError> {
                let _ = args;
                $( let $arg: $ty = args.get(::std::stringify!($arg))?; )*
                $crate::tool::IntoOutcome::into_outcome($func($($arg),*))
            },
        )
        .doc(::std::concat!($($doc, "\n"),*))
        $(
            .param(
                $crate::tool::ParamSpec::declared::<$ty>(::std::stringify!($arg))
                    $( .with_default($default) )?
            )
        )*
    };
}

#[cfg(test)]
mod tests {
    use crate::tool::{inspect, Arguments, ReturnValue, TypeTag};
    use serde_json::json;

    fn add(a: i64, b: i64) -> i64 {
        a + b
    }

    fn divide(a: f64, b: f64) -> Result<f64, String> {
        if b == 0.0 {
            return Err("division by zero".to_string());
        }
        Ok(a / b)
    }

    fn shout(words: Vec<String>, suffix: Option<String>) -> String {
        let mut text = words.join(" ").to_uppercase();
        text.push_str(suffix.as_deref().unwrap_or(""));
        text
    }

    #[test]
    fn generates_ordered_descriptor() {
        let callable = tool_fn!(
            /// Adds two integers.
            add(a: i64, b: i64 = 0)
        );
        let signature = inspect(&callable).unwrap();
        assert_eq!(callable.name(), "add");
        assert_eq!(signature.doc, "Adds two integers.");
        assert_eq!(signature.parameters[0].name, "a");
        assert_eq!(signature.parameters[0].type_tag, TypeTag::Integer);
        assert!(signature.parameters[0].required);
        assert_eq!(signature.parameters[1].default, Some(json!(0)));
    }

    #[test]
    fn generated_callable_decodes_arguments() {
        let callable = tool_fn!(add(a: i64, b: i64));
        let mut args = Arguments::new();
        args.insert("a", json!(2));
        args.insert("b", json!(3));
        assert_eq!(callable.call(&args).unwrap(), ReturnValue::Integer(5));
    }

    #[test]
    fn result_errors_surface() {
        let callable = tool_fn!(divide(a: f64, b: f64));
        let mut args = Arguments::new();
        args.insert("a", json!(1));
        args.insert("b", json!(0));
        let err = callable.call(&args).unwrap_err();
        assert_eq!(err.to_string(), "division by zero");
    }

    #[test]
    fn sequences_and_optional_defaults() {
        let callable = tool_fn!(shout(words: Vec<String>, suffix: Option<String> = None::<String>));
        let signature = inspect(&callable).unwrap();
        assert_eq!(signature.parameters[0].type_tag, TypeTag::Sequence);
        assert_eq!(signature.parameters[1].type_tag, TypeTag::String);
        assert!(!signature.parameters[1].required);

        let mut args = Arguments::new();
        args.insert("words", json!(["hi", "there"]));
        assert_eq!(
            callable.call(&args).unwrap(),
            ReturnValue::String("HI THERE".to_string())
        );
    }
}
