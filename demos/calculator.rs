//! A calculator MCP server.
//!
//! Serves over stdio by default, or over TCP with `--tcp [PORT]`:
//!
//! ```text
//! cargo run --example calculator
//! cargo run --example calculator -- --tcp 8000
//! ```
//!
//! Register it with Cursor:
//!
//! ```text
//! fnmcp cursor add-server calculator target/debug/examples/calculator
//! ```

use std::process::ExitCode;

use fnmcp::config::RunOptions;
use fnmcp::mcp::DEFAULT_HOST;
use fnmcp::server::{RegisterOptions, ToolServer};
use fnmcp::tool::{Arguments, BoxError, Callable, ParamSpec, TypeTag};
use fnmcp::tool_fn;

fn add(a: i64, b: i64) -> i64 {
    a + b
}

fn multiply(a: f64, b: f64) -> f64 {
    a * b
}

fn divide(a: f64, b: f64) -> Result<f64, String> {
    if b == 0.0 {
        return Err("Cannot divide by zero".to_string());
    }
    Ok(a / b)
}

fn power(base: f64, exponent: i32) -> f64 {
    base.powi(exponent)
}

fn build_server() -> ToolServer {
    let mut server = ToolServer::new("calculator")
        .with_instructions("Basic arithmetic. All tools take numbers.".to_string());

    let batch = server.register_all([
        tool_fn!(
            /// Add two integers.
            add(a: i64, b: i64)
        ),
        tool_fn!(
            /// Multiply two numbers.
            multiply(a: f64, b: f64)
        ),
        tool_fn!(
            /// Divide a by b.
            divide(a: f64, b: f64)
        ),
        tool_fn!(power(base: f64, exponent: i32 = 2)),
    ]);
    for (name, error) in &batch.failed {
        eprintln!("skipped {name}: {error}");
    }

    // Explicit descriptor, registered under a different name.
    let average = Callable::new("mean", |args: &Arguments| -> Result<f64, BoxError> {
        let values: Vec<f64> = args.get("values")?;
        if values.is_empty() {
            return Err("no values given".into());
        }
        #[allow(clippy::cast_precision_loss)]
        let count = values.len() as f64;
        Ok(values.iter().sum::<f64>() / count)
    })
    .param(ParamSpec::typed("values", TypeTag::Sequence));

    if let Err(e) = server.register(
        average,
        RegisterOptions::named("average").with_description("Arithmetic mean of a list of numbers."),
    ) {
        eprintln!("skipped average: {e}");
    }

    server
}

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let options = match args.next().as_deref() {
        Some("--tcp") => {
            let port = args.next().and_then(|p| p.parse().ok()).unwrap_or(8000);
            RunOptions::tcp(DEFAULT_HOST, port)
        }
        _ => RunOptions::default(),
    };

    match build_server().run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("calculator: {e}");
            ExitCode::FAILURE
        }
    }
}
