//! Crate-level error types.
//!
//! Failures split into two layers: static errors surfaced while a script is
//! being parsed and validated (see [`crate::parser::ParseError`]), and runtime
//! errors raised while expressions evaluate. [`ScriptError`] is the resolver's
//! public error type and wraps both, plus the graph-level failures that have
//! no single source position.

use thiserror::Error;

use crate::parser::ParseError;

/// A failure inside an evaluating function.
///
/// Signature checking makes most type errors unreachable; the `Type` variant
/// remains as a guard for values that arrive through `Any`-typed parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("Array index {index} is out of bounds for an array of size {size}")]
    IndexOutOfBounds { index: i64, size: usize },

    #[error("Map does not contain the key {key}")]
    KeyNotFound { key: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Cannot cast {value} to {target}")]
    Cast { target: &'static str, value: String },

    #[error("Invalid date: {message}")]
    Date { message: String },

    #[error("Invalid regular expression: {message}")]
    Regex { message: String },

    #[error("Expected {expected}, got {actual}")]
    Type {
        expected: &'static str,
        actual: &'static str,
    },

    /// Raised by the `throw` built-in to surface a user-authored message.
    #[error("{0}")]
    UserThrown(String),

    /// Guard for evaluation outside a validated script; resolution order
    /// makes this unreachable through [`crate::script::Script`].
    #[error("Variable '{0}' is not in scope")]
    UnboundVariable(String),

    /// Guard for a `$N` placeholder with no active call frame; static
    /// validation makes this unreachable through [`crate::script::Script`].
    #[error("Argument ${index} of %{function} is not bound")]
    UnboundArgument { index: usize, function: String },

    #[error("Runtime error from %{function}: {message}")]
    Function { function: String, message: String },
}

impl RuntimeError {
    /// Precondition failure attributed to a named built-in.
    pub fn function(name: &str, message: impl Into<String>) -> Self {
        RuntimeError::Function {
            function: name.to_string(),
            message: message.into(),
        }
    }
}

/// Any failure produced by [`crate::script::Script`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("Cycle detected within these variables: {}", path.join(" -> "))]
    VariableCycle { path: Vec<String> },

    #[error("Cycle detected within these functions: {}", path.join(" -> "))]
    FunctionCycle { path: Vec<String> },

    #[error("Variable '{0}' has not been resolved")]
    NotResolved(String),

    #[error("Variable '{0}' was marked unresolvable")]
    Unresolvable(String),
}
