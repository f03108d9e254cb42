//! The built-in function registry.
//!
//! Every built-in is a pure `fn(&[Value]) -> Value` paired with a declarative
//! [`Signature`]; the registry is built once at startup (the builder panics
//! on duplicate names, a programmer error) and shared immutably afterwards.
//!
//! Higher-order built-ins receive a [`Caller`] so they can invoke lambda
//! arguments by name: dispatch goes back through the evaluator rather than
//! through captured closures, which keeps values serializable.
//!
//! Modules group functions by value category, one file per group.

mod array;
mod bools;
mod casts;
mod control;
mod date;
mod filepath;
mod map;
mod math;
mod string;


use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::errors::RuntimeError;
use crate::types::Signature;
use crate::values::{Hashable, Value};

/// Dispatch interface for invoking a named function (built-in or
/// user-defined) from inside a built-in.
pub trait Caller {
    fn call(&mut self, name: &str, args: &[Value]) -> Result<Value, RuntimeError>;
}

pub type NativeFn = fn(&mut dyn Caller, &[Value]) -> Result<Value, RuntimeError>;

/// One registered built-in.
pub struct BuiltIn {
    pub name: &'static str,
    pub signature: Signature,
    pub run: NativeFn,
}

/// The immutable table of built-ins.
pub struct Registry {
    functions: IndexMap<&'static str, BuiltIn>,
}

impl Registry {
    pub fn get(&self, name: &str) -> Option<&BuiltIn> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.functions.keys().copied()
    }
}

/// Startup-time builder. Registration panics on duplicates: two built-ins
/// sharing a name is a bug in the registration tables, not a runtime
/// condition.
#[derive(Default)]
pub struct RegistryBuilder {
    functions: IndexMap<&'static str, BuiltIn>,
}

impl RegistryBuilder {
    pub fn register(&mut self, name: &'static str, signature: Signature, run: NativeFn) {
        let previous = self.functions.insert(name, BuiltIn { name, signature, run });
        if previous.is_some() {
            panic!("duplicate built-in function name: {name}");
        }
    }

    pub fn build(self) -> Registry {
        Registry {
            functions: self.functions,
        }
    }
}

static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let mut builder = RegistryBuilder::default();
    bools::register(&mut builder);
    casts::register(&mut builder);
    math::register(&mut builder);
    string::register(&mut builder);
    array::register(&mut builder);
    map::register(&mut builder);
    control::register(&mut builder);
    date::register(&mut builder);
    filepath::register(&mut builder);
    builder.build()
});

/// The global registry, constructed on first use and immutable after.
pub fn registry() -> &'static Registry {
    &REGISTRY
}

// ----------------------------------------------------------------------
// Argument accessors
//
// Signatures make type mismatches unreachable for concretely-typed call
// sites; these guards cover values arriving through Any-typed parameters.
// ----------------------------------------------------------------------

fn type_error(expected: &'static str, actual: &Value) -> RuntimeError {
    RuntimeError::Type {
        expected,
        actual: actual.type_name(),
    }
}

pub(crate) fn string_arg(value: &Value) -> Result<&str, RuntimeError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(type_error("String", other)),
    }
}

pub(crate) fn integer_arg(value: &Value) -> Result<i64, RuntimeError> {
    match value {
        Value::Integer(i) => Ok(*i),
        other => Err(type_error("Integer", other)),
    }
}

pub(crate) fn boolean_arg(value: &Value) -> Result<bool, RuntimeError> {
    match value {
        Value::Boolean(b) => Ok(*b),
        other => Err(type_error("Boolean", other)),
    }
}

pub(crate) fn array_arg(value: &Value) -> Result<&[Value], RuntimeError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(type_error("Array", other)),
    }
}

pub(crate) fn map_arg(value: &Value) -> Result<&IndexMap<Hashable, Value>, RuntimeError> {
    match value {
        Value::Map(entries) => Ok(entries),
        other => Err(type_error("Map", other)),
    }
}

pub(crate) fn lambda_arg(value: &Value) -> Result<&str, RuntimeError> {
    match value {
        Value::Lambda(name) => Ok(name),
        other => Err(type_error("Lambda", other)),
    }
}

pub(crate) fn hashable_arg(value: &Value) -> Result<Hashable, RuntimeError> {
    Hashable::from_value(value).ok_or_else(|| type_error("Hashable", value))
}

/// An Integer-or-Float operand.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    pub(crate) fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

pub(crate) fn numeric_arg(value: &Value) -> Result<Num, RuntimeError> {
    match value {
        Value::Integer(i) => Ok(Num::Int(*i)),
        Value::Float(f) => Ok(Num::Float(*f)),
        other => Err(type_error("Numeric", other)),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Caller;
    use crate::errors::RuntimeError;
    use crate::values::Value;

    /// A caller for exercising built-ins that never invoke lambdas.
    pub struct NoLambdas;

    impl Caller for NoLambdas {
        fn call(&mut self, name: &str, _args: &[Value]) -> Result<Value, RuntimeError> {
            Err(RuntimeError::function(name, "no functions available"))
        }
    }

    /// Run a built-in by name against already-typed values.
    pub fn run(name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
        let builtin = super::registry().get(name).expect("registered built-in");
        (builtin.run)(&mut NoLambdas, args)
    }
}
