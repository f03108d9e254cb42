//! Casts between value categories.

use crate::errors::RuntimeError;
use crate::stdlib::{Caller, RegistryBuilder};
use crate::types::{ReturnType, Signature, Type};
use crate::values::Value;

pub(super) fn register(builder: &mut RegistryBuilder) {
    let scalar = || {
        Type::Union(vec![
            Type::String,
            Type::Integer,
            Type::Float,
            Type::Boolean,
        ])
    };
    builder.register(
        "int",
        Signature::new(vec![scalar()], ReturnType::Fixed(Type::Integer)),
        int,
    );
    builder.register(
        "float",
        Signature::new(vec![scalar()], ReturnType::Fixed(Type::Float)),
        float,
    );
    builder.register(
        "string",
        Signature::new(vec![Type::Any], ReturnType::Fixed(Type::String)),
        string,
    );
    builder.register(
        "bool",
        Signature::new(vec![Type::Any], ReturnType::Fixed(Type::Boolean)),
        bool_,
    );
    builder.register(
        "array",
        Signature::new(vec![Type::Any], ReturnType::Fixed(Type::Array)),
        array,
    );
    builder.register(
        "map",
        Signature::new(vec![Type::Map], ReturnType::Fixed(Type::Map)),
        map,
    );
}

fn cast_error(target: &'static str, value: &Value) -> RuntimeError {
    RuntimeError::Cast {
        target,
        value: value.to_string(),
    }
}

fn int(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let result = match &args[0] {
        Value::Integer(i) => *i,
        Value::Float(f) => *f as i64,
        Value::Boolean(b) => i64::from(*b),
        Value::String(s) => {
            let trimmed = s.trim();
            match trimmed.parse::<i64>() {
                Ok(i) => i,
                Err(_) => trimmed
                    .parse::<f64>()
                    .map(|f| f as i64)
                    .map_err(|_| cast_error("Integer", &args[0]))?,
            }
        }
        other => return Err(cast_error("Integer", other)),
    };
    Ok(Value::Integer(result))
}

fn float(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let result = match &args[0] {
        Value::Integer(i) => *i as f64,
        Value::Float(f) => *f,
        Value::Boolean(b) => f64::from(u8::from(*b)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| cast_error("Float", &args[0]))?,
        other => return Err(cast_error("Float", other)),
    };
    Ok(Value::Float(result))
}

fn string(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::String(args[0].output()))
}

fn bool_(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Boolean(args[0].truthy()))
}

/// Arrays pass through; anything else wraps into a singleton.
fn array(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    match &args[0] {
        Value::Array(_) => Ok(args[0].clone()),
        other => Ok(Value::Array(vec![other.clone()])),
    }
}

fn map(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    match &args[0] {
        Value::Map(_) => Ok(args[0].clone()),
        other => Err(cast_error("Map", other)),
    }
}
