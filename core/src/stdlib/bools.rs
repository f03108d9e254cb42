//! Boolean logic, comparisons, and type predicates.

use crate::errors::RuntimeError;
use crate::stdlib::{boolean_arg, numeric_arg, Caller, RegistryBuilder};
use crate::types::{ReturnType, Signature, Type};
use crate::values::Value;

pub(super) fn register(builder: &mut RegistryBuilder) {
    let any_pair = || {
        Signature::new(
            vec![Type::Any, Type::Any],
            ReturnType::Fixed(Type::Boolean),
        )
    };
    builder.register("eq", any_pair(), eq);
    builder.register("ne", any_pair(), ne);

    let numeric_pair = || {
        Signature::new(
            vec![Type::Numeric, Type::Numeric],
            ReturnType::Fixed(Type::Boolean),
        )
    };
    builder.register("lt", numeric_pair(), lt);
    builder.register("lte", numeric_pair(), lte);
    builder.register("gt", numeric_pair(), gt);
    builder.register("gte", numeric_pair(), gte);

    let boolean_variadic = || {
        Signature::new(
            vec![Type::Boolean, Type::Boolean],
            ReturnType::Fixed(Type::Boolean),
        )
        .variadic(Type::Boolean)
    };
    builder.register("and", boolean_variadic(), and);
    builder.register("or", boolean_variadic(), or);
    builder.register(
        "xor",
        Signature::new(
            vec![Type::Boolean, Type::Boolean],
            ReturnType::Fixed(Type::Boolean),
        ),
        xor,
    );
    builder.register(
        "not",
        Signature::new(vec![Type::Boolean], ReturnType::Fixed(Type::Boolean)),
        not,
    );

    let predicate = || Signature::new(vec![Type::Any], ReturnType::Fixed(Type::Boolean));
    builder.register("is_null", predicate(), is_null);
    builder.register("is_array", predicate(), is_array);
    builder.register("is_map", predicate(), is_map);
    builder.register("is_string", predicate(), is_string);
    builder.register("is_bool", predicate(), is_bool);
    builder.register("is_int", predicate(), is_int);
    builder.register("is_float", predicate(), is_float);
    builder.register("is_numeric", predicate(), is_numeric);
}

fn eq(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Boolean(args[0].loose_eq(&args[1])))
}

fn ne(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Boolean(!args[0].loose_eq(&args[1])))
}

// Comparisons promote to f64 and compare IEEE-754.
fn compare(args: &[Value], op: fn(f64, f64) -> bool) -> Result<Value, RuntimeError> {
    let left = numeric_arg(&args[0])?.as_f64();
    let right = numeric_arg(&args[1])?.as_f64();
    Ok(Value::Boolean(op(left, right)))
}

fn lt(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    compare(args, |a, b| a < b)
}

fn lte(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    compare(args, |a, b| a <= b)
}

fn gt(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    compare(args, |a, b| a > b)
}

fn gte(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    compare(args, |a, b| a >= b)
}

fn and(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    for arg in args {
        if !boolean_arg(arg)? {
            return Ok(Value::Boolean(false));
        }
    }
    Ok(Value::Boolean(true))
}

fn or(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    for arg in args {
        if boolean_arg(arg)? {
            return Ok(Value::Boolean(true));
        }
    }
    Ok(Value::Boolean(false))
}

fn xor(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Boolean(boolean_arg(&args[0])? ^ boolean_arg(&args[1])?))
}

fn not(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Boolean(!boolean_arg(&args[0])?))
}

/// `null` parses to the empty string, so "null" means "empty string" here.
fn is_null(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Boolean(matches!(&args[0], Value::String(s) if s.is_empty())))
}

fn is_array(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Boolean(matches!(args[0], Value::Array(_))))
}

fn is_map(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Boolean(matches!(args[0], Value::Map(_))))
}

fn is_string(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Boolean(matches!(args[0], Value::String(_))))
}

fn is_bool(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Boolean(matches!(args[0], Value::Boolean(_))))
}

fn is_int(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Boolean(matches!(args[0], Value::Integer(_))))
}

fn is_float(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Boolean(matches!(args[0], Value::Float(_))))
}

fn is_numeric(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Boolean(matches!(
        args[0],
        Value::Integer(_) | Value::Float(_)
    )))
}
