//! Array functions, including the higher-order apply/reduce family.
//!
//! Higher-order functions take a lambda value and dispatch it by name through
//! the [`Caller`], so a lambda may be a built-in or a user-defined function
//! interchangeably.

use crate::errors::RuntimeError;
use crate::stdlib::string::clamp_index;
use crate::stdlib::{array_arg, boolean_arg, integer_arg, lambda_arg, Caller, RegistryBuilder};
use crate::types::{ReturnType, Signature, Type};
use crate::values::Value;

pub(super) fn register(builder: &mut RegistryBuilder) {
    builder.register(
        "array_size",
        Signature::new(vec![Type::Array], ReturnType::Fixed(Type::Integer)),
        size,
    );
    builder.register(
        "array_extend",
        Signature::new(vec![Type::Array, Type::Array], ReturnType::Fixed(Type::Array))
            .variadic(Type::Array),
        extend,
    );
    builder.register(
        "array_overlay",
        Signature::new(vec![Type::Array, Type::Array], ReturnType::Fixed(Type::Array))
            .optional(vec![Type::Boolean]),
        overlay,
    );
    builder.register(
        "array_at",
        Signature::new(vec![Type::Array, Type::Integer], ReturnType::Fixed(Type::Any)),
        at,
    );
    builder.register(
        "array_first",
        Signature::new(vec![Type::Array, Type::Any], ReturnType::Fixed(Type::Any)),
        first,
    );
    builder.register(
        "array_contains",
        Signature::new(vec![Type::Array, Type::Any], ReturnType::Fixed(Type::Boolean)),
        contains,
    );
    builder.register(
        "array_index",
        Signature::new(vec![Type::Array, Type::Any], ReturnType::Fixed(Type::Integer)),
        index,
    );
    builder.register(
        "array_slice",
        Signature::new(vec![Type::Array, Type::Integer], ReturnType::Fixed(Type::Array))
            .optional(vec![Type::Integer]),
        slice,
    );
    builder.register(
        "array_flatten",
        Signature::new(vec![Type::Array], ReturnType::Fixed(Type::Array)),
        flatten,
    );
    builder.register(
        "array_reverse",
        Signature::new(vec![Type::Array], ReturnType::Fixed(Type::Array)),
        reverse,
    );
    builder.register(
        "array_product",
        Signature::new(vec![Type::Array, Type::Array], ReturnType::Fixed(Type::Array))
            .variadic(Type::Array),
        product,
    );
    builder.register(
        "array_apply",
        Signature::new(
            vec![Type::Array, Type::Lambda(1)],
            ReturnType::Fixed(Type::Array),
        ),
        apply,
    );
    builder.register(
        "array_apply_fixed",
        Signature::new(
            vec![Type::Array, Type::LambdaFixed],
            ReturnType::Fixed(Type::Array),
        )
        .variadic(Type::Any),
        apply_fixed,
    );
    builder.register(
        "array_enumerate",
        Signature::new(
            vec![Type::Array, Type::Lambda(2)],
            ReturnType::Fixed(Type::Array),
        ),
        enumerate,
    );
    builder.register(
        "array_reduce",
        Signature::new(
            vec![Type::Array, Type::LambdaReduce],
            ReturnType::Fixed(Type::Any),
        ),
        reduce,
    );
}

fn size(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Integer(array_arg(&args[0])?.len() as i64))
}

fn extend(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let mut out = Vec::new();
    for arg in args {
        out.extend_from_slice(array_arg(arg)?);
    }
    Ok(Value::Array(out))
}

/// Positional overlay. By default the overlay wins every index it covers;
/// with `only_missing` the base wins and only the overlay's tail past the
/// base's length is taken.
fn overlay(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let base = array_arg(&args[0])?;
    let overlay = array_arg(&args[1])?;
    let only_missing = match args.get(2) {
        Some(arg) => boolean_arg(arg)?,
        None => false,
    };

    let len = base.len().max(overlay.len());
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let pick_base = if only_missing {
            i < base.len()
        } else {
            i >= overlay.len()
        };
        if pick_base {
            out.push(base[i].clone());
        } else {
            out.push(overlay[i].clone());
        }
    }
    Ok(Value::Array(out))
}

fn resolve_index(index: i64, len: usize) -> Result<usize, RuntimeError> {
    let resolved = if index < 0 {
        len as i64 + index
    } else {
        index
    };
    if resolved < 0 || resolved as usize >= len {
        return Err(RuntimeError::IndexOutOfBounds { index, size: len });
    }
    Ok(resolved as usize)
}

fn at(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let items = array_arg(&args[0])?;
    let index = resolve_index(integer_arg(&args[1])?, items.len())?;
    Ok(items[index].clone())
}

/// First truthy element, or the fallback.
fn first(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let items = array_arg(&args[0])?;
    for item in items {
        if item.truthy() {
            return Ok(item.clone());
        }
    }
    Ok(args[1].clone())
}

fn contains(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let items = array_arg(&args[0])?;
    Ok(Value::Boolean(items.iter().any(|item| item.loose_eq(&args[1]))))
}

fn index(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let items = array_arg(&args[0])?;
    match items.iter().position(|item| item.loose_eq(&args[1])) {
        Some(position) => Ok(Value::Integer(position as i64)),
        None => Err(RuntimeError::function(
            "array_index",
            format!("array does not contain {}", args[1]),
        )),
    }
}

fn slice(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let items = array_arg(&args[0])?;
    let start = clamp_index(integer_arg(&args[1])?, items.len());
    let end = match args.get(2) {
        Some(arg) => clamp_index(integer_arg(arg)?, items.len()),
        None => items.len(),
    };
    let sliced = if start < end {
        items[start..end].to_vec()
    } else {
        Vec::new()
    };
    Ok(Value::Array(sliced))
}

/// Flatten one level: array elements splice in, everything else passes
/// through.
fn flatten(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let items = array_arg(&args[0])?;
    let mut out = Vec::new();
    for item in items {
        match item {
            Value::Array(inner) => out.extend_from_slice(inner),
            other => out.push(other.clone()),
        }
    }
    Ok(Value::Array(out))
}

fn reverse(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let mut items = array_arg(&args[0])?.to_vec();
    items.reverse();
    Ok(Value::Array(items))
}

/// Cartesian product: an array of tuples (as arrays), in row-major order.
fn product(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let mut tuples: Vec<Vec<Value>> = vec![Vec::new()];
    for arg in args {
        let axis = array_arg(arg)?;
        let mut next = Vec::with_capacity(tuples.len() * axis.len());
        for tuple in &tuples {
            for item in axis {
                let mut extended = tuple.clone();
                extended.push(item.clone());
                next.push(extended);
            }
        }
        tuples = next;
    }
    Ok(Value::Array(tuples.into_iter().map(Value::Array).collect()))
}

fn apply(caller: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let items = array_arg(&args[0])?;
    let lambda = lambda_arg(&args[1])?.to_string();
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(caller.call(&lambda, std::slice::from_ref(item))?);
    }
    Ok(Value::Array(out))
}

/// Apply with extra fixed arguments: the lambda receives
/// `(element, fixed...)` for each element.
fn apply_fixed(caller: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let items = array_arg(&args[0])?;
    let lambda = lambda_arg(&args[1])?.to_string();
    let fixed = &args[2..];
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let mut call_args = Vec::with_capacity(1 + fixed.len());
        call_args.push(item.clone());
        call_args.extend_from_slice(fixed);
        out.push(caller.call(&lambda, &call_args)?);
    }
    Ok(Value::Array(out))
}

/// Apply with the element index: the lambda receives `(index, element)`.
fn enumerate(caller: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let items = array_arg(&args[0])?;
    let lambda = lambda_arg(&args[1])?.to_string();
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        out.push(caller.call(&lambda, &[Value::Integer(i as i64), item.clone()])?);
    }
    Ok(Value::Array(out))
}

fn reduce(caller: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let items = array_arg(&args[0])?;
    let lambda = lambda_arg(&args[1])?.to_string();
    let mut iter = items.iter();
    let Some(first) = iter.next() else {
        return Err(RuntimeError::function(
            "array_reduce",
            "cannot reduce an empty array",
        ));
    };
    let mut accumulator = first.clone();
    for item in iter {
        accumulator = caller.call(&lambda, &[accumulator, item.clone()])?;
    }
    Ok(accumulator)
}
