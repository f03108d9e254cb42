//! Map functions. Maps keep insertion order, and overlay keeps the base
//! map's ordering for keys present in both.

use crate::errors::RuntimeError;
use crate::stdlib::{hashable_arg, map_arg, Caller, RegistryBuilder};
use crate::types::{ReturnType, Signature, Type};
use crate::values::{Hashable, Value};

pub(super) fn register(builder: &mut RegistryBuilder) {
    builder.register(
        "map_get",
        Signature::new(vec![Type::Map, Type::Hashable], ReturnType::Fixed(Type::Any))
            .optional(vec![Type::Any]),
        get,
    );
    builder.register(
        "map_get_non_empty",
        Signature::new(
            vec![Type::Map, Type::Hashable, Type::Any],
            ReturnType::Fixed(Type::Any),
        ),
        get_non_empty,
    );
    builder.register(
        "map_size",
        Signature::new(vec![Type::Map], ReturnType::Fixed(Type::Integer)),
        size,
    );
    builder.register(
        "map_contains",
        Signature::new(vec![Type::Map, Type::Hashable], ReturnType::Fixed(Type::Boolean)),
        contains,
    );
    builder.register(
        "map_keys",
        Signature::new(vec![Type::Map], ReturnType::Fixed(Type::Array)),
        keys,
    );
    builder.register(
        "map_values",
        Signature::new(vec![Type::Map], ReturnType::Fixed(Type::Array)),
        values,
    );
    builder.register(
        "map_overlay",
        Signature::new(vec![Type::Map, Type::Map], ReturnType::Fixed(Type::Map)),
        overlay,
    );
}

fn get(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let entries = map_arg(&args[0])?;
    let key = hashable_arg(&args[1])?;
    match entries.get(&key) {
        Some(value) => Ok(value.clone()),
        None => match args.get(2) {
            Some(default) => Ok(default.clone()),
            None => Err(RuntimeError::KeyNotFound { key: key.output() }),
        },
    }
}

/// Like `map_get` with a default, but also falls back when the stored value
/// is falsy.
fn get_non_empty(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let entries = map_arg(&args[0])?;
    let key = hashable_arg(&args[1])?;
    match entries.get(&key) {
        Some(value) if value.truthy() => Ok(value.clone()),
        _ => Ok(args[2].clone()),
    }
}

fn size(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Integer(map_arg(&args[0])?.len() as i64))
}

fn contains(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let entries = map_arg(&args[0])?;
    let key = hashable_arg(&args[1])?;
    Ok(Value::Boolean(entries.contains_key(&key)))
}

fn keys(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let entries = map_arg(&args[0])?;
    Ok(Value::Array(entries.keys().map(Hashable::to_value).collect()))
}

fn values(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let entries = map_arg(&args[0])?;
    Ok(Value::Array(entries.values().cloned().collect()))
}

fn overlay(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let base = map_arg(&args[0])?;
    let overlay = map_arg(&args[1])?;
    let mut out = base.clone();
    for (key, value) in overlay {
        out.insert(key.clone(), value.clone());
    }
    Ok(Value::Map(out))
}

#[cfg(test)]
mod tests {
    use crate::errors::RuntimeError;
    use crate::stdlib::test_support::run;
    use crate::values::{Hashable, Value};
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn map(entries: &[(&str, i64)]) -> Value {
        let mut out = IndexMap::new();
        for (key, value) in entries {
            out.insert(Hashable::String((*key).into()), Value::Integer(*value));
        }
        Value::Map(out)
    }

    #[test]
    fn get_falls_back_to_default_or_errors() {
        let m = map(&[("a", 1)]);
        assert_eq!(
            run("map_get", &[m.clone(), Value::String("a".into())]),
            Ok(Value::Integer(1))
        );
        assert_eq!(
            run(
                "map_get",
                &[m.clone(), Value::String("b".into()), Value::Integer(0)]
            ),
            Ok(Value::Integer(0))
        );
        assert_eq!(
            run("map_get", &[m, Value::String("b".into())]),
            Err(RuntimeError::KeyNotFound { key: "b".into() })
        );
    }

    #[test]
    fn get_non_empty_skips_falsy_values() {
        let m = map(&[("a", 0)]);
        assert_eq!(
            run(
                "map_get_non_empty",
                &[m, Value::String("a".into()), Value::Integer(7)]
            ),
            Ok(Value::Integer(7))
        );
    }

    #[test]
    fn overlay_right_wins_values_but_keeps_base_ordering() {
        let base = map(&[("a", 1), ("b", 2)]);
        let over = map(&[("b", 9), ("c", 3)]);
        let result = run("map_overlay", &[base, over]).unwrap();
        assert_eq!(result, map(&[("a", 1), ("b", 9), ("c", 3)]));
        let keys = run("map_keys", &[result]).unwrap();
        assert_eq!(
            keys,
            Value::Array(vec![
                Value::String("a".into()),
                Value::String("b".into()),
                Value::String("c".into()),
            ])
        );
    }

    #[test]
    fn keys_and_values_preserve_insertion_order() {
        let m = map(&[("z", 26), ("a", 1)]);
        assert_eq!(
            run("map_keys", &[m.clone()]),
            Ok(Value::Array(vec![
                Value::String("z".into()),
                Value::String("a".into()),
            ]))
        );
        assert_eq!(
            run("map_values", &[m]),
            Ok(Value::Array(vec![Value::Integer(26), Value::Integer(1)]))
        );
    }
}
