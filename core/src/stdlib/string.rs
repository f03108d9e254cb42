//! String functions. Indices are char-based, Python-flavored: negatives count
//! from the end, out-of-range slice bounds clamp.

use regex::Regex;

use crate::errors::RuntimeError;
use crate::stdlib::{array_arg, integer_arg, string_arg, Caller, RegistryBuilder};
use crate::types::{ReturnType, Signature, Type};
use crate::values::Value;

pub(super) fn register(builder: &mut RegistryBuilder) {
    let unary = || Signature::new(vec![Type::String], ReturnType::Fixed(Type::String));
    builder.register("capitalize", unary(), capitalize);
    builder.register("lower", unary(), lower);
    builder.register("upper", unary(), upper);

    builder.register(
        "slice",
        Signature::new(
            vec![Type::String, Type::Integer],
            ReturnType::Fixed(Type::String),
        )
        .optional(vec![Type::Integer]),
        slice,
    );
    builder.register(
        "replace",
        Signature::new(
            vec![Type::String, Type::String, Type::String],
            ReturnType::Fixed(Type::String),
        )
        .optional(vec![Type::Integer]),
        replace,
    );
    builder.register(
        "concat",
        Signature::new(
            vec![Type::String, Type::String],
            ReturnType::Fixed(Type::String),
        )
        .variadic(Type::String),
        concat,
    );
    builder.register(
        "contains",
        Signature::new(
            vec![Type::String, Type::String],
            ReturnType::Fixed(Type::Boolean),
        ),
        contains,
    );
    builder.register(
        "split",
        Signature::new(
            vec![Type::String, Type::String],
            ReturnType::Fixed(Type::Array),
        )
        .optional(vec![Type::Integer]),
        split,
    );
    builder.register(
        "join",
        Signature::new(
            vec![Type::String, Type::Array],
            ReturnType::Fixed(Type::String),
        ),
        join,
    );

    builder.register(
        "regex_match",
        Signature::new(
            vec![Type::String, Type::String],
            ReturnType::Fixed(Type::Boolean),
        ),
        regex_match,
    );
    builder.register(
        "regex_search",
        Signature::new(
            vec![Type::String, Type::String],
            ReturnType::Fixed(Type::Boolean),
        ),
        regex_search,
    );
    builder.register(
        "regex_capture",
        Signature::new(
            vec![Type::String, Type::String],
            ReturnType::Fixed(Type::Array),
        )
        .optional(vec![Type::Array]),
        regex_capture,
    );
}

fn capitalize(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let s = string_arg(&args[0])?;
    let mut chars = s.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    };
    Ok(Value::String(capitalized))
}

fn lower(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::String(string_arg(&args[0])?.to_lowercase()))
}

fn upper(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::String(string_arg(&args[0])?.to_uppercase()))
}

/// Clamp a possibly-negative index into `0..=len`.
pub(super) fn clamp_index(index: i64, len: usize) -> usize {
    if index < 0 {
        len.saturating_sub(index.unsigned_abs() as usize)
    } else {
        (index as usize).min(len)
    }
}

fn slice(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let chars: Vec<char> = string_arg(&args[0])?.chars().collect();
    let start = clamp_index(integer_arg(&args[1])?, chars.len());
    let end = match args.get(2) {
        Some(arg) => clamp_index(integer_arg(arg)?, chars.len()),
        None => chars.len(),
    };
    let sliced: String = if start < end {
        chars[start..end].iter().collect()
    } else {
        String::new()
    };
    Ok(Value::String(sliced))
}

fn replace(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let s = string_arg(&args[0])?;
    let from = string_arg(&args[1])?;
    let to = string_arg(&args[2])?;
    let replaced = match args.get(3) {
        Some(arg) => {
            let count = integer_arg(arg)?;
            let count = usize::try_from(count)
                .map_err(|_| RuntimeError::function("replace", "count must be non-negative"))?;
            s.replacen(from, to, count)
        }
        None => s.replace(from, to),
    };
    Ok(Value::String(replaced))
}

fn concat(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let mut out = String::new();
    for arg in args {
        out.push_str(string_arg(arg)?);
    }
    Ok(Value::String(out))
}

fn contains(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let haystack = string_arg(&args[0])?;
    let needle = string_arg(&args[1])?;
    Ok(Value::Boolean(haystack.contains(needle)))
}

fn split(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let s = string_arg(&args[0])?;
    let separator = string_arg(&args[1])?;
    if separator.is_empty() {
        return Err(RuntimeError::function("split", "separator must be non-empty"));
    }
    let pieces: Vec<Value> = match args.get(2) {
        Some(arg) => {
            let max_splits = integer_arg(arg)?;
            let max_splits = usize::try_from(max_splits)
                .map_err(|_| RuntimeError::function("split", "max splits must be non-negative"))?;
            s.splitn(max_splits + 1, separator)
                .map(|piece| Value::String(piece.to_string()))
                .collect()
        }
        None => s
            .split(separator)
            .map(|piece| Value::String(piece.to_string()))
            .collect(),
    };
    Ok(Value::Array(pieces))
}

fn join(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let separator = string_arg(&args[0])?;
    let items = array_arg(&args[1])?;
    let rendered: Vec<String> = items.iter().map(Value::output).collect();
    Ok(Value::String(rendered.join(separator)))
}

fn compile(pattern: &str) -> Result<Regex, RuntimeError> {
    Regex::new(pattern).map_err(|err| RuntimeError::Regex {
        message: err.to_string(),
    })
}

/// Match anchored at the start of the string. The regex engine's leftmost
/// semantics make "first match starts at 0" equivalent to "a match exists at
/// position 0".
fn regex_match(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let pattern = compile(string_arg(&args[0])?)?;
    let haystack = string_arg(&args[1])?;
    let matched = pattern.find(haystack).is_some_and(|m| m.start() == 0);
    Ok(Value::Boolean(matched))
}

fn regex_search(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let pattern = compile(string_arg(&args[0])?)?;
    let haystack = string_arg(&args[1])?;
    Ok(Value::Boolean(pattern.is_match(haystack)))
}

/// Capture groups as `[full_match, group_1, ...]`. Unmatched optional groups
/// become empty strings. With no match, the defaults argument is returned if
/// present; otherwise the call errors.
fn regex_capture(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let pattern = compile(string_arg(&args[0])?)?;
    let haystack = string_arg(&args[1])?;

    match pattern.captures(haystack) {
        Some(captures) => {
            let groups: Vec<Value> = captures
                .iter()
                .map(|group| {
                    Value::String(group.map_or_else(String::new, |m| m.as_str().to_string()))
                })
                .collect();
            Ok(Value::Array(groups))
        }
        None => match args.get(2) {
            Some(defaults) => Ok(Value::Array(array_arg(defaults)?.to_vec())),
            None => Err(RuntimeError::function(
                "regex_capture",
                format!("pattern did not match '{haystack}' and no defaults were provided"),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::stdlib::test_support::run;
    use crate::values::Value;
    use pretty_assertions::assert_eq;

    fn s(text: &str) -> Value {
        Value::String(text.into())
    }

    #[test]
    fn capitalize_lowers_the_tail() {
        assert_eq!(run("capitalize", &[s("qUICK brown")]), Ok(s("Quick brown")));
    }

    #[test]
    fn slice_supports_negative_indices() {
        assert_eq!(
            run("slice", &[s("hello"), Value::Integer(-3)]),
            Ok(s("llo"))
        );
        assert_eq!(
            run("slice", &[s("hello"), Value::Integer(1), Value::Integer(3)]),
            Ok(s("el"))
        );
        assert_eq!(
            run("slice", &[s("hello"), Value::Integer(3), Value::Integer(1)]),
            Ok(s(""))
        );
    }

    #[test]
    fn split_honors_the_max_argument() {
        assert_eq!(
            run("split", &[s("a-b-c"), s("-"), Value::Integer(1)]),
            Ok(Value::Array(vec![s("a"), s("b-c")]))
        );
    }

    #[test]
    fn join_renders_non_string_elements() {
        assert_eq!(
            run(
                "join",
                &[s(", "), Value::Array(vec![Value::Integer(1), s("a")])]
            ),
            Ok(s("1, a"))
        );
    }

    #[test]
    fn regex_match_is_anchored_and_search_is_not() {
        assert_eq!(
            run("regex_match", &[s("b+"), s("abba")]),
            Ok(Value::Boolean(false))
        );
        assert_eq!(
            run("regex_search", &[s("b+"), s("abba")]),
            Ok(Value::Boolean(true))
        );
    }

    #[test]
    fn regex_capture_returns_groups_or_defaults() {
        assert_eq!(
            run("regex_capture", &[s(r"(\w+)-(\d+)"), s("ep-42")]),
            Ok(Value::Array(vec![s("ep-42"), s("ep"), s("42")]))
        );
        assert_eq!(
            run(
                "regex_capture",
                &[s(r"(\d+)"), s("none"), Value::Array(vec![s("0")])]
            ),
            Ok(Value::Array(vec![s("0")]))
        );
        assert!(run("regex_capture", &[s(r"(\d+)"), s("none")]).is_err());
    }
}
