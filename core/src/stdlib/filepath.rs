//! Filepath helpers: filesystem-safe replacement of reserved characters and
//! path length limits. Replacements use fullwidth lookalikes so the rendered
//! name stays readable.

use crate::errors::RuntimeError;
use crate::stdlib::{string_arg, Caller, RegistryBuilder};
use crate::types::{ReturnType, Signature, Type};
use crate::values::Value;

/// Most filesystems cap a single path component at 255 bytes.
const MAX_COMPONENT_BYTES: usize = 255;

pub(super) fn register(builder: &mut RegistryBuilder) {
    let string_to_string = || Signature::new(vec![Type::String], ReturnType::Fixed(Type::String));
    builder.register("sanitize", string_to_string(), sanitize);
    builder.register("sanitize_plex_episode", string_to_string(), sanitize_plex_episode);
    builder.register(
        "truncate_filepath_if_too_long",
        string_to_string(),
        truncate_filepath_if_too_long,
    );
    builder.register("to_native_filepath", string_to_string(), to_native_filepath);
    builder.register("legacy_bracket_safety", string_to_string(), legacy_bracket_safety);
}

fn sanitize(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let out = string_arg(&args[0])?
        .chars()
        .map(|c| match c {
            '/' => '⧸',
            '\\' => '⧹',
            ':' => '：',
            '*' => '＊',
            '?' => '？',
            '"' => '＂',
            '<' => '＜',
            '>' => '＞',
            '|' => '｜',
            other => other,
        })
        .collect();
    Ok(Value::String(out))
}

/// Plex parses ASCII digits in episode titles as episode markers, so swap
/// them for their fullwidth forms.
fn sanitize_plex_episode(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let out = string_arg(&args[0])?
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                char::from_u32('\u{FF10}' as u32 + (c as u32 - '0' as u32)).unwrap_or(c)
            } else {
                c
            }
        })
        .collect();
    Ok(Value::String(out))
}

fn truncate_filepath_if_too_long(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let path = string_arg(&args[0])?;
    let (parent, name) = match path.rfind('/') {
        Some(i) => (&path[..=i], &path[i + 1..]),
        None => ("", path),
    };
    if name.len() <= MAX_COMPONENT_BYTES {
        return Ok(Value::String(path.to_string()));
    }

    // Keep the extension, trim the stem on a char boundary.
    let (stem, extension) = match name.rfind('.') {
        Some(i) if i > 0 => (&name[..i], &name[i..]),
        _ => (name, ""),
    };
    let budget = MAX_COMPONENT_BYTES.saturating_sub(extension.len());
    let mut end = budget.min(stem.len());
    while end > 0 && !stem.is_char_boundary(end) {
        end -= 1;
    }
    Ok(Value::String(format!("{parent}{}{extension}", &stem[..end])))
}

fn to_native_filepath(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let path = string_arg(&args[0])?;
    Ok(Value::String(
        path.replace('/', &std::path::MAIN_SEPARATOR.to_string()),
    ))
}

/// Square brackets confused older library scanners, replace them with
/// fullwidth forms.
fn legacy_bracket_safety(_: &mut dyn Caller, args: &[Value]) -> Result<Value, RuntimeError> {
    let out = string_arg(&args[0])?
        .chars()
        .map(|c| match c {
            '[' => '［',
            ']' => '］',
            other => other,
        })
        .collect();
    Ok(Value::String(out))
}

#[cfg(test)]
mod tests {
    use crate::stdlib::test_support::run;
    use crate::values::Value;
    use pretty_assertions::assert_eq;

    fn call(name: &str, input: &str) -> String {
        match run(name, &[Value::String(input.into())]).unwrap() {
            Value::String(s) => s,
            other => panic!("expected a string, got {other:?}"),
        }
    }

    #[test]
    fn sanitize_replaces_reserved_characters() {
        assert_eq!(call("sanitize", "a/b: *c?"), "a⧸b： ＊c？");
        assert_eq!(call("sanitize", r#"<x>|"y"\z"#), "＜x＞｜＂y＂⧹z");
    }

    #[test]
    fn plex_episode_digits_become_fullwidth() {
        assert_eq!(call("sanitize_plex_episode", "Episode 12"), "Episode １２");
    }

    #[test]
    fn short_components_pass_through() {
        assert_eq!(
            call("truncate_filepath_if_too_long", "dir/file.mkv"),
            "dir/file.mkv"
        );
    }

    #[test]
    fn long_components_keep_their_extension() {
        let long = format!("dir/{}.mkv", "x".repeat(300));
        let truncated = call("truncate_filepath_if_too_long", &long);
        assert!(truncated.ends_with(".mkv"));
        assert_eq!(truncated.len(), "dir/".len() + 255);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long = format!("dir/{}.mkv", "é".repeat(200));
        let truncated = call("truncate_filepath_if_too_long", &long);
        assert!(truncated.ends_with(".mkv"));
        assert!(truncated.len() <= "dir/".len() + 255);
    }

    #[test]
    fn brackets_become_fullwidth() {
        assert_eq!(call("legacy_bracket_safety", "[2024] name"), "［2024］ name");
    }
}
