use std::fmt;

use indexmap::IndexMap;

use crate::values::Hashable;

/// A runtime value.
///
/// Arrays are insertion-ordered and heterogeneous. Maps preserve first-insert
/// key order across every operation. A `Lambda` is an unbound reference to a
/// named function (built-in or user-defined); carrying the name rather than a
/// closure keeps values serializable and lets higher-order built-ins dispatch
/// through the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Array(Vec<Value>),
    Map(IndexMap<Hashable, Value>),
    Lambda(String),
}

impl Value {
    /// Tag name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "String",
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::Boolean(_) => "Boolean",
            Value::Array(_) => "Array",
            Value::Map(_) => "Map",
            Value::Lambda(_) => "Lambda",
        }
    }

    /// Text-context coercion.
    ///
    /// Scalars render natively (booleans as the language's own `True`/`False`
    /// literals, so rendered output re-parses to the same value); collections
    /// render as JSON; lambdas render as `%name`.
    pub fn output(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Boolean(b) => {
                if *b {
                    "True".to_string()
                } else {
                    "False".to_string()
                }
            }
            Value::Array(_) | Value::Map(_) => self.to_json().to_string(),
            Value::Lambda(name) => format!("%{name}"),
        }
    }

    /// JSON rendering of a value. Map keys become JSON object keys via their
    /// output string; lambdas become `"%name"` strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => {
                serde_json::Number::from_f64(*f).map_or(serde_json::Value::Null, serde_json::Value::Number)
            }
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(entries) => {
                let mut object = serde_json::Map::new();
                for (key, value) in entries {
                    object.insert(key.output(), value.to_json());
                }
                serde_json::Value::Object(object)
            }
            Value::Lambda(name) => serde_json::Value::String(format!("%{name}")),
        }
    }

    /// Truthiness: empty strings, zero, `False`, and empty collections are
    /// falsy; lambdas are truthy.
    pub fn truthy(&self) -> bool {
        match self {
            Value::String(s) => !s.is_empty(),
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Boolean(b) => *b,
            Value::Array(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
            Value::Lambda(_) => true,
        }
    }

    /// Equality with numeric promotion: an `Integer` compares equal to a
    /// `Float` of the same magnitude (IEEE-754 compare after promoting the
    /// integer to `f64`). All other cross-tag comparisons are unequal.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Float(b)) => *a as f64 == *b,
            (Value::Float(a), Value::Integer(b)) => *a == *b as f64,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (a, b) => a == b,
        }
    }

    /// Numeric view used by comparison operators, `None` for non-numerics.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

/// Format a float so it always carries a decimal point and re-parses as a
/// float literal.
fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    let s = value.to_string();
    if s.contains('.') || s.contains('e') || s.contains('E') {
        s
    } else {
        format!("{s}.0")
    }
}

impl fmt::Display for Value {
    /// Literal form, as it would appear inside an expression. Differs from
    /// [`Value::output`] in that strings are quoted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", quote_string(s)),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            other => write!(f, "{}", other.output()),
        }
    }
}

/// Pick a quoting form the content permits: single quotes, double quotes,
/// then the triple-quoted forms for strings containing both. Strings no
/// delimiter can hold render as a `%concat` of quotable pieces, so the result
/// always parses back.
pub(crate) fn quote_string(s: &str) -> String {
    if !s.contains('\'') {
        format!("'{s}'")
    } else if !s.contains('"') {
        format!("\"{s}\"")
    } else if !s.contains("'''") && !s.ends_with('\'') {
        format!("'''{s}'''")
    } else if !s.contains("\"\"\"") && !s.ends_with('"') {
        format!("\"\"\"{s}\"\"\"")
    } else {
        quote_as_concat(s)
    }
}

// Split into runs of apostrophes and runs of everything else; each run fits
// in double or single quotes respectively. Only reached for strings holding
// both quote kinds, so there are at least two runs.
fn quote_as_concat(s: &str) -> String {
    let mut pieces: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut apostrophes = s.starts_with('\'');
    for c in s.chars() {
        if (c == '\'') != apostrophes {
            pieces.push(std::mem::take(&mut current));
            apostrophes = c == '\'';
        }
        current.push(c);
    }
    pieces.push(current);

    let quoted: Vec<String> = pieces
        .iter()
        .map(|piece| {
            if piece.contains('\'') {
                format!("\"{piece}\"")
            } else {
                format!("'{piece}'")
            }
        })
        .collect();
    format!("%concat({})", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn output_renders_scalars_natively() {
        assert_eq!(Value::String("hi".into()).output(), "hi");
        assert_eq!(Value::Integer(-3).output(), "-3");
        assert_eq!(Value::Float(2.5).output(), "2.5");
        assert_eq!(Value::Float(2.0).output(), "2.0");
        assert_eq!(Value::Boolean(true).output(), "True");
        assert_eq!(Value::Lambda("upper".into()).output(), "%upper");
    }

    #[test]
    fn output_renders_collections_as_json() {
        let array = Value::Array(vec![Value::Integer(1), Value::String("a".into())]);
        assert_eq!(array.output(), r#"[1,"a"]"#);

        let mut entries = IndexMap::new();
        entries.insert(Hashable::String("k".into()), Value::Integer(1));
        entries.insert(Hashable::Integer(2), Value::Boolean(false));
        assert_eq!(Value::Map(entries).output(), r#"{"k":1,"2":false}"#);
    }

    #[test]
    fn string_quoting_picks_a_form_the_content_permits() {
        assert_eq!(quote_string("plain"), "'plain'");
        assert_eq!(quote_string("it's"), "\"it's\"");
        assert_eq!(quote_string("a 'b' \"c\""), "'''a 'b' \"c\"'''");
    }

    #[test]
    fn strings_no_delimiter_can_hold_quote_as_concat() {
        assert_eq!(
            quote_string("''' and \"\"\""),
            "%concat(\"'''\", ' and \"\"\"')"
        );
        assert_eq!(quote_string("'''x\""), "%concat(\"'''\", 'x\"')");
    }

    #[test]
    fn loose_eq_promotes_integers() {
        assert!(Value::Integer(1).loose_eq(&Value::Float(1.0)));
        assert!(!Value::Integer(1).loose_eq(&Value::String("1".into())));
        assert!(Value::Array(vec![Value::Integer(1)])
            .loose_eq(&Value::Array(vec![Value::Float(1.0)])));
    }

    #[test]
    fn negative_zero_keys_collide() {
        let mut entries = IndexMap::new();
        entries.insert(Hashable::Float(0.0), Value::Integer(1));
        entries.insert(Hashable::Float(-0.0), Value::Integer(2));
        assert_eq!(entries.len(), 1);
    }
}
