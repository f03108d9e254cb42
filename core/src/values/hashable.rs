use std::fmt;
use std::hash::{Hash, Hasher};

use crate::values::Value;

/// The scalar subset of [`Value`] usable as a map key.
///
/// `Array` and `Map` are rejected as keys statically, so a constructed
/// `Hashable` is always one of the four scalar tags. Float keys hash by bit
/// pattern, with `-0.0` normalized to `0.0` so the two spellings collide.
#[derive(Debug, Clone)]
pub enum Hashable {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl Hashable {
    /// Convert a value into a key, if its tag is hashable.
    pub fn from_value(value: &Value) -> Option<Hashable> {
        match value {
            Value::String(s) => Some(Hashable::String(s.clone())),
            Value::Integer(i) => Some(Hashable::Integer(*i)),
            Value::Float(f) => Some(Hashable::Float(*f)),
            Value::Boolean(b) => Some(Hashable::Boolean(*b)),
            Value::Array(_) | Value::Map(_) | Value::Lambda(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Hashable::String(s) => Value::String(s.clone()),
            Hashable::Integer(i) => Value::Integer(*i),
            Hashable::Float(f) => Value::Float(*f),
            Hashable::Boolean(b) => Value::Boolean(*b),
        }
    }

    /// The key rendered for text output and JSON object keys.
    pub fn output(&self) -> String {
        self.to_value().output()
    }

    fn float_bits(f: f64) -> u64 {
        // Normalize -0.0 so it keys identically to 0.0.
        if f == 0.0 { 0.0f64.to_bits() } else { f.to_bits() }
    }
}

impl PartialEq for Hashable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Hashable::String(a), Hashable::String(b)) => a == b,
            (Hashable::Integer(a), Hashable::Integer(b)) => a == b,
            (Hashable::Float(a), Hashable::Float(b)) => {
                Self::float_bits(*a) == Self::float_bits(*b)
            }
            (Hashable::Boolean(a), Hashable::Boolean(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Hashable {}

impl Hash for Hashable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Hashable::String(s) => {
                0u8.hash(state);
                s.hash(state);
            }
            Hashable::Integer(i) => {
                1u8.hash(state);
                i.hash(state);
            }
            Hashable::Float(f) => {
                2u8.hash(state);
                Self::float_bits(*f).hash(state);
            }
            Hashable::Boolean(b) => {
                3u8.hash(state);
                b.hash(state);
            }
        }
    }
}

impl fmt::Display for Hashable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}
