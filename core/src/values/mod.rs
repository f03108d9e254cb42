//! Runtime values.
//!
//! Every expression evaluates to a [`Value`]: a closed tagged union over the
//! seven value categories of the language. Maps are insertion-ordered and
//! keyed by [`Hashable`], the scalar subset of `Value`.

mod hashable;
mod value;

pub use hashable::Hashable;
pub use value::Value;
