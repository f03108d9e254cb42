//! A typed, lazily-evaluated template language for naming and tagging media.
//!
//! Source text is prose with embedded `{ expression }` brackets. A
//! [`script::Script`] holds a bag of named expressions and user-defined
//! functions, validates them statically (syntax, signatures, cycles), and
//! resolves them in dependency order against externally supplied values.
//!
//! ```
//! use indexmap::IndexMap;
//! use weft_core::script::{ResolveOptions, Script};
//! use weft_core::values::Value;
//!
//! let mut script = Script::new(IndexMap::from([
//!     ("greeting".to_string(), "Hello {name}".to_string()),
//! ]))?;
//! let resolved = script.resolve(
//!     ResolveOptions::default().resolved("name", Value::String("World".into())),
//! )?;
//! assert_eq!(resolved["greeting"], Value::String("Hello World".into()));
//! # Ok::<(), weft_core::errors::ScriptError>(())
//! ```

pub mod errors;
pub mod parser;
pub mod script;
pub mod stdlib;
pub mod syntax;
pub mod types;
pub mod values;

pub use errors::{RuntimeError, ScriptError};
pub use script::{ResolveOptions, Script};
pub use values::Value;
