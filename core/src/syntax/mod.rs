//! The typed AST of a named expression.
//!
//! A parsed expression is a [`SyntaxTree`]: a sequence of fragments. Prose
//! outside `{...}` brackets becomes string-literal fragments; each bracketed
//! expression becomes one non-literal fragment. In text context the fragments
//! concatenate; a tree whose sole fragment is a single value returns that
//! value unchanged, preserving its type.

mod ast;
mod pretty;

#[cfg(test)]
mod ast_test;

pub use ast::{Ast, SyntaxTree};
