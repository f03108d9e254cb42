//! Source reconstruction.
//!
//! `to_source` renders a tree back into script text that parses to a
//! structurally identical tree. The rest of the system uses this to show
//! resolved templates in logs and to feed nested scripting passes.

use std::fmt::Write;

use crate::syntax::{Ast, SyntaxTree};
use crate::values::Value;

impl SyntaxTree {
    /// Reconstruct an equivalent source string.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        for fragment in self.fragments() {
            match fragment {
                // A top-level string literal is prose; braces re-escape.
                Ast::Literal(Value::String(s)) => {
                    for c in s.chars() {
                        match c {
                            '{' => out.push_str("\\{"),
                            '}' => out.push_str("\\}"),
                            c => out.push(c),
                        }
                    }
                }
                expr => {
                    let _ = write!(out, "{{{}}}", expr.to_source());
                }
            }
        }
        out
    }
}

impl Ast {
    /// Render one expression node as it appears inside `{...}` brackets.
    pub fn to_source(&self) -> String {
        match self {
            // Value's Display is already the literal form.
            Ast::Literal(value) => value.to_string(),
            Ast::Variable(name) => name.clone(),
            Ast::FunctionArg { index, .. } => format!("${index}"),
            Ast::BuiltIn { name, args } | Ast::Custom { name, args } => {
                let rendered: Vec<String> = args.iter().map(Ast::to_source).collect();
                format!("%{name}({})", rendered.join(", "))
            }
            Ast::LambdaRef(name) => format!("%{name}"),
            Ast::ArrayLiteral(items) => {
                let rendered: Vec<String> = items.iter().map(Ast::to_source).collect();
                format!("[{}]", rendered.join(", "))
            }
            Ast::MapLiteral(pairs) => {
                let rendered: Vec<String> = pairs
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key.to_source(), value.to_source()))
                    .collect();
                format!("{{{}}}", rendered.join(", "))
            }
        }
    }
}
