//! Static type inference over expression nodes.
//!
//! Inference is deliberately shallow: variables and function arguments are
//! `Any` (their values arrive at resolve time), literals carry their own
//! type, and calls derive from signatures. User-function output types are
//! inferred from their bodies; recursion is forbidden so that terminates.

use indexmap::IndexMap;

use crate::stdlib::Registry;
use crate::syntax::Ast;
use crate::types::Type;

/// What is statically known about the user-defined functions in scope.
#[derive(Debug, Clone, Copy)]
pub struct FunctionTypes<'a> {
    pub arities: &'a IndexMap<String, usize>,
    pub outputs: &'a IndexMap<String, Type>,
}

/// Infer the type of one expression node, checking every built-in call site
/// against its signature along the way.
///
/// `functions` is `None` while individual expressions parse (user-function
/// bodies may not all be known yet); the script re-runs inference strictly
/// once its whole function table exists. Errors are human messages; callers
/// attach source positions.
pub fn infer_type(
    ast: &Ast,
    registry: &Registry,
    functions: Option<FunctionTypes<'_>>,
) -> Result<Type, String> {
    match ast {
        Ast::Literal(value) => Ok(Type::of(value)),
        Ast::Variable(_) | Ast::FunctionArg { .. } => Ok(Type::Any),
        Ast::ArrayLiteral(items) => {
            for item in items {
                infer_type(item, registry, functions)?;
            }
            Ok(Type::Array)
        }
        Ast::MapLiteral(pairs) => {
            for (key, value) in pairs {
                infer_type(key, registry, functions)?;
                infer_type(value, registry, functions)?;
            }
            Ok(Type::Map)
        }
        Ast::LambdaRef(name) => {
            if let Some(builtin) = registry.get(name) {
                return Ok(Type::Lambda(builtin.signature.min_arity()));
            }
            match functions {
                Some(table) => match table.arities.get(name) {
                    Some(arity) => Ok(Type::Lambda(*arity)),
                    None => Err(format!("function %{name} does not exist")),
                },
                None => Ok(Type::Any),
            }
        }
        Ast::BuiltIn { name, args } => {
            let mut arg_types = Vec::with_capacity(args.len());
            for arg in args {
                arg_types.push(infer_type(arg, registry, functions)?);
            }
            let builtin = registry
                .get(name)
                .ok_or_else(|| format!("function %{name} does not exist"))?;
            builtin
                .signature
                .check(&arg_types)
                .map_err(|message| format!("%{name}: {message}"))
        }
        Ast::Custom { name, args } => {
            for arg in args {
                infer_type(arg, registry, functions)?;
            }
            let Some(table) = functions else {
                return Ok(Type::Any);
            };
            let arity = table
                .arities
                .get(name)
                .ok_or_else(|| format!("function %{name} does not exist"))?;
            if args.len() != *arity {
                return Err(format!(
                    "%{name} declares {arity} argument{}, got {}",
                    if *arity == 1 { "" } else { "s" },
                    args.len(),
                ));
            }
            Ok(table.outputs.get(name).cloned().unwrap_or(Type::Any))
        }
    }
}
