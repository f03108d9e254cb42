//! Expression evaluation against a resolved environment.
//!
//! The evaluator is eager: call arguments evaluate left to right before
//! dispatch. User-function invocations push a frame holding the bound `$N`
//! values; frames carry the owning function's name so nested invocations of
//! different functions cannot capture each other's placeholders.

use indexmap::IndexMap;

use crate::errors::RuntimeError;
use crate::stdlib::{registry, Caller, Registry};
use crate::syntax::{Ast, SyntaxTree};
use crate::values::{Hashable, Value};

struct Frame {
    owner: String,
    args: Vec<Value>,
}

pub(crate) struct Evaluator<'a> {
    registry: &'static Registry,
    functions: &'a IndexMap<String, SyntaxTree>,
    env: &'a IndexMap<String, Value>,
    frames: Vec<Frame>,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(
        functions: &'a IndexMap<String, SyntaxTree>,
        env: &'a IndexMap<String, Value>,
    ) -> Self {
        Self {
            registry: registry(),
            functions,
            env,
            frames: Vec::new(),
        }
    }

    /// Evaluate a whole tree: a single fragment passes its value through
    /// unchanged, several fragments concatenate their string renderings.
    pub(crate) fn eval_tree(&mut self, tree: &SyntaxTree) -> Result<Value, RuntimeError> {
        match tree.fragments() {
            [single] => self.eval(single),
            fragments => {
                let mut out = String::new();
                for fragment in fragments {
                    out.push_str(&self.eval(fragment)?.output());
                }
                Ok(Value::String(out))
            }
        }
    }

    fn eval(&mut self, ast: &Ast) -> Result<Value, RuntimeError> {
        match ast {
            Ast::Literal(value) => Ok(value.clone()),
            Ast::Variable(name) => self
                .env
                .get(name)
                .cloned()
                .ok_or_else(|| RuntimeError::UnboundVariable(name.clone())),
            Ast::FunctionArg { index, owner } => self
                .frames
                .iter()
                .rev()
                .find(|frame| frame.owner == *owner)
                .and_then(|frame| frame.args.get(*index))
                .cloned()
                .ok_or_else(|| RuntimeError::UnboundArgument {
                    index: *index,
                    function: owner.clone(),
                }),
            Ast::LambdaRef(name) => Ok(Value::Lambda(name.clone())),
            Ast::BuiltIn { name, args } | Ast::Custom { name, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg)?);
                }
                self.call(name, &values)
            }
            Ast::ArrayLiteral(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.eval(item)?);
                }
                Ok(Value::Array(out))
            }
            Ast::MapLiteral(pairs) => {
                let mut out = IndexMap::with_capacity(pairs.len());
                for (key, value) in pairs {
                    let key = self.eval(key)?;
                    let key = Hashable::from_value(&key).ok_or(RuntimeError::Type {
                        expected: "Hashable",
                        actual: key.type_name(),
                    })?;
                    // Duplicate keys: last value wins, first insertion keeps
                    // its position.
                    out.insert(key, self.eval(value)?);
                }
                Ok(Value::Map(out))
            }
        }
    }

    fn call_custom(&mut self, name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
        let Some(body) = self.functions.get(name) else {
            return Err(RuntimeError::function(name, "function does not exist"));
        };
        let arity = body.arg_indices(name).len();
        if args.len() != arity {
            return Err(RuntimeError::function(
                name,
                format!(
                    "declares {arity} argument{}, got {}",
                    if arity == 1 { "" } else { "s" },
                    args.len(),
                ),
            ));
        }

        self.frames.push(Frame {
            owner: name.to_string(),
            args: args.to_vec(),
        });
        let result = self.eval_tree(body);
        self.frames.pop();
        result
    }
}

impl Caller for Evaluator<'_> {
    fn call(&mut self, name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
        if let Some(builtin) = self.registry.get(name) {
            if args.len() < builtin.signature.min_arity() {
                return Err(RuntimeError::function(
                    name,
                    format!(
                        "expects at least {} argument{}, got {}",
                        builtin.signature.min_arity(),
                        if builtin.signature.min_arity() == 1 { "" } else { "s" },
                        args.len(),
                    ),
                ));
            }
            return (builtin.run)(self, args);
        }
        self.call_custom(name, args)
    }
}
