use indexmap::IndexSet;

use crate::values::Value;

/// One node of a parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    /// A literal value. The parser only emits scalar literals; resolving a
    /// script with `update` may inline whole composite values here.
    Literal(Value),
    /// A reference to a named expression.
    Variable(String),
    /// A positional `$N` placeholder inside a user-defined function body.
    /// `owner` is the function the placeholder belongs to, which
    /// disambiguates nested user-function invocations.
    FunctionArg { index: usize, owner: String },
    /// A call to a registry function.
    BuiltIn { name: String, args: Vec<Ast> },
    /// A call to a user-defined function.
    Custom { name: String, args: Vec<Ast> },
    /// A bare `%name` used as an argument: a first-class function reference.
    LambdaRef(String),
    /// `[a, b, ...]`, unresolved until evaluated.
    ArrayLiteral(Vec<Ast>),
    /// `{k: v, ...}`, unresolved until evaluated. Duplicate keys are legal;
    /// the last insertion wins at evaluation time.
    MapLiteral(Vec<(Ast, Ast)>),
}

impl Ast {
    fn collect_variables(&self, out: &mut IndexSet<String>) {
        match self {
            Ast::Literal(_) | Ast::FunctionArg { .. } | Ast::LambdaRef(_) => {}
            Ast::Variable(name) => {
                out.insert(name.clone());
            }
            Ast::BuiltIn { args, .. } | Ast::Custom { args, .. } => {
                for arg in args {
                    arg.collect_variables(out);
                }
            }
            Ast::ArrayLiteral(items) => {
                for item in items {
                    item.collect_variables(out);
                }
            }
            Ast::MapLiteral(pairs) => {
                for (key, value) in pairs {
                    key.collect_variables(out);
                    value.collect_variables(out);
                }
            }
        }
    }

    fn collect_function_names(&self, out: &mut IndexSet<String>) {
        match self {
            Ast::Literal(_) | Ast::Variable(_) | Ast::FunctionArg { .. } => {}
            Ast::LambdaRef(name) => {
                out.insert(name.clone());
            }
            Ast::BuiltIn { name, args } | Ast::Custom { name, args } => {
                out.insert(name.clone());
                for arg in args {
                    arg.collect_function_names(out);
                }
            }
            Ast::ArrayLiteral(items) => {
                for item in items {
                    item.collect_function_names(out);
                }
            }
            Ast::MapLiteral(pairs) => {
                for (key, value) in pairs {
                    key.collect_function_names(out);
                    value.collect_function_names(out);
                }
            }
        }
    }

    fn collect_arg_indices(&self, function: &str, out: &mut IndexSet<usize>) {
        match self {
            Ast::Literal(_) | Ast::Variable(_) | Ast::LambdaRef(_) => {}
            Ast::FunctionArg { index, owner } => {
                if owner == function {
                    out.insert(*index);
                }
            }
            Ast::BuiltIn { args, .. } | Ast::Custom { args, .. } => {
                for arg in args {
                    arg.collect_arg_indices(function, out);
                }
            }
            Ast::ArrayLiteral(items) => {
                for item in items {
                    item.collect_arg_indices(function, out);
                }
            }
            Ast::MapLiteral(pairs) => {
                for (key, value) in pairs {
                    key.collect_arg_indices(function, out);
                    value.collect_arg_indices(function, out);
                }
            }
        }
    }
}

/// The parsed form of one named expression: an ordered list of fragments.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxTree {
    fragments: Vec<Ast>,
}

impl SyntaxTree {
    pub fn new(fragments: Vec<Ast>) -> Self {
        Self { fragments }
    }

    /// A tree holding a single already-resolved value. Used when `resolve`
    /// persists results back into the script.
    pub fn literal(value: Value) -> Self {
        Self {
            fragments: vec![Ast::Literal(value)],
        }
    }

    pub fn fragments(&self) -> &[Ast] {
        &self.fragments
    }

    /// Names of every variable referenced anywhere in the tree. Dependencies
    /// contributed by called user functions are resolved by the script, which
    /// knows the function bodies.
    pub fn variables(&self) -> IndexSet<String> {
        let mut out = IndexSet::new();
        for fragment in &self.fragments {
            fragment.collect_variables(&mut out);
        }
        out
    }

    /// Names of every function referenced in the tree, whether called or
    /// passed as a lambda.
    pub fn function_names(&self) -> IndexSet<String> {
        let mut out = IndexSet::new();
        for fragment in &self.fragments {
            fragment.collect_function_names(&mut out);
        }
        out
    }

    /// `$N` indices belonging to `function`.
    pub fn arg_indices(&self, function: &str) -> IndexSet<usize> {
        let mut out = IndexSet::new();
        for fragment in &self.fragments {
            fragment.collect_arg_indices(function, &mut out);
        }
        out
    }

    /// Whether any referenced variable is in `names`.
    pub fn contains(&self, names: &IndexSet<String>) -> bool {
        self.variables().iter().any(|v| names.contains(v))
    }

    /// Whether every referenced variable is in `names`.
    pub fn is_subset_of(&self, names: &IndexSet<String>) -> bool {
        self.variables().iter().all(|v| names.contains(v))
    }

    /// Fast path: the tree is already a single literal.
    pub fn resolvable(&self) -> Option<&Value> {
        match self.fragments.as_slice() {
            [Ast::Literal(value)] => Some(value),
            _ => None,
        }
    }
}
