//! Named-expression scripts and their resolver.
//!
//! A script is a bag of named expressions ("variables") plus named
//! user-defined function bodies. Construction performs every static check:
//! parsing, name validation, contiguous `$N` indices, call arity, signature
//! checking, and cycle detection over both the variable and function graphs.
//! Resolution then evaluates variables in dependency order against an
//! externally supplied environment, with optional "unresolvable" names whose
//! dependents are skipped rather than failed.

mod cycles;
mod eval;


use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};

use crate::errors::ScriptError;
use crate::parser::{is_valid_name, parse, ParseError, ParseErrorKind, ParseOptions};
use crate::stdlib::registry;
use crate::syntax::SyntaxTree;
use crate::types::{infer_type, FunctionTypes, Type};
use crate::values::Value;

use cycles::detect_cycle;
use eval::Evaluator;

/// Inputs to one [`Script::resolve`] call.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Externally evaluated bindings, e.g. metadata keys.
    pub resolved: IndexMap<String, Value>,
    /// Names that must not be evaluated this call; anything depending on one
    /// becomes unresolvable too.
    pub unresolvable: IndexSet<String>,
    /// Persist each freshly resolved variable back into the script as a
    /// literal, so later calls see a constant.
    pub update: bool,
}

impl ResolveOptions {
    pub fn resolved(mut self, name: &str, value: Value) -> Self {
        self.resolved.insert(name.to_string(), value);
        self
    }

    pub fn unresolvable(mut self, name: &str) -> Self {
        self.unresolvable.insert(name.to_string());
        self
    }

    pub fn update(mut self) -> Self {
        self.update = true;
        self
    }
}

/// A validated bag of named expressions and user-defined functions.
#[derive(Debug, Clone)]
pub struct Script {
    variables: IndexMap<String, SyntaxTree>,
    functions: IndexMap<String, SyntaxTree>,
    /// Original source text per name, kept for error rendering.
    sources: IndexMap<String, String>,
    /// Outcome of the most recent `resolve` call, served by `get`.
    resolved: IndexMap<String, Value>,
    unresolvable: IndexSet<String>,
}

impl Script {
    /// Build a script from a source map. Keys prefixed with `%` define
    /// functions, all others define variables.
    pub fn new(sources: IndexMap<String, String>) -> Result<Self, ScriptError> {
        let mut script = Self {
            variables: IndexMap::new(),
            functions: IndexMap::new(),
            sources: IndexMap::new(),
            resolved: IndexMap::new(),
            unresolvable: IndexSet::new(),
        };

        let mut function_sources = IndexMap::new();
        let mut variable_sources = IndexMap::new();
        for (key, source) in sources {
            match key.strip_prefix('%') {
                Some(name) => {
                    function_sources.insert(name.to_string(), source);
                }
                None => {
                    variable_sources.insert(key, source);
                }
            }
        }

        let custom_names: IndexSet<String> = function_sources.keys().cloned().collect();
        for (name, source) in function_sources {
            if !is_valid_name(&name) {
                return Err(definition_error(
                    ParseErrorKind::InvalidSyntax(format!(
                        "'%{name}' is not a valid function name: names must match [a-z][a-z0-9_]*"
                    )),
                    &source,
                ));
            }
            if registry().contains(&name) {
                return Err(definition_error(
                    ParseErrorKind::InvalidSyntax(format!(
                        "Function name '%{name}' collides with a built-in function"
                    )),
                    &source,
                ));
            }
            let options = ParseOptions {
                owner: Some(&name),
                custom_functions: Some(&custom_names),
                variables: None,
            };
            let tree = parse(&source, options)?;
            script.sources.insert(format!("%{name}"), source);
            script.functions.insert(name, tree);
        }

        script.insert_variables(variable_sources)?;
        script.validate()?;
        Ok(script)
    }

    /// Merge more named expressions into the variables and re-validate.
    pub fn add(&mut self, sources: IndexMap<String, String>) -> Result<(), ScriptError> {
        self.insert_variables(sources)?;
        self.validate()
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.variables.keys().map(String::as_str)
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.functions.keys().map(String::as_str)
    }

    fn insert_variables(&mut self, sources: IndexMap<String, String>) -> Result<(), ScriptError> {
        let custom_names: IndexSet<String> = self.functions.keys().cloned().collect();
        for (name, source) in sources {
            if !is_valid_name(&name) {
                return Err(definition_error(
                    ParseErrorKind::InvalidVariableName(name),
                    &source,
                ));
            }
            let options = ParseOptions {
                owner: None,
                custom_functions: Some(&custom_names),
                variables: None,
            };
            let tree = parse(&source, options)?;
            self.sources.insert(name.clone(), source);
            self.variables.insert(name, tree);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Static validation
    // ------------------------------------------------------------------

    fn validate(&self) -> Result<(), ScriptError> {
        self.check_function_arg_indices()?;
        let order = self.check_function_graph()?;
        let (arities, outputs) = self.infer_function_types(&order)?;
        self.check_trees(&arities, &outputs)?;
        self.check_variable_graph()?;
        Ok(())
    }

    /// Parameter indices of every function must be `0..k` with no gaps.
    fn check_function_arg_indices(&self) -> Result<(), ScriptError> {
        for (name, body) in &self.functions {
            let mut indices: Vec<usize> = body.arg_indices(name).into_iter().collect();
            indices.sort_unstable();
            for (expected, &actual) in indices.iter().enumerate() {
                if actual != expected {
                    return Err(definition_error(
                        ParseErrorKind::InvalidFunctionArgument(format!(
                            "%{name} uses ${actual} but not ${expected}"
                        )),
                        self.source_of_function(name),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Reject function-graph cycles and return a callee-first order.
    fn check_function_graph(&self) -> Result<Vec<String>, ScriptError> {
        let graph: IndexMap<String, IndexSet<String>> = self
            .functions
            .iter()
            .map(|(name, body)| {
                let callees = body
                    .function_names()
                    .into_iter()
                    .filter(|callee| self.functions.contains_key(callee))
                    .collect();
                (name.clone(), callees)
            })
            .collect();

        if let Some(path) = detect_cycle(&graph) {
            return Err(ScriptError::FunctionCycle { path });
        }

        // Acyclic, so repeatedly taking functions whose callees are already
        // ordered terminates.
        let mut order: Vec<String> = Vec::with_capacity(graph.len());
        let mut placed: IndexSet<&str> = IndexSet::new();
        while placed.len() < graph.len() {
            for (name, callees) in &graph {
                if placed.contains(name.as_str()) {
                    continue;
                }
                if callees.iter().all(|c| placed.contains(c.as_str())) {
                    placed.insert(name);
                    order.push(name.clone());
                }
            }
        }
        Ok(order)
    }

    /// Arity and output type per function, computed callee-first so a body's
    /// custom calls are already typed when it is inferred.
    fn infer_function_types(
        &self,
        order: &[String],
    ) -> Result<(IndexMap<String, usize>, IndexMap<String, Type>), ScriptError> {
        let mut arities: IndexMap<String, usize> = IndexMap::new();
        let mut outputs: IndexMap<String, Type> = IndexMap::new();
        for (name, body) in &self.functions {
            arities.insert(name.clone(), body.arg_indices(name).len());
        }

        for name in order {
            let body = &self.functions[name];
            let table = FunctionTypes {
                arities: &arities,
                outputs: &outputs,
            };
            let output = match body.fragments() {
                [single] => infer_type(single, registry(), Some(table))
                    .map_err(|message| self.type_error(self.source_of_function(name), message))?,
                fragments => {
                    for fragment in fragments {
                        infer_type(fragment, registry(), Some(table)).map_err(|message| {
                            self.type_error(self.source_of_function(name), message)
                        })?;
                    }
                    Type::String
                }
            };
            outputs.insert(name.clone(), output);
        }
        Ok((arities, outputs))
    }

    /// Strict re-inference of every variable tree now that the full function
    /// table is known: catches custom-call arity and lambda-arity mistakes
    /// the per-expression parse could not see.
    fn check_trees(
        &self,
        arities: &IndexMap<String, usize>,
        outputs: &IndexMap<String, Type>,
    ) -> Result<(), ScriptError> {
        let table = FunctionTypes { arities, outputs };
        for (name, tree) in &self.variables {
            for fragment in tree.fragments() {
                infer_type(fragment, registry(), Some(table))
                    .map_err(|message| self.type_error(&self.sources[name], message))?;
            }
        }
        Ok(())
    }

    fn check_variable_graph(&self) -> Result<(), ScriptError> {
        let graph: IndexMap<String, IndexSet<String>> = self
            .variables
            .iter()
            .map(|(name, tree)| (name.clone(), self.dependencies(tree)))
            .collect();
        if let Some(path) = detect_cycle(&graph) {
            return Err(ScriptError::VariableCycle { path });
        }
        Ok(())
    }

    fn type_error(&self, source: &str, message: String) -> ScriptError {
        // Inference messages mention the offending call as `%name`; point the
        // highlight at its first occurrence in the source.
        let highlight = message
            .split('%')
            .nth(1)
            .map(|rest| {
                rest.chars()
                    .take_while(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
                    .collect::<String>()
            })
            .and_then(|name| char_position_of(source, &format!("%{name}")))
            .unwrap_or(0);
        ScriptError::Parse(ParseError::new(
            ParseErrorKind::InvalidSyntax(message),
            source,
            highlight,
            highlight,
        ))
    }

    fn source_of_function<'a>(&'a self, name: &str) -> &'a str {
        self.sources
            .get(&format!("%{name}"))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Free variables of a tree, including those pulled in by the bodies of
    /// every custom function it transitively calls or references.
    fn dependencies(&self, tree: &SyntaxTree) -> IndexSet<String> {
        let mut deps = tree.variables();
        let mut pending: Vec<String> = tree
            .function_names()
            .into_iter()
            .filter(|name| self.functions.contains_key(name))
            .collect();
        let mut seen: IndexSet<String> = pending.iter().cloned().collect();

        while let Some(name) = pending.pop() {
            let body = &self.functions[&name];
            deps.extend(body.variables());
            for callee in body.function_names() {
                if self.functions.contains_key(&callee) && seen.insert(callee.clone()) {
                    pending.push(callee);
                }
            }
        }
        deps
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Evaluate every variable not excluded by `unresolvable`, in dependency
    /// order, and return the full environment.
    ///
    /// Each call starts from its own options: externally resolved names and
    /// the unresolvable set do not carry over from earlier calls. Only
    /// `update` persists anything, by rewriting resolved variables into
    /// literals. [`Script::get`] reflects the most recent call.
    pub fn resolve(
        &mut self,
        options: ResolveOptions,
    ) -> Result<IndexMap<String, Value>, ScriptError> {
        let mut env = options.resolved;
        let mut unresolvable = options.unresolvable;

        let mut unresolved: IndexMap<String, IndexSet<String>> = self
            .variables
            .iter()
            .filter(|(name, _)| !env.contains_key(*name) && !unresolvable.contains(*name))
            .map(|(name, tree)| (name.clone(), self.dependencies(tree)))
            .collect();

        // Every dependency must be satisfiable before any evaluation starts.
        for (name, deps) in &unresolved {
            for dep in deps {
                if !self.variables.contains_key(dep)
                    && !env.contains_key(dep)
                    && !unresolvable.contains(dep)
                {
                    let source = &self.sources[name];
                    let highlight = char_position_of(source, dep).unwrap_or(0);
                    return Err(ScriptError::Parse(ParseError::new(
                        ParseErrorKind::VariableDoesNotExist(dep.clone()),
                        source,
                        highlight,
                        highlight,
                    )));
                }
            }
        }

        debug!(
            pending = unresolved.len(),
            external = env.len(),
            unresolvable = unresolvable.len(),
            "resolving script"
        );

        while !unresolved.is_empty() {
            let mut progress = false;
            let pending: Vec<String> = unresolved.keys().cloned().collect();
            for name in pending {
                let deps = &unresolved[&name];
                if deps.iter().any(|dep| unresolvable.contains(dep)) {
                    trace!(variable = %name, "marking unresolvable");
                    unresolvable.insert(name.clone());
                    unresolved.shift_remove(&name);
                    progress = true;
                } else if deps.iter().all(|dep| env.contains_key(dep)) {
                    let tree = &self.variables[&name];
                    let value = Evaluator::new(&self.functions, &env).eval_tree(tree)?;
                    trace!(variable = %name, value = %value, "resolved");
                    env.insert(name.clone(), value);
                    unresolved.shift_remove(&name);
                    progress = true;
                }
            }
            if !progress {
                // Cycles are rejected at construction, so a stall can only
                // mean the graphs went out of sync.
                return Err(ScriptError::VariableCycle {
                    path: unresolved.keys().cloned().collect(),
                });
            }
        }

        if options.update {
            for (name, value) in &env {
                if self.variables.contains_key(name) {
                    let literal = SyntaxTree::literal(value.clone());
                    self.sources.insert(name.clone(), literal.to_source());
                    self.variables.insert(name.clone(), literal);
                }
            }
        }

        self.resolved = env.clone();
        self.unresolvable = unresolvable;
        Ok(env)
    }

    /// A previously resolved value.
    pub fn get(&self, name: &str) -> Result<&Value, ScriptError> {
        if self.unresolvable.contains(name) {
            return Err(ScriptError::Unresolvable(name.to_string()));
        }
        self.resolved
            .get(name)
            .ok_or_else(|| ScriptError::NotResolved(name.to_string()))
    }
}

fn definition_error(kind: ParseErrorKind, source: &str) -> ScriptError {
    ScriptError::Parse(ParseError::new(kind, source, 0, 0))
}

/// Char index of the first occurrence of `needle`, for highlight spans.
fn char_position_of(source: &str, needle: &str) -> Option<usize> {
    source
        .find(needle)
        .map(|byte| source[..byte].chars().count())
}
