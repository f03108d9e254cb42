//! Static type descriptors and call-site signature checking.
//!
//! Types exist only to check calls before evaluation: every built-in declares
//! a [`Signature`] and the checker verifies each call site against it, so the
//! evaluator can trust argument shapes and keep runtime guards to a minimum.
//! There is no inference across variables: a variable's type is unknown
//! (`Any`) until it resolves, which keeps checking local and cheap.

mod infer;

pub use infer::{infer_type, FunctionTypes};

use std::fmt;

use crate::values::Value;

/// A type descriptor used in signatures and inference results.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    String,
    Integer,
    Float,
    Boolean,
    Array,
    Map,
    /// A function reference of the given arity.
    Lambda(usize),
    /// A two-argument reducer lambda, as taken by `array_reduce`.
    LambdaReduce,
    /// A lambda whose arity is one element argument plus however many fixed
    /// arguments the call site supplies after it.
    LambdaFixed,
    Any,
    /// Integer or Float; mixed operands promote results to Float.
    Numeric,
    /// Any of the four scalar tags usable as a map key.
    Hashable,
    Union(Vec<Type>),
    /// A parametric parameter: binds to the first concrete argument type, and
    /// later generic parameters and a generic return agree with the binding.
    Generic,
}

impl Type {
    /// The static type of an already-resolved value.
    pub fn of(value: &Value) -> Type {
        match value {
            Value::String(_) => Type::String,
            Value::Integer(_) => Type::Integer,
            Value::Float(_) => Type::Float,
            Value::Boolean(_) => Type::Boolean,
            Value::Array(_) => Type::Array,
            Value::Map(_) => Type::Map,
            // The arity behind a lambda value is only known to the registry
            // and function table, not to the value itself.
            Value::Lambda(_) => Type::Any,
        }
    }

    /// Whether a value of type `self` can never be a map key.
    pub fn is_unhashable(&self) -> bool {
        matches!(self, Type::Array | Type::Map)
    }

    fn is_numeric(&self) -> bool {
        matches!(self, Type::Integer | Type::Float | Type::Numeric)
    }

    /// Whether an argument inferred as `actual` satisfies this parameter.
    /// `Any` on either side passes; runtime guards cover the dynamic gap.
    fn accepts(&self, actual: &Type) -> bool {
        if matches!(self, Type::Any) || matches!(actual, Type::Any) {
            return true;
        }
        if let Type::Union(members) = actual {
            return members.iter().any(|m| self.accepts(m));
        }
        match self {
            Type::Numeric => actual.is_numeric(),
            Type::Hashable => {
                actual.is_numeric()
                    || matches!(
                        actual,
                        Type::String | Type::Boolean | Type::Hashable
                    )
            }
            Type::Union(members) => members.iter().any(|m| m.accepts(actual)),
            Type::LambdaReduce => matches!(actual, Type::Lambda(2) | Type::LambdaReduce),
            // LambdaFixed arity depends on the call site; Signature::check
            // handles it before delegating here.
            Type::LambdaFixed => matches!(actual, Type::Lambda(_)),
            _ => self == actual,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Lambda(arity) => write!(f, "Lambda({arity})"),
            Type::LambdaReduce => write!(f, "Lambda(2)"),
            Type::LambdaFixed => write!(f, "Lambda"),
            Type::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
            Type::Generic => write!(f, "T"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// How a built-in's output type derives from its inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnType {
    Fixed(Type),
    /// Whatever the generic parameter bound to.
    Generic,
    /// The union of the inferred types at these argument positions
    /// (`if` returns the union of its branches).
    UnionOf(Vec<usize>),
}

/// A built-in's declared parameter list.
///
/// `required` parameters come first, then `optional` ones, then any number of
/// `variadic` arguments sharing one type.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    required: Vec<Type>,
    optional: Vec<Type>,
    variadic: Option<Type>,
    ret: ReturnType,
}

impl Signature {
    pub fn new(required: impl Into<Vec<Type>>, ret: ReturnType) -> Self {
        Self {
            required: required.into(),
            optional: Vec::new(),
            variadic: None,
            ret,
        }
    }

    pub fn optional(mut self, optional: impl Into<Vec<Type>>) -> Self {
        self.optional = optional.into();
        self
    }

    pub fn variadic(mut self, ty: Type) -> Self {
        self.variadic = Some(ty);
        self
    }

    /// The smallest number of arguments a call must pass. Doubles as the
    /// arity of the function when it is passed around as a lambda.
    pub fn min_arity(&self) -> usize {
        self.required.len()
    }

    /// Check a call site. Returns the call's output type, or a human message
    /// describing the mismatch.
    pub fn check(&self, args: &[Type]) -> Result<Type, String> {
        let min = self.required.len();
        let max = min + self.optional.len();

        if args.len() < min || (self.variadic.is_none() && args.len() > max) {
            return Err(format!(
                "expected {}, got {} argument{}",
                self.expected_arity_text(),
                args.len(),
                if args.len() == 1 { "" } else { "s" },
            ));
        }

        let mut generic: Option<Type> = None;
        for (position, actual) in args.iter().enumerate() {
            let param = if position < min {
                &self.required[position]
            } else if position < max {
                &self.optional[position - min]
            } else {
                self.variadic.as_ref().expect("arity checked above")
            };

            let ok = match param {
                Type::Generic => match &generic {
                    None => {
                        generic = Some(actual.clone());
                        true
                    }
                    Some(bound) => bound.accepts(actual) || actual.accepts(bound),
                },
                Type::LambdaFixed => {
                    // One element argument plus the fixed tail supplied at
                    // this call site.
                    let fixed = args.len().saturating_sub(max);
                    match actual {
                        Type::Any => true,
                        Type::Lambda(arity) => *arity == 1 + fixed,
                        _ => false,
                    }
                }
                param => param.accepts(actual),
            };

            if !ok {
                return Err(format!(
                    "argument {} expected {}, got {}",
                    position + 1,
                    param,
                    actual,
                ));
            }
        }

        Ok(match &self.ret {
            ReturnType::Fixed(ty) => ty.clone(),
            ReturnType::Generic => generic.unwrap_or(Type::Any),
            ReturnType::UnionOf(positions) => {
                let mut members: Vec<Type> = Vec::new();
                for &position in positions {
                    let ty = args.get(position).cloned().unwrap_or(Type::Any);
                    if matches!(ty, Type::Any) {
                        return Ok(Type::Any);
                    }
                    if !members.contains(&ty) {
                        members.push(ty);
                    }
                }
                if members.len() == 1 {
                    members.pop().expect("one member")
                } else {
                    Type::Union(members)
                }
            }
        })
    }

    fn expected_arity_text(&self) -> String {
        let min = self.required.len();
        let max = min + self.optional.len();
        if self.variadic.is_some() {
            format!("at least {min}")
        } else if min == max {
            format!("{min}")
        } else {
            format!("{min} to {max}")
        }
    }
}
