//! Unit tests for tree utilities and source reconstruction.

use indexmap::IndexSet;
use pretty_assertions::assert_eq;

use crate::syntax::{Ast, SyntaxTree};
use crate::values::Value;

fn names(items: &[&str]) -> IndexSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn variables_walks_nested_nodes() {
    let tree = SyntaxTree::new(vec![Ast::BuiltIn {
        name: "concat".into(),
        args: vec![
            Ast::Variable("title".into()),
            Ast::ArrayLiteral(vec![Ast::Variable("year".into())]),
            Ast::MapLiteral(vec![(
                Ast::Literal(Value::String("k".into())),
                Ast::Variable("channel".into()),
            )]),
        ],
    }]);
    assert_eq!(tree.variables(), names(&["title", "year", "channel"]));
    assert!(tree.contains(&names(&["year", "other"])));
    assert!(tree.is_subset_of(&names(&["title", "year", "channel", "extra"])));
    assert!(!tree.is_subset_of(&names(&["title"])));
}

#[test]
fn function_names_include_lambda_refs() {
    let tree = SyntaxTree::new(vec![Ast::BuiltIn {
        name: "array_apply".into(),
        args: vec![
            Ast::ArrayLiteral(vec![]),
            Ast::LambdaRef("stem".into()),
        ],
    }]);
    assert_eq!(tree.function_names(), names(&["array_apply", "stem"]));
}

#[test]
fn resolvable_is_the_single_literal_fast_path() {
    let literal = SyntaxTree::literal(Value::Integer(4));
    assert_eq!(literal.resolvable(), Some(&Value::Integer(4)));

    let composite = SyntaxTree::new(vec![
        Ast::Literal(Value::String("a".into())),
        Ast::Literal(Value::String("b".into())),
    ]);
    assert_eq!(composite.resolvable(), None);

    let variable = SyntaxTree::new(vec![Ast::Variable("x".into())]);
    assert_eq!(variable.resolvable(), None);
}

#[test]
fn arg_indices_are_scoped_to_the_owner() {
    let tree = SyntaxTree::new(vec![Ast::BuiltIn {
        name: "mul".into(),
        args: vec![
            Ast::FunctionArg { index: 0, owner: "double".into() },
            Ast::Custom {
                name: "inner".into(),
                args: vec![Ast::FunctionArg { index: 1, owner: "inner".into() }],
            },
        ],
    }]);
    let indices: IndexSet<usize> = tree.arg_indices("double");
    assert_eq!(indices, IndexSet::from([0]));
}

#[test]
fn to_source_escapes_prose_braces() {
    let tree = SyntaxTree::new(vec![
        Ast::Literal(Value::String("a {b} ".into())),
        Ast::Variable("title".into()),
    ]);
    assert_eq!(tree.to_source(), "a \\{b\\} {title}");
}

#[test]
fn to_source_renders_calls_and_literals() {
    let tree = SyntaxTree::new(vec![Ast::BuiltIn {
        name: "if".into(),
        args: vec![
            Ast::Literal(Value::Boolean(true)),
            Ast::Literal(Value::String("yes".into())),
            Ast::Literal(Value::Float(1.5)),
        ],
    }]);
    assert_eq!(tree.to_source(), "{%if(True, 'yes', 1.5)}");
}
