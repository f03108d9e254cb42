use pretty_assertions::assert_eq;

use crate::parser::{parse, ParseOptions};
use crate::syntax::Ast;
use crate::values::Value;

// Literals are only legal as arguments, so wrap them in an array to get at
// the parsed node.
fn literal(source: &str) -> Value {
    let wrapped = format!("{{[{source}]}}");
    let tree = parse(&wrapped, ParseOptions::default())
        .unwrap_or_else(|e| panic!("parsing failed: {source}\n{e}"));
    match tree.fragments() {
        [Ast::ArrayLiteral(items)] => match items.as_slice() {
            [Ast::Literal(value)] => value.clone(),
            other => panic!("expected one literal, got {other:?}"),
        },
        other => panic!("expected one array fragment, got {other:?}"),
    }
}

fn rejected(source: &str) -> String {
    let wrapped = format!("{{[{source}]}}");
    parse(&wrapped, ParseOptions::default())
        .expect_err("should not parse")
        .to_string()
}

#[test]
fn integers() {
    assert_eq!(literal("0"), Value::Integer(0));
    assert_eq!(literal("42"), Value::Integer(42));
    assert_eq!(literal("-17"), Value::Integer(-17));
    assert_eq!(
        literal("9223372036854775807"),
        Value::Integer(i64::MAX)
    );
}

#[test]
fn floats() {
    assert_eq!(literal("3.5"), Value::Float(3.5));
    assert_eq!(literal("-0.25"), Value::Float(-0.25));
    assert_eq!(literal(".5"), Value::Float(0.5));
}

#[test]
fn integer_valued_floats_collapse_to_integer() {
    assert_eq!(literal("2.0"), Value::Integer(2));
    assert_eq!(literal("-4.000"), Value::Integer(-4));
}

#[test]
fn booleans_in_both_spellings() {
    assert_eq!(literal("True"), Value::Boolean(true));
    assert_eq!(literal("true"), Value::Boolean(true));
    assert_eq!(literal("False"), Value::Boolean(false));
    assert_eq!(literal("false"), Value::Boolean(false));
}

#[test]
fn null_parses_to_the_empty_string() {
    assert_eq!(literal("null"), Value::String(String::new()));
}

#[test]
fn single_and_double_quoted_strings() {
    assert_eq!(literal("'hello'"), Value::String("hello".into()));
    assert_eq!(literal("\"hello\""), Value::String("hello".into()));
    assert_eq!(literal("'it \"nests\"'"), Value::String("it \"nests\"".into()));
    assert_eq!(literal("\"it 'nests'\""), Value::String("it 'nests'".into()));
}

#[test]
fn triple_quoted_strings_hold_quotes_and_newlines() {
    assert_eq!(
        literal("'''a 'quoted' line\nand another'''"),
        Value::String("a 'quoted' line\nand another".into())
    );
    assert_eq!(
        literal("\"\"\"say \"hi\" now\"\"\""),
        Value::String("say \"hi\" now".into())
    );
}

#[test]
fn malformed_numerics_are_rejected() {
    assert!(rejected("1.").contains("not a valid numeric"));
    assert!(rejected("1.2.3").contains("single decimal point"));
    assert!(rejected("-").contains("not a valid numeric"));
}

#[test]
fn integer_overflow_is_rejected() {
    assert!(rejected("9223372036854775808").contains("out of range"));
}

#[test]
fn unclosed_string_points_at_the_opening_quote() {
    let err = parse("{['oops}", ParseOptions::default()).expect_err("should not parse");
    assert_eq!(err.to_string(), "String never closed\n  {['oops}\n    ^");
}
