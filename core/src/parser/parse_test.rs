use indexmap::IndexSet;
use indoc::indoc;
use pretty_assertions::assert_eq;

use crate::parser::{parse, ParseError, ParseErrorKind, ParseOptions};
use crate::syntax::{Ast, SyntaxTree};
use crate::values::Value;

fn ok(source: &str) -> SyntaxTree {
    parse(source, ParseOptions::default())
        .unwrap_or_else(|e| panic!("parsing failed: {source}\n{e}"))
}

fn fail(source: &str) -> ParseError {
    parse(source, ParseOptions::default()).expect_err("should not parse")
}

fn text(s: &str) -> Ast {
    Ast::Literal(Value::String(s.into()))
}

#[test]
fn plain_prose_is_one_string_fragment() {
    assert_eq!(
        ok("Season 1 - Episode 2").fragments(),
        &[text("Season 1 - Episode 2")]
    );
}

#[test]
fn escaped_braces_stay_prose() {
    assert_eq!(ok(r"literal \{not a variable\}").fragments(), &[text("literal {not a variable}")]);
}

#[test]
fn prose_and_expressions_interleave() {
    assert_eq!(
        ok("Hello {name}!").fragments(),
        &[
            text("Hello "),
            Ast::Variable("name".into()),
            text("!"),
        ]
    );
}

#[test]
fn whitespace_inside_brackets_is_free() {
    assert_eq!(ok("{  name  }").fragments(), ok("{name}").fragments());
}

#[test]
fn builtin_call_with_nested_call() {
    assert_eq!(
        ok("{%concat('a', %string(1))}").fragments(),
        &[Ast::BuiltIn {
            name: "concat".into(),
            args: vec![
                Ast::Literal(Value::String("a".into())),
                Ast::BuiltIn {
                    name: "string".into(),
                    args: vec![Ast::Literal(Value::Integer(1))],
                },
            ],
        }]
    );
}

#[test]
fn unknown_function_parses_as_custom_when_unchecked() {
    assert_eq!(
        ok("{%my_func(1)}").fragments(),
        &[Ast::Custom {
            name: "my_func".into(),
            args: vec![Ast::Literal(Value::Integer(1))],
        }]
    );
}

#[test]
fn unknown_function_is_rejected_when_the_set_is_known() {
    let known: IndexSet<String> = ["my_func".to_string()].into_iter().collect();
    let options = ParseOptions {
        custom_functions: Some(&known),
        ..Default::default()
    };
    assert!(parse("{%my_func(1)}", options).is_ok());
    let err = parse("{%other(1)}", options).expect_err("should not parse");
    assert_eq!(err.kind, ParseErrorKind::FunctionDoesNotExist("other".into()));
    assert_eq!(err.highlight, 1);
}

#[test]
fn bare_function_before_a_separator_is_a_lambda_reference() {
    assert_eq!(
        ok("{%array_apply([1], %capitalize)}").fragments(),
        &[Ast::BuiltIn {
            name: "array_apply".into(),
            args: vec![
                Ast::ArrayLiteral(vec![Ast::Literal(Value::Integer(1))]),
                Ast::LambdaRef("capitalize".into()),
            ],
        }]
    );
}

#[test]
fn bare_function_elsewhere_is_a_zero_argument_call() {
    let known: IndexSet<String> = ["today".to_string()].into_iter().collect();
    let options = ParseOptions {
        custom_functions: Some(&known),
        ..Default::default()
    };
    let tree = parse("{%today}", options).expect("parses");
    assert_eq!(
        tree.fragments(),
        &[Ast::Custom {
            name: "today".into(),
            args: vec![],
        }]
    );
}

#[test]
fn function_args_require_an_owner() {
    let options = ParseOptions {
        owner: Some("double"),
        ..Default::default()
    };
    let tree = parse("{%mul($0, 2)}", options).expect("parses");
    assert_eq!(
        tree.fragments(),
        &[Ast::BuiltIn {
            name: "mul".into(),
            args: vec![
                Ast::FunctionArg {
                    index: 0,
                    owner: "double".into(),
                },
                Ast::Literal(Value::Integer(2)),
            ],
        }]
    );

    let err = fail("{%mul($0, 2)}");
    assert!(err
        .to_string()
        .contains("can only be used within custom function definitions"));
}

#[test]
fn self_call_is_rejected() {
    let options = ParseOptions {
        owner: Some("f"),
        ..Default::default()
    };
    let err = parse("{%f($0)}", options).expect_err("should not parse");
    assert_eq!(err.kind, ParseErrorKind::SelfRecursion("f".into()));
    assert_eq!(err.highlight, 1);
}

#[test]
fn malformed_function_args_are_rejected() {
    let options = ParseOptions {
        owner: Some("f"),
        ..Default::default()
    };
    for source in ["{%string($)}", "{%string($x)}", "{%string($1.5)}"] {
        let err = parse(source, options).expect_err("should not parse");
        assert!(
            matches!(err.kind, ParseErrorKind::InvalidFunctionArgument(_)),
            "{source} gave {err:?}"
        );
    }
}

#[test]
fn map_literals_alternate_keys_and_values() {
    assert_eq!(
        ok("{{'a': 1, 'b': [2]}}").fragments(),
        &[Ast::MapLiteral(vec![
            (
                Ast::Literal(Value::String("a".into())),
                Ast::Literal(Value::Integer(1)),
            ),
            (
                Ast::Literal(Value::String("b".into())),
                Ast::ArrayLiteral(vec![Ast::Literal(Value::Integer(2))]),
            ),
        ])]
    );
}

#[test]
fn unhashable_map_keys_are_rejected() {
    let err = fail("{{[1]: 'x'}}");
    assert_eq!(err.kind, ParseErrorKind::UnhashableKey);
    assert_eq!(err.highlight, 2);
}

#[test]
fn scalars_cannot_stand_alone_at_the_expression_root() {
    assert!(fail("{1}").to_string().contains("Numerics can only be used"));
    assert!(fail("{'x'}").to_string().contains("Strings can only be used"));
    assert!(fail("{True}").to_string().contains("Booleans can only be used"));
    assert!(fail("{null}").to_string().contains("Strings can only be used"));
}

#[test]
fn comma_mistakes_get_specific_messages() {
    assert!(fail("{%concat(,'a')}")
        .to_string()
        .contains("Unexpected comma when parsing arguments of %concat"));
    assert!(fail("{%concat('a','b',)}")
        .to_string()
        .contains("Unexpected comma when parsing arguments of %concat"));
    assert!(fail("{[1,,2]}")
        .to_string()
        .contains("Unexpected comma when parsing an array"));
}

#[test]
fn incompatible_arguments_highlight_the_call() {
    let err = fail("text {%lower(1)} more");
    assert!(matches!(
        err.kind,
        ParseErrorKind::IncompatibleArguments { .. }
    ));
    assert_eq!(err.highlight, 6);
}

#[test]
fn unclosed_call_highlights_the_opening_expression_bracket() {
    let err = fail("{%foo(}");
    assert_eq!(err.highlight, 0);
    assert_eq!(
        err.to_string(),
        "Unexpected character '}'\n  {%foo(}\n  ^"
    );
}

#[test]
fn unclosed_bracket_at_end_of_input_names_the_innermost_open_one() {
    let err = fail("{%concat('a'");
    assert!(err.to_string().contains("Bracket never closed"));
    assert_eq!(err.highlight, 8);
}

#[test]
fn stray_closing_bracket_is_rejected() {
    let err = fail("oops}");
    assert!(err.to_string().contains("Closing bracket"));
    assert_eq!(err.highlight, 4);
}

#[test]
fn invalid_variable_names_are_rejected() {
    let err = fail("{Name}");
    assert_eq!(err.kind, ParseErrorKind::InvalidVariableName("Name".into()));
}

#[test]
fn known_variable_set_is_enforced_when_present() {
    let known: IndexSet<String> = ["title".to_string()].into_iter().collect();
    let options = ParseOptions {
        variables: Some(&known),
        ..Default::default()
    };
    assert!(parse("{title}", options).is_ok());
    let err = parse("{upload_date}", options).expect_err("should not parse");
    assert_eq!(
        err.kind,
        ParseErrorKind::VariableDoesNotExist("upload_date".into())
    );
}

#[test]
fn errors_in_multiline_programs_show_the_right_line() {
    let source = indoc! {"
        first line
        second {%lower(1)} line
    "};
    let err = fail(source);
    assert!(matches!(
        err.kind,
        ParseErrorKind::IncompatibleArguments { .. }
    ));
    assert_eq!(err.to_string().lines().last(), Some("          ^"));
    assert!(err.to_string().contains("  second {%lower(1)} line"));
}

#[test]
fn roundtrips_through_to_source() {
    for source in [
        "plain prose",
        r"escaped \{braces\}",
        "Hello {name}!",
        "{%concat('a', %string(1))}",
        "{[1, 2.5, True, 'x']}",
        "{{'k': [1], 2: name}}",
        "{%array_apply([1], %capitalize)}",
    ] {
        let first = ok(source);
        let second = ok(&first.to_source());
        assert_eq!(second, first, "roundtrip changed {source}");
    }
}

#[test]
fn literals_no_quoting_form_can_hold_still_render_parseable_source() {
    let tree = SyntaxTree::literal(Value::Array(vec![Value::String(
        "''' mixed \"\"\"".into(),
    )]));
    let reparsed = ok(&tree.to_source());
    assert!(matches!(
        &reparsed.fragments()[0],
        Ast::ArrayLiteral(items)
            if matches!(&items[0], Ast::BuiltIn { name, .. } if name == "concat")
    ));
}
