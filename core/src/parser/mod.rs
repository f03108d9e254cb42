//! Recursive-descent parser for script source text.
//!
//! A program is prose with embedded `{ expression }` brackets. The parser is
//! a single pass over a char cursor: prose accumulates into string-literal
//! fragments, each bracketed expression becomes one AST fragment. A single
//! `highlight` index tracks the start of the construct being parsed so every
//! error pinpoints one position in the original source; a stack of opening
//! positions lets an unclosed bracket report its opening site instead of the
//! end of input.
//!
//! Built-in call sites are checked against their signatures as soon as their
//! closing parenthesis is consumed, anchored at the call's `%`.

mod error;

#[cfg(test)]
mod literals_test;
#[cfg(test)]
mod parse_test;

pub use error::{ParseError, ParseErrorKind};

use indexmap::IndexSet;

use crate::stdlib::{registry, Registry};
use crate::syntax::{Ast, SyntaxTree};
use crate::types::infer_type;
use crate::values::Value;

/// Context the caller already knows when parsing one expression.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions<'a> {
    /// Name of the user-defined function whose body this is. Enables `$N`
    /// references and rejects self-calls.
    pub owner: Option<&'a str>,
    /// Known user-defined function names. When present, `%name` not found in
    /// the registry or this set is an error; when absent, unknown calls parse
    /// as user-function calls unchecked.
    pub custom_functions: Option<&'a IndexSet<String>>,
    /// Known variable names. When present, unknown variables error at parse
    /// time; when absent, the resolver checks at resolve time (externally
    /// provided names are legal there).
    pub variables: Option<&'a IndexSet<String>>,
}

/// Parse one script source into a syntax tree.
pub fn parse(text: &str, options: ParseOptions<'_>) -> Result<SyntaxTree, ParseError> {
    Parser::new(text, options).parse_program()
}

/// Script source for a config value: strings are taken verbatim, any other
/// JSON scalar or composite serializes to a literal.
pub fn source_for(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

struct Parser<'a> {
    options: ParseOptions<'a>,
    registry: &'static Registry,
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
    /// Start of the construct the next error highlights.
    highlight: usize,
    /// Positions of currently open `{`/`[`/`(`, innermost last.
    open_brackets: Vec<usize>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, options: ParseOptions<'a>) -> Self {
        Self {
            options,
            registry: registry(),
            source,
            chars: source.chars().collect(),
            pos: 0,
            highlight: 0,
            open_brackets: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Cursor helpers
    // ------------------------------------------------------------------

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn lookahead_is(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn err(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.source, self.highlight, self.pos)
    }

    fn err_at(&self, kind: ParseErrorKind, highlight: usize) -> ParseError {
        ParseError::new(kind, self.source, highlight, self.pos)
    }

    /// Error for running out of input mid-expression: report the innermost
    /// bracket that was never closed.
    fn eof_err(&self) -> ParseError {
        match self.open_brackets.last() {
            Some(&open) => self.err_at(
                ParseErrorKind::InvalidSyntax("Bracket never closed".into()),
                open,
            ),
            None => self.err(ParseErrorKind::InvalidSyntax(
                "Unexpected end of input".into(),
            )),
        }
    }

    // ------------------------------------------------------------------
    // Program level: prose with embedded expressions
    // ------------------------------------------------------------------

    fn parse_program(&mut self) -> Result<SyntaxTree, ParseError> {
        let mut fragments = Vec::new();
        let mut prose = String::new();

        while let Some(c) = self.peek() {
            match c {
                '\\' if matches!(self.peek_at(1), Some('{') | Some('}')) => {
                    self.pos += 1;
                    prose.push(self.bump().expect("peeked"));
                }
                '{' => {
                    if !prose.is_empty() {
                        fragments.push(Ast::Literal(Value::String(std::mem::take(&mut prose))));
                    }
                    self.highlight = self.pos;
                    self.open_brackets.push(self.pos);
                    self.pos += 1;

                    let expr = self.parse_expr_root()?;

                    self.skip_ws();
                    match self.peek() {
                        Some('}') => {
                            self.pos += 1;
                            self.open_brackets.pop();
                        }
                        Some(_) => {
                            return Err(self.err(ParseErrorKind::InvalidSyntax(
                                "Expected a single expression followed by a closing bracket"
                                    .into(),
                            )))
                        }
                        None => return Err(self.eof_err()),
                    }
                    fragments.push(expr);
                }
                '}' => {
                    return Err(self.err_at(
                        ParseErrorKind::InvalidSyntax(
                            "Closing bracket without a matching opening bracket".into(),
                        ),
                        self.pos,
                    ))
                }
                c => {
                    self.pos += 1;
                    prose.push(c);
                }
            }
        }

        if !prose.is_empty() {
            fragments.push(Ast::Literal(Value::String(prose)));
        }
        Ok(SyntaxTree::new(fragments))
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// The top of a bracketed expression: only variables, calls, arrays, and
    /// maps may appear here. Bare scalars get category-specific messages.
    fn parse_expr_root(&mut self) -> Result<Ast, ParseError> {
        self.skip_ws();
        match self.peek() {
            None => Err(self.eof_err()),
            Some('%') => self.parse_function(),
            Some('[') => self.parse_array(),
            Some('{') => self.parse_map(),
            Some('$') => Err(self.err(ParseErrorKind::InvalidSyntax(
                "Function arguments can only be used as arguments to functions, arrays, and maps"
                    .into(),
            ))),
            Some('\'') | Some('"') => Err(self.err(ParseErrorKind::InvalidSyntax(
                "Strings can only be used as arguments to functions, arrays, and maps".into(),
            ))),
            Some(c) if c.is_ascii_digit() || c == '-' || c == '.' => {
                Err(self.err(ParseErrorKind::InvalidSyntax(
                    "Numerics can only be used as arguments to functions, arrays, and maps"
                        .into(),
                )))
            }
            Some(c) if c.is_alphabetic() || c == '_' => {
                let start = self.pos;
                let word = self.read_word();
                if word.eq_ignore_ascii_case("true") || word.eq_ignore_ascii_case("false") {
                    return Err(self.err(ParseErrorKind::InvalidSyntax(
                        "Booleans can only be used as arguments to functions, arrays, and maps"
                            .into(),
                    )));
                }
                if word == "null" {
                    return Err(self.err(ParseErrorKind::InvalidSyntax(
                        "Strings can only be used as arguments to functions, arrays, and maps"
                            .into(),
                    )));
                }
                self.variable_from_word(word, start)
            }
            Some(c) => Err(self.err(ParseErrorKind::InvalidSyntax(format!(
                "Unexpected character '{c}'"
            )))),
        }
    }

    /// A full argument: scalars, lambda references, and nested composites are
    /// all legal here.
    fn parse_argument(&mut self) -> Result<Ast, ParseError> {
        self.skip_ws();
        match self.peek() {
            None => Err(self.eof_err()),
            Some('%') => self.parse_function(),
            Some('[') => self.parse_array(),
            Some('{') => self.parse_map(),
            Some('$') => self.parse_function_arg(),
            Some('\'') | Some('"') => self.parse_string(),
            Some(c) if c.is_ascii_digit() || c == '-' || c == '.' => self.parse_number(),
            Some(c) if c.is_alphabetic() || c == '_' => {
                let start = self.pos;
                let word = self.read_word();
                if word.eq_ignore_ascii_case("true") {
                    return Ok(Ast::Literal(Value::Boolean(true)));
                }
                if word.eq_ignore_ascii_case("false") {
                    return Ok(Ast::Literal(Value::Boolean(false)));
                }
                if word == "null" {
                    return Ok(Ast::Literal(Value::String(String::new())));
                }
                self.variable_from_word(word, start)
            }
            Some(c) => Err(self.err(ParseErrorKind::InvalidSyntax(format!(
                "Unexpected character '{c}'"
            )))),
        }
    }

    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                word.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        word
    }

    fn variable_from_word(&self, word: String, start: usize) -> Result<Ast, ParseError> {
        if !is_valid_name(&word) {
            return Err(self.err_at(ParseErrorKind::InvalidVariableName(word), start));
        }
        if let Some(known) = self.options.variables {
            if !known.contains(&word) {
                return Err(self.err_at(ParseErrorKind::VariableDoesNotExist(word), start));
            }
        }
        Ok(Ast::Variable(word))
    }

    // ------------------------------------------------------------------
    // Function calls and lambda references
    // ------------------------------------------------------------------

    fn parse_function(&mut self) -> Result<Ast, ParseError> {
        let call_start = self.pos;
        self.pos += 1; // '%'

        let name = self.read_word();
        if !is_valid_name(&name) {
            return Err(self.err_at(
                ParseErrorKind::InvalidSyntax(format!(
                    "'%{name}' is not a valid function name: names must match [a-z][a-z0-9_]*"
                )),
                call_start,
            ));
        }

        if self.peek() != Some('(') {
            // A bare `%name` followed by an argument separator is a lambda
            // reference; anywhere else it is a zero-argument call.
            let mark = self.pos;
            self.skip_ws();
            let next = self.peek();
            self.pos = mark;
            if matches!(next, Some(',') | Some(')')) {
                self.check_function_exists(&name, call_start)?;
                return Ok(Ast::LambdaRef(name));
            }
            return self.finish_call(name, Vec::new(), call_start);
        }

        self.open_brackets.push(self.pos);
        self.pos += 1; // '('
        let context = format!("arguments of %{name}");
        let args = self.parse_list(')', &context)?;
        self.open_brackets.pop();
        self.finish_call(name, args, call_start)
    }

    /// Comma-separated arguments up to `close`. The opener is already
    /// consumed. Doubled, leading, and trailing commas each get their own
    /// message, distinct from a missing argument.
    fn parse_list(&mut self, close: char, context: &str) -> Result<Vec<Ast>, ParseError> {
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() == Some(close) {
            self.pos += 1;
            return Ok(items);
        }

        loop {
            self.skip_ws();
            if self.peek() == Some(',') {
                return Err(self.err(ParseErrorKind::InvalidSyntax(format!(
                    "Unexpected comma when parsing {context}"
                ))));
            }
            items.push(self.parse_argument()?);

            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                    self.skip_ws();
                    if self.peek() == Some(close) {
                        return Err(self.err(ParseErrorKind::InvalidSyntax(format!(
                            "Unexpected comma when parsing {context}"
                        ))));
                    }
                }
                Some(c) if c == close => {
                    self.pos += 1;
                    return Ok(items);
                }
                Some(_) => {
                    return Err(self.err(ParseErrorKind::InvalidSyntax(format!(
                        "Expected ',' or '{close}' when parsing {context}"
                    ))))
                }
                None => return Err(self.eof_err()),
            }
        }
    }

    fn check_function_exists(&self, name: &str, call_start: usize) -> Result<(), ParseError> {
        if self.registry.get(name).is_some() {
            return Ok(());
        }
        if let Some(custom) = self.options.custom_functions {
            if !custom.contains(name) {
                return Err(self.err_at(
                    ParseErrorKind::FunctionDoesNotExist(name.to_string()),
                    call_start,
                ));
            }
        }
        Ok(())
    }

    fn finish_call(
        &self,
        name: String,
        args: Vec<Ast>,
        call_start: usize,
    ) -> Result<Ast, ParseError> {
        if self.registry.get(&name).is_some() {
            let node = Ast::BuiltIn { name, args };
            // Check the call site now, while we still know where it starts.
            if let Err(message) = infer_type(&node, self.registry, None) {
                let Ast::BuiltIn { name, .. } = &node else {
                    unreachable!()
                };
                return Err(self.err_at(
                    ParseErrorKind::IncompatibleArguments {
                        function: name.clone(),
                        message: strip_function_prefix(&message, name),
                    },
                    call_start,
                ));
            }
            return Ok(node);
        }

        if self.options.owner == Some(name.as_str()) {
            return Err(self.err_at(ParseErrorKind::SelfRecursion(name), call_start));
        }
        self.check_function_exists(&name, call_start)?;
        Ok(Ast::Custom { name, args })
    }

    // ------------------------------------------------------------------
    // Scalars
    // ------------------------------------------------------------------

    fn parse_function_arg(&mut self) -> Result<Ast, ParseError> {
        let start = self.pos;
        self.pos += 1; // '$'

        let Some(owner) = self.options.owner else {
            return Err(self.err_at(
                ParseErrorKind::InvalidSyntax(
                    "Function arguments can only be used within custom function definitions"
                        .into(),
                ),
                start,
            ));
        };

        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        // `$-1`, `$x`, and `$1.5` are all malformed.
        if digits.is_empty() || self.peek() == Some('.') {
            let mut bad = format!("${digits}");
            if let Some(c) = self.peek() {
                if !c.is_whitespace() && !matches!(c, ',' | ')' | ']' | '}' | ':') {
                    bad.push(c);
                }
            }
            return Err(self.err_at(ParseErrorKind::InvalidFunctionArgument(bad), start));
        }

        let index: usize = digits
            .parse()
            .map_err(|_| self.err_at(ParseErrorKind::InvalidFunctionArgument(format!("${digits}")), start))?;
        Ok(Ast::FunctionArg {
            index,
            owner: owner.to_string(),
        })
    }

    fn parse_number(&mut self) -> Result<Ast, ParseError> {
        let start = self.pos;
        let mut text = String::new();

        if self.peek() == Some('-') {
            text.push('-');
            self.pos += 1;
        }
        let mut integer_digits = 0;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                integer_digits += 1;
                self.pos += 1;
            } else {
                break;
            }
        }

        let mut is_float = false;
        if self.peek() == Some('.') {
            is_float = true;
            text.push('.');
            self.pos += 1;
            let mut fraction_digits = 0;
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    text.push(c);
                    fraction_digits += 1;
                    self.pos += 1;
                } else {
                    break;
                }
            }
            if fraction_digits == 0 {
                return Err(self.err_at(
                    ParseErrorKind::InvalidSyntax(format!("'{text}' is not a valid numeric")),
                    start,
                ));
            }
            if self.peek() == Some('.') {
                return Err(self.err_at(
                    ParseErrorKind::InvalidSyntax(
                        "Numerics may contain only a single decimal point".into(),
                    ),
                    start,
                ));
            }
        }

        if integer_digits == 0 && !is_float {
            return Err(self.err_at(
                ParseErrorKind::InvalidSyntax(format!("'{text}' is not a valid numeric")),
                start,
            ));
        }

        if is_float {
            let value: f64 = text.parse().map_err(|_| {
                self.err_at(
                    ParseErrorKind::InvalidSyntax(format!("'{text}' is not a valid numeric")),
                    start,
                )
            })?;
            // Integer-valued floats collapse to Integer.
            if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
                return Ok(Ast::Literal(Value::Integer(value as i64)));
            }
            return Ok(Ast::Literal(Value::Float(value)));
        }

        let value: i64 = text.parse().map_err(|_| {
            self.err_at(
                ParseErrorKind::InvalidSyntax(format!("Integer literal '{text}' is out of range")),
                start,
            )
        })?;
        Ok(Ast::Literal(Value::Integer(value)))
    }

    fn parse_string(&mut self) -> Result<Ast, ParseError> {
        let start = self.pos;
        let delimiter = if self.lookahead_is("'''") {
            "'''"
        } else if self.lookahead_is("\"\"\"") {
            "\"\"\""
        } else if self.peek() == Some('\'') {
            "'"
        } else {
            "\""
        };
        self.pos += delimiter.chars().count();

        let mut text = String::new();
        loop {
            if self.pos >= self.chars.len() {
                return Err(self.err_at(
                    ParseErrorKind::InvalidSyntax("String never closed".into()),
                    start,
                ));
            }
            if self.lookahead_is(delimiter) {
                self.pos += delimiter.chars().count();
                return Ok(Ast::Literal(Value::String(text)));
            }
            text.push(self.bump().expect("bounds checked"));
        }
    }

    // ------------------------------------------------------------------
    // Composites
    // ------------------------------------------------------------------

    fn parse_array(&mut self) -> Result<Ast, ParseError> {
        self.open_brackets.push(self.pos);
        self.pos += 1; // '['
        let items = self.parse_list(']', "an array")?;
        self.open_brackets.pop();
        Ok(Ast::ArrayLiteral(items))
    }

    fn parse_map(&mut self) -> Result<Ast, ParseError> {
        self.open_brackets.push(self.pos);
        self.pos += 1; // '{'
        let mut pairs = Vec::new();

        self.skip_ws();
        if self.peek() == Some('}') {
            self.pos += 1;
            self.open_brackets.pop();
            return Ok(Ast::MapLiteral(pairs));
        }

        loop {
            self.skip_ws();
            if self.peek() == Some(',') {
                return Err(self.err(ParseErrorKind::InvalidSyntax(
                    "Unexpected comma when parsing map keys".into(),
                )));
            }
            let key_start = self.pos;
            let key = self.parse_argument()?;
            if let Ok(key_type) = infer_type(&key, self.registry, None) {
                if key_type.is_unhashable() {
                    return Err(self.err_at(ParseErrorKind::UnhashableKey, key_start));
                }
            }

            self.skip_ws();
            match self.peek() {
                Some(':') => self.pos += 1,
                Some(_) => {
                    return Err(self.err(ParseErrorKind::InvalidSyntax(
                        "Expected ':' after a map key".into(),
                    )))
                }
                None => return Err(self.eof_err()),
            }

            self.skip_ws();
            if matches!(self.peek(), Some(',') | Some('}')) {
                return Err(self.err(ParseErrorKind::InvalidSyntax(
                    "Expected a value after ':' in a map".into(),
                )));
            }
            let value = self.parse_argument()?;
            pairs.push((key, value));

            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                    self.skip_ws();
                    if self.peek() == Some('}') {
                        return Err(self.err(ParseErrorKind::InvalidSyntax(
                            "Unexpected comma when parsing map entries".into(),
                        )));
                    }
                }
                Some('}') => {
                    self.pos += 1;
                    self.open_brackets.pop();
                    return Ok(Ast::MapLiteral(pairs));
                }
                Some(':') => {
                    return Err(self.err(ParseErrorKind::InvalidSyntax(
                        "Expected ',' or '}' after a map value, got a second ':'".into(),
                    )))
                }
                Some(_) => {
                    return Err(self.err(ParseErrorKind::InvalidSyntax(
                        "Expected ',' or '}' when parsing map entries".into(),
                    )))
                }
                None => return Err(self.eof_err()),
            }
        }
    }
}

/// Variable and function names: `[a-z][a-z0-9_]*`.
pub(crate) fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Inference prefixes its messages with `%name:`; the parser re-attaches the
/// name structurally, so drop the prefix when it names the same function.
fn strip_function_prefix(message: &str, name: &str) -> String {
    message
        .strip_prefix(&format!("%{name}: "))
        .unwrap_or(message)
        .to_string()
}
