use std::fmt;

use thiserror::Error;

/// Specific kinds of parse-time failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("{0}")]
    InvalidSyntax(String),

    #[error("Variable '{0}' does not exist")]
    VariableDoesNotExist(String),

    #[error("Function '%{0}' does not exist")]
    FunctionDoesNotExist(String),

    #[error("'{0}' is not a valid variable name: names must match [a-z][a-z0-9_]*")]
    InvalidVariableName(String),

    #[error("'{0}' is not a valid function argument: arguments are $0, $1, ...")]
    InvalidFunctionArgument(String),

    #[error("Incompatible arguments passed to function %{function}: {message}")]
    IncompatibleArguments { function: String, message: String },

    #[error("Map keys must be hashable: String, Integer, Float, or Boolean")]
    UnhashableKey,

    #[error("Function %{0} cannot call itself")]
    SelfRecursion(String),
}

/// A parse failure carrying the full source text and a single highlight span.
///
/// `highlight` is the character index where the offending construct starts;
/// `cursor` is where the scanner stopped. `Display` renders the message plus
/// a caret line pinpointing the highlight, in the style of:
///
/// ```text
/// Incompatible arguments passed to function %array_at: ...
///   {%array_at('not an array', 0)}
///    ^
/// ```
// Not a thiserror derive: the `source` field holds program text, not a cause,
// and the derive would treat it as one.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub source: String,
    pub highlight: usize,
    pub cursor: usize,
}

impl std::error::Error for ParseError {}

impl ParseError {
    pub fn new(kind: ParseErrorKind, source: &str, highlight: usize, cursor: usize) -> Self {
        Self {
            kind,
            source: source.to_string(),
            highlight,
            cursor,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.kind)?;

        // Locate the line containing the highlight; indices are char-based.
        let chars: Vec<char> = self.source.chars().collect();
        let at = self.highlight.min(chars.len());
        let line_start = chars[..at]
            .iter()
            .rposition(|&c| c == '\n')
            .map_or(0, |i| i + 1);
        let line_end = chars[at..]
            .iter()
            .position(|&c| c == '\n')
            .map_or(chars.len(), |i| at + i);

        let line: String = chars[line_start..line_end].iter().collect();
        writeln!(f, "  {line}")?;
        write!(f, "  {}^", " ".repeat(at - line_start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_a_caret_under_the_highlight() {
        let err = ParseError::new(
            ParseErrorKind::InvalidSyntax("Bracket never closed".into()),
            "title: {%concat(a",
            7,
            17,
        );
        let rendered = err.to_string();
        assert_eq!(
            rendered,
            "Bracket never closed\n  title: {%concat(a\n         ^"
        );
    }

    #[test]
    fn parse_error_boxes_as_a_std_error_without_a_cause() {
        let err: Box<dyn std::error::Error> = Box::new(ParseError::new(
            ParseErrorKind::UnhashableKey,
            "{[{[]: 1}]}",
            2,
            11,
        ));
        assert!(err.source().is_none());
        assert!(err.to_string().starts_with("Map keys must be hashable"));
    }

    #[test]
    fn display_finds_the_highlighted_line_in_multiline_sources() {
        let err = ParseError::new(
            ParseErrorKind::VariableDoesNotExist("missing".into()),
            "first line\n{missing}",
            12,
            19,
        );
        let rendered = err.to_string();
        assert!(rendered.ends_with("  {missing}\n   ^"));
    }
}
