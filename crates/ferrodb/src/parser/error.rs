//! Parser error type.

use crate::error::Error;
use crate::lexer::{Span, TokenKind};

/// A parse error: an unexpected token or a premature end of input.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// The error message.
    pub message: String,
    /// The location of the error.
    pub span: Span,
    /// What the parser expected, if known.
    pub expected: Option<String>,
    /// The actual token found, if any (`None` at end of input).
    pub found: Option<TokenKind>,
    /// Whether this error originated at the lexer (malformed source
    /// text) rather than the parser (a well-formed but unexpected
    /// token). Surfaces as `Error::Lex` instead of `Error::Parse`.
    is_lex: bool,
}

impl ParseError {
    /// Creates a new parse error with a bare message.
    #[must_use]
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            expected: None,
            found: None,
            is_lex: false,
        }
    }

    /// Creates an "unexpected token" error. If `found` is itself a
    /// lexer error token, this is reclassified as a lex error rather
    /// than a parse error — the source text was malformed, not merely
    /// in the wrong grammatical position.
    #[must_use]
    pub fn unexpected(expected: impl Into<String>, found: TokenKind, span: Span) -> Self {
        if let TokenKind::Error(message) = found {
            return Self::lex(message, span);
        }
        let expected_str: String = expected.into();
        Self {
            message: format!("expected {expected_str}, found {found:?}"),
            span,
            expected: Some(expected_str),
            found: Some(found),
            is_lex: false,
        }
    }

    /// Creates an "unexpected end of input" error.
    #[must_use]
    pub fn unexpected_eof(expected: impl Into<String>, span: Span) -> Self {
        let expected_str: String = expected.into();
        Self {
            message: format!("unexpected end of input: expected {expected_str}"),
            span,
            expected: Some(expected_str),
            found: Some(TokenKind::Eof),
            is_lex: false,
        }
    }

    /// Creates a lex error: malformed source text (unterminated
    /// string, unknown character, unparsable numeric literal).
    #[must_use]
    pub fn lex(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            expected: None,
            found: None,
            is_lex: true,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at position {}..{}",
            self.message, self.span.start, self.span.end
        )
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        if e.is_lex {
            Self::Lex {
                message: e.message,
                span: e.span,
            }
        } else {
            Self::Parse {
                message: e.message,
                span: e.span,
                expected: e.expected,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_eof_reports_eof_as_found() {
        let err = ParseError::unexpected_eof("FROM", Span::new(10, 10));
        assert_eq!(err.found, Some(TokenKind::Eof));
    }

    #[test]
    fn test_converts_into_crate_error() {
        let err = ParseError::new("boom", Span::new(0, 1));
        let converted: Error = err.into();
        assert!(matches!(converted, Error::Parse { .. }));
    }

    #[test]
    fn test_unexpected_reclassifies_lexer_error_tokens_as_lex_errors() {
        let err = ParseError::unexpected(
            "an expression",
            TokenKind::Error("unterminated string literal".to_string()),
            Span::new(0, 5),
        );
        let converted: Error = err.into();
        assert!(matches!(converted, Error::Lex { .. }));
    }
}
