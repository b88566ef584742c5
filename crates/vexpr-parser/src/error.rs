//! Parse error types.

use thiserror::Error;

use vexpr_ast::Span;
use vexpr_lexer::Token;

/// Parse error with source location and context.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at bytes {}..{}", .span.start, .span.end)]
pub struct ParseError {
    /// Kind of parse error
    pub kind: ParseErrorKind,
    /// Source location where error occurred
    pub span: Span,
    /// Human-readable error message
    pub message: String,
}

/// Category of parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A specific token was expected but a different one was found.
    UnexpectedToken,

    /// Input ended while a construct was incomplete (unclosed block,
    /// dangling operator).
    UnexpectedEof,

    /// Tokens are present but violate the grammar structurally
    /// (malformed directive, assignment to a call, ...).
    InvalidSyntax,

    /// Postfix word popped more values than the stack holds.
    StackUnderflow,

    /// Postfix program ended with the wrong number of values on the stack.
    StackImbalance,

    /// Other parse error not covered by specific categories.
    Other,
}

impl ParseError {
    /// Create an "expected token" error.
    pub fn expected_token(expected: Token, found: Option<Token>, span: Span) -> Self {
        let message = match &found {
            Some(token) => format!("expected `{}`, found `{}`", expected, token),
            None => format!("expected `{}`, found end of input", expected),
        };
        Self {
            kind: if found.is_none() {
                ParseErrorKind::UnexpectedEof
            } else {
                ParseErrorKind::UnexpectedToken
            },
            span,
            message,
        }
    }

    /// Create an "unexpected token" error.
    pub fn unexpected_token(found: Option<&Token>, context: &str, span: Span) -> Self {
        let message = match found {
            Some(token) => format!("unexpected `{}` {}", token, context),
            None => format!("unexpected end of input {}", context),
        };
        Self {
            kind: if found.is_none() {
                ParseErrorKind::UnexpectedEof
            } else {
                ParseErrorKind::UnexpectedToken
            },
            span,
            message,
        }
    }

    /// Create an "invalid syntax" error.
    pub fn invalid_syntax(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ParseErrorKind::InvalidSyntax,
            span,
            message: message.into(),
        }
    }

    /// Postfix stack underflow at a word.
    pub fn stack_underflow(word: &str, needed: usize, depth: usize, span: Span) -> Self {
        Self {
            kind: ParseErrorKind::StackUnderflow,
            span,
            message: format!(
                "`{}` needs {} value(s) but the stack holds {}",
                word, needed, depth
            ),
        }
    }

    /// Postfix end-of-program stack imbalance.
    pub fn stack_imbalance(expected: usize, depth: usize, span: Span) -> Self {
        Self {
            kind: ParseErrorKind::StackImbalance,
            span,
            message: format!(
                "program must end with {} value(s) on the stack, found {}",
                expected, depth
            ),
        }
    }

    /// Create a generic parse error.
    pub fn other(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ParseErrorKind::Other,
            span,
            message: message.into(),
        }
    }
}
