// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Lexical analysis for the vexpr infix grammar.
//!
//! Tokenization uses logos. Comments (`#` to end of line) and whitespace are
//! stripped during lexing, not emitted as tokens. The postfix grammar does
//! not use this lexer; it is a whitespace word scanner living in the parser
//! crate.
//!
//! # Examples
//!
//! ```
//! use vexpr_lexer::{lex, Token};
//! let tokens = lex("RESULT = src0 * 2;").unwrap();
//! assert_eq!(tokens.len(), 6);
//! assert_eq!(tokens[3].0, Token::Star);
//! ```

use logos::Logos;

use vexpr_ast::Span;

/// Infix grammar token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")] // Skip whitespace
#[logos(skip r"#[^\n]*")] // Skip # comments
pub enum Token {
    // === Keywords ===
    /// Keyword `if`
    #[token("if")]
    If,
    /// Keyword `else`
    #[token("else")]
    Else,
    /// Keyword `fn`
    #[token("fn")]
    Fn,

    // === Operators ===
    /// Operator `+`
    #[token("+")]
    Plus,
    /// Operator `-`
    #[token("-")]
    Minus,
    /// Operator `*`
    #[token("*")]
    Star,
    /// Operator `**` (power)
    #[token("**")]
    StarStar,
    /// Operator `/`
    #[token("/")]
    Slash,
    /// Operator `%`
    #[token("%")]
    Percent,

    // Comparison
    /// Operator `==`
    #[token("==")]
    EqEq,
    /// Operator `!=`
    #[token("!=")]
    BangEq,
    /// Operator `<`
    #[token("<")]
    Lt,
    /// Operator `<=`
    #[token("<=")]
    LtEq,
    /// Operator `>`
    #[token(">")]
    Gt,
    /// Operator `>=`
    #[token(">=")]
    GtEq,

    // Logic
    /// Keyword `and` (logical and)
    #[token("and")]
    And,
    /// Keyword `or` (logical or)
    #[token("or")]
    Or,
    /// Keyword `not` (logical not)
    #[token("not")]
    Not,

    // Assignment
    /// Operator `=`
    #[token("=")]
    Eq,

    // Other
    /// Operator `,`
    #[token(",")]
    Comma,
    /// Operator `;`
    #[token(";")]
    Semicolon,

    // === Delimiters ===
    /// Delimiter `(`
    #[token("(")]
    LParen,
    /// Delimiter `)`
    #[token(")")]
    RParen,
    /// Delimiter `{`
    #[token("{")]
    LBrace,
    /// Delimiter `}`
    #[token("}")]
    RBrace,

    // === Literals ===
    /// Numeric literal. Decimal integers, floats with optional exponent,
    /// and `0x` hex integers all lex to one f64-valued token; the language
    /// has a single numeric type.
    ///
    /// The regexes guarantee a valid format, so the parse callbacks can
    /// only fail on overflow, which logos turns into a lex error at the
    /// literal's position.
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"0[xX][0-9a-fA-F]+", |lex| {
        i64::from_str_radix(&lex.slice()[2..], 16).ok().map(|v| v as f64)
    })]
    Number(f64),

    /// Identifier: variables, function names, `srcN`, `X`, `Y`, `N`.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::Fn => write!(f, "fn"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::StarStar => write!(f, "**"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::EqEq => write!(f, "=="),
            Token::BangEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::LtEq => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::GtEq => write!(f, ">="),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Not => write!(f, "not"),
            Token::Eq => write!(f, "="),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Number(v) => write!(f, "{v}"),
            Token::Ident(name) => write!(f, "{name}"),
        }
    }
}

/// Lexing failure: an input region no token rule matched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unexpected character(s) {found:?}")]
pub struct LexError {
    pub found: String,
    pub span: Span,
}

/// Tokenize `source`, pairing each token with its byte span.
///
/// Stops at the first unlexable region and reports it with its position.
pub fn lex(source: &str) -> Result<Vec<(Token, Span)>, LexError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, Span::from(lexer.span()))),
            Err(()) => {
                return Err(LexError {
                    found: lexer.slice().to_string(),
                    span: Span::from(lexer.span()),
                });
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        lex(source).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_keywords_and_idents() {
        let tokens = kinds("if else fn iffy");
        assert_eq!(
            tokens,
            vec![
                Token::If,
                Token::Else,
                Token::Fn,
                Token::Ident("iffy".to_string()),
            ]
        );
    }

    #[test]
    fn test_operators() {
        let tokens = kinds("+ - * ** / % == != < <= > >= = and or not");
        assert_eq!(
            tokens,
            vec![
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::StarStar,
                Token::Slash,
                Token::Percent,
                Token::EqEq,
                Token::BangEq,
                Token::Lt,
                Token::LtEq,
                Token::Gt,
                Token::GtEq,
                Token::Eq,
                Token::And,
                Token::Or,
                Token::Not,
            ]
        );
    }

    #[test]
    fn test_star_star_wins_over_two_stars() {
        // Longest match: `**` is one token, `* *` is two.
        assert_eq!(kinds("a**b").len(), 3);
        assert_eq!(kinds("a * * b").len(), 4);
    }

    #[test]
    fn test_number_forms() {
        assert_eq!(kinds("42"), vec![Token::Number(42.0)]);
        assert_eq!(kinds("3.5"), vec![Token::Number(3.5)]);
        assert_eq!(kinds("1e3"), vec![Token::Number(1000.0)]);
        assert_eq!(kinds("2.5e-1"), vec![Token::Number(0.25)]);
        assert_eq!(kinds("0xff"), vec![Token::Number(255.0)]);
        assert_eq!(kinds("0X10"), vec![Token::Number(16.0)]);
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = kinds("x = 1; # trailing comment\ny = 2;");
        assert_eq!(tokens.len(), 8);
    }

    #[test]
    fn test_windows_line_endings() {
        let tokens = kinds("x = 1;\r\ny = 2;\r\n");
        assert_eq!(tokens.len(), 8);
    }

    #[test]
    fn test_spans_point_into_source() {
        let source = "RESULT = src0;";
        let tokens = lex(source).unwrap();
        let (token, span) = &tokens[2];
        assert_eq!(*token, Token::Ident("src0".to_string()));
        assert_eq!(&source[span.start as usize..span.end as usize], "src0");
    }

    #[test]
    fn test_unexpected_character_is_an_error() {
        let err = lex("x = $;").unwrap_err();
        assert_eq!(err.found, "$");
        assert_eq!(err.span.start, 4);
    }

    #[test]
    fn test_directive_marker_is_not_an_infix_token() {
        // `@requires` lines are stripped before lexing; a stray `@` in
        // statement text is a lex error.
        assert!(lex("x = @;").is_err());
    }
}
