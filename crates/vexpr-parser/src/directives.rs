//! `@requires` directive extraction.
//!
//! Directives are line-oriented and must precede every statement, so they
//! are stripped before either grammar runs. Stripped lines are blanked with
//! spaces rather than removed, keeping byte offsets (and therefore spans)
//! stable against the original source.

use vexpr_ast::{Directive, Span};

use crate::error::ParseError;

/// Extract leading `@requires <module>` directives from `source`.
///
/// Returns the directives and the source with directive lines blanked.
/// Blank lines and `#` comments may appear between directives; any `@` line
/// after the first real statement is an error.
pub fn strip_directives(source: &str) -> Result<(Vec<Directive>, String), ParseError> {
    let mut directives = Vec::new();
    let mut stripped = String::with_capacity(source.len());
    let mut seen_code = false;

    let mut offset = 0usize;
    for line in source.split_inclusive('\n') {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix('@') {
            let line_start = offset + (line.len() - line.trim_start().len());
            let span = Span::new(line_start as u32, (line_start + trimmed.len()) as u32);
            if seen_code {
                return Err(ParseError::invalid_syntax(
                    "directives must precede all statements",
                    span,
                ));
            }
            directives.push(parse_directive(rest, span)?);
            // Blank the directive but keep the line ending, so spans into
            // later lines stay valid.
            for ch in line.chars() {
                stripped.push(if ch == '\n' || ch == '\r' { ch } else { ' ' });
            }
        } else {
            if !trimmed.is_empty() && !trimmed.starts_with('#') {
                seen_code = true;
            }
            stripped.push_str(line);
        }
        offset += line.len();
    }

    Ok((directives, stripped))
}

fn parse_directive(rest: &str, span: Span) -> Result<Directive, ParseError> {
    let mut words = rest.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some("requires"), Some(module), None) if is_ident(module) => Ok(Directive {
            module: module.to_string(),
            span,
        }),
        (Some("requires"), _, _) => Err(ParseError::invalid_syntax(
            "malformed directive: expected `@requires <module>`",
            span,
        )),
        (Some(other), _, _) => Err(ParseError::invalid_syntax(
            format!("unknown directive `@{}`", other),
            span,
        )),
        (None, _, _) => Err(ParseError::invalid_syntax(
            "empty directive",
            span,
        )),
    }
}

fn is_ident(word: &str) -> bool {
    let mut chars = word.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_directive() {
        let (dirs, stripped) = strip_directives("@requires std\nRESULT = 1;").unwrap();
        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs[0].module, "std");
        // Offsets preserved: statement still starts at byte 14
        assert_eq!(&stripped[14..], "RESULT = 1;");
        assert!(stripped[..13].chars().all(|c| c == ' '));
    }

    #[test]
    fn test_comments_between_directives() {
        let source = "# header\n@requires std\n\n@requires std\nx = 1;";
        let (dirs, _) = strip_directives(source).unwrap();
        assert_eq!(dirs.len(), 2);
    }

    #[test]
    fn test_directive_after_code_rejected() {
        let err = strip_directives("x = 1;\n@requires std\n").unwrap_err();
        assert!(err.message.contains("precede"));
    }

    #[test]
    fn test_malformed_directive() {
        assert!(strip_directives("@requires\n").is_err());
        assert!(strip_directives("@requires two words\n").is_err());
        assert!(strip_directives("@import std\n").is_err());
    }

    #[test]
    fn test_no_directives() {
        let (dirs, stripped) = strip_directives("x = 1;").unwrap();
        assert!(dirs.is_empty());
        assert_eq!(stripped, "x = 1;");
    }
}
