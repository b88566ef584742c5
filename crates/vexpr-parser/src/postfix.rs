//! Postfix (stack-language) front-end.
//!
//! Words are replayed against a symbolic value stack at parse time: each
//! word's stack effect is applied to AST fragments instead of runtime
//! values, so the output is the same statement/expression tree the infix
//! parser produces and every stack error is caught before compilation.

use vexpr_ast::{
    builtins, BinaryOp, Expr, ExprKind, Mode, Span, Stmt, StmtKind, UnaryOp, RESULT,
};

use crate::error::ParseError;

/// Parse a postfix program into a statement list.
///
/// Per-pixel programs must leave exactly one value on the stack; it becomes
/// the final `RESULT` assignment. Per-frame programs must leave the stack
/// empty.
pub fn parse_postfix(source: &str, mode: Mode) -> Result<Vec<Stmt>, ParseError> {
    let mut replay = Replay {
        mode,
        stack: Vec::new(),
        stmts: Vec::new(),
    };

    let mut last_span = Span::zero();
    for (start, word) in scan_words(source) {
        let span = Span::new(start as u32, (start + word.len()) as u32);
        last_span = span;
        replay.word(word, span)?;
    }

    replay.finish(last_span)
}

struct Replay {
    mode: Mode,
    stack: Vec<Expr>,
    stmts: Vec<Stmt>,
}

impl Replay {
    fn word(&mut self, word: &str, span: Span) -> Result<(), ParseError> {
        // Literals first: anything that starts numerically must be a number.
        if looks_numeric(word) {
            let value = parse_number(word)
                .ok_or_else(|| ParseError::other(format!("malformed number `{}`", word), span))?;
            self.stack.push(Expr::new(ExprKind::Number(value), span));
            return Ok(());
        }

        // Variable store / load.
        if let Some(name) = word.strip_suffix('!') {
            let value = self.pop1(word, span)?;
            check_word_ident(name, word, span)?;
            self.stmts.push(Stmt::new(
                StmtKind::Assign {
                    name: name.to_string(),
                    value,
                },
                span,
            ));
            return Ok(());
        }
        if let Some(name) = word.strip_suffix('@') {
            check_word_ident(name, word, span)?;
            self.stack
                .push(Expr::new(ExprKind::Var(name.to_string()), span));
            return Ok(());
        }

        // Property writers: `key$f` / `key$i` and the array-append forms
        // `key$af` / `key$ai`.
        if let Some((key, writer)) = split_prop_word(word) {
            check_word_ident(key, word, span)?;
            let value = self.pop1(word, span)?;
            let key_expr = Expr::new(ExprKind::Var(key.to_string()), span);
            self.stmts.push(Stmt::new(
                StmtKind::Expr(Expr::new(
                    ExprKind::Call {
                        name: writer.to_string(),
                        args: vec![key_expr, value],
                    },
                    span,
                )),
                span,
            ));
            return Ok(());
        }

        // Operators and stack manipulation.
        if let Some(op) = binary_word(word) {
            let (left, right) = self.pop2(word, span)?;
            let merged = left.span.merge(&span);
            self.stack.push(Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                merged,
            ));
            return Ok(());
        }
        match word {
            "not" | "neg" => {
                let operand = self.pop1(word, span)?;
                let op = if word == "not" {
                    UnaryOp::Not
                } else {
                    UnaryOp::Neg
                };
                self.stack.push(Expr::new(
                    ExprKind::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                    span,
                ));
                return Ok(());
            }
            "?" => {
                let (cond, then, other) = self.pop3(word, span)?;
                self.stack.push(Expr::new(
                    ExprKind::Ternary {
                        cond: Box::new(cond),
                        then: Box::new(then),
                        other: Box::new(other),
                    },
                    span,
                ));
                return Ok(());
            }
            "dup" => {
                let top = self.pop1(word, span)?;
                self.stack.push(top.clone());
                self.stack.push(top);
                return Ok(());
            }
            "swap" => {
                let (a, b) = self.pop2(word, span)?;
                self.stack.push(b);
                self.stack.push(a);
                return Ok(());
            }
            "drop" => {
                self.pop1(word, span)?;
                return Ok(());
            }
            _ => {}
        }

        // Builtin calls by bare word, with the mode-appropriate arity.
        if builtins::is_builtin(word) {
            let sig = builtins::lookup_for_mode(word, self.mode).ok_or_else(|| {
                ParseError::invalid_syntax(
                    format!("`{}` is not available in this mode", word),
                    span,
                )
            })?;
            if matches!(sig.kind, builtins::BuiltinKind::Prop(_)) {
                return Err(ParseError::invalid_syntax(
                    format!("`{}` is not a postfix word; use `key$f` / `key$i` / `key$af` / `key$ai`", word),
                    span,
                ));
            }
            let args = self.popn(word, sig.arity, span)?;
            self.stack.push(Expr::new(
                ExprKind::Call {
                    name: word.to_string(),
                    args,
                },
                span,
            ));
            return Ok(());
        }

        // Everything else is an identifier push: srcN, X, Y, N, or a user
        // variable (resolution reports unknown names).
        check_word_ident(word, word, span)?;
        self.stack
            .push(Expr::new(ExprKind::Var(word.to_string()), span));
        Ok(())
    }

    fn finish(mut self, last_span: Span) -> Result<Vec<Stmt>, ParseError> {
        match self.mode {
            Mode::PerPixel => {
                if self.stack.len() != 1 {
                    return Err(ParseError::stack_imbalance(1, self.stack.len(), last_span));
                }
                let value = self.stack.remove(0);
                let span = value.span;
                self.stmts.push(Stmt::new(
                    StmtKind::Assign {
                        name: RESULT.to_string(),
                        value,
                    },
                    span,
                ));
            }
            Mode::PerFrame => {
                if !self.stack.is_empty() {
                    return Err(ParseError::stack_imbalance(0, self.stack.len(), last_span));
                }
            }
        }
        Ok(self.stmts)
    }

    fn popn(&mut self, word: &str, n: usize, span: Span) -> Result<Vec<Expr>, ParseError> {
        if self.stack.len() < n {
            return Err(ParseError::stack_underflow(word, n, self.stack.len(), span));
        }
        Ok(self.stack.split_off(self.stack.len() - n))
    }

    fn pop1(&mut self, word: &str, span: Span) -> Result<Expr, ParseError> {
        let mut args = self.popn(word, 1, span)?;
        Ok(args.remove(0))
    }

    fn pop2(&mut self, word: &str, span: Span) -> Result<(Expr, Expr), ParseError> {
        let mut args = self.popn(word, 2, span)?;
        let right = args.remove(1);
        Ok((args.remove(0), right))
    }

    fn pop3(&mut self, word: &str, span: Span) -> Result<(Expr, Expr, Expr), ParseError> {
        let mut args = self.popn(word, 3, span)?;
        let c = args.remove(2);
        let b = args.remove(1);
        Ok((args.remove(0), b, c))
    }
}

fn binary_word(word: &str) -> Option<BinaryOp> {
    match word {
        "+" => Some(BinaryOp::Add),
        "-" => Some(BinaryOp::Sub),
        "*" => Some(BinaryOp::Mul),
        "/" => Some(BinaryOp::Div),
        "%" => Some(BinaryOp::Rem),
        "**" => Some(BinaryOp::Pow),
        "<" => Some(BinaryOp::Lt),
        "<=" => Some(BinaryOp::Le),
        ">" => Some(BinaryOp::Gt),
        ">=" => Some(BinaryOp::Ge),
        // Both spellings of equality are accepted.
        "=" | "==" => Some(BinaryOp::Eq),
        "!=" => Some(BinaryOp::Ne),
        "and" => Some(BinaryOp::And),
        "or" => Some(BinaryOp::Or),
        _ => None,
    }
}

/// `key$f` / `key$i` / `key$af` / `key$ai` → (key, builtin name).
fn split_prop_word(word: &str) -> Option<(&str, &'static str)> {
    if let Some(key) = word.strip_suffix("$af") {
        Some((key, "set_propaf"))
    } else if let Some(key) = word.strip_suffix("$ai") {
        Some((key, "set_propai"))
    } else if let Some(key) = word.strip_suffix("$f") {
        Some((key, "set_propf"))
    } else {
        word.strip_suffix("$i").map(|key| (key, "set_propi"))
    }
}

fn looks_numeric(word: &str) -> bool {
    let rest = word.strip_prefix('-').unwrap_or(word);
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('.') => matches!(chars.next(), Some(c) if c.is_ascii_digit()),
        _ => false,
    }
}

fn parse_number(word: &str) -> Option<f64> {
    let (neg, digits) = match word.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, word),
    };
    let value = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16).ok()? as f64
    } else {
        digits.parse::<f64>().ok()?
    };
    Some(if neg { -value } else { value })
}

fn check_word_ident(name: &str, word: &str, span: Span) -> Result<(), ParseError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ParseError::other(
            format!("unknown word `{}`", word),
            span,
        ))
    }
}

/// Split source into (byte offset, word) pairs, skipping `#` comments.
fn scan_words(source: &str) -> Vec<(usize, &str)> {
    let bytes = source.as_bytes();
    let mut words = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'#' {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
        } else if bytes[i].is_ascii_whitespace() {
            i += 1;
        } else {
            let start = i;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'#' {
                i += 1;
            }
            words.push((start, &source[start..i]));
        }
    }
    words
}
