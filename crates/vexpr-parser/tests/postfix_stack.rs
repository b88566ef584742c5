//! Postfix front-end tests: stack replay, word classification, and
//! stack-effect validation.

use vexpr_ast::{BinaryOp, ExprKind, Mode, StmtKind};
use vexpr_parser::{parse_postfix, ParseErrorKind};

// =============================================================================
// Stack replay produces the expected AST
// =============================================================================

#[test]
fn test_single_value_becomes_result() {
    let stmts = parse_postfix("src0", Mode::PerPixel).unwrap();
    assert_eq!(stmts.len(), 1);
    match &stmts[0].kind {
        StmtKind::Assign { name, value } => {
            assert_eq!(name, "RESULT");
            assert_eq!(value.kind, ExprKind::Var("src0".to_string()));
        }
        _ => panic!("Expected RESULT assignment"),
    }
}

#[test]
fn test_binary_operand_order() {
    // `a b -` is a - b
    let stmts = parse_postfix("src0 16 -", Mode::PerPixel).unwrap();
    match &stmts[0].kind {
        StmtKind::Assign { value, .. } => match &value.kind {
            ExprKind::Binary { op, left, right } => {
                assert_eq!(*op, BinaryOp::Sub);
                assert_eq!(left.kind, ExprKind::Var("src0".to_string()));
                assert_eq!(right.kind, ExprKind::Number(16.0));
            }
            _ => panic!("Expected binary"),
        },
        _ => panic!("Expected assignment"),
    }
}

#[test]
fn test_ternary_operand_order() {
    // `cond then else ?` is cond ? then : else
    let stmts = parse_postfix("src0 100 200 ?", Mode::PerPixel).unwrap();
    match &stmts[0].kind {
        StmtKind::Assign { value, .. } => match &value.kind {
            ExprKind::Ternary { cond, then, other } => {
                assert_eq!(cond.kind, ExprKind::Var("src0".to_string()));
                assert_eq!(then.kind, ExprKind::Number(100.0));
                assert_eq!(other.kind, ExprKind::Number(200.0));
            }
            _ => panic!("Expected ternary"),
        },
        _ => panic!("Expected assignment"),
    }
}

#[test]
fn test_builtin_call_pops_declared_arity() {
    let stmts = parse_postfix("src0 0 255 clamp", Mode::PerPixel).unwrap();
    match &stmts[0].kind {
        StmtKind::Assign { value, .. } => match &value.kind {
            ExprKind::Call { name, args } => {
                assert_eq!(name, "clamp");
                assert_eq!(args.len(), 3);
            }
            _ => panic!("Expected call"),
        },
        _ => panic!("Expected assignment"),
    }
}

#[test]
fn test_variable_store_and_load() {
    let stmts = parse_postfix("src0 2 * v! v@ v@ min", Mode::PerPixel).unwrap();
    assert_eq!(stmts.len(), 2);
    assert!(matches!(&stmts[0].kind, StmtKind::Assign { name, .. } if name == "v"));
}

#[test]
fn test_dup_and_swap() {
    // `3 dup *` squares, `1 2 swap -` is 2 - 1
    let stmts = parse_postfix("3 dup *", Mode::PerPixel).unwrap();
    assert_eq!(stmts.len(), 1);

    let stmts = parse_postfix("1 2 swap -", Mode::PerPixel).unwrap();
    match &stmts[0].kind {
        StmtKind::Assign { value, .. } => match &value.kind {
            ExprKind::Binary { left, right, .. } => {
                assert_eq!(left.kind, ExprKind::Number(2.0));
                assert_eq!(right.kind, ExprKind::Number(1.0));
            }
            _ => panic!("Expected binary"),
        },
        _ => panic!("Expected assignment"),
    }
}

#[test]
fn test_drop_discards() {
    let stmts = parse_postfix("1 2 drop", Mode::PerPixel).unwrap();
    match &stmts[0].kind {
        StmtKind::Assign { value, .. } => assert_eq!(value.kind, ExprKind::Number(1.0)),
        _ => panic!("Expected assignment"),
    }
}

#[test]
fn test_number_forms() {
    for (word, expected) in [("42", 42.0), ("0x1f", 31.0), ("2.5e1", 25.0), ("-3", -3.0)] {
        let stmts = parse_postfix(word, Mode::PerPixel).unwrap();
        match &stmts[0].kind {
            StmtKind::Assign { value, .. } => assert_eq!(value.kind, ExprKind::Number(expected)),
            _ => panic!("Expected assignment"),
        }
    }
}

#[test]
fn test_prop_write_words() {
    let stmts = parse_postfix("42 answer$i 0.5 ratio$f", Mode::PerFrame).unwrap();
    assert_eq!(stmts.len(), 2);
    match &stmts[0].kind {
        StmtKind::Expr(expr) => match &expr.kind {
            ExprKind::Call { name, args } => {
                assert_eq!(name, "set_propi");
                assert_eq!(args[0].kind, ExprKind::Var("answer".to_string()));
                assert_eq!(args[1].kind, ExprKind::Number(42.0));
            }
            _ => panic!("Expected call"),
        },
        _ => panic!("Expected expression statement"),
    }
}

#[test]
fn test_comments_skipped() {
    let stmts = parse_postfix("src0 # the clip\n2 * # doubled", Mode::PerPixel).unwrap();
    assert_eq!(stmts.len(), 1);
}

#[test]
fn test_mode_selects_builtin_arity() {
    // get_width is 1-arg per-pixel, 2-arg per-frame
    let stmts = parse_postfix("0 get_width", Mode::PerPixel).unwrap();
    assert_eq!(stmts.len(), 1);

    let stmts = parse_postfix("0 1 get_width w$i", Mode::PerFrame).unwrap();
    assert_eq!(stmts.len(), 1);
}

// =============================================================================
// Stack-effect errors
// =============================================================================

#[test]
fn test_underflow_reports_word_and_depth() {
    let err = parse_postfix("src0 +", Mode::PerPixel).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::StackUnderflow);
    assert!(err.message.contains('+'));
    assert!(err.message.contains('1'));
    // span points at the `+` word
    assert_eq!(err.span.start, 5);
}

#[test]
fn test_leftover_values_rejected_per_pixel() {
    let err = parse_postfix("1 2", Mode::PerPixel).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::StackImbalance);
}

#[test]
fn test_empty_stack_rejected_per_pixel() {
    let err = parse_postfix("1 x!", Mode::PerPixel).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::StackImbalance);
}

#[test]
fn test_per_frame_requires_empty_stack() {
    let err = parse_postfix("1 2 total$i", Mode::PerFrame).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::StackImbalance);
}

#[test]
fn test_underflow_inside_builtin() {
    let err = parse_postfix("1 clamp", Mode::PerPixel).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::StackUnderflow);
}

#[test]
fn test_malformed_number() {
    let err = parse_postfix("0xzz", Mode::PerPixel).unwrap_err();
    assert!(err.message.contains("malformed number"));
}

#[test]
fn test_prop_builtin_name_is_not_a_postfix_word() {
    let err = parse_postfix("1 2 set_propi", Mode::PerFrame).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::InvalidSyntax);
}
