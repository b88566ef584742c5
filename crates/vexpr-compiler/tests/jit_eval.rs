//! End-to-end tests: compile real source and call the generated code.

use vexpr_ast::Syntax;
use vexpr_compiler::{compile_frame, compile_pixel, PropSink};
use vexpr_types::{ClipDescriptor, PropValue, PropertyMap};

fn float_output() -> ClipDescriptor {
    ClipDescriptor::rgb_float(64, 64, 32)
}

fn grey8() -> ClipDescriptor {
    ClipDescriptor::grey(64, 64, 8)
}

/// Compile `source` against greyscale inputs and evaluate once.
fn eval(source: &str, inputs: &[f32], x: f32, y: f32, n: f32) -> f32 {
    let clips: Vec<ClipDescriptor> = inputs.iter().map(|_| grey8()).collect();
    let program =
        compile_pixel(source, Syntax::Infix, &clips, &float_output()).unwrap();
    let entry = program.pixel_entry().unwrap();
    entry(inputs.as_ptr(), x, y, n)
}

fn eval_expr(source: &str) -> f32 {
    eval(source, &[], 0.0, 0.0, 0.0)
}

// ---------------------------------------------------------------------------
// Arithmetic and operators
// ---------------------------------------------------------------------------

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(eval_expr("RESULT = 2 + 3 * 4;"), 14.0);
    assert_eq!(eval_expr("RESULT = (2 + 3) * 4;"), 20.0);
    assert_eq!(eval_expr("RESULT = 10 - 4 - 3;"), 3.0);
}

#[test]
fn test_power_is_right_associative() {
    assert_eq!(eval_expr("RESULT = 2 ** 2 ** 3;"), 256.0);
}

#[test]
fn test_remainder() {
    assert_eq!(eval_expr("RESULT = 7 % 3;"), 1.0);
    assert_eq!(eval_expr("RESULT = 7.5 % 2;"), 1.5);
}

#[test]
fn test_division_by_zero_is_ieee() {
    assert!(eval_expr("RESULT = 1 / 0;").is_infinite());
    assert!(eval_expr("RESULT = 0 / 0;").is_nan());
}

#[test]
fn test_comparisons_yield_zero_or_one() {
    assert_eq!(eval_expr("RESULT = 3 < 4;"), 1.0);
    assert_eq!(eval_expr("RESULT = 3 >= 4;"), 0.0);
    assert_eq!(eval_expr("RESULT = 3 == 3;"), 1.0);
    assert_eq!(eval_expr("RESULT = 3 != 3;"), 0.0);
}

#[test]
fn test_logical_operators() {
    assert_eq!(eval_expr("RESULT = 1 and 2;"), 1.0);
    assert_eq!(eval_expr("RESULT = 1 and 0;"), 0.0);
    assert_eq!(eval_expr("RESULT = 0 or 5;"), 1.0);
    assert_eq!(eval_expr("RESULT = 0 or 0;"), 0.0);
    assert_eq!(eval_expr("RESULT = not 0;"), 1.0);
    assert_eq!(eval_expr("RESULT = not 3;"), 0.0);
}

#[test]
fn test_short_circuit_skips_right_side() {
    // The right side divides by zero; short-circuiting must avoid turning
    // the overall truth value into NaN.
    assert_eq!(eval_expr("RESULT = 0 and (0 / 0);"), 0.0);
    assert_eq!(eval_expr("RESULT = 1 or (0 / 0);"), 1.0);
}

#[test]
fn test_ternary_selects_by_condition() {
    // The ternary is a postfix-only word.
    let program = compile_pixel(
        "N 10 20 ?",
        Syntax::Postfix,
        &[],
        &float_output(),
    )
    .unwrap();
    let entry = program.pixel_entry().unwrap();
    assert_eq!(entry(std::ptr::null(), 0.0, 0.0, 1.0), 10.0);
    assert_eq!(entry(std::ptr::null(), 0.0, 0.0, 0.0), 20.0);
}

#[test]
fn test_unary_negation() {
    assert_eq!(eval_expr("RESULT = -(3 + 4);"), -7.0);
}

// ---------------------------------------------------------------------------
// Inputs, coordinates, variables, control flow
// ---------------------------------------------------------------------------

#[test]
fn test_clip_inputs() {
    assert_eq!(eval("RESULT = (src0 + src1) / 2;", &[10.0, 20.0], 0.0, 0.0, 0.0), 15.0);
    assert_eq!(eval("RESULT = src1 - src0;", &[12.0, 30.0], 0.0, 0.0, 0.0), 18.0);
}

#[test]
fn test_coordinates_and_frame_index() {
    assert_eq!(eval("RESULT = X + Y * 10 + N * 100;", &[], 3.0, 2.0, 1.0), 123.0);
}

#[test]
fn test_variables_and_if() {
    let source = "
        x = 0;
        if (src0 > 10) { x = 1; } else { x = 2; }
        RESULT = x;
    ";
    assert_eq!(eval(source, &[50.0], 0.0, 0.0, 0.0), 1.0);
    assert_eq!(eval(source, &[5.0], 0.0, 0.0, 0.0), 2.0);
}

#[test]
fn test_else_if_chain() {
    let source = "
        if (src0 < 10) { band = 0; }
        else if (src0 < 100) { band = 1; }
        else { band = 2; }
        RESULT = band;
    ";
    assert_eq!(eval(source, &[3.0], 0.0, 0.0, 0.0), 0.0);
    assert_eq!(eval(source, &[42.0], 0.0, 0.0, 0.0), 1.0);
    assert_eq!(eval(source, &[500.0], 0.0, 0.0, 0.0), 2.0);
}

#[test]
fn test_user_function_inlining() {
    let source = "
        fn lerp(a, b, t) { a + (b - a) * t }
        RESULT = lerp(src0, src1, 0.25);
    ";
    assert_eq!(eval(source, &[0.0, 100.0], 0.0, 0.0, 0.0), 25.0);
}

// ---------------------------------------------------------------------------
// Math builtins
// ---------------------------------------------------------------------------

#[test]
fn test_math_builtins() {
    assert_eq!(eval_expr("RESULT = sqrt(9);"), 3.0);
    assert_eq!(eval_expr("RESULT = abs(0 - 5);"), 5.0);
    assert_eq!(eval_expr("RESULT = floor(2.9);"), 2.0);
    assert_eq!(eval_expr("RESULT = ceil(2.1);"), 3.0);
    assert_eq!(eval_expr("RESULT = trunc(-2.7);"), -2.0);
    assert_eq!(eval_expr("RESULT = min(3, 7);"), 3.0);
    assert_eq!(eval_expr("RESULT = max(3, 7);"), 7.0);
    assert_eq!(eval_expr("RESULT = clamp(12, 0, 10);"), 10.0);
    assert_eq!(eval_expr("RESULT = clamp(-2, 0, 10);"), 0.0);
    assert_eq!(eval_expr("RESULT = fma(2, 3, 4);"), 10.0);
    assert_eq!(eval_expr("RESULT = copysign(3, -1);"), -3.0);
    assert_eq!(eval_expr("RESULT = pow(2, 10);"), 1024.0);
}

#[test]
fn test_transcendentals_match_libm() {
    assert!((eval_expr("RESULT = sin(1);") - 1.0f32.sin()).abs() < 1e-6);
    assert!((eval_expr("RESULT = exp(1);") - 1.0f32.exp()).abs() < 1e-4);
    assert!((eval_expr("RESULT = log2(8);") - 3.0).abs() < 1e-6);
    assert!((eval_expr("RESULT = atan2(1, 1);") - std::f32::consts::FRAC_PI_4).abs() < 1e-6);
}

#[test]
fn test_round_is_half_away_from_zero() {
    assert_eq!(eval_expr("RESULT = round(0.5);"), 1.0);
    assert_eq!(eval_expr("RESULT = round(2.5);"), 3.0);
    assert_eq!(eval_expr("RESULT = round(-0.5);"), -1.0);
}

#[test]
fn test_sgn() {
    assert_eq!(eval_expr("RESULT = sgn(-3);"), -1.0);
    assert_eq!(eval_expr("RESULT = sgn(0);"), 0.0);
    assert_eq!(eval_expr("RESULT = sgn(42);"), 1.0);
}

// ---------------------------------------------------------------------------
// Metadata intrinsics
// ---------------------------------------------------------------------------

#[test]
fn test_metadata_folds_against_clip() {
    let clips = [ClipDescriptor::yuv420(1920, 1080, 10)];
    let program = compile_pixel(
        "@requires std\nRESULT = get_width(1) + get_bitdepth(0);",
        Syntax::Infix,
        &clips,
        &float_output(),
    )
    .unwrap();
    let entry = program.pixel_entry().unwrap();
    assert_eq!(entry(std::ptr::null(), 0.0, 0.0, 0.0), 970.0);
}

// ---------------------------------------------------------------------------
// Output conversion
// ---------------------------------------------------------------------------

#[test]
fn test_integer_output_rounds_and_clamps() {
    let eval8 = |source: &str| {
        let program = compile_pixel(source, Syntax::Infix, &[], &grey8()).unwrap();
        let entry = program.pixel_entry().unwrap();
        entry(std::ptr::null(), 0.0, 0.0, 0.0)
    };
    assert_eq!(eval8("RESULT = 300;"), 255.0);
    assert_eq!(eval8("RESULT = 0 - 5;"), 0.0);
    assert_eq!(eval8("RESULT = 10.4;"), 10.0);
    assert_eq!(eval8("RESULT = 10.5;"), 11.0);
}

#[test]
fn test_float_output_passes_through() {
    assert_eq!(eval_expr("RESULT = 300.5;"), 300.5);
    assert_eq!(eval_expr("RESULT = 0 - 5;"), -5.0);
}

// ---------------------------------------------------------------------------
// Postfix front-end
// ---------------------------------------------------------------------------

#[test]
fn test_postfix_pixel_program() {
    let clips = [grey8(), grey8()];
    let program =
        compile_pixel("src0 src1 - abs", Syntax::Postfix, &clips, &float_output()).unwrap();
    let entry = program.pixel_entry().unwrap();
    let inputs = [12.0f32, 30.0];
    assert_eq!(entry(inputs.as_ptr(), 0.0, 0.0, 0.0), 18.0);
}

#[test]
fn test_postfix_ternary_and_dup() {
    let clips = [grey8()];
    let program = compile_pixel(
        "src0 dup 128 > 255 0 ? swap drop",
        Syntax::Postfix,
        &clips,
        &float_output(),
    )
    .unwrap();
    let entry = program.pixel_entry().unwrap();
    let bright = [200.0f32];
    assert_eq!(entry(bright.as_ptr(), 0.0, 0.0, 0.0), 255.0);
    let dark = [20.0f32];
    assert_eq!(entry(dark.as_ptr(), 0.0, 0.0, 0.0), 0.0);
}

// ---------------------------------------------------------------------------
// Per-frame programs
// ---------------------------------------------------------------------------

fn run_frame(source: &str, syntax: Syntax, map: &mut PropertyMap, n: f32) {
    let program = compile_frame(source, syntax, &[]).unwrap();
    let keys = program.prop_keys().to_vec();
    let mut sink = PropSink::new(map, &keys);
    let entry = program.frame_entry().unwrap();
    entry(&mut sink, n);
}

#[test]
fn test_per_frame_property_writes() {
    let mut map = PropertyMap::new();
    run_frame(
        "set_propi(count, N + 1); set_propf(ratio, N / 2);",
        Syntax::Infix,
        &mut map,
        4.0,
    );
    assert_eq!(map.get("count"), Some(&PropValue::Int(5)));
    assert_eq!(map.get("ratio"), Some(&PropValue::Float(2.0)));
}

#[test]
fn test_per_frame_remove() {
    let mut map = PropertyMap::new();
    map.set_int("stale", 7);
    run_frame("remove_prop(stale);", Syntax::Infix, &mut map, 0.0);
    assert!(map.get("stale").is_none());
}

#[test]
fn test_per_frame_conditional_write() {
    let source = "if (N > 10) { set_propi(late, 1); } else { set_propi(late, 0); }";
    let mut map = PropertyMap::new();
    run_frame(source, Syntax::Infix, &mut map, 20.0);
    assert_eq!(map.get("late"), Some(&PropValue::Int(1)));
    run_frame(source, Syntax::Infix, &mut map, 3.0);
    assert_eq!(map.get("late"), Some(&PropValue::Int(0)));
}

#[test]
fn test_per_frame_postfix_writes() {
    let mut map = PropertyMap::new();
    run_frame("N 2 * total$i N 10 / share$f", Syntax::Postfix, &mut map, 6.0);
    assert_eq!(map.get("total"), Some(&PropValue::Int(12)));
    assert_eq!(map.get("share"), Some(&PropValue::Float(0.6000000238418579)));
}

#[test]
fn test_per_frame_array_appends() {
    let mut map = PropertyMap::new();
    run_frame(
        "set_propai(hist, N); set_propai(hist, N * 2); set_propaf(w, 0.25);",
        Syntax::Infix,
        &mut map,
        3.0,
    );
    assert_eq!(map.get("hist"), Some(&PropValue::IntArray(vec![3, 6])));
    assert_eq!(map.get("w"), Some(&PropValue::FloatArray(vec![0.25])));
}

#[test]
fn test_per_frame_postfix_array_words() {
    let mut map = PropertyMap::new();
    run_frame("N vals$ai N 1 + vals$ai", Syntax::Postfix, &mut map, 5.0);
    assert_eq!(map.get("vals"), Some(&PropValue::IntArray(vec![5, 6])));
}

#[test]
fn test_per_frame_set_propi_rounds() {
    let mut map = PropertyMap::new();
    run_frame("set_propi(v, 2.6);", Syntax::Infix, &mut map, 0.0);
    assert_eq!(map.get("v"), Some(&PropValue::Int(3)));
}

// ---------------------------------------------------------------------------
// Error positions
// ---------------------------------------------------------------------------

#[test]
fn test_errors_report_line_and_column() {
    let source = "x = 1;\nRESULT = nosuch(x);";
    let err = compile_pixel(source, Syntax::Infix, &[], &float_output()).unwrap_err();
    // `nosuch` starts at line 2, column 10.
    assert_eq!(err.line_col(source), Some((2, 10)));
}

// ---------------------------------------------------------------------------
// Mode mismatches on the program handle
// ---------------------------------------------------------------------------

#[test]
fn test_entry_accessors_follow_mode() {
    let pixel = compile_pixel("RESULT = 1;", Syntax::Infix, &[], &float_output()).unwrap();
    assert!(pixel.pixel_entry().is_some());
    assert!(pixel.frame_entry().is_none());

    let frame = compile_frame("set_propi(k, 1);", Syntax::Infix, &[]).unwrap();
    assert!(frame.frame_entry().is_some());
    assert!(frame.pixel_entry().is_none());
    assert_eq!(frame.prop_keys(), ["k"]);
}
