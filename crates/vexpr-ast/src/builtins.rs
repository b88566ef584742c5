//! Builtin function signature table.
//!
//! Shared vocabulary between the parser (the postfix front-end needs arities
//! to replay the stack) and the resolver (arity/mode/module validation).
//! The table is static: modules are a compile-time concept, not runtime
//! reflection.

use crate::ast::Mode;

/// Math builtins that lower to either a native instruction or a libm shim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MathFn {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Exp,
    Exp2,
    Log,
    Log2,
    Log10,
    Sqrt,
    Abs,
    Sgn,
    Floor,
    Ceil,
    Round,
    Trunc,
    Pow,
    Min,
    Max,
    Copysign,
    Clamp,
    Fma,
}

/// Clip metadata queries, constant-folded at resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaQuery {
    Width,
    Height,
    BitDepth,
    Fmt,
}

/// Frame property writers (per-frame mode only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropWrite {
    SetFloat,
    SetInt,
    /// Append to a float array property.
    AppendFloat,
    /// Append to an int array property.
    AppendInt,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    Math(MathFn),
    Meta(MetaQuery),
    Prop(PropWrite),
}

/// One overload of a builtin.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinSig {
    pub name: &'static str,
    pub arity: usize,
    /// `None` means available in both modes.
    pub mode: Option<Mode>,
    /// Module that must be activated with `@requires`; `None` for the
    /// always-active core set.
    pub module: Option<&'static str>,
    pub kind: BuiltinKind,
    /// Whether a call pushes a value (property writers do not).
    pub returns_value: bool,
}

const fn math(name: &'static str, arity: usize, f: MathFn) -> BuiltinSig {
    BuiltinSig {
        name,
        arity,
        mode: None,
        module: None,
        kind: BuiltinKind::Math(f),
        returns_value: true,
    }
}

const fn meta(name: &'static str, arity: usize, mode: Mode, q: MetaQuery) -> BuiltinSig {
    BuiltinSig {
        name,
        arity,
        mode: Some(mode),
        module: Some("std"),
        kind: BuiltinKind::Meta(q),
        returns_value: true,
    }
}

const fn prop(name: &'static str, arity: usize, w: PropWrite) -> BuiltinSig {
    BuiltinSig {
        name,
        arity,
        mode: Some(Mode::PerFrame),
        module: None,
        kind: BuiltinKind::Prop(w),
        returns_value: false,
    }
}

/// The full builtin table. Overloads of one name are adjacent.
pub static BUILTINS: &[BuiltinSig] = &[
    math("sin", 1, MathFn::Sin),
    math("cos", 1, MathFn::Cos),
    math("tan", 1, MathFn::Tan),
    math("asin", 1, MathFn::Asin),
    math("acos", 1, MathFn::Acos),
    math("atan", 1, MathFn::Atan),
    math("exp", 1, MathFn::Exp),
    math("exp2", 1, MathFn::Exp2),
    math("log", 1, MathFn::Log),
    math("log2", 1, MathFn::Log2),
    math("log10", 1, MathFn::Log10),
    math("sqrt", 1, MathFn::Sqrt),
    math("abs", 1, MathFn::Abs),
    math("sgn", 1, MathFn::Sgn),
    math("floor", 1, MathFn::Floor),
    math("ceil", 1, MathFn::Ceil),
    math("round", 1, MathFn::Round),
    math("trunc", 1, MathFn::Trunc),
    math("atan2", 2, MathFn::Atan2),
    math("pow", 2, MathFn::Pow),
    math("min", 2, MathFn::Min),
    math("max", 2, MathFn::Max),
    math("copysign", 2, MathFn::Copysign),
    math("clamp", 3, MathFn::Clamp),
    math("fma", 3, MathFn::Fma),
    // Property writers carry their key as a leading identifier argument.
    prop("set_prop", 2, PropWrite::SetFloat),
    prop("set_propf", 2, PropWrite::SetFloat),
    prop("set_propi", 2, PropWrite::SetInt),
    prop("set_propaf", 2, PropWrite::AppendFloat),
    prop("set_propai", 2, PropWrite::AppendInt),
    prop("remove_prop", 1, PropWrite::Remove),
    // Clip metadata intrinsics, gated behind `@requires std`. Per-pixel
    // overloads take a plane index (clip 0 implied); per-frame overloads
    // take (clip, plane).
    meta("get_width", 1, Mode::PerPixel, MetaQuery::Width),
    meta("get_width", 2, Mode::PerFrame, MetaQuery::Width),
    meta("get_height", 1, Mode::PerPixel, MetaQuery::Height),
    meta("get_height", 2, Mode::PerFrame, MetaQuery::Height),
    BuiltinSig {
        name: "get_bitdepth",
        arity: 1,
        mode: None,
        module: Some("std"),
        kind: BuiltinKind::Meta(MetaQuery::BitDepth),
        returns_value: true,
    },
    BuiltinSig {
        name: "get_fmt",
        arity: 1,
        mode: None,
        module: Some("std"),
        kind: BuiltinKind::Meta(MetaQuery::Fmt),
        returns_value: true,
    },
];

/// All overloads registered for `name` (empty if `name` is not a builtin).
pub fn lookup(name: &str) -> Vec<&'static BuiltinSig> {
    BUILTINS.iter().filter(|sig| sig.name == name).collect()
}

/// Whether `name` is a builtin in any mode or module.
pub fn is_builtin(name: &str) -> bool {
    BUILTINS.iter().any(|sig| sig.name == name)
}

/// The overload of `name` usable in `mode`, preferring an exact mode match
/// over a mode-agnostic one. Used by the postfix front-end to pick an arity.
pub fn lookup_for_mode(name: &str, mode: Mode) -> Option<&'static BuiltinSig> {
    let overloads = lookup(name);
    overloads
        .iter()
        .find(|sig| sig.mode == Some(mode))
        .or_else(|| overloads.iter().find(|sig| sig.mode.is_none()))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_math_is_mode_agnostic() {
        for sig in lookup("sin") {
            assert_eq!(sig.mode, None);
            assert_eq!(sig.module, None);
            assert_eq!(sig.arity, 1);
        }
    }

    #[test]
    fn get_width_has_per_mode_arities() {
        let per_pixel = lookup_for_mode("get_width", Mode::PerPixel).unwrap();
        assert_eq!(per_pixel.arity, 1);
        let per_frame = lookup_for_mode("get_width", Mode::PerFrame).unwrap();
        assert_eq!(per_frame.arity, 2);
    }

    #[test]
    fn prop_writers_are_per_frame_only() {
        for name in ["set_prop", "set_propf", "set_propi", "set_propaf", "set_propai"] {
            let sig = lookup_for_mode(name, Mode::PerFrame).unwrap();
            assert!(!sig.returns_value);
            assert_eq!(sig.arity, 2);
            assert!(lookup_for_mode(name, Mode::PerPixel).is_none());
        }
    }

    #[test]
    fn metadata_queries_are_gated_by_std() {
        for name in ["get_width", "get_height", "get_bitdepth", "get_fmt"] {
            for sig in lookup(name) {
                assert_eq!(sig.module, Some("std"));
            }
        }
    }

    #[test]
    fn unknown_name_is_not_a_builtin() {
        assert!(!is_builtin("frobnicate"));
        assert!(lookup("frobnicate").is_empty());
    }
}
