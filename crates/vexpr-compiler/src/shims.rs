//! Extern shims callable from generated code.
//!
//! Transcendentals have no CLIF instruction, so they are provided as
//! `extern "C"` functions registered with the JIT builder by symbol name.
//! Property writers go through a [`PropSink`], a `#[repr(C)]` view over the
//! frame's property map that the per-frame entry point receives as its
//! first argument.

use vexpr_types::PropertyMap;

/// C-layout handle passed to per-frame programs.
///
/// `keys` is the program's interned key table; generated code refers to
/// keys by index, never by string. The sink must not outlive the map or
/// the key slice it was built from.
#[repr(C)]
pub struct PropSink {
    map: *mut PropertyMap,
    keys: *const String,
    key_count: usize,
}

impl PropSink {
    pub fn new(map: &mut PropertyMap, keys: &[String]) -> Self {
        Self {
            map,
            keys: keys.as_ptr(),
            key_count: keys.len(),
        }
    }
}

/// Key lookup shared by the writer shims. Generated code only ever emits
/// indices below `key_count`, so the bound check is a hard invariant.
unsafe fn sink_parts<'a>(sink: *mut PropSink, key: u32) -> (&'a mut PropertyMap, &'a str) {
    let sink = &mut *sink;
    assert!((key as usize) < sink.key_count, "property key out of range");
    let keys = std::slice::from_raw_parts(sink.keys, sink.key_count);
    (&mut *sink.map, keys[key as usize].as_str())
}

pub(crate) extern "C" fn prop_set_float(sink: *mut PropSink, key: u32, value: f32) {
    let (map, key) = unsafe { sink_parts(sink, key) };
    map.set_float(key, value as f64);
}

/// Integer writes round half away from zero, matching `round`.
pub(crate) extern "C" fn prop_set_int(sink: *mut PropSink, key: u32, value: f32) {
    let (map, key) = unsafe { sink_parts(sink, key) };
    map.set_int(key, value.round() as i64);
}

pub(crate) extern "C" fn prop_append_float(sink: *mut PropSink, key: u32, value: f32) {
    let (map, key) = unsafe { sink_parts(sink, key) };
    map.append_float(key, value as f64);
}

pub(crate) extern "C" fn prop_append_int(sink: *mut PropSink, key: u32, value: f32) {
    let (map, key) = unsafe { sink_parts(sink, key) };
    map.append_int(key, value.round() as i64);
}

pub(crate) extern "C" fn prop_remove(sink: *mut PropSink, key: u32) {
    let (map, key) = unsafe { sink_parts(sink, key) };
    map.remove(key);
}

macro_rules! unary_shim {
    ($name:ident, $method:ident) => {
        pub(crate) extern "C" fn $name(x: f32) -> f32 {
            x.$method()
        }
    };
}

macro_rules! binary_shim {
    ($name:ident, $method:ident) => {
        pub(crate) extern "C" fn $name(x: f32, y: f32) -> f32 {
            x.$method(y)
        }
    };
}

unary_shim!(sinf, sin);
unary_shim!(cosf, cos);
unary_shim!(tanf, tan);
unary_shim!(asinf, asin);
unary_shim!(acosf, acos);
unary_shim!(atanf, atan);
unary_shim!(expf, exp);
unary_shim!(exp2f, exp2);
unary_shim!(logf, ln);
unary_shim!(log2f, log2);
unary_shim!(log10f, log10);
// Half-away-from-zero; the CLIF `nearest` instruction rounds ties to even.
unary_shim!(roundf, round);
binary_shim!(atan2f, atan2);
binary_shim!(powf, powf);

pub(crate) extern "C" fn fmodf(x: f32, y: f32) -> f32 {
    x % y
}

pub(crate) extern "C" fn fmaf(x: f32, y: f32, z: f32) -> f32 {
    x.mul_add(y, z)
}

/// Symbols to register with the JIT builder, keyed by import name.
pub(crate) fn symbols() -> Vec<(&'static str, *const u8)> {
    vec![
        ("vexpr_sinf", sinf as *const u8),
        ("vexpr_cosf", cosf as *const u8),
        ("vexpr_tanf", tanf as *const u8),
        ("vexpr_asinf", asinf as *const u8),
        ("vexpr_acosf", acosf as *const u8),
        ("vexpr_atanf", atanf as *const u8),
        ("vexpr_atan2f", atan2f as *const u8),
        ("vexpr_expf", expf as *const u8),
        ("vexpr_exp2f", exp2f as *const u8),
        ("vexpr_logf", logf as *const u8),
        ("vexpr_log2f", log2f as *const u8),
        ("vexpr_log10f", log10f as *const u8),
        ("vexpr_powf", powf as *const u8),
        ("vexpr_fmodf", fmodf as *const u8),
        ("vexpr_fmaf", fmaf as *const u8),
        ("vexpr_roundf", roundf as *const u8),
        ("vexpr_prop_set_float", prop_set_float as *const u8),
        ("vexpr_prop_set_int", prop_set_int as *const u8),
        ("vexpr_prop_append_float", prop_append_float as *const u8),
        ("vexpr_prop_append_int", prop_append_int as *const u8),
        ("vexpr_prop_remove", prop_remove as *const u8),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prop_shims_write_through_sink() {
        let mut map = PropertyMap::new();
        let keys = vec!["a".to_string(), "b".to_string()];
        let mut sink = PropSink::new(&mut map, &keys);

        prop_set_int(&mut sink, 0, 2.6);
        prop_set_float(&mut sink, 1, 0.5);
        assert_eq!(map.get("a"), Some(&vexpr_types::PropValue::Int(3)));
        assert_eq!(map.get("b"), Some(&vexpr_types::PropValue::Float(0.5)));

        let mut sink = PropSink::new(&mut map, &keys);
        prop_remove(&mut sink, 0);
        assert!(map.get("a").is_none());
    }

    #[test]
    fn test_append_shims_accumulate_arrays() {
        let mut map = PropertyMap::new();
        let keys = vec!["vals".to_string()];
        let mut sink = PropSink::new(&mut map, &keys);

        prop_append_int(&mut sink, 0, 1.2);
        prop_append_int(&mut sink, 0, 2.6);
        assert_eq!(
            map.get("vals"),
            Some(&vexpr_types::PropValue::IntArray(vec![1, 3]))
        );
    }

    #[test]
    fn test_round_is_half_away_from_zero() {
        assert_eq!(roundf(0.5), 1.0);
        assert_eq!(roundf(-0.5), -1.0);
        assert_eq!(roundf(2.5), 3.0);
    }
}
