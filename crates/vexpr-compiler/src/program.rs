//! Compiled program artifacts.

use vexpr_ast::Mode;
use vexpr_types::{ClipDescriptor, SampleType};

use crate::shims::PropSink;

use cranelift_jit::JITModule;

/// Per-pixel entry point: `inputs[i]` is clip i's sample at the current
/// coordinate, `x`/`y` the coordinate, `n` the frame index.
pub type PixelEntry = extern "C" fn(inputs: *const f32, x: f32, y: f32, n: f32) -> f32;

/// Per-frame entry point.
pub type FrameEntry = extern "C" fn(sink: *mut PropSink, n: f32);

/// How the per-pixel result is converted for the output plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// Float samples pass through unclamped.
    Float,
    /// Integer samples are rounded to nearest and clamped to
    /// `[0, 2^depth - 1]` in the generated epilogue.
    Integer { depth: u32 },
}

impl OutputKind {
    pub fn for_clip(desc: &ClipDescriptor) -> Self {
        match desc.sample_type {
            SampleType::Float => OutputKind::Float,
            SampleType::Integer => OutputKind::Integer {
                depth: desc.bit_depth,
            },
        }
    }
}

/// An immutable compiled program.
///
/// Owns the JIT module whose memory backs `entry`; dropping the program
/// frees the generated code. Programs are shared across threads behind
/// `Arc` by the cache.
pub struct Program {
    /// Keeps the generated code mapped. Never read after construction.
    _module: JITModule,
    entry: *const u8,
    mode: Mode,
    prop_keys: Vec<String>,
}

// The JIT memory is immutable once finalized and the entry pointer is a
// plain code address.
unsafe impl Send for Program {}
unsafe impl Sync for Program {}

impl Program {
    pub(crate) fn new(
        module: JITModule,
        entry: *const u8,
        mode: Mode,
        prop_keys: Vec<String>,
    ) -> Self {
        Self {
            _module: module,
            entry,
            mode,
            prop_keys,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Interned property key table (per-frame programs; empty otherwise).
    pub fn prop_keys(&self) -> &[String] {
        &self.prop_keys
    }

    /// The per-pixel entry point, if this is a per-pixel program.
    pub fn pixel_entry(&self) -> Option<PixelEntry> {
        match self.mode {
            Mode::PerPixel => Some(unsafe { std::mem::transmute::<*const u8, PixelEntry>(self.entry) }),
            Mode::PerFrame => None,
        }
    }

    /// The per-frame entry point, if this is a per-frame program.
    pub fn frame_entry(&self) -> Option<FrameEntry> {
        match self.mode {
            Mode::PerFrame => Some(unsafe { std::mem::transmute::<*const u8, FrameEntry>(self.entry) }),
            Mode::PerPixel => None,
        }
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("mode", &self.mode)
            .field("entry", &self.entry)
            .field("prop_keys", &self.prop_keys)
            .finish()
    }
}
