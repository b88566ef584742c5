// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! JIT compilation of vexpr programs via Cranelift.
//!
//! The public surface is small: [`compile_pixel`] / [`compile_frame`] run
//! the full front end and code generator, [`ProgramCache`] memoizes the
//! results, and [`Program`] carries the finalized entry point.

pub mod cache;
pub mod error;
pub mod pipeline;
pub mod program;
pub mod shims;

mod translate;

pub use cache::{ProgramCache, ProgramKey};
pub use error::CompileError;
pub use pipeline::{compile_frame, compile_pixel};
pub use program::{FrameEntry, OutputKind, PixelEntry, Program};
pub use shims::PropSink;
