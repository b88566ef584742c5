//! Driver errors.
//!
//! Construction surfaces the first compile-pipeline error with its position;
//! per-frame execution can only fail on buffer shape mismatches, since every
//! source-level problem was rejected before a program reached the driver.

use thiserror::Error;

use vexpr_compiler::CompileError;
use vexpr_types::FrameError;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("expected {expected} input frames, got {found}")]
    InputCount { expected: usize, found: usize },

    #[error("{sources} expressions given for {planes} output planes")]
    TooManySources { sources: usize, planes: usize },

    #[error("clip {clip} plane {plane} geometry does not match the output plane")]
    GeometryMismatch { clip: usize, plane: u32 },

    #[error("plane {plane} passthrough requires a first input clip with the output's format")]
    Passthrough { plane: u32 },
}
