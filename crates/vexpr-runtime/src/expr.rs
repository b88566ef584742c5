//! Per-pixel execution driver.
//!
//! An [`ExprFilter`] binds one expression per output plane against a fixed
//! set of input clips, compiles each through the shared [`ProgramCache`] at
//! construction, and then produces output frames. Rows of one plane are
//! distributed across threads with rayon; a compiled program is immutable,
//! so evaluation shares it freely.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use vexpr_ast::{Mode, Syntax};
use vexpr_compiler::{PixelEntry, Program, ProgramCache, ProgramKey};
use vexpr_types::{ClipDescriptor, Frame, Plane, PlaneData};

use crate::error::DriverError;

/// A ready per-pixel filter: one optional program per output plane.
///
/// `None` marks a passthrough plane, copied unmodified from the first
/// input clip.
#[derive(Debug)]
pub struct ExprFilter {
    clips: Vec<ClipDescriptor>,
    output: ClipDescriptor,
    programs: Vec<Option<Arc<Program>>>,
}

impl ExprFilter {
    /// Compile `sources` (one per output plane) against `clips`.
    ///
    /// An empty string selects passthrough for that plane. When fewer
    /// sources than planes are given, the last source covers the remaining
    /// planes, matching the host convention. Every compile failure aborts
    /// construction; nothing is evaluated partially.
    pub fn new(
        sources: &[&str],
        syntax: Syntax,
        clips: &[ClipDescriptor],
        output: ClipDescriptor,
        cache: &ProgramCache,
    ) -> Result<Self, DriverError> {
        let planes = output.num_planes as usize;
        if sources.len() > planes {
            return Err(DriverError::TooManySources {
                sources: sources.len(),
                planes,
            });
        }

        let mut programs = Vec::with_capacity(planes);
        for plane in 0..output.num_planes {
            let source = match sources.get(plane as usize).or(sources.last()) {
                Some(source) => *source,
                None => "",
            };
            if source.trim().is_empty() {
                check_passthrough(clips, &output, plane)?;
                programs.push(None);
                continue;
            }
            check_geometry(clips, &output, plane)?;
            let key = ProgramKey {
                source: source.to_string(),
                syntax,
                mode: Mode::PerPixel,
                clips: clips.to_vec(),
                output: Some(output),
            };
            programs.push(Some(cache.get_or_compile(&key)?));
        }

        debug!(
            planes,
            clips = clips.len(),
            compiled = programs.iter().filter(|p| p.is_some()).count(),
            "per-pixel filter ready"
        );
        Ok(Self {
            clips: clips.to_vec(),
            output,
            programs,
        })
    }

    /// Produce output frame `n` from one input frame per bound clip.
    pub fn run_frame(&self, inputs: &[Frame], n: u32) -> Result<Frame, DriverError> {
        if inputs.len() != self.clips.len() {
            return Err(DriverError::InputCount {
                expected: self.clips.len(),
                found: inputs.len(),
            });
        }
        for (frame, clip) in inputs.iter().zip(&self.clips) {
            frame.check_shape(clip)?;
        }

        let mut out = Frame::blank(&self.output)?;
        for (plane, program) in self.programs.iter().enumerate() {
            match program {
                Some(program) => {
                    let entry = match program.pixel_entry() {
                        Some(entry) => entry,
                        // Cache keys carry the mode, so a per-pixel key
                        // always yields a per-pixel program.
                        None => unreachable!("per-frame program bound to a plane"),
                    };
                    let sources: Vec<&Plane> =
                        inputs.iter().map(|frame| &frame.planes[plane]).collect();
                    eval_plane(entry, &sources, &mut out.planes[plane], n as f32);
                }
                None => {
                    out.planes[plane] = inputs[0].planes[plane].clone();
                }
            }
        }
        Ok(out)
    }
}

/// Evaluate one plane, row-parallel. The generated epilogue already rounded
/// and clamped integer results into storage range.
fn eval_plane(entry: PixelEntry, inputs: &[&Plane], out: &mut Plane, n: f32) {
    let width = out.width as usize;
    let stride = out.stride as usize;

    macro_rules! run_rows {
        ($buf:expr, $store:expr) => {
            $buf.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
                let mut samples = vec![0.0f32; inputs.len()];
                for x in 0..width {
                    for (slot, plane) in samples.iter_mut().zip(inputs) {
                        *slot = plane.sample(x as u32, y as u32);
                    }
                    let value = entry(samples.as_ptr(), x as f32, y as f32, n);
                    row[x] = $store(value);
                }
            })
        };
    }

    match &mut out.data {
        PlaneData::U8(buf) => run_rows!(buf, |v: f32| v as u8),
        PlaneData::U16(buf) => run_rows!(buf, |v: f32| v as u16),
        PlaneData::F32(buf) => run_rows!(buf, |v: f32| v),
    }
}

/// Per-pixel gather addresses every clip at the output coordinate, so each
/// clip's plane must share the output plane's geometry.
fn check_geometry(
    clips: &[ClipDescriptor],
    output: &ClipDescriptor,
    plane: u32,
) -> Result<(), DriverError> {
    let expected = output.plane_dimensions(plane);
    for (clip, desc) in clips.iter().enumerate() {
        if desc.plane_dimensions(plane) != expected {
            return Err(DriverError::GeometryMismatch { clip, plane });
        }
    }
    Ok(())
}

fn check_passthrough(
    clips: &[ClipDescriptor],
    output: &ClipDescriptor,
    plane: u32,
) -> Result<(), DriverError> {
    let first = match clips.first() {
        Some(first) => first,
        None => return Err(DriverError::Passthrough { plane }),
    };
    let matches = first.plane_dimensions(plane) == output.plane_dimensions(plane)
        && first.sample_type == output.sample_type
        && first.bit_depth == output.bit_depth;
    if !matches {
        return Err(DriverError::Passthrough { plane });
    }
    Ok(())
}
