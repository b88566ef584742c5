//! Pixel buffers.
//!
//! A [`Frame`] owns one [`Plane`] per descriptor plane. Storage width
//! follows the sample format: integer clips up to 8 bits use `u8`, up to 16
//! bits use `u16`, 32-bit float clips use `f32`. Half-float clips are
//! representable as metadata but their sample I/O is the host's conversion
//! concern, so no `f16` buffer exists here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clip::{ClipDescriptor, SampleType};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error("no buffer storage for {sample_type:?} samples at {bit_depth} bits")]
    UnsupportedStorage {
        sample_type: SampleType,
        bit_depth: u32,
    },
    #[error("plane {plane} buffer is {actual} samples, descriptor wants {expected}")]
    BufferShape {
        plane: u32,
        expected: usize,
        actual: usize,
    },
    #[error("frame has {actual} planes, descriptor wants {expected}")]
    PlaneCount { expected: u32, actual: usize },
    #[error("plane {plane} stride {stride} is narrower than its width {width}")]
    Stride { plane: u32, stride: u32, width: u32 },
}

/// Sample storage for one plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaneData {
    U8(Vec<u8>),
    U16(Vec<u16>),
    F32(Vec<f32>),
}

impl PlaneData {
    pub fn len(&self) -> usize {
        match self {
            PlaneData::U8(buf) => buf.len(),
            PlaneData::U16(buf) => buf.len(),
            PlaneData::F32(buf) => buf.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One plane of pixel data, row-major with `stride` samples per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub width: u32,
    pub height: u32,
    /// Samples per row (>= width).
    pub stride: u32,
    pub data: PlaneData,
}

impl Plane {
    /// Zero-filled plane with a tight stride.
    pub fn blank(width: u32, height: u32, desc: &ClipDescriptor) -> Result<Self, FrameError> {
        let len = width as usize * height as usize;
        let data = match (desc.sample_type, desc.bit_depth) {
            (SampleType::Integer, 1..=8) => PlaneData::U8(vec![0; len]),
            (SampleType::Integer, 9..=16) => PlaneData::U16(vec![0; len]),
            (SampleType::Float, 32) => PlaneData::F32(vec![0.0; len]),
            (sample_type, bit_depth) => {
                return Err(FrameError::UnsupportedStorage {
                    sample_type,
                    bit_depth,
                })
            }
        };
        Ok(Self {
            width,
            height,
            stride: width,
            data,
        })
    }

    /// Sample at (x, y) widened to f32. No bounds check beyond the slice's.
    #[inline]
    pub fn sample(&self, x: u32, y: u32) -> f32 {
        let idx = y as usize * self.stride as usize + x as usize;
        match &self.data {
            PlaneData::U8(buf) => buf[idx] as f32,
            PlaneData::U16(buf) => buf[idx] as f32,
            PlaneData::F32(buf) => buf[idx],
        }
    }
}

/// A frame: one plane per descriptor plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub planes: Vec<Plane>,
}

impl Frame {
    /// Allocate a zero-filled frame matching `desc`.
    pub fn blank(desc: &ClipDescriptor) -> Result<Self, FrameError> {
        let mut planes = Vec::with_capacity(desc.num_planes as usize);
        for p in 0..desc.num_planes {
            // plane_dimensions is Some for every p < num_planes
            let (w, h) = desc.plane_dimensions(p).unwrap_or((0, 0));
            planes.push(Plane::blank(w, h, desc)?);
        }
        Ok(Self { planes })
    }

    /// Check that the frame carries one plane per descriptor plane and
    /// that every plane buffer matches the descriptor's geometry.
    pub fn check_shape(&self, desc: &ClipDescriptor) -> Result<(), FrameError> {
        if self.planes.len() != desc.num_planes as usize {
            return Err(FrameError::PlaneCount {
                expected: desc.num_planes,
                actual: self.planes.len(),
            });
        }
        for (p, plane) in self.planes.iter().enumerate() {
            if plane.stride < plane.width {
                return Err(FrameError::Stride {
                    plane: p as u32,
                    stride: plane.stride,
                    width: plane.width,
                });
            }
            let expected = plane.stride as usize * plane.height as usize;
            if plane.data.len() != expected {
                return Err(FrameError::BufferShape {
                    plane: p as u32,
                    expected,
                    actual: plane.data.len(),
                });
            }
            if let Some((w, h)) = desc.plane_dimensions(p as u32) {
                if plane.width != w || plane.height != h {
                    return Err(FrameError::BufferShape {
                        plane: p as u32,
                        expected: w as usize * h as usize,
                        actual: plane.width as usize * plane.height as usize,
                    });
                }
            }
        }
        Ok(())
    }
}
