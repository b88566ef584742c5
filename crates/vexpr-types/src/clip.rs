//! Clip format metadata.
//!
//! A [`ClipDescriptor`] is the immutable shape of one input or output clip:
//! plane count, luma geometry, sample format and chroma subsampling. All
//! metadata intrinsics and output conversion decisions derive from it; it
//! never changes after construction, which is what makes compiled programs
//! cacheable per clip shape.

use serde::{Deserialize, Serialize};

/// Sample representation of a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleType {
    Integer,
    Float,
}

impl SampleType {
    /// Signed format code: `+1` for float samples, `-1` for integer.
    /// `0` is reserved for "no clip bound at this index" and can never be
    /// produced from an actual descriptor.
    pub fn fmt_code(self) -> i32 {
        match self {
            SampleType::Float => 1,
            SampleType::Integer => -1,
        }
    }
}

/// Immutable format descriptor for one clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipDescriptor {
    /// Luma (plane 0) width in samples.
    pub width: u32,
    /// Luma (plane 0) height in samples.
    pub height: u32,
    /// Declared bit depth (8..=32; 16 for half-float clips).
    pub bit_depth: u32,
    pub sample_type: SampleType,
    /// Number of planes (1 for grey, 3 for YUV/RGB).
    pub num_planes: u32,
    /// log2 horizontal chroma subsampling (planes 1 and 2).
    pub sub_w: u32,
    /// log2 vertical chroma subsampling (planes 1 and 2).
    pub sub_h: u32,
}

impl ClipDescriptor {
    /// Dimensions of `plane`, derived from luma geometry.
    ///
    /// Plane 0 is never subsampled; higher planes shift the luma dimensions
    /// right by the subsampling factors. Returns `None` for an out-of-range
    /// plane index.
    pub fn plane_dimensions(&self, plane: u32) -> Option<(u32, u32)> {
        if plane >= self.num_planes {
            return None;
        }
        if plane == 0 {
            Some((self.width, self.height))
        } else {
            Some((self.width >> self.sub_w, self.height >> self.sub_h))
        }
    }

    /// Maximum representable integer sample value, `2^depth - 1`.
    ///
    /// Meaningful for integer clips only; used for the output clamp.
    pub fn peak_value(&self) -> u32 {
        (1u64 << self.bit_depth).wrapping_sub(1) as u32
    }

    /// 4:2:0 YUV integer clip, the most common test shape.
    pub fn yuv420(width: u32, height: u32, bit_depth: u32) -> Self {
        Self {
            width,
            height,
            bit_depth,
            sample_type: SampleType::Integer,
            num_planes: 3,
            sub_w: 1,
            sub_h: 1,
        }
    }

    /// 4:2:2 YUV integer clip.
    pub fn yuv422(width: u32, height: u32, bit_depth: u32) -> Self {
        Self {
            sub_w: 1,
            sub_h: 0,
            ..Self::yuv420(width, height, bit_depth)
        }
    }

    /// Full-res RGB float clip (bit_depth 16 = half, 32 = single).
    pub fn rgb_float(width: u32, height: u32, bit_depth: u32) -> Self {
        Self {
            width,
            height,
            bit_depth,
            sample_type: SampleType::Float,
            num_planes: 3,
            sub_w: 0,
            sub_h: 0,
        }
    }

    /// Single-plane integer clip.
    pub fn grey(width: u32, height: u32, bit_depth: u32) -> Self {
        Self {
            width,
            height,
            bit_depth,
            sample_type: SampleType::Integer,
            num_planes: 1,
            sub_w: 0,
            sub_h: 0,
        }
    }
}
