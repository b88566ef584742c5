// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Host-boundary data model.
//!
//! These are the objects exchanged between the embedding host and the
//! compiler core: immutable clip format descriptors, frame pixel buffers
//! and per-frame property maps. Nothing here depends on the language
//! pipeline; both sides of the boundary share this crate.

pub mod clip;
pub mod frame;
pub mod props;

pub use clip::{ClipDescriptor, SampleType};
pub use frame::{Frame, FrameError, Plane, PlaneData};
pub use props::{PropValue, PropertyMap};
