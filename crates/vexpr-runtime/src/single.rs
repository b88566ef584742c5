//! Per-frame execution driver.

use std::sync::Arc;

use tracing::debug;

use vexpr_ast::{Mode, Syntax};
use vexpr_compiler::{Program, ProgramCache, ProgramKey, PropSink};
use vexpr_types::{ClipDescriptor, PropertyMap};

use crate::error::DriverError;

/// A ready per-frame filter: one program invoked once per frame, writing
/// properties into the frame's map.
#[derive(Debug)]
pub struct SingleExprFilter {
    program: Arc<Program>,
}

impl SingleExprFilter {
    pub fn new(
        source: &str,
        syntax: Syntax,
        clips: &[ClipDescriptor],
        cache: &ProgramCache,
    ) -> Result<Self, DriverError> {
        let key = ProgramKey {
            source: source.to_string(),
            syntax,
            mode: Mode::PerFrame,
            clips: clips.to_vec(),
            output: None,
        };
        let program = cache.get_or_compile(&key)?;
        debug!(keys = program.prop_keys().len(), "per-frame filter ready");
        Ok(Self { program })
    }

    /// Run the program for frame `n` against `props`.
    pub fn run_frame(&self, props: &mut PropertyMap, n: u32) {
        let entry = match self.program.frame_entry() {
            Some(entry) => entry,
            // The cache key pins the mode.
            None => unreachable!("per-pixel program bound to a per-frame filter"),
        };
        let keys = self.program.prop_keys();
        let mut sink = PropSink::new(props, keys);
        entry(&mut sink, n as f32);
    }
}
