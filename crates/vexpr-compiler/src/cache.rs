//! Program cache keyed by source and clip layout.
//!
//! Recompiling the same expression for every frame request would dominate
//! runtime, so compiled programs are shared behind `Arc` and looked up by
//! the full compilation key. Compilation happens under the cache lock, so
//! concurrent requests for the same key coalesce into a single compile.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use vexpr_ast::{Mode, Syntax};
use vexpr_types::ClipDescriptor;

use crate::error::CompileError;
use crate::pipeline;
use crate::program::Program;

/// Everything that affects generated code.
///
/// Metadata queries fold against the bound clips and the output epilogue
/// depends on the output format, so both are part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramKey {
    pub source: String,
    pub syntax: Syntax,
    pub mode: Mode,
    pub clips: Vec<ClipDescriptor>,
    pub output: Option<ClipDescriptor>,
}

#[derive(Debug, Default)]
pub struct ProgramCache {
    programs: Mutex<HashMap<ProgramKey, Arc<Program>>>,
    compiles: AtomicU64,
}

impl ProgramCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the program for `key`, compiling it on first use.
    pub fn get_or_compile(&self, key: &ProgramKey) -> Result<Arc<Program>, CompileError> {
        let mut programs = match self.programs.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(program) = programs.get(key) {
            debug!(mode = ?key.mode, "program cache hit");
            return Ok(Arc::clone(program));
        }

        let program = Arc::new(pipeline::compile_key(key)?);
        self.compiles.fetch_add(1, Ordering::Relaxed);
        debug!(mode = ?key.mode, total_compiles = self.compile_count(), "compiled new program");
        programs.insert(key.clone(), Arc::clone(&program));
        Ok(program)
    }

    /// Number of compilations performed, cache hits excluded.
    pub fn compile_count(&self) -> u64 {
        self.compiles.load(Ordering::Relaxed)
    }
}
