//! Module registry.
//!
//! Modules are a static compile-time table. Activating one with
//! `@requires` unlocks the builtins it gates; the core math and property
//! builtins are not module-gated.

/// All known modules.
pub const MODULES: &[&str] = &["std"];

pub fn is_module(name: &str) -> bool {
    MODULES.contains(&name)
}
