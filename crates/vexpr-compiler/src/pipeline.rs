//! Front-to-back compilation entry points.
//!
//! Each entry point runs the full pipeline: directive stripping, parsing
//! (infix or postfix), resolution against the bound clips, and Cranelift
//! code generation.

use tracing::debug;

use vexpr_ast::{Mode, SourceProgram, Syntax};
use vexpr_parser::{parse_postfix, parse_program, strip_directives};
use vexpr_types::ClipDescriptor;

use crate::cache::ProgramKey;
use crate::error::CompileError;
use crate::program::{OutputKind, Program};
use crate::translate;

/// Compile a per-pixel program. `output` describes the plane the result is
/// written to and selects the conversion epilogue.
pub fn compile_pixel(
    source: &str,
    syntax: Syntax,
    clips: &[ClipDescriptor],
    output: &ClipDescriptor,
) -> Result<Program, CompileError> {
    compile(
        source,
        syntax,
        Mode::PerPixel,
        clips,
        Some(OutputKind::for_clip(output)),
    )
}

/// Compile a per-frame program. Property writes are its only output, so no
/// conversion epilogue applies.
pub fn compile_frame(
    source: &str,
    syntax: Syntax,
    clips: &[ClipDescriptor],
) -> Result<Program, CompileError> {
    compile(source, syntax, Mode::PerFrame, clips, None)
}

pub(crate) fn compile_key(key: &ProgramKey) -> Result<Program, CompileError> {
    let output = key.output.as_ref().map(OutputKind::for_clip);
    compile(&key.source, key.syntax, key.mode, &key.clips, output)
}

fn compile(
    source: &str,
    syntax: Syntax,
    mode: Mode,
    clips: &[ClipDescriptor],
    output: Option<OutputKind>,
) -> Result<Program, CompileError> {
    let (directives, stripped) = strip_directives(source)?;

    let (functions, stmts) = match syntax {
        Syntax::Infix => {
            let tokens = vexpr_lexer::lex(&stripped)?;
            parse_program(&tokens)?
        }
        Syntax::Postfix => (Vec::new(), parse_postfix(&stripped, mode)?),
    };
    debug!(?syntax, ?mode, stmts = stmts.len(), "parsed program");

    let program = SourceProgram {
        directives,
        functions,
        stmts,
    };
    let resolved = vexpr_resolve::resolve(&program, mode, clips)?;
    debug!(vars = resolved.var_count, "resolved program");

    translate::codegen(&resolved, output)
}
