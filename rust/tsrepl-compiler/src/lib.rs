//! ts-repl compiler
//!
//! Scans a TypeScript module for its top-level bindings and synthesizes a
//! harness program that exposes all of them to an interactive Node session.

pub mod compiler;
pub mod diagnostics;

use compiler::ast::Program;
use compiler::harness::{HarnessOptions, HarnessProgram};
use compiler::symbols::{Extraction, SymbolSet};

use thiserror::Error;
use tracing::debug;

pub use compiler::ast::{DeclKind, Declaration};
pub use compiler::harness::{BEGIN_MARKER, END_MARKER};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("parse error: {0}")]
    Parse(#[from] compiler::parser::ParseError),
}

/// Scan a module into its top-level items.
pub fn parse(source: &str) -> Result<Program, CompileError> {
    let program = compiler::parser::Parser::new(source).parse_program()?;
    Ok(program)
}

/// Enumerate the top-level bindings of a module and the export statements
/// needed to make every one of them visible.
pub fn extract(source: &str) -> Result<Extraction, CompileError> {
    let program = parse(source)?;
    Ok(compiler::symbols::extract_program(&program))
}

/// Build the harness text from a module and its extraction results.
pub fn synthesize(
    original: &str,
    export_statements: &[String],
    symbols: &SymbolSet,
    options: &HarnessOptions,
) -> HarnessProgram {
    compiler::harness::synthesize(original, export_statements, symbols, options)
}

/// Extract and synthesize in one step.
pub fn prepare_harness(source: &str, options: &HarnessOptions) -> Result<HarnessProgram, CompileError> {
    let extraction = extract(source)?;
    let harness = synthesize(source, &extraction.export_statements, &extraction.symbols, options);
    debug!(
        symbols = harness.symbols().len(),
        exports = harness.export_count(),
        bytes = harness.text().len(),
        "synthesized harness"
    );
    Ok(harness)
}

/// Format a compile error with rich diagnostics (colors, source snippets, suggestions).
pub fn format_error(error: &CompileError, source: &str, filename: &str) -> String {
    diagnostics::format_compile_error(error, source, filename)
        .iter()
        .map(|d| d.render_ansi())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Same as [`format_error`], without ANSI escapes.
pub fn format_error_plain(error: &CompileError, source: &str, filename: &str) -> String {
    diagnostics::format_compile_error(error, source, filename)
        .iter()
        .map(|d| d.render_plain())
        .collect::<Vec<_>>()
        .join("\n")
}
