//! Top-level items of a TypeScript module.
//!
//! Only the outermost scope is represented. Function bodies, class bodies and
//! initializers never appear here.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Where an item sits in the module: a half-open byte range plus the 1-based
/// line and column of its first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub col: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, col: usize) -> Self {
        Self { start, end, line, col }
    }
}

/// What introduced a top-level binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DeclKind {
    Function,
    Variable,
    Class,
    Enum,
    /// A `namespace` whose body declares runtime values
    Namespace,
    ImportedBinding,
}

/// A named top-level binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclKind,
    /// Reachable from the module's exports under its own name
    pub exported: bool,
    pub span: Span,
}

/// A value binding introduced by an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportBinding {
    /// Name bound in this module
    pub local: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDecl {
    pub bindings: Vec<ImportBinding>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSpecifier {
    /// Name in this module, or in the source module for re-exports
    pub local: String,
    /// Name importers see
    pub exported: String,
}

/// `export { a, b as c }`, `export { x } from "m"`, or `export * as ns from "m"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportList {
    pub specifiers: Vec<ExportSpecifier>,
    /// Module re-exported from; `None` for local export clauses
    pub source: Option<String>,
    pub span: Span,
}

impl ExportList {
    pub fn is_reexport(&self) -> bool {
        self.source.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Item {
    Import(ImportDecl),
    Declaration(Declaration),
    ExportList(ExportList),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub items: Vec<Item>,
    pub span: Span,
}

impl Program {
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.items.iter().filter_map(|item| match item {
            Item::Declaration(d) => Some(d),
            _ => None,
        })
    }

    pub fn export_lists(&self) -> impl Iterator<Item = &ExportList> {
        self.items.iter().filter_map(|item| match item {
            Item::ExportList(e) => Some(e),
            _ => None,
        })
    }
}
