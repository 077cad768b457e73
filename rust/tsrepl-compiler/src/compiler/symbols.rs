//! Symbol extraction: which top-level names a module binds, which of them are
//! already exported, and the `export { name };` statements that expose the rest.

use crate::compiler::ast::{DeclKind, Declaration, Item, Program};
use crate::compiler::harness::INTERNAL_PREFIX;
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use tracing::debug;

/// Insertion-ordered set of names without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolSet {
    names: Vec<String>,
    index: HashSet<String>,
}

impl SymbolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name. Returns `false` when it was already present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.index.contains(&name) {
            return false;
        }
        self.index.insert(name.clone());
        self.names.push(name);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.names
    }
}

impl<S: Into<String>> FromIterator<S> for SymbolSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = SymbolSet::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

impl Serialize for SymbolSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.names)
    }
}

/// Result of analysing one module.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    /// One record per distinct runtime name, in source order
    pub declarations: Vec<Declaration>,
    /// Names visible to importers before any rewriting
    pub exported: SymbolSet,
    /// Synthetic `export { name };` statements, in source order
    pub export_statements: Vec<String>,
    /// Every top-level runtime name, in order of first appearance
    pub symbols: SymbolSet,
}

/// How the module's own export statements treat each name.
#[derive(Debug, Default)]
struct ExportTable {
    /// Every name importers see
    names: SymbolSet,
    /// Locals already reachable under their own name
    exposed: HashSet<String>,
    /// Export names bound to some other local
    taken: HashSet<String>,
}

impl ExportTable {
    fn from_program(program: &Program) -> Self {
        let mut table = ExportTable::default();
        for item in &program.items {
            match item {
                Item::ExportList(list) => {
                    for spec in &list.specifiers {
                        table.names.insert(spec.exported.as_str());
                        if list.is_reexport() {
                            // `export { x } from` and `export * as x` claim the name
                            table.exposed.insert(spec.exported.clone());
                        } else if spec.local == spec.exported {
                            table.exposed.insert(spec.local.clone());
                        } else if let Some(local) = spec.exported.strip_prefix(INTERNAL_PREFIX) {
                            if local == spec.local {
                                table.exposed.insert(spec.local.clone());
                            }
                        } else {
                            table.taken.insert(spec.exported.clone());
                        }
                    }
                }
                Item::Declaration(d) if d.exported => {
                    table.names.insert(d.name.as_str());
                    table.exposed.insert(d.name.clone());
                }
                _ => {}
            }
        }
        table
    }

    /// Statement that makes `name` reachable, or `None` when it already is.
    fn statement_for(&self, name: &str) -> Option<String> {
        if self.exposed.contains(name) {
            None
        } else if self.taken.contains(name) {
            Some(format!("export {{ {} as {}{} }};", name, INTERNAL_PREFIX, name))
        } else {
            Some(format!("export {{ {} }};", name))
        }
    }
}

pub fn extract_program(program: &Program) -> Extraction {
    let table = ExportTable::from_program(program);
    let mut symbols = SymbolSet::new();
    let mut declarations = Vec::new();
    let mut export_statements = Vec::new();

    let mut record = |decl: Declaration| {
        // first occurrence wins
        if !symbols.insert(decl.name.as_str()) {
            return;
        }
        let statement = table.statement_for(&decl.name);
        let exported = statement.is_none();
        export_statements.extend(statement);
        declarations.push(Declaration { exported, ..decl });
    };

    for item in &program.items {
        match item {
            Item::Import(import) => {
                for binding in &import.bindings {
                    record(Declaration {
                        name: binding.local.clone(),
                        kind: DeclKind::ImportedBinding,
                        exported: false,
                        span: binding.span,
                    });
                }
            }
            Item::Declaration(d) => record(d.clone()),
            Item::ExportList(_) => {}
        }
    }

    debug!(
        symbols = symbols.len(),
        exported = table.names.len(),
        synthesized = export_statements.len(),
        "extracted top-level symbols"
    );

    Extraction { declarations, exported: table.names, export_statements, symbols }
}
