//! Top-level scan of a TypeScript module.
//!
//! The module is parsed with the tree-sitter TypeScript grammar and only the
//! root node's children are inspected: imports, exports and the declarations
//! that bind a runtime value. Everything else is ignored.

use crate::compiler::ast::{
    DeclKind, Declaration, ExportList, ExportSpecifier, ImportBinding, ImportDecl, Item, Program, Span,
};
use thiserror::Error;
use tree_sitter::{Language, Node, Tree};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot load the TypeScript grammar")]
    Grammar(#[from] tree_sitter::LanguageError),
    #[error("the parser returned no syntax tree")]
    NoTree,
    #[error("syntax error at line {line}, col {col} near '{found}'")]
    Syntax { found: String, line: usize, col: usize },
    #[error("missing '{expected}' at line {line}, col {col}")]
    Missing { expected: String, line: usize, col: usize },
}

// =============================================================================
// Tree helpers
// =============================================================================

fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let children = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect();
    children
}

fn first_named<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    named_children(node).into_iter().find(|child| child.kind() == kind)
}

/// Whether `node` has the anonymous token `token` as a direct child.
fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == token);
    found
}

/// The earliest ERROR or MISSING node under `node`.
fn first_error<'t>(node: Node<'t>) -> Option<Node<'t>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}

/// TypeScript only emits a namespace object when the body holds something
/// other than types.
fn is_value_statement(stmt: Node<'_>) -> bool {
    match stmt.kind() {
        "interface_declaration" | "type_alias_declaration" | "ambient_declaration" => false,
        "enum_declaration" => !has_token(stmt, "const"),
        "internal_module" | "module" => stmt
            .child_by_field_name("body")
            .is_some_and(declares_values),
        "expression_statement" => match first_named(stmt, "internal_module") {
            Some(inner) => is_value_statement(inner),
            None => true,
        },
        "export_statement" => match stmt.child_by_field_name("declaration") {
            Some(decl) => is_value_statement(decl),
            None => !has_token(stmt, "type"),
        },
        _ => true,
    }
}

fn declares_values(body: Node<'_>) -> bool {
    named_children(body).into_iter().any(is_value_statement)
}

// =============================================================================
// Parser
// =============================================================================

pub struct Parser<'src> {
    source: &'src str,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self { source }
    }

    fn syntax_tree(&self) -> Result<Tree, ParseError> {
        let language: Language = tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&language)?;
        parser.parse(self.source, None).ok_or(ParseError::NoTree)
    }

    pub fn parse_program(&self) -> Result<Program, ParseError> {
        let tree = self.syntax_tree()?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(self.syntax_error(root));
        }
        let mut items = Vec::new();
        for node in named_children(root) {
            self.parse_statement(node, &mut items);
        }
        Ok(Program { items, span: self.span(root) })
    }

    fn text(&self, node: Node<'_>) -> &'src str {
        self.source.get(node.byte_range()).unwrap_or("")
    }

    /// Columns count characters, not bytes.
    fn span(&self, node: Node<'_>) -> Span {
        let start = node.start_byte();
        let pos = node.start_position();
        let line_start = start.saturating_sub(pos.column);
        let col = self
            .source
            .get(line_start..start)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(pos.column);
        Span::new(start, node.end_byte(), pos.row + 1, col + 1)
    }

    fn syntax_error(&self, root: Node<'_>) -> ParseError {
        let node = first_error(root).unwrap_or(root);
        let span = self.span(node);
        if node.is_missing() {
            return ParseError::Missing {
                expected: node.kind().to_string(),
                line: span.line,
                col: span.col,
            };
        }
        let found = self.text(node).lines().next().unwrap_or("").trim_end();
        ParseError::Syntax {
            found: found.chars().take(40).collect(),
            line: span.line,
            col: span.col,
        }
    }

    /// String literal contents, or the identifier text for other name nodes.
    fn module_export_name(&self, node: Node<'_>) -> String {
        let text = self.text(node);
        if node.kind() == "string" {
            text.trim_matches(|c: char| c == '"' || c == '\'').to_string()
        } else {
            text.to_string()
        }
    }

    fn declaration(&self, name: Node<'_>, kind: DeclKind, exported: bool) -> Declaration {
        Declaration {
            name: self.text(name).to_string(),
            kind,
            exported,
            span: self.span(name),
        }
    }

    fn binding(&self, name: Node<'_>) -> ImportBinding {
        ImportBinding { local: self.text(name).to_string(), span: self.span(name) }
    }

    fn parse_statement(&self, node: Node<'_>, items: &mut Vec<Item>) {
        match node.kind() {
            "import_statement" => {
                if let Some(import) = self.parse_import(node) {
                    items.push(Item::Import(import));
                }
            }
            "import_alias" => {
                if let Some(name) = first_named(node, "identifier") {
                    items.push(Item::Import(ImportDecl {
                        bindings: vec![self.binding(name)],
                        span: self.span(node),
                    }));
                }
            }
            "export_statement" => self.parse_export(node, items),
            _ => items.extend(
                self.parse_declaration(node, false)
                    .into_iter()
                    .map(Item::Declaration),
            ),
        }
    }

    // ── Imports ──

    fn parse_import(&self, node: Node<'_>) -> Option<ImportDecl> {
        if has_token(node, "type") || has_token(node, "typeof") {
            return None;
        }
        let mut bindings = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "import_clause" => self.parse_import_clause(child, &mut bindings),
                "import_require_clause" => {
                    if let Some(name) = first_named(child, "identifier") {
                        bindings.push(self.binding(name));
                    }
                }
                _ => {}
            }
        }
        Some(ImportDecl { bindings, span: self.span(node) })
    }

    fn parse_import_clause(&self, clause: Node<'_>, bindings: &mut Vec<ImportBinding>) {
        for part in named_children(clause) {
            match part.kind() {
                "identifier" => bindings.push(self.binding(part)),
                "namespace_import" => {
                    if let Some(name) = first_named(part, "identifier") {
                        bindings.push(self.binding(name));
                    }
                }
                "named_imports" => {
                    for spec in named_children(part) {
                        if spec.kind() != "import_specifier" || has_token(spec, "type") || has_token(spec, "typeof") {
                            continue;
                        }
                        let local = spec
                            .child_by_field_name("alias")
                            .or_else(|| spec.child_by_field_name("name"))
                            .filter(|name| name.kind() == "identifier");
                        if let Some(local) = local {
                            bindings.push(self.binding(local));
                        }
                    }
                }
                _ => {}
            }
        }
    }

    // ── Exports ──

    fn parse_export(&self, node: Node<'_>, items: &mut Vec<Item>) {
        if let Some(decl) = node.child_by_field_name("declaration") {
            // `export default function f` binds `f` but exports it as `default`
            let exported = !has_token(node, "default");
            items.extend(
                self.parse_declaration(decl, exported)
                    .into_iter()
                    .map(Item::Declaration),
            );
            return;
        }
        if let Some(value) = node.child_by_field_name("value") {
            if let Some(decl) = self.parse_named_default(value) {
                items.push(Item::Declaration(decl));
            }
            return;
        }
        if has_token(node, "type") {
            return;
        }

        let mut specifiers = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "export_clause" => {
                    for spec in named_children(child) {
                        if spec.kind() != "export_specifier" || has_token(spec, "type") {
                            continue;
                        }
                        let Some(name) = spec.child_by_field_name("name") else {
                            continue;
                        };
                        let local = self.module_export_name(name);
                        let exported = spec
                            .child_by_field_name("alias")
                            .map(|alias| self.module_export_name(alias))
                            .unwrap_or_else(|| local.clone());
                        specifiers.push(ExportSpecifier { local, exported });
                    }
                }
                "namespace_export" => {
                    if let Some(name) = named_children(child).into_iter().next() {
                        specifiers.push(ExportSpecifier {
                            local: "*".to_string(),
                            exported: self.module_export_name(name),
                        });
                    }
                }
                _ => {}
            }
        }
        if specifiers.is_empty() {
            return;
        }
        let source = node
            .child_by_field_name("source")
            .map(|source| self.module_export_name(source));
        items.push(Item::ExportList(ExportList { specifiers, source, span: self.span(node) }));
    }

    /// `export default function name() {}` parsed as an expression.
    fn parse_named_default(&self, value: Node<'_>) -> Option<Declaration> {
        let kind = match value.kind() {
            "function_expression" | "function" | "generator_function" => DeclKind::Function,
            "class" => DeclKind::Class,
            _ => return None,
        };
        let name = value.child_by_field_name("name")?;
        Some(self.declaration(name, kind, false))
    }

    // ── Declarations ──

    fn parse_declaration(&self, node: Node<'_>, exported: bool) -> Vec<Declaration> {
        let named = |kind: DeclKind| -> Vec<Declaration> {
            node.child_by_field_name("name")
                .map(|name| self.declaration(name, kind, exported))
                .into_iter()
                .collect()
        };
        match node.kind() {
            "function_declaration" | "generator_function_declaration" | "function_signature" => {
                named(DeclKind::Function)
            }
            "class_declaration" | "abstract_class_declaration" => named(DeclKind::Class),
            "enum_declaration" if !has_token(node, "const") => named(DeclKind::Enum),
            "internal_module" | "module" => {
                let runtime = node
                    .child_by_field_name("name")
                    .is_some_and(|name| name.kind() == "identifier")
                    && node.child_by_field_name("body").is_some_and(declares_values);
                if runtime {
                    named(DeclKind::Namespace)
                } else {
                    Vec::new()
                }
            }
            "expression_statement" => match first_named(node, "internal_module") {
                Some(namespace) => self.parse_declaration(namespace, exported),
                None => Vec::new(),
            },
            "lexical_declaration" | "variable_declaration" => {
                let mut decls = Vec::new();
                for declarator in named_children(node) {
                    if declarator.kind() != "variable_declarator" {
                        continue;
                    }
                    if let Some(pattern) = declarator.child_by_field_name("name") {
                        self.collect_pattern_names(pattern, exported, &mut decls);
                    }
                }
                decls
            }
            _ => Vec::new(),
        }
    }

    /// Every name bound by a declarator target, including nested destructuring.
    fn collect_pattern_names(&self, pattern: Node<'_>, exported: bool, out: &mut Vec<Declaration>) {
        match pattern.kind() {
            "identifier" | "shorthand_property_identifier_pattern" => {
                out.push(self.declaration(pattern, DeclKind::Variable, exported));
            }
            "pair_pattern" => {
                if let Some(value) = pattern.child_by_field_name("value") {
                    self.collect_pattern_names(value, exported, out);
                }
            }
            "assignment_pattern" | "object_assignment_pattern" => {
                if let Some(target) = pattern.child_by_field_name("left") {
                    self.collect_pattern_names(target, exported, out);
                }
            }
            "object_pattern" | "array_pattern" | "rest_pattern" => {
                for element in named_children(pattern) {
                    self.collect_pattern_names(element, exported, out);
                }
            }
            _ => {}
        }
    }
}
