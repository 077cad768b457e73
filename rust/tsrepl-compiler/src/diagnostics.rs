//! Compile errors rendered as `error[CODE]` reports with a source excerpt.

use crate::compiler::parser::ParseError;
use crate::CompileError;

/// One compile error with the source context needed to render it.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<String>,
    pub message: String,
    pub file: String,
    pub line: Option<usize>,
    pub col: Option<usize>,
    pub source_line: Option<String>,
    pub underline: Option<String>,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    fn error(code: &str, message: String, filename: &str) -> Self {
        Diagnostic {
            code: Some(code.to_string()),
            message,
            file: filename.to_string(),
            line: None,
            col: None,
            source_line: None,
            underline: None,
            suggestions: vec![],
        }
    }

    /// Attach a location, the source line it points into, and a caret underline.
    fn at(mut self, source: &str, line: usize, col: usize, len: usize) -> Self {
        self.line = Some(line);
        self.col = Some(col);
        self.source_line = get_source_line(source, line);
        self.underline = self.source_line.as_ref().map(|_| make_underline(col, len));
        self
    }

    fn help(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn render_ansi(&self) -> String {
        self.render(true)
    }

    pub fn render_plain(&self) -> String {
        self.render(false)
    }

    fn render(&self, color: bool) -> String {
        let paint = |sgr: &str, text: &str| {
            if color {
                format!("\x1b[{}m{}\x1b[0m", sgr, text)
            } else {
                text.to_string()
            }
        };
        let gutter = paint(CYAN, "|");
        let mut out = paint(RED, "error");

        if let Some(code) = &self.code {
            out.push_str(&format!("[{}]", paint(BOLD, code)));
        }
        out.push_str(&format!(": {}\n", paint(BOLD, &self.message)));

        let location = match (self.line, self.col) {
            (Some(line), Some(col)) => format!("{}:{}:{}", self.file, line, col),
            _ => self.file.clone(),
        };
        out.push_str(&format!("  {} {}\n", paint(CYAN, "-->"), location));

        if let (Some(line_num), Some(line_text), Some(underline)) =
            (self.line, &self.source_line, &self.underline)
        {
            out.push_str(&format!("   {}\n", gutter));
            out.push_str(&format!("{:>3} {} {}\n", paint(CYAN, &line_num.to_string()), gutter, line_text));
            out.push_str(&format!("   {} {}\n", gutter, paint(RED, underline)));
        }

        if !self.suggestions.is_empty() {
            out.push_str(&format!("   {}\n", gutter));
            for suggestion in &self.suggestions {
                out.push_str(&format!("   {} {}: {}\n", paint(CYAN, "="), paint(CYAN, "help"), suggestion));
            }
        }

        out
    }
}

// SGR parameters
const RED: &str = "31";
const CYAN: &str = "36";
const BOLD: &str = "1";

fn get_source_line(source: &str, line: usize) -> Option<String> {
    if line == 0 {
        return None;
    }
    source.lines().nth(line - 1).map(|s| s.to_string())
}

fn make_underline(col: usize, len: usize) -> String {
    format!("{}{}", " ".repeat(col.saturating_sub(1)), "^".repeat(len.max(1)))
}

/// Columns from `col` to the end of the line, for errors that run off the line.
fn rest_of_line(source: &str, line: usize, col: usize) -> usize {
    get_source_line(source, line)
        .map(|l| l.chars().count().saturating_sub(col.saturating_sub(1)))
        .unwrap_or(1)
}

// Edit distance for suggestions
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];
    for i in 1..=a_len {
        curr[0] = i;
        for j in 1..=b_len {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_len]
}

fn suggest_similar(name: &str, candidates: &[&str], max_distance: usize) -> Vec<String> {
    let mut matches: Vec<(usize, String)> = candidates
        .iter()
        .filter_map(|c| {
            let d = edit_distance(name, c);
            if d <= max_distance {
                Some((d, c.to_string()))
            } else {
                None
            }
        })
        .collect();

    matches.sort_by_key(|(d, _)| *d);
    matches.into_iter().map(|(_, s)| s).take(3).collect()
}

// Words that appear in module clauses, for typo suggestions
const CLAUSE_WORDS: &[&str] = &[
    "import", "export", "from", "as", "type", "default", "function", "class", "const", "let",
    "var", "enum", "async", "require", "abstract",
];

/// Convert a CompileError + source text into a list of Diagnostics
pub fn format_compile_error(error: &CompileError, source: &str, filename: &str) -> Vec<Diagnostic> {
    match error {
        CompileError::Parse(e) => vec![format_parse_error(e, source, filename)],
    }
}

fn format_parse_error(error: &ParseError, source: &str, filename: &str) -> Diagnostic {
    match error {
        ParseError::Syntax { found, line, col } => {
            let message = if found.is_empty() {
                "syntax error".to_string()
            } else {
                format!("unexpected '{}'", found)
            };
            let len = found.chars().count().min(rest_of_line(source, *line, *col));
            let mut diag = Diagnostic::error("E010", message, filename).at(source, *line, *col, len);
            let word: String = found.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
            if !word.is_empty() && !CLAUSE_WORDS.contains(&word.as_str()) {
                for candidate in suggest_similar(&word, CLAUSE_WORDS, 2) {
                    diag = diag.help(format!("did you mean '{}'?", candidate));
                }
            }
            diag
        }
        ParseError::Missing { expected, line, col } => {
            Diagnostic::error("E011", format!("missing '{}'", expected), filename)
                .at(source, *line, *col, 1)
                .help(format!("insert '{}' here", expected))
        }
        ParseError::Grammar(_) | ParseError::NoTree => {
            Diagnostic::error("E020", error.to_string(), filename)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_excerpt_helpers() {
        let source = "const a = 1\nlet b\n";
        assert_eq!(get_source_line(source, 2).as_deref(), Some("let b"));
        assert_eq!(get_source_line(source, 3), None);
        assert_eq!(get_source_line(source, 0), None);
        assert_eq!(make_underline(5, 1), "    ^");
        assert_eq!(make_underline(3, 0), "  ^");
        assert_eq!(rest_of_line(source, 1, 11), 1);
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("from", "form"), 2);
        assert_eq!(edit_distance("from", "fro"), 1);
        assert_eq!(edit_distance("", "as"), 2);
        assert_eq!(edit_distance("same", "same"), 0);
    }

    #[test]
    fn test_suggest_similar() {
        let suggestions = suggest_similar("improt", CLAUSE_WORDS, 2);
        assert_eq!(suggestions.first().map(String::as_str), Some("import"));
        assert!(suggest_similar("xyz", CLAUSE_WORDS, 1).is_empty());
    }

    #[test]
    fn test_format_syntax_error_with_suggestion() {
        let error = ParseError::Syntax { found: "form 'm'".to_string(), line: 2, col: 14 };
        let source = "const a = 1\nimport { a } form 'm'\n";
        let diag = format_parse_error(&error, source, "mod.ts");

        assert_eq!(diag.code, Some("E010".to_string()));
        assert_eq!(diag.line, Some(2));
        assert_eq!(diag.underline.as_deref(), Some("             ^^^^^^^^"));
        assert_eq!(diag.suggestions.first().map(String::as_str), Some("did you mean 'from'?"));
    }

    #[test]
    fn test_format_syntax_error_clips_underline_to_line() {
        let error = ParseError::Syntax { found: "{ broken".to_string(), line: 1, col: 12 };
        let diag = format_parse_error(&error, "function f(", "mod.ts");
        assert_eq!(diag.underline.as_deref(), Some("           ^"));
        assert!(diag.suggestions.is_empty());
    }

    #[test]
    fn test_format_missing() {
        let error = ParseError::Missing { expected: "}".to_string(), line: 1, col: 15 };
        let diag = format_parse_error(&error, "function f() {", "mod.ts");
        assert_eq!(diag.code, Some("E011".to_string()));
        assert!(diag.render_plain().contains("mod.ts:1:15"));
        assert_eq!(diag.suggestions, vec!["insert '}' here".to_string()]);
    }

    #[test]
    fn test_format_compile_error_from_parser() {
        let source = "const ok = 1\nimport { a b } from 'm'\n";
        let error = CompileError::from(crate::compiler::parser::Parser::new(source).parse_program().unwrap_err());
        let diags = format_compile_error(&error, source, "mod.ts");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].line, Some(2));
        assert!(diags[0].code.as_deref().is_some_and(|c| c == "E010" || c == "E011"));
    }

    #[test]
    fn test_render_plain_layout() {
        let diag = Diagnostic {
            code: Some("E010".to_string()),
            message: "unexpected token 'b', expected ',' or '}'".to_string(),
            file: "mod.ts".to_string(),
            line: Some(3),
            col: Some(12),
            source_line: Some("import { a b } from 'm'".to_string()),
            underline: Some("           ^".to_string()),
            suggestions: vec!["separate specifiers with ','".to_string()],
        };

        let output = diag.render_plain();
        assert!(output.contains("error[E010]"));
        assert!(output.contains("mod.ts:3:12"));
        assert!(output.contains("import { a b } from 'm'"));
        assert!(output.contains("   = help: separate specifiers with ','"));
        assert!(!output.contains("\x1b["));
    }

    #[test]
    fn test_render_ansi() {
        let diag = Diagnostic::error("E010", "unexpected '}'".to_string(), "mod.ts")
            .at("}", 1, 1, 1);
        let output = diag.render_ansi();
        assert!(output.starts_with("\x1b[31merror\x1b[0m[\x1b[1mE010\x1b[0m]"));
        assert!(output.contains("unexpected '}'"));
        assert!(!diag.render_plain().contains('\x1b'));
    }
}
