//! ANSI color helpers for CLI output.
//!
//! Setting `NO_COLOR` to any non-empty value turns every helper into a no-op.

fn enabled() -> bool {
    !matches!(std::env::var_os("NO_COLOR"), Some(v) if !v.is_empty())
}

fn paint(code: &str, s: &str) -> String {
    if enabled() {
        format!("\x1b[{}m{}\x1b[0m", code, s)
    } else {
        s.to_string()
    }
}

/// Whether output should carry escape codes at all.
pub fn color_enabled() -> bool {
    enabled()
}

pub fn red(s: &str) -> String {
    paint("31", s)
}

pub fn yellow(s: &str) -> String {
    paint("33", s)
}

pub fn bold(s: &str) -> String {
    paint("1", s)
}

pub fn gray(s: &str) -> String {
    paint("90", s)
}

/// Right-aligned, green, bold status label (`        Kept`).
pub fn status_label(label: &str) -> String {
    paint("1;32", &format!("{:>12}", label))
}
