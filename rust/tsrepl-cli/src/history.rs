//! Session history location.
//!
//! The harness reads `TS_REPL_HISTFILE` itself and falls back to
//! `~/.ts_repl_history`. Node does not expand `~`, so the front end resolves
//! the override before launch.

use std::path::{Path, PathBuf};

/// Environment variable used to override the history location.
pub const HISTORY_ENV: &str = "TS_REPL_HISTFILE";

/// History file name under the home directory.
pub const DEFAULT_HISTORY_FILE: &str = ".ts_repl_history";

/// Resolve the path to the history file.
///
/// Rules:
/// - override set to an absolute path: use as-is.
/// - override set to `~` or `~/...`: resolve under HOME.
/// - override set to a relative path: resolve under HOME.
/// - Otherwise: `${HOME}/.ts_repl_history`.
pub fn resolve_history_path(home: Option<&Path>, override_path: Option<&str>) -> Option<PathBuf> {
    let home_path = || home.map(Path::to_path_buf);

    if let Some(raw) = override_path.map(str::trim).filter(|value| !value.is_empty()) {
        if raw == "~" {
            return home_path();
        }
        if let Some(rest) = raw.strip_prefix("~/") {
            return home_path().map(|home| home.join(rest));
        }
        let configured = PathBuf::from(raw);
        if configured.is_relative() {
            return home_path().map(|home| home.join(configured));
        }
        return Some(configured);
    }

    home_path().map(|home| home.join(DEFAULT_HISTORY_FILE))
}

/// The normalized override to hand to the harness, if the user set one.
pub fn history_override() -> Option<PathBuf> {
    let raw = std::env::var(HISTORY_ENV).ok()?;
    if raw.trim().is_empty() {
        return None;
    }
    resolve_history_path(dirs::home_dir().as_deref(), Some(&raw))
}
