//! Configuration file parsing for `ts-repl.toml`.
//!
//! Searches current directory then ancestors, falling back to
//! `~/.config/ts-repl/ts-repl.toml` if no project-level file is found.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "ts-repl.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid toml in '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct TsReplConfig {
    #[serde(default)]
    pub runner: RunnerSection,
    #[serde(default)]
    pub compiler_options: CompilerOptions,
    #[serde(default)]
    pub harness: HarnessSection,
}

/// How the harness is executed.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RunnerSection {
    /// Executable that compiles and runs TypeScript
    pub command: String,
    /// Modules preloaded with `-r`
    pub register: Vec<String>,
    pub transpile_only: bool,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            command: "ts-node".to_string(),
            register: vec!["tsconfig-paths/register".to_string()],
            transpile_only: false,
        }
    }
}

/// Passed to the runner as `--compilerOptions <json>`.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerOptions {
    pub strict: bool,
    pub es_module_interop: bool,
    pub allow_js: bool,
    pub no_unused_locals: bool,
    pub no_unused_parameters: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            strict: true,
            es_module_interop: true,
            allow_js: true,
            no_unused_locals: true,
            no_unused_parameters: true,
        }
    }
}

impl CompilerOptions {
    /// Turn off the checks that reject work-in-progress code.
    pub fn loosen(&mut self) {
        self.strict = false;
        self.no_unused_locals = false;
        self.no_unused_parameters = false;
    }
}

/// Where the generated harness file is written.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Next to the source file, so relative imports resolve
    #[default]
    Sibling,
    /// Under `<tmp>/ts-repl/`
    Temp,
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::Sibling => write!(f, "sibling"),
            Placement::Temp => write!(f, "temp"),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct HarnessSection {
    pub placement: Placement,
    /// Leave the generated file on disk after the session
    pub keep: bool,
    /// Offer the `.reload` command
    pub reload: bool,
    pub prompt: String,
}

impl Default for HarnessSection {
    fn default() -> Self {
        Self {
            placement: Placement::Sibling,
            keep: false,
            reload: true,
            prompt: "> ".to_string(),
        }
    }
}

impl TsReplConfig {
    /// Locate the config file that applies to `start`: the nearest
    /// `ts-repl.toml` in `start` or its ancestors, then the global one.
    pub fn find(start: &Path) -> Option<PathBuf> {
        let mut dir = start.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !dir.pop() {
                break;
            }
        }
        let global = dirs::home_dir()?.join(".config").join("ts-repl").join(CONFIG_FILE_NAME);
        global.is_file().then_some(global)
    }

    /// Find and load the config for the current directory.
    /// Returns `Ok(None)` when no file exists.
    pub fn load_with_path() -> Result<Option<(PathBuf, Self)>, ConfigError> {
        let Ok(cwd) = std::env::current_dir() else {
            return Ok(None);
        };
        match Self::find(&cwd) {
            Some(path) => {
                let cfg = Self::load_from(&path)?;
                Ok(Some((path, cfg)))
            }
            None => Ok(None),
        }
    }

    /// Load config from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a TOML string directly.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
