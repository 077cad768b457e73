//! Launching the harness under `ts-node`.

use crate::config::{CompilerOptions, RunnerSection};
use crate::history::{history_override, HISTORY_ENV};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("'{command}' was not found; install it with `npm install -g ts-node typescript` or set [runner] command in ts-repl.toml")]
    NotFound {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to start '{command}'")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot encode compiler options")]
    CompilerOptions(#[from] serde_json::Error),
}

/// Builds and runs the `ts-node` invocation for one harness file.
pub struct Runner<'a> {
    runner: &'a RunnerSection,
    compiler_options: CompilerOptions,
    history: Option<PathBuf>,
}

impl<'a> Runner<'a> {
    pub fn new(runner: &'a RunnerSection, compiler_options: CompilerOptions) -> Self {
        Self { runner, compiler_options, history: history_override() }
    }

    /// Override the history location passed to the harness.
    pub fn with_history(mut self, history: Option<PathBuf>) -> Self {
        self.history = history;
        self
    }

    /// Arguments after the command name.
    pub fn args(&self, harness: &Path) -> Result<Vec<OsString>, LaunchError> {
        let mut args: Vec<OsString> = vec![
            "--compilerOptions".into(),
            serde_json::to_string(&self.compiler_options)?.into(),
        ];
        for module in &self.runner.register {
            args.push("-r".into());
            args.push(module.into());
        }
        if self.runner.transpile_only {
            args.push("--transpile-only".into());
        }
        args.push(harness.as_os_str().to_owned());
        Ok(args)
    }

    pub fn command(&self, harness: &Path) -> Result<Command, LaunchError> {
        let mut cmd = Command::new(&self.runner.command);
        cmd.args(self.args(harness)?).env("REPL", "1").env("TS_REPL", "1");
        if let Some(history) = &self.history {
            cmd.env(HISTORY_ENV, history);
        }
        Ok(cmd)
    }

    /// Run to completion with inherited stdio and return the exit code.
    pub fn run(&self, harness: &Path) -> Result<i32, LaunchError> {
        let mut cmd = self.command(harness)?;
        debug!(command = ?cmd, "launching runner");
        let status = cmd.status().map_err(|source| {
            let command = self.runner.command.clone();
            if source.kind() == std::io::ErrorKind::NotFound {
                LaunchError::NotFound { command, source }
            } else {
                LaunchError::Spawn { command, source }
            }
        })?;
        debug!(%status, "runner exited");
        // terminated by a signal
        Ok(status.code().unwrap_or(1))
    }
}
