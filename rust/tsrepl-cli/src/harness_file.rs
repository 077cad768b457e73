//! On-disk lifecycle of the generated harness.

use crate::config::Placement;
use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// `.tsrepl.<basename>.<unix-millis>.ts`
pub fn harness_file_name(source: &Path, now: DateTime<Utc>) -> String {
    let base = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "module".to_string());
    format!(".tsrepl.{}.{}.ts", base, now.timestamp_millis())
}

pub fn harness_dir(source: &Path, placement: Placement) -> PathBuf {
    match placement {
        Placement::Sibling => match source.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
        Placement::Temp => std::env::temp_dir().join("ts-repl"),
    }
}

/// A written harness. Removed from disk on drop unless kept.
#[derive(Debug)]
pub struct HarnessFile {
    path: PathBuf,
    keep: bool,
}

impl HarnessFile {
    pub fn write(source: &Path, placement: Placement, keep: bool, contents: &str) -> io::Result<Self> {
        let dir = harness_dir(source, placement);
        if placement == Placement::Temp {
            std::fs::create_dir_all(&dir)?;
        }
        let path = dir.join(harness_file_name(source, Utc::now()));
        let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        file.write_all(contents.as_bytes())?;
        debug!(path = %path.display(), %placement, keep, "wrote harness");
        Ok(Self { path, keep })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_kept(&self) -> bool {
        self.keep
    }
}

impl Drop for HarnessFile {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed harness"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "could not remove harness"),
        }
    }
}
