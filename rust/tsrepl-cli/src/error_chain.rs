//! Error context chaining for CLI diagnostics.
//!
//! Collects an error and its `source()` chain into one value that prints as
//! a headline followed by indented `caused by:` lines.

use crate::colors::red;
use std::fmt;

// =============================================================================
// ErrorChain
// =============================================================================

#[derive(Debug, Clone)]
pub struct ErrorChain {
    /// The headline message.
    pub primary: String,
    /// Causes from outermost to innermost.
    pub causes: Vec<String>,
}

impl ErrorChain {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            causes: Vec::new(),
        }
    }

    pub fn caused_by(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }

    /// Build a chain from an error, walking its `source()` links.
    pub fn from_error(err: &dyn std::error::Error) -> Self {
        let mut chain = ErrorChain::new(err.to_string());
        let mut source = err.source();
        while let Some(cause) = source {
            chain.causes.push(cause.to_string());
            source = cause.source();
        }
        chain
    }

    /// Prefix the chain with a new headline; the old headline becomes the first cause.
    pub fn context(self, primary: impl Into<String>) -> Self {
        let mut causes = Vec::with_capacity(self.causes.len() + 1);
        causes.push(self.primary);
        causes.extend(self.causes);
        Self { primary: primary.into(), causes }
    }

    /// `error: <primary>` plus one indented line per cause.
    pub fn format_for_display(&self) -> String {
        let mut out = format!("{} {}", red("error:"), self.primary);
        for cause in &self.causes {
            out.push_str(&format!("\n  caused by: {}", cause));
        }
        out
    }
}

impl fmt::Display for ErrorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primary)?;
        for cause in &self.causes {
            write!(f, "\n  caused by: {}", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorChain {}

impl From<std::io::Error> for ErrorChain {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

// =============================================================================
// Tests
// =============================================================================
