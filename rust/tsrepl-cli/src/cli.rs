//! Command-line surface and the top-level flow of one invocation.

use crate::colors::{bold, color_enabled, gray, red, status_label, yellow};
use crate::config::{Placement, TsReplConfig};
use crate::error_chain::ErrorChain;
use crate::harness_file::HarnessFile;
use crate::history::{resolve_history_path, DEFAULT_HISTORY_FILE, HISTORY_ENV};
use crate::runner::Runner;
use clap::Parser as ClapParser;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tsrepl_compiler::compiler::harness::HarnessOptions;

#[derive(ClapParser, Debug)]
#[command(
    name = "ts-repl",
    version,
    about = "Open a TypeScript file in a REPL with every top-level binding in scope"
)]
pub struct Cli {
    /// TypeScript file to load
    #[arg()]
    pub file: PathBuf,

    /// Skip type checking (ts-node --transpile-only)
    #[arg(short = 'T', long)]
    pub transpile_only: bool,

    /// Disable strict, noUnusedLocals and noUnusedParameters
    #[arg(long)]
    pub loose: bool,

    /// Keep the generated harness file after the session
    #[arg(long)]
    pub keep: bool,

    /// Leave the .reload command out of the session
    #[arg(long)]
    pub no_reload: bool,

    /// Print the generated harness instead of launching it
    #[arg(long)]
    pub print: bool,

    /// Write the harness under the OS temp dir instead of next to the source
    #[arg(long)]
    pub temp_dir: bool,

    /// Use this config file instead of searching for ts-repl.toml
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Fold command-line flags over the file configuration.
    pub fn apply(&self, config: &mut TsReplConfig) {
        if self.transpile_only {
            config.runner.transpile_only = true;
        }
        if self.loose {
            config.compiler_options.loosen();
        }
        if self.keep {
            config.harness.keep = true;
        }
        if self.no_reload {
            config.harness.reload = false;
        }
        if self.temp_dir {
            config.harness.placement = Placement::Temp;
        }
    }
}

fn load_config(cli: &Cli) -> Result<TsReplConfig, ErrorChain> {
    if let Some(path) = &cli.config {
        return TsReplConfig::load_from(path).map_err(|e| ErrorChain::from_error(&e));
    }
    match TsReplConfig::load_with_path() {
        Ok(Some((path, cfg))) => {
            debug!(path = %path.display(), "loaded config");
            Ok(cfg)
        }
        Ok(None) => Ok(TsReplConfig::default()),
        Err(e) => {
            warn!(error = %e, "ignoring config file");
            eprintln!(
                "{} {}",
                yellow("warning:"),
                ErrorChain::from_error(&e).caused_by("using default settings")
            );
            Ok(TsReplConfig::default())
        }
    }
}

/// The command line that `.reload` re-runs: this executable with the same arguments.
fn reload_argv() -> Option<Vec<String>> {
    let exe = std::env::current_exe().ok()?;
    let argv = utf8_argv(std::iter::once(exe.into_os_string()).chain(std::env::args_os().skip(1)));
    if argv.is_none() {
        warn!("command line is not valid UTF-8; .reload is unavailable");
    }
    argv
}

/// `None` when any argument cannot be embedded in the harness as a string.
fn utf8_argv(args: impl IntoIterator<Item = OsString>) -> Option<Vec<String>> {
    args.into_iter().map(|arg| arg.into_string().ok()).collect()
}

fn resolve_source(file: &Path) -> Result<PathBuf, ErrorChain> {
    match std::fs::canonicalize(file) {
        Ok(path) if path.is_file() => Ok(path),
        Ok(path) => Err(ErrorChain::new(format!("not a file: {}", path.display()))),
        Err(e) => Err(ErrorChain::from(e).context(format!("file not found: {}", file.display()))),
    }
}

fn fail(chain: ErrorChain) -> i32 {
    eprintln!("{}", chain.format_for_display());
    1
}

/// Run one invocation and return the process exit code.
pub fn run(cli: Cli) -> i32 {
    let mut config = match load_config(&cli) {
        Ok(cfg) => cfg,
        Err(chain) => return fail(chain),
    };
    cli.apply(&mut config);

    let source_path = match resolve_source(&cli.file) {
        Ok(path) => path,
        Err(chain) => return fail(chain),
    };
    let filename = cli.file.display().to_string();
    let source = match std::fs::read_to_string(&source_path) {
        Ok(s) => s,
        Err(e) => {
            return fail(ErrorChain::from(e).context(format!("cannot read file '{}'", bold(&filename))));
        }
    };

    let options = HarnessOptions {
        prompt: config.harness.prompt.clone(),
        history_env: HISTORY_ENV.to_string(),
        history_file_name: DEFAULT_HISTORY_FILE.to_string(),
        reload_argv: if config.harness.reload { reload_argv() } else { None },
    };
    let harness = match tsrepl_compiler::prepare_harness(&source, &options) {
        Ok(h) => h,
        Err(e) => {
            let rendered = if color_enabled() {
                tsrepl_compiler::format_error(&e, &source, &filename)
            } else {
                tsrepl_compiler::format_error_plain(&e, &source, &filename)
            };
            eprint!("{}", rendered);
            eprintln!("{} could not prepare '{}' for the REPL", red("error:"), filename);
            return 1;
        }
    };

    if cli.print {
        print!("{}", harness.text());
        return 0;
    }

    let file = match HarnessFile::write(
        &source_path,
        config.harness.placement,
        config.harness.keep,
        harness.text(),
    ) {
        Ok(f) => f,
        Err(e) => return fail(ErrorChain::from(e).context("cannot write the harness file")),
    };

    println!("compiling...");
    println!("{}", file.path().display());
    debug!(
        history = ?resolve_history_path(dirs::home_dir().as_deref(), std::env::var(HISTORY_ENV).ok().as_deref()),
        symbols = harness.symbols().len(),
        "starting session"
    );

    let runner = Runner::new(&config.runner, config.compiler_options);
    let code = match runner.run(file.path()) {
        Ok(code) => code,
        Err(e) => return fail(ErrorChain::from_error(&e)),
    };
    if file.is_kept() {
        eprintln!("{} {}", status_label("Kept"), gray(&file.path().display().to_string()));
    }
    code
}
