//! End-to-end tests for the `ts-repl` binary that do not need ts-node.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

// =============================================================================
// Helpers
// =============================================================================

const GREETER_TS: &str = "import { join } from 'path'\n\nfunction helper(name: string) {\n  return join('/greet', name)\n}\n\nexport const answer = 42\n";

fn ts_repl(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ts-repl"));
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("NO_COLOR", "1")
        .env_remove("TS_REPL_HISTFILE")
        .env_remove("TS_REPL_LOG");
    cmd
}

fn leftover_harnesses(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(".tsrepl."))
        })
        .collect()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn fixture(contents: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("greeter.ts"), contents).unwrap();
    dir
}

// =============================================================================
// Usage and input errors
// =============================================================================

#[test]
fn missing_file_fails_without_writing_anything() {
    let dir = tempfile::tempdir().unwrap();
    let out = ts_repl(dir.path()).arg("nope.ts").output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("file not found: nope.ts"), "stderr: {}", stderr(&out));
    assert!(leftover_harnesses(dir.path()).is_empty());
}

#[test]
fn no_arguments_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = ts_repl(dir.path()).output().unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("Usage"));
}

#[test]
fn unknown_flag_is_a_usage_error() {
    let dir = fixture(GREETER_TS);
    let out = ts_repl(dir.path()).args(["--frobnicate", "greeter.ts"]).output().unwrap();
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn parse_error_renders_diagnostic() {
    let dir = fixture("export const ok = 1\nfunction broken( {\n");
    let out = ts_repl(dir.path()).arg("greeter.ts").output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(err.contains("error[E01"), "stderr: {}", err);
    assert!(err.contains("greeter.ts:"), "stderr: {}", err);
    assert!(err.contains("could not prepare 'greeter.ts' for the REPL"), "stderr: {}", err);
    assert!(leftover_harnesses(dir.path()).is_empty());
}

// =============================================================================
// Harness output
// =============================================================================

#[test]
fn print_emits_harness_without_launching() {
    let dir = fixture(GREETER_TS);
    let out = ts_repl(dir.path()).args(["--print", "--no-reload", "greeter.ts"]).output().unwrap();
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.starts_with(GREETER_TS));
    assert!(text.contains("/** BEGIN TS_REPL */"));
    assert!(text.contains("export { join };\nexport { helper };\n"));
    assert!(!text.contains("export { answer };"));
    assert!(text.contains(r#"["join","helper","answer"]"#));
    assert!(!text.contains("child_process"));
    assert!(leftover_harnesses(dir.path()).is_empty());
}

#[test]
fn print_with_reload_embeds_this_executable() {
    let dir = fixture(GREETER_TS);
    let out = ts_repl(dir.path()).args(["--print", "greeter.ts"]).output().unwrap();
    let text = stdout(&out);
    assert!(text.contains("defineCommand('reload'"));
    assert!(text.contains("\"--print\",\"greeter.ts\"]"));
}

#[cfg(target_os = "linux")]
#[test]
fn non_utf8_file_name_prints_without_reload() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempfile::tempdir().unwrap();
    let name = OsStr::from_bytes(b"m\xff.ts");
    std::fs::write(dir.path().join(name), GREETER_TS).unwrap();
    let out = ts_repl(dir.path()).arg("--print").arg(name).output().unwrap();
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.starts_with(GREETER_TS));
    assert!(!text.contains("defineCommand('reload'"));
}

#[test]
fn prompt_comes_from_config() {
    let dir = fixture(GREETER_TS);
    std::fs::write(dir.path().join("ts-repl.toml"), "[harness]\nprompt = \"ts> \"\n").unwrap();
    let out = ts_repl(dir.path()).args(["--print", "greeter.ts"]).output().unwrap();
    assert!(stdout(&out).contains("prompt: \"ts> \","));
}

#[test]
fn invalid_config_warns_and_uses_defaults() {
    let dir = fixture(GREETER_TS);
    std::fs::write(dir.path().join("ts-repl.toml"), "[harness\n").unwrap();
    let out = ts_repl(dir.path()).args(["--print", "greeter.ts"]).output().unwrap();
    assert_eq!(out.status.code(), Some(0));
    assert!(stderr(&out).contains("warning:"));
    assert!(stdout(&out).contains("prompt: \"> \","));
}

#[test]
fn explicit_config_must_load() {
    let dir = fixture(GREETER_TS);
    let out = ts_repl(dir.path())
        .args(["--config", "missing.toml", "--print", "greeter.ts"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("cannot read 'missing.toml'"));
}

// =============================================================================
// Launch failures
// =============================================================================

fn with_missing_runner(dir: &Path) {
    std::fs::write(
        dir.join("ts-repl.toml"),
        "[runner]\ncommand = \"ts-repl-missing-runner\"\nregister = []\n",
    )
    .unwrap();
}

#[test]
fn launch_failure_removes_harness() {
    let dir = fixture(GREETER_TS);
    with_missing_runner(dir.path());
    let out = ts_repl(dir.path()).arg("greeter.ts").output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    let printed = stdout(&out);
    assert!(printed.starts_with("compiling...\n"));
    assert!(printed.contains(".tsrepl.greeter.ts."));
    assert!(stderr(&out).contains("'ts-repl-missing-runner' was not found"));
    assert!(leftover_harnesses(dir.path()).is_empty());
}

#[test]
fn keep_leaves_harness_after_failure() {
    let dir = fixture(GREETER_TS);
    with_missing_runner(dir.path());
    let out = ts_repl(dir.path()).args(["--keep", "greeter.ts"]).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    let kept = leftover_harnesses(dir.path());
    assert_eq!(kept.len(), 1);
    let text = std::fs::read_to_string(&kept[0]).unwrap();
    assert!(text.starts_with(GREETER_TS));
    assert!(text.trim_end().ends_with("/** END TS_REPL */"));
}
