//! Harness synthesis.
//!
//! The harness is the original module text followed by a delimited block that
//! exports every remaining top-level name, reads the module's own export
//! mapping back, and starts a Node `repl` server whose evaluation context is the
//! ambient globals overlaid with those symbols.

use crate::compiler::symbols::SymbolSet;
use serde_json::Value;

pub const BEGIN_MARKER: &str = "/** BEGIN TS_REPL */";
pub const END_MARKER: &str = "/** END TS_REPL */";

/// Prefix reserved for every name the harness introduces. Sources that already
/// use it will collide with the bootstrap. A local whose own name is taken by
/// another binding's export travels as `__ts_repl__<name>`.
pub const INTERNAL_PREFIX: &str = "__ts_repl__";

/// Knobs for the generated bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessOptions {
    pub prompt: String,
    /// Environment variable that overrides the history file location
    pub history_env: String,
    /// History file name under the home directory when the override is unset
    pub history_file_name: String,
    /// Command line re-run by `.reload`; `None` leaves the command out
    pub reload_argv: Option<Vec<String>>,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            prompt: "> ".to_string(),
            history_env: "TS_REPL_HISTFILE".to_string(),
            history_file_name: ".ts_repl_history".to_string(),
            reload_argv: None,
        }
    }
}

/// A complete program ready to hand to `ts-node`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessProgram {
    text: String,
    symbols: Vec<String>,
    export_count: usize,
}

impl HarnessProgram {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Names embedded in the harness, in order of first appearance.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn export_count(&self) -> usize {
        self.export_count
    }
}

fn js_string(s: &str) -> String {
    Value::from(s).to_string()
}

fn js_string_array(items: &[String]) -> String {
    Value::from(items.to_vec()).to_string()
}

pub fn synthesize(
    original: &str,
    export_statements: &[String],
    symbols: &SymbolSet,
    options: &HarnessOptions,
) -> HarnessProgram {
    let reload = options.reload_argv.as_ref().filter(|argv| !argv.is_empty());
    let mut out = String::with_capacity(original.len() + 4096);

    out.push_str(original);
    if !original.ends_with('\n') {
        out.push('\n');
    }
    out.push('\n');
    out.push_str(BEGIN_MARKER);
    out.push_str("\n\n");

    // ── Synthetic exports ──
    out.push_str("// Additional exports for non-exported top-level symbols\n");
    for statement in export_statements {
        out.push_str(statement);
        out.push('\n');
    }
    out.push('\n');

    // ── Imports ──
    out.push_str("// REPL setup code\n");
    out.push_str("import * as __ts_repl__repl from 'repl';\n");
    out.push_str("import * as __ts_repl__vm from 'vm';\n");
    out.push_str("import * as __ts_repl__path from 'path';\n");
    out.push_str("import * as __ts_repl__os from 'os';\n");
    if reload.is_some() {
        out.push_str("import * as __ts_repl__childProcess from 'child_process';\n");
    }
    out.push('\n');

    // ── Symbol table ──
    out.push_str("// Capture all top-level symbols\n");
    out.push_str(&format!(
        "const __ts_repl__allSymbols: string[] = {};\n",
        js_string_array(symbols.as_slice())
    ));
    if let Some(argv) = reload {
        out.push_str(&format!(
            "const __ts_repl__reloadArgv: string[] = {};\n",
            js_string_array(argv)
        ));
    }
    out.push('\n');

    out.push_str(
        r#"function __ts_repl__listAvailableSymbols(): void {
	console.log('available top-level symbols:');
	console.log(__ts_repl__allSymbols.join('\n'));
}

function __ts_repl__loadModuleSymbols(): Record<string, unknown> {
	const moduleExports = exports as Record<string, unknown>;
	const moduleSymbols: Record<string, unknown> = {};
	for (const [name, value] of Object.entries(moduleExports)) {
		if (!name.startsWith('__ts_repl__')) {
			moduleSymbols[name] = value;
		}
	}
	for (const name of __ts_repl__allSymbols) {
		const hidden = '__ts_repl__' + name;
		if (hidden in moduleExports) {
			moduleSymbols[name] = moduleExports[hidden];
		}
	}
	const missing = __ts_repl__allSymbols.filter((name) => !(name in moduleSymbols));
	if (missing.length > 0) {
		console.error(`could not load symbols: ${missing.join(', ')}`);
	}
	return moduleSymbols;
}

function __ts_repl__createContext(moduleSymbols: Record<string, unknown>): __ts_repl__vm.Context {
	const context = __ts_repl__vm.createContext({});
	const builtins = new Set(__ts_repl__vm.runInContext('Object.getOwnPropertyNames(globalThis)', context) as string[]);
	const ambient = globalThis as unknown as Record<string, unknown>;
	for (const name of Object.getOwnPropertyNames(globalThis)) {
		// the context's own console writes nowhere
		if (builtins.has(name) && name !== 'console') {
			continue;
		}
		try {
			context[name] = ambient[name];
		} catch {
			continue;
		}
	}
	context.require = require;
	Object.assign(context, moduleSymbols);
	if (!('listSymbols' in moduleSymbols)) {
		context.listSymbols = __ts_repl__listAvailableSymbols;
	}
	return context;
}

function __ts_repl__isRecoverable(error: unknown): boolean {
	if (typeof error !== 'object' || error === null) {
		return false;
	}
	const { name, message } = error as { name?: unknown; message?: unknown };
	return name === 'SyntaxError'
		&& typeof message === 'string'
		&& /^(Unexpected end of input|Unterminated template literal)/.test(message);
}

"#,
    );

    // ── Session ──
    out.push_str(
        "function __ts_repl__startSession(context: __ts_repl__vm.Context, moduleSymbols: Record<string, unknown>): void {\n",
    );
    out.push_str(&format!(
        "\tconst historyFile = process.env[{}] || __ts_repl__path.join(__ts_repl__os.homedir(), {});\n",
        js_string(&options.history_env),
        js_string(&options.history_file_name)
    ));
    if reload.is_some() {
        out.push_str("\tlet reloading = false;\n");
    }
    out.push_str(&format!(
        r#"
	// https://nodejs.org/api/repl.html
	const server = __ts_repl__repl.start({{
		prompt: {},
		useGlobal: false,
		preview: true,
		eval: (cmd: string, _context: __ts_repl__vm.Context, _filename: string, callback: (err: Error | null, result?: unknown) => void): void => {{
			try {{
				callback(null, __ts_repl__vm.runInContext(cmd, context));
			}} catch (e) {{
				if (__ts_repl__isRecoverable(e)) {{
					callback(new __ts_repl__repl.Recoverable(e as Error));
				}} else {{
					callback(e as Error);
				}}
			}}
		}},
	}});

	// completion reads the server's own context
	Object.assign(server.context, moduleSymbols);
	server.context.listSymbols = context.listSymbols;

	server.defineCommand('symbols', {{
		help: 'List the top-level symbols of the loaded module',
		action(): void {{
			__ts_repl__listAvailableSymbols();
			this.displayPrompt();
		}},
	}});
"#,
        js_string(&options.prompt)
    ));

    if reload.is_some() {
        out.push_str(
            r#"
	server.defineCommand('reload', {
		help: 'Restart the session with a freshly compiled module',
		action(): void {
			reloading = true;
			this.close();
		},
	});

	server.on('exit', () => {
		if (!reloading) {
			return;
		}
		const child = __ts_repl__childProcess.spawn(__ts_repl__reloadArgv[0], __ts_repl__reloadArgv.slice(1), {
			stdio: 'inherit',
			env: process.env,
		});
		child.on('exit', (code: number | null) => process.exit(code ?? 0));
	});
"#,
        );
    }

    out.push_str(
        r#"
	server.setupHistory(historyFile, (err: Error | null) => {
		if (err) {
			console.error(`Error setting up REPL history: ${err}`);
		} else {
			console.log(`history: ${historyFile}`);
		}
		__ts_repl__listAvailableSymbols();
		server.displayPrompt();
	});
}

const __ts_repl__moduleSymbols = __ts_repl__loadModuleSymbols();
__ts_repl__startSession(__ts_repl__createContext(__ts_repl__moduleSymbols), __ts_repl__moduleSymbols);

"#,
    );
    out.push_str(END_MARKER);
    out.push('\n');

    HarnessProgram {
        text: out,
        symbols: symbols.as_slice().to_vec(),
        export_count: export_statements.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(reload: Option<Vec<String>>) -> HarnessProgram {
        let symbols: SymbolSet = ["greet", "count"].into_iter().collect();
        let exports = vec!["export { greet };".to_string()];
        let options = HarnessOptions { reload_argv: reload, ..HarnessOptions::default() };
        synthesize("export const count = 1;\nfunction greet() {}", &exports, &symbols, &options)
    }

    #[test]
    fn test_layout_order() {
        let harness = program(None);
        let text = harness.text();
        let original = text.find("function greet() {}").unwrap();
        let begin = text.find(BEGIN_MARKER).unwrap();
        let export = text.find("export { greet };").unwrap();
        let setup = text.find("__ts_repl__startSession(__ts_repl__createContext").unwrap();
        let end = text.find(END_MARKER).unwrap();
        assert!(original < begin && begin < export && export < setup && setup < end);
        assert!(text.starts_with("export const count = 1;\nfunction greet() {}\n\n"));
    }

    #[test]
    fn test_symbols_embedded_as_json() {
        let harness = program(None);
        let text = harness.text();
        assert!(text.contains(r#"const __ts_repl__allSymbols: string[] = ["greet","count"];"#));
    }

    #[test]
    fn test_history_env_and_default_name() {
        let harness = program(None);
        let text = harness.text();
        assert!(text.contains(
            r#"process.env["TS_REPL_HISTFILE"] || __ts_repl__path.join(__ts_repl__os.homedir(), ".ts_repl_history")"#
        ));
        assert!(text.contains("prompt: \"> \","));
    }

    #[test]
    fn test_reload_omitted_by_default() {
        let harness = program(None);
        assert!(!harness.text().contains("child_process"));
        assert!(!harness.text().contains("defineCommand('reload'"));
        assert!(harness.text().contains("defineCommand('symbols'"));
    }

    #[test]
    fn test_reload_embeds_argv() {
        let harness = program(Some(vec!["/usr/bin/ts-repl".into(), "a \"b\".ts".into()]));
        let text = harness.text();
        assert!(text.contains("import * as __ts_repl__childProcess from 'child_process';"));
        assert!(text.contains(r#"const __ts_repl__reloadArgv: string[] = ["/usr/bin/ts-repl","a \"b\".ts"];"#));
        assert!(text.contains("let reloading = false;"));
    }

    #[test]
    fn test_empty_reload_argv_is_no_reload() {
        assert!(!program(Some(vec![])).text().contains("reloading"));
    }

    #[test]
    fn test_prefixed_exports_are_read_back_under_local_name() {
        let harness = program(None);
        let text = harness.text();
        assert!(text.contains("if (!name.startsWith('__ts_repl__')) {"));
        assert!(text.contains("const hidden = '__ts_repl__' + name;"));
        assert!(text.contains("moduleSymbols[name] = moduleExports[hidden];"));
    }

    #[test]
    fn test_program_reports_symbols_and_export_count() {
        let harness = program(None);
        assert_eq!(harness.export_count(), 1);
        assert_eq!(harness.symbols(), &["greet".to_string(), "count".to_string()]);
        let block = &harness.text()[harness.text().rfind(BEGIN_MARKER).unwrap()..];
        assert!(!block.contains("function greet() {}"));
    }
}
