#![allow(dead_code)]

use std::path::Path;
use std::process::Command;

use j2ir::closure::Closure;
use j2ir::config::{KernelConfig, VariableAttrs};
use j2ir::diagnostics::CompileError;
use j2ir::source::MemorySources;
use j2ir::Translation;

pub const PREAMBLE: &str = "#include <math.h>\n#include <string.h>\n\n";

pub fn j2ir() -> Command {
    Command::new(env!("CARGO_BIN_EXE_j2ir"))
}

/// Drops the include lines every unit starts with.
pub fn strip_preamble(unit: &str) -> &str {
    unit.strip_prefix(PREAMBLE).unwrap_or(unit)
}

/// A set of in-memory classes plus the kernel selector.
pub struct TestProgram {
    kernel: String,
    classes: Vec<(String, String)>,
    lengths: Vec<(String, String)>,
}

impl TestProgram {
    pub fn new(kernel: &str) -> Self {
        Self { kernel: kernel.to_string(), classes: Vec::new(), lengths: Vec::new() }
    }

    pub fn class(mut self, name: &str, source: &str) -> Self {
        self.classes.push((name.to_string(), source.to_string()));
        self
    }

    pub fn length(mut self, var: &str, length: &str) -> Self {
        self.lengths.push((var.to_string(), length.to_string()));
        self
    }

    pub fn config(&self) -> KernelConfig {
        let mut config = KernelConfig::new(&self.kernel).unwrap();
        for (var, length) in &self.lengths {
            config = config.with_variable(var.clone(), VariableAttrs::with_length(length.clone()));
        }
        config
    }

    fn sources(&self) -> MemorySources {
        let mut sources = MemorySources::new();
        for (name, src) in &self.classes {
            sources.add(name.clone(), src.clone());
        }
        sources
    }

    pub fn translate(&self) -> Result<Translation, CompileError> {
        j2ir::translate(&self.config(), &mut self.sources())
    }

    pub fn collect(&self) -> Result<Closure, CompileError> {
        j2ir::collect(&self.config(), &mut self.sources())
    }

    /// Writes every class as `<dir>/<Name>.java`.
    pub fn write_dir(&self, dir: &Path) {
        for (name, src) in &self.classes {
            let path = dir.join(format!("{}.java", name.replace('.', "/")));
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, src).unwrap();
        }
    }
}

/// Translate and return the implementation unit without its preamble.
pub fn flatten(program: &TestProgram) -> String {
    let out = program.translate().unwrap_or_else(|e| panic!("translation failed: {e}"));
    strip_preamble(&out.source).to_string()
}

/// Translate and return the declarations unit without its preamble.
pub fn declarations(program: &TestProgram) -> String {
    let out = program.translate().unwrap_or_else(|e| panic!("translation failed: {e}"));
    strip_preamble(&out.header).to_string()
}

pub fn translate_should_fail_with(program: &TestProgram, expected: &str) {
    match program.translate() {
        Ok(_) => panic!("translation should have failed with {expected:?}"),
        Err(err) => {
            let msg = err.to_string();
            assert!(msg.contains(expected), "expected error containing {expected:?}, got {msg:?}");
        }
    }
}

pub const XML_TEST: &str = "public class XMLTest {
	public static void main(String[] args) {
		int[] a = new int[10];
		for (int i = 0; i < 10; i++)
			a[i] = i;
		int[][] b = compute(10, a);
	}

	public static int[][] compute(int N, int[] a) {
		int[][] b = new int[N][N + 10];
		for (int i = 0; i < N; i++) {
			for (int j = 0; j < N + 10; j++)
				b[i][j] = a[i] + 5 + j;
		}
		return b;
	}
}
";
