pub mod span;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod typeck;
pub mod signature;
pub mod model;
pub mod visit;
pub mod closure;
pub mod codegen;
pub mod config;
pub mod source;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::info;

use closure::Closure;
use config::KernelConfig;
use diagnostics::{CompileError, CompileWarning};
use source::{ArchiveIndex, ArchiveResolver, SourceResolver};

/// Result of a successful translation.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    /// Declarations unit.
    pub header: String,
    /// Flattened implementation unit.
    pub source: String,
    pub warnings: Vec<CompileWarning>,
    /// Fixpoint passes the closure builder needed.
    pub iterations: usize,
}

/// Discover the classes, fields and methods reachable from the kernel.
pub fn collect(config: &KernelConfig, resolver: &mut dyn SourceResolver) -> Result<Closure, CompileError> {
    closure::build(config, resolver)
}

/// Collect the kernel's closure and emit both output units (closure → codegen).
/// No file I/O beyond what `resolver` does.
pub fn translate(config: &KernelConfig, resolver: &mut dyn SourceResolver) -> Result<Translation, CompileError> {
    let closure = collect(config, resolver)?;
    let output = codegen::generate(&closure, config)?;
    Ok(Translation {
        header: output.header,
        source: output.source,
        warnings: output.warnings,
        iterations: closure.iterations,
    })
}

/// `<base>.h` and `<base>.cpp`. The suffix is appended, never substituted.
pub fn output_paths(output_base: &Path) -> (PathBuf, PathBuf) {
    let with_suffix = |suffix: &str| {
        let mut name: OsString = output_base.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    };
    (with_suffix(".h"), with_suffix(".cpp"))
}

/// Translate from files: index `archives`, load the selector at
/// `config_path`, and write both units next to `output_base`. Nothing is
/// written unless the whole translation succeeds.
pub fn translate_files(archives: &str, config_path: &Path, output_base: &Path) -> Result<Translation, CompileError> {
    let config = KernelConfig::load(config_path)?;
    let index = ArchiveIndex::build(archives)?;
    info!("Indexed {} classes from the archive set", index.len());
    let mut resolver = ArchiveResolver::new(index);
    let translation = translate(&config, &mut resolver)?;

    let (header_path, source_path) = output_paths(output_base);
    std::fs::write(&header_path, &translation.header)
        .map_err(|e| CompileError::io(format!("failed to write declarations: {e}"), header_path.clone()))?;
    std::fs::write(&source_path, &translation.source)
        .map_err(|e| CompileError::io(format!("failed to write implementation: {e}"), source_path.clone()))?;
    info!("Wrote {} and {}", header_path.display(), source_path.display());

    Ok(translation)
}
