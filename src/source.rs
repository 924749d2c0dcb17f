//! Locating and parsing class declarations.
//!
//! The archive set is a `;`-separated list of directories and `.jar`/`.zip`
//! files holding `.java` sources. [`ArchiveIndex`] maps every class they
//! contain to its location once, up front; [`ArchiveResolver`] parses files on
//! demand and caches the result per location.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::debug;

use crate::diagnostics::CompileError;
use crate::parser::ast::{ClassDecl, CompilationUnit};
use crate::parser::parse_source;

/// Supplies parsed class declarations to the closure builder.
pub trait SourceResolver {
    fn contains(&self, class: &str) -> bool;

    /// Parses `class` and returns its declaration with the file it came from.
    fn resolve(&mut self, class: &str) -> Result<ClassSource, CompileError>;

    /// Every class name this resolver can provide, for diagnostics.
    fn known_classes(&self) -> Vec<String>;
}

fn missing_class(class: &str) -> CompileError {
    CompileError::resolution(format!("Cannot find class {class} in the provided archives"))
}

fn simple_name(class: &str) -> &str {
    class.rsplit('.').next().unwrap_or(class)
}

/// The file a declaration was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceOrigin {
    pub path: String,
    pub text: Rc<str>,
}

impl SourceOrigin {
    /// Ties a spanned error to this file. Errors without a span pass through.
    pub fn locate(&self, err: CompileError) -> CompileError {
        match err.span() {
            Some(_) => CompileError::located(self.path.clone(), &*self.text, err),
            None => err,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassSource {
    pub decl: ClassDecl,
    pub origin: SourceOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceLocation {
    File(PathBuf),
    ArchiveEntry { archive: PathBuf, entry: String },
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceLocation::File(path) => write!(f, "{}", path.display()),
            SourceLocation::ArchiveEntry { archive, entry } => write!(f, "{}!/{entry}", archive.display()),
        }
    }
}

impl SourceLocation {
    pub fn read(&self) -> Result<String, CompileError> {
        match self {
            SourceLocation::File(path) => std::fs::read_to_string(path)
                .map_err(|e| CompileError::io(format!("cannot read source: {e}"), path.clone())),
            SourceLocation::ArchiveEntry { archive, entry } => {
                let io_err = |msg: String| CompileError::io(msg, archive.clone());
                let file = std::fs::File::open(archive).map_err(|e| io_err(format!("cannot open archive: {e}")))?;
                let mut zip = zip::ZipArchive::new(file).map_err(|e| io_err(format!("invalid archive: {e}")))?;
                let mut member = zip.by_name(entry).map_err(|e| io_err(format!("cannot read {entry}: {e}")))?;
                let mut text = String::new();
                member
                    .read_to_string(&mut text)
                    .map_err(|e| io_err(format!("cannot read {entry}: {e}")))?;
                Ok(text)
            }
        }
    }
}

/// `a/b/C.java` → `a.b.C`
fn qualified_name_of(relative: &str) -> Option<String> {
    let stem = relative.strip_suffix(".java")?;
    let name = stem.trim_start_matches('/').replace(['/', '\\'], ".");
    (!name.is_empty()).then_some(name)
}

#[derive(Debug, Default, Clone)]
pub struct ArchiveIndex {
    classes: BTreeMap<String, SourceLocation>,
    simple: BTreeMap<String, String>,
}

impl ArchiveIndex {
    /// Indexes every `.java` source in the `;`-separated archive list.
    pub fn build(archives: &str) -> Result<Self, CompileError> {
        let mut index = ArchiveIndex::default();
        for entry in archives.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let path = PathBuf::from(entry);
            if path.is_dir() {
                index.add_directory(&path, &path)?;
            } else if path.is_file() {
                index.add_archive(&path)?;
            } else {
                return Err(CompileError::io("archive path does not exist", path));
            }
        }
        debug!("indexed {} classes", index.classes.len());
        Ok(index)
    }

    fn insert(&mut self, qualified: String, location: SourceLocation) {
        self.simple
            .entry(simple_name(&qualified).to_string())
            .or_insert_with(|| qualified.clone());
        self.classes.entry(qualified).or_insert(location);
    }

    fn add_directory(&mut self, root: &Path, dir: &Path) -> Result<(), CompileError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| CompileError::io(format!("cannot read directory: {e}"), dir.to_path_buf()))?;
        let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
        paths.sort();
        for path in paths {
            if path.is_dir() {
                self.add_directory(root, &path)?;
                continue;
            }
            let Ok(relative) = path.strip_prefix(root) else { continue };
            if let Some(name) = qualified_name_of(&relative.to_string_lossy()) {
                self.insert(name, SourceLocation::File(path.clone()));
            }
        }
        Ok(())
    }

    fn add_archive(&mut self, archive: &Path) -> Result<(), CompileError> {
        let io_err = |msg: String| CompileError::io(msg, archive.to_path_buf());
        let file = std::fs::File::open(archive).map_err(|e| io_err(format!("cannot open archive: {e}")))?;
        let zip = zip::ZipArchive::new(file).map_err(|e| io_err(format!("invalid archive: {e}")))?;
        let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
        names.sort();
        for entry in names {
            if let Some(name) = qualified_name_of(&entry) {
                self.insert(name, SourceLocation::ArchiveEntry { archive: archive.to_path_buf(), entry });
            }
        }
        Ok(())
    }

    /// Looks a class up by qualified name, then by simple name.
    pub fn locate(&self, class: &str) -> Option<&SourceLocation> {
        self.classes
            .get(class)
            .or_else(|| self.simple.get(class).and_then(|q| self.classes.get(q)))
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Resolves classes through an [`ArchiveIndex`], parsing each file once.
pub struct ArchiveResolver {
    index: ArchiveIndex,
    units: HashMap<SourceLocation, (Rc<CompilationUnit>, Rc<str>)>,
}

impl ArchiveResolver {
    pub fn new(index: ArchiveIndex) -> Self {
        Self { index, units: HashMap::new() }
    }

    fn unit(&mut self, location: &SourceLocation) -> Result<(Rc<CompilationUnit>, Rc<str>), CompileError> {
        if let Some(cached) = self.units.get(location) {
            return Ok(cached.clone());
        }
        let text = location.read()?;
        debug!("parsing {location}");
        let unit = parse_source(&text).map_err(|e| CompileError::located(location.to_string(), text.clone(), e))?;
        let parsed = (Rc::new(unit), Rc::from(text));
        self.units.insert(location.clone(), parsed.clone());
        Ok(parsed)
    }
}

impl SourceResolver for ArchiveResolver {
    fn contains(&self, class: &str) -> bool {
        self.index.locate(class).is_some()
    }

    fn resolve(&mut self, class: &str) -> Result<ClassSource, CompileError> {
        let location = self.index.locate(class).cloned().ok_or_else(|| missing_class(class))?;
        let (unit, text) = self.unit(&location)?;
        let decl = unit
            .find_type(simple_name(class))
            .map(|t| t.node.clone())
            .ok_or_else(|| CompileError::resolution(format!("{location} does not declare class {class}")))?;
        Ok(ClassSource { decl, origin: SourceOrigin { path: location.to_string(), text } })
    }

    fn known_classes(&self) -> Vec<String> {
        self.index.class_names().map(str::to_string).collect()
    }
}

/// In-memory sources keyed by class name.
#[derive(Debug, Default, Clone)]
pub struct MemorySources {
    sources: BTreeMap<String, String>,
}

impl MemorySources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, class: impl Into<String>, source: impl Into<String>) -> Self {
        self.add(class, source);
        self
    }

    pub fn add(&mut self, class: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(class.into(), source.into());
    }
}

impl SourceResolver for MemorySources {
    fn contains(&self, class: &str) -> bool {
        self.sources.contains_key(class)
    }

    fn resolve(&mut self, class: &str) -> Result<ClassSource, CompileError> {
        let text = self.sources.get(class).ok_or_else(|| missing_class(class))?;
        let path = format!("{class}.java");
        let unit = parse_source(text).map_err(|e| CompileError::located(path.clone(), text.clone(), e))?;
        let decl = unit
            .find_type(simple_name(class))
            .map(|t| t.node.clone())
            .ok_or_else(|| CompileError::resolution(format!("{path} does not declare class {class}")))?;
        Ok(ClassSource { decl, origin: SourceOrigin { path, text: Rc::from(text.as_str()) } })
    }

    fn known_classes(&self) -> Vec<String> {
        self.sources.keys().cloned().collect()
    }
}
