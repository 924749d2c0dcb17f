//! Kernel selector configuration: which method to translate, plus per-variable
//! attributes consulted by code generation.
//!
//! Two file formats are accepted, chosen by extension:
//!
//! ```toml
//! kernel = "XMLTest.main"
//!
//! [variables.b]
//! length = "10,20"
//! ```
//!
//! ```xml
//! <kernel name="XMLTest.main">
//!   <variable><name>b</name><length>10,20</length></variable>
//! </kernel>
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::diagnostics::CompileError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableAttrs {
    /// Comma-separated fixed lengths, one per array dimension.
    pub length: Option<String>,
}

impl VariableAttrs {
    pub fn with_length(length: impl Into<String>) -> Self {
        Self { length: Some(length.into()) }
    }

    /// The length override split into one trimmed entry per dimension.
    pub fn length_override(&self) -> Result<Option<Vec<String>>, CompileError> {
        let Some(length) = &self.length else {
            return Ok(None);
        };
        let dims: Vec<String> = length.split(',').map(|d| d.trim().to_string()).collect();
        if dims.iter().any(String::is_empty) {
            return Err(CompileError::config(format!("Empty dimension in length attribute \"{length}\"")));
        }
        Ok(Some(dims))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelConfig {
    pub entry_class: String,
    pub kernel_method: String,
    pub variables: BTreeMap<String, VariableAttrs>,
}

// ---- TOML deserialization types ----

#[derive(Deserialize)]
struct TomlKernel {
    kernel: String,
    #[serde(default)]
    variables: BTreeMap<String, TomlVariable>,
}

#[derive(Deserialize)]
struct TomlVariable {
    length: Option<String>,
}

/// Splits `pkg.Class.method` at its last dot.
pub fn split_qualifier(qualifier: &str) -> Result<(String, String), CompileError> {
    let qualifier = qualifier.trim();
    match qualifier.rsplit_once('.') {
        Some((class, method)) if !class.is_empty() && !method.is_empty() => {
            Ok((class.to_string(), method.to_string()))
        }
        _ => Err(CompileError::config(format!(
            "Kernel qualifier \"{qualifier}\" must have the form Class.method"
        ))),
    }
}

impl KernelConfig {
    pub fn new(qualifier: &str) -> Result<Self, CompileError> {
        let (entry_class, kernel_method) = split_qualifier(qualifier)?;
        Ok(Self { entry_class, kernel_method, variables: BTreeMap::new() })
    }

    pub fn with_variable(mut self, name: impl Into<String>, attrs: VariableAttrs) -> Self {
        self.variables.insert(name.into(), attrs);
        self
    }

    pub fn variable(&self, name: &str) -> Option<&VariableAttrs> {
        self.variables.get(name)
    }

    /// Simple name of the entry class, without its package.
    pub fn entry_simple_name(&self) -> &str {
        self.entry_class.rsplit('.').next().unwrap_or(&self.entry_class)
    }

    /// Loads a `.toml` or `.xml` selector file.
    pub fn load(path: &Path) -> Result<Self, CompileError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CompileError::io(format!("cannot read configuration: {e}"), path.to_path_buf()))?;
        let parsed = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&text),
            Some("xml") => Self::from_xml_str(&text),
            _ => {
                return Err(CompileError::config_at(
                    "Unsupported configuration format, expected .toml or .xml",
                    path.to_path_buf(),
                ));
            }
        };
        parsed.map_err(|err| match err {
            CompileError::Config { msg, path: None } => CompileError::config_at(msg, path.to_path_buf()),
            other => other,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, CompileError> {
        let raw: TomlKernel =
            toml::from_str(text).map_err(|e| CompileError::config(format!("invalid kernel configuration: {e}")))?;
        let mut config = Self::new(&raw.kernel)?;
        for (name, var) in raw.variables {
            config.variables.insert(name, VariableAttrs { length: var.length });
        }
        Ok(config)
    }

    pub fn from_xml_str(text: &str) -> Result<Self, CompileError> {
        use quick_xml::Reader;
        use quick_xml::events::Event;

        let mut reader = Reader::from_str(text);
        let mut qualifier: Option<String> = None;
        let mut variables = BTreeMap::new();
        // Element names from the root down to the current element.
        let mut path: Vec<String> = Vec::new();
        let mut var_name: Option<String> = None;
        let mut attrs = VariableAttrs::default();

        loop {
            let event = reader
                .read_event()
                .map_err(|e| CompileError::config(format!("invalid kernel configuration: {e}")))?;
            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    if path.is_empty() {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"name" {
                                qualifier = Some(String::from_utf8_lossy(&attr.value).to_string());
                            }
                        }
                    }
                    if tag == "variable" && path.len() == 1 {
                        var_name = None;
                        attrs = VariableAttrs::default();
                    }
                    if matches!(event, Event::Start(_)) {
                        path.push(tag);
                    }
                }
                Event::Text(ref e) => {
                    let text = e
                        .unescape()
                        .map_err(|e| CompileError::config(format!("invalid kernel configuration: {e}")))?
                        .trim()
                        .to_string();
                    if text.is_empty() || path.len() != 3 || path[1] != "variable" {
                        continue;
                    }
                    match path[2].as_str() {
                        "name" => var_name = Some(text),
                        "length" => attrs.length = Some(text),
                        other => warn!("ignoring unknown variable attribute <{other}>"),
                    }
                }
                Event::End(_) => {
                    if path.len() == 2 && path[1] == "variable" {
                        let Some(name) = var_name.take() else {
                            return Err(CompileError::config("Variable entry without a <name>"));
                        };
                        variables.insert(name, std::mem::take(&mut attrs));
                    }
                    path.pop();
                }
                Event::Eof => break,
                _ => {}
            }
        }

        let Some(qualifier) = qualifier else {
            return Err(CompileError::config("Missing kernel name attribute on the root element"));
        };
        let mut config = Self::new(&qualifier)?;
        config.variables = variables;
        Ok(config)
    }
}
