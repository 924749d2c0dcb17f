use crate::span::Span;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Syntax error: {msg}")]
    Syntax { msg: String, span: Span },

    /// A referenced class, method or field cannot be located.
    #[error("Resolution error: {msg}")]
    Resolution { msg: String },

    #[error("Inference error: {msg}")]
    Inference { msg: String, span: Span },

    /// The input uses a construct outside the translatable subset.
    #[error("Unsupported construct: {msg}")]
    Unsupported { msg: String, span: Span },

    #[error("Configuration error: {msg}")]
    Config { msg: String, path: Option<PathBuf> },

    #[error("I/O error: {msg}")]
    Io { msg: String, path: PathBuf },

    /// An error raised while reading one particular source file.
    #[error("{path}: {inner}")]
    Located {
        path: String,
        source_text: String,
        inner: Box<CompileError>,
    },
}

impl CompileError {
    pub fn syntax(msg: impl Into<String>, span: Span) -> Self {
        Self::Syntax { msg: msg.into(), span }
    }

    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution { msg: msg.into() }
    }

    pub fn inference(msg: impl Into<String>, span: Span) -> Self {
        Self::Inference { msg: msg.into(), span }
    }

    pub fn unsupported(msg: impl Into<String>, span: Span) -> Self {
        Self::Unsupported { msg: msg.into(), span }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config { msg: msg.into(), path: None }
    }

    pub fn config_at(msg: impl Into<String>, path: PathBuf) -> Self {
        Self::Config { msg: msg.into(), path: Some(path) }
    }

    pub fn io(msg: impl Into<String>, path: PathBuf) -> Self {
        Self::Io { msg: msg.into(), path }
    }

    pub fn located(path: impl Into<String>, source_text: impl Into<String>, inner: CompileError) -> Self {
        Self::Located {
            path: path.into(),
            source_text: source_text.into(),
            inner: Box::new(inner),
        }
    }

    /// Short category name used in CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            CompileError::Syntax { .. } => "syntax",
            CompileError::Resolution { .. } => "resolution",
            CompileError::Inference { .. } => "inference",
            CompileError::Unsupported { .. } => "unsupported",
            CompileError::Config { .. } => "config",
            CompileError::Io { .. } => "io",
            CompileError::Located { inner, .. } => inner.kind(),
        }
    }

    /// Source span of errors raised against a particular file.
    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::Syntax { span, .. }
            | CompileError::Inference { span, .. }
            | CompileError::Unsupported { span, .. } => Some(*span),
            _ => None,
        }
    }

    /// The message without its category prefix.
    pub fn message(&self) -> &str {
        match self {
            CompileError::Syntax { msg, .. }
            | CompileError::Resolution { msg }
            | CompileError::Inference { msg, .. }
            | CompileError::Unsupported { msg, .. }
            | CompileError::Config { msg, .. }
            | CompileError::Io { msg, .. } => msg,
            CompileError::Located { inner, .. } => inner.message(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    DroppedThrow,
    DroppedCatch,
    DroppedThrows,
    IgnoredAnnotation,
}

/// A non-fatal diagnostic: the construct is dropped and translation continues.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileWarning {
    pub kind: WarningKind,
    pub msg: String,
    pub span: Span,
}

/// Render a CompileError with ariadne for nice terminal output.
pub fn render_error(err: &CompileError) {
    use ariadne::{Label, Report, ReportKind, Source};

    match err {
        CompileError::Located { path, source_text, inner } => match inner.as_ref() {
            CompileError::Syntax { msg, span }
            | CompileError::Inference { msg, span }
            | CompileError::Unsupported { msg, span } => {
                eprintln!("error[{}]: in {path}", inner.kind());
                let printed = Report::build(ReportKind::Error, (), span.start)
                    .with_message(format!("{} error", inner.kind()))
                    .with_label(Label::new(span.start..span.end).with_message(msg))
                    .finish()
                    .eprint(Source::from(source_text.as_str()));
                if printed.is_err() {
                    eprintln!("error: {msg}");
                }
            }
            other => {
                eprintln!("error[{}]: {}", other.kind(), other.message());
                eprintln!("  --> {path}");
            }
        },
        CompileError::Config { msg, path: Some(path) } | CompileError::Io { msg, path } => {
            eprintln!("error[{}]: {msg}", err.kind());
            eprintln!("  --> {}", path.display());
        }
        other => {
            eprintln!("error[{}]: {}", other.kind(), other.message());
        }
    }
}
