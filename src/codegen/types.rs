//! Java type syntax to target type syntax.

use std::fmt;

use crate::diagnostics::CompileError;
use crate::parser::ast::{PrimitiveKind, TypeExpr};
use crate::span::Span;

/// A lowered type split into its base name and pointer depth, so that
/// declarator lists can repeat the indirection on every name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lowered {
    pub base: String,
    pub pointers: usize,
}

impl Lowered {
    fn new(base: impl Into<String>) -> Self {
        Self { base: base.into(), pointers: 0 }
    }

    pub fn with_extra(&self, extra: usize) -> Self {
        Self { base: self.base.clone(), pointers: self.pointers + extra }
    }

    pub fn stars(&self) -> String {
        "*".repeat(self.pointers)
    }
}

impl fmt::Display for Lowered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base, self.stars())
    }
}

fn primitive(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Boolean => "char",
        PrimitiveKind::Byte => "signed char",
        other => other.name(),
    }
}

pub fn lower_type(ty: &TypeExpr, span: Span) -> Result<Lowered, CompileError> {
    match ty {
        TypeExpr::Primitive(kind) => Ok(Lowered::new(primitive(*kind))),
        TypeExpr::Void => Ok(Lowered::new("void")),
        TypeExpr::Class { scope: Some(_), .. } => Err(CompileError::unsupported("Not support nested classes", span)),
        TypeExpr::Class { name, type_args, .. } if name == "String" && type_args.is_empty() => {
            Ok(Lowered { base: "char".to_string(), pointers: 1 })
        }
        TypeExpr::Class { name, type_args, .. } => {
            let mut mangled = name.clone();
            for arg in type_args {
                mangled.push('_');
                mangled.push_str(&mangle(arg, span)?);
            }
            Ok(Lowered::new(mangled))
        }
        TypeExpr::Array { elem, dims } => Ok(lower_type(elem, span)?.with_extra(*dims)),
        TypeExpr::Wildcard(_) => Err(CompileError::unsupported("Not support wildcard types", span)),
        TypeExpr::Union(_) => Err(CompileError::unsupported("Not support union types", span)),
        TypeExpr::Intersection(_) => Err(CompileError::unsupported("Not support intersection types", span)),
    }
}

/// Identifier-safe rendering of a type argument.
fn mangle(ty: &TypeExpr, span: Span) -> Result<String, CompileError> {
    match ty {
        TypeExpr::Array { elem, dims } => Ok(format!("{}{}", mangle(elem, span)?, "Array".repeat(*dims))),
        TypeExpr::Class { scope: None, name, type_args } => {
            let mut mangled = name.clone();
            for arg in type_args {
                mangled.push('_');
                mangled.push_str(&mangle(arg, span)?);
            }
            Ok(mangled)
        }
        TypeExpr::Primitive(kind) => Ok(kind.name().to_string()),
        other => lower_type(other, span).map(|l| l.base),
    }
}
