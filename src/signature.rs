use crate::diagnostics::CompileError;
use crate::parser::ast::{Expr, MethodDecl};
use crate::span::Spanned;
use crate::typeck::types::JType;

pub const SEPARATOR: char = '-';
/// Token of a type that could not be inferred yet.
pub const UNKNOWN_TOKEN: &str = "?";
/// Token of the `null` literal's type.
pub const NULL_TOKEN: &str = "null";

fn is_wildcard(token: &str) -> bool {
    token == UNKNOWN_TOKEN || token == NULL_TOKEN
}

/// Canonical method identity: the member name followed by one type token per
/// parameter, written `name-T1-T2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature {
    name: String,
    params: Vec<String>,
}

impl Signature {
    pub fn new(name: impl Into<String>, params: Vec<String>) -> Self {
        Self { name: name.into(), params }
    }

    /// Builds a signature from parameter or argument types. An `Absent`
    /// type cannot appear in a signature.
    pub fn from_types(name: impl Into<String>, types: &[JType]) -> Self {
        Self::new(name, types.iter().map(|t| t.to_string()).collect())
    }

    /// Signature of a call site from the inferred argument types.
    pub fn for_call(name: &str, args: &[Spanned<Expr>], types: &[JType]) -> Result<Self, CompileError> {
        for (arg, ty) in args.iter().zip(types) {
            if *ty == JType::Absent {
                return Err(CompileError::inference(
                    format!("Cannot infer type for {}", arg.node.describe()),
                    arg.span,
                ));
            }
        }
        Ok(Self::from_types(name, types))
    }

    /// Signature of a declaration from its declared parameter types.
    pub fn for_decl(name: &str, decl: &MethodDecl) -> Self {
        let types: Vec<JType> = decl.params.iter().map(|p| JType::from_ast(&p.full_type())).collect();
        Self::from_types(name, &types)
    }

    /// Parses the `name-T1-T2` form.
    pub fn parse(text: &str) -> Self {
        let mut parts = text.split(SEPARATOR);
        let name = parts.next().unwrap_or_default().to_string();
        Self { name, params: parts.map(str::to_string).collect() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Position-wise match where a wildcard on either side matches anything.
    /// Names must be equal and arities must agree.
    pub fn equivalent(&self, other: &Signature) -> bool {
        self.name == other.name
            && self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(&other.params)
                .all(|(a, b)| a == b || is_wildcard(a) || is_wildcard(b))
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)?;
        for p in &self.params {
            write!(f, "{SEPARATOR}{p}")?;
        }
        Ok(())
    }
}
