use crate::parser::ast::{PrimitiveKind, TypeExpr};

/// Classes that are never looked up in the archives or added to the closure.
pub const BUILTIN_CLASSES: &[&str] = &["String", "Object", "Math"];

pub fn is_builtin_class(name: &str) -> bool {
    BUILTIN_CLASSES.contains(&name)
}

/// The type of an expression or binding as far as the closure builder needs it.
///
/// `Unknown` is the placeholder for "not inferable yet" and matches anything
/// in signature equivalence. `Absent` means inference gave up on an
/// unsupported construct; it is never allowed into a signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JType {
    Primitive(PrimitiveKind),
    Void,
    Class { name: String, args: Vec<JType> },
    Array { elem: Box<JType>, dims: usize },
    Null,
    Unknown,
    Absent,
}

impl JType {
    pub fn class(name: impl Into<String>) -> Self {
        JType::Class { name: name.into(), args: Vec::new() }
    }

    pub fn string() -> Self {
        JType::class("String")
    }

    pub fn boolean() -> Self {
        JType::Primitive(PrimitiveKind::Boolean)
    }

    pub fn array_of(elem: JType, dims: usize) -> Self {
        if dims == 0 {
            return elem;
        }
        match elem {
            JType::Array { elem, dims: inner } => JType::Array { elem, dims: inner + dims },
            other => JType::Array { elem: Box::new(other), dims },
        }
    }

    /// Converts a declared type. Scoped class types keep only their last
    /// segment; wildcard, union and intersection types become `Absent`.
    pub fn from_ast(ty: &TypeExpr) -> JType {
        match ty {
            TypeExpr::Primitive(p) => JType::Primitive(*p),
            TypeExpr::Void => JType::Void,
            TypeExpr::Class { name, type_args, .. } => {
                let args: Vec<JType> = type_args.iter().map(JType::from_ast).collect();
                if args.iter().any(|a| *a == JType::Absent) {
                    return JType::Absent;
                }
                JType::Class { name: name.clone(), args }
            }
            TypeExpr::Array { elem, dims } => match JType::from_ast(elem) {
                JType::Absent => JType::Absent,
                elem => JType::array_of(elem, *dims),
            },
            TypeExpr::Wildcard(_) | TypeExpr::Union(_) | TypeExpr::Intersection(_) => JType::Absent,
        }
    }

    /// Type of `a[i]` for `a: self`.
    pub fn element(&self) -> Option<JType> {
        match self {
            JType::Array { elem, dims } if *dims > 1 => Some(JType::Array { elem: elem.clone(), dims: dims - 1 }),
            JType::Array { elem, .. } => Some((**elem).clone()),
            _ => None,
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            JType::Class { name, .. } => Some(name),
            _ => None,
        }
    }

    /// `Unknown` or `null`: matches any concrete type.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, JType::Unknown | JType::Null)
    }

    pub fn is_string(&self) -> bool {
        self.class_name() == Some("String")
    }

    /// Names of the non-builtin classes this type mentions, outermost first.
    pub fn referenced_classes(&self, out: &mut Vec<String>) {
        match self {
            JType::Class { name, args } => {
                if !is_builtin_class(name) {
                    out.push(name.clone());
                }
                for arg in args {
                    arg.referenced_classes(out);
                }
            }
            JType::Array { elem, .. } => elem.referenced_classes(out),
            _ => {}
        }
    }
}

impl std::fmt::Display for JType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JType::Primitive(p) => f.write_str(p.name()),
            JType::Void => f.write_str("void"),
            JType::Class { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                    write!(f, "<{}>", args.join(","))?;
                }
                Ok(())
            }
            JType::Array { elem, dims } => {
                write!(f, "{elem}")?;
                for _ in 0..*dims {
                    f.write_str("[]")?;
                }
                Ok(())
            }
            JType::Null => f.write_str("null"),
            JType::Unknown => f.write_str("?"),
            JType::Absent => f.write_str("<absent>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ast_folds_array_dims() {
        let ty = TypeExpr::array_of(TypeExpr::Primitive(PrimitiveKind::Int), 2);
        let j = JType::from_ast(&ty);
        assert_eq!(j.to_string(), "int[][]");
        assert_eq!(j.element().map(|e| e.to_string()), Some("int[]".to_string()));
        assert_eq!(j.element().and_then(|e| e.element()), Some(JType::Primitive(PrimitiveKind::Int)));
    }

    #[test]
    fn test_generic_display_has_no_spaces() {
        let ty = TypeExpr::Class {
            scope: None,
            name: "Map".into(),
            type_args: vec![TypeExpr::class("String"), TypeExpr::class("Integer")],
        };
        assert_eq!(JType::from_ast(&ty).to_string(), "Map<String,Integer>");
    }

    #[test]
    fn test_wildcard_is_absent() {
        let ty = TypeExpr::Class {
            scope: None,
            name: "List".into(),
            type_args: vec![TypeExpr::Wildcard(None)],
        };
        assert_eq!(JType::from_ast(&ty), JType::Absent);
    }

    #[test]
    fn test_referenced_classes_skip_builtins() {
        let ty = JType::Class { name: "Box".into(), args: vec![JType::string(), JType::class("Item")] };
        let mut out = Vec::new();
        JType::array_of(ty, 1).referenced_classes(&mut out);
        assert_eq!(out, vec!["Box".to_string(), "Item".to_string()]);
    }

    #[test]
    fn test_placeholders() {
        assert!(JType::Unknown.is_placeholder());
        assert!(JType::Null.is_placeholder());
        assert!(!JType::Absent.is_placeholder());
        assert!(!JType::class("Foo").is_placeholder());
    }
}
