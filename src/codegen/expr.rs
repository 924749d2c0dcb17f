use super::{Emitter, lower_type};
use crate::diagnostics::CompileError;
use crate::parser::ast::{AssignOp, BinOp, Expr, LiteralKind, TypeExpr};
use crate::span::{Span, Spanned};
use crate::typeck::types::{JType, is_builtin_class};

fn strip_digit_separators(text: &str) -> String {
    text.chars().filter(|c| *c != '_').collect()
}

/// Appends `.0` to a decimal floating literal written without a fraction or
/// exponent, so that `2D` stays floating point once its suffix is gone.
fn ensure_fraction(mut digits: String) -> String {
    let hex = digits.starts_with("0x") || digits.starts_with("0X");
    if !hex && !digits.contains(['.', 'e', 'E']) {
        digits.push_str(".0");
    }
    digits
}

pub(super) fn literal(kind: LiteralKind, text: &str) -> String {
    match kind {
        LiteralKind::Null => "NULL".to_string(),
        LiteralKind::Int | LiteralKind::Long => strip_digit_separators(text),
        LiteralKind::Double => {
            let digits = strip_digit_separators(text);
            let digits = digits.strip_suffix(['d', 'D']).unwrap_or(&digits).to_string();
            ensure_fraction(digits)
        }
        LiteralKind::Float => {
            let digits = strip_digit_separators(text);
            match digits.strip_suffix(['f', 'F']) {
                Some(body) => format!("{}f", ensure_fraction(body.to_string())),
                None => digits,
            }
        }
        LiteralKind::Char | LiteralKind::String | LiteralKind::Boolean => text.to_string(),
    }
}

fn math_constant(name: &str) -> String {
    match name {
        "PI" => "M_PI".to_string(),
        "E" => "M_E".to_string(),
        other => other.to_string(),
    }
}

impl Emitter<'_> {
    pub(super) fn arguments(&mut self, args: &[Spanned<Expr>]) -> Result<Vec<String>, CompileError> {
        args.iter().map(|a| self.expr(a)).collect()
    }

    /// Lowers an initializer or assigned value. `target` names the variable
    /// receiving it, which selects the array length override.
    pub(super) fn initializer(&mut self, expr: &Spanned<Expr>, target: Option<&str>) -> Result<String, CompileError> {
        match &expr.node {
            Expr::ArrayCreation { elem, dims, extra_dims, init } => {
                self.array_creation(elem, dims, *extra_dims, init.as_deref(), target)
            }
            _ => self.expr(expr),
        }
    }

    /// True for a bare name that denotes a class rather than a variable.
    fn is_class_name(&self, name: &str) -> bool {
        self.env.lookup(name).is_none()
            && (is_builtin_class(name) || name == self.ws.entry() || self.ws.class(name).is_some())
    }

    /// Whether an unqualified call named `name` lands on a flattened
    /// function of the entry class.
    fn calls_flattened(&self, name: &str) -> bool {
        self.is_entry && self.class.decl.methods().any(|(_, m)| m.name.node == name)
    }

    pub(super) fn expr(&mut self, expr: &Spanned<Expr>) -> Result<String, CompileError> {
        let span = expr.span;
        Ok(match &expr.node {
            Expr::Literal { kind, text } => literal(*kind, text),
            Expr::Name(name) => name.clone(),
            Expr::FieldAccess { object, field } => self.field_access(object, &field.node, span)?,
            Expr::ArrayAccess { array, index } => format!("{}[{}]", self.expr(array)?, self.expr(index)?),
            Expr::MethodCall { scope, name, args } => self.call(scope.as_deref(), &name.node, args, span)?,
            Expr::ObjectCreation { ty, args, body } => {
                if body.is_some() {
                    return Err(CompileError::unsupported("Not support anonymous classes", span));
                }
                let ty = lower_type(&ty.node, ty.span)?;
                format!("new {ty}({})", self.arguments(args)?.join(", "))
            }
            Expr::ArrayCreation { elem, dims, extra_dims, init } => {
                self.array_creation(elem, dims, *extra_dims, init.as_deref(), None)?
            }
            Expr::ArrayInit(items) => self.array_init(items)?,
            Expr::Assign { op, target, value } => {
                let receiver = match &target.node {
                    Expr::Name(name) => Some(name.as_str()),
                    Expr::FieldAccess { object, field } if matches!(object.node, Expr::This(None)) => {
                        Some(field.node.as_str())
                    }
                    _ => None,
                };
                let op = match op {
                    AssignOp::UShr => ">>=",
                    other => other.as_str(),
                };
                let target = self.expr(target)?;
                format!("{target} {op} {}", self.initializer(value, receiver)?)
            }
            Expr::Binary { op, lhs, rhs } => {
                let op = match op {
                    BinOp::UShr => ">>",
                    other => other.as_str(),
                };
                format!("{} {op} {}", self.expr(lhs)?, self.expr(rhs)?)
            }
            Expr::Unary { op, operand } if op.is_postfix() => format!("{}{}", self.expr(operand)?, op.as_str()),
            Expr::Unary { op, operand } => {
                let op = op.as_str();
                let operand = self.expr(operand)?;
                // `- -x` must not fuse into a decrement.
                let sep = match op.chars().last() {
                    Some(sign @ ('+' | '-')) if operand.starts_with(sign) => " ",
                    _ => "",
                };
                format!("{op}{sep}{operand}")
            }
            Expr::Cast { ty, expr } => {
                let ty = lower_type(&ty.node, ty.span)?;
                format!("({ty}) {}", self.expr(expr)?)
            }
            Expr::Conditional { condition, then_expr, else_expr } => format!(
                "{} ? {} : {}",
                self.expr(condition)?,
                self.expr(then_expr)?,
                self.expr(else_expr)?
            ),
            Expr::Enclosed(inner) => format!("({})", self.expr(inner)?),
            Expr::This(None) => "this".to_string(),
            Expr::This(Some(_)) | Expr::Super(Some(_)) => {
                return Err(CompileError::unsupported("Not support qualified this or super", span));
            }
            Expr::Super(None) => return Err(CompileError::unsupported("Not support super expressions", span)),
            Expr::InstanceOf { .. } => {
                return Err(CompileError::unsupported("Not support instanceof expressions", span));
            }
            Expr::ClassLit(_) => return Err(CompileError::unsupported("Not support class expression", span)),
            Expr::Lambda { .. } => return Err(CompileError::unsupported("Not support lambda expressions", span)),
            Expr::MethodRef { .. } => return Err(CompileError::unsupported("Not support method references", span)),
        })
    }

    fn field_access(&mut self, object: &Spanned<Expr>, field: &str, span: Span) -> Result<String, CompileError> {
        match &object.node {
            Expr::This(None) | Expr::Super(None) if self.is_entry => Ok(field.to_string()),
            Expr::This(None) | Expr::Super(None) => Ok(format!("this->{field}")),
            Expr::Name(class) if self.is_class_name(class) => Ok(if class == "Math" {
                math_constant(field)
            } else if self.is_entry && class == self.ws.entry() {
                field.to_string()
            } else {
                format!("{class}::{field}")
            }),
            _ if field == "length" => match self.array_length(object, span)? {
                Some(length) => Ok(length),
                None => Ok(format!("{}.{field}", self.expr(object)?)),
            },
            _ => Ok(format!("{}.{field}", self.expr(object)?)),
        }
    }

    /// `a.length` or `a[i].length` on a local array: the configured length of
    /// the matching dimension. Returns `None` when `object` is not an array
    /// variable.
    fn array_length(&mut self, object: &Spanned<Expr>, span: Span) -> Result<Option<String>, CompileError> {
        let mut depth = 0;
        let mut root = object;
        while let Expr::ArrayAccess { array, .. } = &root.node {
            depth += 1;
            root = array;
        }
        let name = match &root.node {
            Expr::Name(name) => name.as_str(),
            Expr::FieldAccess { object, field } if matches!(object.node, Expr::This(None)) => field.node.as_str(),
            _ => return Ok(None),
        };
        if !matches!(self.env.lookup_type(name), Some(JType::Array { .. })) {
            return Ok(None);
        }
        let dims = match self.config.variable(name) {
            Some(attrs) => attrs.length_override()?,
            None => None,
        };
        match dims.and_then(|d| d.get(depth).cloned()) {
            Some(length) => Ok(Some(length)),
            None => Err(CompileError::unsupported(
                format!("Cannot determine the length of array {name} without a length attribute"),
                span,
            )),
        }
    }

    fn call(
        &mut self,
        scope: Option<&Spanned<Expr>>,
        name: &str,
        args: &[Spanned<Expr>],
        span: Span,
    ) -> Result<String, CompileError> {
        let mut rendered = self.arguments(args)?;
        let flatten = |this: &Self, rendered: &mut Vec<String>| {
            rendered.extend(this.flattened_fields().into_iter().map(str::to_string));
        };
        let callee = match scope.map(|s| &s.node) {
            None | Some(Expr::This(None)) if self.is_entry => {
                if self.calls_flattened(name) {
                    flatten(self, &mut rendered);
                }
                name.to_string()
            }
            None => name.to_string(),
            Some(Expr::This(None)) => format!("this->{name}"),
            Some(Expr::Super(None)) => match self.class.decl.extends.first() {
                Some(base) => format!("{}::{name}", lower_type(&base.node, base.span)?.base),
                None => {
                    return Err(CompileError::resolution(format!(
                        "Cannot find base class of {} for super.{name}",
                        self.class.decl.name.node
                    )));
                }
            },
            Some(Expr::Name(class)) if self.is_class_name(class) => {
                if class == "Math" {
                    name.to_string()
                } else if self.is_entry && class == self.ws.entry() {
                    if self.calls_flattened(name) {
                        flatten(self, &mut rendered);
                    }
                    name.to_string()
                } else {
                    format!("{class}::{name}")
                }
            }
            Some(Expr::This(Some(_)) | Expr::Super(Some(_))) => {
                return Err(CompileError::unsupported("Not support qualified this or super", span));
            }
            Some(_) => {
                let receiver = scope.map(|s| self.expr(s)).transpose()?.unwrap_or_default();
                format!("{receiver}.{name}")
            }
        };
        Ok(format!("{callee}({})", rendered.join(", ")))
    }

    fn array_init(&mut self, items: &[Spanned<Expr>]) -> Result<String, CompileError> {
        if items.is_empty() {
            return Ok("{}".to_string());
        }
        Ok(format!("{{ {} }}", self.arguments(items)?.join(", ")))
    }

    /// `new T[d1][d2]`, with the dimensions replaced by the length override
    /// configured for `target` when there is one.
    fn array_creation(
        &mut self,
        elem: &Spanned<TypeExpr>,
        dims: &[Spanned<Expr>],
        extra_dims: usize,
        init: Option<&[Spanned<Expr>]>,
        target: Option<&str>,
    ) -> Result<String, CompileError> {
        let elem_ty = lower_type(&elem.node, elem.span)?;
        let mut sizes = self.arguments(dims)?;
        if let Some(name) = target {
            let lengths = match self.config.variable(name) {
                Some(attrs) => attrs.length_override()?,
                None => None,
            };
            if let Some(lengths) = lengths {
                if lengths.len() != dims.len() {
                    return Err(CompileError::config(format!("Dimension mismatch for array variable {name}")));
                }
                sizes = lengths;
            }
        }
        match init {
            // `new T[][] {..}`: the element count fills the first dimension.
            Some(items) if sizes.is_empty() => {
                let ty = elem_ty.with_extra(extra_dims.saturating_sub(1));
                Ok(format!("new {ty}[{}]{}", items.len(), self.array_init(items)?))
            }
            _ => {
                let mut text = format!("new {}", elem_ty.with_extra(extra_dims));
                for size in &sizes {
                    text.push_str(&format!("[{size}]"));
                }
                if let Some(items) = init {
                    text.push_str(&self.array_init(items)?);
                }
                Ok(text)
            }
        }
    }
}
