use tracing::{error, warn};

use super::env::{BindingOrigin, TypeEnv};
use super::types::{JType, is_builtin_class};
use crate::diagnostics::CompileError;
use crate::model::{FieldLookup, MethodState, Workspace};
use crate::parser::ast::*;
use crate::signature::Signature;
use crate::span::{Span, Spanned};

/// The class and environment an expression is evaluated in.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub class: &'a str,
    pub env: &'a TypeEnv,
}

/// What a bare identifier refers to.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NameRef {
    Binding { ty: JType, origin: BindingOrigin },
    InheritedField { owner: String, ty: JType },
    ClassName(String),
}

pub(crate) fn classify_name(ws: &Workspace, scope: Scope<'_>, name: &str) -> NameRef {
    if let Some(binding) = scope.env.lookup(name) {
        return NameRef::Binding { ty: binding.ty.clone(), origin: binding.origin };
    }
    match ws.find_field_owner(scope.class, name) {
        Some((owner, ty)) => NameRef::InheritedField { owner, ty },
        None => NameRef::ClassName(name.to_string()),
    }
}

/// Infers the type of `expr`. Field reads register the field on the class
/// that declares it.
pub(crate) fn infer_expr(ws: &mut Workspace, scope: Scope<'_>, expr: &Spanned<Expr>) -> Result<JType, CompileError> {
    match &expr.node {
        Expr::Literal { kind, .. } => Ok(match kind {
            LiteralKind::Int => JType::Primitive(PrimitiveKind::Int),
            LiteralKind::Long => JType::Primitive(PrimitiveKind::Long),
            LiteralKind::Float => JType::Primitive(PrimitiveKind::Float),
            LiteralKind::Double => JType::Primitive(PrimitiveKind::Double),
            LiteralKind::Char => JType::Primitive(PrimitiveKind::Char),
            LiteralKind::Boolean => JType::boolean(),
            LiteralKind::String => JType::string(),
            LiteralKind::Null => JType::Null,
        }),
        Expr::Name(name) => infer_name(ws, scope, name),
        Expr::FieldAccess { object, field } => infer_field_access(ws, scope, object, &field.node),
        Expr::ArrayAccess { array, index } => {
            infer_expr(ws, scope, index)?;
            let ty = infer_expr(ws, scope, array)?;
            Ok(match ty {
                JType::Absent => JType::Absent,
                other => other.element().unwrap_or(JType::Unknown),
            })
        }
        Expr::MethodCall { scope: call_scope, name, args } => {
            infer_method_call(ws, scope, call_scope.as_deref(), name, args)
        }
        Expr::ObjectCreation { ty, .. } | Expr::Cast { ty, .. } => Ok(JType::from_ast(&ty.node)),
        Expr::ArrayCreation { elem, dims, extra_dims, .. } => {
            Ok(JType::array_of(JType::from_ast(&elem.node), dims.len() + extra_dims))
        }
        Expr::ArrayInit(_) => Ok(JType::Unknown),
        Expr::Assign { .. } => Ok(JType::Void),
        Expr::Conditional { .. } | Expr::InstanceOf { .. } => Ok(JType::boolean()),
        Expr::Binary { op, lhs, rhs } => infer_binop(ws, scope, *op, lhs, rhs, expr.span),
        Expr::Unary { op, operand } => {
            let ty = infer_expr(ws, scope, operand)?;
            Ok(if *op == UnaryOp::Not { JType::boolean() } else { ty })
        }
        Expr::Enclosed(inner) => infer_expr(ws, scope, inner),
        Expr::This(None) => Ok(JType::class(scope.class)),
        Expr::This(Some(q)) | Expr::Super(Some(q)) => Ok(JType::class(q.as_str())),
        Expr::Super(None) => Ok(ws
            .resolved(scope.class)
            .and_then(|r| r.base.clone())
            .map(JType::class)
            .unwrap_or(JType::Unknown)),
        Expr::ClassLit(_) | Expr::Lambda { .. } | Expr::MethodRef { .. } => {
            warn!("cannot infer a type for {}", expr.node.describe());
            Ok(JType::Absent)
        }
    }
}

fn infer_name(ws: &mut Workspace, scope: Scope<'_>, name: &str) -> Result<JType, CompileError> {
    match classify_name(ws, scope, name) {
        NameRef::Binding { ty, origin: BindingOrigin::Field } => {
            ws.request_field(scope.class, name)?;
            Ok(ty)
        }
        NameRef::Binding { ty, .. } => Ok(ty),
        NameRef::InheritedField { owner, .. } => match ws.request_field(&owner, name)? {
            FieldLookup::Found { ty, .. } => Ok(ty),
            _ => Ok(JType::Unknown),
        },
        NameRef::ClassName(_) => {
            error!("no binding for {name} in class {}", scope.class);
            Ok(JType::Absent)
        }
    }
}

fn infer_field_access(
    ws: &mut Workspace,
    scope: Scope<'_>,
    object: &Spanned<Expr>,
    field: &str,
) -> Result<JType, CompileError> {
    let owner_ty = match &object.node {
        Expr::This(None) => JType::class(scope.class),
        Expr::Name(name) => match classify_name(ws, scope, name) {
            NameRef::ClassName(class) => {
                ws.get_or_add_class(&class);
                JType::class(class)
            }
            _ => infer_expr(ws, scope, object)?,
        },
        _ => infer_expr(ws, scope, object)?,
    };
    match owner_ty {
        JType::Array { .. } if field == "length" => Ok(JType::Primitive(PrimitiveKind::Int)),
        JType::Class { name, .. } if !is_builtin_class(&name) => {
            ws.get_or_add_class(&name);
            match ws.request_field(&name, field)? {
                FieldLookup::Found { ty, .. } => Ok(ty),
                FieldLookup::Deferred | FieldLookup::Ignored => Ok(JType::Unknown),
            }
        }
        JType::Absent => Ok(JType::Absent),
        _ => Ok(JType::Unknown),
    }
}

const PROMOTION_LADDER: [PrimitiveKind; 4] =
    [PrimitiveKind::Double, PrimitiveKind::Float, PrimitiveKind::Long, PrimitiveKind::Int];

fn infer_binop(
    ws: &mut Workspace,
    scope: Scope<'_>,
    op: BinOp,
    lhs: &Spanned<Expr>,
    rhs: &Spanned<Expr>,
    span: Span,
) -> Result<JType, CompileError> {
    let lt = infer_expr(ws, scope, lhs)?;
    let rt = infer_expr(ws, scope, rhs)?;
    if op.is_boolean() {
        return Ok(JType::boolean());
    }
    if lt == JType::Absent || rt == JType::Absent {
        return Ok(JType::Absent);
    }
    if op == BinOp::Add && (lt.is_string() || rt.is_string()) {
        return Ok(JType::string());
    }
    if lt == rt {
        return Ok(lt);
    }
    for rung in PROMOTION_LADDER {
        let ty = JType::Primitive(rung);
        if lt == ty || rt == ty {
            return Ok(ty);
        }
    }
    if lt.is_placeholder() || rt.is_placeholder() {
        return Ok(JType::Unknown);
    }
    if let (JType::Class { .. }, JType::Class { .. }) = (&lt, &rt) {
        return Err(CompileError::inference("Not support operator overloading for classes", span));
    }
    // byte, short and char mixes promote to int.
    if matches!(lt, JType::Primitive(_)) && matches!(rt, JType::Primitive(_)) {
        return Ok(JType::Primitive(PrimitiveKind::Int));
    }
    Ok(JType::Unknown)
}

/// The class a call is dispatched to, or `None` for builtin receivers.
pub(crate) fn call_target(
    ws: &mut Workspace,
    scope: Scope<'_>,
    call_scope: Option<&Spanned<Expr>>,
    method: &Spanned<String>,
) -> Result<Option<String>, CompileError> {
    let mut root = call_scope;
    while let Some(Spanned { node: Expr::MethodCall { scope: inner, .. }, .. }) = root {
        root = inner.as_deref();
    }
    let ty = match root.map(|r| (&r.node, r)) {
        None | Some((Expr::This(None), _)) => return Ok(Some(scope.class.to_string())),
        Some((Expr::This(Some(q)), _)) => return Ok(Some(q.clone())),
        Some((Expr::Super(_), _)) => {
            let base = ws.resolved(scope.class).and_then(|r| r.base.clone());
            return Ok(base);
        }
        Some((Expr::Name(name), _)) => match classify_name(ws, scope, name) {
            NameRef::Binding { ty, origin: BindingOrigin::Field } => {
                ws.request_field(scope.class, name)?;
                ty
            }
            NameRef::Binding { ty, .. } => ty,
            NameRef::InheritedField { owner, ty } => {
                ws.request_field(&owner, name)?;
                ty
            }
            NameRef::ClassName(class) => JType::class(class),
        },
        Some((_, expr)) => infer_expr(ws, scope, expr)?,
    };
    match ty {
        JType::Class { name, .. } if is_builtin_class(&name) => Ok(None),
        JType::Class { name, .. } => Ok(Some(name)),
        _ => Err(CompileError::inference(
            format!("Cannot determine call target for {}", method.node),
            method.span,
        )),
    }
}

fn infer_method_call(
    ws: &mut Workspace,
    scope: Scope<'_>,
    call_scope: Option<&Spanned<Expr>>,
    name: &Spanned<String>,
    args: &[Spanned<Expr>],
) -> Result<JType, CompileError> {
    let Some(target) = call_target(ws, scope, call_scope, name)? else {
        return Ok(JType::Unknown);
    };
    let mut arg_types = Vec::with_capacity(args.len());
    for arg in args {
        arg_types.push(infer_expr(ws, scope, arg)?);
    }
    let sig = Signature::for_call(&name.node, args, &arg_types)?;
    if ws.resolved(&target).is_none() {
        return Ok(JType::Unknown);
    }
    match ws.find_method(&target, &sig) {
        Some((_, method)) if method.is_constructor => Ok(JType::Unknown),
        Some((class, method)) => match &method.state {
            MethodState::Resolved { .. } => Ok(class
                .method_decl(method)
                .map(|d| JType::from_ast(&d.return_type.node.with_extra_dims(d.extra_dims)))
                .unwrap_or(JType::Unknown)),
            _ => Ok(JType::Unknown),
        },
        None => Err(CompileError::resolution(format!("Cannot find method {sig} from {target}"))),
    }
}
