use crate::diagnostics::CompileError;
use crate::model::Workspace;
use crate::parser::ast::*;
use crate::signature::Signature;
use crate::span::{Span, Spanned};
use crate::typeck::env::TypeEnv;
use crate::typeck::infer::{Scope, call_target, infer_expr};
use crate::typeck::types::{JType, is_builtin_class};
use crate::visit::{VisitResult, Visitor, walk_expr, walk_stmt};

/// Records every class, field and callable a body refers to.
pub(crate) struct BodyTraversal<'a> {
    pub ws: &'a mut Workspace,
    pub class: &'a str,
    pub env: &'a TypeEnv,
}

impl<'a> BodyTraversal<'a> {
    fn scope(&self) -> Scope<'a> {
        Scope { class: self.class, env: self.env }
    }

    fn arg_types(&mut self, args: &[Spanned<Expr>]) -> Result<Vec<JType>, CompileError> {
        let scope = self.scope();
        args.iter().map(|a| infer_expr(self.ws, scope, a)).collect()
    }

    fn register_call(
        &mut self,
        call_scope: Option<&Spanned<Expr>>,
        name: &Spanned<String>,
        args: &[Spanned<Expr>],
    ) -> VisitResult {
        let scope = self.scope();
        let Some(target) = call_target(self.ws, scope, call_scope, name)? else {
            return Ok(());
        };
        let types = self.arg_types(args)?;
        let sig = Signature::for_call(&name.node, args, &types)?;
        self.ws.get_or_add_class(&target);
        self.ws.request_method(&target, sig, false);
        Ok(())
    }

    fn register_constructor(&mut self, class: &str, args: &[Spanned<Expr>]) -> VisitResult {
        if is_builtin_class(class) {
            return Ok(());
        }
        let types = self.arg_types(args)?;
        let sig = Signature::for_call(class, args, &types)?;
        self.ws.get_or_add_class(class);
        self.ws.request_method(class, sig, true);
        Ok(())
    }

    fn explicit_constructor_call(
        &mut self,
        is_this: bool,
        qualifier: Option<&Spanned<Expr>>,
        args: &[Spanned<Expr>],
        span: Span,
    ) -> VisitResult {
        if qualifier.is_some() {
            return Err(CompileError::unsupported("Not support multiple inheritance", span));
        }
        for arg in args {
            self.visit_expr(arg)?;
        }
        let target = if is_this {
            self.class.to_string()
        } else {
            match self.ws.resolved(self.class).and_then(|r| r.base.clone()) {
                Some(base) => base,
                None if args.is_empty() => return Ok(()),
                None => {
                    return Err(CompileError::resolution(format!(
                        "Cannot find base class of {} for super constructor call",
                        self.class
                    )));
                }
            }
        };
        self.register_constructor(&target, args)
    }
}

impl Visitor for BodyTraversal<'_> {
    fn visit_stmt(&mut self, stmt: &Spanned<Stmt>) -> VisitResult {
        match &stmt.node {
            Stmt::ExplicitCtorCall { is_this, qualifier, args } => {
                self.explicit_constructor_call(*is_this, qualifier.as_ref(), args, stmt.span)
            }
            // Thrown values are dropped at emission.
            Stmt::Throw(_) => Ok(()),
            // So are catch clauses.
            Stmt::Try { resources, body, finally, .. } => {
                for r in resources {
                    self.visit_local_var(r)?;
                }
                self.visit_block(&body.node)?;
                match finally {
                    Some(finally) => self.visit_block(&finally.node),
                    None => Ok(()),
                }
            }
            _ => walk_stmt(self, stmt),
        }
    }

    fn visit_expr(&mut self, expr: &Spanned<Expr>) -> VisitResult {
        match &expr.node {
            Expr::MethodCall { scope, name, args } => {
                // The receiver is visited unless it is a bare name, which the
                // call-target lookup handles as a variable, field or class.
                if let Some(scope) = scope {
                    if !matches!(scope.node, Expr::Name(_)) {
                        self.visit_expr(scope)?;
                    }
                }
                for arg in args {
                    self.visit_expr(arg)?;
                }
                self.register_call(scope.as_deref(), name, args)
            }
            Expr::ObjectCreation { ty, args, .. } => {
                walk_expr(self, expr)?;
                match JType::from_ast(&ty.node) {
                    JType::Class { name, .. } => self.register_constructor(&name, args),
                    _ => Ok(()),
                }
            }
            Expr::FieldAccess { object, .. } => {
                if !matches!(object.node, Expr::Name(_) | Expr::This(_) | Expr::Super(_)) {
                    self.visit_expr(object)?;
                }
                let scope = self.scope();
                infer_expr(self.ws, scope, expr)?;
                Ok(())
            }
            Expr::Name(_) => {
                let scope = self.scope();
                infer_expr(self.ws, scope, expr)?;
                Ok(())
            }
            _ => walk_expr(self, expr),
        }
    }

    fn visit_type(&mut self, ty: &Spanned<TypeExpr>) -> VisitResult {
        self.ws.add_type(&JType::from_ast(&ty.node));
        Ok(())
    }
}

/// Traverses one method or constructor body, including its signature types.
pub(crate) fn traverse_callable(
    ws: &mut Workspace,
    class: &str,
    method: &MethodDecl,
    env: &TypeEnv,
) -> VisitResult {
    let mut t = BodyTraversal { ws, class, env };
    for param in &method.params {
        t.visit_type(&param.ty)?;
    }
    t.visit_type(&method.return_type)?;
    if let Some(body) = &method.body {
        t.visit_block(&body.node)?;
    }
    Ok(())
}

/// Traverses a field initializer in the class-level environment.
pub(crate) fn traverse_initializer(ws: &mut Workspace, class: &str, env: &TypeEnv, init: &Spanned<Expr>) -> VisitResult {
    BodyTraversal { ws, class, env }.visit_expr(init)
}
