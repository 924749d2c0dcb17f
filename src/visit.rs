//! Fallible read-only AST walker.
//!
//! Implement [`Visitor`] and override only the hooks a pass cares about. Call
//! the matching `walk_*` function inside an override to keep the default
//! recursion; omit it to prune the subtree.
//!
//! The walk never enters lambda bodies, anonymous class bodies or local class
//! declarations: they have their own scopes and are rejected at code
//! generation.

use crate::diagnostics::CompileError;
use crate::parser::ast::*;
use crate::span::Spanned;

pub type VisitResult = Result<(), CompileError>;

pub trait Visitor: Sized {
    fn visit_block(&mut self, block: &Block) -> VisitResult {
        walk_block(self, block)
    }

    fn visit_stmt(&mut self, stmt: &Spanned<Stmt>) -> VisitResult {
        walk_stmt(self, stmt)
    }

    fn visit_local_var(&mut self, local: &LocalVar) -> VisitResult {
        walk_local_var(self, local)
    }

    fn visit_expr(&mut self, expr: &Spanned<Expr>) -> VisitResult {
        walk_expr(self, expr)
    }

    fn visit_type(&mut self, _ty: &Spanned<TypeExpr>) -> VisitResult {
        Ok(())
    }
}

pub fn walk_block<V: Visitor>(v: &mut V, block: &Block) -> VisitResult {
    for stmt in &block.stmts {
        v.visit_stmt(stmt)?;
    }
    Ok(())
}

pub fn walk_local_var<V: Visitor>(v: &mut V, local: &LocalVar) -> VisitResult {
    v.visit_type(&local.ty)?;
    for var in &local.vars {
        if let Some(init) = &var.init {
            v.visit_expr(init)?;
        }
    }
    Ok(())
}

pub fn walk_stmt<V: Visitor>(v: &mut V, stmt: &Spanned<Stmt>) -> VisitResult {
    match &stmt.node {
        Stmt::Block(block) => v.visit_block(block),
        Stmt::LocalVar(local) => v.visit_local_var(local),
        Stmt::Expr(expr) | Stmt::Throw(expr) => v.visit_expr(expr),
        Stmt::If { condition, then_branch, else_branch } => {
            v.visit_expr(condition)?;
            v.visit_stmt(then_branch)?;
            if let Some(else_branch) = else_branch {
                v.visit_stmt(else_branch)?;
            }
            Ok(())
        }
        Stmt::While { condition, body } | Stmt::DoWhile { body, condition } => {
            v.visit_expr(condition)?;
            v.visit_stmt(body)
        }
        Stmt::For { init, condition, update, body } => {
            for s in init {
                v.visit_stmt(s)?;
            }
            if let Some(condition) = condition {
                v.visit_expr(condition)?;
            }
            for u in update {
                v.visit_expr(u)?;
            }
            v.visit_stmt(body)
        }
        Stmt::ForEach { var, iterable, body } => {
            v.visit_local_var(var)?;
            v.visit_expr(iterable)?;
            v.visit_stmt(body)
        }
        Stmt::Return(value) => match value {
            Some(value) => v.visit_expr(value),
            None => Ok(()),
        },
        Stmt::Switch { selector, cases } => {
            v.visit_expr(selector)?;
            for case in cases {
                if let Some(label) = &case.label {
                    v.visit_expr(label)?;
                }
                for s in &case.body {
                    v.visit_stmt(s)?;
                }
            }
            Ok(())
        }
        Stmt::Labeled { body, .. } => v.visit_stmt(body),
        Stmt::Try { resources, body, catches, finally } => {
            for r in resources {
                v.visit_local_var(r)?;
            }
            v.visit_block(&body.node)?;
            for c in catches {
                v.visit_block(&c.body.node)?;
            }
            if let Some(finally) = finally {
                v.visit_block(&finally.node)?;
            }
            Ok(())
        }
        Stmt::Synchronized { lock, body } => {
            v.visit_expr(lock)?;
            v.visit_block(&body.node)
        }
        Stmt::Assert { condition, message } => {
            v.visit_expr(condition)?;
            if let Some(message) = message {
                v.visit_expr(message)?;
            }
            Ok(())
        }
        Stmt::ExplicitCtorCall { qualifier, args, .. } => {
            if let Some(q) = qualifier {
                v.visit_expr(q)?;
            }
            for a in args {
                v.visit_expr(a)?;
            }
            Ok(())
        }
        Stmt::Break(_) | Stmt::Continue(_) | Stmt::LocalClass(_) | Stmt::Empty => Ok(()),
    }
}

pub fn walk_expr<V: Visitor>(v: &mut V, expr: &Spanned<Expr>) -> VisitResult {
    match &expr.node {
        Expr::Literal { .. } | Expr::Name(_) | Expr::This(_) | Expr::Super(_) | Expr::Lambda { .. } => Ok(()),
        Expr::FieldAccess { object, .. } => v.visit_expr(object),
        Expr::ArrayAccess { array, index } => {
            v.visit_expr(array)?;
            v.visit_expr(index)
        }
        Expr::MethodCall { scope, args, .. } => {
            if let Some(scope) = scope {
                v.visit_expr(scope)?;
            }
            for a in args {
                v.visit_expr(a)?;
            }
            Ok(())
        }
        Expr::ObjectCreation { ty, args, .. } => {
            v.visit_type(ty)?;
            for a in args {
                v.visit_expr(a)?;
            }
            Ok(())
        }
        Expr::ArrayCreation { elem, dims, init, .. } => {
            v.visit_type(elem)?;
            for d in dims {
                v.visit_expr(d)?;
            }
            if let Some(init) = init {
                for e in init {
                    v.visit_expr(e)?;
                }
            }
            Ok(())
        }
        Expr::ArrayInit(items) => {
            for e in items {
                v.visit_expr(e)?;
            }
            Ok(())
        }
        Expr::Assign { target, value, .. } => {
            v.visit_expr(target)?;
            v.visit_expr(value)
        }
        Expr::Binary { lhs, rhs, .. } => {
            v.visit_expr(lhs)?;
            v.visit_expr(rhs)
        }
        Expr::Unary { operand, .. } => v.visit_expr(operand),
        Expr::Cast { ty, expr } => {
            v.visit_type(ty)?;
            v.visit_expr(expr)
        }
        Expr::Conditional { condition, then_expr, else_expr } => {
            v.visit_expr(condition)?;
            v.visit_expr(then_expr)?;
            v.visit_expr(else_expr)
        }
        Expr::InstanceOf { expr, ty } => {
            v.visit_expr(expr)?;
            v.visit_type(ty)
        }
        Expr::Enclosed(inner) => v.visit_expr(inner),
        Expr::ClassLit(ty) => v.visit_type(ty),
        Expr::MethodRef { scope, .. } => v.visit_expr(scope),
    }
}
