use std::collections::HashMap;

use super::types::JType;
use crate::parser::ast::{Block, ClassDecl, LocalVar, MethodDecl, Stmt};

/// Name of the reserved binding for singleton (module-level) access.
pub const SYNTHETIC_MODULE: &str = "SYNTHETIC_MODULE";

/// Where a binding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingOrigin {
    Synthetic,
    Field,
    Param,
    Local,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub ty: JType,
    pub origin: BindingOrigin,
}

/// Layered name → type map. A class environment has one layer; a method
/// environment pushes a second layer holding parameters and locals. Layers
/// are flat: nested blocks do not open new scopes.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeEnv {
    scopes: Vec<HashMap<String, Binding>>,
}

impl Default for TypeEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeEnv {
    pub fn new() -> Self {
        let mut env = Self { scopes: vec![HashMap::new()] };
        env.ensure_synthetic();
        env
    }

    /// Adds the reserved singleton binding if it is missing.
    pub fn ensure_synthetic(&mut self) {
        if self.lookup(SYNTHETIC_MODULE).is_none() {
            self.define(SYNTHETIC_MODULE, JType::class(SYNTHETIC_MODULE), BindingOrigin::Synthetic);
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Binds `name` in the innermost layer unless it is already bound there.
    pub fn define(&mut self, name: &str, ty: JType, origin: BindingOrigin) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.entry(name.to_string()).or_insert(Binding { ty, origin });
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn lookup_type(&self, name: &str) -> Option<&JType> {
        self.lookup(name).map(|b| &b.ty)
    }

    /// Class-level environment: every declared field.
    pub fn for_class(class: &ClassDecl) -> Self {
        let mut env = TypeEnv::new();
        for (field, var) in class.fields() {
            let ty = JType::from_ast(&field.ty.node.with_extra_dims(var.extra_dims));
            env.define(&var.name.node, ty, BindingOrigin::Field);
        }
        env
    }

    /// Method environment layered over the owning class's environment.
    pub fn for_method(class_env: &TypeEnv, method: &MethodDecl) -> Self {
        let mut env = class_env.clone();
        env.push_scope();
        for param in &method.params {
            env.define(&param.name.node, JType::from_ast(&param.full_type()), BindingOrigin::Param);
        }
        if let Some(body) = &method.body {
            collect_block(&mut env, &body.node);
        }
        env.ensure_synthetic();
        env
    }
}

fn define_locals(env: &mut TypeEnv, local: &LocalVar) {
    for var in &local.vars {
        let ty = JType::from_ast(&local.ty.node.with_extra_dims(var.extra_dims));
        env.define(&var.name.node, ty, BindingOrigin::Local);
    }
}

fn collect_block(env: &mut TypeEnv, block: &Block) {
    for stmt in &block.stmts {
        collect_stmt(env, &stmt.node);
    }
}

fn collect_stmt(env: &mut TypeEnv, stmt: &Stmt) {
    match stmt {
        Stmt::Block(block) => collect_block(env, block),
        Stmt::LocalVar(local) => define_locals(env, local),
        Stmt::If { then_branch, else_branch, .. } => {
            collect_stmt(env, &then_branch.node);
            if let Some(else_branch) = else_branch {
                collect_stmt(env, &else_branch.node);
            }
        }
        Stmt::While { body, .. } | Stmt::DoWhile { body, .. } | Stmt::Labeled { body, .. } => {
            collect_stmt(env, &body.node)
        }
        Stmt::For { init, body, .. } => {
            for s in init {
                collect_stmt(env, &s.node);
            }
            collect_stmt(env, &body.node);
        }
        Stmt::ForEach { var, body, .. } => {
            define_locals(env, var);
            collect_stmt(env, &body.node);
        }
        Stmt::Switch { cases, .. } => {
            for case in cases {
                for s in &case.body {
                    collect_stmt(env, &s.node);
                }
            }
        }
        Stmt::Try { resources, body, catches, finally } => {
            for r in resources {
                define_locals(env, r);
            }
            collect_block(env, &body.node);
            for c in catches {
                env.define(&c.param.name.node, JType::from_ast(&c.param.full_type()), BindingOrigin::Local);
                collect_block(env, &c.body.node);
            }
            if let Some(finally) = finally {
                collect_block(env, &finally.node);
            }
        }
        Stmt::Synchronized { body, .. } => collect_block(env, &body.node),
        Stmt::Expr(_)
        | Stmt::Return(_)
        | Stmt::Break(_)
        | Stmt::Continue(_)
        | Stmt::Throw(_)
        | Stmt::Assert { .. }
        | Stmt::ExplicitCtorCall { .. }
        | Stmt::LocalClass(_)
        | Stmt::Empty => {}
    }
}
