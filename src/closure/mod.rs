//! Fixpoint discovery of the program slice reachable from the kernel.
//!
//! The builder works in passes. Each pass takes the classes that gained work
//! in the previous pass, attaches declarations to placeholders, finds the
//! declaration behind every requested signature, and traverses each newly
//! attached body exactly once. References found while traversing are
//! recorded on the workspace and picked up by the next pass; the run ends
//! with the first pass that records nothing new.

mod traverse;

use std::rc::Rc;

use indexmap::IndexSet;
use tracing::{debug, info};

use crate::config::KernelConfig;
use crate::diagnostics::CompileError;
use crate::model::{MethodState, Workspace};
use crate::parser::ast::{ClassDecl, TypeKind};
use crate::signature::Signature;
use crate::source::{ClassSource, SourceResolver};
use crate::typeck::env::TypeEnv;
use crate::typeck::types::{JType, is_builtin_class};

pub(crate) use traverse::{traverse_callable, traverse_initializer};

/// The closed program slice.
#[derive(Debug)]
pub struct Closure {
    pub workspace: Workspace,
    /// Number of fixpoint passes after the kernel was traversed.
    pub iterations: usize,
    pub kernel: Signature,
}

/// Runs the closure builder for the kernel named by `config`.
pub fn build(config: &KernelConfig, resolver: &mut dyn SourceResolver) -> Result<Closure, CompileError> {
    let entry_class = config.entry_simple_name().to_string();
    if !resolver.contains(&config.entry_class) {
        debug!("known classes: {:?}", resolver.known_classes());
        return Err(CompileError::resolution(format!(
            "Cannot find the path for entry class {}",
            config.entry_class
        )));
    }

    let mut ws = Workspace::new(entry_class.clone());
    ws.get_or_add_class(&entry_class);
    let source = resolver.resolve(&config.entry_class)?;
    attach_class(&mut ws, resolver, &entry_class, source)?;

    let kernel = seed_kernel(&mut ws, &entry_class, &config.kernel_method)?;

    let mut frontier = next_frontier(&mut ws);
    let mut iterations = 0;
    while !frontier.is_empty() {
        iterations += 1;
        info!("Processing reference class iteration #{iterations}");
        let work: Vec<(String, Vec<(Signature, bool)>)> =
            frontier.iter().map(|c| (c.clone(), ws.pending_methods(c))).collect();
        for (class, methods) in work {
            process_class(&mut ws, resolver, &class, &methods).map_err(|e| ws.locate(&class, e))?;
        }
        frontier = next_frontier(&mut ws);
    }
    info!("Finish collecting all necessary classes and methods using {iterations} iterations");

    Ok(Closure { workspace: ws, iterations, kernel })
}

fn next_frontier(ws: &mut Workspace) -> IndexSet<String> {
    let dirty = ws.take_dirty();
    dirty.into_iter().filter(|c| ws.has_pending_work(c)).collect()
}

/// Attaches the kernel to the entry class and traverses its body.
fn seed_kernel(ws: &mut Workspace, entry: &str, kernel: &str) -> Result<Signature, CompileError> {
    let Some(resolved) = ws.resolved(entry) else {
        return Err(CompileError::resolution(format!("Cannot find the path for entry class {entry}")));
    };
    let decl = resolved.decl.clone();
    let class_env = resolved.env.clone();
    let Some((member, method)) = decl.methods().find(|(_, m)| m.name.node == kernel) else {
        return Err(CompileError::resolution(format!(
            "Cannot find the kernel method {kernel} in class {entry}"
        )));
    };
    let sig = Signature::for_decl(kernel, method);
    let env = TypeEnv::for_method(&class_env, method);
    ws.set_kernel(sig.clone(), member, env.clone());
    debug!("kernel {entry}.{sig}");
    traverse_callable(ws, entry, method, &env).map_err(|e| ws.locate(entry, e))?;
    Ok(sig)
}

fn process_class(
    ws: &mut Workspace,
    resolver: &mut dyn SourceResolver,
    class: &str,
    methods: &[(Signature, bool)],
) -> Result<(), CompileError> {
    if ws.class(class).is_some_and(|c| c.is_unresolved()) {
        resolve_class(ws, resolver, class)?;
    }
    for (sig, is_constructor) in methods {
        resolve_method(ws, class, sig, *is_constructor)?;
    }
    visit_field_initializers(ws, class)
}

/// Looks the class up through the resolver and attaches it.
fn resolve_class(ws: &mut Workspace, resolver: &mut dyn SourceResolver, class: &str) -> Result<(), CompileError> {
    debug!("resolving class {class}");
    let source = resolver.resolve(class)?;
    attach_class(ws, resolver, class, source)
}

/// Attaches a declaration to the placeholder `class`, then resolves the whole
/// base chain and replays field requests made while the class was unresolved.
fn attach_class(
    ws: &mut Workspace,
    resolver: &mut dyn SourceResolver,
    class: &str,
    source: ClassSource,
) -> Result<(), CompileError> {
    let ClassSource { decl, origin } = source;
    match decl.kind {
        TypeKind::Enum => {
            let err = CompileError::unsupported(format!("Not support enum {class}"), decl.name.span);
            return Err(origin.locate(err));
        }
        TypeKind::Annotation => {
            let err = CompileError::unsupported(format!("Not support annotation declaration {class}"), decl.name.span);
            return Err(origin.locate(err));
        }
        TypeKind::Class | TypeKind::Interface => {}
    }
    if let Some(second) = decl.extends.get(1) {
        return Err(origin.locate(CompileError::unsupported("Not support multiple inheritance", second.span)));
    }
    let base = decl
        .extends
        .first()
        .and_then(|t| JType::from_ast(&t.node).class_name().map(str::to_string))
        .filter(|b| !is_builtin_class(b));
    let interfaces = decl
        .implements
        .iter()
        .filter_map(|t| JType::from_ast(&t.node).class_name().map(str::to_string))
        .collect();

    let pending_fields = ws.attach(class, Rc::new(decl), base.clone(), interfaces, Some(origin));

    if let Some(base) = base {
        ws.get_or_add_class(&base);
        if ws.class(&base).is_some_and(|c| c.is_unresolved()) {
            resolve_class(ws, resolver, &base)?;
        }
        if ws.base_chain(&base).iter().any(|b| b == class) || base == class {
            return Err(CompileError::resolution(format!("Cyclic inheritance involving {class}")));
        }
    }

    for field in pending_fields {
        ws.request_field(class, &field)?;
    }
    Ok(())
}

/// Finds the declaration behind a requested signature and traverses it.
fn resolve_method(ws: &mut Workspace, class: &str, sig: &Signature, is_constructor: bool) -> Result<(), CompileError> {
    let Some(resolved) = ws.resolved(class) else {
        return Ok(());
    };
    let still_pending = resolved.methods.get(sig).is_some_and(|m| !m.is_resolved());
    if !still_pending {
        return Ok(());
    }
    let decl = resolved.decl.clone();
    let class_env = resolved.env.clone();

    let found = if is_constructor {
        decl.constructors()
            .map(|(i, m)| (i, Signature::for_decl(&decl.name.node, m)))
            .find(|(_, s)| s.equivalent(sig))
    } else {
        decl.methods()
            .filter(|(_, m)| m.name.node == sig.name())
            .map(|(i, m)| (i, Signature::for_decl(&m.name.node, m)))
            .find(|(_, s)| s.equivalent(sig))
    };

    let Some((member, normalized)) = found else {
        return resolve_missing(ws, class, &decl, sig, is_constructor);
    };

    if !ws.normalize_method(class, sig, normalized.clone()) {
        return Ok(());
    }
    let Some(method) = decl.callable(member) else {
        return Ok(());
    };
    debug!("resolving method {class}.{normalized}");
    let env = TypeEnv::for_method(&class_env, method);
    ws.set_method_state(class, &normalized, MethodState::Resolved { member, env: env.clone() });
    traverse_callable(ws, class, method, &env)
}

/// A requested signature the class does not declare: an implicit default
/// constructor, or a method inherited from an ancestor.
fn resolve_missing(
    ws: &mut Workspace,
    class: &str,
    decl: &ClassDecl,
    sig: &Signature,
    is_constructor: bool,
) -> Result<(), CompileError> {
    if is_constructor {
        if sig.arity() == 0 && decl.constructors().next().is_none() {
            ws.set_method_state(class, sig, MethodState::ImplicitConstructor);
            return Ok(());
        }
    } else {
        for ancestor in ws.base_chain(class) {
            let declares = ws.resolved(&ancestor).is_some_and(|r| {
                r.decl
                    .methods()
                    .any(|(_, m)| m.name.node == sig.name() && Signature::for_decl(&m.name.node, m).equivalent(sig))
            });
            if declares {
                debug!("-> Move {sig} from {class} to {ancestor}");
                ws.remove_method(class, sig);
                ws.request_method(&ancestor, sig.clone(), false);
                return Ok(());
            }
        }
    }
    Err(CompileError::resolution(format!("Cannot find method {sig} from class {class}")))
}

/// Traverses the initializers of newly used fields. Entry-class fields become
/// parameters, so their initializers are never emitted or traversed.
fn visit_field_initializers(ws: &mut Workspace, class: &str) -> Result<(), CompileError> {
    let is_entry = ws.entry() == class;
    let Some(resolved) = ws.resolved_mut(class) else {
        return Ok(());
    };
    let fresh: Vec<String> = resolved
        .fields
        .values_mut()
        .filter(|f| !f.init_visited)
        .map(|f| {
            f.init_visited = true;
            f.name.clone()
        })
        .collect();
    if is_entry || fresh.is_empty() {
        return Ok(());
    }
    let decl = resolved.decl.clone();
    let env = resolved.env.clone();
    for (_, var) in decl.fields().filter(|(_, v)| fresh.contains(&v.name.node)) {
        if let Some(init) = &var.init {
            traverse_initializer(ws, class, &env, init)?;
        }
    }
    Ok(())
}
