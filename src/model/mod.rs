//! The per-run working set of classes, methods and fields discovered from the
//! kernel. Models are created on first reference and never removed.

use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::diagnostics::CompileError;
use crate::parser::ast::{ClassDecl, MethodDecl};
use crate::signature::Signature;
use crate::source::SourceOrigin;
use crate::typeck::env::{SYNTHETIC_MODULE, TypeEnv};
use crate::typeck::types::{JType, is_builtin_class};

#[derive(Debug, Clone, PartialEq)]
pub struct FieldModel {
    pub name: String,
    pub ty: JType,
    /// Set once the field's initializer (if any) has been traversed.
    pub init_visited: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MethodState {
    Unresolved,
    Resolved { member: usize, env: TypeEnv },
    /// `new C()` on a class that declares no constructor.
    ImplicitConstructor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodModel {
    pub signature: Signature,
    pub is_kernel: bool,
    pub is_constructor: bool,
    pub state: MethodState,
}

impl MethodModel {
    pub fn unresolved(signature: Signature, is_constructor: bool) -> Self {
        Self { signature, is_kernel: false, is_constructor, state: MethodState::Unresolved }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self.state, MethodState::Unresolved)
    }

    /// Member index of the attached declaration.
    pub fn member(&self) -> Option<usize> {
        match self.state {
            MethodState::Resolved { member, .. } => Some(member),
            _ => None,
        }
    }
}

/// Requests recorded against a class before its declaration is attached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingClass {
    pub methods: Vec<(Signature, bool)>,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedClass {
    pub decl: Rc<ClassDecl>,
    pub env: TypeEnv,
    pub base: Option<String>,
    /// Names from the `implements` clause. They carry no behaviour.
    pub interfaces: Vec<String>,
    pub methods: IndexMap<Signature, MethodModel>,
    pub fields: IndexMap<String, FieldModel>,
    pub kernel: Option<Signature>,
    pub origin: Option<SourceOrigin>,
}

impl ResolvedClass {
    /// Ties a spanned error raised on this class to its source file.
    pub fn locate(&self, err: CompileError) -> CompileError {
        match &self.origin {
            Some(origin) => origin.locate(err),
            None => err,
        }
    }

    pub fn method_decl(&self, method: &MethodModel) -> Option<&MethodDecl> {
        method.member().and_then(|m| self.decl.callable(m))
    }

    pub fn declares_field(&self, name: &str) -> Option<JType> {
        self.decl
            .fields()
            .find(|(_, var)| var.name.node == name)
            .map(|(field, var)| JType::from_ast(&field.ty.node.with_extra_dims(var.extra_dims)))
    }
}

#[derive(Debug, Clone)]
pub enum ClassState {
    Unresolved(PendingClass),
    Resolved(ResolvedClass),
    /// The singleton-access placeholder. Always resolved, never emitted.
    Synthetic,
}

#[derive(Debug, Clone)]
pub struct ClassModel {
    pub name: String,
    pub state: ClassState,
}

impl ClassModel {
    pub fn resolved(&self) -> Option<&ResolvedClass> {
        match &self.state {
            ClassState::Resolved(r) => Some(r),
            _ => None,
        }
    }

    pub fn resolved_mut(&mut self) -> Option<&mut ResolvedClass> {
        match &mut self.state {
            ClassState::Resolved(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self.state, ClassState::Unresolved(_))
    }
}

/// Outcome of a field request.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldLookup {
    /// The field was registered on `owner`.
    Found { owner: String, ty: JType },
    /// The class is still a placeholder; the request was stored on it.
    Deferred,
    /// Builtin or synthetic class: nothing to register.
    Ignored,
}

#[derive(Debug, Default)]
pub struct Workspace {
    classes: IndexMap<String, ClassModel>,
    entry: String,
    dirty: IndexSet<String>,
}

impl Workspace {
    pub fn new(entry: impl Into<String>) -> Self {
        Self { classes: IndexMap::new(), entry: entry.into(), dirty: IndexSet::new() }
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn class(&self, name: &str) -> Option<&ClassModel> {
        self.classes.get(name)
    }


    pub fn resolved(&self, name: &str) -> Option<&ResolvedClass> {
        self.classes.get(name).and_then(ClassModel::resolved)
    }

    pub fn resolved_mut(&mut self, name: &str) -> Option<&mut ResolvedClass> {
        self.classes.get_mut(name).and_then(ClassModel::resolved_mut)
    }

    /// All classes in discovery order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassModel> {
        self.classes.values()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Adds a placeholder for `name` unless it exists or is a builtin.
    /// Returns true when a new model was created.
    pub fn get_or_add_class(&mut self, name: &str) -> bool {
        if is_builtin_class(name) || self.classes.contains_key(name) {
            return false;
        }
        let state = if name == SYNTHETIC_MODULE {
            ClassState::Synthetic
        } else {
            ClassState::Unresolved(PendingClass::default())
        };
        debug!("new class reference {name}");
        self.classes.insert(name.to_string(), ClassModel { name: name.to_string(), state });
        self.dirty.insert(name.to_string());
        true
    }

    /// Adds the classes named by `ty` to the working set.
    pub fn add_type(&mut self, ty: &JType) {
        let mut names = Vec::new();
        ty.referenced_classes(&mut names);
        for name in names {
            self.get_or_add_class(&name);
        }
    }

    /// Attaches a declaration to a placeholder. Pending method requests
    /// become unresolved method models; pending field requests are returned
    /// so the caller can replay them once the base chain is in place.
    pub fn attach(
        &mut self,
        name: &str,
        decl: Rc<ClassDecl>,
        base: Option<String>,
        interfaces: Vec<String>,
        origin: Option<SourceOrigin>,
    ) -> Vec<String> {
        let Some(model) = self.classes.get_mut(name) else {
            return Vec::new();
        };
        let pending = match &mut model.state {
            ClassState::Unresolved(p) => std::mem::take(p),
            _ => return Vec::new(),
        };
        let mut methods = IndexMap::new();
        for (sig, is_ctor) in pending.methods {
            methods.entry(sig.clone()).or_insert_with(|| MethodModel::unresolved(sig, is_ctor));
        }
        let env = TypeEnv::for_class(&decl);
        model.state = ClassState::Resolved(ResolvedClass {
            decl,
            env,
            base,
            interfaces,
            methods,
            fields: IndexMap::new(),
            kernel: None,
            origin,
        });
        self.dirty.insert(name.to_string());
        pending.fields
    }

    /// Records that `sig` is called on `class`. Only an identical request is
    /// merged; provisional keys are reconciled when the declaration is found.
    pub fn request_method(&mut self, class: &str, sig: Signature, is_constructor: bool) {
        let Some(model) = self.classes.get_mut(class) else {
            return;
        };
        let added = match &mut model.state {
            ClassState::Unresolved(pending) => {
                let known = pending.methods.iter().any(|(s, c)| *c == is_constructor && *s == sig);
                if !known {
                    pending.methods.push((sig, is_constructor));
                }
                !known
            }
            ClassState::Resolved(resolved) => {
                let known = resolved.methods.contains_key(&sig);
                if !known {
                    resolved.methods.insert(sig.clone(), MethodModel::unresolved(sig, is_constructor));
                }
                !known
            }
            ClassState::Synthetic => false,
        };
        if added {
            self.dirty.insert(class.to_string());
        }
    }

    /// Registers the kernel on the entry class as an already resolved method.
    pub fn set_kernel(&mut self, sig: Signature, member: usize, env: TypeEnv) {
        let entry = self.entry.clone();
        if let Some(resolved) = self.resolved_mut(&entry) {
            resolved.kernel = Some(sig.clone());
            resolved.methods.insert(
                sig.clone(),
                MethodModel {
                    signature: sig,
                    is_kernel: true,
                    is_constructor: false,
                    state: MethodState::Resolved { member, env },
                },
            );
        }
    }

    /// Ancestors of `class`, nearest first. Stops at the first class that is
    /// not resolved or that would repeat.
    pub fn base_chain(&self, class: &str) -> Vec<String> {
        let mut chain: Vec<String> = Vec::new();
        let mut current = self.resolved(class).and_then(|r| r.base.clone());
        while let Some(name) = current {
            if name == class || chain.contains(&name) {
                break;
            }
            current = self.resolved(&name).and_then(|r| r.base.clone());
            chain.push(name);
        }
        chain
    }

    /// Nearest class in `class` and its ancestors that declares `field`.
    pub fn find_field_owner(&self, class: &str, field: &str) -> Option<(String, JType)> {
        std::iter::once(class.to_string())
            .chain(self.base_chain(class))
            .find_map(|name| {
                let ty = self.resolved(&name)?.declares_field(field)?;
                Some((name, ty))
            })
    }

    /// Records a use of `field` starting the search at `class`.
    pub fn request_field(&mut self, class: &str, field: &str) -> Result<FieldLookup, CompileError> {
        match self.classes.get_mut(class).map(|m| &mut m.state) {
            None | Some(ClassState::Synthetic) => return Ok(FieldLookup::Ignored),
            Some(ClassState::Unresolved(pending)) => {
                if !pending.fields.iter().any(|f| f == field) {
                    pending.fields.push(field.to_string());
                }
                self.dirty.insert(class.to_string());
                return Ok(FieldLookup::Deferred);
            }
            Some(ClassState::Resolved(_)) => {}
        }
        let Some((owner, ty)) = self.find_field_owner(class, field) else {
            return Err(CompileError::resolution(format!(
                "Cannot find field {field} in {class} and its base classes"
            )));
        };
        let mut added = false;
        if let Some(resolved) = self.resolved_mut(&owner) {
            if !resolved.fields.contains_key(field) {
                resolved.fields.insert(
                    field.to_string(),
                    FieldModel { name: field.to_string(), ty: ty.clone(), init_visited: false },
                );
                added = true;
            }
        }
        if added {
            debug!("use field {owner}.{field}");
            self.add_type(&ty);
            self.dirty.insert(owner.clone());
        }
        Ok(FieldLookup::Found { owner, ty })
    }

    /// See [`ResolvedClass::locate`]. Unknown classes leave `err` as is.
    pub fn locate(&self, class: &str, err: CompileError) -> CompileError {
        match self.resolved(class) {
            Some(resolved) => resolved.locate(err),
            None => err,
        }
    }

    /// Looks `sig` up on `class` and its ancestors by equivalence.
    pub fn find_method(&self, class: &str, sig: &Signature) -> Option<(&ResolvedClass, &MethodModel)> {
        std::iter::once(class.to_string())
            .chain(self.base_chain(class))
            .find_map(|name| {
                let resolved = self.resolved(&name)?;
                let method = resolved.methods.values().find(|m| m.signature.equivalent(sig))?;
                Some((resolved, method))
            })
    }

    /// Signatures on `class` that still need a declaration.
    pub fn pending_methods(&self, class: &str) -> Vec<(Signature, bool)> {
        match self.classes.get(class).map(|m| &m.state) {
            Some(ClassState::Unresolved(p)) => p.methods.clone(),
            Some(ClassState::Resolved(r)) => r
                .methods
                .values()
                .filter(|m| !m.is_resolved())
                .map(|m| (m.signature.clone(), m.is_constructor))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn has_pending_work(&self, class: &str) -> bool {
        match self.classes.get(class).map(|m| &m.state) {
            Some(ClassState::Unresolved(_)) => true,
            Some(ClassState::Resolved(r)) => {
                r.methods.values().any(|m| !m.is_resolved()) || r.fields.values().any(|f| !f.init_visited)
            }
            _ => false,
        }
    }

    /// Classes touched since the last call, in discovery order.
    pub fn take_dirty(&mut self) -> IndexSet<String> {
        std::mem::take(&mut self.dirty)
    }

    /// Rewrites a provisional method key to the declaration's signature.
    /// If the normalized key is already present the provisional entry is
    /// dropped and false is returned.
    pub fn normalize_method(&mut self, class: &str, provisional: &Signature, normalized: Signature) -> bool {
        let Some(resolved) = self.resolved_mut(class) else {
            return false;
        };
        if *provisional == normalized {
            return true;
        }
        let Some(mut model) = resolved.methods.shift_remove(provisional) else {
            return false;
        };
        if resolved.methods.contains_key(&normalized) {
            debug!("-> Merge sig {provisional} into {normalized}");
            return false;
        }
        debug!("-> Update sig to {normalized}");
        model.signature = normalized.clone();
        resolved.methods.insert(normalized, model);
        true
    }

    /// Drops an unresolved request, used when it moves to an ancestor.
    pub fn remove_method(&mut self, class: &str, sig: &Signature) {
        if let Some(resolved) = self.resolved_mut(class) {
            resolved.methods.shift_remove(sig);
        }
    }

    pub fn set_method_state(&mut self, class: &str, sig: &Signature, state: MethodState) {
        if let Some(method) = self.resolved_mut(class).and_then(|r| r.methods.get_mut(sig)) {
            method.state = state;
        }
    }

    /// Non-builtin resolved classes other than the entry, with every base
    /// ahead of its subclasses and discovery order otherwise.
    pub fn emission_order(&self) -> Vec<&ResolvedClass> {
        let mut ordered: IndexSet<&str> = IndexSet::new();
        for model in self.classes.values() {
            if model.name == self.entry || model.resolved().is_none() {
                continue;
            }
            let mut lineage: Vec<&str> = vec![model.name.as_str()];
            lineage.extend(
                self.base_chain(&model.name)
                    .iter()
                    .filter_map(|b| self.classes.get_key_value(b.as_str()).map(|(k, _)| k.as_str())),
            );
            for name in lineage.into_iter().rev() {
                if name != self.entry {
                    ordered.insert(name);
                }
            }
        }
        ordered.into_iter().filter_map(|n| self.resolved(n)).collect()
    }
}
