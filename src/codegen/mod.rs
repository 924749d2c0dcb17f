//! Emission of the closed program slice.
//!
//! Every resolved class other than the entry class goes to the declarations
//! unit as a class with public members. The entry class is flattened into the
//! implementation unit: its used fields become trailing parameters of every
//! emitted function, and a non-void kernel returns through an extra
//! `<name>_ret` parameter.

mod expr;
mod stmt;
pub mod types;
mod writer;

use tracing::{debug, info, warn};

pub use types::{Lowered, lower_type};
pub use writer::CodeWriter;

use crate::closure::Closure;
use crate::config::KernelConfig;
use crate::diagnostics::{CompileError, CompileWarning, WarningKind};
use crate::model::{MethodModel, MethodState, ResolvedClass, Workspace};
use crate::parser::ast::{Declarator, FieldDecl, Member, MethodDecl, Modifiers, Stmt, TypeExpr};
use crate::span::{Span, Spanned};
use crate::typeck::env::TypeEnv;

const PREAMBLE: &str = "#include <math.h>\n#include <string.h>\n\n";

/// Suffix of the parameter that carries a non-void kernel's result.
pub const RETURN_SUFFIX: &str = "_ret";

/// The two emitted units.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    /// Declarations unit (`.h`).
    pub header: String,
    /// Implementation unit (`.cpp`).
    pub source: String,
    pub warnings: Vec<CompileWarning>,
}

pub fn generate(closure: &Closure, config: &KernelConfig) -> Result<Output, CompileError> {
    let ws = &closure.workspace;
    let mut warnings = Vec::new();

    let classes = ws.emission_order();
    info!("Writing {} classes to the declarations unit", classes.len());
    let mut header = String::from(PREAMBLE);
    for (i, class) in classes.iter().enumerate() {
        if i > 0 {
            header.push('\n');
        }
        debug!("emit class {}", class.decl.name.node);
        let mut emitter = Emitter::new(ws, config, class, false);
        emitter.emit_class().map_err(|e| class.locate(e))?;
        header.push_str(&emitter.finish(&mut warnings));
    }

    let entry = ws.resolved(ws.entry()).ok_or_else(|| {
        CompileError::resolution(format!("Cannot find the path for entry class {}", ws.entry()))
    })?;
    debug!("flatten entry class {}", ws.entry());
    let mut emitter = Emitter::new(ws, config, entry, true);
    emitter.emit_flattened().map_err(|e| entry.locate(e))?;
    let source = format!("{PREAMBLE}{}", emitter.finish(&mut warnings));

    Ok(Output { header, source, warnings })
}

/// Emits one class. Expression and statement lowering live in the sibling
/// modules as further `impl` blocks.
pub(crate) struct Emitter<'a> {
    ws: &'a Workspace,
    config: &'a KernelConfig,
    class: &'a ResolvedClass,
    is_entry: bool,
    /// Environment of the member being emitted.
    env: &'a TypeEnv,
    /// Set while emitting the body of a non-void kernel.
    kernel_ret: Option<String>,
    w: CodeWriter,
    warnings: Vec<CompileWarning>,
}

impl<'a> Emitter<'a> {
    fn new(ws: &'a Workspace, config: &'a KernelConfig, class: &'a ResolvedClass, is_entry: bool) -> Self {
        Self {
            ws,
            config,
            class,
            is_entry,
            env: &class.env,
            kernel_ret: None,
            w: CodeWriter::new(),
            warnings: Vec::new(),
        }
    }

    fn finish(self, warnings: &mut Vec<CompileWarning>) -> String {
        warnings.extend(self.warnings);
        self.w.finish()
    }

    pub(crate) fn warn(&mut self, kind: WarningKind, msg: impl Into<String>, span: Span) {
        let msg = msg.into();
        warn!("{msg}");
        self.warnings.push(CompileWarning { kind, msg, span });
    }

    fn class_name(&self) -> &'a str {
        &self.class.decl.name.node
    }

    /// Used callables ordered by their position in the class body.
    fn used_callables(&self) -> Vec<(usize, &'a MethodModel, &'a TypeEnv)> {
        let mut used: Vec<_> = self
            .class
            .methods
            .values()
            .filter_map(|m| match &m.state {
                MethodState::Resolved { member, env } => Some((*member, m, env)),
                _ => None,
            })
            .collect();
        used.sort_by_key(|(member, ..)| *member);
        used
    }

    /// Names of the entry class's used fields, in discovery order.
    pub(crate) fn flattened_fields(&self) -> Vec<&'a str> {
        if !self.is_entry {
            return Vec::new();
        }
        self.class.fields.keys().map(String::as_str).collect()
    }

    fn check_modifiers(&mut self, modifiers: &Modifiers) {
        for annotation in &modifiers.annotations {
            self.warn(
                WarningKind::IgnoredAnnotation,
                format!("Ignore annotation @{}", annotation.node),
                annotation.span,
            );
        }
    }

    // ── Declarations unit ────────────────────────────────────────────

    fn emit_class(&mut self) -> Result<(), CompileError> {
        let class = self.class;
        let decl = &class.decl;
        if let Some(param) = decl.type_params.first() {
            return Err(CompileError::unsupported("Not support generic classes", param.span));
        }
        self.check_modifiers(&decl.modifiers);

        self.w.write("class ");
        self.w.write(&decl.name.node);
        if let Some(base) = decl.extends.first() {
            let base = lower_type(&base.node, base.span)?;
            self.w.write(" : public ");
            self.w.write(&base.base);
        }
        self.w.write(" {");
        self.w.newline();
        self.w.line("public:");
        self.w.indent();

        let used: Vec<_> = self.used_callables();
        let mut first = true;
        for (index, member) in decl.members.iter().enumerate() {
            let emitted = match &member.node {
                Member::Field(field) => self.emit_field(field, !first)?,
                Member::Method(_) | Member::Constructor(_) => match used.iter().find(|(m, ..)| *m == index) {
                    Some(&(_, model, env)) => {
                        if !first {
                            self.w.newline();
                        }
                        self.w.write_indent();
                        self.emit_callable(index, model, env)?;
                        self.w.newline();
                        true
                    }
                    None => false,
                },
                Member::NestedType(_) => {
                    return Err(CompileError::unsupported("Not support nested classes", member.span));
                }
                Member::Initializer { .. } => {
                    return Err(CompileError::unsupported("Not support initializer blocks", member.span));
                }
            };
            first &= !emitted;
        }

        self.w.dedent();
        self.w.write("};");
        self.w.newline();
        Ok(())
    }

    /// Emits the used declarators of one field declaration. Returns false
    /// when none of them is used.
    fn emit_field(&mut self, field: &FieldDecl, separate: bool) -> Result<bool, CompileError> {
        let class = self.class;
        let used: Vec<&Declarator> = field.vars.iter().filter(|v| class.fields.contains_key(&v.name.node)).collect();
        if used.is_empty() {
            return Ok(false);
        }
        self.check_modifiers(&field.modifiers);
        self.env = &class.env;
        let text = self.declarators(&field.ty, &used)?;
        if separate {
            self.w.newline();
        }
        self.w.write_indent();
        self.w.write(&text);
        self.w.write(";");
        self.w.newline();
        Ok(true)
    }

    // ── Implementation unit ──────────────────────────────────────────

    fn emit_flattened(&mut self) -> Result<(), CompileError> {
        for (i, (index, model, env)) in self.used_callables().into_iter().enumerate() {
            if i > 0 {
                self.w.newline();
            }
            self.emit_callable(index, model, env)?;
            self.w.newline();
        }
        Ok(())
    }

    // ── Callables ────────────────────────────────────────────────────

    fn emit_callable(&mut self, index: usize, model: &MethodModel, env: &'a TypeEnv) -> Result<(), CompileError> {
        let class = self.class;
        let Some(decl) = class.decl.callable(index) else {
            return Err(CompileError::resolution(format!(
                "Cannot find method {} from class {}",
                model.signature,
                self.class_name()
            )));
        };
        self.check_callable(decl, model.is_constructor)?;
        self.env = env;

        let returns_value = model.is_kernel && !decl.return_type.node.is_void();
        self.kernel_ret = returns_value.then(|| format!("{}{RETURN_SUFFIX}", decl.name.node));

        if !model.is_constructor {
            if decl.modifiers.is_static && !self.is_entry {
                self.w.write("static ");
            }
            let ret = if model.is_kernel {
                "void".to_string()
            } else {
                lower_type(&decl.return_type.node, decl.return_type.span)?.to_string()
            };
            self.w.write(&ret);
            self.w.write(" ");
        }
        self.w.write(&decl.name.node);
        let params = self.parameters(decl, returns_value)?;
        self.w.write(&format!("({})", params.join(", ")));

        let Some(body) = &decl.body else {
            self.w.write(";");
            self.kernel_ret = None;
            return Ok(());
        };
        let mut stmts = body.node.stmts.as_slice();
        if model.is_constructor {
            let (init, rest) = self.constructor_initializer(stmts)?;
            if let Some(init) = init {
                self.w.write(" : ");
                self.w.write(&init);
            }
            stmts = rest;
        }
        self.w.write(" ");
        self.block(stmts)?;
        self.kernel_ret = None;
        Ok(())
    }

    fn check_callable(&mut self, decl: &MethodDecl, is_constructor: bool) -> Result<(), CompileError> {
        if let Some(param) = decl.type_params.first() {
            return Err(CompileError::unsupported("Not support generic methods", param.span));
        }
        if decl.extra_dims > 0 {
            return Err(CompileError::unsupported(
                "Not support method declaration with array count",
                decl.name.span,
            ));
        }
        if let Some(param) = decl.params.iter().find(|p| p.varargs) {
            return Err(CompileError::unsupported("Not support vary arguments", param.name.span));
        }
        if let Some(first) = decl.throws.first() {
            let what = if is_constructor { "constructor" } else { "method declaration" };
            self.warn(WarningKind::DroppedThrows, format!("Ignore throws in the {what}"), first.span);
        }
        self.check_modifiers(&decl.modifiers);
        Ok(())
    }

    fn parameters(&mut self, decl: &MethodDecl, returns_value: bool) -> Result<Vec<String>, CompileError> {
        let mut params = Vec::new();
        for param in &decl.params {
            let ty = lower_type(&param.full_type(), param.ty.span)?;
            params.push(format!("{ty} {}", param.name.node));
        }
        if returns_value {
            let ty = lower_type(&decl.return_type.node, decl.return_type.span)?;
            params.push(format!("{ty} {}{RETURN_SUFFIX}", decl.name.node));
        }
        for field in self.flattened_fields() {
            params.push(self.flattened_parameter(field)?);
        }
        Ok(params)
    }

    fn flattened_parameter(&self, field: &str) -> Result<String, CompileError> {
        let Some((decl, var)) = self.class.decl.fields().find(|(_, v)| v.name.node == field) else {
            return Err(CompileError::resolution(format!(
                "Cannot find field {field} in {} and its base classes",
                self.class_name()
            )));
        };
        let ty: TypeExpr = decl.ty.node.with_extra_dims(var.extra_dims);
        Ok(format!("{} {field}", lower_type(&ty, decl.ty.span)?))
    }

    /// Splits a leading `this(..)`/`super(..)` off a constructor body and
    /// renders it as an initializer list entry.
    fn constructor_initializer<'s>(
        &mut self,
        stmts: &'s [Spanned<Stmt>],
    ) -> Result<(Option<String>, &'s [Spanned<Stmt>]), CompileError> {
        let Some((first, rest)) = stmts.split_first() else {
            return Ok((None, stmts));
        };
        let Stmt::ExplicitCtorCall { is_this, qualifier, args } = &first.node else {
            return Ok((None, stmts));
        };
        if qualifier.is_some() {
            return Err(CompileError::unsupported("Not support multiple inheritance", first.span));
        }
        if self.is_entry {
            return Err(CompileError::unsupported(
                "Not support constructor chaining in the entry class",
                first.span,
            ));
        }
        let target = if *is_this {
            self.class_name().to_string()
        } else {
            match self.class.decl.extends.first() {
                Some(base) => lower_type(&base.node, base.span)?.base,
                // `super()` with no base class is a no-op.
                None if args.is_empty() => return Ok((None, rest)),
                None => {
                    return Err(CompileError::resolution(format!(
                        "Cannot find base class of {} for super constructor call",
                        self.class_name()
                    )));
                }
            }
        };
        let args = self.arguments(args)?;
        Ok((Some(format!("{target}({})", args.join(", "))), rest))
    }

    /// `T a = init, *b` for one declaration statement.
    pub(crate) fn declarators(&mut self, ty: &Spanned<TypeExpr>, vars: &[&Declarator]) -> Result<String, CompileError> {
        let lowered = lower_type(&ty.node, ty.span)?;
        let mut text = lowered.base.clone();
        for (i, var) in vars.iter().enumerate() {
            let stars = lowered.with_extra(var.extra_dims).stars();
            if i == 0 {
                text.push_str(&stars);
                text.push(' ');
            } else {
                text.push_str(", ");
                text.push_str(&stars);
            }
            text.push_str(&var.name.node);
            if let Some(init) = &var.init {
                text.push_str(" = ");
                text.push_str(&self.initializer(init, Some(&var.name.node))?);
            }
        }
        Ok(text)
    }
}
