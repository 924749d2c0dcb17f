use super::Emitter;
use crate::diagnostics::{CompileError, WarningKind};
use crate::parser::ast::{Declarator, LocalVar, Stmt, SwitchCase};
use crate::span::Spanned;

impl Emitter<'_> {
    /// Writes `{ .. }` starting at the current column. The closing brace is
    /// left without a newline.
    pub(super) fn block(&mut self, stmts: &[Spanned<Stmt>]) -> Result<(), CompileError> {
        self.w.write("{");
        self.w.newline();
        self.w.indent();
        for stmt in stmts {
            self.w.write_indent();
            self.stmt(stmt)?;
            self.w.newline();
        }
        self.w.dedent();
        self.w.write_indent();
        self.w.write("}");
        Ok(())
    }

    /// Body of a loop or branch. A block stays on the header line, anything
    /// else moves to the next line one level deeper.
    fn body(&mut self, stmt: &Spanned<Stmt>) -> Result<(), CompileError> {
        if let Stmt::Block(block) = &stmt.node {
            self.w.write(" ");
            return self.block(&block.stmts);
        }
        self.w.newline();
        self.w.indent();
        self.w.write_indent();
        self.stmt(stmt)?;
        self.w.dedent();
        Ok(())
    }

    fn local_var(&mut self, local: &LocalVar) -> Result<String, CompileError> {
        let vars: Vec<&Declarator> = local.vars.iter().collect();
        self.declarators(&local.ty, &vars)
    }

    pub(super) fn stmt(&mut self, stmt: &Spanned<Stmt>) -> Result<(), CompileError> {
        let span = stmt.span;
        match &stmt.node {
            Stmt::Block(block) => self.block(&block.stmts)?,
            Stmt::LocalVar(local) => {
                let text = self.local_var(local)?;
                self.w.write(&text);
                self.w.write(";");
            }
            Stmt::Expr(expr) => {
                let text = self.expr(expr)?;
                self.w.write(&text);
                self.w.write(";");
            }
            Stmt::If { condition, then_branch, else_branch } => {
                let condition = self.expr(condition)?;
                self.w.write(&format!("if ({condition})"));
                self.body(then_branch)?;
                if let Some(else_branch) = else_branch {
                    if matches!(then_branch.node, Stmt::Block(_)) {
                        self.w.write(" ");
                    } else {
                        self.w.newline();
                        self.w.write_indent();
                    }
                    self.w.write("else");
                    if matches!(else_branch.node, Stmt::If { .. }) {
                        self.w.write(" ");
                        self.stmt(else_branch)?;
                    } else {
                        self.body(else_branch)?;
                    }
                }
            }
            Stmt::While { condition, body } => {
                let condition = self.expr(condition)?;
                self.w.write(&format!("while ({condition})"));
                self.body(body)?;
            }
            Stmt::DoWhile { body, condition } => {
                self.w.write("do");
                self.body(body)?;
                if matches!(body.node, Stmt::Block(_)) {
                    self.w.write(" ");
                } else {
                    self.w.newline();
                    self.w.write_indent();
                }
                let condition = self.expr(condition)?;
                self.w.write(&format!("while ({condition});"));
            }
            Stmt::For { init, condition, update, body } => {
                let mut parts = Vec::new();
                for s in init {
                    match &s.node {
                        Stmt::LocalVar(local) => parts.push(self.local_var(local)?),
                        Stmt::Expr(expr) => parts.push(self.expr(expr)?),
                        _ => return Err(CompileError::unsupported("Not support this for-loop initializer", s.span)),
                    }
                }
                let condition = condition.as_ref().map(|c| self.expr(c)).transpose()?.unwrap_or_default();
                let update = self.arguments(update)?;
                self.w.write(&format!("for ({}; {condition}; {})", parts.join(", "), update.join(", ")));
                self.body(body)?;
            }
            Stmt::ForEach { var, iterable, body } => {
                let var = self.local_var(var)?;
                let iterable = self.expr(iterable)?;
                self.w.write(&format!("for ({var} : {iterable})"));
                self.body(body)?;
            }
            Stmt::Return(Some(value)) => {
                let value = self.expr(value)?;
                match &self.kernel_ret {
                    Some(ret) => {
                        let line = format!("{ret} = {value};");
                        self.w.write(&line);
                    }
                    None => self.w.write(&format!("return {value};")),
                }
            }
            Stmt::Return(None) => self.w.write("return;"),
            Stmt::Break(None) => self.w.write("break;"),
            Stmt::Continue(None) => self.w.write("continue;"),
            Stmt::Break(Some(_)) | Stmt::Continue(Some(_)) => {
                return Err(CompileError::unsupported("Not support labeled jump statements", span));
            }
            Stmt::Labeled { label, body } => {
                self.w.write(&format!("{}:", label.node));
                self.w.newline();
                self.w.write_indent();
                self.stmt(body)?;
            }
            Stmt::Switch { selector, cases } => {
                let selector = self.expr(selector)?;
                self.w.write(&format!("switch ({selector}) {{"));
                self.w.newline();
                self.w.indent();
                for case in cases {
                    self.switch_case(case)?;
                }
                self.w.dedent();
                self.w.write_indent();
                self.w.write("}");
            }
            Stmt::Throw(_) => {
                self.warn(WarningKind::DroppedThrow, "Ignore throw statement", span);
                self.w.write(";");
            }
            Stmt::Try { resources, body, catches, finally } => {
                if !resources.is_empty() {
                    return Err(CompileError::unsupported("Not support try-block with resources", span));
                }
                self.block(&body.node.stmts)?;
                for catch in catches {
                    self.warn(
                        WarningKind::DroppedCatch,
                        format!("Ignore catch clause for {}", catch.param.ty.node),
                        catch.param.ty.span,
                    );
                }
                if let Some(finally) = finally {
                    self.w.newline();
                    self.w.write_indent();
                    self.block(&finally.node.stmts)?;
                }
            }
            Stmt::Synchronized { .. } => {
                return Err(CompileError::unsupported("Not support synchronized statements", span));
            }
            Stmt::Assert { condition, .. } => {
                let condition = self.expr(condition)?;
                self.w.write(&format!("assert({condition});"));
            }
            Stmt::ExplicitCtorCall { .. } => {
                return Err(CompileError::unsupported(
                    "Not support constructor calls outside the first statement",
                    span,
                ));
            }
            Stmt::LocalClass(_) => return Err(CompileError::unsupported("Not support local classes", span)),
            Stmt::Empty => self.w.write(";"),
        }
        Ok(())
    }

    fn switch_case(&mut self, case: &SwitchCase) -> Result<(), CompileError> {
        let label = match &case.label {
            Some(label) => format!("case {}:", self.expr(label)?),
            None => "default:".to_string(),
        };
        self.w.line(&label);
        self.w.indent();
        for stmt in &case.body {
            self.w.write_indent();
            self.stmt(stmt)?;
            self.w.newline();
        }
        self.w.dedent();
        Ok(())
    }
}
