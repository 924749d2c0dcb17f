pub mod ast;

use crate::diagnostics::CompileError;
use crate::lexer::token::Token;
use crate::span::{Span, Spanned};
use ast::*;

pub struct Parser<'a> {
    tokens: &'a [Spanned<Token>],
    source: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Spanned<Token>], source: &'a str) -> Self {
        Self { tokens, source, pos: 0 }
    }

    fn peek(&self) -> Option<&Spanned<Token>> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<Token> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<Token> {
        self.tokens.get(self.pos + offset).map(|t| t.node)
    }

    fn check(&self, tok: Token) -> bool {
        self.peek_kind() == Some(tok)
    }

    fn advance(&mut self) -> Option<&Spanned<Token>> {
        if self.pos < self.tokens.len() {
            let tok = &self.tokens[self.pos];
            self.pos += 1;
            Some(tok)
        } else {
            None
        }
    }

    fn eat(&mut self, tok: Token) -> bool {
        if self.check(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> Result<Span, CompileError> {
        match self.tokens.get(self.pos) {
            Some(tok) if tok.node == expected => {
                self.pos += 1;
                Ok(tok.span)
            }
            Some(tok) => Err(CompileError::syntax(
                format!("expected {expected}, found {}", tok.node),
                tok.span,
            )),
            None => Err(CompileError::syntax(
                format!("expected {expected}, found end of file"),
                self.eof_span(),
            )),
        }
    }

    fn expect_ident(&mut self) -> Result<Spanned<String>, CompileError> {
        match self.tokens.get(self.pos) {
            Some(tok) if tok.node == Token::Ident => {
                let name = self.source[tok.span.start..tok.span.end].to_string();
                self.pos += 1;
                Ok(Spanned::new(name, tok.span))
            }
            Some(tok) => Err(CompileError::syntax(
                format!("expected identifier, found {}", tok.node),
                tok.span,
            )),
            None => Err(CompileError::syntax(
                "expected identifier, found end of file",
                self.eof_span(),
            )),
        }
    }

    fn eof_span(&self) -> Span {
        if let Some(last) = self.tokens.last() {
            Span::new(last.span.end, last.span.end)
        } else {
            Span::dummy()
        }
    }

    fn current_span(&self) -> Span {
        self.peek().map(|t| t.span).unwrap_or_else(|| self.eof_span())
    }

    /// End offset of the most recently consumed token.
    fn prev_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.prev_end().max(start))
    }

    fn unexpected(&self, what: &str) -> CompileError {
        match self.peek() {
            Some(tok) => CompileError::syntax(format!("expected {what}, found {}", tok.node), tok.span),
            None => CompileError::syntax(format!("expected {what}, found end of file"), self.eof_span()),
        }
    }

    /// True when the next `count` tokens are `>` with no gap between them.
    fn adjacent_gts(&self, count: usize) -> bool {
        (0..count).all(|i| self.peek_at(i) == Some(Token::Gt))
            && (1..count).all(|i| {
                self.tokens[self.pos + i - 1].span.end == self.tokens[self.pos + i].span.start
            })
    }

    /// Run `f` and rewind afterwards, keeping only its verdict.
    fn lookahead<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, CompileError>) -> Option<T> {
        let saved = self.pos;
        let result = f(self).ok();
        self.pos = saved;
        result
    }

    // ── Compilation unit ─────────────────────────────────────────────

    pub fn parse_compilation_unit(&mut self) -> Result<CompilationUnit, CompileError> {
        let mut package = None;
        let mut imports = Vec::new();
        let mut types = Vec::new();

        if self.check(Token::At) && self.peek_at(1) != Some(Token::Interface) {
            // package annotations
            let saved = self.pos;
            self.parse_modifiers()?;
            if !self.check(Token::Package) {
                self.pos = saved;
            }
        }
        if self.eat(Token::Package) {
            package = Some(self.parse_qualified_name()?.node);
            self.expect(Token::Semi)?;
        }
        while self.check(Token::Import) {
            let start = self.current_span().start;
            self.advance();
            self.eat(Token::Static);
            let mut path = self.parse_qualified_name()?.node;
            if self.eat(Token::Dot) {
                self.expect(Token::Star)?;
                path.push_str(".*");
            }
            self.expect(Token::Semi)?;
            imports.push(Spanned::new(path, self.span_from(start)));
        }
        while self.peek().is_some() {
            if self.eat(Token::Semi) {
                continue;
            }
            let start = self.current_span().start;
            let modifiers = self.parse_modifiers()?;
            let decl = self.parse_type_decl(modifiers)?;
            types.push(Spanned::new(decl, self.span_from(start)));
        }

        Ok(CompilationUnit { package, imports, types })
    }

    fn parse_qualified_name(&mut self) -> Result<Spanned<String>, CompileError> {
        let first = self.expect_ident()?;
        let start = first.span.start;
        let mut name = first.node;
        while self.check(Token::Dot) && self.peek_at(1) == Some(Token::Ident) {
            self.advance();
            name.push('.');
            name.push_str(&self.expect_ident()?.node);
        }
        Ok(Spanned::new(name, self.span_from(start)))
    }

    fn parse_modifiers(&mut self) -> Result<Modifiers, CompileError> {
        let mut modifiers = Modifiers::default();
        loop {
            match self.peek_kind() {
                Some(Token::Static) => modifiers.is_static = true,
                Some(Token::Final) => modifiers.is_final = true,
                Some(Token::Abstract) => modifiers.is_abstract = true,
                // `synchronized (` opens a statement, not a modifier
                Some(Token::Synchronized) if self.peek_at(1) == Some(Token::LParen) => break,
                Some(tok) if tok.is_modifier() => {}
                Some(Token::At) if self.peek_at(1) != Some(Token::Interface) => {
                    let start = self.current_span().start;
                    self.advance();
                    let name = self.parse_qualified_name()?;
                    if self.check(Token::LParen) {
                        self.skip_balanced(Token::LParen, Token::RParen)?;
                    }
                    modifiers.annotations.push(Spanned::new(name.node, self.span_from(start)));
                    continue;
                }
                _ => break,
            }
            self.advance();
        }
        Ok(modifiers)
    }

    /// Skip a bracketed region including its delimiters.
    fn skip_balanced(&mut self, open: Token, close: Token) -> Result<(), CompileError> {
        self.expect(open)?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.advance().map(|t| t.node) {
                Some(tok) if tok == open => depth += 1,
                Some(tok) if tok == close => depth -= 1,
                Some(_) => {}
                None => {
                    return Err(CompileError::syntax(
                        format!("unclosed {open}"),
                        self.eof_span(),
                    ));
                }
            }
        }
        Ok(())
    }

    fn parse_type_decl(&mut self, modifiers: Modifiers) -> Result<ClassDecl, CompileError> {
        let kind = match self.peek_kind() {
            Some(Token::Class) => TypeKind::Class,
            Some(Token::Interface) => TypeKind::Interface,
            Some(Token::Enum) => TypeKind::Enum,
            Some(Token::At) if self.peek_at(1) == Some(Token::Interface) => {
                self.advance();
                TypeKind::Annotation
            }
            _ => return Err(self.unexpected("class, interface or enum declaration")),
        };
        self.advance();
        let name = self.expect_ident()?;
        let type_params = if self.check(Token::Lt) { self.parse_type_params()? } else { Vec::new() };

        let mut extends = Vec::new();
        let mut implements = Vec::new();
        if self.eat(Token::Extends) {
            extends = self.parse_type_list()?;
        }
        if self.eat(Token::Implements) {
            implements = self.parse_type_list()?;
        }

        let members = match kind {
            TypeKind::Class | TypeKind::Interface => self.parse_class_body()?,
            TypeKind::Enum | TypeKind::Annotation => {
                self.skip_balanced(Token::LBrace, Token::RBrace)?;
                Vec::new()
            }
        };

        Ok(ClassDecl { kind, name, modifiers, type_params, extends, implements, members })
    }

    fn parse_type_list(&mut self) -> Result<Vec<Spanned<TypeExpr>>, CompileError> {
        let mut types = vec![self.parse_spanned_type()?];
        while self.eat(Token::Comma) {
            types.push(self.parse_spanned_type()?);
        }
        Ok(types)
    }

    /// `<T, U extends Bound>`; bounds are parsed and dropped.
    fn parse_type_params(&mut self) -> Result<Vec<Spanned<String>>, CompileError> {
        self.expect(Token::Lt)?;
        let mut params = Vec::new();
        loop {
            params.push(self.expect_ident()?);
            if self.eat(Token::Extends) {
                self.parse_type()?;
                while self.eat(Token::Amp) {
                    self.parse_type()?;
                }
            }
            if !self.eat(Token::Comma) {
                break;
            }
        }
        self.expect(Token::Gt)?;
        Ok(params)
    }

    fn parse_class_body(&mut self) -> Result<Vec<Spanned<Member>>, CompileError> {
        self.expect(Token::LBrace)?;
        let mut members = Vec::new();
        while !self.check(Token::RBrace) {
            if self.peek().is_none() {
                return Err(CompileError::syntax("unclosed class body", self.eof_span()));
            }
            if self.eat(Token::Semi) {
                continue;
            }
            let start = self.current_span().start;
            let member = self.parse_member()?;
            members.push(Spanned::new(member, self.span_from(start)));
        }
        self.expect(Token::RBrace)?;
        Ok(members)
    }

    fn parse_member(&mut self) -> Result<Member, CompileError> {
        if self.check(Token::LBrace) {
            let body = self.parse_block()?;
            return Ok(Member::Initializer { is_static: false, body });
        }
        if self.check(Token::Static) && self.peek_at(1) == Some(Token::LBrace) {
            self.advance();
            let body = self.parse_block()?;
            return Ok(Member::Initializer { is_static: true, body });
        }

        let modifiers = self.parse_modifiers()?;
        match self.peek_kind() {
            Some(Token::Class) | Some(Token::Interface) | Some(Token::Enum) | Some(Token::At) => {
                let decl = self.parse_type_decl(modifiers)?;
                return Ok(Member::NestedType(Box::new(decl)));
            }
            _ => {}
        }

        let type_params = if self.check(Token::Lt) { self.parse_type_params()? } else { Vec::new() };

        if self.check(Token::Ident) && self.peek_at(1) == Some(Token::LParen) {
            let name = self.expect_ident()?;
            let void = Spanned::new(TypeExpr::Void, name.span);
            let decl = self.parse_method_rest(modifiers, type_params, void, name)?;
            return Ok(Member::Constructor(decl));
        }

        let ty = self.parse_spanned_type()?;
        let name = self.expect_ident()?;
        if self.check(Token::LParen) {
            let decl = self.parse_method_rest(modifiers, type_params, ty, name)?;
            return Ok(Member::Method(decl));
        }

        let vars = self.parse_declarators_from(name)?;
        self.expect(Token::Semi)?;
        Ok(Member::Field(FieldDecl { modifiers, ty, vars }))
    }

    fn parse_method_rest(
        &mut self,
        modifiers: Modifiers,
        type_params: Vec<Spanned<String>>,
        return_type: Spanned<TypeExpr>,
        name: Spanned<String>,
    ) -> Result<MethodDecl, CompileError> {
        self.expect(Token::LParen)?;
        let mut params = Vec::new();
        while !self.check(Token::RParen) {
            if !params.is_empty() {
                self.expect(Token::Comma)?;
            }
            params.push(self.parse_param()?);
        }
        self.expect(Token::RParen)?;
        let extra_dims = self.parse_dims();

        let mut throws = Vec::new();
        if self.eat(Token::Throws) {
            throws = self.parse_type_list()?;
        }
        // interface `default` value of annotation members is not supported; plain bodies only
        let body = if self.eat(Token::Semi) { None } else { Some(self.parse_block()?) };

        Ok(MethodDecl { modifiers, type_params, return_type, name, params, extra_dims, throws, body })
    }

    fn parse_param(&mut self) -> Result<Param, CompileError> {
        let modifiers = self.parse_modifiers()?;
        let ty = self.parse_spanned_type()?;
        let varargs = self.eat(Token::Ellipsis);
        let name = self.expect_ident()?;
        let extra_dims = self.parse_dims();
        Ok(Param { modifiers, ty, name, extra_dims, varargs })
    }

    fn parse_dims(&mut self) -> usize {
        let mut dims = 0;
        while self.check(Token::LBracket) && self.peek_at(1) == Some(Token::RBracket) {
            self.pos += 2;
            dims += 1;
        }
        dims
    }

    fn parse_declarators_from(&mut self, first: Spanned<String>) -> Result<Vec<Declarator>, CompileError> {
        let mut vars = vec![self.parse_declarator_rest(first)?];
        while self.eat(Token::Comma) {
            let name = self.expect_ident()?;
            vars.push(self.parse_declarator_rest(name)?);
        }
        Ok(vars)
    }

    fn parse_declarator_rest(&mut self, name: Spanned<String>) -> Result<Declarator, CompileError> {
        let extra_dims = self.parse_dims();
        let init = if self.eat(Token::Eq) {
            if self.check(Token::LBrace) {
                Some(self.parse_array_init()?)
            } else {
                Some(self.parse_expr()?)
            }
        } else {
            None
        };
        Ok(Declarator { name, extra_dims, init })
    }

    // ── Types ────────────────────────────────────────────────────────

    pub fn parse_spanned_type(&mut self) -> Result<Spanned<TypeExpr>, CompileError> {
        let start = self.current_span().start;
        let ty = self.parse_type()?;
        Ok(Spanned::new(ty, self.span_from(start)))
    }

    fn parse_type(&mut self) -> Result<TypeExpr, CompileError> {
        let base = self.parse_type_no_dims()?;
        let dims = self.parse_dims();
        Ok(TypeExpr::array_of(base, dims))
    }

    fn parse_type_no_dims(&mut self) -> Result<TypeExpr, CompileError> {
        let Some(tok) = self.peek_kind() else {
            return Err(self.unexpected("type"));
        };
        if let Some(kind) = primitive_kind(tok) {
            self.advance();
            return Ok(TypeExpr::Primitive(kind));
        }
        match tok {
            Token::Void => {
                self.advance();
                Ok(TypeExpr::Void)
            }
            Token::Question => {
                self.advance();
                if self.eat(Token::Extends) || self.eat(Token::Super) {
                    Ok(TypeExpr::Wildcard(Some(Box::new(self.parse_type()?))))
                } else {
                    Ok(TypeExpr::Wildcard(None))
                }
            }
            Token::Ident => self.parse_class_type(),
            _ => Err(self.unexpected("type")),
        }
    }

    fn parse_class_type(&mut self) -> Result<TypeExpr, CompileError> {
        let name = self.expect_ident()?.node;
        let type_args = self.parse_type_args()?;
        let mut ty = TypeExpr::Class { scope: None, name, type_args };
        while self.check(Token::Dot) && self.peek_at(1) == Some(Token::Ident) {
            self.advance();
            let name = self.expect_ident()?.node;
            let type_args = self.parse_type_args()?;
            ty = TypeExpr::Class { scope: Some(Box::new(ty)), name, type_args };
        }
        Ok(ty)
    }

    /// `<A, B>`, the diamond `<>`, or nothing.
    fn parse_type_args(&mut self) -> Result<Vec<TypeExpr>, CompileError> {
        if !self.eat(Token::Lt) {
            return Ok(Vec::new());
        }
        let mut args = Vec::new();
        while !self.check(Token::Gt) {
            if !args.is_empty() {
                self.expect(Token::Comma)?;
            }
            args.push(self.parse_type()?);
        }
        self.expect(Token::Gt)?;
        Ok(args)
    }

    // ── Statements ───────────────────────────────────────────────────

    pub fn parse_block(&mut self) -> Result<Spanned<Block>, CompileError> {
        let start = self.expect(Token::LBrace)?.start;
        let mut stmts = Vec::new();
        while !self.check(Token::RBrace) {
            if self.peek().is_none() {
                return Err(CompileError::syntax("unclosed block", self.eof_span()));
            }
            stmts.push(self.parse_stmt()?);
        }
        self.expect(Token::RBrace)?;
        Ok(Spanned::new(Block { stmts }, self.span_from(start)))
    }

    fn parse_stmt(&mut self) -> Result<Spanned<Stmt>, CompileError> {
        let start = self.current_span().start;
        let stmt = self.parse_stmt_kind()?;
        Ok(Spanned::new(stmt, self.span_from(start)))
    }

    fn parse_stmt_kind(&mut self) -> Result<Stmt, CompileError> {
        let Some(tok) = self.peek_kind() else {
            return Err(self.unexpected("statement"));
        };
        match tok {
            Token::LBrace => Ok(Stmt::Block(self.parse_block()?.node)),
            Token::Semi => {
                self.advance();
                Ok(Stmt::Empty)
            }
            Token::If => {
                self.advance();
                let condition = self.parse_paren_expr()?;
                let then_branch = Box::new(self.parse_stmt()?);
                let else_branch = if self.eat(Token::Else) { Some(Box::new(self.parse_stmt()?)) } else { None };
                Ok(Stmt::If { condition, then_branch, else_branch })
            }
            Token::While => {
                self.advance();
                let condition = self.parse_paren_expr()?;
                let body = Box::new(self.parse_stmt()?);
                Ok(Stmt::While { condition, body })
            }
            Token::Do => {
                self.advance();
                let body = Box::new(self.parse_stmt()?);
                self.expect(Token::While)?;
                let condition = self.parse_paren_expr()?;
                self.expect(Token::Semi)?;
                Ok(Stmt::DoWhile { body, condition })
            }
            Token::For => self.parse_for(),
            Token::Return => {
                self.advance();
                let value = if self.check(Token::Semi) { None } else { Some(self.parse_expr()?) };
                self.expect(Token::Semi)?;
                Ok(Stmt::Return(value))
            }
            Token::Break | Token::Continue => {
                self.advance();
                let label = if self.check(Token::Ident) { Some(self.expect_ident()?) } else { None };
                self.expect(Token::Semi)?;
                Ok(if tok == Token::Break { Stmt::Break(label) } else { Stmt::Continue(label) })
            }
            Token::Switch => self.parse_switch(),
            Token::Throw => {
                self.advance();
                let value = self.parse_expr()?;
                self.expect(Token::Semi)?;
                Ok(Stmt::Throw(value))
            }
            Token::Try => self.parse_try(),
            Token::Synchronized if self.peek_at(1) == Some(Token::LParen) => {
                self.advance();
                let lock = self.parse_paren_expr()?;
                let body = self.parse_block()?;
                Ok(Stmt::Synchronized { lock, body })
            }
            Token::Assert => {
                self.advance();
                let condition = self.parse_expr()?;
                let message = if self.eat(Token::Colon) { Some(self.parse_expr()?) } else { None };
                self.expect(Token::Semi)?;
                Ok(Stmt::Assert { condition, message })
            }
            Token::This | Token::Super if self.peek_at(1) == Some(Token::LParen) => {
                self.advance();
                let args = self.parse_args()?;
                self.expect(Token::Semi)?;
                Ok(Stmt::ExplicitCtorCall { is_this: tok == Token::This, qualifier: None, args })
            }
            Token::Ident
                if self.peek_at(1) == Some(Token::Dot)
                    && self.peek_at(2) == Some(Token::Super)
                    && self.peek_at(3) == Some(Token::LParen) =>
            {
                let name = self.expect_ident()?;
                self.pos += 2;
                let qualifier = Some(Spanned::new(Expr::Name(name.node), name.span));
                let args = self.parse_args()?;
                self.expect(Token::Semi)?;
                Ok(Stmt::ExplicitCtorCall { is_this: false, qualifier, args })
            }
            Token::Ident if self.peek_at(1) == Some(Token::Colon) => {
                let label = self.expect_ident()?;
                self.advance();
                let body = Box::new(self.parse_stmt()?);
                Ok(Stmt::Labeled { label, body })
            }
            Token::Class | Token::Interface | Token::Enum => {
                let decl = self.parse_type_decl(Modifiers::default())?;
                Ok(Stmt::LocalClass(Box::new(decl)))
            }
            Token::Abstract if matches!(self.peek_at(1), Some(Token::Class)) => {
                let modifiers = self.parse_modifiers()?;
                let decl = self.parse_type_decl(modifiers)?;
                Ok(Stmt::LocalClass(Box::new(decl)))
            }
            _ if self.is_local_var_decl() => {
                let var = self.parse_local_var()?;
                self.expect(Token::Semi)?;
                Ok(Stmt::LocalVar(var))
            }
            _ => {
                let expr = self.parse_expr()?;
                self.expect(Token::Semi)?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_paren_expr(&mut self) -> Result<Spanned<Expr>, CompileError> {
        self.expect(Token::LParen)?;
        let expr = self.parse_expr()?;
        self.expect(Token::RParen)?;
        Ok(expr)
    }

    /// A declaration starts with modifiers, a primitive, or a type followed by a name.
    fn is_local_var_decl(&mut self) -> bool {
        match self.peek_kind() {
            Some(Token::Final) | Some(Token::At) => true,
            Some(tok) if tok.is_primitive() => self.peek_at(1) != Some(Token::Dot),
            Some(Token::Ident) => self
                .lookahead(|p| {
                    p.parse_type()?;
                    p.expect_ident()
                })
                .is_some(),
            _ => false,
        }
    }

    fn parse_local_var(&mut self) -> Result<LocalVar, CompileError> {
        let modifiers = self.parse_modifiers()?;
        let ty = self.parse_spanned_type()?;
        let first = self.expect_ident()?;
        let vars = self.parse_declarators_from(first)?;
        Ok(LocalVar { modifiers, ty, vars })
    }

    fn parse_for(&mut self) -> Result<Stmt, CompileError> {
        self.expect(Token::For)?;
        self.expect(Token::LParen)?;

        let mut init = Vec::new();
        if self.is_local_var_decl() {
            let start = self.current_span().start;
            let modifiers = self.parse_modifiers()?;
            let ty = self.parse_spanned_type()?;
            let name = self.expect_ident()?;
            if self.eat(Token::Colon) {
                let iterable = self.parse_expr()?;
                self.expect(Token::RParen)?;
                let body = Box::new(self.parse_stmt()?);
                let var = LocalVar {
                    modifiers,
                    ty,
                    vars: vec![Declarator { name, extra_dims: 0, init: None }],
                };
                return Ok(Stmt::ForEach { var, iterable, body });
            }
            let vars = self.parse_declarators_from(name)?;
            init.push(Spanned::new(Stmt::LocalVar(LocalVar { modifiers, ty, vars }), self.span_from(start)));
        } else {
            while !self.check(Token::Semi) {
                if !init.is_empty() {
                    self.expect(Token::Comma)?;
                }
                let expr = self.parse_expr()?;
                let span = expr.span;
                init.push(Spanned::new(Stmt::Expr(expr), span));
            }
        }
        self.expect(Token::Semi)?;

        let condition = if self.check(Token::Semi) { None } else { Some(self.parse_expr()?) };
        self.expect(Token::Semi)?;

        let mut update = Vec::new();
        while !self.check(Token::RParen) {
            if !update.is_empty() {
                self.expect(Token::Comma)?;
            }
            update.push(self.parse_expr()?);
        }
        self.expect(Token::RParen)?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::For { init, condition, update, body })
    }

    fn parse_switch(&mut self) -> Result<Stmt, CompileError> {
        self.expect(Token::Switch)?;
        let selector = self.parse_paren_expr()?;
        self.expect(Token::LBrace)?;
        let mut cases = Vec::new();
        while !self.eat(Token::RBrace) {
            let label = if self.eat(Token::Default) {
                None
            } else {
                self.expect(Token::Case)?;
                Some(self.parse_expr()?)
            };
            self.expect(Token::Colon)?;
            let mut body = Vec::new();
            while !matches!(self.peek_kind(), Some(Token::Case) | Some(Token::Default) | Some(Token::RBrace) | None) {
                body.push(self.parse_stmt()?);
            }
            cases.push(SwitchCase { label, body });
        }
        Ok(Stmt::Switch { selector, cases })
    }

    fn parse_try(&mut self) -> Result<Stmt, CompileError> {
        self.expect(Token::Try)?;
        let mut resources = Vec::new();
        if self.eat(Token::LParen) {
            while !self.check(Token::RParen) {
                resources.push(self.parse_local_var()?);
                if !self.eat(Token::Semi) {
                    break;
                }
            }
            self.expect(Token::RParen)?;
        }
        let body = self.parse_block()?;

        let mut catches = Vec::new();
        while self.eat(Token::Catch) {
            self.expect(Token::LParen)?;
            let modifiers = self.parse_modifiers()?;
            let start = self.current_span().start;
            let first = self.parse_type()?;
            let ty = if self.check(Token::Pipe) {
                let mut alts = vec![first];
                while self.eat(Token::Pipe) {
                    alts.push(self.parse_type()?);
                }
                TypeExpr::Union(alts)
            } else {
                first
            };
            let ty = Spanned::new(ty, self.span_from(start));
            let name = self.expect_ident()?;
            self.expect(Token::RParen)?;
            let catch_body = self.parse_block()?;
            catches.push(CatchClause {
                param: Param { modifiers, ty, name, extra_dims: 0, varargs: false },
                body: catch_body,
            });
        }
        let finally = if self.eat(Token::Finally) { Some(self.parse_block()?) } else { None };

        if catches.is_empty() && finally.is_none() && resources.is_empty() {
            return Err(CompileError::syntax("try without catch or finally", body.span));
        }
        Ok(Stmt::Try { resources, body, catches, finally })
    }

    // ── Expressions ──────────────────────────────────────────────────

    pub fn parse_expr(&mut self) -> Result<Spanned<Expr>, CompileError> {
        if self.is_lambda_ahead() {
            return self.parse_lambda();
        }
        let lhs = self.parse_ternary()?;
        let Some(op) = self.peek_kind().and_then(assign_op) else {
            return Ok(lhs);
        };
        self.advance();
        let value = self.parse_expr()?;
        let span = lhs.span.to(value.span);
        Ok(Spanned::new(
            Expr::Assign { op, target: Box::new(lhs), value: Box::new(value) },
            span,
        ))
    }

    fn is_lambda_ahead(&mut self) -> bool {
        match self.peek_kind() {
            Some(Token::Ident) => self.peek_at(1) == Some(Token::Arrow),
            Some(Token::LParen) => self
                .lookahead(|p| {
                    p.skip_balanced(Token::LParen, Token::RParen)?;
                    p.expect(Token::Arrow)
                })
                .is_some(),
            _ => false,
        }
    }

    fn parse_lambda(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let start = self.current_span().start;
        let mut params = Vec::new();
        if self.check(Token::Ident) {
            params.push(self.expect_ident()?);
        } else {
            self.expect(Token::LParen)?;
            while !self.check(Token::RParen) {
                if !params.is_empty() {
                    self.expect(Token::Comma)?;
                }
                let typed = self
                    .lookahead(|p| {
                        p.parse_modifiers()?;
                        p.parse_type()?;
                        p.expect_ident()
                    })
                    .is_some();
                if typed {
                    self.parse_modifiers()?;
                    self.parse_type()?;
                }
                params.push(self.expect_ident()?);
            }
            self.expect(Token::RParen)?;
        }
        self.expect(Token::Arrow)?;
        let body = if self.check(Token::LBrace) {
            LambdaBody::Block(self.parse_block()?)
        } else {
            LambdaBody::Expr(Box::new(self.parse_expr()?))
        };
        Ok(Spanned::new(Expr::Lambda { params, body }, self.span_from(start)))
    }

    fn parse_ternary(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let condition = self.parse_binary(0)?;
        if !self.eat(Token::Question) {
            return Ok(condition);
        }
        let then_expr = self.parse_expr()?;
        self.expect(Token::Colon)?;
        let else_expr = if self.is_lambda_ahead() { self.parse_lambda()? } else { self.parse_ternary()? };
        let span = condition.span.to(else_expr.span);
        Ok(Spanned::new(
            Expr::Conditional {
                condition: Box::new(condition),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            span,
        ))
    }

    /// The binary operator at the cursor and how many tokens it spans.
    fn peek_binop(&self) -> Option<(BinOp, usize)> {
        let op = match self.peek_kind()? {
            Token::PipePipe => BinOp::Or,
            Token::AmpAmp => BinOp::And,
            Token::Pipe => BinOp::BitOr,
            Token::Caret => BinOp::BitXor,
            Token::Amp => BinOp::BitAnd,
            Token::EqEq => BinOp::Eq,
            Token::BangEq => BinOp::NotEq,
            Token::Lt => BinOp::Lt,
            Token::LtEq => BinOp::LtEq,
            Token::GtEq => BinOp::GtEq,
            Token::Shl => BinOp::Shl,
            Token::Gt if self.adjacent_gts(3) => return Some((BinOp::UShr, 3)),
            Token::Gt if self.adjacent_gts(2) => return Some((BinOp::Shr, 2)),
            Token::Gt => BinOp::Gt,
            Token::Plus => BinOp::Add,
            Token::Minus => BinOp::Sub,
            Token::Star => BinOp::Mul,
            Token::Slash => BinOp::Div,
            Token::Percent => BinOp::Rem,
            _ => return None,
        };
        Some((op, 1))
    }

    fn parse_binary(&mut self, min_bp: u8) -> Result<Spanned<Expr>, CompileError> {
        let mut lhs = self.parse_unary()?;

        loop {
            if self.check(Token::InstanceOf) {
                let (l_bp, _) = RELATIONAL_BP;
                if l_bp < min_bp {
                    break;
                }
                self.advance();
                let ty = self.parse_spanned_type()?;
                let span = lhs.span.to(ty.span);
                lhs = Spanned::new(Expr::InstanceOf { expr: Box::new(lhs), ty }, span);
                continue;
            }

            let Some((op, width)) = self.peek_binop() else { break };
            let (l_bp, r_bp) = infix_binding_power(op);
            if l_bp < min_bp {
                break;
            }
            self.pos += width;
            let rhs = self.parse_binary(r_bp)?;
            let span = lhs.span.to(rhs.span);
            lhs = Spanned::new(
                Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) },
                span,
            );
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let start = self.current_span().start;
        let op = match self.peek_kind() {
            Some(Token::Plus) => Some(UnaryOp::Plus),
            Some(Token::Minus) => Some(UnaryOp::Neg),
            Some(Token::Bang) => Some(UnaryOp::Not),
            Some(Token::Tilde) => Some(UnaryOp::BitNot),
            Some(Token::PlusPlus) => Some(UnaryOp::PreInc),
            Some(Token::MinusMinus) => Some(UnaryOp::PreDec),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Spanned::new(
                Expr::Unary { op, operand: Box::new(operand) },
                self.span_from(start),
            ));
        }

        if self.check(Token::LParen) && self.is_cast_ahead() {
            self.advance();
            let ty_start = self.current_span().start;
            let first = self.parse_type()?;
            let ty = if self.check(Token::Amp) {
                let mut parts = vec![first];
                while self.eat(Token::Amp) {
                    parts.push(self.parse_type()?);
                }
                TypeExpr::Intersection(parts)
            } else {
                first
            };
            let ty = Spanned::new(ty, self.span_from(ty_start));
            self.expect(Token::RParen)?;
            let expr = if self.is_lambda_ahead() { self.parse_lambda()? } else { self.parse_unary()? };
            return Ok(Spanned::new(
                Expr::Cast { ty, expr: Box::new(expr) },
                self.span_from(start),
            ));
        }

        let primary = self.parse_primary()?;
        self.parse_postfix(primary)
    }

    /// `(Type) operand`, told apart from a parenthesized expression by what follows `)`.
    fn is_cast_ahead(&mut self) -> bool {
        let primitive = self.peek_at(1).is_some_and(|t| t.is_primitive());
        self.lookahead(|p| {
            p.expect(Token::LParen)?;
            p.parse_type()?;
            while p.eat(Token::Amp) {
                p.parse_type()?;
            }
            p.expect(Token::RParen)?;
            let next = p.peek_kind();
            let starts_operand = match next {
                Some(Token::Ident)
                | Some(Token::LParen)
                | Some(Token::This)
                | Some(Token::Super)
                | Some(Token::New)
                | Some(Token::Bang)
                | Some(Token::Tilde) => true,
                Some(tok) if tok.is_literal() || tok.is_primitive() => true,
                Some(Token::Plus) | Some(Token::Minus) | Some(Token::PlusPlus) | Some(Token::MinusMinus) => primitive,
                _ => false,
            };
            if starts_operand {
                Ok(())
            } else {
                Err(CompileError::syntax("not a cast", p.current_span()))
            }
        })
        .is_some()
    }

    fn parse_primary(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let Some(tok) = self.peek().cloned() else {
            return Err(self.unexpected("expression"));
        };
        let span = tok.span;
        let source = self.source;
        let text = &source[span.start..span.end];

        let literal = match tok.node {
            Token::IntLit => Some(LiteralKind::Int),
            Token::LongLit => Some(LiteralKind::Long),
            Token::FloatLit => Some(LiteralKind::Float),
            Token::DoubleLit => Some(LiteralKind::Double),
            Token::CharLit => Some(LiteralKind::Char),
            Token::StringLit => Some(LiteralKind::String),
            Token::True | Token::False => Some(LiteralKind::Boolean),
            Token::Null => Some(LiteralKind::Null),
            _ => None,
        };
        if let Some(kind) = literal {
            self.advance();
            return Ok(Spanned::new(Expr::Literal { kind, text: text.to_string() }, span));
        }

        match tok.node {
            Token::Ident => {
                let name = self.expect_ident()?;
                if self.check(Token::LParen) {
                    let args = self.parse_args()?;
                    return Ok(Spanned::new(
                        Expr::MethodCall { scope: None, name, args },
                        self.span_from(span.start),
                    ));
                }
                Ok(Spanned::new(Expr::Name(name.node), name.span))
            }
            Token::This => {
                self.advance();
                Ok(Spanned::new(Expr::This(None), span))
            }
            Token::Super => {
                self.advance();
                Ok(Spanned::new(Expr::Super(None), span))
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Ok(Spanned::new(Expr::Enclosed(Box::new(inner)), self.span_from(span.start)))
            }
            Token::New => self.parse_creation(),
            Token::LBrace => self.parse_array_init(),
            tok if tok.is_primitive() || tok == Token::Void => {
                let ty = self.parse_spanned_type()?;
                self.expect(Token::Dot)?;
                self.expect(Token::Class)?;
                Ok(Spanned::new(Expr::ClassLit(ty), self.span_from(span.start)))
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_postfix(&mut self, mut expr: Spanned<Expr>) -> Result<Spanned<Expr>, CompileError> {
        let start = expr.span.start;
        loop {
            match self.peek_kind() {
                Some(Token::Dot) => {
                    self.advance();
                    match self.peek_kind() {
                        Some(Token::This) => {
                            self.advance();
                            let qualifier = qualified_name_of(&expr.node).ok_or_else(|| {
                                CompileError::syntax("expected a class name before `.this`", expr.span)
                            })?;
                            expr = Spanned::new(Expr::This(Some(qualifier)), self.span_from(start));
                        }
                        Some(Token::Super) => {
                            self.advance();
                            let qualifier = qualified_name_of(&expr.node).ok_or_else(|| {
                                CompileError::syntax("expected a class name before `.super`", expr.span)
                            })?;
                            expr = Spanned::new(Expr::Super(Some(qualifier)), self.span_from(start));
                        }
                        Some(Token::Class) => {
                            self.advance();
                            let name = qualified_name_of(&expr.node).ok_or_else(|| {
                                CompileError::syntax("expected a type before `.class`", expr.span)
                            })?;
                            let ty = Spanned::new(TypeExpr::class(name), expr.span);
                            expr = Spanned::new(Expr::ClassLit(ty), self.span_from(start));
                        }
                        Some(Token::New) => {
                            return Err(CompileError::syntax(
                                "qualified instance creation is not supported",
                                self.current_span(),
                            ));
                        }
                        _ => {
                            // explicit generic arguments on a call are dropped
                            if self.check(Token::Lt) {
                                self.parse_type_args()?;
                            }
                            let name = self.expect_ident()?;
                            if self.check(Token::LParen) {
                                let args = self.parse_args()?;
                                expr = Spanned::new(
                                    Expr::MethodCall { scope: Some(Box::new(expr)), name, args },
                                    self.span_from(start),
                                );
                            } else {
                                expr = Spanned::new(
                                    Expr::FieldAccess { object: Box::new(expr), field: name },
                                    self.span_from(start),
                                );
                            }
                        }
                    }
                }
                Some(Token::LBracket) => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(Token::RBracket)?;
                    expr = Spanned::new(
                        Expr::ArrayAccess { array: Box::new(expr), index: Box::new(index) },
                        self.span_from(start),
                    );
                }
                Some(Token::PlusPlus) | Some(Token::MinusMinus) => {
                    let op = if self.check(Token::PlusPlus) { UnaryOp::PostInc } else { UnaryOp::PostDec };
                    self.advance();
                    expr = Spanned::new(
                        Expr::Unary { op, operand: Box::new(expr) },
                        self.span_from(start),
                    );
                }
                Some(Token::ColonColon) => {
                    self.advance();
                    let name = if self.check(Token::New) {
                        let span = self.expect(Token::New)?;
                        Spanned::new("new".to_string(), span)
                    } else {
                        self.expect_ident()?
                    };
                    expr = Spanned::new(
                        Expr::MethodRef { scope: Box::new(expr), name },
                        self.span_from(start),
                    );
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_args(&mut self) -> Result<Vec<Spanned<Expr>>, CompileError> {
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        while !self.check(Token::RParen) {
            if !args.is_empty() {
                self.expect(Token::Comma)?;
            }
            args.push(self.parse_expr()?);
        }
        self.expect(Token::RParen)?;
        Ok(args)
    }

    fn parse_creation(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let start = self.expect(Token::New)?.start;
        let ty_start = self.current_span().start;
        let base = match self.peek_kind() {
            Some(tok) if tok.is_primitive() => self.parse_type_no_dims()?,
            Some(Token::Ident) => self.parse_class_type()?,
            _ => return Err(self.unexpected("type after `new`")),
        };
        let elem = Spanned::new(base, self.span_from(ty_start));

        if self.check(Token::LBracket) {
            let mut dims = Vec::new();
            let mut extra_dims = 0;
            while self.eat(Token::LBracket) {
                if self.eat(Token::RBracket) {
                    extra_dims += 1;
                    continue;
                }
                if extra_dims > 0 {
                    return Err(CompileError::syntax(
                        "array dimension expression after an empty dimension",
                        self.current_span(),
                    ));
                }
                dims.push(self.parse_expr()?);
                self.expect(Token::RBracket)?;
            }
            let init = if self.check(Token::LBrace) {
                match self.parse_array_init()?.node {
                    Expr::ArrayInit(values) => Some(values),
                    _ => None,
                }
            } else {
                None
            };
            return Ok(Spanned::new(
                Expr::ArrayCreation { elem, dims, extra_dims, init },
                self.span_from(start),
            ));
        }

        let args = self.parse_args()?;
        let body = if self.check(Token::LBrace) { Some(self.parse_class_body()?) } else { None };
        Ok(Spanned::new(
            Expr::ObjectCreation { ty: elem, args, body },
            self.span_from(start),
        ))
    }

    fn parse_array_init(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let start = self.expect(Token::LBrace)?.start;
        let mut values = Vec::new();
        while !self.check(Token::RBrace) {
            if self.check(Token::LBrace) {
                values.push(self.parse_array_init()?);
            } else {
                values.push(self.parse_expr()?);
            }
            if !self.eat(Token::Comma) {
                break;
            }
        }
        self.expect(Token::RBrace)?;
        Ok(Spanned::new(Expr::ArrayInit(values), self.span_from(start)))
    }
}

const RELATIONAL_BP: (u8, u8) = (13, 14);

fn infix_binding_power(op: BinOp) -> (u8, u8) {
    match op {
        BinOp::Or => (1, 2),
        BinOp::And => (3, 4),
        BinOp::BitOr => (5, 6),
        BinOp::BitXor => (7, 8),
        BinOp::BitAnd => (9, 10),
        BinOp::Eq | BinOp::NotEq => (11, 12),
        BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq => RELATIONAL_BP,
        BinOp::Shl | BinOp::Shr | BinOp::UShr => (15, 16),
        BinOp::Add | BinOp::Sub => (17, 18),
        BinOp::Mul | BinOp::Div | BinOp::Rem => (19, 20),
    }
}

fn assign_op(tok: Token) -> Option<AssignOp> {
    Some(match tok {
        Token::Eq => AssignOp::Assign,
        Token::PlusEq => AssignOp::Add,
        Token::MinusEq => AssignOp::Sub,
        Token::StarEq => AssignOp::Mul,
        Token::SlashEq => AssignOp::Div,
        Token::PercentEq => AssignOp::Rem,
        Token::AmpEq => AssignOp::BitAnd,
        Token::PipeEq => AssignOp::BitOr,
        Token::CaretEq => AssignOp::BitXor,
        Token::ShlEq => AssignOp::Shl,
        Token::ShrEq => AssignOp::Shr,
        Token::UShrEq => AssignOp::UShr,
        _ => return None,
    })
}

fn primitive_kind(tok: Token) -> Option<PrimitiveKind> {
    Some(match tok {
        Token::Boolean => PrimitiveKind::Boolean,
        Token::Byte => PrimitiveKind::Byte,
        Token::Char => PrimitiveKind::Char,
        Token::Short => PrimitiveKind::Short,
        Token::Int => PrimitiveKind::Int,
        Token::Long => PrimitiveKind::Long,
        Token::Float => PrimitiveKind::Float,
        Token::Double => PrimitiveKind::Double,
        _ => return None,
    })
}

/// `a.b.C` written as names and field accesses.
fn qualified_name_of(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Name(n) => Some(n.clone()),
        Expr::FieldAccess { object, field } => {
            qualified_name_of(&object.node).map(|q| format!("{q}.{}", field.node))
        }
        _ => None,
    }
}

/// Lex and parse one source file.
pub fn parse_source(source: &str) -> Result<CompilationUnit, CompileError> {
    let tokens = crate::lexer::lex(source)?;
    let mut parser = Parser::new(&tokens, source);
    parser.parse_compilation_unit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> CompilationUnit {
        parse_source(src).unwrap()
    }

    fn parse_expr(src: &str) -> Expr {
        let tokens = crate::lexer::lex(src).unwrap();
        let mut parser = Parser::new(&tokens, src);
        parser.parse_expr().unwrap().node
    }

    fn method_body(unit: &CompilationUnit, name: &str) -> Vec<Stmt> {
        let class = &unit.types[0].node;
        let (_, m) = class.methods().find(|(_, m)| m.name.node == name).unwrap();
        m.body.as_ref().unwrap().node.stmts.iter().map(|s| s.node.clone()).collect()
    }

    #[test]
    fn parse_class_header() {
        let unit = parse(
            "package demo.kernels;\nimport java.util.List;\npublic class Derived extends Base implements Runnable, Cloneable { }",
        );
        assert_eq!(unit.package.as_deref(), Some("demo.kernels"));
        assert_eq!(unit.imports[0].node, "java.util.List");
        let class = &unit.types[0].node;
        assert_eq!(class.kind, TypeKind::Class);
        assert_eq!(class.name.node, "Derived");
        assert_eq!(class.extends[0].node.to_string(), "Base");
        assert_eq!(class.implements.len(), 2);
    }

    #[test]
    fn parse_members() {
        let unit = parse(
            "class A { int x, y = 3; static int[] buf; A(int v) { x = v; } int get() { return x; } static { } }",
        );
        let class = &unit.types[0].node;
        let fields: Vec<&str> = class.fields().map(|(_, d)| d.name.node.as_str()).collect();
        assert_eq!(fields, vec!["x", "y", "buf"]);
        assert_eq!(class.constructors().count(), 1);
        assert_eq!(class.methods().count(), 1);
        assert!(matches!(class.members[4].node, Member::Initializer { is_static: true, .. }));
    }

    #[test]
    fn parse_method_signature_details() {
        let unit = parse("class A { public static int[][] compute(int N, final int[] a) throws Exception { return null; } }");
        let (_, m) = unit.types[0].node.methods().next().unwrap();
        assert_eq!(m.return_type.node.to_string(), "int[][]");
        assert_eq!(m.params[0].ty.node.to_string(), "int");
        assert_eq!(m.params[1].full_type().to_string(), "int[]");
        assert!(m.params[1].modifiers.is_final);
        assert!(m.modifiers.is_static);
        assert_eq!(m.throws.len(), 1);
    }

    #[test]
    fn parse_c_style_array_declarators() {
        let unit = parse("class A { void f(int a[]) { int b[][] = new int[2][3]; } }");
        let (_, m) = unit.types[0].node.methods().next().unwrap();
        assert_eq!(m.params[0].full_type().to_string(), "int[]");
        match &method_body(&unit, "f")[0] {
            Stmt::LocalVar(v) => assert_eq!(v.vars[0].extra_dims, 2),
            other => panic!("expected local var, got {other:?}"),
        }
    }

    #[test]
    fn parse_varargs_param() {
        let unit = parse("class A { void f(int... xs) { } }");
        let (_, m) = unit.types[0].node.methods().next().unwrap();
        assert!(m.params[0].varargs);
    }

    #[test]
    fn parse_for_loops() {
        let unit = parse(
            "class A { void f(int[] a) { for (int i = 0; i < 10; i++) a[i] = i; for (int v : a) { } for (;;) break; } }",
        );
        let body = method_body(&unit, "f");
        assert!(matches!(&body[0], Stmt::For { init, condition: Some(_), update, .. } if init.len() == 1 && update.len() == 1));
        assert!(matches!(&body[1], Stmt::ForEach { .. }));
        assert!(matches!(&body[2], Stmt::For { init, condition: None, .. } if init.is_empty()));
    }

    #[test]
    fn parse_local_decl_vs_expression() {
        let unit = parse("class A { void f() { Foo f = new Foo(); f.x = 2; List<Integer> l = null; i++; } }");
        let body = method_body(&unit, "f");
        assert!(matches!(body[0], Stmt::LocalVar(_)));
        assert!(matches!(body[1], Stmt::Expr(_)));
        match &body[2] {
            Stmt::LocalVar(v) => assert_eq!(v.ty.node.to_string(), "List<Integer>"),
            other => panic!("expected local var, got {other:?}"),
        }
        assert!(matches!(body[3], Stmt::Expr(_)));
    }

    #[test]
    fn parse_explicit_ctor_calls() {
        let unit = parse("class B extends A { B() { super(1); } B(int x) { this(); } B(Outer o) { o.super(); } }");
        let ctors: Vec<&MethodDecl> = unit.types[0].node.constructors().map(|(_, c)| c).collect();
        let first = &ctors[0].body.as_ref().unwrap().node.stmts[0].node;
        assert!(matches!(first, Stmt::ExplicitCtorCall { is_this: false, qualifier: None, args } if args.len() == 1));
        let second = &ctors[1].body.as_ref().unwrap().node.stmts[0].node;
        assert!(matches!(second, Stmt::ExplicitCtorCall { is_this: true, .. }));
        let third = &ctors[2].body.as_ref().unwrap().node.stmts[0].node;
        assert!(matches!(third, Stmt::ExplicitCtorCall { qualifier: Some(_), .. }));
    }

    #[test]
    fn parse_try_catch_finally() {
        let unit = parse(
            "class A { void f() { try (Res r = open()) { g(); } catch (IOException | RuntimeException e) { } finally { h(); } } }",
        );
        match &method_body(&unit, "f")[0] {
            Stmt::Try { resources, catches, finally, .. } => {
                assert_eq!(resources.len(), 1);
                assert!(matches!(catches[0].param.ty.node, TypeExpr::Union(_)));
                assert!(finally.is_some());
            }
            other => panic!("expected try, got {other:?}"),
        }
    }

    #[test]
    fn parse_switch_and_labels() {
        let unit = parse(
            "class A { void f(int x) { outer: while (true) { switch (x) { case 1: x++; break; default: break outer; } } } }",
        );
        match &method_body(&unit, "f")[0] {
            Stmt::Labeled { label, body } => {
                assert_eq!(label.node, "outer");
                assert!(matches!(body.node, Stmt::While { .. }));
            }
            other => panic!("expected labeled statement, got {other:?}"),
        }
    }

    #[test]
    fn parse_precedence() {
        match parse_expr("a[i] + 5 + j * 2") {
            Expr::Binary { op: BinOp::Add, lhs, rhs } => {
                assert!(matches!(lhs.node, Expr::Binary { op: BinOp::Add, .. }));
                assert!(matches!(rhs.node, Expr::Binary { op: BinOp::Mul, .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parse_shift_operators_from_split_gts() {
        assert!(matches!(parse_expr("a >> 2"), Expr::Binary { op: BinOp::Shr, .. }));
        assert!(matches!(parse_expr("a >>> 2"), Expr::Binary { op: BinOp::UShr, .. }));
        assert!(matches!(parse_expr("a > 2"), Expr::Binary { op: BinOp::Gt, .. }));
    }

    #[test]
    fn parse_nested_generic_type_closes() {
        let unit = parse("class A { Map<String, List<Integer>> m; }");
        let (field, _) = unit.types[0].node.fields().next().unwrap();
        assert_eq!(field.ty.node.to_string(), "Map<String, List<Integer>>");
    }

    #[test]
    fn parse_casts_and_parens() {
        assert!(matches!(parse_expr("(int) x"), Expr::Cast { .. }));
        assert!(matches!(parse_expr("(double) -x"), Expr::Cast { .. }));
        assert!(matches!(parse_expr("(Foo) obj"), Expr::Cast { .. }));
        assert!(matches!(parse_expr("(a) + b"), Expr::Binary { .. }));
        assert!(matches!(parse_expr("(a + b) * c"), Expr::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn parse_call_chains() {
        match parse_expr("b.setX(1).setY(2)") {
            Expr::MethodCall { scope: Some(scope), name, args } => {
                assert_eq!(name.node, "setY");
                assert_eq!(args.len(), 1);
                assert!(matches!(scope.node, Expr::MethodCall { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parse_array_creation_forms() {
        match parse_expr("new int[N][N + 10]") {
            Expr::ArrayCreation { dims, extra_dims, init, .. } => {
                assert_eq!(dims.len(), 2);
                assert_eq!(extra_dims, 0);
                assert!(init.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
        match parse_expr("new int[][] { {1}, {2, 3} }") {
            Expr::ArrayCreation { dims, extra_dims, init: Some(values), .. } => {
                assert!(dims.is_empty());
                assert_eq!(extra_dims, 2);
                assert_eq!(values.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parse_unsupported_expressions_still_parse() {
        assert!(matches!(parse_expr("x -> x + 1"), Expr::Lambda { .. }));
        assert!(matches!(parse_expr("(a, b) -> a"), Expr::Lambda { .. }));
        assert!(matches!(parse_expr("Foo::bar"), Expr::MethodRef { .. }));
        assert!(matches!(parse_expr("Foo.class"), Expr::ClassLit(_)));
        assert!(matches!(parse_expr("new Runnable() { public void run() { } }"), Expr::ObjectCreation { body: Some(_), .. }));
    }

    #[test]
    fn parse_ternary_and_assignment() {
        match parse_expr("x = c ? 1 : 2") {
            Expr::Assign { op: AssignOp::Assign, value, .. } => {
                assert!(matches!(value.node, Expr::Conditional { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(parse_expr("x += 2"), Expr::Assign { op: AssignOp::Add, .. }));
    }

    #[test]
    fn parse_enum_and_annotation_declarations_skip_bodies() {
        let unit = parse("enum Color { RED, GREEN; int x() { return 1; } } @interface Marker { int value(); }");
        assert_eq!(unit.types[0].node.kind, TypeKind::Enum);
        assert_eq!(unit.types[1].node.kind, TypeKind::Annotation);
        assert!(unit.types[1].node.members.is_empty());
    }

    #[test]
    fn parse_annotations_are_recorded() {
        let unit = parse("class A { @Override @SuppressWarnings(\"x\") public String toString() { return \"a\"; } }");
        let (_, m) = unit.types[0].node.methods().next().unwrap();
        let names: Vec<&str> = m.modifiers.annotations.iter().map(|a| a.node.as_str()).collect();
        assert_eq!(names, vec!["Override", "SuppressWarnings"]);
    }

    #[test]
    fn parse_error_reports_span() {
        let err = parse_source("class A { void f() { int x = ; } }").unwrap_err();
        match err {
            CompileError::Syntax { msg, .. } => assert!(msg.contains("expected expression"), "{msg}"),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }
}
