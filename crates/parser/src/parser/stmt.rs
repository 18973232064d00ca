//! Statement-level grammar productions.

use super::types::Parser;
use crate::ast::*;
use crate::error::{error, ErrorKind, ParseResult};
use crate::lexer::TokenKind;
use smallvec::SmallVec;
use text_size::TextRange;

impl<'a> Parser<'a> {
    /// Parse one logical statement line.
    ///
    /// Compound statements produce a single node; a simple-statement line
    /// may carry several statements separated by `;`, returned flat.
    pub(super) fn parse_stmt(&mut self) -> ParseResult<Vec<Stmt<'a>>> {
        match self.peek().kind {
            TokenKind::If => Ok(vec![self.parse_if()?]),
            TokenKind::While => Ok(vec![self.parse_while()?]),
            TokenKind::For => Ok(vec![self.parse_for()?]),
            TokenKind::Def => Ok(vec![self.parse_func_def(&[])?]),
            TokenKind::Class => Ok(vec![self.parse_class_def(&[])?]),
            TokenKind::Try => Ok(vec![self.parse_try()?]),
            TokenKind::With => Ok(vec![self.parse_with()?]),
            TokenKind::At => Ok(vec![self.parse_decorated()?]),
            _ => self.parse_simple_line(),
        }
    }

    /// A line of `;`-separated simple statements, terminated by a newline.
    fn parse_simple_line(&mut self) -> ParseResult<Vec<Stmt<'a>>> {
        let mut stmts = Vec::new();
        loop {
            stmts.push(self.parse_simple_stmt()?);
            if !self.match_token(TokenKind::Semicolon) {
                break;
            }
            if matches!(self.peek().kind, TokenKind::Newline | TokenKind::Eof) {
                break;
            }
        }
        if !self.is_at_end() {
            self.consume(TokenKind::Newline)?;
        }
        Ok(stmts)
    }

    fn parse_simple_stmt(&mut self) -> ParseResult<Stmt<'a>> {
        let token = self.peek();
        match token.kind {
            TokenKind::Return => {
                if !self.context.in_function {
                    return Err(error(ErrorKind::ReturnOutsideFunction, token.span));
                }
                self.advance();
                let value = if matches!(
                    self.peek().kind,
                    TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof
                ) {
                    None
                } else {
                    Some(self.parse_expr_list()?)
                };
                let end = value.as_ref().map(|v| v.span().end()).unwrap_or(token.end());
                Ok(Stmt::Return(ReturnStmt {
                    value,
                    span: TextRange::new(token.start(), end),
                }))
            }
            TokenKind::Pass => {
                self.advance();
                Ok(Stmt::Pass(token.span))
            }
            TokenKind::Break => {
                if !self.context.in_loop {
                    return Err(error(ErrorKind::BreakOutsideLoop, token.span));
                }
                self.advance();
                Ok(Stmt::Break(token.span))
            }
            TokenKind::Continue => {
                if !self.context.in_loop {
                    return Err(error(ErrorKind::ContinueOutsideLoop, token.span));
                }
                self.advance();
                Ok(Stmt::Continue(token.span))
            }
            TokenKind::Raise => {
                self.advance();
                let exc = if matches!(
                    self.peek().kind,
                    TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof
                ) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                let end = exc.as_ref().map(|e| e.span().end()).unwrap_or(token.end());
                Ok(Stmt::Raise(RaiseStmt {
                    exc,
                    span: TextRange::new(token.start(), end),
                }))
            }
            TokenKind::Global => {
                self.advance();
                let names = self.parse_name_list()?;
                Ok(Stmt::Global(GlobalStmt {
                    names,
                    span: token.span,
                }))
            }
            TokenKind::Nonlocal => {
                self.advance();
                let names = self.parse_name_list()?;
                Ok(Stmt::Nonlocal(NonlocalStmt {
                    names,
                    span: token.span,
                }))
            }
            _ => self.parse_expr_statement(),
        }
    }

    fn parse_name_list(&mut self) -> ParseResult<&'a [&'a str]> {
        let mut names: SmallVec<[&'a str; 2]> = SmallVec::new();
        names.push(self.consume_ident()?);
        while self.match_token(TokenKind::Comma) {
            names.push(self.consume_ident()?);
        }
        Ok(self.arena.alloc_slice_iter(names))
    }

    /// Expression statement, assignment (plain, chained, parallel),
    /// annotated declaration, or augmented assignment.
    fn parse_expr_statement(&mut self) -> ParseResult<Stmt<'a>> {
        let start = self.peek().span.start();
        let first = self.parse_expr_list()?;

        // x: T  |  x: T = e
        if self.peek().kind == TokenKind::Colon {
            self.advance();
            let annotation = self.parse_expression()?;
            let value = if self.match_token(TokenKind::Equal) {
                Some(self.parse_expr_list()?)
            } else {
                None
            };
            self.check_decl_target(&first)?;
            let end = value
                .as_ref()
                .map(|v| v.span().end())
                .unwrap_or_else(|| annotation.span().end());
            return Ok(Stmt::AnnAssign(AnnAssignStmt {
                target: first,
                annotation,
                value,
                span: TextRange::new(start, end),
            }));
        }

        // a = b = value  (chained; parallel via tuple targets)
        if self.peek().kind == TokenKind::Equal {
            let mut parts: SmallVec<[Expr<'a>; 2]> = SmallVec::new();
            parts.push(first);
            while self.match_token(TokenKind::Equal) {
                parts.push(self.parse_expr_list()?);
            }
            let value = parts.pop().unwrap();
            for target in &parts {
                self.check_assign_target(target)?;
            }
            let end = value.span().end();
            let targets = self.arena.alloc_slice_iter(parts);
            return Ok(Stmt::Assign(AssignStmt {
                targets,
                value,
                span: TextRange::new(start, end),
            }));
        }

        // x op= value
        if let Some(op) = aug_assign_op(self.peek().kind) {
            self.advance();
            self.check_assign_target(&first)?;
            if matches!(&first, Expr::Tuple(_) | Expr::List(_)) {
                return Err(error(ErrorKind::InvalidAssignmentTarget, first.span()));
            }
            let value = self.parse_expr_list()?;
            let end = value.span().end();
            return Ok(Stmt::AugAssign(AugAssignStmt {
                target: first,
                op,
                value,
                span: TextRange::new(start, end),
            }));
        }

        let span = first.span();
        Ok(Stmt::Expr(ExprStmt { value: first, span }))
    }

    /// An unparenthesized, comma-separated expression list (`a, b, c`),
    /// collapsing to the bare expression when there is no comma.
    pub(super) fn parse_expr_list(&mut self) -> ParseResult<Expr<'a>> {
        let start = self.peek().span.start();
        let first = self.parse_expression()?;
        if self.peek().kind != TokenKind::Comma {
            return Ok(first);
        }

        let mut elts = vec![first];
        while self.match_token(TokenKind::Comma) {
            if expr_list_ends(self.peek().kind) {
                break;
            }
            elts.push(self.parse_expression()?);
        }
        let end = elts.last().map(|e| e.span().end()).unwrap_or(start);
        Ok(Expr::Tuple(TupleExpr {
            elts: self.arena.alloc_slice_vec(elts),
            span: TextRange::new(start, end),
        }))
    }

    // ===== compound statements =====

    fn parse_if(&mut self) -> ParseResult<Stmt<'a>> {
        let start = self.peek().span.start();
        self.advance(); // if / elif
        let test = self.parse_expression()?;
        let body = self.parse_block()?;

        let orelse: &'a [Stmt<'a>] = match self.peek().kind {
            TokenKind::Elif => {
                let nested = self.parse_if()?;
                self.arena.alloc_slice_vec(vec![nested])
            }
            TokenKind::Else => {
                self.advance();
                self.parse_block()?
            }
            _ => &[],
        };

        let end = last_span_end(body, orelse, test.span().end());
        Ok(Stmt::If(IfStmt {
            test,
            body,
            orelse,
            span: TextRange::new(start, end),
        }))
    }

    fn parse_while(&mut self) -> ParseResult<Stmt<'a>> {
        let start = self.peek().span.start();
        self.consume(TokenKind::While)?;
        let test = self.parse_expression()?;

        let saved = self.context;
        self.context = self.context.enter_loop();
        let body = self.parse_block()?;
        self.context = saved;

        let orelse = self.parse_optional_else()?;
        let end = last_span_end(body, orelse, test.span().end());
        Ok(Stmt::While(WhileStmt {
            test,
            body,
            orelse,
            span: TextRange::new(start, end),
        }))
    }

    fn parse_for(&mut self) -> ParseResult<Stmt<'a>> {
        let start = self.peek().span.start();
        self.consume(TokenKind::For)?;
        let target = self.parse_target_list()?;
        self.consume(TokenKind::In)?;
        let iter = self.parse_expr_list()?;

        let saved = self.context;
        self.context = self.context.enter_loop();
        let body = self.parse_block()?;
        self.context = saved;

        let orelse = self.parse_optional_else()?;
        let end = last_span_end(body, orelse, iter.span().end());
        Ok(Stmt::For(ForStmt {
            target,
            iter,
            body,
            orelse,
            span: TextRange::new(start, end),
        }))
    }

    fn parse_optional_else(&mut self) -> ParseResult<&'a [Stmt<'a>]> {
        if self.match_token(TokenKind::Else) {
            self.parse_block()
        } else {
            Ok(&[])
        }
    }

    fn parse_decorated(&mut self) -> ParseResult<Stmt<'a>> {
        let mut decorators: SmallVec<[Expr<'a>; 2]> = SmallVec::new();
        while self.match_token(TokenKind::At) {
            decorators.push(self.parse_expression()?);
            self.consume(TokenKind::Newline)?;
        }
        let decorators = self.arena.alloc_slice_iter(decorators);

        match self.peek().kind {
            TokenKind::Def => self.parse_func_def(decorators),
            TokenKind::Class => self.parse_class_def(decorators),
            _ => {
                let found = self.peek();
                Err(error(
                    ErrorKind::UnexpectedToken {
                        expected: Some("'def' or 'class' after decorators".to_string()),
                        found: self.describe(found),
                    },
                    found.span,
                ))
            }
        }
    }

    fn parse_func_def(&mut self, decorators: &'a [Expr<'a>]) -> ParseResult<Stmt<'a>> {
        let start = self.peek().span.start();
        self.consume(TokenKind::Def)?;
        let name = self.consume_ident()?;
        self.consume(TokenKind::LeftParen)?;
        let params = self.parse_params()?;
        self.consume(TokenKind::RightParen)?;

        let returns = if self.match_token(TokenKind::Arrow) {
            let annotation = self.parse_expression()?;
            Some(&*self.arena.alloc(annotation))
        } else {
            None
        };

        let saved = self.context;
        self.context = self.context.enter_function();
        let body = self.parse_block()?;
        self.context = saved;

        let end = body.last().map(|s| s.span().end()).unwrap_or(start);
        Ok(Stmt::FuncDef(FuncDefStmt {
            name,
            params,
            returns,
            body,
            decorators,
            is_synthesized: false,
            span: TextRange::new(start, end),
        }))
    }

    pub(super) fn parse_params(&mut self) -> ParseResult<&'a [Param<'a>]> {
        let mut params: SmallVec<[Param<'a>; 8]> = SmallVec::new();

        while self.peek().kind == TokenKind::Ident {
            let name_token = self.peek();
            let name = self.consume_ident()?;

            let annotation = if self.match_token(TokenKind::Colon) {
                let ann = self.parse_expression()?;
                Some(&*self.arena.alloc(ann))
            } else {
                None
            };

            let default = if self.match_token(TokenKind::Equal) {
                let default = self.parse_expression()?;
                Some(&*self.arena.alloc(default))
            } else {
                None
            };

            params.push(Param {
                name,
                annotation,
                default,
                span: name_token.span,
            });

            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        Ok(self.arena.alloc_slice_iter(params))
    }

    fn parse_class_def(&mut self, decorators: &'a [Expr<'a>]) -> ParseResult<Stmt<'a>> {
        let start = self.peek().span.start();
        self.consume(TokenKind::Class)?;
        let name = self.consume_ident()?;

        let bases: &'a [Expr<'a>] = if self.match_token(TokenKind::LeftParen) {
            let mut bases: SmallVec<[Expr<'a>; 1]> = SmallVec::new();
            if self.peek().kind != TokenKind::RightParen {
                bases.push(self.parse_expression()?);
                while self.match_token(TokenKind::Comma) {
                    bases.push(self.parse_expression()?);
                }
            }
            self.consume(TokenKind::RightParen)?;
            if bases.len() > 1 {
                return Err(error(
                    ErrorKind::InvalidSyntax {
                        message: "multiple inheritance is not supported".to_string(),
                    },
                    TextRange::new(start, self.peek().span.start()),
                ));
            }
            self.arena.alloc_slice_iter(bases)
        } else {
            &[]
        };

        let body = self.parse_block()?;
        let end = body.last().map(|s| s.span().end()).unwrap_or(start);
        Ok(Stmt::ClassDef(ClassDefStmt {
            name,
            bases,
            body,
            decorators,
            span: TextRange::new(start, end),
        }))
    }

    fn parse_try(&mut self) -> ParseResult<Stmt<'a>> {
        let start = self.peek().span.start();
        self.consume(TokenKind::Try)?;
        let body = self.parse_block()?;

        let mut handlers: SmallVec<[ExceptHandler<'a>; 2]> = SmallVec::new();
        while self.peek().kind == TokenKind::Except {
            let handler_start = self.peek().span.start();
            self.advance();

            let ty = if self.peek().kind != TokenKind::Colon {
                Some(self.parse_expression()?)
            } else {
                None
            };
            let name = if self.match_token(TokenKind::As) {
                Some(self.consume_ident()?)
            } else {
                None
            };
            let handler_body = self.parse_block()?;
            let handler_end = handler_body
                .last()
                .map(|s| s.span().end())
                .unwrap_or(handler_start);
            handlers.push(ExceptHandler {
                ty,
                name,
                body: handler_body,
                span: TextRange::new(handler_start, handler_end),
            });
        }

        let orelse = self.parse_optional_else()?;
        let finalbody = if self.match_token(TokenKind::Finally) {
            self.parse_block()?
        } else {
            &[]
        };

        if handlers.is_empty() && finalbody.is_empty() {
            return Err(error(
                ErrorKind::InvalidSyntax {
                    message: "try statement needs an except or finally clause".to_string(),
                },
                TextRange::new(start, self.peek().span.start()),
            ));
        }

        let end = finalbody
            .last()
            .or_else(|| orelse.last())
            .map(|s| s.span().end())
            .or_else(|| handlers.last().map(|h| h.span.end()))
            .unwrap_or(start);
        Ok(Stmt::Try(TryStmt {
            body,
            handlers: self.arena.alloc_slice_iter(handlers),
            orelse,
            finalbody,
            span: TextRange::new(start, end),
        }))
    }

    fn parse_with(&mut self) -> ParseResult<Stmt<'a>> {
        let start = self.peek().span.start();
        self.consume(TokenKind::With)?;

        let mut items: SmallVec<[WithItem<'a>; 2]> = SmallVec::new();
        loop {
            let context = self.parse_expression()?;
            let target = if self.match_token(TokenKind::As) {
                Some(self.parse_target()?)
            } else {
                None
            };
            items.push(WithItem { context, target });
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        let body = self.parse_block()?;
        let end = body.last().map(|s| s.span().end()).unwrap_or(start);
        Ok(Stmt::With(WithStmt {
            items: self.arena.alloc_slice_iter(items),
            body,
            span: TextRange::new(start, end),
        }))
    }

    /// Parse a suite: `: NEWLINE INDENT stmt+ DEDENT` or a simple
    /// statement list on the same line.
    pub(super) fn parse_block(&mut self) -> ParseResult<&'a [Stmt<'a>]> {
        self.consume(TokenKind::Colon)?;

        if self.match_token(TokenKind::Newline) {
            if !self.match_token(TokenKind::Indent) {
                let found = self.peek();
                return Err(error(ErrorKind::ExpectedBlock, found.span));
            }

            let mut body = Vec::new();
            while !self.is_at_end() && self.peek().kind != TokenKind::Dedent {
                if self.peek().kind == TokenKind::Newline {
                    self.advance();
                    continue;
                }
                body.extend(self.parse_stmt()?);
            }
            self.consume(TokenKind::Dedent)?;

            if body.is_empty() {
                let found = self.peek();
                return Err(error(ErrorKind::ExpectedBlock, found.span));
            }
            Ok(self.arena.alloc_slice_vec(body))
        } else {
            // Simple-statement suite on the same line: `if x: a; b`
            let body = self.parse_simple_line()?;
            Ok(self.arena.alloc_slice_vec(body))
        }
    }

    // ===== assignment targets =====

    /// A `for` target list (`i` or `i, j`).
    pub(super) fn parse_target_list(&mut self) -> ParseResult<Expr<'a>> {
        let start = self.peek().span.start();
        let first = self.parse_target()?;
        if self.peek().kind != TokenKind::Comma {
            return Ok(first);
        }

        let mut elts = vec![first];
        while self.match_token(TokenKind::Comma) {
            if self.peek().kind == TokenKind::In {
                break;
            }
            elts.push(self.parse_target()?);
        }
        let end = elts.last().map(|e| e.span().end()).unwrap_or(start);
        Ok(Expr::Tuple(TupleExpr {
            elts: self.arena.alloc_slice_vec(elts),
            span: TextRange::new(start, end),
        }))
    }

    fn parse_target(&mut self) -> ParseResult<Expr<'a>> {
        let expr = self.parse_postfix_from_primary()?;
        self.check_assign_target(&expr)?;
        Ok(expr)
    }

    pub(super) fn check_assign_target(&mut self, expr: &Expr<'a>) -> ParseResult<()> {
        match expr {
            Expr::Name(_) | Expr::Attribute(_) | Expr::Subscript(_) => Ok(()),
            Expr::Tuple(t) => {
                for elt in t.elts {
                    self.check_assign_target(elt)?;
                }
                Ok(())
            }
            Expr::List(l) => {
                for elt in l.elts {
                    self.check_assign_target(elt)?;
                }
                Ok(())
            }
            other => Err(error(ErrorKind::InvalidAssignmentTarget, other.span())),
        }
    }

    /// Annotated declarations only accept simple targets.
    fn check_decl_target(&mut self, expr: &Expr<'a>) -> ParseResult<()> {
        match expr {
            Expr::Name(_) | Expr::Attribute(_) | Expr::Subscript(_) => Ok(()),
            other => Err(error(ErrorKind::InvalidAssignmentTarget, other.span())),
        }
    }
}

fn expr_list_ends(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Newline
            | TokenKind::Eof
            | TokenKind::Equal
            | TokenKind::Colon
            | TokenKind::Semicolon
            | TokenKind::RightParen
            | TokenKind::RightBracket
            | TokenKind::RightBrace
    )
}

fn aug_assign_op(kind: TokenKind) -> Option<&'static str> {
    use crate::ast::ops::*;
    Some(match kind {
        TokenKind::PlusEqual => OP_ADD,
        TokenKind::MinusEqual => OP_SUB,
        TokenKind::StarEqual => OP_MULT,
        TokenKind::SlashEqual => OP_DIV,
        TokenKind::DoubleSlashEqual => OP_FLOORDIV,
        TokenKind::PercentEqual => OP_MOD,
        TokenKind::DoubleStarEqual => OP_POW,
        TokenKind::AmpersandEqual => OP_BITAND,
        TokenKind::PipeEqual => OP_BITOR,
        TokenKind::CaretEqual => OP_BITXOR,
        TokenKind::LeftShiftEqual => OP_LSHIFT,
        TokenKind::RightShiftEqual => OP_RSHIFT,
        _ => return None,
    })
}

fn last_span_end(
    body: &[Stmt],
    orelse: &[Stmt],
    fallback: text_size::TextSize,
) -> text_size::TextSize {
    orelse
        .last()
        .or_else(|| body.last())
        .map(|s| s.span().end())
        .unwrap_or(fallback)
}
