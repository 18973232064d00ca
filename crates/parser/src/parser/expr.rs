//! Expression grammar: a precedence ladder from `lambda` down to primaries.

use super::types::Parser;
use crate::ast::ops::*;
use crate::ast::*;
use crate::error::{error, ErrorKind, ParseResult};
use crate::lexer::{Token, TokenKind};
use smallvec::SmallVec;
use text_size::TextRange;

impl<'a> Parser<'a> {
    pub(super) fn parse_expression(&mut self) -> ParseResult<Expr<'a>> {
        if self.peek().kind == TokenKind::Lambda {
            return self.parse_lambda();
        }
        self.parse_ternary()
    }

    fn parse_lambda(&mut self) -> ParseResult<Expr<'a>> {
        let start = self.peek().span.start();
        self.consume(TokenKind::Lambda)?;
        let params = self.parse_params()?;
        self.consume(TokenKind::Colon)?;
        let body = self.parse_expression()?;
        let end = body.span().end();
        Ok(Expr::Lambda(LambdaExpr {
            params,
            body: self.arena.alloc(body),
            span: TextRange::new(start, end),
        }))
    }

    /// `body if test else orelse`
    fn parse_ternary(&mut self) -> ParseResult<Expr<'a>> {
        let body = self.parse_or()?;
        if !self.match_token(TokenKind::If) {
            return Ok(body);
        }
        let test = self.parse_or()?;
        self.consume(TokenKind::Else)?;
        let orelse = self.parse_expression()?;
        let span = TextRange::new(body.span().start(), orelse.span().end());
        Ok(Expr::IfExp(IfExpExpr {
            test: self.arena.alloc(test),
            body: self.arena.alloc(body),
            orelse: self.arena.alloc(orelse),
            span,
        }))
    }

    /// A chain of `or` collapses to one flat node so short-circuiting
    /// reads off a single operand list.
    fn parse_or(&mut self) -> ParseResult<Expr<'a>> {
        let first = self.parse_and()?;
        if self.peek().kind != TokenKind::Or {
            return Ok(first);
        }

        let mut values: SmallVec<[Expr<'a>; 4]> = SmallVec::new();
        values.push(first);
        while self.match_token(TokenKind::Or) {
            values.push(self.parse_and()?);
        }
        let span = TextRange::new(
            values[0].span().start(),
            values.last().unwrap().span().end(),
        );
        Ok(Expr::BoolOp(BoolOpExpr {
            op: OP_OR,
            values: self.arena.alloc_slice_iter(values),
            span,
        }))
    }

    fn parse_and(&mut self) -> ParseResult<Expr<'a>> {
        let first = self.parse_not()?;
        if self.peek().kind != TokenKind::And {
            return Ok(first);
        }

        let mut values: SmallVec<[Expr<'a>; 4]> = SmallVec::new();
        values.push(first);
        while self.match_token(TokenKind::And) {
            values.push(self.parse_not()?);
        }
        let span = TextRange::new(
            values[0].span().start(),
            values.last().unwrap().span().end(),
        );
        Ok(Expr::BoolOp(BoolOpExpr {
            op: OP_AND,
            values: self.arena.alloc_slice_iter(values),
            span,
        }))
    }

    fn parse_not(&mut self) -> ParseResult<Expr<'a>> {
        if self.peek().kind == TokenKind::Not {
            let start = self.peek().span.start();
            self.advance();
            let operand = self.parse_not()?;
            let end = operand.span().end();
            return Ok(Expr::UnaryOp(UnaryOpExpr {
                op: OP_NOT,
                operand: self.arena.alloc(operand),
                span: TextRange::new(start, end),
            }));
        }
        self.parse_comparison()
    }

    /// Cascaded comparisons (`a < b <= c`) accumulate into parallel
    /// operator and comparand lists on a single node.
    fn parse_comparison(&mut self) -> ParseResult<Expr<'a>> {
        let left = self.parse_bitor()?;
        if self.comparison_op(self.peek()).is_none() {
            return Ok(left);
        }

        let mut ops: SmallVec<[&'a str; 2]> = SmallVec::new();
        let mut comparators: SmallVec<[Expr<'a>; 2]> = SmallVec::new();
        while let Some(op) = self.comparison_op(self.peek()) {
            self.consume_comparison_op();
            ops.push(op);
            comparators.push(self.parse_bitor()?);
        }

        let span = TextRange::new(
            left.span().start(),
            comparators.last().unwrap().span().end(),
        );
        Ok(Expr::Compare(CompareExpr {
            left: self.arena.alloc(left),
            ops: self.arena.alloc_slice_iter(ops),
            comparators: self.arena.alloc_slice_iter(comparators),
            span,
        }))
    }

    fn comparison_op(&self, token: Token) -> Option<&'static str> {
        Some(match token.kind {
            TokenKind::EqualEqual => OP_EQ,
            TokenKind::NotEqual => OP_NE,
            TokenKind::Less => OP_LT,
            TokenKind::LessEqual => OP_LE,
            TokenKind::Greater => OP_GT,
            TokenKind::GreaterEqual => OP_GE,
            TokenKind::In => OP_IN,
            TokenKind::Is => {
                if self.peek_next().kind == TokenKind::Not {
                    OP_ISNOT
                } else {
                    OP_IS
                }
            }
            TokenKind::Not => {
                if self.peek_next().kind == TokenKind::In {
                    OP_NOTIN
                } else {
                    return None;
                }
            }
            _ => return None,
        })
    }

    fn consume_comparison_op(&mut self) {
        // Two-word operators take a second token.
        match self.peek().kind {
            TokenKind::Is if self.peek_next().kind == TokenKind::Not => {
                self.advance();
                self.advance();
            }
            TokenKind::Not => {
                self.advance();
                self.advance();
            }
            _ => {
                self.advance();
            }
        }
    }

    fn parse_bitor(&mut self) -> ParseResult<Expr<'a>> {
        let mut left = self.parse_bitxor()?;
        while self.peek().kind == TokenKind::Pipe {
            self.advance();
            let right = self.parse_bitxor()?;
            left = self.binop(left, OP_BITOR, right);
        }
        Ok(left)
    }

    fn parse_bitxor(&mut self) -> ParseResult<Expr<'a>> {
        let mut left = self.parse_bitand()?;
        while self.peek().kind == TokenKind::Caret {
            self.advance();
            let right = self.parse_bitand()?;
            left = self.binop(left, OP_BITXOR, right);
        }
        Ok(left)
    }

    fn parse_bitand(&mut self) -> ParseResult<Expr<'a>> {
        let mut left = self.parse_shift()?;
        while self.peek().kind == TokenKind::Ampersand {
            self.advance();
            let right = self.parse_shift()?;
            left = self.binop(left, OP_BITAND, right);
        }
        Ok(left)
    }

    fn parse_shift(&mut self) -> ParseResult<Expr<'a>> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::LeftShift => OP_LSHIFT,
                TokenKind::RightShift => OP_RSHIFT,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = self.binop(left, op, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr<'a>> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => OP_ADD,
                TokenKind::Minus => OP_SUB,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = self.binop(left, op, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr<'a>> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => OP_MULT,
                TokenKind::Slash => OP_DIV,
                TokenKind::DoubleSlash => OP_FLOORDIV,
                TokenKind::Percent => OP_MOD,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = self.binop(left, op, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr<'a>> {
        let token = self.peek();
        let op = match token.kind {
            TokenKind::Plus => OP_UADD,
            TokenKind::Minus => OP_USUB,
            TokenKind::Tilde => OP_INVERT,
            _ => return self.parse_power(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        let end = operand.span().end();
        Ok(Expr::UnaryOp(UnaryOpExpr {
            op,
            operand: self.arena.alloc(operand),
            span: TextRange::new(token.start(), end),
        }))
    }

    /// Power is right-associative and binds its base through postfix
    /// operators first.
    fn parse_power(&mut self) -> ParseResult<Expr<'a>> {
        let base = self.parse_postfix_from_primary()?;
        if !self.match_token(TokenKind::DoubleStar) {
            return Ok(base);
        }
        let exponent = self.parse_unary()?;
        Ok(self.binop(base, OP_POW, exponent))
    }

    fn binop(&self, left: Expr<'a>, op: &'a str, right: Expr<'a>) -> Expr<'a> {
        let span = TextRange::new(left.span().start(), right.span().end());
        Expr::BinOp(BinOpExpr {
            left: self.arena.alloc(left),
            op,
            right: self.arena.alloc(right),
            span,
        })
    }

    /// Primary followed by any number of calls, attribute accesses, and
    /// subscripts.
    pub(super) fn parse_postfix_from_primary(&mut self) -> ParseResult<Expr<'a>> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek().kind {
                TokenKind::LeftParen => {
                    expr = self.parse_call(expr)?;
                }
                TokenKind::Dot => {
                    self.advance();
                    let attr_token = self.peek();
                    let attr = self.consume_ident()?;
                    let span = TextRange::new(expr.span().start(), attr_token.end());
                    expr = Expr::Attribute(AttributeExpr {
                        value: self.arena.alloc(expr),
                        attr,
                        span,
                    });
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let slice = self.parse_subscript_index()?;
                    let close = self.consume(TokenKind::RightBracket)?;
                    let span = TextRange::new(expr.span().start(), close.end());
                    expr = Expr::Subscript(SubscriptExpr {
                        value: self.arena.alloc(expr),
                        slice: self.arena.alloc(slice),
                        span,
                    });
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_call(&mut self, func: Expr<'a>) -> ParseResult<Expr<'a>> {
        self.consume(TokenKind::LeftParen)?;

        let mut args: SmallVec<[Expr<'a>; 4]> = SmallVec::new();
        let mut keywords: SmallVec<[Keyword<'a>; 2]> = SmallVec::new();
        while self.peek().kind != TokenKind::RightParen {
            if self.peek().kind == TokenKind::Ident && self.peek_next().kind == TokenKind::Equal {
                let arg = self.consume_ident()?;
                self.consume(TokenKind::Equal)?;
                let value = self.parse_expression()?;
                keywords.push(Keyword { arg, value });
            } else {
                let value = self.parse_expression()?;
                if !keywords.is_empty() {
                    return Err(error(
                        ErrorKind::InvalidSyntax {
                            message: "positional argument follows keyword argument".to_string(),
                        },
                        value.span(),
                    ));
                }
                args.push(value);
            }
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        let close = self.consume(TokenKind::RightParen)?;

        let span = TextRange::new(func.span().start(), close.end());
        Ok(Expr::Call(CallExpr {
            func: self.arena.alloc(func),
            args: self.arena.alloc_slice_iter(args),
            keywords: self.arena.alloc_slice_iter(keywords),
            span,
        }))
    }

    /// Index expression inside `[...]`: a plain expression or a
    /// `lower:upper:step` slice with any part omitted.
    fn parse_subscript_index(&mut self) -> ParseResult<Expr<'a>> {
        let start = self.peek().span.start();

        let lower = if matches!(self.peek().kind, TokenKind::Colon) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        if !self.match_token(TokenKind::Colon) {
            return match lower {
                Some(expr) => Ok(expr),
                None => {
                    let found = self.peek();
                    Err(error(ErrorKind::ExpectedExpression, found.span))
                }
            };
        }

        let upper = if matches!(self.peek().kind, TokenKind::Colon | TokenKind::RightBracket) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let step = if self.match_token(TokenKind::Colon) {
            if self.peek().kind == TokenKind::RightBracket {
                None
            } else {
                Some(self.parse_expression()?)
            }
        } else {
            None
        };

        let end = self.peek().span.start();
        Ok(Expr::Slice(SliceExpr {
            lower: lower.map(|e| &*self.arena.alloc(e)),
            upper: upper.map(|e| &*self.arena.alloc(e)),
            step: step.map(|e| &*self.arena.alloc(e)),
            span: TextRange::new(start, end),
        }))
    }

    fn parse_primary(&mut self) -> ParseResult<Expr<'a>> {
        let token = self.peek();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                let value = self.text(token);
                let kind = if value.contains('.') || value.contains('e') || value.contains('E') {
                    ConstantKind::Float
                } else {
                    ConstantKind::Int
                };
                Ok(Expr::Constant(ConstantExpr {
                    value,
                    kind,
                    span: token.span,
                }))
            }
            TokenKind::String => {
                self.advance();
                Ok(Expr::Constant(ConstantExpr {
                    value: self.text(token),
                    kind: ConstantKind::Str,
                    span: token.span,
                }))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Constant(ConstantExpr {
                    value: CONST_TRUE,
                    kind: ConstantKind::Bool,
                    span: token.span,
                }))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Constant(ConstantExpr {
                    value: CONST_FALSE,
                    kind: ConstantKind::Bool,
                    span: token.span,
                }))
            }
            TokenKind::None => {
                self.advance();
                Ok(Expr::Constant(ConstantExpr {
                    value: CONST_NONE,
                    kind: ConstantKind::None,
                    span: token.span,
                }))
            }
            TokenKind::Ident => {
                self.advance();
                Ok(Expr::Name(NameExpr {
                    id: self.text(token),
                    span: token.span,
                }))
            }
            TokenKind::LeftParen => self.parse_paren(),
            TokenKind::LeftBracket => self.parse_list_display(),
            TokenKind::LeftBrace => self.parse_brace_display(),
            TokenKind::Eof | TokenKind::Newline => {
                Err(error(ErrorKind::ExpectedExpression, token.span))
            }
            _ => Err(error(
                ErrorKind::UnexpectedToken {
                    expected: Some("an expression".to_string()),
                    found: self.describe(token),
                },
                token.span,
            )),
        }
    }

    /// `(...)`: grouping, the empty tuple, a tuple display, or a
    /// generator expression when a `for` follows the first element.
    fn parse_paren(&mut self) -> ParseResult<Expr<'a>> {
        let open = self.consume(TokenKind::LeftParen)?;

        if self.peek().kind == TokenKind::RightParen {
            let close = self.advance();
            return Ok(Expr::Tuple(TupleExpr {
                elts: &[],
                span: TextRange::new(open.start(), close.end()),
            }));
        }

        let first = self.parse_expression()?;

        if self.peek().kind == TokenKind::For {
            let generators = self.parse_comprehension_clauses()?;
            let close = self.consume(TokenKind::RightParen)?;
            return Ok(Expr::GeneratorExp(CompExpr {
                elt: self.arena.alloc(first),
                generators,
                span: TextRange::new(open.start(), close.end()),
            }));
        }

        if self.peek().kind == TokenKind::Comma {
            let mut elts = vec![first];
            while self.match_token(TokenKind::Comma) {
                if self.peek().kind == TokenKind::RightParen {
                    break;
                }
                elts.push(self.parse_expression()?);
            }
            let close = self.consume(TokenKind::RightParen)?;
            return Ok(Expr::Tuple(TupleExpr {
                elts: self.arena.alloc_slice_vec(elts),
                span: TextRange::new(open.start(), close.end()),
            }));
        }

        self.consume(TokenKind::RightParen)?;
        Ok(first)
    }

    /// `[...]`: list display or list comprehension.
    fn parse_list_display(&mut self) -> ParseResult<Expr<'a>> {
        let open = self.consume(TokenKind::LeftBracket)?;

        if self.peek().kind == TokenKind::RightBracket {
            let close = self.advance();
            return Ok(Expr::List(ListExpr {
                elts: &[],
                span: TextRange::new(open.start(), close.end()),
            }));
        }

        let first = self.parse_expression()?;

        if self.peek().kind == TokenKind::For {
            let generators = self.parse_comprehension_clauses()?;
            let close = self.consume(TokenKind::RightBracket)?;
            return Ok(Expr::ListComp(CompExpr {
                elt: self.arena.alloc(first),
                generators,
                span: TextRange::new(open.start(), close.end()),
            }));
        }

        let mut elts = vec![first];
        while self.match_token(TokenKind::Comma) {
            if self.peek().kind == TokenKind::RightBracket {
                break;
            }
            elts.push(self.parse_expression()?);
        }
        let close = self.consume(TokenKind::RightBracket)?;
        Ok(Expr::List(ListExpr {
            elts: self.arena.alloc_slice_vec(elts),
            span: TextRange::new(open.start(), close.end()),
        }))
    }

    /// `{...}`: dict or set display, or their comprehension forms. An
    /// empty brace pair is a dict.
    fn parse_brace_display(&mut self) -> ParseResult<Expr<'a>> {
        let open = self.consume(TokenKind::LeftBrace)?;

        if self.peek().kind == TokenKind::RightBrace {
            let close = self.advance();
            return Ok(Expr::Dict(DictExpr {
                keys: &[],
                values: &[],
                span: TextRange::new(open.start(), close.end()),
            }));
        }

        let first = self.parse_expression()?;

        if self.match_token(TokenKind::Colon) {
            let first_value = self.parse_expression()?;

            if self.peek().kind == TokenKind::For {
                let generators = self.parse_comprehension_clauses()?;
                let close = self.consume(TokenKind::RightBrace)?;
                return Ok(Expr::DictComp(DictCompExpr {
                    key: self.arena.alloc(first),
                    value: self.arena.alloc(first_value),
                    generators,
                    span: TextRange::new(open.start(), close.end()),
                }));
            }

            let mut keys = vec![first];
            let mut values = vec![first_value];
            while self.match_token(TokenKind::Comma) {
                if self.peek().kind == TokenKind::RightBrace {
                    break;
                }
                keys.push(self.parse_expression()?);
                self.consume(TokenKind::Colon)?;
                values.push(self.parse_expression()?);
            }
            let close = self.consume(TokenKind::RightBrace)?;
            return Ok(Expr::Dict(DictExpr {
                keys: self.arena.alloc_slice_vec(keys),
                values: self.arena.alloc_slice_vec(values),
                span: TextRange::new(open.start(), close.end()),
            }));
        }

        if self.peek().kind == TokenKind::For {
            let generators = self.parse_comprehension_clauses()?;
            let close = self.consume(TokenKind::RightBrace)?;
            return Ok(Expr::SetComp(CompExpr {
                elt: self.arena.alloc(first),
                generators,
                span: TextRange::new(open.start(), close.end()),
            }));
        }

        let mut elts = vec![first];
        while self.match_token(TokenKind::Comma) {
            if self.peek().kind == TokenKind::RightBrace {
                break;
            }
            elts.push(self.parse_expression()?);
        }
        let close = self.consume(TokenKind::RightBrace)?;
        Ok(Expr::Set(SetExpr {
            elts: self.arena.alloc_slice_vec(elts),
            span: TextRange::new(open.start(), close.end()),
        }))
    }

    /// One or more `for target in iter [if cond]*` clauses.
    fn parse_comprehension_clauses(&mut self) -> ParseResult<&'a [Comprehension<'a>]> {
        let mut generators: SmallVec<[Comprehension<'a>; 1]> = SmallVec::new();
        while self.match_token(TokenKind::For) {
            let target = self.parse_target_list()?;
            self.consume(TokenKind::In)?;
            let iter = self.parse_or()?;

            // Conditions are parsed below the ternary level so a trailing
            // `if` always belongs to the comprehension.
            let mut ifs: SmallVec<[Expr<'a>; 1]> = SmallVec::new();
            while self.match_token(TokenKind::If) {
                ifs.push(self.parse_or()?);
            }

            generators.push(Comprehension {
                target,
                iter,
                ifs: self.arena.alloc_slice_iter(ifs),
            });
        }
        Ok(self.arena.alloc_slice_iter(generators))
    }
}
