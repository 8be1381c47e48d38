//! Recursive-descent expression parser.
//!
//! Precedence, lowest to highest: `?:` (right-assoc), `||`, `&&`,
//! relations, additive, multiplicative, unary, postfix. Operators become
//! global calls on the reserved names in `pel_ir::operators`; the `has`,
//! `all`, and `exists` macros are expanded here so downstream passes only
//! ever see the canonical tree.

use logos::Logos;

use pel_ir::{
    operators, Ast, Comprehension, Constant, ExprArena, ExprId, ExprKind, FieldInit, MapEntry,
    Name, SharedInterner, Span,
};

use crate::error::ParseError;
use crate::token::Token;

/// Accumulator variable used by quantifier macro expansions.
const ACCU_VAR: &str = "__result__";

/// Parse one expression; the whole source must be consumed.
pub fn parse(source: &str, interner: SharedInterner) -> Result<Ast, ParseError> {
    let mut tokens = Vec::new();
    for (result, range) in Token::lexer(source).spanned() {
        let span = Span::new(range.start as u32, range.end as u32);
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => return Err(ParseError::new("unrecognized token", span)),
        }
    }
    let end = Span::new(source.len() as u32, source.len() as u32);
    let mut parser = Parser {
        tokens,
        pos: 0,
        end,
        arena: ExprArena::new(),
        interner: interner.clone(),
    };
    let root = parser.parse_ternary()?;
    if let Some((_, span)) = parser.peek_with_span() {
        return Err(ParseError::new("unexpected trailing input", span));
    }
    Ok(Ast::new(parser.arena, root, interner))
}

struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    end: Span,
    arena: ExprArena,
    interner: SharedInterner,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_with_span(&self) -> Option<(&Token, Span)> {
        self.tokens.get(self.pos).map(|(t, s)| (t, *s))
    }

    fn advance(&mut self) -> Option<(Token, Span)> {
        let entry = self.tokens.get(self.pos).cloned();
        if entry.is_some() {
            self.pos += 1;
        }
        entry
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<Span, ParseError> {
        match self.advance() {
            Some((t, span)) if &t == token => Ok(span),
            Some((t, span)) => Err(ParseError::new(format!("expected {what}, found {t:?}"), span)),
            None => Err(ParseError::new(format!("expected {what}, found end of input"), self.end)),
        }
    }

    fn span_of(&self, id: ExprId) -> Span {
        self.arena.get(id).span
    }

    fn op(&self, name: &str) -> Name {
        self.interner.intern(name)
    }

    fn binary(&mut self, op: &str, lhs: ExprId, rhs: ExprId) -> ExprId {
        let span = self.span_of(lhs).cover(self.span_of(rhs));
        let function = self.op(op);
        self.arena.new_call(function, [lhs, rhs], span)
    }

    // ── Precedence levels ──────────────────────────────────────

    fn parse_ternary(&mut self) -> Result<ExprId, ParseError> {
        let cond = self.parse_or()?;
        if !self.eat(&Token::Question) {
            return Ok(cond);
        }
        let then = self.parse_ternary()?;
        self.expect(&Token::Colon, "`:`")?;
        let otherwise = self.parse_ternary()?;
        let span = self.span_of(cond).cover(self.span_of(otherwise));
        let function = self.op(operators::CONDITIONAL);
        Ok(self.arena.new_call(function, [cond, then, otherwise], span))
    }

    fn parse_or(&mut self) -> Result<ExprId, ParseError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::OrOr) {
            let rhs = self.parse_and()?;
            lhs = self.binary(operators::LOGICAL_OR, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<ExprId, ParseError> {
        let mut lhs = self.parse_relation()?;
        while self.eat(&Token::AndAnd) {
            let rhs = self.parse_relation()?;
            lhs = self.binary(operators::LOGICAL_AND, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_relation(&mut self) -> Result<ExprId, ParseError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => operators::EQUALS,
                Some(Token::NotEq) => operators::NOT_EQUALS,
                Some(Token::Less) => operators::LESS,
                Some(Token::LessEq) => operators::LESS_EQUALS,
                Some(Token::Greater) => operators::GREATER,
                Some(Token::GreaterEq) => operators::GREATER_EQUALS,
                Some(Token::In) => operators::IN,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_additive()?;
            lhs = self.binary(op, lhs, rhs);
        }
    }

    fn parse_additive(&mut self) -> Result<ExprId, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => operators::ADD,
                Some(Token::Minus) => operators::SUBTRACT,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = self.binary(op, lhs, rhs);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<ExprId, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => operators::MULTIPLY,
                Some(Token::Slash) => operators::DIVIDE,
                Some(Token::Percent) => operators::MODULO,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = self.binary(op, lhs, rhs);
        }
    }

    fn parse_unary(&mut self) -> Result<ExprId, ParseError> {
        let (op, span) = match self.peek_with_span() {
            Some((Token::Bang, span)) => (operators::LOGICAL_NOT, span),
            Some((Token::Minus, span)) => (operators::NEGATE, span),
            _ => return self.parse_postfix(),
        };
        self.pos += 1;
        let operand = self.parse_unary()?;
        let span = span.cover(self.span_of(operand));
        let function = self.op(op);
        Ok(self.arena.new_call(function, [operand], span))
    }

    fn parse_postfix(&mut self) -> Result<ExprId, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(&Token::Dot) {
                expr = self.parse_member(expr)?;
            } else if self.eat(&Token::LBracket) {
                let index = self.parse_ternary()?;
                let close = self.expect(&Token::RBracket, "`]`")?;
                let span = self.span_of(expr).cover(close);
                let function = self.op(operators::INDEX);
                expr = self.arena.new_call(function, [expr, index], span);
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_member(&mut self, operand: ExprId) -> Result<ExprId, ParseError> {
        let (name, name_span) = self.expect_ident("field or method name")?;
        if self.peek() == Some(&Token::LParen) {
            let (args, close) = self.parse_call_args()?;
            let span = self.span_of(operand).cover(close);
            return match name.as_str() {
                "all" | "exists" => self.expand_quantifier(operand, &name, args, span),
                _ => {
                    let function = self.interner.intern(&name);
                    Ok(self.arena.new_member_call(operand, function, args, span))
                }
            };
        }
        let field = self.interner.intern(&name);
        let span = self.span_of(operand).cover(name_span);
        Ok(self.arena.new_select(operand, field, span))
    }

    fn parse_primary(&mut self) -> Result<ExprId, ParseError> {
        let Some((token, span)) = self.advance() else {
            return Err(ParseError::new("unexpected end of input", self.end));
        };
        match token {
            Token::Int(v) => Ok(self.arena.new_literal(Constant::Int(v), span)),
            Token::Uint(v) => Ok(self.arena.new_literal(Constant::Uint(v), span)),
            Token::Double(v) => Ok(self.arena.new_literal(Constant::Double(v), span)),
            Token::String(s) => {
                let name = self.interner.intern(&s);
                Ok(self.arena.new_literal(Constant::String(name), span))
            }
            Token::True => Ok(self.arena.new_literal(Constant::Bool(true), span)),
            Token::False => Ok(self.arena.new_literal(Constant::Bool(false), span)),
            Token::Null => Ok(self.arena.new_literal(Constant::Null, span)),
            Token::Ident(name) => self.parse_ident_start(name, span),
            Token::LParen => {
                let inner = self.parse_ternary()?;
                self.expect(&Token::RParen, "`)`")?;
                Ok(inner)
            }
            Token::LBracket => self.parse_list(span),
            Token::LBrace => self.parse_map(span),
            other => Err(ParseError::new(format!("unexpected token {other:?}"), span)),
        }
    }

    fn parse_ident_start(&mut self, name: String, span: Span) -> Result<ExprId, ParseError> {
        if self.peek() == Some(&Token::LParen) {
            let (args, close) = self.parse_call_args()?;
            let span = span.cover(close);
            if name == "has" {
                return self.expand_has(args, span);
            }
            let function = self.interner.intern(&name);
            return Ok(self.arena.new_call(function, args, span));
        }
        if self.peek() == Some(&Token::LBrace) {
            self.pos += 1;
            return self.parse_struct(name, span);
        }
        let ident = self.interner.intern(&name);
        Ok(self.arena.new_ident(ident, span))
    }

    fn parse_call_args(&mut self) -> Result<(Vec<ExprId>, Span), ParseError> {
        self.expect(&Token::LParen, "`(`")?;
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            let close = self.expect(&Token::RParen, "`)`")?;
            return Ok((args, close));
        }
        loop {
            args.push(self.parse_ternary()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        let close = self.expect(&Token::RParen, "`)`")?;
        Ok((args, close))
    }

    fn parse_list(&mut self, open: Span) -> Result<ExprId, ParseError> {
        let mut elems = Vec::new();
        if self.peek() != Some(&Token::RBracket) {
            loop {
                elems.push(self.parse_ternary()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
                if self.peek() == Some(&Token::RBracket) {
                    break;
                }
            }
        }
        let close = self.expect(&Token::RBracket, "`]`")?;
        Ok(self.arena.new_list(elems, open.cover(close)))
    }

    fn parse_map(&mut self, open: Span) -> Result<ExprId, ParseError> {
        let mut entries = Vec::new();
        if self.peek() != Some(&Token::RBrace) {
            loop {
                let key = self.parse_ternary()?;
                self.expect(&Token::Colon, "`:`")?;
                let value = self.parse_ternary()?;
                entries.push(MapEntry { key, value });
                if !self.eat(&Token::Comma) {
                    break;
                }
                if self.peek() == Some(&Token::RBrace) {
                    break;
                }
            }
        }
        let close = self.expect(&Token::RBrace, "`}`")?;
        Ok(self.arena.new_map(entries, open.cover(close)))
    }

    fn parse_struct(&mut self, type_name: String, open: Span) -> Result<ExprId, ParseError> {
        let mut fields = Vec::new();
        if self.peek() != Some(&Token::RBrace) {
            loop {
                let (field, _) = self.expect_ident("field name")?;
                self.expect(&Token::Colon, "`:`")?;
                let value = self.parse_ternary()?;
                fields.push(FieldInit { field: self.interner.intern(&field), value });
                if !self.eat(&Token::Comma) {
                    break;
                }
                if self.peek() == Some(&Token::RBrace) {
                    break;
                }
            }
        }
        let close = self.expect(&Token::RBrace, "`}`")?;
        let name = self.interner.intern(&type_name);
        Ok(self.arena.new_struct(name, fields, open.cover(close)))
    }

    fn expect_ident(&mut self, what: &str) -> Result<(String, Span), ParseError> {
        match self.advance() {
            Some((Token::Ident(name), span)) => Ok((name, span)),
            Some((t, span)) => Err(ParseError::new(format!("expected {what}, found {t:?}"), span)),
            None => Err(ParseError::new(format!("expected {what}, found end of input"), self.end)),
        }
    }

    // ── Macro expansion ────────────────────────────────────────

    /// `has(e)`: `e` must be a plain field selection, which is re-flagged
    /// in place as a presence test. The select node keeps its id.
    fn expand_has(&mut self, args: Vec<ExprId>, span: Span) -> Result<ExprId, ParseError> {
        if args.len() != 1 {
            return Err(ParseError::new("has() requires exactly one argument", span));
        }
        let arg = args[0];
        match self.arena.kind(arg) {
            ExprKind::Select { operand, field, test_only: false } => {
                self.arena.set_kind(arg, ExprKind::Select { operand, field, test_only: true });
                Ok(arg)
            }
            _ => Err(ParseError::new("has() argument must be a field selection", span)),
        }
    }

    /// `r.all(x, p)` / `r.exists(x, p)`: expand to the canonical fold with
    /// a logical-and / logical-or accumulator.
    fn expand_quantifier(
        &mut self,
        range: ExprId,
        name: &str,
        args: Vec<ExprId>,
        span: Span,
    ) -> Result<ExprId, ParseError> {
        if args.len() != 2 {
            return Err(ParseError::new(
                format!("{name}() requires an iteration variable and a predicate"),
                span,
            ));
        }
        let iter_var = match self.arena.kind(args[0]) {
            ExprKind::Ident(n) => n,
            _ => {
                return Err(ParseError::new(
                    format!("{name}() iteration variable must be a simple identifier"),
                    self.span_of(args[0]),
                ))
            }
        };
        let accu_var = self.interner.intern(ACCU_VAR);
        let (init, step_op) = match name {
            "all" => (true, operators::LOGICAL_AND),
            _ => (false, operators::LOGICAL_OR),
        };
        let accu_init = self.arena.new_bool(init, span);
        let loop_cond = {
            let accu_ref = self.arena.new_ident(accu_var, span);
            if name == "all" {
                accu_ref
            } else {
                let not = self.op(operators::LOGICAL_NOT);
                self.arena.new_call(not, [accu_ref], span)
            }
        };
        let loop_step = {
            let accu_ref = self.arena.new_ident(accu_var, span);
            let function = self.op(step_op);
            self.arena.new_call(function, [accu_ref, args[1]], span)
        };
        let result = self.arena.new_ident(accu_var, span);
        let comp = Comprehension {
            iter_var,
            iter_range: range,
            accu_var,
            accu_init,
            loop_cond,
            loop_step,
            result,
        };
        Ok(self.arena.new_comprehension(comp, span))
    }
}
