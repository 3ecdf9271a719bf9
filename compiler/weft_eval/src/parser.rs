//! Recursive descent parser for the host language.
//!
//! Parses a statement list (a callable body). Precedence climbing for
//! binary operators, a small fixed lookahead to tell arrow-function
//! parameter lists apart from parenthesized expressions.

use crate::ast::{ArrowBody, AssignTarget, BinaryOp, Block, Expr, Stmt, UnaryOp};
use crate::error::SyntaxError;
use crate::lexer::{lex, Token, TokenKind};

/// Parse `source` as a statement list.
pub fn parse(source: &str) -> Result<Block, SyntaxError> {
    let tokens = lex(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        source_len: source.len(),
    };
    let mut stmts = Vec::new();
    while parser.peek().is_some() {
        stmts.push(parser.parse_stmt()?);
    }
    Ok(Block { stmts })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    source_len: usize,
}

impl Parser {
    fn kind_at(&self, index: usize) -> Option<&TokenKind> {
        self.tokens.get(index).map(|token| &token.kind)
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.kind_at(self.pos)
    }

    fn peek2(&self) -> Option<&TokenKind> {
        self.kind_at(self.pos + 1)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.source_len, |token| token.span.start)
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(message, self.offset())
    }

    fn advance(&mut self) -> Option<TokenKind> {
        let kind = self.tokens.get(self.pos).map(|token| token.kind.clone());
        if kind.is_some() {
            self.pos += 1;
        }
        kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<(), SyntaxError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, SyntaxError> {
        match self.peek() {
            Some(TokenKind::Ident(_)) => match self.advance() {
                Some(TokenKind::Ident(name)) => Ok(name),
                _ => unreachable!("peeked an identifier"),
            },
            _ => Err(self.error(format!("expected {what}"))),
        }
    }

    /// A statement terminator: `;`, or implicitly the end of the
    /// enclosing block / input.
    fn expect_terminator(&mut self) -> Result<(), SyntaxError> {
        if self.eat(&TokenKind::Semi)
            || matches!(self.peek(), None | Some(TokenKind::RBrace))
        {
            Ok(())
        } else {
            Err(self.error("expected `;`"))
        }
    }

    fn parse_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some(TokenKind::Semi) => {
                self.pos += 1;
                // Empty statement.
                Ok(Stmt::Block(Block { stmts: Vec::new() }))
            }
            Some(TokenKind::Let) => self.parse_let(),
            Some(TokenKind::Return) => {
                self.pos += 1;
                let value = if matches!(
                    self.peek(),
                    None | Some(TokenKind::Semi) | Some(TokenKind::RBrace)
                ) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect_terminator()?;
                Ok(Stmt::Return(value))
            }
            Some(TokenKind::Break) => {
                self.pos += 1;
                let label = if matches!(self.peek(), Some(TokenKind::Ident(_))) {
                    Some(self.expect_ident("label")?)
                } else {
                    None
                };
                self.expect_terminator()?;
                Ok(Stmt::Break { label })
            }
            Some(TokenKind::If) => self.parse_if(),
            Some(TokenKind::LBrace) => Ok(Stmt::Block(self.parse_block()?)),
            Some(TokenKind::Ident(_)) if self.peek2() == Some(&TokenKind::Colon) => {
                let label = self.expect_ident("label")?;
                self.expect(&TokenKind::Colon, "`:`")?;
                let body = self.parse_stmt()?;
                Ok(Stmt::Labeled {
                    label,
                    body: Box::new(body),
                })
            }
            Some(_) => self.parse_expr_stmt(),
        }
    }

    fn parse_let(&mut self) -> Result<Stmt, SyntaxError> {
        self.expect(&TokenKind::Let, "`let`")?;
        let mut bindings = Vec::new();
        loop {
            let name = self.expect_ident("binding name")?;
            self.expect(&TokenKind::Assign, "`=`")?;
            let value = self.parse_expr()?;
            bindings.push((name, value));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect_terminator()?;
        Ok(Stmt::Let { bindings })
    }

    fn parse_if(&mut self) -> Result<Stmt, SyntaxError> {
        self.expect(&TokenKind::If, "`if`")?;
        self.expect(&TokenKind::LParen, "`(`")?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "`)`")?;
        let then_branch = Box::new(self.parse_stmt()?);
        let else_branch = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    fn parse_block(&mut self) -> Result<Block, SyntaxError> {
        self.expect(&TokenKind::LBrace, "`{`")?;
        let mut stmts = Vec::new();
        while !matches!(self.peek(), None | Some(TokenKind::RBrace)) {
            stmts.push(self.parse_stmt()?);
        }
        self.expect(&TokenKind::RBrace, "`}`")?;
        Ok(Block { stmts })
    }

    fn parse_expr_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let expr = self.parse_expr()?;
        if self.eat(&TokenKind::Assign) {
            let target = match expr {
                Expr::Ident(name) => AssignTarget::Name(name),
                Expr::Member { object, member } => AssignTarget::Member {
                    object: *object,
                    member,
                },
                _ => return Err(self.error("invalid assignment target")),
            };
            let value = self.parse_expr()?;
            self.expect_terminator()?;
            return Ok(Stmt::Assign { target, value });
        }
        self.expect_terminator()?;
        Ok(Stmt::Expr(expr))
    }

    fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_equality()
    }

    fn parse_equality(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::EqEq) => BinaryOp::Eq,
                Some(TokenKind::NotEq) => BinaryOp::Ne,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_comparison()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Lt) => BinaryOp::Lt,
                Some(TokenKind::Le) => BinaryOp::Le,
                Some(TokenKind::Gt) => BinaryOp::Gt,
                Some(TokenKind::Ge) => BinaryOp::Ge,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_additive()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        let op = match self.peek() {
            Some(TokenKind::Minus) => Some(UnaryOp::Neg),
            Some(TokenKind::Bang) => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Some(TokenKind::LParen) => {
                    self.pos += 1;
                    let mut args = Vec::new();
                    if self.peek() != Some(&TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            if !self.eat(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(&TokenKind::RParen, "`)`")?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                Some(TokenKind::Dot) => {
                    self.pos += 1;
                    let member = self.expect_ident("member name")?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        member,
                    };
                }
                Some(TokenKind::LBracket) => {
                    self.pos += 1;
                    let index = self.parse_expr()?;
                    self.expect(&TokenKind::RBracket, "`]`")?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        match self.peek() {
            Some(TokenKind::Str(_)) => match self.advance() {
                Some(TokenKind::Str(value)) => Ok(Expr::Str(value)),
                _ => unreachable!("peeked a string"),
            },
            Some(TokenKind::Int(value)) => {
                let value = *value;
                self.pos += 1;
                Ok(Expr::Int(value))
            }
            Some(TokenKind::Float(value)) => {
                let value = *value;
                self.pos += 1;
                Ok(Expr::Float(value))
            }
            Some(TokenKind::True) => {
                self.pos += 1;
                Ok(Expr::Bool(true))
            }
            Some(TokenKind::False) => {
                self.pos += 1;
                Ok(Expr::Bool(false))
            }
            Some(TokenKind::Ident(_)) => {
                let name = self.expect_ident("identifier")?;
                Ok(Expr::Ident(name))
            }
            Some(TokenKind::LParen) => {
                if self.arrow_ahead() {
                    return self.parse_arrow();
                }
                self.pos += 1;
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "`)`")?;
                Ok(inner)
            }
            _ => Err(self.error("expected an expression")),
        }
    }

    /// At a `(`: does a parameter list followed by `=>` start here?
    fn arrow_ahead(&self) -> bool {
        let mut i = self.pos + 1;
        loop {
            match self.kind_at(i) {
                Some(TokenKind::RParen) => {
                    return self.kind_at(i + 1) == Some(&TokenKind::FatArrow);
                }
                Some(TokenKind::Ident(_)) => match self.kind_at(i + 1) {
                    Some(TokenKind::Comma) => i += 2,
                    Some(TokenKind::RParen) => {
                        return self.kind_at(i + 2) == Some(&TokenKind::FatArrow);
                    }
                    _ => return false,
                },
                _ => return false,
            }
        }
    }

    fn parse_arrow(&mut self) -> Result<Expr, SyntaxError> {
        self.expect(&TokenKind::LParen, "`(`")?;
        let mut params = Vec::new();
        if self.peek() != Some(&TokenKind::RParen) {
            loop {
                params.push(self.expect_ident("parameter name")?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "`)`")?;
        self.expect(&TokenKind::FatArrow, "`=>`")?;
        let body = if self.peek() == Some(&TokenKind::LBrace) {
            ArrowBody::Block(self.parse_block()?)
        } else {
            ArrowBody::Expr(Box::new(self.parse_expr()?))
        };
        Ok(Expr::Arrow { params, body })
    }
}
