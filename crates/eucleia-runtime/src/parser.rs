//! Parsing (tokens to AST)
//!
//! Recursive descent for statements, precedence climbing for expressions.
//! Parse errors are collected as diagnostics; the parser synchronizes at
//! statement boundaries and keeps going so a single run reports as much as
//! possible.

use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Parser state for building an AST from tokens
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    diagnostics: Vec<Diagnostic>,
}

/// Operator precedence levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Or,         // ||
    And,        // &&
    Equality,   // == !=
    Comparison, // < <= > >=
    Term,       // + -
    Factor,     // * / %
}

fn binary_precedence(kind: TokenKind) -> Option<(Precedence, BinaryOp)> {
    let entry = match kind {
        TokenKind::PipePipe => (Precedence::Or, BinaryOp::Or),
        TokenKind::AmpAmp => (Precedence::And, BinaryOp::And),
        TokenKind::EqualEqual => (Precedence::Equality, BinaryOp::Equal),
        TokenKind::BangEqual => (Precedence::Equality, BinaryOp::NotEqual),
        TokenKind::Less => (Precedence::Comparison, BinaryOp::Less),
        TokenKind::LessEqual => (Precedence::Comparison, BinaryOp::LessEqual),
        TokenKind::Greater => (Precedence::Comparison, BinaryOp::Greater),
        TokenKind::GreaterEqual => (Precedence::Comparison, BinaryOp::GreaterEqual),
        TokenKind::Plus => (Precedence::Term, BinaryOp::Add),
        TokenKind::Minus => (Precedence::Term, BinaryOp::Sub),
        TokenKind::Star => (Precedence::Factor, BinaryOp::Mul),
        TokenKind::Slash => (Precedence::Factor, BinaryOp::Div),
        TokenKind::Percent => (Precedence::Factor, BinaryOp::Mod),
        _ => return None,
    };
    Some(entry)
}

impl Parser {
    /// Create a new parser for the given tokens
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Parse tokens into a program
    pub fn parse(&mut self) -> (Program, Vec<Diagnostic>) {
        let mut stmts = Vec::new();

        while !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(_) => self.synchronize(),
            }
        }

        (Program { stmts }, std::mem::take(&mut self.diagnostics))
    }

    // === Statements ===

    fn parse_statement(&mut self) -> Result<Stmt, ()> {
        match self.peek().kind {
            TokenKind::Func => Ok(Stmt::Function(self.parse_function()?)),
            TokenKind::Struct => self.parse_struct(),
            TokenKind::Class => self.parse_class(),
            TokenKind::If => Ok(Stmt::If(self.parse_if()?)),
            TokenKind::While => self.parse_while(),
            TokenKind::Do => self.parse_do_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Break => {
                let span = self.advance().span;
                self.consume(TokenKind::Semicolon, "Expected ';' after 'break'")?;
                Ok(Stmt::Break(span))
            }
            TokenKind::Return => self.parse_return(),
            TokenKind::Import => self.parse_import(),
            TokenKind::LeftBrace => {
                let block = self.parse_block()?;
                Ok(Stmt::Block(block))
            }
            _ => {
                let stmt = self.parse_simple_statement()?;
                self.consume(TokenKind::Semicolon, "Expected ';' after statement")?;
                Ok(stmt)
            }
        }
    }

    /// Statement without trailing `;`: variable declaration, assignment, or
    /// bare expression (also used for `for` init/step slots)
    fn parse_simple_statement(&mut self) -> Result<Stmt, ()> {
        if self.check(TokenKind::Identifier) && self.check_next(TokenKind::Identifier) {
            return self.parse_var_decl();
        }

        let expr = self.parse_expression()?;
        if self.match_token(TokenKind::Equal) {
            let target = self.assign_target_from(expr)?;
            let value = self.parse_expression()?;
            let span = target_span(&target).merge(value.span());
            return Ok(Stmt::Assign(Assign {
                target,
                value,
                span,
            }));
        }

        Ok(Stmt::Expr(ExprStmt {
            span: expr.span(),
            expr,
        }))
    }

    /// `type name (= expr)?` — builtin declaration or user-type instantiation
    fn parse_var_decl(&mut self) -> Result<Stmt, ()> {
        let type_token = self.consume_identifier("a type name")?;
        let type_ref = TypeRef {
            name: type_token.lexeme.clone(),
            span: type_token.span,
        };
        let name_token = self.consume_identifier("a variable name")?;
        let name = Identifier {
            name: name_token.lexeme.clone(),
            span: name_token.span,
        };

        let init = if self.match_token(TokenKind::Equal) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        let end_span = init.as_ref().map(Expr::span).unwrap_or(name.span);
        Ok(Stmt::VarDecl(VarDecl {
            span: type_ref.span.merge(end_span),
            type_ref,
            name,
            init,
        }))
    }

    /// Rewrite a parsed expression into an assignment target
    fn assign_target_from(&mut self, expr: Expr) -> Result<AssignTarget, ()> {
        match expr {
            Expr::Identifier(id) => Ok(AssignTarget::Name(id)),
            Expr::Index(index) => match *index.target {
                Expr::Identifier(id) => Ok(AssignTarget::Index {
                    target: id,
                    index: index.index,
                    span: index.span,
                }),
                _ => self.error_at(index.span, "Indexed assignment target must be a variable"),
            },
            Expr::Member(member) => Ok(AssignTarget::Member {
                target: member.target,
                field: member.field,
                span: member.span,
            }),
            other => self.error_at(other.span(), "Invalid assignment target"),
        }
    }

    fn parse_function(&mut self) -> Result<FunctionDecl, ()> {
        let func_span = self.consume(TokenKind::Func, "Expected 'func'")?.span;

        let name_token = self.consume_identifier("a function name")?;
        let name = Identifier {
            name: name_token.lexeme.clone(),
            span: name_token.span,
        };

        self.consume(TokenKind::LeftParen, "Expected '(' after function name")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                let type_token = self.consume_identifier("a parameter type")?;
                let type_ref = TypeRef {
                    name: type_token.lexeme.clone(),
                    span: type_token.span,
                };
                let param_token = self.consume_identifier("a parameter name")?;
                params.push(Param {
                    span: type_ref.span.merge(param_token.span),
                    type_ref,
                    name: Identifier {
                        name: param_token.lexeme.clone(),
                        span: param_token.span,
                    },
                });

                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')' after parameters")?;

        let body = self.parse_block()?;
        let span = func_span.merge(body.span);
        Ok(FunctionDecl {
            name,
            params,
            body,
            span,
        })
    }

    fn parse_struct(&mut self) -> Result<Stmt, ()> {
        let struct_span = self.consume(TokenKind::Struct, "Expected 'struct'")?.span;
        let (name, parent) = self.parse_type_header()?;

        self.consume(TokenKind::LeftBrace, "Expected '{' after struct name")?;
        let mut fields = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            fields.push(self.parse_field()?);
        }
        let close = self.consume(TokenKind::RightBrace, "Expected '}' after struct fields")?;

        Ok(Stmt::Struct(StructDecl {
            span: struct_span.merge(close.span),
            name,
            parent,
            fields,
        }))
    }

    fn parse_class(&mut self) -> Result<Stmt, ()> {
        let class_span = self.consume(TokenKind::Class, "Expected 'class'")?.span;
        let (name, parent) = self.parse_type_header()?;

        self.consume(TokenKind::LeftBrace, "Expected '{' after class name")?;
        let mut fields = Vec::new();
        let mut methods = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if self.check(TokenKind::Func) {
                methods.push(self.parse_function()?);
            } else {
                fields.push(self.parse_field()?);
            }
        }
        let close = self.consume(TokenKind::RightBrace, "Expected '}' after class body")?;

        Ok(Stmt::Class(ClassDecl {
            span: class_span.merge(close.span),
            name,
            parent,
            fields,
            methods,
        }))
    }

    /// `Name (: Parent)?` for struct/class definitions
    fn parse_type_header(&mut self) -> Result<(Identifier, Option<Identifier>), ()> {
        let name_token = self.consume_identifier("a type name")?;
        let name = Identifier {
            name: name_token.lexeme.clone(),
            span: name_token.span,
        };
        let parent = if self.match_token(TokenKind::Colon) {
            let parent_token = self.consume_identifier("a parent type name")?;
            Some(Identifier {
                name: parent_token.lexeme.clone(),
                span: parent_token.span,
            })
        } else {
            None
        };
        Ok((name, parent))
    }

    /// `type name (= expr)? ;` inside a struct/class body
    fn parse_field(&mut self) -> Result<FieldDecl, ()> {
        let type_token = self.consume_identifier("a field type")?;
        let type_ref = TypeRef {
            name: type_token.lexeme.clone(),
            span: type_token.span,
        };
        let name_token = self.consume_identifier("a field name")?;
        let name = Identifier {
            name: name_token.lexeme.clone(),
            span: name_token.span,
        };
        let init = if self.match_token(TokenKind::Equal) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let semi = self.consume(TokenKind::Semicolon, "Expected ';' after field")?;
        Ok(FieldDecl {
            span: type_ref.span.merge(semi.span),
            type_ref,
            name,
            init,
        })
    }

    fn parse_if(&mut self) -> Result<IfStmt, ()> {
        let if_span = self.consume(TokenKind::If, "Expected 'if'")?.span;
        self.consume(TokenKind::LeftParen, "Expected '(' after 'if'")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after condition")?;
        let then_block = self.parse_block()?;

        let mut end_span = then_block.span;
        let else_branch = if self.match_token(TokenKind::Else) {
            if self.check(TokenKind::If) {
                let nested = self.parse_if()?;
                end_span = nested.span;
                Some(ElseBranch::ElseIf(Box::new(nested)))
            } else {
                let block = self.parse_block()?;
                end_span = block.span;
                Some(ElseBranch::Else(block))
            }
        } else {
            None
        };

        Ok(IfStmt {
            span: if_span.merge(end_span),
            condition,
            then_block,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ()> {
        let while_span = self.consume(TokenKind::While, "Expected 'while'")?.span;
        self.consume(TokenKind::LeftParen, "Expected '(' after 'while'")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after condition")?;
        let body = self.parse_block()?;
        Ok(Stmt::While(WhileStmt {
            span: while_span.merge(body.span),
            condition,
            body,
        }))
    }

    fn parse_do_while(&mut self) -> Result<Stmt, ()> {
        let do_span = self.consume(TokenKind::Do, "Expected 'do'")?.span;
        let body = self.parse_block()?;
        self.consume(TokenKind::While, "Expected 'while' after do-block")?;
        self.consume(TokenKind::LeftParen, "Expected '(' after 'while'")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after condition")?;
        let semi = self.consume(TokenKind::Semicolon, "Expected ';' after do-while")?;
        Ok(Stmt::DoWhile(DoWhileStmt {
            span: do_span.merge(semi.span),
            body,
            condition,
        }))
    }

    fn parse_for(&mut self) -> Result<Stmt, ()> {
        let for_span = self.consume(TokenKind::For, "Expected 'for'")?.span;
        self.consume(TokenKind::LeftParen, "Expected '(' after 'for'")?;
        let init = self.parse_simple_statement()?;
        self.consume(TokenKind::Semicolon, "Expected ';' after for-init")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::Semicolon, "Expected ';' after for-condition")?;
        let step = self.parse_simple_statement()?;
        self.consume(TokenKind::RightParen, "Expected ')' after for-step")?;
        let body = self.parse_block()?;
        Ok(Stmt::For(ForStmt {
            span: for_span.merge(body.span),
            init: Box::new(init),
            condition,
            step: Box::new(step),
            body,
        }))
    }

    fn parse_return(&mut self) -> Result<Stmt, ()> {
        let return_span = self.consume(TokenKind::Return, "Expected 'return'")?.span;
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let semi = self.consume(TokenKind::Semicolon, "Expected ';' after return")?;
        Ok(Stmt::Return(ReturnStmt {
            span: return_span.merge(semi.span),
            value,
        }))
    }

    /// `import <module>` or `import "file"` (trailing `;` optional)
    fn parse_import(&mut self) -> Result<Stmt, ()> {
        let import_span = self.consume(TokenKind::Import, "Expected 'import'")?.span;
        let (kind, end_span) = if self.match_token(TokenKind::Less) {
            let name_token = self.consume_identifier("a module name")?;
            let name = Identifier {
                name: name_token.lexeme.clone(),
                span: name_token.span,
            };
            let close = self.consume(TokenKind::Greater, "Expected '>' after module name")?;
            (ImportKind::Module(name), close.span)
        } else if self.check(TokenKind::String) {
            let path_token = self.advance().clone();
            (ImportKind::File(path_token.lexeme.clone()), path_token.span)
        } else {
            return self.error("Expected '<module>' or a file path after 'import'");
        };
        self.match_token(TokenKind::Semicolon);
        Ok(Stmt::Import(ImportDecl {
            span: import_span.merge(end_span),
            kind,
        }))
    }

    fn parse_block(&mut self) -> Result<Block, ()> {
        let open = self.consume(TokenKind::LeftBrace, "Expected '{'")?.span;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(_) => self.synchronize(),
            }
        }
        let close = self.consume(TokenKind::RightBrace, "Expected '}'")?.span;
        Ok(Block {
            stmts,
            span: open.merge(close),
        })
    }

    // === Expressions ===

    fn parse_expression(&mut self) -> Result<Expr, ()> {
        self.parse_precedence(Precedence::Lowest)
    }

    fn parse_precedence(&mut self, min: Precedence) -> Result<Expr, ()> {
        let mut left = self.parse_unary()?;

        while let Some((precedence, op)) = binary_precedence(self.peek().kind) {
            if precedence <= min {
                break;
            }
            self.advance();
            let right = self.parse_precedence(precedence)?;
            let span = left.span().merge(right.span());
            left = Expr::Binary(BinaryExpr {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            });
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ()> {
        match self.peek().kind {
            TokenKind::Bang | TokenKind::Minus => {
                let op_token = self.advance().clone();
                let op = if op_token.kind == TokenKind::Bang {
                    UnaryOp::Not
                } else {
                    UnaryOp::Neg
                };
                let operand = self.parse_unary()?;
                let span = op_token.span.merge(operand.span());
                Ok(Expr::Unary(UnaryExpr {
                    op,
                    operand: Box::new(operand),
                    span,
                }))
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let op_token = self.advance().clone();
                let op = if op_token.kind == TokenKind::PlusPlus {
                    IncDecOp::Increment
                } else {
                    IncDecOp::Decrement
                };
                let operand = self.parse_unary()?;
                let target = self.inc_dec_target(operand)?;
                let span = op_token.span.merge(target.span);
                Ok(Expr::IncDec(IncDecExpr { op, target, span }))
            }
            _ => self.parse_postfix(),
        }
    }

    /// The operand of `++`/`--` must name a variable
    fn inc_dec_target(&mut self, operand: Expr) -> Result<Identifier, ()> {
        match operand {
            Expr::Identifier(id) => Ok(id),
            other => {
                let span = other.span();
                self.error_at(span, "'++'/'--' operand must be a variable")
            }
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, ()> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek().kind {
                TokenKind::LeftParen => {
                    let callee = match expr {
                        Expr::Identifier(id) => id,
                        other => {
                            let span = other.span();
                            return self.error_at(span, "Only named functions are callable");
                        }
                    };
                    self.advance();
                    let (args, close) = self.parse_args()?;
                    let span = callee.span.merge(close);
                    expr = Expr::Call(CallExpr { callee, args, span });
                }
                TokenKind::Dot => {
                    let target = match expr {
                        Expr::Identifier(id) => id,
                        other => {
                            let span = other.span();
                            return self.error_at(span, "Member access target must be a variable");
                        }
                    };
                    self.advance();
                    let field_token = self.consume_identifier("a member name")?;
                    let field = Identifier {
                        name: field_token.lexeme.clone(),
                        span: field_token.span,
                    };
                    if self.match_token(TokenKind::LeftParen) {
                        let (args, close) = self.parse_args()?;
                        let span = target.span.merge(close);
                        expr = Expr::MethodCall(MethodCallExpr {
                            target,
                            method: field,
                            args,
                            span,
                        });
                    } else {
                        let span = target.span.merge(field.span);
                        expr = Expr::Member(MemberExpr {
                            target,
                            field,
                            span,
                        });
                    }
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    let close = self.consume(TokenKind::RightBracket, "Expected ']' after index")?;
                    let span = expr.span().merge(close.span);
                    expr = Expr::Index(IndexExpr {
                        target: Box::new(expr),
                        index: Box::new(index),
                        span,
                    });
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let op_token = self.advance().clone();
                    let op = if op_token.kind == TokenKind::PlusPlus {
                        IncDecOp::Increment
                    } else {
                        IncDecOp::Decrement
                    };
                    let target = self.inc_dec_target(expr)?;
                    let span = target.span.merge(op_token.span);
                    expr = Expr::IncDec(IncDecExpr { op, target, span });
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Comma-separated arguments up to `)`; returns the closing span
    fn parse_args(&mut self) -> Result<(Vec<Expr>, Span), ()> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        let close = self.consume(TokenKind::RightParen, "Expected ')' after arguments")?;
        Ok((args, close.span))
    }

    fn parse_primary(&mut self) -> Result<Expr, ()> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Int => {
                self.advance();
                match token.lexeme.parse::<i64>() {
                    Ok(n) => Ok(Expr::Literal(Literal::Int(n), token.span)),
                    Err(_) => self.error_at(token.span, "Integer literal out of range"),
                }
            }
            TokenKind::Float => {
                self.advance();
                match token.lexeme.parse::<f64>() {
                    Ok(f) => Ok(Expr::Literal(Literal::Float(f), token.span)),
                    Err(_) => self.error_at(token.span, "Invalid float literal"),
                }
            }
            TokenKind::String => {
                self.advance();
                Ok(Expr::Literal(Literal::String(token.lexeme), token.span))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(true), token.span))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(false), token.span))
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(Expr::Identifier(Identifier {
                    name: token.lexeme,
                    span: token.span,
                }))
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expression()?;
                let close = self.consume(TokenKind::RightParen, "Expected ')' after expression")?;
                let span = token.span.merge(close.span);
                Ok(Expr::Group(GroupExpr {
                    expr: Box::new(inner),
                    span,
                }))
            }
            TokenKind::LeftBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(TokenKind::RightBracket) {
                    loop {
                        elements.push(self.parse_expression()?);
                        if !self.match_token(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                let close =
                    self.consume(TokenKind::RightBracket, "Expected ']' after array elements")?;
                Ok(Expr::ArrayLiteral(ArrayLiteral {
                    elements,
                    span: token.span.merge(close.span),
                }))
            }
            _ => self.error(&format!("Unexpected token '{}'", token.lexeme)),
        }
    }

    // === Helpers ===

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn check_next(&self, kind: TokenKind) -> bool {
        self.tokens
            .get(self.current + 1)
            .is_some_and(|token| token.kind == kind)
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        &self.tokens[self.current - 1]
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            return true;
        }
        false
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<&Token, ()> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let span = self.peek().span;
        self.diagnostics.push(Diagnostic::error(message, span));
        Err(())
    }

    fn consume_identifier(&mut self, what: &str) -> Result<Token, ()> {
        if self.check(TokenKind::Identifier) {
            return Ok(self.advance().clone());
        }
        let span = self.peek().span;
        self.diagnostics
            .push(Diagnostic::error(format!("Expected {}", what), span));
        Err(())
    }

    fn error<T>(&mut self, message: &str) -> Result<T, ()> {
        let span = self.peek().span;
        self.error_at(span, message)
    }

    fn error_at<T>(&mut self, span: Span, message: &str) -> Result<T, ()> {
        self.diagnostics.push(Diagnostic::error(message, span));
        Err(())
    }

    /// Skip to the next statement boundary after a parse error
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            if self.advance().kind == TokenKind::Semicolon {
                return;
            }
            match self.peek().kind {
                TokenKind::Func
                | TokenKind::Struct
                | TokenKind::Class
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::For
                | TokenKind::Break
                | TokenKind::Return
                | TokenKind::Import
                | TokenKind::RightBrace => return,
                _ => {}
            }
        }
    }
}

fn target_span(target: &AssignTarget) -> Span {
    match target {
        AssignTarget::Name(id) => id.span,
        AssignTarget::Index { span, .. } => *span,
        AssignTarget::Member { span, .. } => *span,
    }
}
