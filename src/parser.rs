use crate::expr::{self, Expr};
use crate::object::Object;
use crate::stmt::{self, Stmt};
use crate::token::Token;
use crate::token_type::TokenType::{self, self as TT};

use std::cell::RefCell;

use anyhow::Result;
use gc::Gc;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("parse error")]
struct ParseError;

pub struct Parser<F>
where
    F: FnMut(&Token, &str),
{
    tokens: Vec<Gc<Token>>,
    current: RefCell<usize>,
    error_handler: RefCell<F>,
}

impl<F> Parser<F>
where
    F: FnMut(&Token, &str),
{
    pub fn new(tokens: Vec<Gc<Token>>, error_handler: F) -> Self {
        Self {
            tokens,
            current: 0.into(),
            error_handler: error_handler.into(),
        }
    }

    /// There is no synchronisation: the first hard parse error ends the
    /// parse.
    pub fn parse(self) -> Result<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            statements.push(self.declaration()?);
        }
        Ok(statements)
    }

    fn declaration(&self) -> Result<Stmt> {
        if self.match_(&[TT::Class]) {
            return self.class_declaration();
        }
        if self.match_(&[TT::Fun]) {
            return Ok(Stmt::Function(self.function("function")?));
        }
        if self.match_(&[TT::Var]) {
            return self.var_declaration();
        }
        self.statement()
    }

    fn class_declaration(&self) -> Result<Stmt> {
        let name = self.consume(TT::Identifier, "Expect class name.")?;

        let superclass = if self.match_(&[TT::Less]) {
            self.consume(TT::Identifier, "Expect superclass name.")?;
            Some(Gc::new(expr::Variable::new(self.previous())))
        } else {
            None
        };

        self.consume(TT::LeftBrace, "Expect '{' before class body.")?;

        let mut methods = Vec::new();
        while !self.check(TT::RightBrace) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(TT::RightBrace, "Expect '}' after class body.")?;
        Ok(stmt::Class::make(name, superclass, methods))
    }

    fn function(&self, kind: &str) -> Result<Gc<stmt::Function>> {
        let name = self.consume(TT::Identifier, &format!("Expect {kind} name."))?;
        self.consume(TT::LeftParen, &format!("Expect '(' after {kind} name."))?;

        let mut params = Vec::new();
        if !self.check(TT::RightParen) {
            loop {
                if params.len() >= 255 {
                    self.error(&self.peek(), "Can't have more than 255 parameters.");
                }
                params.push(self.consume(TT::Identifier, "Expect parameter name.")?);
                if !self.match_(&[TT::Comma]) {
                    break;
                }
            }
        }
        self.consume(TT::RightParen, "Expect ')' after parameters.")?;

        self.consume(TT::LeftBrace, &format!("Expect '{{' before {kind} body."))?;
        let body = self.block()?;
        Ok(Gc::new(stmt::Function::new(name, params, body)))
    }

    fn var_declaration(&self) -> Result<Stmt> {
        let name = self.consume(TT::Identifier, "Expect variable name.")?;

        let initializer = if self.match_(&[TT::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TT::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(stmt::Var::make(name, initializer))
    }

    fn statement(&self) -> Result<Stmt> {
        if self.match_(&[TT::For]) {
            return self.for_statement();
        }
        if self.match_(&[TT::If]) {
            return self.if_statement();
        }
        if self.match_(&[TT::Print]) {
            return self.print_statement();
        }
        if self.match_(&[TT::Return]) {
            return self.return_statement();
        }
        if self.match_(&[TT::While]) {
            return self.while_statement();
        }
        if self.match_(&[TT::LeftBrace]) {
            return Ok(stmt::Block::make(self.block()?));
        }
        self.expression_statement()
    }

    /// `for` desugars into an initializer-prefixed `while`: a missing
    /// condition becomes literal `true`, a missing increment collapses the
    /// inner block to the bare body.
    fn for_statement(&self) -> Result<Stmt> {
        self.consume(TT::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.match_(&[TT::Semicolon]) {
            None
        } else if self.match_(&[TT::Var]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(TT::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TT::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if !self.check(TT::RightParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TT::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = stmt::Block::make(vec![body, stmt::Expression::make(increment)]);
        }

        let condition = condition
            .unwrap_or_else(|| expr::Literal::make(Gc::new(Object::Boolean(true))));
        body = stmt::While::make(condition, body);

        if let Some(initializer) = initializer {
            body = stmt::Block::make(vec![initializer, body]);
        }

        Ok(body)
    }

    fn if_statement(&self) -> Result<Stmt> {
        self.consume(TT::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TT::RightParen, "Expect ')' after if condition.")?;

        let then_branch = self.statement()?;
        let else_branch = if self.match_(&[TT::Else]) {
            Some(self.statement()?)
        } else {
            None
        };

        Ok(stmt::If::make(condition, then_branch, else_branch))
    }

    fn print_statement(&self) -> Result<Stmt> {
        let value = self.expression()?;
        self.consume(TT::Semicolon, "Expect ';' after value.")?;
        Ok(stmt::Print::make(value))
    }

    fn return_statement(&self) -> Result<Stmt> {
        let keyword = self.previous();
        let value = if !self.check(TT::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TT::Semicolon, "Expect ';' after return value.")?;
        Ok(stmt::Return::make(keyword, value))
    }

    fn while_statement(&self) -> Result<Stmt> {
        self.consume(TT::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TT::RightParen, "Expect ')' after condition.")?;
        let body = self.statement()?;

        Ok(stmt::While::make(condition, body))
    }

    fn block(&self) -> Result<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.check(TT::RightBrace) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }

        self.consume(TT::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn expression_statement(&self) -> Result<Stmt> {
        let expr = self.expression()?;
        self.consume(TT::Semicolon, "Expect ';' after expression.")?;
        Ok(stmt::Expression::make(expr))
    }

    fn expression(&self) -> Result<Expr> {
        self.assignment()
    }

    /// Right-associative. The LHS is parsed as an ordinary expression and
    /// reinterpreted once `=` is seen: a variable becomes an assignment
    /// target, a property get becomes a property set.
    fn assignment(&self) -> Result<Expr> {
        let expr = self.or()?;

        if self.match_(&[TT::Equal]) {
            let equals = self.previous();
            let value = self.assignment()?;

            match &expr {
                Expr::Variable(ex) => {
                    return Ok(expr::Assign::make(ex.name.clone(), value));
                }
                Expr::Get(ex) => {
                    return Ok(expr::Set::make(
                        ex.object.clone(),
                        ex.name.clone(),
                        value,
                    ));
                }
                _ => {
                    self.error(&equals, "Invalid assignment target.");
                }
            }
        }

        Ok(expr)
    }

    fn or(&self) -> Result<Expr> {
        let mut expr = self.and()?;

        while self.match_(&[TT::Or]) {
            let operator = self.previous();
            let right = self.and()?;
            expr = expr::Logical::make(expr, operator, right);
        }

        Ok(expr)
    }

    fn and(&self) -> Result<Expr> {
        let mut expr = self.equality()?;

        while self.match_(&[TT::And]) {
            let operator = self.previous();
            let right = self.equality()?;
            expr = expr::Logical::make(expr, operator, right);
        }

        Ok(expr)
    }

    fn equality(&self) -> Result<Expr> {
        let mut expr = self.comparison()?;

        while self.match_(&[TT::BangEqual, TT::EqualEqual]) {
            let operator = self.previous();
            let right = self.comparison()?;
            expr = expr::Binary::make(expr, operator, right);
        }

        Ok(expr)
    }

    fn comparison(&self) -> Result<Expr> {
        let mut expr = self.term()?;

        while self.match_(&[TT::Greater, TT::GreaterEqual, TT::Less, TT::LessEqual]) {
            let operator = self.previous();
            let right = self.term()?;
            expr = expr::Binary::make(expr, operator, right);
        }

        Ok(expr)
    }

    fn term(&self) -> Result<Expr> {
        let mut expr = self.factor()?;

        while self.match_(&[TT::Minus, TT::Plus]) {
            let operator = self.previous();
            let right = self.factor()?;
            expr = expr::Binary::make(expr, operator, right);
        }

        Ok(expr)
    }

    fn factor(&self) -> Result<Expr> {
        let mut expr = self.unary()?;

        while self.match_(&[TT::Slash, TT::Star]) {
            let operator = self.previous();
            let right = self.unary()?;
            expr = expr::Binary::make(expr, operator, right);
        }

        Ok(expr)
    }

    fn unary(&self) -> Result<Expr> {
        if self.match_(&[TT::Bang, TT::Minus]) {
            let operator = self.previous();
            let right = self.unary()?;
            return Ok(expr::Unary::make(operator, right));
        }

        self.call()
    }

    fn call(&self) -> Result<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.match_(&[TT::LeftParen]) {
                expr = self.finish_call(expr)?;
            } else if self.match_(&[TT::Dot]) {
                let name =
                    self.consume(TT::Identifier, "Expect property name after '.'.")?;
                expr = expr::Get::make(expr, name);
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&self, callee: Expr) -> Result<Expr> {
        let mut arguments = Vec::new();
        if !self.check(TT::RightParen) {
            loop {
                if arguments.len() >= 255 {
                    self.error(&self.peek(), "Can't have more than 255 arguments.");
                }
                arguments.push(self.expression()?);
                if !self.match_(&[TT::Comma]) {
                    break;
                }
            }
        }

        let paren = self.consume(TT::RightParen, "Expect ')' after arguments.")?;
        Ok(expr::Call::make(callee, paren, arguments))
    }

    fn primary(&self) -> Result<Expr> {
        if self.match_(&[TT::False]) {
            return Ok(expr::Literal::make(Gc::new(Object::Boolean(false))));
        }
        if self.match_(&[TT::True]) {
            return Ok(expr::Literal::make(Gc::new(Object::Boolean(true))));
        }
        if self.match_(&[TT::Nil]) {
            return Ok(expr::Literal::make(Gc::new(Object::Nil)));
        }

        if self.match_(&[TT::Number, TT::String]) {
            return Ok(expr::Literal::make(Gc::new(self.previous().literal.clone())));
        }

        if self.match_(&[TT::Super]) {
            let keyword = self.previous();
            self.consume(TT::Dot, "Expect '.' after 'super'.")?;
            let method =
                self.consume(TT::Identifier, "Expect superclass method name.")?;
            return Ok(expr::Super::make(keyword, method));
        }

        if self.match_(&[TT::This]) {
            return Ok(expr::This::make(self.previous()));
        }

        if self.match_(&[TT::Identifier]) {
            return Ok(expr::Variable::make(self.previous()));
        }

        if self.match_(&[TT::LeftParen]) {
            let expr = self.expression()?;
            self.consume(TT::RightParen, "Expect ')' after expression.")?;
            return Ok(expr::Grouping::make(expr));
        }

        let token = self.peek();
        Err(self.error(&token, "Expect expression.").into())
    }

    fn match_(&self, types: &[TokenType]) -> bool {
        for type_ in types {
            if self.check(type_.clone()) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn consume(&self, type_: TokenType, message: &str) -> Result<Gc<Token>> {
        if self.check(type_) {
            return Ok(self.advance());
        }

        let token = self.peek();
        Err(self.error(&token, message).into())
    }

    fn check(&self, type_: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }
        self.peek().type_ == type_
    }

    fn advance(&self) -> Gc<Token> {
        if !self.is_at_end() {
            *self.current.borrow_mut() += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().type_ == TT::Eof
    }

    fn peek(&self) -> Gc<Token> {
        Gc::clone(&self.tokens[*self.current.borrow()])
    }

    fn previous(&self) -> Gc<Token> {
        Gc::clone(&self.tokens[*self.current.borrow() - 1])
    }

    fn error(&self, token: &Token, message: &str) -> ParseError {
        (self.error_handler.borrow_mut())(token, message);
        ParseError
    }
}
