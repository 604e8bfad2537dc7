//! Tokens → statement list via recursive descent, with panic-mode recovery.
//!
//! ```text
//! program    -> declaration* EOF
//! declaration-> classDecl | funDecl | varDecl | statement
//! classDecl  -> "class" IDENT ( "<" IDENT )? "{" function* "}"
//! funDecl    -> "fun" function
//! function   -> IDENT "(" params? ")" block
//! varDecl    -> "var" IDENT ( "=" expression )? ";"
//! statement  -> exprStmt | forStmt | ifStmt | printStmt | returnStmt | whileStmt | block
//! block      -> "{" declaration* "}"
//! expression -> assignment
//! assignment -> ( call "." )? IDENT "=" assignment | logic_or
//! logic_or   -> logic_and ( "or"  logic_and )*
//! logic_and  -> equality  ( "and" equality  )*
//! equality   -> comparison ( ("!=" | "==") comparison )*
//! comparison -> term ( (">" | ">=" | "<" | "<=") term )*
//! term       -> factor ( ("-" | "+") factor )*
//! factor     -> unary  ( ("/" | "*") unary  )*
//! unary      -> ("!" | "-") unary | call
//! call       -> primary ( "(" args? ")" | "." IDENT )*
//! primary    -> "true" | "false" | "nil" | NUMBER | STRING
//!             | "(" expression ")" | IDENT | "this" | "super" "." IDENT
//! ```

use crate::diagnostics::{Diagnostics, ParseError};
use crate::expr::*;
use crate::stmt::*;
use crate::token::{Kind, Literal as TokenLiteral, Token};

const MAX_ARGS: usize = 255;

type ParseResult<T> = Result<T, ParseError>;

/// Internal panic-mode sentinel: "a diagnostic was already reported, unwind
/// to the nearest declaration boundary." Distinct from [`ParseError`], which
/// still needs reporting by the caller.
struct Recovery;

pub struct Parser<'a> {
    tokens: Vec<Token>,
    current: usize,
    next_id: u64,
    diagnostics: &'a Diagnostics,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, diagnostics: &'a Diagnostics) -> Self {
        Parser { tokens, current: 0, next_id: 0, diagnostics }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        statements
    }

    // --- token stream cursor -------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == Kind::Eof
    }

    fn check(&self, kind: Kind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn matches(&mut self, kinds: &[Kind]) -> bool {
        if kinds.iter().any(|k| self.check(*k)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: Kind, message: &str) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance().clone())
        } else {
            Err(ParseError { token: self.peek().clone(), message: message.to_string() })
        }
    }

    fn error(&self, token: Token, message: impl Into<String>) -> ParseError {
        ParseError { token, message: message.into() }
    }

    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().kind == Kind::Semicolon {
                return;
            }

            if matches!(
                self.peek().kind,
                Kind::Class | Kind::Fun | Kind::Var | Kind::For | Kind::If | Kind::While
                    | Kind::Print | Kind::Return
            ) {
                return;
            }

            self.advance();
        }
    }

    // --- declarations ----------------------------------------------------

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.matches(&[Kind::Class]) {
            self.class_declaration()
        } else if self.matches(&[Kind::Fun]) {
            self.function("function").map(Stmt::Function)
        } else if self.matches(&[Kind::Var]) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(error) => {
                self.diagnostics.report_parse_error(&error);
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(Kind::Identifier, "Expect class name.")?;

        let superclass = if self.matches(&[Kind::Less]) {
            let superclass_name = self.consume(Kind::Identifier, "Expect superclass name.")?;
            Some(Expr::Variable(VariableData { id: self.next_id(), name: superclass_name }))
        } else {
            None
        };

        self.consume(Kind::LeftBrace, "Expect '{' before class body.")?;

        let mut methods = Vec::new();
        while !self.check(Kind::RightBrace) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(Kind::RightBrace, "Expect '}' after class body.")?;

        Ok(Stmt::Class(ClassData { name, superclass, methods }))
    }

    fn function(&mut self, kind: &str) -> ParseResult<FunctionData> {
        let name = self.consume(Kind::Identifier, &format!("Expect {kind} name."))?;
        self.consume(Kind::LeftParen, &format!("Expect '(' after {kind} name."))?;

        let mut params = Vec::new();
        if !self.check(Kind::RightParen) {
            loop {
                if params.len() >= MAX_ARGS {
                    let token = self.peek().clone();
                    return Err(self.error(token, format!("Can't have more than {MAX_ARGS} parameters.")));
                }
                params.push(self.consume(Kind::Identifier, "Expect parameter name.")?);
                if !self.matches(&[Kind::Comma]) {
                    break;
                }
            }
        }
        self.consume(Kind::RightParen, "Expect ')' after parameters.")?;

        self.consume(Kind::LeftBrace, &format!("Expect '{{' before {kind} body."))?;
        let body = self.block()?;

        Ok(FunctionData { name, params, body })
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(Kind::Identifier, "Expect variable name.")?;

        let initializer = if self.matches(&[Kind::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(Kind::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var(VarData { name, initializer }))
    }

    // --- statements --------------------------------------------------------

    fn statement(&mut self) -> ParseResult<Stmt> {
        if self.matches(&[Kind::For]) {
            return self.for_statement();
        }
        if self.matches(&[Kind::If]) {
            return self.if_statement();
        }
        if self.matches(&[Kind::Print]) {
            return self.print_statement();
        }
        if self.matches(&[Kind::Return]) {
            return self.return_statement();
        }
        if self.matches(&[Kind::While]) {
            return self.while_statement();
        }
        if self.matches(&[Kind::LeftBrace]) {
            return Ok(Stmt::Block(BlockData { statements: self.block()? }));
        }
        self.expression_statement()
    }

    fn for_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(Kind::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.matches(&[Kind::Semicolon]) {
            None
        } else if self.matches(&[Kind::Var]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(Kind::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(Kind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if !self.check(Kind::RightParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(Kind::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(BlockData {
                statements: vec![body, Stmt::Expression(ExpressionData { expr: increment })],
            });
        }

        let condition = condition.unwrap_or(Expr::Literal(LiteralData { value: LiteralValue::Bool(true) }));
        body = Stmt::While(WhileData { condition, body: Box::new(body) });

        if let Some(initializer) = initializer {
            body = Stmt::Block(BlockData { statements: vec![initializer, body] });
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(Kind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(Kind::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.matches(&[Kind::Else]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If(IfData { condition, then_branch, else_branch }))
    }

    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(Kind::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print(PrintData { expr }))
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();
        let value = if !self.check(Kind::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(Kind::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return(ReturnData { keyword, value }))
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(Kind::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(Kind::RightParen, "Expect ')' after condition.")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While(WhileData { condition, body }))
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(Kind::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(ExpressionData { expr }))
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.check(Kind::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        self.consume(Kind::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    // --- expressions ---------------------------------------------------------

    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.or()?;

        if self.matches(&[Kind::Equal]) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            return match expr {
                Expr::Variable(data) => {
                    Ok(Expr::Assign(AssignData { id: self.next_id(), name: data.name, value: Box::new(value) }))
                }
                Expr::Get(data) => {
                    Ok(Expr::Set(SetData { object: data.object, name: data.name, value: Box::new(value) }))
                }
                _ => {
                    self.diagnostics.report_parse_error(&self.error(equals, "Invalid assignment target."));
                    Ok(expr)
                }
            };
        }

        Ok(expr)
    }

    fn or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and()?;
        while self.matches(&[Kind::Or]) {
            let operator = self.previous().clone();
            let right = self.and()?;
            expr = Expr::Logical(LogicalData { left: Box::new(expr), operator, right: Box::new(right) });
        }
        Ok(expr)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;
        while self.matches(&[Kind::And]) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical(LogicalData { left: Box::new(expr), operator, right: Box::new(right) });
        }
        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.comparison()?;
        while self.matches(&[Kind::BangEqual, Kind::EqualEqual]) {
            let operator = self.previous().clone();
            let right = self.comparison()?;
            expr = Expr::Binary(BinaryData { left: Box::new(expr), operator, right: Box::new(right) });
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.term()?;
        while self.matches(&[Kind::Greater, Kind::GreaterEqual, Kind::Less, Kind::LessEqual]) {
            let operator = self.previous().clone();
            let right = self.term()?;
            expr = Expr::Binary(BinaryData { left: Box::new(expr), operator, right: Box::new(right) });
        }
        Ok(expr)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor()?;
        while self.matches(&[Kind::Minus, Kind::Plus]) {
            let operator = self.previous().clone();
            let right = self.factor()?;
            expr = Expr::Binary(BinaryData { left: Box::new(expr), operator, right: Box::new(right) });
        }
        Ok(expr)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let mut expr = self.unary()?;
        while self.matches(&[Kind::Slash, Kind::Star]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            expr = Expr::Binary(BinaryData { left: Box::new(expr), operator, right: Box::new(right) });
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if self.matches(&[Kind::Bang, Kind::Minus]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary(UnaryData { operator, expr: Box::new(right) }));
        }
        self.call()
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.matches(&[Kind::LeftParen]) {
                expr = self.finish_call(expr)?;
            } else if self.matches(&[Kind::Dot]) {
                let name = self.consume(Kind::Identifier, "Expect property name after '.'.")?;
                expr = Expr::Get(GetData { object: Box::new(expr), name });
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut arguments = Vec::new();

        if !self.check(Kind::RightParen) {
            loop {
                if arguments.len() >= MAX_ARGS {
                    let token = self.peek().clone();
                    self.diagnostics.report_parse_error(
                        &self.error(token, format!("Can't have more than {MAX_ARGS} arguments.")),
                    );
                }
                arguments.push(self.expression()?);
                if !self.matches(&[Kind::Comma]) {
                    break;
                }
            }
        }

        let paren = self.consume(Kind::RightParen, "Expect ')' after arguments.")?;
        Ok(Expr::Call(CallData { callee: Box::new(callee), paren, arguments }))
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        if self.matches(&[Kind::False]) {
            return Ok(Expr::Literal(LiteralData { value: LiteralValue::Bool(false) }));
        }
        if self.matches(&[Kind::True]) {
            return Ok(Expr::Literal(LiteralData { value: LiteralValue::Bool(true) }));
        }
        if self.matches(&[Kind::Nil]) {
            return Ok(Expr::Literal(LiteralData { value: LiteralValue::Nil }));
        }
        if self.matches(&[Kind::Number, Kind::String]) {
            let value = match self.previous().literal.clone() {
                Some(TokenLiteral::Number(n)) => LiteralValue::Number(n),
                Some(TokenLiteral::String(s)) => LiteralValue::String(s),
                None => unreachable!("NUMBER/STRING tokens always carry a literal"),
            };
            return Ok(Expr::Literal(LiteralData { value }));
        }
        if self.matches(&[Kind::Super]) {
            let keyword = self.previous().clone();
            self.consume(Kind::Dot, "Expect '.' after 'super'.")?;
            let method = self.consume(Kind::Identifier, "Expect superclass method name.")?;
            return Ok(Expr::Super(SuperData { id: self.next_id(), keyword, method }));
        }
        if self.matches(&[Kind::This]) {
            return Ok(Expr::This(ThisData { id: self.next_id(), keyword: self.previous().clone() }));
        }
        if self.matches(&[Kind::Identifier]) {
            return Ok(Expr::Variable(VariableData { id: self.next_id(), name: self.previous().clone() }));
        }
        if self.matches(&[Kind::LeftParen]) {
            let expr = self.expression()?;
            self.consume(Kind::RightParen, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping(GroupingData { expr: Box::new(expr) }));
        }

        let token = self.peek().clone();
        Err(self.error(token, "Expect expression."))
    }
}
