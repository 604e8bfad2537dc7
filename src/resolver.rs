//! Static pass between parsing and interpretation: resolves every variable
//! reference to a scope distance so the interpreter never has to search for
//! a binding at runtime, and rejects a handful of errors the parser can't
//! see (returning from top-level code, referencing `this` outside a method).

use std::collections::HashMap;

use crate::diagnostics::{Diagnostics, ResolveError};
use crate::expr::*;
use crate::interpreter::Interpreter;
use crate::stmt::*;
use crate::token::Token;

#[derive(Clone, Copy, PartialEq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Clone, Copy, PartialEq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

pub struct Resolver<'a, 'out> {
    interpreter: &'a mut Interpreter<'out>,
    diagnostics: &'a Diagnostics,
    scopes: Vec<HashMap<String, bool>>,
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'a, 'out> Resolver<'a, 'out> {
    pub fn new(interpreter: &'a mut Interpreter<'out>, diagnostics: &'a Diagnostics) -> Self {
        Resolver {
            interpreter,
            diagnostics,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    pub fn resolve(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_stmt(statement);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(data) => self.resolve_expr(&data.expr),
            Stmt::Print(data) => self.resolve_expr(&data.expr),
            Stmt::Var(data) => {
                self.declare(&data.name);
                if let Some(initializer) = &data.initializer {
                    self.resolve_expr(initializer);
                }
                self.define(&data.name);
            }
            Stmt::Block(data) => {
                self.begin_scope();
                self.resolve(&data.statements);
                self.end_scope();
            }
            Stmt::If(data) => {
                self.resolve_expr(&data.condition);
                self.resolve_stmt(&data.then_branch);
                if let Some(else_branch) = &data.else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::While(data) => {
                self.resolve_expr(&data.condition);
                self.resolve_stmt(&data.body);
            }
            Stmt::Function(data) => {
                self.declare(&data.name);
                self.define(&data.name);
                self.resolve_function(data, FunctionType::Function);
            }
            Stmt::Return(data) => {
                if self.current_function == FunctionType::None {
                    self.error(data.keyword.clone(), "Can't return from top-level code.");
                }
                if let Some(value) = &data.value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(data.keyword.clone(), "Can't return a value from an initializer.");
                    }
                    self.resolve_expr(value);
                }
            }
            Stmt::Class(data) => self.resolve_class(data),
        }
    }

    fn resolve_class(&mut self, data: &ClassData) {
        let enclosing_class = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(&data.name);
        self.define(&data.name);

        if let Some(Expr::Variable(superclass)) = &data.superclass {
            if superclass.name.lexeme == data.name.lexeme {
                self.error(superclass.name.clone(), "A class can't inherit from itself.");
            }
            self.current_class = ClassType::Subclass;
            self.resolve_expr(data.superclass.as_ref().unwrap());
        }

        if data.superclass.is_some() {
            self.begin_scope();
            self.scopes.last_mut().unwrap().insert("super".to_string(), true);
        }

        self.begin_scope();
        self.scopes.last_mut().unwrap().insert("this".to_string(), true);

        for method in &data.methods {
            let kind = if method.name.lexeme == "init" { FunctionType::Initializer } else { FunctionType::Method };
            self.resolve_function(method, kind);
        }

        self.end_scope();

        if data.superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    fn resolve_function(&mut self, data: &FunctionData, kind: FunctionType) {
        let enclosing_function = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &data.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve(&data.body);
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Grouping(data) => self.resolve_expr(&data.expr),
            Expr::Unary(data) => self.resolve_expr(&data.expr),
            Expr::Binary(data) => {
                self.resolve_expr(&data.left);
                self.resolve_expr(&data.right);
            }
            Expr::Logical(data) => {
                self.resolve_expr(&data.left);
                self.resolve_expr(&data.right);
            }
            Expr::Variable(data) => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&data.name.lexeme) == Some(&false) {
                        self.error(data.name.clone(), "Can't read local variable in its own initializer.");
                    }
                }
                self.resolve_local(data.id, &data.name);
            }
            Expr::Assign(data) => {
                self.resolve_expr(&data.value);
                self.resolve_local(data.id, &data.name);
            }
            Expr::Call(data) => {
                self.resolve_expr(&data.callee);
                for argument in &data.arguments {
                    self.resolve_expr(argument);
                }
            }
            Expr::Get(data) => self.resolve_expr(&data.object),
            Expr::Set(data) => {
                self.resolve_expr(&data.value);
                self.resolve_expr(&data.object);
            }
            Expr::This(data) => {
                if self.current_class == ClassType::None {
                    self.error(data.keyword.clone(), "Can't use 'this' outside of a class.");
                    return;
                }
                self.resolve_local(data.id, &data.keyword);
            }
            Expr::Super(data) => {
                match self.current_class {
                    ClassType::None => self.error(data.keyword.clone(), "Can't use 'super' outside of a class."),
                    ClassType::Class => {
                        self.error(data.keyword.clone(), "Can't use 'super' in a class with no superclass.")
                    }
                    ClassType::Subclass => {}
                }
                self.resolve_local(data.id, &data.keyword);
            }
        }
    }

    fn resolve_local(&mut self, id: u64, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                self.interpreter.resolve(id, depth);
                return;
            }
        }
        // Not found in any scope: treated as a global, looked up by name at runtime.
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        let already_declared = match self.scopes.last() {
            Some(scope) => scope.contains_key(&name.lexeme),
            None => false,
        };
        if already_declared {
            self.error(name.clone(), "Already a variable with this name in this scope.");
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn error(&self, token: Token, message: impl Into<String>) {
        self.diagnostics.report_resolve_error(&ResolveError { token, message: message.into() });
    }
}
