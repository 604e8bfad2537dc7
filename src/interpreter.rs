//! Walks the statement/expression tree and produces side effects (variable
//! bindings, printed output) directly, rather than compiling to any
//! intermediate form.
//!
//! Control flow that isn't a plain `Result` — `return` unwinding out of
//! nested blocks, and a runtime error aborting whatever nested call raised
//! it — is modeled as the `Err` arm of every visit method via [`Unwind`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use crate::callable::{Callable, Function};
use crate::class::{Class, Instance};
use crate::diagnostics::{Diagnostics, RuntimeError};
use crate::environment::Environment;
use crate::expr::*;
use crate::natives;
use crate::stmt::*;
use crate::token::Kind;
use crate::value::Value;

/// Why a visit method stopped short of producing its usual `Ok` value.
pub enum Unwind {
    Return(Value),
    RuntimeError(RuntimeError),
}

pub struct Interpreter<'out> {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<u64, usize>,
    output: &'out mut dyn Write,
}

impl<'out> Interpreter<'out> {
    pub fn new(output: &'out mut dyn Write) -> Self {
        let globals = Environment::new();
        for (name, native) in natives::globals() {
            globals.borrow_mut().define(name, Value::Callable(Rc::new(native)));
        }

        Interpreter { environment: Rc::clone(&globals), globals, locals: HashMap::new(), output }
    }

    /// Records the scope distance the resolver computed for the expression
    /// identified by `id`. Called by the resolver pass, once per bound
    /// variable reference, before any statement is executed.
    pub fn resolve(&mut self, id: u64, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// The sink natives write through, e.g. `input`'s prompt — kept separate
    /// from raw stdout so output stays capturable in tests.
    pub(crate) fn output(&mut self) -> &mut dyn Write {
        self.output
    }

    pub fn interpret(&mut self, statements: &[Stmt], diagnostics: &Diagnostics) {
        for statement in statements {
            match self.execute(statement) {
                Ok(()) => {}
                Err(Unwind::RuntimeError(error)) => {
                    diagnostics.report_runtime_error(&error);
                    return;
                }
                Err(Unwind::Return(_)) => {
                    unreachable!("resolver rejects `return` outside a function body")
                }
            }
        }
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<(), Unwind> {
        stmt.accept(self)
    }

    pub(crate) fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<(), Unwind> {
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = statements.iter().try_for_each(|s| self.execute(s));
        self.environment = previous;
        result
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, Unwind> {
        expr.accept(self)
    }

    fn look_up_variable(&mut self, name: &crate::token::Token, id: u64) -> Result<Value, Unwind> {
        match self.locals.get(&id) {
            Some(&distance) => Ok(Environment::get_at(&self.environment, distance, &name.lexeme)),
            None => Environment::get(&self.globals, name).map_err(Unwind::RuntimeError),
        }
    }

    fn runtime_error(token: &crate::token::Token, message: impl Into<String>) -> Unwind {
        Unwind::RuntimeError(RuntimeError::new(token.clone(), message.into()))
    }
}

impl<'out> ExprVisitor<Result<Value, Unwind>> for Interpreter<'out> {
    fn visit_literal_expr(&mut self, data: &LiteralData) -> Result<Value, Unwind> {
        Ok(match &data.value {
            LiteralValue::Nil => Value::Nil,
            LiteralValue::Bool(b) => Value::Bool(*b),
            LiteralValue::Number(n) => Value::Number(*n),
            LiteralValue::String(s) => Value::string(s.as_str()),
        })
    }

    fn visit_grouping_expr(&mut self, data: &GroupingData) -> Result<Value, Unwind> {
        self.evaluate(&data.expr)
    }

    fn visit_unary_expr(&mut self, data: &UnaryData) -> Result<Value, Unwind> {
        let right = self.evaluate(&data.expr)?;
        match data.operator.kind {
            Kind::Minus => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(Self::runtime_error(&data.operator, "Operand must be a number.")),
            },
            Kind::Bang => Ok(Value::Bool(!right.is_truthy())),
            _ => unreachable!("parser only emits `!`/`-` as unary operators"),
        }
    }

    fn visit_binary_expr(&mut self, data: &BinaryData) -> Result<Value, Unwind> {
        let left = self.evaluate(&data.left)?;
        let right = self.evaluate(&data.right)?;

        match data.operator.kind {
            Kind::Plus => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::string(format!("{a}{b}"))),
                _ => Err(Self::runtime_error(&data.operator, "Operands must be two numbers or two strings.")),
            },
            Kind::Minus => numeric(&data.operator, left, right, |a, b| Value::Number(a - b)),
            Kind::Star => numeric(&data.operator, left, right, |a, b| Value::Number(a * b)),
            Kind::Slash => numeric(&data.operator, left, right, |a, b| Value::Number(a / b)),
            Kind::Greater => numeric(&data.operator, left, right, |a, b| Value::Bool(a > b)),
            Kind::GreaterEqual => numeric(&data.operator, left, right, |a, b| Value::Bool(a >= b)),
            Kind::Less => numeric(&data.operator, left, right, |a, b| Value::Bool(a < b)),
            Kind::LessEqual => numeric(&data.operator, left, right, |a, b| Value::Bool(a <= b)),
            Kind::EqualEqual => Ok(Value::Bool(left == right)),
            Kind::BangEqual => Ok(Value::Bool(left != right)),
            _ => unreachable!("parser only emits arithmetic/comparison operators as binary operators"),
        }
    }

    fn visit_logical_expr(&mut self, data: &LogicalData) -> Result<Value, Unwind> {
        let left = self.evaluate(&data.left)?;

        let short_circuits = if data.operator.kind == Kind::Or { left.is_truthy() } else { !left.is_truthy() };

        if short_circuits { Ok(left) } else { self.evaluate(&data.right) }
    }

    fn visit_variable_expr(&mut self, data: &VariableData) -> Result<Value, Unwind> {
        self.look_up_variable(&data.name, data.id)
    }

    fn visit_assign_expr(&mut self, data: &AssignData) -> Result<Value, Unwind> {
        let value = self.evaluate(&data.value)?;

        match self.locals.get(&data.id) {
            Some(&distance) => Environment::assign_at(&self.environment, distance, &data.name.lexeme, value.clone()),
            None => Environment::assign(&self.globals, &data.name, value.clone()).map_err(Unwind::RuntimeError)?,
        }

        Ok(value)
    }

    fn visit_call_expr(&mut self, data: &CallData) -> Result<Value, Unwind> {
        let callee = self.evaluate(&data.callee)?;

        let mut arguments = Vec::with_capacity(data.arguments.len());
        for argument in &data.arguments {
            arguments.push(self.evaluate(argument)?);
        }

        let arity = match &callee {
            Value::Callable(c) => c.arity(),
            Value::Class(c) => c.arity(),
            _ => return Err(Self::runtime_error(&data.paren, "Can only call functions and classes.")),
        };

        if arguments.len() != arity {
            return Err(Self::runtime_error(
                &data.paren,
                format!("Expected {arity} arguments but got {}.", arguments.len()),
            ));
        }

        match callee {
            Value::Callable(c) => c.call(self, &data.paren, arguments),
            Value::Class(c) => c.call(self, &data.paren, arguments),
            _ => unreachable!("checked above"),
        }
    }

    fn visit_get_expr(&mut self, data: &GetData) -> Result<Value, Unwind> {
        let object = self.evaluate(&data.object)?;
        match object {
            Value::Instance(instance) => Instance::get(&instance, &data.name).map_err(Unwind::RuntimeError),
            _ => Err(Self::runtime_error(&data.name, "Only instances have properties.")),
        }
    }

    fn visit_set_expr(&mut self, data: &SetData) -> Result<Value, Unwind> {
        let object = self.evaluate(&data.object)?;
        match object {
            Value::Instance(instance) => {
                let value = self.evaluate(&data.value)?;
                Instance::set(&instance, &data.name, value.clone());
                Ok(value)
            }
            _ => Err(Self::runtime_error(&data.name, "Only instances have fields.")),
        }
    }

    fn visit_this_expr(&mut self, data: &ThisData) -> Result<Value, Unwind> {
        self.look_up_variable(&data.keyword, data.id)
    }

    fn visit_super_expr(&mut self, data: &SuperData) -> Result<Value, Unwind> {
        let distance = *self.locals.get(&data.id).expect("resolver always binds `super`");
        let superclass = match Environment::get_at(&self.environment, distance, "super") {
            Value::Class(c) => c,
            _ => unreachable!("`super` is only ever bound to a class"),
        };

        let instance = match Environment::get_at(&self.environment, distance - 1, "this") {
            Value::Instance(i) => i,
            _ => unreachable!("`this` is always one scope closer than `super`"),
        };

        match superclass.find_method(&data.method.lexeme) {
            Some(method) => Ok(Value::Callable(Rc::new(method.bind(instance)))),
            None => Err(Self::runtime_error(&data.method, format!("Undefined property '{}'.", data.method.lexeme))),
        }
    }
}

impl<'out> StmtVisitor<Result<(), Unwind>> for Interpreter<'out> {
    fn visit_expression_stmt(&mut self, data: &ExpressionData) -> Result<(), Unwind> {
        self.evaluate(&data.expr)?;
        Ok(())
    }

    fn visit_print_stmt(&mut self, data: &PrintData) -> Result<(), Unwind> {
        let value = self.evaluate(&data.expr)?;
        let _ = writeln!(self.output, "{}", value.stringify());
        Ok(())
    }

    fn visit_var_stmt(&mut self, data: &VarData) -> Result<(), Unwind> {
        let value = match &data.initializer {
            Some(expr) => self.evaluate(expr)?,
            None => Value::Nil,
        };
        self.environment.borrow_mut().define(data.name.lexeme.clone(), value);
        Ok(())
    }

    fn visit_block_stmt(&mut self, data: &BlockData) -> Result<(), Unwind> {
        let scope = Environment::with_enclosing(Rc::clone(&self.environment));
        self.execute_block(&data.statements, scope)
    }

    fn visit_if_stmt(&mut self, data: &IfData) -> Result<(), Unwind> {
        if self.evaluate(&data.condition)?.is_truthy() {
            self.execute(&data.then_branch)
        } else if let Some(else_branch) = &data.else_branch {
            self.execute(else_branch)
        } else {
            Ok(())
        }
    }

    fn visit_while_stmt(&mut self, data: &WhileData) -> Result<(), Unwind> {
        while self.evaluate(&data.condition)?.is_truthy() {
            self.execute(&data.body)?;
        }
        Ok(())
    }

    fn visit_function_stmt(&mut self, data: &FunctionData) -> Result<(), Unwind> {
        let function = Function::new(Rc::new(data.clone()), Rc::clone(&self.environment), false);
        self.environment.borrow_mut().define(data.name.lexeme.clone(), Value::Callable(Rc::new(function)));
        Ok(())
    }

    fn visit_return_stmt(&mut self, data: &ReturnData) -> Result<(), Unwind> {
        let value = match &data.value {
            Some(expr) => self.evaluate(expr)?,
            None => Value::Nil,
        };
        Err(Unwind::Return(value))
    }

    fn visit_class_stmt(&mut self, data: &ClassData) -> Result<(), Unwind> {
        let mut superclass = None;
        if let Some(expr) = &data.superclass {
            let value = self.evaluate(expr)?;
            let token = match expr {
                Expr::Variable(var_data) => var_data.name.clone(),
                _ => unreachable!("parser only emits a Variable expr for a superclass name"),
            };
            match value {
                Value::Class(c) => superclass = Some(c),
                _ => return Err(Self::runtime_error(&token, "Superclass must be a class.")),
            }
        }

        self.environment.borrow_mut().define(data.name.lexeme.clone(), Value::Nil);

        let methods_env = match &superclass {
            Some(sc) => {
                let env = Environment::with_enclosing(Rc::clone(&self.environment));
                env.borrow_mut().define("super", Value::Class(Rc::clone(sc)));
                env
            }
            None => Rc::clone(&self.environment),
        };

        let mut methods = HashMap::new();
        for method in &data.methods {
            let is_initializer = method.name.lexeme == "init";
            let function = Function::new(Rc::new(method.clone()), Rc::clone(&methods_env), is_initializer);
            methods.insert(method.name.lexeme.clone(), Rc::new(function));
        }

        let class = Class::new(data.name.lexeme.clone(), superclass, methods);
        Environment::assign(&self.environment, &data.name, Value::Class(Rc::new(class)))
            .map_err(Unwind::RuntimeError)?;

        Ok(())
    }
}

fn numeric(
    operator: &crate::token::Token,
    left: Value,
    right: Value,
    op: impl FnOnce(f64, f64) -> Value,
) -> Result<Value, Unwind> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(op(a, b)),
        _ => Err(Interpreter::runtime_error(operator, "Operands must be numbers.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn run(source: &str) -> (String, bool) {
        let diagnostics = Diagnostics::new(source);
        let tokens = Scanner::new(source).scan_tokens(&diagnostics);
        let statements = Parser::new(tokens, &diagnostics).parse();

        let mut output = Vec::new();
        {
            let mut interpreter = Interpreter::new(&mut output);
            interpreter.interpret(&statements, &diagnostics);
        }

        (String::from_utf8(output).unwrap(), diagnostics.had_any())
    }

    #[test]
    fn arithmetic_and_print() {
        let (output, had_error) = run("print 1 + 2 * 3;");
        assert!(!had_error);
        assert_eq!(output, "7\n");
    }

    #[test]
    fn string_concatenation() {
        let (output, had_error) = run(r#"print "a" + "b";"#);
        assert!(!had_error);
        assert_eq!(output, "ab\n");
    }

    #[test]
    fn closures_capture_their_defining_environment() {
        let source = r#"
            fun makeCounter() {
                var i = 0;
                fun counter() {
                    i = i + 1;
                    print i;
                }
                return counter;
            }
            var counter = makeCounter();
            counter();
            counter();
        "#;
        let (output, had_error) = run(source);
        assert!(!had_error);
        assert_eq!(output, "1\n2\n");
    }

    #[test]
    fn classes_support_init_and_this() {
        let source = r#"
            class Greeter {
                init(name) {
                    this.name = name;
                }
                greet() {
                    print "hello " + this.name;
                }
            }
            var g = Greeter("world");
            g.greet();
        "#;
        let (output, had_error) = run(source);
        assert!(!had_error);
        assert_eq!(output, "hello world\n");
    }

    #[test]
    fn inheritance_resolves_super_methods() {
        let source = r#"
            class Animal {
                speak() {
                    print "...";
                }
            }
            class Dog < Animal {
                speak() {
                    super.speak();
                    print "woof";
                }
            }
            Dog().speak();
        "#;
        let (output, had_error) = run(source);
        assert!(!had_error);
        assert_eq!(output, "...\nwoof\n");
    }

    #[test]
    fn logical_operators_short_circuit() {
        let (output, had_error) = run(r#"print false and (1/0 == 0); print true or (1/0 == 0);"#);
        assert!(!had_error);
        assert_eq!(output, "false\ntrue\n");
    }

    #[test]
    fn dividing_non_numbers_is_a_runtime_error() {
        let (_, had_error) = run(r#"print "a" - "b";"#);
        assert!(had_error);
    }
}
