//! Nested lexical scopes as a parent-linked chain of frames.
//!
//! Each frame is reference-counted and shared between whoever captured it as
//! a closure and whoever is still executing in the block that created it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::diagnostics::RuntimeError;
use crate::token::Token;
use crate::value::Value;

pub struct Environment {
    enclosing: Option<Rc<RefCell<Environment>>>,
    values: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Environment { enclosing: None, values: HashMap::new() }))
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Environment { enclosing: Some(enclosing), values: HashMap::new() }))
    }

    /// Binds `name` in this frame. Re-declaring a name in the same scope
    /// simply overwrites the previous binding.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    fn ancestor(this: &Rc<RefCell<Environment>>, distance: usize) -> Rc<RefCell<Environment>> {
        let mut env = Rc::clone(this);
        for _ in 0..distance {
            let next = env
                .borrow()
                .enclosing
                .clone()
                .expect("resolver-computed distance exceeds the environment chain");
            env = next;
        }
        env
    }

    pub fn get_at(this: &Rc<RefCell<Environment>>, distance: usize, name: &str) -> Value {
        Environment::ancestor(this, distance)
            .borrow()
            .values
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("resolver-resolved variable '{name}' missing from its scope"))
    }

    pub fn assign_at(this: &Rc<RefCell<Environment>>, distance: usize, name: &str, value: Value) {
        Environment::ancestor(this, distance)
            .borrow_mut()
            .values
            .insert(name.to_string(), value);
    }

    /// Looks up `name` walking outward from this frame, for the globals
    /// fallback the resolver leaves unresolved (calls to undeclared-at-
    /// resolve-time globals, i.e. forward references at top level).
    pub fn get(this: &Rc<RefCell<Environment>>, name: &Token) -> Result<Value, RuntimeError> {
        let env = this.borrow();
        if let Some(value) = env.values.get(&name.lexeme) {
            return Ok(value.clone());
        }
        if let Some(enclosing) = &env.enclosing {
            return Environment::get(enclosing, name);
        }
        Err(RuntimeError::new(name.clone(), format!("Undefined variable '{}'.", name.lexeme)))
    }

    pub fn assign(this: &Rc<RefCell<Environment>>, name: &Token, value: Value) -> Result<(), RuntimeError> {
        let mut env = this.borrow_mut();
        if env.values.contains_key(&name.lexeme) {
            env.values.insert(name.lexeme.clone(), value);
            return Ok(());
        }
        match &env.enclosing {
            Some(enclosing) => {
                let enclosing = Rc::clone(enclosing);
                drop(env);
                Environment::assign(&enclosing, name, value)
            }
            None => Err(RuntimeError::new(name.clone(), format!("Undefined variable '{}'.", name.lexeme))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Kind;

    fn token(lexeme: &str) -> Token {
        Token::new(Kind::Identifier, lexeme, None, 0, 0)
    }

    #[test]
    fn define_then_get_in_same_scope() {
        let env = Environment::new();
        env.borrow_mut().define("a", Value::Number(1.0));
        assert_eq!(Environment::get(&env, &token("a")), Ok(Value::Number(1.0)));
    }

    #[test]
    fn get_falls_through_to_enclosing_scope() {
        let outer = Environment::new();
        outer.borrow_mut().define("a", Value::Number(1.0));
        let inner = Environment::with_enclosing(Rc::clone(&outer));
        assert_eq!(Environment::get(&inner, &token("a")), Ok(Value::Number(1.0)));
    }

    #[test]
    fn shadowing_in_inner_scope_does_not_affect_outer() {
        let outer = Environment::new();
        outer.borrow_mut().define("a", Value::Number(1.0));
        let inner = Environment::with_enclosing(Rc::clone(&outer));
        inner.borrow_mut().define("a", Value::Number(2.0));
        assert_eq!(Environment::get(&inner, &token("a")), Ok(Value::Number(2.0)));
        assert_eq!(Environment::get(&outer, &token("a")), Ok(Value::Number(1.0)));
    }

    #[test]
    fn assign_to_undefined_variable_errors() {
        let env = Environment::new();
        assert!(Environment::assign(&env, &token("missing"), Value::Nil).is_err());
    }

    #[test]
    fn get_at_and_assign_at_use_exact_distance() {
        let outer = Environment::new();
        outer.borrow_mut().define("a", Value::Number(1.0));
        let inner = Environment::with_enclosing(Rc::clone(&outer));
        inner.borrow_mut().define("a", Value::Number(2.0));

        assert_eq!(Environment::get_at(&inner, 0, "a"), Value::Number(2.0));
        assert_eq!(Environment::get_at(&inner, 1, "a"), Value::Number(1.0));

        Environment::assign_at(&inner, 1, "a", Value::Number(99.0));
        assert_eq!(Environment::get_at(&inner, 1, "a"), Value::Number(99.0));
    }
}
