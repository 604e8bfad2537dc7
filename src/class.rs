//! Classes and the instances they produce, with single inheritance resolved
//! by walking the superclass chain at method-lookup time.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::callable::{Callable, Function};
use crate::diagnostics::RuntimeError;
use crate::interpreter::{Interpreter, Unwind};
use crate::token::Token;
use crate::value::Value;

#[derive(Clone)]
pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<Class>>,
    methods: HashMap<String, Rc<Function>>,
}

impl Class {
    pub fn new(name: String, superclass: Option<Rc<Class>>, methods: HashMap<String, Rc<Function>>) -> Self {
        Class { name, superclass, methods }
    }

    /// Looks up a method on this class, falling back to the superclass
    /// chain. Does not bind `this` — callers do that once they have an
    /// instance to bind against.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }
        self.superclass.as_ref().and_then(|superclass| superclass.find_method(name))
    }
}

impl Callable for Class {
    fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }

    fn call(&self, interpreter: &mut Interpreter<'_>, call_site: &Token, arguments: Vec<Value>) -> Result<Value, Unwind> {
        let class = Rc::new(self.clone());
        let instance = Rc::new(RefCell::new(Instance::new(Rc::clone(&class))));

        if let Some(initializer) = class.find_method("init") {
            initializer.bind(Rc::clone(&instance)).call(interpreter, call_site, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name)
    }
}

pub struct Instance {
    pub class: Rc<Class>,
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Instance { class, fields: HashMap::new() }
    }

    pub fn get(this: &Rc<RefCell<Instance>>, name: &Token) -> Result<Value, RuntimeError> {
        let instance = this.borrow();
        if let Some(value) = instance.fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = instance.class.find_method(&name.lexeme) {
            let bound = method.bind(Rc::clone(this));
            return Ok(Value::Callable(Rc::new(bound)));
        }

        Err(RuntimeError::new(name.clone(), format!("Undefined property '{}'.", name.lexeme)))
    }

    pub fn set(this: &Rc<RefCell<Instance>>, name: &Token, value: Value) {
        this.borrow_mut().fields.insert(name.lexeme.clone(), value);
    }
}
