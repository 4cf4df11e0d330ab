use std::collections::HashMap;
use std::fmt::Display;
use std::rc::Rc;

use crate::func::{Callable, SiltFunction};
use crate::interpreter::Interpreter;
use crate::object::Object;
use crate::prelude::RuntimeInterrupt;
use crate::token::Token;
use crate::Shared;

#[derive(Debug, Clone)]
pub struct Class {
    name: String,
    methods: HashMap<String, Rc<SiltFunction>>,
    superclass: Option<Shared<Self>>,
}

impl Class {
    pub fn new(
        name: impl AsRef<str>,
        methods: HashMap<String, Rc<SiltFunction>>,
        superclass: Option<Shared<Self>>,
    ) -> Self {
        Self { name: name.as_ref().to_owned(), methods, superclass }
    }

    pub fn as_shared(self) -> Shared<Self> {
        std::rc::Rc::new(std::cell::RefCell::new(self))
    }

    pub fn construct(
        class: Shared<Class>,
        arguments: &[Object],
        interpreter: &mut Interpreter,
    ) -> Result<Shared<Instance>, RuntimeInterrupt> {
        let instance = Instance::new(class.clone()).as_shared();

        if let Some(initializer) = class.borrow().find_method("init") {
            initializer.bind(Object::Instance(instance.clone())).call(interpreter, arguments)?;
        }

        Ok(instance)
    }

    /// Methods are looked up on the class first, then up the inheritance
    /// chain. The returned function is unbound; callers bind it.
    pub fn find_method(&self, name: &str) -> Option<Rc<SiltFunction>> {
        if self.methods.contains_key(name) {
            return self.methods.get(name).cloned();
        }

        if let Some(superclass) = &self.superclass {
            return superclass.borrow().find_method(name);
        }

        None
    }

    pub fn arity(&self) -> usize {
        if let Some(initializer) = self.find_method("init") { initializer.arity() } else { 0 }
    }
}

impl Display for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone)]
pub struct Instance {
    class: Shared<Class>,
    fields: HashMap<String, Object>,
}

impl Instance {
    pub fn new(class: Shared<Class>) -> Self {
        Self { class, fields: HashMap::new() }
    }

    pub fn as_shared(self) -> Shared<Self> {
        std::rc::Rc::new(std::cell::RefCell::new(self))
    }

    /// Fields shadow methods; a method hit is bound to `instance` before it
    /// is returned.
    pub fn get(&self, field: &Token, instance: &Object) -> Result<Object, RuntimeInterrupt> {
        if let Some(object) = self.fields.get(&field.lexeme) {
            Ok(object.clone())
        } else if let Some(function) = self.class.borrow().find_method(&field.lexeme) {
            let function = function.bind(instance.clone());

            Ok(Object::Callable(function))
        } else {
            Err(RuntimeInterrupt::error(
                field.line,
                format!("Undefined property '{}'", field.lexeme),
            ))
        }
    }

    pub fn set(&mut self, field: &Token, value: Object) {
        self.fields.insert(field.lexeme.clone(), value);
    }
}

impl Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} instance", self.class.borrow())
    }
}
