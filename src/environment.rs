use std::collections::HashMap;

use crate::error::RuntimeInterrupt;
use crate::object::Object;
use crate::token::Token;
use crate::Shared;

#[derive(Debug, Default)]
pub struct Environment {
    pub enclosing: Option<Shared<Environment>>,
    values: HashMap<String, Object>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(self, enclosing: Shared<Environment>) -> Self {
        Self { enclosing: Some(enclosing), ..Default::default() }
    }

    pub fn as_shared(self) -> Shared<Self> {
        std::rc::Rc::new(std::cell::RefCell::new(self))
    }

    pub fn define(&mut self, name: &str, value: Object) {
        self.values.insert(name.to_owned(), value);
    }

    pub fn assign(&mut self, name: &Token, value: Object) -> Result<(), RuntimeInterrupt> {
        if !self.values.contains_key(&name.lexeme) {
            // Ask one level above if possible
            if let Some(ref e) = self.enclosing {
                return e.borrow_mut().assign(name, value);
            }

            return Err(RuntimeInterrupt::error(
                name.line,
                format!("Undefined variable '{}'", name.lexeme),
            ));
        }

        self.values.insert(name.lexeme.clone(), value);
        Ok(())
    }

    pub fn assign_at(
        &mut self,
        distance: usize,
        name: &Token,
        value: Object,
    ) -> Result<(), RuntimeInterrupt> {
        if distance == 0 {
            return self.assign(name, value);
        }

        match self.ancestor(distance) {
            None => Err(RuntimeInterrupt::error(
                name.line,
                format!("No enclosing environment at {distance} for '{}'", name.lexeme),
            )),
            Some(ancestor) => ancestor.borrow_mut().assign(name, value),
        }
    }

    pub fn get(&self, name: &Token) -> Result<Object, RuntimeInterrupt> {
        let value = self.values.get(&name.lexeme).map(|lit| lit.to_owned());
        // Ask one level above if possible
        if value.is_none() && self.enclosing.is_some() {
            let rc = self.enclosing.as_ref().unwrap();
            return rc.borrow_mut().get(name);
        }

        value.ok_or_else(|| {
            RuntimeInterrupt::error(name.line, format!("Undefined variable '{}'", name.lexeme))
        })
    }

    pub fn get_at(&self, distance: usize, name: &Token) -> Result<Object, RuntimeInterrupt> {
        if distance == 0 {
            return self.get(name);
        }

        match self.ancestor(distance) {
            None => Err(RuntimeInterrupt::error(
                name.line,
                format!("No enclosing environment at {distance} for '{}'", name.lexeme),
            )),
            Some(ancestor) => ancestor.borrow().get(name),
        }
    }

    fn ancestor(&self, distance: usize) -> Option<Shared<Environment>> {
        let parent = self.enclosing.clone()?;
        let mut env = parent;

        for _ in 1..distance {
            let parent = env.borrow().enclosing.clone()?;
            env = parent.clone();
        }
        Some(env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn name(text: &str) -> Token {
        Token::new(TokenType::Identifier, text, None, 1)
    }

    #[test]
    fn define_then_get() {
        let mut env = Environment::new();
        env.define("x", Object::Number(1.0));
        assert_eq!(env.get(&name("x")).unwrap(), Object::Number(1.0));
    }

    #[test]
    fn get_walks_the_chain() {
        let outer = Environment::new().as_shared();
        outer.borrow_mut().define("x", Object::Number(7.0));

        let inner = Environment::new().with_enclosing(outer.clone());
        assert_eq!(inner.get(&name("x")).unwrap(), Object::Number(7.0));
    }

    #[test]
    fn assign_to_undefined_fails() {
        let mut env = Environment::new();
        assert!(env.assign(&name("missing"), Object::Null).is_err());
    }

    #[test]
    fn get_at_skips_exactly_distance_scopes() {
        let root = Environment::new().as_shared();
        root.borrow_mut().define("x", Object::Number(1.0));

        let mid = Environment::new().with_enclosing(root).as_shared();
        mid.borrow_mut().define("x", Object::Number(2.0));

        let leaf = Environment::new().with_enclosing(mid).as_shared();

        assert_eq!(leaf.borrow().get_at(1, &name("x")).unwrap(), Object::Number(2.0));
        assert_eq!(leaf.borrow().get_at(2, &name("x")).unwrap(), Object::Number(1.0));
    }
}
