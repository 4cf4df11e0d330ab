use std::fmt::Display;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::func::Callable;
use crate::interpreter::Interpreter;
use crate::object::Object;
use crate::prelude::RuntimeInterrupt;

#[derive(Debug)]
struct Clock;

impl Callable for Clock {
    fn arity(&self) -> usize {
        0
    }

    fn call(
        &self,
        _interpret: &mut Interpreter,
        _arguments: &[Object],
    ) -> Result<Object, RuntimeInterrupt> {
        let start = SystemTime::now();
        let since_epoch = start.duration_since(UNIX_EPOCH).expect("Time went backward");

        Ok(Object::Number(since_epoch.as_nanos() as f64))
    }
}

impl Display for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<native fn>")
    }
}

#[derive(Debug)]
struct Len;

impl Callable for Len {
    fn arity(&self) -> usize {
        1
    }

    fn call(
        &self,
        _interpret: &mut Interpreter,
        arguments: &[Object],
    ) -> Result<Object, RuntimeInterrupt> {
        let n = match &arguments[0] {
            Object::String(s) => s.chars().count() as f64,
            Object::Array(a) => a.borrow().len() as f64,
            _ => 1.0,
        };

        Ok(Object::Number(n))
    }
}

impl Display for Len {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<native fn>")
    }
}

#[derive(Debug)]
struct Str;

impl Callable for Str {
    fn arity(&self) -> usize {
        1
    }

    fn call(
        &self,
        _interpret: &mut Interpreter,
        arguments: &[Object],
    ) -> Result<Object, RuntimeInterrupt> {
        let s = match &arguments[0] {
            Object::String(s) => s.clone(),
            other => format!("{}", other),
        };

        Ok(Object::String(s))
    }
}

impl Display for Str {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<native fn>")
    }
}

pub fn clock() -> Rc<dyn Callable> {
    Rc::new(Clock)
}

pub fn len() -> Rc<dyn Callable> {
    Rc::new(Len)
}

pub fn string() -> Rc<dyn Callable> {
    Rc::new(Str)
}
