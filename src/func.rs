use std::fmt::{Debug, Display};
use std::rc::Rc;

use crate::prelude::*;

pub trait Callable: Debug + Display {
    fn arity(&self) -> usize;
    fn call(
        &self,
        interpret: &mut Interpreter,
        arguments: &[Object],
    ) -> Result<Object, RuntimeInterrupt>;
}

/// A user-defined function, method, or lambda. Lambdas have no name and
/// print as `<fn closure>`.
#[derive(Debug, Clone)]
pub struct SiltFunction {
    name: Option<Token>,
    params: Vec<Token>,
    body: Vec<Rc<Stmt>>,
    closure: Shared<Environment>,
    is_initializer: bool,
}

impl SiltFunction {
    pub fn new(
        name: Option<Token>,
        params: Vec<Token>,
        body: &[Rc<Stmt>],
        closure: Shared<Environment>,
        is_initializer: bool,
    ) -> Self {
        Self { name, params, body: body.to_vec(), closure, is_initializer }
    }

    /// Returns a copy of this function whose closure is a fresh environment
    /// that defines `this` to the given instance.
    pub fn bind(&self, this: Object) -> Rc<SiltFunction> {
        let env = Environment::new().with_enclosing(self.closure.clone()).as_shared();
        env.borrow_mut().define("this", this);

        Rc::new(SiltFunction::new(
            self.name.clone(),
            self.params.clone(),
            &self.body,
            env,
            self.is_initializer,
        ))
    }

    fn new_env_for_call(&self, arguments: &[Object]) -> Shared<Environment> {
        let mut environment = Environment::new().with_enclosing(self.closure.clone());

        // Put all arguments in this new environment
        for (arg, param) in arguments.iter().zip(&self.params) {
            environment.define(param.lexeme.as_str(), arg.clone());
        }

        environment.as_shared()
    }
}

impl Callable for SiltFunction {
    fn arity(&self) -> usize {
        self.params.len()
    }

    fn call(
        &self,
        interpret: &mut Interpreter,
        arguments: &[Object],
    ) -> Result<Object, RuntimeInterrupt> {
        // Every call needs a new environment (i.e. "stack"). If we keep one
        // stack for all calls, subsequent calls will override each others'
        // parameters.
        let environment = self.new_env_for_call(arguments);

        let res = interpret.execute_block(&self.body, environment);

        // An initializer always yields `this`, even on a bare `return;`.
        if self.is_initializer
            && (matches!(res, Ok(_)) || matches!(res, Err(RuntimeInterrupt::Return { .. })))
        {
            let token = Token::new(TokenType::This, "this", None, -1);
            return self.closure.borrow().get_at(0, &token);
        }

        // A 'Return' interrupt means the block had a return statement; its
        // value is the call result. Otherwise return nil or the error.
        if let Err(RuntimeInterrupt::Return { value, .. }) = res {
            Ok(value)
        } else {
            res.map(|_| Object::Null)
        }
    }
}

impl Display for SiltFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "<fn {}>", name.lexeme),
            None => write!(f, "<fn closure>"),
        }
    }
}
