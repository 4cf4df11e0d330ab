use std::collections::HashMap;
use std::rc::Rc;

use crate::prelude::*;

impl Interpreter {
    pub fn execute(&mut self, stmt: &Stmt) -> Result<(), RuntimeInterrupt> {
        match stmt {
            Stmt::Expression { expr } => {
                self.evaluate_expr(expr)?;
            }
            Stmt::Class { name, methods, superclass } => {
                self.execute_class(name, methods, superclass)?
            }
            Stmt::Function { name, params, body } => {
                // self.environment is the current active environment when
                // the function is being declared, NOT when it's being
                // called! For inner functions, it refers to their parent
                // function's environment.
                let env = self.environment.clone();
                let function =
                    SiltFunction::new(Some(name.clone()), params.to_vec(), body, env, false);
                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Object::Callable(Rc::new(function)));
            }
            Stmt::Break { token } => {
                return Err(RuntimeInterrupt::Break { line: token.line })
            }
            Stmt::Continue { token } => {
                return Err(RuntimeInterrupt::Continue { line: token.line })
            }
            Stmt::Return { keyword, value } => {
                let value =
                    if let Some(expr) = value { self.evaluate_expr(expr)? } else { Object::Null };

                return Err(RuntimeInterrupt::Return { line: keyword.line, value });
            }
            Stmt::Print { expr } => {
                let value = self.evaluate_expr(expr)?;
                println!("{value}");
            }
            Stmt::Var { name, initializer } => {
                let value = if let Some(expr) = initializer {
                    self.evaluate_expr(expr)?
                } else {
                    Object::Null
                };

                self.environment.borrow_mut().define(&name.lexeme, value);
            }
            Stmt::Block { statements } => {
                // Create a new environment for executing the block
                let new_env = Environment::new().with_enclosing(self.environment.clone()).as_shared();

                self.execute_block(statements, new_env)?;
            }
            Stmt::If { condition, then_branch, else_branch } => {
                let condition_result = self.evaluate_expr(condition)?;

                if self.is_truthy(&condition_result) {
                    self.execute(then_branch.as_ref())?;
                } else if let Some(stmt) = else_branch {
                    self.execute(stmt.as_ref())?;
                }
            }
            Stmt::While { condition, body, increment } => {
                self.execute_while(condition, body, increment)?
            }
        };
        Ok(())
    }

    fn execute_class(
        &mut self,
        name: &Token,
        methods: &[Stmt],
        superclass: &Option<Expr>,
    ) -> Result<(), RuntimeInterrupt> {
        let superclass = if let Some(s) = superclass {
            let obj = self.evaluate_expr(s)?;
            match obj {
                Object::Class(c) => Some(c),
                _ => {
                    return Err(RuntimeInterrupt::error(name.line, "Superclass must be a class"));
                }
            }
        } else {
            None
        };

        self.environment.borrow_mut().define(&name.lexeme, Object::Null);

        // Methods of a subclass close over an extra scope holding 'super'.
        if let Some(ref superclass) = superclass {
            self.environment =
                Environment::new().with_enclosing(self.environment.clone()).as_shared();

            self.environment.borrow_mut().define("super", Object::Class(superclass.clone()));
        }

        let mut method_funcs = HashMap::new();
        for method in methods {
            if let Stmt::Function { name, params, body } = method {
                let is_initializer = name.lexeme == "init";

                method_funcs.insert(
                    name.lexeme.clone(),
                    Rc::new(SiltFunction::new(
                        Some(name.clone()),
                        params.to_vec(),
                        body,
                        self.environment.clone(),
                        is_initializer,
                    )),
                );
            }
        }

        let class = Class::new(&name.lexeme, method_funcs, superclass.clone()).as_shared();

        if superclass.is_some() {
            let enclosing = self.environment.borrow().enclosing.clone().unwrap();
            self.environment = enclosing;
        }

        self.environment.borrow_mut().assign(name, Object::Class(class))
    }

    fn execute_while(
        &mut self,
        condition: &Expr,
        body: &Stmt,
        increment: &Option<Expr>,
    ) -> Result<(), RuntimeInterrupt> {
        loop {
            let value = self.evaluate_expr(condition)?;
            if !self.is_truthy(&value) {
                break;
            }

            match self.execute(body) {
                // A break ends the loop without running the increment.
                Err(RuntimeInterrupt::Break { .. }) => break,
                // A continue only skips the rest of the body; the increment
                // of a desugared `for` still runs.
                Err(RuntimeInterrupt::Continue { .. }) | Ok(()) => {}
                Err(other) => return Err(other),
            }

            if let Some(increment) = increment {
                self.evaluate_expr(increment)?;
            }
        }

        Ok(())
    }
}
