use std::collections::HashMap;

use log::debug;

use crate::interpreter::Interpreter;
use crate::prelude::{Expr, Stmt};
use crate::token::Token;
use crate::SharedErrorReporter;

#[derive(Debug, Clone, PartialEq, Copy)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Debug, Clone, PartialEq, Copy)]
enum ClassType {
    None,
    Class,
    SubClass,
}

/// Static analysis pass that binds every local variable reference to the
/// environment that will hold it at runtime, and rejects the handful of
/// constructs that can be ruled out before execution. Errors are reported
/// and accumulated; the pass always walks the whole program.
pub struct Resolver<'i> {
    interpreter: &'i mut Interpreter,
    scopes: Vec<HashMap<String, bool>>,
    current_function: FunctionType,
    current_class: ClassType,
    error_reporter: Option<SharedErrorReporter>,
}

impl<'i> Resolver<'i> {
    pub fn new(interpreter: &'i mut Interpreter) -> Self {
        Self {
            interpreter,
            scopes: vec![],
            current_function: FunctionType::None,
            current_class: ClassType::None,
            error_reporter: None,
        }
    }

    pub fn with_error_reporting(self, error_reporter: SharedErrorReporter) -> Self {
        Self { error_reporter: Some(error_reporter), ..self }
    }

    pub fn resolve<I, R>(&mut self, statements: I)
    where
        I: IntoIterator<Item = R>,
        R: AsRef<Stmt>,
    {
        for stmt in statements {
            self.resolve_stmt(stmt.as_ref());
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block { statements } => {
                self.begin_scope();
                self.resolve(statements);
                self.end_scope();
            }
            Stmt::Var { name, initializer } => {
                // Declare first so the initializer can't read the variable
                // being defined: declare -> initialize -> define.
                self.declare(name);
                if let Some(initializer) = initializer {
                    self.resolve_expr(initializer);
                }
                self.define(name);
            }
            Stmt::Class { name, methods, superclass } => {
                self.resolve_class(name, methods, superclass)
            }
            Stmt::Function { name, params, body } => {
                // Unlike variables, we declare and define functions before
                // processing their body. This way, functions can
                // recursively call themselves.
                self.declare(name);
                self.define(name);

                self.resolve_function(params, body, FunctionType::Function);
            }
            Stmt::Expression { expr } => self.resolve_expr(expr),
            Stmt::If { condition, then_branch, else_branch } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(stmt) = else_branch {
                    self.resolve_stmt(stmt);
                }
            }
            Stmt::Print { expr } => self.resolve_expr(expr),
            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code.");
                }

                if let Some(expr) = value {
                    // Cannot return a value from "init"
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Can't return a value from an initializer.");
                    }
                    self.resolve_expr(expr);
                }
            }
            Stmt::While { condition, body, increment } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
                if let Some(increment) = increment {
                    self.resolve_expr(increment);
                }
            }
            Stmt::Break { token: _ } => {}
            Stmt::Continue { token: _ } => {}
        }
    }

    fn resolve_class(&mut self, name: &Token, methods: &[Stmt], superclass: &Option<Expr>) {
        let enclosing_class = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(name);
        self.define(name);

        if let Some(superclass) = superclass {
            // Make sure the superclass has a different name!
            if let Expr::Variable { name: super_name } = superclass {
                if super_name.lexeme == name.lexeme {
                    self.error(super_name, "A class can't inherit from itself.");
                }
            }

            self.current_class = ClassType::SubClass;
            self.resolve_expr(superclass);

            self.begin_scope();
            // Safe to unwrap, because we're calling begin_scope before it
            self.peek_mut_scope().unwrap().insert("super".to_owned(), true);
        }

        self.begin_scope();
        // Safe to unwrap, because we're calling begin_scope before it
        self.peek_mut_scope().unwrap().insert("this".to_owned(), true);

        for method in methods {
            if let Stmt::Function { name, params, body } = method {
                let func_type = if name.lexeme == "init" {
                    FunctionType::Initializer
                } else {
                    FunctionType::Method
                };

                self.resolve_function(params, body, func_type);
            }
        }

        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    fn resolve_function(
        &mut self,
        params: &[Token],
        body: &[std::rc::Rc<Stmt>],
        func_type: FunctionType,
    ) {
        let enclosing_func = self.current_function;
        self.current_function = func_type;

        self.begin_scope();
        for param in params {
            self.declare(param);
            self.define(param);
        }

        self.resolve(body);
        self.end_scope();
        self.current_function = enclosing_func;
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Variable { name } => {
                if let Some(scope) = self.scopes.last() {
                    if let Some(false) = scope.get(&name.lexeme) {
                        self.error(name, "Can't read local variable in its own initializer.");
                    }
                }

                self.resolve_local(expr, name);
            }
            Expr::Assignment { name, value } => {
                self.resolve_expr(value);
                self.resolve_local(expr, name);
            }
            Expr::Super { keyword, method: _ } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Can't use 'super' outside of a class.");
                } else if self.current_class != ClassType::SubClass {
                    self.error(keyword, "Can't use 'super' in a class with no superclass.");
                } else {
                    self.resolve_local(expr, keyword);
                }
            }
            Expr::This { keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Can't use 'this' outside of a class.");
                    return;
                }

                self.resolve_local(expr, keyword);
            }
            Expr::Binary { left, operator: _, right } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Logical { left, operator: _, right } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Ternary { condition, then_branch, else_branch } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_branch);
                self.resolve_expr(else_branch);
            }
            Expr::Call { callee, paren: _, arguments } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }
            Expr::Get { object, name: _ } => self.resolve_expr(object),
            Expr::Set { object, name: _, value } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }
            Expr::Index { target, bracket: _, index } => {
                self.resolve_expr(target);
                if let Some(index) = index {
                    self.resolve_expr(index);
                }
            }
            Expr::ArraySet { target, bracket: _, index, value } => {
                self.resolve_expr(target);
                if let Some(index) = index {
                    self.resolve_expr(index);
                }
                self.resolve_expr(value);
            }
            Expr::ArrayLiteral { bracket: _, items } => {
                for item in items {
                    self.resolve_expr(item);
                }
            }
            Expr::Lambda { params, body } => {
                self.resolve_function(params, body, FunctionType::Function);
            }
            Expr::Grouping { expr } => self.resolve_expr(expr),
            Expr::Literal { value: _ } => {}
            Expr::Unary { operator: _, right, postfix: _ } => self.resolve_expr(right),
        }
    }

    fn resolve_local(&mut self, input: &Expr, name: &Token) {
        for (i, scope) in self.scopes.iter().enumerate().rev() {
            if scope.contains_key(&name.lexeme) {
                let distance = self.scopes.len() - i - 1;
                debug!("resolved '{}' at distance {}", name.lexeme, distance);
                self.interpreter.resolve(input, distance);
                return;
            }
        }

        // Not found in any scope; assumed global.
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        if self.scopes.is_empty() {
            return;
        }

        if self.scopes.last().unwrap().contains_key(&name.lexeme) {
            self.error(name, "Already a variable with this name in this scope.");
            return;
        }

        self.scopes.last_mut().unwrap().insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn peek_mut_scope(&mut self) -> Option<&mut HashMap<String, bool>> {
        self.scopes.last_mut()
    }

    fn error(&self, token: &Token, message: &str) {
        if let Some(reporter) = self.error_reporter.as_ref() {
            reporter
                .borrow_mut()
                .report(token.line, &format!(" at '{}'", token.lexeme), message);
        }
    }
}
