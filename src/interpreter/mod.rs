mod expr;
mod stmt;

use std::collections::HashMap;

use crate::object::Object;
use crate::prelude::*;
use crate::{native, Shared, SharedErrorReporter};

type InterpreterResult = Result<Object, RuntimeInterrupt>;

pub struct Interpreter {
    pub globals: Shared<Environment>,
    environment: Shared<Environment>,
    locals: HashMap<UniqueId, usize>, // unique id -> depth
    error_reporter: Option<SharedErrorReporter>,
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Environment::new().as_shared();
        let environment = globals.clone();

        globals.borrow_mut().define("clock", Object::Callable(native::clock()));
        globals.borrow_mut().define("len", Object::Callable(native::len()));
        globals.borrow_mut().define("string", Object::Callable(native::string()));

        Self { globals, environment, locals: HashMap::new(), error_reporter: None }
    }

    pub fn with_error_reporting(self, error_reporter: SharedErrorReporter) -> Self {
        Self { error_reporter: Some(error_reporter), ..self }
    }

    pub fn interpret(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            if let Err(e) = self.execute(stmt) {
                self.runtime_error(e);
                // A runtime error abandons the rest of the run.
                return;
            }
        }
    }

    pub fn execute_block<I, R>(
        &mut self,
        statements: I,
        environment: Shared<Environment>,
    ) -> Result<(), RuntimeInterrupt>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<Stmt>,
    {
        let prev_env = self.environment.clone();
        self.environment = environment;

        for s in statements {
            let result = self.execute(s.as_ref());
            if result.is_err() {
                self.environment = prev_env;
                return result;
            }
        }

        self.environment = prev_env;
        Ok(())
    }

    pub fn resolve(&mut self, input: &Expr, depth: usize) {
        self.locals.insert(input.unique_id(), depth);
    }

    fn runtime_error(&self, e: RuntimeInterrupt) {
        if let Some(reporter) = self.error_reporter.as_ref() {
            reporter.borrow_mut().runtime_error(&e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Resolver;
    use crate::token::{Token, TokenType};

    // Run a program and read back a global by name afterwards.
    fn run_and_get(source: &str, name: &str) -> Object {
        let mut scanner = Scanner::new(source);
        let tokens = scanner.scan_tokens();
        let stmts = Parser::new(tokens).parse();

        let mut itpr = Interpreter::new();
        let mut resolver = Resolver::new(&mut itpr);
        resolver.resolve(&stmts);
        itpr.interpret(&stmts);

        let token = Token::new(TokenType::Identifier, name, None, 1);
        let value = itpr.globals.borrow().get(&token);
        value.unwrap_or_else(|_| panic!("global '{}' was not defined", name))
    }

    #[test]
    fn closures_capture_by_reference() {
        let src = "var a = 1; var r = 0; fun f() { r = a; } a = 2; f();";
        assert_eq!(run_and_get(src, "r"), Object::Number(2.0));
    }

    #[test]
    fn counter_closure_keeps_state() {
        let src = r#"
            fun make() {
                var n = 0;
                fun tick() { n = n + 1; return n; }
                return tick;
            }
            var c = make();
            c(); c();
            var r = c();
        "#;
        assert_eq!(run_and_get(src, "r"), Object::Number(3.0));
    }

    #[test]
    fn ternary_selects_by_truthiness() {
        assert_eq!(run_and_get("var r = 1 < 2 ? 10 : 20;", "r"), Object::Number(10.0));
        assert_eq!(run_and_get("var r = nil ? 10 : 20;", "r"), Object::Number(20.0));
    }

    #[test]
    fn comma_yields_the_right_operand() {
        assert_eq!(run_and_get("var r = (1, 2, 3);", "r"), Object::Number(3.0));
    }

    #[test]
    fn prefix_increment_yields_updated_value() {
        assert_eq!(run_and_get("var v = 1; var r = ++v;", "r"), Object::Number(2.0));
        assert_eq!(run_and_get("var v = 1; ++v; var r = v;", "r"), Object::Number(2.0));
    }

    #[test]
    fn postfix_increment_yields_original_value() {
        assert_eq!(run_and_get("var v = 1; var r = v++;", "r"), Object::Number(1.0));
        assert_eq!(run_and_get("var v = 1; v++; var r = v;", "r"), Object::Number(2.0));
    }

    #[test]
    fn postfix_decrement() {
        assert_eq!(run_and_get("var v = 1; var r = v--;", "r"), Object::Number(1.0));
        assert_eq!(run_and_get("var v = 1; v--; var r = v;", "r"), Object::Number(0.0));
    }

    #[test]
    fn array_index_and_set() {
        let src = "var a = [10, 20, 30]; a[1] = 99; var r = a[1];";
        assert_eq!(run_and_get(src, "r"), Object::Number(99.0));
    }

    #[test]
    fn array_append_extends_by_one() {
        let src = "var a = [1]; a[] = 2; var r = len(a);";
        assert_eq!(run_and_get(src, "r"), Object::Number(2.0));
    }

    #[test]
    fn len_of_string_and_array() {
        assert_eq!(run_and_get(r#"var r = len("abc");"#, "r"), Object::Number(3.0));
        assert_eq!(run_and_get("var r = len([1, 2, 3]);", "r"), Object::Number(3.0));
        assert_eq!(run_and_get("var r = len(5);", "r"), Object::Number(1.0));
    }

    #[test]
    fn string_builtin_stringifies() {
        assert_eq!(run_and_get("var r = string(12);", "r"), Object::String("12".to_owned()));
        assert_eq!(
            run_and_get(r#"var r = string("already");"#, "r"),
            Object::String("already".to_owned())
        );
        assert_eq!(run_and_get("var r = string(nil);", "r"), Object::String("nil".to_owned()));
    }

    #[test]
    fn class_call_yields_instance_even_with_bare_return() {
        let src = "class P { init() { return; } } var r = string(P());";
        assert_eq!(run_and_get(src, "r"), Object::String("P instance".to_owned()));
    }

    #[test]
    fn method_binding_keeps_this() {
        let src = r#"
            class A {
                init() { this.x = 41; }
                get() { return this.x; }
            }
            var m = A().get;
            var r = m();
        "#;
        assert_eq!(run_and_get(src, "r"), Object::Number(41.0));
    }

    #[test]
    fn super_calls_the_parent_method() {
        let src = r#"
            class A { speak() { return "A"; } }
            class B < A { speak() { return super.speak() + "B"; } }
            var r = B().speak();
        "#;
        assert_eq!(run_and_get(src, "r"), Object::String("AB".to_owned()));
    }

    #[test]
    fn fields_shadow_methods() {
        let src = r#"
            class A { name() { return "method"; } }
            var a = A();
            a.name = "field";
            var r = a.name;
        "#;
        assert_eq!(run_and_get(src, "r"), Object::String("field".to_owned()));
    }

    #[test]
    fn continue_still_runs_the_for_increment() {
        let src = r#"
            var sum = 0;
            for (var i = 0; i < 5; i = i + 1) {
                if (i == 2) continue;
                sum = sum + i;
            }
        "#;
        // 0 + 1 + 3 + 4
        assert_eq!(run_and_get(src, "sum"), Object::Number(8.0));
    }

    #[test]
    fn break_leaves_the_loop_early() {
        let src = r#"
            var n = 0;
            while (true) {
                n = n + 1;
                if (n == 3) break;
            }
        "#;
        assert_eq!(run_and_get(src, "n"), Object::Number(3.0));
    }

    #[test]
    fn lambda_is_a_first_class_value() {
        let src = "var f = fun (a, b) { return a + b; }; var r = f(2, 3);";
        assert_eq!(run_and_get(src, "r"), Object::Number(5.0));
    }

    #[test]
    fn nil_equality_rules() {
        assert_eq!(run_and_get("var r = nil == nil;", "r"), Object::Boolean(true));
        assert_eq!(run_and_get("var r = nil == 0;", "r"), Object::Boolean(false));
        assert_eq!(run_and_get(r#"var r = 1 == "1";"#, "r"), Object::Boolean(false));
    }

    #[test]
    fn var_list_declares_every_name() {
        assert_eq!(run_and_get("var a = 1, b = a + 1; var r = b;", "r"), Object::Number(2.0));
    }

    #[test]
    fn logical_operators_return_operands() {
        assert_eq!(run_and_get(r#"var r = nil or "fallback";"#, "r"),
            Object::String("fallback".to_owned()));
        assert_eq!(run_and_get("var r = 1 and 2;", "r"), Object::Number(2.0));
        assert_eq!(run_and_get("var r = false and 2;", "r"), Object::Boolean(false));
    }
}
