#![allow(clippy::new_without_default)]
mod array;
mod ast;
mod class;
mod environment;
mod error;
mod func;
mod interpreter;
mod native;
mod object;
mod parser;
mod printer;
mod resolver;
mod scanner;
mod token;

pub mod prelude {
    pub use crate::array::*;
    pub use crate::ast::*;
    pub use crate::class::*;
    pub use crate::environment::*;
    pub use crate::error::*;
    pub use crate::func::*;
    pub use crate::interpreter::*;
    pub use crate::object::*;
    pub use crate::parser::*;
    pub use crate::printer::*;
    pub use crate::resolver::*;
    pub use crate::scanner::*;
    pub use crate::token::*;

    pub use crate::Shared;
}

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use log::debug;

use prelude::{Interpreter, Parser, Resolver, RuntimeInterrupt, Scanner, Stmt};

pub type Shared<T> = Rc<RefCell<T>>;
pub type SharedErrorReporter = Shared<ConsoleReporter>;

/// Sink for diagnostics; also owns the flags that drive exit codes.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    pub had_error: bool,
    pub had_runtime_error: bool,
}

impl ConsoleReporter {
    pub fn error(&mut self, line: i32, message: &str) {
        self.report(line, "", message);
    }

    pub fn report(&mut self, line: i32, location: &str, message: &str) {
        eprintln!("[line {}] Error{}: {}", line, location, message);
        self.had_error = true;
    }

    pub fn runtime_error(&mut self, e: &RuntimeInterrupt) {
        eprintln!("{}", e);
        self.had_runtime_error = true;
    }
}

pub struct Silt {
    reporter: SharedErrorReporter,
    interpreter: Interpreter,
    // The locals table is keyed by node address; every resolved program is
    // kept alive so ids stay unique for the interpreter's lifetime.
    programs: Vec<Vec<Stmt>>,
}

impl Silt {
    pub fn new() -> Self {
        let reporter: SharedErrorReporter = Rc::new(RefCell::new(ConsoleReporter::default()));
        let interpreter = Interpreter::new().with_error_reporting(reporter.clone());

        Self { reporter, interpreter, programs: vec![] }
    }

    pub fn had_error(&self) -> bool {
        self.reporter.borrow().had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.reporter.borrow().had_runtime_error
    }

    pub fn run_file(&mut self, filename: &str) -> Result<(), anyhow::Error> {
        let content = std::fs::read_to_string(filename)?;
        self.run(content.as_ref());
        Ok(())
    }

    pub fn run_prompt(&mut self) -> Result<(), anyhow::Error> {
        let reader = std::io::stdin();

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let mut line = String::new();
            let n = reader.read_line(&mut line)?;
            let line = line.trim_end();
            if n == 0 || line.is_empty() {
                return Ok(());
            }

            self.run(line);
            // The next line starts fresh, but globals survive.
            self.reporter.borrow_mut().had_error = false;
        }
    }

    pub fn run(&mut self, source: &str) {
        let mut scanner = Scanner::new(source).with_error_reporting(self.reporter.clone());
        let tokens = scanner.scan_tokens();

        let mut parser = Parser::new(tokens).with_error_reporting(self.reporter.clone());
        let statements = parser.parse();

        if self.had_error() {
            debug!("skipping resolution: scan or parse errors");
            return;
        }

        let mut resolver =
            Resolver::new(&mut self.interpreter).with_error_reporting(self.reporter.clone());
        resolver.resolve(&statements);

        if self.had_error() {
            debug!("skipping interpretation: resolution errors");
            return;
        }

        self.interpreter.interpret(&statements);
        self.programs.push(statements);
    }
}
