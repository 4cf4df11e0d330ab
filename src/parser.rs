use std::rc::Rc;

use log::debug;

use crate::{prelude::*, SharedErrorReporter};

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    loop_depth: usize,
    error_reporter: Option<SharedErrorReporter>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0, loop_depth: 0, error_reporter: None }
    }

    pub fn with_error_reporting(self, error_reporter: SharedErrorReporter) -> Self {
        Self { error_reporter: Some(error_reporter), ..self }
    }

    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements = vec![];
        while !self.is_at_end() {
            match self.declaration() {
                Some(stmts) => statements.extend(stmts),
                None => self.synchronize(),
            }
        }

        debug!("parsed {} top-level statements", statements.len());
        statements
    }

    // A declaration can expand to several statements: `var a = 1, b = 2;`
    // produces one Var statement per name.
    fn declaration(&mut self) -> Option<Vec<Stmt>> {
        if self.match_tt(&[TokenType::Class]) {
            return self.class_declaration().map(|s| vec![s]);
        }

        // `fun` followed by '(' is a lambda expression, not a declaration
        if self.check(&TokenType::Fun) && self.check_next(&TokenType::Identifier) {
            self.advance();
            return self.function("function").map(|s| vec![s]);
        }

        if self.match_tt(&[TokenType::Var]) {
            return self.var_declarations();
        }

        self.statement().map(|s| vec![s])
    }

    fn class_declaration(&mut self) -> Option<Stmt> {
        let name = self.consume(TokenType::Identifier, "Expect class name")?;

        let superclass = if self.match_tt(&[TokenType::Less]) {
            let super_name = self.consume(TokenType::Identifier, "Expect superclass name")?;
            Some(Expr::Variable { name: super_name })
        } else {
            None
        };

        self.consume(TokenType::LeftBrace, "Expect '{' before class body")?;

        let mut methods = vec![];
        while !self.check(&TokenType::RightBrace) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(TokenType::RightBrace, "Expect '}' after class body")?;

        Some(Stmt::Class { name, superclass, methods })
    }

    fn var_declarations(&mut self) -> Option<Vec<Stmt>> {
        let mut stmts = vec![self.var_declaration()?];
        while self.match_tt(&[TokenType::Comma]) {
            stmts.push(self.var_declaration()?);
        }

        self.consume(TokenType::Semicolon, "Expect ';' after variable declaration")?;
        Some(stmts)
    }

    fn var_declaration(&mut self) -> Option<Stmt> {
        let name = self.consume(TokenType::Identifier, "Expect variable name")?;

        // Initializers sit below the comma operator, so the ',' after one
        // starts the next declaration.
        let initializer = if self.match_tt(&[TokenType::Equal]) {
            Some(self.assignment()?)
        } else {
            None
        };

        Some(Stmt::Var { name, initializer })
    }

    fn function(&mut self, kind: &str) -> Option<Stmt> {
        let name = self.consume(
            TokenType::Identifier,
            format!("Expect {} name", kind).as_str(),
        )?;

        let (params, body) = self.function_body(kind)?;
        Some(Stmt::Function { name, params, body })
    }

    fn lambda(&mut self) -> Option<Expr> {
        let (params, body) = self.function_body("function")?;
        Some(Expr::Lambda { params, body })
    }

    fn function_body(&mut self, kind: &str) -> Option<(Vec<Token>, Vec<Rc<Stmt>>)> {
        self.consume(
            TokenType::LeftParen,
            format!("Expect '(' after {} name", kind).as_str(),
        )?;

        let mut parameters = vec![];
        if !self.check(&TokenType::RightParen) {
            loop {
                if parameters.len() >= 255 {
                    let token = self.peek().clone();
                    self.error(token, "Can't have more than 255 parameters");
                }

                parameters.push(self.consume(TokenType::Identifier, "Expect parameter name")?);
                if !self.match_tt(&[TokenType::Comma]) {
                    break;
                }
            }
        }

        self.consume(TokenType::RightParen, "Expect ')' after parameters")?;
        self.consume(
            TokenType::LeftBrace,
            format!("Expect '{{' before {} body", kind).as_str(),
        )?;

        // break/continue must not cross a function boundary
        let enclosing_loops = std::mem::replace(&mut self.loop_depth, 0);
        let body = self.block();
        self.loop_depth = enclosing_loops;

        let body = body?.into_iter().map(Rc::new).collect::<Vec<_>>();
        Some((parameters, body))
    }

    fn statement(&mut self) -> Option<Stmt> {
        if self.match_tt(&[TokenType::If]) {
            self.if_statement()
        } else if self.match_tt(&[TokenType::While]) {
            self.while_statement()
        } else if self.match_tt(&[TokenType::Return]) {
            self.return_statement()
        } else if self.match_tt(&[TokenType::For]) {
            self.for_statement()
        } else if self.match_tt(&[TokenType::Print]) {
            self.print_statement()
        } else if self.match_tt(&[TokenType::Break]) {
            self.break_statement()
        } else if self.match_tt(&[TokenType::Continue]) {
            self.continue_statement()
        } else if self.match_tt(&[TokenType::LeftBrace]) {
            Some(Stmt::Block { statements: self.block()? })
        } else {
            self.expression_statement()
        }
    }

    fn if_statement(&mut self) -> Option<Stmt> {
        self.consume(TokenType::LeftParen, "Expect '(' after 'if'")?;
        let condition = self.expression()?;
        self.consume(TokenType::RightParen, "Expect ')' after if condition")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_tt(&[TokenType::Else]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Some(Stmt::If { condition, then_branch, else_branch })
    }

    fn return_statement(&mut self) -> Option<Stmt> {
        let keyword = self.previous();
        let value = if !self.check(&TokenType::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::Semicolon, "Expect ';' after return value")?;
        Some(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> Option<Stmt> {
        self.consume(TokenType::LeftParen, "Expect '(' after 'while'")?;
        let condition = self.expression()?;
        self.consume(TokenType::RightParen, "Expect ')' after while condition")?;

        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;

        Some(Stmt::While { condition, body: Box::new(body?), increment: None })
    }

    fn for_statement(&mut self) -> Option<Stmt> {
        self.consume(TokenType::LeftParen, "Expect '(' after 'for'")?;

        let initializer = if self.match_tt(&[TokenType::Semicolon]) {
            None
        } else if self.match_tt(&[TokenType::Var]) {
            let decl = self.var_declaration()?;
            self.consume(TokenType::Semicolon, "Expect ';' after variable declaration")?;
            Some(decl)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(&TokenType::Semicolon) {
            self.expression()?
        } else {
            Expr::Literal { value: Object::Boolean(true) }
        };
        self.consume(TokenType::Semicolon, "Expect ';' after 'for' condition")?;

        let increment = if !self.check(&TokenType::RightParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::RightParen, "Expect ')' after 'for' clauses")?;

        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;

        // The increment lives on the While node itself so that `continue`
        // still runs it before re-testing the condition.
        let mut stmt = Stmt::While { condition, body: Box::new(body?), increment };

        if let Some(initializer) = initializer {
            stmt = Stmt::Block { statements: vec![initializer, stmt] };
        }

        Some(stmt)
    }

    fn print_statement(&mut self) -> Option<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenType::Semicolon, "Expect ';' after value")?;
        Some(Stmt::Print { expr })
    }

    fn break_statement(&mut self) -> Option<Stmt> {
        let token = self.previous();
        if self.loop_depth == 0 {
            self.error(token.clone(), "Can't use 'break' outside of a loop");
        }

        self.consume(TokenType::Semicolon, "Expect ';' after 'break'")?;
        Some(Stmt::Break { token })
    }

    fn continue_statement(&mut self) -> Option<Stmt> {
        let token = self.previous();
        if self.loop_depth == 0 {
            self.error(token.clone(), "Can't use 'continue' outside of a loop");
        }

        self.consume(TokenType::Semicolon, "Expect ';' after 'continue'")?;
        Some(Stmt::Continue { token })
    }

    fn block(&mut self) -> Option<Vec<Stmt>> {
        let mut statements = vec![];

        while !self.check(&TokenType::RightBrace) && !self.is_at_end() {
            match self.declaration() {
                Some(stmts) => statements.extend(stmts),
                None => self.synchronize(),
            }
        }

        self.consume(TokenType::RightBrace, "Expect '}' after block")?;
        Some(statements)
    }

    fn expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenType::Semicolon, "Expect ';' after expression")?;
        Some(Stmt::Expression { expr })
    }

    fn expression(&mut self) -> Option<Expr> {
        self.comma()
    }

    fn comma(&mut self) -> Option<Expr> {
        let mut expr = self.assignment()?;

        while self.match_tt(&[TokenType::Comma]) {
            let operator = self.previous();
            let right = self.assignment()?;
            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }

        Some(expr)
    }

    fn assignment(&mut self) -> Option<Expr> {
        let expr = self.ternary()?;

        if self.match_tt(&[TokenType::Equal]) {
            let equals = self.previous();
            let value = self.assignment()?;

            // Re-interpret the left-hand side as an assignment target.
            return match expr {
                Expr::Variable { name } => {
                    Some(Expr::Assignment { name, value: Box::new(value) })
                }
                Expr::Get { object, name } => {
                    Some(Expr::Set { object, name, value: Box::new(value) })
                }
                Expr::Index { target, bracket, index } => {
                    Some(Expr::ArraySet { target, bracket, index, value: Box::new(value) })
                }
                _ => {
                    self.error(equals, "Invalid assignment target");
                    Some(expr)
                }
            };
        }

        Some(expr)
    }

    fn ternary(&mut self) -> Option<Expr> {
        let expr = self.or()?;

        if self.match_tt(&[TokenType::Question]) {
            let then_branch = self.expression()?;
            self.consume(TokenType::Colon, "Expect ':' after then branch of ternary")?;
            let else_branch = self.ternary()?;

            return Some(Expr::Ternary {
                condition: Box::new(expr),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            });
        }

        Some(expr)
    }

    fn or(&mut self) -> Option<Expr> {
        let mut expr = self.and()?;

        while self.match_tt(&[TokenType::Or]) {
            let operator = self.previous();
            let right = self.and()?;
            expr = Expr::Logical { left: Box::new(expr), operator, right: Box::new(right) };
        }

        Some(expr)
    }

    fn and(&mut self) -> Option<Expr> {
        let mut expr = self.equality()?;

        while self.match_tt(&[TokenType::And]) {
            let operator = self.previous();
            let right = self.equality()?;
            expr = Expr::Logical { left: Box::new(expr), operator, right: Box::new(right) };
        }

        Some(expr)
    }

    fn equality(&mut self) -> Option<Expr> {
        let mut expr = self.comparison()?;

        while self.match_tt(&[TokenType::BangEqual, TokenType::EqualEqual]) {
            let operator: Token = self.previous();
            let right = self.comparison()?;
            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }
        Some(expr)
    }

    fn comparison(&mut self) -> Option<Expr> {
        let mut expr = self.term()?;

        while self.match_tt(&[
            TokenType::GreaterEqual,
            TokenType::Greater,
            TokenType::LessEqual,
            TokenType::Less,
        ]) {
            let operator: Token = self.previous();
            let right = self.term()?;
            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }
        Some(expr)
    }

    fn term(&mut self) -> Option<Expr> {
        let mut expr = self.factor()?;

        while self.match_tt(&[TokenType::Minus, TokenType::Plus]) {
            let operator: Token = self.previous();
            let right = self.factor()?;
            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }
        Some(expr)
    }

    fn factor(&mut self) -> Option<Expr> {
        let mut expr = self.unary()?;

        while self.match_tt(&[TokenType::Slash, TokenType::Star]) {
            let operator: Token = self.previous();
            let right = self.unary()?;
            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }
        Some(expr)
    }

    fn unary(&mut self) -> Option<Expr> {
        if self.match_tt(&[TokenType::Bang, TokenType::Minus]) {
            let operator = self.previous();
            let right = self.unary()?;
            return Some(Expr::Unary { operator, right: Box::new(right), postfix: false });
        }

        self.prefix()
    }

    fn prefix(&mut self) -> Option<Expr> {
        if self.match_tt(&[TokenType::PlusPlus, TokenType::MinusMinus]) {
            let operator = self.previous();
            let right = self.primary()?;
            return Some(Expr::Unary { operator, right: Box::new(right), postfix: false });
        }

        self.postfix()
    }

    // Postfix binds only when the token right after the operand is ++/--.
    fn postfix(&mut self) -> Option<Expr> {
        if self.check_next(&TokenType::PlusPlus) || self.check_next(&TokenType::MinusMinus) {
            let expr = self.primary()?;
            let operator = self.advance();
            return Some(Expr::Unary { operator, right: Box::new(expr), postfix: true });
        }

        self.call()
    }

    fn call(&mut self) -> Option<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.match_tt(&[TokenType::LeftParen]) {
                expr = self.finish_call(expr)?;
            } else if self.match_tt(&[TokenType::Dot]) {
                let name = self.consume(TokenType::Identifier, "Expect property name after '.'")?;
                expr = Expr::Get { object: Box::new(expr), name };
            } else if self.match_tt(&[TokenType::LeftBracket]) {
                expr = self.finish_index(expr)?;
            } else {
                break;
            }
        }

        Some(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Option<Expr> {
        let mut arguments = vec![];

        if !self.check(&TokenType::RightParen) {
            loop {
                if arguments.len() >= 255 {
                    // Just report the error, but don't return None yet
                    let token = self.peek().clone();
                    self.error(token, "Can't have more than 255 arguments");
                }

                arguments.push(self.assignment()?);

                if !self.match_tt(&[TokenType::Comma]) {
                    break;
                }
            }
        }

        let paren = self.consume(TokenType::RightParen, "Expect ')' after arguments")?;
        Some(Expr::Call { callee: Box::new(callee), paren, arguments })
    }

    // An absent index (`a[]`) is only legal as the target of an assignment,
    // where it means append.
    fn finish_index(&mut self, target: Expr) -> Option<Expr> {
        let bracket = self.previous();

        let index = if self.check(&TokenType::RightBracket) {
            None
        } else {
            Some(Box::new(self.assignment()?))
        };

        if index.is_none() && !self.check_next(&TokenType::Equal) {
            self.error(bracket, "Expect expression after '['");
            return None;
        }

        self.consume(TokenType::RightBracket, "Expect ']' after index expression")?;
        Some(Expr::Index { target: Box::new(target), bracket, index })
    }

    fn array_literal(&mut self) -> Option<Expr> {
        let bracket = self.previous();

        let mut items = vec![];
        if !self.check(&TokenType::RightBracket) {
            loop {
                items.push(self.assignment()?);
                if !self.match_tt(&[TokenType::Comma]) {
                    break;
                }
            }
        }

        self.consume(TokenType::RightBracket, "Expect ']' after array items")?;
        Some(Expr::ArrayLiteral { bracket, items })
    }

    fn primary(&mut self) -> Option<Expr> {
        if self.match_tt(&[TokenType::False]) {
            return Some(Expr::Literal { value: Object::Boolean(false) });
        }
        if self.match_tt(&[TokenType::True]) {
            return Some(Expr::Literal { value: Object::Boolean(true) });
        }
        if self.match_tt(&[TokenType::Nil]) {
            return Some(Expr::Literal { value: Object::Null });
        }
        if self.match_tt(&[TokenType::Number, TokenType::StringLiteral]) {
            return Some(Expr::Literal {
                value: self
                    .previous()
                    .literal
                    .expect("expecting a number or string here"),
            });
        }
        if self.match_tt(&[TokenType::Super]) {
            let keyword = self.previous();
            self.consume(TokenType::Dot, "Expect '.' after 'super'")?;
            let method = self.consume(TokenType::Identifier, "Expect superclass method name")?;
            return Some(Expr::Super { keyword, method });
        }
        if self.match_tt(&[TokenType::This]) {
            return Some(Expr::This { keyword: self.previous() });
        }
        if self.match_tt(&[TokenType::Identifier]) {
            return Some(Expr::Variable { name: self.previous() });
        }
        if self.match_tt(&[TokenType::LeftParen]) {
            let expr = self.expression()?;
            self.consume(TokenType::RightParen, "Expect ')' after expression")?;
            return Some(Expr::Grouping { expr: Box::new(expr) });
        }
        if self.match_tt(&[TokenType::LeftBracket]) {
            return self.array_literal();
        }
        if self.check(&TokenType::Fun) && self.check_next(&TokenType::LeftParen) {
            self.advance();
            return self.lambda();
        }

        // Error productions: a binary operator with no left operand is
        // reported and consumed.
        if self.match_tt(&[TokenType::Question]) {
            let token = self.previous();
            self.error(token, "Missing left-hand condition of ternary operator");
            return None;
        }
        if self.match_tt(&[
            TokenType::BangEqual,
            TokenType::EqualEqual,
            TokenType::Greater,
            TokenType::GreaterEqual,
            TokenType::Less,
            TokenType::LessEqual,
            TokenType::Slash,
            TokenType::Star,
        ]) {
            let token = self.previous();
            self.error(token, "Missing left-hand operand");
            return None;
        }

        let token = self.peek().clone();
        self.error(token, "Expect expression");
        None
    }

    /// Return the next token if its `token_type` matches the given type as
    /// input. Otherwise, print the error message and return `None`.
    fn consume(&mut self, token_type: TokenType, message: &str) -> Option<Token> {
        if self.check(&token_type) {
            return Some(self.advance());
        }

        let token = self.peek().clone();
        self.error(token, message);
        None
    }

    fn error(&self, token: Token, message: &str) {
        let Some(reporter) = self.error_reporter.as_ref() else {
            return;
        };

        let mut reporter = reporter.borrow_mut();
        if token.token_type == TokenType::EOF {
            reporter.report(token.line, " at end", message);
        } else {
            reporter.report(token.line, &format!(" at '{}'", token.lexeme), message);
        }
    }

    fn match_tt(&mut self, types: &[TokenType]) -> bool {
        for tt in types {
            if self.check(tt) {
                self.advance();
                return true;
            }
        }

        false
    }

    /// Check to see if the next token's type matches the given `token_type`.
    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == *token_type
    }

    /// Like `check`, but one token further ahead. EOF never matches.
    fn check_next(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        match self.tokens.get(self.current + 1) {
            Some(token) if token.token_type != TokenType::EOF => {
                token.token_type == *token_type
            }
            _ => false,
        }
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::EOF
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.current).unwrap()
    }

    fn previous(&self) -> Token {
        self.tokens.get(self.current - 1).unwrap().clone()
    }

    fn synchronize(&mut self) {
        self.advance();

        // Move and discard tokens until we find a statement boundary
        while !self.is_at_end() {
            if self.previous().token_type == TokenType::Semicolon {
                return;
            }

            match self.peek().token_type {
                TokenType::Class
                | TokenType::Fun
                | TokenType::Var
                | TokenType::For
                | TokenType::If
                | TokenType::While
                | TokenType::Print
                | TokenType::Return => return,
                _ => {}
            }

            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;

    fn parse(source: &str) -> Vec<Stmt> {
        let mut scanner = Scanner::new(source);
        let tokens = scanner.scan_tokens();
        Parser::new(tokens).parse()
    }

    fn single_expression(source: &str) -> Expr {
        let mut stmts = parse(source);
        assert_eq!(stmts.len(), 1);
        match stmts.pop().unwrap() {
            Stmt::Expression { expr } => expr,
            other => panic!("expected an expression statement, got {:?}", other),
        }
    }

    #[test]
    fn var_list_expands_to_one_stmt_per_name() {
        let stmts = parse("var a = 1, b = 2;");
        assert_eq!(stmts.len(), 2);
        assert!(matches!(&stmts[0], Stmt::Var { name, .. } if name.lexeme == "a"));
        assert!(matches!(&stmts[1], Stmt::Var { name, .. } if name.lexeme == "b"));
    }

    #[test]
    fn for_desugars_to_block_with_while() {
        let stmts = parse("for (var i = 0; i < 3; i = i + 1) print i;");
        assert_eq!(stmts.len(), 1);

        let Stmt::Block { statements } = &stmts[0] else {
            panic!("expected a block");
        };
        assert!(matches!(statements[0], Stmt::Var { .. }));
        assert!(matches!(
            statements[1],
            Stmt::While { increment: Some(_), .. }
        ));
    }

    #[test]
    fn for_without_condition_loops_on_true() {
        let stmts = parse("for (;;) break;");
        assert!(matches!(
            &stmts[0],
            Stmt::While { condition: Expr::Literal { value: Object::Boolean(true) }, .. }
        ));
    }

    #[test]
    fn prefix_and_postfix_increment() {
        let expr = single_expression("++a;");
        assert!(matches!(expr, Expr::Unary { postfix: false, .. }));

        let expr = single_expression("a++;");
        assert!(matches!(expr, Expr::Unary { postfix: true, .. }));
    }

    #[test]
    fn comma_is_a_binary_expression() {
        let expr = single_expression("1, 2;");
        assert!(matches!(
            expr,
            Expr::Binary { ref operator, .. } if operator.token_type == TokenType::Comma
        ));
    }

    #[test]
    fn assignment_targets_are_reinterpreted() {
        assert!(matches!(single_expression("a = 1;"), Expr::Assignment { .. }));
        assert!(matches!(single_expression("a.b = 1;"), Expr::Set { .. }));
        assert!(matches!(single_expression("a[0] = 1;"), Expr::ArraySet { .. }));
    }

    #[test]
    fn append_target_has_no_index() {
        let expr = single_expression("a[] = 1;");
        assert!(matches!(expr, Expr::ArraySet { index: None, .. }));
    }

    #[test]
    fn lambda_expression_parses() {
        let stmts = parse("var f = fun (a, b) { return a; };");
        assert!(matches!(
            &stmts[0],
            Stmt::Var { initializer: Some(Expr::Lambda { params, .. }), .. } if params.len() == 2
        ));
    }

    #[test]
    fn ternary_parses_right_associative() {
        let expr = single_expression("1 ? 2 : 3 ? 4 : 5;");
        let Expr::Ternary { else_branch, .. } = expr else {
            panic!("expected a ternary");
        };
        assert!(matches!(*else_branch, Expr::Ternary { .. }));
    }
}
