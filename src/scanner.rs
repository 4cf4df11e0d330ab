use log::debug;
use phf::phf_map;

use crate::{prelude::*, SharedErrorReporter};

static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "and" => TokenType::And,
    "break" => TokenType::Break,
    "class" => TokenType::Class,
    "continue" => TokenType::Continue,
    "else" => TokenType::Else,
    "false" => TokenType::False,
    "for" => TokenType::For,
    "fun" => TokenType::Fun,
    "if" => TokenType::If,
    "nil" => TokenType::Nil,
    "or" => TokenType::Or,
    "print" => TokenType::Print,
    "return" => TokenType::Return,
    "super" => TokenType::Super,
    "this" => TokenType::This,
    "true" => TokenType::True,
    "var" => TokenType::Var,
    "while" => TokenType::While,
};

#[derive(Debug)]
pub struct Scanner {
    source_chars: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: i32,
    error_reporter: Option<SharedErrorReporter>,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Self {
            source_chars: source.chars().collect(),
            start: 0,
            current: 0,
            line: 1,
            tokens: Vec::new(),
            error_reporter: None,
        }
    }

    pub fn with_error_reporting(self, error_reporter: SharedErrorReporter) -> Self {
        Self { error_reporter: Some(error_reporter), ..self }
    }

    pub fn scan_tokens(&mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }

        self.tokens.push(Token::new(TokenType::EOF, "", None, self.line));
        debug!("scanned {} tokens over {} lines", self.tokens.len(), self.line);

        // Take our temporary tokens out. It will be replaced by the
        // default() value for the vector
        std::mem::take(&mut self.tokens)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source_chars.len()
    }

    fn scan_token(&mut self) {
        let c = self.advance();

        match c {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            '[' => self.add_token(TokenType::LeftBracket),
            ']' => self.add_token(TokenType::RightBracket),
            ',' => self.add_token(TokenType::Comma),
            '.' => self.add_token(TokenType::Dot),
            ';' => self.add_token(TokenType::Semicolon),
            ':' => self.add_token(TokenType::Colon),
            '?' => self.add_token(TokenType::Question),
            '*' => self.add_token(TokenType::Star),
            '-' => {
                let token_type = if self.match_next('-') {
                    TokenType::MinusMinus
                } else {
                    TokenType::Minus
                };
                self.add_token(token_type);
            }
            '+' => {
                let token_type = if self.match_next('+') {
                    TokenType::PlusPlus
                } else {
                    TokenType::Plus
                };
                self.add_token(token_type);
            }
            '!' => {
                let token_type = if self.match_next('=') {
                    TokenType::BangEqual
                } else {
                    TokenType::Bang
                };
                self.add_token(token_type);
            }
            '=' => {
                let token_type = if self.match_next('=') {
                    TokenType::EqualEqual
                } else {
                    TokenType::Equal
                };
                self.add_token(token_type);
            }
            '<' => {
                let token_type = if self.match_next('=') {
                    TokenType::LessEqual
                } else {
                    TokenType::Less
                };
                self.add_token(token_type);
            }
            '>' => {
                let token_type = if self.match_next('=') {
                    TokenType::GreaterEqual
                } else {
                    TokenType::Greater
                };
                self.add_token(token_type);
            }
            '/' => {
                if self.match_next('/') {
                    // Go until end of the commented line
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenType::Slash);
                }
            }
            ' ' | '\r' | '\t' => {}
            '\n' => {
                self.line += 1;
            }
            '"' => self.string(),
            '0'..='9' => self.number(),
            c if is_alpha(c) => self.identifier(),
            _ => self.error(self.line, "Unexpected character."),
        }
    }

    fn error(&self, line: i32, msg: &str) {
        if let Some(reporter) = self.error_reporter.as_ref() {
            reporter.borrow_mut().error(line, msg);
        }
    }

    fn advance(&mut self) -> char {
        let ch = self.source_chars.get(self.current);
        self.current += 1;

        *ch.expect("failed to read char!")
    }

    fn add_token(&mut self, token_type: TokenType) {
        self.add_token_with_literal(token_type, None);
    }

    fn source_substring(&self, start: usize, end: usize) -> String {
        self.source_chars.get(start..end).unwrap().iter().collect()
    }

    fn add_token_with_literal(&mut self, token_type: TokenType, literal_value: Option<Object>) {
        let text = self.source_substring(self.start, self.current);
        let token = Token::new(token_type, &text, literal_value, self.line);
        self.tokens.push(token);
    }

    fn match_next(&mut self, expected: char) -> bool {
        if self.is_at_end() {
            return false;
        }

        if let Some(c) = self.source_chars.get(self.current) {
            if c == &expected {
                self.current += 1;
                return true;
            }
        }

        false
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            return '\0';
        }

        *self.source_chars.get(self.current).unwrap_or(&'\0')
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.source_chars.len() {
            return '\0';
        }

        *self.source_chars.get(self.current + 1).unwrap_or(&'\0')
    }

    // Escape sequences are kept verbatim in the literal; nothing is decoded.
    fn string(&mut self) {
        let opening_line = self.line;

        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            self.error(opening_line, "Unterminated string.");
            return;
        }

        // The closing "
        self.advance();

        // Skip the quote marks
        let text = self.source_substring(self.start + 1, self.current - 1);
        self.add_token_with_literal(TokenType::StringLiteral, Some(Object::String(text)));
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            // Consume '.'
            self.advance();

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text = self.source_substring(self.start, self.current);
        let value = text
            .parse::<f64>()
            .unwrap_or_else(|_| panic!("failed to parse number: {}", text));

        self.add_token_with_literal(TokenType::Number, Some(Object::Number(value)));
    }

    fn identifier(&mut self) {
        while is_alpha_numeric(self.peek()) {
            self.advance();
        }

        let text = self.source_substring(self.start, self.current);
        let token_type = KEYWORDS.get(text.as_str()).copied().unwrap_or(TokenType::Identifier);
        self.add_token(token_type);
    }
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_alpha_numeric(c: char) -> bool {
    is_alpha(c) || c.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> Vec<Token> {
        let mut scanner = Scanner::new(source);
        scanner.scan_tokens()
    }

    #[test]
    fn doubled_operators_win() {
        let tokens = scan("+ ++ - -- = ==");
        let types: Vec<_> = tokens.iter().map(|t| t.token_type).collect();
        assert_eq!(
            types,
            vec![
                TokenType::Plus,
                TokenType::PlusPlus,
                TokenType::Minus,
                TokenType::MinusMinus,
                TokenType::Equal,
                TokenType::EqualEqual,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn keywords_and_identifiers() {
        let tokens = scan("break continue breaker");
        assert_eq!(tokens[0].token_type, TokenType::Break);
        assert_eq!(tokens[1].token_type, TokenType::Continue);
        assert_eq!(tokens[2].token_type, TokenType::Identifier);
    }

    #[test]
    fn number_with_fraction() {
        let tokens = scan("3.14");
        assert_eq!(tokens[0].literal, Some(Object::Number(3.14)));
    }

    #[test]
    fn number_without_fraction_leaves_dot() {
        // '.' not followed by a digit belongs to the next token
        let tokens = scan("3.foo");
        assert_eq!(tokens[0].token_type, TokenType::Number);
        assert_eq!(tokens[1].token_type, TokenType::Dot);
        assert_eq!(tokens[2].token_type, TokenType::Identifier);
    }

    #[test]
    fn multiline_string_counts_lines() {
        let tokens = scan("\"a\nb\"");
        assert_eq!(tokens[0].literal, Some(Object::String("a\nb".to_owned())));
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn escape_sequences_are_not_decoded() {
        let tokens = scan(r#""a\nb""#);
        assert_eq!(tokens[0].literal, Some(Object::String("a\\nb".to_owned())));
    }

    #[test]
    fn line_comment_is_skipped() {
        let tokens = scan("1 // two three\n2");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].line, 2);
    }
}
