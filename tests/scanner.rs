use silt::prelude::*;

#[test]
fn scanner_works() {
    let input = "2 and 3";
    let mut scanner = Scanner::new(input);
    let tokens = scanner.scan_tokens();
    assert_eq!(tokens.len(), 4);
}

#[test]
fn extended_operators() {
    let input = "a++ ?: [1]";
    let mut scanner = Scanner::new(input);
    let tokens = scanner.scan_tokens();
    let types: Vec<_> = tokens.iter().map(|t| t.token_type).collect();
    assert_eq!(
        types,
        vec![
            TokenType::Identifier,
            TokenType::PlusPlus,
            TokenType::Question,
            TokenType::Colon,
            TokenType::LeftBracket,
            TokenType::Number,
            TokenType::RightBracket,
            TokenType::EOF,
        ]
    );
}
