use tinylang::{tokenize, ErrorKind, TokenType};

fn types(source: &str) -> Vec<TokenType> {
    tokenize(source)
        .unwrap()
        .into_iter()
        .map(|token| token.token_type)
        .collect()
}

#[test]
fn declaration_tokens() {
    let tokens = tokenize("let x := 10").unwrap();
    let summary: Vec<_> = tokens
        .iter()
        .map(|t| (t.token_type, t.lexeme.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (TokenType::Let, "let"),
            (TokenType::Identifier, "x"),
            (TokenType::Declare, ":="),
            (TokenType::Number, "10"),
            (TokenType::Eof, ""),
        ]
    );
}

#[test]
fn fixed_tokens_use_canonical_text() {
    let source = ":= == != <= >= && || = + - * / ( ) { } < > ! [ ] , : \
                  let if else while true false func return";
    let tokens = tokenize(source).unwrap();
    assert_eq!(tokens.len(), 32);
    for token in &tokens[..tokens.len() - 1] {
        assert_eq!(token.token_type.lexeme(), Some(token.lexeme.as_str()), "{:?}", token);
    }
    assert!(tokens[23..31].iter().all(|t| t.token_type.is_keyword()));
    assert!(!tokens[..23].iter().any(|t| t.token_type.is_keyword()));
}

#[test]
fn two_character_operators_win_over_prefixes() {
    assert_eq!(
        types("a:=b==c!=d<=e>=f"),
        vec![
            TokenType::Identifier,
            TokenType::Declare,
            TokenType::Identifier,
            TokenType::EqualEqual,
            TokenType::Identifier,
            TokenType::BangEqual,
            TokenType::Identifier,
            TokenType::LessEqual,
            TokenType::Identifier,
            TokenType::GreaterEqual,
            TokenType::Identifier,
            TokenType::Eof,
        ]
    );
    assert_eq!(
        types("func f: a"),
        vec![
            TokenType::Func,
            TokenType::Identifier,
            TokenType::Colon,
            TokenType::Identifier,
            TokenType::Eof,
        ]
    );
}

#[test]
fn keywords_need_whole_words() {
    let tokens = tokenize("letter iffy _if if_ x1").unwrap();
    assert!(tokens[..5].iter().all(|t| t.token_type == TokenType::Identifier));
    assert_eq!(tokens[3].lexeme, "if_");
}

#[test]
fn number_literals() {
    let tokens = tokenize("3.14 42 0.5").unwrap();
    let lexemes: Vec<_> = tokens[..3].iter().map(|t| t.lexeme.as_str()).collect();
    assert_eq!(lexemes, vec!["3.14", "42", "0.5"]);

    let error = tokenize("42.").unwrap_err();
    assert_eq!(error.message, "Unexpected character '.'");
    assert_eq!((error.line(), error.column()), (1, 3));
}

#[test]
fn string_literals_keep_raw_content() {
    let tokens = tokenize("\"a b\" \"line\nbreak\" \"\"").unwrap();
    assert_eq!(tokens[0].token_type, TokenType::String);
    assert_eq!(tokens[0].lexeme, "a b");
    assert_eq!(tokens[1].lexeme, "line\nbreak");
    assert_eq!(tokens[2].lexeme, "");
    assert_eq!(tokens[2].line(), 2);
}

#[test]
fn unterminated_string_reports_its_start() {
    let error = tokenize("let s := \"open").unwrap_err();
    assert_eq!(error.kind, ErrorKind::LexError);
    assert_eq!(error.message, "Unterminated string");
    assert_eq!((error.line(), error.column()), (1, 10));
}

#[test]
fn positions_are_one_based() {
    let tokens = tokenize("let x := 1\n  y = 2\n\tz").unwrap();
    let y = &tokens[4];
    assert_eq!(y.lexeme, "y");
    assert_eq!((y.line(), y.column()), (2, 3));

    let z = &tokens[7];
    assert_eq!(z.lexeme, "z");
    assert_eq!((z.line(), z.column()), (3, 2));

    let eof = tokens.last().unwrap();
    assert_eq!(eof.token_type, TokenType::Eof);
    assert_eq!(eof.line(), 3);
}

#[test]
fn lone_logical_characters_are_errors() {
    let error = tokenize("a & b").unwrap_err();
    assert_eq!(error.message, "Expected '&' after '&'");
    assert_eq!(error.column(), 3);

    let error = tokenize("a | b").unwrap_err();
    assert_eq!(error.message, "Expected '|' after '|'");
}

#[test]
fn unknown_characters_are_errors() {
    let error = tokenize("x = 1\ny = #").unwrap_err();
    assert_eq!(error.kind, ErrorKind::LexError);
    assert_eq!(error.message, "Unexpected character '#'");
    assert_eq!((error.line(), error.column()), (2, 5));
}

#[test]
fn empty_source_is_just_eof() {
    assert_eq!(types(""), vec![TokenType::Eof]);
    assert_eq!(types(" \t\r\n"), vec![TokenType::Eof]);
}
