use crate::error::{Span, TinyError};
use log::debug;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    // Single-character tokens
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Colon,
    Minus,
    Plus,
    Slash,
    Star,

    // One or two character tokens
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Declare,
    AndAnd,
    OrOr,

    // Literals
    Identifier,
    String,
    Number,

    // Keywords
    Let,
    If,
    Else,
    While,
    True,
    False,
    Func,
    Return,

    // Special
    Eof,
}

const KEYWORDS: [(&str, TokenType); 8] = [
    ("let", TokenType::Let),
    ("if", TokenType::If),
    ("else", TokenType::Else),
    ("while", TokenType::While),
    ("true", TokenType::True),
    ("false", TokenType::False),
    ("func", TokenType::Func),
    ("return", TokenType::Return),
];

impl TokenType {
    /// Canonical source text of fixed-text tokens. Literal-carrying kinds
    /// (identifiers, numbers, strings) and end-of-input have none.
    pub fn lexeme(&self) -> Option<&'static str> {
        let text = match self {
            TokenType::LeftParen => "(",
            TokenType::RightParen => ")",
            TokenType::LeftBrace => "{",
            TokenType::RightBrace => "}",
            TokenType::LeftBracket => "[",
            TokenType::RightBracket => "]",
            TokenType::Comma => ",",
            TokenType::Colon => ":",
            TokenType::Minus => "-",
            TokenType::Plus => "+",
            TokenType::Slash => "/",
            TokenType::Star => "*",
            TokenType::Bang => "!",
            TokenType::BangEqual => "!=",
            TokenType::Equal => "=",
            TokenType::EqualEqual => "==",
            TokenType::Greater => ">",
            TokenType::GreaterEqual => ">=",
            TokenType::Less => "<",
            TokenType::LessEqual => "<=",
            TokenType::Declare => ":=",
            TokenType::AndAnd => "&&",
            TokenType::OrOr => "||",
            TokenType::Let => "let",
            TokenType::If => "if",
            TokenType::Else => "else",
            TokenType::While => "while",
            TokenType::True => "true",
            TokenType::False => "false",
            TokenType::Func => "func",
            TokenType::Return => "return",
            TokenType::Identifier | TokenType::String | TokenType::Number | TokenType::Eof => {
                return None
            }
        };
        Some(text)
    }

    pub fn is_keyword(&self) -> bool {
        KEYWORDS.iter().any(|(_, token_type)| token_type == self)
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenType::Identifier => write!(f, "identifier"),
            TokenType::String => write!(f, "string"),
            TokenType::Number => write!(f, "number"),
            TokenType::Eof => write!(f, "end of input"),
            other => write!(f, "'{}'", other.lexeme().unwrap_or_default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, span: Span) -> Self {
        Self {
            token_type,
            lexeme,
            span,
        }
    }

    pub fn line(&self) -> usize {
        self.span.line
    }

    pub fn column(&self) -> usize {
        self.span.column
    }

    /// Human-readable description used in parse errors.
    pub fn describe(&self) -> String {
        match self.token_type {
            TokenType::Identifier => format!("identifier '{}'", self.lexeme),
            TokenType::Number => format!("number {}", self.lexeme),
            TokenType::String => format!("string \"{}\"", self.lexeme),
            other => other.to_string(),
        }
    }
}

pub struct Lexer {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
    column: usize,
    start_line: usize,
    start_column: usize,
    keywords: HashMap<&'static str, TokenType>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            column: 1,
            start_line: 1,
            start_column: 1,
            keywords: KEYWORDS.into_iter().collect(),
        }
    }

    pub fn scan_tokens(mut self) -> Result<Vec<Token>, TinyError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.start_line = self.line;
            self.start_column = self.column;
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenType::Eof,
            String::new(),
            Span::single(self.current, self.line, self.column),
        ));

        debug!("scanned {} tokens", self.tokens.len());
        Ok(self.tokens)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn scan_token(&mut self) -> Result<(), TinyError> {
        let c = self.advance();

        match c {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            '[' => self.add_token(TokenType::LeftBracket),
            ']' => self.add_token(TokenType::RightBracket),
            ',' => self.add_token(TokenType::Comma),
            '-' => self.add_token(TokenType::Minus),
            '+' => self.add_token(TokenType::Plus),
            '*' => self.add_token(TokenType::Star),
            '/' => self.add_token(TokenType::Slash),
            ':' => {
                let token_type = if self.match_char('=') {
                    TokenType::Declare
                } else {
                    TokenType::Colon
                };
                self.add_token(token_type);
            }
            '!' => {
                let token_type = if self.match_char('=') {
                    TokenType::BangEqual
                } else {
                    TokenType::Bang
                };
                self.add_token(token_type);
            }
            '=' => {
                let token_type = if self.match_char('=') {
                    TokenType::EqualEqual
                } else {
                    TokenType::Equal
                };
                self.add_token(token_type);
            }
            '<' => {
                let token_type = if self.match_char('=') {
                    TokenType::LessEqual
                } else {
                    TokenType::Less
                };
                self.add_token(token_type);
            }
            '>' => {
                let token_type = if self.match_char('=') {
                    TokenType::GreaterEqual
                } else {
                    TokenType::Greater
                };
                self.add_token(token_type);
            }
            '&' => self.pair('&', TokenType::AndAnd)?,
            '|' => self.pair('|', TokenType::OrOr)?,
            ' ' | '\r' | '\t' | '\n' => {}
            '"' => self.string()?,
            c if c.is_ascii_digit() => self.number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
            _ => {
                return Err(TinyError::lex_error(
                    self.token_span(),
                    format!("Unexpected character '{}'", c),
                ));
            }
        }

        Ok(())
    }

    /// `&&` and `||` only exist as pairs.
    fn pair(&mut self, expected: char, token_type: TokenType) -> Result<(), TinyError> {
        if self.match_char(expected) {
            self.add_token(token_type);
            Ok(())
        } else {
            Err(TinyError::lex_error(
                self.token_span(),
                format!("Expected '{}' after '{}'", expected, expected),
            ))
        }
    }

    fn advance(&mut self) -> char {
        let Some(&c) = self.source.get(self.current) else {
            return '\0';
        };
        self.current += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    fn peek(&self) -> char {
        self.source.get(self.current).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.source.get(self.current + 1).copied().unwrap_or('\0')
    }

    fn string(&mut self) -> Result<(), TinyError> {
        while self.peek() != '"' && !self.is_at_end() {
            self.advance();
        }

        if self.is_at_end() {
            return Err(TinyError::lex_error(
                self.token_span(),
                "Unterminated string".to_string(),
            ));
        }

        // Consume the closing "
        self.advance();

        let content: String = self.source[self.start + 1..self.current - 1].iter().collect();
        self.add_token_with_content(TokenType::String, content);
        Ok(())
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        self.add_token(TokenType::Number);
    }

    fn identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = self.text();
        let token_type = self
            .keywords
            .get(text.as_str())
            .copied()
            .unwrap_or(TokenType::Identifier);

        self.add_token_with_content(token_type, text);
    }

    fn text(&self) -> String {
        self.source[self.start..self.current].iter().collect()
    }

    fn token_span(&self) -> Span {
        Span::new(self.start, self.current, self.start_line, self.start_column)
    }

    fn add_token(&mut self, token_type: TokenType) {
        let text = self.text();
        self.add_token_with_content(token_type, text);
    }

    fn add_token_with_content(&mut self, token_type: TokenType, lexeme: String) {
        let span = self.token_span();
        self.tokens.push(Token::new(token_type, lexeme, span));
    }
}

/// Convenience wrapper: tokenize a whole source text.
pub fn tokenize(source: &str) -> Result<Vec<Token>, TinyError> {
    Lexer::new(source).scan_tokens()
}
