use crate::ast::{BinaryOp, Expr, Program, Stmt, UnaryOp};
use crate::error::TinyError;
use crate::lexer::{Token, TokenType};
use std::rc::Rc;

const COMPARISON_OPERATORS: [TokenType; 6] = [
    TokenType::EqualEqual,
    TokenType::BangEqual,
    TokenType::Less,
    TokenType::LessEqual,
    TokenType::Greater,
    TokenType::GreaterEqual,
];

/// Deepest allowed nesting of expressions and blocks. Keeps pathological
/// input from exhausting the native stack.
const MAX_NESTING_DEPTH: usize = 64;

/// Recursive-descent parser. Never backtracks; the first error aborts the
/// whole parse.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
}

impl Parser {
    /// `tokens` should end with an end-of-input token, as produced by the
    /// lexer. One is appended if missing.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.token_type) != Some(TokenType::Eof) {
            let span = tokens
                .last()
                .map(|t| t.span.clone())
                .unwrap_or_else(|| crate::error::Span::single(0, 1, 1));
            tokens.push(Token::new(TokenType::Eof, String::new(), span));
        }
        Self {
            tokens,
            current: 0,
            depth: 0,
        }
    }

    pub fn parse(&mut self) -> Result<Program, TinyError> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            statements.push(self.statement()?);
        }

        Ok(Program { statements })
    }

    fn statement(&mut self) -> Result<Stmt, TinyError> {
        match self.peek().token_type {
            TokenType::Let => self.let_statement(),
            TokenType::If => self.if_statement(),
            TokenType::While => self.while_statement(),
            TokenType::Func => self.function_statement(),
            TokenType::Return => self.return_statement(),
            TokenType::Identifier if self.check_next(TokenType::Equal) => self.assign_statement(),
            _ => self.expression_statement(),
        }
    }

    fn block(&mut self, owner: &str) -> Result<Vec<Stmt>, TinyError> {
        self.consume_with_help(
            TokenType::LeftBrace,
            &format!("Expected '{{' before {} body", owner),
            format!("The body of '{}' must be wrapped in braces: {} ... {{ ... }}", owner, owner),
        )?;

        let statements = self.nested(|parser| {
            let mut statements = Vec::new();
            while !parser.check(TokenType::RightBrace) && !parser.is_at_end() {
                statements.push(parser.statement()?);
            }
            Ok(statements)
        })?;

        self.consume_with_help(
            TokenType::RightBrace,
            "Expected '}' after block",
            "Block statements must be closed with '}' after the opening '{'.".to_string(),
        )?;
        Ok(statements)
    }

    fn let_statement(&mut self) -> Result<Stmt, TinyError> {
        let token = self.advance().clone();
        let name = self
            .consume(TokenType::Identifier, "Expected variable name after 'let'")?
            .lexeme
            .clone();
        self.consume_with_help(
            TokenType::Declare,
            "Expected ':=' after variable name",
            "Declarations use ':='. Example: let x := 1".to_string(),
        )?;
        let initializer = self.expression()?;

        Ok(Stmt::Let {
            name,
            initializer,
            token,
        })
    }

    fn assign_statement(&mut self) -> Result<Stmt, TinyError> {
        let token = self.advance().clone();
        self.advance(); // the '='
        let value = self.expression()?;

        Ok(Stmt::Assign {
            name: token.lexeme.clone(),
            value,
            token,
        })
    }

    fn if_statement(&mut self) -> Result<Stmt, TinyError> {
        let token = self.advance().clone();
        let condition = self.expression()?;
        let then_branch = self.block("if")?;

        let else_branch = if self.match_types(&[TokenType::Else]) {
            if self.check(TokenType::If) {
                vec![self.if_statement()?]
            } else {
                self.block("else")?
            }
        } else {
            Vec::new()
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
            token,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt, TinyError> {
        let token = self.advance().clone();
        let condition = self.expression()?;
        let body = self.block("while")?;

        Ok(Stmt::While {
            condition,
            body,
            token,
        })
    }

    fn function_statement(&mut self) -> Result<Stmt, TinyError> {
        let token = self.advance().clone();
        let name = self
            .consume(TokenType::Identifier, "Expected function name after 'func'")?
            .lexeme
            .clone();

        let mut params: Vec<String> = Vec::new();
        if self.match_types(&[TokenType::Colon]) {
            loop {
                let param = self
                    .consume_with_help(
                        TokenType::Identifier,
                        "Expected parameter name",
                        "Parameters follow the colon, separated by commas. Example: func add: a, b { ... }"
                            .to_string(),
                    )?
                    .clone();
                if params.contains(&param.lexeme) {
                    return Err(TinyError::parse_error(
                        param.span,
                        format!("Duplicate parameter '{}' in function '{}'", param.lexeme, name),
                    ));
                }
                params.push(param.lexeme);

                if !self.match_types(&[TokenType::Comma]) {
                    break;
                }
            }
        }

        let body = self.block("func")?;

        Ok(Stmt::Function {
            name,
            params,
            body: Rc::from(body),
            token,
        })
    }

    fn return_statement(&mut self) -> Result<Stmt, TinyError> {
        let token = self.advance().clone();
        let next = self.peek().token_type;
        let value = if next == TokenType::RightBrace || next == TokenType::Eof || starts_statement(next) {
            None
        } else {
            Some(self.expression()?)
        };

        Ok(Stmt::Return { value, token })
    }

    fn expression_statement(&mut self) -> Result<Stmt, TinyError> {
        let expr = self.expression()?;

        if self.check(TokenType::Equal) {
            let equals = self.advance().clone();
            return match expr {
                Expr::Index { array, index, .. } => Ok(Stmt::IndexAssign {
                    array: *array,
                    index: *index,
                    value: self.expression()?,
                    token: equals,
                }),
                _ => Err(TinyError::parse_error_with_help(
                    equals.span,
                    "Invalid assignment target".to_string(),
                    "Only variables and array elements can be assigned to. Examples: 'x = 10' or 'a[0] = 10'"
                        .to_string(),
                )),
            };
        }

        Ok(Stmt::Expression { expr })
    }

    fn expression(&mut self) -> Result<Expr, TinyError> {
        self.nested(Self::or)
    }

    /// Runs `parse` one nesting level deeper, failing once the limit is hit.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T, TinyError>) -> Result<T, TinyError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(TinyError::parse_error_with_help(
                self.peek().span.clone(),
                format!("Nesting too deep, found {}", self.peek().describe()),
                format!(
                    "Expressions and blocks may nest at most {} levels. Split the code using variables or functions.",
                    MAX_NESTING_DEPTH
                ),
            ));
        }

        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn or(&mut self) -> Result<Expr, TinyError> {
        let mut expr = self.and()?;

        while self.match_types(&[TokenType::OrOr]) {
            let token = self.previous().clone();
            let right = self.and()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator: BinaryOp::Or,
                right: Box::new(right),
                token,
            };
        }

        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr, TinyError> {
        let mut expr = self.not()?;

        while self.match_types(&[TokenType::AndAnd]) {
            let token = self.previous().clone();
            let right = self.not()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator: BinaryOp::And,
                right: Box::new(right),
                token,
            };
        }

        Ok(expr)
    }

    fn not(&mut self) -> Result<Expr, TinyError> {
        if self.match_types(&[TokenType::Bang]) {
            let token = self.previous().clone();
            let operand = self.nested(Self::not)?;
            return Ok(Expr::Unary {
                operator: UnaryOp::Not,
                operand: Box::new(operand),
                token,
            });
        }

        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, TinyError> {
        let expr = self.additive()?;

        if !self.match_types(&COMPARISON_OPERATORS) {
            return Ok(expr);
        }

        let token = self.previous().clone();
        let operator = match token.token_type {
            TokenType::EqualEqual => BinaryOp::Equal,
            TokenType::BangEqual => BinaryOp::NotEqual,
            TokenType::Less => BinaryOp::Less,
            TokenType::LessEqual => BinaryOp::LessEqual,
            TokenType::Greater => BinaryOp::Greater,
            TokenType::GreaterEqual => BinaryOp::GreaterEqual,
            _ => unreachable!(),
        };
        let right = self.additive()?;

        if COMPARISON_OPERATORS.contains(&self.peek().token_type) {
            return Err(TinyError::parse_error_with_help(
                self.peek().span.clone(),
                format!("Comparison operators cannot be chained, found {}", self.peek().describe()),
                "Combine comparisons with '&&' or '||'. Example: a < b && b < c".to_string(),
            ));
        }

        Ok(Expr::Binary {
            left: Box::new(expr),
            operator,
            right: Box::new(right),
            token,
        })
    }

    fn additive(&mut self) -> Result<Expr, TinyError> {
        let mut expr = self.multiplicative()?;

        while self.match_types(&[TokenType::Minus, TokenType::Plus]) {
            let token = self.previous().clone();
            let operator = match token.token_type {
                TokenType::Minus => BinaryOp::Subtract,
                TokenType::Plus => BinaryOp::Add,
                _ => unreachable!(),
            };
            let right = self.multiplicative()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
                token,
            };
        }

        Ok(expr)
    }

    fn multiplicative(&mut self) -> Result<Expr, TinyError> {
        let mut expr = self.unary()?;

        while self.match_types(&[TokenType::Slash, TokenType::Star]) {
            let token = self.previous().clone();
            let operator = match token.token_type {
                TokenType::Slash => BinaryOp::Divide,
                TokenType::Star => BinaryOp::Multiply,
                _ => unreachable!(),
            };
            let right = self.unary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
                token,
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, TinyError> {
        if self.match_types(&[TokenType::Minus]) {
            let token = self.previous().clone();
            let operand = self.nested(Self::unary)?;
            return Ok(Expr::Unary {
                operator: UnaryOp::Negate,
                operand: Box::new(operand),
                token,
            });
        }

        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, TinyError> {
        let mut expr = self.primary()?;

        while self.match_types(&[TokenType::LeftBracket]) {
            let token = self.previous().clone();
            let index = self.expression()?;
            self.consume_with_help(
                TokenType::RightBracket,
                "Expected ']' after index",
                "Index expressions are closed with ']'. Example: a[0]".to_string(),
            )?;
            expr = Expr::Index {
                array: Box::new(expr),
                index: Box::new(index),
                token,
            };
        }

        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, TinyError> {
        let token = self.peek().clone();

        match token.token_type {
            TokenType::Number => {
                self.advance();
                let value = token.lexeme.parse::<f64>().map_err(|_| {
                    TinyError::parse_error(token.span.clone(), format!("Invalid number '{}'", token.lexeme))
                })?;
                Ok(Expr::Number { value, token })
            }
            TokenType::String => {
                self.advance();
                Ok(Expr::String {
                    value: token.lexeme.clone(),
                    token,
                })
            }
            TokenType::True | TokenType::False => {
                self.advance();
                Ok(Expr::Boolean {
                    value: token.token_type == TokenType::True,
                    token,
                })
            }
            TokenType::Identifier => {
                self.advance();
                if self.match_types(&[TokenType::LeftParen]) {
                    return self.finish_call(token);
                }
                Ok(Expr::Identifier {
                    name: token.lexeme.clone(),
                    token,
                })
            }
            TokenType::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume_with_help(
                    TokenType::RightParen,
                    "Expected ')' after expression",
                    "Every opening parenthesis '(' must have a matching closing parenthesis ')'.".to_string(),
                )?;
                Ok(expr)
            }
            TokenType::LeftBracket => {
                self.advance();
                self.array_literal(token)
            }
            _ => {
                let help_msg = match token.token_type {
                    TokenType::RightParen => "Found ')' without matching '('. Check for unbalanced parentheses.",
                    TokenType::RightBrace => "Found '}' without matching '{'. Check for unbalanced braces.",
                    TokenType::RightBracket => "Found ']' without matching '['. Check for unbalanced brackets.",
                    TokenType::Eof => "Reached end of input while expecting an expression.",
                    _ => "Expected a literal value, variable, call, or parenthesized expression here.",
                };

                Err(TinyError::parse_error_with_help(
                    token.span.clone(),
                    format!("Expected expression, found {}", token.describe()),
                    help_msg.to_string(),
                ))
            }
        }
    }

    fn finish_call(&mut self, callee: Token) -> Result<Expr, TinyError> {
        let mut args = Vec::new();

        if !self.check(TokenType::RightParen) {
            loop {
                args.push(self.expression()?);
                if !self.match_types(&[TokenType::Comma]) {
                    break;
                }
            }
        }

        self.consume_with_help(
            TokenType::RightParen,
            "Expected ')' after arguments",
            "Function calls must be closed with ')' after the arguments. Example: add(1, 2)".to_string(),
        )?;

        Ok(Expr::Call {
            callee: callee.lexeme.clone(),
            args,
            token: callee,
        })
    }

    fn array_literal(&mut self, token: Token) -> Result<Expr, TinyError> {
        let mut elements = Vec::new();

        if !self.check(TokenType::RightBracket) {
            loop {
                elements.push(self.expression()?);
                if !self.match_types(&[TokenType::Comma]) {
                    break;
                }
            }
        }

        self.consume_with_help(
            TokenType::RightBracket,
            "Expected ']' after array elements",
            "Array literals must be closed with ']' after the opening '['. Example: [1, 2, 3]".to_string(),
        )?;
        Ok(Expr::Array { elements, token })
    }

    fn match_types(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(*token_type) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, token_type: TokenType) -> bool {
        !self.is_at_end() && self.peek().token_type == token_type
    }

    fn check_next(&self, token_type: TokenType) -> bool {
        self.tokens
            .get(self.current + 1)
            .is_some_and(|token| token.token_type == token_type)
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> Result<&Token, TinyError> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            Err(TinyError::parse_error(
                self.peek().span.clone(),
                format!("{}, found {}", message, self.peek().describe()),
            ))
        }
    }

    fn consume_with_help(&mut self, token_type: TokenType, message: &str, help: String) -> Result<&Token, TinyError> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            Err(TinyError::parse_error_with_help(
                self.peek().span.clone(),
                format!("{}, found {}", message, self.peek().describe()),
                help,
            ))
        }
    }
}

/// Tokens that can only begin a statement, never an expression.
fn starts_statement(token_type: TokenType) -> bool {
    matches!(
        token_type,
        TokenType::Let | TokenType::If | TokenType::While | TokenType::Func | TokenType::Return
    )
}

/// Convenience wrapper: parse a token sequence into a program.
pub fn parse(tokens: Vec<Token>) -> Result<Program, TinyError> {
    Parser::new(tokens).parse()
}
