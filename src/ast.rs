use crate::lexer::Token;
use std::fmt;
use std::rc::Rc;

// Every node keeps the token that anchors it in source, so evaluation
// errors can point back at the offending line and column.

#[derive(Debug, Clone)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Let {
        name: String,
        initializer: Expr,
        token: Token,
    },
    Assign {
        name: String,
        value: Expr,
        token: Token,
    },
    IndexAssign {
        array: Expr,
        index: Expr,
        value: Expr,
        token: Token,
    },
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        /// Empty when there is no `else`; `else if` is a single nested `If`.
        else_branch: Vec<Stmt>,
        token: Token,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
        token: Token,
    },
    Function {
        name: String,
        params: Vec<String>,
        body: Rc<[Stmt]>,
        token: Token,
    },
    Return {
        value: Option<Expr>,
        token: Token,
    },
    Expression {
        expr: Expr,
    },
}

impl Stmt {
    pub fn token(&self) -> &Token {
        match self {
            Stmt::Let { token, .. } => token,
            Stmt::Assign { token, .. } => token,
            Stmt::IndexAssign { token, .. } => token,
            Stmt::If { token, .. } => token,
            Stmt::While { token, .. } => token,
            Stmt::Function { token, .. } => token,
            Stmt::Return { token, .. } => token,
            Stmt::Expression { expr } => expr.token(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Number {
        value: f64,
        token: Token,
    },
    String {
        value: String,
        token: Token,
    },
    Boolean {
        value: bool,
        token: Token,
    },
    Array {
        elements: Vec<Expr>,
        token: Token,
    },
    Identifier {
        name: String,
        token: Token,
    },
    Unary {
        operator: UnaryOp,
        operand: Box<Expr>,
        token: Token,
    },
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
        token: Token,
    },
    Index {
        array: Box<Expr>,
        index: Box<Expr>,
        token: Token,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
        token: Token,
    },
}

impl Expr {
    pub fn token(&self) -> &Token {
        match self {
            Expr::Number { token, .. } => token,
            Expr::String { token, .. } => token,
            Expr::Boolean { token, .. } => token,
            Expr::Array { token, .. } => token,
            Expr::Identifier { token, .. } => token,
            Expr::Unary { token, .. } => token,
            Expr::Binary { token, .. } => token,
            Expr::Index { token, .. } => token,
            Expr::Call { token, .. } => token,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    Negate,
    Not,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Negate => "-",
            UnaryOp::Not => "!",
        }
    }
}

// Printer. Binary and unary expressions are fully parenthesized so the
// output shows how precedence was resolved.

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Number { value, .. } => write!(f, "{}", value),
            Expr::String { value, .. } => write!(f, "\"{}\"", value),
            Expr::Boolean { value, .. } => write!(f, "{}", value),
            Expr::Array { elements, .. } => {
                write!(f, "[")?;
                write_list(f, elements)?;
                write!(f, "]")
            }
            Expr::Identifier { name, .. } => write!(f, "{}", name),
            Expr::Unary { operator, operand, .. } => write!(f, "({}{})", operator.symbol(), operand),
            Expr::Binary {
                left,
                operator,
                right,
                ..
            } => write!(f, "({} {} {})", left, operator.symbol(), right),
            Expr::Index { array, index, .. } => write!(f, "{}[{}]", array, index),
            Expr::Call { callee, args, .. } => {
                write!(f, "{}(", callee)?;
                write_list(f, args)?;
                write!(f, ")")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_block(f: &mut fmt::Formatter, statements: &[Stmt], indent: usize) -> fmt::Result {
    writeln!(f, "{{")?;
    for stmt in statements {
        write_stmt(f, stmt, indent + 1)?;
        writeln!(f)?;
    }
    write!(f, "{}}}", "    ".repeat(indent))
}

fn write_stmt(f: &mut fmt::Formatter, stmt: &Stmt, indent: usize) -> fmt::Result {
    write!(f, "{}", "    ".repeat(indent))?;
    match stmt {
        Stmt::Let {
            name, initializer, ..
        } => write!(f, "let {} := {}", name, initializer),
        Stmt::Assign { name, value, .. } => write!(f, "{} = {}", name, value),
        Stmt::IndexAssign {
            array,
            index,
            value,
            ..
        } => write!(f, "{}[{}] = {}", array, index, value),
        Stmt::If {
            condition,
            then_branch,
            else_branch,
            ..
        } => {
            write!(f, "if {} ", condition)?;
            write_block(f, then_branch, indent)?;
            if !else_branch.is_empty() {
                write!(f, " else ")?;
                write_block(f, else_branch, indent)?;
            }
            Ok(())
        }
        Stmt::While {
            condition, body, ..
        } => {
            write!(f, "while {} ", condition)?;
            write_block(f, body, indent)
        }
        Stmt::Function {
            name, params, body, ..
        } => {
            write!(f, "func {}", name)?;
            if !params.is_empty() {
                write!(f, ": {}", params.join(", "))?;
            }
            write!(f, " ")?;
            write_block(f, body, indent)
        }
        Stmt::Return { value, .. } => match value {
            Some(value) => write!(f, "return {}", value),
            None => write!(f, "return"),
        },
        Stmt::Expression { expr } => write!(f, "{}", expr),
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_stmt(f, self, 0)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for stmt in &self.statements {
            writeln!(f, "{}", stmt)?;
        }
        Ok(())
    }
}
