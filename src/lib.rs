// tinylang interpreter library
//
// Front end and runtime of a small dynamically-typed scripting language:
// lexer, recursive-descent parser, and a tree-walking evaluator with
// lexical frames, functions, arrays, and host built-ins.

// Public modules
pub mod ast;
pub mod builtins;
pub mod config;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runner;
pub mod value;

// Re-export commonly used items
pub use ast::{Expr, Program, Stmt};
pub use builtins::Builtins;
pub use config::{Config, ErrorStyle};
pub use environment::Environment;
pub use error::{ErrorKind, Span, TinyError};
pub use evaluator::{Evaluator, Flow};
pub use lexer::{tokenize, Lexer, Token, TokenType};
pub use parser::{parse, Parser};
pub use value::Value;

// Re-export main functions
pub use repl::start as start_repl;
pub use runner::{execute, run};
