use crate::ast::Program;
use crate::config::{Config, ErrorStyle};
use crate::error::TinyError;
use crate::evaluator::Evaluator;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::value::Value;
use log::{debug, info};

/// Lexes and parses a source text.
pub fn parse_source(source: &str) -> Result<Program, TinyError> {
    let tokens = Lexer::new(source).scan_tokens()?;
    let program = Parser::new(tokens).parse()?;
    debug!("parsed {} top-level statements", program.statements.len());
    Ok(program)
}

/// Lexes, parses, and evaluates `source` against `evaluator`, returning the
/// value of the last top-level expression statement.
pub fn execute(source: &str, evaluator: &mut Evaluator) -> Result<Value, TinyError> {
    let program = parse_source(source)?;
    evaluator.evaluate_program(&program)
}

/// Runs a whole script with a fresh evaluator, reporting any error.
/// Returns whether the script ran to completion.
pub fn run(source: &str, filename: Option<&str>, config: &Config) -> bool {
    info!("running {}", filename.unwrap_or("<input>"));

    let program = match parse_source(source) {
        Ok(program) => program,
        Err(error) => {
            report(&error, source, filename, config.error_style);
            return false;
        }
    };

    if config.dump_ast {
        print!("{}", program);
    }

    let mut evaluator = Evaluator::new();
    match evaluator.evaluate_program(&program) {
        Ok(_) => true,
        Err(error) => {
            report(&error, source, filename, config.error_style);
            false
        }
    }
}

pub fn report(error: &TinyError, source: &str, filename: Option<&str>, style: ErrorStyle) {
    match style {
        ErrorStyle::Plain => eprintln!("{}", error.format(filename.unwrap_or("<repl>"), source)),
        ErrorStyle::Pretty => {
            if let Err(io_error) = error.report(source, filename) {
                // Fall back to the plain form if the rich report cannot be written.
                eprintln!("{}", error.format(filename.unwrap_or("<repl>"), source));
                debug!("rich report failed: {}", io_error);
            }
        }
    }
}
