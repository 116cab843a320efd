use crate::config::Config;
use crate::evaluator::Evaluator;
use crate::runner;
use crate::value::Value;
use std::io::{self, BufRead, Write};

/// Interactive loop. One evaluator lives for the whole session, so
/// declarations persist between lines; errors are reported and the loop
/// carries on.
pub fn start(config: &Config) {
    println!("tiny interpreter v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or press Ctrl+D to quit");
    println!();

    let mut evaluator = Evaluator::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("tiny> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let line = match lines.next() {
            None => {
                println!();
                break;
            }
            Some(Ok(line)) => line,
            Some(Err(error)) => {
                eprintln!("Error reading input: {}", error);
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            println!("Goodbye!");
            break;
        }

        run_repl_command(line, &mut evaluator, config);
    }
}

fn run_repl_command(source: &str, evaluator: &mut Evaluator, config: &Config) {
    if config.dump_ast {
        if let Ok(program) = runner::parse_source(source) {
            print!("{}", program);
        }
    }

    match runner::execute(source, evaluator) {
        Ok(Value::Void) => {}
        Ok(value) => println!("{}", value),
        Err(error) => runner::report(&error, source, None, config.error_style),
    }
}
