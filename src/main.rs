use std::fs;
use std::path::Path;
use std::process;
use tinylang::{repl, runner, Config};

fn main() {
    let config = Config::parse();

    env_logger::Builder::new()
        .filter_level(config.log_level())
        .parse_default_env()
        .init();

    if config.wants_repl() {
        repl::start(&config);
    } else if let Some(path) = config.file.as_deref() {
        run_file(path, &config);
    }
}

fn run_file(path: &Path, config: &Config) {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            process::exit(1);
        }
    };

    let label = path.display().to_string();
    if !runner::run(&source, Some(&label), config) {
        process::exit(1);
    }
}
