use clap::{Arg, ArgAction, ArgMatches, Command};
use log::LevelFilter;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorStyle {
    /// Colored `ariadne` report with help notes.
    Pretty,
    /// `[file:line:col]: message`, the source line, and a caret.
    Plain,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub file: Option<PathBuf>,
    pub interactive: bool,
    pub error_style: ErrorStyle,
    pub dump_ast: bool,
    pub verbosity: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file: None,
            interactive: false,
            error_style: ErrorStyle::Pretty,
            dump_ast: false,
            verbosity: 0,
        }
    }
}

impl Config {
    pub fn command() -> Command {
        Command::new("tiny")
            .about("Interpreter for a small dynamically-typed scripting language")
            .arg(
                Arg::new("file")
                    .help("The script file to execute")
                    .value_name("FILE")
                    .value_parser(clap::value_parser!(PathBuf))
                    .index(1),
            )
            .arg(
                Arg::new("interactive")
                    .short('i')
                    .long("interactive")
                    .help("Start in interactive REPL mode")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("plain")
                    .long("plain")
                    .help("Report errors as plain text with a caret under the offending column")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("dump-ast")
                    .long("dump-ast")
                    .help("Print the parsed program before running it")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("Increase log output (-v info, -vv debug, -vvv trace)")
                    .action(ArgAction::Count),
            )
    }

    pub fn from_matches(matches: &ArgMatches) -> Self {
        let error_style = if matches.get_flag("plain") {
            ErrorStyle::Plain
        } else {
            ErrorStyle::Pretty
        };

        Self {
            file: matches.get_one::<PathBuf>("file").cloned(),
            interactive: matches.get_flag("interactive"),
            error_style,
            dump_ast: matches.get_flag("dump-ast"),
            verbosity: matches.get_count("verbose"),
        }
    }

    /// Parses the process arguments, exiting with usage on error.
    pub fn parse() -> Self {
        Self::from_matches(&Self::command().get_matches())
    }

    /// The REPL runs when asked for, or when no file is given.
    pub fn wants_repl(&self) -> bool {
        self.interactive || self.file.is_none()
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
