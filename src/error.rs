use ariadne::{Color, Config, Fmt, Label, Report, ReportKind, Source};
use std::io::{self, Write};
use std::ops::Range;
use thiserror::Error;

/// Location of a token in the source: a character-offset range for rich
/// diagnostics plus the 1-based line and column of its first character.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    pub fn single(pos: usize, line: usize, column: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
            line,
            column,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorKind {
    LexError,
    ParseError,
    RuntimeError,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::LexError => "Lexical Error",
            ErrorKind::ParseError => "Parse Error",
            ErrorKind::RuntimeError => "Runtime Error",
        }
    }

    fn color(&self) -> Color {
        match self {
            ErrorKind::LexError => Color::Red,
            ErrorKind::ParseError => Color::Yellow,
            ErrorKind::RuntimeError => Color::Magenta,
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("[Line {}:{}]: {}", .span.line, .span.column, .message)]
pub struct TinyError {
    pub kind: ErrorKind,
    pub span: Span,
    pub message: String,
    pub help: Option<String>,
}

impl TinyError {
    pub fn new(kind: ErrorKind, span: Span, message: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: None,
        }
    }

    pub fn new_with_help(kind: ErrorKind, span: Span, message: String, help: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: Some(help),
        }
    }

    pub fn lex_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::LexError, span, message)
    }

    pub fn parse_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::ParseError, span, message)
    }

    pub fn parse_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new_with_help(ErrorKind::ParseError, span, message, help)
    }

    pub fn runtime_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::RuntimeError, span, message)
    }

    pub fn runtime_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new_with_help(ErrorKind::RuntimeError, span, message, help)
    }

    pub fn line(&self) -> usize {
        self.span.line
    }

    pub fn column(&self) -> usize {
        self.span.column
    }

    /// Plain three-line rendering: the message, the offending source line,
    /// and a caret under the offending column. Tabs in the source line are
    /// copied into the padding so the caret lines up in any tab width.
    pub fn format(&self, label: &str, source: &str) -> String {
        let header = format!(
            "[{}:{}:{}]: {}: {}",
            label,
            self.span.line,
            self.span.column,
            self.kind.label(),
            self.message
        );

        let Some(line) = source.lines().nth(self.span.line.wrapping_sub(1)) else {
            return header;
        };

        let padding: String = line
            .chars()
            .chain(std::iter::repeat(' '))
            .take(self.span.column.saturating_sub(1))
            .map(|c| if c == '\t' { '\t' } else { ' ' })
            .collect();

        format!("{}\n    {}\n    {}^", header, line, padding)
    }

    /// Rich colored report on stderr.
    pub fn report(&self, source: &str, filename: Option<&str>) -> io::Result<()> {
        self.write_report(source, filename, true, io::stderr())
    }

    /// Renders the rich report into `out`, optionally without ANSI colors.
    pub fn write_report<W: Write>(
        &self,
        source: &str,
        filename: Option<&str>,
        colored: bool,
        out: W,
    ) -> io::Result<()> {
        let filename = filename.unwrap_or("<repl>");
        let color = colored.then(|| self.kind.color());
        let help_color = colored.then_some(Color::Cyan);
        let range = self.label_range(source);

        let mut label = Label::new((filename, range.clone())).with_message(&self.message);
        if let Some(color) = color {
            label = label.with_color(color);
        }

        let mut report_builder = Report::build(ReportKind::Error, filename, range.start)
            .with_config(Config::default().with_color(colored))
            .with_message(format!("{}: {}", self.kind.label().fg(color), self.message))
            .with_label(label);

        if let Some(ref help_text) = self.help {
            report_builder = report_builder.with_note(format!("{}: {}", "help".fg(help_color), help_text));
        }

        report_builder
            .finish()
            .write((filename, Source::from(source)), out)
    }

    /// The span clamped onto the source, so end-of-input errors label the
    /// last character instead of a position ariadne cannot show.
    fn label_range(&self, source: &str) -> Range<usize> {
        let len = source.chars().count();
        let start = self.span.start.min(len.saturating_sub(1));
        let end = self.span.end.min(len).max(start);
        start..end
    }
}
