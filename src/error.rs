use crate::ast::LineNumber;
use ariadne::{Color, Config, Fmt, Label, Report, ReportKind, Source};
use std::fmt;
use std::io::{self, Write};
use std::ops::Range;

/// Character columns within one source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input source or output sink failed; the session cannot continue.
    Fatal,
    /// A SAVE or LOAD file operation failed.
    Io,
    LexError,
    CompileError,
    RuntimeError,
}

/// How diagnostics are written to the error stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportStyle {
    /// One `basic: error: <message>` line per error.
    #[default]
    Plain,
    /// An ariadne report pointing into the offending source line.
    Pretty,
}

#[derive(Debug, Clone)]
pub struct BasicError {
    pub kind: ErrorKind,
    pub span: Option<Span>,
    pub message: String,
    pub help: Option<String>,
    /// Program line that was executing when a runtime error occurred.
    pub line: Option<LineNumber>,
    /// Text the span points into.
    pub source: Option<String>,
}

impl BasicError {
    pub fn new(kind: ErrorKind, span: Option<Span>, message: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: None,
            line: None,
            source: None,
        }
    }

    pub fn fatal(message: String) -> Self {
        Self::new(ErrorKind::Fatal, None, message)
    }

    /// A failed file operation, rendered as `<operation>: <cause>`.
    pub fn io(operation: &str, cause: impl fmt::Display) -> Self {
        Self::new(ErrorKind::Io, None, format!("{}: {}", operation, cause))
    }

    pub fn lex_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::LexError, Some(span), message)
    }

    pub fn compile_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::CompileError, Some(span), message)
    }

    pub fn compile_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::compile_error(span, message).with_help(help)
    }

    pub fn runtime_error(message: String) -> Self {
        Self::new(ErrorKind::RuntimeError, None, message)
    }

    pub fn runtime_error_with_help(message: String, help: String) -> Self {
        Self::runtime_error(message).with_help(help)
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    pub fn at_line(mut self, line: LineNumber) -> Self {
        if self.line.is_none() {
            self.line = Some(line);
        }
        self
    }

    /// Attaches the source text; errors without a span label all of it.
    pub fn with_source(mut self, source: String) -> Self {
        if self.span.is_none() {
            self.span = Some(Span::new(0, source.chars().count()));
        }
        self.source = Some(source);
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.kind == ErrorKind::Fatal
    }

    pub fn report(
        &self,
        filename: Option<&str>,
        style: ReportStyle,
        w: &mut dyn Write,
    ) -> io::Result<()> {
        match style {
            ReportStyle::Plain => writeln!(w, "basic: error: {}", self.message),
            ReportStyle::Pretty => self.write_report(filename.unwrap_or("<repl>"), w),
        }
    }

    fn write_report(&self, filename: &str, w: &mut dyn Write) -> io::Result<()> {
        let color = match self.kind {
            ErrorKind::Fatal | ErrorKind::Io => Color::Red,
            ErrorKind::LexError => Color::Red,
            ErrorKind::CompileError => Color::Yellow,
            ErrorKind::RuntimeError => Color::Magenta,
        };

        let kind_str = match self.kind {
            ErrorKind::Fatal => "Fatal Error",
            ErrorKind::Io => "File Error",
            ErrorKind::LexError => "Lexical Error",
            ErrorKind::CompileError => "Compile Error",
            ErrorKind::RuntimeError => "Runtime Error",
        };

        let source = self.source.as_deref().unwrap_or("");
        let offset = self.span.as_ref().map_or(0, |span| span.start);
        let message = match self.line {
            Some(line) => format!("{} in line {}", self.message, line),
            None => self.message.clone(),
        };

        let mut report_builder =
            Report::<(&str, Range<usize>)>::build(ReportKind::Error, filename, offset)
                .with_config(Config::default().with_color(true))
                .with_message(format!("{}: {}", kind_str.fg(color), message));

        if let (Some(span), Some(_)) = (&self.span, &self.source) {
            report_builder = report_builder.with_label(
                Label::new((filename, span.start..span.end))
                    .with_message(&self.message)
                    .with_color(color),
            );
        }

        if let Some(ref help_text) = self.help {
            report_builder =
                report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
        }

        report_builder
            .finish()
            .write((filename, Source::from(source)), w)
    }
}

impl From<io::Error> for BasicError {
    fn from(err: io::Error) -> Self {
        Self::fatal(err.to_string())
    }
}

impl fmt::Display for BasicError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for BasicError {}
