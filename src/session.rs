use crate::ast::{LineNumber, Stmt};
use crate::error::{BasicError, ReportStyle};
use crate::evaluator::{Environment, Evaluator};
use crate::lexer::Scanner;
use crate::persist;
use crate::program::ProgramStore;
use std::io::{BufRead, Write};
use std::path::Path;

/// One interpreter instance: the stored program, its variables and the
/// streams it prints to.
///
/// Language errors are reported on the error stream and never returned;
/// the only `Err` any method yields is a fatal one.
pub struct Session<W, E> {
    store: ProgramStore,
    evaluator: Evaluator,
    out: W,
    err: E,
    style: ReportStyle,
    filename: Option<String>,
}

impl<W: Write, E: Write> Session<W, E> {
    pub fn new(out: W, err: E) -> Self {
        Self {
            store: ProgramStore::new(),
            evaluator: Evaluator::new(),
            out,
            err,
            style: ReportStyle::default(),
            filename: None,
        }
    }

    pub fn with_style(mut self, style: ReportStyle) -> Self {
        self.style = style;
        self
    }

    /// Name shown in pretty diagnostics instead of `<repl>`.
    pub fn with_filename(mut self, filename: String) -> Self {
        self.filename = Some(filename);
        self
    }

    pub fn store(&self) -> &ProgramStore {
        &self.store
    }

    pub fn environment(&self) -> &Environment {
        self.evaluator.environment()
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn error_output(&self) -> &E {
        &self.err
    }

    pub(crate) fn out_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_parts(self) -> (W, E) {
        (self.out, self.err)
    }

    /// NEW: forget every line and variable.
    pub fn reset(&mut self) {
        self.store.clear();
        self.evaluator.reset();
    }

    pub fn insert_line(&mut self, number: LineNumber, stmt: Stmt) {
        self.store.insert(number, stmt);
    }

    pub fn delete_line(&mut self, number: LineNumber) {
        self.store.remove(number);
    }

    pub fn delete_range(&mut self, first: LineNumber, last: LineNumber) {
        self.store.remove_range(first, last);
    }

    /// Runs a statement outside the program, in line context 0 with an
    /// empty call stack. Where it would jump is ignored.
    pub fn execute_immediate(&mut self, stmt: &Stmt) -> Result<(), BasicError> {
        let mut stack = Vec::new();
        match self.evaluator.execute(stmt, 0, &mut stack, &mut self.out) {
            Ok(_) => Ok(()),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => self.report(err.with_source(stmt.to_string())),
        }
    }

    /// RUN: executes the stored program from its lowest line.
    pub fn run(&mut self) -> Result<(), BasicError> {
        match self.evaluator.run(&self.store, &mut self.out) {
            Ok(()) => Ok(()),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                let source = err
                    .line
                    .and_then(|line| self.store.get(line).map(|stmt| format!("{} {}", line, stmt)));
                match source {
                    Some(source) => self.report(err.with_source(source)),
                    None => self.report(err),
                }
            }
        }
    }

    /// LIST: writes `first..=last` in persisted form.
    pub fn list(&mut self, first: LineNumber, last: LineNumber) -> Result<(), BasicError> {
        for (number, stmt) in self.store.range(first, last) {
            writeln!(self.out, "{} {}", number, stmt)?;
        }
        Ok(())
    }

    pub fn save(&mut self, path: &Path) -> Result<(), BasicError> {
        match persist::save(&self.store, path) {
            Ok(()) => Ok(()),
            Err(err) => self.report(err),
        }
    }

    /// LOAD: replaces the program and clears the variables, or leaves both
    /// untouched if the file cannot be read or compiled.
    pub fn load(&mut self, path: &Path) -> Result<bool, BasicError> {
        match persist::load(path) {
            Ok(store) => {
                self.store = store;
                self.evaluator.reset();
                Ok(true)
            }
            Err(err) => {
                self.report(err)?;
                Ok(false)
            }
        }
    }

    /// Writes a diagnostic for a non-fatal error; fatal errors are handed back.
    pub fn report(&mut self, err: BasicError) -> Result<(), BasicError> {
        if err.is_fatal() {
            return Err(err);
        }
        err.report(self.filename.as_deref(), self.style, &mut self.err)?;
        Ok(())
    }

    /// Reports a compile error after draining the rest of its line, so the
    /// next compile starts at a line boundary.
    pub fn report_compile_error<R: BufRead>(
        &mut self,
        scanner: &mut Scanner<R>,
        err: BasicError,
    ) -> Result<(), BasicError> {
        if err.is_fatal() {
            return Err(err);
        }
        scanner.skip_line()?;
        self.report(err.with_source(scanner.line_text()))
    }
}
