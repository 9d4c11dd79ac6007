//! Programs on disk: one `<line-number> <statement>` per line, ascending.

use crate::error::{BasicError, ErrorKind};
use crate::lexer::Scanner;
use crate::parser::compile_line;
use crate::program::ProgramStore;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

pub fn save(store: &ProgramStore, path: &Path) -> Result<(), BasicError> {
    let file = File::create(path).map_err(|e| BasicError::io("SAVE", e))?;
    let mut writer = BufWriter::new(file);
    write_program(store, &mut writer)
        .and_then(|()| writer.flush())
        .map_err(|e| BasicError::io("SAVE", e))
}

pub fn write_program(store: &ProgramStore, w: &mut dyn Write) -> io::Result<()> {
    for (number, stmt) in store.lines() {
        writeln!(w, "{} {}", number, stmt)?;
    }
    Ok(())
}

/// Compiles a whole file into a fresh store; nothing is returned unless
/// every line compiles.
pub fn load(path: &Path) -> Result<ProgramStore, BasicError> {
    let file = File::open(path).map_err(|e| BasicError::io("OPEN", e))?;
    read_program(BufReader::new(file)).map_err(|err| match err.kind {
        ErrorKind::Fatal => BasicError::io("LOAD", err.message),
        _ => err,
    })
}

pub fn read_program<R: BufRead>(reader: R) -> Result<ProgramStore, BasicError> {
    let mut scanner = Scanner::new(reader);
    let mut store = ProgramStore::new();
    while scanner.skip_blank()? {
        match compile_line(&mut scanner) {
            Ok((number, stmt)) => {
                store.insert(number, stmt);
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                scanner.skip_line()?;
                return Err(err.with_source(scanner.line_text()));
            }
        }
    }
    Ok(store)
}
