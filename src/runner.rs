use crate::error::{BasicError, ReportStyle};
use crate::session::Session;
use std::io;
use std::path::Path;

/// Loads a program file into a fresh session and runs it.
///
/// Returns `Ok(false)` when the file could not be loaded; the reason has
/// already been reported on stderr.
pub fn run(path: &Path, style: ReportStyle) -> Result<bool, BasicError> {
    let mut session = Session::new(io::stdout(), io::stderr())
        .with_style(style)
        .with_filename(path.display().to_string());

    if !session.load(path)? {
        return Ok(false);
    }
    session.run()?;
    Ok(true)
}
