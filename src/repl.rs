use crate::ast::LineNumber;
use crate::error::{BasicError, ReportStyle, Span};
use crate::lexer::{Scanner, TokenKind};
use crate::parser::{compile_line, Parser};
use crate::session::Session;
use std::io::{self, BufRead, Write};
use std::path::Path;

const HELP: &str = r#"
<program> =
    <line-number> <statement>
    ...

<command> =
      <statement>
    | <line-number> <statement>
    | DELETE <line-number> [ '-' <line-number> ] ; delete one or a range of line numbers inclusive
    | EXIT
    | HELP
    | LIST [ <line-number> [ '-' <line-number> ]]
    | LOAD <filename> ; load a program into memory from <filename>
    | NEW ; start over with a new program
    | RUN ; run the program from the beginning
    | SAVE <filename> ; save the program in memory to <filename>

<statement> =
      END ; end execution of the program
    | GOSUB <line-number> ... RETURN
    | GOTO <line-number>
    | IF <logical-expr> THEN <statement> [ELSE <statement>]
    | IF <logical-expr> GOTO <line-number>
    | <string-variable> '=' <string-expr>
    | <integer-variable> '=' <integer-expr>
    | PRINT <expr> [ ','  ...]
    | REM ... ; comment (remark); ' at the end of the line is also a comment

<string> = '"' ... '"'
<integer> = <digit> ...
<variable> = <string-variable> | <integer-variable>
<string-variable> = <name> '$'
<integer-variable> = <name> '%'
<expr> = <primary> [ <operator> <expr> ]
<primary> = <integer> | <string> | <variable> | '-' <expr> | '(' <expr> ')'
<operator> = '+' | '-' | '*' | '/' | '=' | '<>' | '<' | '>' | '<=' | '>='

Operators share one precedence level and group to the right:
12 + 34 * 56 is 12 + (34 * 56).
"#;

enum Flow {
    Continue,
    Exit,
}

/// Arguments of LIST and DELETE.
enum LineRange {
    All,
    From(LineNumber),
    Between(LineNumber, LineNumber),
}

/// Starts the interactive interpreter on stdin, optionally with a program
/// already loaded.
pub fn start(program: Option<&Path>, style: ReportStyle) -> Result<(), BasicError> {
    println!("BASIC");
    println!("type help for help and exit to exit");

    let mut session = Session::new(io::stdout(), io::stderr()).with_style(style);
    if let Some(path) = program {
        session.load(path)?;
    }

    let stdin = io::stdin();
    let mut scanner = Scanner::new(stdin.lock());
    session.interact(&mut scanner)
}

impl<W: Write, E: Write> Session<W, E> {
    /// Reads commands and numbered lines until end of input or EXIT.
    pub fn interact<R: BufRead>(&mut self, scanner: &mut Scanner<R>) -> Result<(), BasicError> {
        while scanner.skip_blank()? {
            match self.command(scanner) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => break,
                Err(err) => self.report_compile_error(scanner, err)?,
            }
        }
        Ok(())
    }

    fn command<R: BufRead>(&mut self, scanner: &mut Scanner<R>) -> Result<Flow, BasicError> {
        if let TokenKind::Integer(_) = scanner.peek_token()?.kind {
            let (number, stmt) = compile_line(scanner)?;
            self.insert_line(number, stmt);
            return Ok(Flow::Continue);
        }

        let token = scanner.next_token()?;
        let keyword = match token.kind {
            TokenKind::Keyword(keyword) => keyword,
            _ => {
                return Err(BasicError::compile_error(
                    token.span,
                    "statement must start with a keyword or variable".to_string(),
                ))
            }
        };

        match keyword.as_str() {
            "DELETE" => match read_range(scanner)? {
                Some(LineRange::From(number)) => self.delete_line(number),
                Some(LineRange::Between(first, last)) => self.delete_range(first, last),
                Some(LineRange::All) | None => {
                    return Err(bad_argument(token.span, "DELETE"));
                }
            },
            "EXIT" => {
                no_arguments(scanner, &keyword)?;
                return Ok(Flow::Exit);
            }
            "HELP" => {
                no_arguments(scanner, &keyword)?;
                write!(self.out_mut(), "{}", HELP)?;
            }
            "LIST" => match read_range(scanner)? {
                Some(LineRange::All) => self.list(0, LineNumber::MAX)?,
                Some(LineRange::From(first)) => self.list(first, LineNumber::MAX)?,
                Some(LineRange::Between(first, last)) => self.list(first, last)?,
                None => return Err(bad_argument(token.span, "LIST")),
            },
            "LOAD" => {
                let filename = file_argument(scanner, &keyword)?;
                self.load(Path::new(&filename))?;
            }
            "NEW" => {
                no_arguments(scanner, &keyword)?;
                self.reset();
            }
            "RUN" => {
                no_arguments(scanner, &keyword)?;
                self.run()?;
            }
            "SAVE" => {
                let filename = file_argument(scanner, &keyword)?;
                self.save(Path::new(&filename))?;
            }
            _ => {
                let stmt = Parser::new(scanner).keyword_statement(&keyword, token.span, true)?;
                self.execute_immediate(&stmt)?;
            }
        }
        Ok(Flow::Continue)
    }
}

/// Parses `[<n> [- <m>]]` through the end of the line; `None` if malformed.
fn read_range<R: BufRead>(scanner: &mut Scanner<R>) -> Result<Option<LineRange>, BasicError> {
    let first = match scanner.next_token()?.kind {
        TokenKind::EndOfLine => return Ok(Some(LineRange::All)),
        TokenKind::Integer(n) => match LineNumber::try_from(n) {
            Ok(first) => first,
            Err(_) => return Ok(None),
        },
        _ => return Ok(None),
    };

    match scanner.next_token()?.kind {
        TokenKind::EndOfLine => Ok(Some(LineRange::From(first))),
        TokenKind::Operator("-") => {
            let last = match scanner.next_token()?.kind {
                TokenKind::Integer(n) => match LineNumber::try_from(n) {
                    Ok(last) => last,
                    Err(_) => return Ok(None),
                },
                _ => return Ok(None),
            };
            if scanner.next_token()?.kind != TokenKind::EndOfLine || last < first {
                return Ok(None);
            }
            Ok(Some(LineRange::Between(first, last)))
        }
        _ => Ok(None),
    }
}

fn no_arguments<R: BufRead>(scanner: &mut Scanner<R>, command: &str) -> Result<(), BasicError> {
    let token = scanner.next_token()?;
    if token.kind != TokenKind::EndOfLine {
        return Err(BasicError::compile_error(
            token.span,
            format!("{} takes no arguments", command),
        ));
    }
    Ok(())
}

fn file_argument<R: BufRead>(
    scanner: &mut Scanner<R>,
    command: &str,
) -> Result<String, BasicError> {
    let token = scanner.next_token()?;
    let filename = match token.kind {
        TokenKind::String(filename) => filename,
        _ => return Err(expects_filename(token.span, command)),
    };
    let token = scanner.next_token()?;
    if token.kind != TokenKind::EndOfLine {
        return Err(expects_filename(token.span, command));
    }
    Ok(filename)
}

fn expects_filename(span: Span, command: &str) -> BasicError {
    BasicError::compile_error_with_help(
        span,
        format!("{} expects one string argument", command),
        format!("Quote the file name: {} \"program.bas\"", command),
    )
}

fn bad_argument(span: Span, command: &str) -> BasicError {
    BasicError::compile_error_with_help(
        span,
        format!("bad argument to {}", command),
        format!("Use {} <line> or {} <first> - <last>.", command, command),
    )
}
