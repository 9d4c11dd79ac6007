use crate::error::{BasicError, Span};
use std::io::BufRead;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    EndOfLine,
    /// Keywords and variable names, upper-cased, with any `$`/`%` suffix.
    Keyword(String),
    Integer(i64),
    String(String),
    Operator(&'static str),
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(&self.kind, TokenKind::Keyword(kw) if kw == keyword)
    }
}

/// Lazy tokenizer over a character stream.
///
/// Input is pulled one physical line at a time, so a scanner can sit on top of
/// an interactive terminal as well as a file. Exactly one token of lookahead is
/// available through [`Scanner::peek_token`].
pub struct Scanner<R> {
    reader: R,
    line: Vec<char>,
    current: usize,
    exhausted: bool,
    peeked: Option<Token>,
    at_eol: bool,
}

impl<R: BufRead> Scanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            current: 0,
            exhausted: false,
            peeked: None,
            at_eol: true,
        }
    }

    pub fn next_token(&mut self) -> Result<Token, BasicError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.scan_token()?,
        };
        self.at_eol = token.kind == TokenKind::EndOfLine;
        Ok(token)
    }

    pub fn peek_token(&mut self) -> Result<&Token, BasicError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.scan_token()?,
        };
        Ok(self.peeked.insert(token))
    }

    /// Raw characters up to, but not including, the end of the line.
    pub fn read_rest_of_line(&mut self) -> Result<String, BasicError> {
        let mut text = String::new();
        loop {
            let c = self.read_required()?;
            if c == '\n' {
                self.unread();
                return Ok(text);
            }
            text.push(c);
        }
    }

    /// Discards tokens until an end of line has been consumed.
    ///
    /// Lexical errors on the way are swallowed; fatal ones are not.
    pub fn skip_line(&mut self) -> Result<(), BasicError> {
        while !self.at_eol {
            match self.next_token() {
                Ok(_) => {}
                Err(err) if err.is_fatal() => return Err(err),
                Err(_) => {}
            }
        }
        Ok(())
    }

    /// Skips blanks and empty lines before a new command.
    ///
    /// Returns `false` once the input is exhausted.
    pub fn skip_blank(&mut self) -> Result<bool, BasicError> {
        if self.peeked.is_some() {
            return Ok(true);
        }
        loop {
            match self.read_char()? {
                None => return Ok(false),
                Some(' ' | '\t' | '\r' | '\n') => continue,
                Some(_) => {
                    self.unread();
                    self.at_eol = false;
                    return Ok(true);
                }
            }
        }
    }

    /// The physical line currently being scanned.
    pub fn line_text(&self) -> String {
        self.line.iter().collect()
    }

    fn scan_token(&mut self) -> Result<Token, BasicError> {
        self.at_eol = false;

        let mut c = self.read_required()?;
        while c == ' ' || c == '\t' || c == '\r' {
            c = self.read_required()?;
        }
        let start = self.current - 1;

        match c {
            '\n' => Ok(self.token(TokenKind::EndOfLine, start)),
            '\'' => {
                while self.read_required()? != '\n' {}
                Ok(self.token(TokenKind::EndOfLine, start))
            }
            '+' | '-' | '*' | '/' | '(' | ')' | ',' | '=' => {
                Ok(self.token(TokenKind::Operator(single_operator(c)), start))
            }
            '<' => {
                let symbol = match self.read_required()? {
                    '=' => "<=",
                    '>' => "<>",
                    _ => {
                        self.unread();
                        "<"
                    }
                };
                Ok(self.token(TokenKind::Operator(symbol), start))
            }
            '>' => {
                let symbol = match self.read_required()? {
                    '=' => ">=",
                    _ => {
                        self.unread();
                        ">"
                    }
                };
                Ok(self.token(TokenKind::Operator(symbol), start))
            }
            '"' => self.string(start),
            c if c.is_ascii_digit() => self.integer(c, start),
            c if c.is_ascii_alphabetic() => self.identifier(c, start),
            _ => Err(BasicError::lex_error(
                Span::single(start),
                format!("unexpected character: '{}'", c),
            )),
        }
    }

    fn identifier(&mut self, first: char, start: usize) -> Result<Token, BasicError> {
        let mut name = String::new();
        name.push(first.to_ascii_uppercase());
        loop {
            let c = self.read_required()?;
            if c.is_ascii_alphabetic() {
                name.push(c.to_ascii_uppercase());
            } else if c == '$' || c == '%' {
                name.push(c);
                break;
            } else {
                self.unread();
                break;
            }
        }
        Ok(self.token(TokenKind::Keyword(name), start))
    }

    fn integer(&mut self, first: char, start: usize) -> Result<Token, BasicError> {
        let mut value = Some(i64::from(digit(first)));
        loop {
            let c = self.read_required()?;
            if !c.is_ascii_digit() {
                self.unread();
                break;
            }
            value = value
                .and_then(|n| n.checked_mul(10))
                .and_then(|n| n.checked_add(i64::from(digit(c))));
        }
        match value {
            Some(n) => Ok(self.token(TokenKind::Integer(n), start)),
            None => Err(BasicError::lex_error(
                Span::new(start, self.current),
                "integer literal out of range".to_string(),
            )),
        }
    }

    fn string(&mut self, start: usize) -> Result<Token, BasicError> {
        let mut text = String::new();
        loop {
            match self.read_required()? {
                '"' => return Ok(self.token(TokenKind::String(text), start)),
                '\n' => {
                    // Leave the newline so the line still ends with EndOfLine.
                    self.unread();
                    return Err(BasicError::lex_error(
                        Span::new(start, self.current),
                        "unterminated string literal".to_string(),
                    ));
                }
                c => text.push(c),
            }
        }
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token::new(kind, Span::new(start, self.current))
    }

    fn read_required(&mut self) -> Result<char, BasicError> {
        match self.read_char()? {
            Some(c) => Ok(c),
            None => Err(BasicError::fatal("unexpected end of input".to_string())),
        }
    }

    fn read_char(&mut self) -> Result<Option<char>, BasicError> {
        if self.current >= self.line.len() && !self.fill()? {
            return Ok(None);
        }
        let c = self.line[self.current];
        self.current += 1;
        Ok(Some(c))
    }

    fn unread(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    fn fill(&mut self) -> Result<bool, BasicError> {
        if self.exhausted {
            return Ok(false);
        }
        let mut buf = String::new();
        let read = self
            .reader
            .read_line(&mut buf)
            .map_err(|e| BasicError::fatal(format!("read failed: {}", e)))?;
        if read == 0 {
            self.exhausted = true;
            return Ok(false);
        }
        // A final line without a newline still ends the statement on it.
        if !buf.ends_with('\n') {
            buf.push('\n');
        }
        self.line = buf.chars().collect();
        self.current = 0;
        Ok(true)
    }
}

fn single_operator(c: char) -> &'static str {
    match c {
        '+' => "+",
        '-' => "-",
        '*' => "*",
        '/' => "/",
        '(' => "(",
        ')' => ")",
        ',' => ",",
        _ => "=",
    }
}

fn digit(c: char) -> u8 {
    c as u8 - b'0'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut scanner = Scanner::new(input.as_bytes());
        let mut kinds = Vec::new();
        loop {
            let token = scanner.next_token().unwrap();
            let done = token.kind == TokenKind::EndOfLine;
            kinds.push(token.kind);
            if done {
                return kinds;
            }
        }
    }

    fn keyword(s: &str) -> TokenKind {
        TokenKind::Keyword(s.to_string())
    }

    #[test]
    fn test_keywords_are_upper_cased_and_keep_suffix() {
        assert_eq!(
            kinds("print abc% , Xy$\n"),
            vec![
                keyword("PRINT"),
                keyword("ABC%"),
                TokenKind::Operator(","),
                keyword("XY$"),
                TokenKind::EndOfLine,
            ]
        );
    }

    #[test]
    fn test_suffix_terminates_identifier() {
        assert_eq!(
            kinds("a$b\n"),
            vec![keyword("A$"), keyword("B"), TokenKind::EndOfLine]
        );
    }

    #[test]
    fn test_two_character_operators() {
        assert_eq!(
            kinds("<= <> < >= > =\n"),
            vec![
                TokenKind::Operator("<="),
                TokenKind::Operator("<>"),
                TokenKind::Operator("<"),
                TokenKind::Operator(">="),
                TokenKind::Operator(">"),
                TokenKind::Operator("="),
                TokenKind::EndOfLine,
            ]
        );
    }

    #[test]
    fn test_integers_are_unsigned() {
        assert_eq!(
            kinds("-123\n"),
            vec![
                TokenKind::Operator("-"),
                TokenKind::Integer(123),
                TokenKind::EndOfLine
            ]
        );
    }

    #[test]
    fn test_string_keeps_spaces_and_case() {
        assert_eq!(
            kinds("\" Hello, World \"\n"),
            vec![
                TokenKind::String(" Hello, World ".to_string()),
                TokenKind::EndOfLine
            ]
        );
    }

    #[test]
    fn test_quote_comment_ends_line() {
        let mut scanner = Scanner::new("print 1 ' trailing remark\nprint 2\n".as_bytes());
        assert!(scanner.next_token().unwrap().is_keyword("PRINT"));
        assert_eq!(scanner.next_token().unwrap().kind, TokenKind::Integer(1));
        assert_eq!(scanner.next_token().unwrap().kind, TokenKind::EndOfLine);
        assert!(scanner.next_token().unwrap().is_keyword("PRINT"));
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut scanner = Scanner::new("goto 10\n".as_bytes());
        assert!(scanner.peek_token().unwrap().is_keyword("GOTO"));
        assert!(scanner.peek_token().unwrap().is_keyword("GOTO"));
        assert!(scanner.next_token().unwrap().is_keyword("GOTO"));
        assert_eq!(scanner.next_token().unwrap().kind, TokenKind::Integer(10));
    }

    #[test]
    fn test_spans_are_columns() {
        let mut scanner = Scanner::new("  print 42\n".as_bytes());
        assert_eq!(scanner.next_token().unwrap().span, Span::new(2, 7));
        assert_eq!(scanner.next_token().unwrap().span, Span::new(8, 10));
    }

    #[test]
    fn test_rest_of_line_is_raw() {
        let mut scanner = Scanner::new("rem a \"b\" ' c\n".as_bytes());
        assert!(scanner.next_token().unwrap().is_keyword("REM"));
        assert_eq!(scanner.read_rest_of_line().unwrap(), " a \"b\" ' c");
        assert_eq!(scanner.next_token().unwrap().kind, TokenKind::EndOfLine);
    }

    #[test]
    fn test_missing_final_newline() {
        assert_eq!(kinds("end"), vec![keyword("END"), TokenKind::EndOfLine]);
    }

    #[test]
    fn test_unterminated_string_leaves_end_of_line() {
        let mut scanner = Scanner::new("print \"abc\nend\n".as_bytes());
        scanner.next_token().unwrap();
        let err = scanner.next_token().unwrap_err();
        assert_eq!(err.kind, ErrorKind::LexError);
        assert_eq!(scanner.next_token().unwrap().kind, TokenKind::EndOfLine);
        assert!(scanner.next_token().unwrap().is_keyword("END"));
    }

    #[test]
    fn test_unexpected_character() {
        let mut scanner = Scanner::new("print ;\n".as_bytes());
        scanner.next_token().unwrap();
        let err = scanner.next_token().unwrap_err();
        assert_eq!(err.message, "unexpected character: ';'");
    }

    #[test]
    fn test_integer_overflow_is_lex_error() {
        let mut scanner = Scanner::new("99999999999999999999\n".as_bytes());
        let err = scanner.next_token().unwrap_err();
        assert_eq!(err.kind, ErrorKind::LexError);
    }

    #[test]
    fn test_skip_line_resumes_at_next_line() {
        let mut scanner = Scanner::new("print 1 ; 2 3\nend\n".as_bytes());
        scanner.next_token().unwrap();
        scanner.skip_line().unwrap();
        assert!(scanner.next_token().unwrap().is_keyword("END"));
    }

    #[test]
    fn test_skip_line_after_end_of_line_is_noop() {
        let mut scanner = Scanner::new("goto\nend\n".as_bytes());
        scanner.next_token().unwrap();
        assert_eq!(scanner.next_token().unwrap().kind, TokenKind::EndOfLine);
        scanner.skip_line().unwrap();
        assert!(scanner.next_token().unwrap().is_keyword("END"));
    }

    #[test]
    fn test_skip_blank_reports_end_of_input() {
        let mut scanner = Scanner::new("\n   \n  list\n\n".as_bytes());
        assert!(scanner.skip_blank().unwrap());
        assert!(scanner.next_token().unwrap().is_keyword("LIST"));
        assert_eq!(scanner.next_token().unwrap().kind, TokenKind::EndOfLine);
        assert!(!scanner.skip_blank().unwrap());
    }

    #[test]
    fn test_read_failure_is_fatal() {
        let mut scanner = Scanner::new(&b"print \"\xff\"\n"[..]);
        let err = scanner.next_token().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Fatal);
        assert!(err.message.starts_with("read failed: "));
    }

    #[test]
    fn test_reading_past_end_is_fatal() {
        let mut scanner = Scanner::new("".as_bytes());
        let err = scanner.next_token().unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.message, "unexpected end of input");
    }
}
