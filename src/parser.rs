use crate::ast::{BinaryOp, Expr, LineNumber, Stmt};
use crate::error::{BasicError, Span};
use crate::lexer::{Scanner, TokenKind};
use crate::value::{Tag, Value};
use std::io::BufRead;

/// Keywords the language reserves but does not compile yet.
const RESERVED: [&str; 5] = ["FOR", "NEXT", "WHILE", "WEND", "INPUT"];

/// Deepest expression nesting one line may compile to. Evaluation and
/// rendering recurse over the same tree, so this bounds them too.
pub const MAX_NESTING: usize = 256;

/// Deepest chain of IF branches nested inside one another.
pub const MAX_BRANCH_NESTING: usize = 64;

/// Recursive-descent compiler reading straight from a [`Scanner`].
///
/// Errors are returned as soon as they are found; the caller is responsible
/// for draining the rest of the line with [`Scanner::skip_line`].
pub struct Parser<'a, R> {
    scanner: &'a mut Scanner<R>,
    depth: usize,
    branches: usize,
}

impl<'a, R: BufRead> Parser<'a, R> {
    pub fn new(scanner: &'a mut Scanner<R>) -> Self {
        Self {
            scanner,
            depth: 0,
            branches: 0,
        }
    }

    /// `<line-number> <statement>`
    pub fn line(&mut self) -> Result<(LineNumber, Stmt), BasicError> {
        let token = self.scanner.next_token()?;
        let number = match token.kind {
            TokenKind::Integer(n) => line_number(n, &token.span)?,
            _ => {
                return Err(BasicError::compile_error(
                    token.span,
                    "statement must start with a line number".to_string(),
                ))
            }
        };
        if number == 0 {
            return Err(BasicError::compile_error_with_help(
                token.span,
                "line number must be greater than zero".to_string(),
                "Type the statement without a line number to run it immediately.".to_string(),
            ));
        }
        let stmt = self.statement(true)?;
        Ok((number, stmt))
    }

    /// Compiles one statement. Nested THEN/ELSE branches pass
    /// `require_end_of_line = false` so more of the line may follow them.
    pub fn statement(&mut self, require_end_of_line: bool) -> Result<Stmt, BasicError> {
        if self.branches >= MAX_BRANCH_NESTING {
            return Err(self.too_deep("statement", MAX_BRANCH_NESTING)?);
        }
        self.branches += 1;
        let stmt = self.nested_statement(require_end_of_line);
        self.branches -= 1;
        stmt
    }

    fn nested_statement(&mut self, require_end_of_line: bool) -> Result<Stmt, BasicError> {
        let token = self.scanner.next_token()?;
        match token.kind {
            TokenKind::Keyword(keyword) => {
                self.keyword_statement(&keyword, token.span, require_end_of_line)
            }
            _ => Err(BasicError::compile_error(
                token.span,
                "statement must start with a keyword or variable".to_string(),
            )),
        }
    }

    /// Compiles the statement introduced by a keyword that was already read.
    pub fn keyword_statement(
        &mut self,
        keyword: &str,
        span: Span,
        require_end_of_line: bool,
    ) -> Result<Stmt, BasicError> {
        let stmt = match keyword {
            "END" => Stmt::End,
            "GOSUB" => Stmt::GoSub {
                target: self.target("GOSUB")?,
            },
            "RETURN" => Stmt::Return,
            "GOTO" => Stmt::Goto {
                target: self.target("GOTO")?,
            },
            "IF" => self.if_statement()?,
            "PRINT" => self.print_statement()?,
            "REM" => {
                let text = self.scanner.read_rest_of_line()?;
                Stmt::Remark {
                    text: text.trim_start().trim_end_matches('\r').to_string(),
                }
            }
            _ if RESERVED.contains(&keyword) => {
                return Err(BasicError::compile_error_with_help(
                    span,
                    format!("{} is not implemented", keyword),
                    "Use IF ... GOTO to build loops.".to_string(),
                ))
            }
            _ if Tag::for_variable(keyword).is_some() => self.assignment(keyword)?,
            _ => {
                return Err(BasicError::compile_error(
                    span,
                    format!("unknown keyword: {}", keyword),
                ))
            }
        };

        if require_end_of_line {
            let token = self.scanner.next_token()?;
            if token.kind != TokenKind::EndOfLine {
                return Err(BasicError::compile_error(
                    token.span,
                    format!("too many arguments to keyword: {}", keyword),
                ));
            }
        }
        Ok(stmt)
    }

    /// A primary optionally followed by one binary operator whose right
    /// operand is again a whole expression: `a + b + c` is `a + (b + c)`.
    pub fn expression(&mut self) -> Result<Expr, BasicError> {
        if self.depth >= MAX_NESTING {
            return Err(self.too_deep("expression", MAX_NESTING)?);
        }
        self.depth += 1;
        let expr = self.nested_expression();
        self.depth -= 1;
        expr
    }

    fn nested_expression(&mut self) -> Result<Expr, BasicError> {
        let token = self.scanner.next_token()?;
        let expr = match token.kind {
            TokenKind::Integer(n) => Expr::Literal {
                value: Value::Integer(n),
            },
            TokenKind::String(s) => Expr::Literal {
                value: Value::String(s),
            },
            TokenKind::Keyword(name) => Expr::Variable { name },
            TokenKind::Operator("-") => Expr::Negate {
                operand: Box::new(self.expression()?),
            },
            TokenKind::Operator("(") => {
                let inner = self.expression()?;
                let close = self.scanner.next_token()?;
                if close.kind != TokenKind::Operator(")") {
                    return Err(BasicError::compile_error_with_help(
                        close.span,
                        "missing closing ) in expression".to_string(),
                        "Every opening parenthesis '(' must have a matching ')'.".to_string(),
                    ));
                }
                inner
            }
            _ => {
                return Err(BasicError::compile_error(
                    token.span,
                    "unexpected token in expression".to_string(),
                ))
            }
        };

        let operator = match &self.scanner.peek_token()?.kind {
            TokenKind::Operator(symbol) => BinaryOp::from_symbol(symbol),
            _ => None,
        };
        match operator {
            Some(operator) => {
                self.scanner.next_token()?;
                let right = self.expression()?;
                Ok(Expr::Binary {
                    operator,
                    left: Box::new(expr),
                    right: Box::new(right),
                })
            }
            None => Ok(expr),
        }
    }

    /// The error for nesting past `limit`, pointing at the next token.
    fn too_deep(&mut self, what: &str, limit: usize) -> Result<BasicError, BasicError> {
        let span = self.scanner.peek_token()?.span.clone();
        Ok(BasicError::compile_error_with_help(
            span,
            format!("{} too deeply nested", what),
            format!("Split the line; at most {} levels are allowed.", limit),
        ))
    }

    fn if_statement(&mut self) -> Result<Stmt, BasicError> {
        let test = self.expression()?;
        let token = self.scanner.next_token()?;
        if token.is_keyword("THEN") {
            let then_branch = Box::new(self.statement(false)?);
            let else_branch = if self.scanner.peek_token()?.is_keyword("ELSE") {
                self.scanner.next_token()?;
                Some(Box::new(self.statement(false)?))
            } else {
                None
            };
            Ok(Stmt::IfThen {
                test,
                then_branch,
                else_branch,
            })
        } else if token.is_keyword("GOTO") {
            Ok(Stmt::IfGoto {
                test,
                target: self.target("IF GOTO")?,
            })
        } else {
            Err(BasicError::compile_error(
                token.span,
                "expected IF followed by THEN or GOTO".to_string(),
            ))
        }
    }

    fn print_statement(&mut self) -> Result<Stmt, BasicError> {
        let mut exprs = vec![self.expression()?];
        while self.scanner.peek_token()?.kind == TokenKind::Operator(",") {
            self.scanner.next_token()?;
            exprs.push(self.expression()?);
        }
        Ok(Stmt::Print { exprs })
    }

    fn assignment(&mut self, name: &str) -> Result<Stmt, BasicError> {
        let token = self.scanner.next_token()?;
        if token.kind != TokenKind::Operator("=") {
            return Err(BasicError::compile_error(
                token.span,
                "expected '=' following variable name".to_string(),
            ));
        }
        Ok(Stmt::Assign {
            name: name.to_string(),
            value: self.expression()?,
        })
    }

    fn target(&mut self, context: &str) -> Result<LineNumber, BasicError> {
        let token = self.scanner.next_token()?;
        match token.kind {
            TokenKind::Integer(n) => line_number(n, &token.span),
            _ => Err(BasicError::compile_error(
                token.span,
                format!("missing line number for {}", context),
            )),
        }
    }
}

fn line_number(n: i64, span: &Span) -> Result<LineNumber, BasicError> {
    LineNumber::try_from(n).map_err(|_| {
        BasicError::compile_error(span.clone(), "line number out of range".to_string())
    })
}

pub fn compile_expression<R: BufRead>(scanner: &mut Scanner<R>) -> Result<Expr, BasicError> {
    Parser::new(scanner).expression()
}

pub fn compile_statement<R: BufRead>(
    scanner: &mut Scanner<R>,
    require_end_of_line: bool,
) -> Result<Stmt, BasicError> {
    Parser::new(scanner).statement(require_end_of_line)
}

pub fn compile_line<R: BufRead>(
    scanner: &mut Scanner<R>,
) -> Result<(LineNumber, Stmt), BasicError> {
    Parser::new(scanner).line()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(input: &str) -> Result<Stmt, BasicError> {
        let mut scanner = Scanner::new(input.as_bytes());
        compile_statement(&mut scanner, true)
    }

    fn int(n: i64) -> Box<Expr> {
        Box::new(Expr::Literal {
            value: Value::Integer(n),
        })
    }

    #[test]
    fn test_binary_operators_associate_to_the_right() {
        let mut scanner = Scanner::new("12 + 34 * 56\n".as_bytes());
        let expr = compile_expression(&mut scanner).unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                operator: BinaryOp::Add,
                left: int(12),
                right: Box::new(Expr::Binary {
                    operator: BinaryOp::Multiply,
                    left: int(34),
                    right: int(56),
                }),
            }
        );
    }

    #[test]
    fn test_parentheses_group_left_operand() {
        let mut scanner = Scanner::new("(12 + 34) * 56\n".as_bytes());
        let expr = compile_expression(&mut scanner).unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                operator: BinaryOp::Multiply,
                left: Box::new(Expr::Binary {
                    operator: BinaryOp::Add,
                    left: int(12),
                    right: int(34),
                }),
                right: int(56),
            }
        );
    }

    #[test]
    fn test_negate_takes_whole_expression() {
        let mut scanner = Scanner::new("- 1 + 2\n".as_bytes());
        let expr = compile_expression(&mut scanner).unwrap();
        assert_eq!(
            expr,
            Expr::Negate {
                operand: Box::new(Expr::Binary {
                    operator: BinaryOp::Add,
                    left: int(1),
                    right: int(2),
                }),
            }
        );
    }

    #[test]
    fn test_if_then_else() {
        let stmt = statement("if a% <> 1 then print 2 else goto 60\n").unwrap();
        match stmt {
            Stmt::IfThen {
                then_branch,
                else_branch,
                ..
            } => {
                assert!(matches!(*then_branch, Stmt::Print { .. }));
                assert_eq!(else_branch.as_deref(), Some(&Stmt::Goto { target: 60 }));
            }
            other => panic!("expected IF THEN, got {:?}", other),
        }
    }

    #[test]
    fn test_if_goto() {
        let stmt = statement("if a$ < \"abc\" goto 50\n").unwrap();
        assert!(matches!(stmt, Stmt::IfGoto { target: 50, .. }));
    }

    #[test]
    fn test_remark_text_is_not_tokenized() {
        let stmt = statement("rem   this; is \"free\" text\n").unwrap();
        assert_eq!(
            stmt,
            Stmt::Remark {
                text: "this; is \"free\" text".to_string()
            }
        );
    }

    #[test]
    fn test_assignment_needs_suffix() {
        let err = statement("abc = 123\n").unwrap_err();
        assert_eq!(err.message, "unknown keyword: ABC");
        assert!(statement("abc% = 123\n").is_ok());
    }

    #[test]
    fn test_reserved_keywords_produce_no_statement() {
        for keyword in RESERVED {
            let err = statement(&format!("{} x%\n", keyword)).unwrap_err();
            assert_eq!(err.message, format!("{} is not implemented", keyword));
        }
    }

    #[test]
    fn test_trailing_tokens_are_rejected() {
        let err = statement("end 5\n").unwrap_err();
        assert_eq!(err.message, "too many arguments to keyword: END");
    }

    #[test]
    fn test_missing_goto_target() {
        let err = statement("goto\n").unwrap_err();
        assert_eq!(err.message, "missing line number for GOTO");
    }

    #[test]
    fn test_goto_target_out_of_range() {
        let err = statement("goto 99999999999\n").unwrap_err();
        assert_eq!(err.message, "line number out of range");
    }

    #[test]
    fn test_compile_line() {
        let mut scanner = Scanner::new("20 print 1\n".as_bytes());
        let (number, stmt) = compile_line(&mut scanner).unwrap();
        assert_eq!(number, 20);
        assert!(matches!(stmt, Stmt::Print { .. }));
    }

    #[test]
    fn test_nesting_limit() {
        let source = |terms: usize| format!("{}1\n", "1 + ".repeat(terms));

        let shallow = source(MAX_NESTING - 1);
        let mut scanner = Scanner::new(shallow.as_bytes());
        assert!(compile_expression(&mut scanner).is_ok());

        let deep = source(MAX_NESTING);
        let mut scanner = Scanner::new(deep.as_bytes());
        let err = compile_expression(&mut scanner).unwrap_err();
        assert_eq!(err.message, "expression too deeply nested");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_nested_if_limit() {
        let source = |ifs: usize| format!("{}end\n", "if a% then ".repeat(ifs));
        assert!(statement(&source(MAX_BRANCH_NESTING - 1)).is_ok());
        let err = statement(&source(MAX_BRANCH_NESTING)).unwrap_err();
        assert_eq!(err.message, "statement too deeply nested");
    }

    #[test]
    fn test_line_zero_is_rejected() {
        let mut scanner = Scanner::new("0 end\n".as_bytes());
        let err = compile_line(&mut scanner).unwrap_err();
        assert_eq!(err.message, "line number must be greater than zero");
    }
}
