// linebasic: an interpreter for a small line-numbered BASIC
//
// Numbered lines are compiled into a statement tree as they are typed and
// kept in line-number order; unnumbered statements run immediately.

// Public modules
pub mod ast;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod persist;
pub mod program;
pub mod repl;
pub mod runner;
pub mod session;
pub mod value;

// Re-export commonly used items
pub use ast::{render_statement, BinaryOp, Expr, LineNumber, Stmt};
pub use error::{BasicError, ErrorKind, ReportStyle, Span};
pub use evaluator::{Context, ContextKind, Environment, Evaluator};
pub use lexer::{Scanner, Token, TokenKind};
pub use parser::{compile_expression, compile_line, compile_statement, Parser};
pub use program::ProgramStore;
pub use session::Session;
pub use value::{Tag, Value};

// Re-export main functions
pub use repl::start as start_repl;
pub use runner::run;
