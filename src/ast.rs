use crate::value::{Tag, Value};
use std::fmt;

/// Program line numbers. Zero is the immediate-mode context and is never stored.
pub type LineNumber = u32;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal {
        value: Value,
    },
    Variable {
        name: String,
    },
    Negate {
        operand: Box<Expr>,
    },
    Binary {
        operator: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl BinaryOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let operator = match symbol {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Subtract,
            "*" => BinaryOp::Multiply,
            "/" => BinaryOp::Divide,
            "=" => BinaryOp::Equal,
            "<>" => BinaryOp::NotEqual,
            "<" => BinaryOp::Less,
            "<=" => BinaryOp::LessEqual,
            ">" => BinaryOp::Greater,
            ">=" => BinaryOp::GreaterEqual,
            _ => return None,
        };
        Some(operator)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Equal => "=",
            BinaryOp::NotEqual => "<>",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
        }
    }

    /// Whether the operator has an evaluation rule for operands of this tag.
    pub fn works_for(self, tag: Tag) -> bool {
        match tag {
            Tag::Integer => true,
            Tag::String => !matches!(
                self,
                BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide
            ),
            Tag::Boolean => false,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    End,
    GoSub {
        target: LineNumber,
    },
    Return,
    Goto {
        target: LineNumber,
    },
    Remark {
        text: String,
    },
    Assign {
        name: String,
        value: Expr,
    },
    Print {
        exprs: Vec<Expr>,
    },
    IfThen {
        test: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    IfGoto {
        test: Expr,
        target: LineNumber,
    },
}

/// Canonical source text for a statement, as used by LIST and SAVE.
pub fn render_statement(stmt: &Stmt) -> String {
    stmt.to_string()
}

// The compiler gives every binary operator a full expression as its right
// operand, so only a compound left operand needs parentheses to re-compile
// into the same tree.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Literal { value } => match value {
                Value::Integer(n) => write!(f, "{}", n),
                Value::String(s) => write!(f, "\"{}\"", s),
                Value::Boolean(true) => write!(f, "TRUE"),
                Value::Boolean(false) => write!(f, "FALSE"),
            },
            Expr::Variable { name } => write!(f, "{}", name),
            Expr::Negate { operand } => write!(f, "- {}", operand),
            Expr::Binary {
                operator,
                left,
                right,
            } => match **left {
                Expr::Binary { .. } | Expr::Negate { .. } => {
                    write!(f, "({}) {} {}", left, operator, right)
                }
                _ => write!(f, "{} {} {}", left, operator, right),
            },
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stmt::End => write!(f, "END"),
            Stmt::GoSub { target } => write!(f, "GOSUB {}", target),
            Stmt::Return => write!(f, "RETURN"),
            Stmt::Goto { target } => write!(f, "GOTO {}", target),
            Stmt::Remark { text } if text.is_empty() => write!(f, "REM"),
            Stmt::Remark { text } => write!(f, "REM {}", text),
            Stmt::Assign { name, value } => write!(f, "{} = {}", name, value),
            Stmt::Print { exprs } => {
                write!(f, "PRINT ")?;
                for (i, expr) in exprs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", expr)?;
                }
                Ok(())
            }
            Stmt::IfThen {
                test,
                then_branch,
                else_branch,
            } => {
                write!(f, "IF {} THEN {}", test, then_branch)?;
                if let Some(else_branch) = else_branch {
                    write!(f, " ELSE {}", else_branch)?;
                }
                Ok(())
            }
            Stmt::IfGoto { test, target } => write!(f, "IF {} GOTO {}", test, target),
        }
    }
}
