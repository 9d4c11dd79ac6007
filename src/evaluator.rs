use crate::ast::{BinaryOp, Expr, LineNumber, Stmt};
use crate::error::BasicError;
use crate::program::ProgramStore;
use crate::value::{Tag, Value};
use std::collections::HashMap;
use std::io::Write;

/// Flat variable map. A variable's tag is fixed by the suffix of its name.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Stores `value` if its tag matches the name's suffix; otherwise the
    /// previous value is left untouched.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), BasicError> {
        let expected = Tag::for_variable(name).ok_or_else(|| {
            BasicError::runtime_error(format!("not a string or integer variable: {}", name))
        })?;
        if value.tag() != expected {
            return Err(expected_value(expected));
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    GoSub,
}

/// A call-stack frame: where control came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    pub kind: ContextKind,
    pub line: LineNumber,
}

pub struct Evaluator {
    environment: Environment,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            environment: Environment::new(),
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn reset(&mut self) {
        self.environment.clear();
    }

    /// Runs the stored program from its lowest line until it halts.
    ///
    /// A runtime error stops the run and comes back tagged with the number
    /// of the line that raised it; variables keep whatever was assigned.
    pub fn run(&mut self, program: &ProgramStore, out: &mut dyn Write) -> Result<(), BasicError> {
        let mut stack = Vec::new();
        let mut position: LineNumber = 1;

        while let Some((number, stmt)) = program.first_at_or_after(position) {
            match self.execute(stmt, number, &mut stack, out) {
                Ok(Some(next)) if next > 0 => position = next,
                Ok(_) => break,
                Err(err) => return Err(err.at_line(number)),
            }
        }
        Ok(())
    }

    /// Executes one statement at `line` and returns the line to continue
    /// from, or `None` to halt.
    pub fn execute(
        &mut self,
        stmt: &Stmt,
        line: LineNumber,
        stack: &mut Vec<Context>,
        out: &mut dyn Write,
    ) -> Result<Option<LineNumber>, BasicError> {
        match stmt {
            Stmt::End => Ok(None),
            Stmt::GoSub { target } => {
                stack.push(Context {
                    kind: ContextKind::GoSub,
                    line,
                });
                Ok(Some(*target))
            }
            Stmt::Return => {
                while let Some(context) = stack.pop() {
                    if context.kind == ContextKind::GoSub {
                        return Ok(context.line.checked_add(1));
                    }
                }
                Err(BasicError::runtime_error_with_help(
                    "RETURN without a GOSUB".to_string(),
                    "RETURN only resumes after a GOSUB that is still active.".to_string(),
                ))
            }
            Stmt::Goto { target } => Ok(Some(*target)),
            Stmt::Remark { .. } => Ok(line.checked_add(1)),
            Stmt::Assign { name, value } => {
                let value = self.evaluate_expression(value)?;
                self.environment.assign(name, value)?;
                Ok(line.checked_add(1))
            }
            Stmt::Print { exprs } => {
                // Values are written as they are evaluated; a failing one
                // leaves the partial line without its newline.
                for (i, expr) in exprs.iter().enumerate() {
                    if i > 0 {
                        write!(out, ", ")?;
                    }
                    let value = self.evaluate_expression(expr)?;
                    write!(out, "{}", value)?;
                }
                writeln!(out)?;
                Ok(line.checked_add(1))
            }
            Stmt::IfThen {
                test,
                then_branch,
                else_branch,
            } => {
                if self.condition(test)? {
                    self.execute(then_branch, line, stack, out)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch, line, stack, out)
                } else {
                    Ok(line.checked_add(1))
                }
            }
            Stmt::IfGoto { test, target } => {
                if self.condition(test)? {
                    Ok(Some(*target))
                } else {
                    Ok(line.checked_add(1))
                }
            }
        }
    }

    pub fn evaluate_expression(&self, expr: &Expr) -> Result<Value, BasicError> {
        match expr {
            Expr::Literal { value } => Ok(value.clone()),
            Expr::Variable { name } => self.environment.get(name).cloned().ok_or_else(|| {
                BasicError::runtime_error(format!("variable not found: {}", name))
            }),
            Expr::Negate { operand } => match self.evaluate_expression(operand)? {
                Value::Integer(n) => Ok(Value::Integer(n.wrapping_neg())),
                _ => Err(expected_value(Tag::Integer)),
            },
            Expr::Binary {
                operator,
                left,
                right,
            } => {
                let left = self.evaluate_expression(left)?;
                let right = self.evaluate_expression(right)?;
                apply_binary(*operator, left, right)
            }
        }
    }

    fn condition(&self, test: &Expr) -> Result<bool, BasicError> {
        match self.evaluate_expression(test)? {
            Value::Boolean(b) => Ok(b),
            _ => Err(expected_value(Tag::Boolean)),
        }
    }
}

/// The left operand's tag selects the rule; the right operand must match it.
fn apply_binary(operator: BinaryOp, left: Value, right: Value) -> Result<Value, BasicError> {
    let tag = left.tag();
    if !operator.works_for(tag) {
        return Err(not_supported(operator, tag));
    }
    match (left, right) {
        (Value::Integer(l), Value::Integer(r)) => integer_rule(operator, l, r),
        (Value::String(l), Value::String(r)) => {
            string_rule(operator, l, &r).ok_or_else(|| not_supported(operator, tag))
        }
        _ => Err(expected_value(tag)),
    }
}

fn integer_rule(operator: BinaryOp, l: i64, r: i64) -> Result<Value, BasicError> {
    let value = match operator {
        BinaryOp::Add => Value::Integer(l.wrapping_add(r)),
        BinaryOp::Subtract => Value::Integer(l.wrapping_sub(r)),
        BinaryOp::Multiply => Value::Integer(l.wrapping_mul(r)),
        BinaryOp::Divide => {
            if r == 0 {
                return Err(BasicError::runtime_error("division by zero".to_string()));
            }
            Value::Integer(l.wrapping_div(r))
        }
        BinaryOp::Equal => Value::Boolean(l == r),
        BinaryOp::NotEqual => Value::Boolean(l != r),
        BinaryOp::Less => Value::Boolean(l < r),
        BinaryOp::LessEqual => Value::Boolean(l <= r),
        BinaryOp::Greater => Value::Boolean(l > r),
        BinaryOp::GreaterEqual => Value::Boolean(l >= r),
    };
    Ok(value)
}

fn string_rule(operator: BinaryOp, l: String, r: &str) -> Option<Value> {
    let value = match operator {
        BinaryOp::Add => Value::String(l + r),
        BinaryOp::Equal => Value::Boolean(l == r),
        BinaryOp::NotEqual => Value::Boolean(l != r),
        BinaryOp::Less => Value::Boolean(l.as_str() < r),
        BinaryOp::LessEqual => Value::Boolean(l.as_str() <= r),
        BinaryOp::Greater => Value::Boolean(l.as_str() > r),
        BinaryOp::GreaterEqual => Value::Boolean(l.as_str() >= r),
        BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide => return None,
    };
    Some(value)
}

fn not_supported(operator: BinaryOp, tag: Tag) -> BasicError {
    BasicError::runtime_error(format!("{} does not work for {}", operator, tag.plural()))
}

fn expected_value(tag: Tag) -> BasicError {
    BasicError::runtime_error(format!("expected {} value", tag.with_article()))
}
