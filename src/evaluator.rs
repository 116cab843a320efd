use crate::ast::{BinaryOp, Expr, Program, Stmt, UnaryOp};
use crate::builtins::Builtins;
use crate::environment::{Environment, FrameId};
use crate::error::{Span, TinyError};
use crate::lexer::Token;
use crate::value::{Function, Value};
use log::{debug, warn};
use std::io::{self, Write};
use std::rc::Rc;

/// Outcome of executing statements. A `Return` unwinds to the nearest call
/// boundary and never escapes it.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal(Value),
    Return(Value),
}

pub struct Evaluator {
    environment: Environment,
    frame: FrameId,
    output: Box<dyn Write>,
    call_depth: usize,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    /// Standard built-ins, printing to stdout.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    pub fn with_output(output: Box<dyn Write>) -> Self {
        Self::with_builtins(&Builtins::standard(), output)
    }

    pub fn with_builtins(builtins: &Builtins, output: Box<dyn Write>) -> Self {
        Self {
            environment: Environment::new(builtins),
            frame: Environment::ROOT,
            output,
            call_depth: 0,
        }
    }

    /// Runs a program in the root frame. Bindings persist across calls, so a
    /// REPL can feed one program per line. Returns the value of the last
    /// top-level expression statement, or `Void` when there is none.
    pub fn evaluate_program(&mut self, program: &Program) -> Result<Value, TinyError> {
        let result = self.execute_top_level(&program.statements);

        if let Err(io_error) = self.output.flush() {
            warn!("flushing program output failed: {}", io_error);
            if result.is_ok() {
                let span = program
                    .statements
                    .last()
                    .map(|stmt| stmt.token().span.clone())
                    .unwrap_or_else(|| Span::single(0, 1, 1));
                return Err(TinyError::runtime_error(
                    span,
                    format!("failed to write output: {}", io_error),
                ));
            }
        }

        result
    }

    fn execute_top_level(&mut self, statements: &[Stmt]) -> Result<Value, TinyError> {
        let mut last = Value::Void;
        for statement in statements {
            let value = match self.execute_statement(statement)? {
                Flow::Normal(value) | Flow::Return(value) => value,
            };
            if matches!(statement, Stmt::Expression { .. }) {
                last = value;
            }
        }
        Ok(last)
    }

    /// Looks a name up from the current frame outward.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.environment.get(self.frame, name).cloned()
    }

    /// Executes statements in the current frame, stopping at the first
    /// return signal.
    pub fn execute(&mut self, statements: &[Stmt]) -> Result<Flow, TinyError> {
        let mut last = Value::Void;
        for statement in statements {
            match self.execute_statement(statement)? {
                Flow::Normal(value) => last = value,
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }
        Ok(Flow::Normal(last))
    }

    fn execute_statement(&mut self, stmt: &Stmt) -> Result<Flow, TinyError> {
        match stmt {
            Stmt::Expression { expr } => Ok(Flow::Normal(self.evaluate_expression(expr)?)),
            Stmt::Let {
                name,
                initializer,
                token,
            } => {
                if self.environment.is_defined_locally(self.frame, name) {
                    return Err(TinyError::runtime_error_with_help(
                        token.span.clone(),
                        format!("variable already declared: {}", name),
                        format!("Use '{} = ...' to change an existing variable.", name),
                    ));
                }
                let value = self.evaluate_expression(initializer)?;
                self.environment.define(self.frame, name, value);
                Ok(Flow::Normal(Value::Void))
            }
            Stmt::Assign { name, value, token } => {
                if self.environment.get(self.frame, name).is_none() {
                    return Err(TinyError::runtime_error_with_help(
                        token.span.clone(),
                        format!("undefined variable: {}", name),
                        format!("Declare it first with 'let {} := ...'.", name),
                    ));
                }
                let value = self.evaluate_expression(value)?;
                self.environment.set(self.frame, name, value);
                Ok(Flow::Normal(Value::Void))
            }
            Stmt::IndexAssign {
                array,
                index,
                value,
                token,
            } => {
                let target = self.evaluate_expression(array)?;
                let Value::Array(elements) = target else {
                    return Err(TinyError::runtime_error(
                        token.span.clone(),
                        format!("left side of index assignment must be an Array, got {}", target.type_name()),
                    ));
                };
                let index = self.evaluate_expression(index)?;
                let value = self.evaluate_expression(value)?;

                let position = array_index(&index, elements.borrow().len(), token)?;
                elements.borrow_mut()[position] = value;
                Ok(Flow::Normal(Value::Void))
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.evaluate_expression(condition)?.is_truthy() {
                    self.execute_block(then_branch)
                } else {
                    self.execute_block(else_branch)
                }
            }
            Stmt::While { condition, body, .. } => {
                while self.evaluate_expression(condition)?.is_truthy() {
                    if let flow @ Flow::Return(_) = self.execute_block(body)? {
                        return Ok(flow);
                    }
                }
                Ok(Flow::Normal(Value::Void))
            }
            Stmt::Function {
                name, params, body, ..
            } => {
                let function = Function {
                    name: name.clone(),
                    params: params.clone(),
                    body: Rc::clone(body),
                };
                self.environment.set(self.frame, name, Value::Function(Rc::new(function)));
                Ok(Flow::Normal(Value::Void))
            }
            Stmt::Return { value, token } => {
                if self.call_depth == 0 {
                    return Err(TinyError::runtime_error_with_help(
                        token.span.clone(),
                        "return statement outside of function".to_string(),
                        "'return' can only be used inside a 'func' body.".to_string(),
                    ));
                }
                let value = match value {
                    Some(expr) => self.evaluate_expression(expr)?,
                    None => Value::Void,
                };
                Ok(Flow::Return(value))
            }
        }
    }

    /// Runs `statements` in a fresh child frame, discarded afterwards even
    /// when execution fails.
    fn execute_block(&mut self, statements: &[Stmt]) -> Result<Flow, TinyError> {
        self.with_frame(|evaluator| evaluator.execute(statements))
    }

    fn with_frame<T>(&mut self, body: impl FnOnce(&mut Self) -> T) -> T {
        let previous = self.frame;
        self.frame = self.environment.push_frame(previous);
        let result = body(self);
        self.environment.pop_frame(self.frame);
        self.frame = previous;
        result
    }

    pub fn evaluate_expression(&mut self, expr: &Expr) -> Result<Value, TinyError> {
        match expr {
            Expr::Number { value, .. } => Ok(Value::Number(*value)),
            Expr::String { value, .. } => Ok(Value::String(value.clone())),
            Expr::Boolean { value, .. } => Ok(Value::Boolean(*value)),
            Expr::Array { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.evaluate_expression(element)?);
                }
                Ok(Value::array(values))
            }
            Expr::Identifier { name, token } => self.get(name).ok_or_else(|| {
                TinyError::runtime_error(token.span.clone(), format!("undefined variable: {}", name))
            }),
            Expr::Unary {
                operator,
                operand,
                token,
            } => {
                let operand = self.evaluate_expression(operand)?;
                evaluate_unary_op(*operator, operand, token)
            }
            Expr::Binary {
                left,
                operator,
                right,
                token,
            } => {
                let left = self.evaluate_expression(left)?;
                let right = self.evaluate_expression(right)?;
                evaluate_binary_op(*operator, left, right, token)
            }
            Expr::Index { array, index, token } => {
                let target = self.evaluate_expression(array)?;
                let index = self.evaluate_expression(index)?;
                let Value::Array(elements) = target else {
                    return Err(TinyError::runtime_error(
                        token.span.clone(),
                        format!("cannot index into {}", target.type_name()),
                    ));
                };
                let elements = elements.borrow();
                let position = array_index(&index, elements.len(), token)?;
                Ok(elements[position].clone())
            }
            Expr::Call { callee, args, token } => self.call(callee, args, token),
        }
    }

    fn call(&mut self, callee: &str, args: &[Expr], token: &Token) -> Result<Value, TinyError> {
        let resolved = self.get(callee).ok_or_else(|| {
            TinyError::runtime_error(token.span.clone(), format!("undefined function: {}", callee))
        })?;

        match resolved {
            Value::NativeFunction(native) => {
                if !native.arity.accepts(args.len()) {
                    return Err(TinyError::runtime_error(
                        token.span.clone(),
                        format!("{} expects {}, got {}", native.name, native.arity, args.len()),
                    ));
                }
                let values = self.evaluate_arguments(args)?;
                (native.func)(&mut *self.output, &values)
                    .map_err(|message| TinyError::runtime_error(token.span.clone(), message))
            }
            Value::Function(function) => {
                let expected = function.params.len();
                if args.len() != expected {
                    let problem = if args.len() > expected { "too many" } else { "too few" };
                    return Err(TinyError::runtime_error(
                        token.span.clone(),
                        format!(
                            "{} arguments for function {}: expected {}, got {}",
                            problem,
                            callee,
                            expected,
                            args.len()
                        ),
                    ));
                }

                let values = self.evaluate_arguments(args)?;
                self.call_depth += 1;
                debug!("call {} (depth {})", callee, self.call_depth);

                let flow = self.with_frame(|evaluator| {
                    for (param, value) in function.params.iter().zip(values) {
                        evaluator.environment.define(evaluator.frame, param, value);
                    }
                    evaluator.execute(&function.body)
                });

                self.call_depth -= 1;
                match flow? {
                    Flow::Return(value) => Ok(value),
                    Flow::Normal(_) => Ok(Value::Void),
                }
            }
            other => Err(TinyError::runtime_error(
                token.span.clone(),
                format!("'{}' is not a function, it is a {}", callee, other.type_name()),
            )),
        }
    }

    fn evaluate_arguments(&mut self, args: &[Expr]) -> Result<Vec<Value>, TinyError> {
        args.iter().map(|arg| self.evaluate_expression(arg)).collect()
    }
}

/// Converts an index value into a position within `len` elements.
fn array_index(index: &Value, len: usize, token: &Token) -> Result<usize, TinyError> {
    let Value::Number(n) = *index else {
        return Err(TinyError::runtime_error(
            token.span.clone(),
            format!("index must be a Number, got {}", index.type_name()),
        ));
    };
    if n.fract() != 0.0 {
        return Err(TinyError::runtime_error(
            token.span.clone(),
            format!("index must be an integer, got {}", n),
        ));
    }
    if n < 0.0 || n >= len as f64 {
        return Err(TinyError::runtime_error_with_help(
            token.span.clone(),
            format!("index out of bounds: {}", n),
            format!("The array has {} elements; valid indices are 0 to {}.", len, len as i64 - 1),
        ));
    }
    Ok(n as usize)
}

fn evaluate_unary_op(operator: UnaryOp, operand: Value, token: &Token) -> Result<Value, TinyError> {
    match (operator, operand) {
        (UnaryOp::Negate, Value::Number(n)) => Ok(Value::Number(-n)),
        (UnaryOp::Not, operand @ (Value::Number(_) | Value::String(_))) | (UnaryOp::Negate, operand) => {
            Err(TinyError::runtime_error(
                token.span.clone(),
                format!("unsupported operator '{}' for {}", operator.symbol(), operand.type_name()),
            ))
        }
        (UnaryOp::Not, operand) => Ok(Value::Boolean(!operand.is_truthy())),
    }
}

fn evaluate_binary_op(operator: BinaryOp, left: Value, right: Value, token: &Token) -> Result<Value, TinyError> {
    if !left.same_type(&right) {
        return Err(TinyError::runtime_error(
            token.span.clone(),
            format!("type mismatch: {} and {}", left.type_name(), right.type_name()),
        ));
    }

    let unsupported = |left: &Value, right: &Value| {
        TinyError::runtime_error(
            token.span.clone(),
            format!(
                "unsupported operator '{}' for {} and {}",
                operator.symbol(),
                left.type_name(),
                right.type_name()
            ),
        )
    };

    match (&left, &right) {
        (Value::Number(l), Value::Number(r)) => {
            let (l, r) = (*l, *r);
            match operator {
                BinaryOp::Add => Ok(Value::Number(l + r)),
                BinaryOp::Subtract => Ok(Value::Number(l - r)),
                BinaryOp::Multiply => Ok(Value::Number(l * r)),
                BinaryOp::Divide => {
                    if r == 0.0 {
                        Err(TinyError::runtime_error(token.span.clone(), "division by zero".to_string()))
                    } else {
                        Ok(Value::Number(l / r))
                    }
                }
                BinaryOp::Equal => Ok(Value::Boolean(l == r)),
                BinaryOp::NotEqual => Ok(Value::Boolean(l != r)),
                BinaryOp::Less => Ok(Value::Boolean(l < r)),
                BinaryOp::LessEqual => Ok(Value::Boolean(l <= r)),
                BinaryOp::Greater => Ok(Value::Boolean(l > r)),
                BinaryOp::GreaterEqual => Ok(Value::Boolean(l >= r)),
                BinaryOp::And | BinaryOp::Or => Err(unsupported(&left, &right)),
            }
        }
        (Value::String(l), Value::String(r)) => match operator {
            BinaryOp::Add => Ok(Value::String(format!("{}{}", l, r))),
            BinaryOp::Equal => Ok(Value::Boolean(l == r)),
            BinaryOp::NotEqual => Ok(Value::Boolean(l != r)),
            _ => Err(unsupported(&left, &right)),
        },
        _ => {
            let (l, r) = (left.is_truthy(), right.is_truthy());
            match operator {
                BinaryOp::Equal => Ok(Value::Boolean(l == r)),
                BinaryOp::NotEqual => Ok(Value::Boolean(l != r)),
                BinaryOp::And => Ok(Value::Boolean(l && r)),
                BinaryOp::Or => Ok(Value::Boolean(l || r)),
                _ => Err(unsupported(&left, &right)),
            }
        }
    }
}
