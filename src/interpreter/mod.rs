// File: src/interpreter/mod.rs
//
// Tree-walking interpreter for the Khwarizmi language.
// Executes type-checked programs by traversing the Abstract Syntax Tree (AST).
//
// The interpreter owns the environment (a stack of scopes, one per block),
// evaluates expressions to values, and executes statements in document
// order. Input and output go through the InputSource / OutputSink traits so
// the core never touches stdin or stdout directly.
//
// Execution stops at the first runtime or equation error.

mod environment;
mod io;
mod value;

pub use environment::{Binding, Environment};
pub use io::{Channel, InputSource, LineInput, OutputEvent, OutputSink, WriterOutput};
pub use value::Value;

use crate::ast::{BinaryOp, Block, Equation, Expr, ExprKind, Program, Stmt, StmtKind, Type, UnaryOp};
use crate::errors::{EquationError, RuntimeError, RuntimeErrorKind, SourceLocation};
use crate::solver;
use std::cmp::Ordering;
use tracing::{debug, trace};

/// The external collaborators a running program talks to
struct Io<'a> {
    input: &'a mut dyn InputSource,
    output: &'a mut dyn OutputSink,
}

impl Io<'_> {
    fn emit(&mut self, channel: Channel, text: String, location: SourceLocation) -> Result<(), RuntimeError> {
        self.output
            .emit(OutputEvent::new(channel, text))
            .map_err(|e| RuntimeError::new(RuntimeErrorKind::Output(e.to_string()), location))
    }
}

/// Interpreter state: just the variable environment
#[derive(Debug, Default)]
pub struct Interpreter {
    env: Environment,
}

impl Interpreter {
    /// Creates an interpreter with an empty global scope
    pub fn new() -> Self {
        Interpreter { env: Environment::new() }
    }

    /// Runs `program` to completion or to its first runtime error
    pub fn execute(
        &mut self,
        program: &Program,
        input: &mut dyn InputSource,
        output: &mut dyn OutputSink,
    ) -> Result<(), RuntimeError> {
        let mut io = Io { input, output };
        // The program's own block is the global scope
        for stmt in &program.body.statements {
            self.exec_stmt(stmt, &mut io)?;
        }
        debug!("program finished");
        Ok(())
    }

    fn exec_block(&mut self, block: &Block, io: &mut Io) -> Result<(), RuntimeError> {
        self.env.push_scope();
        let result = block.statements.iter().try_for_each(|stmt| self.exec_stmt(stmt, io));
        self.env.pop_scope();
        result
    }

    fn exec_stmt(&mut self, stmt: &Stmt, io: &mut Io) -> Result<(), RuntimeError> {
        let location = stmt.location;
        let at = |kind: RuntimeErrorKind| RuntimeError::new(kind, location);
        trace!(line = location.line, depth = self.env.depth(), "executing statement");

        match &stmt.kind {
            StmtKind::Declare { name, ty, init } => {
                let initial = match init {
                    Some(expr) => Some(self.eval_expr(expr)?),
                    None => None,
                };
                self.env.declare(name, *ty, initial).map_err(at)
            }

            StmtKind::DeclareEquation { name, equation } => {
                self.env.declare_equation(name, equation.clone()).map_err(at)
            }

            StmtKind::Assign { name, value } => {
                let value = self.eval_expr(value)?;
                self.env.assign(name, value).map_err(at)
            }

            StmtKind::If { branches, else_block } => {
                for (condition, block) in branches {
                    if self.eval_condition(condition)? {
                        return self.exec_block(block, io);
                    }
                }
                match else_block {
                    Some(block) => self.exec_block(block, io),
                    None => Ok(()),
                }
            }

            StmtKind::While { condition, body } => {
                while self.eval_condition(condition)? {
                    self.exec_block(body, io)?;
                }
                Ok(())
            }

            StmtKind::Print(args) => {
                let mut parts = Vec::with_capacity(args.len());
                for arg in args {
                    parts.push(self.eval_expr(arg)?.to_string());
                }
                io.emit(Channel::Print, parts.join(" "), location)
            }

            StmtKind::Show(args) => {
                let mut parts = Vec::with_capacity(args.len());
                for arg in args {
                    parts.push(format!("{} = {}", arg, self.eval_expr(arg)?));
                }
                io.emit(Channel::Show, parts.join(", "), location)
            }

            StmtKind::Input(name) => {
                let ty = self
                    .env
                    .type_of(name)
                    .ok_or_else(|| at(RuntimeErrorKind::UndefinedVariable(name.clone())))?;
                let line = io
                    .input
                    .next_line()
                    .map_err(|e| at(RuntimeErrorKind::Input(e.to_string())))?
                    .ok_or_else(|| at(RuntimeErrorKind::InputExhausted(name.clone())))?;
                let value = Value::parse(&line, ty).ok_or_else(|| {
                    at(RuntimeErrorKind::InputMismatch {
                        name: name.clone(),
                        expected: ty.to_string(),
                        text: line.trim().to_string(),
                    })
                })?;
                self.env.assign(name, value).map_err(at)
            }

            StmtKind::Solve(equation) => {
                let solution = {
                    let expr = match equation {
                        Equation::Inline(expr) => expr,
                        Equation::Named(name) => self
                            .env
                            .equation(name)
                            .ok_or_else(|| at(EquationError::UnknownEquation(name.clone()).into()))?,
                    };
                    solver::solve(expr, &self.env).map_err(at)?
                };
                debug!(unknown = %solution.unknown, value = solution.value, "solved equation");
                self.bind_solution(&solution).map_err(at)?;
                io.emit(Channel::Solve, format!("{} = {}", solution.unknown, solution.value), location)
            }

            StmtKind::Block(block) => self.exec_block(block, io),
        }
    }

    /// Stores a solved unknown, declaring it in the current scope if needed
    fn bind_solution(&mut self, solution: &solver::Solution) -> Result<(), RuntimeErrorKind> {
        let value = Value::Int(solution.value);
        if self.env.get(&solution.unknown).is_some() {
            self.env.assign(&solution.unknown, value)
        } else {
            self.env.declare(&solution.unknown, Type::Integer, Some(value))
        }
    }

    fn eval_condition(&self, condition: &Expr) -> Result<bool, RuntimeError> {
        match self.eval_expr(condition)? {
            Value::Bool(b) => Ok(b),
            other => Err(RuntimeError::new(
                RuntimeErrorKind::TypeMismatch(format!("condition must be bool, found {}", other.ty())),
                condition.location,
            )),
        }
    }

    /// Evaluates an expression against the current environment
    pub fn eval_expr(&self, expr: &Expr) -> Result<Value, RuntimeError> {
        let fail = |kind: RuntimeErrorKind| RuntimeError::new(kind, expr.location);
        match &expr.kind {
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Variable(name) => self
                .env
                .value(name)
                .ok_or_else(|| fail(RuntimeErrorKind::UndefinedVariable(name.clone()))),

            ExprKind::Unary { op, operand } => match (op, self.eval_expr(operand)?) {
                (UnaryOp::Neg, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
                (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                (op, value) => Err(fail(RuntimeErrorKind::TypeMismatch(format!(
                    "cannot apply '{}' to {}",
                    op.symbol(),
                    value.ty()
                )))),
            },

            // Logical operators short-circuit
            ExprKind::Binary { op: op @ (BinaryOp::And | BinaryOp::Or), left, right } => {
                let short = *op == BinaryOp::Or;
                match self.eval_expr(left)? {
                    Value::Bool(b) if b == short => Ok(Value::Bool(short)),
                    Value::Bool(_) => match self.eval_expr(right)? {
                        Value::Bool(b) => Ok(Value::Bool(b)),
                        other => Err(fail(RuntimeErrorKind::TypeMismatch(format!(
                            "operand of '{}' must be bool, found {}",
                            op.symbol(),
                            other.ty()
                        )))),
                    },
                    other => Err(fail(RuntimeErrorKind::TypeMismatch(format!(
                        "operand of '{}' must be bool, found {}",
                        op.symbol(),
                        other.ty()
                    )))),
                }
            }

            ExprKind::Binary { op, left, right } => {
                let l = self.eval_expr(left)?;
                let r = self.eval_expr(right)?;
                binary_op(*op, l, r).map_err(fail)
            }
        }
    }
}

/// Applies a non-logical binary operator to two evaluated operands
fn binary_op(op: BinaryOp, left: Value, right: Value) -> Result<Value, RuntimeErrorKind> {
    if op.is_arithmetic() {
        let (Value::Int(a), Value::Int(b)) = (left, right) else {
            return Err(RuntimeErrorKind::TypeMismatch(format!(
                "'{}' needs int operands, found {} and {}",
                op.symbol(),
                left.ty(),
                right.ty()
            )));
        };
        let result = match op {
            BinaryOp::Add => a.wrapping_add(b),
            BinaryOp::Sub => a.wrapping_sub(b),
            BinaryOp::Mul => a.wrapping_mul(b),
            _ => {
                if b == 0 {
                    return Err(RuntimeErrorKind::DivisionByZero);
                }
                a.wrapping_div(b)
            }
        };
        return Ok(Value::Int(result));
    }

    let ordering = left.compare(&right).ok_or_else(|| {
        RuntimeErrorKind::TypeMismatch(format!(
            "cannot compare {} with {}",
            left.ty(),
            right.ty()
        ))
    })?;
    let result = match op {
        BinaryOp::Eq => ordering == Ordering::Equal,
        BinaryOp::Ne => ordering != Ordering::Equal,
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::Le => ordering != Ordering::Greater,
        _ => ordering != Ordering::Less,
    };
    Ok(Value::Bool(result))
}
