// File: src/solver.rs
//
// Linear equation solver behind the `solve` statement.
//
// Each side of `left == right` is folded into the form `a*x + b`, where x is
// the single unknown and every other variable is read from the environment
// as a constant. The equation then reduces to `(a_l - a_r) * x = b_r - b_l`.
//
// Integer-only: a quotient that is not exact is reported as having no
// integer solution instead of being rounded.

use crate::ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use crate::errors::{EquationError, RuntimeErrorKind};
use crate::interpreter::{Environment, Value};
use tracing::debug;

/// `coefficient * unknown + constant`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearForm {
    pub coefficient: i64,
    pub constant: i64,
}

impl LinearForm {
    pub fn constant(value: i64) -> Self {
        LinearForm { coefficient: 0, constant: value }
    }

    pub fn unknown() -> Self {
        LinearForm { coefficient: 1, constant: 0 }
    }

    fn add(self, other: LinearForm) -> Self {
        LinearForm {
            coefficient: self.coefficient.wrapping_add(other.coefficient),
            constant: self.constant.wrapping_add(other.constant),
        }
    }

    fn negate(self) -> Self {
        LinearForm {
            coefficient: self.coefficient.wrapping_neg(),
            constant: self.constant.wrapping_neg(),
        }
    }

    /// Product of two forms where at most one mentions the unknown
    fn scale(self, other: LinearForm) -> Self {
        LinearForm {
            coefficient: self
                .coefficient
                .wrapping_mul(other.constant)
                .wrapping_add(other.coefficient.wrapping_mul(self.constant)),
            constant: self.constant.wrapping_mul(other.constant),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub unknown: String,
    pub value: i64,
}

/// Picks the single variable of `equation` that does not already hold a value.
///
/// Variables that are set act as constants; undeclared names and variables
/// declared without a value are candidates for the unknown.
pub fn find_unknown(equation: &Expr, env: &Environment) -> Result<String, EquationError> {
    let candidates: Vec<String> = equation
        .variables()
        .into_iter()
        .filter(|name| !env.is_set(name))
        .map(str::to_string)
        .collect();

    match candidates.len() {
        0 => Err(EquationError::NoUnknown),
        1 => Ok(candidates.into_iter().next().unwrap_or_default()),
        _ => Err(EquationError::MultipleUnknowns(candidates)),
    }
}

/// Folds `expr` into `a*unknown + b` by structural recursion
pub fn linearize(expr: &Expr, unknown: &str, env: &Environment) -> Result<LinearForm, RuntimeErrorKind> {
    match &expr.kind {
        ExprKind::Int(n) => Ok(LinearForm::constant(*n)),

        ExprKind::Bool(_) => Err(EquationError::Unsupported("boolean value in equation".into()).into()),

        ExprKind::Variable(name) if name == unknown => Ok(LinearForm::unknown()),

        ExprKind::Variable(name) => match env.value(name) {
            Some(Value::Int(n)) => Ok(LinearForm::constant(n)),
            Some(Value::Bool(_)) => {
                Err(EquationError::Unsupported(format!("boolean variable '{}' in equation", name)).into())
            }
            None => Err(RuntimeErrorKind::UndefinedVariable(name.clone())),
        },

        ExprKind::Unary { op: UnaryOp::Neg, operand } => Ok(linearize(operand, unknown, env)?.negate()),

        ExprKind::Binary { op: BinaryOp::Add, left, right } => {
            Ok(linearize(left, unknown, env)?.add(linearize(right, unknown, env)?))
        }

        ExprKind::Binary { op: BinaryOp::Sub, left, right } => {
            Ok(linearize(left, unknown, env)?.add(linearize(right, unknown, env)?.negate()))
        }

        ExprKind::Binary { op: BinaryOp::Mul, left, right } => {
            if left.mentions(unknown) && right.mentions(unknown) {
                return Err(EquationError::NonLinear(unknown.to_string()).into());
            }
            Ok(linearize(left, unknown, env)?.scale(linearize(right, unknown, env)?))
        }

        ExprKind::Binary { op: BinaryOp::Div, left, right } => {
            if right.mentions(unknown) {
                return Err(EquationError::Unsupported(format!(
                    "division by an expression containing '{}'",
                    unknown
                ))
                .into());
            }
            let divisor = linearize(right, unknown, env)?.constant;
            if divisor == 0 {
                return Err(RuntimeErrorKind::DivisionByZero);
            }
            let dividend = linearize(left, unknown, env)?;
            if dividend.coefficient == 0 {
                return Ok(LinearForm::constant(dividend.constant.wrapping_div(divisor)));
            }
            if dividend.coefficient.wrapping_rem(divisor) != 0 || dividend.constant.wrapping_rem(divisor) != 0 {
                return Err(EquationError::Unsupported(format!(
                    "'{}' is not exactly divisible by {}",
                    left, divisor
                ))
                .into());
            }
            Ok(LinearForm {
                coefficient: dividend.coefficient.wrapping_div(divisor),
                constant: dividend.constant.wrapping_div(divisor),
            })
        }

        ExprKind::Unary { op: UnaryOp::Not, .. } | ExprKind::Binary { .. } => Err(EquationError::Unsupported(
            format!("'{}' is not an arithmetic expression", expr),
        )
        .into()),
    }
}

/// Solves `equation` for `unknown`, treating every other variable as a constant
pub fn solve_for(equation: &Expr, unknown: &str, env: &Environment) -> Result<i64, RuntimeErrorKind> {
    let ExprKind::Binary { op: BinaryOp::Eq, left, right } = &equation.kind else {
        return Err(EquationError::NotAnEquation.into());
    };

    let lhs = linearize(left, unknown, env)?;
    let rhs = linearize(right, unknown, env)?;
    debug!(?lhs, ?rhs, unknown, "linearized equation");

    let coefficient = lhs.coefficient.wrapping_sub(rhs.coefficient);
    let constant = rhs.constant.wrapping_sub(lhs.constant);

    if coefficient == 0 {
        let rendered = equation.to_string();
        let err = if constant == 0 {
            EquationError::Identity(rendered)
        } else {
            EquationError::Contradiction(rendered)
        };
        return Err(err.into());
    }

    if constant.wrapping_rem(coefficient) != 0 {
        return Err(EquationError::NoIntegerSolution {
            unknown: unknown.to_string(),
            coefficient,
            constant,
        }
        .into());
    }

    Ok(constant.wrapping_div(coefficient))
}

/// Finds the unknown of `equation` and solves for it
pub fn solve(equation: &Expr, env: &Environment) -> Result<Solution, RuntimeErrorKind> {
    if !matches!(equation.kind, ExprKind::Binary { op: BinaryOp::Eq, .. }) {
        return Err(EquationError::NotAnEquation.into());
    }
    let unknown = find_unknown(equation, env)?;
    let value = solve_for(equation, &unknown, env)?;
    Ok(Solution { unknown, value })
}
