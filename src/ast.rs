// File: src/ast.rs
//
// Abstract Syntax Tree (AST) definitions for the Khwarizmi language.
// Defines the structure of parsed Khwarizmi programs.
//
// Expressions (Expr) represent values and computations, while statements
// (Stmt) represent actions and control flow. The tree is exclusively owned:
// each node owns its children and nothing points back up.

use crate::errors::SourceLocation;
use std::fmt;

/// Static types of the language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Integer,
    Boolean,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Type::Integer => write!(f, "int"),
            Type::Boolean => write!(f, "bool"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Binding strength, higher binds tighter. All levels are left-associative.
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::Ne => 3,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div => 6,
        }
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div)
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Int(i64),
    Bool(bool),
    Variable(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

/// An expression node. `ty` is `None` until the type checker has visited it.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub location: SourceLocation,
    pub ty: Option<Type>,
}

impl Expr {
    pub fn new(kind: ExprKind, location: SourceLocation) -> Self {
        Expr { kind, location, ty: None }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        let location = left.location;
        Expr::new(ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) }, location)
    }

    /// Calls `f` with every variable name referenced in this expression, in order
    pub fn visit_variables<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        match &self.kind {
            ExprKind::Int(_) | ExprKind::Bool(_) => {}
            ExprKind::Variable(name) => f(name),
            ExprKind::Unary { operand, .. } => operand.visit_variables(f),
            ExprKind::Binary { left, right, .. } => {
                left.visit_variables(f);
                right.visit_variables(f);
            }
        }
    }

    /// Distinct variable names in first-occurrence order
    pub fn variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        self.visit_variables(&mut |name| {
            if !names.contains(&name) {
                names.push(name);
            }
        });
        names
    }

    pub fn mentions(&self, name: &str) -> bool {
        let mut found = false;
        self.visit_variables(&mut |n| found |= n == name);
        found
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter, parent: BinaryOp, right_side: bool) -> fmt::Result {
        let needs_parens = match &self.kind {
            ExprKind::Binary { op, .. } => {
                op.precedence() < parent.precedence()
                    || (right_side && op.precedence() == parent.precedence())
            }
            _ => false,
        };
        if needs_parens {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

/// Renders the expression back to source form with the minimum parentheses
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            ExprKind::Int(n) => write!(f, "{}", n),
            ExprKind::Bool(b) => write!(f, "{}", b),
            ExprKind::Variable(name) => write!(f, "{}", name),
            ExprKind::Unary { op, operand } => match operand.kind {
                ExprKind::Binary { .. } => write!(f, "{}({})", op.symbol(), operand),
                _ => write!(f, "{}{}", op.symbol(), operand),
            },
            ExprKind::Binary { op, left, right } => {
                left.fmt_operand(f, *op, false)?;
                write!(f, " {} ", op.symbol())?;
                right.fmt_operand(f, *op, true)
            }
        }
    }
}

/// The relation handed to `solve`
#[derive(Debug, Clone, PartialEq)]
pub enum Equation {
    /// Written out in the statement: `solve x + 2 == 5`
    Inline(Expr),
    /// Refers to an `eq` declaration: `solve e`
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `int x` / `bool b = true`
    Declare {
        name: String,
        ty: Type,
        init: Option<Expr>,
    },
    /// `eq e = 2 * x == 8`
    DeclareEquation {
        name: String,
        equation: Expr,
    },
    Assign {
        name: String,
        value: Expr,
    },
    /// `if` plus any `elif` arms, in source order, then an optional `else`
    If {
        branches: Vec<(Expr, Block)>,
        else_block: Option<Block>,
    },
    While {
        condition: Expr,
        body: Block,
    },
    Print(Vec<Expr>),
    Show(Vec<Expr>),
    Input(String),
    Solve(Equation),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub location: SourceLocation,
}

impl Stmt {
    pub fn new(kind: StmtKind, location: SourceLocation) -> Self {
        Stmt { kind, location }
    }
}

/// A whole program: the statements of its outermost `begin … end` block
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub body: Block,
}
