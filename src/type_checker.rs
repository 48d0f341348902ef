// File: src/type_checker.rs
//
// Type checker for the Khwarizmi language.
// Walks the AST before execution, annotates every expression with its static
// type, and rejects ill-typed programs.
//
// Rules enforced:
// - Every variable reference resolves to a prior declaration in scope
// - Assignments and initializers match the declared type exactly
// - Arithmetic needs int operands, logic needs bool operands
// - Comparisons need operands of the same type and produce bool
// - if/elif/while conditions are bool
// - solve/eq relations are `int == int`, with at most one undeclared unknown
//
// Errors are collected rather than returned at the first failure so that a
// single compile reports every problem it can find.

use crate::ast::{BinaryOp, Block, Equation, Expr, ExprKind, Program, Stmt, StmtKind, Type, UnaryOp};
use crate::errors::{find_closest_match, Diagnostic, SourceLocation};
use std::collections::HashMap;
use tracing::debug;

/// What a name in scope refers to
#[derive(Debug, Clone, PartialEq)]
enum Symbol {
	Variable(Type),
	/// An `eq` declaration: every name its relation mentions, and which of
	/// those were undeclared when it was declared
	Equation { variables: Vec<String>, unknowns: Vec<String> },
}

/// Type checker maintains a stack of scopes, one per nested block
pub struct TypeChecker {
	/// Innermost scope is last
	scopes: Vec<HashMap<String, Symbol>>,
	/// Undeclared names seen while checking an equation; `None` outside one
	equation_unknowns: Option<Vec<String>>,
	/// Collect errors instead of failing immediately
	errors: Vec<Diagnostic>,
}

impl Default for TypeChecker {
	fn default() -> Self {
		Self::new()
	}
}

impl TypeChecker {
	/// Creates a new type checker with an empty global scope
	pub fn new() -> Self {
		TypeChecker {
			scopes: vec![HashMap::new()],
			equation_unknowns: None,
			errors: Vec::new(),
		}
	}

	/// Type check a whole program, filling in `Expr::ty` along the way
	///
	/// Returns Ok(()) if type checking succeeds, or Err with collected errors
	pub fn check(&mut self, program: &mut Program) -> Result<(), Vec<Diagnostic>> {
		// The program's own block is the global scope
		for stmt in &mut program.body.statements {
			self.check_stmt(stmt);
		}

		if self.errors.is_empty() {
			debug!("type check passed");
			Ok(())
		} else {
			Err(std::mem::take(&mut self.errors))
		}
	}

	fn error(&mut self, message: String, location: SourceLocation) {
		self.errors.push(Diagnostic::type_error(message, location));
	}

	fn lookup(&self, name: &str) -> Option<&Symbol> {
		self.scopes.iter().rev().find_map(|scope| scope.get(name))
	}

	/// Every name in scope, sorted so suggestions do not depend on hash order
	fn visible_names(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self
			.scopes
			.iter()
			.flat_map(|scope| scope.keys().map(String::as_str))
			.collect();
		names.sort_unstable();
		names.dedup();
		names
	}

	/// Declares `name` in the innermost scope, rejecting redeclaration there
	fn declare(&mut self, name: &str, symbol: Symbol, location: SourceLocation) {
		let scope = match self.scopes.last_mut() {
			Some(scope) => scope,
			None => return,
		};
		if scope.contains_key(name) {
			self.error(format!("variable '{}' is already declared in this scope", name), location);
			return;
		}
		scope.insert(name.to_string(), symbol);
	}

	fn check_block(&mut self, block: &mut Block) {
		self.scopes.push(HashMap::new());
		for stmt in &mut block.statements {
			self.check_stmt(stmt);
		}
		self.scopes.pop();
	}

	/// Check that `expr` has type `expected`, reporting `context` otherwise
	fn expect_type(&mut self, expr: &mut Expr, expected: Type, context: &str) {
		if let Some(actual) = self.check_expr(expr) {
			if actual != expected {
				self.error(
					format!("{} must be {}, found {}", context, expected, actual),
					expr.location,
				);
			}
		}
	}

	/// Check a single statement
	fn check_stmt(&mut self, stmt: &mut Stmt) {
		let location = stmt.location;
		match &mut stmt.kind {
			StmtKind::Declare { name, ty, init } => {
				if let Some(init) = init {
					let context = format!("initializer of '{}'", name);
					self.expect_type(init, *ty, &context);
				}
				self.declare(name, Symbol::Variable(*ty), location);
			}

			StmtKind::DeclareEquation { name, equation } => {
				let unknowns = self.check_equation(equation);
				let variables = equation.variables().into_iter().map(str::to_string).collect();
				self.declare(name, Symbol::Equation { variables, unknowns }, location);
			}

			StmtKind::Assign { name, value } => {
				let value_type = self.check_expr(value);
				match self.lookup(name).cloned() {
					Some(Symbol::Variable(declared)) => {
						if let Some(actual) = value_type {
							if actual != declared {
								self.error(
									format!(
										"type mismatch: cannot assign {} to variable '{}' of type {}",
										actual, name, declared
									),
									value.location,
								);
							}
						}
					}
					Some(Symbol::Equation { .. }) => {
						self.error(format!("cannot assign to equation '{}'", name), location);
					}
					None => self.undeclared(name, location),
				}
			}

			StmtKind::If { branches, else_block } => {
				for (condition, block) in branches.iter_mut() {
					self.expect_type(condition, Type::Boolean, "if condition");
					self.check_block(block);
				}
				if let Some(block) = else_block {
					self.check_block(block);
				}
			}

			StmtKind::While { condition, body } => {
				self.expect_type(condition, Type::Boolean, "while condition");
				self.check_block(body);
			}

			StmtKind::Print(args) | StmtKind::Show(args) => {
				for arg in args.iter_mut() {
					self.check_expr(arg);
				}
			}

			StmtKind::Input(name) => match self.lookup(name) {
				Some(Symbol::Variable(_)) => {}
				Some(Symbol::Equation { .. }) => {
					self.error(format!("cannot read input into equation '{}'", name), location);
				}
				None => self.undeclared(name, location),
			},

			StmtKind::Solve(Equation::Inline(equation)) => {
				let unknowns = self.check_equation(equation);
				self.declare_unknowns(&unknowns, location);
			}

			StmtKind::Solve(Equation::Named(name)) => match self.lookup(name).cloned() {
				Some(Symbol::Equation { variables, unknowns }) => {
					self.recheck_equation(name, &variables, location);
					self.declare_unknowns(&unknowns, location);
				}
				Some(Symbol::Variable(_)) => {
					self.error(format!("'{}' is a variable, not an equation", name), location);
				}
				None => self.undeclared(name, location),
			},

			StmtKind::Block(block) => self.check_block(block),
		}
	}

	fn undeclared(&mut self, name: &str, location: SourceLocation) {
		let mut diag = Diagnostic::type_error(format!("variable '{}' is not declared", name), location)
			.with_help(format!("declare it first, e.g. 'int {}'", name));
		if let Some(suggestion) = find_closest_match(name, self.visible_names()) {
			diag = diag.with_suggestion(suggestion.to_string());
		}
		self.errors.push(diag);
	}

	/// Unknowns of a solved equation become int variables of the current scope
	fn declare_unknowns(&mut self, unknowns: &[String], location: SourceLocation) {
		for name in unknowns {
			if self.lookup(name).is_none() {
				self.declare(name, Symbol::Variable(Type::Integer), location);
			}
		}
	}

	/// A named equation is solved against the scope at the `solve`, where its
	/// names may since have been declared or shadowed with another type
	fn recheck_equation(&mut self, equation: &str, variables: &[String], location: SourceLocation) {
		for name in variables {
			match self.lookup(name) {
				None | Some(Symbol::Variable(Type::Integer)) => {}
				Some(Symbol::Variable(ty)) => {
					let message = format!(
						"'{}' in equation '{}' must be int at this solve, found {}",
						name, equation, ty
					);
					self.error(message, location);
				}
				Some(Symbol::Equation { .. }) => {
					let message = format!("'{}' in equation '{}' now names an equation", name, equation);
					self.error(message, location);
				}
			}
		}
	}

	/// Checks a `left == right` relation over ints, returning its undeclared names
	fn check_equation(&mut self, equation: &mut Expr) -> Vec<String> {
		let location = equation.location;
		let ExprKind::Binary { op: BinaryOp::Eq, left, right } = &mut equation.kind else {
			self.error("expected an equation of the form 'left == right'".to_string(), location);
			return Vec::new();
		};

		self.equation_unknowns = Some(Vec::new());
		self.expect_type(left, Type::Integer, "left side of equation");
		self.expect_type(right, Type::Integer, "right side of equation");
		let unknowns = self.equation_unknowns.take().unwrap_or_default();
		equation.ty = Some(Type::Boolean);

		if unknowns.len() > 1 {
			self.error(
				format!("equation has more than one unknown: {}", unknowns.join(", ")),
				location,
			);
		}
		unknowns
	}

	/// Infer the type of an expression and record it on the node
	fn check_expr(&mut self, expr: &mut Expr) -> Option<Type> {
		let location = expr.location;
		let ty = match &mut expr.kind {
			ExprKind::Int(_) => Some(Type::Integer),

			ExprKind::Bool(_) => Some(Type::Boolean),

			ExprKind::Variable(name) => match self.lookup(name) {
				Some(Symbol::Variable(ty)) => Some(*ty),
				Some(Symbol::Equation { .. }) => {
					self.error(format!("equation '{}' cannot be used as a value", name), location);
					None
				}
				None => match self.equation_unknowns.as_mut() {
					Some(unknowns) => {
						if !unknowns.contains(name) {
							unknowns.push(name.clone());
						}
						Some(Type::Integer)
					}
					None => {
						self.undeclared(name, location);
						None
					}
				},
			},

			ExprKind::Unary { op, operand } => {
				let (expected, context) = match op {
					UnaryOp::Neg => (Type::Integer, "operand of unary '-'"),
					UnaryOp::Not => (Type::Boolean, "operand of '!'"),
				};
				self.expect_type(operand, expected, context);
				Some(expected)
			}

			ExprKind::Binary { op, left, right } => {
				let op = *op;
				if op.is_arithmetic() || op.is_logical() {
					let operand = if op.is_arithmetic() { Type::Integer } else { Type::Boolean };
					let context = format!("operand of '{}'", op.symbol());
					self.expect_type(left, operand, &context);
					self.expect_type(right, operand, &context);
					Some(operand)
				} else {
					let left_type = self.check_expr(left);
					let right_type = self.check_expr(right);
					if let (Some(l), Some(r)) = (left_type, right_type) {
						if l != r {
							self.error(
								format!(
									"comparison '{}' between incompatible types: {} and {}",
									op.symbol(),
									l,
									r
								),
								location,
							);
						}
					}
					Some(Type::Boolean)
				}
			}
		};
		expr.ty = ty;
		ty
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::errors::Severity;
	use crate::lexer::tokenize;
	use crate::parser::Parser;

	fn check(source: &str) -> Result<Program, Vec<Diagnostic>> {
		let mut program = Parser::new(tokenize(source)).parse().expect("program should parse");
		TypeChecker::new().check(&mut program)?;
		Ok(program)
	}

	fn messages(source: &str) -> Vec<String> {
		check(source).unwrap_err().into_iter().map(|d| d.message).collect()
	}

	#[test]
	fn test_annotates_every_expression() {
		let program = check("begin\n int x = 1 + 2\n bool b = x < 3 && !false\nend").unwrap();
		for stmt in &program.body.statements {
			if let StmtKind::Declare { init: Some(init), .. } = &stmt.kind {
				let mut all_typed = true;
				fn walk(e: &Expr, ok: &mut bool) {
					*ok &= e.ty.is_some();
					match &e.kind {
						ExprKind::Unary { operand, .. } => walk(operand, ok),
						ExprKind::Binary { left, right, .. } => {
							walk(left, ok);
							walk(right, ok);
						}
						_ => {}
					}
				}
				walk(init, &mut all_typed);
				assert!(all_typed);
			}
		}
	}

	#[test]
	fn test_assignment_type_mismatch_both_ways() {
		assert!(messages("begin\n int x\n x = true\nend")[0].contains("cannot assign bool"));
		assert!(messages("begin\n bool b\n b = 1\nend")[0].contains("cannot assign int"));
		assert!(messages("begin\n int x = false\nend")[0].contains("initializer of 'x'"));
	}

	#[test]
	fn test_redeclaration_rejected() {
		let errors = check("begin\n int x\n bool x\nend").unwrap_err();
		assert_eq!(errors.len(), 1);
		assert_eq!(errors[0].severity, Severity::Type);
		assert!(errors[0].message.contains("already declared"));
	}

	#[test]
	fn test_shadowing_in_inner_block_is_allowed() {
		assert!(check("begin\n int x\n begin\n  bool x = true\n end\n x = 2\nend").is_ok());
	}

	#[test]
	fn test_inner_declarations_do_not_leak() {
		assert!(messages("begin\n begin\n  int y\n end\n y = 2\nend")[0].contains("not declared"));
	}

	#[test]
	fn test_undeclared_variable_gets_suggestion() {
		let errors = check("begin\n int count\n print cout\nend").unwrap_err();
		assert_eq!(errors[0].suggestion.as_deref(), Some("count"));
	}

	#[test]
	fn test_operator_rules() {
		assert!(messages("begin\n print 1 + true\nend")[0].contains("operand of '+'"));
		assert!(messages("begin\n print true && 1\nend")[0].contains("operand of '&&'"));
		assert!(messages("begin\n print -true\nend")[0].contains("unary '-'"));
		assert!(messages("begin\n print !1\nend")[0].contains("operand of '!'"));
		assert!(messages("begin\n print 1 == true\nend")[0].contains("incompatible types"));
		assert!(check("begin\n print true == false\n print true < false\nend").is_ok());
	}

	#[test]
	fn test_conditions_must_be_boolean() {
		assert!(messages("begin\n if 1 begin\n end\nend")[0].contains("if condition"));
		assert!(messages("begin\n while 0 begin\n end\nend")[0].contains("while condition"));
	}

	#[test]
	fn test_collects_all_errors() {
		let errors = check("begin\n int x = true\n bool y = 3\n print z\nend").unwrap_err();
		assert_eq!(errors.len(), 3);
	}

	#[test]
	fn test_solve_declares_unknown() {
		assert!(check("begin\n solve x + 2 == 5\n print x\nend").is_ok());
		assert!(check("begin\n eq e = 2 * y == 8\n solve e\n print y\nend").is_ok());
	}

	#[test]
	fn test_equation_rules() {
		assert!(messages("begin\n solve x < 5\nend")[0].contains("left == right"));
		assert!(messages("begin\n solve x + y == 5\nend")[0].contains("more than one unknown"));
		assert!(messages("begin\n bool b\n solve b == true\nend")[0].contains("left side of equation"));
		assert!(messages("begin\n int x\n solve x\nend")[0].contains("not an equation"));
		assert!(messages("begin\n eq e = x == 1\n print e\nend")[0].contains("cannot be used as a value"));
	}

	#[test]
	fn test_named_solve_rejects_unknown_redeclared_as_bool() {
		let errors = messages("begin\n eq e = y == 3\n bool y\n solve e\nend");
		assert_eq!(errors.len(), 1);
		assert!(errors[0].contains("'y' in equation 'e' must be int"));
	}

	#[test]
	fn test_named_solve_rejects_shadowed_constant() {
		let errors = messages("begin\n int k = 2\n eq e = k * y == 8\n begin\n  bool k\n  solve e\n end\nend");
		assert!(errors[0].contains("'k' in equation 'e'"));
		assert!(check("begin\n eq e = y == 3\n int y\n solve e\n print y\nend").is_ok());
	}

	#[test]
	fn test_suggestion_ties_break_alphabetically() {
		let source = "begin\n int af\n int ac\n int ae\n int ab\n print ad\nend";
		for _ in 0..50 {
			let errors = check(source).unwrap_err();
			assert_eq!(errors[0].suggestion.as_deref(), Some("ab"));
		}
	}
}
