// File: src/interpreter/environment.rs
//
// Lexical scoping environment for variable management in the Khwarizmi interpreter.
// Implements a stack of scopes where inner scopes shadow outer scopes.

use super::value::Value;
use crate::ast::{Expr, Type};
use crate::errors::RuntimeErrorKind;
use std::collections::HashMap;

/// What a name is bound to in one scope
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// A typed variable. `set` is false until it receives a value from an
    /// initializer, assignment, input, or solve.
    Variable { ty: Type, value: Value, set: bool },
    /// A named equation from an `eq` declaration
    Equation(Expr),
}

/// Variable storage using lexical scoping
///
/// The Environment maintains a stack of scopes (Vec<HashMap>). When looking up
/// a variable, we search from the innermost scope (end of Vec) outward. This
/// implements proper lexical scoping with shadowing.
///
/// # Examples
///
/// ```
/// use khwarizmi::ast::Type;
/// use khwarizmi::interpreter::{Environment, Value};
///
/// let mut env = Environment::new();
/// env.declare("x", Type::Integer, Some(Value::Int(10))).unwrap();
///
/// env.push_scope();
/// env.declare("x", Type::Integer, Some(Value::Int(20))).unwrap();
/// assert_eq!(env.value("x"), Some(Value::Int(20)));
///
/// env.pop_scope();
/// assert_eq!(env.value("x"), Some(Value::Int(10)));
/// ```
#[derive(Clone, Debug)]
pub struct Environment {
    scopes: Vec<HashMap<String, Binding>>,
}

impl Environment {
    /// Create a new environment with a single global scope
    pub fn new() -> Self {
        Environment { scopes: vec![HashMap::new()] }
    }

    /// Push a new scope onto the stack (entering a block)
    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pop the innermost scope from the stack; the global scope is never popped
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Number of open scopes, the global one included
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Find a binding, searching from inner to outer scopes
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Current value of a variable
    pub fn value(&self, name: &str) -> Option<Value> {
        match self.get(name)? {
            Binding::Variable { value, .. } => Some(*value),
            Binding::Equation(_) => None,
        }
    }

    /// Declared type of a variable
    pub fn type_of(&self, name: &str) -> Option<Type> {
        match self.get(name)? {
            Binding::Variable { ty, .. } => Some(*ty),
            Binding::Equation(_) => None,
        }
    }

    /// True when `name` is a variable that holds a value of its own
    pub fn is_set(&self, name: &str) -> bool {
        matches!(self.get(name), Some(Binding::Variable { set: true, .. }))
    }

    pub fn equation(&self, name: &str) -> Option<&Expr> {
        match self.get(name)? {
            Binding::Equation(expr) => Some(expr),
            Binding::Variable { .. } => None,
        }
    }

    fn bind(&mut self, name: &str, binding: Binding) -> Result<(), RuntimeErrorKind> {
        let scope = self
            .scopes
            .last_mut()
            .ok_or_else(|| RuntimeErrorKind::UndefinedVariable(name.to_string()))?;
        if scope.contains_key(name) {
            return Err(RuntimeErrorKind::Redeclared(name.to_string()));
        }
        scope.insert(name.to_string(), binding);
        Ok(())
    }

    /// Define a new variable in the current (innermost) scope.
    ///
    /// Without an initial value the variable holds its type's default and is
    /// left unset.
    pub fn declare(&mut self, name: &str, ty: Type, initial: Option<Value>) -> Result<(), RuntimeErrorKind> {
        let binding = match initial {
            Some(value) => Binding::Variable { ty, value, set: true },
            None => Binding::Variable { ty, value: Value::default_for(ty), set: false },
        };
        self.bind(name, binding)
    }

    /// Define a named equation in the current scope
    pub fn declare_equation(&mut self, name: &str, equation: Expr) -> Result<(), RuntimeErrorKind> {
        self.bind(name, Binding::Equation(equation))
    }

    /// Set an existing variable, searching from inner to outer scopes
    pub fn assign(&mut self, name: &str, new_value: Value) -> Result<(), RuntimeErrorKind> {
        for scope in self.scopes.iter_mut().rev() {
            match scope.get_mut(name) {
                Some(Binding::Variable { ty, value, set }) => {
                    if *ty != new_value.ty() {
                        return Err(RuntimeErrorKind::TypeMismatch(format!(
                            "cannot assign {} to variable '{}' of type {}",
                            new_value.ty(),
                            name,
                            ty
                        )));
                    }
                    *value = new_value;
                    *set = true;
                    return Ok(());
                }
                Some(Binding::Equation(_)) => {
                    return Err(RuntimeErrorKind::TypeMismatch(format!(
                        "cannot assign to equation '{}'",
                        name
                    )));
                }
                None => {}
            }
        }
        Err(RuntimeErrorKind::UndefinedVariable(name.to_string()))
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_without_initializer_is_unset_default() {
        let mut env = Environment::new();
        env.declare("x", Type::Integer, None).unwrap();
        env.declare("b", Type::Boolean, None).unwrap();
        assert_eq!(env.value("x"), Some(Value::Int(0)));
        assert_eq!(env.value("b"), Some(Value::Bool(false)));
        assert!(!env.is_set("x"));

        env.assign("x", Value::Int(4)).unwrap();
        assert!(env.is_set("x"));
    }

    #[test]
    fn test_redeclaration_in_same_scope_fails() {
        let mut env = Environment::new();
        env.declare("x", Type::Integer, None).unwrap();
        assert_eq!(
            env.declare("x", Type::Boolean, None),
            Err(RuntimeErrorKind::Redeclared("x".into()))
        );
    }

    #[test]
    fn test_assign_updates_outer_scope() {
        let mut env = Environment::new();
        env.declare("x", Type::Integer, Some(Value::Int(1))).unwrap();
        env.push_scope();
        env.assign("x", Value::Int(2)).unwrap();
        env.pop_scope();
        assert_eq!(env.value("x"), Some(Value::Int(2)));
    }

    #[test]
    fn test_assign_checks_type_and_existence() {
        let mut env = Environment::new();
        env.declare("x", Type::Integer, None).unwrap();
        assert!(matches!(
            env.assign("x", Value::Bool(true)),
            Err(RuntimeErrorKind::TypeMismatch(_))
        ));
        assert_eq!(
            env.assign("y", Value::Int(1)),
            Err(RuntimeErrorKind::UndefinedVariable("y".into()))
        );
    }

    #[test]
    fn test_global_scope_is_never_popped() {
        let mut env = Environment::new();
        env.pop_scope();
        assert_eq!(env.depth(), 1);
    }
}
