// File: src/interpreter/value.rs
//
// Runtime value types for the Khwarizmi language.

use crate::ast::Type;
use std::cmp::Ordering;
use std::fmt;

/// A runtime value. Every value has exactly one static [`Type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Bool(bool),
}

impl Value {
    pub fn ty(&self) -> Type {
        match self {
            Value::Int(_) => Type::Integer,
            Value::Bool(_) => Type::Boolean,
        }
    }

    /// Value bound by a declaration without an initializer
    pub fn default_for(ty: Type) -> Value {
        match ty {
            Type::Integer => Value::Int(0),
            Type::Boolean => Value::Bool(false),
        }
    }

    /// Parses one line of external input as a value of type `ty`
    pub fn parse(text: &str, ty: Type) -> Option<Value> {
        let text = text.trim();
        match ty {
            Type::Integer => text.parse().ok().map(Value::Int),
            Type::Boolean => match text {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
        }
    }

    /// Orders two values of the same type; `None` when the types differ
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}
