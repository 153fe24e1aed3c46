//! Conversion between terms and host values.
//!
//! Host values are `serde_json::Value`s: numbers, strings, booleans, null
//! and (nested) arrays map onto constants and lists. Objects have no term
//! counterpart and are rejected with `UnsupportedValue`.
//!
//! The reverse direction only succeeds for fully resolved data: a list
//! whose tail is still unknown is a `MalformedList`, and compound terms or
//! unbound variables are `NotHostValue`.

use std::sync::Arc;

use serde_json::{Number, Value};

use super::{Const, Term};
use crate::error::{LogicError, Result};

impl Term {
    /// Lift a host value into the term model
    pub fn from_json(value: &Value) -> Result<Term> {
        match value {
            Value::Null => Ok(Term::Const(Const::Null)),
            Value::Bool(b) => Ok(Term::Const(Const::Bool(*b))),
            Value::Number(n) => number_to_const(n).map(Term::Const),
            Value::String(s) => Ok(Term::Const(Const::Str(Arc::from(s.as_str())))),
            Value::Array(items) => {
                let items = items.iter().map(Term::from_json).collect::<Result<Vec<_>>>()?;
                Ok(Term::list(items))
            }
            Value::Object(_) => Err(LogicError::UnsupportedValue(value.to_string())),
        }
    }

    /// Lower a resolved term back into a host value
    pub fn to_json(&self) -> Result<Value> {
        match self {
            Term::Const(c) => const_to_json(c),
            Term::List(list) => {
                let items = list.to_vec()?;
                Ok(Value::Array(items.iter().map(Term::to_json).collect::<Result<Vec<_>>>()?))
            }
            Term::Var(_) | Term::Compound(_) | Term::Expr(_) => {
                Err(LogicError::NotHostValue(self.to_string()))
            }
        }
    }
}

fn number_to_const(n: &Number) -> Result<Const> {
    if let Some(i) = n.as_i64() {
        return Ok(Const::Int(i));
    }
    // u64 beyond i64::MAX has no exact representation
    if n.is_u64() {
        return Err(LogicError::UnsupportedValue(n.to_string()));
    }
    n.as_f64()
        .map(Const::Float)
        .ok_or_else(|| LogicError::UnsupportedValue(n.to_string()))
}

fn const_to_json(c: &Const) -> Result<Value> {
    Ok(match c {
        Const::Null => Value::Null,
        Const::Bool(b) => Value::Bool(*b),
        Const::Int(i) => Value::Number((*i).into()),
        Const::Float(x) => Number::from_f64(*x)
            .map(Value::Number)
            .ok_or_else(|| LogicError::NotHostValue(c.to_string()))?,
        Const::Str(s) | Const::Symbol(s) => Value::String(s.to_string()),
        Const::Nil => Value::Array(vec![]),
    })
}
