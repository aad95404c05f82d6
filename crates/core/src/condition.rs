// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `when:` predicate trees
//!
//! Conditions are evaluated against a host's gathered facts. A missing
//! `when:` clause is treated as `true` by callers; an evaluation error is
//! reported as a step skip with a warning, never a task failure.

use crate::facts::Facts;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

/// A literal or fact-resolved operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::Str(_) => 3,
            Value::List(_) => 4,
        }
    }

    /// Total order: numerics compare numerically across Int/Float, other
    /// types compare within themselves, mixed types by type rank.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).total_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.total_cmp(&(*b as f64)),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.total_cmp(y) {
                        Ordering::Equal => continue,
                        ord => return ord,
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }

    pub fn loose_eq(&self, other: &Value) -> bool {
        self.total_cmp(other) == Ordering::Equal
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConditionError {
    #[error("expected a boolean, got {0}")]
    NotBoolean(String),
    #[error("membership check requires a list, got {0}")]
    NotAList(String),
}

/// A predicate tree over facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    Literal(Value),
    /// Resolves a fact by name; `Null` when absent
    FactRef(String),
    Eq(Box<Condition>, Box<Condition>),
    Ne(Box<Condition>, Box<Condition>),
    Lt(Box<Condition>, Box<Condition>),
    Gt(Box<Condition>, Box<Condition>),
    Le(Box<Condition>, Box<Condition>),
    Ge(Box<Condition>, Box<Condition>),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
    In(Box<Condition>, Box<Condition>),
}

impl Condition {
    /// Convenience constructor: `fact == literal`.
    pub fn fact_eq(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Eq(
            Box::new(Condition::FactRef(name.into())),
            Box::new(Condition::Literal(value.into())),
        )
    }

    /// Convenience constructor: `fact in [values...]`.
    pub fn fact_in(name: impl Into<String>, values: Vec<Value>) -> Self {
        Condition::In(
            Box::new(Condition::FactRef(name.into())),
            Box::new(Condition::Literal(Value::List(values))),
        )
    }

    /// Resolve this node to a value.
    pub fn resolve(&self, facts: &Facts) -> Result<Value, ConditionError> {
        match self {
            Condition::Literal(v) => Ok(v.clone()),
            Condition::FactRef(name) => Ok(facts.get(name).unwrap_or(Value::Null)),
            other => other.eval(facts).map(Value::Bool),
        }
    }

    /// Evaluate this tree to a boolean.
    pub fn eval(&self, facts: &Facts) -> Result<bool, ConditionError> {
        let cmp = |l: &Condition, r: &Condition| -> Result<Ordering, ConditionError> {
            Ok(l.resolve(facts)?.total_cmp(&r.resolve(facts)?))
        };
        match self {
            Condition::Literal(Value::Bool(b)) => Ok(*b),
            Condition::Literal(v) => Err(ConditionError::NotBoolean(format!("{v:?}"))),
            Condition::FactRef(name) => match facts.get(name) {
                Some(Value::Bool(b)) => Ok(b),
                Some(v) => Err(ConditionError::NotBoolean(format!("{name} = {v:?}"))),
                None => Err(ConditionError::NotBoolean(format!("{name} = Null"))),
            },
            Condition::Eq(l, r) => Ok(cmp(l, r)? == Ordering::Equal),
            Condition::Ne(l, r) => Ok(cmp(l, r)? != Ordering::Equal),
            Condition::Lt(l, r) => Ok(cmp(l, r)? == Ordering::Less),
            Condition::Gt(l, r) => Ok(cmp(l, r)? == Ordering::Greater),
            Condition::Le(l, r) => Ok(cmp(l, r)? != Ordering::Greater),
            Condition::Ge(l, r) => Ok(cmp(l, r)? != Ordering::Less),
            // short-circuit
            Condition::And(l, r) => Ok(l.eval(facts)? && r.eval(facts)?),
            Condition::Or(l, r) => Ok(l.eval(facts)? || r.eval(facts)?),
            Condition::Not(e) => Ok(!e.eval(facts)?),
            Condition::In(item, list) => {
                let needle = item.resolve(facts)?;
                match list.resolve(facts)? {
                    Value::List(items) => Ok(items.iter().any(|v| v.loose_eq(&needle))),
                    other => Err(ConditionError::NotAList(format!("{other:?}"))),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "condition_tests.rs"]
mod tests;
