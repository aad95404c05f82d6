// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn debian_facts() -> Facts {
    Facts {
        os: "linux".to_string(),
        os_family: "debian".to_string(),
        cpu_count: 8,
        memory_mb: 16384,
        ..Facts::default()
    }
}

#[test]
fn fact_eq_matches() {
    let facts = debian_facts();
    assert!(Condition::fact_eq("os_family", "debian").eval(&facts).unwrap());
    assert!(!Condition::fact_eq("os_family", "rhel").eval(&facts).unwrap());
}

#[test]
fn missing_fact_resolves_to_null() {
    let facts = debian_facts();
    let cond = Condition::fact_eq("no_such_fact", "x");
    assert!(!cond.eval(&facts).unwrap());

    let is_null = Condition::Eq(
        Box::new(Condition::FactRef("no_such_fact".to_string())),
        Box::new(Condition::Literal(Value::Null)),
    );
    assert!(is_null.eval(&facts).unwrap());
}

#[parameterized(
    lt = { 4, true, false },
    boundary = { 8, false, true },
    gt = { 16, false, false },
)]
fn numeric_comparisons(threshold: i64, lt_expected: bool, eq_expected: bool) {
    let facts = debian_facts();
    let lt = Condition::Lt(
        Box::new(Condition::Literal(Value::Int(threshold))),
        Box::new(Condition::FactRef("cpu_count".to_string())),
    );
    assert_eq!(lt.eval(&facts).unwrap(), lt_expected);
    let eq = Condition::fact_eq("cpu_count", threshold);
    assert_eq!(eq.eval(&facts).unwrap(), eq_expected);
}

#[test]
fn int_and_float_compare_numerically() {
    let facts = debian_facts();
    let cond = Condition::Eq(
        Box::new(Condition::Literal(Value::Float(8.0))),
        Box::new(Condition::FactRef("cpu_count".to_string())),
    );
    assert!(cond.eval(&facts).unwrap());
}

#[test]
fn and_or_short_circuit() {
    let facts = debian_facts();
    // Right side would error (non-boolean literal) but is never reached.
    let bad = Condition::Literal(Value::Str("oops".to_string()));
    let and = Condition::And(
        Box::new(Condition::Literal(Value::Bool(false))),
        Box::new(bad.clone()),
    );
    assert!(!and.eval(&facts).unwrap());

    let or = Condition::Or(
        Box::new(Condition::Literal(Value::Bool(true))),
        Box::new(bad),
    );
    assert!(or.eval(&facts).unwrap());
}

#[test]
fn membership() {
    let facts = debian_facts();
    let cond = Condition::fact_in(
        "os_family",
        vec![Value::from("debian"), Value::from("rhel")],
    );
    assert!(cond.eval(&facts).unwrap());

    let cond = Condition::fact_in("os_family", vec![Value::from("arch")]);
    assert!(!cond.eval(&facts).unwrap());
}

#[test]
fn in_requires_a_list() {
    let facts = debian_facts();
    let cond = Condition::In(
        Box::new(Condition::Literal(Value::from("x"))),
        Box::new(Condition::Literal(Value::from("not-a-list"))),
    );
    assert!(matches!(
        cond.eval(&facts),
        Err(ConditionError::NotAList(_))
    ));
}

#[test]
fn non_boolean_literal_errors() {
    let facts = debian_facts();
    let cond = Condition::Literal(Value::Int(1));
    assert!(matches!(
        cond.eval(&facts),
        Err(ConditionError::NotBoolean(_))
    ));
}

#[test]
fn not_negates() {
    let facts = debian_facts();
    let cond = Condition::Not(Box::new(Condition::fact_eq("os_family", "rhel")));
    assert!(cond.eval(&facts).unwrap());
}
