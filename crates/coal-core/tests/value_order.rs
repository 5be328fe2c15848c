use std::cmp::Ordering;

use coal_core::{Value, ValueKind};

#[test]
fn numeric_conversion_covers_int_and_real() {
    assert_eq!(Value::Int(1900).to_f64(), Some(1900.0));
    assert_eq!(Value::Real(0.9).to_f64(), Some(0.9));
    assert_eq!(Value::Bool(true).to_f64(), None);
    assert!(ValueKind::Int.is_numeric());
    assert!(!ValueKind::Bool.is_numeric());
}

#[test]
fn total_order_is_defined_within_and_across_kinds() {
    assert_eq!(Value::Int(2).total_cmp(&Value::Int(3)), Ordering::Less);
    assert_eq!(Value::Bool(false).total_cmp(&Value::Bool(true)), Ordering::Less);
    assert_eq!(
        Value::Real(f64::NAN).total_cmp(&Value::Real(f64::NAN)),
        Ordering::Equal
    );
    assert_eq!(Value::Int(99).total_cmp(&Value::Real(0.0)), Ordering::Less);
}
