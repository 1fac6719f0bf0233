//! Order-insensitive structural equality over JSON trees.
//!
//! Two values are equal when they have the same shape after relaxing two
//! orderings: object keys are compared as maps, and arrays are compared as
//! multisets at every nesting level. Numbers compare by exact numeric value,
//! so `1` and `1.0` are equal but `2^53 + 1` and `2^53` as a float are not.
//!
//! The comparison is total: any pair of values yields a verdict.

use std::cmp::Ordering;

use serde_json::{Map, Number, Value};

/// `true` when `a` and `b` are structurally equal with arrays treated as
/// multisets.
pub fn unordered_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => number_eq(x, y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => multiset_eq(x, y),
        (Value::Object(x), Value::Object(y)) => object_eq(x, y),
        _ => false,
    }
}

/// Integers beyond `u64` are parsed as floats, so every integer fits here.
fn as_integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

/// A float equals an integer only when it is integral and converts without
/// rounding.
fn float_int_eq(f: f64, i: i128) -> bool {
    const LIMIT: f64 = 18_446_744_073_709_551_616.0; // 2^64
    f.is_finite() && f.fract() == 0.0 && f.abs() < LIMIT && f as i128 == i
}

fn number_eq(x: &Number, y: &Number) -> bool {
    match (as_integer(x), as_integer(y)) {
        (Some(a), Some(b)) => a == b,
        (Some(a), None) => y.as_f64().is_some_and(|f| float_int_eq(f, a)),
        (None, Some(b)) => x.as_f64().is_some_and(|f| float_int_eq(f, b)),
        (None, None) => match (x.as_f64(), y.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

fn object_eq(x: &Map<String, Value>, y: &Map<String, Value>) -> bool {
    x.len() == y.len()
        && x
            .iter()
            .all(|(k, v)| y.get(k).is_some_and(|w| unordered_eq(v, w)))
}

/// Greedy matching is exact here because `unordered_eq` is an equivalence
/// relation: any unmatched partner of an element is interchangeable with
/// any other.
fn multiset_eq(x: &[Value], y: &[Value]) -> bool {
    if x.len() != y.len() {
        return false;
    }
    let mut used = vec![false; y.len()];
    'outer: for item in x {
        for (i, candidate) in y.iter().enumerate() {
            if !used[i] && unordered_eq(item, candidate) {
                used[i] = true;
                continue 'outer;
            }
        }
        return false;
    }
    true
}

/// Rewrite `value` into a canonical form: object keys sorted and array
/// elements sorted by their own canonical rendering.
///
/// Two values that are [`unordered_eq`] share a canonical form (up to the
/// textual form of equal numbers), which makes it suitable for producing
/// readable diffs of structurally different documents.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Array(items) => {
            let mut items: Vec<Value> = items.iter().map(canonicalize).collect();
            items.sort_by(compare_rendered);
            Value::Array(items)
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonicalize(v)))
                    .collect(),
            )
        }
        other => other.clone(),
    }
}

fn compare_rendered(a: &Value, b: &Value) -> Ordering {
    a.to_string().cmp(&b.to_string())
}
