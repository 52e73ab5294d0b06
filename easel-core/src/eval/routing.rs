//! Routing assertion
//!
//! Deep structural equality between a node result and a reference output.
//! There is no tolerance: every diverging path is reported.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single diverging location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathMismatch {
    /// Location in `$`, `$.field`, `$.list[2]` notation
    pub path: String,

    /// Expected value (absent when the actual side has an extra key)
    pub expected: Option<Value>,

    /// Actual value (absent when the actual side is missing a key)
    pub actual: Option<Value>,
}

impl std::fmt::Display for PathMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let show = |v: &Option<Value>| match v {
            Some(v) => v.to_string(),
            None => "<missing>".to_string(),
        };
        write!(
            f,
            "{}: expected {}, got {}",
            self.path,
            show(&self.expected),
            show(&self.actual)
        )
    }
}

/// Result of a routing assertion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingOutcome {
    pub passed: bool,
    pub mismatches: Vec<PathMismatch>,
}

impl RoutingOutcome {
    pub fn passed(&self) -> bool {
        self.passed
    }

    /// Human-readable diff, one line per mismatch
    pub fn diff(&self) -> String {
        self.mismatches
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Compare a node result against the reference output
pub fn assert_routed(actual: &Value, expected: &Value) -> RoutingOutcome {
    let mut mismatches = Vec::new();
    diff_values("$", expected, actual, &mut mismatches);
    RoutingOutcome {
        passed: mismatches.is_empty(),
        mismatches,
    }
}

fn diff_values(path: &str, expected: &Value, actual: &Value, out: &mut Vec<PathMismatch>) {
    match (expected, actual) {
        (Value::Object(exp), Value::Object(act)) => {
            for (key, exp_val) in exp {
                let child = format!("{}.{}", path, key);
                match act.get(key) {
                    Some(act_val) => diff_values(&child, exp_val, act_val, out),
                    None => out.push(PathMismatch {
                        path: child,
                        expected: Some(exp_val.clone()),
                        actual: None,
                    }),
                }
            }
            for (key, act_val) in act {
                if !exp.contains_key(key) {
                    out.push(PathMismatch {
                        path: format!("{}.{}", path, key),
                        expected: None,
                        actual: Some(act_val.clone()),
                    });
                }
            }
        }
        (Value::Array(exp), Value::Array(act)) => {
            for i in 0..exp.len().max(act.len()) {
                let child = format!("{}[{}]", path, i);
                match (exp.get(i), act.get(i)) {
                    (Some(e), Some(a)) => diff_values(&child, e, a, out),
                    (e, a) => out.push(PathMismatch {
                        path: child,
                        expected: e.cloned(),
                        actual: a.cloned(),
                    }),
                }
            }
        }
        (Value::Number(e), Value::Number(a)) => {
            if !numbers_equal(e, a) {
                out.push(PathMismatch {
                    path: path.to_string(),
                    expected: Some(expected.clone()),
                    actual: Some(actual.clone()),
                });
            }
        }
        _ => {
            if expected != actual {
                out.push(PathMismatch {
                    path: path.to_string(),
                    expected: Some(expected.clone()),
                    actual: Some(actual.clone()),
                });
            }
        }
    }
}

/// Integers compare exactly; floats compare by value against either kind
fn numbers_equal(expected: &serde_json::Number, actual: &serde_json::Number) -> bool {
    if expected.is_f64() || actual.is_f64() {
        return expected.as_f64() == actual.as_f64();
    }
    match (expected.as_i64(), actual.as_i64()) {
        (Some(e), Some(a)) => e == a,
        _ => expected.as_u64().is_some() && expected.as_u64() == actual.as_u64(),
    }
}
