//! Deep structural comparison with tolerance-aware numeric equality.
//!
//! Compares two nested JSON-like values and stops at the first point of
//! divergence, reporting a root-to-leaf trace such as
//! `ROOT -> 'epoch' -> 2 -> 'train_loss'`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Absolute and relative tolerance for numeric comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self { rtol: 1e-7, atol: 0.0 }
    }
}

impl Tolerance {
    pub fn new(rtol: f64, atol: f64) -> Self {
        Self { rtol, atol }
    }

    /// `|actual - expected| <= atol + rtol * |expected|`.
    ///
    /// NaN compares equal to NaN; infinities must match exactly, sign
    /// included.
    pub fn allows(&self, expected: f64, actual: f64) -> bool {
        if expected.is_nan() && actual.is_nan() {
            return true;
        }
        if expected.is_infinite() || actual.is_infinite() {
            return expected == actual;
        }
        (actual - expected).abs() <= self.atol + self.rtol * expected.abs()
    }
}

/// One step of the descent from the root to a mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathSeg {
    Index(usize),
    Key(String),
}

impl core::fmt::Display for PathSeg {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PathSeg::Index(index) => write!(f, "{}", index),
            PathSeg::Key(key) => write!(f, "'{}'", key),
        }
    }
}

/// Why two values failed to compare equal.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum Mismatch {
    #[error("length mismatch: expected {expected} elements, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("key set mismatch: missing {missing:?}, unexpected {unexpected:?}")]
    KeySetMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("{actual} is not within tolerance of {expected} (rtol={rtol}, atol={atol})")]
    ToleranceExceeded {
        expected: f64,
        actual: f64,
        rtol: f64,
        atol: f64,
    },

    #[error("value mismatch: expected {expected}, got {actual}")]
    ValueMismatch { expected: String, actual: String },
}

/// First point of divergence between two structures.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{mismatch}\nTRACE: {}", fmt_path(.path))]
pub struct CompareError {
    pub mismatch: Mismatch,
    /// Root-to-leaf path to the mismatch. Empty means the root itself.
    pub path: Vec<PathSeg>,
}

impl CompareError {
    fn new(mismatch: Mismatch) -> Self {
        Self {
            mismatch,
            path: Vec::new(),
        }
    }

    fn via(mut self, seg: PathSeg) -> Self {
        self.path.push(seg);
        self
    }

    /// The trace rendered root-to-leaf, e.g. `ROOT -> 'a' -> 2 -> 'b'`.
    pub fn path_string(&self) -> String {
        fmt_path(&self.path)
    }
}

fn fmt_path(path: &[PathSeg]) -> String {
    let mut out = String::from("ROOT");
    for seg in path {
        out.push_str(" -> ");
        out.push_str(&seg.to_string());
    }
    out
}

/// Tagged classification of a value, decided once before recursing.
enum Kind<'a> {
    Number(f64),
    Sequence(&'a [Value]),
    Mapping(&'a Map<String, Value>),
    Other,
}

fn classify(value: &Value) -> Kind<'_> {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(x) => Kind::Number(x),
            None => Kind::Other,
        },
        Value::Array(items) => Kind::Sequence(items),
        Value::Object(map) => Kind::Mapping(map),
        _ => Kind::Other,
    }
}

/// Compare `expected` against `actual` with the default tolerance.
pub fn deep_allclose(expected: &Value, actual: &Value) -> Result<(), CompareError> {
    deep_allclose_with(expected, actual, Tolerance::default())
}

/// Compare `expected` against `actual` with an explicit tolerance.
///
/// Returns the first mismatch in traversal order (sequence indices
/// ascending, mapping keys in map order); nothing is aggregated past it.
pub fn deep_allclose_with(
    expected: &Value,
    actual: &Value,
    tol: Tolerance,
) -> Result<(), CompareError> {
    compare(expected, actual, tol).map_err(|mut err| {
        // segments were pushed leaf-to-root while unwinding
        err.path.reverse();
        err
    })
}

fn compare(expected: &Value, actual: &Value, tol: Tolerance) -> Result<(), CompareError> {
    match classify(expected) {
        Kind::Number(e) => match classify(actual) {
            Kind::Number(a) if tol.allows(e, a) => Ok(()),
            Kind::Number(a) => Err(CompareError::new(Mismatch::ToleranceExceeded {
                expected: e,
                actual: a,
                rtol: tol.rtol,
                atol: tol.atol,
            })),
            _ => Err(value_mismatch(expected, actual)),
        },
        Kind::Sequence(exp) => {
            let Kind::Sequence(act) = classify(actual) else {
                return Err(value_mismatch(expected, actual));
            };
            if exp.len() != act.len() {
                return Err(CompareError::new(Mismatch::LengthMismatch {
                    expected: exp.len(),
                    actual: act.len(),
                }));
            }
            for (index, (e, a)) in exp.iter().zip(act).enumerate() {
                compare(e, a, tol).map_err(|err| err.via(PathSeg::Index(index)))?;
            }
            Ok(())
        }
        Kind::Mapping(exp) => {
            let Kind::Mapping(act) = classify(actual) else {
                return Err(value_mismatch(expected, actual));
            };
            let missing: Vec<String> = exp
                .keys()
                .filter(|k| !act.contains_key(*k))
                .cloned()
                .collect();
            let unexpected: Vec<String> = act
                .keys()
                .filter(|k| !exp.contains_key(*k))
                .cloned()
                .collect();
            if !missing.is_empty() || !unexpected.is_empty() {
                return Err(CompareError::new(Mismatch::KeySetMismatch {
                    missing,
                    unexpected,
                }));
            }
            for (key, e) in exp {
                // key sets are identical, so indexing cannot miss
                let a = &act[key.as_str()];
                compare(e, a, tol).map_err(|err| err.via(PathSeg::Key(key.clone())))?;
            }
            Ok(())
        }
        Kind::Other => {
            if expected == actual {
                Ok(())
            } else {
                Err(value_mismatch(expected, actual))
            }
        }
    }
}

fn value_mismatch(expected: &Value, actual: &Value) -> CompareError {
    CompareError::new(Mismatch::ValueMismatch {
        expected: expected.to_string(),
        actual: actual.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_within_default_tolerance() {
        assert!(deep_allclose(&json!(2.0), &json!(2.0000001)).is_ok());
        assert!(deep_allclose(&json!(1), &json!(1)).is_ok());
    }

    #[test]
    fn scalar_beyond_tolerance() {
        let err = deep_allclose(&json!(2.0), &json!(2.5)).unwrap_err();
        assert!(matches!(err.mismatch, Mismatch::ToleranceExceeded { .. }));
        assert_eq!(err.path_string(), "ROOT");
    }

    #[test]
    fn sequence_element_beyond_tolerance() {
        let err = deep_allclose(&json!([1.0, 2.0]), &json!([1.0, 2.5])).unwrap_err();
        assert!(matches!(err.mismatch, Mismatch::ToleranceExceeded { .. }));
        assert_eq!(err.path_string(), "ROOT -> 1");
    }

    #[test]
    fn length_checked_before_elements() {
        // second element differs wildly but the length check fires first
        let err = deep_allclose(&json!([1.0, 999.0]), &json!([1.0])).unwrap_err();
        assert_eq!(
            err.mismatch,
            Mismatch::LengthMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn key_set_mismatch_at_root() {
        let err = deep_allclose(&json!({"x": 1}), &json!({"y": 1})).unwrap_err();
        assert_eq!(
            err.mismatch,
            Mismatch::KeySetMismatch {
                missing: vec!["x".into()],
                unexpected: vec!["y".into()],
            }
        );
        assert_eq!(err.path_string(), "ROOT");
    }

    #[test]
    fn path_to_nested_mismatch() {
        let expected = json!({"a": [1, 2, {"b": 3}]});
        let actual = json!({"a": [1, 2, {"b": 4}]});
        let err = deep_allclose(&expected, &actual).unwrap_err();
        assert_eq!(err.path_string(), "ROOT -> 'a' -> 2 -> 'b'");
    }

    #[test]
    fn display_carries_trace_line() {
        let err = deep_allclose(&json!({"a": [true]}), &json!({"a": [false]})).unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("value mismatch"));
        assert!(rendered.ends_with("\nTRACE: ROOT -> 'a' -> 0"));
    }

    #[test]
    fn non_numeric_scalars_compare_exactly() {
        assert!(deep_allclose(&json!("hands"), &json!("hands")).is_ok());
        assert!(deep_allclose(&json!(true), &json!(true)).is_ok());
        assert!(deep_allclose(&json!(null), &json!(null)).is_ok());

        let err = deep_allclose(&json!("hands"), &json!("feet")).unwrap_err();
        assert!(matches!(err.mismatch, Mismatch::ValueMismatch { .. }));
    }

    #[test]
    fn kind_disagreement_is_value_mismatch() {
        let err = deep_allclose(&json!([1.0]), &json!(1.0)).unwrap_err();
        assert!(matches!(err.mismatch, Mismatch::ValueMismatch { .. }));

        let err = deep_allclose(&json!(1.0), &json!("1.0")).unwrap_err();
        assert!(matches!(err.mismatch, Mismatch::ValueMismatch { .. }));
    }

    #[test]
    fn custom_tolerance() {
        let tol = Tolerance::new(0.0, 0.75);
        assert!(deep_allclose_with(&json!(2.0), &json!(2.5), tol).is_ok());
        assert!(deep_allclose_with(&json!(2.0), &json!(3.0), tol).is_err());
    }

    #[test]
    fn tolerance_handles_non_finite_values() {
        let tol = Tolerance::default();
        assert!(tol.allows(f64::NAN, f64::NAN));
        assert!(tol.allows(f64::INFINITY, f64::INFINITY));
        assert!(!tol.allows(f64::INFINITY, f64::NEG_INFINITY));
        assert!(!tol.allows(f64::INFINITY, 1.0));
        assert!(!tol.allows(f64::NAN, 1.0));
    }

    #[test]
    fn mixed_nesting_compares_clean() {
        let v = json!({
            "epoch": 1,
            "batches": [{"train_loss": 2.07, "train_batch_size": 32}],
            "train_loss_best": true,
        });
        assert!(deep_allclose(&v, &v.clone()).is_ok());
    }
}
