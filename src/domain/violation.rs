use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Single rule violation.
///
/// Two violations are equal iff path, predicate, expected and actual are all equal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Violation {
    /// Full dotted path of the attribute (or cross-field check name) that failed.
    pub path: String,
    /// Name of the failing predicate, e.g. `eql?`.
    pub predicate: String,
    /// Bound predicate arguments: `true` for none, the value for one, an array for several.
    pub expected: Value,
    /// The value that was tested; `null` when the key was missing.
    pub actual: Value,
}

impl Violation {
    pub fn new(
        path: impl Into<String>,
        predicate: impl Into<String>,
        expected: Value,
        actual: Value,
    ) -> Self {
        Self {
            path: path.into(),
            predicate: predicate.into(),
            expected,
            actual,
        }
    }
}

/// Collapses bound arguments into the `expected` shape of a [`Violation`].
pub fn expected_from_args(args: &[Value]) -> Value {
    match args {
        [] => Value::Bool(true),
        [single] => single.clone(),
        many => Value::Array(many.to_vec()),
    }
}
