use serde::Serialize;
use serde_json::Value;

use crate::domain::errors::ErrorSet;

/// Outcome of one `Schema::call`.
///
/// `output` is the input mapping handed back untouched.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ValidationResult {
    success: bool,
    errors: ErrorSet,
    output: Value,
}

impl ValidationResult {
    pub fn new(errors: ErrorSet, output: Value) -> Self {
        Self {
            success: errors.is_empty(),
            errors,
            output,
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn failure(&self) -> bool {
        !self.success
    }

    pub fn errors(&self) -> &ErrorSet {
        &self.errors
    }

    pub fn output(&self) -> &Value {
        &self.output
    }

    pub fn into_output(self) -> Value {
        self.output
    }
}
