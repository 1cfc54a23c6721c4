use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::domain::errors::{ErrorEntry, ErrorSet, OWN_KEY};
use crate::domain::violation::Violation;

pub const FALLBACK_MESSAGE: &str = "is invalid";

/// Turns a structured violation into a human-readable message.
pub trait MessageResolver {
    fn resolve(&self, violation: &Violation) -> String;
}

/// English messages per predicate, with optional overrides.
///
/// Lookup order: override for `(predicate, path)`, override for `predicate`,
/// built-in default, then [`FALLBACK_MESSAGE`]. Templates may use
/// `{expected}`, `{actual}` and `{path}`.
#[derive(Debug, Clone, Default)]
pub struct DefaultMessages {
    by_predicate: HashMap<String, String>,
    by_path: HashMap<(String, String), String>,
}

impl DefaultMessages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, predicate: &str, template: &str) -> Self {
        self.by_predicate
            .insert(predicate.to_string(), template.to_string());
        self
    }

    pub fn with_path_message(mut self, predicate: &str, path: &str, template: &str) -> Self {
        self.by_path.insert(
            (predicate.to_string(), path.to_string()),
            template.to_string(),
        );
        self
    }

    fn template(&self, violation: &Violation) -> String {
        let key = (violation.predicate.clone(), violation.path.clone());
        if let Some(template) = self
            .by_path
            .get(&key)
            .or_else(|| self.by_predicate.get(&violation.predicate))
        {
            return template.clone();
        }
        default_template(&violation.predicate, &violation.expected)
            .unwrap_or(FALLBACK_MESSAGE)
            .to_string()
    }
}

impl MessageResolver for DefaultMessages {
    fn resolve(&self, violation: &Violation) -> String {
        self.template(violation)
            .replace("{expected}", &expected_text(violation))
            .replace("{actual}", &display(&violation.actual))
            .replace("{path}", &violation.path)
    }
}

fn default_template(predicate: &str, expected: &Value) -> Option<&'static str> {
    let template = match predicate {
        "key?" => "is missing",
        "filled?" => "must be filled",
        "empty?" => "must be empty",
        "none?" => "cannot be defined",
        "true?" => "must be true",
        "false?" => "must be false",
        "bool?" => "must be boolean",
        "int?" => "must be an integer",
        "float?" => "must be a float",
        "number?" => "must be a number",
        "str?" => "must be a string",
        "array?" => "must be an array",
        "hash?" => "must be a hash",
        "date?" => "must be a date",
        "date_time?" => "must be a date time",
        "time?" => "must be a time",
        "eql?" => "must be equal to {expected}",
        "not_eql?" => "must not be equal to {expected}",
        "gt?" => "must be greater than {expected}",
        "gteq?" => "must be greater than or equal to {expected}",
        "lt?" => "must be less than {expected}",
        "lteq?" => "must be less than or equal to {expected}",
        "size?" if expected.is_array() => "size must be within {expected}",
        "size?" => "size must be {expected}",
        "min_size?" => "size cannot be less than {expected}",
        "max_size?" => "size cannot be greater than {expected}",
        "included_in?" => "must be one of: {expected}",
        "excluded_from?" => "must not be one of: {expected}",
        "format?" => "is in invalid format",
        "odd?" => "must be odd",
        "even?" => "must be even",
        _ => return None,
    };
    Some(template)
}

fn expected_text(violation: &Violation) -> String {
    match (violation.predicate.as_str(), &violation.expected) {
        ("size?", Value::Array(bounds)) if bounds.len() == 2 => {
            format!("{} - {}", display(&bounds[0]), display(&bounds[1]))
        }
        (_, expected) => display(expected),
    }
}

/// Strings print bare, arrays as a comma-separated list.
fn display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

/// Mirrors the nested error shape, replacing each violation with its message.
pub fn render_messages(errors: &ErrorSet, resolver: &dyn MessageResolver) -> Value {
    let mut out = Map::new();
    if !errors.own().is_empty() {
        out.insert(OWN_KEY.to_string(), render_list(errors.own(), resolver));
    }
    for (key, entry) in errors.iter() {
        let rendered = match entry {
            ErrorEntry::Violations(list) => render_list(list, resolver),
            ErrorEntry::Nested(nested) => render_messages(nested, resolver),
        };
        out.insert(key.to_string(), rendered);
    }
    Value::Object(out)
}

fn render_list(violations: &[Violation], resolver: &dyn MessageResolver) -> Value {
    Value::Array(
        violations
            .iter()
            .map(|violation| Value::String(resolver.resolve(violation)))
            .collect(),
    )
}
