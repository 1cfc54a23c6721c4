//! Built-in predicates.
//!
//! Type checks return `false` for any other type. Value checks that cannot
//! handle the value or argument shape they are given raise a
//! [`PredicateError`] instead of returning `false`.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use regex::Regex;
use serde_json::{Number, Value};

use super::{Predicate, PredicateKind};
use crate::domain::error::PredicateError;
use crate::domain::path::is_blank;
use crate::util::time::{is_rfc3339, parse_date, parse_time};

/// Every built-in predicate, in registry listing order.
pub fn all() -> Vec<Predicate> {
    vec![
        key(),
        filled(),
        empty(),
        none(),
        true_(),
        false_(),
        bool_(),
        int(),
        float(),
        number(),
        str_(),
        array(),
        hash(),
        date(),
        date_time(),
        time(),
        eql(),
        not_eql(),
        gt(),
        gteq(),
        lt(),
        lteq(),
        size(),
        min_size(),
        max_size(),
        included_in(),
        excluded_from(),
        format(),
        odd(),
        even(),
    ]
}

fn type_check(name: &str, matches: fn(&Value) -> bool) -> Predicate {
    Predicate::new(name, PredicateKind::Type, 0, move |value, _| Ok(matches(value)))
}

fn ordering(name: &str, accept: fn(Ordering) -> bool) -> Predicate {
    Predicate::new(name, PredicateKind::Value, 1, move |value, args| {
        Ok(accept(compare(value, &args[0])?))
    })
}

/// The value is an object holding the key given as argument.
pub fn key() -> Predicate {
    Predicate::new("key?", PredicateKind::Value, 1, |value, args| {
        let Value::String(name) = &args[0] else {
            return Err(PredicateError::Unsupported(format!(
                "key? expects a string key, got {}",
                type_name(&args[0])
            )));
        };
        Ok(value
            .as_object()
            .is_some_and(|map| map.contains_key(name.as_str())))
    })
}

pub fn filled() -> Predicate {
    Predicate::new("filled?", PredicateKind::Value, 0, |value, _| {
        Ok(!value.is_null() && !is_blank(value))
    })
}

pub fn empty() -> Predicate {
    Predicate::new("empty?", PredicateKind::Value, 0, |value, _| {
        Ok(value.is_null() || is_blank(value))
    })
}

pub fn none() -> Predicate {
    Predicate::new("none?", PredicateKind::Value, 0, |value, _| Ok(value.is_null()))
}

pub fn true_() -> Predicate {
    Predicate::new("true?", PredicateKind::Value, 0, |value, _| {
        Ok(value == &Value::Bool(true))
    })
}

pub fn false_() -> Predicate {
    Predicate::new("false?", PredicateKind::Value, 0, |value, _| {
        Ok(value == &Value::Bool(false))
    })
}

pub fn bool_() -> Predicate {
    type_check("bool?", Value::is_boolean)
}

pub fn int() -> Predicate {
    type_check("int?", is_integer)
}

pub fn float() -> Predicate {
    type_check("float?", Value::is_f64)
}

pub fn number() -> Predicate {
    type_check("number?", Value::is_number)
}

pub fn str_() -> Predicate {
    type_check("str?", Value::is_string)
}

pub fn array() -> Predicate {
    type_check("array?", Value::is_array)
}

pub fn hash() -> Predicate {
    type_check("hash?", Value::is_object)
}

pub fn date() -> Predicate {
    type_check("date?", |value| {
        value.as_str().and_then(parse_date).is_some()
    })
}

pub fn date_time() -> Predicate {
    type_check("date_time?", |value| value.as_str().is_some_and(is_rfc3339))
}

pub fn time() -> Predicate {
    type_check("time?", |value| {
        value.as_str().and_then(parse_time).is_some()
    })
}

pub fn eql() -> Predicate {
    Predicate::new("eql?", PredicateKind::Value, 1, |value, args| {
        Ok(values_equal(value, &args[0]))
    })
}

pub fn not_eql() -> Predicate {
    Predicate::new("not_eql?", PredicateKind::Value, 1, |value, args| {
        Ok(!values_equal(value, &args[0]))
    })
}

pub fn gt() -> Predicate {
    ordering("gt?", Ordering::is_gt)
}

pub fn gteq() -> Predicate {
    ordering("gteq?", Ordering::is_ge)
}

pub fn lt() -> Predicate {
    ordering("lt?", Ordering::is_lt)
}

pub fn lteq() -> Predicate {
    ordering("lteq?", Ordering::is_le)
}

/// Exact size (integer argument) or inclusive range (`[min, max]` argument).
pub fn size() -> Predicate {
    Predicate::new("size?", PredicateKind::Value, 1, |value, args| {
        let actual = measure("size?", value)?;
        match &args[0] {
            Value::Number(exact) => Ok(Some(actual) == exact.as_u64()),
            Value::Array(bounds) => match bounds.as_slice() {
                [Value::Number(min), Value::Number(max)] => {
                    let (Some(min), Some(max)) = (min.as_u64(), max.as_u64()) else {
                        return Err(unsupported_size_argument(&args[0]));
                    };
                    Ok((min..=max).contains(&actual))
                }
                _ => Err(unsupported_size_argument(&args[0])),
            },
            other => Err(unsupported_size_argument(other)),
        }
    })
}

pub fn min_size() -> Predicate {
    Predicate::new("min_size?", PredicateKind::Value, 1, |value, args| {
        let bound = size_bound("min_size?", &args[0])?;
        Ok(measure("min_size?", value)? >= bound)
    })
}

pub fn max_size() -> Predicate {
    Predicate::new("max_size?", PredicateKind::Value, 1, |value, args| {
        let bound = size_bound("max_size?", &args[0])?;
        Ok(measure("max_size?", value)? <= bound)
    })
}

pub fn included_in() -> Predicate {
    Predicate::new("included_in?", PredicateKind::Value, 1, |value, args| {
        Ok(member_list("included_in?", &args[0])?
            .iter()
            .any(|candidate| values_equal(value, candidate)))
    })
}

pub fn excluded_from() -> Predicate {
    Predicate::new("excluded_from?", PredicateKind::Value, 1, |value, args| {
        Ok(!member_list("excluded_from?", &args[0])?
            .iter()
            .any(|candidate| values_equal(value, candidate)))
    })
}

/// Compiled patterns kept per `format?` instance before the cache starts over.
const PATTERN_CACHE_LIMIT: usize = 64;

/// Compiled `format?` patterns. Patterns may come from input data, so the
/// map is cleared once it reaches `limit` entries.
#[derive(Debug)]
struct PatternCache {
    limit: usize,
    patterns: HashMap<String, Regex>,
}

impl PatternCache {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            patterns: HashMap::new(),
        }
    }

    fn is_match(&mut self, pattern: &str, text: &str) -> Result<bool, PredicateError> {
        if let Some(regex) = self.patterns.get(pattern) {
            return Ok(regex.is_match(text));
        }
        let regex = Regex::new(pattern).map_err(|error| {
            PredicateError::Unsupported(format!("invalid pattern `{pattern}`: {error}"))
        })?;
        let matched = regex.is_match(text);
        if self.patterns.len() >= self.limit {
            self.patterns.clear();
        }
        self.patterns.insert(pattern.to_string(), regex);
        Ok(matched)
    }
}

/// Regular-expression match. Compiled patterns are cached per predicate instance.
pub fn format() -> Predicate {
    let cache = Mutex::new(PatternCache::new(PATTERN_CACHE_LIMIT));
    Predicate::new("format?", PredicateKind::Value, 1, move |value, args| {
        let Value::String(pattern) = &args[0] else {
            return Err(PredicateError::Unsupported(format!(
                "format? expects a string pattern, got {}",
                type_name(&args[0])
            )));
        };
        let Value::String(text) = value else {
            return Err(PredicateError::Unsupported(format!(
                "format? cannot match {}",
                type_name(value)
            )));
        };

        cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_match(pattern, text)
    })
}

pub fn odd() -> Predicate {
    Predicate::new("odd?", PredicateKind::Value, 0, |value, _| {
        Ok(integer_value("odd?", value)? % 2 != 0)
    })
}

pub fn even() -> Predicate {
    Predicate::new("even?", PredicateKind::Value, 0, |value, _| {
        Ok(integer_value("even?", value)? % 2 == 0)
    })
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_integer(value: &Value) -> bool {
    value.is_i64() || value.is_u64()
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => {
            compare_numbers(left, right) == Some(Ordering::Equal)
        }
        _ => left == right,
    }
}

/// Orders numbers with numbers and strings with strings; anything else raises.
fn compare(actual: &Value, expected: &Value) -> Result<Ordering, PredicateError> {
    let incomparable = || PredicateError::Incomparable {
        actual: type_name(actual),
        expected: type_name(expected),
    };
    match (actual, expected) {
        (Value::Number(left), Value::Number(right)) => {
            compare_numbers(left, right).ok_or_else(incomparable)
        }
        (Value::String(left), Value::String(right)) => Ok(left.cmp(right)),
        _ => Err(incomparable()),
    }
}

fn compare_numbers(left: &Number, right: &Number) -> Option<Ordering> {
    if let (Some(left), Some(right)) = (left.as_i64(), right.as_i64()) {
        return Some(left.cmp(&right));
    }

    if let (Some(left), Some(right)) = (left.as_u64(), right.as_u64()) {
        return Some(left.cmp(&right));
    }

    // Only reachable with one negative i64 and one u64 above i64::MAX.
    if left.is_i64() && right.is_u64() {
        return Some(Ordering::Less);
    }
    if left.is_u64() && right.is_i64() {
        return Some(Ordering::Greater);
    }

    left.as_f64()
        .zip(right.as_f64())
        .and_then(|(left, right)| left.partial_cmp(&right))
}

fn measure(name: &str, value: &Value) -> Result<u64, PredicateError> {
    let len = match value {
        Value::String(text) => text.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => {
            return Err(PredicateError::Unsupported(format!(
                "{name} cannot measure {}",
                type_name(other)
            )));
        }
    };
    u64::try_from(len).map_err(|_| PredicateError::Unsupported(format!("{name} size overflow")))
}

fn size_bound(name: &str, arg: &Value) -> Result<u64, PredicateError> {
    arg.as_u64().ok_or_else(|| {
        PredicateError::Unsupported(format!(
            "{name} expects a non-negative integer, got {}",
            type_name(arg)
        ))
    })
}

fn unsupported_size_argument(arg: &Value) -> PredicateError {
    PredicateError::Unsupported(format!(
        "size? expects an integer or a [min, max] range, got {arg}"
    ))
}

fn member_list<'a>(name: &str, arg: &'a Value) -> Result<&'a [Value], PredicateError> {
    arg.as_array().map(Vec::as_slice).ok_or_else(|| {
        PredicateError::Unsupported(format!(
            "{name} expects an array of candidates, got {}",
            type_name(arg)
        ))
    })
}

fn integer_value(name: &str, value: &Value) -> Result<i128, PredicateError> {
    value
        .as_i64()
        .map(i128::from)
        .or_else(|| value.as_u64().map(i128::from))
        .ok_or_else(|| {
            PredicateError::Unsupported(format!("{name} expects an integer, got {}", type_name(value)))
        })
}
