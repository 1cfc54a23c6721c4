//! Expression constructors over the built-in predicates.
//!
//! ```
//! use rulecheck::engine::dsl::{attr, eql, gt, int};
//! use serde_json::json;
//!
//! let exact = int() & eql(json!(23));
//! let later = gt(attr("start_date")).on("end_date");
//! # let _ = (exact, later);
//! ```

use serde_json::Value;

use crate::domain::path::AttrPath;
use crate::engine::expr::{Arg, Expr, Invocation};
use crate::engine::predicate::{Predicate, builtins};

/// Reference to another attribute of the same input level, usable as an argument.
pub fn attr(path: &str) -> Arg {
    Arg::Attr(AttrPath::unchecked(path))
}

/// Leaf expression for any predicate. Arity is checked when the schema is built.
pub fn call(predicate: Predicate, args: Vec<Arg>) -> Expr {
    Expr::Leaf(Invocation::new(predicate, args))
}

pub fn each(expr: Expr) -> Expr {
    expr.each()
}

fn nullary(predicate: Predicate) -> Expr {
    call(predicate, Vec::new())
}

fn unary(predicate: Predicate, arg: impl Into<Arg>) -> Expr {
    call(predicate, vec![arg.into()])
}

pub fn key(name: &str) -> Expr {
    unary(builtins::key(), Value::String(name.to_string()))
}

pub fn filled() -> Expr {
    nullary(builtins::filled())
}

pub fn empty() -> Expr {
    nullary(builtins::empty())
}

pub fn none() -> Expr {
    nullary(builtins::none())
}

pub fn true_() -> Expr {
    nullary(builtins::true_())
}

pub fn false_() -> Expr {
    nullary(builtins::false_())
}

pub fn bool_() -> Expr {
    nullary(builtins::bool_())
}

pub fn int() -> Expr {
    nullary(builtins::int())
}

pub fn float() -> Expr {
    nullary(builtins::float())
}

pub fn number() -> Expr {
    nullary(builtins::number())
}

pub fn str_() -> Expr {
    nullary(builtins::str_())
}

pub fn array() -> Expr {
    nullary(builtins::array())
}

pub fn hash() -> Expr {
    nullary(builtins::hash())
}

pub fn date() -> Expr {
    nullary(builtins::date())
}

pub fn date_time() -> Expr {
    nullary(builtins::date_time())
}

pub fn time() -> Expr {
    nullary(builtins::time())
}

pub fn eql(arg: impl Into<Arg>) -> Expr {
    unary(builtins::eql(), arg)
}

pub fn not_eql(arg: impl Into<Arg>) -> Expr {
    unary(builtins::not_eql(), arg)
}

pub fn gt(arg: impl Into<Arg>) -> Expr {
    unary(builtins::gt(), arg)
}

pub fn gteq(arg: impl Into<Arg>) -> Expr {
    unary(builtins::gteq(), arg)
}

pub fn lt(arg: impl Into<Arg>) -> Expr {
    unary(builtins::lt(), arg)
}

pub fn lteq(arg: impl Into<Arg>) -> Expr {
    unary(builtins::lteq(), arg)
}

pub fn size(arg: impl Into<Arg>) -> Expr {
    unary(builtins::size(), arg)
}

pub fn min_size(arg: impl Into<Arg>) -> Expr {
    unary(builtins::min_size(), arg)
}

pub fn max_size(arg: impl Into<Arg>) -> Expr {
    unary(builtins::max_size(), arg)
}

pub fn included_in(arg: impl Into<Arg>) -> Expr {
    unary(builtins::included_in(), arg)
}

pub fn excluded_from(arg: impl Into<Arg>) -> Expr {
    unary(builtins::excluded_from(), arg)
}

pub fn format(pattern: &str) -> Expr {
    unary(builtins::format(), Value::String(pattern.to_string()))
}

pub fn odd() -> Expr {
    nullary(builtins::odd())
}

pub fn even() -> Expr {
    nullary(builtins::even())
}
