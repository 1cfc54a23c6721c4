pub mod compile;
pub mod dsl;
pub mod expr;
pub mod messages;
pub mod predicate;
pub mod rule;
pub mod schema;
