pub mod check;
pub mod predicates;
