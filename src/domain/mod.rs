pub mod definition;
pub mod error;
pub mod errors;
pub mod path;
pub mod result;
pub mod violation;
