//! Existence checks for routing codes.
//!
//! Answers "does this code exist" from a prefix -> suffix snapshot without
//! touching the record store.

mod validation;

pub use validation::ValidationIndex;
