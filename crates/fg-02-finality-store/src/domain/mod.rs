//! Domain layer: errors, key layout and the staged write set.

pub mod errors;
pub mod keys;
pub mod write_set;
