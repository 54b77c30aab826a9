//! # Adapters Layer (Hexagonal Architecture)
//!
//! - `transaction`: staged transaction shared by every backend
//! - `memory`: map-backed fake store
//! - `kv`: store over a [`KeyValueStore`](crate::KeyValueStore)

pub mod kv;
pub mod memory;
pub mod transaction;
