//! # Adapters Layer (Hexagonal Architecture)
//!
//! The production gateway speaks to the staking chain over RPC and is wired
//! in by the host. This crate ships the in-memory implementation used by
//! tests and local runs.

mod in_memory;

pub use in_memory::InMemoryChainGateway;
