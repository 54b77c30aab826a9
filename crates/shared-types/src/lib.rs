//! # Shared Types Crate
//!
//! Domain entities used across the finality gadget.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Providers, delegations, blocks and chain
//!   events are defined once, here.
//! - **No Stored Power**: A finality provider carries no voting-power field.
//!   Power is always derived from its delegations at a given BTC height.
//! - **Natural Keys**: Blocks are keyed by height, delegations by staking tx
//!   hash, events by `(tx_hash, event_index)`.

pub mod entities;
pub mod events;

pub use entities::*;
pub use events::*;
