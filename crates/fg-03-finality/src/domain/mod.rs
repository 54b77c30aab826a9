//! Domain layer for finality determination
//!
//! - threshold: 2/3 power quorum
//! - events: how each chain event mutates stored state

pub mod events;
pub mod threshold;

pub use events::{apply_chain_event, EventOutcome};
pub use threshold::{has_quorum, required_power};
