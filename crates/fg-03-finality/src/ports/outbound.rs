//! Driven Ports (SPI - Outbound Dependencies)
//!
//! Both dependencies are defined by the crates that own them; they are
//! re-exported here so the service's seams are visible in one place.

pub use fg_01_btc_staking::ChainQueryGateway;
pub use fg_02_finality_store::{FinalityStore, StoreTransaction};
