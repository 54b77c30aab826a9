//! Ports module for BTC staking power

pub mod outbound;

pub use outbound::{ChainQueryGateway, Page, PageKey};
