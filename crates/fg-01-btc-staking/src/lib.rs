//! # fg-01-btc-staking
//!
//! Power aggregation over BTC staking state.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Activity predicate**: whether a delegation counts at a BTC height
//! - **Voting power**: sum of active stake per finality provider
//! - **Activation height**: earliest BTC height any provider's stake counted
//! - **Paginated reads**: lazy, restartable page streams over the chain
//!
//! ## Architecture
//!
//! ```text
//! Chain Query Gateway ──pages──→ PowerAggregator ──power map──→ Finality (fg-03)
//!        (port)                      │
//!                                    └── is_delegation_active / first_active_height
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use fg_01_btc_staking::{PowerAggregator, adapters::InMemoryChainGateway};
//!
//! let aggregator = PowerAggregator::new(Arc::new(gateway));
//! let power = aggregator.active_delegation_power(&fp_pk_hex, btc_height).await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod pagination;
pub mod ports;
pub mod service;

pub use domain::{
    first_active_height, is_delegation_active, ChainParams, CheckpointParams, StakingParams,
    NEVER_ACTIVATED,
};
pub use error::{GatewayError, GatewayResult};
pub use pagination::{DelegationPages, FinalityProviderPages};
pub use ports::outbound::{ChainQueryGateway, Page, PageKey};
pub use service::{PowerAggregator, PowerMap, DEFAULT_MAX_CONCURRENT_QUERIES};
