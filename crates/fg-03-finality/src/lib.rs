//! # fg-03-finality
//!
//! Finality determination for consumer-chain blocks.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Queries**: finalized-by-height/hash, latest finalized block, activation
//! - **Event ingestion**: idempotent application of staking-chain events
//! - **2/3 Threshold**: a block is finalized once voters hold more than two
//!   thirds of the consumer chain's active BTC-staked power
//!
//! ## Architecture
//!
//! ```text
//! Chain Query Gateway ──→ PowerAggregator ──→ FinalityGadget ──verdict──→ Finality Store
//!                                                                              ↑
//! chain events ─────────────────────────────→ FinalityService ──tx──────────────┘
//!                                                   │
//!                                                   └── FinalityQueryApi ──→ query API (fg-04)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use fg_03_finality::{FinalityService, FinalityQueryApi};
//!
//! let service = FinalityService::new(Arc::new(store));
//! service.process_event(&tx_info, 0, event)?;
//! let finalized = service.is_block_finalized_by_height(42).await?;
//! ```

pub mod domain;
pub mod error;
pub mod gadget;
pub mod ports;
pub mod service;

pub use domain::{has_quorum, required_power, EventOutcome};
pub use error::{FinalityError, FinalityResult};
pub use gadget::{BootstrapSummary, FinalityGadget, FinalityVerdict};
pub use ports::inbound::FinalityQueryApi;
pub use service::FinalityService;
