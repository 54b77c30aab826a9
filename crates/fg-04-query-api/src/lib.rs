//! # fg-04-query-api
//!
//! JSON-RPC 2.0 query surface for finality state.
//!
//! ## Methods
//!
//! | Method | Params | Result |
//! |--------|--------|--------|
//! | `finality_isBlockFinalizedByHeight` | `[height]` | `bool` |
//! | `finality_isBlockFinalizedByHash` | `[hash]` | `bool` |
//! | `finality_latestFinalizedBlock` | `[]` | block object |
//! | `finality_activatedTimestamp` | `[]` | unix seconds |
//!
//! All methods are read-only. Unknown blocks and a chain that has not
//! activated yet answer with error `-32001` (resource not found).
//!
//! ## Endpoints
//!
//! - `POST /` JSON-RPC, single or batch
//! - `GET /health`

pub mod domain;
pub mod service;

pub use domain::config::{ConfigError, QueryApiConfig};
pub use domain::error::{codes, ApiError};
pub use domain::methods::RpcMethod;
pub use service::build_router;
