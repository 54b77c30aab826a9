//! # Finality Gadget Test Suite
//!
//! Cross-crate flows that no single subsystem crate can cover on its own.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── flows.rs     # gateway -> gadget -> store -> JSON-RPC
//!     ├── events.rs    # event replay against every store backend
//!     └── runtime.rs   # service lifecycle over real sockets
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p fg-tests
//! cargo test -p fg-tests integration::events::
//! ```

pub mod integration;
