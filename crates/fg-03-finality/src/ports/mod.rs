//! Ports for the finality subsystem

pub mod inbound;
pub mod outbound;
