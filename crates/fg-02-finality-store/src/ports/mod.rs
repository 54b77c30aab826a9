//! Ports: the store contract (inbound) and the key-value backend it can be
//! built on (outbound).

pub mod inbound;
pub mod outbound;
