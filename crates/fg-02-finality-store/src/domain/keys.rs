//! Key layout of the key-value backend.
//!
//! Heights and event indices are big-endian so prefix scans come back in
//! numeric order.

use shared_types::EventKey;

pub const BLOCK_PREFIX: &[u8] = b"blk:";
pub const BLOCK_HASH_PREFIX: &[u8] = b"bh:";
pub const PROVIDER_PREFIX: &[u8] = b"fp:";
pub const DELEGATION_PREFIX: &[u8] = b"del:";
pub const EVENT_PREFIX: &[u8] = b"evt:";

/// Activation timestamp (u64 BE)
pub const ACTIVATED_KEY: &[u8] = b"meta:activated";
/// Height of the highest finalized block (u64 BE)
pub const LATEST_FINALIZED_KEY: &[u8] = b"meta:latest_finalized";

fn prefixed(prefix: &[u8], body: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + body.len());
    key.extend_from_slice(prefix);
    key.extend_from_slice(body);
    key
}

pub fn block_key(height: u64) -> Vec<u8> {
    prefixed(BLOCK_PREFIX, &height.to_be_bytes())
}

pub fn block_hash_key(hash: &str) -> Vec<u8> {
    prefixed(BLOCK_HASH_PREFIX, hash.as_bytes())
}

pub fn provider_key(btc_pk_hex: &str) -> Vec<u8> {
    prefixed(PROVIDER_PREFIX, btc_pk_hex.as_bytes())
}

pub fn delegation_key(staking_tx_hash_hex: &str) -> Vec<u8> {
    prefixed(DELEGATION_PREFIX, staking_tx_hash_hex.as_bytes())
}

/// `evt:` + tx hash + `0x00` + index. The separator keeps `ab#1` and `ab1#..`
/// from sharing a key.
pub fn event_key(key: &EventKey) -> Vec<u8> {
    let mut out = prefixed(EVENT_PREFIX, key.tx_hash.as_bytes());
    out.push(0);
    out.extend_from_slice(&key.event_index.to_be_bytes());
    out
}

pub fn encode_u64(value: u64) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

/// `None` if `bytes` is not exactly eight bytes.
pub fn decode_u64(bytes: &[u8]) -> Option<u64> {
    let array: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_be_bytes(array))
}
