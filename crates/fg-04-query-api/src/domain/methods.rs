//! JSON-RPC method registry.

/// Methods served by the query API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcMethod {
    IsBlockFinalizedByHeight,
    IsBlockFinalizedByHash,
    LatestFinalizedBlock,
    ActivatedTimestamp,
}

impl RpcMethod {
    pub const ALL: [RpcMethod; 4] = [
        RpcMethod::IsBlockFinalizedByHeight,
        RpcMethod::IsBlockFinalizedByHash,
        RpcMethod::LatestFinalizedBlock,
        RpcMethod::ActivatedTimestamp,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RpcMethod::IsBlockFinalizedByHeight => "finality_isBlockFinalizedByHeight",
            RpcMethod::IsBlockFinalizedByHash => "finality_isBlockFinalizedByHash",
            RpcMethod::LatestFinalizedBlock => "finality_latestFinalizedBlock",
            RpcMethod::ActivatedTimestamp => "finality_activatedTimestamp",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}
