//! Containers for the subset of the Eth Beacon Node API this crate queries.
//!
//! Deserialization is deliberately lenient. Beacon nodes add response fields
//! over time and only a few of them matter here.

use serde::Deserialize;
use types::{
    containers::{Checkpoint, ForkChoiceNode},
    primitives::{Slot, UnixSeconds, ValidatorIndex, H256},
};

/// Root and slot of the chain head as reported by the node.
#[derive(Clone, Copy, Debug)]
pub struct HeadHeader {
    pub root: H256,
    pub slot: Slot,
}

/// `GET /eth/v1/debug/fork_choice` response. This endpoint has no `data` envelope.
#[derive(Clone, Debug, Deserialize)]
pub struct ForkChoiceContext {
    pub justified_checkpoint: Checkpoint,
    pub finalized_checkpoint: Checkpoint,
    pub fork_choice_nodes: Vec<ForkChoiceNode>,
}

#[derive(Deserialize)]
pub(crate) struct EthResponse<T> {
    pub data: T,
}

#[derive(Deserialize)]
pub(crate) struct Genesis {
    #[serde(with = "serde_utils::string_or_native")]
    pub genesis_time: UnixSeconds,
}

#[derive(Deserialize)]
pub(crate) struct BlockHeaderData {
    pub root: H256,
    pub header: SignedBeaconBlockHeader,
}

#[derive(Deserialize)]
pub(crate) struct SignedBeaconBlockHeader {
    pub message: BeaconBlockHeader,
}

#[derive(Deserialize)]
pub(crate) struct BeaconBlockHeader {
    #[serde(with = "serde_utils::string_or_native")]
    pub slot: Slot,
}

#[derive(Deserialize)]
pub(crate) struct Committee {
    #[serde(with = "serde_utils::string_or_native_sequence")]
    pub validators: Vec<ValidatorIndex>,
}
