use hash_hasher::HashedMap;
use serde::{Deserialize, Serialize};

use crate::primitives::{Epoch, Gwei, Slot, H256};

#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug, Deserialize, Serialize,
)]
#[serde(deny_unknown_fields)]
pub struct Checkpoint {
    #[serde(with = "serde_utils::string_or_native")]
    pub epoch: Epoch,
    pub root: H256,
}

/// A single block as reported by the fork choice dump.
///
/// `weight` is the cumulative attestation weight attributed to the block by the node,
/// including any proposer boost in effect at the time of the dump.
/// Beacon nodes report more fields than these. The extras are ignored.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
pub struct ForkChoiceNode {
    #[serde(with = "serde_utils::string_or_native")]
    pub slot: Slot,
    pub block_root: H256,
    pub parent_root: H256,
    #[serde(with = "serde_utils::string_or_native")]
    pub weight: Gwei,
}

/// One sampled view of the fork choice state, keyed by the wall clock position
/// at which it was taken. Snapshots must be replayed in `current_slot` order.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ForkChoiceSnapshot {
    #[serde(with = "serde_utils::string_or_native")]
    pub current_slot: Slot,
    #[serde(with = "serde_utils::string_or_native")]
    pub current_time_in_slot: u64,
    pub justified_checkpoint: Checkpoint,
    pub finalized_checkpoint: Checkpoint,
    pub nodes: HashedMap<H256, ForkChoiceNode>,
    #[serde(default)]
    pub head_root: Option<H256>,
    #[serde(with = "serde_utils::string_or_native")]
    pub committee_size: u64,
}

impl ForkChoiceSnapshot {
    /// Selects the node the rest of the evaluation starts from.
    ///
    /// The node reports its own head, but deriving the head from the dump keeps replays
    /// independent of the node's scoring at sampling time. Ties on the highest slot go
    /// to the greater block root, matching how equally weighted forks are broken
    /// elsewhere in fork choice.
    #[must_use]
    pub fn head(&self) -> Option<&ForkChoiceNode> {
        self.nodes
            .values()
            .max_by_key(|node| (node.slot, node.block_root))
    }

    #[must_use]
    pub fn node(&self, block_root: H256) -> Option<&ForkChoiceNode> {
        self.nodes.get(&block_root)
    }
}
