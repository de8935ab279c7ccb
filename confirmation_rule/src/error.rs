use thiserror::Error;
use types::primitives::Slot;

use crate::rule_config::RuleConfig;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("snapshot contains no fork choice nodes")]
    EmptySnapshot,
    #[error(
        "snapshot at slot {snapshot_slot} arrived after slot {processed_slot} \
         (snapshots must be processed in slot order)"
    )]
    SnapshotsOutOfOrder {
        snapshot_slot: Slot,
        processed_slot: Slot,
    },
    #[error(
        "confirmation thresholds must satisfy slashing <= byzantine <= {max} \
         (byzantine: {byzantine}, slashing: {slashing})",
        max = RuleConfig::MAX_THRESHOLD,
    )]
    ThresholdsOutOfRange { byzantine: u64, slashing: u64 },
}
