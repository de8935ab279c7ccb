//! Confirmation rule evaluation over sampled fork choice snapshots.
//!
//! A block is confirmed once an adversary controlling less than the configured
//! share of validator weight can no longer reorganize it out of the canonical
//! chain. [`Engine`] replays snapshots in slot order and combines two
//! independent safety arguments:
//!
//! - LMD safety: the attestation support of the block, net of the proposer
//!   boost, leaves no room for a competing branch even if every vote not yet
//!   counted goes against it.
//! - FFG safety: the checkpoint of the block's epoch has gathered enough
//!   support to become justified even if adversarial validators withdraw
//!   theirs.
//!
//! All weight comparisons use integer arithmetic only. Divisions round in
//! favor of the adversary, so estimates err on the side of not confirming.
//!
//! The rule is described in [A Confirmation Rule for Ethereum] and specified in
//! [`consensus-specs`].
//!
//! [A Confirmation Rule for Ethereum]: https://arxiv.org/abs/2405.00549
//! [`consensus-specs`]: https://github.com/ethereum/consensus-specs/blob/dev/fork_choice/confirmation-rule.md

pub use crate::{engine::Engine, error::Error, rule_config::RuleConfig};

mod engine;
mod error;
mod rule_config;
mod weights;
