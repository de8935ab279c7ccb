use core::{cmp::Ordering, marker::PhantomData};
use std::{collections::BTreeSet, sync::Arc};

use helper_functions::misc;
use log::{debug, error, warn};
use types::{
    config::Config as ChainConfig,
    containers::{ForkChoiceNode, ForkChoiceSnapshot},
    preset::Preset,
    primitives::{Epoch, Slot, H256},
};

use crate::{error::Error, rule_config::RuleConfig, weights};

/// Tracks the highest confirmed block across successive fork choice snapshots.
///
/// One instance corresponds to one replay. Snapshots must be passed to
/// [`Engine::update_confirmed_head`] in nondecreasing `current_slot` order.
/// The confirmed head only moves forward. An observation that would move it
/// backwards is logged and counted instead of applied.
pub struct Engine<P: Preset> {
    chain_config: Arc<ChainConfig>,
    rule_config: RuleConfig,
    current_slot: Slot,
    time_in_current_slot: u64,
    confirmed_head_root: Option<H256>,
    confirmed_head_slot: Slot,
    ffg_confirmed_checkpoint: Option<H256>,
    processed_slots: BTreeSet<Slot>,
    confirmation_times: Vec<u64>,
    empty_or_forked_slots: Vec<Slot>,
    times_from_confirmed_head: Vec<u64>,
    head_regressions: u64,
    confirmed_chain_reorgs: u64,
    phantom: PhantomData<P>,
}

impl<P: Preset> Engine<P> {
    #[must_use]
    pub const fn new(chain_config: Arc<ChainConfig>, rule_config: RuleConfig) -> Self {
        Self {
            chain_config,
            rule_config,
            current_slot: 0,
            time_in_current_slot: 0,
            confirmed_head_root: None,
            confirmed_head_slot: 0,
            ffg_confirmed_checkpoint: None,
            processed_slots: BTreeSet::new(),
            confirmation_times: Vec::new(),
            empty_or_forked_slots: Vec::new(),
            times_from_confirmed_head: Vec::new(),
            head_regressions: 0,
            confirmed_chain_reorgs: 0,
            phantom: PhantomData,
        }
    }

    #[must_use]
    pub const fn confirmed_head_root(&self) -> Option<H256> {
        self.confirmed_head_root
    }

    #[must_use]
    pub const fn confirmed_head_slot(&self) -> Slot {
        self.confirmed_head_slot
    }

    #[must_use]
    pub const fn head_regressions(&self) -> u64 {
        self.head_regressions
    }

    #[must_use]
    pub const fn confirmed_chain_reorgs(&self) -> u64 {
        self.confirmed_chain_reorgs
    }

    #[must_use]
    pub fn processed_slot_count(&self) -> usize {
        self.processed_slots.len()
    }

    /// Returns the recorded confirmation times in seconds, one per newly confirmed block.
    #[must_use]
    pub fn confirmation_times(&self) -> &[u64] {
        &self.confirmation_times
    }

    /// Returns the slots for which no block ended up on the confirmed chain.
    #[must_use]
    pub fn empty_or_forked_slots(&self) -> &[Slot] {
        &self.empty_or_forked_slots
    }

    /// Returns the time in seconds between the confirmed head and the snapshot
    /// being processed, one sample per snapshot.
    #[must_use]
    pub fn times_from_confirmed_head(&self) -> &[u64] {
        &self.times_from_confirmed_head
    }

    /// Processes one snapshot, advancing the confirmed head if a block higher
    /// than the current one can be shown safe.
    ///
    /// Confirmation times and empty or forked slots are recorded only when the
    /// snapshot directly follows the previously processed one. A sampling gap
    /// would inflate the derived latencies, so measurements are suppressed
    /// until the samples are contiguous again.
    pub fn update_confirmed_head(&mut self, snapshot: &ForkChoiceSnapshot) -> Result<(), Error> {
        if snapshot.current_slot < self.current_slot {
            return Err(Error::SnapshotsOutOfOrder {
                snapshot_slot: snapshot.current_slot,
                processed_slot: self.current_slot,
            });
        }

        let head = snapshot.head().ok_or(Error::EmptySnapshot)?;

        let record_confirmation_times = self.current_slot + 1 >= snapshot.current_slot;

        self.current_slot = snapshot.current_slot;
        self.time_in_current_slot = snapshot.current_time_in_slot;
        self.processed_slots.insert(snapshot.current_slot);

        debug!(
            "looking for the confirmed head at slot {} (time in slot: {} s, head: {:?})",
            snapshot.current_slot, snapshot.current_time_in_slot, head.block_root,
        );

        if let Some((new_head_root, new_head_slot)) =
            self.find_confirmed_head(snapshot, head.block_root)
        {
            match new_head_slot.cmp(&self.confirmed_head_slot) {
                Ordering::Greater => {
                    if record_confirmation_times {
                        self.record_newly_confirmed(snapshot, new_head_root, new_head_slot);
                    }

                    debug!(
                        "confirmed head advanced to slot {new_head_slot} (block {new_head_root:?})",
                    );

                    self.confirmed_head_root = Some(new_head_root);
                    self.confirmed_head_slot = new_head_slot;
                }
                Ordering::Equal => {}
                Ordering::Less => {
                    warn!(
                        "confirmed head went backwards from slot {} to slot {new_head_slot} \
                         (block {new_head_root:?})",
                        self.confirmed_head_slot,
                    );

                    self.head_regressions += 1;
                }
            }
        }

        self.times_from_confirmed_head
            .push(self.time_from_confirmed_head());

        Ok(())
    }

    /// Returns the highest block on the head's chain that the rule confirms,
    /// or `None` if the walk runs past the last slot of the snapshot.
    fn find_confirmed_head(
        &mut self,
        snapshot: &ForkChoiceSnapshot,
        head_root: H256,
    ) -> Option<(H256, Slot)> {
        let mut block_root = head_root;

        loop {
            let node = snapshot.node(block_root)?;

            if self.is_confirmed(snapshot, node) {
                break Some((node.block_root, node.slot));
            }

            block_root = node.parent_root;
        }
    }

    /// [`is_confirmed_no_caching`](https://github.com/ethereum/consensus-specs/blob/dev/fork_choice/confirmation-rule.md#is_confirmed_no_caching)
    fn is_confirmed(&mut self, snapshot: &ForkChoiceSnapshot, node: &ForkChoiceNode) -> bool {
        if snapshot.finalized_checkpoint.root == node.block_root
            || self.confirmed_head_root == Some(node.block_root)
        {
            return true;
        }

        let block_epoch = misc::compute_epoch_at_slot::<P>(node.slot);
        let current_epoch = misc::compute_epoch_at_slot::<P>(self.current_slot);

        let previous_checkpoint = checkpoint_for::<P>(
            snapshot,
            node.block_root,
            current_epoch.saturating_sub(1),
        );

        if block_epoch == current_epoch {
            let justified_or_finalized = previous_checkpoint
                .is_some_and(|checkpoint_root| {
                    checkpoint_root == snapshot.justified_checkpoint.root
                        || checkpoint_root == snapshot.finalized_checkpoint.root
                });

            justified_or_finalized
                && self.is_lmd_confirmed(snapshot, node.block_root)
                && self.is_ffg_confirmed(snapshot, node)
        } else if block_epoch + 1 == current_epoch {
            // The checkpoint may already be finalized right after an epoch
            // transition. LMD safety alone is enough in that case.
            if previous_checkpoint
                .is_some_and(|checkpoint_root| checkpoint_root == snapshot.finalized_checkpoint.root)
            {
                return self.is_lmd_confirmed(snapshot, node.block_root);
            }

            let earlier_checkpoint = checkpoint_for::<P>(
                snapshot,
                node.block_root,
                current_epoch.saturating_sub(2),
            );

            previous_checkpoint == self.ffg_confirmed_checkpoint
                && previous_checkpoint == Some(snapshot.justified_checkpoint.root)
                && self.is_lmd_confirmed(snapshot, node.block_root)
                && earlier_checkpoint == Some(snapshot.finalized_checkpoint.root)
        } else {
            // Blocks two or more epochs old can no longer gather the votes
            // this rule inspects.
            false
        }
    }

    /// [`is_lmd_confirmed`](https://github.com/ethereum/consensus-specs/blob/dev/fork_choice/confirmation-rule.md#is_lmd_confirmed)
    fn is_lmd_confirmed(&self, snapshot: &ForkChoiceSnapshot, block_root: H256) -> bool {
        let mut block_root = block_root;

        loop {
            if snapshot.finalized_checkpoint.root == block_root
                || self.confirmed_head_root == Some(block_root)
            {
                break true;
            }

            let Some(node) = snapshot.node(block_root) else {
                break false;
            };

            if !self.is_one_confirmed(snapshot, node) {
                break false;
            }

            block_root = node.parent_root;
        }
    }

    /// [`is_one_confirmed`](https://github.com/ethereum/consensus-specs/blob/dev/fork_choice/confirmation-rule.md#is_one_confirmed)
    fn is_one_confirmed(&self, snapshot: &ForkChoiceSnapshot, node: &ForkChoiceNode) -> bool {
        let Some(parent) = snapshot.node(node.parent_root) else {
            return false;
        };

        // Competing branches may start anywhere after the parent, and votes keep
        // accumulating through the current slot, so both ends count toward the
        // maximum possible support.
        let maximum_support = i128::from(weights::committee_weight::<P>(
            snapshot.committee_size,
            parent.slot + 1,
            self.current_slot,
        ));

        let proposer_score = i128::from(weights::proposer_score::<P>(
            &self.chain_config,
            snapshot.committee_size,
        ));

        let support_without_boost = i128::from(node.weight) - proposer_score;
        let byzantine_threshold = i128::from(self.rule_config.byzantine_threshold());

        // The underlying condition is
        //     support / maximum_support > 1/2 * (1 + proposer_score / maximum_support) + byzantine / 100
        // multiplied through by `100 * maximum_support` to stay in integers.
        100 * support_without_boost
            > 50 * maximum_support + 50 * proposer_score + byzantine_threshold * maximum_support
    }

    /// [`is_ffg_confirmed`](https://github.com/ethereum/consensus-specs/blob/dev/fork_choice/confirmation-rule.md#is_ffg_confirmed)
    ///
    /// Only applicable to blocks in the current epoch.
    fn is_ffg_confirmed(&mut self, snapshot: &ForkChoiceSnapshot, node: &ForkChoiceNode) -> bool {
        let block_epoch = misc::compute_epoch_at_slot::<P>(node.slot);

        let Some(checkpoint_root) = checkpoint_for::<P>(snapshot, node.block_root, block_epoch)
        else {
            return false;
        };

        let Some(checkpoint_node) = snapshot.node(checkpoint_root) else {
            return false;
        };

        let proposer_score = i128::from(weights::proposer_score::<P>(
            &self.chain_config,
            snapshot.committee_size,
        ));

        // FFG support is the LMD weight of the checkpoint block without the boost.
        let ffg_support = i128::from(checkpoint_node.weight) - proposer_score;

        let total = i128::from(weights::total_active_balance::<P>(snapshot.committee_size));

        let remaining = i128::from(weights::remaining_weight_in_epoch::<P>(
            snapshot.committee_size,
            self.current_slot,
        ));

        let byzantine_threshold = i128::from(self.rule_config.byzantine_threshold());
        let slashing_threshold = i128::from(self.rule_config.slashing_threshold());

        let max_adversarial_support = [
            3 * byzantine_threshold * (total - remaining),
            3 * slashing_threshold * total,
            300 * ffg_support,
        ]
        .into_iter()
        .min()
        .expect("the array of adversarial support bounds is not empty");

        // The underlying condition is
        //     2/3 * total <= support - max_adversarial_support + (1 - byzantine / 100) * remaining
        // multiplied through by 300 to stay in integers.
        let confirmed = 200 * total
            <= 300 * ffg_support - max_adversarial_support
                + (300 - 3 * byzantine_threshold) * remaining;

        // The checkpoint of the closing epoch feeds the previous epoch check
        // in later snapshots.
        if confirmed && misc::is_last_slot_of_epoch::<P>(self.current_slot) {
            self.ffg_confirmed_checkpoint = Some(checkpoint_root);
        }

        confirmed
    }

    /// Derives confirmation times and empty or forked slots for the advance
    /// from the previous confirmed head to `new_head_root`.
    fn record_newly_confirmed(
        &mut self,
        snapshot: &ForkChoiceSnapshot,
        new_head_root: H256,
        new_head_slot: Slot,
    ) {
        let old_head_root = self.confirmed_head_root;
        let old_head_slot = self.confirmed_head_slot;

        let mut block_root = new_head_root;
        let mut previous_slot = new_head_slot;

        loop {
            if Some(block_root) == old_head_root {
                break;
            }

            let Some(node) = snapshot.node(block_root) else {
                self.report_confirmed_chain_reorg(old_head_slot, block_root);
                break;
            };

            if node.slot <= old_head_slot {
                // The first confirmation starts from an empty head. Only a
                // walk that skips over a remembered head indicates a reorg.
                if old_head_root.is_some() {
                    self.report_confirmed_chain_reorg(old_head_slot, block_root);
                }

                break;
            }

            self.record_empty_or_forked_slots(node.slot + 1, previous_slot);

            self.confirmation_times
                .push(self.confirmation_time_for(node.slot));

            previous_slot = node.slot;
            block_root = node.parent_root;
        }

        if previous_slot > old_head_slot + 1 {
            self.record_empty_or_forked_slots(old_head_slot + 1, previous_slot);
        }
    }

    fn report_confirmed_chain_reorg(&mut self, old_head_slot: Slot, reached_root: H256) {
        error!(
            "a previously confirmed block was reorganized away \
             (confirmed slot {old_head_slot}, walk reached {reached_root:?})",
        );

        self.confirmed_chain_reorgs += 1;
    }

    /// Records `start_slot..end_slot` as slots without a newly confirmed block.
    fn record_empty_or_forked_slots(&mut self, start_slot: Slot, end_slot: Slot) {
        for slot in start_slot..end_slot {
            debug!("slot {slot} has no confirmed block (empty or forked)");
            self.empty_or_forked_slots.push(slot);
        }
    }

    fn confirmation_time_for(&self, slot: Slot) -> u64 {
        (self.current_slot - slot) * self.chain_config.seconds_per_slot.get()
            + self.time_in_current_slot
    }

    fn time_from_confirmed_head(&self) -> u64 {
        self.confirmation_time_for(self.confirmed_head_slot)
    }
}

/// Returns the root of the checkpoint block for `epoch` in the chain of `block_root`.
///
/// [`get_checkpoint_block`](https://github.com/ethereum/consensus-specs/blob/dev/fork_choice/confirmation-rule.md#get_checkpoint_block)
fn checkpoint_for<P: Preset>(
    snapshot: &ForkChoiceSnapshot,
    block_root: H256,
    epoch: Epoch,
) -> Option<H256> {
    let checkpoint_slot = misc::compute_start_slot_at_epoch::<P>(epoch);
    let mut block_root = block_root;

    loop {
        let node = snapshot.node(block_root)?;

        if node.slot <= checkpoint_slot {
            break Some(node.block_root);
        }

        block_root = node.parent_root;
    }
}
