use arithmetic::{NonZeroExt as _, U64Ext as _};
use helper_functions::misc;
use typenum::Unsigned as _;
use types::{
    config::Config as ChainConfig,
    preset::Preset,
    primitives::{Gwei, Slot},
};

/// Per-mille inflation applied to committee weight estimates for slot ranges
/// that do not cover a full epoch. See
/// <https://gist.github.com/saltiniroberto/9ee53d29c33878d79417abb2b4468c20>.
const COMMITTEE_WEIGHT_ESTIMATION_ADJUSTMENT_FACTOR: u128 = 5;

/// Returns the total active balance implied by `committee_size`.
///
/// Every validator is assumed to hold exactly `MAX_EFFECTIVE_BALANCE`.
#[must_use]
pub fn total_active_balance<P: Preset>(committee_size: u64) -> Gwei {
    P::SlotsPerEpoch::U64 * committee_size * P::MAX_EFFECTIVE_BALANCE
}

/// Estimates the combined weight of the committees for `start_slot..=end_slot`.
///
/// [`get_committee_weight_between_slots`](https://github.com/ethereum/consensus-specs/blob/dev/fork_choice/confirmation-rule.md#get_committee_weight_between_slots)
#[must_use]
pub fn committee_weight<P: Preset>(committee_size: u64, start_slot: Slot, end_slot: Slot) -> Gwei {
    if start_slot > end_slot {
        return 0;
    }

    let total_active_balance = total_active_balance::<P>(committee_size);

    if is_full_validator_set_covered::<P>(start_slot, end_slot) {
        return total_active_balance;
    }

    let slots_per_epoch = u128::from(P::SlotsPerEpoch::U64);
    let total = u128::from(total_active_balance);

    let start_epoch = misc::compute_epoch_at_slot::<P>(start_slot);
    let end_epoch = misc::compute_epoch_at_slot::<P>(end_slot);

    let weight = if start_epoch == end_epoch {
        let slots = u128::from(end_slot - start_slot + 1);
        (slots * total).div_ceil(slots_per_epoch)
    } else {
        // The range spans an epoch boundary without covering either epoch in full.
        // Weigh each side pro rata. Both terms carry an extra factor of
        // `slots_per_epoch` that the final division removes.
        let slots_in_end_epoch = u128::from(misc::slots_since_epoch_start::<P>(end_slot) + 1);
        let remaining_slots_in_end_epoch = slots_per_epoch - slots_in_end_epoch;
        let slots_in_start_epoch =
            slots_per_epoch - u128::from(misc::slots_since_epoch_start::<P>(start_slot));

        let end_epoch_weight = slots_in_end_epoch * total;
        let start_epoch_weight = (slots_in_start_epoch * remaining_slots_in_end_epoch * total)
            .div_ceil(slots_per_epoch);

        let estimate = (start_epoch_weight + end_epoch_weight).div_ceil(slots_per_epoch);

        adjust_committee_weight_estimate(estimate)
    };

    u64::try_from(weight).expect("committee weight should fit in u64")
}

/// Returns the weight of the committees between the slot after `current_slot`
/// and the last slot of its epoch. The current slot is treated as already cast.
#[must_use]
pub fn remaining_weight_in_epoch<P: Preset>(committee_size: u64, current_slot: Slot) -> Gwei {
    let remaining_slots =
        P::SlotsPerEpoch::U64 - current_slot.mod_typenum::<P::SlotsPerEpoch>() - 1;

    remaining_slots * committee_size * P::MAX_EFFECTIVE_BALANCE
}

/// Returns the score a timely proposal gains on top of its attestation support.
///
/// [`get_proposer_score`](https://github.com/ethereum/consensus-specs/blob/dev/specs/phase0/fork-choice.md#get_proposer_score)
#[must_use]
pub fn proposer_score<P: Preset>(chain_config: &ChainConfig, committee_size: u64) -> Gwei {
    // `total_active_balance` is a multiple of the epoch length, so this division is exact.
    let committee_weight = total_active_balance::<P>(committee_size) / P::SlotsPerEpoch::non_zero();

    committee_weight * chain_config.proposer_score_boost / 100
}

/// Returns whether `start_slot..=end_slot` contains every committee of some epoch.
///
/// [`is_full_validator_set_covered`](https://github.com/ethereum/consensus-specs/blob/dev/fork_choice/confirmation-rule.md#is_full_validator_set_covered)
fn is_full_validator_set_covered<P: Preset>(start_slot: Slot, end_slot: Slot) -> bool {
    let start_epoch = misc::compute_epoch_at_slot::<P>(start_slot);
    let end_epoch = misc::compute_epoch_at_slot::<P>(end_slot);
    let at_boundary =
        misc::is_epoch_start::<P>(start_slot) || misc::is_last_slot_of_epoch::<P>(end_slot);

    end_epoch > start_epoch + 1 || (at_boundary && end_slot - start_slot + 1 >= P::SlotsPerEpoch::U64)
}

/// [`adjust_committee_weight_estimate_to_ensure_safety`](https://github.com/ethereum/consensus-specs/blob/dev/fork_choice/confirmation-rule.md#adjust_committee_weight_estimate_to_ensure_safety)
const fn adjust_committee_weight_estimate(estimate: u128) -> u128 {
    (estimate * (1000 + COMMITTEE_WEIGHT_ESTIMATION_ADJUSTMENT_FACTOR)).div_ceil(1000)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;
    use types::preset::Minimal;

    use super::*;

    const COMMITTEE_SIZE: u64 = 100;
    const TOTAL: Gwei = 25_600_000_000_000;

    #[test]
    fn total_active_balance_scales_with_committee_size() {
        assert_eq!(total_active_balance::<Minimal>(COMMITTEE_SIZE), TOTAL);
        assert_eq!(total_active_balance::<Minimal>(1), 256_000_000_000);
    }

    #[test_case(5, 4, 0; "an inverted range has no weight")]
    #[test_case(0, 7, TOTAL; "an aligned epoch carries the full balance")]
    #[test_case(8, 15, TOTAL; "a later aligned epoch carries the full balance")]
    #[test_case(0, 15, TOTAL; "two full epochs cap at the full balance")]
    #[test_case(1, 16, TOTAL; "an unaligned range around a whole epoch caps too")]
    #[test_case(3, 5, 9_600_000_000_000; "a range within one epoch is pro rated")]
    #[test_case(8, 8, 3_200_000_000_000; "a single slot carries one committee")]
    #[test_case(1, 8, 22_914_000_000_000; "a boundary crossing is inflated for safety")]
    #[test_case(4, 12, 20_904_000_000_000; "another boundary crossing")]
    fn committee_weight_follows_the_estimation_policy(
        start_slot: Slot,
        end_slot: Slot,
        expected: Gwei,
    ) {
        assert_eq!(
            committee_weight::<Minimal>(COMMITTEE_SIZE, start_slot, end_slot),
            expected,
        );
    }

    #[test]
    fn committee_weight_never_decreases_as_the_range_grows() {
        let mut previous = 0;

        for end_slot in 1..=24 {
            let weight = committee_weight::<Minimal>(COMMITTEE_SIZE, 1, end_slot);

            assert!(
                weight >= previous,
                "weight shrank at slot {end_slot}: {weight} < {previous}",
            );

            previous = weight;
        }
    }

    #[test_case(0, 22_400_000_000_000; "at the epoch start the rest of the epoch is outstanding")]
    #[test_case(5, 6_400_000_000_000; "mid epoch")]
    #[test_case(7, 0; "at the last slot no votes are outstanding")]
    #[test_case(13, 6_400_000_000_000; "the slot position wraps per epoch")]
    fn remaining_weight_excludes_the_current_slot(current_slot: Slot, expected: Gwei) {
        assert_eq!(
            remaining_weight_in_epoch::<Minimal>(COMMITTEE_SIZE, current_slot),
            expected,
        );
    }

    #[test]
    fn proposer_score_is_a_fraction_of_one_committee_weight() {
        let chain_config = ChainConfig::minimal();

        assert_eq!(
            proposer_score::<Minimal>(&chain_config, COMMITTEE_SIZE),
            1_280_000_000_000,
        );
    }
}
