use crate::error::Error;

/// Validated adversary assumptions for the confirmation rule.
///
/// Both thresholds are integer percentages of the total active validator weight.
/// `byzantine_threshold` bounds the share assumed to be adversarial.
/// `slashing_threshold` bounds the share the adversary is willing to get slashed.
#[derive(Clone, Copy, Debug)]
pub struct RuleConfig {
    byzantine_threshold: u64,
    slashing_threshold: u64,
}

impl RuleConfig {
    /// Upper bound for both thresholds. The safety argument behind the rule breaks
    /// down once the adversary controls a third of the total weight.
    pub const MAX_THRESHOLD: u64 = 33;

    pub fn new(byzantine_threshold: u64, slashing_threshold: u64) -> Result<Self, Error> {
        (slashing_threshold <= byzantine_threshold && byzantine_threshold <= Self::MAX_THRESHOLD)
            .then_some(Self {
                byzantine_threshold,
                slashing_threshold,
            })
            .ok_or(Error::ThresholdsOutOfRange {
                byzantine: byzantine_threshold,
                slashing: slashing_threshold,
            })
    }

    #[must_use]
    pub const fn byzantine_threshold(self) -> u64 {
        self.byzantine_threshold
    }

    #[must_use]
    pub const fn slashing_threshold(self) -> u64 {
        self.slashing_threshold
    }
}
