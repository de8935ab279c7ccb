//! Wall clock to slot arithmetic.
//!
//! The collector uses this to decide which slot a sample belongs to and how far
//! into the slot it was taken. Sampled times also name the snapshot files, so the
//! same arithmetic must be reproducible from recorded data alone. That is why
//! [`Tick::at_time`] takes the time as a parameter instead of reading the clock:
//! only [`Tick::current`] touches [`SystemTime`].

use std::time::SystemTime;

use anyhow::Result;
use helper_functions::misc;
use types::{
    config::Config,
    preset::Preset,
    primitives::{Epoch, Slot, UnixSeconds},
};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Tick {
    pub slot: Slot,
    pub time_in_slot: u64,
}

impl Tick {
    #[must_use]
    pub const fn new(slot: Slot, time_in_slot: u64) -> Self {
        Self { slot, time_in_slot }
    }

    /// Computes the tick at `time` for a chain with the given genesis time.
    ///
    /// Times before genesis clamp to the start of slot 0 rather than underflowing.
    #[must_use]
    pub fn at_time(config: &Config, time: UnixSeconds, genesis_time: UnixSeconds) -> Self {
        let seconds_since_genesis = time.saturating_sub(genesis_time);
        let seconds_per_slot = config.seconds_per_slot;

        Self {
            slot: seconds_since_genesis / seconds_per_slot,
            time_in_slot: seconds_since_genesis % seconds_per_slot,
        }
    }

    pub fn current(config: &Config, genesis_time: UnixSeconds) -> Result<Self> {
        let duration_since_unix_epoch = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH)?;

        Ok(Self::at_time(
            config,
            duration_since_unix_epoch.as_secs(),
            genesis_time,
        ))
    }

    #[must_use]
    pub fn epoch<P: Preset>(self) -> Epoch {
        misc::compute_epoch_at_slot::<P>(self.slot)
    }
}
