use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Result};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::types::{ChainSpec, Epoch, Genesis, Slot};

/// Default lag to wait after a slot ends so its attestations have landed in
/// the next block before we read them.
pub const DEFAULT_SLOT_LAG_SECONDS: u64 = 8;

/// Replay window over historical wall-time. The current timestamp advances
/// one slot at a time instead of tracking the wall clock.
#[derive(Debug)]
struct ReplayWindow {
    current_ts: AtomicU64,
    end_ts: Option<u64>,
}

/// Slot/epoch arithmetic anchored to the chain genesis, with optional
/// replay mode that walks forward from a fixed start timestamp.
#[derive(Debug)]
pub struct BeaconClock {
    genesis_time: u64,
    seconds_per_slot: u64,
    slots_per_epoch: u64,
    slot_lag_seconds: u64,
    replay: Option<ReplayWindow>,
}

impl BeaconClock {
    /// Create a clock from genesis info and the chain spec.
    pub fn new(genesis: &Genesis, spec: &ChainSpec) -> Result<Self> {
        if spec.seconds_per_slot == 0 {
            bail!("seconds_per_slot must be > 0");
        }

        if spec.slots_per_epoch == 0 {
            bail!("slots_per_epoch must be > 0");
        }

        Ok(Self {
            genesis_time: genesis.genesis_time,
            seconds_per_slot: spec.seconds_per_slot,
            slots_per_epoch: spec.slots_per_epoch,
            slot_lag_seconds: DEFAULT_SLOT_LAG_SECONDS,
            replay: None,
        })
    }

    /// Enable replay mode: `current_slot` derives from `start_ts` instead of
    /// wall time, and slot waits return immediately.
    pub fn enable_replay(&mut self, start_ts: u64, end_ts: Option<u64>) {
        self.replay = Some(ReplayWindow {
            current_ts: AtomicU64::new(start_ts),
            end_ts,
        });
    }

    /// Whether the clock runs in replay mode.
    pub fn is_replay_mode(&self) -> bool {
        self.replay.is_some()
    }

    /// Whether replay has walked past its configured end timestamp.
    pub fn replay_complete(&self) -> bool {
        let Some(replay) = &self.replay else {
            return false;
        };
        let Some(end_ts) = replay.end_ts else {
            return false;
        };

        replay.current_ts.load(Ordering::Relaxed) >= end_ts
    }

    fn now(&self) -> u64 {
        match &self.replay {
            Some(replay) => replay.current_ts.load(Ordering::Relaxed),
            None => unix_now(),
        }
    }

    /// Current slot. Clamped to 0 before genesis.
    pub fn current_slot(&self) -> Slot {
        self.time_to_slot(self.now())
    }

    /// Current epoch.
    pub fn current_epoch(&self) -> Epoch {
        self.slot_to_epoch(self.current_slot())
    }

    /// Slot containing the given unix timestamp. Clamped to 0 pre-genesis.
    pub fn time_to_slot(&self, timestamp: u64) -> Slot {
        if timestamp < self.genesis_time {
            return 0;
        }
        (timestamp - self.genesis_time) / self.seconds_per_slot
    }

    /// Epoch containing the given slot.
    pub fn slot_to_epoch(&self, slot: Slot) -> Epoch {
        slot / self.slots_per_epoch
    }

    /// First slot of the given epoch.
    pub fn epoch_to_slot(&self, epoch: Epoch) -> Slot {
        epoch * self.slots_per_epoch
    }

    /// Unix timestamp at which the slot starts.
    pub fn slot_start_time(&self, slot: Slot) -> u64 {
        self.genesis_time + slot * self.seconds_per_slot
    }

    /// Unix timestamp at which the slot is considered complete for
    /// processing, including the attestation lag.
    pub fn slot_end_time(&self, slot: Slot) -> u64 {
        self.slot_start_time(slot) + self.seconds_per_slot + self.slot_lag_seconds
    }

    /// Whether the slot opens an epoch.
    pub fn is_first_slot_of_epoch(&self, slot: Slot) -> bool {
        slot % self.slots_per_epoch == 0
    }

    /// Whether the slot sits at `position` within its epoch.
    pub fn is_slot_in_epoch(&self, slot: Slot, position: u64) -> bool {
        slot % self.slots_per_epoch == position
    }

    pub fn slots_per_epoch(&self) -> u64 {
        self.slots_per_epoch
    }

    pub fn seconds_per_slot(&self) -> u64 {
        self.seconds_per_slot
    }

    pub fn genesis_time(&self) -> u64 {
        self.genesis_time
    }

    /// Suspend until the slot has completed (end time plus lag). Returns
    /// immediately in replay mode; aborts on cancellation.
    pub async fn wait_until_slot(&self, slot: Slot, cancel: &CancellationToken) -> Result<()> {
        if self.replay.is_some() {
            return Ok(());
        }

        let target = self.slot_end_time(slot);
        let now = unix_now();

        if now < target {
            let wait = Duration::from_secs(target - now);
            debug!(slot, wait_secs = target - now, "waiting for slot to complete");

            tokio::select! {
                _ = cancel.cancelled() => bail!("cancelled while waiting for slot {slot}"),
                _ = tokio::time::sleep(wait) => {}
            }
        }

        Ok(())
    }

    /// Wait out the current slot and return the number of the next one. In
    /// replay mode the clock steps forward one slot instead of sleeping.
    pub async fn wait_until_next_slot(&self, cancel: &CancellationToken) -> Result<Slot> {
        let current = self.current_slot();

        if let Some(replay) = &self.replay {
            replay
                .current_ts
                .fetch_add(self.seconds_per_slot, Ordering::Relaxed);
            return Ok(current + 1);
        }

        self.wait_until_slot(current, cancel).await?;
        Ok(current + 1)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
