use std::collections::HashMap;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use tracing::debug;

use crate::beacon::Client;
use crate::types::{Epoch, ProposerDuty, Slot, ValidatorIndex};

/// Slot → proposer map covering the current and next epoch.
///
/// Entries older than two epochs are evicted by `cleanup`, which the
/// orchestrator calls once per slot.
#[derive(Default)]
pub struct Schedule {
    duties: RwLock<HashMap<Slot, ValidatorIndex>>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the proposer duties for an epoch and merge them in.
    pub async fn update(&self, client: &Client, epoch: Epoch) -> Result<()> {
        let duties = client
            .get_proposer_duties(epoch)
            .await
            .with_context(|| format!("fetching proposer duties for epoch {epoch}"))?;

        let count = duties.len();
        self.insert(&duties);

        debug!(epoch, count, "updated proposer schedule");
        Ok(())
    }

    /// Insert duties directly (used by `update` and by tests).
    pub fn insert(&self, duties: &[ProposerDuty]) {
        let mut map = self.duties.write();
        for duty in duties {
            map.insert(duty.slot, duty.validator_index);
        }
    }

    /// Proposer scheduled for the slot, if known.
    pub fn get_proposer(&self, slot: Slot) -> Option<ValidatorIndex> {
        self.duties.read().get(&slot).copied()
    }

    /// Whether a proposer is scheduled for the slot.
    pub fn has_proposer(&self, slot: Slot) -> bool {
        self.duties.read().contains_key(&slot)
    }

    /// All scheduled slots for one validator, unordered.
    pub fn duties_for(&self, validator: ValidatorIndex) -> Vec<Slot> {
        self.duties
            .read()
            .iter()
            .filter(|(_, proposer)| **proposer == validator)
            .map(|(slot, _)| *slot)
            .collect()
    }

    /// Drop all entries strictly before `before_slot`.
    pub fn cleanup(&self, before_slot: Slot) {
        self.duties.write().retain(|slot, _| *slot >= before_slot);
    }

    pub fn count(&self) -> usize {
        self.duties.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duty(slot: Slot, validator_index: ValidatorIndex) -> ProposerDuty {
        ProposerDuty {
            pubkey: "0xaa".to_string(),
            validator_index,
            slot,
        }
    }

    #[test]
    fn test_insert_and_lookup() {
        let schedule = Schedule::new();
        schedule.insert(&[duty(100, 7), duty(101, 8)]);

        assert_eq!(schedule.get_proposer(100), Some(7));
        assert_eq!(schedule.get_proposer(101), Some(8));
        assert!(schedule.has_proposer(100));
        assert!(!schedule.has_proposer(102));
        assert_eq!(schedule.count(), 2);
    }

    #[test]
    fn test_insert_overwrites_slot() {
        let schedule = Schedule::new();
        schedule.insert(&[duty(100, 7)]);
        schedule.insert(&[duty(100, 9)]);

        assert_eq!(schedule.get_proposer(100), Some(9));
        assert_eq!(schedule.count(), 1);
    }

    #[test]
    fn test_duties_for_validator() {
        let schedule = Schedule::new();
        schedule.insert(&[duty(100, 7), duty(110, 7), duty(120, 8)]);

        let mut slots = schedule.duties_for(7);
        slots.sort_unstable();
        assert_eq!(slots, vec![100, 110]);
        assert!(schedule.duties_for(99).is_empty());
    }

    #[test]
    fn test_cleanup_evicts_old_slots() {
        let schedule = Schedule::new();
        schedule.insert(&[duty(10, 1), duty(63, 2), duty(64, 3), duty(100, 4)]);

        schedule.cleanup(64);

        assert!(!schedule.has_proposer(10));
        assert!(!schedule.has_proposer(63));
        assert!(schedule.has_proposer(64));
        assert!(schedule.has_proposer(100));
        assert_eq!(schedule.count(), 2);
    }
}
