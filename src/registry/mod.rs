use std::collections::HashMap;

use anyhow::{bail, Result};
use parking_lot::RwLock;

use crate::config::WatchedKey;
use crate::types::{Gwei, SignedGwei, Validator, ValidatorIndex, STAKE_UNIT_GWEI};

/// Reserved label carried by every watched validator, also used as the key
/// for the network-wide aggregate record.
pub const LABEL_ALL_NETWORK: &str = "scope:all-network";

/// Reserved label distinguishing the user's validators of interest.
pub const LABEL_WATCHED: &str = "scope:watched";

/// A watched validator: its latest snapshot plus the mutable performance
/// counters the orchestrator maintains across slots.
#[derive(Debug, Clone)]
pub struct WatchedValidator {
    pub validator: Validator,
    pub labels: Vec<String>,
    /// Stake weight: effective balance in units of 32 ETH.
    pub weight: f64,

    pub missed_attestations: u64,
    pub suboptimal_source_votes: u64,
    pub suboptimal_target_votes: u64,
    pub suboptimal_head_votes: u64,
    /// Ideal rewards for the last processed epoch. Overwritten, not summed.
    pub ideal_consensus_rewards: Gwei,
    /// Actual rewards for the last processed epoch. Can be negative.
    pub consensus_rewards: SignedGwei,
    pub proposed_blocks: u64,
    pub proposed_blocks_finalized: u64,
    pub missed_blocks: u64,
    pub missed_blocks_finalized: u64,
    pub future_block_proposals: u64,
    pub attestation_duties: u64,
    pub attestation_duties_success: u64,
    pub consecutive_missed_attestations: u64,
}

impl WatchedValidator {
    fn new(validator: Validator, labels: Vec<String>) -> Self {
        let weight = validator.data.effective_balance as f64 / STAKE_UNIT_GWEI as f64;

        Self {
            validator,
            labels,
            weight,
            missed_attestations: 0,
            suboptimal_source_votes: 0,
            suboptimal_target_votes: 0,
            suboptimal_head_votes: 0,
            ideal_consensus_rewards: 0,
            consensus_rewards: 0,
            proposed_blocks: 0,
            proposed_blocks_finalized: 0,
            missed_blocks: 0,
            missed_blocks_finalized: 0,
            future_block_proposals: 0,
            attestation_duties: 0,
            attestation_duties_success: 0,
            consecutive_missed_attestations: 0,
        }
    }

    /// The first user label, for log lines that want one name per validator.
    pub fn primary_label(&self) -> &str {
        self.labels
            .iter()
            .find(|label| !label.starts_with("scope:") && !label.starts_with("key:"))
            .map_or("unknown", String::as_str)
    }
}

#[derive(Default)]
struct AllInner {
    by_index: HashMap<ValidatorIndex, Validator>,
    by_pubkey: HashMap<String, ValidatorIndex>,
}

/// The full network validator set, keyed by index and by pubkey.
///
/// Single-writer, many-reader: `update` replaces both indices wholesale
/// under the write lock; reads clone out of the read lock so callers never
/// hold it across await points.
#[derive(Default)]
pub struct AllValidators {
    inner: RwLock<AllInner>,
}

impl AllValidators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole snapshot.
    pub fn update(&self, validators: Vec<Validator>) {
        let mut by_index = HashMap::with_capacity(validators.len());
        let mut by_pubkey = HashMap::with_capacity(validators.len());

        for validator in validators {
            by_pubkey.insert(validator.data.pubkey.clone(), validator.index);
            by_index.insert(validator.index, validator);
        }

        let mut inner = self.inner.write();
        inner.by_index = by_index;
        inner.by_pubkey = by_pubkey;
    }

    pub fn get(&self, index: ValidatorIndex) -> Option<Validator> {
        self.inner.read().by_index.get(&index).cloned()
    }

    pub fn get_by_pubkey(&self, pubkey: &str) -> Option<Validator> {
        let inner = self.inner.read();
        let index = inner.by_pubkey.get(pubkey)?;
        inner.by_index.get(index).cloned()
    }

    pub fn count(&self) -> usize {
        self.inner.read().by_index.len()
    }

    /// Snapshot all entries for aggregation.
    pub fn get_all(&self) -> Vec<Validator> {
        self.inner.read().by_index.values().cloned().collect()
    }
}

#[derive(Default)]
struct WatchedInner {
    by_index: HashMap<ValidatorIndex, WatchedValidator>,
    by_pubkey: HashMap<String, ValidatorIndex>,
    by_label: HashMap<String, Vec<ValidatorIndex>>,
}

/// The watched subset, enriched with labels and per-validator counters.
///
/// `update_metrics` is the only mutation path for counters; it serializes
/// with snapshot reads through the registry's write lock, so aggregation
/// never observes a torn update.
#[derive(Default)]
pub struct WatchedValidators {
    inner: RwLock<WatchedInner>,
}

impl WatchedValidators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the registry from a validator snapshot and the configured
    /// watched keys. Entries are recreated, so counters reset.
    pub fn update(&self, validators: Vec<Validator>, watched_keys: &[WatchedKey]) {
        let config_by_pubkey: HashMap<&str, &WatchedKey> = watched_keys
            .iter()
            .map(|key| (key.public_key.as_str(), key))
            .collect();

        let mut inner_next = WatchedInner::default();

        for validator in validators {
            let Some(key) = config_by_pubkey.get(validator.data.pubkey.as_str()) else {
                continue;
            };

            let mut labels = vec![LABEL_ALL_NETWORK.to_string(), LABEL_WATCHED.to_string()];
            labels.extend(key.labels.iter().cloned());

            let index = validator.index;
            for label in &labels {
                inner_next
                    .by_label
                    .entry(label.clone())
                    .or_default()
                    .push(index);
            }

            inner_next
                .by_pubkey
                .insert(validator.data.pubkey.clone(), index);
            inner_next
                .by_index
                .insert(index, WatchedValidator::new(validator, labels));
        }

        *self.inner.write() = inner_next;
    }

    pub fn get(&self, index: ValidatorIndex) -> Option<WatchedValidator> {
        self.inner.read().by_index.get(&index).cloned()
    }

    pub fn get_by_pubkey(&self, pubkey: &str) -> Option<WatchedValidator> {
        let inner = self.inner.read();
        let index = inner.by_pubkey.get(pubkey)?;
        inner.by_index.get(index).cloned()
    }

    /// All validators carrying the given label.
    pub fn get_by_label(&self, label: &str) -> Vec<WatchedValidator> {
        let inner = self.inner.read();

        let Some(indices) = inner.by_label.get(label) else {
            return Vec::new();
        };

        indices
            .iter()
            .filter_map(|index| inner.by_index.get(index).cloned())
            .collect()
    }

    /// All distinct labels present in the registry.
    pub fn labels(&self) -> Vec<String> {
        self.inner.read().by_label.keys().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.inner.read().by_index.len()
    }

    /// Snapshot all entries for aggregation.
    pub fn get_all(&self) -> Vec<WatchedValidator> {
        self.inner.read().by_index.values().cloned().collect()
    }

    /// Indices of all watched validators.
    pub fn indices(&self) -> Vec<ValidatorIndex> {
        self.inner.read().by_index.keys().copied().collect()
    }

    /// Mutate one validator's counters under the write lock.
    pub fn update_metrics(
        &self,
        index: ValidatorIndex,
        mutate: impl FnOnce(&mut WatchedValidator),
    ) -> Result<()> {
        let mut inner = self.inner.write();

        let Some(validator) = inner.by_index.get_mut(&index) else {
            bail!("validator {index} not found in watched set");
        };

        mutate(validator);
        Ok(())
    }

    /// Zero every counter on every entry.
    pub fn reset_metrics(&self) {
        let mut inner = self.inner.write();

        for validator in inner.by_index.values_mut() {
            validator.missed_attestations = 0;
            validator.suboptimal_source_votes = 0;
            validator.suboptimal_target_votes = 0;
            validator.suboptimal_head_votes = 0;
            validator.ideal_consensus_rewards = 0;
            validator.consensus_rewards = 0;
            validator.proposed_blocks = 0;
            validator.proposed_blocks_finalized = 0;
            validator.missed_blocks = 0;
            validator.missed_blocks_finalized = 0;
            validator.future_block_proposals = 0;
            validator.attestation_duties = 0;
            validator.attestation_duties_success = 0;
            validator.consecutive_missed_attestations = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ValidatorData, ValidatorStatus};

    fn make_validator(index: ValidatorIndex, pubkey: &str) -> Validator {
        Validator {
            index,
            balance: STAKE_UNIT_GWEI,
            status: ValidatorStatus::ActiveOngoing,
            data: ValidatorData {
                pubkey: pubkey.to_string(),
                withdrawal_credentials: "0x01aa".to_string(),
                effective_balance: STAKE_UNIT_GWEI,
                slashed: false,
                activation_eligibility_epoch: 0,
                activation_epoch: 0,
                exit_epoch: u64::MAX,
                withdrawable_epoch: u64::MAX,
            },
        }
    }

    fn watched_key(pubkey: &str, labels: &[&str]) -> WatchedKey {
        WatchedKey {
            public_key: pubkey.to_string(),
            labels: labels.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_all_validators_update_replaces_snapshot() {
        let registry = AllValidators::new();
        registry.update(vec![make_validator(1, "0xaa"), make_validator(2, "0xbb")]);
        assert_eq!(registry.count(), 2);
        assert!(registry.get(1).is_some());
        assert_eq!(registry.get_by_pubkey("0xbb").expect("present").index, 2);

        // Wholesale replacement drops entries absent from the new snapshot.
        registry.update(vec![make_validator(3, "0xcc")]);
        assert_eq!(registry.count(), 1);
        assert!(registry.get(1).is_none());
        assert!(registry.get_by_pubkey("0xaa").is_none());
        assert!(registry.get(3).is_some());
    }

    #[test]
    fn test_watched_update_filters_to_configured_keys() {
        let registry = WatchedValidators::new();
        let keys = vec![watched_key("0xaa", &["operator:kiln"])];

        registry.update(
            vec![make_validator(1, "0xaa"), make_validator(2, "0xbb")],
            &keys,
        );

        assert_eq!(registry.count(), 1);
        let watched = registry.get(1).expect("watched");
        assert_eq!(
            watched.labels,
            vec![
                LABEL_ALL_NETWORK.to_string(),
                LABEL_WATCHED.to_string(),
                "operator:kiln".to_string(),
            ],
        );
        assert_eq!(watched.primary_label(), "operator:kiln");
        assert!((watched.weight - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_watched_label_index() {
        let registry = WatchedValidators::new();
        let keys = vec![
            watched_key("0xaa", &["operator:kiln"]),
            watched_key("0xbb", &["operator:kiln", "region:eu"]),
        ];

        registry.update(
            vec![make_validator(1, "0xaa"), make_validator(2, "0xbb")],
            &keys,
        );

        assert_eq!(registry.get_by_label("operator:kiln").len(), 2);
        assert_eq!(registry.get_by_label("region:eu").len(), 1);
        assert_eq!(registry.get_by_label(LABEL_WATCHED).len(), 2);
        assert!(registry.get_by_label("operator:other").is_empty());

        let mut labels = registry.labels();
        labels.sort();
        assert_eq!(
            labels,
            vec![
                "operator:kiln".to_string(),
                "region:eu".to_string(),
                LABEL_ALL_NETWORK.to_string(),
                LABEL_WATCHED.to_string(),
            ],
        );
    }

    #[test]
    fn test_update_metrics_mutates_under_lock() {
        let registry = WatchedValidators::new();
        registry.update(
            vec![make_validator(1, "0xaa")],
            &[watched_key("0xaa", &[])],
        );

        registry
            .update_metrics(1, |v| {
                v.attestation_duties += 1;
                v.consecutive_missed_attestations += 1;
            })
            .expect("validator exists");

        let watched = registry.get(1).expect("watched");
        assert_eq!(watched.attestation_duties, 1);
        assert_eq!(watched.consecutive_missed_attestations, 1);
    }

    #[test]
    fn test_update_metrics_unknown_index_errors() {
        let registry = WatchedValidators::new();
        let result = registry.update_metrics(42, |v| v.missed_blocks += 1);
        assert!(result.is_err());
    }

    #[test]
    fn test_counters_reset_on_update() {
        let registry = WatchedValidators::new();
        let keys = vec![watched_key("0xaa", &[])];

        registry.update(vec![make_validator(1, "0xaa")], &keys);
        registry
            .update_metrics(1, |v| v.proposed_blocks = 7)
            .expect("validator exists");

        registry.update(vec![make_validator(1, "0xaa")], &keys);
        assert_eq!(registry.get(1).expect("watched").proposed_blocks, 0);
    }

    #[test]
    fn test_reset_metrics_zeroes_counters() {
        let registry = WatchedValidators::new();
        registry.update(
            vec![make_validator(1, "0xaa")],
            &[watched_key("0xaa", &[])],
        );

        registry
            .update_metrics(1, |v| {
                v.missed_attestations = 3;
                v.consensus_rewards = -50;
                v.ideal_consensus_rewards = 6000;
            })
            .expect("validator exists");

        registry.reset_metrics();

        let watched = registry.get(1).expect("watched");
        assert_eq!(watched.missed_attestations, 0);
        assert_eq!(watched.consensus_rewards, 0);
        assert_eq!(watched.ideal_consensus_rewards, 0);
    }

    #[test]
    fn test_weight_scales_with_effective_balance() {
        let registry = WatchedValidators::new();
        let mut validator = make_validator(1, "0xaa");
        validator.data.effective_balance = STAKE_UNIT_GWEI / 2;

        registry.update(vec![validator], &[watched_key("0xaa", &[])]);

        let watched = registry.get(1).expect("watched");
        assert!((watched.weight - 0.5).abs() < f64::EPSILON);
    }
}
