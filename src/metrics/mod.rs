use std::collections::HashMap;

use rayon::prelude::*;

use crate::registry::WatchedValidator;
use crate::types::{
    validator_type, Gwei, SignedGwei, Validator, ValidatorIndex, ValidatorStatus,
    STAKE_UNIT_GWEI,
};

/// Cap on representative offender examples kept per category.
const MAX_EXAMPLES: usize = 5;

/// One representative validator for a log line.
#[derive(Debug, Clone)]
pub struct ValidatorExample {
    pub index: ValidatorIndex,
    pub pubkey: String,
    pub value: u64,
}

/// Aggregated metrics for one label.
#[derive(Debug, Clone, Default)]
pub struct LabelMetrics {
    pub validator_count: u64,
    pub stake_count: f64,

    pub missed_attestations: u64,
    pub missed_attestations_stake: f64,
    pub suboptimal_source_votes: u64,
    pub suboptimal_source_votes_stake: f64,
    pub suboptimal_target_votes: u64,
    pub suboptimal_target_votes_stake: f64,
    pub suboptimal_head_votes: u64,
    pub suboptimal_head_votes_stake: f64,

    pub proposed_blocks: u64,
    pub proposed_blocks_finalized: u64,
    pub missed_blocks: u64,
    pub missed_blocks_finalized: u64,
    pub future_block_proposals: u64,

    pub ideal_consensus_rewards: Gwei,
    pub consensus_rewards: SignedGwei,
    pub consensus_rewards_rate: f64,

    pub attestation_duties: u64,
    pub attestation_duties_success: u64,
    pub attestation_duties_rate: f64,
    pub attestation_duties_stake: f64,

    pub status_counts: HashMap<ValidatorStatus, u64>,
    pub status_stakes: HashMap<ValidatorStatus, f64>,

    /// Keyed by withdrawal-credentials type: "0", "1", "2".
    pub type_counts: HashMap<&'static str, u64>,
    pub type_stakes: HashMap<&'static str, f64>,

    pub slashed_count: u64,
    pub slashed_stake: f64,

    pub max_consecutive_missed: u64,
    pub max_consecutive_missed_stake: f64,

    pub missed_attestation_examples: Vec<ValidatorExample>,
    pub suboptimal_source_examples: Vec<ValidatorExample>,
    pub suboptimal_target_examples: Vec<ValidatorExample>,
    pub suboptimal_head_examples: Vec<ValidatorExample>,
    pub missed_block_examples: Vec<ValidatorExample>,
}

impl LabelMetrics {
    /// Fold one watched validator into this record.
    fn accumulate(&mut self, v: &WatchedValidator) {
        let status = v.validator.status;
        let weight = v.weight;

        self.validator_count += 1;
        self.stake_count += weight;
        *self.status_counts.entry(status).or_default() += 1;
        *self.status_stakes.entry(status).or_default() += weight;

        let vtype = validator_type(&v.validator.data.withdrawal_credentials);
        *self.type_counts.entry(vtype).or_default() += 1;
        *self.type_stakes.entry(vtype).or_default() += weight;

        if v.validator.data.slashed {
            self.slashed_count += 1;
            self.slashed_stake += weight;
        }

        self.max_consecutive_missed =
            self.max_consecutive_missed.max(v.consecutive_missed_attestations);
        self.max_consecutive_missed_stake = self
            .max_consecutive_missed_stake
            .max(v.consecutive_missed_attestations as f64 * weight);

        // Performance counters only cover validators expected to attest.
        if status.is_active() {
            self.missed_attestations += v.missed_attestations;
            self.missed_attestations_stake += v.missed_attestations as f64 * weight;
            self.suboptimal_source_votes += v.suboptimal_source_votes;
            self.suboptimal_source_votes_stake += v.suboptimal_source_votes as f64 * weight;
            self.suboptimal_target_votes += v.suboptimal_target_votes;
            self.suboptimal_target_votes_stake += v.suboptimal_target_votes as f64 * weight;
            self.suboptimal_head_votes += v.suboptimal_head_votes;
            self.suboptimal_head_votes_stake += v.suboptimal_head_votes as f64 * weight;
            self.ideal_consensus_rewards += v.ideal_consensus_rewards;
            self.consensus_rewards += v.consensus_rewards;
            self.attestation_duties += v.attestation_duties;
            self.attestation_duties_success += v.attestation_duties_success;
            self.attestation_duties_stake += v.attestation_duties as f64 * weight;
        }

        // A validator can propose in any status, so block counters always
        // aggregate.
        self.proposed_blocks += v.proposed_blocks;
        self.proposed_blocks_finalized += v.proposed_blocks_finalized;
        self.missed_blocks += v.missed_blocks;
        self.missed_blocks_finalized += v.missed_blocks_finalized;
        self.future_block_proposals += v.future_block_proposals;

        push_example(
            &mut self.missed_attestation_examples,
            v,
            v.missed_attestations,
        );
        push_example(
            &mut self.suboptimal_source_examples,
            v,
            v.suboptimal_source_votes,
        );
        push_example(
            &mut self.suboptimal_target_examples,
            v,
            v.suboptimal_target_votes,
        );
        push_example(
            &mut self.suboptimal_head_examples,
            v,
            v.suboptimal_head_votes,
        );
        push_example(&mut self.missed_block_examples, v, v.missed_blocks);
    }

    /// Fold another partial record into this one.
    fn merge(&mut self, other: LabelMetrics) {
        self.validator_count += other.validator_count;
        self.stake_count += other.stake_count;
        self.missed_attestations += other.missed_attestations;
        self.missed_attestations_stake += other.missed_attestations_stake;
        self.suboptimal_source_votes += other.suboptimal_source_votes;
        self.suboptimal_source_votes_stake += other.suboptimal_source_votes_stake;
        self.suboptimal_target_votes += other.suboptimal_target_votes;
        self.suboptimal_target_votes_stake += other.suboptimal_target_votes_stake;
        self.suboptimal_head_votes += other.suboptimal_head_votes;
        self.suboptimal_head_votes_stake += other.suboptimal_head_votes_stake;
        self.proposed_blocks += other.proposed_blocks;
        self.proposed_blocks_finalized += other.proposed_blocks_finalized;
        self.missed_blocks += other.missed_blocks;
        self.missed_blocks_finalized += other.missed_blocks_finalized;
        self.future_block_proposals += other.future_block_proposals;
        self.ideal_consensus_rewards += other.ideal_consensus_rewards;
        self.consensus_rewards += other.consensus_rewards;
        self.attestation_duties += other.attestation_duties;
        self.attestation_duties_success += other.attestation_duties_success;
        self.attestation_duties_stake += other.attestation_duties_stake;
        self.slashed_count += other.slashed_count;
        self.slashed_stake += other.slashed_stake;

        self.max_consecutive_missed =
            self.max_consecutive_missed.max(other.max_consecutive_missed);
        self.max_consecutive_missed_stake = self
            .max_consecutive_missed_stake
            .max(other.max_consecutive_missed_stake);

        for (status, count) in other.status_counts {
            *self.status_counts.entry(status).or_default() += count;
        }
        for (status, stake) in other.status_stakes {
            *self.status_stakes.entry(status).or_default() += stake;
        }
        for (vtype, count) in other.type_counts {
            *self.type_counts.entry(vtype).or_default() += count;
        }
        for (vtype, stake) in other.type_stakes {
            *self.type_stakes.entry(vtype).or_default() += stake;
        }

        merge_examples(&mut self.missed_attestation_examples, other.missed_attestation_examples);
        merge_examples(&mut self.suboptimal_source_examples, other.suboptimal_source_examples);
        merge_examples(&mut self.suboptimal_target_examples, other.suboptimal_target_examples);
        merge_examples(&mut self.suboptimal_head_examples, other.suboptimal_head_examples);
        merge_examples(&mut self.missed_block_examples, other.missed_block_examples);
    }

    fn finalize_rates(&mut self) {
        if self.ideal_consensus_rewards > 0 {
            self.consensus_rewards_rate =
                self.consensus_rewards as f64 / self.ideal_consensus_rewards as f64;
        }
        if self.attestation_duties > 0 {
            self.attestation_duties_rate =
                self.attestation_duties_success as f64 / self.attestation_duties as f64;
        }
    }
}

fn push_example(examples: &mut Vec<ValidatorExample>, v: &WatchedValidator, value: u64) {
    if value > 0 && examples.len() < MAX_EXAMPLES {
        examples.push(ValidatorExample {
            index: v.validator.index,
            pubkey: v.validator.data.pubkey.clone(),
            value,
        });
    }
}

fn merge_examples(into: &mut Vec<ValidatorExample>, from: Vec<ValidatorExample>) {
    for example in from {
        if into.len() >= MAX_EXAMPLES {
            break;
        }
        into.push(example);
    }
}

/// Reduce the watched snapshot into per-label records.
///
/// The snapshot is split into chunks reduced in parallel; partials merge by
/// summing scalars, unioning keyed maps, and taking the max of the
/// consecutive-miss trackers. Per-validator tasks would be pathological at
/// tens of thousands of entries, so the chunk count tracks the thread pool.
pub fn compute_metrics(validators: &[WatchedValidator]) -> HashMap<String, LabelMetrics> {
    let mut merged: HashMap<String, LabelMetrics> = HashMap::new();

    for partial in partition_reduce(validators, |local: &mut HashMap<String, LabelMetrics>, v| {
        for label in &v.labels {
            local.entry(label.clone()).or_default().accumulate(v);
        }
    }) {
        for (label, partial_metrics) in partial {
            merged.entry(label).or_default().merge(partial_metrics);
        }
    }

    for label_metrics in merged.values_mut() {
        label_metrics.finalize_rates();
    }

    merged
}

/// Reduce the full network snapshot into a single record.
///
/// Only counts, stakes, statuses, credential types, and slashing are
/// meaningful network-wide; there is no per-validator duty data at this
/// scale.
pub fn compute_network_metrics(validators: &[Validator]) -> LabelMetrics {
    let mut merged = LabelMetrics::default();

    for partial in partition_reduce(validators, |local: &mut LabelMetrics, v| {
        let weight = v.data.effective_balance as f64 / STAKE_UNIT_GWEI as f64;

        local.validator_count += 1;
        local.stake_count += weight;
        *local.status_counts.entry(v.status).or_default() += 1;
        *local.status_stakes.entry(v.status).or_default() += weight;

        let vtype = validator_type(&v.data.withdrawal_credentials);
        *local.type_counts.entry(vtype).or_default() += 1;
        *local.type_stakes.entry(vtype).or_default() += weight;

        if v.data.slashed {
            local.slashed_count += 1;
            local.slashed_stake += weight;
        }
    }) {
        merged.merge(partial);
    }

    merged
}

/// Chunk `items` across the rayon pool, folding each chunk into its own
/// accumulator.
fn partition_reduce<T, A>(items: &[T], fold: impl Fn(&mut A, &T) + Sync) -> Vec<A>
where
    T: Sync,
    A: Default + Send,
{
    if items.is_empty() {
        return Vec::new();
    }

    let workers = rayon::current_num_threads().max(1);
    let chunk_size = items.len().div_ceil(workers);

    items
        .par_chunks(chunk_size)
        .map(|chunk| {
            let mut local = A::default();
            for item in chunk {
                fold(&mut local, item);
            }
            local
        })
        .collect()
}
