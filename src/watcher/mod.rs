use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::beacon::{BeaconError, Client};
use crate::clock::BeaconClock;
use crate::config::Config;
use crate::duties;
use crate::export::WatcherMetrics;
use crate::metrics::{self, LabelMetrics};
use crate::price::PriceFetcher;
use crate::proposer::Schedule;
use crate::registry::{AllValidators, WatchedValidators, LABEL_ALL_NETWORK, LABEL_WATCHED};
use crate::types::{Attestation, Epoch, Gwei, Slot, Validator, ValidatorIndex};

/// Batch size for pubkey-keyed validator fetches when no full snapshot is
/// available.
const PUBKEY_BATCH_SIZE: usize = 100;

/// Epoch positions at which the off-slot phases run.
const CONFIG_RELOAD_POSITION: u64 = 15;
const LIVENESS_POSITION: u64 = 16;
const REWARDS_POSITION: u64 = 17;

/// Orchestrates the slot loop: clock, beacon fetches, duty attribution,
/// aggregation, and publishing.
pub struct ValidatorWatcher {
    config: Config,
    beacon: Arc<Client>,
    clock: Option<BeaconClock>,
    schedule: Arc<Schedule>,
    all_validators: Arc<AllValidators>,
    watched: Arc<WatchedValidators>,
    metrics: Arc<WatcherMetrics>,
    price: PriceFetcher,
    cancel: CancellationToken,
}

impl ValidatorWatcher {
    /// Create a watcher from validated configuration.
    pub fn new(config: Config) -> Result<Self> {
        let beacon = Arc::new(Client::new(&config).context("creating beacon client")?);
        let metrics = Arc::new(WatcherMetrics::new().context("creating metrics registry")?);

        Ok(Self {
            config,
            beacon,
            clock: None,
            schedule: Arc::new(Schedule::new()),
            all_validators: Arc::new(AllValidators::new()),
            watched: Arc::new(WatchedValidators::new()),
            metrics,
            price: PriceFetcher::new(),
            cancel: CancellationToken::new(),
        })
    }

    /// Run the watcher until cancellation or replay completion.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<()> {
        self.cancel = cancel;

        // The server comes up before the first (possibly minutes-long)
        // validator load so orchestrators can poll /ready meanwhile.
        self.metrics
            .start_server(self.config.metrics_port, self.cancel.child_token())
            .await
            .context("starting metrics server")?;

        self.initialize().await.context("initializing watcher")?;

        self.main_loop().await
    }

    /// Fetch genesis and spec, set up the clock, and perform the first
    /// validator load. Genesis/spec failures degrade to snapshot-only mode
    /// instead of aborting.
    async fn initialize(&mut self) -> Result<()> {
        info!("initializing validator watcher");

        let genesis = match self.beacon.get_genesis().await {
            Ok(genesis) => Some(genesis),
            Err(e) => {
                warn!(error = %e, "failed to fetch genesis, clock-based monitoring disabled");
                None
            }
        };

        let spec = match &genesis {
            Some(_) => match self.beacon.get_spec().await {
                Ok(spec) => Some(spec),
                Err(e) => {
                    warn!(error = %e, "failed to fetch spec, clock-based monitoring disabled");
                    None
                }
            },
            None => None,
        };

        if let (Some(genesis), Some(spec)) = (genesis, spec) {
            let mut clock = BeaconClock::new(&genesis, &spec)?;

            if let Some(start_ts) = self.config.replay_start_at_ts {
                clock.enable_replay(start_ts, self.config.replay_end_at_ts);
                info!(
                    start_ts,
                    end_ts = ?self.config.replay_end_at_ts,
                    "replay mode enabled",
                );
            }

            info!(
                genesis_time = genesis.genesis_time,
                seconds_per_slot = spec.seconds_per_slot,
                slots_per_epoch = spec.slots_per_epoch,
                current_slot = clock.current_slot(),
                current_epoch = clock.current_epoch(),
                "initialized beacon clock",
            );

            self.clock = Some(clock);
        } else {
            info!("clock not initialized, running in snapshot mode");
        }

        self.load_validators().await?;

        self.metrics.set_ready();
        info!("validator watcher ready");

        Ok(())
    }

    /// First validator load: the full snapshot when enabled, with the
    /// watched subset derived from it; batched pubkey fetches otherwise.
    async fn load_validators(&self) -> Result<()> {
        if !self.config.should_load_all_validators() {
            info!("skipping full validator set load (load_all_validators=false)");
            info!("network-wide comparison metrics will not be available");
            return self.load_watched_by_pubkeys().await;
        }

        info!("loading full validator set (tens of seconds on mainnet)");

        match self.beacon.get_all_validators("head").await {
            Ok(all) => {
                self.all_validators.update(all);
                info!(count = self.all_validators.count(), "loaded full validator set");
            }
            Err(e) => {
                error!(error = %e, "failed to load full validator set");
                warn!("network comparison unavailable, loading watched validators only");
                return self.load_watched_by_pubkeys().await;
            }
        }

        if self.config.watched_keys.is_empty() {
            warn!("no watched validators configured");
            return Ok(());
        }

        // The snapshot already holds every watched entry, so the subset is
        // derived without further requests.
        let mut watched_validators = Vec::new();
        for key in &self.config.watched_keys {
            match self.all_validators.get_by_pubkey(&key.public_key) {
                Some(validator) => watched_validators.push(validator),
                None => warn!(
                    pubkey = %shorten(&key.public_key),
                    "watched validator not found in full validator set",
                ),
            }
        }

        if watched_validators.is_empty() {
            warn!("no watched validators found in the validator set, check your configuration");
            return Ok(());
        }

        self.watched
            .update(watched_validators, &self.config.watched_keys);
        info!(count = self.watched.count(), "loaded watched validators");

        Ok(())
    }

    /// Fetch the watched validators by pubkey in batches, for deployments
    /// without the full snapshot.
    async fn load_watched_by_pubkeys(&self) -> Result<()> {
        if self.config.watched_keys.is_empty() {
            warn!("no watched validators configured");
            return Ok(());
        }

        let pubkeys: Vec<String> = self
            .config
            .watched_keys
            .iter()
            .map(|key| key.public_key.clone())
            .collect();

        let total_batches = pubkeys.len().div_ceil(PUBKEY_BATCH_SIZE);
        let mut validators: Vec<Validator> = Vec::with_capacity(pubkeys.len());

        for (batch_index, batch) in pubkeys.chunks(PUBKEY_BATCH_SIZE).enumerate() {
            debug!(
                batch = batch_index + 1,
                total = total_batches,
                size = batch.len(),
                "fetching watched validator batch",
            );

            let fetched = self
                .beacon
                .get_validators_by_pubkeys("head", batch)
                .await
                .with_context(|| {
                    format!("fetching watched validators batch {}", batch_index + 1)
                })?;

            validators.extend(fetched);
        }

        if validators.is_empty() {
            warn!("no watched validators found, check your configuration");
            return Ok(());
        }

        self.watched.update(validators, &self.config.watched_keys);
        info!(count = self.watched.count(), "loaded watched validators");

        Ok(())
    }

    async fn main_loop(&self) -> Result<()> {
        let Some(clock) = &self.clock else {
            return self.snapshot_mode().await;
        };

        info!("starting main monitoring loop");

        loop {
            if self.cancel.is_cancelled() {
                info!("shutting down");
                return Ok(());
            }

            if clock.is_replay_mode() && clock.replay_complete() {
                info!("replay complete");
                return Ok(());
            }

            let slot = clock.current_slot();
            let epoch = clock.slot_to_epoch(slot);

            if slot % 10 == 0 || clock.is_first_slot_of_epoch(slot) {
                info!(
                    slot,
                    epoch,
                    slot_in_epoch = slot % clock.slots_per_epoch(),
                    watched_validators = self.watched.count(),
                    "slot checkpoint",
                );
            }

            if clock.is_first_slot_of_epoch(slot) {
                if let Err(e) = self.process_epoch(clock, epoch).await {
                    error!(error = %e, epoch, "failed to process epoch");
                }
            }

            if clock.is_slot_in_epoch(slot, CONFIG_RELOAD_POSITION) {
                self.reload_config();
            }

            if clock.is_slot_in_epoch(slot, LIVENESS_POSITION) && epoch >= 1 {
                if let Err(e) = self.process_liveness(epoch - 1).await {
                    error!(error = %e, "failed to process liveness");
                }
            }

            if clock.is_slot_in_epoch(slot, REWARDS_POSITION) && epoch >= 2 {
                if let Err(e) = self.process_rewards(epoch - 2).await {
                    error!(error = %e, "failed to process rewards");
                }
            }

            self.process_slot(slot).await;

            self.update_metrics(slot, epoch).await;

            // Keep two epochs of proposer duties around.
            let cutoff = slot.saturating_sub(2 * clock.slots_per_epoch());
            self.schedule.cleanup(cutoff);

            if clock.wait_until_next_slot(&self.cancel).await.is_err() {
                info!("shutting down");
                return Ok(());
            }
        }
    }

    /// Without a clock there is nothing to schedule: publish the snapshot
    /// once and hold the exposition endpoint open.
    async fn snapshot_mode(&self) -> Result<()> {
        info!(
            all_validators = self.all_validators.count(),
            watched_validators = self.watched.count(),
            "running in snapshot mode, no continuous monitoring",
        );

        self.update_metrics(0, 0).await;

        self.cancel.cancelled().await;
        info!("shutting down");
        Ok(())
    }

    /// Epoch rollover: background snapshot reload, watched-subset refresh,
    /// proposer duties for this epoch and the next, pending-queue gauges.
    async fn process_epoch(&self, clock: &BeaconClock, epoch: Epoch) -> Result<()> {
        info!(epoch, "processing epoch");

        if self.config.should_load_all_validators() {
            self.spawn_snapshot_reload();
        }

        let mut indices = Vec::with_capacity(self.config.watched_keys.len());
        for key in &self.config.watched_keys {
            match self.all_validators.get_by_pubkey(&key.public_key) {
                Some(validator) => indices.push(validator.index),
                None => warn!(
                    pubkey = %shorten(&key.public_key),
                    "watched validator not found in full validator set",
                ),
            }
        }

        if !indices.is_empty() {
            let validators = self
                .beacon
                .get_validators("head", &indices)
                .await
                .context("fetching watched validators")?;

            self.watched.update(validators, &self.config.watched_keys);
            info!(count = self.watched.count(), "refreshed watched validators");
        }

        if let Err(e) = self.schedule.update(&self.beacon, epoch).await {
            warn!(error = %e, epoch, "failed to update proposer schedule");
        }
        if let Err(e) = self.schedule.update(&self.beacon, epoch + 1).await {
            warn!(error = %e, epoch = epoch + 1, "failed to update proposer schedule");
        }

        self.update_future_proposals(clock.current_slot());
        self.update_pending_queues().await;

        Ok(())
    }

    /// Reload the full snapshot off the slot loop; completion swaps the
    /// registry contents.
    fn spawn_snapshot_reload(&self) {
        let beacon = Arc::clone(&self.beacon);
        let registry = Arc::clone(&self.all_validators);
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = beacon.get_all_validators("head") => match result {
                    Ok(validators) => {
                        registry.update(validators);
                        debug!(count = registry.count(), "refreshed full validator snapshot");
                    }
                    Err(e) => warn!(error = %e, "background snapshot reload failed"),
                }
            }
        });
    }

    /// Recompute upcoming proposals per watched validator from the schedule.
    fn update_future_proposals(&self, current_slot: Slot) {
        for index in self.watched.indices() {
            let future = self
                .schedule
                .duties_for(index)
                .into_iter()
                .filter(|slot| *slot > current_slot)
                .count() as u64;

            let _ = self
                .watched
                .update_metrics(index, |v| v.future_block_proposals = future);
        }
    }

    async fn update_pending_queues(&self) {
        let deposits = self
            .beacon
            .get_pending_deposits("head")
            .await
            .unwrap_or_default();
        let consolidations = self
            .beacon
            .get_pending_consolidations("head")
            .await
            .unwrap_or_default();
        let withdrawals = self
            .beacon
            .get_pending_withdrawals("head")
            .await
            .unwrap_or_default();

        let deposits_value: Gwei = deposits.iter().map(|deposit| deposit.amount).sum();

        self.metrics.set_pending_queues(
            &self.config.network,
            deposits.len() as f64,
            deposits_value as f64,
            consolidations.len() as f64,
            withdrawals.len() as f64,
        );

        debug!(
            pending_deposits = deposits.len(),
            pending_consolidations = consolidations.len(),
            pending_withdrawals = withdrawals.len(),
            "updated pending queue gauges",
        );
    }

    /// Per-slot pass: block outcome, then attestation attribution.
    async fn process_slot(&self, slot: Slot) {
        if let Err(e) = self.process_block(slot).await {
            debug!(slot, error = %e, "failed to process block");
        }

        if let Err(e) = self.process_attestations(slot).await {
            debug!(slot, error = %e, "failed to process attestations");
        }
    }

    /// Credit the proposer of the slot's block, or debit the scheduled
    /// proposer when the block is missing.
    async fn process_block(&self, slot: Slot) -> Result<(), BeaconError> {
        match self.beacon.get_block(&slot.to_string()).await {
            Ok(block) => {
                let proposer = block.message.proposer_index;

                if let Some(validator) = self.watched.get(proposer) {
                    let _ = self
                        .watched
                        .update_metrics(proposer, |v| v.proposed_blocks += 1);

                    let fee_recipient = block
                        .message
                        .body
                        .execution_payload
                        .as_ref()
                        .map_or("unknown", |payload| payload.fee_recipient.as_str());

                    info!(
                        slot,
                        validator_index = proposer,
                        pubkey = %shorten(&validator.validator.data.pubkey),
                        label = validator.primary_label(),
                        fee_recipient,
                        total_proposed = validator.proposed_blocks + 1,
                        "block proposed by watched validator",
                    );
                }

                Ok(())
            }
            Err(e) if e.is_missing() => {
                let Some(proposer) = self.schedule.get_proposer(slot) else {
                    return Ok(());
                };

                if let Some(validator) = self.watched.get(proposer) {
                    let _ = self
                        .watched
                        .update_metrics(proposer, |v| v.missed_blocks += 1);

                    warn!(
                        slot,
                        validator_index = proposer,
                        pubkey = %shorten(&validator.validator.data.pubkey),
                        label = validator.primary_label(),
                        total_missed = validator.missed_blocks + 1,
                        "missed block proposal",
                    );
                }

                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Attestations included at slot S vote for duties of slot S-1: filter
    /// to that slot, attribute against its committees, and book duties for
    /// every watched committee member.
    async fn process_attestations(&self, slot: Slot) -> Result<()> {
        if slot == 0 {
            return Ok(());
        }

        let previous_slot = slot - 1;

        let attestations = match self.beacon.get_attestations(slot).await {
            Ok(attestations) => attestations,
            // No block at this slot means no attestations to read.
            Err(e) if e.is_missing() => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let committees = self
            .beacon
            .get_committees("head", None, Some(previous_slot))
            .await
            .context("fetching committees")?;

        let filtered: Vec<Attestation> = attestations
            .into_iter()
            .filter(|attestation| attestation.data.slot == previous_slot)
            .collect();

        let attested = duties::process_attestations(&filtered, &committees);

        let with_duties: HashSet<ValidatorIndex> = committees
            .iter()
            .flat_map(|committee| committee.validators.iter().copied())
            .collect();

        let mut duties_count = 0u64;
        let mut missed_count = 0u64;
        let mut missed_examples = Vec::new();

        for index in with_duties {
            let Some(validator) = self.watched.get(index) else {
                continue;
            };

            duties_count += 1;

            if attested.contains(&index) {
                let _ = self.watched.update_metrics(index, |v| {
                    v.attestation_duties += 1;
                    v.attestation_duties_success += 1;
                    v.consecutive_missed_attestations = 0;
                });
            } else {
                missed_count += 1;

                if missed_examples.len() < 5 {
                    missed_examples.push(format!(
                        "{index} ({}, consecutive: {})",
                        validator.primary_label(),
                        validator.consecutive_missed_attestations + 1,
                    ));
                }

                let _ = self.watched.update_metrics(index, |v| {
                    v.attestation_duties += 1;
                    v.consecutive_missed_attestations += 1;
                });
            }
        }

        if missed_count > 0 {
            warn!(
                current_slot = slot,
                attesting_slot = previous_slot,
                missed_count,
                duties_count,
                examples = %missed_examples.join("; "),
                "missed attestations",
            );
        } else if duties_count > 0 {
            debug!(
                current_slot = slot,
                attesting_slot = previous_slot,
                duties_count,
                "all attestation duties satisfied",
            );
        }

        Ok(())
    }

    /// Non-live watched validators get a missed attestation for the epoch.
    async fn process_liveness(&self, epoch: Epoch) -> Result<()> {
        let indices = self.watched.indices();
        if indices.is_empty() {
            return Ok(());
        }

        let liveness = self
            .beacon
            .get_liveness(epoch, &indices)
            .await
            .context("fetching liveness")?;

        let live_map = duties::process_liveness(&liveness);

        let mut not_live_count = 0usize;
        let mut not_live_examples = Vec::new();

        for (index, is_live) in &live_map {
            if *is_live {
                continue;
            }

            not_live_count += 1;

            let _ = self
                .watched
                .update_metrics(*index, |v| v.missed_attestations += 1);

            if not_live_examples.len() < 5 {
                if let Some(validator) = self.watched.get(*index) {
                    not_live_examples.push(format!("{index} ({})", validator.primary_label()));
                }
            }
        }

        let live_count = live_map.len() - not_live_count;

        if not_live_count > 0 {
            warn!(
                epoch,
                live = live_count,
                not_live = not_live_count,
                total = live_map.len(),
                examples = %not_live_examples.join("; "),
                "liveness check found non-live validators",
            );
        } else {
            info!(epoch, live = live_count, "liveness check passed for all validators");
        }

        Ok(())
    }

    /// Diff actual rewards against ideal for the epoch and book the result.
    async fn process_rewards(&self, epoch: Epoch) -> Result<()> {
        let balances: HashMap<ValidatorIndex, Gwei> = self
            .watched
            .get_all()
            .into_iter()
            .map(|v| (v.validator.index, v.validator.data.effective_balance))
            .collect();

        if balances.is_empty() {
            return Ok(());
        }

        let indices: Vec<ValidatorIndex> = balances.keys().copied().collect();

        let rewards = self
            .beacon
            .get_rewards(epoch, &indices)
            .await
            .context("fetching rewards")?;

        let breakdowns = duties::process_rewards(&rewards, &balances);

        let mut suboptimal_source = 0usize;
        let mut suboptimal_target = 0usize;
        let mut suboptimal_head = 0usize;
        let mut penalties = 0usize;
        let mut total_ideal: Gwei = 0;
        let mut total_actual: i64 = 0;

        for (index, breakdown) in &breakdowns {
            let _ = self.watched.update_metrics(*index, |v| {
                if breakdown.suboptimal_source {
                    v.suboptimal_source_votes += 1;
                }
                if breakdown.suboptimal_target {
                    v.suboptimal_target_votes += 1;
                }
                if breakdown.suboptimal_head {
                    v.suboptimal_head_votes += 1;
                }
                // Rewards carry last-processed-epoch semantics, so these
                // overwrite instead of accumulating.
                v.ideal_consensus_rewards = breakdown.ideal_total;
                v.consensus_rewards = breakdown.actual_total;
            });

            suboptimal_source += usize::from(breakdown.suboptimal_source);
            suboptimal_target += usize::from(breakdown.suboptimal_target);
            suboptimal_head += usize::from(breakdown.suboptimal_head);
            penalties += usize::from(breakdown.actual_total < 0);
            total_ideal += breakdown.ideal_total;
            total_actual += breakdown.actual_total;
        }

        let performance_rate = if total_ideal > 0 {
            total_actual as f64 / total_ideal as f64 * 100.0
        } else {
            0.0
        };

        if suboptimal_source > 0 || suboptimal_target > 0 || suboptimal_head > 0 {
            warn!(
                epoch,
                validators = breakdowns.len(),
                ideal_gwei = total_ideal,
                actual_gwei = total_actual,
                performance_rate,
                suboptimal_source,
                suboptimal_target,
                suboptimal_head,
                penalties,
                "rewards processed, suboptimal votes detected",
            );
        } else {
            info!(
                epoch,
                validators = breakdowns.len(),
                ideal_gwei = total_ideal,
                actual_gwei = total_actual,
                performance_rate,
                "rewards processed",
            );
        }

        Ok(())
    }

    /// Placeholder for watched-set hot reload.
    fn reload_config(&self) {
        debug!("config reload requested (not implemented)");
    }

    /// Aggregate, publish, and log the cycle summary.
    async fn update_metrics(&self, slot: Slot, epoch: Epoch) {
        let watched_validators = self.watched.get_all();
        let mut by_label = metrics::compute_metrics(&watched_validators);

        // The network-wide record replaces the watched-scope view of the
        // same label.
        let network_record = metrics::compute_network_metrics(&self.all_validators.get_all());
        by_label.insert(LABEL_ALL_NETWORK.to_string(), network_record);

        self.metrics
            .publish(&by_label, slot, epoch, &self.config.network);

        let price = self.price.get_eth_price().await;
        self.metrics.set_eth_price(&self.config.network, price);

        if let Some(watched) = by_label.get(LABEL_WATCHED) {
            info!(
                validators = watched.validator_count,
                missed_attestations = watched.missed_attestations,
                proposed_blocks = watched.proposed_blocks,
                missed_blocks = watched.missed_blocks,
                consensus_rewards_rate = watched.consensus_rewards_rate,
                "metrics updated",
            );
        }

        self.log_label_performance(&by_label);
    }

    /// Per-operator performance breakdown, logged once rewards data exists.
    fn log_label_performance(&self, by_label: &HashMap<String, LabelMetrics>) {
        let Some(watched) = by_label.get(LABEL_WATCHED) else {
            return;
        };

        if watched.ideal_consensus_rewards == 0 {
            return;
        }

        for (label, m) in by_label {
            if label.starts_with("scope:")
                || label.starts_with("key:")
                || label.starts_with("name:")
            {
                continue;
            }

            let active: u64 = m
                .status_counts
                .iter()
                .filter(|(status, _)| status.is_active())
                .map(|(_, count)| *count)
                .sum();

            let performance = m.consensus_rewards_rate * 100.0;
            let miss_rate = if m.attestation_duties > 0 {
                m.missed_attestations as f64 * 100.0 / m.attestation_duties as f64
            } else {
                0.0
            };

            if active == 0 {
                debug!(%label, validators = m.validator_count, "no active validators for label");
                continue;
            }

            if performance >= 95.0 {
                info!(
                    %label,
                    validators = m.validator_count,
                    active_validators = active,
                    performance_rate = performance,
                    missed_attestations = m.missed_attestations,
                    miss_rate,
                    "operator performance",
                );
            } else if performance >= 90.0 {
                warn!(
                    %label,
                    validators = m.validator_count,
                    active_validators = active,
                    performance_rate = performance,
                    missed_attestations = m.missed_attestations,
                    miss_rate,
                    "operator performance needs attention",
                );
            } else {
                error!(
                    %label,
                    validators = m.validator_count,
                    active_validators = active,
                    performance_rate = performance,
                    missed_attestations = m.missed_attestations,
                    miss_rate,
                    top_offenders = %self.top_offenders(label, 5),
                    "operator performance critical",
                );
            }
        }
    }

    /// Worst active validators for a label, ranked by missed attestations.
    fn top_offenders(&self, label: &str, limit: usize) -> String {
        let mut offenders: Vec<_> = self
            .watched
            .get_by_label(label)
            .into_iter()
            .filter(|v| v.validator.status.is_active())
            .filter(|v| {
                let underperforming = v.ideal_consensus_rewards > 0
                    && (v.consensus_rewards as f64) < 0.9 * v.ideal_consensus_rewards as f64;
                v.missed_attestations > 0 || underperforming
            })
            .collect();

        offenders.sort_by(|a, b| b.missed_attestations.cmp(&a.missed_attestations));
        offenders.truncate(limit);

        offenders
            .iter()
            .map(|v| {
                format!(
                    "{}({}):missed={}",
                    v.validator.index,
                    shorten(&v.validator.data.pubkey),
                    v.missed_attestations,
                )
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Truncate a pubkey for log lines.
fn shorten(pubkey: &str) -> &str {
    if pubkey.len() > 14 {
        &pubkey[..14]
    } else {
        pubkey
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten_pubkey() {
        let pubkey = format!("0x{}", "ab".repeat(48));
        assert_eq!(shorten(&pubkey), "0xabababababab");
        assert_eq!(shorten("0xabcd"), "0xabcd");
    }

    #[test]
    fn test_new_requires_nothing_but_config() {
        let config = Config::default();
        let watcher = ValidatorWatcher::new(config).expect("should build");
        assert_eq!(watcher.watched.count(), 0);
        assert_eq!(watcher.all_validators.count(), 0);
        assert!(!watcher.metrics.is_ready());
    }
}
