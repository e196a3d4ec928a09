use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use prometheus::{CounterVec, Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::metrics::LabelMetrics;
use crate::types::{Epoch, Slot};

const NAMESPACE: &str = "eth_validator_watcher";

/// Last-seen block-production totals for one (scope, network) pair.
///
/// The registry holds totals that reset whenever the watched set is rebuilt,
/// so the exported counters are fed deltas computed against these.
#[derive(Debug, Clone, Copy, Default)]
struct BlockTotals {
    proposed: u64,
    proposed_finalized: u64,
    missed: u64,
    missed_finalized: u64,
}

/// Delta against the last observation. A decrease means the source counter
/// was reset, in which case the whole current value is the delta.
fn counter_delta(current: u64, last_seen: u64) -> u64 {
    if current >= last_seen {
        current - last_seen
    } else {
        current
    }
}

/// All Prometheus collectors plus the /metrics, /health, and /ready server.
pub struct WatcherMetrics {
    registry: Registry,
    ready: Arc<AtomicBool>,
    shutdown: parking_lot::Mutex<Option<CancellationToken>>,
    last_block_totals: parking_lot::Mutex<HashMap<(String, String), BlockTotals>>,

    // Chain position.
    current_slot: Gauge,
    current_epoch: Gauge,

    // Per-scope gauges, labelled (scope, network).
    validator_count: GaugeVec,
    stake_count: GaugeVec,
    missed_attestations: GaugeVec,
    missed_attestations_stake: GaugeVec,
    suboptimal_source_votes: GaugeVec,
    suboptimal_source_stake: GaugeVec,
    suboptimal_target_votes: GaugeVec,
    suboptimal_target_stake: GaugeVec,
    suboptimal_head_votes: GaugeVec,
    suboptimal_head_stake: GaugeVec,
    proposed_blocks: GaugeVec,
    proposed_blocks_finalized: GaugeVec,
    missed_blocks: GaugeVec,
    missed_blocks_finalized: GaugeVec,
    future_block_proposals: GaugeVec,
    ideal_consensus_rewards: GaugeVec,
    consensus_rewards: GaugeVec,
    consensus_rewards_rate: GaugeVec,
    attestation_duties: GaugeVec,
    attestation_duties_success: GaugeVec,
    attestation_duties_rate: GaugeVec,
    attestation_duties_stake: GaugeVec,
    max_consecutive_missed: GaugeVec,
    max_consecutive_missed_stake: GaugeVec,
    slashed_count: GaugeVec,
    slashed_stake: GaugeVec,

    // Breakdown gauges with an extra dimension.
    status_count: GaugeVec,
    status_stake: GaugeVec,
    validator_type_count: GaugeVec,
    validator_type_stake: GaugeVec,

    // Monotonic block-production counters fed by the delta tracker.
    proposed_blocks_total: CounterVec,
    proposed_blocks_finalized_total: CounterVec,
    missed_blocks_total: CounterVec,
    missed_blocks_finalized_total: CounterVec,

    // Network-level gauges, labelled (network).
    eth_usd_price: GaugeVec,
    pending_deposits_count: GaugeVec,
    pending_deposits_value: GaugeVec,
    pending_consolidations_count: GaugeVec,
    pending_withdrawals_count: GaugeVec,
}

fn scoped_gauge(name: &str, help: &str) -> prometheus::Result<GaugeVec> {
    GaugeVec::new(
        Opts::new(name, help).namespace(NAMESPACE),
        &["scope", "network"],
    )
}

fn scoped_counter(name: &str, help: &str) -> prometheus::Result<CounterVec> {
    CounterVec::new(
        Opts::new(name, help).namespace(NAMESPACE),
        &["scope", "network"],
    )
}

impl WatcherMetrics {
    /// Create and register every collector.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let current_slot = Gauge::with_opts(
            Opts::new("current_slot", "Current slot number.").namespace(NAMESPACE),
        )?;
        let current_epoch = Gauge::with_opts(
            Opts::new("current_epoch", "Current epoch number.").namespace(NAMESPACE),
        )?;

        let validator_count = scoped_gauge("validator_count", "Number of validators.")?;
        let stake_count = scoped_gauge("stake_count", "Total stake in units of 32 ETH.")?;
        let missed_attestations =
            scoped_gauge("missed_attestations", "Number of missed attestations.")?;
        let missed_attestations_stake = scoped_gauge(
            "missed_attestations_stake",
            "Stake-weighted missed attestations.",
        )?;
        let suboptimal_source_votes =
            scoped_gauge("suboptimal_source_votes", "Number of suboptimal source votes.")?;
        let suboptimal_source_stake = scoped_gauge(
            "suboptimal_source_stake",
            "Stake-weighted suboptimal source votes.",
        )?;
        let suboptimal_target_votes =
            scoped_gauge("suboptimal_target_votes", "Number of suboptimal target votes.")?;
        let suboptimal_target_stake = scoped_gauge(
            "suboptimal_target_stake",
            "Stake-weighted suboptimal target votes.",
        )?;
        let suboptimal_head_votes =
            scoped_gauge("suboptimal_head_votes", "Number of suboptimal head votes.")?;
        let suboptimal_head_stake = scoped_gauge(
            "suboptimal_head_stake",
            "Stake-weighted suboptimal head votes.",
        )?;
        let proposed_blocks = scoped_gauge("proposed_blocks", "Number of proposed blocks.")?;
        let proposed_blocks_finalized = scoped_gauge(
            "proposed_blocks_finalized",
            "Number of proposed blocks that finalized.",
        )?;
        let missed_blocks = scoped_gauge("missed_blocks", "Number of missed block proposals.")?;
        let missed_blocks_finalized = scoped_gauge(
            "missed_blocks_finalized",
            "Number of missed block proposals (finalized).",
        )?;
        let future_block_proposals =
            scoped_gauge("future_block_proposals", "Number of upcoming block proposals.")?;
        let ideal_consensus_rewards = scoped_gauge(
            "ideal_consensus_rewards_gwei",
            "Ideal consensus rewards in gwei.",
        )?;
        let consensus_rewards =
            scoped_gauge("consensus_rewards_gwei", "Actual consensus rewards in gwei.")?;
        let consensus_rewards_rate =
            scoped_gauge("consensus_rewards_rate", "Consensus rewards rate (actual / ideal).")?;
        let attestation_duties =
            scoped_gauge("attestation_duties", "Total number of attestation duties.")?;
        let attestation_duties_success = scoped_gauge(
            "attestation_duties_success",
            "Number of successful attestation duties.",
        )?;
        let attestation_duties_rate =
            scoped_gauge("attestation_duties_rate", "Attestation duties success rate.")?;
        let attestation_duties_stake =
            scoped_gauge("attestation_duties_stake", "Stake-weighted attestation duties.")?;
        let max_consecutive_missed = scoped_gauge(
            "max_consecutive_missed_attestations",
            "Maximum consecutive missed attestations.",
        )?;
        let max_consecutive_missed_stake = scoped_gauge(
            "max_consecutive_missed_attestations_stake",
            "Stake-weighted maximum consecutive missed attestations.",
        )?;
        let slashed_count = scoped_gauge("slashed_count", "Number of slashed validators.")?;
        let slashed_stake = scoped_gauge("slashed_stake", "Stake of slashed validators.")?;

        let status_count = GaugeVec::new(
            Opts::new("status_count", "Number of validators by status.").namespace(NAMESPACE),
            &["scope", "network", "status"],
        )?;
        let status_stake = GaugeVec::new(
            Opts::new("status_stake", "Stake by validator status.").namespace(NAMESPACE),
            &["scope", "network", "status"],
        )?;
        let validator_type_count = GaugeVec::new(
            Opts::new(
                "validator_type_count",
                "Number of validators by withdrawal-credentials type.",
            )
            .namespace(NAMESPACE),
            &["scope", "network", "type"],
        )?;
        let validator_type_stake = GaugeVec::new(
            Opts::new(
                "validator_type_stake",
                "Stake by withdrawal-credentials type.",
            )
            .namespace(NAMESPACE),
            &["scope", "network", "type"],
        )?;

        let proposed_blocks_total =
            scoped_counter("proposed_blocks_total", "Proposed blocks since process start.")?;
        let proposed_blocks_finalized_total = scoped_counter(
            "proposed_blocks_finalized_total",
            "Finalized proposed blocks since process start.",
        )?;
        let missed_blocks_total =
            scoped_counter("missed_blocks_total", "Missed block proposals since process start.")?;
        let missed_blocks_finalized_total = scoped_counter(
            "missed_blocks_finalized_total",
            "Finalized missed block proposals since process start.",
        )?;

        let network_gauge = |name: &str, help: &str| -> prometheus::Result<GaugeVec> {
            GaugeVec::new(Opts::new(name, help).namespace(NAMESPACE), &["network"])
        };

        let eth_usd_price = network_gauge("eth_usd_price", "Latest ETH price in USD.")?;
        let pending_deposits_count =
            network_gauge("pending_deposits_count", "Number of pending deposits.")?;
        let pending_deposits_value = network_gauge(
            "pending_deposits_value_gwei",
            "Total value of pending deposits in gwei.",
        )?;
        let pending_consolidations_count = network_gauge(
            "pending_consolidations_count",
            "Number of pending consolidations.",
        )?;
        let pending_withdrawals_count =
            network_gauge("pending_withdrawals_count", "Number of pending withdrawals.")?;

        registry.register(Box::new(current_slot.clone()))?;
        registry.register(Box::new(current_epoch.clone()))?;
        registry.register(Box::new(validator_count.clone()))?;
        registry.register(Box::new(stake_count.clone()))?;
        registry.register(Box::new(missed_attestations.clone()))?;
        registry.register(Box::new(missed_attestations_stake.clone()))?;
        registry.register(Box::new(suboptimal_source_votes.clone()))?;
        registry.register(Box::new(suboptimal_source_stake.clone()))?;
        registry.register(Box::new(suboptimal_target_votes.clone()))?;
        registry.register(Box::new(suboptimal_target_stake.clone()))?;
        registry.register(Box::new(suboptimal_head_votes.clone()))?;
        registry.register(Box::new(suboptimal_head_stake.clone()))?;
        registry.register(Box::new(proposed_blocks.clone()))?;
        registry.register(Box::new(proposed_blocks_finalized.clone()))?;
        registry.register(Box::new(missed_blocks.clone()))?;
        registry.register(Box::new(missed_blocks_finalized.clone()))?;
        registry.register(Box::new(future_block_proposals.clone()))?;
        registry.register(Box::new(ideal_consensus_rewards.clone()))?;
        registry.register(Box::new(consensus_rewards.clone()))?;
        registry.register(Box::new(consensus_rewards_rate.clone()))?;
        registry.register(Box::new(attestation_duties.clone()))?;
        registry.register(Box::new(attestation_duties_success.clone()))?;
        registry.register(Box::new(attestation_duties_rate.clone()))?;
        registry.register(Box::new(attestation_duties_stake.clone()))?;
        registry.register(Box::new(max_consecutive_missed.clone()))?;
        registry.register(Box::new(max_consecutive_missed_stake.clone()))?;
        registry.register(Box::new(slashed_count.clone()))?;
        registry.register(Box::new(slashed_stake.clone()))?;
        registry.register(Box::new(status_count.clone()))?;
        registry.register(Box::new(status_stake.clone()))?;
        registry.register(Box::new(validator_type_count.clone()))?;
        registry.register(Box::new(validator_type_stake.clone()))?;
        registry.register(Box::new(proposed_blocks_total.clone()))?;
        registry.register(Box::new(proposed_blocks_finalized_total.clone()))?;
        registry.register(Box::new(missed_blocks_total.clone()))?;
        registry.register(Box::new(missed_blocks_finalized_total.clone()))?;
        registry.register(Box::new(eth_usd_price.clone()))?;
        registry.register(Box::new(pending_deposits_count.clone()))?;
        registry.register(Box::new(pending_deposits_value.clone()))?;
        registry.register(Box::new(pending_consolidations_count.clone()))?;
        registry.register(Box::new(pending_withdrawals_count.clone()))?;

        Ok(Self {
            registry,
            ready: Arc::new(AtomicBool::new(false)),
            shutdown: parking_lot::Mutex::new(None),
            last_block_totals: parking_lot::Mutex::new(HashMap::new()),
            current_slot,
            current_epoch,
            validator_count,
            stake_count,
            missed_attestations,
            missed_attestations_stake,
            suboptimal_source_votes,
            suboptimal_source_stake,
            suboptimal_target_votes,
            suboptimal_target_stake,
            suboptimal_head_votes,
            suboptimal_head_stake,
            proposed_blocks,
            proposed_blocks_finalized,
            missed_blocks,
            missed_blocks_finalized,
            future_block_proposals,
            ideal_consensus_rewards,
            consensus_rewards,
            consensus_rewards_rate,
            attestation_duties,
            attestation_duties_success,
            attestation_duties_rate,
            attestation_duties_stake,
            max_consecutive_missed,
            max_consecutive_missed_stake,
            slashed_count,
            slashed_stake,
            status_count,
            status_stake,
            validator_type_count,
            validator_type_stake,
            proposed_blocks_total,
            proposed_blocks_finalized_total,
            missed_blocks_total,
            missed_blocks_finalized_total,
            eth_usd_price,
            pending_deposits_count,
            pending_deposits_value,
            pending_consolidations_count,
            pending_withdrawals_count,
        })
    }

    /// Mark the watcher as having completed its first validator load.
    pub fn set_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Publish one aggregation cycle.
    ///
    /// Gauges are cleared and rewritten from the per-label records; the
    /// block-production counters advance by the delta against the last
    /// publish so they stay monotonic across registry rebuilds.
    pub fn publish(
        &self,
        by_label: &HashMap<String, LabelMetrics>,
        slot: Slot,
        epoch: Epoch,
        network: &str,
    ) {
        self.current_slot.set(slot as f64);
        self.current_epoch.set(epoch as f64);

        self.reset_scoped_gauges();

        for (label, m) in by_label {
            let label = label.as_str();
            let labels = &[label, network];

            self.validator_count
                .with_label_values(labels)
                .set(m.validator_count as f64);
            self.stake_count.with_label_values(labels).set(m.stake_count);
            self.missed_attestations
                .with_label_values(labels)
                .set(m.missed_attestations as f64);
            self.missed_attestations_stake
                .with_label_values(labels)
                .set(m.missed_attestations_stake);
            self.suboptimal_source_votes
                .with_label_values(labels)
                .set(m.suboptimal_source_votes as f64);
            self.suboptimal_source_stake
                .with_label_values(labels)
                .set(m.suboptimal_source_votes_stake);
            self.suboptimal_target_votes
                .with_label_values(labels)
                .set(m.suboptimal_target_votes as f64);
            self.suboptimal_target_stake
                .with_label_values(labels)
                .set(m.suboptimal_target_votes_stake);
            self.suboptimal_head_votes
                .with_label_values(labels)
                .set(m.suboptimal_head_votes as f64);
            self.suboptimal_head_stake
                .with_label_values(labels)
                .set(m.suboptimal_head_votes_stake);
            self.proposed_blocks
                .with_label_values(labels)
                .set(m.proposed_blocks as f64);
            self.proposed_blocks_finalized
                .with_label_values(labels)
                .set(m.proposed_blocks_finalized as f64);
            self.missed_blocks
                .with_label_values(labels)
                .set(m.missed_blocks as f64);
            self.missed_blocks_finalized
                .with_label_values(labels)
                .set(m.missed_blocks_finalized as f64);
            self.future_block_proposals
                .with_label_values(labels)
                .set(m.future_block_proposals as f64);
            self.ideal_consensus_rewards
                .with_label_values(labels)
                .set(m.ideal_consensus_rewards as f64);
            self.consensus_rewards
                .with_label_values(labels)
                .set(m.consensus_rewards as f64);
            self.consensus_rewards_rate
                .with_label_values(labels)
                .set(m.consensus_rewards_rate);
            self.attestation_duties
                .with_label_values(labels)
                .set(m.attestation_duties as f64);
            self.attestation_duties_success
                .with_label_values(labels)
                .set(m.attestation_duties_success as f64);
            self.attestation_duties_rate
                .with_label_values(labels)
                .set(m.attestation_duties_rate);
            self.attestation_duties_stake
                .with_label_values(labels)
                .set(m.attestation_duties_stake);
            self.max_consecutive_missed
                .with_label_values(labels)
                .set(m.max_consecutive_missed as f64);
            self.max_consecutive_missed_stake
                .with_label_values(labels)
                .set(m.max_consecutive_missed_stake);
            self.slashed_count
                .with_label_values(labels)
                .set(m.slashed_count as f64);
            self.slashed_stake
                .with_label_values(labels)
                .set(m.slashed_stake);

            for (status, count) in &m.status_counts {
                self.status_count
                    .with_label_values(&[label, network, status.as_str()])
                    .set(*count as f64);
            }
            for (status, stake) in &m.status_stakes {
                self.status_stake
                    .with_label_values(&[label, network, status.as_str()])
                    .set(*stake);
            }
            for (vtype, count) in &m.type_counts {
                self.validator_type_count
                    .with_label_values(&[label, network, vtype])
                    .set(*count as f64);
            }
            for (vtype, stake) in &m.type_stakes {
                self.validator_type_stake
                    .with_label_values(&[label, network, vtype])
                    .set(*stake);
            }

            self.advance_block_counters(label, network, m);
        }
    }

    fn reset_scoped_gauges(&self) {
        self.validator_count.reset();
        self.stake_count.reset();
        self.missed_attestations.reset();
        self.missed_attestations_stake.reset();
        self.suboptimal_source_votes.reset();
        self.suboptimal_source_stake.reset();
        self.suboptimal_target_votes.reset();
        self.suboptimal_target_stake.reset();
        self.suboptimal_head_votes.reset();
        self.suboptimal_head_stake.reset();
        self.proposed_blocks.reset();
        self.proposed_blocks_finalized.reset();
        self.missed_blocks.reset();
        self.missed_blocks_finalized.reset();
        self.future_block_proposals.reset();
        self.ideal_consensus_rewards.reset();
        self.consensus_rewards.reset();
        self.consensus_rewards_rate.reset();
        self.attestation_duties.reset();
        self.attestation_duties_success.reset();
        self.attestation_duties_rate.reset();
        self.attestation_duties_stake.reset();
        self.max_consecutive_missed.reset();
        self.max_consecutive_missed_stake.reset();
        self.slashed_count.reset();
        self.slashed_stake.reset();
        self.status_count.reset();
        self.status_stake.reset();
        self.validator_type_count.reset();
        self.validator_type_stake.reset();
    }

    fn advance_block_counters(&self, scope: &str, network: &str, m: &LabelMetrics) {
        let current = BlockTotals {
            proposed: m.proposed_blocks,
            proposed_finalized: m.proposed_blocks_finalized,
            missed: m.missed_blocks,
            missed_finalized: m.missed_blocks_finalized,
        };

        let mut last = self.last_block_totals.lock();
        let entry = last
            .entry((scope.to_string(), network.to_string()))
            .or_default();

        let labels = &[scope, network];
        self.proposed_blocks_total
            .with_label_values(labels)
            .inc_by(counter_delta(current.proposed, entry.proposed) as f64);
        self.proposed_blocks_finalized_total
            .with_label_values(labels)
            .inc_by(counter_delta(current.proposed_finalized, entry.proposed_finalized) as f64);
        self.missed_blocks_total
            .with_label_values(labels)
            .inc_by(counter_delta(current.missed, entry.missed) as f64);
        self.missed_blocks_finalized_total
            .with_label_values(labels)
            .inc_by(counter_delta(current.missed_finalized, entry.missed_finalized) as f64);

        *entry = current;
    }

    /// Update the ETH price gauge. A zero quote means "unavailable" and is
    /// published as-is.
    pub fn set_eth_price(&self, network: &str, eth_price: f64) {
        self.eth_usd_price.with_label_values(&[network]).set(eth_price);
    }

    /// Update the pending-queue gauges, ticked once per epoch.
    pub fn set_pending_queues(
        &self,
        network: &str,
        pending_deposits: f64,
        pending_deposits_value: f64,
        pending_consolidations: f64,
        pending_withdrawals: f64,
    ) {
        self.pending_deposits_count
            .with_label_values(&[network])
            .set(pending_deposits);
        self.pending_deposits_value
            .with_label_values(&[network])
            .set(pending_deposits_value);
        self.pending_consolidations_count
            .with_label_values(&[network])
            .set(pending_consolidations);
        self.pending_withdrawals_count
            .with_label_values(&[network])
            .set(pending_withdrawals);
    }

    /// Read back a gauge value. Intended for tests and diagnostics.
    pub fn gauge_value(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.sample_value(name, labels)
    }

    /// Read back a counter value. Intended for tests and diagnostics.
    pub fn counter_value(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.sample_value(name, labels)
    }

    fn sample_value(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        let full_name = format!("{NAMESPACE}_{name}");

        for family in self.registry.gather() {
            if family.get_name() != full_name {
                continue;
            }

            'metric: for metric in family.get_metric() {
                for (key, value) in labels {
                    let found = metric
                        .get_label()
                        .iter()
                        .any(|pair| pair.get_name() == *key && pair.get_value() == *value);
                    if !found {
                        continue 'metric;
                    }
                }

                if metric.has_gauge() {
                    return Some(metric.get_gauge().get_value());
                }
                if metric.has_counter() {
                    return Some(metric.get_counter().get_value());
                }
            }
        }

        None
    }

    /// Start the HTTP server for /metrics, /health, and /ready.
    pub async fn start_server(&self, port: u16, cancel: CancellationToken) -> Result<()> {
        let state = Arc::new(ServerState {
            registry: self.registry.clone(),
            ready: Arc::clone(&self.ready),
        });

        let app = Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .route("/ready", get(ready_handler))
            .with_state(state);

        let bind_addr = format!("0.0.0.0:{port}");
        let listener = TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("listening on {bind_addr}"))?;

        let local_addr = listener.local_addr().context("getting local address")?;

        *self.shutdown.lock() = Some(cancel.clone());

        tokio::spawn(async move {
            tracing::info!(addr = %local_addr, "metrics server started");

            let result = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
            })
            .await;

            if let Err(e) = result {
                tracing::error!(error = %e, "metrics server error");
            }
        });

        Ok(())
    }

    /// Shut the HTTP server down.
    pub fn stop_server(&self) {
        if let Some(cancel) = self.shutdown.lock().take() {
            cancel.cancel();
        }
    }
}

struct ServerState {
    registry: Registry,
    ready: Arc<AtomicBool>,
}

/// GET /metrics - Prometheus text format.
async fn metrics_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let families = state.registry.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buffer) {
        tracing::error!(error = %e, "encoding metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, "encoding error".to_string());
    }

    match String::from_utf8(buffer) {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => {
            tracing::error!(error = %e, "converting metrics to string");
            (StatusCode::INTERNAL_SERVER_ERROR, "encoding error".to_string())
        }
    }
}

/// GET /health - liveness: succeeds whenever the process can serve.
async fn health_handler() -> &'static str {
    "OK"
}

/// GET /ready - readiness: fails until the first validator load completes.
async fn ready_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    if state.ready.load(Ordering::SeqCst) {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}
