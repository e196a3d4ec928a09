use serde::Deserialize;

/// Slot number on the beacon chain, indexed from 0 at genesis.
pub type Slot = u64;

/// Epoch number, a fixed run of consecutive slots.
pub type Epoch = u64;

/// Index of a validator in the beacon state.
pub type ValidatorIndex = u64;

/// Amount in gwei, always non-negative.
pub type Gwei = u64;

/// Amount in gwei that can be negative (penalties).
pub type SignedGwei = i64;

/// Effective balance of a standard validator, used as the stake-weight unit.
pub const STAKE_UNIT_GWEI: Gwei = 32_000_000_000;

/// The beacon REST API encodes most numbers as JSON strings. These helpers
/// decode (and re-encode) any `FromStr`/`Display` number through that quoting.
pub mod quoted {
    use core::fmt::Display;
    use core::str::FromStr;

    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        serializer.collect_str(value)
    }
}

/// Like [`quoted`], for sequences of string-encoded numbers.
pub mod quoted_vec {
    use core::fmt::Display;
    use core::str::FromStr;

    use serde::{de::Error as _, Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|item| item.parse().map_err(D::Error::custom))
            .collect()
    }
}

/// Validator lifecycle status as reported by the beacon node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorStatus {
    PendingInitialized,
    PendingQueued,
    ActiveOngoing,
    ActiveExiting,
    ActiveSlashed,
    ExitedUnslashed,
    ExitedSlashed,
    WithdrawalPossible,
    WithdrawalDone,
}

impl ValidatorStatus {
    /// Whether the validator is expected to be attesting.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Self::ActiveOngoing | Self::ActiveExiting | Self::ActiveSlashed,
        )
    }

    /// Wire representation, also used as a metric label value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PendingInitialized => "pending_initialized",
            Self::PendingQueued => "pending_queued",
            Self::ActiveOngoing => "active_ongoing",
            Self::ActiveExiting => "active_exiting",
            Self::ActiveSlashed => "active_slashed",
            Self::ExitedUnslashed => "exited_unslashed",
            Self::ExitedSlashed => "exited_slashed",
            Self::WithdrawalPossible => "withdrawal_possible",
            Self::WithdrawalDone => "withdrawal_done",
        }
    }
}

/// Classify a validator by its withdrawal-credentials prefix.
///
/// Returns "0" for 0x00 (BLS), "1" for 0x01 (execution address), "2" for
/// 0x02 (compounding, EIP-7251). Malformed credentials fall back to "0".
pub fn validator_type(withdrawal_credentials: &str) -> &'static str {
    let body = withdrawal_credentials
        .strip_prefix("0x")
        .unwrap_or(withdrawal_credentials);

    match body.get(..2) {
        Some("01") => "1",
        Some("02") => "2",
        _ => "0",
    }
}

/// Genesis information for the chain.
#[derive(Debug, Clone, Deserialize)]
pub struct Genesis {
    #[serde(with = "quoted")]
    pub genesis_time: u64,
    pub genesis_validators_root: String,
}

/// Chain spec parameters the watcher needs for slot arithmetic.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ChainSpec {
    #[serde(rename = "SECONDS_PER_SLOT", with = "quoted")]
    pub seconds_per_slot: u64,
    #[serde(rename = "SLOTS_PER_EPOCH", with = "quoted")]
    pub slots_per_epoch: u64,
    #[serde(rename = "EPOCHS_PER_SYNC_COMMITTEE_PERIOD", with = "quoted")]
    pub epochs_per_sync_committee_period: u64,
}

/// Signed header of a beacon block.
#[derive(Debug, Clone, Deserialize)]
pub struct BeaconHeader {
    pub root: String,
    pub header: SignedHeader,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignedHeader {
    pub message: HeaderMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeaderMessage {
    #[serde(with = "quoted")]
    pub slot: Slot,
    #[serde(with = "quoted")]
    pub proposer_index: ValidatorIndex,
    pub parent_root: String,
    pub state_root: String,
    pub body_root: String,
}

/// A validator entry from the full-state snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct Validator {
    #[serde(with = "quoted")]
    pub index: ValidatorIndex,
    #[serde(with = "quoted")]
    pub balance: Gwei,
    pub status: ValidatorStatus,
    #[serde(rename = "validator")]
    pub data: ValidatorData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorData {
    pub pubkey: String,
    pub withdrawal_credentials: String,
    #[serde(with = "quoted")]
    pub effective_balance: Gwei,
    pub slashed: bool,
    #[serde(with = "quoted")]
    pub activation_eligibility_epoch: Epoch,
    #[serde(with = "quoted")]
    pub activation_epoch: Epoch,
    #[serde(with = "quoted")]
    pub exit_epoch: Epoch,
    #[serde(with = "quoted")]
    pub withdrawable_epoch: Epoch,
}

/// A block-proposal duty for one slot.
#[derive(Debug, Clone, Deserialize)]
pub struct ProposerDuty {
    pub pubkey: String,
    #[serde(with = "quoted")]
    pub validator_index: ValidatorIndex,
    #[serde(with = "quoted")]
    pub slot: Slot,
}

/// A beacon block, reduced to the fields the watcher reads.
#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    pub message: BlockMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockMessage {
    #[serde(with = "quoted")]
    pub slot: Slot,
    #[serde(with = "quoted")]
    pub proposer_index: ValidatorIndex,
    pub body: BlockBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockBody {
    #[serde(default)]
    pub execution_payload: Option<ExecutionPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionPayload {
    pub fee_recipient: String,
}

/// A checkpoint vote (source or target) inside attestation data.
#[derive(Debug, Clone, Deserialize)]
pub struct Checkpoint {
    #[serde(with = "quoted")]
    pub epoch: Epoch,
    pub root: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttestationData {
    #[serde(with = "quoted")]
    pub slot: Slot,
    /// Committee index. Only meaningful for pre-Electra attestations.
    #[serde(with = "quoted")]
    pub index: u64,
    pub beacon_block_root: String,
    pub source: Checkpoint,
    pub target: Checkpoint,
}

/// An attestation from a block body.
///
/// Post-Electra, `committee_bits` selects which committees the aggregate
/// spans; `aggregation_bits` is then indexed over their concatenation.
#[derive(Debug, Clone, Deserialize)]
pub struct Attestation {
    pub aggregation_bits: String,
    #[serde(default)]
    pub committee_bits: String,
    pub data: AttestationData,
    pub signature: String,
}

/// The ordered validator roster of one committee in one slot.
#[derive(Debug, Clone, Deserialize)]
pub struct Committee {
    #[serde(with = "quoted")]
    pub index: u64,
    #[serde(with = "quoted")]
    pub slot: Slot,
    #[serde(with = "quoted_vec")]
    pub validators: Vec<ValidatorIndex>,
}

/// Liveness of one validator over an epoch.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorLiveness {
    #[serde(with = "quoted")]
    pub index: ValidatorIndex,
    pub is_live: bool,
}

/// Ideal attestation rewards for one effective-balance bucket.
#[derive(Debug, Clone, Deserialize)]
pub struct IdealReward {
    #[serde(with = "quoted")]
    pub effective_balance: Gwei,
    #[serde(with = "quoted")]
    pub head: Gwei,
    #[serde(with = "quoted")]
    pub target: Gwei,
    #[serde(with = "quoted")]
    pub source: Gwei,
}

/// Actual attestation rewards for one validator. Components can be negative.
#[derive(Debug, Clone, Deserialize)]
pub struct TotalReward {
    #[serde(with = "quoted")]
    pub validator_index: ValidatorIndex,
    #[serde(with = "quoted")]
    pub head: SignedGwei,
    #[serde(with = "quoted")]
    pub target: SignedGwei,
    #[serde(with = "quoted")]
    pub source: SignedGwei,
}

/// Attestation rewards for an epoch.
#[derive(Debug, Clone, Deserialize)]
pub struct RewardsData {
    pub ideal_rewards: Vec<IdealReward>,
    pub total_rewards: Vec<TotalReward>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PendingDeposit {
    pub pubkey: String,
    #[serde(with = "quoted")]
    pub amount: Gwei,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PendingConsolidation {
    #[serde(with = "quoted")]
    pub source_index: ValidatorIndex,
    #[serde(with = "quoted")]
    pub target_index: ValidatorIndex,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PendingWithdrawal {
    #[serde(with = "quoted")]
    pub index: u64,
    #[serde(with = "quoted")]
    pub validator_index: ValidatorIndex,
    #[serde(with = "quoted")]
    pub amount: Gwei,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validator_status_is_active() {
        assert!(ValidatorStatus::ActiveOngoing.is_active());
        assert!(ValidatorStatus::ActiveExiting.is_active());
        assert!(ValidatorStatus::ActiveSlashed.is_active());
        assert!(!ValidatorStatus::PendingQueued.is_active());
        assert!(!ValidatorStatus::ExitedUnslashed.is_active());
        assert!(!ValidatorStatus::WithdrawalDone.is_active());
    }

    #[test]
    fn test_validator_status_decodes_from_wire() {
        let status: ValidatorStatus =
            serde_json::from_str("\"active_ongoing\"").expect("should decode");
        assert_eq!(status, ValidatorStatus::ActiveOngoing);
        assert_eq!(status.as_str(), "active_ongoing");
    }

    #[test]
    fn test_validator_type_from_credentials() {
        assert_eq!(validator_type("0x00aabb"), "0");
        assert_eq!(validator_type("0x01aabb"), "1");
        assert_eq!(validator_type("0x02aabb"), "2");
        assert_eq!(validator_type("0xff00"), "0");
        assert_eq!(validator_type("0x"), "0");
        assert_eq!(validator_type(""), "0");
    }

    #[test]
    fn test_validator_decodes_quoted_numbers() {
        let raw = r#"{
            "index": "123",
            "balance": "32000000000",
            "status": "active_ongoing",
            "validator": {
                "pubkey": "0xabcd",
                "withdrawal_credentials": "0x01dead",
                "effective_balance": "32000000000",
                "slashed": false,
                "activation_eligibility_epoch": "0",
                "activation_epoch": "1",
                "exit_epoch": "18446744073709551615",
                "withdrawable_epoch": "18446744073709551615"
            }
        }"#;

        let validator: Validator = serde_json::from_str(raw).expect("should decode");
        assert_eq!(validator.index, 123);
        assert_eq!(validator.balance, 32_000_000_000);
        assert_eq!(validator.data.exit_epoch, u64::MAX);
        assert_eq!(validator_type(&validator.data.withdrawal_credentials), "1");
    }

    #[test]
    fn test_attestation_committee_bits_default_empty() {
        let raw = r#"{
            "aggregation_bits": "0x05",
            "data": {
                "slot": "41",
                "index": "3",
                "beacon_block_root": "0x00",
                "source": {"epoch": "0", "root": "0x00"},
                "target": {"epoch": "1", "root": "0x00"}
            },
            "signature": "0x00"
        }"#;

        let attestation: Attestation = serde_json::from_str(raw).expect("should decode");
        assert!(attestation.committee_bits.is_empty());
        assert_eq!(attestation.data.slot, 41);
        assert_eq!(attestation.data.index, 3);
    }

    #[test]
    fn test_committee_validators_parsed_to_indices() {
        let raw = r#"{"index": "5", "slot": "100", "validators": ["10", "20", "30"]}"#;
        let committee: Committee = serde_json::from_str(raw).expect("should decode");
        assert_eq!(committee.validators, vec![10, 20, 30]);
    }

    #[test]
    fn test_chain_spec_screaming_keys() {
        let raw = r#"{
            "SECONDS_PER_SLOT": "12",
            "SLOTS_PER_EPOCH": "32",
            "EPOCHS_PER_SYNC_COMMITTEE_PERIOD": "256",
            "OTHER_IGNORED_KEY": "7"
        }"#;

        let spec: ChainSpec = serde_json::from_str(raw).expect("should decode");
        assert_eq!(spec.seconds_per_slot, 12);
        assert_eq!(spec.slots_per_epoch, 32);
        assert_eq!(spec.epochs_per_sync_committee_period, 256);
    }

    #[test]
    fn test_total_reward_negative_components() {
        let raw = r#"{
            "validator_index": "42",
            "head": "-120",
            "target": "2000",
            "source": "-3000"
        }"#;

        let total: TotalReward = serde_json::from_str(raw).expect("should decode");
        assert_eq!(total.head, -120);
        assert_eq!(total.source, -3000);
    }
}
