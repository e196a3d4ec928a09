use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::warn;

use crate::types::{
    Attestation, Committee, Gwei, IdealReward, RewardsData, SignedGwei, TotalReward,
    ValidatorIndex, ValidatorLiveness, STAKE_UNIT_GWEI,
};

/// Number of committee slots addressable by the Electra committee bitvector.
const COMMITTEE_BITS_SIZE: usize = 64;

/// Errors decoding an SSZ bitfield from its hex wire form.
#[derive(Debug, Error)]
pub enum BitfieldError {
    #[error("invalid hex in bitfield {0:?}")]
    InvalidHex(String),

    #[error("bitfield of {bytes} bytes cannot hold {size} bits")]
    TooShort { bytes: usize, size: usize },
}

/// Decode a hex-encoded bitfield into its first `size` bit positions,
/// LSB-first within each byte.
///
/// The wire encoding may carry a bitlist terminator or padding bits past the
/// declared length; everything beyond `size` is ignored.
pub fn decode_bitfield(hex_bits: &str, size: usize) -> Result<Vec<bool>, BitfieldError> {
    let body = hex_bits.strip_prefix("0x").unwrap_or(hex_bits);

    let bytes =
        hex::decode(body).map_err(|_| BitfieldError::InvalidHex(hex_bits.to_string()))?;

    if bytes.len() * 8 < size {
        return Err(BitfieldError::TooShort {
            bytes: bytes.len(),
            size,
        });
    }

    let mut bits = vec![false; size];
    for (pos, bit) in bits.iter_mut().enumerate() {
        *bit = bytes[pos / 8] & (1 << (pos % 8)) != 0;
    }

    Ok(bits)
}

fn is_pre_electra(attestation: &Attestation) -> bool {
    attestation.committee_bits.is_empty() || attestation.committee_bits == "0x"
}

/// Attribute a slot's attestations to individual validators.
///
/// `committees` must be the rosters of the attested slot. Returns the union
/// of attesting validator indices over all attestations. Records that fail
/// to decode are skipped with a warning; one malformed attestation never
/// poisons the rest of the slot.
pub fn process_attestations(
    attestations: &[Attestation],
    committees: &[Committee],
) -> HashSet<ValidatorIndex> {
    let by_index: HashMap<u64, &Committee> = committees
        .iter()
        .map(|committee| (committee.index, committee))
        .collect();

    let mut attested = HashSet::new();

    for attestation in attestations {
        let result = if is_pre_electra(attestation) {
            attribute_single_committee(attestation, &by_index, &mut attested)
        } else {
            attribute_committee_span(attestation, &by_index, &mut attested)
        };

        if let Err(e) = result {
            warn!(
                slot = attestation.data.slot,
                committee_index = attestation.data.index,
                error = %e,
                "skipping undecodable attestation",
            );
        }
    }

    attested
}

/// Pre-Electra: one committee per attestation, selected by `data.index`;
/// aggregation bits run parallel to that committee's validator list.
fn attribute_single_committee(
    attestation: &Attestation,
    committees: &HashMap<u64, &Committee>,
    attested: &mut HashSet<ValidatorIndex>,
) -> Result<(), BitfieldError> {
    let Some(committee) = committees.get(&attestation.data.index) else {
        return Ok(());
    };

    let bits = decode_bitfield(&attestation.aggregation_bits, committee.validators.len())?;

    for (pos, validator) in committee.validators.iter().enumerate() {
        if bits[pos] {
            attested.insert(*validator);
        }
    }

    Ok(())
}

/// Electra: `committee_bits` selects the active committees; the aggregation
/// bits index the virtual concatenation of their rosters, in ascending
/// committee order.
fn attribute_committee_span(
    attestation: &Attestation,
    committees: &HashMap<u64, &Committee>,
    attested: &mut HashSet<ValidatorIndex>,
) -> Result<(), BitfieldError> {
    let committee_bits = decode_bitfield(&attestation.committee_bits, COMMITTEE_BITS_SIZE)?;

    let active: Vec<&Committee> = (0..COMMITTEE_BITS_SIZE as u64)
        .filter(|index| committee_bits[*index as usize])
        .filter_map(|index| committees.get(&index).copied())
        .collect();

    if active.is_empty() {
        return Ok(());
    }

    // The aggregation bitlist length is the sum of the active rosters; it
    // varies per attestation and must be recomputed every time.
    let total: usize = active.iter().map(|committee| committee.validators.len()).sum();
    let bits = decode_bitfield(&attestation.aggregation_bits, total)?;

    let mut offset = 0;
    for committee in active {
        for (pos, validator) in committee.validators.iter().enumerate() {
            if bits[offset + pos] {
                attested.insert(*validator);
            }
        }
        offset += committee.validators.len();
    }

    Ok(())
}

/// Collapse the liveness response into an index → is_live map.
pub fn process_liveness(entries: &[ValidatorLiveness]) -> HashMap<ValidatorIndex, bool> {
    entries
        .iter()
        .map(|entry| (entry.index, entry.is_live))
        .collect()
}

/// Ideal-vs-actual reward comparison for one validator over one epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct RewardBreakdown {
    pub ideal_source: Gwei,
    pub ideal_target: Gwei,
    pub ideal_head: Gwei,
    pub ideal_total: Gwei,
    pub actual_source: SignedGwei,
    pub actual_target: SignedGwei,
    pub actual_head: SignedGwei,
    pub actual_total: SignedGwei,
    pub suboptimal_source: bool,
    pub suboptimal_target: bool,
    pub suboptimal_head: bool,
}

/// Diff actual rewards against the ideal rewards for each validator's
/// effective-balance bucket.
///
/// The ideal record is matched on the validator's effective balance, falling
/// back to the 32 ETH bucket and then to any available bucket.
pub fn process_rewards(
    rewards: &RewardsData,
    balances: &HashMap<ValidatorIndex, Gwei>,
) -> HashMap<ValidatorIndex, RewardBreakdown> {
    let ideal_by_balance: HashMap<Gwei, &IdealReward> = rewards
        .ideal_rewards
        .iter()
        .map(|ideal| (ideal.effective_balance, ideal))
        .collect();

    let totals_by_index: HashMap<ValidatorIndex, &TotalReward> = rewards
        .total_rewards
        .iter()
        .map(|total| (total.validator_index, total))
        .collect();

    let mut result = HashMap::new();

    for (index, effective_balance) in balances {
        let Some(total) = totals_by_index.get(index) else {
            continue;
        };

        let Some(ideal) = ideal_by_balance
            .get(effective_balance)
            .or_else(|| ideal_by_balance.get(&STAKE_UNIT_GWEI))
            .or_else(|| ideal_by_balance.values().next())
        else {
            continue;
        };

        result.insert(
            *index,
            RewardBreakdown {
                ideal_source: ideal.source,
                ideal_target: ideal.target,
                ideal_head: ideal.head,
                ideal_total: ideal.source + ideal.target + ideal.head,
                actual_source: total.source,
                actual_target: total.target,
                actual_head: total.head,
                actual_total: total.source + total.target + total.head,
                suboptimal_source: total.source < ideal.source as SignedGwei,
                suboptimal_target: total.target < ideal.target as SignedGwei,
                suboptimal_head: total.head < ideal.head as SignedGwei,
            },
        );
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttestationData, Checkpoint};

    fn committee(index: u64, slot: u64, validators: Vec<ValidatorIndex>) -> Committee {
        Committee {
            index,
            slot,
            validators,
        }
    }

    fn attestation(
        aggregation_bits: &str,
        committee_bits: &str,
        slot: u64,
        committee_index: u64,
    ) -> Attestation {
        Attestation {
            aggregation_bits: aggregation_bits.to_string(),
            committee_bits: committee_bits.to_string(),
            data: AttestationData {
                slot,
                index: committee_index,
                beacon_block_root: "0x00".to_string(),
                source: Checkpoint {
                    epoch: 0,
                    root: "0x00".to_string(),
                },
                target: Checkpoint {
                    epoch: 1,
                    root: "0x00".to_string(),
                },
            },
            signature: "0x00".to_string(),
        }
    }

    fn set_positions(bits: &[bool]) -> Vec<usize> {
        bits.iter()
            .enumerate()
            .filter_map(|(pos, set)| set.then_some(pos))
            .collect()
    }

    #[test]
    fn test_decode_bitfield_lsb_first() {
        let bits = decode_bitfield("0x05", 8).expect("should decode");
        assert_eq!(set_positions(&bits), vec![0, 2]);

        let bits = decode_bitfield("0x80", 8).expect("should decode");
        assert_eq!(set_positions(&bits), vec![7]);

        let bits = decode_bitfield("0x55", 8).expect("should decode");
        assert_eq!(set_positions(&bits), vec![0, 2, 4, 6]);
    }

    #[test]
    fn test_decode_bitfield_multi_byte() {
        // 0x01 0x80: bit 0 of byte 0, bit 7 of byte 1.
        let bits = decode_bitfield("0x0180", 16).expect("should decode");
        assert_eq!(set_positions(&bits), vec![0, 15]);
    }

    #[test]
    fn test_decode_bitfield_truncates_at_size() {
        // Byte carries 8 bits but only the first 3 are in range.
        let bits = decode_bitfield("0xff", 3).expect("should decode");
        assert_eq!(bits.len(), 3);
        assert_eq!(set_positions(&bits), vec![0, 1, 2]);
    }

    #[test]
    fn test_decode_bitfield_without_prefix() {
        let bits = decode_bitfield("05", 8).expect("should decode");
        assert_eq!(set_positions(&bits), vec![0, 2]);
    }

    #[test]
    fn test_decode_bitfield_rejects_bad_hex() {
        assert!(matches!(
            decode_bitfield("0xzz", 8),
            Err(BitfieldError::InvalidHex(_)),
        ));
    }

    #[test]
    fn test_decode_bitfield_rejects_short_buffer() {
        assert!(matches!(
            decode_bitfield("0x05", 9),
            Err(BitfieldError::TooShort { bytes: 1, size: 9 }),
        ));
    }

    #[test]
    fn test_decode_reencode_round_trip() {
        // Re-encode the decoded positions and compare against the source
        // bits, ignoring padding past the declared length.
        let source = "0xa7c3";
        let size = 13;
        let bits = decode_bitfield(source, size).expect("should decode");

        let mut bytes = vec![0u8; (size + 7) / 8];
        for (pos, set) in bits.iter().enumerate() {
            if *set {
                bytes[pos / 8] |= 1 << (pos % 8);
            }
        }

        let reencoded = format!("0x{}", hex::encode(&bytes));
        let bits_again = decode_bitfield(&reencoded, size).expect("should decode");
        assert_eq!(bits, bits_again);
    }

    #[test]
    fn test_pre_electra_attribution() {
        let committees = vec![committee(3, 41, vec![10, 20, 30, 40, 50, 60, 70, 80])];
        // Positions 0 and 2 set.
        let attestations = vec![attestation("0x05", "", 41, 3)];

        let attested = process_attestations(&attestations, &committees);
        assert_eq!(attested, HashSet::from([10, 30]));
    }

    #[test]
    fn test_pre_electra_unknown_committee_is_skipped() {
        let committees = vec![committee(0, 41, vec![10, 20])];
        let attestations = vec![attestation("0x03", "", 41, 9)];

        let attested = process_attestations(&attestations, &committees);
        assert!(attested.is_empty());
    }

    #[test]
    fn test_electra_attribution_spans_committees() {
        let committees = vec![
            committee(0, 41, vec![10, 20, 30, 40]),
            committee(1, 41, vec![50, 60, 70, 80]),
        ];

        // committee_bits 0x03: committees 0 and 1 active. aggregation_bits
        // 0x85 over 8 bits: positions {0, 2, 7} -> validators 10, 30, 80.
        let attestations = vec![attestation("0x85", "0x03", 41, 0)];

        let attested = process_attestations(&attestations, &committees);
        assert_eq!(attested, HashSet::from([10, 30, 80]));
    }

    #[test]
    fn test_electra_offset_respects_committee_order() {
        let committees = vec![
            committee(0, 41, vec![1, 2]),
            committee(2, 41, vec![3, 4, 5]),
        ];

        // Committees 0 and 2 active; virtual roster [1,2,3,4,5].
        // Bits {1, 4} -> validators 2 and 5.
        let attestations = vec![attestation("0x12", "0x05", 41, 0)];

        let attested = process_attestations(&attestations, &committees);
        assert_eq!(attested, HashSet::from([2, 5]));
    }

    #[test]
    fn test_union_over_multiple_attestations() {
        let committees = vec![
            committee(0, 41, vec![10, 20]),
            committee(1, 41, vec![30, 40]),
        ];

        let attestations = vec![
            attestation("0x01", "0x01", 41, 0),
            attestation("0x02", "0x02", 41, 1),
        ];

        let attested = process_attestations(&attestations, &committees);
        assert_eq!(attested, HashSet::from([10, 40]));
    }

    #[test]
    fn test_undecodable_attestation_does_not_poison_slot() {
        let committees = vec![committee(0, 41, vec![10, 20])];

        let attestations = vec![
            attestation("0xzz", "", 41, 0),
            attestation("0x01", "", 41, 0),
        ];

        let attested = process_attestations(&attestations, &committees);
        assert_eq!(attested, HashSet::from([10]));
    }

    #[test]
    fn test_process_liveness_maps_entries() {
        let entries = vec![
            ValidatorLiveness {
                index: 1,
                is_live: true,
            },
            ValidatorLiveness {
                index: 2,
                is_live: false,
            },
        ];

        let live = process_liveness(&entries);
        assert_eq!(live.get(&1), Some(&true));
        assert_eq!(live.get(&2), Some(&false));
    }

    fn rewards_fixture() -> RewardsData {
        RewardsData {
            ideal_rewards: vec![IdealReward {
                effective_balance: STAKE_UNIT_GWEI,
                head: 1000,
                target: 2000,
                source: 3000,
            }],
            total_rewards: vec![TotalReward {
                validator_index: 7,
                head: 900,
                target: 2000,
                source: 2500,
            }],
        }
    }

    #[test]
    fn test_reward_diff_flags_suboptimal_votes() {
        let balances = HashMap::from([(7, STAKE_UNIT_GWEI)]);
        let result = process_rewards(&rewards_fixture(), &balances);

        let breakdown = result.get(&7).expect("validator present");
        assert!(breakdown.suboptimal_source);
        assert!(!breakdown.suboptimal_target);
        assert!(breakdown.suboptimal_head);
        assert_eq!(breakdown.ideal_total, 6000);
        assert_eq!(breakdown.actual_total, 5400);
    }

    #[test]
    fn test_reward_diff_negative_actual() {
        let mut rewards = rewards_fixture();
        rewards.total_rewards[0].source = -2500;

        let balances = HashMap::from([(7, STAKE_UNIT_GWEI)]);
        let result = process_rewards(&rewards, &balances);

        let breakdown = result.get(&7).expect("validator present");
        assert!(breakdown.suboptimal_source);
        assert_eq!(breakdown.actual_total, -2500 + 2000 + 900);
    }

    #[test]
    fn test_reward_diff_falls_back_to_standard_bucket() {
        // Validator has a non-standard effective balance with no matching
        // ideal bucket; the 32 ETH bucket applies.
        let balances = HashMap::from([(7, 31_000_000_000u64)]);
        let result = process_rewards(&rewards_fixture(), &balances);

        assert_eq!(result.get(&7).expect("present").ideal_total, 6000);
    }

    #[test]
    fn test_reward_diff_falls_back_to_any_bucket() {
        let mut rewards = rewards_fixture();
        rewards.ideal_rewards[0].effective_balance = 2_048_000_000_000;

        let balances = HashMap::from([(7, STAKE_UNIT_GWEI)]);
        let result = process_rewards(&rewards, &balances);

        assert_eq!(result.get(&7).expect("present").ideal_total, 6000);
    }

    #[test]
    fn test_reward_diff_skips_validators_without_totals() {
        let balances = HashMap::from([(7, STAKE_UNIT_GWEI), (8, STAKE_UNIT_GWEI)]);
        let result = process_rewards(&rewards_fixture(), &balances);

        assert!(result.contains_key(&7));
        assert!(!result.contains_key(&8));
    }
}
