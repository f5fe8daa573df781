//! Stake modifier selection.
//!
//! A new 64-bit modifier is generated at most once per modifier interval.
//! Each of its bits is the entropy bit of a block picked from a trailing
//! window of candidates, one selection round per bit.

use super::variant::BlockVariant;
use crate::consensus::storage::{BlockEntry, ChainView};
use chain_math::U256;
use consensus_core::constants::{MODIFIER_INTERVAL, MODIFIER_INTERVAL_RATIO, MODIFIER_SELECTION_ROUNDS};
use consensus_core::errors::ConsensusResult;
use consensus_core::{Hash, InternalError, ProofType};
use crypto_hashes::double_sha256;
use log::{debug, error};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::Arc;

/// Length of selection section `section`; early sections are shorter
pub fn selection_section(section: usize) -> i64 {
    let last = (MODIFIER_SELECTION_ROUNDS - 1) as i64;
    let section = section as i64;
    MODIFIER_INTERVAL as i64 * last / (last + (last - section) * (MODIFIER_INTERVAL_RATIO as i64 - 1))
}

/// Total length of the selection window, in seconds
pub static SELECTION_INTERVAL: Lazy<i64> = Lazy::new(|| (0..MODIFIER_SELECTION_ROUNDS).map(selection_section).sum());

/// Nearest block at or before `from` that generated a modifier
fn last_stake_modifier(chain: &ChainView, from: &Arc<BlockEntry>) -> ConsensusResult<(u64, u32)> {
    let mut cur = from.clone();
    loop {
        if let Some(modifier) = cur.stake.stake_modifier {
            return Ok((modifier, cur.timestamp()));
        }
        match chain.prev(&cur)? {
            Some(prev) => cur = prev,
            None => {
                error!("no stake modifier generated at genesis block {}", cur.hash);
                return Err(InternalError::MissingGenesisModifier.into());
            }
        }
    }
}

struct Candidate {
    entry: Arc<BlockEntry>,
    proof_hash: Hash,
}

/// Selection score of a candidate: double SHA-256 of its proof hash and the
/// previous modifier, shifted down 32 bits for stake blocks. The lowest
/// score is selected, so stake blocks are favored.
fn selection_hash(candidate: &Candidate, prev_modifier: u64) -> U256 {
    let mut input = Vec::with_capacity(40);
    input.extend_from_slice(candidate.proof_hash.as_bytes());
    input.extend_from_slice(&prev_modifier.to_le_bytes());
    let score = U256::from_little_endian(&double_sha256(&input));
    match candidate.entry.proof_type() {
        ProofType::Stake => score >> 32,
        ProofType::Work => score,
    }
}

fn select_block<'c>(
    candidates: &'c [Candidate],
    selected: &HashSet<u64>,
    stop: i64,
    prev_modifier: u64,
) -> Option<&'c Candidate> {
    let mut best: Option<(&Candidate, U256)> = None;
    for candidate in candidates {
        if best.is_some() && candidate.entry.timestamp() as i64 > stop {
            break;
        }
        if selected.contains(&candidate.entry.height) {
            continue;
        }
        let score = selection_hash(candidate, prev_modifier);
        match best {
            Some((_, best_score)) if score >= best_score => {}
            _ => best = Some((candidate, score)),
        }
    }
    best.map(|(c, _)| c)
}

/// Modifier generated by the block following `prev`.
///
/// Returns `Some(0)` for the genesis block (no `prev`), `None` when the
/// current modifier is still inside its interval and is inherited.
pub fn compute_stake_modifier(
    chain: &ChainView,
    variant: &dyn BlockVariant,
    prev: Option<&Arc<BlockEntry>>,
) -> ConsensusResult<Option<u64>> {
    let prev = match prev {
        Some(prev) => prev,
        None => return Ok(Some(0)),
    };
    let (prev_modifier, modifier_time) = last_stake_modifier(chain, prev)?;
    let interval = MODIFIER_INTERVAL as i64;
    let interval_start = prev.timestamp() as i64 / interval * interval;
    if modifier_time as i64 >= interval_start {
        return Ok(None);
    }

    let selection_start = interval_start - *SELECTION_INTERVAL;
    let mut candidates = Vec::new();
    let mut cur = Some(prev.clone());
    while let Some(entry) = cur {
        if (entry.timestamp() as i64) < selection_start {
            break;
        }
        cur = chain.prev(&entry)?;
        let proof_hash = entry.proof_hash()?;
        candidates.push(Candidate { entry, proof_hash });
    }
    // equal timestamps keep walk order: the higher block first
    candidates.sort_by(|a, b| a.entry.timestamp().cmp(&b.entry.timestamp()).then(b.entry.height.cmp(&a.entry.height)));

    let mut modifier: u64 = 0;
    let mut stop = selection_start;
    let mut selected = HashSet::new();
    let rounds = MODIFIER_SELECTION_ROUNDS.min(candidates.len());
    for round in 0..rounds {
        stop += selection_section(round);
        let pick = select_block(&candidates, &selected, stop, prev_modifier).ok_or_else(|| {
            error!("stake modifier selection round {} after block {} has no candidate", round, prev.hash);
            InternalError::EmptyModifierSelectionRound { round }
        })?;
        modifier |= variant.stake_entropy_bit(&pick.entry) << round;
        selected.insert(pick.entry.height);
    }
    debug!(
        "stake modifier after height {}: {:016x} from {} candidates (previous {:016x})",
        prev.height,
        modifier,
        candidates.len(),
        prev_modifier
    );
    Ok(Some(modifier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::stake::variant::StandardPosBlock;
    use crate::test_utils::{coinbase, easy_params, seal, ChainBuilder, T0};
    use consensus_core::{Header, OutPoint, StakeRecord, Transaction, TxIn, TxOut};

    fn candidate(height: u64, timestamp: u32, stake: bool, proof_hash: Hash) -> Candidate {
        let codec = easy_params().codec();
        let pubkey = [0x02; 33];
        let mut txs = vec![coinbase(height, timestamp, 0, &pubkey)];
        if stake {
            let kernel = OutPoint::new(Hash::from_le_u64([height, 0, 0, 1]), 0);
            txs.push(Transaction::new(
                1,
                timestamp,
                vec![TxIn::new(kernel, vec![])],
                vec![TxOut::empty(), TxOut::pay_to_pubkey(1, &pubkey)],
                0,
            ));
        }
        let block = seal(Header { version: 1, timestamp, ..Default::default() }, txs, &codec);
        let entry = Arc::new(BlockEntry::new(Arc::new(block), height, StakeRecord::default(), &codec));
        Candidate { entry, proof_hash }
    }

    fn pick_height(candidates: &[Candidate], selected: &HashSet<u64>, stop: i64) -> u64 {
        select_block(candidates, selected, stop, 7).unwrap().entry.height
    }

    #[test]
    fn sections_grow_towards_the_interval() {
        assert_eq!(selection_section(0), 21600 * 63 / (63 + 63 * 2));
        assert_eq!(selection_section(63), 21600);
        assert!(selection_section(10) < selection_section(11));
        let total = *SELECTION_INTERVAL;
        assert!(total > 8 * 86_400 && total < 9 * 86_400);
    }

    #[test]
    fn genesis_gets_zero_modifier() {
        let builder = ChainBuilder::new(easy_params());
        let view = builder.view();
        assert_eq!(compute_stake_modifier(&view, &StandardPosBlock, None).unwrap(), Some(0));
    }

    #[test]
    fn modifier_is_inherited_within_interval() {
        let mut builder = ChainBuilder::new(easy_params());
        builder.push_work(60, crate::test_utils::EASY_BITS);
        let view = builder.view();
        let tip = view.best().unwrap().clone();
        assert_eq!(compute_stake_modifier(&view, &StandardPosBlock, Some(&tip)).unwrap(), None);
    }

    #[test]
    fn selection_is_deterministic() {
        let mut builder = ChainBuilder::new(easy_params());
        for _ in 0..40 {
            builder.push_work(3 * 60 * 60, crate::test_utils::EASY_BITS);
        }
        let view = builder.view();
        let generated = (1..=40).filter(|h| view.block_at(*h).unwrap().stake.stake_modifier.is_some()).count();
        assert!(generated > 0);
        let tip = view.best().unwrap().clone();
        let first = compute_stake_modifier(&view, &StandardPosBlock, Some(&tip)).unwrap();
        let second = compute_stake_modifier(&view, &StandardPosBlock, Some(&tip)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_genesis_modifier_is_internal() {
        let mut builder = ChainBuilder::without_genesis_modifier(easy_params());
        let block = builder.work_block(60, crate::test_utils::EASY_BITS);
        builder.push_entry(block, consensus_core::StakeRecord::default());
        let view = builder.view();
        let tip = view.best().unwrap().clone();
        let err = compute_stake_modifier(&view, &StandardPosBlock, Some(&tip)).unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn lowest_score_is_selected() {
        let candidates: Vec<_> = (1..=5).map(|h| candidate(h, T0, false, Hash::from_le_u64([h, 3, 5, 7]))).collect();
        let scores: Vec<U256> = candidates.iter().map(|c| selection_hash(c, 7)).collect();
        let lowest = (0..5).min_by_key(|i| scores[*i]).unwrap();
        let mut selected = HashSet::new();
        assert_eq!(pick_height(&candidates, &selected, i64::MAX), candidates[lowest].entry.height);

        // an already selected block is skipped in later rounds
        selected.insert(candidates[lowest].entry.height);
        let runner_up = (0..5).filter(|i| *i != lowest).min_by_key(|i| scores[*i]).unwrap();
        assert_eq!(pick_height(&candidates, &selected, i64::MAX), candidates[runner_up].entry.height);
    }

    #[test]
    fn equal_scores_keep_the_first_candidate() {
        let proof = Hash::from_le_u64([9, 9, 9, 9]);
        let candidates = vec![candidate(4, T0, false, proof), candidate(3, T0, false, proof)];
        assert_eq!(selection_hash(&candidates[0], 7), selection_hash(&candidates[1], 7));
        assert_eq!(pick_height(&candidates, &HashSet::new(), i64::MAX), 4);
    }

    #[test]
    fn stake_scores_are_shifted_down() {
        let proof = Hash::from_le_u64([1, 2, 3, 4]);
        let work = candidate(1, T0, false, proof);
        let stake = candidate(2, T0, true, proof);
        assert_eq!(stake.entry.proof_type(), ProofType::Stake);
        assert_eq!(selection_hash(&stake, 7), selection_hash(&work, 7) >> 32);

        // same proof hash: the stake block wins even when listed second
        let candidates = vec![work, stake];
        assert_eq!(pick_height(&candidates, &HashSet::new(), i64::MAX), 2);
    }

    #[test]
    fn candidates_past_the_stop_wait_for_a_later_round() {
        let candidates: Vec<_> = (1..=4)
            .map(|h| candidate(h, T0 + h as u32 * 60, false, Hash::from_le_u64([h, 8, 8, 8])))
            .collect();
        // only the first candidate lies before the stop; it is taken whatever its score
        assert_eq!(pick_height(&candidates, &HashSet::new(), T0 as i64), 1);

        // with nothing selectable before the stop the walk continues past it
        let selected = HashSet::from([1]);
        assert_eq!(pick_height(&candidates, &selected, T0 as i64), 2);
    }
}
