mod common;

use common::{TestChain, DAY, EASY_BITS, T0};
use consensus::process::mining::{BlockSigner, MiningError};
use consensus::{test_and_submit, ChainStore, CpuNonceSource, NonceSource, WorkItem};

/// First nonce that misses the work target
fn missing_nonce(chain: &TestChain, work: &WorkItem) -> u32 {
    let profile = chain.engine.profile();
    (0u32..)
        .find(|n| !work.target.is_met_by(&profile.hash_for_block_id(&work.header_with_nonce(*n))))
        .unwrap()
}

fn winning_nonce(chain: &TestChain, work: &WorkItem) -> u32 {
    let mut source = CpuNonceSource::default();
    source.find_nonces(work, chain.engine.profile().as_ref())[0]
}

#[test]
fn bitcoin_work_is_mined_and_submitted() {
    let chain = TestChain::bitcoin();
    let pubkey = chain.miner.public_key();
    let work = WorkItem::for_tip(&chain.engine, 1, &pubkey, vec![], 0, T0 + DAY).unwrap();
    assert_eq!(work.header.bits, EASY_BITS);
    assert_eq!(work.header.prev_block, chain.tip().hash);
    assert!(work.transactions[0].is_coinbase());
    assert_eq!(work.transactions[0].outputs()[0].value, chain.params().init_block_value);

    assert_eq!(test_and_submit(&chain.engine, None, &work, missing_nonce(&chain, &work)).unwrap(), None);
    assert_eq!(chain.tip().height, 0);

    let accepted = test_and_submit(&chain.engine, None, &work, winning_nonce(&chain, &work)).unwrap().unwrap();
    assert!(accepted.extends_best());
    assert_eq!(accepted.height, 1);
    assert_eq!(chain.tip().hash, accepted.hash);
    assert!(chain.tip().block.signature().is_empty());
    assert_eq!(chain.store.max_height().unwrap(), Some(1));
}

#[test]
fn nonce_source_resumes_after_its_last_scan() {
    let chain = TestChain::bitcoin();
    let pubkey = chain.miner.public_key();
    let work = WorkItem::for_tip(&chain.engine, 7, &pubkey, vec![], 0, T0 + DAY).unwrap();
    let mut source = CpuNonceSource { max_results: 3, ..Default::default() };
    let first = source.find_nonces(&work, chain.engine.profile().as_ref());
    let second = source.find_nonces(&work, chain.engine.profile().as_ref());
    assert_eq!(first.len(), 3);
    assert!(first.windows(2).all(|w| w[0] < w[1]));
    assert!(second[0] > first[2]);
}

#[test]
fn work_on_a_replaced_tip_is_stale() {
    let mut chain = TestChain::bitcoin();
    let pubkey = chain.miner.public_key();
    let work = WorkItem::for_tip(&chain.engine, 1, &pubkey, vec![], 0, T0 + DAY).unwrap();
    let nonce = winning_nonce(&chain, &work);
    chain.mine_work(T0 + DAY + 60);

    let genesis = chain.block_at(0).hash;
    match test_and_submit(&chain.engine, None, &work, nonce) {
        Err(MiningError::StaleWork(prev)) => assert_eq!(prev, genesis),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn stake_chains_need_a_signer() {
    let chain = TestChain::ppcoin();
    let pubkey = chain.miner.public_key();
    let work = WorkItem::for_tip(&chain.engine, 1, &pubkey, vec![], 0, T0 + DAY).unwrap();
    let nonce = winning_nonce(&chain, &work);

    assert!(matches!(test_and_submit(&chain.engine, None, &work, nonce), Err(MiningError::SignerRequired)));
    assert_eq!(chain.tip().height, 0);

    let signer: &dyn BlockSigner = &chain.miner;
    let accepted = test_and_submit(&chain.engine, Some(signer), &work, nonce).unwrap().unwrap();
    assert_eq!(accepted.height, 1);
    assert!(!chain.tip().block.signature().is_empty());
}

#[test]
fn maxcoin_refuses_to_mine() {
    let chain = TestChain::new("MaxCoin", |_| {});
    let pubkey = chain.miner.public_key();
    match WorkItem::for_tip(&chain.engine, 1, &pubkey, vec![], 0, T0 + DAY) {
        Err(MiningError::NotAllowed(name)) => assert_eq!(name, "MaxCoin"),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn rejected_blocks_surface_as_consensus_errors() {
    let chain = TestChain::bitcoin();
    let pubkey = chain.miner.public_key();
    // not after the median time past of the genesis block
    let work = WorkItem::for_tip(&chain.engine, 1, &pubkey, vec![], 0, T0).unwrap();
    let nonce = winning_nonce(&chain, &work);
    match test_and_submit(&chain.engine, None, &work, nonce) {
        Err(MiningError::Consensus(e)) => assert_eq!(e, consensus_core::ConsensusError::TimeTooOld),
        other => panic!("unexpected result {:?}", other),
    }
}
