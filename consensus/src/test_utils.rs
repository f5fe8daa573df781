//! Chain fixtures shared by the unit tests.

use crate::consensus::stake::{compute_stake_modifier, StandardPosBlock};
use crate::consensus::storage::{BlockEntry, ChainStore, ChainView, MemoryChainStore};
use crate::consensus::validation::Secp256k1Signer;
use consensus_core::{
    Block, ChainCodec, ChainParams, Hash, HashAlgo, Header, OutPoint, StakeRecord, Target, Transaction, TxFormat, TxIn,
    TxOut,
};
use std::sync::Arc;

/// Loosest compact target; roughly every other hash meets it
pub const EASY_BITS: u32 = 0x207fffff;

/// Genesis timestamp of fixture chains
pub const T0: u32 = 1_400_000_000;

/// Secret of the key fixture coinbases pay to
pub const MINER_SECRET: [u8; 32] = [0x11; 32];

/// Proof-of-stake parameters with trivial targets
pub fn easy_params() -> ChainParams {
    let easy = Target::from_compact(EASY_BITS).unwrap();
    ChainParams {
        name: "Testcoin".into(),
        symbol: "TST".into(),
        genesis: Hash::zeroed(),
        block_span: 600,
        coin_value: 1_000_000,
        max_money: 2_000_000_000 * 1_000_000,
        min_tx_fee: 10_000,
        init_block_value: 50 * 1_000_000,
        half_life: 0,
        coinbase_maturity: 3,
        annual_percentage_rate: 1,
        max_target: easy,
        max_target_stake: easy,
        init_target: easy,
        target_spacing_work_max: 7200,
        pow_of_difficulty_to_half_subsidy: 1.0,
        median_time_span: 11,
        message_hash: HashAlgo::Sha256d,
        block_hash: HashAlgo::Sha256d,
        tx_format: TxFormat::Timestamped,
        checkpoint_master_pubkey: String::new(),
    }
}

/// Builds a main chain directly in a [`MemoryChainStore`], bypassing
/// validation. `params().genesis` is set to the fixture genesis.
pub struct ChainBuilder {
    params: ChainParams,
    codec: ChainCodec,
    store: MemoryChainStore,
    tip: Arc<BlockEntry>,
    miner: Secp256k1Signer,
}

impl ChainBuilder {
    pub fn new(params: ChainParams) -> Self {
        Self::with_genesis_stake(params, StakeRecord::new(None, Some(0)))
    }

    /// Chain whose genesis never generated a stake modifier
    pub fn without_genesis_modifier(params: ChainParams) -> Self {
        Self::with_genesis_stake(params, StakeRecord::default())
    }

    fn with_genesis_stake(mut params: ChainParams, stake: StakeRecord) -> Self {
        let codec = params.codec();
        let miner = Secp256k1Signer::from_secret_bytes(&MINER_SECRET).unwrap();
        let header = Header { version: 1, prev_block: Hash::zeroed(), timestamp: T0, bits: EASY_BITS, ..Default::default() };
        let genesis = seal(header, vec![coinbase(0, T0, 100 * params.coin_value, &miner.public_key())], &codec);
        let entry = Arc::new(BlockEntry::new(Arc::new(genesis), 0, stake, &codec));
        params.genesis = entry.hash;

        let store = MemoryChainStore::new();
        store.insert_block(entry.clone(), true).unwrap();
        save_coins(&store, &entry);
        Self { params, codec, store, tip: entry, miner }
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    pub fn store(&self) -> &MemoryChainStore {
        &self.store
    }

    pub fn tip(&self) -> &Arc<BlockEntry> {
        &self.tip
    }

    pub fn miner(&self) -> &Secp256k1Signer {
        &self.miner
    }

    pub fn view(&self) -> ChainView<'_> {
        ChainView::new(&self.store, Some(self.tip.clone()))
    }

    /// Unstored work block `spacing` seconds after the tip; its coinbase
    /// pays 100 coins to the miner key
    pub fn work_block(&self, spacing: u32, bits: u32) -> Block {
        let height = self.tip.height + 1;
        let timestamp = self.tip.timestamp() + spacing;
        let header = Header { version: 1, prev_block: self.tip.hash, timestamp, bits, ..Default::default() };
        let txs = vec![coinbase(height, timestamp, 100 * self.params.coin_value, &self.miner.public_key())];
        seal(header, txs, &self.codec)
    }

    /// Appends a work block, generating its stake modifier like the engine
    pub fn push_work(&mut self, spacing: u32, bits: u32) -> Arc<BlockEntry> {
        let block = self.work_block(spacing, bits);
        let modifier = compute_stake_modifier(&self.view(), &StandardPosBlock, Some(&self.tip)).unwrap();
        self.push_entry(block, StakeRecord::new(None, modifier))
    }

    /// Appends `block` as the new tip with the given stake data
    pub fn push_entry(&mut self, block: Block, stake: StakeRecord) -> Arc<BlockEntry> {
        let entry = Arc::new(BlockEntry::new(Arc::new(block), self.tip.height + 1, stake, &self.codec));
        self.store.insert_block(entry.clone(), true).unwrap();
        save_coins(&self.store, &entry);
        self.tip = entry.clone();
        entry
    }
}

/// Coinbase with a height-unique script
pub fn coinbase(height: u64, time: u32, value: i64, pubkey: &[u8]) -> Transaction {
    Transaction::new(
        1,
        time,
        vec![TxIn::new(OutPoint::null(), height.to_le_bytes().to_vec())],
        vec![TxOut::pay_to_pubkey(value, pubkey)],
        0,
    )
}

/// Block over `txs` with its merkle root filled in
pub fn seal(mut header: Header, txs: Vec<Transaction>, codec: &ChainCodec) -> Block {
    header.merkle_root = Block::new(header, txs.clone(), vec![]).compute_merkle_root(codec);
    Block::new(header, txs, vec![])
}

fn save_coins(store: &MemoryChainStore, entry: &BlockEntry) {
    for (tx, id) in entry.block.transactions().iter().zip(&entry.tx_ids) {
        if !tx.is_coinbase() {
            for input in tx.inputs() {
                let prev = &input.prev_out;
                if let Some(mut coins) = store.coins_by_tx_hash(&prev.tx_hash).unwrap() {
                    coins[prev.index as usize] = false;
                    store.save_coins_by_tx_hash(&prev.tx_hash, coins).unwrap();
                }
            }
        }
        store.save_coins_by_tx_hash(id, vec![true; tx.outputs().len()]).unwrap();
    }
}
