//! Test chains driven through the public engine API.
#![allow(dead_code)]

use consensus::consensus::stake::coin_age;
use consensus::consensus::validation::{min_fee, FeeMode};
use consensus::process::CoinbaseProcessor;
use consensus::{
    register_all_profiles, register_all_profiles_with, test_and_submit, BlockAcceptance, BlockEntry,
    ConsensusEngine, CpuNonceSource, EngineConfig, MemoryChainStore, NoScriptChecks, NonceSource, ParamOverrides,
    Secp256k1Signer, Secp256k1Verifier, WorkItem,
};
use consensus_core::{
    Block, ChainParams, ConsensusResult, Hash, Header, OutPoint, ProofType, Target, Transaction, TxIn, TxOut,
};
use std::sync::Arc;

pub const EASY_BITS: u32 = 0x207fffff;
pub const T0: u32 = 1_400_000_000;
pub const DAY: u32 = 86_400;

pub const MINER_SECRET: [u8; 32] = [0x11; 32];
pub const MASTER_SECRET: [u8; 32] = [0x22; 32];

fn easy_target() -> Target {
    Target::from_compact(EASY_BITS).unwrap()
}

fn height_script(height: u64) -> Vec<u8> {
    let mut script = height.to_le_bytes().to_vec();
    script.truncate(4);
    script
}

/// Genesis block paying 100 coins to `pubkey`
pub fn genesis_block(params: &ChainParams, pubkey: &[u8]) -> Block {
    let coinbase = Transaction::new(
        1,
        T0,
        vec![TxIn::new(OutPoint::null(), b"genesis".to_vec())],
        vec![TxOut::pay_to_pubkey(100 * params.coin_value, pubkey)],
        0,
    );
    seal(Header { version: 1, timestamp: T0, bits: EASY_BITS, ..Default::default() }, vec![coinbase], params)
}

/// Block over `txs` with the merkle root filled in, unsigned
pub fn seal(mut header: Header, txs: Vec<Transaction>, params: &ChainParams) -> Block {
    header.merkle_root = Block::new(header, txs.clone(), vec![]).compute_merkle_root(&params.codec());
    Block::new(header, txs, vec![])
}

pub struct TestChain {
    pub engine: ConsensusEngine,
    pub store: Arc<MemoryChainStore>,
    pub miner: Secp256k1Signer,
    pub master: Secp256k1Signer,
    nonces: CpuNonceSource,
    next_job: u64,
}

impl TestChain {
    /// PPCoin with trivial targets, coinbase maturity 2 and a known
    /// checkpoint master key
    pub fn ppcoin() -> Self {
        Self::new("PPCoin", |_| {})
    }

    pub fn bitcoin() -> Self {
        Self::new("Bitcoin", |_| {})
    }

    pub fn new(currency: &str, tweak: impl FnOnce(&mut ParamOverrides)) -> Self {
        let miner = Secp256k1Signer::from_secret_bytes(&MINER_SECRET).unwrap();
        let master = Secp256k1Signer::from_secret_bytes(&MASTER_SECRET).unwrap();
        let shipped = register_all_profiles().resolve(currency).unwrap().clone();
        let genesis = genesis_block(&shipped, &miner.public_key());

        let mut overrides = ParamOverrides {
            genesis: Some(genesis.id(&shipped.codec())),
            coinbase_maturity: Some(2),
            max_target: Some(easy_target()),
            max_target_stake: Some(easy_target()),
            init_target: Some(easy_target()),
            checkpoint_master_pubkey: Some(hex::encode(master.public_key())),
            ..Default::default()
        };
        tweak(&mut overrides);
        let mut config = EngineConfig::for_currency(currency);
        config.params.insert(currency.to_string(), overrides);

        let registry = register_all_profiles_with(&config);
        let store = Arc::new(MemoryChainStore::new());
        let engine = ConsensusEngine::new(
            &registry,
            config,
            store.clone(),
            Arc::new(Secp256k1Verifier::new()),
            Arc::new(NoScriptChecks),
        )
        .unwrap();
        engine.init_genesis(genesis).unwrap();
        Self { engine, store, miner, master, nonces: CpuNonceSource::default(), next_job: 0 }
    }

    pub fn params(&self) -> &ChainParams {
        self.engine.params()
    }

    pub fn tip(&self) -> Arc<BlockEntry> {
        self.engine.tip().unwrap()
    }

    pub fn block_at(&self, height: u64) -> Arc<BlockEntry> {
        self.engine.chain_view().block_at(height).unwrap()
    }

    /// Mines a work block on the tip through the work-item path
    pub fn mine_work(&mut self, timestamp: u32) -> BlockAcceptance {
        self.mine_work_with(Vec::new(), 0, timestamp)
    }

    pub fn mine_work_with(&mut self, txs: Vec<Transaction>, fees: i64, timestamp: u32) -> BlockAcceptance {
        self.next_job += 1;
        let pubkey = self.miner.public_key();
        let work = WorkItem::for_tip(&self.engine, self.next_job, &pubkey, txs, fees, timestamp).unwrap();
        loop {
            let nonces = self.nonces.find_nonces(&work, self.engine.profile().as_ref());
            if let Some(nonce) = nonces.first() {
                return test_and_submit(&self.engine, Some(&self.miner), &work, *nonce).unwrap().unwrap();
            }
        }
    }

    /// Mines one work block per day until the tip is `days` after genesis
    pub fn mine_days(&mut self, days: u32) {
        let start = (self.tip().timestamp() - T0) / DAY + 1;
        for day in start..=days {
            self.mine_work(T0 + day * DAY);
        }
    }

    /// Solved and signed work block on `parent`; the coinbase claims
    /// `extra` above its allowance
    pub fn work_block_on(&self, parent: &Arc<BlockEntry>, timestamp: u32, extra: i64) -> Block {
        let profile = self.engine.profile();
        let view = self.engine.chain_view();
        let bits = profile.next_target(&view, parent, ProofType::Work).unwrap().to_compact();
        let mut coinbase = CoinbaseProcessor::new(profile.clone())
            .create_coinbase_transaction(parent.height + 1, timestamp, &parent.hash, bits, 0, &self.miner.public_key())
            .unwrap();
        if extra != 0 {
            let (version, time, inputs, mut outputs, lock_time) = coinbase.into_parts();
            outputs[0].value += extra;
            coinbase = Transaction::new(version, time, inputs, outputs, lock_time);
        }
        let header = Header {
            version: profile.default_block_version(),
            prev_block: parent.hash,
            timestamp,
            bits,
            ..Default::default()
        };
        let (mut header, transactions, _) = seal(header, vec![coinbase], self.params()).into_parts();
        let target = Target::from_compact(bits).unwrap();
        while !target.is_met_by(&profile.hash_for_block_id(&header)) {
            header.nonce += 1;
        }
        self.sign(Block::new(header, transactions, vec![]), &self.miner)
    }

    pub fn sign(&self, block: Block, signer: &Secp256k1Signer) -> Block {
        let id = block.id(&self.params().codec());
        let sig = signer.sign(&id).unwrap();
        block.with_signature(sig)
    }

    /// Largest coinstake gain the chain allows for `coinstake`
    pub fn allowed_stake_gain(&self, coinstake: &Transaction) -> i64 {
        let profile = self.engine.profile();
        let age = coin_age(&self.engine.chain_view(), coinstake, self.params()).unwrap();
        let fee = min_fee(profile.as_ref(), coinstake, 1, profile.allow_free_txes(), FeeMode::Block);
        profile.proof_of_stake_reward(age) - fee + self.params().min_tx_fee
    }

    fn coinstake(&self, funding: &Arc<BlockEntry>, timestamp: u32, gain: i64) -> Transaction {
        let value = funding.block.transactions()[0].outputs()[0].value;
        Transaction::new(
            1,
            timestamp,
            vec![TxIn::new(OutPoint::new(funding.tx_ids[0], 0), vec![])],
            vec![TxOut::empty(), TxOut::pay_to_pubkey(value + gain, &self.miner.public_key())],
            0,
        )
    }

    /// Signed stake block on the tip staking the coinbase of `funding`;
    /// the coinstake claims `extra` above the allowed gain
    pub fn stake_block(&self, funding: &Arc<BlockEntry>, timestamp: u32, extra: i64) -> Block {
        let probe = self.coinstake(funding, timestamp, 0);
        let gain = self.allowed_stake_gain(&probe) + extra;
        let coinstake = self.coinstake(funding, timestamp, gain);

        let tip = self.tip();
        let coinbase = Transaction::new(
            1,
            timestamp,
            vec![TxIn::new(OutPoint::null(), height_script(tip.height + 1))],
            vec![TxOut::empty()],
            0,
        );
        let bits = self.engine.next_target(ProofType::Stake).unwrap().to_compact();
        let header = Header { version: 1, prev_block: tip.hash, timestamp, bits, ..Default::default() };
        self.sign(seal(header, vec![coinbase, coinstake], self.params()), &self.miner)
    }

    pub fn accept(&self, block: Block) -> ConsensusResult<BlockAcceptance> {
        self.engine.accept_block(block)
    }

    /// Transaction spending output 0 of `funding`'s coinbase
    pub fn spend_coinbase(&self, funding: &Arc<BlockEntry>, time: u32, fee: i64) -> Transaction {
        let value = funding.block.transactions()[0].outputs()[0].value;
        Transaction::new(
            1,
            time,
            vec![TxIn::new(OutPoint::new(funding.tx_ids[0], 0), vec![])],
            vec![TxOut::pay_to_pubkey(value - fee, &self.miner.public_key())],
            0,
        )
    }

    pub fn random_hash(seed: u64) -> Hash {
        Hash::from_le_u64([seed, seed ^ 0x5555, 7, 9])
    }
}
