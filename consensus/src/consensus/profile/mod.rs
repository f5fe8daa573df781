//! Currency profiles and the name-keyed profile registry.
//!
//! A profile bundles one currency's chain parameters with the handful of
//! hooks in which currencies actually differ. Everything else is shared.

mod bitcoin;
mod devcoin;
mod maxcoin;
mod ppcoin;

pub use bitcoin::BitcoinProfile;
pub use devcoin::DevCoinProfile;
pub use maxcoin::MaxCoinProfile;
pub use ppcoin::PPCoinProfile;

use crate::config::EngineConfig;
use crate::consensus::difficulty::RetargetRule;
use crate::consensus::stake::{self, BlockVariant};
use crate::consensus::storage::{BlockEntry, ChainView};
use consensus_core::errors::ConsensusResult;
use consensus_core::{ChainParams, ConsensusError, Hash, Header, ProofType, Target, Transaction};
use log::debug;
use std::sync::Arc;

/// Consensus behaviour of one currency
pub trait ConsensusProfile: Send + Sync {
    fn params(&self) -> &ChainParams;

    fn retarget_rule(&self) -> RetargetRule;

    /// Target the block following `last` must carry
    fn next_target(&self, chain: &ChainView, last: &Arc<BlockEntry>, candidate: ProofType) -> ConsensusResult<Target> {
        self.retarget_rule().next_target(self.params(), chain, last, candidate)
    }

    /// Proof-of-work subsidy of the block at `height`
    fn subsidy(&self, height: u64, _prev_hash: &Hash, _difficulty: f64) -> i64 {
        let params = self.params();
        if params.half_life == 0 {
            return params.init_block_value;
        }
        let halvings = height / params.half_life;
        if halvings >= 63 {
            0
        } else {
            params.init_block_value >> halvings
        }
    }

    fn min_relay_fee(&self) -> i64 {
        self.params().coin_value / 10_000
    }

    /// Adjusts a minimum fee for the outputs of `tx`; by default any output
    /// below one cent raises the fee to at least `base_fee`
    fn fee_for_tx_outputs(&self, min_fee: i64, base_fee: i64, tx: &Transaction) -> i64 {
        let cent = self.params().cent();
        if min_fee < base_fee && tx.outputs().iter().any(|o| o.value < cent) {
            base_fee
        } else {
            min_fee
        }
    }

    /// Proof-of-stake hooks; `None` for pure proof-of-work currencies
    fn block_variant(&self) -> Option<&dyn BlockVariant> {
        None
    }

    fn is_proof_of_stake(&self) -> bool {
        self.block_variant().is_some()
    }

    fn hash_for_message(&self, data: &[u8]) -> Hash {
        self.params().message_hash.digest(data)
    }

    fn hash_for_block_id(&self, header: &Header) -> Hash {
        header.hash(&self.params().codec())
    }

    fn allow_free_txes(&self) -> bool {
        true
    }

    /// Value a coinbase may claim given the subsidy and collected fees
    fn coinbase_allowance(&self, subsidy: i64, fees: i64) -> i64 {
        subsidy.saturating_add(fees)
    }

    fn proof_of_stake_reward(&self, coin_age: u64) -> i64 {
        stake::proof_of_stake_reward(self.params(), coin_age)
    }

    fn default_block_version(&self) -> i32 {
        1
    }

    /// Whether this node may assemble blocks for the currency
    fn mining_allowed(&self) -> bool {
        true
    }
}

/// Factory producing a profile for (possibly overridden) parameters
pub type ProfileFactory = fn(ChainParams) -> Arc<dyn ConsensusProfile>;

struct Registration {
    params: ChainParams,
    factory: ProfileFactory,
}

/// Append-only registry of currency profiles, built once at startup
#[derive(Default)]
pub struct ProfileRegistry {
    entries: Vec<Registration>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a currency; returns `false` when the name is already taken
    pub fn register(&mut self, params: ChainParams, factory: ProfileFactory) -> bool {
        if self.entries.iter().any(|e| e.params.name.eq_ignore_ascii_case(&params.name)) {
            return false;
        }
        debug!("registered currency {} ({})", params.name, params.symbol);
        self.entries.push(Registration { params, factory });
        true
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.params.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find(&self, name: &str) -> ConsensusResult<&Registration> {
        self.entries
            .iter()
            .find(|e| e.params.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ConsensusError::UnknownCurrency(name.to_string()))
    }

    /// Chain parameters of `name`
    pub fn resolve(&self, name: &str) -> ConsensusResult<&ChainParams> {
        self.find(name).map(|e| &e.params)
    }

    /// Profile of `name`, ready for an engine
    pub fn profile(&self, name: &str) -> ConsensusResult<Arc<dyn ConsensusProfile>> {
        let entry = self.find(name)?;
        Ok((entry.factory)(entry.params.clone()))
    }
}

fn bitcoin_factory(params: ChainParams) -> Arc<dyn ConsensusProfile> {
    Arc::new(BitcoinProfile::with_params(params))
}

fn devcoin_factory(params: ChainParams) -> Arc<dyn ConsensusProfile> {
    Arc::new(DevCoinProfile::with_params(params))
}

fn maxcoin_factory(params: ChainParams) -> Arc<dyn ConsensusProfile> {
    Arc::new(MaxCoinProfile::with_params(params))
}

fn ppcoin_factory(params: ChainParams) -> Arc<dyn ConsensusProfile> {
    Arc::new(PPCoinProfile::with_params(params))
}

/// Registry of every shipped currency with default parameters
pub fn register_all_profiles() -> ProfileRegistry {
    register_all_profiles_with(&EngineConfig::default())
}

/// Registry of every shipped currency with the configured overrides applied
pub fn register_all_profiles_with(config: &EngineConfig) -> ProfileRegistry {
    let shipped: [(ChainParams, ProfileFactory); 4] = [
        (bitcoin::params(), bitcoin_factory),
        (devcoin::params(), devcoin_factory),
        (maxcoin::params(), maxcoin_factory),
        (ppcoin::params(), ppcoin_factory),
    ];
    let mut registry = ProfileRegistry::new();
    for (mut params, factory) in shipped {
        if let Some(overrides) = config.overrides_for(&params.name) {
            overrides.apply(&mut params);
        }
        registry.register(params, factory);
    }
    registry
}
