//! Proof-of-stake rules: coin age, stake reward, stake modifier selection
//! and kernel hash verification.

pub mod coin_age;
pub mod kernel;
pub mod modifier;
pub mod reward;
pub mod variant;

pub use coin_age::coin_age;
pub use kernel::check_proof_of_stake;
pub use modifier::{compute_stake_modifier, SELECTION_INTERVAL};
pub use reward::{check_coinstake_reward, proof_of_stake_reward};
pub use variant::{BlockVariant, PPCoinBlock, StandardPosBlock};
