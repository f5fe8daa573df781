/// Seconds in one day
pub const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Spacing the continuous retarget aims for between stake blocks
pub const STAKE_TARGET_SPACING: u32 = 10 * 60;

/// Span over which the continuous retarget averages (one week)
pub const STAKE_TARGET_TIMESPAN: u32 = 7 * SECONDS_PER_DAY;

/// Stake modifiers are recomputed once per this many seconds
pub const MODIFIER_INTERVAL: u32 = 6 * 60 * 60;

/// Ratio between the longest and the shortest selection section
pub const MODIFIER_INTERVAL_RATIO: u32 = 3;

/// Number of selection rounds, one per modifier bit
pub const MODIFIER_SELECTION_ROUNDS: usize = 64;

/// Minimum age of a stake output before it earns reward or can stake
pub const STAKE_MIN_AGE: u32 = 30 * SECONDS_PER_DAY;

/// Holding time beyond this age no longer increases kernel weight
pub const STAKE_MAX_AGE: u32 = 90 * SECONDS_PER_DAY;

/// Tolerance for timestamps ahead of the reference time
pub const MAX_FUTURE_SECONDS: u32 = 2 * 60 * 60;

/// Maximum serialized block size in bytes
pub const MAX_BLOCK_SIZE: usize = 1_000_000;

/// Transactions below this size may be relayed without fee when the
/// currency allows free transactions
pub const FREE_TX_SIZE_LIMIT: usize = 10_000;

/// Index of the coinbase transaction in every block
pub const COINBASE_TRANSACTION_INDEX: usize = 0;

/// Index of the coinstake transaction in a proof-of-stake block
pub const COINSTAKE_TRANSACTION_INDEX: usize = 1;
