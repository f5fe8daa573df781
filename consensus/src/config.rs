use consensus_core::constants::MAX_FUTURE_SECONDS;
use consensus_core::{ChainParams, Hash, Target};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Parameter {field} of {currency} must not be zero")]
    ZeroParam { currency: String, field: &'static str },
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Currency the engine validates, matched case-insensitively
    pub currency: String,
    pub check_merkle_root: bool,
    /// Tolerated clock drift of block timestamps
    pub max_future_seconds: u32,
    /// Parameter overrides keyed by currency name
    pub params: HashMap<String, ParamOverrides>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            currency: "Bitcoin".to_string(),
            check_merkle_root: true,
            max_future_seconds: MAX_FUTURE_SECONDS,
            params: HashMap::new(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from file if it exists, otherwise use defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            Self::from_toml_str(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects overrides the retarget arithmetic divides by when they are zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (currency, overrides) in &self.params {
            if let Some(field) = overrides.zero_divisor() {
                return Err(ConfigError::ZeroParam { currency: currency.clone(), field });
            }
        }
        Ok(())
    }

    pub fn for_currency(currency: &str) -> Self {
        Self { currency: currency.to_string(), ..Self::default() }
    }

    /// Overrides for `currency`, ignoring case
    pub fn overrides_for(&self, currency: &str) -> Option<&ParamOverrides> {
        self.params.iter().find(|(name, _)| name.eq_ignore_ascii_case(currency)).map(|(_, o)| o)
    }
}

/// Optional replacements for chain parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamOverrides {
    pub genesis: Option<Hash>,
    pub block_span: Option<u32>,
    pub coin_value: Option<i64>,
    pub max_money: Option<i64>,
    pub min_tx_fee: Option<i64>,
    pub init_block_value: Option<i64>,
    pub half_life: Option<u64>,
    pub coinbase_maturity: Option<u32>,
    pub annual_percentage_rate: Option<i64>,
    pub max_target: Option<Target>,
    pub max_target_stake: Option<Target>,
    pub init_target: Option<Target>,
    pub target_spacing_work_max: Option<u32>,
    pub pow_of_difficulty_to_half_subsidy: Option<f64>,
    pub median_time_span: Option<usize>,
    pub checkpoint_master_pubkey: Option<String>,
}

macro_rules! apply_fields {
    ($src:expr, $dst:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(v) = $src.$field.clone() {
                $dst.$field = v;
            }
        )+
    };
}

impl ParamOverrides {
    /// First divisor override set to zero
    pub fn zero_divisor(&self) -> Option<&'static str> {
        [
            ("block_span", self.block_span.map(u64::from)),
            ("target_spacing_work_max", self.target_spacing_work_max.map(u64::from)),
            ("median_time_span", self.median_time_span.map(|v| v as u64)),
        ]
        .into_iter()
        .find(|(_, value)| *value == Some(0))
        .map(|(field, _)| field)
    }

    pub fn apply(&self, params: &mut ChainParams) {
        apply_fields!(
            self,
            params,
            genesis,
            block_span,
            coin_value,
            max_money,
            min_tx_fee,
            init_block_value,
            half_life,
            coinbase_maturity,
            annual_percentage_rate,
            max_target,
            max_target_stake,
            init_target,
            target_spacing_work_max,
            pow_of_difficulty_to_half_subsidy,
            median_time_span,
            checkpoint_master_pubkey,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
currency = "PPCoin"
check_merkle_root = false

[params.ppcoin]
coinbase_maturity = 5
max_target = 545259519
checkpoint_master_pubkey = "02aa"

[params.DevCoin]
genesis = "000000000000000000000000000000000000000000000000000000000000002a"
"#;

    #[test]
    fn parses_overrides() {
        let config = EngineConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.currency, "PPCoin");
        assert!(!config.check_merkle_root);
        assert_eq!(config.max_future_seconds, MAX_FUTURE_SECONDS);

        let pp = config.overrides_for("PPCOIN").unwrap();
        assert_eq!(pp.coinbase_maturity, Some(5));
        assert_eq!(pp.max_target.map(|t| t.to_compact()), Some(0x207fffff));

        let dev = config.overrides_for("devcoin").unwrap();
        assert_eq!(dev.genesis.unwrap().low_u64(), 0x2a);
    }

    #[test]
    fn apply_replaces_only_given_fields() {
        let config = EngineConfig::from_toml_str(SAMPLE).unwrap();
        let mut params = crate::test_utils::easy_params();
        let before = params.clone();
        config.overrides_for("ppcoin").unwrap().apply(&mut params);
        assert_eq!(params.coinbase_maturity, 5);
        assert_eq!(params.checkpoint_master_pubkey, "02aa");
        assert_eq!(params.coin_value, before.coin_value);
        assert_eq!(params.genesis, before.genesis);
    }

    #[test]
    fn load_from_file_or_default() {
        let dir = tempfile::tempdir().unwrap();
        let missing = EngineConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(missing.currency, "Bitcoin");

        let path = dir.path().join("engine.toml");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded.currency, "PPCoin");

        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "currency = [").unwrap();
        assert!(matches!(EngineConfig::load(&bad), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn zero_spacing_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zero.toml");
        fs::write(&path, "currency = \"PPCoin\"\n\n[params.PPCoin]\ntarget_spacing_work_max = 0\n").unwrap();
        match EngineConfig::load(&path) {
            Err(ConfigError::ZeroParam { currency, field }) => {
                assert_eq!(currency, "PPCoin");
                assert_eq!(field, "target_spacing_work_max");
            }
            other => panic!("unexpected result {:?}", other),
        }

        let zero_span = EngineConfig::from_toml_str("[params.bitcoin]\nblock_span = 0\n");
        assert!(matches!(zero_span, Err(ConfigError::ZeroParam { field: "block_span", .. })));
        let nonzero = EngineConfig::from_toml_str("[params.bitcoin]\nblock_span = 30\ntarget_spacing_work_max = 60\n");
        assert_eq!(nonzero.unwrap().overrides_for("Bitcoin").unwrap().zero_divisor(), None);
    }
}
