// crates/vector-sim/src/config.rs
//
// Simulator configuration.
// Loaded from a TOML file or populated with defaults. Token amounts are
// written as decimal strings ("10.5") and converted to base units on use,
// since 18-decimal amounts overflow TOML integers.

use serde::{Deserialize, Serialize};
use std::fs;

use vector_core::VEC_DECIMALS;
use vector_protocol::{BondInitialization, PrincipalKind, ProtocolConfig};

use crate::error::SimError;

/// Decimals of LSTs, vault shares and LP tokens.
pub const PRINCIPAL_DECIMALS: u32 = 18;

/// Top-level simulator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Unix timestamp that simulated time 0 maps to, for display.
    #[serde(default = "default_start_timestamp")]
    pub start_timestamp: i64,

    #[serde(default)]
    pub protocol: ProtocolConfig,

    #[serde(default)]
    pub bond: BondScenarioConfig,

    #[serde(default)]
    pub rebase: RebaseScenarioConfig,
}

/// Repeated-purchase bond scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondScenarioConfig {
    #[serde(default = "default_principal_kind")]
    pub principal_kind: PrincipalKind,

    /// Vault share ratio of the principal LST.
    #[serde(default = "default_share_ratio")]
    pub share_ratio: String,

    /// VEC per LP token, used when `principal_kind = "lp"`.
    #[serde(default = "default_lp_price")]
    pub lp_price: String,

    #[serde(default = "default_control_variable")]
    pub control_variable: u128,

    #[serde(default = "default_vesting_term")]
    pub vesting_term: u64,

    /// Price floor, 1.0 = par.
    #[serde(default = "default_minimum_price")]
    pub minimum_price: String,

    /// Thousandths of a percent of supply.
    #[serde(default = "default_max_payout")]
    pub max_payout: u128,

    /// VEC.
    #[serde(default = "default_max_debt")]
    pub max_debt: String,

    /// VEC.
    #[serde(default = "default_initial_debt")]
    pub initial_debt: String,

    /// Millionths of principal.
    #[serde(default)]
    pub fee: u128,

    /// Principal per purchase.
    #[serde(default = "default_deposit")]
    pub deposit: String,

    /// Slippage limit, 1.0 = par.
    #[serde(default = "default_max_price")]
    pub max_price: String,

    /// After each purchase, wait until the price falls to this level.
    #[serde(default = "default_target_price")]
    pub target_price: String,

    #[serde(default = "default_rounds")]
    pub rounds: u32,

    /// Clock step while waiting for the price to recover.
    #[serde(default = "default_step_seconds")]
    pub step_seconds: u64,

    /// Longest wait per round before giving up on the target.
    #[serde(default = "default_horizon_seconds")]
    pub horizon_seconds: u64,

    /// Redeem vested payouts into sVEC after each wait.
    #[serde(default = "default_true")]
    pub stake_payouts: bool,
}

/// One staker in the rebase scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakerConfig {
    pub label: String,
    /// VEC staked at the start.
    pub amount: String,
}

/// Epoch-by-epoch rebase scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebaseScenarioConfig {
    #[serde(default = "default_stakers")]
    pub stakers: Vec<StakerConfig>,

    #[serde(default = "default_epochs")]
    pub epochs: u32,
}

fn default_start_timestamp() -> i64 {
    1_704_067_200
}

fn default_principal_kind() -> PrincipalKind {
    PrincipalKind::NativeAsset
}

fn default_share_ratio() -> String {
    "1.0".to_string()
}

fn default_lp_price() -> String {
    "250".to_string()
}

fn default_control_variable() -> u128 {
    25_000_000
}

fn default_vesting_term() -> u64 {
    604_800
}

fn default_minimum_price() -> String {
    "1.0".to_string()
}

fn default_max_payout() -> u128 {
    25
}

fn default_max_debt() -> String {
    "100000".to_string()
}

fn default_initial_debt() -> String {
    "60000".to_string()
}

fn default_deposit() -> String {
    "10".to_string()
}

fn default_max_price() -> String {
    "2.0".to_string()
}

fn default_target_price() -> String {
    "1.05".to_string()
}

fn default_rounds() -> u32 {
    5
}

fn default_step_seconds() -> u64 {
    3_600
}

fn default_horizon_seconds() -> u64 {
    30 * 86_400
}

fn default_true() -> bool {
    true
}

fn default_stakers() -> Vec<StakerConfig> {
    vec![
        StakerConfig {
            label: "alice".to_string(),
            amount: "1000".to_string(),
        },
        StakerConfig {
            label: "bob".to_string(),
            amount: "250".to_string(),
        },
    ]
}

fn default_epochs() -> u32 {
    9
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_timestamp: default_start_timestamp(),
            protocol: ProtocolConfig::default(),
            bond: BondScenarioConfig::default(),
            rebase: RebaseScenarioConfig::default(),
        }
    }
}

impl Default for BondScenarioConfig {
    fn default() -> Self {
        Self {
            principal_kind: default_principal_kind(),
            share_ratio: default_share_ratio(),
            lp_price: default_lp_price(),
            control_variable: default_control_variable(),
            vesting_term: default_vesting_term(),
            minimum_price: default_minimum_price(),
            max_payout: default_max_payout(),
            max_debt: default_max_debt(),
            initial_debt: default_initial_debt(),
            fee: 0,
            deposit: default_deposit(),
            max_price: default_max_price(),
            target_price: default_target_price(),
            rounds: default_rounds(),
            step_seconds: default_step_seconds(),
            horizon_seconds: default_horizon_seconds(),
            stake_payouts: default_true(),
        }
    }
}

impl Default for RebaseScenarioConfig {
    fn default() -> Self {
        Self {
            stakers: default_stakers(),
            epochs: default_epochs(),
        }
    }
}

impl BondScenarioConfig {
    /// Market initialization in base units.
    pub fn initialization(&self) -> Result<BondInitialization, SimError> {
        Ok(BondInitialization {
            control_variable: self.control_variable,
            vesting_term: self.vesting_term,
            minimum_price: parse_units(&self.minimum_price, VEC_DECIMALS)?,
            max_payout: self.max_payout,
            max_debt: parse_units(&self.max_debt, VEC_DECIMALS)?,
            initial_debt: parse_units(&self.initial_debt, VEC_DECIMALS)?,
        })
    }
}

impl SimConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// A leading `~/` is expanded to the home directory.
    pub fn load(path: &str) -> Result<Self, SimError> {
        let contents = fs::read_to_string(expand_tilde(path))?;
        let config: SimConfig = toml::from_str(&contents)?;
        Ok(config)
    }
}

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}

/// Parse a decimal string into base units with `decimals` places.
///
/// Extra fractional digits beyond `decimals` are rejected rather than
/// silently truncated.
pub fn parse_units(value: &str, decimals: u32) -> Result<u128, SimError> {
    let invalid = |reason: &str| SimError::Amount {
        value: value.to_string(),
        reason: reason.to_string(),
    };
    let trimmed = value.trim().replace('_', "");
    let (whole, frac) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed.as_str(), ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid("empty"));
    }
    if frac.len() > decimals as usize {
        return Err(invalid("too many decimal places"));
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid("not a decimal number"));
    }

    let scale = 10u128.checked_pow(decimals).ok_or_else(|| invalid("too many decimals"))?;
    let whole_units = if whole.is_empty() {
        0
    } else {
        whole.parse::<u128>().map_err(|_| invalid("out of range"))?
    };
    let frac_units = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = decimals as usize);
        padded.parse::<u128>().map_err(|_| invalid("out of range"))?
    };

    whole_units
        .checked_mul(scale)
        .and_then(|w| w.checked_add(frac_units))
        .ok_or_else(|| invalid("out of range"))
}
