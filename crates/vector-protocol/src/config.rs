// crates/vector-protocol/src/config.rs
//
// Deployment parameters for a protocol instance.
// Deserialized from the `[protocol]` table of a simulator config, or built
// from defaults.

use serde::{Deserialize, Serialize};

use vector_core::{INDEX_PRECISION, VEC_UNIT};

use crate::distributor::DEFAULT_REWARD_RATE;
use crate::staking::DEFAULT_EPOCH_LENGTH;
use crate::supply_vesting::DEFAULT_VEST_LENGTH;
use crate::treasury::DEFAULT_RESERVE_BACKING;

/// Parameters fixed at deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Seconds per rebase epoch.
    #[serde(default = "default_epoch_length")]
    pub epoch_length: u64,

    /// Seconds from deployment to the first rebase.
    #[serde(default = "default_first_epoch_delay")]
    pub first_epoch_delay: u64,

    /// Initial rebase index (1e9 = 1:1).
    #[serde(default = "default_initial_index")]
    pub initial_index: u128,

    /// Reward per epoch in millionths of circulating sVEC.
    #[serde(default = "default_reward_rate")]
    pub reward_rate: u128,

    /// Vault shares backing one VEC.
    #[serde(default = "default_reserve_backing")]
    pub reserve_backing: u128,

    /// Investor vesting window in seconds.
    #[serde(default = "default_supply_vest_length")]
    pub supply_vest_length: u64,

    /// VEC minted to the admin at deployment.
    #[serde(default = "default_genesis_supply")]
    pub genesis_supply: u128,
}

fn default_epoch_length() -> u64 {
    DEFAULT_EPOCH_LENGTH
}

fn default_first_epoch_delay() -> u64 {
    86_400
}

fn default_initial_index() -> u128 {
    INDEX_PRECISION
}

fn default_reward_rate() -> u128 {
    DEFAULT_REWARD_RATE
}

fn default_reserve_backing() -> u128 {
    DEFAULT_RESERVE_BACKING
}

fn default_supply_vest_length() -> u64 {
    DEFAULT_VEST_LENGTH
}

fn default_genesis_supply() -> u128 {
    10_000_000 * VEC_UNIT
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            epoch_length: default_epoch_length(),
            first_epoch_delay: default_first_epoch_delay(),
            initial_index: default_initial_index(),
            reward_rate: default_reward_rate(),
            reserve_backing: default_reserve_backing(),
            supply_vest_length: default_supply_vest_length(),
            genesis_supply: default_genesis_supply(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: ProtocolConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ProtocolConfig::default());
        assert_eq!(config.epoch_length, 28_800);
        assert_eq!(config.reward_rate, 5_000);
    }

    #[test]
    fn test_partial_override() {
        let config: ProtocolConfig =
            serde_json::from_str(r#"{"reward_rate": 2500, "epoch_length": 3600}"#).unwrap();
        assert_eq!(config.reward_rate, 2_500);
        assert_eq!(config.epoch_length, 3_600);
        assert_eq!(config.reserve_backing, DEFAULT_RESERVE_BACKING);
    }
}
