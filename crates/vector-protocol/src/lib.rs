// crates/vector-protocol/src/lib.rs
//
// vector-protocol: the Vector Protocol components.
//
// - vault: vETH, wrapping approved LSTs into one share token
// - treasury: reserves, valuation and minting of VEC
// - staking: sVEC, the rebasing staking receipt
// - distributor: per-epoch staking rewards
// - bonding: discounted VEC sold against principal, vested linearly
// - vesting / supply_vesting: team grants and investor allocations
//
// Components hold no references to each other. Operations that cross
// components take their collaborators and the shared `TokenLedger` as
// arguments; `Protocol` owns one of each and wires them together.

pub mod bonding;
pub mod config;
pub mod distributor;
pub mod protocol;
pub mod staking;
pub mod supply_vesting;
pub mod treasury;
pub mod vault;
pub mod vesting;

pub use bonding::{
    decay_debt, Adjustment, BondDeposit, BondInitialization, BondMarket, BondParameter,
    BondTerms, DepositReceipt, PrincipalKind, Redemption, PRICE_PRECISION,
};
pub use config::ProtocolConfig;
pub use distributor::Distributor;
pub use protocol::{MarketSnapshot, Protocol, ProtocolAddresses, ProtocolSnapshot};
pub use staking::{Epoch, RebaseOutcome, Staking};
pub use supply_vesting::{SupplyVesting, SupplyVestingTerms};
pub use treasury::{FixedPriceValuation, ParValuation, ReserveReport, Treasury};
pub use vault::{RestakedAssetConfig, Vault, VaultAssetState, VaultAssetView};
pub use vesting::{FlatVesting, FlatVestingTerms};
