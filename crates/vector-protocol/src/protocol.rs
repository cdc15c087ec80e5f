// crates/vector-protocol/src/protocol.rs
//
// Deployment wiring.
//
// `Protocol` owns one of every component plus the ledger they share, and
// performs the deployment sequence: create the components, approve the
// distributor and vesting components as treasury minters, register the
// distributor with staking, set the reward rate and mint the genesis supply.
// Bond markets are added afterwards, one per principal.

use serde::{Deserialize, Serialize};
use tracing::info;

use vector_core::{Address, InMemoryLedger, TokenLedger, VectorError};

use crate::bonding::{BondInitialization, BondMarket, DepositReceipt, PrincipalKind, Redemption};
use crate::config::ProtocolConfig;
use crate::distributor::Distributor;
use crate::staking::{Epoch, RebaseOutcome, Staking};
use crate::supply_vesting::SupplyVesting;
use crate::treasury::{ReserveReport, Treasury};
use crate::vault::Vault;
use crate::vesting::FlatVesting;

/// Ledger accounts of the deployed components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolAddresses {
    pub admin: Address,
    pub vec_token: Address,
    pub vault: Address,
    pub treasury: Address,
    pub staking: Address,
    pub distributor: Address,
    pub flat_vesting: Address,
    pub supply_vesting: Address,
}

impl ProtocolAddresses {
    /// Deterministic component addresses under `namespace`.
    pub fn derive(namespace: &str, admin: Address) -> Self {
        let at = |name: &str| Address::from_label(&format!("{}/{}", namespace, name));
        Self {
            admin,
            vec_token: at("vec"),
            vault: at("veth"),
            treasury: at("treasury"),
            staking: at("staking"),
            distributor: at("distributor"),
            flat_vesting: at("vest"),
            supply_vesting: at("investor-vest"),
        }
    }
}

/// Point-in-time view of one bond market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub address: Address,
    pub principal: Address,
    pub kind: PrincipalKind,
    pub price: u128,
    pub debt_ratio: u128,
    pub current_debt: u128,
    pub control_variable: u128,
    pub total_payout_given: u128,
}

/// Point-in-time view of the whole protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolSnapshot {
    pub now: u64,
    pub index: u128,
    pub epoch: Epoch,
    pub vec_supply: u128,
    pub staked_circulating: u128,
    pub reserves: ReserveReport,
    pub markets: Vec<MarketSnapshot>,
}

/// A deployed protocol instance.
#[derive(Debug)]
pub struct Protocol {
    pub ledger: InMemoryLedger,
    pub vault: Vault,
    pub treasury: Treasury,
    pub staking: Staking,
    pub distributor: Distributor,
    pub flat_vesting: FlatVesting,
    pub supply_vesting: SupplyVesting,
    pub markets: Vec<BondMarket>,
    addresses: ProtocolAddresses,
    namespace: String,
}

impl Protocol {
    /// Deploy every component at time `now`.
    ///
    /// # Errors
    /// Any configuration value a component rejects (zero epoch length, zero
    /// reserve backing, out-of-range reward rate).
    pub fn deploy(config: &ProtocolConfig, admin: Address, now: u64) -> Result<Self, VectorError> {
        Self::deploy_in("vector", config, admin, now)
    }

    /// Deploy under a custom address namespace.
    pub fn deploy_in(
        namespace: &str,
        config: &ProtocolConfig,
        admin: Address,
        now: u64,
    ) -> Result<Self, VectorError> {
        let addresses = ProtocolAddresses::derive(namespace, admin);
        let mut ledger = InMemoryLedger::new();

        let vault = Vault::new(addresses.vault, admin);
        let mut treasury = Treasury::new(
            addresses.treasury,
            admin,
            addresses.vec_token,
            vault.share_token(),
            config.reserve_backing,
        )?;
        let mut staking = Staking::new(
            addresses.staking,
            admin,
            addresses.vec_token,
            config.epoch_length,
            now.saturating_add(config.first_epoch_delay),
            config.initial_index,
        )?;
        let mut distributor = Distributor::new(addresses.distributor, admin, addresses.staking);
        let flat_vesting = FlatVesting::new(addresses.flat_vesting, admin);
        let supply_vesting = SupplyVesting::new(addresses.supply_vesting, admin, config.supply_vest_length)?;

        distributor.set_rate(&admin, config.reward_rate)?;
        treasury.add_approved_minter(&admin, addresses.distributor)?;
        treasury.add_approved_minter(&admin, addresses.supply_vesting)?;
        staking.set_distributor(&admin, addresses.distributor)?;

        if config.genesis_supply > 0 {
            ledger.mint(&addresses.vec_token, &admin, config.genesis_supply)?;
        }

        info!(
            namespace,
            admin = %admin.short(),
            genesis_supply = config.genesis_supply,
            reward_rate = config.reward_rate,
            "Protocol deployed"
        );

        Ok(Self {
            ledger,
            vault,
            treasury,
            staking,
            distributor,
            flat_vesting,
            supply_vesting,
            markets: Vec::new(),
            addresses,
            namespace: namespace.to_string(),
        })
    }

    pub fn addresses(&self) -> ProtocolAddresses {
        self.addresses
    }

    pub fn admin(&self) -> Address {
        self.addresses.admin
    }

    pub fn vec_token(&self) -> Address {
        self.addresses.vec_token
    }

    /// Create and initialize a bond market for `principal`, approving it as
    /// a treasury minter. Returns the market's position in `markets`.
    pub fn add_bond_market(
        &mut self,
        principal: Address,
        kind: PrincipalKind,
        init: BondInitialization,
        now: u64,
    ) -> Result<usize, VectorError> {
        let admin = self.addresses.admin;
        let position = self.markets.len();
        let address = Address::from_label(&format!("{}/bond/{}", self.namespace, position));

        let mut market = BondMarket::new(address, admin, principal, kind, self.addresses.vec_token);
        market.initialize_bond(&admin, init, now)?;
        self.treasury.add_approved_minter(&admin, address)?;
        self.markets.push(market);
        Ok(position)
    }

    /// Buy a bond on market `market`.
    pub fn bond(
        &mut self,
        market: usize,
        depositor: &Address,
        amount: u128,
        max_price: u128,
        now: u64,
    ) -> Result<DepositReceipt, VectorError> {
        let market = self
            .markets
            .get_mut(market)
            .ok_or_else(|| VectorError::NotRegistered(format!("bond market #{}", market)))?;
        market.deposit(
            &mut self.ledger,
            &self.treasury,
            &mut self.vault,
            depositor,
            amount,
            max_price,
            now,
        )
    }

    /// Redeem the vested part of a bond.
    pub fn redeem_bond(
        &mut self,
        market: usize,
        recipient: &Address,
        now: u64,
        stake: bool,
    ) -> Result<Redemption, VectorError> {
        let market = self
            .markets
            .get_mut(market)
            .ok_or_else(|| VectorError::NotRegistered(format!("bond market #{}", market)))?;
        market.redeem(&mut self.ledger, &mut self.staking, recipient, now, stake)
    }

    /// Run one rebase step if the epoch has ended.
    pub fn rebase(&mut self, now: u64) -> Result<Option<RebaseOutcome>, VectorError> {
        self.staking
            .rebase(&mut self.ledger, &mut self.distributor, &self.treasury, now)
    }

    /// Rebase until the epoch end is in the future. Returns every step.
    pub fn catch_up(&mut self, now: u64) -> Result<Vec<RebaseOutcome>, VectorError> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.rebase(now)? {
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    pub fn stake(&mut self, holder: &Address, amount: u128) -> Result<u128, VectorError> {
        self.staking.stake(&mut self.ledger, holder, holder, amount)
    }

    pub fn unstake(&mut self, holder: &Address, amount: u128) -> Result<u128, VectorError> {
        self.staking.unstake(&mut self.ledger, holder, holder, amount)
    }

    /// Grant a flat vesting allocation funded from the admin's VEC.
    pub fn grant_flat_vesting(
        &mut self,
        beneficiary: Address,
        total_amount: u128,
        vest_length: u64,
        now: u64,
    ) -> Result<(), VectorError> {
        let admin = self.addresses.admin;
        self.flat_vesting.set_terms(
            &mut self.ledger,
            &mut self.staking,
            &admin,
            beneficiary,
            total_amount,
            vest_length,
            now,
        )
    }

    pub fn claim_flat_vesting(&mut self, beneficiary: &Address, amount: u128, now: u64) -> Result<u128, VectorError> {
        self.flat_vesting.claim(&mut self.staking, beneficiary, amount, now)
    }

    /// Exercise an investor allocation, paying vault shares from the
    /// beneficiary's own balance.
    pub fn exercise_supply_vesting(
        &mut self,
        beneficiary: &Address,
        shares: u128,
        stake: bool,
        now: u64,
    ) -> Result<u128, VectorError> {
        if stake {
            self.supply_vesting.stake(
                &mut self.ledger,
                &self.treasury,
                &mut self.staking,
                beneficiary,
                beneficiary,
                shares,
                now,
            )
        } else {
            self.supply_vesting.claim(
                &mut self.ledger,
                &self.treasury,
                &mut self.staking,
                beneficiary,
                beneficiary,
                shares,
                now,
            )
        }
    }

    /// Current state of every component.
    pub fn snapshot(&self, now: u64) -> Result<ProtocolSnapshot, VectorError> {
        let markets = self
            .markets
            .iter()
            .map(|m| {
                Ok(MarketSnapshot {
                    address: m.address(),
                    principal: m.principal(),
                    kind: m.principal_kind(),
                    price: m.bond_price(&self.ledger, now)?,
                    debt_ratio: m.debt_ratio(&self.ledger, now)?,
                    current_debt: m.current_debt(now),
                    control_variable: m.terms().control_variable,
                    total_payout_given: m.total_payout_given(),
                })
            })
            .collect::<Result<Vec<_>, VectorError>>()?;

        Ok(ProtocolSnapshot {
            now,
            index: self.staking.index(),
            epoch: self.staking.epoch(),
            vec_supply: self.ledger.total_supply(&self.addresses.vec_token),
            staked_circulating: self.staking.circulating_supply()?,
            reserves: self.treasury.reserve_report(&self.ledger)?,
            markets,
        })
    }
}
