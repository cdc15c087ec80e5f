// crates/vector-protocol/src/bonding.rs
//
// Bond market: sells VEC at a discount for a principal asset, vested
// linearly over the bond's vesting term.
//
// Pricing follows the debt-ratio curve:
//   debt_ratio = current_debt * 1e18 / vec_supply
//   price      = max(minimum_price, control_variable * debt_ratio / 1e14)
//   payout     = value * 1e9 / price
// A price of 1e9 means one unit of principal value buys one VEC (par).
//
// Outstanding debt decays linearly over one vesting term since the last
// decay, so prices drift back down between purchases. Every price read
// applies the decay; every deposit persists it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

use vector_core::math::{checked_add, mul_div, RATIO_PRECISION, VEC_UNIT};
use vector_core::{AccessControl, Address, Role, TokenLedger, VectorError};

use crate::staking::Staking;
use crate::treasury::Treasury;
use crate::vault::Vault;

/// Price at par.
pub const PRICE_PRECISION: u128 = VEC_UNIT;

/// Divisor applied to `control_variable * debt_ratio`.
pub const PRICE_CURVE_DIVISOR: u128 = 100_000_000_000_000;

/// Fee denominator: a fee of 10_000 takes 1% of the principal.
pub const FEE_DENOMINATOR: u128 = 1_000_000;

/// Max payout denominator: a max payout of 1_000 is 1% of VEC supply.
pub const MAX_PAYOUT_DENOMINATOR: u128 = 100_000;

/// Largest allowed max payout setting.
pub const MAX_PAYOUT_CAP: u128 = 1_000;

/// Shortest allowed vesting term: 36 hours.
pub const MIN_VESTING_TERM: u64 = 129_600;

/// Smallest payout a deposit may produce: 0.01 VEC.
pub const MIN_BOND_PAYOUT: u128 = 10_000_000;

/// Precision of vesting percentages.
pub const VESTING_PRECISION: u128 = 1_000_000_000;

/// How a market's principal reaches the treasury.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    /// An approved LST, wrapped through the vault. The treasury receives
    /// vault shares.
    NativeAsset,
    /// Vault shares, sent to the treasury directly.
    VaultShare,
    /// A liquidity-pool token with an injected valuation.
    Lp,
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrincipalKind::NativeAsset => write!(f, "native"),
            PrincipalKind::VaultShare => write!(f, "vault-share"),
            PrincipalKind::Lp => write!(f, "lp"),
        }
    }
}

/// A bond term that may be changed after initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BondParameter {
    /// Vesting term in seconds.
    Vesting,
    /// Max payout, thousandths of a percent of supply.
    Payout,
    /// Max debt in VEC base units.
    Debt,
    /// Price floor.
    MinimumPrice,
}

/// Current market terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BondTerms {
    pub control_variable: u128,
    pub vesting_term: u64,
    pub minimum_price: u128,
    pub max_payout: u128,
    pub max_debt: u128,
    pub fee: u128,
    pub fee_to: Option<Address>,
}

/// Parameters of `initialize_bond`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondInitialization {
    pub control_variable: u128,
    pub vesting_term: u64,
    pub minimum_price: u128,
    pub max_payout: u128,
    pub max_debt: u128,
    pub initial_debt: u128,
}

/// One depositor's unvested position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondDeposit {
    /// VEC remaining to be paid.
    pub payout: u128,
    /// Last deposit or redemption.
    pub last_time: u64,
    /// When the remaining payout is fully vested.
    pub vesting_end_time: u64,
    /// Price of the latest deposit.
    pub price_paid: u128,
}

/// Automatic control-variable drift toward a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    pub add: bool,
    pub rate: u128,
    pub target: u128,
    /// Minimum seconds between steps.
    pub buffer: u64,
    pub last_time: u64,
}

/// Result of a successful deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositReceipt {
    pub payout: u128,
    pub price: u128,
    /// VEC value of the net principal.
    pub value: u128,
    pub fee: u128,
    pub vesting_end_time: u64,
}

/// Result of a redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redemption {
    pub paid: u128,
    pub remaining: u128,
    pub staked: bool,
}

/// Debt that has decayed since `last_decay`.
///
/// Linear over one vesting term and capped at the full debt.
pub fn decay_debt(debt: u128, last_decay: u64, vesting_term: u64, now: u64) -> u128 {
    if vesting_term == 0 {
        return debt;
    }
    let elapsed = now.saturating_sub(last_decay);
    if elapsed >= vesting_term {
        return debt;
    }
    mul_div(debt, elapsed as u128, vesting_term as u128)
        .map(|decay| decay.min(debt))
        .unwrap_or(debt)
}

/// One bond market for one principal.
#[derive(Debug, Clone)]
pub struct BondMarket {
    address: Address,
    roles: AccessControl,
    principal: Address,
    principal_kind: PrincipalKind,
    vec_token: Address,
    terms: BondTerms,
    initialized: bool,
    adjustment: Option<Adjustment>,
    total_debt: u128,
    last_decay: u64,
    bonds: HashMap<Address, BondDeposit>,
    total_principal_bonded: u128,
    total_payout_given: u128,
}

impl BondMarket {
    /// Create an uninitialized market.
    ///
    /// The market must be approved as a treasury minter before deposits
    /// succeed, and for `NativeAsset` the vault must accept its deposits.
    pub fn new(
        address: Address,
        admin: Address,
        principal: Address,
        principal_kind: PrincipalKind,
        vec_token: Address,
    ) -> Self {
        Self {
            address,
            roles: AccessControl::with_admin(admin),
            principal,
            principal_kind,
            vec_token,
            terms: BondTerms::default(),
            initialized: false,
            adjustment: None,
            total_debt: 0,
            last_decay: 0,
            bonds: HashMap::new(),
            total_principal_bonded: 0,
            total_payout_given: 0,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn principal(&self) -> Address {
        self.principal
    }

    pub fn principal_kind(&self) -> PrincipalKind {
        self.principal_kind
    }

    pub fn terms(&self) -> BondTerms {
        self.terms
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn adjustment(&self) -> Option<Adjustment> {
        self.adjustment
    }

    pub fn total_debt(&self) -> u128 {
        self.total_debt
    }

    pub fn last_decay(&self) -> u64 {
        self.last_decay
    }

    pub fn total_principal_bonded(&self) -> u128 {
        self.total_principal_bonded
    }

    pub fn total_payout_given(&self) -> u128 {
        self.total_payout_given
    }

    pub fn bond_info(&self, depositor: &Address) -> Option<BondDeposit> {
        self.bonds.get(depositor).copied()
    }

    // -----------------------------------------------------------------------
    // Administration
    // -----------------------------------------------------------------------

    /// Set the market's terms and starting debt. Admin-only, once.
    ///
    /// Fee settings made before initialization are kept.
    pub fn initialize_bond(
        &mut self,
        caller: &Address,
        init: BondInitialization,
        now: u64,
    ) -> Result<(), VectorError> {
        self.roles.require(Role::Admin, caller)?;
        if self.initialized {
            return Err(VectorError::AlreadyInitialized(format!("bond market {}", self.address)));
        }
        if init.control_variable == 0 {
            return Err(VectorError::InvalidParameter(
                "control variable must be non-zero".to_string(),
            ));
        }
        validate_vesting(init.vesting_term as u128)?;
        validate_max_payout(init.max_payout)?;

        self.terms.control_variable = init.control_variable;
        self.terms.vesting_term = init.vesting_term;
        self.terms.minimum_price = init.minimum_price;
        self.terms.max_payout = init.max_payout;
        self.terms.max_debt = init.max_debt;
        self.total_debt = init.initial_debt;
        self.last_decay = now;
        self.initialized = true;

        info!(
            market = %self.address.short(),
            kind = %self.principal_kind,
            control_variable = init.control_variable,
            initial_debt = init.initial_debt,
            "Bond market initialized"
        );
        Ok(())
    }

    /// Change one term. Admin-only.
    ///
    /// # Errors
    /// `InvalidParameter` for a vesting term under 36 hours or a max payout
    /// above 1%.
    pub fn set_bond_terms(
        &mut self,
        caller: &Address,
        parameter: BondParameter,
        value: u128,
    ) -> Result<(), VectorError> {
        self.roles.require(Role::Admin, caller)?;
        match parameter {
            BondParameter::Vesting => {
                self.terms.vesting_term = validate_vesting(value)?;
            }
            BondParameter::Payout => {
                validate_max_payout(value)?;
                self.terms.max_payout = value;
            }
            BondParameter::Debt => self.terms.max_debt = value,
            BondParameter::MinimumPrice => self.terms.minimum_price = value,
        }
        info!(market = %self.address.short(), ?parameter, value, "Bond term updated");
        Ok(())
    }

    /// Set the deposit fee (millionths of principal) and its recipient.
    /// Admin-only.
    pub fn set_fee_and_fee_to(
        &mut self,
        caller: &Address,
        fee_to: Address,
        fee: u128,
    ) -> Result<(), VectorError> {
        self.roles.require(Role::Admin, caller)?;
        if fee > FEE_DENOMINATOR {
            return Err(VectorError::InvalidParameter(format!(
                "fee {} exceeds {}",
                fee, FEE_DENOMINATOR
            )));
        }
        self.terms.fee = fee;
        self.terms.fee_to = Some(fee_to);
        info!(market = %self.address.short(), fee, fee_to = %fee_to.short(), "Bond fee updated");
        Ok(())
    }

    /// Schedule control-variable drift. Admin-only.
    ///
    /// Each step moves the control variable by `rate`, at most once per
    /// `buffer` seconds, until it reaches `target`. A step may not exceed
    /// 2.5% of the current control variable.
    pub fn set_adjustment(
        &mut self,
        caller: &Address,
        add: bool,
        rate: u128,
        target: u128,
        buffer: u64,
        now: u64,
    ) -> Result<(), VectorError> {
        self.roles.require(Role::Admin, caller)?;
        let max_step = mul_div(self.terms.control_variable, 25, 1_000)?;
        if rate > max_step {
            return Err(VectorError::InvalidParameter(format!(
                "adjustment step {} exceeds {}",
                rate, max_step
            )));
        }
        self.adjustment = Some(Adjustment {
            add,
            rate,
            target,
            buffer,
            last_time: now,
        });
        Ok(())
    }

    fn adjust(&mut self, now: u64) {
        let Some(adj) = self.adjustment.as_mut() else {
            return;
        };
        if adj.rate == 0 || now < adj.last_time.saturating_add(adj.buffer) {
            return;
        }
        let cv = &mut self.terms.control_variable;
        if adj.add {
            *cv = cv.saturating_add(adj.rate);
            if *cv >= adj.target {
                adj.rate = 0;
            }
        } else {
            *cv = cv.saturating_sub(adj.rate);
            if *cv <= adj.target {
                adj.rate = 0;
            }
        }
        adj.last_time = now;
        debug!(market = %self.address.short(), control_variable = *cv, "Control variable adjusted");
    }

    // -----------------------------------------------------------------------
    // Pricing
    // -----------------------------------------------------------------------

    /// Debt decayed since the last persisted decay.
    pub fn debt_decay(&self, now: u64) -> u128 {
        decay_debt(self.total_debt, self.last_decay, self.terms.vesting_term, now)
    }

    /// Outstanding debt after decay.
    pub fn current_debt(&self, now: u64) -> u128 {
        self.total_debt - self.debt_decay(now)
    }

    /// Current debt over VEC supply, 18 decimals. Zero with no supply.
    pub fn debt_ratio(&self, ledger: &dyn TokenLedger, now: u64) -> Result<u128, VectorError> {
        self.ratio_for(ledger, self.current_debt(now))
    }

    fn ratio_for(&self, ledger: &dyn TokenLedger, debt: u128) -> Result<u128, VectorError> {
        let supply = ledger.total_supply(&self.vec_token);
        if supply == 0 {
            return Ok(0);
        }
        mul_div(debt, RATIO_PRECISION, supply)
    }

    fn price_for(&self, ledger: &dyn TokenLedger, debt: u128) -> Result<u128, VectorError> {
        let ratio = self.ratio_for(ledger, debt)?;
        let curve = mul_div(self.terms.control_variable, ratio, PRICE_CURVE_DIVISOR)?;
        Ok(curve.max(self.terms.minimum_price))
    }

    /// Current bond price. 1e9 is par.
    pub fn bond_price(&self, ledger: &dyn TokenLedger, now: u64) -> Result<u128, VectorError> {
        self.price_for(ledger, self.current_debt(now))
    }

    /// VEC paid out for principal worth `value`.
    ///
    /// # Errors
    /// `DivisionByZero` while the price is zero.
    pub fn payout_for(&self, ledger: &dyn TokenLedger, value: u128, now: u64) -> Result<u128, VectorError> {
        let price = self.bond_price(ledger, now)?;
        mul_div(value, PRICE_PRECISION, price)
    }

    /// Largest payout one deposit may produce.
    pub fn max_payout(&self, ledger: &dyn TokenLedger) -> Result<u128, VectorError> {
        mul_div(
            ledger.total_supply(&self.vec_token),
            self.terms.max_payout,
            MAX_PAYOUT_DENOMINATOR,
        )
    }

    /// VEC value of `amount` of principal, after the fee.
    fn value_of_principal(
        &self,
        treasury: &Treasury,
        vault: &Vault,
        amount: u128,
    ) -> Result<u128, VectorError> {
        match self.principal_kind {
            PrincipalKind::NativeAsset => {
                let shares = vault.preview_deposit(&self.principal, amount)?;
                treasury.value_of_token(&vault.share_token(), shares)
            }
            PrincipalKind::VaultShare | PrincipalKind::Lp => {
                treasury.value_of_token(&self.principal, amount)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Deposit / redeem
    // -----------------------------------------------------------------------

    /// Buy a bond with `amount` of principal.
    ///
    /// The fee is taken off the principal first. The rest reaches the
    /// treasury (through the vault for `NativeAsset`), the payout is minted
    /// to the market and vests to `depositor` over the vesting term. A
    /// second deposit adds to the existing payout and restarts its vest.
    ///
    /// # Errors
    /// `NotInitialized`, `ZeroAmount`, `MaxDebtExceeded`, `PriceTooHigh`
    /// when the price is above `max_price`, `BondTooSmall`,
    /// `MaxPayoutExceeded`, and `InsufficientBalance`.
    #[allow(clippy::too_many_arguments)]
    pub fn deposit(
        &mut self,
        ledger: &mut dyn TokenLedger,
        treasury: &Treasury,
        vault: &mut Vault,
        depositor: &Address,
        amount: u128,
        max_price: u128,
        now: u64,
    ) -> Result<DepositReceipt, VectorError> {
        if !self.initialized {
            return Err(VectorError::NotInitialized(format!("bond market {}", self.address)));
        }
        if amount == 0 {
            return Err(VectorError::ZeroAmount);
        }

        let debt = self.current_debt(now);
        if debt > self.terms.max_debt {
            return Err(VectorError::MaxDebtExceeded {
                debt,
                max_debt: self.terms.max_debt,
            });
        }

        let price = self.price_for(ledger, debt)?;
        if price > max_price {
            return Err(VectorError::PriceTooHigh { price, max_price });
        }

        let fee = match self.terms.fee_to {
            Some(_) => mul_div(amount, self.terms.fee, FEE_DENOMINATOR)?,
            None => 0,
        };
        let net = amount - fee;
        let value = self.value_of_principal(treasury, vault, net)?;
        let payout = mul_div(value, PRICE_PRECISION, price)?;

        if payout < MIN_BOND_PAYOUT {
            return Err(VectorError::BondTooSmall {
                payout,
                minimum: MIN_BOND_PAYOUT,
            });
        }
        let max_payout = self.max_payout(ledger)?;
        if payout > max_payout {
            return Err(VectorError::MaxPayoutExceeded { payout, max_payout });
        }

        let available = ledger.balance_of(&self.principal, depositor);
        if available < amount {
            return Err(VectorError::InsufficientBalance {
                requested: amount,
                available,
            });
        }
        if !treasury.is_approved_minter(&self.address) {
            return Err(VectorError::NotApprovedMinter(self.address));
        }
        if self.principal_kind == PrincipalKind::NativeAsset && !vault.accepts_deposit_from(&self.address) {
            return Err(VectorError::DepositsClosed);
        }

        let previous = self.bonds.get(depositor).map(|b| b.payout).unwrap_or(0);
        let pending = checked_add(previous, payout)?;
        let total_debt = checked_add(debt, payout)?;
        let total_principal = checked_add(self.total_principal_bonded, amount)?;
        let total_payout = checked_add(self.total_payout_given, payout)?;
        let vesting_end_time = now.saturating_add(self.terms.vesting_term);

        if let (true, Some(fee_to)) = (fee > 0, self.terms.fee_to) {
            ledger.transfer(&self.principal, depositor, &fee_to, fee)?;
        }
        match self.principal_kind {
            PrincipalKind::NativeAsset => {
                ledger.transfer(&self.principal, depositor, &self.address, net)?;
                vault.deposit(ledger, &self.address, &self.principal, &treasury.address(), net)?;
            }
            PrincipalKind::VaultShare | PrincipalKind::Lp => {
                ledger.transfer(&self.principal, depositor, &treasury.address(), net)?;
            }
        }
        treasury.mint(ledger, &self.address, &self.address, payout)?;

        self.total_debt = total_debt;
        self.last_decay = now;
        self.total_principal_bonded = total_principal;
        self.total_payout_given = total_payout;
        self.bonds.insert(
            *depositor,
            BondDeposit {
                payout: pending,
                last_time: now,
                vesting_end_time,
                price_paid: price,
            },
        );
        self.adjust(now);

        info!(
            market = %self.address.short(),
            depositor = %depositor.short(),
            amount,
            value,
            price,
            payout,
            "Bond deposit"
        );
        Ok(DepositReceipt {
            payout,
            price,
            value,
            fee,
            vesting_end_time,
        })
    }

    /// Fraction of `depositor`'s remaining payout vested, 1e9 = all.
    pub fn percent_vested_for(&self, depositor: &Address, now: u64) -> u128 {
        let Some(bond) = self.bonds.get(depositor) else {
            return 0;
        };
        let vesting = bond.vesting_end_time.saturating_sub(bond.last_time);
        if vesting == 0 {
            return VESTING_PRECISION;
        }
        let elapsed = now.saturating_sub(bond.last_time);
        mul_div(elapsed as u128, VESTING_PRECISION, vesting as u128)
            .map(|p| p.min(VESTING_PRECISION))
            .unwrap_or(VESTING_PRECISION)
    }

    /// VEC `depositor` could redeem now.
    pub fn pending_payout_for(&self, depositor: &Address, now: u64) -> Result<u128, VectorError> {
        let Some(bond) = self.bonds.get(depositor) else {
            return Ok(0);
        };
        let percent = self.percent_vested_for(depositor, now);
        if percent >= VESTING_PRECISION {
            return Ok(bond.payout);
        }
        mul_div(bond.payout, percent, VESTING_PRECISION)
    }

    /// Pay out the vested part of `recipient`'s bond.
    ///
    /// With `stake` the payout is staked into sVEC for the recipient,
    /// otherwise it is sent as VEC. A fully vested bond is closed.
    ///
    /// Redeeming before anything has vested pays nothing and leaves the
    /// bond as it was. With `stake`, that includes a vested amount below one
    /// index-adjusted sVEC unit.
    ///
    /// # Errors
    /// `NotRegistered` if `recipient` holds no bond.
    pub fn redeem(
        &mut self,
        ledger: &mut dyn TokenLedger,
        staking: &mut Staking,
        recipient: &Address,
        now: u64,
        stake: bool,
    ) -> Result<Redemption, VectorError> {
        let bond = self
            .bonds
            .get(recipient)
            .copied()
            .ok_or_else(|| VectorError::NotRegistered(format!("bond for {}", recipient)))?;

        let fully_vested = self.percent_vested_for(recipient, now) >= VESTING_PRECISION;
        let paid = self.pending_payout_for(recipient, now)?;
        // A staked redemption smaller than one index-adjusted unit would be
        // rejected by staking; leave it vesting until it is worth a unit.
        let too_small = stake && staking.to_index_adjusted(paid)? == 0;
        if paid == 0 || too_small {
            warn!(recipient = %recipient.short(), paid, "Nothing vested to redeem");
            return Ok(Redemption {
                paid: 0,
                remaining: bond.payout,
                staked: stake,
            });
        }

        if stake {
            staking.stake(ledger, &self.address, recipient, paid)?;
        } else {
            ledger.transfer(&self.vec_token, &self.address, recipient, paid)?;
        }

        let remaining = bond.payout - paid;
        if fully_vested {
            self.bonds.remove(recipient);
        } else {
            self.bonds.insert(
                *recipient,
                BondDeposit {
                    payout: remaining,
                    last_time: now,
                    vesting_end_time: bond.vesting_end_time,
                    price_paid: bond.price_paid,
                },
            );
        }

        info!(
            market = %self.address.short(),
            recipient = %recipient.short(),
            paid,
            remaining,
            stake,
            "Bond redeemed"
        );
        Ok(Redemption {
            paid,
            remaining,
            staked: stake,
        })
    }
}

fn validate_vesting(value: u128) -> Result<u64, VectorError> {
    let term = u64::try_from(value).map_err(|_| VectorError::Overflow)?;
    if term < MIN_VESTING_TERM {
        return Err(VectorError::InvalidParameter(format!(
            "vesting term {}s is shorter than {}s",
            term, MIN_VESTING_TERM
        )));
    }
    Ok(term)
}

fn validate_max_payout(value: u128) -> Result<(), VectorError> {
    if value > MAX_PAYOUT_CAP {
        return Err(VectorError::InvalidParameter(format!(
            "max payout {} exceeds {}",
            value, MAX_PAYOUT_CAP
        )));
    }
    Ok(())
}
