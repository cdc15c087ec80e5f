// crates/vector-protocol/src/supply_vesting.rs
//
// Percent-of-supply vesting for investors.
//
// Each beneficiary is allocated a fraction of VEC supply (millionths). The
// allocation vests linearly over one global window that opens with the first
// allocation. Vested VEC is exercised by paying its value in vault shares to
// the treasury, which then mints the VEC:
//
//   vested      = vec_supply * percent * percent_vested / (1e6 * 1e9)
//   redeemable  = vested - claimed
//
// Claimed amounts are kept index-adjusted so staked claims keep their share
// of supply as the index grows.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use vector_core::math::{checked_add, mul_div};
use vector_core::{AccessControl, Address, Role, TokenLedger, VectorError};

use crate::bonding::VESTING_PRECISION;
use crate::staking::Staking;
use crate::treasury::Treasury;

/// Allocation denominator: 10_000 is 1% of supply.
pub const ALLOCATION_DENOMINATOR: u128 = 1_000_000;

/// Cap on the sum of all allocations: 20% of supply.
pub const MAX_TOTAL_ALLOCATION: u128 = 200_000;

/// One year.
pub const DEFAULT_VEST_LENGTH: u64 = 31_536_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyVestingTerms {
    /// Millionths of VEC supply.
    pub percent: u128,
    pub index_claimed: u128,
}

/// Where exercised VEC goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Wallet,
    Staked,
}

#[derive(Debug, Clone)]
pub struct SupplyVesting {
    address: Address,
    roles: AccessControl,
    vest_length: u64,
    start_vest: Option<u64>,
    total_allocated: u128,
    terms: HashMap<Address, SupplyVestingTerms>,
}

impl SupplyVesting {
    /// Create the component. The vesting window opens on the first
    /// allocation and lasts `vest_length` seconds.
    pub fn new(address: Address, admin: Address, vest_length: u64) -> Result<Self, VectorError> {
        if vest_length == 0 {
            return Err(VectorError::InvalidParameter(
                "vest length must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            address,
            roles: AccessControl::with_admin(admin),
            vest_length,
            start_vest: None,
            total_allocated: 0,
            terms: HashMap::new(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn total_allocated(&self) -> u128 {
        self.total_allocated
    }

    pub fn start_vest(&self) -> Option<u64> {
        self.start_vest
    }

    /// End of the vesting window, once it has opened.
    pub fn full_vest(&self) -> Option<u64> {
        self.start_vest.map(|start| start.saturating_add(self.vest_length))
    }

    pub fn terms(&self, beneficiary: &Address) -> Option<SupplyVestingTerms> {
        self.terms.get(beneficiary).copied()
    }

    /// Allocate `percent` millionths of supply to `beneficiary`. Admin-only.
    ///
    /// # Errors
    /// `NotOwner`, `AlreadyExists`, `ZeroAmount`, and
    /// `AllocationCapExceeded` past 20% in aggregate.
    pub fn set_terms(
        &mut self,
        caller: &Address,
        beneficiary: Address,
        percent: u128,
        now: u64,
    ) -> Result<(), VectorError> {
        self.roles.require(Role::Admin, caller)?;
        if self.terms.contains_key(&beneficiary) {
            return Err(VectorError::AlreadyExists(beneficiary));
        }
        if percent == 0 {
            return Err(VectorError::ZeroAmount);
        }
        let total = checked_add(self.total_allocated, percent)?;
        if total > MAX_TOTAL_ALLOCATION {
            return Err(VectorError::AllocationCapExceeded {
                allocated: self.total_allocated,
                requested: percent,
                cap: MAX_TOTAL_ALLOCATION,
            });
        }

        if self.start_vest.is_none() {
            self.start_vest = Some(now);
            info!(start = now, length = self.vest_length, "Supply vesting window opened");
        }
        self.total_allocated = total;
        self.terms.insert(
            beneficiary,
            SupplyVestingTerms {
                percent,
                index_claimed: 0,
            },
        );
        info!(beneficiary = %beneficiary.short(), percent, "Supply vesting terms set");
        Ok(())
    }

    /// Fraction of the global window elapsed, 1e9 = all.
    pub fn percent_vested(&self, now: u64) -> u128 {
        let Some(start) = self.start_vest else {
            return 0;
        };
        let elapsed = now.saturating_sub(start);
        mul_div(elapsed as u128, VESTING_PRECISION, self.vest_length as u128)
            .map(|p| p.min(VESTING_PRECISION))
            .unwrap_or(VESTING_PRECISION)
    }

    /// Fraction of supply vested to `beneficiary`, in millionths.
    pub fn percent_address_vested(&self, beneficiary: &Address, now: u64) -> Result<u128, VectorError> {
        let percent = self.terms.get(beneficiary).map(|t| t.percent).unwrap_or(0);
        mul_div(percent, self.percent_vested(now), VESTING_PRECISION)
    }

    /// VEC already exercised by `beneficiary`, at the current index.
    pub fn claimed(&self, staking: &Staking, beneficiary: &Address) -> Result<u128, VectorError> {
        let adjusted = self
            .terms
            .get(beneficiary)
            .map(|t| t.index_claimed)
            .unwrap_or(0);
        staking.from_index_adjusted(adjusted)
    }

    /// VEC `beneficiary` may still exercise.
    pub fn redeemable_for(
        &self,
        ledger: &dyn TokenLedger,
        treasury: &Treasury,
        staking: &Staking,
        beneficiary: &Address,
        now: u64,
    ) -> Result<u128, VectorError> {
        let supply = ledger.total_supply(&treasury.vec_token());
        let vested = mul_div(
            supply,
            self.percent_address_vested(beneficiary, now)?,
            ALLOCATION_DENOMINATOR,
        )?;
        Ok(vested.saturating_sub(self.claimed(staking, beneficiary)?))
    }

    /// Exercise vested VEC by paying `amount` vault shares, VEC to wallet.
    #[allow(clippy::too_many_arguments)]
    pub fn claim(
        &mut self,
        ledger: &mut dyn TokenLedger,
        treasury: &Treasury,
        staking: &mut Staking,
        payer: &Address,
        beneficiary: &Address,
        amount: u128,
        now: u64,
    ) -> Result<u128, VectorError> {
        self.exercise(ledger, treasury, staking, payer, beneficiary, amount, now, Delivery::Wallet)
    }

    /// Exercise vested VEC by paying `amount` vault shares, VEC staked into
    /// sVEC for the beneficiary.
    #[allow(clippy::too_many_arguments)]
    pub fn stake(
        &mut self,
        ledger: &mut dyn TokenLedger,
        treasury: &Treasury,
        staking: &mut Staking,
        payer: &Address,
        beneficiary: &Address,
        amount: u128,
        now: u64,
    ) -> Result<u128, VectorError> {
        self.exercise(ledger, treasury, staking, payer, beneficiary, amount, now, Delivery::Staked)
    }

    #[allow(clippy::too_many_arguments)]
    fn exercise(
        &mut self,
        ledger: &mut dyn TokenLedger,
        treasury: &Treasury,
        staking: &mut Staking,
        payer: &Address,
        beneficiary: &Address,
        amount: u128,
        now: u64,
        delivery: Delivery,
    ) -> Result<u128, VectorError> {
        if amount == 0 {
            return Err(VectorError::ZeroAmount);
        }

        let share_token = treasury.vault_share_token();
        let to_send = treasury.value_of_token(&share_token, amount)?;
        if to_send == 0 {
            return Err(VectorError::ZeroAmount);
        }
        let redeemable = self.redeemable_for(ledger, treasury, staking, beneficiary, now)?;
        if to_send > redeemable {
            return Err(VectorError::ClaimExceedsVested {
                requested: to_send,
                redeemable,
            });
        }

        let available = ledger.balance_of(&share_token, payer);
        if available < amount {
            return Err(VectorError::InsufficientBalance {
                requested: amount,
                available,
            });
        }
        if !treasury.is_approved_minter(&self.address) {
            return Err(VectorError::NotApprovedMinter(self.address));
        }
        let adjusted = staking.to_index_adjusted(to_send)?;
        if adjusted == 0 {
            return Err(VectorError::ZeroAmount);
        }
        let claimed = self
            .terms
            .get(beneficiary)
            .map(|t| t.index_claimed)
            .unwrap_or(0);
        let index_claimed = checked_add(claimed, adjusted)?;
        if delivery == Delivery::Staked {
            checked_add(staking.total_index_adjusted(), adjusted)?;
        }

        ledger.transfer(&share_token, payer, &treasury.address(), amount)?;
        match delivery {
            Delivery::Wallet => treasury.mint(ledger, &self.address, beneficiary, to_send)?,
            Delivery::Staked => {
                treasury.mint(ledger, &self.address, &self.address, to_send)?;
                staking.stake(ledger, &self.address, beneficiary, to_send)?;
            }
        }
        if let Some(entry) = self.terms.get_mut(beneficiary) {
            entry.index_claimed = index_claimed;
        }

        info!(
            beneficiary = %beneficiary.short(),
            paid_shares = amount,
            vec = to_send,
            staked = delivery == Delivery::Staked,
            "Supply vesting exercised"
        );
        Ok(to_send)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vector_core::{InMemoryLedger, INDEX_PRECISION, VEC_UNIT};

    use crate::staking::DEFAULT_EPOCH_LENGTH;
    use crate::treasury::DEFAULT_RESERVE_BACKING;

    const ETH: u128 = 1_000_000_000_000_000_000;
    const SUPPLY: u128 = 10_000_000 * VEC_UNIT;

    struct Fixture {
        ledger: InMemoryLedger,
        treasury: Treasury,
        staking: Staking,
        vest: SupplyVesting,
        owner: Address,
        investor: Address,
    }

    fn setup() -> Fixture {
        let owner = Address::from_label("owner");
        let investor = Address::from_label("investor");
        let vec = Address::from_label("vec");
        let veth = Address::from_label("veth");

        let vest = SupplyVesting::new(Address::from_label("investor-vest"), owner, DEFAULT_VEST_LENGTH).unwrap();
        let mut treasury = Treasury::new(
            Address::from_label("treasury"),
            owner,
            vec,
            veth,
            DEFAULT_RESERVE_BACKING,
        )
        .unwrap();
        treasury.add_approved_minter(&owner, vest.address()).unwrap();
        let staking = Staking::new(
            Address::from_label("staking"),
            owner,
            vec,
            DEFAULT_EPOCH_LENGTH,
            0,
            INDEX_PRECISION,
        )
        .unwrap();

        let mut ledger = InMemoryLedger::new();
        ledger.mint(&vec, &owner, SUPPLY).unwrap();
        ledger.mint(&veth, &investor, 100 * ETH).unwrap();

        Fixture {
            ledger,
            treasury,
            staking,
            vest,
            owner,
            investor,
        }
    }

    fn with_allocation() -> Fixture {
        let mut f = setup();
        // 1% of supply.
        f.vest.set_terms(&f.owner, f.investor, 10_000, 0).unwrap();
        f
    }

    #[test]
    fn test_set_terms_owner_only() {
        let mut f = setup();
        assert_eq!(
            f.vest.set_terms(&f.investor, f.investor, 10_000, 0),
            Err(VectorError::NotOwner(f.investor))
        );
    }

    #[test]
    fn test_set_terms_twice() {
        let mut f = with_allocation();
        assert_eq!(
            f.vest.set_terms(&f.owner, f.investor, 10_000, 0),
            Err(VectorError::AlreadyExists(f.investor))
        );
    }

    #[test]
    fn test_allocation_cap() {
        let mut f = setup();
        f.vest
            .set_terms(&f.owner, Address::from_label("a"), 150_000, 0)
            .unwrap();
        let err = f
            .vest
            .set_terms(&f.owner, Address::from_label("b"), 50_001, 0)
            .unwrap_err();
        assert_eq!(
            err,
            VectorError::AllocationCapExceeded {
                allocated: 150_000,
                requested: 50_001,
                cap: MAX_TOTAL_ALLOCATION
            }
        );
        f.vest
            .set_terms(&f.owner, Address::from_label("b"), 50_000, 0)
            .unwrap();
        assert_eq!(f.vest.total_allocated(), MAX_TOTAL_ALLOCATION);
    }

    #[test]
    fn test_window_opens_on_first_allocation() {
        let mut f = setup();
        assert_eq!(f.vest.percent_vested(1_000), 0);
        f.vest.set_terms(&f.owner, f.investor, 10_000, 500).unwrap();
        f.vest
            .set_terms(&f.owner, Address::from_label("later"), 10_000, 9_000)
            .unwrap();
        assert_eq!(f.vest.start_vest(), Some(500));
        assert_eq!(f.vest.full_vest(), Some(500 + DEFAULT_VEST_LENGTH));
    }

    #[test]
    fn test_percent_vested() {
        let f = with_allocation();
        assert_eq!(f.vest.percent_vested(DEFAULT_VEST_LENGTH / 2), 500_000_000);
        assert_eq!(f.vest.percent_vested(2 * DEFAULT_VEST_LENGTH), VESTING_PRECISION);
        assert_eq!(
            f.vest
                .percent_address_vested(&f.investor, DEFAULT_VEST_LENGTH / 2)
                .unwrap(),
            5_000
        );
    }

    #[test]
    fn test_redeemable_tracks_supply() {
        let f = with_allocation();
        // Half of 1% of 10M.
        assert_eq!(
            f.vest
                .redeemable_for(&f.ledger, &f.treasury, &f.staking, &f.investor, DEFAULT_VEST_LENGTH / 2)
                .unwrap(),
            50_000 * VEC_UNIT
        );
    }

    #[test]
    fn test_claim_pays_vault_shares_for_vec() {
        let mut f = with_allocation();
        let veth = f.treasury.vault_share_token();
        let sent = f
            .vest
            .claim(
                &mut f.ledger,
                &f.treasury,
                &mut f.staking,
                &f.investor,
                &f.investor,
                DEFAULT_RESERVE_BACKING,
                DEFAULT_VEST_LENGTH,
            )
            .unwrap();
        assert_eq!(sent, VEC_UNIT);
        assert_eq!(f.ledger.balance_of(&f.treasury.vec_token(), &f.investor), VEC_UNIT);
        assert_eq!(f.ledger.balance_of(&veth, &f.treasury.address()), DEFAULT_RESERVE_BACKING);
        assert_eq!(f.vest.terms(&f.investor).unwrap().index_claimed, VEC_UNIT);
        assert_eq!(f.vest.claimed(&f.staking, &f.investor).unwrap(), VEC_UNIT);
    }

    #[test]
    fn test_stake_delivers_svec() {
        let mut f = with_allocation();
        f.vest
            .stake(
                &mut f.ledger,
                &f.treasury,
                &mut f.staking,
                &f.investor,
                &f.investor,
                DEFAULT_RESERVE_BACKING,
                DEFAULT_VEST_LENGTH,
            )
            .unwrap();
        assert_eq!(f.staking.balance_of(&f.investor).unwrap(), VEC_UNIT);
        assert_eq!(f.ledger.balance_of(&f.treasury.vec_token(), &f.investor), 0);
    }

    #[test]
    fn test_claim_beyond_vested() {
        let mut f = with_allocation();
        // Nothing has vested at the start of the window.
        let err = f
            .vest
            .claim(
                &mut f.ledger,
                &f.treasury,
                &mut f.staking,
                &f.investor,
                &f.investor,
                DEFAULT_RESERVE_BACKING,
                0,
            )
            .unwrap_err();
        assert!(matches!(err, VectorError::ClaimExceedsVested { .. }));
        assert_eq!(f.ledger.balance_of(&f.treasury.vault_share_token(), &f.investor), 100 * ETH);
    }

    #[test]
    fn test_minter_required() {
        let mut f = with_allocation();
        f.treasury
            .remove_approved_minter(&f.owner, &f.vest.address())
            .unwrap();
        let err = f
            .vest
            .claim(
                &mut f.ledger,
                &f.treasury,
                &mut f.staking,
                &f.investor,
                &f.investor,
                DEFAULT_RESERVE_BACKING,
                DEFAULT_VEST_LENGTH,
            )
            .unwrap_err();
        assert_eq!(err, VectorError::NotApprovedMinter(f.vest.address()));
    }

    #[test]
    fn test_exercise_without_terms() {
        let mut f = setup();
        let err = f
            .vest
            .claim(
                &mut f.ledger,
                &f.treasury,
                &mut f.staking,
                &f.investor,
                &f.investor,
                DEFAULT_RESERVE_BACKING,
                DEFAULT_VEST_LENGTH,
            )
            .unwrap_err();
        assert_eq!(
            err,
            VectorError::ClaimExceedsVested {
                requested: VEC_UNIT,
                redeemable: 0
            }
        );
    }

    #[test]
    fn test_stake_below_one_index_unit_changes_nothing() {
        let mut f = with_allocation();
        f.staking = Staking::new(
            Address::from_label("staking"),
            f.owner,
            f.treasury.vec_token(),
            DEFAULT_EPOCH_LENGTH,
            0,
            2 * INDEX_PRECISION,
        )
        .unwrap();
        let veth = f.treasury.vault_share_token();
        let vec = f.treasury.vec_token();

        // 1e7 shares are worth one base unit of VEC, half an index unit.
        let err = f
            .vest
            .stake(
                &mut f.ledger,
                &f.treasury,
                &mut f.staking,
                &f.investor,
                &f.investor,
                10_000_000,
                30 * 86_400,
            )
            .unwrap_err();
        assert_eq!(err, VectorError::ZeroAmount);

        assert_eq!(f.ledger.balance_of(&veth, &f.investor), 100 * ETH);
        assert_eq!(f.ledger.balance_of(&veth, &f.treasury.address()), 0);
        assert_eq!(f.ledger.total_supply(&vec), SUPPLY);
        assert_eq!(f.vest.terms(&f.investor).unwrap().index_claimed, 0);
        assert_eq!(f.staking.total_index_adjusted(), 0);
    }
}
