// crates/vector-protocol/src/vesting.rs
//
// Flat vesting: a fixed VEC grant per beneficiary, vested linearly over its
// own length and held as sVEC so the grant earns rebases while it vests.
//
// Grants are tracked in index-adjusted units. A claim of a visible amount
// converts at the current index, so rebase growth accrues to the
// beneficiary without changing the vested fraction.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use vector_core::math::{checked_add, mul_div};
use vector_core::{AccessControl, Address, Role, TokenLedger, VectorError};

use crate::bonding::VESTING_PRECISION;
use crate::staking::Staking;

/// One beneficiary's grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatVestingTerms {
    pub total_index_adjusted_can_claim: u128,
    pub index_adjusted_claimed: u128,
    pub vest_length: u64,
    pub start_time: u64,
}

#[derive(Debug, Clone)]
pub struct FlatVesting {
    address: Address,
    roles: AccessControl,
    terms: HashMap<Address, FlatVestingTerms>,
}

impl FlatVesting {
    pub fn new(address: Address, admin: Address) -> Self {
        Self {
            address,
            roles: AccessControl::with_admin(admin),
            terms: HashMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn terms(&self, beneficiary: &Address) -> Option<FlatVestingTerms> {
        self.terms.get(beneficiary).copied()
    }

    /// Grant `total_amount` VEC to `beneficiary`, vesting over `vest_length`
    /// seconds from `now`. Admin-only.
    ///
    /// The grant is funded by staking `total_amount` of the caller's VEC
    /// into sVEC held by this component.
    ///
    /// # Errors
    /// `NotOwner`, `AlreadyExists` for a beneficiary with terms, `ZeroAmount`,
    /// and `InvalidParameter` for a zero length.
    #[allow(clippy::too_many_arguments)]
    pub fn set_terms(
        &mut self,
        ledger: &mut dyn TokenLedger,
        staking: &mut Staking,
        caller: &Address,
        beneficiary: Address,
        total_amount: u128,
        vest_length: u64,
        now: u64,
    ) -> Result<(), VectorError> {
        self.roles.require(Role::Admin, caller)?;
        if self.terms.contains_key(&beneficiary) {
            return Err(VectorError::AlreadyExists(beneficiary));
        }
        if total_amount == 0 {
            return Err(VectorError::ZeroAmount);
        }
        if vest_length == 0 {
            return Err(VectorError::InvalidParameter(
                "vest length must be non-zero".to_string(),
            ));
        }

        let adjusted = staking.stake(ledger, caller, &self.address, total_amount)?;
        self.terms.insert(
            beneficiary,
            FlatVestingTerms {
                total_index_adjusted_can_claim: adjusted,
                index_adjusted_claimed: 0,
                vest_length,
                start_time: now,
            },
        );

        info!(
            beneficiary = %beneficiary.short(),
            total_amount,
            vest_length,
            "Flat vesting terms set"
        );
        Ok(())
    }

    /// Vested fraction of `beneficiary`'s grant, 1e9 = all.
    pub fn percent_vested(&self, beneficiary: &Address, now: u64) -> u128 {
        let Some(terms) = self.terms.get(beneficiary) else {
            return 0;
        };
        let elapsed = now.saturating_sub(terms.start_time);
        mul_div(elapsed as u128, VESTING_PRECISION, terms.vest_length as u128)
            .map(|p| p.min(VESTING_PRECISION))
            .unwrap_or(VESTING_PRECISION)
    }

    /// Index-adjusted units `beneficiary` may still claim.
    pub fn redeemable_for(&self, beneficiary: &Address, now: u64) -> Result<u128, VectorError> {
        let Some(terms) = self.terms.get(beneficiary) else {
            return Ok(0);
        };
        let vested = mul_div(
            terms.total_index_adjusted_can_claim,
            self.percent_vested(beneficiary, now),
            VESTING_PRECISION,
        )?;
        Ok(vested.saturating_sub(terms.index_adjusted_claimed))
    }

    /// Visible sVEC amount already claimed, at the current index.
    pub fn claimed(&self, staking: &Staking, beneficiary: &Address) -> Result<u128, VectorError> {
        let adjusted = self
            .terms
            .get(beneficiary)
            .map(|t| t.index_adjusted_claimed)
            .unwrap_or(0);
        staking.from_index_adjusted(adjusted)
    }

    /// Send `amount` of vested sVEC to `beneficiary`.
    ///
    /// Anyone may trigger a claim; the sVEC always goes to the beneficiary.
    ///
    /// # Errors
    /// `ZeroAmount`, and `ClaimExceedsVested` when `amount` is more than
    /// what has vested (always, for an address without terms).
    pub fn claim(
        &mut self,
        staking: &mut Staking,
        beneficiary: &Address,
        amount: u128,
        now: u64,
    ) -> Result<u128, VectorError> {
        if amount == 0 {
            return Err(VectorError::ZeroAmount);
        }
        let adjusted = staking.to_index_adjusted(amount)?;
        // Without terms nothing is redeemable, so this also rejects strangers.
        let redeemable = self.redeemable_for(beneficiary, now)?;
        if adjusted > redeemable {
            return Err(VectorError::ClaimExceedsVested {
                requested: adjusted,
                redeemable,
            });
        }
        if adjusted == 0 {
            return Err(VectorError::ZeroAmount);
        }
        let claimed = self
            .terms
            .get(beneficiary)
            .map(|t| t.index_adjusted_claimed)
            .unwrap_or(0);
        let claimed = checked_add(claimed, adjusted)?;

        staking.transfer_index_adjusted(&self.address, beneficiary, adjusted)?;
        if let Some(terms) = self.terms.get_mut(beneficiary) {
            terms.index_adjusted_claimed = claimed;
        }

        info!(beneficiary = %beneficiary.short(), amount, adjusted, "Vested sVEC claimed");
        Ok(adjusted)
    }
}
