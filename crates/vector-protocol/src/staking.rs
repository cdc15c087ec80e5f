// crates/vector-protocol/src/staking.rs
//
// sVEC: the rebasing staking receipt.
//
// Holders stake VEC and receive sVEC. Internally every balance is stored in
// index-adjusted units; the visible balance is `adjusted * index / 1e9`.
// A rebase grows the index by the reward ratio, so all balances grow
// proportionally without touching any per-holder entry:
//
//   reward    = distributor.next_reward_for(circulating)
//   index'    = index * (circulating + reward) / circulating
//
// Epochs are timestamp-driven. `rebase` runs at most one epoch per call;
// callers behind by several epochs call it repeatedly.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use vector_core::math::{checked_add, from_index_adjusted, mul_div, to_index_adjusted};
use vector_core::{AccessControl, Address, Role, TokenLedger, VectorError, INDEX_PRECISION};

use crate::distributor::Distributor;
use crate::treasury::Treasury;

/// Eight hours.
pub const DEFAULT_EPOCH_LENGTH: u64 = 28_800;

/// Rebase epoch schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epoch {
    /// Seconds per epoch.
    pub length: u64,
    /// Epochs completed so far.
    pub number: u64,
    /// Timestamp at which the current epoch may be rebased.
    pub end_time: u64,
    /// Reward distributed by the last rebase.
    pub distribute: u128,
}

/// Result of one rebase step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebaseOutcome {
    pub epoch: u64,
    pub reward: u128,
    pub index_before: u128,
    pub index_after: u128,
    pub circulating_before: u128,
    pub circulating_after: u128,
}

#[derive(Debug, Clone)]
pub struct Staking {
    address: Address,
    roles: AccessControl,
    vec_token: Address,
    index: u128,
    epoch: Epoch,
    distributor: Option<Address>,
    adjusted_balances: HashMap<Address, u128>,
    total_adjusted: u128,
}

impl Staking {
    /// Create the staking component.
    ///
    /// # Arguments
    /// * `address` - ledger account holding staked VEC
    /// * `admin` - owner allowed to set the distributor
    /// * `vec_token` - token id of VEC
    /// * `epoch_length` - seconds per epoch
    /// * `first_epoch_time` - timestamp of the first rebase
    /// * `initial_index` - starting index, 1e9 for 1:1
    ///
    /// # Errors
    /// `InvalidParameter` for a zero epoch length or index.
    pub fn new(
        address: Address,
        admin: Address,
        vec_token: Address,
        epoch_length: u64,
        first_epoch_time: u64,
        initial_index: u128,
    ) -> Result<Self, VectorError> {
        if epoch_length == 0 {
            return Err(VectorError::InvalidParameter(
                "epoch length must be non-zero".to_string(),
            ));
        }
        if initial_index == 0 {
            return Err(VectorError::InvalidParameter(
                "index must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            address,
            roles: AccessControl::with_admin(admin),
            vec_token,
            index: initial_index,
            epoch: Epoch {
                length: epoch_length,
                number: 0,
                end_time: first_epoch_time,
                distribute: 0,
            },
            distributor: None,
            adjusted_balances: HashMap::new(),
            total_adjusted: 0,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn vec_token(&self) -> Address {
        self.vec_token
    }

    pub fn index(&self) -> u128 {
        self.index
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn distributor(&self) -> Option<Address> {
        self.distributor
    }

    /// Register the reward distributor. Admin-only, once.
    pub fn set_distributor(&mut self, caller: &Address, distributor: Address) -> Result<(), VectorError> {
        self.roles.require(Role::Admin, caller)?;
        if self.distributor.is_some() {
            return Err(VectorError::AlreadyInitialized("staking distributor".to_string()));
        }
        self.distributor = Some(distributor);
        info!(distributor = %distributor.short(), "Staking distributor set");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Index conversion
    // -----------------------------------------------------------------------

    pub fn to_index_adjusted(&self, amount: u128) -> Result<u128, VectorError> {
        to_index_adjusted(amount, self.index)
    }

    pub fn from_index_adjusted(&self, adjusted: u128) -> Result<u128, VectorError> {
        from_index_adjusted(adjusted, self.index)
    }

    // -----------------------------------------------------------------------
    // Balances
    // -----------------------------------------------------------------------

    /// Visible sVEC balance.
    pub fn balance_of(&self, holder: &Address) -> Result<u128, VectorError> {
        from_index_adjusted(self.index_adjusted_balance_of(holder), self.index)
    }

    pub fn index_adjusted_balance_of(&self, holder: &Address) -> u128 {
        self.adjusted_balances.get(holder).copied().unwrap_or(0)
    }

    /// Total visible sVEC outstanding.
    pub fn circulating_supply(&self) -> Result<u128, VectorError> {
        from_index_adjusted(self.total_adjusted, self.index)
    }

    pub fn total_index_adjusted(&self) -> u128 {
        self.total_adjusted
    }

    fn credit(&mut self, holder: &Address, adjusted: u128) -> Result<(), VectorError> {
        let total = checked_add(self.total_adjusted, adjusted)?;
        let balance = checked_add(self.index_adjusted_balance_of(holder), adjusted)?;
        self.adjusted_balances.insert(*holder, balance);
        self.total_adjusted = total;
        Ok(())
    }

    fn debit(&mut self, holder: &Address, adjusted: u128) -> Result<(), VectorError> {
        let available = self.index_adjusted_balance_of(holder);
        if available < adjusted {
            return Err(VectorError::InsufficientBalance {
                requested: adjusted,
                available,
            });
        }
        if available == adjusted {
            self.adjusted_balances.remove(holder);
        } else {
            self.adjusted_balances.insert(*holder, available - adjusted);
        }
        self.total_adjusted -= adjusted;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Stake / unstake / transfer
    // -----------------------------------------------------------------------

    /// Take `amount` VEC from `from` and credit `to` with the same visible
    /// amount of sVEC.
    ///
    /// Returns the index-adjusted units credited.
    pub fn stake(
        &mut self,
        ledger: &mut dyn TokenLedger,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<u128, VectorError> {
        if amount == 0 {
            return Err(VectorError::ZeroAmount);
        }
        let adjusted = self.to_index_adjusted(amount)?;
        if adjusted == 0 {
            return Err(VectorError::ZeroAmount);
        }
        checked_add(self.total_adjusted, adjusted)?;

        ledger.transfer(&self.vec_token, from, &self.address, amount)?;
        self.credit(to, adjusted)?;

        debug!(from = %from.short(), to = %to.short(), amount, adjusted, "Staked");
        Ok(adjusted)
    }

    /// Burn `amount` sVEC from `holder` and pay `amount` VEC to `to`.
    ///
    /// The index-adjusted debit rounds up so an unstake never pays out more
    /// than the receipt was worth.
    pub fn unstake(
        &mut self,
        ledger: &mut dyn TokenLedger,
        holder: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<u128, VectorError> {
        if amount == 0 {
            return Err(VectorError::ZeroAmount);
        }
        let mut adjusted = self.to_index_adjusted(amount)?;
        if self.from_index_adjusted(adjusted)? < amount {
            adjusted = checked_add(adjusted, 1)?;
        }
        let available = self.index_adjusted_balance_of(holder);
        if available < adjusted {
            return Err(VectorError::InsufficientBalance {
                requested: amount,
                available: self.balance_of(holder)?,
            });
        }

        ledger.transfer(&self.vec_token, &self.address, to, amount)?;
        self.debit(holder, adjusted)?;

        debug!(holder = %holder.short(), to = %to.short(), amount, "Unstaked");
        Ok(amount)
    }

    /// Move a visible amount of sVEC between holders.
    pub fn transfer_receipt(&mut self, from: &Address, to: &Address, amount: u128) -> Result<u128, VectorError> {
        let adjusted = self.to_index_adjusted(amount)?;
        self.transfer_index_adjusted(from, to, adjusted)?;
        Ok(adjusted)
    }

    /// Move index-adjusted units between holders.
    pub fn transfer_index_adjusted(&mut self, from: &Address, to: &Address, adjusted: u128) -> Result<(), VectorError> {
        if adjusted == 0 {
            return Err(VectorError::ZeroAmount);
        }
        checked_add(self.index_adjusted_balance_of(to), adjusted)?;
        self.debit(from, adjusted)?;
        self.credit(to, adjusted)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Rebase
    // -----------------------------------------------------------------------

    /// Seconds until the current epoch may be rebased.
    pub fn seconds_to_next_epoch(&self, now: u64) -> u64 {
        self.epoch.end_time.saturating_sub(now)
    }

    /// Advance one epoch if it has ended.
    ///
    /// Returns `None` before `epoch.end_time`. Otherwise asks the distributor
    /// for the epoch reward, grows the index by the reward ratio and moves
    /// the epoch forward by one length. With nothing staked the index is
    /// left unchanged.
    pub fn rebase(
        &mut self,
        ledger: &mut dyn TokenLedger,
        distributor: &mut Distributor,
        treasury: &Treasury,
        now: u64,
    ) -> Result<Option<RebaseOutcome>, VectorError> {
        if now < self.epoch.end_time {
            return Ok(None);
        }

        let circulating = self.circulating_supply()?;
        let wired = self.distributor == Some(distributor.address());
        let reward = if wired {
            distributor.next_reward_for(circulating)?
        } else {
            0
        };

        let index_before = self.index;
        let index_after = if circulating > 0 && reward > 0 {
            mul_div(self.index, checked_add(circulating, reward)?, circulating)?
        } else {
            self.index
        };
        let end_time = self
            .epoch
            .end_time
            .checked_add(self.epoch.length)
            .ok_or(VectorError::Overflow)?;

        if reward > 0 {
            distributor.distribute(ledger, treasury, &self.address, circulating)?;
        }

        self.index = index_after;
        self.epoch.end_time = end_time;
        self.epoch.number += 1;
        self.epoch.distribute = reward;

        let outcome = RebaseOutcome {
            epoch: self.epoch.number,
            reward,
            index_before,
            index_after,
            circulating_before: circulating,
            circulating_after: self.circulating_supply()?,
        };
        info!(
            epoch = outcome.epoch,
            reward,
            index = index_after,
            circulating = outcome.circulating_after,
            "Rebased"
        );
        Ok(Some(outcome))
    }

    /// Base-precision index for display: `index / 1e9`.
    pub fn index_as_f64(&self) -> f64 {
        self.index as f64 / INDEX_PRECISION as f64
    }
}
