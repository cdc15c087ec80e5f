// crates/vector-protocol/src/distributor.rs
//
// Epoch reward source for staking. At each rebase the staking component asks
// for `circulating * rate / 1e6` VEC, which the distributor has the treasury
// mint straight to staking.

use serde::{Deserialize, Serialize};
use tracing::info;

use vector_core::math::{checked_add, mul_div};
use vector_core::{AccessControl, Address, Role, TokenLedger, VectorError};

use crate::treasury::Treasury;

/// Rate denominator: a rate of 5000 is 0.5% per epoch.
pub const RATE_DENOMINATOR: u128 = 1_000_000;

/// Default reward rate per epoch.
pub const DEFAULT_REWARD_RATE: u128 = 5_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Distributor {
    address: Address,
    roles: AccessControl,
    staking: Address,
    rate: u128,
    total_distributed: u128,
}

impl Distributor {
    /// Create a distributor serving the staking component at `staking`.
    /// The rate starts at zero.
    pub fn new(address: Address, admin: Address, staking: Address) -> Self {
        Self {
            address,
            roles: AccessControl::with_admin(admin),
            staking,
            rate: 0,
            total_distributed: 0,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn staking(&self) -> Address {
        self.staking
    }

    pub fn rate(&self) -> u128 {
        self.rate
    }

    pub fn total_distributed(&self) -> u128 {
        self.total_distributed
    }

    /// Set the per-epoch reward rate, in millionths. Admin-only.
    pub fn set_rate(&mut self, caller: &Address, rate: u128) -> Result<(), VectorError> {
        self.roles.require(Role::Admin, caller)?;
        if rate > RATE_DENOMINATOR {
            return Err(VectorError::InvalidParameter(format!(
                "reward rate {} exceeds {}",
                rate, RATE_DENOMINATOR
            )));
        }
        self.rate = rate;
        info!(rate, "Reward rate updated");
        Ok(())
    }

    /// Reward the next epoch pays on `circulating` sVEC.
    pub fn next_reward_for(&self, circulating: u128) -> Result<u128, VectorError> {
        mul_div(circulating, self.rate, RATE_DENOMINATOR)
    }

    /// Mint the epoch reward to staking. Only staking may call this.
    ///
    /// Returns the amount minted. A zero reward mints nothing.
    pub fn distribute(
        &mut self,
        ledger: &mut dyn TokenLedger,
        treasury: &Treasury,
        caller: &Address,
        circulating: u128,
    ) -> Result<u128, VectorError> {
        if *caller != self.staking {
            return Err(VectorError::Unauthorized(*caller));
        }
        let reward = self.next_reward_for(circulating)?;
        if reward == 0 {
            return Ok(0);
        }
        let total = checked_add(self.total_distributed, reward)?;
        treasury.mint(ledger, &self.address, &self.staking, reward)?;
        self.total_distributed = total;
        Ok(reward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vector_core::{InMemoryLedger, VEC_UNIT};

    use crate::treasury::DEFAULT_RESERVE_BACKING;

    fn owner() -> Address {
        Address::from_label("owner")
    }

    fn staking() -> Address {
        Address::from_label("staking")
    }

    fn setup() -> (InMemoryLedger, Treasury, Distributor) {
        let mut treasury = Treasury::new(
            Address::from_label("treasury"),
            owner(),
            Address::from_label("vec"),
            Address::from_label("veth"),
            DEFAULT_RESERVE_BACKING,
        )
        .unwrap();
        let mut distributor = Distributor::new(Address::from_label("distributor"), owner(), staking());
        treasury
            .add_approved_minter(&owner(), distributor.address())
            .unwrap();
        distributor.set_rate(&owner(), DEFAULT_REWARD_RATE).unwrap();
        (InMemoryLedger::new(), treasury, distributor)
    }

    #[test]
    fn test_next_reward() {
        let (_, _, distributor) = setup();
        assert_eq!(
            distributor.next_reward_for(1_000 * VEC_UNIT).unwrap(),
            5 * VEC_UNIT
        );
        assert_eq!(distributor.next_reward_for(0).unwrap(), 0);
    }

    #[test]
    fn test_only_staking_distributes() {
        let (mut ledger, treasury, mut distributor) = setup();
        let user = Address::from_label("user");
        let err = distributor
            .distribute(&mut ledger, &treasury, &user, 1_000 * VEC_UNIT)
            .unwrap_err();
        assert_eq!(err, VectorError::Unauthorized(user));
    }

    #[test]
    fn test_distribute_mints_to_staking() {
        let (mut ledger, treasury, mut distributor) = setup();
        let minted = distributor
            .distribute(&mut ledger, &treasury, &staking(), 1_000 * VEC_UNIT)
            .unwrap();
        assert_eq!(minted, 5 * VEC_UNIT);
        assert_eq!(
            ledger.balance_of(&treasury.vec_token(), &staking()),
            5 * VEC_UNIT
        );
        assert_eq!(distributor.total_distributed(), 5 * VEC_UNIT);
    }

    #[test]
    fn test_zero_circulating_mints_nothing() {
        let (mut ledger, treasury, mut distributor) = setup();
        let minted = distributor
            .distribute(&mut ledger, &treasury, &staking(), 0)
            .unwrap();
        assert_eq!(minted, 0);
        assert_eq!(ledger.total_supply(&treasury.vec_token()), 0);
    }

    #[test]
    fn test_set_rate_owner_only() {
        let (_, _, mut distributor) = setup();
        let user = Address::from_label("user");
        assert_eq!(distributor.set_rate(&user, 1), Err(VectorError::NotOwner(user)));
        assert!(distributor.set_rate(&owner(), RATE_DENOMINATOR + 1).is_err());
        distributor.set_rate(&owner(), 2_500).unwrap();
        assert_eq!(distributor.rate(), 2_500);
    }
}
