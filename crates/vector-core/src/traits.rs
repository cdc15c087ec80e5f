// crates/vector-core/src/traits.rs

use crate::address::Address;
use crate::error::VectorError;

/// The base fungible-token ledger the protocol runs on.
///
/// Balances are keyed by `(token, account)`. The protocol never reimplements
/// transfer semantics; it only asks the ledger to move, mint and burn.
/// Implementations must leave balances untouched when they return an error.
///
/// `InMemoryLedger` is the reference implementation used by tests and the
/// simulator.
pub trait TokenLedger {
    /// Balance of `account` in `token`.
    fn balance_of(&self, token: &Address, account: &Address) -> u128;

    /// Total supply of `token`.
    fn total_supply(&self, token: &Address) -> u128;

    /// Move `amount` of `token` from `from` to `to`.
    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), VectorError>;

    /// Create `amount` of `token` for `to`.
    fn mint(&mut self, token: &Address, to: &Address, amount: u128) -> Result<(), VectorError>;

    /// Destroy `amount` of `token` held by `from`.
    fn burn(&mut self, token: &Address, from: &Address, amount: u128) -> Result<(), VectorError>;
}

/// Prices an accepted non-vault-share asset in VEC base units.
///
/// This is the injection point for external pricing (for example the value
/// of one LP token derived from its pool reserves).
pub trait AssetValuation: Send + Sync {
    /// Value of `amount` base units of the asset, in VEC base units.
    fn value_of(&self, amount: u128) -> Result<u128, VectorError>;
}
