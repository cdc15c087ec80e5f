// crates/vector-core/src/ledger.rs
//
// In-memory token ledger.
//
// Stands in for the external fungible-token contracts: every token the
// protocol touches (LSTs, vault shares, VEC, LP tokens) lives in one map keyed
// by token and holder.

use std::collections::HashMap;

use crate::address::Address;
use crate::error::VectorError;
use crate::traits::TokenLedger;

/// Balances and supplies for any number of tokens.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    balances: HashMap<(Address, Address), u128>,
    supplies: HashMap<Address, u128>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of non-zero balances across all tokens.
    pub fn holder_count(&self) -> usize {
        self.balances.values().filter(|b| **b > 0).count()
    }

    fn debit(&mut self, token: &Address, from: &Address, amount: u128) -> Result<(), VectorError> {
        let available = self.balance_of(token, from);
        if available < amount {
            return Err(VectorError::InsufficientBalance {
                requested: amount,
                available,
            });
        }
        self.balances.insert((*token, *from), available - amount);
        Ok(())
    }
}

impl TokenLedger for InMemoryLedger {
    fn balance_of(&self, token: &Address, account: &Address) -> u128 {
        self.balances.get(&(*token, *account)).copied().unwrap_or(0)
    }

    fn total_supply(&self, token: &Address) -> u128 {
        self.supplies.get(token).copied().unwrap_or(0)
    }

    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), VectorError> {
        if from == to {
            // Self-transfer only needs the balance check.
            let available = self.balance_of(token, from);
            if available < amount {
                return Err(VectorError::InsufficientBalance {
                    requested: amount,
                    available,
                });
            }
            return Ok(());
        }
        let credited = self
            .balance_of(token, to)
            .checked_add(amount)
            .ok_or(VectorError::Overflow)?;
        self.debit(token, from, amount)?;
        self.balances.insert((*token, *to), credited);
        Ok(())
    }

    fn mint(&mut self, token: &Address, to: &Address, amount: u128) -> Result<(), VectorError> {
        let supply = self
            .total_supply(token)
            .checked_add(amount)
            .ok_or(VectorError::Overflow)?;
        let balance = self
            .balance_of(token, to)
            .checked_add(amount)
            .ok_or(VectorError::Overflow)?;
        self.supplies.insert(*token, supply);
        self.balances.insert((*token, *to), balance);
        Ok(())
    }

    fn burn(&mut self, token: &Address, from: &Address, amount: u128) -> Result<(), VectorError> {
        self.debit(token, from, amount)?;
        let supply = self.total_supply(token).saturating_sub(amount);
        self.supplies.insert(*token, supply);
        Ok(())
    }
}
