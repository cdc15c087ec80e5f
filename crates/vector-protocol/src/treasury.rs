// crates/vector-protocol/src/treasury.rs
//
// Treasury: holds reserves, values them in VEC, and mints VEC on behalf of
// approved minters.
//
// Vault shares are valued through the reserve backing, the number of vault
// shares (18 decimals) that back one whole VEC:
//   value(shares) = shares * 1e9 / reserve_backing
// Any other accepted asset carries an injected `AssetValuation`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use vector_core::math::{checked_add, mul_div, VEC_DECIMALS, VEC_UNIT};
use vector_core::{AccessControl, Address, AssetValuation, Role, TokenLedger, VectorError};

/// Vault shares backing one VEC: 0.01 vETH.
pub const DEFAULT_RESERVE_BACKING: u128 = 10_000_000_000_000_000;

/// Values an asset one-to-one with VEC after rescaling its decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParValuation {
    pub decimals: u32,
}

impl ParValuation {
    pub fn new(decimals: u32) -> Self {
        Self { decimals }
    }
}

impl AssetValuation for ParValuation {
    fn value_of(&self, amount: u128) -> Result<u128, VectorError> {
        if self.decimals >= VEC_DECIMALS {
            let scale = 10u128
                .checked_pow(self.decimals - VEC_DECIMALS)
                .ok_or(VectorError::Overflow)?;
            Ok(amount / scale)
        } else {
            let scale = 10u128
                .checked_pow(VEC_DECIMALS - self.decimals)
                .ok_or(VectorError::Overflow)?;
            amount.checked_mul(scale).ok_or(VectorError::Overflow)
        }
    }
}

/// Values an asset at a fixed VEC price per whole token.
///
/// Used for LP tokens when the pool price is supplied externally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedPriceValuation {
    /// VEC base units per whole token.
    pub vec_per_token: u128,
    pub decimals: u32,
}

impl AssetValuation for FixedPriceValuation {
    fn value_of(&self, amount: u128) -> Result<u128, VectorError> {
        let unit = 10u128
            .checked_pow(self.decimals)
            .ok_or(VectorError::Overflow)?;
        mul_div(amount, self.vec_per_token, unit)
    }
}

/// Treasury reserve figures, computed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveReport {
    /// Value of everything the treasury holds, in VEC base units.
    pub total_reserves: u128,
    /// VEC outstanding.
    pub vec_supply: u128,
    /// Reserves not backing outstanding VEC. Zero when under-backed.
    pub excess_reserves: u128,
}

/// The treasury.
pub struct Treasury {
    address: Address,
    roles: AccessControl,
    vec_token: Address,
    vault_share_token: Address,
    reserve_backing: u128,
    valuations: BTreeMap<Address, Box<dyn AssetValuation>>,
}

impl fmt::Debug for Treasury {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Treasury")
            .field("address", &self.address)
            .field("vec_token", &self.vec_token)
            .field("vault_share_token", &self.vault_share_token)
            .field("reserve_backing", &self.reserve_backing)
            .field("accepted_assets", &self.valuations.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Treasury {
    /// Create a treasury.
    ///
    /// # Arguments
    /// * `address` - the treasury's ledger account
    /// * `admin` - owner allowed to approve minters and assets
    /// * `vec_token` - token id of VEC
    /// * `vault_share_token` - token id of the vault share (vETH)
    /// * `reserve_backing` - vault shares backing one whole VEC
    ///
    /// # Errors
    /// `InvalidParameter` if `reserve_backing` is zero.
    pub fn new(
        address: Address,
        admin: Address,
        vec_token: Address,
        vault_share_token: Address,
        reserve_backing: u128,
    ) -> Result<Self, VectorError> {
        if reserve_backing == 0 {
            return Err(VectorError::InvalidParameter(
                "reserve backing must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            address,
            roles: AccessControl::with_admin(admin),
            vec_token,
            vault_share_token,
            reserve_backing,
            valuations: BTreeMap::new(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn vec_token(&self) -> Address {
        self.vec_token
    }

    pub fn vault_share_token(&self) -> Address {
        self.vault_share_token
    }

    pub fn reserve_backing(&self) -> u128 {
        self.reserve_backing
    }

    // -----------------------------------------------------------------------
    // Minters
    // -----------------------------------------------------------------------

    /// Approve a minter. Admin-only.
    ///
    /// Approved minters are fully trusted: the treasury does not check that
    /// a mint is backed by reserves.
    pub fn add_approved_minter(&mut self, caller: &Address, minter: Address) -> Result<(), VectorError> {
        if self.roles.grant(caller, Role::Minter, minter)? {
            info!(minter = %minter.short(), "Approved treasury minter");
        }
        Ok(())
    }

    /// Revoke a minter. Admin-only.
    pub fn remove_approved_minter(&mut self, caller: &Address, minter: &Address) -> Result<(), VectorError> {
        if self.roles.revoke(caller, Role::Minter, minter)? {
            info!(minter = %minter.short(), "Revoked treasury minter");
        }
        Ok(())
    }

    pub fn is_approved_minter(&self, who: &Address) -> bool {
        self.roles.has_role(Role::Minter, who)
    }

    pub fn approved_minters(&self) -> Vec<Address> {
        self.roles.members(Role::Minter)
    }

    /// Mint `amount` VEC to `to` on behalf of an approved minter.
    ///
    /// # Errors
    /// `NotApprovedMinter` if `caller` is not approved, `ZeroAmount` for a
    /// zero mint.
    pub fn mint(
        &self,
        ledger: &mut dyn TokenLedger,
        caller: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), VectorError> {
        self.roles.require(Role::Minter, caller)?;
        if amount == 0 {
            return Err(VectorError::ZeroAmount);
        }
        ledger.mint(&self.vec_token, to, amount)?;
        debug!(minter = %caller.short(), to = %to.short(), amount, "Treasury mint");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Valuation
    // -----------------------------------------------------------------------

    /// Accept a non-vault-share reserve asset with its valuation. Admin-only.
    pub fn accept_asset(
        &mut self,
        caller: &Address,
        asset: Address,
        valuation: Box<dyn AssetValuation>,
    ) -> Result<(), VectorError> {
        self.roles.require(Role::Admin, caller)?;
        if asset == self.vault_share_token {
            return Err(VectorError::InvalidParameter(
                "vault shares are valued through the reserve backing".to_string(),
            ));
        }
        self.valuations.insert(asset, valuation);
        info!(asset = %asset.short(), "Accepted reserve asset");
        Ok(())
    }

    pub fn accepts(&self, asset: &Address) -> bool {
        *asset == self.vault_share_token || self.valuations.contains_key(asset)
    }

    /// VEC-equivalent value of `amount` of `asset`.
    ///
    /// # Errors
    /// `NotRegistered` for an asset the treasury does not value.
    pub fn value_of_token(&self, asset: &Address, amount: u128) -> Result<u128, VectorError> {
        if *asset == self.vault_share_token {
            return mul_div(amount, VEC_UNIT, self.reserve_backing);
        }
        self.valuations
            .get(asset)
            .ok_or_else(|| VectorError::NotRegistered(format!("reserve asset {}", asset)))?
            .value_of(amount)
    }

    /// Value of everything the treasury holds.
    pub fn total_reserves(&self, ledger: &dyn TokenLedger) -> Result<u128, VectorError> {
        let shares = ledger.balance_of(&self.vault_share_token, &self.address);
        let mut total = self.value_of_token(&self.vault_share_token, shares)?;
        for (asset, valuation) in &self.valuations {
            let held = ledger.balance_of(asset, &self.address);
            total = checked_add(total, valuation.value_of(held)?)?;
        }
        Ok(total)
    }

    /// Reserves minus outstanding VEC, floored at zero.
    pub fn excess_reserves(&self, ledger: &dyn TokenLedger) -> Result<u128, VectorError> {
        Ok(self.reserve_report(ledger)?.excess_reserves)
    }

    pub fn reserve_report(&self, ledger: &dyn TokenLedger) -> Result<ReserveReport, VectorError> {
        let total_reserves = self.total_reserves(ledger)?;
        let vec_supply = ledger.total_supply(&self.vec_token);
        Ok(ReserveReport {
            total_reserves,
            vec_supply,
            excess_reserves: total_reserves.saturating_sub(vec_supply),
        })
    }
}
