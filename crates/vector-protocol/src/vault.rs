// crates/vector-protocol/src/vault.rs
//
// vETH: the restaked-LST vault.
//
// Approved liquid-staking tokens are deposited and wrapped into one fungible
// share token (the vault's own address is the share token on the ledger).
// Each asset has a share ratio fixed at registration (18-decimal fixed point):
//   shares minted   = amount * ratio / 1e18
//   underlying paid = shares * 1e18 / ratio
//
// Per-asset bookkeeping separates funds held by the vault from funds forwarded
// to an external router or manager:
//   current_balance = held (vault's ledger balance) + managed
// `total_deposited` tracks deposited principal. It grows on deposits and on
// `update_deposit` reconciliation, and shrinks only on redemption.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use vector_core::math::{checked_add, mul_div, RATIO_PRECISION};
use vector_core::{AccessControl, Address, Role, TokenLedger, VectorError};

/// One approved LST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestakedAssetConfig {
    /// Token address of the LST.
    pub asset: Address,
    /// Shares minted per unit deposited, scaled by 1e18.
    pub share_ratio: u128,
}

/// Per-asset bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultAssetState {
    /// Amount forwarded to a route or manager and not yet returned.
    pub managed: u128,
    /// Deposited principal, including reconciled yield.
    pub total_deposited: u128,
    /// If set, deposits are forwarded here instead of being held.
    pub route_to: Option<Address>,
}

/// Read-only view of one asset, for snapshots and tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultAssetView {
    pub asset: Address,
    pub share_ratio: u128,
    pub held: u128,
    pub managed: u128,
    pub current_balance: u128,
    pub total_deposited: u128,
    pub route_to: Option<Address>,
}

/// The restaked-LST vault.
#[derive(Debug, Clone)]
pub struct Vault {
    address: Address,
    roles: AccessControl,
    /// Dense ordered registry. Removal swaps the last entry into the freed
    /// slot, so enumeration order is not stable across removals.
    registry: Vec<RestakedAssetConfig>,
    /// Asset → slot in `registry`.
    slots: HashMap<Address, usize>,
    state: HashMap<Address, VaultAssetState>,
    deposits_open: bool,
    redemption_active: bool,
}

impl Vault {
    /// Create a vault. `address` is both the vault's ledger account and the
    /// share token id.
    pub fn new(address: Address, admin: Address) -> Self {
        Self {
            address,
            roles: AccessControl::with_admin(admin),
            registry: Vec::new(),
            slots: HashMap::new(),
            state: HashMap::new(),
            deposits_open: false,
            redemption_active: false,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Token id of the vault share (vETH).
    pub fn share_token(&self) -> Address {
        self.address
    }

    // -----------------------------------------------------------------------
    // Registry
    // -----------------------------------------------------------------------

    /// Approve a new LST with a fixed share ratio. Admin-only.
    ///
    /// # Errors
    /// `NotOwner`, `AlreadyRegistered` if the asset is present, and
    /// `InvalidParameter` for a zero ratio.
    pub fn add_approved_asset(
        &mut self,
        caller: &Address,
        asset: Address,
        share_ratio: u128,
    ) -> Result<(), VectorError> {
        self.roles.require(Role::Admin, caller)?;
        if self.slots.contains_key(&asset) {
            return Err(VectorError::AlreadyRegistered(format!(
                "restaked LST {}",
                asset
            )));
        }
        if share_ratio == 0 {
            return Err(VectorError::InvalidParameter(
                "share ratio must be non-zero".to_string(),
            ));
        }

        self.slots.insert(asset, self.registry.len());
        self.registry.push(RestakedAssetConfig { asset, share_ratio });
        self.state.entry(asset).or_default();
        info!(asset = %asset.short(), share_ratio, "Approved restaked LST");
        Ok(())
    }

    /// Remove an approved LST. Admin-only.
    ///
    /// The last registry entry moves into the removed slot; every other
    /// entry keeps its position. Bookkeeping for the asset is retained so a
    /// later re-registration sees its balances.
    pub fn remove_approved_asset(&mut self, caller: &Address, asset: &Address) -> Result<(), VectorError> {
        self.roles.require(Role::Admin, caller)?;
        let slot = self
            .slots
            .remove(asset)
            .ok_or_else(|| VectorError::NotRegistered(format!("restaked LST {}", asset)))?;

        self.registry.swap_remove(slot);
        if let Some(moved) = self.registry.get(slot) {
            self.slots.insert(moved.asset, slot);
        }
        info!(asset = %asset.short(), "Removed restaked LST");
        Ok(())
    }

    /// Asset at position `index` of the ordered registry.
    pub fn approved_asset_at(&self, index: usize) -> Option<Address> {
        self.registry.get(index).map(|c| c.asset)
    }

    /// All approved assets in registry order.
    pub fn approved_assets(&self) -> Vec<Address> {
        self.registry.iter().map(|c| c.asset).collect()
    }

    pub fn is_approved(&self, asset: &Address) -> bool {
        self.slots.contains_key(asset)
    }

    /// Share ratio of an approved asset.
    pub fn share_ratio(&self, asset: &Address) -> Option<u128> {
        self.slots.get(asset).map(|slot| self.registry[*slot].share_ratio)
    }

    fn require_approved(&self, asset: &Address) -> Result<u128, VectorError> {
        self.share_ratio(asset)
            .ok_or(VectorError::NotApproved(*asset))
    }

    // -----------------------------------------------------------------------
    // Administration
    // -----------------------------------------------------------------------

    /// Approve an external manager. Admin-only.
    pub fn add_approved_manager(&mut self, caller: &Address, manager: Address) -> Result<(), VectorError> {
        self.roles.grant(caller, Role::Manager, manager)?;
        info!(manager = %manager.short(), "Approved vault manager");
        Ok(())
    }

    /// Revoke an external manager. Admin-only.
    pub fn remove_approved_manager(&mut self, caller: &Address, manager: &Address) -> Result<(), VectorError> {
        self.roles.revoke(caller, Role::Manager, manager)?;
        Ok(())
    }

    pub fn is_manager(&self, who: &Address) -> bool {
        self.roles.has_role(Role::Manager, who)
    }

    /// Set or clear the deposit route for an approved asset. Admin-only.
    pub fn set_route(
        &mut self,
        caller: &Address,
        asset: &Address,
        route: Option<Address>,
    ) -> Result<(), VectorError> {
        self.roles.require(Role::Admin, caller)?;
        self.require_approved(asset)?;
        self.state.entry(*asset).or_default().route_to = route;
        info!(asset = %asset.short(), routed = route.is_some(), "Updated deposit route");
        Ok(())
    }

    /// Open deposits to everyone. Admin-only, one-way.
    pub fn open_deposits(&mut self, caller: &Address) -> Result<(), VectorError> {
        self.roles.require(Role::Admin, caller)?;
        self.deposits_open = true;
        info!("Vault deposits opened");
        Ok(())
    }

    /// Enable redemptions. Admin-only, one-way.
    pub fn set_redemption_active(&mut self, caller: &Address) -> Result<(), VectorError> {
        self.roles.require(Role::Admin, caller)?;
        self.redemption_active = true;
        info!("Vault redemptions activated");
        Ok(())
    }

    pub fn deposits_open(&self) -> bool {
        self.deposits_open
    }

    pub fn redemption_active(&self) -> bool {
        self.redemption_active
    }

    /// Whether `caller` may deposit right now.
    pub fn accepts_deposit_from(&self, caller: &Address) -> bool {
        self.deposits_open || self.roles.has_role(Role::Admin, caller)
    }

    // -----------------------------------------------------------------------
    // Deposit / redeem
    // -----------------------------------------------------------------------

    /// Shares minted for depositing `amount` of `asset`.
    pub fn preview_deposit(&self, asset: &Address, amount: u128) -> Result<u128, VectorError> {
        let ratio = self.require_approved(asset)?;
        mul_div(amount, ratio, RATIO_PRECISION)
    }

    /// Underlying paid for redeeming `shares` against `asset`.
    pub fn preview_redeem(&self, asset: &Address, shares: u128) -> Result<u128, VectorError> {
        let ratio = self.require_approved(asset)?;
        mul_div(shares, RATIO_PRECISION, ratio)
    }

    /// Deposit `amount` of an approved LST and mint shares to `recipient`.
    ///
    /// Funds stay in the vault unless a route is configured, in which case
    /// they are forwarded and counted as managed.
    ///
    /// # Errors
    /// `DepositsClosed` before deposits open (admin excepted), `NotApproved`,
    /// `ZeroAmount`, and `InsufficientBalance` if the caller lacks funds.
    pub fn deposit(
        &mut self,
        ledger: &mut dyn TokenLedger,
        caller: &Address,
        asset: &Address,
        recipient: &Address,
        amount: u128,
    ) -> Result<u128, VectorError> {
        if !self.accepts_deposit_from(caller) {
            return Err(VectorError::DepositsClosed);
        }
        let ratio = self.require_approved(asset)?;
        if amount == 0 {
            return Err(VectorError::ZeroAmount);
        }

        let shares = mul_div(amount, ratio, RATIO_PRECISION)?;
        let entry = self.state.get(asset).cloned().unwrap_or_default();
        let total_deposited = checked_add(entry.total_deposited, amount)?;
        let managed = match entry.route_to {
            Some(_) => checked_add(entry.managed, amount)?,
            None => entry.managed,
        };

        ledger.transfer(asset, caller, &self.address, amount)?;
        if let Some(route) = entry.route_to {
            ledger.transfer(asset, &self.address, &route, amount)?;
        }
        ledger.mint(&self.address, recipient, shares)?;

        let state = self.state.entry(*asset).or_default();
        state.total_deposited = total_deposited;
        state.managed = managed;

        info!(
            asset = %asset.short(),
            recipient = %recipient.short(),
            amount,
            shares,
            routed = entry.route_to.is_some(),
            "Vault deposit"
        );
        Ok(shares)
    }

    /// Burn `shares` from `caller` and pay the underlying to `recipient`.
    ///
    /// Payment comes from held funds only; managed funds must be returned by
    /// a manager first.
    ///
    /// # Errors
    /// `RedemptionInactive`, `NotApproved`, `ZeroAmount`, and
    /// `InsufficientBalance` if the caller lacks shares or the vault lacks
    /// held funds.
    pub fn redeem(
        &mut self,
        ledger: &mut dyn TokenLedger,
        caller: &Address,
        asset: &Address,
        recipient: &Address,
        shares: u128,
    ) -> Result<u128, VectorError> {
        if !self.redemption_active {
            return Err(VectorError::RedemptionInactive);
        }
        let ratio = self.require_approved(asset)?;
        if shares == 0 {
            return Err(VectorError::ZeroAmount);
        }

        let underlying = mul_div(shares, RATIO_PRECISION, ratio)?;
        let share_balance = ledger.balance_of(&self.address, caller);
        if share_balance < shares {
            return Err(VectorError::InsufficientBalance {
                requested: shares,
                available: share_balance,
            });
        }
        let held = self.held_balance(ledger, asset);
        if held < underlying {
            return Err(VectorError::InsufficientBalance {
                requested: underlying,
                available: held,
            });
        }

        ledger.burn(&self.address, caller, shares)?;
        ledger.transfer(asset, &self.address, recipient, underlying)?;

        let state = self.state.entry(*asset).or_default();
        state.total_deposited = state.total_deposited.saturating_sub(underlying);

        info!(
            asset = %asset.short(),
            recipient = %recipient.short(),
            shares,
            underlying,
            "Vault redemption"
        );
        Ok(underlying)
    }

    // -----------------------------------------------------------------------
    // External management
    // -----------------------------------------------------------------------

    /// Move `amount` of held funds to `to` on behalf of an approved manager.
    pub fn manage(
        &mut self,
        ledger: &mut dyn TokenLedger,
        caller: &Address,
        asset: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), VectorError> {
        self.roles.require(Role::Manager, caller)?;
        self.require_approved(asset)?;
        if amount == 0 {
            return Err(VectorError::ZeroAmount);
        }

        let managed = checked_add(self.managed_balance(asset), amount)?;
        ledger.transfer(asset, &self.address, to, amount)?;
        self.state.entry(*asset).or_default().managed = managed;

        info!(asset = %asset.short(), to = %to.short(), amount, "Vault funds managed");
        Ok(())
    }

    /// Return `amount` from a manager closing out its position.
    ///
    /// The manager's position is considered fully closed: the managed
    /// balance resets to zero and `amount` (principal plus realised yield)
    /// becomes held.
    pub fn add_managed(
        &mut self,
        ledger: &mut dyn TokenLedger,
        caller: &Address,
        asset: &Address,
        amount: u128,
    ) -> Result<(), VectorError> {
        self.roles.require(Role::Manager, caller)?;
        self.require_approved(asset)?;

        ledger.transfer(asset, caller, &self.address, amount)?;
        self.state.entry(*asset).or_default().managed = 0;

        info!(asset = %asset.short(), amount, "Managed funds returned");
        Ok(())
    }

    /// Reconcile deposited principal with the actual balance.
    ///
    /// Absorbs donations and externally generated yield without minting new
    /// shares. Permissionless. `total_deposited` never moves backward here.
    pub fn update_deposit(&mut self, ledger: &dyn TokenLedger, asset: &Address) -> Result<u128, VectorError> {
        self.require_approved(asset)?;
        let current = self.current_balance(ledger, asset)?;
        let state = self.state.entry(*asset).or_default();
        if current > state.total_deposited {
            debug!(
                asset = %asset.short(),
                absorbed = current - state.total_deposited,
                "Reconciled vault deposit"
            );
            state.total_deposited = current;
        }
        Ok(state.total_deposited)
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    /// Funds of `asset` held directly by the vault.
    pub fn held_balance(&self, ledger: &dyn TokenLedger, asset: &Address) -> u128 {
        ledger.balance_of(asset, &self.address)
    }

    /// Funds of `asset` forwarded to a route or manager.
    pub fn managed_balance(&self, asset: &Address) -> u128 {
        self.state.get(asset).map(|s| s.managed).unwrap_or(0)
    }

    /// Held plus managed.
    pub fn current_balance(&self, ledger: &dyn TokenLedger, asset: &Address) -> Result<u128, VectorError> {
        checked_add(self.held_balance(ledger, asset), self.managed_balance(asset))
    }

    pub fn total_deposited(&self, asset: &Address) -> u128 {
        self.state.get(asset).map(|s| s.total_deposited).unwrap_or(0)
    }

    pub fn route_of(&self, asset: &Address) -> Option<Address> {
        self.state.get(asset).and_then(|s| s.route_to)
    }

    /// Outstanding vault shares.
    pub fn total_shares(&self, ledger: &dyn TokenLedger) -> u128 {
        ledger.total_supply(&self.address)
    }

    /// Per-asset view of every approved asset, in registry order.
    pub fn asset_views(&self, ledger: &dyn TokenLedger) -> Vec<VaultAssetView> {
        self.registry
            .iter()
            .map(|config| {
                let held = self.held_balance(ledger, &config.asset);
                let managed = self.managed_balance(&config.asset);
                VaultAssetView {
                    asset: config.asset,
                    share_ratio: config.share_ratio,
                    held,
                    managed,
                    current_balance: held.saturating_add(managed),
                    total_deposited: self.total_deposited(&config.asset),
                    route_to: self.route_of(&config.asset),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vector_core::{ErrorKind, InMemoryLedger};

    const ONE: u128 = 1_000_000_000_000_000_000;
    const RATIO_0_9: u128 = 900_000_000_000_000_000;

    struct Fixture {
        ledger: InMemoryLedger,
        vault: Vault,
        owner: Address,
        user: Address,
        manager: Address,
        route: Address,
        weth: Address,
    }

    fn setup() -> Fixture {
        let owner = Address::from_label("owner");
        let user = Address::from_label("user");
        let manager = Address::from_label("manager");
        let route = Address::from_label("route");
        let weth = Address::from_label("weth");
        let mut ledger = InMemoryLedger::new();
        ledger.mint(&weth, &owner, 10 * ONE).unwrap();
        ledger.mint(&weth, &user, 10 * ONE).unwrap();
        ledger.mint(&weth, &manager, 10 * ONE).unwrap();
        let mut vault = Vault::new(Address::from_label("veth"), owner);
        vault.add_approved_manager(&owner, manager).unwrap();
        Fixture {
            ledger,
            vault,
            owner,
            user,
            manager,
            route,
            weth,
        }
    }

    fn assert_balance_invariant(f: &Fixture) {
        let held = f.vault.held_balance(&f.ledger, &f.weth);
        let managed = f.vault.managed_balance(&f.weth);
        assert_eq!(
            f.vault.current_balance(&f.ledger, &f.weth).unwrap(),
            held + managed
        );
    }

    #[test]
    fn test_non_owner_cannot_deposit_before_open() {
        let mut f = setup();
        f.vault.add_approved_asset(&f.owner, f.weth, RATIO_0_9).unwrap();
        let err = f
            .vault
            .deposit(&mut f.ledger, &f.user, &f.weth, &f.owner, ONE)
            .unwrap_err();
        assert_eq!(err, VectorError::DepositsClosed);
    }

    #[test]
    fn test_deposit_unapproved_asset() {
        let mut f = setup();
        let err = f
            .vault
            .deposit(&mut f.ledger, &f.owner, &f.weth, &f.owner, ONE)
            .unwrap_err();
        assert_eq!(err, VectorError::NotApproved(f.weth));
    }

    #[test]
    fn test_deposit_zero() {
        let mut f = setup();
        f.vault.add_approved_asset(&f.owner, f.weth, RATIO_0_9).unwrap();
        let err = f
            .vault
            .deposit(&mut f.ledger, &f.owner, &f.weth, &f.owner, 0)
            .unwrap_err();
        assert_eq!(err, VectorError::ZeroAmount);
    }

    #[test]
    fn test_user_deposit_after_open() {
        let mut f = setup();
        f.vault.add_approved_asset(&f.owner, f.weth, RATIO_0_9).unwrap();
        f.vault.open_deposits(&f.owner).unwrap();
        let shares = f
            .vault
            .deposit(&mut f.ledger, &f.user, &f.weth, &f.owner, ONE)
            .unwrap();
        assert_eq!(shares, RATIO_0_9);
    }

    #[test]
    fn test_deposit_without_route() {
        let mut f = setup();
        f.vault.add_approved_asset(&f.owner, f.weth, RATIO_0_9).unwrap();
        f.vault
            .deposit(&mut f.ledger, &f.owner, &f.weth, &f.owner, ONE)
            .unwrap();

        let veth = f.vault.share_token();
        assert_eq!(f.ledger.balance_of(&veth, &f.owner), RATIO_0_9);
        assert_eq!(f.vault.total_shares(&f.ledger), RATIO_0_9);
        assert_eq!(f.vault.managed_balance(&f.weth), 0);
        assert_eq!(f.vault.total_deposited(&f.weth), ONE);
        assert_eq!(f.vault.held_balance(&f.ledger, &f.weth), ONE);
        assert_balance_invariant(&f);
    }

    #[test]
    fn test_deposit_with_route() {
        let mut f = setup();
        f.vault.add_approved_asset(&f.owner, f.weth, RATIO_0_9).unwrap();
        f.vault.set_route(&f.owner, &f.weth, Some(f.route)).unwrap();
        f.vault
            .deposit(&mut f.ledger, &f.owner, &f.weth, &f.owner, ONE)
            .unwrap();

        let veth = f.vault.share_token();
        assert_eq!(f.ledger.balance_of(&veth, &f.owner), RATIO_0_9);
        assert_eq!(f.vault.managed_balance(&f.weth), ONE);
        assert_eq!(f.vault.total_deposited(&f.weth), ONE);
        assert_eq!(f.vault.held_balance(&f.ledger, &f.weth), 0);
        assert_eq!(f.ledger.balance_of(&f.weth, &f.route), ONE);
        assert_balance_invariant(&f);
    }

    #[test]
    fn test_redeem_inactive() {
        let mut f = setup();
        let err = f
            .vault
            .redeem(&mut f.ledger, &f.owner, &f.weth, &f.owner, 0)
            .unwrap_err();
        assert_eq!(err, VectorError::RedemptionInactive);
    }

    #[test]
    fn test_redeem_not_approved() {
        let mut f = setup();
        f.vault.set_redemption_active(&f.owner).unwrap();
        let vec = Address::from_label("vec");
        let err = f
            .vault
            .redeem(&mut f.ledger, &f.owner, &vec, &f.owner, 0)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotRegistered);
    }

    #[test]
    fn test_redeem_more_than_held_shares() {
        let mut f = setup();
        f.vault.add_approved_asset(&f.owner, f.weth, RATIO_0_9).unwrap();
        f.vault
            .deposit(&mut f.ledger, &f.owner, &f.weth, &f.owner, ONE)
            .unwrap();
        f.vault.set_redemption_active(&f.owner).unwrap();
        let err = f
            .vault
            .redeem(&mut f.ledger, &f.owner, &f.weth, &f.owner, ONE + ONE / 10)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAmount);
        assert_eq!(f.vault.total_deposited(&f.weth), ONE);
    }

    #[test]
    fn test_partial_redeem() {
        let mut f = setup();
        f.vault.add_approved_asset(&f.owner, f.weth, RATIO_0_9).unwrap();
        f.vault
            .deposit(&mut f.ledger, &f.owner, &f.weth, &f.owner, ONE)
            .unwrap();
        f.vault.set_redemption_active(&f.owner).unwrap();

        let paid = f
            .vault
            .redeem(&mut f.ledger, &f.owner, &f.weth, &f.owner, 450_000_000_000_000_000)
            .unwrap();
        assert_eq!(paid, ONE / 2);

        let veth = f.vault.share_token();
        assert_eq!(f.ledger.balance_of(&veth, &f.owner), 450_000_000_000_000_000);
        assert_eq!(f.vault.total_shares(&f.ledger), 450_000_000_000_000_000);
        assert_eq!(f.vault.managed_balance(&f.weth), 0);
        assert_eq!(f.vault.total_deposited(&f.weth), ONE / 2);
        assert_eq!(f.vault.held_balance(&f.ledger, &f.weth), ONE / 2);
        assert_balance_invariant(&f);
    }

    #[test]
    fn test_deposit_redeem_round_trip() {
        let mut f = setup();
        f.vault.add_approved_asset(&f.owner, f.weth, RATIO_0_9).unwrap();
        f.vault.set_redemption_active(&f.owner).unwrap();
        let before = f.ledger.balance_of(&f.weth, &f.owner);

        let shares = f
            .vault
            .deposit(&mut f.ledger, &f.owner, &f.weth, &f.owner, 3 * ONE)
            .unwrap();
        let paid = f
            .vault
            .redeem(&mut f.ledger, &f.owner, &f.weth, &f.owner, shares)
            .unwrap();

        assert_eq!(paid, 3 * ONE);
        assert_eq!(f.ledger.balance_of(&f.weth, &f.owner), before);
        assert_eq!(f.vault.total_deposited(&f.weth), 0);
        assert_eq!(f.vault.total_shares(&f.ledger), 0);
    }

    #[test]
    fn test_update_deposit_absorbs_donation() {
        let mut f = setup();
        f.vault.add_approved_asset(&f.owner, f.weth, RATIO_0_9).unwrap();
        f.vault
            .deposit(&mut f.ledger, &f.owner, &f.weth, &f.owner, ONE)
            .unwrap();
        let vault_addr = f.vault.address();
        f.ledger
            .transfer(&f.weth, &f.owner, &vault_addr, ONE / 2)
            .unwrap();

        assert_eq!(f.vault.total_deposited(&f.weth), ONE);
        assert_eq!(
            f.vault.current_balance(&f.ledger, &f.weth).unwrap(),
            ONE + ONE / 2
        );

        let total = f.vault.update_deposit(&f.ledger, &f.weth).unwrap();
        assert_eq!(total, ONE + ONE / 2);
        assert_eq!(f.vault.total_deposited(&f.weth), ONE + ONE / 2);
        assert_eq!(f.vault.total_shares(&f.ledger), RATIO_0_9);
    }

    #[test]
    fn test_update_deposit_with_managed_funds() {
        let mut f = setup();
        f.vault.add_approved_asset(&f.owner, f.weth, RATIO_0_9).unwrap();
        f.vault
            .deposit(&mut f.ledger, &f.owner, &f.weth, &f.owner, ONE)
            .unwrap();
        f.vault
            .manage(&mut f.ledger, &f.manager, &f.weth, &f.user, ONE)
            .unwrap();
        let vault_addr = f.vault.address();
        f.ledger
            .transfer(&f.weth, &f.owner, &vault_addr, ONE / 2)
            .unwrap();

        assert_eq!(
            f.vault.current_balance(&f.ledger, &f.weth).unwrap(),
            ONE + ONE / 2
        );
        f.vault.update_deposit(&f.ledger, &f.weth).unwrap();
        assert_eq!(f.vault.total_deposited(&f.weth), ONE + ONE / 2);
        assert_balance_invariant(&f);
    }

    #[test]
    fn test_update_deposit_never_decreases() {
        let mut f = setup();
        f.vault.add_approved_asset(&f.owner, f.weth, RATIO_0_9).unwrap();
        f.vault
            .deposit(&mut f.ledger, &f.owner, &f.weth, &f.owner, ONE)
            .unwrap();
        f.vault
            .manage(&mut f.ledger, &f.manager, &f.weth, &f.manager, ONE)
            .unwrap();
        // Manager returns less than it took.
        f.vault
            .add_managed(&mut f.ledger, &f.manager, &f.weth, ONE / 2)
            .unwrap();
        f.vault.update_deposit(&f.ledger, &f.weth).unwrap();
        assert_eq!(f.vault.total_deposited(&f.weth), ONE);
    }

    #[test]
    fn test_add_asset_requires_owner() {
        let mut f = setup();
        let err = f
            .vault
            .add_approved_asset(&f.user, f.weth, RATIO_0_9)
            .unwrap_err();
        assert_eq!(err, VectorError::NotOwner(f.user));
    }

    #[test]
    fn test_add_asset_twice() {
        let mut f = setup();
        f.vault.add_approved_asset(&f.owner, f.weth, RATIO_0_9).unwrap();
        let err = f
            .vault
            .add_approved_asset(&f.owner, f.weth, RATIO_0_9)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyRegistered);
    }

    #[test]
    fn test_add_keeps_order() {
        let mut f = setup();
        let lst = Address::from_label("lst");
        f.vault.add_approved_asset(&f.owner, f.weth, RATIO_0_9).unwrap();
        f.vault.add_approved_asset(&f.owner, lst, ONE).unwrap();
        assert_eq!(f.vault.approved_asset_at(0), Some(f.weth));
        assert_eq!(f.vault.approved_asset_at(1), Some(lst));
    }

    #[test]
    fn test_remove_requires_owner() {
        let mut f = setup();
        let err = f.vault.remove_approved_asset(&f.user, &f.weth).unwrap_err();
        assert_eq!(err, VectorError::NotOwner(f.user));
    }

    #[test]
    fn test_remove_unregistered() {
        let mut f = setup();
        let err = f.vault.remove_approved_asset(&f.owner, &f.weth).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotRegistered);
    }

    #[test]
    fn test_remove_swaps_last_into_slot() {
        let mut f = setup();
        let lst = Address::from_label("lst");
        let lst2 = Address::from_label("lst2");
        f.vault.add_approved_asset(&f.owner, f.weth, RATIO_0_9).unwrap();
        f.vault.add_approved_asset(&f.owner, lst, ONE).unwrap();
        f.vault
            .add_approved_asset(&f.owner, lst2, 1_100_000_000_000_000_000)
            .unwrap();

        f.vault.remove_approved_asset(&f.owner, &lst).unwrap();

        assert_eq!(f.vault.approved_asset_at(0), Some(f.weth));
        assert_eq!(f.vault.approved_asset_at(1), Some(lst2));
        assert_eq!(f.vault.approved_asset_at(2), None);
        assert!(!f.vault.is_approved(&lst));
        // The moved entry is still addressable through the index map.
        assert_eq!(f.vault.share_ratio(&lst2), Some(1_100_000_000_000_000_000));
    }

    #[test]
    fn test_remove_last_entry() {
        let mut f = setup();
        let lst = Address::from_label("lst");
        f.vault.add_approved_asset(&f.owner, f.weth, RATIO_0_9).unwrap();
        f.vault.add_approved_asset(&f.owner, lst, ONE).unwrap();
        f.vault.remove_approved_asset(&f.owner, &lst).unwrap();
        assert_eq!(f.vault.approved_assets(), vec![f.weth]);
        assert_eq!(f.vault.share_ratio(&f.weth), Some(RATIO_0_9));
    }

    #[test]
    fn test_manage_requires_manager() {
        let mut f = setup();
        let err = f
            .vault
            .manage(&mut f.ledger, &f.owner, &f.weth, &f.owner, ONE)
            .unwrap_err();
        assert_eq!(err, VectorError::NotManager(f.owner));
    }

    #[test]
    fn test_manage_unapproved_asset() {
        let mut f = setup();
        let err = f
            .vault
            .manage(&mut f.ledger, &f.manager, &f.weth, &f.owner, ONE)
            .unwrap_err();
        assert_eq!(err, VectorError::NotApproved(f.weth));
    }

    #[test]
    fn test_manage_moves_held_to_managed() {
        let mut f = setup();
        f.vault.add_approved_asset(&f.owner, f.weth, RATIO_0_9).unwrap();
        f.vault
            .deposit(&mut f.ledger, &f.owner, &f.weth, &f.owner, ONE)
            .unwrap();
        assert_eq!(f.vault.managed_balance(&f.weth), 0);

        f.vault
            .manage(&mut f.ledger, &f.manager, &f.weth, &f.manager, ONE)
            .unwrap();
        assert_eq!(f.vault.managed_balance(&f.weth), ONE);
        assert_eq!(f.vault.current_balance(&f.ledger, &f.weth).unwrap(), ONE);
        assert_balance_invariant(&f);
    }

    #[test]
    fn test_add_managed_requires_manager() {
        let mut f = setup();
        let err = f
            .vault
            .add_managed(&mut f.ledger, &f.owner, &f.weth, ONE)
            .unwrap_err();
        assert_eq!(err, VectorError::NotManager(f.owner));
    }

    #[test]
    fn test_add_managed_unapproved_asset() {
        let mut f = setup();
        let err = f
            .vault
            .add_managed(&mut f.ledger, &f.manager, &f.weth, ONE)
            .unwrap_err();
        assert_eq!(err, VectorError::NotApproved(f.weth));
    }

    #[test]
    fn test_add_managed_returns_funds_with_yield() {
        let mut f = setup();
        f.vault.add_approved_asset(&f.owner, f.weth, RATIO_0_9).unwrap();
        f.vault
            .deposit(&mut f.ledger, &f.owner, &f.weth, &f.owner, ONE)
            .unwrap();
        f.vault
            .manage(&mut f.ledger, &f.manager, &f.weth, &f.manager, ONE)
            .unwrap();

        f.vault
            .add_managed(&mut f.ledger, &f.manager, &f.weth, ONE + ONE / 2)
            .unwrap();
        assert_eq!(f.vault.managed_balance(&f.weth), 0);
        assert_eq!(
            f.vault.current_balance(&f.ledger, &f.weth).unwrap(),
            ONE + ONE / 2
        );
        assert_balance_invariant(&f);
    }
}
