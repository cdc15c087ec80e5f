// crates/vector-core/src/access.rs
//
// Capability tables for role-gated operations.
//
// Each component owns one `AccessControl` mapping a role to the set of
// identities holding it. Mutating operations check the table first and fail
// with the role-specific error before touching any state.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::address::Address;
use crate::error::VectorError;

/// Roles recognised by protocol components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Component owner: registry, terms and switch administration.
    Admin,
    /// May ask the treasury to mint VEC.
    Minter,
    /// May move vault funds to and from external positions.
    Manager,
}

/// Role → authorised identities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessControl {
    members: HashMap<Role, BTreeSet<Address>>,
}

impl AccessControl {
    /// Create a table with `admin` as the sole admin.
    pub fn with_admin(admin: Address) -> Self {
        let mut table = Self::default();
        table.members.entry(Role::Admin).or_default().insert(admin);
        table
    }

    /// Whether `who` holds `role`.
    pub fn has_role(&self, role: Role, who: &Address) -> bool {
        self.members
            .get(&role)
            .map(|set| set.contains(who))
            .unwrap_or(false)
    }

    /// Fail with the role's error unless `who` holds `role`.
    pub fn require(&self, role: Role, who: &Address) -> Result<(), VectorError> {
        if self.has_role(role, who) {
            return Ok(());
        }
        Err(match role {
            Role::Admin => VectorError::NotOwner(*who),
            Role::Minter => VectorError::NotApprovedMinter(*who),
            Role::Manager => VectorError::NotManager(*who),
        })
    }

    /// Grant `role` to `who`. Admin-only.
    ///
    /// Returns `false` if `who` already held the role.
    pub fn grant(&mut self, caller: &Address, role: Role, who: Address) -> Result<bool, VectorError> {
        self.require(Role::Admin, caller)?;
        if who.is_zero() {
            return Err(VectorError::InvalidParameter(
                "cannot grant a role to the zero address".to_string(),
            ));
        }
        Ok(self.members.entry(role).or_default().insert(who))
    }

    /// Revoke `role` from `who`. Admin-only.
    ///
    /// Returns `false` if `who` did not hold the role.
    pub fn revoke(&mut self, caller: &Address, role: Role, who: &Address) -> Result<bool, VectorError> {
        self.require(Role::Admin, caller)?;
        Ok(self
            .members
            .get_mut(&role)
            .map(|set| set.remove(who))
            .unwrap_or(false))
    }

    /// All identities holding `role`, in address order.
    pub fn members(&self, role: Role) -> Vec<Address> {
        self.members
            .get(&role)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}
