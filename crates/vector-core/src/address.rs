// crates/vector-core/src/address.rs

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A 32-byte account identity on the external ledger.
///
/// Every participant is an `Address`: end users, external managers and
/// routers, and the protocol components themselves (the vault, treasury,
/// staking and bonding components each hold balances under their own address).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// The all-zero address. Never a valid holder or role member.
    pub const ZERO: Address = Address([0u8; 32]);

    /// Derive a deterministic address from a human-readable label.
    ///
    /// The address is the SHA-256 digest of the label, so the same label
    /// always yields the same identity across runs.
    ///
    /// # Example
    /// ```
    /// use vector_core::Address;
    /// assert_eq!(Address::from_label("treasury"), Address::from_label("treasury"));
    /// assert_ne!(Address::from_label("treasury"), Address::from_label("staking"));
    /// ```
    pub fn from_label(label: &str) -> Self {
        let digest = Sha256::digest(label.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Raw bytes of the address.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Abbreviated hex form (first four bytes) for log lines and tables.
    pub fn short(&self) -> String {
        let head: String = self.0[..4].iter().map(|b| format!("{:02x}", b)).collect();
        format!("0x{}…", head)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}
