// crates/vector-core/src/error.rs

use thiserror::Error;

use crate::address::Address;

/// Coarse error taxonomy shared by every protocol component.
///
/// Callers that only need to know *why* an operation was rejected (wrong
/// role, closed window, slippage, ...) switch on the kind; the specific
/// `VectorError` variant carries the details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller lacks the admin, minter, manager or component role.
    Unauthorized,
    /// Asset, allocation or bond market is not registered.
    NotRegistered,
    /// Asset or allocation is already registered.
    AlreadyRegistered,
    /// Zero, too small, or more than the available balance.
    InvalidAmount,
    /// Deposits/redemptions not opened, or claim beyond what has vested.
    WindowClosed,
    /// Bond price moved above the caller's maximum.
    SlippageExceeded,
    /// Max payout, max debt, or aggregate vesting cap breached.
    CapExceeded,
    /// Administrative parameter outside its allowed range.
    InvalidParameter,
    /// Fixed-point overflow or division by zero.
    Arithmetic,
}

/// Protocol-wide error type for the Vector Protocol.
///
/// Every failure is local and synchronous: the operation that returned it
/// applied no state change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VectorError {
    /// Caller is not the component admin.
    #[error("Caller {0} is not the owner")]
    NotOwner(Address),

    /// Caller is not an approved vault manager.
    #[error("Caller {0} is not an approved manager")]
    NotManager(Address),

    /// Caller is not an approved treasury minter.
    #[error("Caller {0} is not an approved minter")]
    NotApprovedMinter(Address),

    /// Caller is not the component allowed to trigger this operation.
    #[error("Caller {0} is not authorized for this operation")]
    Unauthorized(Address),

    /// Asset is not an approved vault asset.
    #[error("Asset {0} is not an approved restaked LST")]
    NotApproved(Address),

    /// Registry lookup failed.
    #[error("Not registered: {0}")]
    NotRegistered(String),

    /// Registry insert collided with an existing entry.
    #[error("Already registered: {0}")]
    AlreadyRegistered(String),

    /// Vesting terms already exist for this address.
    #[error("Vesting terms already exist for {0}")]
    AlreadyExists(Address),

    /// One-time setup has already been performed.
    #[error("Already initialized: {0}")]
    AlreadyInitialized(String),

    /// Component used before its one-time setup.
    #[error("Not initialized: {0}")]
    NotInitialized(String),

    /// Amount must be non-zero.
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    /// Holder's balance is below the requested amount.
    #[error("Insufficient balance: requested {requested} but only {available} available")]
    InsufficientBalance { requested: u128, available: u128 },

    /// Bond payout below the minimum order size.
    #[error("Bond too small: payout {payout} is below the minimum of {minimum}")]
    BondTooSmall { payout: u128, minimum: u128 },

    /// Public deposits have not been opened.
    #[error("Deposits not open")]
    DepositsClosed,

    /// Redemptions have not been activated.
    #[error("Redemptions not active")]
    RedemptionInactive,

    /// Claim exceeds the amount vested so far.
    #[error("Claim more than vested: requested {requested} but only {redeemable} redeemable")]
    ClaimExceedsVested { requested: u128, redeemable: u128 },

    /// Current bond price exceeds the caller's maximum.
    #[error("Slippage limit: price {price} is above max price {max_price}")]
    PriceTooHigh { price: u128, max_price: u128 },

    /// Bond payout exceeds the per-deposit cap.
    #[error("Bond too large: payout {payout} exceeds max payout {max_payout}")]
    MaxPayoutExceeded { payout: u128, max_payout: u128 },

    /// Outstanding debt is at capacity.
    #[error("Max capacity reached: debt {debt} exceeds max debt {max_debt}")]
    MaxDebtExceeded { debt: u128, max_debt: u128 },

    /// Aggregate vesting allocation would exceed its cap.
    #[error("Cannot allocate more than {cap}: already allocated {allocated}, requested {requested}")]
    AllocationCapExceeded { allocated: u128, requested: u128, cap: u128 },

    /// Administrative parameter outside its allowed range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Fixed-point multiplication or addition overflowed.
    #[error("Arithmetic overflow")]
    Overflow,

    /// Fixed-point division by zero.
    #[error("Division by zero")]
    DivisionByZero,
}

impl VectorError {
    /// Map this error to its taxonomy kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VectorError::NotOwner(_)
            | VectorError::NotManager(_)
            | VectorError::NotApprovedMinter(_)
            | VectorError::Unauthorized(_) => ErrorKind::Unauthorized,
            VectorError::NotApproved(_) | VectorError::NotRegistered(_) => {
                ErrorKind::NotRegistered
            }
            VectorError::AlreadyRegistered(_)
            | VectorError::AlreadyExists(_)
            | VectorError::AlreadyInitialized(_) => ErrorKind::AlreadyRegistered,
            VectorError::ZeroAmount
            | VectorError::InsufficientBalance { .. }
            | VectorError::BondTooSmall { .. } => ErrorKind::InvalidAmount,
            VectorError::DepositsClosed
            | VectorError::RedemptionInactive
            | VectorError::NotInitialized(_)
            | VectorError::ClaimExceedsVested { .. } => ErrorKind::WindowClosed,
            VectorError::PriceTooHigh { .. } => ErrorKind::SlippageExceeded,
            VectorError::MaxPayoutExceeded { .. }
            | VectorError::MaxDebtExceeded { .. }
            | VectorError::AllocationCapExceeded { .. } => ErrorKind::CapExceeded,
            VectorError::InvalidParameter(_) => ErrorKind::InvalidParameter,
            VectorError::Overflow | VectorError::DivisionByZero => ErrorKind::Arithmetic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_errors_are_unauthorized() {
        let who = Address::from_label("mallory");
        assert_eq!(VectorError::NotOwner(who).kind(), ErrorKind::Unauthorized);
        assert_eq!(VectorError::NotManager(who).kind(), ErrorKind::Unauthorized);
        assert_eq!(
            VectorError::NotApprovedMinter(who).kind(),
            ErrorKind::Unauthorized
        );
    }

    #[test]
    fn test_window_errors() {
        assert_eq!(VectorError::DepositsClosed.kind(), ErrorKind::WindowClosed);
        assert_eq!(VectorError::RedemptionInactive.kind(), ErrorKind::WindowClosed);
        assert_eq!(
            VectorError::ClaimExceedsVested {
                requested: 2,
                redeemable: 1
            }
            .kind(),
            ErrorKind::WindowClosed
        );
    }

    #[test]
    fn test_cap_errors() {
        let err = VectorError::MaxDebtExceeded {
            debt: 10,
            max_debt: 5,
        };
        assert_eq!(err.kind(), ErrorKind::CapExceeded);
        assert_eq!(
            VectorError::AllocationCapExceeded {
                allocated: 190_000,
                requested: 11_000,
                cap: 200_000
            }
            .kind(),
            ErrorKind::CapExceeded
        );
    }

    #[test]
    fn test_slippage_error_message() {
        let err = VectorError::PriceTooHigh {
            price: 12,
            max_price: 10,
        };
        assert_eq!(err.kind(), ErrorKind::SlippageExceeded);
        assert!(err.to_string().contains("max price 10"));
    }
}
