// crates/vector-core/src/math.rs
//
// Fixed-point helpers shared by every component.
//
// Amounts are integer base units held in u128. VEC has 9 decimals, vault
// shares and LSTs have 18. The rebase index uses a 1e9 base, vault share
// ratios use 1e18. All helpers are checked and never panic.

use crate::error::VectorError;

/// Base of the rebase index: an index of 1e9 means 1 sVEC per index-adjusted unit.
pub const INDEX_PRECISION: u128 = 1_000_000_000;

/// Precision of 18-decimal fixed-point ratios (vault share ratios, debt ratio).
pub const RATIO_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Number of decimals of the VEC payout token.
pub const VEC_DECIMALS: u32 = 9;

/// One whole VEC in base units.
pub const VEC_UNIT: u128 = 1_000_000_000;

/// Compute `floor(a * b / denominator)` without overflowing on the
/// intermediate product when the result itself fits.
///
/// Splits `a` into quotient and remainder by `denominator`, so only
/// `(a % denominator) * b` has to fit in 128 bits.
///
/// # Errors
/// `DivisionByZero` if `denominator == 0`; `Overflow` if the result or the
/// remainder product does not fit.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128, VectorError> {
    if denominator == 0 {
        return Err(VectorError::DivisionByZero);
    }
    let whole = (a / denominator)
        .checked_mul(b)
        .ok_or(VectorError::Overflow)?;
    let partial = (a % denominator)
        .checked_mul(b)
        .ok_or(VectorError::Overflow)?
        / denominator;
    whole.checked_add(partial).ok_or(VectorError::Overflow)
}

/// Convert a visible amount into index-adjusted units at `index`.
///
/// `to_index_adjusted(x) = x * 1e9 / index`
pub fn to_index_adjusted(amount: u128, index: u128) -> Result<u128, VectorError> {
    mul_div(amount, INDEX_PRECISION, index)
}

/// Convert index-adjusted units back into a visible amount at `index`.
///
/// `from_index_adjusted(x) = x * index / 1e9`
pub fn from_index_adjusted(amount: u128, index: u128) -> Result<u128, VectorError> {
    mul_div(amount, index, INDEX_PRECISION)
}

/// Checked addition reporting `Overflow`.
pub fn checked_add(a: u128, b: u128) -> Result<u128, VectorError> {
    a.checked_add(b).ok_or(VectorError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_basic() {
        assert_eq!(mul_div(10, 3, 4).unwrap(), 7);
        assert_eq!(mul_div(0, 3, 4).unwrap(), 0);
    }

    #[test]
    fn test_mul_div_division_by_zero() {
        assert_eq!(mul_div(1, 1, 0), Err(VectorError::DivisionByZero));
    }

    #[test]
    fn test_mul_div_large_intermediate() {
        // 1,000 ETH * 0.9 ratio: the naive product is 9e38 and would overflow.
        let amount = 1_000 * RATIO_PRECISION;
        let ratio = 900_000_000_000_000_000;
        assert_eq!(
            mul_div(amount, ratio, RATIO_PRECISION).unwrap(),
            900 * RATIO_PRECISION
        );
    }

    #[test]
    fn test_mul_div_overflow() {
        assert_eq!(mul_div(u128::MAX, 2, 1), Err(VectorError::Overflow));
    }

    #[test]
    fn test_index_identity_at_base() {
        assert_eq!(to_index_adjusted(12_345, INDEX_PRECISION).unwrap(), 12_345);
        assert_eq!(from_index_adjusted(12_345, INDEX_PRECISION).unwrap(), 12_345);
    }

    #[test]
    fn test_index_round_trip_truncates_only() {
        let index = 1_005_000_000; // one 0.5% rebase
        for x in [1u128, 999, 1_000 * VEC_UNIT, 123_456_789_012] {
            let adjusted = to_index_adjusted(x, index).unwrap();
            let back = from_index_adjusted(adjusted, index).unwrap();
            assert!(back <= x);
            // Truncation loses at most one index step.
            assert!(x - back <= index / INDEX_PRECISION + 1);
        }
    }

    #[test]
    fn test_zero_index_rejected() {
        assert_eq!(to_index_adjusted(1, 0), Err(VectorError::DivisionByZero));
    }
}
