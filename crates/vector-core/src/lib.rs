// crates/vector-core/src/lib.rs
//
// vector-core: Core types, traits, and fixed-point helpers for the Vector Protocol.
//
// This is the leaf crate that the protocol components and the simulator depend
// on. It defines account identities, the error taxonomy, the token ledger
// collaborator, role tables, and the shared index/ratio arithmetic.

pub mod access;
pub mod address;
pub mod error;
pub mod ledger;
pub mod math;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use vector_core::Address;`

pub use access::{AccessControl, Role};
pub use address::Address;
pub use error::{ErrorKind, VectorError};
pub use ledger::InMemoryLedger;
pub use math::{
    from_index_adjusted, mul_div, to_index_adjusted, INDEX_PRECISION, RATIO_PRECISION,
    VEC_DECIMALS, VEC_UNIT,
};
pub use traits::{AssetValuation, TokenLedger};
