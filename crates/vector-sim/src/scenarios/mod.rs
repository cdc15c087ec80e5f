// crates/vector-sim/src/scenarios/mod.rs

pub mod bond;
pub mod rebase;
