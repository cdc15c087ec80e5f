// crates/vector-sim/src/scenarios/bond.rs
//
// Repeated bond purchases against one market.
//
// Each round buys one bond, then advances the clock in fixed steps until
// debt decay has brought the price back down to the target (or the horizon
// runs out). The report shows how far each purchase moved the price and how
// long the market took to recover.

use serde::Serialize;
use tabled::Tabled;
use tracing::{info, warn};

use vector_core::{mul_div, Address, TokenLedger, VectorError, RATIO_PRECISION, VEC_DECIMALS};
use vector_protocol::{FixedPriceValuation, PrincipalKind, Protocol, ProtocolSnapshot};

use crate::config::{parse_units, SimConfig, PRINCIPAL_DECIMALS};
use crate::error::SimError;
use crate::output::{format_duration, format_time, format_units};

/// One simulated purchase.
#[derive(Debug, Clone, Serialize)]
pub struct BondRound {
    pub round: u32,
    pub time: u64,
    pub price_before: u128,
    pub price_after: u128,
    pub payout: u128,
    pub debt_after: u128,
    /// Seconds until the price reached the target, if it did.
    pub recovery: Option<u64>,
    /// VEC redeemed at the end of the round.
    pub redeemed: u128,
}

/// Why the run stopped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    AllRounds,
    Halted { round: u32, reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct BondReport {
    pub kind: PrincipalKind,
    pub rounds: Vec<BondRound>,
    pub completion: Completion,
    pub bonder_staked: u128,
    pub final_state: ProtocolSnapshot,
}

/// Table row for a `BondRound`.
#[derive(Debug, Tabled)]
pub struct BondRow {
    #[tabled(rename = "Round")]
    round: u32,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Price before")]
    price_before: String,
    #[tabled(rename = "Price after")]
    price_after: String,
    #[tabled(rename = "Payout (VEC)")]
    payout: String,
    #[tabled(rename = "Debt (VEC)")]
    debt: String,
    #[tabled(rename = "Recovery")]
    recovery: String,
}

impl BondRow {
    pub fn from_round(round: &BondRound, start_timestamp: i64) -> Self {
        Self {
            round: round.round,
            time: format_time(start_timestamp, round.time),
            price_before: format_units(round.price_before, VEC_DECIMALS, 4),
            price_after: format_units(round.price_after, VEC_DECIMALS, 4),
            payout: format_units(round.payout, VEC_DECIMALS, 2),
            debt: format_units(round.debt_after, VEC_DECIMALS, 0),
            recovery: round
                .recovery
                .map(format_duration)
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Deploy a fresh protocol, open one market and run the configured rounds.
pub fn run(config: &SimConfig) -> Result<BondReport, SimError> {
    let scenario = &config.bond;
    let admin = Address::from_label("sim/admin");
    let bonder = Address::from_label("sim/bonder");
    let lst = Address::from_label("sim/lst");

    let deposit = parse_units(&scenario.deposit, PRINCIPAL_DECIMALS)?;
    let max_price = parse_units(&scenario.max_price, VEC_DECIMALS)?;
    let target_price = parse_units(&scenario.target_price, VEC_DECIMALS)?;
    let share_ratio = parse_units(&scenario.share_ratio, PRINCIPAL_DECIMALS)?;
    let step = scenario.step_seconds.max(1);

    let mut protocol = Protocol::deploy(&config.protocol, admin, 0)?;
    let funding = deposit
        .checked_mul(u128::from(scenario.rounds))
        .ok_or(VectorError::Overflow)?;

    let principal = match scenario.principal_kind {
        PrincipalKind::NativeAsset => {
            protocol.vault.add_approved_asset(&admin, lst, share_ratio)?;
            protocol.vault.open_deposits(&admin)?;
            protocol.ledger.mint(&lst, &bonder, funding)?;
            lst
        }
        PrincipalKind::VaultShare => {
            protocol.vault.add_approved_asset(&admin, lst, share_ratio)?;
            protocol.vault.open_deposits(&admin)?;
            // Enough LST to mint the shares every round spends.
            let needed = mul_div(funding, RATIO_PRECISION, share_ratio)?
                .saturating_add(1);
            protocol.ledger.mint(&lst, &bonder, needed)?;
            protocol
                .vault
                .deposit(&mut protocol.ledger, &bonder, &lst, &bonder, needed)?;
            protocol.vault.share_token()
        }
        PrincipalKind::Lp => {
            let lp = Address::from_label("sim/lp");
            let valuation = FixedPriceValuation {
                vec_per_token: parse_units(&scenario.lp_price, VEC_DECIMALS)?,
                decimals: PRINCIPAL_DECIMALS,
            };
            protocol.treasury.accept_asset(&admin, lp, Box::new(valuation))?;
            protocol.ledger.mint(&lp, &bonder, funding)?;
            lp
        }
    };

    let market = protocol.add_bond_market(
        principal,
        scenario.principal_kind,
        scenario.initialization()?,
        0,
    )?;
    if scenario.fee > 0 {
        let dao = Address::from_label("sim/dao");
        protocol.markets[market].set_fee_and_fee_to(&admin, dao, scenario.fee)?;
    }

    info!(
        kind = %scenario.principal_kind,
        rounds = scenario.rounds,
        deposit = %scenario.deposit,
        "Starting bond simulation"
    );

    let mut now = 0u64;
    let mut rounds = Vec::new();
    let mut completion = Completion::AllRounds;

    for round in 1..=scenario.rounds {
        let price_before = protocol.markets[market].bond_price(&protocol.ledger, now)?;
        let receipt = match protocol.bond(market, &bonder, deposit, max_price, now) {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(round, error = %e, "Bond rejected, stopping");
                completion = Completion::Halted {
                    round,
                    reason: e.to_string(),
                };
                break;
            }
        };
        let price_after = protocol.markets[market].bond_price(&protocol.ledger, now)?;
        let debt_after = protocol.markets[market].current_debt(now);

        let bought_at = now;
        let mut recovery = None;
        while now - bought_at < scenario.horizon_seconds {
            now += step;
            if protocol.markets[market].bond_price(&protocol.ledger, now)? <= target_price {
                recovery = Some(now - bought_at);
                break;
            }
        }
        protocol.catch_up(now)?;

        let redeemed = if protocol.markets[market].bond_info(&bonder).is_some() {
            protocol
                .redeem_bond(market, &bonder, now, scenario.stake_payouts)?
                .paid
        } else {
            0
        };

        rounds.push(BondRound {
            round,
            time: bought_at,
            price_before,
            price_after,
            payout: receipt.payout,
            debt_after,
            recovery,
            redeemed,
        });
    }

    Ok(BondReport {
        kind: scenario.principal_kind,
        rounds,
        completion,
        bonder_staked: protocol.staking.balance_of(&bonder)?,
        final_state: protocol.snapshot(now)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_run_completes() {
        let report = run(&SimConfig::default()).unwrap();
        assert!(matches!(report.completion, Completion::AllRounds));
        assert_eq!(report.rounds.len(), 5);

        let first = &report.rounds[0];
        assert_eq!(first.price_before, 1_500_000_000);
        assert!(first.price_after > first.price_before);
        assert!(first.recovery.is_some());
        assert!(report.bonder_staked > 0);
    }

    #[test]
    fn test_slippage_halts_run() {
        let mut config = SimConfig::default();
        config.bond.max_price = "1.2".to_string();
        let report = run(&config).unwrap();
        assert!(report.rounds.is_empty());
        assert!(matches!(report.completion, Completion::Halted { round: 1, .. }));
    }

    #[test]
    fn test_lp_principal() {
        let mut config = SimConfig::default();
        config.bond.principal_kind = PrincipalKind::Lp;
        config.bond.deposit = "2".to_string();
        config.bond.rounds = 2;
        let report = run(&config).unwrap();
        assert_eq!(report.rounds.len(), 2);
        // 2 LP at 250 VEC each, bought at 1.5.
        assert_eq!(report.rounds[0].payout, 333_333_333_333);
    }

    #[test]
    fn test_vault_share_principal() {
        let mut config = SimConfig::default();
        config.bond.principal_kind = PrincipalKind::VaultShare;
        config.bond.rounds = 2;
        let report = run(&config).unwrap();
        assert_eq!(report.rounds.len(), 2);
        assert_eq!(report.rounds[0].payout, 666_666_666_666);
    }

    #[test]
    fn test_row_formatting() {
        let round = BondRound {
            round: 1,
            time: 0,
            price_before: 1_500_000_000,
            price_after: 1_520_000_000,
            payout: 666_666_666_666,
            debt_after: 60_666_666_666_666,
            recovery: None,
            redeemed: 0,
        };
        let row = BondRow::from_round(&round, 0);
        assert_eq!(row.price_before, "1.5000");
        assert_eq!(row.payout, "666.66");
        assert_eq!(row.recovery, "-");
    }
}
