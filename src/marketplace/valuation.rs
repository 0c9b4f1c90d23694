// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::marketplace::{MarketConfig, MarketErr};
use crate::primitives::{CoinValue, Money};
use crate::store::LedgerBackend;
use rust_decimal::Decimal;

/// Latest committed coin value, or version zero at the base value before
/// any distribution has run.
pub fn current_coin_value<B: LedgerBackend>(
    backend: &B,
    cfg: &MarketConfig,
) -> Result<CoinValue, MarketErr> {
    Ok(backend.coin_value()?.unwrap_or(CoinValue {
        value: cfg.base_coin_value,
        version: 0,
    }))
}

/// Indicative coin value derived from realised project performance.
///
/// Each completed project contributes its profit as a return on the
/// capital still actively invested in it, weighted by that capital;
/// the base value is scaled by the weighted average. Reported
/// alongside the committed value, never written to the ledger.
pub fn dynamic_coin_value<B: LedgerBackend>(
    backend: &B,
    cfg: &MarketConfig,
) -> Result<Money, MarketErr> {
    let mut weighted_roi = Decimal::ZERO;
    let mut total_weight = Decimal::ZERO;

    for project in backend.projects()? {
        if !project.is_completed() {
            continue;
        }
        let Some(profit) = project.profit else {
            continue;
        };
        let invested: Money = backend
            .investments_by_project(project.id)?
            .iter()
            .filter(|inv| inv.is_active())
            .map(|inv| inv.amount_eur)
            .sum();
        if invested.is_zero() {
            continue;
        }
        let roi = profit.inner() / invested.inner() * Decimal::ONE_HUNDRED;
        weighted_roi += roi * invested.inner();
        total_weight += invested.inner();
    }

    if total_weight.is_zero() {
        return Ok(cfg.base_coin_value);
    }
    let avg_roi = weighted_roi / total_weight;
    Ok(cfg.base_coin_value * (Decimal::ONE + avg_roi / Decimal::ONE_HUNDRED))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{
        InvestmentStatus, Project, ProjectInvestment, ProjectStatus,
    };
    use crate::store::{MemoryBackend, WriteOp};
    use rust_decimal_macros::dec;

    fn project(id: u64, status: ProjectStatus, cost: Money, profit: Option<Money>) -> Project {
        Project {
            id,
            name: format!("Project {id}"),
            description: String::new(),
            client_name: None,
            target_capital: Some(Money(dec!(1000))),
            current_funding: Money(dec!(1000)),
            investor_count: 1,
            cost,
            expected_revenue: Money(dec!(0)),
            actual_revenue: None,
            profit,
            min_investment: None,
            max_investment: None,
            status,
            created_at: 0,
            completed_at: None,
        }
    }

    fn investment(id: u64, project_id: u64, amount: Money, status: InvestmentStatus) -> ProjectInvestment {
        ProjectInvestment {
            id,
            user_id: 1,
            project_id,
            coins: Money(dec!(1)),
            amount_eur: amount,
            price_at_investment: Money(dec!(10)),
            status,
            created_at: 0,
        }
    }

    #[test]
    fn it_defaults_to_base_value() {
        let backend = MemoryBackend::new();
        let cfg = MarketConfig::default();
        let value = current_coin_value(&backend, &cfg).unwrap();
        assert_eq!(value.value, cfg.base_coin_value);
        assert_eq!(value.version, 0);
        assert_eq!(dynamic_coin_value(&backend, &cfg).unwrap(), cfg.base_coin_value);
    }

    #[test]
    fn it_weights_roi_by_active_investment() {
        let backend = MemoryBackend::new();
        let cfg = MarketConfig::default();
        backend
            .commit(vec![
                // 50% roi with 300 invested, 20% roi with 100 invested.
                WriteOp::PutProject(project(
                    1,
                    ProjectStatus::Completed,
                    Money(dec!(1000)),
                    Some(Money(dec!(150))),
                )),
                WriteOp::PutProject(project(
                    2,
                    ProjectStatus::Completed,
                    Money(dec!(1000)),
                    Some(Money(dec!(20))),
                )),
                WriteOp::PutInvestment(investment(1, 1, Money(dec!(300)), InvestmentStatus::Active)),
                WriteOp::PutInvestment(investment(2, 2, Money(dec!(100)), InvestmentStatus::Active)),
                WriteOp::PutInvestment(investment(3, 2, Money(dec!(900)), InvestmentStatus::Closed)),
            ])
            .unwrap();

        // avg roi = (50*300 + 20*100) / 400 = 42.5% -> 10 * 1.425
        assert_eq!(
            dynamic_coin_value(&backend, &cfg).unwrap(),
            Money(dec!(14.25))
        );
    }

    #[test]
    fn roi_is_measured_against_invested_capital_not_cost() {
        let backend = MemoryBackend::new();
        let cfg = MarketConfig::default();
        backend
            .commit(vec![
                WriteOp::PutProject(project(
                    1,
                    ProjectStatus::Completed,
                    Money(dec!(1000)),
                    Some(Money(dec!(500))),
                )),
                WriteOp::PutInvestment(investment(1, 1, Money(dec!(250)), InvestmentStatus::Active)),
            ])
            .unwrap();

        // 500 profit on 250 invested is a 200% return, whatever the cost.
        assert_eq!(dynamic_coin_value(&backend, &cfg).unwrap(), Money(dec!(30)));
    }

    #[test]
    fn incomplete_projects_do_not_move_the_value() {
        let backend = MemoryBackend::new();
        let cfg = MarketConfig::default();
        backend
            .commit(vec![
                WriteOp::PutProject(project(
                    1,
                    ProjectStatus::Active,
                    Money(dec!(1000)),
                    None,
                )),
                WriteOp::PutInvestment(investment(1, 1, Money(dec!(300)), InvestmentStatus::Active)),
            ])
            .unwrap();
        assert_eq!(dynamic_coin_value(&backend, &cfg).unwrap(), cfg.base_coin_value);
    }
}
