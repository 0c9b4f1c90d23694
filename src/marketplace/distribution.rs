// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::marketplace::portfolio::build_summary;
use crate::marketplace::valuation::current_coin_value;
use crate::marketplace::{MarketConfig, MarketErr};
use crate::primitives::{
    CoinValue, CoinValueSnapshot, Distribution, InvestorPayout, Money, Project, ProjectId,
    RevenueEvent, SnapshotReason, Timestamp, UserId,
};
use crate::rules::bps_to_fraction;
use crate::store::{LedgerBackend, Sequence, WriteOp};
use log::{debug, info};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

#[derive(Debug)]
pub struct CompletionOutcome {
    pub project: Project,
    pub distribution: Distribution,
    pub coin_value: CoinValue,
}

/// Completes a project and folds its profit into the coin value.
///
/// The pool share of the profit is spread evenly over every coin in
/// circulation; the remainder is computed by subtraction so the two
/// legs always sum to the profit exactly. The project close, the
/// distribution row, the new coin value version and its snapshot are
/// committed as one batch.
pub fn complete_project<B: LedgerBackend>(
    backend: &B,
    cfg: &MarketConfig,
    project_id: ProjectId,
    actual_revenue: Money,
    now: Timestamp,
) -> Result<CompletionOutcome, MarketErr> {
    let mut project = backend
        .get_project(project_id)?
        .ok_or(MarketErr::ProjectNotFound)?;
    if project.is_completed() {
        return Err(MarketErr::AlreadyCompleted);
    }

    let profit = actual_revenue - project.cost;
    if !profit.is_positive() {
        return Err(MarketErr::NothingToDistribute);
    }

    let coins_outstanding = backend.total_coins_outstanding()?;
    if !coins_outstanding.is_positive() {
        return Err(MarketErr::NoCoinsOutstanding);
    }

    let to_pool = profit * bps_to_fraction(cfg.distribution.pool_share_bps);
    let to_admin = profit - to_pool;
    let per_coin_increase = to_pool / coins_outstanding;

    let current = current_coin_value(backend, cfg)?;
    let next = CoinValue {
        value: current.value + per_coin_increase,
        version: current.version + 1,
    };

    project.complete(actual_revenue, profit, now);
    let distribution = Distribution {
        id: backend.next_id(Sequence::Distribution)?,
        project_id,
        total_profit: profit,
        to_pool,
        to_admin,
        coins_outstanding,
        per_coin_increase,
        created_at: now,
    };
    let snapshot = CoinValueSnapshot {
        id: backend.next_id(Sequence::Snapshot)?,
        coin_value: next.value,
        coins_outstanding,
        reason: SnapshotReason::ProjectDistribution,
        reference: Some(project_id),
        created_at: now,
    };

    debug!(
        "committing completion batch for project {}: distribution {}, snapshot {}",
        project_id, distribution.id, snapshot.id
    );
    backend.commit(vec![
        WriteOp::PutProject(project.clone()),
        WriteOp::AppendDistribution(distribution.clone()),
        WriteOp::SetCoinValue(next),
        WriteOp::AppendSnapshot(snapshot),
    ])?;

    info!(
        "completed project {} with profit {}, coin value {} -> {}",
        project_id, profit, current.value, next.value
    );

    Ok(CompletionOutcome {
        project,
        distribution,
        coin_value: next,
    })
}

#[derive(Debug)]
pub struct RevenueOutcome {
    pub event: RevenueEvent,
    pub payouts: Vec<InvestorPayout>,
}

/// Distributes a revenue event over a project's active investors,
/// proportionally to their staked amount.
///
/// The last investor receives the remainder of the investor share, so
/// the payouts always sum to it exactly however the proportions divide.
/// Each affected portfolio summary is rebuilt with the staged payouts
/// and written in the same batch.
pub fn distribute_revenue<B: LedgerBackend>(
    backend: &B,
    cfg: &MarketConfig,
    project_id: ProjectId,
    amount: Money,
    revenue_date: Timestamp,
    now: Timestamp,
) -> Result<RevenueOutcome, MarketErr> {
    if !amount.is_positive() {
        return Err(MarketErr::InvalidAmount);
    }
    backend
        .get_project(project_id)?
        .ok_or(MarketErr::ProjectNotFound)?;

    let mut stakes: BTreeMap<UserId, Money> = BTreeMap::new();
    for inv in backend.investments_by_project(project_id)? {
        if inv.is_active() {
            *stakes.entry(inv.user_id).or_insert(Money::ZERO) += inv.amount_eur;
        }
    }
    let total_staked: Money = stakes.values().copied().sum();
    if !total_staked.is_positive() {
        return Err(MarketErr::NoActiveInvestors);
    }

    let investor_share = amount * bps_to_fraction(cfg.distribution.pool_share_bps);
    let admin_share = amount - investor_share;

    let event = RevenueEvent {
        id: backend.next_id(Sequence::RevenueEvent)?,
        project_id,
        revenue_date,
        amount,
        investor_share,
        admin_share,
        created_at: now,
    };

    let mut payouts = Vec::with_capacity(stakes.len());
    let mut paid = Money::ZERO;
    let last_user = *stakes.keys().next_back().unwrap();
    for (user_id, stake) in &stakes {
        let amount = if *user_id == last_user {
            investor_share - paid
        } else {
            investor_share * (stake.inner() / total_staked.inner())
        };
        paid += amount;
        payouts.push(InvestorPayout {
            id: backend.next_id(Sequence::Payout)?,
            user_id: *user_id,
            project_id,
            revenue_event_id: event.id,
            amount,
            roi_percentage: amount.inner() / stake.inner() * Decimal::ONE_HUNDRED,
            created_at: now,
        });
    }

    let mut batch = vec![WriteOp::AppendRevenueEvent(event.clone())];
    for payout in &payouts {
        batch.push(WriteOp::AppendPayout(payout.clone()));
    }
    for user_id in stakes.keys() {
        let summary = build_summary(backend, *user_id, &[], &payouts, now)?;
        batch.push(WriteOp::PutPortfolioSummary(summary));
    }
    debug!(
        "committing revenue batch for project {}: event {}, {} payouts, {} summaries",
        project_id,
        event.id,
        payouts.len(),
        stakes.len()
    );
    backend.commit(batch)?;

    info!(
        "distributed revenue {} on project {}: {} to {} investors, {} retained",
        amount,
        project_id,
        investor_share,
        payouts.len(),
        admin_share
    );

    Ok(RevenueOutcome { event, payouts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{Holding, InvestmentStatus, ProjectInvestment, ProjectStatus};
    use crate::store::MemoryBackend;
    use quickcheck_macros::quickcheck;
    use rust_decimal_macros::dec;

    fn project(id: u64, cost: Money) -> Project {
        Project {
            id,
            name: format!("Project {id}"),
            description: String::new(),
            client_name: None,
            target_capital: None,
            current_funding: Money::ZERO,
            investor_count: 0,
            cost,
            expected_revenue: Money::ZERO,
            actual_revenue: None,
            profit: None,
            min_investment: None,
            max_investment: None,
            status: ProjectStatus::Active,
            created_at: 0,
            completed_at: None,
        }
    }

    fn investment(id: u64, user_id: u64, project_id: u64, amount: Money) -> ProjectInvestment {
        ProjectInvestment {
            id,
            user_id,
            project_id,
            coins: Money(dec!(1)),
            amount_eur: amount,
            price_at_investment: Money(dec!(10)),
            status: InvestmentStatus::Active,
            created_at: 0,
        }
    }

    #[test]
    fn it_splits_profit_eighty_twenty() {
        let backend = MemoryBackend::new();
        backend
            .commit(vec![
                WriteOp::PutProject(project(1, Money(dec!(1000)))),
                WriteOp::PutHolding(Holding::open(
                    1,
                    Money(dec!(50)),
                    Money(dec!(500)),
                    Money(dec!(10)),
                    0,
                )),
            ])
            .unwrap();

        let outcome =
            complete_project(&backend, &MarketConfig::default(), 1, Money(dec!(5000)), 7)
                .unwrap();

        assert_eq!(outcome.distribution.total_profit, Money(dec!(4000)));
        assert_eq!(outcome.distribution.to_pool, Money(dec!(3200.0)));
        assert_eq!(outcome.distribution.to_admin, Money(dec!(800.0)));
        assert_eq!(outcome.distribution.per_coin_increase, Money(dec!(64)));
        assert_eq!(outcome.coin_value.value, Money(dec!(74.0)));
        assert_eq!(outcome.coin_value.version, 1);

        // Everything landed atomically.
        let stored = backend.get_project(1).unwrap().unwrap();
        assert!(stored.is_completed());
        assert_eq!(stored.profit, Some(Money(dec!(4000))));
        assert_eq!(backend.coin_value().unwrap(), Some(outcome.coin_value));
        assert_eq!(backend.snapshots().unwrap().len(), 1);
    }

    #[test]
    fn it_rejects_non_positive_profit() {
        let backend = MemoryBackend::new();
        backend
            .commit(vec![
                WriteOp::PutProject(project(1, Money(dec!(1000)))),
                WriteOp::PutHolding(Holding::open(
                    1,
                    Money(dec!(50)),
                    Money(dec!(500)),
                    Money(dec!(10)),
                    0,
                )),
            ])
            .unwrap();
        let err = complete_project(&backend, &MarketConfig::default(), 1, Money(dec!(1000)), 7)
            .unwrap_err();
        assert!(matches!(err, MarketErr::NothingToDistribute));
        // Nothing committed.
        assert!(!backend.get_project(1).unwrap().unwrap().is_completed());
        assert!(backend.coin_value().unwrap().is_none());
    }

    #[test]
    fn it_rejects_distribution_over_zero_coins() {
        let backend = MemoryBackend::new();
        backend
            .commit(vec![WriteOp::PutProject(project(1, Money(dec!(1000))))])
            .unwrap();
        let err = complete_project(&backend, &MarketConfig::default(), 1, Money(dec!(5000)), 7)
            .unwrap_err();
        assert!(matches!(err, MarketErr::NoCoinsOutstanding));
    }

    #[test]
    fn it_rejects_double_completion() {
        let backend = MemoryBackend::new();
        backend
            .commit(vec![
                WriteOp::PutProject(project(1, Money(dec!(1000)))),
                WriteOp::PutHolding(Holding::open(
                    1,
                    Money(dec!(50)),
                    Money(dec!(500)),
                    Money(dec!(10)),
                    0,
                )),
            ])
            .unwrap();
        complete_project(&backend, &MarketConfig::default(), 1, Money(dec!(5000)), 7).unwrap();
        let err = complete_project(&backend, &MarketConfig::default(), 1, Money(dec!(6000)), 8)
            .unwrap_err();
        assert!(matches!(err, MarketErr::AlreadyCompleted));
        assert_eq!(backend.coin_value().unwrap().unwrap().version, 1);
    }

    #[test]
    fn it_pays_revenue_proportionally() {
        let backend = MemoryBackend::new();
        backend
            .commit(vec![
                WriteOp::PutProject(project(1, Money(dec!(1000)))),
                WriteOp::PutInvestment(investment(1, 10, 1, Money(dec!(300)))),
                WriteOp::PutInvestment(investment(2, 20, 1, Money(dec!(700)))),
            ])
            .unwrap();

        let outcome = distribute_revenue(
            &backend,
            &MarketConfig::default(),
            1,
            Money(dec!(1000)),
            5,
            7,
        )
        .unwrap();

        assert_eq!(outcome.event.investor_share, Money(dec!(800.0)));
        assert_eq!(outcome.event.admin_share, Money(dec!(200.0)));
        assert_eq!(outcome.payouts.len(), 2);
        assert_eq!(outcome.payouts[0].user_id, 10);
        assert_eq!(outcome.payouts[0].amount, Money(dec!(240)));
        assert_eq!(outcome.payouts[1].user_id, 20);
        assert_eq!(outcome.payouts[1].amount, Money(dec!(560.0)));

        // Summaries were rebuilt with the staged payouts.
        let summary = backend.portfolio_summary(10).unwrap().unwrap();
        assert_eq!(summary.total_revenue, Money(dec!(240)));
        assert_eq!(summary.roi_percentage, dec!(80));
    }

    #[test]
    fn it_requires_active_investors() {
        let backend = MemoryBackend::new();
        backend
            .commit(vec![WriteOp::PutProject(project(1, Money(dec!(1000))))])
            .unwrap();
        let err = distribute_revenue(
            &backend,
            &MarketConfig::default(),
            1,
            Money(dec!(1000)),
            5,
            7,
        )
        .unwrap_err();
        assert!(matches!(err, MarketErr::NoActiveInvestors));
    }

    #[quickcheck]
    fn payouts_sum_to_investor_share(stakes: Vec<u32>, amount_cents: u32) -> bool {
        let stakes: Vec<u32> = stakes.into_iter().filter(|s| *s > 0).take(8).collect();
        if stakes.is_empty() || amount_cents == 0 {
            return true;
        }
        let backend = MemoryBackend::new();
        let mut batch = vec![WriteOp::PutProject(project(1, Money(dec!(1))))];
        for (i, stake) in stakes.iter().enumerate() {
            batch.push(WriteOp::PutInvestment(investment(
                i as u64 + 1,
                i as u64 + 1,
                1,
                Money(Decimal::new(i64::from(*stake), 2)),
            )));
        }
        backend.commit(batch).unwrap();

        let amount = Money(Decimal::new(i64::from(amount_cents), 2));
        let outcome =
            distribute_revenue(&backend, &MarketConfig::default(), 1, amount, 5, 7).unwrap();
        let total: Money = outcome.payouts.iter().map(|p| p.amount).sum();
        total == outcome.event.investor_share
            && outcome.event.investor_share + outcome.event.admin_share == amount
    }
}
