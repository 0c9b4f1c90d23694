// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::marketplace::MarketErr;
use crate::primitives::{
    InvestorPayout, Money, PortfolioSummary, ProjectInvestment, ProjectPosition, Timestamp,
    UserId,
};
use crate::store::LedgerBackend;
use rust_decimal::Decimal;
use std::collections::BTreeSet;

/// Recomputes a user's portfolio summary from scratch.
///
/// `extra_investments` and `extra_payouts` are rows the calling flow has
/// staged but not yet committed, so the summary written in the same
/// batch already reflects them.
pub fn build_summary<B: LedgerBackend>(
    backend: &B,
    user_id: UserId,
    extra_investments: &[ProjectInvestment],
    extra_payouts: &[InvestorPayout],
    now: Timestamp,
) -> Result<PortfolioSummary, MarketErr> {
    let mut investments = backend.investments_by_user(user_id)?;
    investments.extend(extra_investments.iter().cloned());

    // Counts are per project, not per stake: two stakes in the same
    // project are one position.
    let mut summary = PortfolioSummary::empty(user_id, now);
    let mut active_projects = BTreeSet::new();
    let mut invested_projects = BTreeSet::new();
    for inv in &investments {
        invested_projects.insert(inv.project_id);
        if inv.is_active() {
            summary.total_invested += inv.amount_eur;
            summary.total_coins_invested += inv.coins;
            active_projects.insert(inv.project_id);
        }
    }
    summary.active_investments = active_projects.len() as u64;
    for project_id in &invested_projects {
        let completed = backend
            .get_project(*project_id)?
            .map_or(false, |p| p.is_completed());
        if completed {
            summary.completed_investments += 1;
        }
    }

    summary.total_revenue = backend
        .payouts_by_user(user_id)?
        .iter()
        .chain(extra_payouts.iter().filter(|p| p.user_id == user_id))
        .map(|p| p.amount)
        .sum();

    if summary.total_invested.is_positive() {
        summary.roi_percentage = summary.total_revenue.inner()
            / summary.total_invested.inner()
            * Decimal::ONE_HUNDRED;
    }
    if summary.active_investments > 0 {
        summary.avg_project_return =
            summary.roi_percentage / Decimal::from(summary.active_investments);
    }
    Ok(summary)
}

/// Per-project view of a user's investments, joined with project state
/// and the revenue received from each of them.
pub fn investor_positions<B: LedgerBackend>(
    backend: &B,
    user_id: UserId,
) -> Result<Vec<ProjectPosition>, MarketErr> {
    let payouts = backend.payouts_by_user(user_id)?;
    let mut positions = Vec::new();
    for inv in backend.investments_by_user(user_id)? {
        let project = backend
            .get_project(inv.project_id)?
            .ok_or(MarketErr::ProjectNotFound)?;
        let revenue_received: Money = payouts
            .iter()
            .filter(|p| p.project_id == inv.project_id)
            .map(|p| p.amount)
            .sum();
        positions.push(ProjectPosition {
            project_id: project.id,
            project_name: project.name.clone(),
            project_status: project.status,
            coins: inv.coins,
            amount_invested: inv.amount_eur,
            price_at_investment: inv.price_at_investment,
            revenue_received,
            investment_status: inv.status,
            invested_at: inv.created_at,
        });
    }
    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{InvestmentStatus, Project, ProjectStatus};
    use crate::store::{MemoryBackend, WriteOp};
    use rust_decimal_macros::dec;

    fn project(id: u64, status: ProjectStatus) -> Project {
        Project {
            id,
            name: format!("Project {id}"),
            description: String::new(),
            client_name: None,
            target_capital: None,
            current_funding: Money(dec!(0)),
            investor_count: 0,
            cost: Money(dec!(1000)),
            expected_revenue: Money(dec!(1500)),
            actual_revenue: None,
            profit: None,
            min_investment: None,
            max_investment: None,
            status,
            created_at: 0,
            completed_at: None,
        }
    }

    fn investment(
        id: u64,
        project_id: u64,
        amount: Money,
        status: InvestmentStatus,
    ) -> ProjectInvestment {
        ProjectInvestment {
            id,
            user_id: 1,
            project_id,
            coins: Money(dec!(10)),
            amount_eur: amount,
            price_at_investment: Money(dec!(10)),
            status,
            created_at: 0,
        }
    }

    fn payout(id: u64, project_id: u64, amount: Money) -> InvestorPayout {
        InvestorPayout {
            id,
            user_id: 1,
            project_id,
            revenue_event_id: 1,
            amount,
            roi_percentage: Decimal::ZERO,
            created_at: 0,
        }
    }

    #[test]
    fn it_aggregates_active_investments_only() {
        let backend = MemoryBackend::new();
        backend
            .commit(vec![
                WriteOp::PutProject(project(1, ProjectStatus::Active)),
                WriteOp::PutProject(project(2, ProjectStatus::Active)),
                WriteOp::PutProject(project(3, ProjectStatus::Completed)),
                WriteOp::PutInvestment(investment(1, 1, Money(dec!(300)), InvestmentStatus::Active)),
                WriteOp::PutInvestment(investment(2, 2, Money(dec!(200)), InvestmentStatus::Active)),
                WriteOp::PutInvestment(investment(3, 3, Money(dec!(999)), InvestmentStatus::Closed)),
                WriteOp::AppendPayout(payout(1, 1, Money(dec!(50)))),
            ])
            .unwrap();

        let summary = build_summary(&backend, 1, &[], &[], 7).unwrap();
        assert_eq!(summary.total_invested, Money(dec!(500)));
        assert_eq!(summary.total_coins_invested, Money(dec!(20)));
        assert_eq!(summary.active_investments, 2);
        assert_eq!(summary.completed_investments, 1);
        assert_eq!(summary.total_revenue, Money(dec!(50)));
        assert_eq!(summary.roi_percentage, dec!(10));
        assert_eq!(summary.avg_project_return, dec!(5));
    }

    #[test]
    fn two_stakes_in_one_project_are_one_position() {
        let backend = MemoryBackend::new();
        backend
            .commit(vec![
                WriteOp::PutProject(project(1, ProjectStatus::Active)),
                WriteOp::PutInvestment(investment(1, 1, Money(dec!(300)), InvestmentStatus::Active)),
                WriteOp::PutInvestment(investment(2, 1, Money(dec!(200)), InvestmentStatus::Active)),
                WriteOp::AppendPayout(payout(1, 1, Money(dec!(50)))),
            ])
            .unwrap();

        let summary = build_summary(&backend, 1, &[], &[], 7).unwrap();
        assert_eq!(summary.total_invested, Money(dec!(500)));
        assert_eq!(summary.active_investments, 1);
        assert_eq!(summary.completed_investments, 0);
        assert_eq!(summary.roi_percentage, dec!(10));
        assert_eq!(summary.avg_project_return, dec!(10));
    }

    #[test]
    fn it_counts_staged_rows() {
        let backend = MemoryBackend::new();
        let staged_inv = investment(1, 1, Money(dec!(100)), InvestmentStatus::Active);
        let staged_payout = payout(1, 1, Money(dec!(20)));
        let summary = build_summary(&backend, 1, &[staged_inv], &[staged_payout], 7).unwrap();
        assert_eq!(summary.total_invested, Money(dec!(100)));
        assert_eq!(summary.total_revenue, Money(dec!(20)));
        assert_eq!(summary.roi_percentage, dec!(20));
    }

    #[test]
    fn empty_portfolio_has_zero_ratios() {
        let backend = MemoryBackend::new();
        let summary = build_summary(&backend, 1, &[], &[], 7).unwrap();
        assert_eq!(summary.total_invested, Money::ZERO);
        assert_eq!(summary.roi_percentage, Decimal::ZERO);
        assert_eq!(summary.avg_project_return, Decimal::ZERO);
    }
}
