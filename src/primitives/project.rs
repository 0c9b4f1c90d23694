// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::{InvestmentId, Money, ProjectId, Timestamp, UserId};
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planned,
    Funding,
    InProgress,
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub client_name: Option<String>,
    pub target_capital: Option<Money>,
    pub current_funding: Money,
    pub investor_count: u32,
    pub cost: Money,
    pub expected_revenue: Money,
    /// Set exactly once, at completion.
    pub actual_revenue: Option<Money>,
    /// Set exactly once, at completion.
    pub profit: Option<Money>,
    pub min_investment: Option<Money>,
    pub max_investment: Option<Money>,
    pub status: ProjectStatus,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl Project {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == ProjectStatus::Completed
    }

    /// Records a new investment against the funding totals.
    pub fn apply_investment(&mut self, eur_amount: Money) {
        self.current_funding += eur_amount;
        self.investor_count += 1;
    }

    /// Closes the project with its final figures. Callers must reject a
    /// second completion before reaching this.
    pub fn complete(&mut self, actual_revenue: Money, profit: Money, now: Timestamp) {
        debug_assert!(!self.is_completed());
        self.actual_revenue = Some(actual_revenue);
        self.profit = Some(profit);
        self.status = ProjectStatus::Completed;
        self.completed_at = Some(now);
    }

    /// Funded share of the target, as a percentage, if a target is set.
    #[must_use]
    pub fn funding_percentage(&self) -> Option<Money> {
        let target = self.target_capital?;
        if target.is_zero() {
            return None;
        }
        Some(Money(
            self.current_funding.inner() * rust_decimal::Decimal::ONE_HUNDRED / target.inner(),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentStatus {
    Active,
    Closed,
}

/// A user's stake in one project. Referenced, never mutated, by later
/// payouts.
#[derive(Debug, Clone, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct ProjectInvestment {
    pub id: InvestmentId,
    pub user_id: UserId,
    pub project_id: ProjectId,
    pub coins: Money,
    pub amount_eur: Money,
    pub price_at_investment: Money,
    pub status: InvestmentStatus,
    pub created_at: Timestamp,
}

impl ProjectInvestment {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == InvestmentStatus::Active
    }
}
