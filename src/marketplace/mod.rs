// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Marketplace engine. Coin purchases and buybacks, project funding,
//! profit and revenue distribution, and the read models built on top of
//! the ledger.

use crate::primitives::Money;
use crate::store::LedgerBackendErr;
use std::fmt;

pub mod distribution;
pub mod ops;
pub mod portfolio;
pub mod valuation;

pub use distribution::{complete_project, distribute_revenue};
pub use ops::*;
pub use portfolio::{build_summary, investor_positions};
pub use valuation::{current_coin_value, dynamic_coin_value};

#[derive(Debug)]
pub enum MarketErr {
    /// Not enough coins in the holding for the requested operation
    InsufficientBalance,

    /// Amount is zero or negative where a positive amount is required
    InvalidAmount,

    /// Investment below the project minimum
    BelowMinimumInvestment,

    /// Investment above the project maximum
    AboveMaximumInvestment,

    /// Request has already been approved or rejected
    AlreadyProcessed,

    /// Project has already been completed
    AlreadyCompleted,

    ProjectNotFound,
    UserNotFound,
    HoldingNotFound,
    RequestNotFound,
    TierNotFound,

    /// Completion with a non-positive profit distributes nothing
    NothingToDistribute,

    /// No coins in circulation to spread a distribution over
    NoCoinsOutstanding,

    /// Revenue distribution over a project with no active investments
    NoActiveInvestors,

    /// Ledger backend error
    Backend(LedgerBackendErr),
}

impl fmt::Display for MarketErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientBalance => write!(f, "insufficient coin balance"),
            Self::InvalidAmount => write!(f, "amount must be positive"),
            Self::BelowMinimumInvestment => write!(f, "below minimum investment"),
            Self::AboveMaximumInvestment => write!(f, "above maximum investment"),
            Self::AlreadyProcessed => write!(f, "request already processed"),
            Self::AlreadyCompleted => write!(f, "project already completed"),
            Self::ProjectNotFound => write!(f, "project not found"),
            Self::UserNotFound => write!(f, "user not found"),
            Self::HoldingNotFound => write!(f, "holding not found"),
            Self::RequestNotFound => write!(f, "request not found"),
            Self::TierNotFound => write!(f, "service tier not found"),
            Self::NothingToDistribute => write!(f, "nothing to distribute"),
            Self::NoCoinsOutstanding => write!(f, "no coins outstanding"),
            Self::NoActiveInvestors => write!(f, "no active investors"),
            Self::Backend(err) => write!(f, "backend: {err}"),
        }
    }
}

impl From<LedgerBackendErr> for MarketErr {
    fn from(other: LedgerBackendErr) -> Self {
        Self::Backend(other)
    }
}

/// Profit split used when a completed project's profit is folded into
/// the coin value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistributionConfig {
    /// Share of profit routed to the coin pool, in basis points. The
    /// remainder goes to the operator.
    pub pool_share_bps: u32,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            pool_share_bps: crate::rules::POOL_SHARE_BPS,
        }
    }
}

impl DistributionConfig {
    #[must_use]
    pub fn from_settings() -> Self {
        Self {
            pool_share_bps: crate::settings::SETTINGS.marketplace.pool_share_bps,
        }
    }
}

/// Marketplace-wide knobs that do not vary per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketConfig {
    pub base_coin_value: Money,
    pub min_buy_coins: Money,
    pub distribution: DistributionConfig,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            base_coin_value: crate::rules::BASE_COIN_VALUE,
            min_buy_coins: crate::rules::MIN_BUY_COINS,
            distribution: DistributionConfig::default(),
        }
    }
}

impl MarketConfig {
    #[must_use]
    pub fn from_settings() -> Self {
        let settings = &crate::settings::SETTINGS.marketplace;
        Self {
            base_coin_value: Money(settings.base_coin_value),
            min_buy_coins: Money(settings.min_buy_coins),
            distribution: DistributionConfig::from_settings(),
        }
    }
}
