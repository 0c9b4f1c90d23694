// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::codec;
use crate::primitives::{InvestmentStatus, Money, ProjectId, ProjectStatus, Timestamp, UserId};
use bincode::{Decode, Encode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Denormalised rollup of a user's project investments. Recomputed in
/// full from the investment and payout rows whenever either changes,
/// never adjusted incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub user_id: UserId,
    pub total_invested: Money,
    pub total_coins_invested: Money,
    pub total_revenue: Money,
    pub active_investments: u64,
    pub completed_investments: u64,
    pub roi_percentage: Decimal,
    pub avg_project_return: Decimal,
    pub updated_at: Timestamp,
}

impl PortfolioSummary {
    #[must_use]
    pub fn empty(user_id: UserId, now: Timestamp) -> Self {
        Self {
            user_id,
            total_invested: Money::ZERO,
            total_coins_invested: Money::ZERO,
            total_revenue: Money::ZERO,
            active_investments: 0,
            completed_investments: 0,
            roi_percentage: Decimal::ZERO,
            avg_project_return: Decimal::ZERO,
            updated_at: now,
        }
    }
}

impl Encode for PortfolioSummary {
    fn encode<E: bincode::enc::Encoder>(
        &self,
        encoder: &mut E,
    ) -> core::result::Result<(), bincode::error::EncodeError> {
        Encode::encode(&self.user_id, encoder)?;
        Encode::encode(&self.total_invested, encoder)?;
        Encode::encode(&self.total_coins_invested, encoder)?;
        Encode::encode(&self.total_revenue, encoder)?;
        Encode::encode(&self.active_investments, encoder)?;
        Encode::encode(&self.completed_investments, encoder)?;
        codec::encode_decimal(&self.roi_percentage, encoder)?;
        codec::encode_decimal(&self.avg_project_return, encoder)?;
        Encode::encode(&self.updated_at, encoder)?;
        Ok(())
    }
}

impl Decode for PortfolioSummary {
    fn decode<D: bincode::de::Decoder>(
        decoder: &mut D,
    ) -> core::result::Result<Self, bincode::error::DecodeError> {
        Ok(Self {
            user_id: Decode::decode(decoder)?,
            total_invested: Decode::decode(decoder)?,
            total_coins_invested: Decode::decode(decoder)?,
            total_revenue: Decode::decode(decoder)?,
            active_investments: Decode::decode(decoder)?,
            completed_investments: Decode::decode(decoder)?,
            roi_percentage: codec::decode_decimal(decoder)?,
            avg_project_return: codec::decode_decimal(decoder)?,
            updated_at: Decode::decode(decoder)?,
        })
    }
}

/// Query-only view of one investment joined with its project. Built on
/// demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectPosition {
    pub project_id: ProjectId,
    pub project_name: String,
    pub project_status: ProjectStatus,
    pub coins: Money,
    pub amount_invested: Money,
    pub price_at_investment: Money,
    pub revenue_received: Money,
    pub investment_status: InvestmentStatus,
    pub invested_at: Timestamp,
}
