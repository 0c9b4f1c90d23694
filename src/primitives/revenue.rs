// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::codec;
use crate::primitives::{
    DistributionId, Money, PayoutId, ProjectId, RevenueEventId, SnapshotId, Timestamp, UserId,
};
use bincode::{Decode, Encode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One revenue distribution event for a project. Append-only.
#[derive(Debug, Clone, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct RevenueEvent {
    pub id: RevenueEventId,
    pub project_id: ProjectId,
    pub revenue_date: Timestamp,
    pub amount: Money,
    pub investor_share: Money,
    pub admin_share: Money,
    pub created_at: Timestamp,
}

/// Per-investor share of one revenue event, aggregated per user.
/// Append-only, many rows per event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorPayout {
    pub id: PayoutId,
    pub user_id: UserId,
    pub project_id: ProjectId,
    pub revenue_event_id: RevenueEventId,
    pub amount: Money,
    pub roi_percentage: Decimal,
    pub created_at: Timestamp,
}

impl Encode for InvestorPayout {
    fn encode<E: bincode::enc::Encoder>(
        &self,
        encoder: &mut E,
    ) -> core::result::Result<(), bincode::error::EncodeError> {
        Encode::encode(&self.id, encoder)?;
        Encode::encode(&self.user_id, encoder)?;
        Encode::encode(&self.project_id, encoder)?;
        Encode::encode(&self.revenue_event_id, encoder)?;
        Encode::encode(&self.amount, encoder)?;
        codec::encode_decimal(&self.roi_percentage, encoder)?;
        Encode::encode(&self.created_at, encoder)?;
        Ok(())
    }
}

impl Decode for InvestorPayout {
    fn decode<D: bincode::de::Decoder>(
        decoder: &mut D,
    ) -> core::result::Result<Self, bincode::error::DecodeError> {
        Ok(Self {
            id: Decode::decode(decoder)?,
            user_id: Decode::decode(decoder)?,
            project_id: Decode::decode(decoder)?,
            revenue_event_id: Decode::decode(decoder)?,
            amount: Decode::decode(decoder)?,
            roi_percentage: codec::decode_decimal(decoder)?,
            created_at: Decode::decode(decoder)?,
        })
    }
}

/// One project-completion profit split, recording the pool/operator split
/// and the per-coin value increase it produced. Append-only.
#[derive(Debug, Clone, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct Distribution {
    pub id: DistributionId,
    pub project_id: ProjectId,
    pub total_profit: Money,
    pub to_pool: Money,
    pub to_admin: Money,
    pub coins_outstanding: Money,
    pub per_coin_increase: Money,
    pub created_at: Timestamp,
}

/// The global coin value as versioned state. Only a completed distribution
/// produces a successor version, and it does so in the same atomic batch
/// as the distribution rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct CoinValue {
    pub value: Money,
    pub version: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotReason {
    ProjectDistribution,
}

/// Append-only history of the global coin value after each distribution.
#[derive(Debug, Clone, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct CoinValueSnapshot {
    pub id: SnapshotId,
    pub coin_value: Money,
    pub coins_outstanding: Money,
    pub reason: SnapshotReason,
    pub reference: Option<ProjectId>,
    pub created_at: Timestamp,
}
