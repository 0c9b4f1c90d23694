// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::{Money, RedemptionId, TierId, Timestamp, UserId};
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// A service purchasable with coins instead of money.
#[derive(Debug, Clone, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct ServiceTier {
    pub id: TierId,
    pub name: String,
    pub description: String,
    pub coin_cost: Money,
    pub active: bool,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStatus {
    Pending,
    InProgress,
    Completed,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionAction {
    Approve,
    Complete,
    Reject,
}

/// A coin spend against a service tier. Coins are deducted up front;
/// rejection refunds them at the recorded cost.
#[derive(Debug, Clone, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct ServiceRedemption {
    pub id: RedemptionId,
    pub user_id: UserId,
    pub tier_id: TierId,
    pub coins_spent: Money,
    pub request_title: String,
    pub request_details: String,
    pub status: RedemptionStatus,
    pub admin_notes: Option<String>,
    pub created_at: Timestamp,
    pub processed_at: Option<Timestamp>,
}

impl ServiceRedemption {
    #[must_use]
    pub fn open(
        id: RedemptionId,
        user_id: UserId,
        tier_id: TierId,
        coins_spent: Money,
        title: &str,
        details: &str,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            tier_id,
            coins_spent,
            request_title: title.to_owned(),
            request_details: details.to_owned(),
            status: RedemptionStatus::Pending,
            admin_notes: None,
            created_at: now,
            processed_at: None,
        }
    }

    /// Approval and rejection only apply to a fresh request; completion
    /// also applies to one already in progress.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(
            self.status,
            RedemptionStatus::Pending | RedemptionStatus::InProgress
        )
    }
}
