// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::{BuybackId, Money, Timestamp, UserId};
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuybackStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuybackAction {
    Approve,
    Reject,
}

/// A sell request parked until an operator decides on it. The price is
/// locked at request time and honoured on approval even if the coin
/// value has moved since.
#[derive(Debug, Clone, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct BuybackRequest {
    pub id: BuybackId,
    pub user_id: UserId,
    pub coins: Money,
    pub price_per_coin: Money,
    pub total_amount: Money,
    pub status: BuybackStatus,
    pub admin_notes: Option<String>,
    pub created_at: Timestamp,
    pub processed_at: Option<Timestamp>,
}

impl BuybackRequest {
    #[must_use]
    pub fn open(
        id: BuybackId,
        user_id: UserId,
        coins: Money,
        price_per_coin: Money,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            coins,
            price_per_coin,
            total_amount: coins * price_per_coin,
            status: BuybackStatus::Pending,
            admin_notes: None,
            created_at: now,
            processed_at: None,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == BuybackStatus::Pending
    }
}
