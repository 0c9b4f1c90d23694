// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::{Money, Timestamp, TxId, UserId};
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxType {
    Buy,
    Sell,
    ServiceRedemption,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Pending,
    Completed,
}

/// Append-only log entry of a coin movement. Immutable once completed.
#[derive(Debug, Clone, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct CoinTransaction {
    pub id: TxId,
    pub user_id: UserId,
    pub tx_type: TxType,
    pub coins: Money,
    pub price_per_coin: Money,
    pub total_amount: Money,
    pub payment_method: Option<String>,
    pub status: TxStatus,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl CoinTransaction {
    /// A completed buy at the given unit price.
    #[must_use]
    pub fn buy(
        id: TxId,
        user_id: UserId,
        coins: Money,
        price: Money,
        total: Money,
        payment_method: &str,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            tx_type: TxType::Buy,
            coins,
            price_per_coin: price,
            total_amount: total,
            payment_method: Some(payment_method.to_owned()),
            status: TxStatus::Completed,
            created_at: now,
            completed_at: Some(now),
        }
    }

    /// A completed sell at the price locked in by the buyback request.
    #[must_use]
    pub fn sell(id: TxId, user_id: UserId, coins: Money, price: Money, now: Timestamp) -> Self {
        Self {
            id,
            user_id,
            tx_type: TxType::Sell,
            coins,
            price_per_coin: price,
            total_amount: coins * price,
            payment_method: None,
            status: TxStatus::Completed,
            created_at: now,
            completed_at: Some(now),
        }
    }

    /// A completed service redemption. Coins are spent against a tier, no
    /// money changes hands, so price and total are zero.
    #[must_use]
    pub fn service_redemption(id: TxId, user_id: UserId, coins: Money, now: Timestamp) -> Self {
        Self {
            id,
            user_id,
            tx_type: TxType::ServiceRedemption,
            coins,
            price_per_coin: Money::ZERO,
            total_amount: Money::ZERO,
            payment_method: None,
            status: TxStatus::Completed,
            created_at: now,
            completed_at: Some(now),
        }
    }
}
