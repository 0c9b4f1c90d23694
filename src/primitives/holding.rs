// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::{Money, Timestamp, UserId};
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// One-per-investor aggregate of coins owned and cost basis.
#[derive(Debug, Clone, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct Holding {
    pub user_id: UserId,
    pub coins_owned: Money,
    pub total_invested: Money,
    pub avg_purchase_price: Money,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Holding {
    /// Opens a holding with a first purchase.
    #[must_use]
    pub fn open(user_id: UserId, coins: Money, total: Money, price: Money, now: Timestamp) -> Self {
        Self {
            user_id,
            coins_owned: coins,
            total_invested: total,
            avg_purchase_price: price,
            created_at: now,
            updated_at: now,
        }
    }

    /// Folds a purchase into the aggregate and recomputes the average
    /// purchase price over the whole position.
    pub fn apply_buy(&mut self, coins: Money, total: Money, now: Timestamp) {
        debug_assert!(coins.is_positive());
        self.coins_owned += coins;
        self.total_invested += total;
        self.avg_purchase_price = self.total_invested / self.coins_owned;
        self.updated_at = now;
    }

    /// Removes coins from the balance without touching the cost basis.
    /// Used by project investments and service redemptions. The caller
    /// validates the balance first; coins_owned never goes negative.
    pub fn deduct_coins(&mut self, coins: Money, now: Timestamp) {
        debug_assert!(self.coins_owned >= coins);
        self.coins_owned -= coins;
        self.updated_at = now;
    }

    /// Returns previously deducted coins to the balance, leaving the
    /// cost basis alone. Used when a redemption is rejected.
    pub fn refund_coins(&mut self, coins: Money, now: Timestamp) {
        self.coins_owned += coins;
        self.updated_at = now;
    }

    /// Removes coins and their share of the cost basis at the average
    /// purchase price. Used when an approved buyback converts coins back
    /// to cash.
    pub fn apply_buyback(&mut self, coins: Money, now: Timestamp) {
        debug_assert!(self.coins_owned >= coins);
        self.coins_owned -= coins;
        self.total_invested -= coins * self.avg_purchase_price;
        self.updated_at = now;
    }
}
