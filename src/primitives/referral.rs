// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::{CommissionId, MlmRank, Money, RankChangeId, Timestamp, TxId, UserId};
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// A user's position in the referral tree, snapshotted at signup. The
/// three ancestor slots are filled from the referrer's own node at attach
/// time and never rewritten afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ReferralNode {
    pub user_id: UserId,
    pub level_1_parent: UserId,
    pub level_2_parent: Option<UserId>,
    pub level_3_parent: Option<UserId>,
    pub depth: u32,
    pub network_size: u64,
    pub network_value: Money,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ReferralNode {
    #[must_use]
    pub fn attach(user_id: UserId, parent: Option<&ReferralNode>, referrer_id: UserId, now: Timestamp) -> Self {
        let (l2, l3, depth) = match parent {
            Some(p) => (Some(p.level_1_parent), p.level_2_parent, p.depth + 1),
            None => (None, None, 1),
        };
        Self {
            user_id,
            level_1_parent: referrer_id,
            level_2_parent: l2,
            level_3_parent: l3,
            depth,
            network_size: 0,
            network_value: Money::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// Upline ancestor at `level` 1..=3, or `None` past the recorded chain.
    #[must_use]
    pub fn ancestor_at(&self, level: u8) -> Option<UserId> {
        match level {
            1 => Some(self.level_1_parent),
            2 => self.level_2_parent,
            3 => self.level_3_parent,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    Pending,
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionPayout {
    Reinvest,
    Cash,
}

/// One referral commission earned from a downline coin purchase.
/// Append-only; the amount is a percentage of the purchase total.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Commission {
    pub id: CommissionId,
    pub earner: UserId,
    pub from_user: UserId,
    pub from_tx: TxId,
    pub level: u8,
    pub rate_bps: u32,
    pub coins_purchased: Money,
    pub coin_value: Money,
    pub base_amount: Money,
    pub amount: Money,
    pub status: CommissionStatus,
    pub payout: CommissionPayout,
    pub created_at: Timestamp,
}

/// Append-only record of a rank promotion.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct RankChange {
    pub id: RankChangeId,
    pub user_id: UserId,
    pub previous_rank: MlmRank,
    pub new_rank: MlmRank,
    pub direct_referrals_at_change: u64,
    pub created_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_snapshots_ancestors_from_the_parent_node() {
        let root = ReferralNode::attach(2, None, 1, 100);
        assert_eq!(root.ancestor_at(1), Some(1));
        assert_eq!(root.ancestor_at(2), None);
        assert_eq!(root.depth, 1);

        let child = ReferralNode::attach(3, Some(&root), 2, 200);
        assert_eq!(child.ancestor_at(1), Some(2));
        assert_eq!(child.ancestor_at(2), Some(1));
        assert_eq!(child.ancestor_at(3), None);
        assert_eq!(child.depth, 2);

        let grandchild = ReferralNode::attach(4, Some(&child), 3, 300);
        assert_eq!(grandchild.ancestor_at(1), Some(3));
        assert_eq!(grandchild.ancestor_at(2), Some(2));
        assert_eq!(grandchild.ancestor_at(3), Some(1));
        assert_eq!(grandchild.ancestor_at(4), None);
    }
}
