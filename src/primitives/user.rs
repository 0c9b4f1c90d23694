// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::{Timestamp, UserId};
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Visitor,
    Investor,
    Admin,
}

/// MLM ranks in promotion order. The derived `Ord` is the rank ordering
/// used by the monotonicity checks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Encode, Decode, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MlmRank {
    Associate,
    Partner,
    Director,
    Executive,
}

impl fmt::Display for MlmRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Associate => "associate",
            Self::Partner => "partner",
            Self::Director => "director",
            Self::Executive => "executive",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub referral_code: String,
    pub referred_by: Option<UserId>,
    /// Lifetime counter, bumped once per commission awarded at any level.
    pub total_referrals: u32,
    /// Lifetime counter, bumped once per level-1 commission awarded.
    pub direct_referrals: u32,
    pub rank: MlmRank,
    pub created_at: Timestamp,
    pub last_login: Timestamp,
}

impl User {
    #[must_use]
    pub fn new(
        id: UserId,
        email: String,
        name: String,
        referral_code: String,
        referred_by: Option<UserId>,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            email,
            name,
            role: Role::Visitor,
            referral_code,
            referred_by,
            total_referrals: 0,
            direct_referrals: 0,
            rank: MlmRank::Associate,
            created_at: now,
            last_login: now,
        }
    }

    #[must_use]
    pub fn is_investor(&self) -> bool {
        self.role == Role::Investor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_ordering_is_promotion_order() {
        assert!(MlmRank::Associate < MlmRank::Partner);
        assert!(MlmRank::Partner < MlmRank::Director);
        assert!(MlmRank::Director < MlmRank::Executive);
    }
}
