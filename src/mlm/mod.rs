// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Referral engine. Attaches new users to the referral tree, pays
//! three-level commissions on coin purchases and promotes ranks.
//!
//! Engine functions return their writes as a batch instead of
//! committing, so a caller can fold them into the purchase's own
//! atomic commit.

use crate::primitives::{
    Commission, CommissionPayout, CommissionStatus, MlmRank, Money, RankChange, ReferralNode,
    Timestamp, TxId, User, UserId,
};
use crate::rules::bps_to_fraction;
use crate::store::{LedgerBackend, LedgerBatch, Sequence, WriteOp};
use log::info;
use rand::Rng;
use std::collections::BTreeMap;

pub use crate::marketplace::MarketErr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MlmConfig {
    /// Commission rates by ancestor level, in basis points.
    pub level_rates_bps: [u32; crate::rules::REFERRAL_LEVELS],
    pub partner_threshold: u32,
    pub director_threshold: u32,
    pub executive_threshold: u32,
}

impl Default for MlmConfig {
    fn default() -> Self {
        Self {
            level_rates_bps: crate::rules::COMMISSION_RATES_BPS,
            partner_threshold: crate::rules::PARTNER_DIRECT_REFERRALS,
            director_threshold: crate::rules::DIRECTOR_DIRECT_REFERRALS,
            executive_threshold: crate::rules::EXECUTIVE_DIRECT_REFERRALS,
        }
    }
}

impl MlmConfig {
    #[must_use]
    pub fn from_settings() -> Self {
        let settings = &crate::settings::SETTINGS.mlm;
        Self {
            level_rates_bps: [
                settings.level_1_rate_bps,
                settings.level_2_rate_bps,
                settings.level_3_rate_bps,
            ],
            partner_threshold: settings.partner_threshold,
            director_threshold: settings.director_threshold,
            executive_threshold: settings.executive_threshold,
        }
    }
}

/// Random lowercase alphanumeric referral code.
#[must_use]
pub fn generate_referral_code() -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..crate::rules::REFERRAL_CODE_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Rank reached with `direct` lifetime direct referrals, given the
/// current rank. Rules are checked top down and the first hit wins.
///
/// Note the second rule: a partner is promoted to director on any
/// purchase by a direct referral, regardless of the count. Existing
/// downlines depend on this, so it stays.
#[must_use]
pub fn promoted_rank(cfg: &MlmConfig, direct: u32, current: MlmRank) -> MlmRank {
    if direct >= cfg.executive_threshold && current != MlmRank::Executive {
        MlmRank::Executive
    } else if (direct >= cfg.director_threshold && current == MlmRank::Associate)
        || current == MlmRank::Partner
    {
        MlmRank::Director
    } else if direct >= cfg.partner_threshold && current == MlmRank::Associate {
        MlmRank::Partner
    } else {
        current
    }
}

/// Places a new user under their referrer.
///
/// The ancestry is snapshotted from the referrer's own node at this
/// moment and never rewritten. Ancestors that have a tree row of their
/// own get their network size bumped; a referrer who was never referred
/// has no row and is skipped, matching the lifetime counters on the user
/// record being the source of truth for rank.
pub fn attach_referral<B: LedgerBackend>(
    backend: &B,
    user_id: UserId,
    referrer_id: UserId,
    now: Timestamp,
) -> Result<(ReferralNode, LedgerBatch), MarketErr> {
    let parent = backend.get_referral_node(referrer_id)?;
    let node = ReferralNode::attach(user_id, parent.as_ref(), referrer_id, now);

    let mut batch: LedgerBatch = vec![WriteOp::PutReferralNode(node.clone())];
    for level in 1..=crate::rules::REFERRAL_LEVELS as u8 {
        let Some(ancestor_id) = node.ancestor_at(level) else {
            break;
        };
        if let Some(mut ancestor) = backend.get_referral_node(ancestor_id)? {
            ancestor.network_size += 1;
            ancestor.updated_at = now;
            batch.push(WriteOp::PutReferralNode(ancestor));
        }
    }

    Ok((node, batch))
}

/// Commissions produced by one coin purchase, paired with the writes
/// that record them.
#[derive(Debug)]
pub struct CommissionRun {
    pub commissions: Vec<Commission>,
    pub rank_changes: Vec<RankChange>,
    pub batch: LedgerBatch,
}

/// Awards up to three upline commissions for a purchase.
///
/// Every awarded commission bumps the earner's lifetime referral
/// counter; a level-1 award additionally bumps the direct counter and
/// re-evaluates the earner's rank. Missing upline levels simply award
/// nothing.
pub fn award_commissions<B: LedgerBackend>(
    backend: &B,
    cfg: &MlmConfig,
    buyer: &User,
    tx_id: TxId,
    coins: Money,
    coin_value: Money,
    total: Money,
    now: Timestamp,
) -> Result<CommissionRun, MarketErr> {
    let mut run = CommissionRun {
        commissions: Vec::new(),
        rank_changes: Vec::new(),
        batch: Vec::new(),
    };
    let Some(node) = backend.get_referral_node(buyer.id)? else {
        return Ok(run);
    };

    // Earners are staged here so an ancestor appearing at two levels of
    // a degenerate tree is only written once, with both bumps applied.
    let mut earners: BTreeMap<UserId, User> = BTreeMap::new();

    for level in 1..=crate::rules::REFERRAL_LEVELS as u8 {
        let Some(ancestor_id) = node.ancestor_at(level) else {
            break;
        };
        let earner = match earners.get(&ancestor_id) {
            Some(staged) => Some(staged.clone()),
            None => backend.get_user(ancestor_id)?,
        };
        let Some(mut earner) = earner else {
            continue;
        };

        let rate_bps = cfg.level_rates_bps[usize::from(level) - 1];
        let amount = total * bps_to_fraction(rate_bps);
        let commission = Commission {
            id: backend.next_id(Sequence::Commission)?,
            earner: earner.id,
            from_user: buyer.id,
            from_tx: tx_id,
            level,
            rate_bps,
            coins_purchased: coins,
            coin_value,
            base_amount: total,
            amount,
            status: CommissionStatus::Pending,
            payout: CommissionPayout::Reinvest,
            created_at: now,
        };
        run.batch.push(WriteOp::AppendCommission(commission.clone()));
        run.commissions.push(commission);

        earner.total_referrals += 1;
        if level == 1 {
            earner.direct_referrals += 1;
            let new_rank = promoted_rank(cfg, earner.direct_referrals, earner.rank);
            if new_rank != earner.rank {
                info!(
                    "user {} promoted {} -> {} at {} direct referrals",
                    earner.id, earner.rank, new_rank, earner.direct_referrals
                );
                let change = RankChange {
                    id: backend.next_id(Sequence::RankChange)?,
                    user_id: earner.id,
                    previous_rank: earner.rank,
                    new_rank,
                    direct_referrals_at_change: u64::from(earner.direct_referrals),
                    created_at: now,
                };
                run.batch.push(WriteOp::AppendRankChange(change.clone()));
                run.rank_changes.push(change);
                earner.rank = new_rank;
            }
        }
        earners.insert(earner.id, earner);
    }

    for earner in earners.into_values() {
        run.batch.push(WriteOp::PutUser(earner));
    }

    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;
    use rust_decimal_macros::dec;

    fn user(id: UserId, code: &str) -> User {
        User::new(
            id,
            format!("u{id}@coinvest.test"),
            format!("User {id}"),
            code.into(),
            None,
            0,
        )
    }

    fn seed_chain(backend: &MemoryBackend) -> User {
        // 1 <- 2 <- 3 <- 4; user 4 is the buyer.
        let mut batch = Vec::new();
        for id in 1..=4 {
            batch.push(WriteOp::PutUser(user(id, &format!("code{id}"))));
        }
        backend.commit(batch).unwrap();
        for (child, parent) in [(2, 1), (3, 2), (4, 3)] {
            let (_, batch) = attach_referral(backend, child, parent, 0).unwrap();
            backend.commit(batch).unwrap();
        }
        backend.get_user(4).unwrap().unwrap()
    }

    #[test]
    fn it_generates_codes_of_fixed_length() {
        let code = generate_referral_code();
        assert_eq!(code.len(), crate::rules::REFERRAL_CODE_LEN);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn it_awards_ten_three_two_percent() {
        let backend = MemoryBackend::new();
        let buyer = seed_chain(&backend);
        let run = award_commissions(
            &backend,
            &MlmConfig::default(),
            &buyer,
            1,
            Money(dec!(10)),
            Money(dec!(10)),
            Money(dec!(100)),
            50,
        )
        .unwrap();
        backend.commit(run.batch).unwrap();

        assert_eq!(run.commissions.len(), 3);
        assert_eq!(run.commissions[0].earner, 3);
        assert_eq!(run.commissions[0].amount, Money(dec!(10.00)));
        assert_eq!(run.commissions[1].earner, 2);
        assert_eq!(run.commissions[1].amount, Money(dec!(3.00)));
        assert_eq!(run.commissions[2].earner, 1);
        assert_eq!(run.commissions[2].amount, Money(dec!(2.00)));
    }

    #[test]
    fn it_bumps_direct_only_on_level_one() {
        let backend = MemoryBackend::new();
        let buyer = seed_chain(&backend);
        let run = award_commissions(
            &backend,
            &MlmConfig::default(),
            &buyer,
            1,
            Money(dec!(1)),
            Money(dec!(10)),
            Money(dec!(10)),
            50,
        )
        .unwrap();
        backend.commit(run.batch).unwrap();

        let level_1 = backend.get_user(3).unwrap().unwrap();
        let level_2 = backend.get_user(2).unwrap().unwrap();
        assert_eq!(level_1.direct_referrals, 1);
        assert_eq!(level_1.total_referrals, 1);
        assert_eq!(level_2.direct_referrals, 0);
        assert_eq!(level_2.total_referrals, 1);
    }

    #[test]
    fn it_awards_nothing_without_a_node() {
        let backend = MemoryBackend::new();
        let buyer = user(9, "lonecode9");
        backend.commit(vec![WriteOp::PutUser(buyer.clone())]).unwrap();
        let run = award_commissions(
            &backend,
            &MlmConfig::default(),
            &buyer,
            1,
            Money(dec!(1)),
            Money(dec!(10)),
            Money(dec!(10)),
            50,
        )
        .unwrap();
        assert!(run.commissions.is_empty());
        assert!(run.batch.is_empty());
    }

    #[test]
    fn network_size_bumps_only_existing_rows() {
        let backend = MemoryBackend::new();
        for id in 1..=3 {
            backend
                .commit(vec![WriteOp::PutUser(user(id, &format!("code{id}")))])
                .unwrap();
        }
        // 1 never has a node of its own.
        let (_, batch) = attach_referral(&backend, 2, 1, 0).unwrap();
        backend.commit(batch).unwrap();
        let (_, batch) = attach_referral(&backend, 3, 2, 0).unwrap();
        backend.commit(batch).unwrap();

        assert!(backend.get_referral_node(1).unwrap().is_none());
        let node_2 = backend.get_referral_node(2).unwrap().unwrap();
        assert_eq!(node_2.network_size, 1);
    }

    #[test]
    fn ancestry_is_a_signup_snapshot() {
        let backend = MemoryBackend::new();
        let buyer = seed_chain(&backend);
        // A later signup under 1 changes nothing for 4's recorded chain.
        backend
            .commit(vec![WriteOp::PutUser(user(5, "code5"))])
            .unwrap();
        let (_, batch) = attach_referral(&backend, 5, 1, 10).unwrap();
        backend.commit(batch).unwrap();

        let node = backend.get_referral_node(buyer.id).unwrap().unwrap();
        assert_eq!(node.ancestor_at(1), Some(3));
        assert_eq!(node.ancestor_at(2), Some(2));
        assert_eq!(node.ancestor_at(3), Some(1));
    }

    #[test]
    fn rank_rules_first_match_wins() {
        let cfg = MlmConfig::default();
        assert_eq!(promoted_rank(&cfg, 0, MlmRank::Associate), MlmRank::Associate);
        assert_eq!(promoted_rank(&cfg, 6, MlmRank::Associate), MlmRank::Partner);
        assert_eq!(promoted_rank(&cfg, 16, MlmRank::Associate), MlmRank::Director);
        assert_eq!(promoted_rank(&cfg, 31, MlmRank::Associate), MlmRank::Executive);
        assert_eq!(promoted_rank(&cfg, 31, MlmRank::Director), MlmRank::Executive);
        assert_eq!(promoted_rank(&cfg, 31, MlmRank::Executive), MlmRank::Executive);
    }

    #[test]
    fn partner_is_promoted_on_any_direct_purchase() {
        // The director rule matches every partner below the executive
        // threshold, whatever the direct count.
        let cfg = MlmConfig::default();
        assert_eq!(promoted_rank(&cfg, 7, MlmRank::Partner), MlmRank::Director);
        assert_eq!(promoted_rank(&cfg, 1, MlmRank::Partner), MlmRank::Director);
        assert_eq!(promoted_rank(&cfg, 17, MlmRank::Director), MlmRank::Director);
    }
}
