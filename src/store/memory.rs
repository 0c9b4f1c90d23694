// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::{
    BuybackId, BuybackRequest, CoinTransaction, CoinValue, CoinValueSnapshot, Commission,
    CommissionId, Distribution, DistributionId, Holding, InvestmentId, InvestorPayout,
    PayoutId, PortfolioSummary, Project, ProjectId, ProjectInvestment, RankChange,
    RankChangeId, RedemptionId, ReferralNode, RevenueEvent, RevenueEventId,
    ServiceRedemption, ServiceTier, SnapshotId, TierId, TxId, User, UserId,
};
use crate::store::{LedgerBackend, LedgerBackendErr, LedgerBatch, Sequence, WriteOp};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use triomphe::Arc;

/// In-memory ledger backend. The whole state sits behind a single
/// `RwLock` so a commit is atomic with respect to every reader.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    users: BTreeMap<UserId, User>,
    users_by_email: BTreeMap<String, UserId>,
    users_by_code: BTreeMap<String, UserId>,
    holdings: BTreeMap<UserId, Holding>,
    transactions: BTreeMap<TxId, CoinTransaction>,
    projects: BTreeMap<ProjectId, Project>,
    investments: BTreeMap<InvestmentId, ProjectInvestment>,
    revenue_events: BTreeMap<RevenueEventId, RevenueEvent>,
    payouts: BTreeMap<PayoutId, InvestorPayout>,
    distributions: BTreeMap<DistributionId, Distribution>,
    snapshots: BTreeMap<SnapshotId, CoinValueSnapshot>,
    buybacks: BTreeMap<BuybackId, BuybackRequest>,
    tiers: BTreeMap<TierId, ServiceTier>,
    redemptions: BTreeMap<RedemptionId, ServiceRedemption>,
    referral_nodes: BTreeMap<UserId, ReferralNode>,
    commissions: BTreeMap<CommissionId, Commission>,
    rank_changes: BTreeMap<RankChangeId, RankChange>,
    summaries: BTreeMap<UserId, PortfolioSummary>,
    coin_value: Option<CoinValue>,
    sequences: BTreeMap<&'static [u8], u64>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerBackend for MemoryBackend {
    fn get_user(&self, id: UserId) -> Result<Option<User>, LedgerBackendErr> {
        Ok(self.inner.read().users.get(&id).cloned())
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>, LedgerBackendErr> {
        let inner = self.inner.read();
        match inner.users_by_email.get(email) {
            Some(id) => Ok(inner.users.get(id).cloned()),
            None => Ok(None),
        }
    }

    fn get_user_by_referral_code(
        &self,
        code: &str,
    ) -> Result<Option<User>, LedgerBackendErr> {
        let inner = self.inner.read();
        match inner.users_by_code.get(code) {
            Some(id) => Ok(inner.users.get(id).cloned()),
            None => Ok(None),
        }
    }

    fn users(&self) -> Result<Vec<User>, LedgerBackendErr> {
        Ok(self.inner.read().users.values().cloned().collect())
    }

    fn get_holding(&self, user_id: UserId) -> Result<Option<Holding>, LedgerBackendErr> {
        Ok(self.inner.read().holdings.get(&user_id).cloned())
    }

    fn holdings(&self) -> Result<Vec<Holding>, LedgerBackendErr> {
        Ok(self.inner.read().holdings.values().cloned().collect())
    }

    fn transactions_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<CoinTransaction>, LedgerBackendErr> {
        Ok(self
            .inner
            .read()
            .transactions
            .values()
            .filter(|tx| tx.user_id == user_id)
            .cloned()
            .collect())
    }

    fn transactions(&self) -> Result<Vec<CoinTransaction>, LedgerBackendErr> {
        Ok(self.inner.read().transactions.values().cloned().collect())
    }

    fn get_project(&self, id: ProjectId) -> Result<Option<Project>, LedgerBackendErr> {
        Ok(self.inner.read().projects.get(&id).cloned())
    }

    fn projects(&self) -> Result<Vec<Project>, LedgerBackendErr> {
        Ok(self.inner.read().projects.values().cloned().collect())
    }

    fn get_investment(
        &self,
        id: InvestmentId,
    ) -> Result<Option<ProjectInvestment>, LedgerBackendErr> {
        Ok(self.inner.read().investments.get(&id).cloned())
    }

    fn investments_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ProjectInvestment>, LedgerBackendErr> {
        Ok(self
            .inner
            .read()
            .investments
            .values()
            .filter(|inv| inv.project_id == project_id)
            .cloned()
            .collect())
    }

    fn investments_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ProjectInvestment>, LedgerBackendErr> {
        Ok(self
            .inner
            .read()
            .investments
            .values()
            .filter(|inv| inv.user_id == user_id)
            .cloned()
            .collect())
    }

    fn payouts_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<InvestorPayout>, LedgerBackendErr> {
        Ok(self
            .inner
            .read()
            .payouts
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    fn revenue_events_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<RevenueEvent>, LedgerBackendErr> {
        Ok(self
            .inner
            .read()
            .revenue_events
            .values()
            .filter(|ev| ev.project_id == project_id)
            .cloned()
            .collect())
    }

    fn distributions(&self) -> Result<Vec<Distribution>, LedgerBackendErr> {
        Ok(self.inner.read().distributions.values().cloned().collect())
    }

    fn coin_value(&self) -> Result<Option<CoinValue>, LedgerBackendErr> {
        Ok(self.inner.read().coin_value)
    }

    fn snapshots(&self) -> Result<Vec<CoinValueSnapshot>, LedgerBackendErr> {
        Ok(self.inner.read().snapshots.values().cloned().collect())
    }

    fn get_buyback(
        &self,
        id: BuybackId,
    ) -> Result<Option<BuybackRequest>, LedgerBackendErr> {
        Ok(self.inner.read().buybacks.get(&id).cloned())
    }

    fn buybacks_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<BuybackRequest>, LedgerBackendErr> {
        Ok(self
            .inner
            .read()
            .buybacks
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }

    fn buybacks(&self) -> Result<Vec<BuybackRequest>, LedgerBackendErr> {
        Ok(self.inner.read().buybacks.values().cloned().collect())
    }

    fn get_tier(&self, id: TierId) -> Result<Option<ServiceTier>, LedgerBackendErr> {
        Ok(self.inner.read().tiers.get(&id).cloned())
    }

    fn tiers(&self) -> Result<Vec<ServiceTier>, LedgerBackendErr> {
        Ok(self.inner.read().tiers.values().cloned().collect())
    }

    fn get_redemption(
        &self,
        id: RedemptionId,
    ) -> Result<Option<ServiceRedemption>, LedgerBackendErr> {
        Ok(self.inner.read().redemptions.get(&id).cloned())
    }

    fn redemptions_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ServiceRedemption>, LedgerBackendErr> {
        Ok(self
            .inner
            .read()
            .redemptions
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    fn get_referral_node(
        &self,
        user_id: UserId,
    ) -> Result<Option<ReferralNode>, LedgerBackendErr> {
        Ok(self.inner.read().referral_nodes.get(&user_id).cloned())
    }

    fn commissions_by_earner(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Commission>, LedgerBackendErr> {
        Ok(self
            .inner
            .read()
            .commissions
            .values()
            .filter(|c| c.earner == user_id)
            .cloned()
            .collect())
    }

    fn commissions_by_tx(&self, tx_id: TxId) -> Result<Vec<Commission>, LedgerBackendErr> {
        Ok(self
            .inner
            .read()
            .commissions
            .values()
            .filter(|c| c.from_tx == tx_id)
            .cloned()
            .collect())
    }

    fn rank_changes_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<RankChange>, LedgerBackendErr> {
        Ok(self
            .inner
            .read()
            .rank_changes
            .values()
            .filter(|rc| rc.user_id == user_id)
            .cloned()
            .collect())
    }

    fn portfolio_summary(
        &self,
        user_id: UserId,
    ) -> Result<Option<PortfolioSummary>, LedgerBackendErr> {
        Ok(self.inner.read().summaries.get(&user_id).cloned())
    }

    fn next_id(&self, seq: Sequence) -> Result<u64, LedgerBackendErr> {
        let mut inner = self.inner.write();
        let counter = inner.sequences.entry(seq.key()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    fn commit(&self, batch: LedgerBatch) -> Result<(), LedgerBackendErr> {
        let mut inner = self.inner.write();
        for op in batch {
            match op {
                WriteOp::PutUser(user) => {
                    inner.users_by_email.insert(user.email.clone(), user.id);
                    inner
                        .users_by_code
                        .insert(user.referral_code.clone(), user.id);
                    inner.users.insert(user.id, user);
                }
                WriteOp::PutHolding(holding) => {
                    inner.holdings.insert(holding.user_id, holding);
                }
                WriteOp::AppendTransaction(tx) => {
                    inner.transactions.insert(tx.id, tx);
                }
                WriteOp::PutProject(project) => {
                    inner.projects.insert(project.id, project);
                }
                WriteOp::PutInvestment(inv) => {
                    inner.investments.insert(inv.id, inv);
                }
                WriteOp::AppendRevenueEvent(ev) => {
                    inner.revenue_events.insert(ev.id, ev);
                }
                WriteOp::AppendPayout(payout) => {
                    inner.payouts.insert(payout.id, payout);
                }
                WriteOp::AppendDistribution(dist) => {
                    inner.distributions.insert(dist.id, dist);
                }
                WriteOp::AppendSnapshot(snapshot) => {
                    inner.snapshots.insert(snapshot.id, snapshot);
                }
                WriteOp::PutBuyback(req) => {
                    inner.buybacks.insert(req.id, req);
                }
                WriteOp::PutTier(tier) => {
                    inner.tiers.insert(tier.id, tier);
                }
                WriteOp::PutRedemption(redemption) => {
                    inner.redemptions.insert(redemption.id, redemption);
                }
                WriteOp::PutReferralNode(node) => {
                    inner.referral_nodes.insert(node.user_id, node);
                }
                WriteOp::AppendCommission(commission) => {
                    inner.commissions.insert(commission.id, commission);
                }
                WriteOp::AppendRankChange(change) => {
                    inner.rank_changes.insert(change.id, change);
                }
                WriteOp::PutPortfolioSummary(summary) => {
                    inner.summaries.insert(summary.user_id, summary);
                }
                WriteOp::SetCoinValue(value) => {
                    inner.coin_value = Some(value);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::Money;
    use rust_decimal_macros::dec;

    #[test]
    fn it_allocates_ids_per_sequence() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.next_id(Sequence::User).unwrap(), 1);
        assert_eq!(backend.next_id(Sequence::User).unwrap(), 2);
        assert_eq!(backend.next_id(Sequence::Project).unwrap(), 1);
    }

    #[test]
    fn it_resolves_users_through_indexes() {
        let backend = MemoryBackend::new();
        let user = User::new(1, "a@b.c".into(), "Ann".into(), "abcd1234".into(), None, 10);
        backend.commit(vec![WriteOp::PutUser(user.clone())]).unwrap();
        assert_eq!(backend.get_user_by_email("a@b.c").unwrap(), Some(user.clone()));
        assert_eq!(
            backend.get_user_by_referral_code("abcd1234").unwrap(),
            Some(user)
        );
        assert_eq!(backend.get_user_by_email("x@y.z").unwrap(), None);
    }

    #[test]
    fn it_applies_batches_in_order() {
        let backend = MemoryBackend::new();
        let holding = Holding::open(1, Money(dec!(10)), Money(dec!(100)), Money(dec!(10)), 100);
        let mut updated = holding.clone();
        updated.apply_buy(Money(dec!(5)), Money(dec!(60)), 200);
        backend
            .commit(vec![
                WriteOp::PutHolding(holding),
                WriteOp::PutHolding(updated.clone()),
            ])
            .unwrap();
        assert_eq!(backend.get_holding(1).unwrap(), Some(updated));
    }
}
