// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::{
    BuybackId, BuybackRequest, CoinTransaction, CoinValue, CoinValueSnapshot, Commission,
    Distribution, Holding, InvestmentId, InvestorPayout, PortfolioSummary, Project,
    ProjectId, ProjectInvestment, RankChange, RedemptionId, ReferralNode, RevenueEvent,
    ServiceRedemption, ServiceTier, TierId, TxId, User, UserId,
};
use crate::store::{LedgerBackend, LedgerBackendErr, LedgerBatch, Sequence, WriteOp};
use rocksdb::{
    ColumnFamilyDescriptor, Direction, IteratorMode, LogLevel, MultiThreaded, Options,
    TransactionDB, TransactionDBOptions,
};
use std::path::PathBuf;
use std::str::FromStr;
use triomphe::Arc;

pub type DB = TransactionDB<MultiThreaded>;

pub const USERS_CF: &str = "users";
pub const HOLDINGS_CF: &str = "holdings";
pub const MARKET_CF: &str = "market";
pub const PROJECTS_CF: &str = "projects";
pub const REVENUE_CF: &str = "revenue";
pub const MLM_CF: &str = "mlm";
pub const META_CF: &str = "meta";

const COIN_VALUE_KEY: &[u8] = b"coin_value";

/// Rocksdb-backed ledger. Every flow commits through one rocksdb
/// transaction, so readers never observe a half-applied batch.
///
/// Keys are a short type prefix followed by big-endian ids; secondary
/// indexes embed the owning id before the record id so that by-user and
/// by-project reads are prefix scans.
#[derive(Clone)]
pub struct DiskBackend {
    db: Arc<DB>,
}

fn key(prefix: &[u8], id: u64) -> Vec<u8> {
    [prefix, &id.to_be_bytes()].concat()
}

fn index_key(prefix: &[u8], owner: u64, id: u64) -> Vec<u8> {
    [prefix, &owner.to_be_bytes(), &id.to_be_bytes()].concat()
}

fn index_tail(key: &[u8]) -> Result<u64, LedgerBackendErr> {
    if key.len() < 8 {
        return Err(LedgerBackendErr::CorruptData);
    }
    let mut buf = [0; 8];
    buf.copy_from_slice(&key[key.len() - 8..]);
    Ok(u64::from_be_bytes(buf))
}

impl DiskBackend {
    #[must_use]
    pub fn new(db: Arc<DB>) -> Self {
        Self { db }
    }

    fn get_decode<T: bincode::Decode>(
        &self,
        cf: &str,
        k: &[u8],
    ) -> Result<Option<T>, LedgerBackendErr> {
        let cf = self.db.cf_handle(cf).unwrap();
        match self.db.get_cf(&cf, k)? {
            Some(bytes) => Ok(Some(crate::codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Decodes every value under a key prefix, in key order.
    fn scan_decode<T: bincode::Decode>(
        &self,
        cf: &str,
        prefix: &[u8],
    ) -> Result<Vec<T>, LedgerBackendErr> {
        let cf = self.db.cf_handle(cf).unwrap();
        let mut out = Vec::new();
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, Direction::Forward));
        for entry in iter {
            let (k, v) = entry?;
            if !k.starts_with(prefix) {
                break;
            }
            // Records sit at prefix + 8-byte id; anything longer under
            // the same first byte is an index entry.
            if k.len() != prefix.len() + 8 {
                continue;
            }
            out.push(crate::codec::decode(&v)?);
        }
        Ok(out)
    }

    /// Walks an index prefix and resolves each referenced primary record.
    fn scan_index<T: bincode::Decode>(
        &self,
        idx_cf: &str,
        prefix: &[u8],
        primary_cf: &str,
        primary_prefix: &[u8],
    ) -> Result<Vec<T>, LedgerBackendErr> {
        let cf = self.db.cf_handle(idx_cf).unwrap();
        let mut out = Vec::new();
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, Direction::Forward));
        for entry in iter {
            let (k, _) = entry?;
            if !k.starts_with(prefix) {
                break;
            }
            let id = index_tail(&k)?;
            match self.get_decode(primary_cf, &key(primary_prefix, id))? {
                Some(record) => out.push(record),
                None => return Err(LedgerBackendErr::CorruptData),
            }
        }
        Ok(out)
    }

    fn get_by_unique_index(
        &self,
        idx_key: &[u8],
    ) -> Result<Option<User>, LedgerBackendErr> {
        let cf = self.db.cf_handle(USERS_CF).unwrap();
        match self.db.get_cf(&cf, idx_key)? {
            Some(bytes) => {
                if bytes.len() != 8 {
                    return Err(LedgerBackendErr::CorruptData);
                }
                let mut buf = [0; 8];
                buf.copy_from_slice(&bytes);
                self.get_user(u64::from_be_bytes(buf))
            }
            None => Ok(None),
        }
    }
}

impl LedgerBackend for DiskBackend {
    fn get_user(&self, id: UserId) -> Result<Option<User>, LedgerBackendErr> {
        self.get_decode(USERS_CF, &key(b"u", id))
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>, LedgerBackendErr> {
        self.get_by_unique_index(&[b"e", email.as_bytes()].concat())
    }

    fn get_user_by_referral_code(
        &self,
        code: &str,
    ) -> Result<Option<User>, LedgerBackendErr> {
        self.get_by_unique_index(&[b"c", code.as_bytes()].concat())
    }

    fn users(&self) -> Result<Vec<User>, LedgerBackendErr> {
        self.scan_decode(USERS_CF, b"u")
    }

    fn get_holding(&self, user_id: UserId) -> Result<Option<Holding>, LedgerBackendErr> {
        self.get_decode(HOLDINGS_CF, &key(b"h", user_id))
    }

    fn holdings(&self) -> Result<Vec<Holding>, LedgerBackendErr> {
        self.scan_decode(HOLDINGS_CF, b"h")
    }

    fn transactions_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<CoinTransaction>, LedgerBackendErr> {
        self.scan_index(MARKET_CF, &key(b"ut", user_id), MARKET_CF, b"t")
    }

    fn transactions(&self) -> Result<Vec<CoinTransaction>, LedgerBackendErr> {
        self.scan_decode(MARKET_CF, b"t")
    }

    fn get_project(&self, id: ProjectId) -> Result<Option<Project>, LedgerBackendErr> {
        self.get_decode(PROJECTS_CF, &key(b"p", id))
    }

    fn projects(&self) -> Result<Vec<Project>, LedgerBackendErr> {
        self.scan_decode(PROJECTS_CF, b"p")
    }

    fn get_investment(
        &self,
        id: InvestmentId,
    ) -> Result<Option<ProjectInvestment>, LedgerBackendErr> {
        self.get_decode(PROJECTS_CF, &key(b"i", id))
    }

    fn investments_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ProjectInvestment>, LedgerBackendErr> {
        self.scan_index(PROJECTS_CF, &key(b"pi", project_id), PROJECTS_CF, b"i")
    }

    fn investments_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ProjectInvestment>, LedgerBackendErr> {
        self.scan_index(PROJECTS_CF, &key(b"ui", user_id), PROJECTS_CF, b"i")
    }

    fn payouts_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<InvestorPayout>, LedgerBackendErr> {
        self.scan_index(REVENUE_CF, &key(b"uy", user_id), REVENUE_CF, b"y")
    }

    fn revenue_events_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<RevenueEvent>, LedgerBackendErr> {
        self.scan_index(REVENUE_CF, &key(b"pe", project_id), REVENUE_CF, b"e")
    }

    fn distributions(&self) -> Result<Vec<Distribution>, LedgerBackendErr> {
        self.scan_decode(REVENUE_CF, b"d")
    }

    fn coin_value(&self) -> Result<Option<CoinValue>, LedgerBackendErr> {
        self.get_decode(META_CF, COIN_VALUE_KEY)
    }

    fn snapshots(&self) -> Result<Vec<CoinValueSnapshot>, LedgerBackendErr> {
        self.scan_decode(REVENUE_CF, b"s")
    }

    fn get_buyback(
        &self,
        id: BuybackId,
    ) -> Result<Option<BuybackRequest>, LedgerBackendErr> {
        self.get_decode(MARKET_CF, &key(b"b", id))
    }

    fn buybacks_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<BuybackRequest>, LedgerBackendErr> {
        self.scan_index(MARKET_CF, &key(b"ub", user_id), MARKET_CF, b"b")
    }

    fn buybacks(&self) -> Result<Vec<BuybackRequest>, LedgerBackendErr> {
        self.scan_decode(MARKET_CF, b"b")
    }

    fn get_tier(&self, id: TierId) -> Result<Option<ServiceTier>, LedgerBackendErr> {
        self.get_decode(MARKET_CF, &key(b"s", id))
    }

    fn tiers(&self) -> Result<Vec<ServiceTier>, LedgerBackendErr> {
        self.scan_decode(MARKET_CF, b"s")
    }

    fn get_redemption(
        &self,
        id: RedemptionId,
    ) -> Result<Option<ServiceRedemption>, LedgerBackendErr> {
        self.get_decode(MARKET_CF, &key(b"r", id))
    }

    fn redemptions_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ServiceRedemption>, LedgerBackendErr> {
        self.scan_index(MARKET_CF, &key(b"ur", user_id), MARKET_CF, b"r")
    }

    fn get_referral_node(
        &self,
        user_id: UserId,
    ) -> Result<Option<ReferralNode>, LedgerBackendErr> {
        self.get_decode(MLM_CF, &key(b"n", user_id))
    }

    fn commissions_by_earner(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Commission>, LedgerBackendErr> {
        self.scan_index(MLM_CF, &key(b"ec", user_id), MLM_CF, b"c")
    }

    fn commissions_by_tx(&self, tx_id: TxId) -> Result<Vec<Commission>, LedgerBackendErr> {
        self.scan_index(MLM_CF, &key(b"tc", tx_id), MLM_CF, b"c")
    }

    fn rank_changes_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<RankChange>, LedgerBackendErr> {
        self.scan_index(MLM_CF, &key(b"ur", user_id), MLM_CF, b"r")
    }

    fn portfolio_summary(
        &self,
        user_id: UserId,
    ) -> Result<Option<PortfolioSummary>, LedgerBackendErr> {
        self.get_decode(HOLDINGS_CF, &key(b"ps", user_id))
    }

    fn next_id(&self, seq: Sequence) -> Result<u64, LedgerBackendErr> {
        let tx = self.db.transaction();
        let meta_cf = self.db.cf_handle(META_CF).unwrap();
        let next = tx
            .get_for_update_cf(&meta_cf, seq.key(), true)?
            .map(|bytes| {
                let mut buf = [0; 8];
                buf.copy_from_slice(&bytes);
                u64::from_be_bytes(buf)
            })
            .unwrap_or(0)
            + 1;
        tx.put_cf(&meta_cf, seq.key(), next.to_be_bytes())?;
        tx.commit()?;
        Ok(next)
    }

    fn commit(&self, batch: LedgerBatch) -> Result<(), LedgerBackendErr> {
        let tx = self.db.transaction();
        let users_cf = self.db.cf_handle(USERS_CF).unwrap();
        let holdings_cf = self.db.cf_handle(HOLDINGS_CF).unwrap();
        let market_cf = self.db.cf_handle(MARKET_CF).unwrap();
        let projects_cf = self.db.cf_handle(PROJECTS_CF).unwrap();
        let revenue_cf = self.db.cf_handle(REVENUE_CF).unwrap();
        let mlm_cf = self.db.cf_handle(MLM_CF).unwrap();
        let meta_cf = self.db.cf_handle(META_CF).unwrap();

        for op in &batch {
            match op {
                WriteOp::PutUser(user) => {
                    tx.put_cf(
                        &users_cf,
                        [b"e", user.email.as_bytes()].concat(),
                        user.id.to_be_bytes(),
                    )?;
                    tx.put_cf(
                        &users_cf,
                        [b"c", user.referral_code.as_bytes()].concat(),
                        user.id.to_be_bytes(),
                    )?;
                    tx.put_cf(
                        &users_cf,
                        key(b"u", user.id),
                        crate::codec::encode_to_vec(user)?,
                    )?;
                }
                WriteOp::PutHolding(holding) => {
                    tx.put_cf(
                        &holdings_cf,
                        key(b"h", holding.user_id),
                        crate::codec::encode_to_vec(holding)?,
                    )?;
                }
                WriteOp::AppendTransaction(record) => {
                    tx.put_cf(
                        &market_cf,
                        key(b"t", record.id),
                        crate::codec::encode_to_vec(record)?,
                    )?;
                    tx.put_cf(&market_cf, index_key(b"ut", record.user_id, record.id), [])?;
                }
                WriteOp::PutProject(project) => {
                    tx.put_cf(
                        &projects_cf,
                        key(b"p", project.id),
                        crate::codec::encode_to_vec(project)?,
                    )?;
                }
                WriteOp::PutInvestment(inv) => {
                    tx.put_cf(
                        &projects_cf,
                        key(b"i", inv.id),
                        crate::codec::encode_to_vec(inv)?,
                    )?;
                    tx.put_cf(&projects_cf, index_key(b"pi", inv.project_id, inv.id), [])?;
                    tx.put_cf(&projects_cf, index_key(b"ui", inv.user_id, inv.id), [])?;
                }
                WriteOp::AppendRevenueEvent(ev) => {
                    tx.put_cf(
                        &revenue_cf,
                        key(b"e", ev.id),
                        crate::codec::encode_to_vec(ev)?,
                    )?;
                    tx.put_cf(&revenue_cf, index_key(b"pe", ev.project_id, ev.id), [])?;
                }
                WriteOp::AppendPayout(payout) => {
                    tx.put_cf(
                        &revenue_cf,
                        key(b"y", payout.id),
                        crate::codec::encode_to_vec(payout)?,
                    )?;
                    tx.put_cf(&revenue_cf, index_key(b"uy", payout.user_id, payout.id), [])?;
                }
                WriteOp::AppendDistribution(dist) => {
                    tx.put_cf(
                        &revenue_cf,
                        key(b"d", dist.id),
                        crate::codec::encode_to_vec(dist)?,
                    )?;
                }
                WriteOp::AppendSnapshot(snapshot) => {
                    tx.put_cf(
                        &revenue_cf,
                        key(b"s", snapshot.id),
                        crate::codec::encode_to_vec(snapshot)?,
                    )?;
                }
                WriteOp::PutBuyback(req) => {
                    tx.put_cf(
                        &market_cf,
                        key(b"b", req.id),
                        crate::codec::encode_to_vec(req)?,
                    )?;
                    tx.put_cf(&market_cf, index_key(b"ub", req.user_id, req.id), [])?;
                }
                WriteOp::PutTier(tier) => {
                    tx.put_cf(
                        &market_cf,
                        key(b"s", tier.id),
                        crate::codec::encode_to_vec(tier)?,
                    )?;
                }
                WriteOp::PutRedemption(redemption) => {
                    tx.put_cf(
                        &market_cf,
                        key(b"r", redemption.id),
                        crate::codec::encode_to_vec(redemption)?,
                    )?;
                    tx.put_cf(
                        &market_cf,
                        index_key(b"ur", redemption.user_id, redemption.id),
                        [],
                    )?;
                }
                WriteOp::PutReferralNode(node) => {
                    tx.put_cf(
                        &mlm_cf,
                        key(b"n", node.user_id),
                        crate::codec::encode_to_vec(node)?,
                    )?;
                }
                WriteOp::AppendCommission(commission) => {
                    tx.put_cf(
                        &mlm_cf,
                        key(b"c", commission.id),
                        crate::codec::encode_to_vec(commission)?,
                    )?;
                    tx.put_cf(
                        &mlm_cf,
                        index_key(b"ec", commission.earner, commission.id),
                        [],
                    )?;
                    tx.put_cf(
                        &mlm_cf,
                        index_key(b"tc", commission.from_tx, commission.id),
                        [],
                    )?;
                }
                WriteOp::AppendRankChange(change) => {
                    tx.put_cf(
                        &mlm_cf,
                        key(b"r", change.id),
                        crate::codec::encode_to_vec(change)?,
                    )?;
                    tx.put_cf(&mlm_cf, index_key(b"ur", change.user_id, change.id), [])?;
                }
                WriteOp::PutPortfolioSummary(summary) => {
                    tx.put_cf(
                        &holdings_cf,
                        key(b"ps", summary.user_id),
                        crate::codec::encode_to_vec(summary)?,
                    )?;
                }
                WriteOp::SetCoinValue(value) => {
                    tx.put_cf(&meta_cf, COIN_VALUE_KEY, crate::codec::encode_to_vec(value)?)?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
}

#[must_use]
pub fn create_rocksdb_ledger() -> Arc<DB> {
    #[cfg(not(test))]
    let mut path = PathBuf::from_str(&crate::settings::SETTINGS.store.data_dir).unwrap();

    #[cfg(test)]
    let mut path = {
        use rand::Rng;
        let mut path = std::env::temp_dir();
        path.push(hex::encode(rand::thread_rng().gen::<[u8; 32]>()));
        path.push("Coinvest");
        path
    };

    path.push(&crate::settings::SETTINGS.store.instance_name);
    path.push("data");

    let mut cf_opts = Options::default();
    cf_opts.set_max_write_buffer_number(3);
    let cfs = vec![
        ColumnFamilyDescriptor::new(USERS_CF, cf_opts.clone()),
        ColumnFamilyDescriptor::new(HOLDINGS_CF, cf_opts.clone()),
        ColumnFamilyDescriptor::new(MARKET_CF, cf_opts.clone()),
        ColumnFamilyDescriptor::new(PROJECTS_CF, cf_opts.clone()),
        ColumnFamilyDescriptor::new(REVENUE_CF, cf_opts.clone()),
        ColumnFamilyDescriptor::new(MLM_CF, cf_opts.clone()),
        ColumnFamilyDescriptor::new(META_CF, cf_opts),
    ];

    let mut db_opts = Options::default();
    db_opts.create_missing_column_families(true);
    db_opts.create_if_missing(true);
    db_opts.set_log_level(LogLevel::Warn);
    db_opts.set_keep_log_file_num(1);
    let db =
        DB::open_cf_descriptors(&db_opts, &TransactionDBOptions::default(), path, cfs).unwrap();
    Arc::new(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{InvestmentStatus, Money, ProjectStatus};
    use rust_decimal_macros::dec;

    fn backend() -> DiskBackend {
        DiskBackend::new(create_rocksdb_ledger())
    }

    fn project(id: ProjectId) -> Project {
        Project {
            id,
            name: format!("Project {id}"),
            description: String::new(),
            client_name: None,
            target_capital: None,
            current_funding: Money(dec!(0)),
            investor_count: 0,
            cost: Money(dec!(1000)),
            expected_revenue: Money(dec!(1500)),
            actual_revenue: None,
            profit: None,
            min_investment: None,
            max_investment: None,
            status: ProjectStatus::Funding,
            created_at: 0,
            completed_at: None,
        }
    }

    fn investment(id: InvestmentId, user_id: UserId, project_id: ProjectId) -> ProjectInvestment {
        ProjectInvestment {
            id,
            user_id,
            project_id,
            coins: Money(dec!(10)),
            amount_eur: Money(dec!(100)),
            price_at_investment: Money(dec!(10)),
            status: InvestmentStatus::Active,
            created_at: 0,
        }
    }

    #[test]
    fn it_scans_projects_past_investment_index_entries() {
        let backend = backend();
        backend
            .commit(vec![
                WriteOp::PutProject(project(1)),
                WriteOp::PutProject(project(2)),
                WriteOp::PutInvestment(investment(1, 7, 1)),
                WriteOp::PutInvestment(investment(2, 7, 2)),
            ])
            .unwrap();

        let projects = backend.projects().unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].id, 1);
        assert_eq!(projects[1].id, 2);
        assert_eq!(backend.investments_by_project(2).unwrap().len(), 1);
        assert_eq!(backend.investments_by_user(7).unwrap().len(), 2);
    }
}
