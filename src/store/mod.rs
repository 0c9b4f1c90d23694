// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Ledger storage. A backend exposes typed reads plus a single atomic
//! `commit` taking the full set of writes for one flow; no partial
//! effect of a flow is ever visible.

use crate::primitives::{
    BuybackId, BuybackRequest, CoinTransaction, CoinValue, CoinValueSnapshot, Commission,
    Distribution, Holding, InvestmentId, InvestorPayout, Money, PortfolioSummary, Project,
    ProjectId, ProjectInvestment, RankChange, RedemptionId, ReferralNode, RevenueEvent,
    ServiceRedemption, ServiceTier, TierId, TxId, User, UserId,
};
use bincode::error::DecodeError as BincodeDecodeErr;
use bincode::error::EncodeError as BincodeEncodeErr;
use rocksdb::Error as RocksDBErr;
use std::fmt;

pub mod disk;
pub mod memory;

pub use disk::DiskBackend;
pub use memory::MemoryBackend;

/// Monotonic id sequences, one per record family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    User,
    Transaction,
    Project,
    Investment,
    RevenueEvent,
    Payout,
    Distribution,
    Snapshot,
    Buyback,
    Tier,
    Redemption,
    Commission,
    RankChange,
}

impl Sequence {
    pub(crate) fn key(self) -> &'static [u8] {
        match self {
            Self::User => b"seq_user",
            Self::Transaction => b"seq_tx",
            Self::Project => b"seq_project",
            Self::Investment => b"seq_investment",
            Self::RevenueEvent => b"seq_revenue_event",
            Self::Payout => b"seq_payout",
            Self::Distribution => b"seq_distribution",
            Self::Snapshot => b"seq_snapshot",
            Self::Buyback => b"seq_buyback",
            Self::Tier => b"seq_tier",
            Self::Redemption => b"seq_redemption",
            Self::Commission => b"seq_commission",
            Self::RankChange => b"seq_rank_change",
        }
    }
}

/// One write in a flow's batch. Put variants upsert keyed state, Append
/// variants add an immutable row.
#[derive(Debug, Clone)]
pub enum WriteOp {
    PutUser(User),
    PutHolding(Holding),
    AppendTransaction(CoinTransaction),
    PutProject(Project),
    PutInvestment(ProjectInvestment),
    AppendRevenueEvent(RevenueEvent),
    AppendPayout(InvestorPayout),
    AppendDistribution(Distribution),
    AppendSnapshot(CoinValueSnapshot),
    PutBuyback(BuybackRequest),
    PutTier(ServiceTier),
    PutRedemption(ServiceRedemption),
    PutReferralNode(ReferralNode),
    AppendCommission(Commission),
    AppendRankChange(RankChange),
    PutPortfolioSummary(PortfolioSummary),
    SetCoinValue(CoinValue),
}

/// All writes of one flow, applied atomically by [`LedgerBackend::commit`].
pub type LedgerBatch = Vec<WriteOp>;

/// Storage interface for the ledger. Reads are point lookups or full
/// scans of one record family; the only write path is `commit`.
pub trait LedgerBackend: Sized + Clone {
    fn get_user(&self, id: UserId) -> Result<Option<User>, LedgerBackendErr>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>, LedgerBackendErr>;
    fn get_user_by_referral_code(&self, code: &str)
        -> Result<Option<User>, LedgerBackendErr>;
    fn users(&self) -> Result<Vec<User>, LedgerBackendErr>;

    fn get_holding(&self, user_id: UserId) -> Result<Option<Holding>, LedgerBackendErr>;
    fn holdings(&self) -> Result<Vec<Holding>, LedgerBackendErr>;

    /// Sum of coins held across every account.
    fn total_coins_outstanding(&self) -> Result<Money, LedgerBackendErr> {
        Ok(self.holdings()?.iter().map(|h| h.coins_owned).sum())
    }

    fn transactions_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<CoinTransaction>, LedgerBackendErr>;
    fn transactions(&self) -> Result<Vec<CoinTransaction>, LedgerBackendErr>;

    fn get_project(&self, id: ProjectId) -> Result<Option<Project>, LedgerBackendErr>;
    fn projects(&self) -> Result<Vec<Project>, LedgerBackendErr>;

    fn get_investment(
        &self,
        id: InvestmentId,
    ) -> Result<Option<ProjectInvestment>, LedgerBackendErr>;
    fn investments_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ProjectInvestment>, LedgerBackendErr>;
    fn investments_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ProjectInvestment>, LedgerBackendErr>;

    fn payouts_by_user(&self, user_id: UserId)
        -> Result<Vec<InvestorPayout>, LedgerBackendErr>;
    fn revenue_events_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<RevenueEvent>, LedgerBackendErr>;
    fn distributions(&self) -> Result<Vec<Distribution>, LedgerBackendErr>;

    /// Latest coin value, or `None` before any distribution.
    fn coin_value(&self) -> Result<Option<CoinValue>, LedgerBackendErr>;
    fn snapshots(&self) -> Result<Vec<CoinValueSnapshot>, LedgerBackendErr>;

    fn get_buyback(&self, id: BuybackId) -> Result<Option<BuybackRequest>, LedgerBackendErr>;
    fn buybacks_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<BuybackRequest>, LedgerBackendErr>;
    fn buybacks(&self) -> Result<Vec<BuybackRequest>, LedgerBackendErr>;

    fn get_tier(&self, id: TierId) -> Result<Option<ServiceTier>, LedgerBackendErr>;
    fn tiers(&self) -> Result<Vec<ServiceTier>, LedgerBackendErr>;
    fn get_redemption(
        &self,
        id: RedemptionId,
    ) -> Result<Option<ServiceRedemption>, LedgerBackendErr>;
    fn redemptions_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ServiceRedemption>, LedgerBackendErr>;

    fn get_referral_node(
        &self,
        user_id: UserId,
    ) -> Result<Option<ReferralNode>, LedgerBackendErr>;
    fn commissions_by_earner(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Commission>, LedgerBackendErr>;
    fn commissions_by_tx(&self, tx_id: TxId) -> Result<Vec<Commission>, LedgerBackendErr>;
    fn rank_changes_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<RankChange>, LedgerBackendErr>;

    fn portfolio_summary(
        &self,
        user_id: UserId,
    ) -> Result<Option<PortfolioSummary>, LedgerBackendErr>;

    /// Allocates the next id in a sequence. Ids start at 1.
    fn next_id(&self, seq: Sequence) -> Result<u64, LedgerBackendErr>;

    /// Applies every op in the batch or none of them.
    fn commit(&self, batch: LedgerBatch) -> Result<(), LedgerBackendErr>;
}

#[derive(Debug)]
pub enum LedgerBackendErr {
    /// Backend data is corrupted
    CorruptData,

    /// Rocksdb error
    RocksDB(RocksDBErr),

    /// Bincode encode error
    BincodeEncode(BincodeEncodeErr),

    /// Bincode decode error
    BincodeDecode(BincodeDecodeErr),

    /// Generic error
    Error(&'static str),
}

impl fmt::Display for LedgerBackendErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CorruptData => write!(f, "corrupt ledger data"),
            Self::RocksDB(err) => write!(f, "rocksdb: {err}"),
            Self::BincodeEncode(err) => write!(f, "encode: {err}"),
            Self::BincodeDecode(err) => write!(f, "decode: {err}"),
            Self::Error(err) => write!(f, "{err}"),
        }
    }
}

impl From<RocksDBErr> for LedgerBackendErr {
    fn from(other: RocksDBErr) -> Self {
        Self::RocksDB(other)
    }
}

impl From<BincodeEncodeErr> for LedgerBackendErr {
    fn from(other: BincodeEncodeErr) -> Self {
        Self::BincodeEncode(other)
    }
}

impl From<BincodeDecodeErr> for LedgerBackendErr {
    fn from(other: BincodeDecodeErr) -> Self {
        Self::BincodeDecode(other)
    }
}
