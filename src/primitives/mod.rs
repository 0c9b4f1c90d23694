// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Core ledger record types. Everything persisted by the store lives
//! here; engines in `marketplace` and `mlm` only combine these.

mod buyback;
mod holding;
mod money;
mod portfolio;
mod project;
mod referral;
mod revenue;
mod service;
mod transaction;
mod user;

pub use buyback::*;
pub use holding::*;
pub use money::*;
pub use portfolio::*;
pub use project::*;
pub use referral::*;
pub use revenue::*;
pub use service::*;
pub use transaction::*;
pub use user::*;

pub type UserId = u64;
pub type ProjectId = u64;
pub type TxId = u64;
pub type InvestmentId = u64;
pub type RevenueEventId = u64;
pub type PayoutId = u64;
pub type DistributionId = u64;
pub type SnapshotId = u64;
pub type BuybackId = u64;
pub type TierId = u64;
pub type RedemptionId = u64;
pub type CommissionId = u64;
pub type RankChangeId = u64;

/// Unix seconds. Callers pass the clock in so flows stay deterministic
/// under test.
pub type Timestamp = i64;

#[must_use]
pub fn timestamp_now() -> Timestamp {
    chrono::Utc::now().timestamp()
}
