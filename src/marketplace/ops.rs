// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! User-facing marketplace operations. Each entry point validates,
//! stages its writes and commits them as one batch.

use crate::marketplace::portfolio::build_summary;
use crate::marketplace::valuation::{current_coin_value, dynamic_coin_value};
use crate::marketplace::{MarketConfig, MarketErr};
use crate::mlm::{attach_referral, award_commissions, generate_referral_code, MlmConfig};
use crate::rules::money_check;
use crate::primitives::{
    BuybackAction, BuybackId, BuybackRequest, BuybackStatus, CoinTransaction, CoinValue,
    CoinValueSnapshot, Commission, Holding, Money, PortfolioSummary, Project, ProjectId,
    ProjectInvestment, ProjectStatus, RankChange, RedemptionAction, RedemptionId,
    RedemptionStatus, Role, ServiceRedemption, ServiceTier, TierId, Timestamp, User, UserId,
};
use crate::store::{LedgerBackend, Sequence, WriteOp};
use log::{info, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Logs a user in by email, creating the account on first sight.
///
/// A new account gets a fresh referral code. If a referrer's code is
/// presented it is resolved and the account is attached to that
/// referrer's tree in the same commit; an unknown code is ignored
/// rather than failing the login.
pub fn login<B: LedgerBackend>(
    backend: &B,
    email: &str,
    name: &str,
    referral_code: Option<&str>,
    now: Timestamp,
) -> Result<User, MarketErr> {
    if let Some(mut user) = backend.get_user_by_email(email)? {
        user.last_login = now;
        backend.commit(vec![WriteOp::PutUser(user.clone())])?;
        return Ok(user);
    }

    let referrer = match referral_code {
        Some(code) => {
            let referrer = backend.get_user_by_referral_code(code)?;
            if referrer.is_none() {
                warn!("signup with unknown referral code {code}");
            }
            referrer
        }
        None => None,
    };

    let mut own_code = generate_referral_code();
    while backend.get_user_by_referral_code(&own_code)?.is_some() {
        own_code = generate_referral_code();
    }

    let user = User::new(
        backend.next_id(Sequence::User)?,
        email.to_owned(),
        name.to_owned(),
        own_code,
        referrer.as_ref().map(|r| r.id),
        now,
    );

    let mut batch = vec![WriteOp::PutUser(user.clone())];
    if let Some(referrer) = referrer {
        let (_, referral_batch) = attach_referral(backend, user.id, referrer.id, now)?;
        batch.extend(referral_batch);
    }
    backend.commit(batch)?;
    info!("created user {} ({})", user.id, user.email);
    Ok(user)
}

#[derive(Debug)]
pub struct BuyOutcome {
    pub user: User,
    pub holding: Holding,
    pub transaction: CoinTransaction,
    pub commissions: Vec<Commission>,
    pub rank_changes: Vec<RankChange>,
}

/// Buys coins at the current committed coin value.
///
/// The buyer becomes an investor on their first purchase. Upline
/// commissions and any rank promotion they trigger land in the same
/// commit as the purchase itself.
pub fn buy_coins<B: LedgerBackend>(
    backend: &B,
    cfg: &MarketConfig,
    mlm_cfg: &MlmConfig,
    user_id: UserId,
    coins: Money,
    payment_method: &str,
    now: Timestamp,
) -> Result<BuyOutcome, MarketErr> {
    if !coins.is_positive() || coins < cfg.min_buy_coins {
        return Err(MarketErr::InvalidAmount);
    }
    let mut user = backend.get_user(user_id)?.ok_or(MarketErr::UserNotFound)?;

    let price = current_coin_value(backend, cfg)?.value;
    let total = coins * price;

    let holding = match backend.get_holding(user_id)? {
        Some(mut holding) => {
            holding.apply_buy(coins, total, now);
            holding
        }
        None => Holding::open(user_id, coins, total, price, now),
    };

    let transaction = CoinTransaction::buy(
        backend.next_id(Sequence::Transaction)?,
        user_id,
        coins,
        price,
        total,
        payment_method,
        now,
    );

    if user.role == Role::Visitor {
        user.role = Role::Investor;
    }

    let run = award_commissions(
        backend,
        mlm_cfg,
        &user,
        transaction.id,
        coins,
        price,
        total,
        now,
    )?;

    let mut batch = vec![
        WriteOp::PutUser(user.clone()),
        WriteOp::PutHolding(holding.clone()),
        WriteOp::AppendTransaction(transaction.clone()),
    ];
    batch.extend(run.batch);
    backend.commit(batch)?;

    info!(
        "user {} bought {} coins at {} ({} total, {} commissions)",
        user_id,
        coins,
        price,
        total,
        run.commissions.len()
    );

    Ok(BuyOutcome {
        user,
        holding,
        transaction,
        commissions: run.commissions,
        rank_changes: run.rank_changes,
    })
}

/// Opens a buyback request at the current coin value.
///
/// The balance is only checked here; coins stay in the holding until an
/// operator approves the request.
pub fn request_buyback<B: LedgerBackend>(
    backend: &B,
    cfg: &MarketConfig,
    user_id: UserId,
    coins: Money,
    now: Timestamp,
) -> Result<BuybackRequest, MarketErr> {
    if !coins.is_positive() {
        return Err(MarketErr::InvalidAmount);
    }
    let holding = backend
        .get_holding(user_id)?
        .ok_or(MarketErr::HoldingNotFound)?;
    if holding.coins_owned < coins {
        return Err(MarketErr::InsufficientBalance);
    }

    let price = current_coin_value(backend, cfg)?.value;
    let request = BuybackRequest::open(
        backend.next_id(Sequence::Buyback)?,
        user_id,
        coins,
        price,
        now,
    );
    backend.commit(vec![WriteOp::PutBuyback(request.clone())])?;
    Ok(request)
}

/// Approves or rejects a pending buyback.
///
/// Approval sells at the price locked into the request, not the current
/// value, and re-checks the balance since coins may have been spent in
/// the meantime.
pub fn process_buyback<B: LedgerBackend>(
    backend: &B,
    id: BuybackId,
    action: BuybackAction,
    notes: Option<&str>,
    now: Timestamp,
) -> Result<BuybackRequest, MarketErr> {
    let mut request = backend.get_buyback(id)?.ok_or(MarketErr::RequestNotFound)?;
    if !request.is_pending() {
        return Err(MarketErr::AlreadyProcessed);
    }
    request.admin_notes = notes.map(str::to_owned);
    request.processed_at = Some(now);

    match action {
        BuybackAction::Reject => {
            request.status = BuybackStatus::Rejected;
            backend.commit(vec![WriteOp::PutBuyback(request.clone())])?;
            Ok(request)
        }
        BuybackAction::Approve => {
            let mut holding = backend
                .get_holding(request.user_id)?
                .ok_or(MarketErr::HoldingNotFound)?;
            if holding.coins_owned < request.coins {
                return Err(MarketErr::InsufficientBalance);
            }
            holding.apply_buyback(request.coins, now);
            request.status = BuybackStatus::Approved;
            let transaction = CoinTransaction::sell(
                backend.next_id(Sequence::Transaction)?,
                request.user_id,
                request.coins,
                request.price_per_coin,
                now,
            );
            backend.commit(vec![
                WriteOp::PutBuyback(request.clone()),
                WriteOp::PutHolding(holding),
                WriteOp::AppendTransaction(transaction),
            ])?;
            info!(
                "approved buyback {} for user {}: {} coins at {}",
                request.id, request.user_id, request.coins, request.price_per_coin
            );
            Ok(request)
        }
    }
}

#[derive(Debug)]
pub struct InvestOutcome {
    pub investment: ProjectInvestment,
    pub holding: Holding,
    pub project: Project,
    pub summary: PortfolioSummary,
}

/// Invests coins from a holding into a project at the current coin
/// value.
///
/// The coins leave the holding's balance but not its cost basis, the
/// project's funding totals advance, and the investor's portfolio
/// summary is rebuilt with the staged investment, all in one commit.
pub fn invest<B: LedgerBackend>(
    backend: &B,
    cfg: &MarketConfig,
    user_id: UserId,
    project_id: ProjectId,
    coins: Money,
    now: Timestamp,
) -> Result<InvestOutcome, MarketErr> {
    if !coins.is_positive() {
        return Err(MarketErr::InvalidAmount);
    }
    let mut project = backend
        .get_project(project_id)?
        .ok_or(MarketErr::ProjectNotFound)?;
    if project.is_completed() {
        return Err(MarketErr::AlreadyCompleted);
    }
    let mut holding = backend
        .get_holding(user_id)?
        .ok_or(MarketErr::HoldingNotFound)?;
    if holding.coins_owned < coins {
        return Err(MarketErr::InsufficientBalance);
    }

    let price = current_coin_value(backend, cfg)?.value;
    let amount_eur = coins * price;
    if let Some(min) = project.min_investment {
        if amount_eur < min {
            return Err(MarketErr::BelowMinimumInvestment);
        }
    }
    if let Some(max) = project.max_investment {
        if amount_eur > max {
            return Err(MarketErr::AboveMaximumInvestment);
        }
    }

    holding.deduct_coins(coins, now);
    project.apply_investment(amount_eur);
    let investment = ProjectInvestment {
        id: backend.next_id(Sequence::Investment)?,
        user_id,
        project_id,
        coins,
        amount_eur,
        price_at_investment: price,
        status: crate::primitives::InvestmentStatus::Active,
        created_at: now,
    };
    let summary = build_summary(backend, user_id, std::slice::from_ref(&investment), &[], now)?;

    backend.commit(vec![
        WriteOp::PutHolding(holding.clone()),
        WriteOp::PutProject(project.clone()),
        WriteOp::PutInvestment(investment.clone()),
        WriteOp::PutPortfolioSummary(summary.clone()),
    ])?;

    info!(
        "user {} invested {} coins ({}) in project {}",
        user_id, coins, amount_eur, project_id
    );

    Ok(InvestOutcome {
        investment,
        holding,
        project,
        summary,
    })
}

/// Spends coins on a service tier. The coins are deducted immediately
/// and the redemption waits for an operator to work it.
pub fn redeem_service<B: LedgerBackend>(
    backend: &B,
    user_id: UserId,
    tier_id: TierId,
    title: &str,
    details: &str,
    now: Timestamp,
) -> Result<ServiceRedemption, MarketErr> {
    let tier = backend.get_tier(tier_id)?.ok_or(MarketErr::TierNotFound)?;
    if !tier.active {
        return Err(MarketErr::TierNotFound);
    }
    let mut holding = backend
        .get_holding(user_id)?
        .ok_or(MarketErr::HoldingNotFound)?;
    if holding.coins_owned < tier.coin_cost {
        return Err(MarketErr::InsufficientBalance);
    }

    holding.deduct_coins(tier.coin_cost, now);
    let redemption = ServiceRedemption::open(
        backend.next_id(Sequence::Redemption)?,
        user_id,
        tier_id,
        tier.coin_cost,
        title,
        details,
        now,
    );
    let transaction = CoinTransaction::service_redemption(
        backend.next_id(Sequence::Transaction)?,
        user_id,
        tier.coin_cost,
        now,
    );
    backend.commit(vec![
        WriteOp::PutHolding(holding),
        WriteOp::PutRedemption(redemption.clone()),
        WriteOp::AppendTransaction(transaction),
    ])?;
    Ok(redemption)
}

/// Moves a redemption along its lifecycle. Rejection refunds the
/// spent coins; completion is allowed from pending or in progress.
pub fn process_redemption<B: LedgerBackend>(
    backend: &B,
    id: RedemptionId,
    action: RedemptionAction,
    notes: Option<&str>,
    now: Timestamp,
) -> Result<ServiceRedemption, MarketErr> {
    let mut redemption = backend
        .get_redemption(id)?
        .ok_or(MarketErr::RequestNotFound)?;
    if !redemption.is_open() {
        return Err(MarketErr::AlreadyProcessed);
    }
    if notes.is_some() {
        redemption.admin_notes = notes.map(str::to_owned);
    }
    redemption.processed_at = Some(now);

    match action {
        RedemptionAction::Approve => {
            if redemption.status != RedemptionStatus::Pending {
                return Err(MarketErr::AlreadyProcessed);
            }
            redemption.status = RedemptionStatus::InProgress;
            backend.commit(vec![WriteOp::PutRedemption(redemption.clone())])?;
        }
        RedemptionAction::Complete => {
            redemption.status = RedemptionStatus::Completed;
            backend.commit(vec![WriteOp::PutRedemption(redemption.clone())])?;
        }
        RedemptionAction::Reject => {
            if redemption.status != RedemptionStatus::Pending {
                return Err(MarketErr::AlreadyProcessed);
            }
            let mut holding = backend
                .get_holding(redemption.user_id)?
                .ok_or(MarketErr::HoldingNotFound)?;
            holding.refund_coins(redemption.coins_spent, now);
            redemption.status = RedemptionStatus::Rejected;
            backend.commit(vec![
                WriteOp::PutRedemption(redemption.clone()),
                WriteOp::PutHolding(holding),
            ])?;
        }
    }
    Ok(redemption)
}

pub struct NewProject {
    pub name: String,
    pub description: String,
    pub client_name: Option<String>,
    pub target_capital: Option<Money>,
    pub cost: Money,
    pub expected_revenue: Money,
    pub min_investment: Option<Money>,
    pub max_investment: Option<Money>,
    pub status: ProjectStatus,
}

pub fn create_project<B: LedgerBackend>(
    backend: &B,
    input: NewProject,
    now: Timestamp,
) -> Result<Project, MarketErr> {
    if !money_check(input.cost) || !money_check(input.expected_revenue) {
        return Err(MarketErr::InvalidAmount);
    }
    let project = Project {
        id: backend.next_id(Sequence::Project)?,
        name: input.name,
        description: input.description,
        client_name: input.client_name,
        target_capital: input.target_capital,
        current_funding: Money::ZERO,
        investor_count: 0,
        cost: input.cost,
        expected_revenue: input.expected_revenue,
        actual_revenue: None,
        profit: None,
        min_investment: input.min_investment,
        max_investment: input.max_investment,
        status: input.status,
        created_at: now,
        completed_at: None,
    };
    backend.commit(vec![WriteOp::PutProject(project.clone())])?;
    Ok(project)
}

pub fn create_tier<B: LedgerBackend>(
    backend: &B,
    name: String,
    description: String,
    coin_cost: Money,
    now: Timestamp,
) -> Result<ServiceTier, MarketErr> {
    if !coin_cost.is_positive() {
        return Err(MarketErr::InvalidAmount);
    }
    let tier = ServiceTier {
        id: backend.next_id(Sequence::Tier)?,
        name,
        description,
        coin_cost,
        active: true,
        created_at: now,
    };
    backend.commit(vec![WriteOp::PutTier(tier.clone())])?;
    Ok(tier)
}

#[derive(Debug)]
pub struct HoldingOverview {
    pub holding: Holding,
    pub coin_value: CoinValue,
    pub dynamic_value: Money,
    pub portfolio_value: Money,
    pub profit_loss: Money,
    pub gain_percentage: Decimal,
}

/// A user's coin position valued at the current committed coin value.
pub fn holding_overview<B: LedgerBackend>(
    backend: &B,
    cfg: &MarketConfig,
    user_id: UserId,
) -> Result<HoldingOverview, MarketErr> {
    let holding = backend
        .get_holding(user_id)?
        .ok_or(MarketErr::HoldingNotFound)?;
    let coin_value = current_coin_value(backend, cfg)?;
    let dynamic_value = dynamic_coin_value(backend, cfg)?;
    let portfolio_value = holding.coins_owned * coin_value.value;
    let profit_loss = portfolio_value - holding.total_invested;
    let gain_percentage = if holding.total_invested.is_positive() {
        profit_loss.inner() / holding.total_invested.inner() * dec!(100)
    } else {
        Decimal::ZERO
    };
    Ok(HoldingOverview {
        holding,
        coin_value,
        dynamic_value,
        portfolio_value,
        profit_loss,
        gain_percentage,
    })
}

pub fn coin_value_history<B: LedgerBackend>(
    backend: &B,
) -> Result<Vec<CoinValueSnapshot>, MarketErr> {
    Ok(backend.snapshots()?)
}

pub fn user_transactions<B: LedgerBackend>(
    backend: &B,
    user_id: UserId,
) -> Result<Vec<CoinTransaction>, MarketErr> {
    Ok(backend.transactions_by_user(user_id)?)
}

pub fn user_buybacks<B: LedgerBackend>(
    backend: &B,
    user_id: UserId,
) -> Result<Vec<BuybackRequest>, MarketErr> {
    Ok(backend.buybacks_by_user(user_id)?)
}

pub fn pending_buybacks<B: LedgerBackend>(
    backend: &B,
) -> Result<Vec<BuybackRequest>, MarketErr> {
    Ok(backend
        .buybacks()?
        .into_iter()
        .filter(BuybackRequest::is_pending)
        .collect())
}

#[derive(Debug)]
pub struct PlatformStats {
    pub total_users: u64,
    pub total_investors: u64,
    pub coins_outstanding: Money,
    pub coin_value: CoinValue,
    pub dynamic_coin_value: Money,
    pub total_coin_sales: Money,
    pub total_projects: u64,
    pub completed_projects: u64,
    pub total_profit_distributed: Money,
    pub pending_buybacks: u64,
}

/// Platform-wide totals for the operator dashboard.
pub fn platform_stats<B: LedgerBackend>(
    backend: &B,
    cfg: &MarketConfig,
) -> Result<PlatformStats, MarketErr> {
    let users = backend.users()?;
    let projects = backend.projects()?;
    let distributions = backend.distributions()?;

    let total_coin_sales = backend
        .transactions()?
        .iter()
        .filter(|tx| tx.tx_type == crate::primitives::TxType::Buy)
        .map(|tx| tx.total_amount)
        .sum();

    Ok(PlatformStats {
        total_users: users.len() as u64,
        total_investors: users.iter().filter(|u| u.is_investor()).count() as u64,
        coins_outstanding: backend.total_coins_outstanding()?,
        coin_value: current_coin_value(backend, cfg)?,
        dynamic_coin_value: dynamic_coin_value(backend, cfg)?,
        total_coin_sales,
        total_projects: projects.len() as u64,
        completed_projects: projects.iter().filter(|p| p.is_completed()).count() as u64,
        total_profit_distributed: distributions.iter().map(|d| d.total_profit).sum(),
        pending_buybacks: backend
            .buybacks()?
            .iter()
            .filter(|b| b.is_pending())
            .count() as u64,
    })
}
