// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::Money;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use static_assertions::*;

/// Value of one coin before any profit has ever been distributed.
pub const BASE_COIN_VALUE: Money = Money(dec!(10.0));

/// Basis points of a profit or revenue event that flow to the shared pool
/// (project completion) or to the project's investors (revenue event).
pub const POOL_SHARE_BPS: u32 = 8_000;

/// Basis points of a profit or revenue event retained by the operator.
pub const OPERATOR_SHARE_BPS: u32 = 2_000;

/// Smallest coin purchase the marketplace accepts.
pub const MIN_BUY_COINS: Money = Money(dec!(1));

/// Referral commission rates per ancestor level, in basis points.
pub const COMMISSION_RATES_BPS: [u32; REFERRAL_LEVELS] = [1_000, 300, 200];

/// Depth of the referral ancestry snapshot.
pub const REFERRAL_LEVELS: usize = 3;

/// Length of a generated referral code.
pub const REFERRAL_CODE_LEN: usize = 8;

/// Direct referrals required for the `partner` rank.
pub const PARTNER_DIRECT_REFERRALS: u32 = 6;

/// Direct referrals required for the `director` rank.
pub const DIRECTOR_DIRECT_REFERRALS: u32 = 16;

/// Direct referrals required for the `executive` rank.
pub const EXECUTIVE_DIRECT_REFERRALS: u32 = 31;

/// Money check
pub fn money_check(amount: Money) -> bool {
    !amount.is_negative()
}

/// Converts basis points to a decimal fraction
#[must_use]
pub fn bps_to_fraction(bps: u32) -> Decimal {
    Decimal::new(i64::from(bps), 4)
}

const_assert_eq!(POOL_SHARE_BPS + OPERATOR_SHARE_BPS, 10_000);
const_assert!(POOL_SHARE_BPS > 0);
const_assert!(OPERATOR_SHARE_BPS > 0);
const_assert!(COMMISSION_RATES_BPS[0] > COMMISSION_RATES_BPS[1]);
const_assert!(COMMISSION_RATES_BPS[1] > COMMISSION_RATES_BPS[2]);
const_assert!(
    COMMISSION_RATES_BPS[0] + COMMISSION_RATES_BPS[1] + COMMISSION_RATES_BPS[2] < 10_000
);
const_assert!(PARTNER_DIRECT_REFERRALS < DIRECTOR_DIRECT_REFERRALS);
const_assert!(DIRECTOR_DIRECT_REFERRALS < EXECUTIVE_DIRECT_REFERRALS);
const_assert!(REFERRAL_CODE_LEN >= 6);
