// Copyright (c) 2026 The Coinvest developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::codec;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};

/// Monetary or coin amount. Fixed-point so that repeated distributions do
/// not accumulate binary floating point drift.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(pub Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Rounded to 2 currency decimals. Display only, never used in ledger
    /// arithmetic.
    #[must_use]
    pub fn rounded(&self) -> Money {
        Money(self.0.round_dp(2))
    }

    #[must_use]
    pub fn inner(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Self(Decimal::from(amount))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Mul for Money {
    type Output = Money;

    fn mul(self, rhs: Money) -> Money {
        Money(self.0 * rhs.0)
    }
}

impl Mul<Decimal> for Money {
    type Output = Money;

    fn mul(self, rhs: Decimal) -> Money {
        Money(self.0 * rhs)
    }
}

impl Div for Money {
    type Output = Money;

    fn div(self, rhs: Money) -> Money {
        Money(self.0 / rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, x| acc + x)
    }
}

impl bincode::Encode for Money {
    fn encode<E: bincode::enc::Encoder>(
        &self,
        encoder: &mut E,
    ) -> core::result::Result<(), bincode::error::EncodeError> {
        codec::encode_decimal(&self.0, encoder)
    }
}

impl bincode::Decode for Money {
    fn decode<D: bincode::de::Decoder>(
        decoder: &mut D,
    ) -> core::result::Result<Self, bincode::error::DecodeError> {
        Ok(Self(codec::decode_decimal(decoder)?))
    }
}

impl<'de> bincode::BorrowDecode<'de> for Money {
    fn borrow_decode<D: bincode::de::BorrowDecoder<'de>>(
        decoder: &mut D,
    ) -> core::result::Result<Self, bincode::error::DecodeError> {
        Ok(Self(codec::decode_decimal(decoder)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn it_signs() {
        assert!(Money(dec!(1)).is_positive());
        assert!(Money(dec!(-1)).is_negative());
        assert!(Money::ZERO.is_zero());
        assert!(!Money::ZERO.is_negative());
        assert!(!Money::ZERO.is_positive());
    }

    #[test]
    fn it_rounds_for_display_only() {
        let m = Money(dec!(3.14159));
        assert_eq!(m.rounded(), Money(dec!(3.14)));
        assert_eq!(m, Money(dec!(3.14159)));
    }

    #[test]
    fn it_sums() {
        let total: Money = [Money(dec!(0.1)), Money(dec!(0.2)), Money(dec!(0.3))]
            .into_iter()
            .sum();
        assert_eq!(total, Money(dec!(0.6)));
    }

    #[test]
    fn encode_decode_roundtrip() {
        let m = Money(dec!(197.07));
        let encoded = crate::codec::encode_to_vec(&m).unwrap();
        let decoded: Money = crate::codec::decode(&encoded).unwrap();
        assert_eq!(decoded, m);
    }
}
