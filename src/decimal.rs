use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;

use crate::errors::LoanError;

/// number of fraction digits carried by every monetary amount
pub const MONEY_SCALE: u32 = 2;

/// Money type with exactly 2 decimal places.
///
/// Every value is normalized to scale 2, so `20` and `20.00` compare and print the
/// same. Anything that has to divide an amount goes through [`Money::split_evenly`],
/// which truncates toward zero and never rounds to nearest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::from_parts(0, 0, 0, false, MONEY_SCALE));
    pub const CENT: Money = Money(Decimal::from_parts(1, 0, 0, false, MONEY_SCALE));

    /// create from decimal, dropping anything past the second fraction digit
    pub fn from_decimal(d: Decimal) -> Self {
        Money(truncate(d))
    }

    /// create from string, rejecting more than 2 fraction digits
    pub fn from_str_exact(s: &str) -> Result<Self, LoanError> {
        let d = Decimal::from_str(s.trim()).map_err(|e| LoanError::Validation {
            message: format!("invalid amount '{}': {}", s, e),
        })?;
        Money::try_from(d)
    }

    /// create from integer amount (rupees, dollars, etc)
    pub fn from_major(amount: i64) -> Self {
        Money(truncate(Decimal::from(amount)))
    }

    /// create from minor amount (paise, cents)
    pub fn from_minor(amount: i64) -> Self {
        Money(Decimal::new(amount, MONEY_SCALE))
    }

    /// get underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// check if zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// strictly greater than zero
    pub fn is_positive(&self) -> bool {
        !self.0.is_zero() && self.0.is_sign_positive()
    }

    /// check if negative
    pub fn is_negative(&self) -> bool {
        !self.0.is_zero() && self.0.is_sign_negative()
    }

    /// minimum of two values
    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    /// maximum of two values
    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    /// Splits the amount into `parts` shares.
    ///
    /// Returns `(share, last)` where `share = truncate(self / parts)` is carried by the
    /// first `parts - 1` shares and `last = self - share * (parts - 1)` absorbs the
    /// remainder, so the shares always add back up to `self`. `None` when `parts` is 0.
    pub fn split_evenly(self, parts: u32) -> Option<(Money, Money)> {
        if parts == 0 {
            return None;
        }
        let share = Money(truncate(self.0 / Decimal::from(parts)));
        let last = self - share * (parts - 1);
        Some((share, last))
    }
}

/// truncate toward zero at the money scale and pad to exactly 2 digits
fn truncate(d: Decimal) -> Decimal {
    let mut t = d.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::ToZero);
    t.rescale(MONEY_SCALE);
    t
}

impl Default for Money {
    fn default() -> Self {
        Money::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = LoanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::from_str_exact(s)
    }
}

/// exact conversion used by parsing and deserialization
impl TryFrom<Decimal> for Money {
    type Error = LoanError;

    fn try_from(d: Decimal) -> Result<Self, Self::Error> {
        if d.normalize().scale() > MONEY_SCALE {
            return Err(LoanError::Validation {
                message: format!("amount '{}' has more than {} fraction digits", d, MONEY_SCALE),
            });
        }
        Ok(Money(truncate(d)))
    }
}

impl From<i32> for Money {
    fn from(i: i32) -> Self {
        Money::from_major(i as i64)
    }
}

impl From<u32> for Money {
    fn from(i: u32) -> Self {
        Money::from_major(i as i64)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money(truncate(self.0 + other.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 = truncate(self.0 + other.0);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money(truncate(self.0 - other.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        self.0 = truncate(self.0 - other.0);
    }
}

impl Mul<u32> for Money {
    type Output = Money;

    fn mul(self, times: u32) -> Money {
        Money(truncate(self.0 * Decimal::from(times)))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + *m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_always_two_digits() {
        assert_eq!(Money::from_major(20).to_string(), "20.00");
        assert_eq!(Money::ZERO.to_string(), "0.00");
        assert_eq!(Money::from_minor(1), Money::CENT);
        assert_eq!(Money::from_decimal(dec!(14.289)).to_string(), "14.28");
    }

    #[test]
    fn test_from_decimal_truncates_instead_of_rounding() {
        assert_eq!(Money::from_decimal(dec!(0.999)), Money::from_minor(99));
        assert_eq!(Money::from_decimal(dec!(-1.005)), Money::from_minor(-100));
    }

    #[test]
    fn test_parse_rejects_extra_precision() {
        assert_eq!(Money::from_str_exact("35").unwrap(), Money::from_major(35));
        assert_eq!(Money::from_str_exact("16.250").unwrap().to_string(), "16.25");
        assert!(Money::from_str_exact("16.255").is_err());
        assert!(Money::from_str_exact("abc").is_err());
    }

    #[test]
    fn test_deserialize_normalizes_scale() {
        let money: Money = serde_json::from_str("\"20\"").unwrap();
        assert_eq!(money, Money::from_major(20));
        assert_eq!(money.as_decimal().scale(), MONEY_SCALE);
        assert_eq!(money.to_string(), "20.00");

        let money: Money = serde_json::from_str("\"16.250\"").unwrap();
        assert_eq!(money.to_string(), "16.25");

        assert!(serde_json::from_str::<Money>("\"20.005\"").is_err());
        assert_eq!(serde_json::to_string(&Money::from_major(20)).unwrap(), "\"20.00\"");
    }

    #[test]
    fn test_split_with_remainder() {
        let (share, last) = Money::from_major(100).split_evenly(7).unwrap();
        assert_eq!(share.to_string(), "14.28");
        assert_eq!(last.to_string(), "14.32");
        assert_eq!(share * 6 + last, Money::from_major(100));
    }

    #[test]
    fn test_split_exact() {
        let (share, last) = Money::from_major(65).split_evenly(4).unwrap();
        assert_eq!(share.to_string(), "16.25");
        assert_eq!(last, share);
    }

    #[test]
    fn test_split_smaller_than_a_cent_per_part() {
        let (share, last) = Money::from_minor(3).split_evenly(5).unwrap();
        assert_eq!(share, Money::ZERO);
        assert_eq!(last, Money::from_minor(3));
        assert!(Money::from_major(10).split_evenly(0).is_none());
    }

    #[test]
    fn test_sign_helpers() {
        assert!(!Money::ZERO.is_positive());
        assert!(!Money::ZERO.is_negative());
        assert!(Money::CENT.is_positive());
        assert!((Money::ZERO - Money::CENT).is_negative());
    }

    #[test]
    fn test_sum() {
        let amounts = vec![Money::from_minor(1428); 6];
        let total: Money = amounts.iter().sum();
        assert_eq!(total.to_string(), "85.68");
    }
}
