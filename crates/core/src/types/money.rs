//! Monetary amounts in Brazilian reais using decimal arithmetic.
//!
//! All checkout arithmetic runs on [`Decimal`] so cent-level results are
//! exact. Rounding only happens when an amount is rendered for display.

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A non-rounded amount in BRL.
///
/// Serializes as a decimal string (e.g. `"49.90"`) so JSON consumers never
/// see binary floating point.
///
/// ```
/// use petbox_core::Money;
/// use rust_decimal::Decimal;
///
/// let price = Money::new(Decimal::new(4990, 2));
/// assert_eq!(price.to_string(), "R$ 49,90");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero reais.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Build an amount from integer centavos.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// `percent`% of this amount, without rounding.
    #[must_use]
    pub fn percent(self, percent: Decimal) -> Self {
        Self(self.0 * percent / Decimal::ONE_HUNDRED)
    }

    /// Subtract `other`, clamping at zero.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        if other.0 >= self.0 {
            Self::ZERO
        } else {
            Self(self.0 - other.0)
        }
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Render as `R$ 1.234,56`.
    #[must_use]
    pub fn display(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let plain = format!("{:.2}", rounded.abs());
        let (units, cents) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

        let mut grouped = String::with_capacity(units.len() + units.len() / 3);
        for (i, digit) in units.chars().enumerate() {
            if i > 0 && (units.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(digit);
        }

        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        write!(f, "{sign}R$ {grouped},{cents}")
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    /// Parse a plain decimal string such as `"89.90"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Self)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_comma_decimal_separator() {
        assert_eq!(Money::from_cents(4990).to_string(), "R$ 49,90");
        assert_eq!(Money::ZERO.to_string(), "R$ 0,00");
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_cents(123_456).to_string(), "R$ 1.234,56");
        assert_eq!(Money::from_cents(100_000_000).to_string(), "R$ 1.000.000,00");
        assert_eq!(Money::from_cents(99_999).to_string(), "R$ 999,99");
    }

    #[test]
    fn test_display_rounds_only_when_rendering() {
        let third = Money::new(Decimal::new(10, 0) / Decimal::new(3, 0));
        assert_eq!(third.to_string(), "R$ 3,33");
        assert_ne!(third.amount(), Decimal::new(333, 2));

        let half_cent = Money::new(Decimal::new(1005, 3));
        assert_eq!(half_cent.to_string(), "R$ 1,01");
    }

    #[test]
    fn test_percent_is_exact() {
        let gross = Money::from_cents(20_000);
        assert_eq!(gross.percent(Decimal::new(15, 0)), Money::from_cents(3_000));

        let odd = Money::from_cents(4990);
        assert_eq!(
            odd.percent(Decimal::new(10, 0)).amount(),
            Decimal::new(499, 2)
        );
    }

    #[test]
    fn test_saturating_sub_never_negative() {
        let gross = Money::from_cents(10_000);
        assert_eq!(gross.saturating_sub(Money::from_cents(15_000)), Money::ZERO);
        assert_eq!(
            gross.saturating_sub(Money::from_cents(2_500)),
            Money::from_cents(7_500)
        );
    }

    #[test]
    fn test_parse() {
        let price: Money = " 89.90 ".parse().unwrap();
        assert_eq!(price, Money::from_cents(8990));
        assert!("abc".parse::<Money>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Money::from_cents(4990)).unwrap();
        assert_eq!(json, "\"49.90\"");
        let parsed: Money = serde_json::from_str("\"170.00\"").unwrap();
        assert_eq!(parsed, Money::from_cents(17_000));
    }
}
