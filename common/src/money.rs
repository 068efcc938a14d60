//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use crate::define_kind;

/// Amount of money in some [`Currency`], counted in its minor units
/// (cents for [`Currency::Usd`] and [`Currency::Eur`]).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of minor [`Currency`] units.
    pub amount: i64,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Number of minor units in one major [`Currency`] unit.
    const MINOR_UNITS: i64 = 100;

    /// Creates a new [`Money`] from the provided amount of minor units.
    #[must_use]
    pub const fn from_minor_units(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        let major = amount / Self::MINOR_UNITS;
        let minor = (amount % Self::MINOR_UNITS).abs();
        write!(f, "{major}.{minor:02}{currency}")
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 {
            return Err("too short");
        }

        let (amount, currency) = s.split_at(s.len() - 3);
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        let (major, minor) = match amount.split_once('.') {
            Some((major, minor)) => {
                if minor.len() != 2 {
                    return Err("expected 2 fractional digits");
                }
                (major, minor.parse::<i64>().map_err(|_| "invalid amount")?)
            }
            None => (amount, 0),
        };
        let major = major.parse::<i64>().map_err(|_| "invalid amount")?;

        let sign = if major.is_negative() { -1 } else { 1 };
        Ok(Self {
            amount: major
                .checked_mul(Self::MINOR_UNITS)
                .and_then(|m| m.checked_add(sign * minor))
                .ok_or("amount overflow")?,
            currency,
        })
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "US Dollar."]
        Usd = 1,

        #[doc = "Euro."]
        Eur = 2,
    }
}

impl Currency {
    /// Returns the lowercase [ISO 4217] code of this [`Currency`].
    ///
    /// [ISO 4217]: https://en.wikipedia.org/wiki/ISO_4217
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Usd => "usd",
            Self::Eur => "eur",
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use super::{Currency, Money};

    #[test]
    fn from_str() {
        assert_eq!(
            Money::from_str("123.45USD").unwrap(),
            Money {
                amount: 12345,
                currency: Currency::Usd,
            },
        );

        assert_eq!(
            Money::from_str("123EUR").unwrap(),
            Money {
                amount: 12300,
                currency: Currency::Eur,
            },
        );

        assert_eq!(
            Money::from_str("0.05USD").unwrap(),
            Money {
                amount: 5,
                currency: Currency::Usd,
            },
        );

        assert!(Money::from_str("123.45").is_err());
        assert!(Money::from_str("123.45Us").is_err());
        assert!(Money::from_str("123.4USD").is_err());
        assert!(Money::from_str("123.456USD").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(
            Money {
                amount: 12345,
                currency: Currency::Usd,
            }
            .to_string(),
            "123.45USD",
        );

        assert_eq!(
            Money {
                amount: 4000,
                currency: Currency::Eur,
            }
            .to_string(),
            "40.00EUR",
        );

        assert_eq!(
            Money {
                amount: 5,
                currency: Currency::Usd,
            }
            .to_string(),
            "0.05USD",
        );
    }

    #[test]
    fn roundtrips() {
        for s in ["0.00USD", "40.00EUR", "123.45USD"] {
            assert_eq!(Money::from_str(s).unwrap().to_string(), s);
        }
    }
}
