//! Currency codes and amount bounds used by finance records.
//!
//! Amounts themselves are always `rust_decimal::Decimal`; never floats.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Largest amount a `NUMERIC(18, 2)` column holds: 9 999 999 999 999 999.99.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA763_FFFF, 0x0DE0_B6B3, 0, false, 2);

/// Largest value a `NUMERIC(18, 4)` column holds (KPI targets).
pub const MAX_TARGET: Decimal = Decimal::from_parts(0xA763_FFFF, 0x0DE0_B6B3, 0, false, 4);

/// Returns true if `amount` can be stored in a `NUMERIC(18, 2)` column.
#[must_use]
pub fn fits_amount(amount: Decimal) -> bool {
    amount.abs() <= MAX_AMOUNT
}

/// ISO 4217 (and stablecoin) currency codes accepted by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US Dollar
    Usd,
    /// Euro
    Eur,
    /// Pound Sterling
    Gbp,
    /// Tether
    Usdt,
    /// Ukrainian Hryvnia
    Uah,
}

impl Currency {
    /// All supported currencies.
    pub const ALL: [Self; 5] = [Self::Usd, Self::Eur, Self::Gbp, Self::Usdt, Self::Uah];

    /// Returns the currency code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Usdt => "USDT",
            Self::Uah => "UAH",
        }
    }

    /// Normalizes a user-supplied code, returning the canonical upper-case form.
    ///
    /// # Errors
    ///
    /// Returns an error message if the code is not supported.
    pub fn normalize(code: &str) -> Result<String, String> {
        code.trim()
            .parse::<Self>()
            .map(|c| c.code().to_string())
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            "USDT" => Ok(Self::Usdt),
            "UAH" => Ok(Self::Uah),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_amount_bounds_match_columns() {
        assert_eq!(MAX_AMOUNT, dec!(9999999999999999.99));
        assert_eq!(MAX_TARGET, dec!(99999999999999.9999));
        assert!(fits_amount(dec!(-9999999999999999.99)));
        assert!(!fits_amount(dec!(10000000000000000)));
        assert!(!fits_amount(dec!(9999999999999999.995)));
    }

    #[test]
    fn test_currency_display() {
        assert_eq!(Currency::Usd.to_string(), "USD");
        assert_eq!(Currency::Usdt.to_string(), "USDT");
        assert_eq!(Currency::Uah.to_string(), "UAH");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!(Currency::from_str("usd").unwrap(), Currency::Usd);
        assert_eq!(Currency::from_str("EUR").unwrap(), Currency::Eur);
        assert_eq!(Currency::from_str("Usdt").unwrap(), Currency::Usdt);
        assert!(Currency::from_str("XXX").is_err());
        assert!(Currency::from_str("").is_err());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(Currency::normalize(" gbp ").unwrap(), "GBP");
        assert!(Currency::normalize("rub").is_err());
    }

    #[test]
    fn test_all_codes_round_trip() {
        for currency in Currency::ALL {
            assert_eq!(Currency::from_str(currency.code()).unwrap(), currency);
        }
    }
}
