//! Monetary amounts.
//!
//! Amounts are carried in minor units (cents) to keep event payloads and
//! gateway calls free of floating point.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// ISO currency of an amount. The storefront sells in USD and CAD.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Cad,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Cad => "CAD",
        }
    }

    pub fn parse(code: &str) -> Result<Self, DomainError> {
        match code.to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "CAD" => Ok(Currency::Cad),
            other => Err(DomainError::validation(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

/// An amount in minor units plus its currency.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    pub cents: i64,
    pub currency: Currency,
}

impl Money {
    /// A non-negative amount in minor units.
    pub fn new(cents: i64, currency: Currency) -> Result<Self, DomainError> {
        if cents < 0 {
            return Err(DomainError::validation(format!(
                "negative amount: {cents}"
            )));
        }
        Ok(Self { cents, currency })
    }

    pub fn zero(currency: Currency) -> Self {
        Self { cents: 0, currency }
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}.{:02} {}",
            self.cents / 100,
            (self.cents % 100).abs(),
            self.currency
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_amounts() {
        assert!(Money::new(-1, Currency::Usd).is_err());
        assert!(Money::new(0, Currency::Usd).is_ok());
    }

    #[test]
    fn currency_roundtrip() {
        assert_eq!(Currency::parse("usd").unwrap(), Currency::Usd);
        assert_eq!(Currency::parse("CAD").unwrap(), Currency::Cad);
        assert!(Currency::parse("EUR").is_err());
    }

    #[test]
    fn display_formats_minor_units() {
        let m = Money::new(129_99, Currency::Usd).unwrap();
        assert_eq!(m.to_string(), "129.99 USD");
    }

    #[test]
    fn serde_uses_uppercase_codes() {
        let m = Money::new(500, Currency::Cad).unwrap();
        let json = serde_json::to_value(m).unwrap();
        assert_eq!(json["currency"], "CAD");
    }
}
