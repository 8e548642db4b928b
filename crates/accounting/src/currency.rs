//! Currencies and the conversion collaborator.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use grni_core::{DomainError, DomainResult, ValueObject};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    /// Number of decimal digits amounts are rounded to.
    pub digits: u32,
}

impl ValueObject for Currency {}

impl Currency {
    pub fn new(code: impl Into<String>, digits: u32) -> Self {
        Self {
            code: code.into(),
            digits,
        }
    }

    pub fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.digits, RoundingStrategy::MidpointAwayFromZero)
    }
}

/// `(amount, from, to, as_of) -> amount`, unrounded.
pub trait CurrencyConverter {
    fn convert(
        &self,
        amount: Decimal,
        from: &Currency,
        to: &Currency,
        date: NaiveDate,
    ) -> DomainResult<Decimal>;
}

/// Dated exchange rates against an implicit base currency.
///
/// A rate says how many units of the currency buy one unit of the base. The
/// rate used for a date is the latest one on or before it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable {
    rates: HashMap<String, Vec<(NaiveDate, Decimal)>>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rate(&mut self, code: impl Into<String>, date: NaiveDate, rate: Decimal) {
        let rates = self.rates.entry(code.into()).or_default();
        rates.retain(|(d, _)| *d != date);
        rates.push((date, rate));
        rates.sort_by_key(|(d, _)| *d);
    }

    pub fn rate(&self, code: &str, date: NaiveDate) -> Option<Decimal> {
        self.rates
            .get(code)?
            .iter()
            .rev()
            .find(|(d, _)| *d <= date)
            .map(|(_, r)| *r)
    }

    fn require_rate(&self, code: &str, date: NaiveDate) -> DomainResult<Decimal> {
        match self.rate(code, date) {
            Some(rate) if !rate.is_zero() => Ok(rate),
            Some(_) => Err(DomainError::conversion(format!("zero rate for {code} on {date}"))),
            None => Err(DomainError::conversion(format!("no rate for {code} on {date}"))),
        }
    }
}

impl CurrencyConverter for RateTable {
    fn convert(
        &self,
        amount: Decimal,
        from: &Currency,
        to: &Currency,
        date: NaiveDate,
    ) -> DomainResult<Decimal> {
        if from.code == to.code || amount.is_zero() {
            return Ok(amount);
        }
        let from_rate = self.require_rate(&from.code, date)?;
        let to_rate = self.require_rate(&to.code, date)?;
        amount
            .checked_mul(to_rate)
            .and_then(|v| v.checked_div(from_rate))
            .ok_or_else(|| {
                DomainError::conversion(format!(
                    "overflow converting {amount} {} to {}",
                    from.code, to.code
                ))
            })
    }
}
