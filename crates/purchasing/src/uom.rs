//! Units of measure and quantity conversion.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use grni_core::{DomainError, DomainResult, ValueObject};

/// Unit of measure.
///
/// `factor` is the number of category reference units in one unit, so a
/// dozen in the "units" category has factor 12.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    pub category: String,
    pub factor: Decimal,
    /// Decimal digits quantities in this unit are rounded to.
    pub digits: u32,
}

impl ValueObject for Unit {}

impl Unit {
    pub fn new(name: impl Into<String>, category: impl Into<String>, factor: Decimal, digits: u32) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            factor,
            digits,
        }
    }

    /// The "Unit" reference unit of the "units" category.
    pub fn unit() -> Self {
        Self::new("Unit", "units", Decimal::ONE, 0)
    }

    pub fn round(&self, qty: Decimal) -> Decimal {
        qty.round_dp_with_strategy(self.digits, RoundingStrategy::MidpointAwayFromZero)
    }
}

/// `(from_unit, quantity, to_unit) -> quantity` consumed from the host.
pub trait UomConverter {
    fn compute_qty(&self, from: &Unit, qty: Decimal, to: &Unit) -> DomainResult<Decimal>;
}

/// Factor-based conversion within one unit category.
#[derive(Debug, Clone, Copy, Default)]
pub struct FactorConverter;

impl UomConverter for FactorConverter {
    fn compute_qty(&self, from: &Unit, qty: Decimal, to: &Unit) -> DomainResult<Decimal> {
        if from == to || qty.is_zero() {
            return Ok(qty);
        }
        if from.category != to.category {
            return Err(DomainError::conversion(format!(
                "cannot convert {} ({}) to {} ({})",
                from.name, from.category, to.name, to.category
            )));
        }
        if to.factor.is_zero() {
            return Err(DomainError::conversion(format!("unit {} has zero factor", to.name)));
        }
        let converted = qty
            .checked_mul(from.factor)
            .and_then(|v| v.checked_div(to.factor))
            .ok_or_else(|| DomainError::conversion(format!("overflow converting {qty} {}", from.name)))?;
        Ok(to.round(converted))
    }
}
