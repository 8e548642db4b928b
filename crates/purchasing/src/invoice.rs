use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use grni_core::{Entity, InvoiceLineId, StockMoveId};

use crate::uom::Unit;

/// State of the invoice an invoice line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceState {
    Draft,
    Validated,
    Posted,
    Paid,
    Cancelled,
}

/// How a cancelled invoice line was handled on the purchase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceException {
    /// Not handled (or nothing to handle).
    #[default]
    None,
    /// A replacement line was created; the replacement clears on its own.
    Recreated,
    /// The quantity will never be billed; treat it as cleared.
    Ignored,
}

/// Supplier billing tied to a purchase line.
///
/// `quantity` is signed like the purchase line (negative on credit notes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub id: InvoiceLineId,
    pub quantity: Decimal,
    pub unit: Unit,
    pub unit_price: Decimal,
    pub state: InvoiceState,
    #[serde(default)]
    pub invoice_date: Option<NaiveDate>,
    #[serde(default)]
    pub accounting_date: Option<NaiveDate>,
    /// Stock movement this line bills, if any.
    #[serde(default)]
    pub stock_move: Option<StockMoveId>,
    #[serde(default)]
    pub exception: InvoiceException,
}

impl InvoiceLine {
    /// Whether this line's quantity no longer counts as pending.
    pub fn clears_pending(&self) -> bool {
        match self.state {
            InvoiceState::Posted | InvoiceState::Paid => true,
            InvoiceState::Cancelled => self.exception == InvoiceException::Ignored,
            InvoiceState::Draft | InvoiceState::Validated => false,
        }
    }

    /// Accounting date, else invoice date.
    pub fn date(&self) -> Option<NaiveDate> {
        self.accounting_date.or(self.invoice_date)
    }
}

impl Entity for InvoiceLine {
    type Id = InvoiceLineId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
