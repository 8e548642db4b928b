use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use grni_accounting::{Account, Currency};
use grni_core::{
    AnalyticAccountId, CompanyId, DomainResult, Entity, PartyId, ProductId, PurchaseId,
    PurchaseLineId, StockMoveId,
};

use crate::invoice::InvoiceLine;
use crate::shipment::ShipmentMovement;
use crate::uom::{Unit, UomConverter};

/// When supplier invoices are expected for a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceMethod {
    Manual,
    /// Invoiced on order confirmation.
    Order,
    /// Invoiced on receipt of goods.
    Shipment,
}

impl InvoiceMethod {
    /// Only shipment-invoiced purchases can have goods received but not invoiced.
    pub fn tracks_pending_invoices(self) -> bool {
        self == InvoiceMethod::Shipment
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Goods,
    Assets,
    Service,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub kind: ProductType,
    /// Expense account used for this product (own or from its category).
    #[serde(default)]
    pub expense_account: Option<Account>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    #[default]
    Line,
    Comment,
}

/// Line of a purchase order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub id: PurchaseLineId,
    #[serde(default)]
    pub kind: LineKind,
    #[serde(default)]
    pub product: Option<Product>,
    /// Negative for returns.
    pub quantity: Decimal,
    pub unit: Unit,
    /// In the purchase currency.
    pub unit_price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub analytic_accounts: Vec<AnalyticAccountId>,
    #[serde(default)]
    pub moves: Vec<ShipmentMovement>,
    #[serde(default)]
    pub invoice_lines: Vec<InvoiceLine>,
}

impl PurchaseLine {
    pub fn new(product: Product, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            id: PurchaseLineId::new(),
            kind: LineKind::Line,
            description: product.name.clone(),
            product: Some(product),
            quantity,
            unit: Unit::unit(),
            unit_price,
            delivery_date: None,
            analytic_accounts: Vec::new(),
            moves: Vec::new(),
            invoice_lines: Vec::new(),
        }
    }

    pub fn comment(description: impl Into<String>) -> Self {
        Self {
            id: PurchaseLineId::new(),
            kind: LineKind::Comment,
            product: None,
            quantity: Decimal::ZERO,
            unit: Unit::unit(),
            unit_price: Decimal::ZERO,
            description: description.into(),
            delivery_date: None,
            analytic_accounts: Vec::new(),
            moves: Vec::new(),
            invoice_lines: Vec::new(),
        }
    }

    /// -1 for return lines, 1 otherwise.
    pub fn sign(&self) -> Decimal {
        if self.quantity < Decimal::ZERO {
            Decimal::NEGATIVE_ONE
        } else {
            Decimal::ONE
        }
    }

    /// Goods line with a non-service product.
    pub fn is_stockable(&self) -> bool {
        self.kind == LineKind::Line
            && self
                .product
                .as_ref()
                .is_some_and(|p| p.kind != ProductType::Service)
    }

    pub fn expense_account(&self) -> Option<&Account> {
        self.product.as_ref()?.expense_account.as_ref()
    }

    /// The product's expense account demands an analytic split.
    pub fn analytic_required(&self) -> bool {
        self.expense_account().is_some_and(|a| a.analytic_required)
    }

    pub fn movement(&self, id: StockMoveId) -> Option<&ShipmentMovement> {
        self.moves.iter().find(|m| m.id == id)
    }

    /// Date an invoice line clears pending quantity on.
    ///
    /// The billed movement's effective date, else the line's own accounting
    /// or invoice date.
    pub fn invoice_line_date(&self, line: &InvoiceLine) -> Option<NaiveDate> {
        line.stock_move
            .and_then(|id| self.movement(id))
            .and_then(|m| m.effective_date)
            .or_else(|| line.date())
    }

    /// Signed quantity received (done movements), in the line unit.
    pub fn shipped_quantity(&self, uom: &dyn UomConverter) -> DomainResult<Decimal> {
        let mut total = Decimal::ZERO;
        for mv in self.moves.iter().filter(|m| m.is_done()) {
            total += uom.compute_qty(&mv.unit, mv.quantity, &self.unit)?;
        }
        Ok(self.sign() * total)
    }

    /// Signed quantity billed on posted (or ignored) invoices, in the line unit.
    pub fn cleared_quantity(&self, uom: &dyn UomConverter) -> DomainResult<Decimal> {
        let mut total = Decimal::ZERO;
        for il in self.invoice_lines.iter().filter(|l| l.clears_pending()) {
            total += uom.compute_qty(&il.unit, il.quantity, &self.unit)?;
        }
        Ok(total)
    }

    /// Received quantity not yet cleared by a posted invoice.
    pub fn unposted_shipped_quantity(&self, uom: &dyn UomConverter) -> DomainResult<Decimal> {
        Ok(self.shipped_quantity(uom)? - self.cleared_quantity(uom)?)
    }
}

impl Entity for PurchaseLine {
    type Id = PurchaseLineId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Purchase order snapshot as fetched from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub company: CompanyId,
    pub party: PartyId,
    pub currency: Currency,
    pub invoice_method: InvoiceMethod,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub lines: Vec<PurchaseLine>,
}

impl Purchase {
    pub fn new(company: CompanyId, party: PartyId, currency: Currency) -> Self {
        Self {
            id: PurchaseId::new(),
            company,
            party,
            currency,
            invoice_method: InvoiceMethod::Shipment,
            reference: None,
            lines: Vec::new(),
        }
    }

    pub fn line(&self, id: PurchaseLineId) -> Option<&PurchaseLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    pub fn line_mut(&mut self, id: PurchaseLineId) -> Option<&mut PurchaseLine> {
        self.lines.iter_mut().find(|l| l.id == id)
    }
}

impl Entity for Purchase {
    type Id = PurchaseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
