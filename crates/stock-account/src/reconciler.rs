//! Pending-invoice entry computation for a single purchase line.
//!
//! Receipts are bucketed by accounting date and valued in company currency
//! on that date. Posted invoices clear receipts oldest first at the value
//! they were received at, so a fully invoiced line always nets to zero. For
//! each date the amount that should sit on the pending-invoice account is
//! compared with what was already recorded there, and the difference becomes
//! a pair of balancing entries.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use grni_accounting::{Account, Currency, CurrencyConverter, MoveLine, ensure_balanced};
use grni_core::{DomainError, DomainResult, JournalId};
use grni_purchasing::{Purchase, PurchaseLine, UomConverter};

use crate::analytic::project_analytic_lines;

/// Everything the reconciler needs to know about one purchase line.
#[derive(Debug, Clone, Copy)]
pub struct LineContext<'a> {
    pub purchase: &'a Purchase,
    pub line: &'a PurchaseLine,
    pub pending_account: &'a Account,
    pub expense_account: &'a Account,
    /// Journal stamped on analytic lines.
    pub journal: Option<JournalId>,
    /// Date used when neither movement nor invoice carries one.
    pub today: NaiveDate,
}

impl LineContext<'_> {
    fn fallback_date(&self) -> NaiveDate {
        self.line.delivery_date.unwrap_or(self.today)
    }
}

/// Quantity received on one accounting date and its company-currency value.
///
/// Both are in the line direction: positive for purchases and returns alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub date: NaiveDate,
    pub qty: Decimal,
    pub value: Decimal,
}

/// Quantity cleared by one invoice line and the value it takes off pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clearing {
    pub date: NaiveDate,
    pub qty: Decimal,
    pub value: Decimal,
}

pub struct PendingInvoiceReconciler<'a> {
    currency: &'a dyn CurrencyConverter,
    uom: &'a dyn UomConverter,
    company_currency: &'a Currency,
}

impl<'a> PendingInvoiceReconciler<'a> {
    pub fn new(
        currency: &'a dyn CurrencyConverter,
        uom: &'a dyn UomConverter,
        company_currency: &'a Currency,
    ) -> Self {
        Self {
            currency,
            uom,
            company_currency,
        }
    }

    /// Done movements grouped by accounting date, valued on that date.
    pub fn receipts(&self, ctx: &LineContext<'_>) -> DomainResult<Vec<Receipt>> {
        let line = ctx.line;
        let fallback = ctx.fallback_date();
        let mut quantities: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        for mv in line.moves.iter().filter(|m| m.is_done()) {
            let qty = self.uom.compute_qty(&mv.unit, mv.quantity, &line.unit)?;
            *quantities.entry(mv.date().unwrap_or(fallback)).or_default() += qty;
        }

        quantities
            .into_iter()
            .filter(|(_, qty)| !qty.is_zero())
            .map(|(date, qty)| {
                let value = self.amount_on(ctx, qty, date)?;
                Ok::<_, DomainError>(Receipt { date, qty, value })
            })
            .collect()
    }

    /// Clearing invoice lines in date order, each valued against `receipts`.
    ///
    /// The value of a clearing is the change in [`Self::cleared_value`] it
    /// causes, so the values of all clearings add up to the value of the
    /// cumulative cleared quantity.
    pub fn clearings(&self, ctx: &LineContext<'_>, receipts: &[Receipt]) -> DomainResult<Vec<Clearing>> {
        let line = ctx.line;
        let fallback = ctx.fallback_date();
        let mut cleared = Vec::new();
        for il in line.invoice_lines.iter().filter(|l| l.clears_pending()) {
            let qty = self.uom.compute_qty(&il.unit, il.quantity, &line.unit)?;
            cleared.push((line.invoice_line_date(il).unwrap_or(fallback), line.sign() * qty));
        }
        cleared.sort_by_key(|(date, _)| *date);

        let mut total = Decimal::ZERO;
        let mut before = Decimal::ZERO;
        let mut clearings = Vec::with_capacity(cleared.len());
        for (date, qty) in cleared {
            total += qty;
            let after = match self.cleared_value(receipts, total)? {
                Some(value) => value,
                None => before + self.amount_on(ctx, qty, date)?,
            };
            clearings.push(Clearing {
                date,
                qty,
                value: after - before,
            });
            before = after;
        }
        Ok(clearings)
    }

    /// Value of the first `qty` received units, oldest receipt first.
    ///
    /// Quantities beyond what was received are valued like the last
    /// receipt, negative ones like the first. `None` without receipts.
    pub fn cleared_value(&self, receipts: &[Receipt], qty: Decimal) -> DomainResult<Option<Decimal>> {
        let (Some(first), Some(last)) = (receipts.first(), receipts.last()) else {
            return Ok(None);
        };
        if qty <= Decimal::ZERO {
            return self.share(first, qty).map(Some);
        }

        let mut remaining = qty;
        let mut value = Decimal::ZERO;
        for receipt in receipts {
            if remaining <= receipt.qty {
                return Ok(Some(value + self.share(receipt, remaining)?));
            }
            remaining -= receipt.qty;
            value += receipt.value;
        }
        Ok(Some(value + self.share(last, remaining)?))
    }

    /// `receipt.value * qty / receipt.qty`, rounded.
    fn share(&self, receipt: &Receipt, qty: Decimal) -> DomainResult<Decimal> {
        if qty == receipt.qty {
            return Ok(receipt.value);
        }
        let value = receipt
            .value
            .checked_mul(qty)
            .and_then(|v| v.checked_div(receipt.qty))
            .ok_or_else(|| {
                DomainError::conversion(format!(
                    "overflow valuing {qty} of the receipt of {}",
                    receipt.date
                ))
            })?;
        Ok(self.company_currency.round(value))
    }

    /// Value of `qty` at the line price, in company currency on `date`, rounded.
    fn amount_on(&self, ctx: &LineContext<'_>, qty: Decimal, date: NaiveDate) -> DomainResult<Decimal> {
        if qty.is_zero() {
            return Ok(Decimal::ZERO);
        }
        let amount = qty.checked_mul(ctx.line.unit_price).ok_or_else(|| {
            DomainError::conversion(format!(
                "overflow computing {qty} x {} for purchase line {}",
                ctx.line.unit_price, ctx.line.id
            ))
        })?;
        let amount = self.currency.convert(
            amount,
            &ctx.purchase.currency,
            self.company_currency,
            date,
        )?;
        Ok(self.company_currency.round(amount))
    }

    /// Signed amount that should be pending per accounting date.
    pub fn pending_amounts(&self, ctx: &LineContext<'_>) -> DomainResult<BTreeMap<NaiveDate, Decimal>> {
        let sign = ctx.line.sign();
        let receipts = self.receipts(ctx)?;
        let mut amounts: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        for receipt in &receipts {
            *amounts.entry(receipt.date).or_default() += sign * receipt.value;
        }
        for clearing in self.clearings(ctx, &receipts)? {
            *amounts.entry(clearing.date).or_default() -= sign * clearing.value;
        }
        Ok(amounts)
    }

    /// New entries keeping the pending account in step with shipped vs invoiced.
    ///
    /// `existing` are the line's previously persisted entries; only those on
    /// the pending account are taken into account. Returns an empty vector
    /// for non-stockable or unshipped lines. Entries are sorted by date and
    /// each date's pair balances.
    pub fn compute_pending_entries(
        &self,
        ctx: &LineContext<'_>,
        existing: &[MoveLine],
    ) -> DomainResult<Vec<MoveLine>> {
        let line = ctx.line;
        if !line.is_stockable() || line.moves.is_empty() {
            return Ok(Vec::new());
        }

        let unposted = line.unposted_shipped_quantity(self.uom)?;
        if line.sign() * unposted < Decimal::ZERO {
            tracing::warn!(purchase_line = %line.id, %unposted, "invoiced more than received");
        }

        let targets = self.pending_amounts(ctx)?;

        let mut recorded: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        for entry in existing.iter().filter(|e| e.account == ctx.pending_account.id) {
            *recorded.entry(entry.date).or_default() += entry.pending();
        }

        let dates: BTreeSet<NaiveDate> = targets.keys().chain(recorded.keys()).copied().collect();

        let mut entries = Vec::new();
        for date in dates {
            let target = targets.get(&date).copied().unwrap_or_default();
            let already = self
                .company_currency
                .round(recorded.get(&date).copied().unwrap_or_default());
            let delta = target - already;
            if delta.is_zero() {
                continue;
            }

            tracing::debug!(
                purchase_line = %line.id,
                %date,
                %target,
                recorded = %already,
                %delta,
                "pending invoice delta"
            );
            entries.extend(self.entry_pair(ctx, delta, date));
        }

        ensure_balanced(&entries)?;
        Ok(entries)
    }

    /// Expense-side and pending-side entries for a signed pending delta.
    ///
    /// A positive delta credits the pending account and debits the expense
    /// account; a negative one does the reverse.
    fn entry_pair(&self, ctx: &LineContext<'_>, delta: Decimal, date: NaiveDate) -> [MoveLine; 2] {
        let party = ctx.purchase.party;
        let party_for = |account: &Account| account.party_required.then_some(party);

        let mut expense = MoveLine::signed(ctx.expense_account.id, delta, date)
            .with_party(party_for(ctx.expense_account))
            .with_purchase_line(ctx.line.id)
            .with_description(ctx.line.description.clone());
        expense.analytic_lines = project_analytic_lines(ctx.purchase, ctx.line, &expense, ctx.journal);

        let pending = MoveLine::signed(ctx.pending_account.id, -delta, date)
            .with_party(party_for(ctx.pending_account))
            .with_purchase_line(ctx.line.id)
            .with_description(ctx.line.description.clone());

        [expense, pending]
    }
}
