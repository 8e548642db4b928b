//! Entry points triggered by purchase and shipment lifecycle events.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use grni_accounting::{Account, Journal, LedgerRepository, Move, MoveLine, MoveOrigin, MoveState};
use grni_core::{DomainError, DomainResult, MoveId, PeriodId, PurchaseId};
use grni_purchasing::{Purchase, PurchaseLine};

use crate::host::AccountingHost;
use crate::reconciler::{LineContext, PendingInvoiceReconciler};
use crate::selector::{ReconciliationSelector, Selection};

/// Whether posting new entries is followed by a reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileMode {
    #[default]
    Automatic,
    /// Used while a shipment cancellation writes its compensating entries.
    Suppressed,
}

/// What one processing pass did for a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessOutcome {
    pub purchase: PurchaseId,
    /// The purchase is not invoiced on shipment; nothing was looked at.
    pub skipped: bool,
    pub moves: Vec<MoveId>,
    pub selection: Option<Selection>,
}

impl ProcessOutcome {
    fn skipped(purchase: PurchaseId) -> Self {
        Self {
            purchase,
            skipped: true,
            moves: Vec::new(),
            selection: None,
        }
    }
}

pub struct PendingInvoiceService<L, H> {
    ledger: L,
    host: H,
}

impl<L, H> PendingInvoiceService<L, H>
where
    L: LedgerRepository,
    H: AccountingHost,
{
    pub fn new(ledger: L, host: H) -> Self {
        Self { ledger, host }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// A purchase was processed (shipment done, invoice posted/cancelled).
    pub fn purchase_processed(&self, purchase: &Purchase, today: NaiveDate) -> DomainResult<ProcessOutcome> {
        self.process(purchase, ReconcileMode::Automatic, today)
    }

    /// A shipment of the purchase was cancelled; no reconciliation this pass.
    pub fn shipment_cancelled(&self, purchase: &Purchase, today: NaiveDate) -> DomainResult<ProcessOutcome> {
        self.process(purchase, ReconcileMode::Suppressed, today)
    }

    /// Process several purchases, stopping at the first failure.
    pub fn process_purchases(
        &self,
        purchases: &[Purchase],
        today: NaiveDate,
    ) -> DomainResult<Vec<ProcessOutcome>> {
        purchases
            .iter()
            .map(|p| self.purchase_processed(p, today))
            .collect()
    }

    /// Create, post and (in automatic mode) reconcile pending-invoice moves.
    ///
    /// Every move is built and validated before the first one is saved, so a
    /// failure leaves the ledger untouched.
    pub fn process(
        &self,
        purchase: &Purchase,
        mode: ReconcileMode,
        today: NaiveDate,
    ) -> DomainResult<ProcessOutcome> {
        let span = tracing::info_span!("pending_invoice", purchase = %purchase.id, ?mode);
        let _guard = span.enter();

        if !purchase.invoice_method.tracks_pending_invoices() {
            tracing::debug!(method = ?purchase.invoice_method, "not invoiced on shipment; skipping");
            return Ok(ProcessOutcome::skipped(purchase.id));
        }

        let pending_account = self.host.pending_invoice_account().ok_or_else(|| {
            DomainError::configuration(
                "There is no Pending Invoice Account Defined. Please define one in purchase configuration.",
            )
        })?;
        let company_currency = self.host.company_currency(purchase.company).ok_or_else(|| {
            DomainError::configuration(format!("company {} has no currency", purchase.company))
        })?;
        let journal = self.host.expense_journal();
        if journal.is_none() {
            tracing::warn!("no expense journal; moves are posted without one");
        }

        let reconciler = PendingInvoiceReconciler::new(&self.host, &self.host, &company_currency);
        let mut by_date: BTreeMap<NaiveDate, Vec<MoveLine>> = BTreeMap::new();
        for line in purchase.lines.iter().filter(|l| l.is_stockable() && !l.moves.is_empty()) {
            let expense_account = Self::check_line(line)?;
            let existing = self.ledger.lines_for_purchase_line(line.id, pending_account.id);
            let ctx = LineContext {
                purchase,
                line,
                pending_account: &pending_account,
                expense_account,
                journal: journal.as_ref().map(|j| j.id),
                today,
            };
            for entry in reconciler.compute_pending_entries(&ctx, &existing)? {
                by_date.entry(entry.date).or_default().push(entry);
            }
        }

        let moves = by_date
            .into_iter()
            .map(|(date, lines)| self.build_move(purchase, date, lines, journal.as_ref(), today))
            .collect::<Vec<_>>();
        for mv in &moves {
            mv.validate()?;
        }

        let mut posted = Vec::with_capacity(moves.len());
        for mv in moves {
            let (date, lines) = (mv.date, mv.lines.len());
            let id = self.ledger.save_and_post(mv)?;
            tracing::info!(move_id = %id, %date, lines, "pending invoice move posted");
            posted.push(id);
        }

        let selection = match mode {
            ReconcileMode::Automatic => Some(
                ReconciliationSelector::new(&self.ledger)
                    .reconcile_if_balanced(purchase.id, pending_account.id)?,
            ),
            ReconcileMode::Suppressed => None,
        };

        Ok(ProcessOutcome {
            purchase: purchase.id,
            skipped: false,
            moves: posted,
            selection,
        })
    }

    fn check_line(line: &PurchaseLine) -> DomainResult<&Account> {
        if line.analytic_required() && line.analytic_accounts.is_empty() {
            return Err(DomainError::validation(format!(
                "purchase line \"{}\" requires analytic accounts",
                line.description
            )));
        }
        line.expense_account().ok_or_else(|| {
            DomainError::configuration(format!(
                "no expense account for purchase line \"{}\"",
                line.description
            ))
        })
    }

    /// One move per accounting date, on that date when its period is open.
    ///
    /// Otherwise the move is posted today and its description names the
    /// original date; the lines keep the original date.
    fn build_move(
        &self,
        purchase: &Purchase,
        date: NaiveDate,
        lines: Vec<MoveLine>,
        journal: Option<&Journal>,
        today: NaiveDate,
    ) -> Move {
        let (move_date, period, description) = match self.host.find_open(purchase.company, date) {
            Some(period) => (date, Some(period.id), None),
            None => {
                tracing::warn!(%date, %today, "no open period; posting on today");
                (
                    today,
                    self.period_for_today(purchase, today),
                    Some(format!("Pending invoice entries of {date}")),
                )
            }
        };

        Move {
            id: MoveId::new(),
            company: purchase.company,
            origin: Some(MoveOrigin::Purchase(purchase.id)),
            journal: journal.map(|j| j.id),
            period,
            date: move_date,
            description,
            state: MoveState::Draft,
            lines,
        }
    }

    fn period_for_today(&self, purchase: &Purchase, today: NaiveDate) -> Option<PeriodId> {
        match self.host.find(purchase.company, today) {
            Ok(period) => Some(period.id),
            Err(err) => {
                tracing::warn!(error = %err, "posting without period");
                None
            }
        }
    }
}
