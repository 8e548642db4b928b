//! Group reconciliation of a purchase's pending-invoice entries.

use rust_decimal::Decimal;
use serde::Serialize;

use grni_accounting::{LedgerRepository, LineQuery, MoveOrigin, PostedLine, totals};
use grni_core::{AccountId, DomainResult, MoveLineId, PurchaseId, ReconciliationId};

/// Unreconciled pending lines of a purchase and what was done with them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub lines: Vec<MoveLineId>,
    pub debit: Decimal,
    pub credit: Decimal,
    /// Set when the lines balanced and were reconciled.
    pub reconciliation: Option<ReconciliationId>,
}

impl Selection {
    pub fn is_balanced(&self) -> bool {
        !self.lines.is_empty() && self.debit == self.credit
    }
}

pub struct ReconciliationSelector<'a, L: ?Sized> {
    ledger: &'a L,
}

impl<'a, L> ReconciliationSelector<'a, L>
where
    L: LedgerRepository + ?Sized,
{
    pub fn new(ledger: &'a L) -> Self {
        Self { ledger }
    }

    /// Unreconciled lines on `pending_account` from moves originating in `purchase`.
    pub fn select(&self, purchase: PurchaseId, pending_account: AccountId) -> Vec<PostedLine> {
        self.ledger.search_lines(
            &LineQuery::default()
                .origin(MoveOrigin::Purchase(purchase))
                .account(pending_account)
                .unreconciled(),
        )
    }

    /// Reconcile the selection as one group iff its debits equal its credits.
    ///
    /// Over- or under-cleared selections stay open for a later pass.
    pub fn reconcile_if_balanced(
        &self,
        purchase: PurchaseId,
        pending_account: AccountId,
    ) -> DomainResult<Selection> {
        let selected = self.select(purchase, pending_account);
        let (debit, credit) = totals(selected.iter().map(|p| &p.line));
        let mut selection = Selection {
            lines: selected.iter().map(|p| p.line.id).collect(),
            debit,
            credit,
            reconciliation: None,
        };

        if !selection.is_balanced() {
            if !selection.lines.is_empty() {
                tracing::debug!(
                    %purchase,
                    lines = selection.lines.len(),
                    %debit,
                    %credit,
                    "pending invoice lines left open"
                );
            }
            return Ok(selection);
        }

        let reconciliation = self.ledger.reconcile(&selection.lines)?;
        tracing::info!(
            %purchase,
            %reconciliation,
            lines = selection.lines.len(),
            "pending invoice lines reconciled"
        );
        selection.reconciliation = Some(reconciliation);
        Ok(selection)
    }
}
