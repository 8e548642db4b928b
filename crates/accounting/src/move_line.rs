use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use grni_core::{
    AccountId, AnalyticAccountId, Entity, JournalId, MoveLineId, PartyId, PurchaseLineId,
    ReconciliationId,
};

/// Analytic (cost-center) mirror of an expense move line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticLine {
    pub account: AnalyticAccountId,
    pub name: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub date: NaiveDate,
    pub reference: Option<String>,
    pub party: Option<PartyId>,
    pub journal: Option<JournalId>,
}

/// One debit or credit entry of an accounting move.
///
/// Amounts are non-negative and at most one side is non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveLine {
    pub id: MoveLineId,
    pub account: AccountId,
    pub debit: Decimal,
    pub credit: Decimal,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub party: Option<PartyId>,
    #[serde(default)]
    pub purchase_line: Option<PurchaseLineId>,
    #[serde(default)]
    pub reconciliation: Option<ReconciliationId>,
    #[serde(default)]
    pub analytic_lines: Vec<AnalyticLine>,
}

impl MoveLine {
    /// Line for a signed amount: positive debits, negative credits.
    pub fn signed(account: AccountId, amount: Decimal, date: NaiveDate) -> Self {
        let (debit, credit) = if amount > Decimal::ZERO {
            (amount, Decimal::ZERO)
        } else {
            (Decimal::ZERO, amount.abs())
        };
        Self {
            id: MoveLineId::new(),
            account,
            debit,
            credit,
            date,
            description: None,
            party: None,
            purchase_line: None,
            reconciliation: None,
            analytic_lines: Vec::new(),
        }
    }

    pub fn debit(account: AccountId, amount: Decimal, date: NaiveDate) -> Self {
        Self::signed(account, amount.abs(), date)
    }

    pub fn credit(account: AccountId, amount: Decimal, date: NaiveDate) -> Self {
        Self::signed(account, -amount.abs(), date)
    }

    pub fn with_party(mut self, party: Option<PartyId>) -> Self {
        self.party = party;
        self
    }

    pub fn with_purchase_line(mut self, line: PurchaseLineId) -> Self {
        self.purchase_line = Some(line);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Credit minus debit: the amount still pending on a holding account.
    pub fn pending(&self) -> Decimal {
        self.credit - self.debit
    }

    pub fn is_reconciled(&self) -> bool {
        self.reconciliation.is_some()
    }
}

impl Entity for MoveLine {
    type Id = MoveLineId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Sum of (debit, credit) over `lines`.
pub fn totals<'a>(lines: impl IntoIterator<Item = &'a MoveLine>) -> (Decimal, Decimal) {
    lines
        .into_iter()
        .fold((Decimal::ZERO, Decimal::ZERO), |(d, c), l| (d + l.debit, c + l.credit))
}
