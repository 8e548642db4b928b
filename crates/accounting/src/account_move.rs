use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use grni_core::{CompanyId, DomainError, DomainResult, Entity, JournalId, MoveId, PeriodId, PurchaseId};

use crate::move_line::{MoveLine, totals};

/// Document an accounting move was generated from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "model", content = "id", rename_all = "snake_case")]
pub enum MoveOrigin {
    Purchase(PurchaseId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveState {
    Draft,
    Posted,
}

/// Accounting move: a balanced group of lines posted together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub id: MoveId,
    pub company: CompanyId,
    pub origin: Option<MoveOrigin>,
    pub journal: Option<JournalId>,
    pub period: Option<PeriodId>,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub state: MoveState,
    pub lines: Vec<MoveLine>,
}

impl Move {
    pub fn draft(company: CompanyId, date: NaiveDate, lines: Vec<MoveLine>) -> Self {
        Self {
            id: MoveId::new(),
            company,
            origin: None,
            journal: None,
            period: None,
            date,
            description: None,
            state: MoveState::Draft,
            lines,
        }
    }

    pub fn total_debit(&self) -> Decimal {
        totals(&self.lines).0
    }

    pub fn total_credit(&self) -> Decimal {
        totals(&self.lines).1
    }

    /// Reject moves that cannot be posted.
    ///
    /// Lines must be non-negative, single-sided, and the move must balance.
    pub fn validate(&self) -> DomainResult<()> {
        if self.lines.is_empty() {
            return Err(DomainError::validation("move must have lines"));
        }
        for line in &self.lines {
            if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
                return Err(DomainError::validation("amounts must not be negative"));
            }
            if !line.debit.is_zero() && !line.credit.is_zero() {
                return Err(DomainError::validation(
                    "a line cannot carry both debit and credit",
                ));
            }
        }
        ensure_balanced(&self.lines)
    }
}

impl Entity for Move {
    type Id = MoveId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Debits must equal credits.
pub fn ensure_balanced(lines: &[MoveLine]) -> DomainResult<()> {
    let (debit, credit) = totals(lines);
    if debit != credit {
        return Err(DomainError::Imbalance { debit, credit });
    }
    Ok(())
}
