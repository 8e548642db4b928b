use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use grni_core::{AccountId, CompanyId, DomainError, DomainResult, Entity, JournalId, PeriodId};

/// High-level account kind (determines normal balance side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

/// Ledger account as seen by this module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub code: String, // e.g. "PR"
    pub name: String, // e.g. "Pending payable"
    pub kind: AccountKind,
    /// Lines on this account must carry a party.
    #[serde(default)]
    pub party_required: bool,
    /// Lines on this account may be reconciled.
    #[serde(default)]
    pub reconcile: bool,
    /// Expense lines on this account must be split over analytic accounts.
    #[serde(default)]
    pub analytic_required: bool,
}

impl Account {
    pub fn new(code: impl Into<String>, name: impl Into<String>, kind: AccountKind) -> Self {
        Self {
            id: AccountId::new(),
            code: code.into(),
            name: name.into(),
            kind,
            party_required: false,
            reconcile: false,
            analytic_required: false,
        }
    }
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalKind {
    General,
    Revenue,
    Expense,
    Cash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    pub id: JournalId,
    pub code: String,
    pub name: String,
    pub kind: JournalKind,
}

/// Journal lookup consumed from the host.
pub trait JournalLookup {
    /// First journal of type `expense`, if any.
    fn expense_journal(&self) -> Option<Journal>;
}

impl JournalLookup for [Journal] {
    fn expense_journal(&self) -> Option<Journal> {
        self.iter().find(|j| j.kind == JournalKind::Expense).cloned()
    }
}

impl JournalLookup for Vec<Journal> {
    fn expense_journal(&self) -> Option<Journal> {
        self.as_slice().expense_journal()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodState {
    Open,
    Closed,
}

/// Accounting period of a company (inclusive date range).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub id: PeriodId,
    pub company: CompanyId,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub state: PeriodState,
}

impl Period {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Period lookup consumed from the host.
pub trait PeriodLookup {
    /// Open period for `date`, or `None` when there is none.
    fn find_open(&self, company: CompanyId, date: NaiveDate) -> Option<Period>;

    /// Open period for `date`, failing when there is none.
    fn find(&self, company: CompanyId, date: NaiveDate) -> DomainResult<Period> {
        self.find_open(company, date).ok_or_else(|| {
            DomainError::not_found(format!("no open period for {date} in company {company}"))
        })
    }
}

/// In-memory list of periods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodCalendar {
    periods: Vec<Period>,
}

impl PeriodCalendar {
    pub fn new(periods: Vec<Period>) -> Self {
        Self { periods }
    }

    /// One open period per calendar month of `year`.
    pub fn monthly(company: CompanyId, year: i32) -> Self {
        let periods = (1..=12)
            .filter_map(|month| {
                let start = NaiveDate::from_ymd_opt(year, month, 1)?;
                let next = if month == 12 {
                    NaiveDate::from_ymd_opt(year + 1, 1, 1)?
                } else {
                    NaiveDate::from_ymd_opt(year, month + 1, 1)?
                };
                Some(Period {
                    id: PeriodId::new(),
                    company,
                    start,
                    end: next.pred_opt()?,
                    state: PeriodState::Open,
                })
            })
            .collect();
        Self { periods }
    }

    pub fn push(&mut self, period: Period) {
        self.periods.push(period);
    }

    /// Close the period containing `date`, if any.
    pub fn close(&mut self, company: CompanyId, date: NaiveDate) {
        for p in self.periods.iter_mut() {
            if p.company == company && p.contains(date) {
                p.state = PeriodState::Closed;
            }
        }
    }
}

impl PeriodLookup for PeriodCalendar {
    fn find_open(&self, company: CompanyId, date: NaiveDate) -> Option<Period> {
        self.periods
            .iter()
            .find(|p| p.company == company && p.state == PeriodState::Open && p.contains(date))
            .cloned()
    }
}
