//! Collaborators consumed from the host framework.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use grni_accounting::{
    Account, Currency, CurrencyConverter, Journal, JournalLookup, Period, PeriodCalendar,
    PeriodLookup, RateTable,
};
use grni_core::{CompanyId, DomainResult};
use grni_purchasing::{FactorConverter, Unit, UomConverter};

use crate::config::{ConfigurationSource, SettingsConfiguration};

/// Everything the pending-invoice service looks up outside the ledger.
pub trait AccountingHost:
    ConfigurationSource + PeriodLookup + JournalLookup + CurrencyConverter + UomConverter
{
}

impl<T> AccountingHost for T where
    T: ConfigurationSource + PeriodLookup + JournalLookup + CurrencyConverter + UomConverter
{
}

/// In-memory host for tests and replays.
#[derive(Debug, Clone)]
pub struct InMemoryHost {
    pub configuration: SettingsConfiguration,
    pub periods: PeriodCalendar,
    pub journals: Vec<Journal>,
    pub rates: RateTable,
}

impl InMemoryHost {
    pub fn new(configuration: SettingsConfiguration, periods: PeriodCalendar) -> Self {
        Self {
            configuration,
            periods,
            journals: Vec::new(),
            rates: RateTable::new(),
        }
    }
}

impl ConfigurationSource for InMemoryHost {
    fn pending_invoice_account(&self) -> Option<Account> {
        self.configuration.pending_invoice_account()
    }

    fn company_currency(&self, company: CompanyId) -> Option<Currency> {
        self.configuration.company_currency(company)
    }
}

impl PeriodLookup for InMemoryHost {
    fn find_open(&self, company: CompanyId, date: NaiveDate) -> Option<Period> {
        self.periods.find_open(company, date)
    }
}

impl JournalLookup for InMemoryHost {
    fn expense_journal(&self) -> Option<Journal> {
        self.journals.expense_journal()
    }
}

impl CurrencyConverter for InMemoryHost {
    fn convert(
        &self,
        amount: Decimal,
        from: &Currency,
        to: &Currency,
        date: NaiveDate,
    ) -> DomainResult<Decimal> {
        self.rates.convert(amount, from, to, date)
    }
}

impl UomConverter for InMemoryHost {
    fn compute_qty(&self, from: &Unit, qty: Decimal, to: &Unit) -> DomainResult<Decimal> {
        FactorConverter.compute_qty(from, qty, to)
    }
}
