//! Replayable snapshot: chart of accounts, purchases and an existing ledger.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use grni_accounting::{Account, InMemoryLedger, Journal, LedgerRepository, Move, PeriodCalendar, RateTable};
use grni_core::DomainResult;
use grni_purchasing::Purchase;

use crate::config::{SettingsConfiguration, StockAccountSettings};
use crate::host::InMemoryHost;
use crate::service::{PendingInvoiceService, ProcessOutcome, ReconcileMode};

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub today: NaiveDate,
    /// Falls back to `StockAccountSettings::load()` when absent.
    #[serde(default)]
    pub settings: Option<StockAccountSettings>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub journals: Vec<Journal>,
    #[serde(default)]
    pub periods: PeriodCalendar,
    #[serde(default)]
    pub rates: RateTable,
    #[serde(default)]
    pub mode: ReconcileMode,
    pub purchases: Vec<Purchase>,
    /// Moves already in the ledger before the replay.
    #[serde(default)]
    pub posted_moves: Vec<Move>,
}

/// Result of a replay, printed by `grni-replay`.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub outcomes: Vec<ProcessOutcome>,
    /// Moves posted by this replay, in posting order.
    pub moves: Vec<Move>,
}

impl Scenario {
    pub fn from_json(source: &str) -> serde_json::Result<Self> {
        serde_json::from_str(source)
    }

    /// Run every purchase through the service against in-memory collaborators.
    pub fn run(&self, settings: &StockAccountSettings) -> DomainResult<ReplayReport> {
        let mut host = InMemoryHost::new(
            SettingsConfiguration::resolve(settings, &self.accounts)?,
            self.periods.clone(),
        );
        host.journals = self.journals.clone();
        host.rates = self.rates.clone();

        let service = PendingInvoiceService::new(
            InMemoryLedger::with_moves(self.posted_moves.clone()),
            host,
        );

        let outcomes = self
            .purchases
            .iter()
            .map(|p| service.process(p, self.mode, self.today))
            .collect::<DomainResult<Vec<_>>>()?;

        let moves = outcomes
            .iter()
            .flat_map(|o| o.moves.iter())
            .filter_map(|id| service.ledger().get_move(*id))
            .collect();

        Ok(ReplayReport { outcomes, moves })
    }
}
