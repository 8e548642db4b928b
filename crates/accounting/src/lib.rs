//! Accounting building blocks consumed by the pending-invoice logic.
//!
//! Accounts, journals, periods, moves and the ledger persistence boundary.
//! The in-memory implementations stand in for the host's persistence layer.

pub mod account;
pub mod account_move;
pub mod currency;
pub mod ledger;
pub mod move_line;

pub use account::{
    Account, AccountKind, Journal, JournalKind, JournalLookup, Period, PeriodCalendar,
    PeriodLookup, PeriodState,
};
pub use account_move::{Move, MoveOrigin, MoveState, ensure_balanced};
pub use currency::{Currency, CurrencyConverter, RateTable};
pub use ledger::{InMemoryLedger, LedgerRepository, LineQuery, PostedLine};
pub use move_line::{AnalyticLine, MoveLine, totals};
