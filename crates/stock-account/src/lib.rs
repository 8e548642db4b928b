//! Pending-invoice (goods received, not invoiced) accounting for purchases.
//!
//! When goods arrive before the supplier invoice, entries are posted against
//! the configured pending-invoice account. Posted invoices offset them and a
//! fully cleared purchase has its pending entries reconciled.

pub mod analytic;
pub mod config;
pub mod host;
pub mod reconciler;
pub mod scenario;
pub mod selector;
pub mod service;

pub use analytic::project_analytic_lines;
pub use config::{ConfigurationSource, SettingsConfiguration, StockAccountSettings};
pub use host::{AccountingHost, InMemoryHost};
pub use reconciler::{LineContext, PendingInvoiceReconciler};
pub use scenario::{ReplayReport, Scenario};
pub use selector::{ReconciliationSelector, Selection};
pub use service::{PendingInvoiceService, ProcessOutcome, ReconcileMode};
