//! `grni-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no host or persistence
//! concerns) shared by the purchasing and accounting crates.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{
    AccountId, AnalyticAccountId, CompanyId, InvoiceLineId, JournalId, MoveId, MoveLineId,
    PartyId, PeriodId, ProductId, PurchaseId, PurchaseLineId, ReconciliationId, StockMoveId,
};
pub use value_object::ValueObject;
