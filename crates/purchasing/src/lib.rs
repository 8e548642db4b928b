//! Purchasing records consumed by the pending-invoice logic.
//!
//! Strongly-typed snapshots of purchases, their lines, shipment movements and
//! invoice lines, with the quantity arithmetic derived from them. No IO.

pub mod invoice;
pub mod purchase;
pub mod shipment;
pub mod uom;

pub use invoice::{InvoiceException, InvoiceLine, InvoiceState};
pub use purchase::{
    InvoiceMethod, LineKind, Product, ProductType, Purchase, PurchaseLine,
};
pub use shipment::{MovementState, ShipmentMovement};
pub use uom::{FactorConverter, Unit, UomConverter};
