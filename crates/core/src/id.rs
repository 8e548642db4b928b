//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

uuid_id!(
    /// Identifier of a company (accounting boundary).
    CompanyId, "CompanyId"
);
uuid_id!(
    /// Identifier of a party (supplier).
    PartyId, "PartyId"
);
uuid_id!(ProductId, "ProductId");
uuid_id!(PurchaseId, "PurchaseId");
uuid_id!(PurchaseLineId, "PurchaseLineId");
uuid_id!(
    /// Identifier of a stock (shipment) movement.
    StockMoveId, "StockMoveId"
);
uuid_id!(InvoiceLineId, "InvoiceLineId");
uuid_id!(AccountId, "AccountId");
uuid_id!(AnalyticAccountId, "AnalyticAccountId");
uuid_id!(JournalId, "JournalId");
uuid_id!(PeriodId, "PeriodId");
uuid_id!(
    /// Identifier of an accounting move (a balanced group of lines).
    MoveId, "MoveId"
);
uuid_id!(MoveLineId, "MoveLineId");
uuid_id!(
    /// Groups ledger lines that were reconciled against each other.
    ReconciliationId, "ReconciliationId"
);
