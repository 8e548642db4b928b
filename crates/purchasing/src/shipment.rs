use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use grni_core::{Entity, StockMoveId};

use crate::uom::Unit;

/// Completion state of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementState {
    Draft,
    Assigned,
    Done,
    Cancelled,
}

/// Physical receipt or return tied to a purchase line.
///
/// `quantity` is a magnitude; the direction comes from the purchase line sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentMovement {
    pub id: StockMoveId,
    pub quantity: Decimal,
    pub unit: Unit,
    pub state: MovementState,
    #[serde(default)]
    pub effective_date: Option<NaiveDate>,
    #[serde(default)]
    pub planned_date: Option<NaiveDate>,
}

impl ShipmentMovement {
    pub fn done(quantity: Decimal, unit: Unit, effective_date: NaiveDate) -> Self {
        Self {
            id: StockMoveId::new(),
            quantity,
            unit,
            state: MovementState::Done,
            effective_date: Some(effective_date),
            planned_date: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == MovementState::Done
    }

    /// Effective date, else planned date.
    pub fn date(&self) -> Option<NaiveDate> {
        self.effective_date.or(self.planned_date)
    }
}

impl Entity for ShipmentMovement {
    type Id = StockMoveId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
