//! Exposure: desired directional stance for a ticker.

use serde::{Deserialize, Serialize};

/// Directional stance a model wants for a ticker.
///
/// `Out` means flat: any open position is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exposure {
    Long,
    Short,
    #[default]
    Out,
}

impl Exposure {
    /// +1 for long, -1 for short, 0 for out.
    pub fn sign(&self) -> f64 {
        match self {
            Exposure::Long => 1.0,
            Exposure::Short => -1.0,
            Exposure::Out => 0.0,
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, Exposure::Out)
    }

    /// Stance implied by a signed position quantity.
    pub fn from_quantity(quantity: f64) -> Self {
        if quantity > 0.0 {
            Exposure::Long
        } else if quantity < 0.0 {
            Exposure::Short
        } else {
            Exposure::Out
        }
    }
}
