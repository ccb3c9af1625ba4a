use serde::{Deserialize, Serialize};

use crate::quotation::Quotation;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Position {
    /// Canonical instrument key (FIGI).
    pub instrument_key: String,
    /// Instrument type as reported by the backend ("share", "bond", "currency", ...).
    pub instrument_type: String,
    pub quantity: Quotation,
    pub quantity_lots: Quotation,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Portfolio {
    pub account_id: String,
    pub positions: Vec<Position>,
}
