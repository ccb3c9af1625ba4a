use serde::{Deserialize, Serialize};

/// Broad instrument class as reported by instrument search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentKind {
    Share,
    Bond,
    Etf,
    Other,
}

impl InstrumentKind {
    /// Plural noun used in search results ("stocks", "bonds", "funds").
    pub fn plural(&self) -> &'static str {
        match self {
            InstrumentKind::Share => "stocks",
            InstrumentKind::Bond => "bonds",
            InstrumentKind::Etf => "funds",
            InstrumentKind::Other => "instruments",
        }
    }
}

/// A tradable instrument resolved from a search query.
///
/// Resolved per call and never cached: identity must reflect the query at
/// call time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstrumentRef {
    /// Canonical instrument key (FIGI).
    pub key: String,
    pub ticker: String,
    pub name: String,
    pub kind: InstrumentKind,
}

impl InstrumentRef {
    /// `"Name (TICKER)"`, the label used in every rendered result.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.ticker)
    }
}
