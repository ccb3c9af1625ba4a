use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderDirection {
    Buy,
    Sell,
}

impl OrderDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderDirection::Buy => "buy",
            OrderDirection::Sell => "sell",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    Market,
}

/// A market order ready for submission. Not persisted here: the backend owns
/// the order lifecycle after submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderIntent {
    pub instrument_key: String,
    pub direction: OrderDirection,
    /// Lot count, passed through without local bounds checks.
    pub lots: i64,
    pub kind: OrderKind,
    pub account_id: String,
    /// Idempotency token, fresh per submission.
    pub order_id: Uuid,
}

impl OrderIntent {
    pub fn market(
        instrument_key: impl Into<String>,
        direction: OrderDirection,
        lots: i64,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            instrument_key: instrument_key.into(),
            direction,
            lots,
            kind: OrderKind::Market,
            account_id: account_id.into(),
            order_id: Uuid::new_v4(),
        }
    }
}

/// The backend's acknowledgement of a submitted order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderReceipt {
    pub order_id: String,
    /// Execution report status as reported by the backend.
    pub status: String,
    pub lots_requested: i64,
    pub lots_executed: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_intent_gets_fresh_token() {
        let a = OrderIntent::market("FIGI1", OrderDirection::Buy, 2, "acc");
        let b = OrderIntent::market("FIGI1", OrderDirection::Buy, 2, "acc");
        assert_eq!(a.kind, OrderKind::Market);
        assert_ne!(a.order_id, b.order_id);
    }
}
