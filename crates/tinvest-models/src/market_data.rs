use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::quotation::Quotation;

/// Candle granularities supported by the candles tool.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CandleInterval {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    Hour,
    Day,
}

impl CandleInterval {
    pub const ALL: [CandleInterval; 5] = [
        CandleInterval::OneMinute,
        CandleInterval::FiveMinutes,
        CandleInterval::FifteenMinutes,
        CandleInterval::Hour,
        CandleInterval::Day,
    ];

    /// Short canonical token ("1m", "5m", "15m", "1h", "1d").
    pub fn token(&self) -> &'static str {
        match self {
            CandleInterval::OneMinute => "1m",
            CandleInterval::FiveMinutes => "5m",
            CandleInterval::FifteenMinutes => "15m",
            CandleInterval::Hour => "1h",
            CandleInterval::Day => "1d",
        }
    }
}

/// A validated time window: `from` strictly precedes `to`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TimeRange {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl TimeRange {
    /// Returns `None` unless `to` is strictly after `from`.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Option<Self> {
        (to > from).then_some(Self { from, to })
    }

    pub fn from(&self) -> DateTime<Utc> {
        self.from
    }

    pub fn to(&self) -> DateTime<Utc> {
        self.to
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LastPrice {
    pub instrument_key: String,
    pub price: Quotation,
    pub time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderBookLevel {
    pub price: Quotation,
    pub quantity: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderBook {
    pub instrument_key: String,
    pub depth: u32,
    pub bids: Vec<OrderBookLevel>,
    pub asks: Vec<OrderBookLevel>,
}

/// One OHLCV bar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: Quotation,
    pub high: Quotation,
    pub low: Quotation,
    pub close: Quotation,
    pub volume: i64,
    pub is_complete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TradingStatus {
    pub instrument_key: String,
    /// Backend status name, e.g. `SECURITY_TRADING_STATUS_NORMAL_TRADING`.
    pub status: String,
    pub market_order_available: bool,
    pub limit_order_available: bool,
    pub api_trade_available: bool,
}
