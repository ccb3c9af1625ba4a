//! JSON shapes of the REST gateway.
//!
//! The gateway renders int64 fields as strings and omits zero values, so
//! every field defaults and int64s accept either representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tinvest_models::{
    Account, AccountStatus, Candle, CandleInterval, InstrumentKind, InstrumentRef, LastPrice,
    OrderBook, OrderBookLevel, OrderDirection, OrderIntent, OrderKind, OrderReceipt, Portfolio,
    Position, Quotation, TradingStatus,
};

#[derive(Deserialize)]
#[serde(untagged)]
enum Int64Repr {
    Number(i64),
    Text(String),
}

fn int64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Int64Repr::deserialize(deserializer)? {
        Int64Repr::Number(n) => Ok(n),
        Int64Repr::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireQuotation {
    #[serde(default, deserialize_with = "int64")]
    units: i64,
    #[serde(default)]
    nano: i32,
}

impl From<WireQuotation> for Quotation {
    fn from(w: WireQuotation) -> Self {
        Quotation::new(w.units, w.nano)
    }
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub code: Option<i32>,
    pub message: Option<String>,
    pub description: Option<String>,
}

impl ErrorBody {
    pub fn text(&self) -> Option<String> {
        let parts: Vec<&str> = [self.message.as_deref(), self.description.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(": "))
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Empty {}

// ---------------------------------------------------------------------------
// Instruments
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FindInstrumentRequest<'a> {
    pub query: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FindInstrumentResponse {
    #[serde(default)]
    pub instruments: Vec<WireInstrument>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct WireInstrument {
    figi: String,
    ticker: String,
    name: String,
    instrument_kind: String,
    instrument_type: String,
}

fn instrument_kind(kind: &str, legacy_type: &str) -> InstrumentKind {
    match (kind, legacy_type) {
        ("INSTRUMENT_TYPE_SHARE", _) | ("", "share") => InstrumentKind::Share,
        ("INSTRUMENT_TYPE_BOND", _) | ("", "bond") => InstrumentKind::Bond,
        ("INSTRUMENT_TYPE_ETF", _) | ("", "etf") => InstrumentKind::Etf,
        _ => InstrumentKind::Other,
    }
}

impl From<WireInstrument> for InstrumentRef {
    fn from(w: WireInstrument) -> Self {
        let kind = instrument_kind(&w.instrument_kind, &w.instrument_type);
        InstrumentRef {
            key: w.figi,
            ticker: w.ticker,
            name: w.name,
            kind,
        }
    }
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GetAccountsResponse {
    #[serde(default)]
    pub accounts: Vec<WireAccount>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireAccount {
    id: String,
    name: String,
    status: String,
}

impl From<WireAccount> for Account {
    fn from(w: WireAccount) -> Self {
        let status = match w.status.as_str() {
            "ACCOUNT_STATUS_NEW" => AccountStatus::New,
            "ACCOUNT_STATUS_OPEN" => AccountStatus::Open,
            "ACCOUNT_STATUS_CLOSED" => AccountStatus::Closed,
            _ => AccountStatus::Unspecified,
        };
        Account {
            id: w.id,
            name: w.name,
            status,
        }
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PostOrderRequest {
    instrument_id: String,
    quantity: String,
    direction: &'static str,
    account_id: String,
    order_type: &'static str,
    order_id: String,
}

impl From<&OrderIntent> for PostOrderRequest {
    fn from(intent: &OrderIntent) -> Self {
        let direction = match intent.direction {
            OrderDirection::Buy => "ORDER_DIRECTION_BUY",
            OrderDirection::Sell => "ORDER_DIRECTION_SELL",
        };
        let order_type = match intent.kind {
            OrderKind::Market => "ORDER_TYPE_MARKET",
        };
        PostOrderRequest {
            instrument_id: intent.instrument_key.clone(),
            quantity: intent.lots.to_string(),
            direction,
            account_id: intent.account_id.clone(),
            order_type,
            order_id: intent.order_id.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct PostOrderResponse {
    order_id: String,
    execution_report_status: String,
    #[serde(deserialize_with = "int64")]
    lots_requested: i64,
    #[serde(deserialize_with = "int64")]
    lots_executed: i64,
}

impl From<PostOrderResponse> for OrderReceipt {
    fn from(w: PostOrderResponse) -> Self {
        OrderReceipt {
            order_id: w.order_id,
            status: w.execution_report_status,
            lots_requested: w.lots_requested,
            lots_executed: w.lots_executed,
        }
    }
}

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PortfolioRequest<'a> {
    pub account_id: &'a str,
    pub currency: &'static str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct PortfolioResponse {
    pub account_id: String,
    pub positions: Vec<WirePosition>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct WirePosition {
    figi: String,
    instrument_type: String,
    quantity: WireQuotation,
    quantity_lots: WireQuotation,
}

impl PortfolioResponse {
    pub fn into_portfolio(self, requested_account: &str) -> Portfolio {
        let account_id = if self.account_id.is_empty() {
            requested_account.to_string()
        } else {
            self.account_id
        };
        Portfolio {
            account_id,
            positions: self
                .positions
                .into_iter()
                .map(|p| Position {
                    instrument_key: p.figi,
                    instrument_type: p.instrument_type,
                    quantity: p.quantity.into(),
                    quantity_lots: p.quantity_lots.into(),
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Market data
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LastPricesRequest<'a> {
    pub instrument_id: &'a [String],
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct LastPricesResponse {
    pub last_prices: Vec<WireLastPrice>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct WireLastPrice {
    figi: String,
    price: WireQuotation,
    time: Option<DateTime<Utc>>,
}

impl From<WireLastPrice> for LastPrice {
    fn from(w: WireLastPrice) -> Self {
        LastPrice {
            instrument_key: w.figi,
            price: w.price.into(),
            time: w.time,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderBookRequest<'a> {
    pub instrument_id: &'a str,
    pub depth: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct OrderBookResponse {
    figi: String,
    depth: u32,
    bids: Vec<WireOrder>,
    asks: Vec<WireOrder>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireOrder {
    price: WireQuotation,
    #[serde(deserialize_with = "int64")]
    quantity: i64,
}

impl From<WireOrder> for OrderBookLevel {
    fn from(w: WireOrder) -> Self {
        OrderBookLevel {
            price: w.price.into(),
            quantity: w.quantity,
        }
    }
}

impl From<OrderBookResponse> for OrderBook {
    fn from(w: OrderBookResponse) -> Self {
        OrderBook {
            instrument_key: w.figi,
            depth: w.depth,
            bids: w.bids.into_iter().map(Into::into).collect(),
            asks: w.asks.into_iter().map(Into::into).collect(),
        }
    }
}

pub(crate) fn interval_name(interval: CandleInterval) -> &'static str {
    match interval {
        CandleInterval::OneMinute => "CANDLE_INTERVAL_1_MIN",
        CandleInterval::FiveMinutes => "CANDLE_INTERVAL_5_MIN",
        CandleInterval::FifteenMinutes => "CANDLE_INTERVAL_15_MIN",
        CandleInterval::Hour => "CANDLE_INTERVAL_HOUR",
        CandleInterval::Day => "CANDLE_INTERVAL_DAY",
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CandlesRequest<'a> {
    pub instrument_id: &'a str,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub interval: &'static str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CandlesResponse {
    pub candles: Vec<WireCandle>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct WireCandle {
    open: WireQuotation,
    high: WireQuotation,
    low: WireQuotation,
    close: WireQuotation,
    #[serde(deserialize_with = "int64")]
    volume: i64,
    time: Option<DateTime<Utc>>,
    is_complete: bool,
}

impl From<WireCandle> for Candle {
    fn from(w: WireCandle) -> Self {
        Candle {
            time: w.time.unwrap_or_default(),
            open: w.open.into(),
            high: w.high.into(),
            low: w.low.into(),
            close: w.close.into(),
            volume: w.volume,
            is_complete: w.is_complete,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InstrumentRequest<'a> {
    pub instrument_id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct TradingStatusResponse {
    figi: String,
    trading_status: String,
    limit_order_available_flag: bool,
    market_order_available_flag: bool,
    api_trade_available_flag: bool,
}

impl From<TradingStatusResponse> for TradingStatus {
    fn from(w: TradingStatusResponse) -> Self {
        TradingStatus {
            instrument_key: w.figi,
            status: if w.trading_status.is_empty() {
                "SECURITY_TRADING_STATUS_UNSPECIFIED".to_string()
            } else {
                w.trading_status
            },
            market_order_available: w.market_order_available_flag,
            limit_order_available: w.limit_order_available_flag,
            api_trade_available: w.api_trade_available_flag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotation_accepts_string_and_number_units() {
        let a: WireQuotation = serde_json::from_str(r#"{"units":"12","nano":500000000}"#).unwrap();
        let b: WireQuotation = serde_json::from_str(r#"{"units":12,"nano":500000000}"#).unwrap();
        assert_eq!(Quotation::from(a), Quotation::new(12, 500_000_000));
        assert_eq!(Quotation::from(b), Quotation::new(12, 500_000_000));
    }

    #[test]
    fn omitted_fields_default_to_zero() {
        let q: WireQuotation = serde_json::from_str("{}").unwrap();
        assert_eq!(Quotation::from(q), Quotation::ZERO);

        let candle: WireCandle = serde_json::from_str(
            r#"{"close":{"units":"3"},"time":"2024-01-01T10:00:00Z"}"#,
        )
        .unwrap();
        let candle = Candle::from(candle);
        assert_eq!(candle.close, Quotation::new(3, 0));
        assert_eq!(candle.volume, 0);
        assert!(!candle.is_complete);
    }

    #[test]
    fn instrument_kind_mapping() {
        let inst: WireInstrument = serde_json::from_str(
            r#"{"figi":"F","ticker":"T","name":"N","instrumentKind":"INSTRUMENT_TYPE_BOND"}"#,
        )
        .unwrap();
        assert_eq!(InstrumentRef::from(inst).kind, InstrumentKind::Bond);

        let legacy: WireInstrument =
            serde_json::from_str(r#"{"figi":"F","instrumentType":"etf"}"#).unwrap();
        assert_eq!(InstrumentRef::from(legacy).kind, InstrumentKind::Etf);

        let currency: WireInstrument =
            serde_json::from_str(r#"{"instrumentKind":"INSTRUMENT_TYPE_CURRENCY"}"#).unwrap();
        assert_eq!(InstrumentRef::from(currency).kind, InstrumentKind::Other);
    }

    #[test]
    fn post_order_body_shape() {
        let intent = OrderIntent::market("BBG000000001", OrderDirection::Sell, 3, "2000111");
        let body = serde_json::to_value(PostOrderRequest::from(&intent)).unwrap();
        assert_eq!(body["instrumentId"], "BBG000000001");
        assert_eq!(body["quantity"], "3");
        assert_eq!(body["direction"], "ORDER_DIRECTION_SELL");
        assert_eq!(body["orderType"], "ORDER_TYPE_MARKET");
        assert_eq!(body["accountId"], "2000111");
        assert_eq!(body["orderId"], intent.order_id.to_string());
    }

    #[test]
    fn error_body_text_joins_parts() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"code":5,"message":"50004","description":"account not found"}"#)
                .unwrap();
        assert_eq!(body.code, Some(5));
        assert_eq!(body.text().as_deref(), Some("50004: account not found"));
        assert_eq!(ErrorBody::default().text(), None);
    }
}
