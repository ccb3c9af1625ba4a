//! In-memory broker for tests.
//!
//! `MockBroker` implements every collaborator trait from canned data, records
//! submitted orders and calls, and can be told to fail any single operation
//! with a given status code.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tinvest_models::{
    Account, AccountStatus, Candle, CandleInterval, InstrumentKind, InstrumentRef, LastPrice,
    OrderBook, OrderBookLevel, OrderIntent, OrderReceipt, Portfolio, Position, Quotation,
    TimeRange, TradingStatus,
};

use crate::backend::{
    AccountsService, Broker, InstrumentSearch, MarketDataService, OrderService, PortfolioService,
};
use crate::error::{ClientError, Code};

pub const OP_FIND_INSTRUMENT: &str = "find_instrument";
pub const OP_GET_ACCOUNTS: &str = "get_accounts";
pub const OP_POST_ORDER: &str = "post_order";
pub const OP_GET_PORTFOLIO: &str = "get_portfolio";
pub const OP_LAST_PRICES: &str = "last_prices";
pub const OP_ORDER_BOOK: &str = "order_book";
pub const OP_CANDLES: &str = "candles";
pub const OP_TRADING_STATUS: &str = "trading_status";

#[derive(Default)]
pub struct MockBroker {
    instruments: Vec<InstrumentRef>,
    accounts: Vec<Account>,
    configured_account: Option<String>,
    positions: Vec<Position>,
    last_prices: Vec<LastPrice>,
    order_book: OrderBook,
    candles: Vec<Candle>,
    trading_status: Option<TradingStatus>,
    failures: HashMap<&'static str, (Code, String)>,
    orders: Mutex<Vec<OrderIntent>>,
    calls: Mutex<Vec<String>>,
    closes: AtomicUsize,
}

impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instruments(mut self, instruments: Vec<InstrumentRef>) -> Self {
        self.instruments = instruments;
        self
    }

    pub fn with_accounts(mut self, accounts: Vec<Account>) -> Self {
        self.accounts = accounts;
        self
    }

    pub fn with_configured_account(mut self, id: &str) -> Self {
        self.configured_account = Some(id.to_string());
        self
    }

    pub fn with_positions(mut self, positions: Vec<Position>) -> Self {
        self.positions = positions;
        self
    }

    pub fn with_last_prices(mut self, prices: Vec<LastPrice>) -> Self {
        self.last_prices = prices;
        self
    }

    pub fn with_order_book(mut self, book: OrderBook) -> Self {
        self.order_book = book;
        self
    }

    pub fn with_candles(mut self, candles: Vec<Candle>) -> Self {
        self.candles = candles;
        self
    }

    pub fn with_trading_status(mut self, status: TradingStatus) -> Self {
        self.trading_status = Some(status);
        self
    }

    /// Make `op` (one of the `OP_*` names) fail with `code`.
    pub fn failing(mut self, op: &'static str, code: Code, message: &str) -> Self {
        self.failures.insert(op, (code, message.to_string()));
        self
    }

    /// Orders submitted so far, in submission order.
    pub fn submitted_orders(&self) -> Vec<OrderIntent> {
        self.orders.lock().map(|o| o.clone()).unwrap_or_default()
    }

    /// Call log entries of the form `"op"` or `"op:arg"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split(':').next() == Some(op))
            .count()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn record(&self, op: &'static str, arg: Option<&str>) -> Result<(), ClientError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(match arg {
                Some(a) => format!("{op}:{a}"),
                None => op.to_string(),
            });
        }
        match self.failures.get(op) {
            Some((code, message)) => Err(ClientError::status(*code, message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl InstrumentSearch for MockBroker {
    /// Case-insensitive substring match on ticker or name, in fixture order.
    async fn find_instrument(&self, query: &str) -> Result<Vec<InstrumentRef>, ClientError> {
        self.record(OP_FIND_INSTRUMENT, Some(query))?;
        let needle = query.to_lowercase();
        Ok(self
            .instruments
            .iter()
            .filter(|i| {
                i.ticker.to_lowercase().contains(&needle) || i.name.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AccountsService for MockBroker {
    async fn get_accounts(&self) -> Result<Vec<Account>, ClientError> {
        self.record(OP_GET_ACCOUNTS, None)?;
        Ok(self.accounts.clone())
    }
}

#[async_trait]
impl OrderService for MockBroker {
    async fn post_order(&self, intent: &OrderIntent) -> Result<OrderReceipt, ClientError> {
        self.record(OP_POST_ORDER, Some(&intent.instrument_key))?;
        if let Ok(mut orders) = self.orders.lock() {
            orders.push(intent.clone());
        }
        Ok(OrderReceipt {
            order_id: intent.order_id.to_string(),
            status: "EXECUTION_REPORT_STATUS_FILL".to_string(),
            lots_requested: intent.lots,
            lots_executed: intent.lots,
        })
    }
}

#[async_trait]
impl PortfolioService for MockBroker {
    async fn get_portfolio(&self, account_id: &str) -> Result<Portfolio, ClientError> {
        self.record(OP_GET_PORTFOLIO, Some(account_id))?;
        Ok(Portfolio {
            account_id: account_id.to_string(),
            positions: self.positions.clone(),
        })
    }
}

#[async_trait]
impl MarketDataService for MockBroker {
    async fn last_prices(&self, instrument_keys: &[String]) -> Result<Vec<LastPrice>, ClientError> {
        self.record(OP_LAST_PRICES, Some(&instrument_keys.join(",")))?;
        Ok(self
            .last_prices
            .iter()
            .filter(|p| instrument_keys.contains(&p.instrument_key))
            .cloned()
            .collect())
    }

    /// Returns the whole fixture book regardless of `depth`, like a backend
    /// that ignores the hint.
    async fn order_book(&self, instrument_key: &str, depth: u32) -> Result<OrderBook, ClientError> {
        self.record(OP_ORDER_BOOK, Some(&format!("{instrument_key}/{depth}")))?;
        let mut book = self.order_book.clone();
        book.instrument_key = instrument_key.to_string();
        book.depth = depth;
        Ok(book)
    }

    async fn candles(
        &self,
        instrument_key: &str,
        range: TimeRange,
        interval: CandleInterval,
    ) -> Result<Vec<Candle>, ClientError> {
        self.record(
            OP_CANDLES,
            Some(&format!(
                "{instrument_key}/{}/{}/{}",
                interval.token(),
                range.from().to_rfc3339(),
                range.to().to_rfc3339()
            )),
        )?;
        Ok(self.candles.clone())
    }

    async fn trading_status(&self, instrument_key: &str) -> Result<TradingStatus, ClientError> {
        self.record(OP_TRADING_STATUS, Some(instrument_key))?;
        self.trading_status
            .clone()
            .ok_or_else(|| ClientError::status(Code::NotFound, "instrument not found"))
    }
}

#[async_trait]
impl Broker for MockBroker {
    fn configured_account_id(&self) -> Option<String> {
        self.configured_account.clone()
    }

    async fn close(&self) -> Result<(), ClientError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixture builders
// ---------------------------------------------------------------------------

pub fn instrument(key: &str, ticker: &str, name: &str, kind: InstrumentKind) -> InstrumentRef {
    InstrumentRef {
        key: key.to_string(),
        ticker: ticker.to_string(),
        name: name.to_string(),
        kind,
    }
}

pub fn share(key: &str, ticker: &str, name: &str) -> InstrumentRef {
    instrument(key, ticker, name, InstrumentKind::Share)
}

pub fn account(id: &str, status: AccountStatus) -> Account {
    Account {
        id: id.to_string(),
        name: format!("Account {id}"),
        status,
    }
}

pub fn level(units: i64, nano: i32, quantity: i64) -> OrderBookLevel {
    OrderBookLevel {
        price: Quotation::new(units, nano),
        quantity,
    }
}

/// `count` complete one-minute candles starting at 2024-01-01T00:00:00Z,
/// with prices stepping by one unit per candle.
pub fn minute_candles(count: usize) -> Vec<Candle> {
    let start: DateTime<Utc> = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default();
    (0..count)
        .map(|i| {
            let base = 100 + i as i64;
            Candle {
                time: start + Duration::minutes(i as i64),
                open: Quotation::new(base, 0),
                high: Quotation::new(base + 1, 500_000_000),
                low: Quotation::new(base - 1, 250_000_000),
                close: Quotation::new(base, 750_000_000),
                volume: 1_000 + i as i64,
                is_complete: true,
            }
        })
        .collect()
}
