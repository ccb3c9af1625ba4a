use async_trait::async_trait;
use tinvest_models::{
    Account, Candle, CandleInterval, InstrumentRef, LastPrice, OrderBook, OrderIntent,
    OrderReceipt, Portfolio, TimeRange, TradingStatus,
};

use crate::error::ClientError;

/// Free-text instrument search. Results come back in backend order.
#[async_trait]
pub trait InstrumentSearch: Send + Sync {
    async fn find_instrument(&self, query: &str) -> Result<Vec<InstrumentRef>, ClientError>;
}

#[async_trait]
pub trait AccountsService: Send + Sync {
    async fn get_accounts(&self) -> Result<Vec<Account>, ClientError>;
}

#[async_trait]
pub trait OrderService: Send + Sync {
    /// Submits a live order. Irreversible from the caller's side.
    async fn post_order(&self, intent: &OrderIntent) -> Result<OrderReceipt, ClientError>;
}

#[async_trait]
pub trait PortfolioService: Send + Sync {
    async fn get_portfolio(&self, account_id: &str) -> Result<Portfolio, ClientError>;
}

/// Market data, keyed by canonical instrument key.
#[async_trait]
pub trait MarketDataService: Send + Sync {
    async fn last_prices(&self, instrument_keys: &[String]) -> Result<Vec<LastPrice>, ClientError>;

    async fn order_book(&self, instrument_key: &str, depth: u32) -> Result<OrderBook, ClientError>;

    async fn candles(
        &self,
        instrument_key: &str,
        range: TimeRange,
        interval: CandleInterval,
    ) -> Result<Vec<Candle>, ClientError>;

    async fn trading_status(&self, instrument_key: &str) -> Result<TradingStatus, ClientError>;
}

/// An open connection to the brokerage, exposing every collaborator.
#[async_trait]
pub trait Broker:
    InstrumentSearch + AccountsService + OrderService + PortfolioService + MarketDataService
{
    /// Account id embedded in the client's own configuration during
    /// construction, if any.
    fn configured_account_id(&self) -> Option<String>;

    /// Releases the connection. Calls made afterwards fail.
    async fn close(&self) -> Result<(), ClientError>;
}
