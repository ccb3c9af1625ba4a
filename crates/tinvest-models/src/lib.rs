pub mod account;
pub mod config;
pub mod instrument;
pub mod market_data;
pub mod order;
pub mod portfolio;
pub mod quotation;

pub use account::{Account, AccountStatus};
pub use config::{BrokerConfig, BrokerSettings, ConfigError, FileConfig};
pub use instrument::{InstrumentKind, InstrumentRef};
pub use market_data::{
    Candle, CandleInterval, LastPrice, OrderBook, OrderBookLevel, TimeRange, TradingStatus,
};
pub use order::{OrderDirection, OrderIntent, OrderKind, OrderReceipt};
pub use portfolio::{Portfolio, Position};
pub use quotation::{encode, Quotation, QuotationParseError};
