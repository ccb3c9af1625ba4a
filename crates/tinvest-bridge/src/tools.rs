//! The tool table: names, descriptions and JSON input schemas.

use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    SearchStocks,
    SearchBonds,
    SearchFunds,
    Buy,
    Sell,
    Portfolio,
    LastPrice,
    OrderBook,
    Candles,
    TradingStatus,
}

impl ToolName {
    pub const ALL: [ToolName; 10] = [
        ToolName::SearchStocks,
        ToolName::SearchBonds,
        ToolName::SearchFunds,
        ToolName::Buy,
        ToolName::Sell,
        ToolName::Portfolio,
        ToolName::LastPrice,
        ToolName::OrderBook,
        ToolName::Candles,
        ToolName::TradingStatus,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::SearchStocks => "search_stocks",
            ToolName::SearchBonds => "search_bonds",
            ToolName::SearchFunds => "search_funds",
            ToolName::Buy => "buy",
            ToolName::Sell => "sell",
            ToolName::Portfolio => "portfolio",
            ToolName::LastPrice => "last_price",
            ToolName::OrderBook => "orderbook",
            ToolName::Candles => "candles",
            ToolName::TradingStatus => "trading_status",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolName::SearchStocks => "Search stocks by ticker or name",
            ToolName::SearchBonds => "Search bonds by ticker or name",
            ToolName::SearchFunds => "Search funds/ETFs by ticker or name",
            ToolName::Buy => "Buy an instrument with a market order",
            ToolName::Sell => "Sell an instrument with a market order",
            ToolName::Portfolio => "Show the current portfolio (positions and balances)",
            ToolName::LastPrice => "Last trade price of an instrument",
            ToolName::OrderBook => "Order book (bids and asks) of an instrument",
            ToolName::Candles => "Historical candles of an instrument over a period",
            ToolName::TradingStatus => "Current trading status of an instrument",
        }
    }

    pub fn input_schema(&self) -> Value {
        const INSTRUMENT: &str = "Ticker, name or FIGI of the instrument";
        match self {
            ToolName::SearchStocks | ToolName::SearchBonds | ToolName::SearchFunds => object(
                json!({"query": string("Part of the ticker or name")}),
                &["query"],
            ),
            ToolName::Buy | ToolName::Sell => object(
                json!({
                    "ticker": string("Ticker or part of the name used to find the instrument"),
                    "lots": number("Number of lots"),
                }),
                &["ticker", "lots"],
            ),
            ToolName::Portfolio => object(json!({}), &[]),
            ToolName::LastPrice | ToolName::TradingStatus => {
                object(json!({"query": string(INSTRUMENT)}), &["query"])
            }
            ToolName::OrderBook => object(
                json!({
                    "query": string(INSTRUMENT),
                    "depth": number("Order book depth (1-50)"),
                }),
                &["query", "depth"],
            ),
            ToolName::Candles => object(
                json!({
                    "query": string(INSTRUMENT),
                    "from": string("Period start (RFC3339), e.g. 2024-01-01T00:00:00Z"),
                    "to": string("Period end (RFC3339), e.g. 2024-01-31T23:59:59Z"),
                    "interval": string("Interval: 1m, 5m, 15m, 1h, 1d"),
                }),
                &["query", "from", "to", "interval"],
            ),
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn string(description: &str) -> Value {
    json!({"type": "string", "description": description})
}

fn number(description: &str) -> Value {
    json!({"type": "number", "description": description})
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// One entry of a `tools/list` reply.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

pub fn tool_definitions() -> Vec<ToolDefinition> {
    ToolName::ALL
        .iter()
        .map(|t| ToolDefinition {
            name: t.as_str(),
            description: t.description(),
            input_schema: t.input_schema(),
        })
        .collect()
}
