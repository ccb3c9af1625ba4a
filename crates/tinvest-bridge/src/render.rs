//! Plain-text rendering of tool results.
//!
//! Every monetary or quantity field goes through the fixed-point codec, so
//! values are printed exactly as the backend sent them.

use chrono::SecondsFormat;
use tinvest_models::{
    Candle, InstrumentKind, InstrumentRef, LastPrice, OrderBook, OrderBookLevel,
    OrderDirection, OrderReceipt, Portfolio, TimeRange, TradingStatus,
};

/// Candle rows rendered before the remainder is summarized.
pub const CANDLE_ROW_LIMIT: usize = 50;

fn bullets(lines: impl IntoIterator<Item = String>) -> String {
    lines
        .into_iter()
        .map(|l| format!(" - {l}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn rfc3339(t: chrono::DateTime<chrono::Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn search(kind: InstrumentKind, query: &str, found: &[InstrumentRef]) -> String {
    if found.is_empty() {
        return format!("No {} found for query {query:?}", kind.plural());
    }
    let lines = found
        .iter()
        .map(|i| format!("{} – FIGI: {}", i.label(), i.key));
    format!("Found {}:\n{}", kind.plural(), bullets(lines))
}

pub fn order(
    direction: OrderDirection,
    lots: i64,
    instrument: &InstrumentRef,
    receipt: &OrderReceipt,
) -> String {
    format!(
        "Submitted market {} order for {lots} lots of {}\nOrder id: {}, status: {}, lots executed: {}/{}",
        direction.as_str(),
        instrument.label(),
        receipt.order_id,
        receipt.status,
        receipt.lots_executed,
        receipt.lots_requested,
    )
}

pub fn portfolio(portfolio: &Portfolio) -> String {
    if portfolio.positions.is_empty() {
        return "Portfolio is empty".to_string();
    }
    let lines = portfolio.positions.iter().map(|p| {
        format!(
            "FIGI {}: {} pcs, {} lots, type={}",
            p.instrument_key, p.quantity, p.quantity_lots, p.instrument_type
        )
    });
    format!("Current portfolio:\n{}", bullets(lines))
}

pub fn last_price(instrument: &InstrumentRef, price: Option<&LastPrice>) -> String {
    let Some(price) = price else {
        return format!("No last price data for {}", instrument.label());
    };
    let time = price
        .time
        .map(rfc3339)
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "{}, FIGI {}: last price {}, time {time}",
        instrument.label(),
        instrument.key,
        price.price
    )
}

fn ladder<'a>(levels: &'a [OrderBookLevel], depth: u32) -> impl Iterator<Item = String> + 'a {
    levels
        .iter()
        .take(depth as usize)
        .enumerate()
        .map(|(i, l)| format!("  #{} {} × {}", i + 1, l.price, l.quantity))
}

/// Each side is capped at `depth` on its own, whatever the backend returned.
pub fn order_book(instrument: &InstrumentRef, depth: u32, book: &OrderBook) -> String {
    let mut lines = vec![format!(
        "Order book {}, FIGI {}, depth {depth}",
        instrument.label(),
        instrument.key
    )];
    lines.push("BIDS (buy):".to_string());
    lines.extend(ladder(&book.bids, depth));
    lines.push("ASKS (sell):".to_string());
    lines.extend(ladder(&book.asks, depth));
    lines.join("\n")
}

/// `interval_label` is the caller's own interval token, shown upper-cased.
pub fn candles(
    instrument: &InstrumentRef,
    interval_label: &str,
    range: TimeRange,
    candles: &[Candle],
) -> String {
    if candles.is_empty() {
        return format!(
            "No candles found for {} in the requested period",
            instrument.label()
        );
    }

    let mut lines = Vec::with_capacity(candles.len().min(CANDLE_ROW_LIMIT) + 2);
    lines.push(format!(
        "Candles {}, FIGI {}, {}, {} → {}, total: {}",
        instrument.label(),
        instrument.key,
        interval_label.trim().to_uppercase(),
        rfc3339(range.from()),
        rfc3339(range.to()),
        candles.len()
    ));
    lines.extend(candles.iter().take(CANDLE_ROW_LIMIT).map(|c| {
        format!(
            " - {}  O:{} H:{} L:{} C:{} V:{}",
            rfc3339(c.time),
            c.open,
            c.high,
            c.low,
            c.close,
            c.volume
        )
    }));
    if candles.len() > CANDLE_ROW_LIMIT {
        lines.push(format!("+{} more", candles.len() - CANDLE_ROW_LIMIT));
    }
    lines.join("\n")
}

pub fn trading_status(instrument: &InstrumentRef, status: &TradingStatus) -> String {
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };
    format!(
        "Trading status for {}, FIGI {}: {}\nmarket orders: {}, limit orders: {}, API trading: {}",
        instrument.label(),
        instrument.key,
        status.status,
        yes_no(status.market_order_available),
        yes_no(status.limit_order_available),
        yes_no(status.api_trade_available),
    )
}
