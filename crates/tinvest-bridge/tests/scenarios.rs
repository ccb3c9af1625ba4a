//! End-to-end tool calls through `ToolBridge` against the in-memory broker.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tinvest_bridge::{AccountSource, BootstrapError, Session, ToolBridge, ToolError, ValidationError};
use tinvest_client::test_support::{
    account, instrument, level, minute_candles, share, MockBroker, OP_CANDLES,
    OP_FIND_INSTRUMENT, OP_GET_ACCOUNTS, OP_GET_PORTFOLIO, OP_ORDER_BOOK, OP_POST_ORDER,
};
use tinvest_client::Code;
use tinvest_models::{
    AccountStatus, InstrumentKind, LastPrice, OrderBook, OrderDirection, Position, Quotation,
    TradingStatus,
};

fn market() -> MockBroker {
    MockBroker::new()
        .with_instruments(vec![
            share("BBG004730N88", "SBER", "Sberbank"),
            instrument("RU000A0JX0J2", "SU26215RMFS2", "OFZ 26215", InstrumentKind::Bond),
            instrument("BBG333333333", "TMOS", "Tinkoff iMOEX", InstrumentKind::Etf),
        ])
        .with_accounts(vec![
            account("closed-1", AccountStatus::Closed),
            account("open-2", AccountStatus::Open),
        ])
}

async fn bridge(mock: &Arc<MockBroker>) -> ToolBridge {
    let session = Session::bootstrap(mock.clone(), None).await.unwrap();
    ToolBridge::new(Arc::new(session))
}

#[tokio::test]
async fn bootstrap_picks_first_open_account() {
    let mock = Arc::new(market());
    let session = Session::bootstrap(mock.clone(), None).await.unwrap();

    assert_eq!(session.account_id("portfolio").unwrap(), "open-2");
    assert_eq!(session.account_source(), AccountSource::FirstOpen);
    assert_eq!(mock.call_count(OP_GET_ACCOUNTS), 1);
}

#[tokio::test]
async fn bootstrap_without_open_account_is_fatal() {
    let mock = Arc::new(
        MockBroker::new().with_accounts(vec![account("closed-1", AccountStatus::Closed)]),
    );

    let err = Session::bootstrap(mock.clone(), None).await.err().unwrap();

    assert!(matches!(err, BootstrapError::NoAccountResolved(_)));
    assert_eq!(mock.close_count(), 1);
}

#[tokio::test]
async fn search_filters_by_kind() {
    let mock = Arc::new(market());
    let bridge = bridge(&mock).await;

    let text = bridge.call("search_funds", &json!({"query": "tmos"})).await.unwrap();
    assert_eq!(
        text,
        "Found funds:\n - Tinkoff iMOEX (TMOS) – FIGI: BBG333333333"
    );

    let text = bridge.call("search_bonds", &json!({"query": "SBER"})).await.unwrap();
    assert_eq!(text, "No bonds found for query \"SBER\"");
}

#[tokio::test]
async fn search_backend_failure_is_classified() {
    let mock = Arc::new(market().failing(OP_FIND_INSTRUMENT, Code::Unavailable, "gateway down"));
    let bridge = bridge(&mock).await;

    let err = bridge
        .call("search_stocks", &json!({"query": "SBER"}))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ToolError::Backend {
            operation: "search_stocks",
            message: "gateway down".to_string()
        }
    );
}

#[tokio::test]
async fn buy_submits_market_intent_for_resolved_instrument() {
    let mock = Arc::new(market());
    let bridge = bridge(&mock).await;

    let text = bridge
        .call("buy", &json!({"ticker": "SBER", "lots": 3.7}))
        .await
        .unwrap();

    let orders = mock.submitted_orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].instrument_key, "BBG004730N88");
    assert_eq!(orders[0].direction, OrderDirection::Buy);
    assert_eq!(orders[0].lots, 3);
    assert_eq!(orders[0].account_id, "open-2");
    assert!(text.starts_with("Submitted market buy order for 3 lots of Sberbank (SBER)"));
    assert!(text.contains(&orders[0].order_id.to_string()));
}

#[tokio::test]
async fn each_order_gets_a_fresh_idempotency_token() {
    let mock = Arc::new(market());
    let bridge = bridge(&mock).await;

    bridge.call("sell", &json!({"ticker": "SBER", "lots": 1})).await.unwrap();
    bridge.call("sell", &json!({"ticker": "SBER", "lots": 1})).await.unwrap();

    let orders = mock.submitted_orders();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].direction, OrderDirection::Sell);
    assert_ne!(orders[0].order_id, orders[1].order_id);
}

#[tokio::test]
async fn non_positive_lots_reach_the_backend() {
    let mock = Arc::new(market());
    let bridge = bridge(&mock).await;

    bridge.call("buy", &json!({"ticker": "SBER", "lots": 0})).await.unwrap();

    assert_eq!(mock.submitted_orders()[0].lots, 0);
}

#[tokio::test]
async fn unknown_ticker_stops_before_ordering() {
    let mock = Arc::new(market());
    let bridge = bridge(&mock).await;

    let err = bridge
        .call("buy", &json!({"ticker": "NOPE", "lots": 1}))
        .await
        .unwrap_err();

    assert_eq!(err, ToolError::NotFound { query: "NOPE".to_string() });
    assert_eq!(mock.call_count(OP_POST_ORDER), 0);
}

#[tokio::test]
async fn validation_errors_short_circuit_before_search() {
    let mock = Arc::new(market());
    let bridge = bridge(&mock).await;

    let err = bridge
        .call(
            "candles",
            &json!({
                "query": "SBER",
                "from": "2024-01-01T00:00:00Z",
                "to": "2024-01-01T00:00:00Z",
                "interval": "1h"
            }),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ToolError::Validation(ValidationError::InvalidTimeRange(_))
    ));

    let err = bridge
        .call(
            "candles",
            &json!({
                "query": "SBER",
                "from": "2024-01-01T00:00:00Z",
                "to": "2024-01-02T00:00:00Z",
                "interval": "1w"
            }),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ToolError::Validation(ValidationError::UnknownInterval(_))
    ));

    let err = bridge.call("buy", &json!({"ticker": "SBER"})).await.unwrap_err();
    assert_eq!(err, ToolError::Validation(ValidationError::Missing("lots")));

    assert_eq!(mock.call_count(OP_FIND_INSTRUMENT), 0);
    assert_eq!(mock.call_count(OP_CANDLES), 0);
}

#[tokio::test]
async fn portfolio_renders_positions() {
    let mock = Arc::new(market().with_positions(vec![Position {
        instrument_key: "BBG004730N88".to_string(),
        instrument_type: "share".to_string(),
        quantity: Quotation::new(30, 0),
        quantity_lots: Quotation::new(3, 0),
    }]));
    let bridge = bridge(&mock).await;

    let text = bridge.call("portfolio", &Value::Null).await.unwrap();

    assert_eq!(
        text,
        "Current portfolio:\n - FIGI BBG004730N88: 30.000000000 pcs, 3.000000000 lots, type=share"
    );
    assert_eq!(mock.calls().last().unwrap(), &format!("{OP_GET_PORTFOLIO}:open-2"));
}

#[tokio::test]
async fn portfolio_not_found_gets_diagnostic() {
    let mock = Arc::new(market().failing(OP_GET_PORTFOLIO, Code::NotFound, "50004: account not found"));
    let bridge = bridge(&mock).await;

    let err = bridge.call("portfolio", &json!({})).await.unwrap_err();

    assert_eq!(
        err,
        ToolError::BackendNotFound {
            operation: "portfolio",
            message: "50004: account not found".to_string()
        }
    );
}

#[tokio::test]
async fn last_price_renders_codec_value() {
    let mock = Arc::new(market().with_last_prices(vec![LastPrice {
        instrument_key: "BBG004730N88".to_string(),
        price: Quotation::new(0, -1),
        time: Some(Utc.with_ymd_and_hms(2024, 5, 2, 7, 30, 0).unwrap()),
    }]));
    let bridge = bridge(&mock).await;

    let text = bridge.call("last_price", &json!({"query": "SBER"})).await.unwrap();
    assert!(text.contains("last price -0.000000001"));
    assert!(text.ends_with("time 2024-05-02T07:30:00Z"));

    let text = bridge.call("last_price", &json!({"query": "TMOS"})).await.unwrap();
    assert!(text.starts_with("No last price data"));
}

#[tokio::test]
async fn orderbook_depth_is_clamped_and_caps_both_sides() {
    let levels: Vec<_> = (0..60).map(|i| level(100 + i, 0, 1)).collect();
    let mock = Arc::new(market().with_order_book(OrderBook {
        bids: levels.clone(),
        asks: levels[..2].to_vec(),
        ..OrderBook::default()
    }));
    let bridge = bridge(&mock).await;

    let text = bridge
        .call("orderbook", &json!({"query": "SBER", "depth": 75}))
        .await
        .unwrap();

    let rows = |section: &str| {
        text.split(section)
            .nth(1)
            .unwrap_or_default()
            .lines()
            .skip(1)
            .take_while(|l| l.starts_with("  #"))
            .count()
    };
    assert_eq!(rows("BIDS"), 50);
    assert_eq!(rows("ASKS"), 2);
    assert!(mock.calls().contains(&format!("{OP_ORDER_BOOK}:BBG004730N88/50")));

    bridge
        .call("orderbook", &json!({"query": "SBER", "depth": 0}))
        .await
        .unwrap();
    assert!(mock.calls().contains(&format!("{OP_ORDER_BOOK}:BBG004730N88/1")));
}

#[tokio::test]
async fn candles_cap_at_fifty_rows() {
    let mock = Arc::new(market().with_candles(minute_candles(73)));
    let bridge = bridge(&mock).await;

    let text = bridge
        .call(
            "candles",
            &json!({
                "query": "SBER",
                "from": "2024-01-01T00:00:00Z",
                "to": "2024-01-01T02:00:00Z",
                "interval": " 1MIN "
            }),
        )
        .await
        .unwrap();

    let lines: Vec<_> = text.lines().collect();
    assert!(lines[0].contains(", 1MIN, "));
    assert_eq!(lines.iter().filter(|l| l.starts_with(" - ")).count(), 50);
    assert_eq!(*lines.last().unwrap(), "+23 more");
    assert_eq!(
        mock.calls().last().unwrap(),
        &format!("{OP_CANDLES}:BBG004730N88/1m/2024-01-01T00:00:00+00:00/2024-01-01T02:00:00+00:00")
    );
}

#[tokio::test]
async fn trading_status_of_missing_instrument_is_backend_not_found() {
    let mock = Arc::new(market());
    let err = bridge(&mock)
        .await
        .call("trading_status", &json!({"query": "SBER"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::BackendNotFound { operation: "trading_status", .. }));

    let mock = Arc::new(market().with_trading_status(TradingStatus {
        instrument_key: "BBG004730N88".to_string(),
        status: "SECURITY_TRADING_STATUS_NORMAL_TRADING".to_string(),
        market_order_available: true,
        limit_order_available: true,
        api_trade_available: true,
    }));
    let text = bridge(&mock)
        .await
        .call("trading_status", &json!({"query": "SBER"}))
        .await
        .unwrap();
    assert!(text.contains("NORMAL_TRADING"));
}

#[tokio::test]
async fn unknown_tool_is_a_per_call_error() {
    let mock = Arc::new(market());
    let bridge = bridge(&mock).await;

    let err = bridge.call("withdraw", &json!({})).await.unwrap_err();
    assert_eq!(err, ToolError::UnknownTool("withdraw".to_string()));

    // The session keeps serving.
    assert!(bridge.call("portfolio", &json!({})).await.is_ok());
}

#[tokio::test]
async fn concurrent_calls_share_one_session() {
    let mock = Arc::new(market());
    let bridge = bridge(&mock).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let bridge = bridge.clone();
            tokio::spawn(async move { bridge.call("search_stocks", &json!({"query": "SBER"})).await })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
    assert_eq!(mock.call_count(OP_FIND_INSTRUMENT), 8);
}

#[tokio::test]
async fn shutdown_releases_broker_once() {
    let mock = Arc::new(market());
    let session = Session::bootstrap(mock.clone(), Some("explicit")).await.unwrap();
    assert_eq!(session.account_source(), AccountSource::Explicit);

    session.shutdown().await;

    assert_eq!(mock.close_count(), 1);
    assert_eq!(mock.call_count(OP_GET_ACCOUNTS), 0);
}
